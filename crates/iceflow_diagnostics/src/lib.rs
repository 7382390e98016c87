//! Diagnostic creation, accumulation and rendering.
//!
//! Problems that do not stop a build (an attribute the toolchain cannot
//! express, a placeholder nobody recognizes) are collected as structured
//! [`Diagnostic`]s in a [`DiagnosticSink`] and rendered by the CLI with a
//! [`DiagnosticRenderer`].

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, JsonRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
