//! Shared foundational types used across the iceflow toolchain.
//!
//! This crate provides frequency values with period conversion and the
//! named-placeholder expansion used for user-supplied tool commands.

#![warn(missing_docs)]

pub mod frequency;
pub mod template;

pub use frequency::{format_mhz, Frequency, ParseFrequencyError};
pub use template::{expand, Expansion, TemplateVars};
