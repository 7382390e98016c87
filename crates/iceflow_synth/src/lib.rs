//! Synthesis script generation for yosys.
//!
//! [`SynthesisScript`] turns a source list, include paths and the user's
//! command hooks into the `.ys` script the build script runs through yosys.

#![warn(missing_docs)]

pub mod source;
pub mod yosys;

pub use source::{SourceFile, SourceLanguage};
pub use yosys::{SynthesisScript, YosysScript, KEEP_NORMALIZATION, TOP_MODULE};
