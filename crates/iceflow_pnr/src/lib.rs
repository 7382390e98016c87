//! Place-and-route inputs for arachne-pnr.

#![warn(missing_docs)]

pub mod pcf;

pub use pcf::{compile_pcf, SignalBinding};
