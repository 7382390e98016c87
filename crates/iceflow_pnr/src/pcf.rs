//! Physical constraint file (`.pcf`) generation for arachne-pnr.
//!
//! The format is one `set_io <signal> <pin>` line per physical pin. It has
//! no syntax for electrical attributes, so binding attributes are accepted
//! but not written.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;

/// A top-level signal bound to one or more package pins.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignalBinding {
    /// Signal name as it appears in the lowered design.
    pub name: String,
    /// Pins in bit order. More than one pin makes the signal a vector.
    pub pins: Vec<String>,
    /// Electrical and placement attributes (`io_standard`, ...).
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Name of the platform resource the signal was requested from.
    #[serde(default)]
    pub resource: String,
}

impl SignalBinding {
    /// Creates a binding with no attributes, named after its resource.
    pub fn new(name: impl Into<String>, pins: Vec<String>) -> Self {
        let name = name.into();
        Self {
            resource: name.clone(),
            name,
            pins,
            attributes: BTreeMap::new(),
        }
    }

    /// Returns `true` if the signal is bound to more than one pin.
    pub fn is_vector(&self) -> bool {
        self.pins.len() > 1
    }
}

fn push_set_io(out: &mut String, signal: &str, pin: &str) {
    // Writing into a String is infallible.
    let _ = writeln!(out, "set_io {signal} {pin}");
}

/// Compiles signal bindings and raw platform constraints into PCF text.
///
/// Vector signals get one line per bit, suffixed `[index]` in pin order.
/// Raw constraint blocks are appended after a blank line, separated from
/// each other by a blank line, exactly as given.
pub fn compile_pcf(bindings: &[SignalBinding], platform_constraints: &[String]) -> String {
    let mut out = String::new();

    for binding in bindings {
        if binding.is_vector() {
            for (index, pin) in binding.pins.iter().enumerate() {
                push_set_io(&mut out, &format!("{}[{index}]", binding.name), pin);
            }
        } else if let Some(pin) = binding.pins.first() {
            push_set_io(&mut out, &binding.name, pin);
        }
    }

    if !platform_constraints.is_empty() {
        out.push('\n');
        out.push_str(&platform_constraints.join("\n\n"));
    }

    out
}
