//! The boundary between a board description and the build.

use std::collections::BTreeMap;

use iceflow_arch::{AttributeTable, Translation};
use iceflow_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use iceflow_pnr::SignalBinding;
use iceflow_synth::SourceFile;

use crate::error::BuildError;

/// A design lowered to flat Verilog plus its pin bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoweredDesign {
    /// Flat Verilog source of the whole design.
    pub verilog: String,
    /// Resource name to signal name in the lowered design.
    pub namespace: BTreeMap<String, String>,
    /// Top-level signals bound to package pins, in output order.
    pub signals: Vec<SignalBinding>,
    /// Raw constraint blocks appended to the PCF.
    pub platform_constraints: Vec<String>,
}

/// A board: a device plus the sources and lowering it brings to a build.
pub trait Platform {
    /// The design representation this platform lowers.
    type Design;

    /// Device string, `<family>-<size>-<package>`. Validated only when the
    /// toolchain is run.
    fn device(&self) -> &str;

    /// Sources read before the lowered design, in order.
    fn sources(&self) -> &[SourceFile] {
        &[]
    }

    /// Include paths applied to every source.
    fn include_paths(&self) -> &[String] {
        &[]
    }

    /// Lowers `design` to Verilog and resolves its signal bindings.
    ///
    /// Called with the build directory as the working directory. Dropped
    /// attributes are reported into `sink`.
    fn lower(
        &self,
        design: &Self::Design,
        attributes: &AttributeTable,
        sink: &DiagnosticSink,
    ) -> Result<LoweredDesign, BuildError>;
}

/// Translates abstract attribute names on `signal` through `table`.
///
/// Attributes with no IceStorm equivalent are dropped with a `W101`
/// warning; names the table does not know are dropped with `W102`.
pub fn translate_attributes(
    signal: &str,
    names: &[String],
    table: &AttributeTable,
    sink: &DiagnosticSink,
) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for name in names {
        match table.lookup(name) {
            Some(Translation::Translated { name, value }) => {
                out.insert(name.clone(), value.clone());
            }
            Some(Translation::Unsupported) => {
                log::debug!("attribute '{name}' on '{signal}' is not supported by IceStorm");
                sink.emit(
                    Diagnostic::warning(
                        DiagnosticCode::UNSUPPORTED_ATTRIBUTE,
                        format!("attribute '{name}' has no IceStorm equivalent and was dropped"),
                    )
                    .with_subject(signal),
                );
            }
            None => {
                log::debug!("unknown attribute '{name}' on '{signal}'");
                sink.emit(
                    Diagnostic::warning(
                        DiagnosticCode::UNKNOWN_ATTRIBUTE,
                        format!("unknown attribute '{name}' was dropped"),
                    )
                    .with_subject(signal)
                    .with_help(format!(
                        "known attributes: {}",
                        table.iter().map(|(k, _)| k).collect::<Vec<_>>().join(", ")
                    )),
                );
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn keep_is_translated() {
        let sink = DiagnosticSink::new();
        let out = translate_attributes(
            "led",
            &names(&["keep"]),
            &AttributeTable::icestorm(),
            &sink,
        );
        assert_eq!(out.get("keep").map(String::as_str), Some("true"));
        assert_eq!(sink.warning_count(), 0);
    }

    #[test]
    fn unsupported_is_dropped_with_warning() {
        let sink = DiagnosticSink::new();
        let out = translate_attributes(
            "rx",
            &names(&["async_reg", "no_retiming"]),
            &AttributeTable::icestorm(),
            &sink,
        );
        assert!(out.is_empty());
        let diags = sink.take_all();
        assert_eq!(diags.len(), 2);
        assert!(diags
            .iter()
            .all(|d| d.code == DiagnosticCode::UNSUPPORTED_ATTRIBUTE));
        assert_eq!(diags[0].subject.as_deref(), Some("rx"));
    }

    #[test]
    fn unknown_is_dropped_with_warning() {
        let sink = DiagnosticSink::new();
        let out = translate_attributes(
            "led",
            &names(&["keep", "pullup"]),
            &AttributeTable::icestorm(),
            &sink,
        );
        assert_eq!(out.len(), 1);
        let diags = sink.take_all();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::UNKNOWN_ATTRIBUTE);
        assert!(diags[0].help[0].contains("keep"));
    }

    struct Fixed;

    impl Platform for Fixed {
        type Design = ();

        fn device(&self) -> &str {
            "ice40-lp1k-cm36"
        }

        fn lower(
            &self,
            _design: &(),
            _attributes: &AttributeTable,
            _sink: &DiagnosticSink,
        ) -> Result<LoweredDesign, BuildError> {
            Ok(LoweredDesign::default())
        }
    }

    #[test]
    fn default_sources_are_empty() {
        let platform = Fixed;
        assert!(platform.sources().is_empty());
        assert!(platform.include_paths().is_empty());
    }
}
