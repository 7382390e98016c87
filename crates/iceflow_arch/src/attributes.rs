//! Translation of abstract signal attributes into toolchain syntax.
//!
//! Front ends mark signals with abstract attributes such as `keep` or
//! `async_reg`. Each toolchain either knows a spelling for the attribute or
//! has no way to express it at all. A table is built per toolchain instance
//! and only read afterwards.

use std::collections::BTreeMap;

/// How a single abstract attribute is expressed by the toolchain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    /// The attribute is emitted as `name = value`.
    Translated {
        /// Attribute name understood by the synthesis tool.
        name: String,
        /// Attribute value understood by the synthesis tool.
        value: String,
    },
    /// The toolchain has no equivalent; the attribute must be dropped.
    Unsupported,
}

/// Mapping from abstract attribute names to their toolchain translation.
#[derive(Debug, Clone, Default)]
pub struct AttributeTable {
    entries: BTreeMap<String, Translation>,
}

impl AttributeTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The table for the IceStorm flow.
    ///
    /// Only `keep` reaches yosys. Retiming control, clock-domain-crossing
    /// markers and shift-register extraction hints have no consumer: yosys
    /// does not honor a per-signal retiming veto, and neither arachne-pnr
    /// nor icetime reads custom attributes. The iCE40 has no shift register
    /// primitive to extract into.
    pub fn icestorm() -> Self {
        let mut table = Self::new();
        table.insert("keep", Translation::translated("keep", "true"));
        for name in [
            "no_retiming",
            "async_reg",
            "mr_ff",
            "mr_false_path",
            "ars_ff1",
            "ars_ff2",
            "ars_false_path",
            "no_shreg_extract",
        ] {
            table.insert(name, Translation::Unsupported);
        }
        table
    }

    /// Adds or replaces an entry. Intended for table construction only.
    pub fn insert(&mut self, name: impl Into<String>, translation: Translation) {
        self.entries.insert(name.into(), translation);
    }

    /// Looks up an attribute. `None` means the name is not known at all.
    pub fn lookup(&self, name: &str) -> Option<&Translation> {
        self.entries.get(name)
    }

    /// Iterates over all entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Translation)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Translation {
    /// Shorthand for [`Translation::Translated`].
    pub fn translated(name: impl Into<String>, value: impl Into<String>) -> Self {
        Translation::Translated {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keep_is_translated() {
        let table = AttributeTable::icestorm();
        assert_eq!(
            table.lookup("keep"),
            Some(&Translation::translated("keep", "true"))
        );
    }

    #[test]
    fn retiming_and_cdc_markers_are_unsupported() {
        let table = AttributeTable::icestorm();
        for name in ["no_retiming", "async_reg", "ars_ff1", "no_shreg_extract"] {
            assert_eq!(table.lookup(name), Some(&Translation::Unsupported), "{name}");
        }
    }

    #[test]
    fn unknown_attribute_has_no_entry() {
        assert!(AttributeTable::icestorm().lookup("ram_style").is_none());
    }

    #[test]
    fn instances_are_independent() {
        let mut custom = AttributeTable::icestorm();
        custom.insert("async_reg", Translation::translated("async_reg", "1"));
        assert_eq!(
            AttributeTable::icestorm().lookup("async_reg"),
            Some(&Translation::Unsupported)
        );
        assert_eq!(custom.len(), AttributeTable::icestorm().len());
    }
}
