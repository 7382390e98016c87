//! Diagnostic codes with category prefixes for structured error identification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The category of a diagnostic code, determining its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Error diagnostics, prefixed with `E`.
    Error,
    /// Warning diagnostics, prefixed with `W`.
    Warning,
    /// Timing diagnostics, prefixed with `T`.
    Timing,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
            Category::Timing => 'T',
        }
    }
}

/// A structured diagnostic code combining a category prefix and a numeric identifier.
///
/// Displayed as the category prefix followed by a zero-padded 3-digit number,
/// e.g. `W101`, `E202`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// A signal attribute has no equivalent in the target toolchain and was dropped.
    pub const UNSUPPORTED_ATTRIBUTE: Self = Self::new(Category::Warning, 101);
    /// A signal attribute is not known to the translation table and was dropped.
    pub const UNKNOWN_ATTRIBUTE: Self = Self::new(Category::Warning, 102);
    /// A command template contains a placeholder that is not recognized.
    pub const UNRECOGNIZED_PLACEHOLDER: Self = Self::new(Category::Warning, 103);
    /// A clock received a second period constraint.
    pub const DUPLICATE_CONSTRAINT: Self = Self::new(Category::Error, 201);
    /// The device string could not be parsed or validated.
    pub const INVALID_DEVICE: Self = Self::new(Category::Error, 202);
    /// A clock period is zero, negative, or not a number.
    pub const INVALID_PERIOD: Self = Self::new(Category::Error, 203);
    /// The platform could not lower the design.
    pub const LOWERING_FAILURE: Self = Self::new(Category::Error, 204);
    /// An external tool in the build script exited with a failure status.
    pub const TOOLCHAIN_FAILURE: Self = Self::new(Category::Error, 301);
    /// A build artifact or directory could not be written.
    pub const IO_FAILURE: Self = Self::new(Category::Error, 302);

    /// Creates a new diagnostic code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}
