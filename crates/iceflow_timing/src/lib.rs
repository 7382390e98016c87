//! Timing constraint tracking for the static timing analyzer.
//!
//! [`PeriodConstraints`] accumulates per-clock period requirements and
//! reduces them to the single frequency bound handed to icetime.

#![warn(missing_docs)]

pub mod constraints;

pub use constraints::{ConstraintError, PeriodConstraint, PeriodConstraints};
