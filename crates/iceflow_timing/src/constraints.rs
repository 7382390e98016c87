//! Period constraints and their reduction to a single timing target.
//!
//! icetime accepts exactly one global frequency bound. Constraints are kept
//! per clock and the fastest one is checked against the whole design: if
//! the design closes at the fastest clock, every slower clock closes too.
//! This is pessimistic for multi-clock designs.

use iceflow_common::Frequency;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Errors produced while registering period constraints.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConstraintError {
    /// The clock already has a period constraint.
    #[error("period constraint already added to clock '{clock}'")]
    DuplicateConstraint {
        /// The clock identity that was registered twice.
        clock: String,
    },

    /// The period is zero, negative, or not a finite number.
    #[error("invalid period {period_ns} ns for clock '{clock}'")]
    InvalidPeriod {
        /// The clock identity.
        clock: String,
        /// The rejected period.
        period_ns: f64,
    },
}

/// A single registered clock constraint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodConstraint {
    /// Required period in nanoseconds.
    pub period_ns: f64,
    /// Required frequency in MHz, exactly `1000.0 / period_ns`.
    pub mhz: f64,
}

impl PeriodConstraint {
    /// Creates the constraint for a clock with the given period.
    pub fn from_period_ns(period_ns: f64) -> Self {
        Self {
            period_ns,
            mhz: 1000.0 / period_ns,
        }
    }

    /// Returns the required frequency.
    pub fn frequency(&self) -> Frequency {
        Frequency::from_mhz(self.mhz)
    }
}

/// The set of period constraints registered on one toolchain instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeriodConstraints {
    clocks: BTreeMap<String, PeriodConstraint>,
}

impl PeriodConstraints {
    /// Creates an empty constraint set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a period constraint for `clock`.
    ///
    /// A second constraint on the same clock is rejected and the first one
    /// is kept.
    pub fn add_period_constraint(
        &mut self,
        clock: impl Into<String>,
        period_ns: f64,
    ) -> Result<(), ConstraintError> {
        let clock = clock.into();
        if !(period_ns.is_finite() && period_ns > 0.0) {
            return Err(ConstraintError::InvalidPeriod { clock, period_ns });
        }
        if self.clocks.contains_key(&clock) {
            return Err(ConstraintError::DuplicateConstraint { clock });
        }

        let constraint = PeriodConstraint::from_period_ns(period_ns);
        log::debug!(
            "period constraint on '{clock}': {period_ns} ns ({})",
            constraint.frequency()
        );
        self.clocks.insert(clock, constraint);
        Ok(())
    }

    /// Returns the constraint registered for `clock`, if any.
    pub fn get(&self, clock: &str) -> Option<&PeriodConstraint> {
        self.clocks.get(clock)
    }

    /// Returns the highest registered frequency in MHz, or `0.0` when no
    /// constraint is registered.
    pub fn worst_case_frequency(&self) -> f64 {
        self.clocks
            .values()
            .map(|c| c.mhz)
            .fold(0.0, f64::max)
    }

    /// Returns the number of constrained clocks.
    pub fn len(&self) -> usize {
        self.clocks.len()
    }

    /// Returns `true` if no clock is constrained.
    pub fn is_empty(&self) -> bool {
        self.clocks.is_empty()
    }

    /// Iterates over constraints in clock-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PeriodConstraint)> {
        self.clocks.iter().map(|(k, v)| (k.as_str(), v))
    }
}
