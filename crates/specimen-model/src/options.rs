//! Configuration options for graph validation.

use serde::{Deserialize, Serialize};

/// How sampling chain constraints are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConstraintMode {
    /// Constraints must name a sampling edge in the lineage of the
    /// constrained sampling's source specimen.
    #[default]
    Strict,
    /// Constraints must name an existing sampling step; lineage is not checked.
    Lenient,
}

/// Options for building a [`SpecimenGraph`](crate::SpecimenGraph).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphOptions {
    pub constraint_mode: ConstraintMode,
}

impl GraphOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for legacy record sets with unchecked constraints.
    pub fn lenient() -> Self {
        Self {
            constraint_mode: ConstraintMode::Lenient,
        }
    }

    #[must_use]
    pub fn with_constraint_mode(mut self, mode: ConstraintMode) -> Self {
        self.constraint_mode = mode;
        self
    }
}
