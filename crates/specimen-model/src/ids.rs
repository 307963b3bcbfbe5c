#![deny(unsafe_code)]

use std::fmt;

/// Handle of a specimen inside a [`SpecimenGraph`](crate::SpecimenGraph).
///
/// Handles are arena indices and only meaningful for the graph that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpecimenId(usize);

impl SpecimenId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SpecimenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A sampling edge: the `Sampling` step at `step_index` in the step list of
/// `specimen`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SamplingRef {
    pub specimen: SpecimenId,
    pub step_index: usize,
}

impl SamplingRef {
    pub fn new(specimen: SpecimenId, step_index: usize) -> Self {
        Self {
            specimen,
            step_index,
        }
    }
}
