//! Construction errors for the specimen graph.

use thiserror::Error;

use crate::identifier::SpecimenIdentifier;
use crate::ids::SpecimenId;
use crate::step::StepKind;

/// Errors raised eagerly while building or extending a specimen graph.
///
/// Every variant names the specimen (and step index where relevant) that
/// violated the rule, so the operator can locate the offending entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Identifier value was empty after trimming.
    #[error("invalid specimen identifier '{0}'")]
    InvalidIdentifier(String),

    /// UID does not follow the dotted-numeric DICOM UID syntax.
    #[error("invalid UID '{value}': {reason}")]
    InvalidUid { value: String, reason: &'static str },

    /// Two specimens in one graph share an identifier.
    #[error("duplicate specimen identifier {identifier}")]
    DuplicateIdentifier { identifier: SpecimenIdentifier },

    /// A step was placed where the step ordering rules forbid it.
    #[error("invalid {kind} step at index {step_index} of {specimen}: {reason}")]
    InvalidStep {
        specimen: SpecimenIdentifier,
        step_index: usize,
        kind: StepKind,
        reason: &'static str,
    },

    /// A specimen variant received the wrong number of parent samplings.
    #[error("{specimen} is a {variant} and takes {expected} sampled_from entries, got {actual}")]
    InvalidCardinality {
        specimen: SpecimenIdentifier,
        variant: &'static str,
        expected: &'static str,
        actual: usize,
    },

    /// A handle that was not issued by this graph.
    #[error("unknown specimen handle {specimen} (referenced by {referenced_by})")]
    UnknownSpecimen {
        specimen: SpecimenId,
        referenced_by: SpecimenIdentifier,
    },

    /// A sampling handle does not point at a `Sampling` step.
    #[error("{source_specimen} has no sampling step at index {step_index} (referenced by {referenced_by})")]
    UnknownSampling {
        source_specimen: SpecimenIdentifier,
        step_index: usize,
        referenced_by: SpecimenIdentifier,
    },

    /// A sampling step already produced a different derived specimen.
    #[error("sampling step {step_index} of {source_specimen} already produced {consumed_by}, cannot also produce {referenced_by}")]
    SamplingConsumed {
        source_specimen: SpecimenIdentifier,
        step_index: usize,
        consumed_by: SpecimenIdentifier,
        referenced_by: SpecimenIdentifier,
    },

    /// A chain constraint points outside the ancestor lineage of its sampling.
    #[error("sampling step {step_index} of {specimen} is constrained to {constraint_specimen} step {constraint_step_index}, which is not in its lineage")]
    ConstraintOutsideLineage {
        specimen: SpecimenIdentifier,
        step_index: usize,
        constraint_specimen: SpecimenIdentifier,
        constraint_step_index: usize,
    },

    /// Staining without any substance.
    #[error("staining step requires at least one substance")]
    EmptyStaining,
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_specimen_and_index() {
        let err = ModelError::UnknownSampling {
            source_specimen: SpecimenIdentifier::new("block 1").unwrap(),
            step_index: 4,
            referenced_by: SpecimenIdentifier::new("slide 1").unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "'block 1' has no sampling step at index 4 (referenced by 'slide 1')"
        );
    }
}
