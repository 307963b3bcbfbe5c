//! Errors for flattening, decoding and reconstruction.

use thiserror::Error;

use specimen_model::{ModelError, SpecimenIdentifier};

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("duplicate specimen identifier {identifier}")]
    DuplicateIdentifier { identifier: SpecimenIdentifier },

    /// The listed identifiers reference each other in a loop; the first
    /// identifier is repeated at the end.
    #[error("cyclic specimen reference: {}", format_cycle(.cycle))]
    CyclicReference { cycle: Vec<SpecimenIdentifier> },

    #[error("{referenced_by} references {identifier}, which is not in the record set")]
    MissingSpecimen {
        identifier: SpecimenIdentifier,
        referenced_by: SpecimenIdentifier,
    },

    #[error("{referenced_by} references step {step_index} of {identifier}, which is not a sampling step")]
    DanglingStepReference {
        identifier: SpecimenIdentifier,
        step_index: usize,
        referenced_by: SpecimenIdentifier,
    },

    #[error("record {index}: unknown specimen_type '{specimen_type}'")]
    UnknownSpecimenType { index: usize, specimen_type: String },

    #[error("record {index}, step {step_index}: unknown preparation_type '{preparation_type}'")]
    UnknownPreparationType {
        index: usize,
        step_index: usize,
        preparation_type: String,
    },

    #[error("{identifier} is a {specimen_type} and takes {expected} sampled_from entries, got {actual}")]
    InvalidCardinality {
        identifier: SpecimenIdentifier,
        specimen_type: &'static str,
        expected: &'static str,
        actual: usize,
    },

    #[error("sampling step {step_index} of {identifier} is referenced by both {first} and {second}")]
    SamplingConsumed {
        identifier: SpecimenIdentifier,
        step_index: usize,
        first: SpecimenIdentifier,
        second: SpecimenIdentifier,
    },

    #[error("sampling step {step_index} of {identifier} is constrained to step {constraint_step_index} of {constraint}, which is not in its lineage")]
    InvalidChainConstraint {
        identifier: SpecimenIdentifier,
        step_index: usize,
        constraint: SpecimenIdentifier,
        constraint_step_index: usize,
    },

    #[error(transparent)]
    InvalidStep(ModelError),

    #[error("record {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RecordError>;

impl From<ModelError> for RecordError {
    fn from(error: ModelError) -> Self {
        match error {
            ModelError::DuplicateIdentifier { identifier } => {
                RecordError::DuplicateIdentifier { identifier }
            }
            ModelError::InvalidCardinality {
                specimen,
                variant,
                expected,
                actual,
            } => RecordError::InvalidCardinality {
                identifier: specimen,
                specimen_type: variant,
                expected,
                actual,
            },
            ModelError::UnknownSampling {
                source_specimen,
                step_index,
                referenced_by,
            } => RecordError::DanglingStepReference {
                identifier: source_specimen,
                step_index,
                referenced_by,
            },
            ModelError::SamplingConsumed {
                source_specimen,
                step_index,
                consumed_by,
                referenced_by,
            } => RecordError::SamplingConsumed {
                identifier: source_specimen,
                step_index,
                first: consumed_by,
                second: referenced_by,
            },
            ModelError::ConstraintOutsideLineage {
                specimen,
                step_index,
                constraint_specimen,
                constraint_step_index,
            } => RecordError::InvalidChainConstraint {
                identifier: specimen,
                step_index,
                constraint: constraint_specimen,
                constraint_step_index,
            },
            other => RecordError::InvalidStep(other),
        }
    }
}

fn format_cycle(cycle: &[SpecimenIdentifier]) -> String {
    cycle
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}
