//! Flat wire records.
//!
//! Each specimen becomes one self-contained record. Ancestors are never
//! embedded; they are named by identifier plus the index of the `sampling`
//! step in the ancestor's own step list.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

use specimen_model::{
    Code, SlideSamplePosition, SpecimenIdentifier, SpecimenKind, StainingSubstance, StepKind, Uid,
};

/// Reference to the sampling step at `sampling_step_index` of `identifier`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SamplingReference {
    pub identifier: SpecimenIdentifier,
    pub sampling_step_index: usize,
}

impl SamplingReference {
    pub fn new(identifier: SpecimenIdentifier, sampling_step_index: usize) -> Self {
        Self {
            identifier,
            sampling_step_index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "preparation_type", rename_all = "snake_case")]
pub enum StepRecord {
    Collection {
        method: Code,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        date_time: Option<NaiveDateTime>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Fixation {
        fixative: Code,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        date_time: Option<NaiveDateTime>,
    },
    Embedding {
        medium: Code,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        date_time: Option<NaiveDateTime>,
    },
    Processing {
        method: Code,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        date_time: Option<NaiveDateTime>,
    },
    Staining {
        substances: Vec<StainingSubstance>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        date_time: Option<NaiveDateTime>,
    },
    Sampling {
        method: Code,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        date_time: Option<NaiveDateTime>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(
            default,
            skip_serializing_if = "Vec::is_empty",
            deserialize_with = "null_as_empty"
        )]
        sampling_chain_constraints: Vec<SamplingReference>,
    },
}

impl StepRecord {
    pub fn kind(&self) -> StepKind {
        match self {
            StepRecord::Collection { .. } => StepKind::Collection,
            StepRecord::Fixation { .. } => StepKind::Fixation,
            StepRecord::Embedding { .. } => StepKind::Embedding,
            StepRecord::Processing { .. } => StepKind::Processing,
            StepRecord::Staining { .. } => StepKind::Staining,
            StepRecord::Sampling { .. } => StepKind::Sampling,
        }
    }

    pub fn chain_constraints(&self) -> &[SamplingReference] {
        match self {
            StepRecord::Sampling {
                sampling_chain_constraints,
                ..
            } => sampling_chain_constraints,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub identifier: SpecimenIdentifier,
    #[serde(rename = "type")]
    pub specimen_type: Code,
    #[serde(default)]
    pub steps: Vec<StepRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    pub identifier: SpecimenIdentifier,
    #[serde(rename = "type")]
    pub specimen_type: Code,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sampled_from: Vec<SamplingReference>,
    #[serde(default)]
    pub steps: Vec<StepRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideRecord {
    pub identifier: SpecimenIdentifier,
    #[serde(default)]
    pub anatomical_sites: Vec<Code>,
    /// A single reference on the wire. Lists are accepted on decode so the
    /// reconstructor can reject them with a cardinality error.
    #[serde(default, skip_serializing_if = "Vec::is_empty", with = "one_or_many")]
    pub sampled_from: Vec<SamplingReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<Uid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<SlideSamplePosition>,
    #[serde(default)]
    pub steps: Vec<StepRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "specimen_type", rename_all = "snake_case")]
pub enum SpecimenRecord {
    Extracted(ExtractedRecord),
    Sample(SampleRecord),
    Slide(SlideRecord),
}

impl SpecimenRecord {
    pub fn kind(&self) -> SpecimenKind {
        match self {
            SpecimenRecord::Extracted(_) => SpecimenKind::Extracted,
            SpecimenRecord::Sample(_) => SpecimenKind::Sample,
            SpecimenRecord::Slide(_) => SpecimenKind::Slide,
        }
    }

    pub fn identifier(&self) -> &SpecimenIdentifier {
        match self {
            SpecimenRecord::Extracted(record) => &record.identifier,
            SpecimenRecord::Sample(record) => &record.identifier,
            SpecimenRecord::Slide(record) => &record.identifier,
        }
    }

    pub fn steps(&self) -> &[StepRecord] {
        match self {
            SpecimenRecord::Extracted(record) => &record.steps,
            SpecimenRecord::Sample(record) => &record.steps,
            SpecimenRecord::Slide(record) => &record.steps,
        }
    }

    pub fn sampled_from(&self) -> &[SamplingReference] {
        match self {
            SpecimenRecord::Extracted(_) => &[],
            SpecimenRecord::Sample(record) => &record.sampled_from,
            SpecimenRecord::Slide(record) => &record.sampled_from,
        }
    }

    /// Identifiers that must be built before this record: its sources,
    /// then the specimens named by its own chain constraints.
    pub fn dependencies(&self) -> Vec<&SpecimenIdentifier> {
        let mut dependencies: Vec<&SpecimenIdentifier> = Vec::new();
        let constraints = self.steps().iter().flat_map(StepRecord::chain_constraints);
        for reference in self.sampled_from().iter().chain(constraints) {
            if !dependencies.contains(&&reference.identifier) {
                dependencies.push(&reference.identifier);
            }
        }
        dependencies
    }
}

/// Sort records by identifier, giving a canonical order for comparison and
/// stable output.
pub fn sort_records(records: &mut [SpecimenRecord]) {
    records.sort_by(|left, right| left.identifier().cmp(right.identifier()));
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

mod one_or_many {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::SamplingReference;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(SamplingReference),
        Many(Vec<SamplingReference>),
    }

    pub fn serialize<S: Serializer>(
        references: &[SamplingReference],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match references {
            [single] => single.serialize(serializer),
            many => many.serialize(serializer),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<SamplingReference>, D::Error> {
        Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
            None => Vec::new(),
            Some(OneOrMany::One(reference)) => vec![reference],
            Some(OneOrMany::Many(references)) => references,
        })
    }
}
