//! Preparation steps recorded against a specimen.
//!
//! A specimen's history is an ordered list of dated actions. Five of the six
//! step kinds describe something done *to* the specimen; `Sampling` instead
//! records that a new specimen was cut or taken *from* it, and is the anchor
//! that derived specimens point back at.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::code::Code;
use crate::error::{ModelError, Result};
use crate::ids::SamplingRef;

/// Discriminator of a [`PreparationStep`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Collection,
    Fixation,
    Embedding,
    Processing,
    Staining,
    Sampling,
}

impl StepKind {
    pub const ALL: [StepKind; 6] = [
        StepKind::Collection,
        StepKind::Fixation,
        StepKind::Embedding,
        StepKind::Processing,
        StepKind::Staining,
        StepKind::Sampling,
    ];

    /// Tag used for this kind in flat records.
    pub const fn as_str(&self) -> &'static str {
        match self {
            StepKind::Collection => "collection",
            StepKind::Fixation => "fixation",
            StepKind::Embedding => "embedding",
            StepKind::Processing => "processing",
            StepKind::Staining => "staining",
            StepKind::Sampling => "sampling",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extraction of the specimen from the patient.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub method: Code,
    pub date_time: Option<NaiveDateTime>,
    pub description: Option<String>,
}

impl Collection {
    pub fn new(method: Code) -> Self {
        Self {
            method,
            date_time: None,
            description: None,
        }
    }

    #[must_use]
    pub fn at(mut self, date_time: NaiveDateTime) -> Self {
        self.date_time = Some(date_time);
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fixation {
    pub fixative: Code,
    pub date_time: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub medium: Code,
    pub date_time: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Processing {
    pub method: Code,
    pub date_time: Option<NaiveDateTime>,
}

/// A stain, either coded or given by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StainingSubstance {
    Code(Code),
    Text(String),
}

impl fmt::Display for StainingSubstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "{}", code.meaning),
            Self::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Staining {
    substances: Vec<StainingSubstance>,
    pub date_time: Option<NaiveDateTime>,
}

impl Staining {
    pub fn new(substances: Vec<StainingSubstance>) -> Result<Self> {
        if substances.is_empty() {
            return Err(ModelError::EmptyStaining);
        }
        Ok(Self {
            substances,
            date_time: None,
        })
    }

    pub fn substances(&self) -> &[StainingSubstance] {
        &self.substances
    }

    #[must_use]
    pub fn at(mut self, date_time: NaiveDateTime) -> Self {
        self.date_time = Some(date_time);
        self
    }
}

/// The act of taking a new specimen from the one holding this step.
#[derive(Debug, Clone, PartialEq)]
pub struct Sampling {
    pub method: Code,
    pub date_time: Option<NaiveDateTime>,
    pub description: Option<String>,
    /// Upstream sampling edges this sampling is restricted to follow.
    pub chain_constraints: Vec<SamplingRef>,
}

/// Arguments for [`SpecimenGraph::sample`](crate::SpecimenGraph::sample).
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingRequest {
    pub method: Code,
    pub date_time: Option<NaiveDateTime>,
    pub description: Option<String>,
    pub chain_constraints: Vec<SamplingRef>,
}

impl SamplingRequest {
    pub fn new(method: Code) -> Self {
        Self {
            method,
            date_time: None,
            description: None,
            chain_constraints: Vec::new(),
        }
    }

    #[must_use]
    pub fn at(mut self, date_time: NaiveDateTime) -> Self {
        self.date_time = Some(date_time);
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn constrained_to(mut self, constraints: Vec<SamplingRef>) -> Self {
        self.chain_constraints = constraints;
        self
    }
}

impl From<SamplingRequest> for Sampling {
    fn from(request: SamplingRequest) -> Self {
        Self {
            method: request.method,
            date_time: request.date_time,
            description: request.description,
            chain_constraints: request.chain_constraints,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PreparationStep {
    Collection(Collection),
    Fixation(Fixation),
    Embedding(Embedding),
    Processing(Processing),
    Staining(Staining),
    Sampling(Sampling),
}

impl PreparationStep {
    pub fn kind(&self) -> StepKind {
        match self {
            PreparationStep::Collection(_) => StepKind::Collection,
            PreparationStep::Fixation(_) => StepKind::Fixation,
            PreparationStep::Embedding(_) => StepKind::Embedding,
            PreparationStep::Processing(_) => StepKind::Processing,
            PreparationStep::Staining(_) => StepKind::Staining,
            PreparationStep::Sampling(_) => StepKind::Sampling,
        }
    }

    pub fn date_time(&self) -> Option<NaiveDateTime> {
        match self {
            PreparationStep::Collection(step) => step.date_time,
            PreparationStep::Fixation(step) => step.date_time,
            PreparationStep::Embedding(step) => step.date_time,
            PreparationStep::Processing(step) => step.date_time,
            PreparationStep::Staining(step) => step.date_time,
            PreparationStep::Sampling(step) => step.date_time,
        }
    }

    pub fn as_sampling(&self) -> Option<&Sampling> {
        match self {
            PreparationStep::Sampling(sampling) => Some(sampling),
            _ => None,
        }
    }

    /// Short human-readable description, e.g. `fixation: Formalin`.
    pub fn summary(&self) -> String {
        match self {
            PreparationStep::Collection(step) => format!("collection: {}", step.method.meaning),
            PreparationStep::Fixation(step) => format!("fixation: {}", step.fixative.meaning),
            PreparationStep::Embedding(step) => format!("embedding: {}", step.medium.meaning),
            PreparationStep::Processing(step) => format!("processing: {}", step.method.meaning),
            PreparationStep::Staining(step) => {
                let names: Vec<String> = step
                    .substances()
                    .iter()
                    .map(ToString::to_string)
                    .collect();
                format!("staining: {}", names.join(", "))
            }
            PreparationStep::Sampling(step) => format!("sampling: {}", step.method.meaning),
        }
    }
}

impl From<Collection> for PreparationStep {
    fn from(step: Collection) -> Self {
        Self::Collection(step)
    }
}

impl From<Fixation> for PreparationStep {
    fn from(step: Fixation) -> Self {
        Self::Fixation(step)
    }
}

impl From<Embedding> for PreparationStep {
    fn from(step: Embedding) -> Self {
        Self::Embedding(step)
    }
}

impl From<Processing> for PreparationStep {
    fn from(step: Processing) -> Self {
        Self::Processing(step)
    }
}

impl From<Staining> for PreparationStep {
    fn from(step: Staining) -> Self {
        Self::Staining(step)
    }
}
