//! The three node kinds of the provenance graph.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::code::{Code, SlideSamplePosition, Uid};
use crate::identifier::SpecimenIdentifier;
use crate::ids::SamplingRef;
use crate::step::{Collection, PreparationStep};

/// Discriminator of a [`Specimen`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecimenKind {
    Extracted,
    Sample,
    Slide,
}

impl SpecimenKind {
    pub const ALL: [SpecimenKind; 3] = [
        SpecimenKind::Extracted,
        SpecimenKind::Sample,
        SpecimenKind::Slide,
    ];

    /// Tag used for this kind in flat records.
    pub const fn as_str(&self) -> &'static str {
        match self {
            SpecimenKind::Extracted => "extracted",
            SpecimenKind::Sample => "sample",
            SpecimenKind::Slide => "slide",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }
}

impl fmt::Display for SpecimenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root specimen, taken directly from the patient.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedSpecimen {
    pub identifier: SpecimenIdentifier,
    pub specimen_type: Code,
    pub steps: Vec<PreparationStep>,
}

impl ExtractedSpecimen {
    pub fn new(identifier: SpecimenIdentifier, specimen_type: Code) -> Self {
        Self {
            identifier,
            specimen_type,
            steps: Vec::new(),
        }
    }

    /// Record how the specimen was collected. Becomes the first step.
    #[must_use]
    pub fn with_collection(mut self, collection: Collection) -> Self {
        self.steps.insert(0, PreparationStep::Collection(collection));
        self
    }

    #[must_use]
    pub fn with_steps(mut self, steps: impl IntoIterator<Item = PreparationStep>) -> Self {
        self.steps.extend(steps);
        self
    }

    pub fn collection(&self) -> Option<&Collection> {
        match self.steps.first() {
            Some(PreparationStep::Collection(collection)) => Some(collection),
            _ => None,
        }
    }
}

/// Intermediate specimen (part, block, ...) taken from one or more others.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub identifier: SpecimenIdentifier,
    pub specimen_type: Code,
    pub sampled_from: Vec<SamplingRef>,
    pub steps: Vec<PreparationStep>,
}

impl Sample {
    pub fn new(
        identifier: SpecimenIdentifier,
        specimen_type: Code,
        sampled_from: Vec<SamplingRef>,
    ) -> Self {
        Self {
            identifier,
            specimen_type,
            sampled_from,
            steps: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_steps(mut self, steps: impl IntoIterator<Item = PreparationStep>) -> Self {
        self.steps.extend(steps);
        self
    }
}

/// Terminal specimen mounted on a slide.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideSample {
    pub identifier: SpecimenIdentifier,
    pub anatomical_sites: Vec<Code>,
    pub sampled_from: Option<SamplingRef>,
    pub uid: Option<Uid>,
    pub position: Option<SlideSamplePosition>,
    pub steps: Vec<PreparationStep>,
}

impl SlideSample {
    pub fn new(identifier: SpecimenIdentifier) -> Self {
        Self {
            identifier,
            anatomical_sites: Vec::new(),
            sampled_from: None,
            uid: None,
            position: None,
            steps: Vec::new(),
        }
    }

    #[must_use]
    pub fn sampled_from(mut self, sampling: SamplingRef) -> Self {
        self.sampled_from = Some(sampling);
        self
    }

    #[must_use]
    pub fn with_anatomical_sites(mut self, sites: Vec<Code>) -> Self {
        self.anatomical_sites = sites;
        self
    }

    #[must_use]
    pub fn with_uid(mut self, uid: Uid) -> Self {
        self.uid = Some(uid);
        self
    }

    #[must_use]
    pub fn with_position(mut self, position: SlideSamplePosition) -> Self {
        self.position = Some(position);
        self
    }

    #[must_use]
    pub fn with_steps(mut self, steps: impl IntoIterator<Item = PreparationStep>) -> Self {
        self.steps.extend(steps);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Specimen {
    Extracted(ExtractedSpecimen),
    Sample(Sample),
    Slide(SlideSample),
}

impl Specimen {
    pub fn kind(&self) -> SpecimenKind {
        match self {
            Specimen::Extracted(_) => SpecimenKind::Extracted,
            Specimen::Sample(_) => SpecimenKind::Sample,
            Specimen::Slide(_) => SpecimenKind::Slide,
        }
    }

    pub fn identifier(&self) -> &SpecimenIdentifier {
        match self {
            Specimen::Extracted(specimen) => &specimen.identifier,
            Specimen::Sample(sample) => &sample.identifier,
            Specimen::Slide(slide) => &slide.identifier,
        }
    }

    pub fn steps(&self) -> &[PreparationStep] {
        match self {
            Specimen::Extracted(specimen) => &specimen.steps,
            Specimen::Sample(sample) => &sample.steps,
            Specimen::Slide(slide) => &slide.steps,
        }
    }

    pub(crate) fn steps_mut(&mut self) -> &mut Vec<PreparationStep> {
        match self {
            Specimen::Extracted(specimen) => &mut specimen.steps,
            Specimen::Sample(sample) => &mut sample.steps,
            Specimen::Slide(slide) => &mut slide.steps,
        }
    }

    /// Sampling edges this specimen was derived by, in declaration order.
    pub fn sampled_from(&self) -> &[SamplingRef] {
        match self {
            Specimen::Extracted(_) => &[],
            Specimen::Sample(sample) => &sample.sampled_from,
            Specimen::Slide(slide) => slide.sampled_from.as_slice(),
        }
    }

    /// Indices of the `Sampling` steps in this specimen's step list.
    pub fn sampling_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.steps()
            .iter()
            .enumerate()
            .filter(|(_, step)| step.as_sampling().is_some())
            .map(|(index, _)| index)
    }

    pub fn specimen_type(&self) -> Option<&Code> {
        match self {
            Specimen::Extracted(specimen) => Some(&specimen.specimen_type),
            Specimen::Sample(sample) => Some(&sample.specimen_type),
            Specimen::Slide(_) => None,
        }
    }
}

impl From<ExtractedSpecimen> for Specimen {
    fn from(specimen: ExtractedSpecimen) -> Self {
        Self::Extracted(specimen)
    }
}

impl From<Sample> for Specimen {
    fn from(sample: Sample) -> Self {
        Self::Sample(sample)
    }
}

impl From<SlideSample> for Specimen {
    fn from(slide: SlideSample) -> Self {
        Self::Slide(slide)
    }
}
