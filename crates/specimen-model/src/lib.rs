//! Specimen provenance model.
//!
//! Models the chain of custody of a tissue specimen, from extraction through
//! sampling into blocks and sections down to the sample mounted on a slide,
//! as a directed acyclic graph.
//!
//! # Example
//!
//! ```
//! use specimen_model::{
//!     Code, ExtractedSpecimen, Sample, SamplingRequest, SlideSample, SpecimenGraph,
//!     SpecimenIdentifier,
//! };
//!
//! # fn main() -> Result<(), specimen_model::ModelError> {
//! let mut graph = SpecimenGraph::new();
//! let part = graph.insert(ExtractedSpecimen::new(
//!     SpecimenIdentifier::new("part 1")?,
//!     Code::sct("430861001", "Gross specimen"),
//! ))?;
//! let to_block = graph.sample(part, SamplingRequest::new(Code::sct("122459003", "Dissection")))?;
//! let block = graph.insert(Sample::new(
//!     SpecimenIdentifier::new("block 1")?,
//!     Code::sct("430861001", "Gross specimen"),
//!     vec![to_block],
//! ))?;
//! let to_slide = graph.sample(block, SamplingRequest::new(Code::sct("434472006", "Block sectioning")))?;
//! let slide = graph.insert(SlideSample::new(SpecimenIdentifier::new("slide 1")?).sampled_from(to_slide))?;
//!
//! assert_eq!(graph.terminals(), vec![slide]);
//! assert_eq!(graph.ancestors(slide), vec![block, part]);
//! # Ok(())
//! # }
//! ```

pub mod code;
pub mod error;
pub mod graph;
pub mod identifier;
pub mod ids;
pub mod options;
pub mod specimen;
pub mod step;

pub use code::{Code, SlideSamplePosition, Uid};
pub use error::{ModelError, Result};
pub use graph::{HistoryEntry, SpecimenGraph};
pub use identifier::SpecimenIdentifier;
pub use ids::{SamplingRef, SpecimenId};
pub use options::{ConstraintMode, GraphOptions};
pub use specimen::{ExtractedSpecimen, Sample, SlideSample, Specimen, SpecimenKind};
pub use step::{
    Collection, Embedding, Fixation, PreparationStep, Processing, Sampling, SamplingRequest,
    Staining, StainingSubstance, StepKind,
};
