//! Flat record format for specimen graphs.
//!
//! [`flatten`] turns a [`SpecimenGraph`](specimen_model::SpecimenGraph)
//! into one [`SpecimenRecord`] per distinct specimen, where every ancestor
//! is named by identifier and sampling step index. [`Reconstructor`] turns
//! such a record set back into a graph, rejecting duplicates, dangling
//! references and cycles. [`codec`] handles the JSON encoding.

pub mod codec;
pub mod error;
pub mod flatten;
pub mod reconstruct;
pub mod record;

pub use codec::{
    deserialize_specimens, from_json, from_value, serialize_specimens, to_json, to_json_pretty,
    to_value,
};
pub use error::{RecordError, Result};
pub use flatten::{flatten, flatten_all};
pub use reconstruct::{Reconstructed, Reconstructor, reconstruct};
pub use record::{
    ExtractedRecord, SampleRecord, SamplingReference, SlideRecord, SpecimenRecord, StepRecord,
    sort_records,
};
