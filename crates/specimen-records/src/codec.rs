//! JSON encoding of record sets.
//!
//! A document is either a single record object or an array of records.
//! Discriminator tags are checked before typed decoding so an unknown
//! `specimen_type` or `preparation_type` is reported with the position of
//! the offending record instead of a generic serde message.

use serde_json::Value;
use tracing::debug;

use specimen_model::{GraphOptions, SpecimenGraph, SpecimenId, SpecimenKind, StepKind};

use crate::error::{RecordError, Result};
use crate::flatten::flatten;
use crate::reconstruct::{Reconstructed, Reconstructor};
use crate::record::SpecimenRecord;

pub fn to_value(records: &[SpecimenRecord]) -> Result<Value> {
    Ok(serde_json::to_value(records)?)
}

pub fn to_json(records: &[SpecimenRecord]) -> Result<String> {
    Ok(serde_json::to_string(records)?)
}

pub fn to_json_pretty(records: &[SpecimenRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

pub fn from_json(input: &str) -> Result<Vec<SpecimenRecord>> {
    let value: Value = serde_json::from_str(input)?;
    from_value(value)
}

pub fn from_value(value: Value) -> Result<Vec<SpecimenRecord>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(_) => vec![value],
        other => {
            return Err(RecordError::MalformedRecord {
                index: 0,
                reason: format!(
                    "expected a record object or an array of records, found {}",
                    json_kind(&other)
                ),
            });
        }
    };
    let records = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| decode_record(index, item))
        .collect::<Result<Vec<_>>>()?;
    debug!(records = records.len(), "decoded specimen records");
    Ok(records)
}

/// Flatten `roots` and encode the result as pretty JSON.
pub fn serialize_specimens(graph: &SpecimenGraph, roots: &[SpecimenId]) -> Result<String> {
    to_json_pretty(&flatten(graph, roots))
}

/// Decode a JSON document and rebuild its graph.
pub fn deserialize_specimens(input: &str, options: GraphOptions) -> Result<Reconstructed> {
    Reconstructor::new(options).reconstruct(from_json(input)?)
}

fn decode_record(index: usize, item: Value) -> Result<SpecimenRecord> {
    check_tags(index, &item)?;
    serde_json::from_value(item).map_err(|error| RecordError::MalformedRecord {
        index,
        reason: error.to_string(),
    })
}

fn check_tags(index: usize, item: &Value) -> Result<()> {
    let Some(object) = item.as_object() else {
        return Err(RecordError::MalformedRecord {
            index,
            reason: format!("expected an object, found {}", json_kind(item)),
        });
    };
    match object.get("specimen_type").and_then(Value::as_str) {
        None => {
            return Err(RecordError::MalformedRecord {
                index,
                reason: "missing specimen_type".to_string(),
            });
        }
        Some(tag) if SpecimenKind::from_tag(tag).is_none() => {
            return Err(RecordError::UnknownSpecimenType {
                index,
                specimen_type: tag.to_string(),
            });
        }
        Some(_) => {}
    }
    let steps = object.get("steps").and_then(Value::as_array);
    for (step_index, step) in steps.into_iter().flatten().enumerate() {
        if let Some(tag) = step.get("preparation_type").and_then(Value::as_str) {
            if StepKind::from_tag(tag).is_none() {
                return Err(RecordError::UnknownPreparationType {
                    index,
                    step_index,
                    preparation_type: tag.to_string(),
                });
            }
        }
    }
    Ok(())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_object_is_one_record() {
        let records = from_value(json!({
            "specimen_type": "extracted",
            "identifier": "part",
            "type": {"value": "430861001", "scheme_designator": "SCT", "meaning": "Gross specimen"},
            "steps": []
        }))
        .unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn unknown_specimen_type_reports_position() {
        let err = from_value(json!([
            {"specimen_type": "extracted", "identifier": "part",
             "type": {"value": "1", "scheme_designator": "SCT", "meaning": "Part"}},
            {"specimen_type": "organoid", "identifier": "x"}
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            RecordError::UnknownSpecimenType { index: 1, ref specimen_type } if specimen_type == "organoid"
        ));
    }

    #[test]
    fn unknown_preparation_type_reports_step() {
        let err = from_value(json!({
            "specimen_type": "extracted",
            "identifier": "part",
            "type": {"value": "1", "scheme_designator": "SCT", "meaning": "Part"},
            "steps": [
                {"preparation_type": "fixation",
                 "fixative": {"value": "431510009", "scheme_designator": "SCT", "meaning": "Formalin"}},
                {"preparation_type": "freezing"}
            ]
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            RecordError::UnknownPreparationType { index: 0, step_index: 1, .. }
        ));
    }

    #[test]
    fn scalar_document_is_rejected() {
        assert!(matches!(
            from_json("42"),
            Err(RecordError::MalformedRecord { index: 0, .. })
        ));
        assert!(matches!(from_json("{"), Err(RecordError::Json(_))));
    }
}
