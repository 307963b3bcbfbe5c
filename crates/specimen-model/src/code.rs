//! Coded concepts, DICOM UIDs and slide positions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// A coded concept such as a SNOMED CT term.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Code {
    pub value: String,
    pub scheme_designator: String,
    pub meaning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme_version: Option<String>,
}

impl Code {
    pub fn new(
        value: impl Into<String>,
        scheme_designator: impl Into<String>,
        meaning: impl Into<String>,
    ) -> Self {
        Self {
            value: value.into(),
            scheme_designator: scheme_designator.into(),
            meaning: meaning.into(),
            scheme_version: None,
        }
    }

    /// SNOMED CT concept.
    pub fn sct(value: impl Into<String>, meaning: impl Into<String>) -> Self {
        Self::new(value, "SCT", meaning)
    }

    #[must_use]
    pub fn with_scheme_version(mut self, version: impl Into<String>) -> Self {
        self.scheme_version = Some(version.into());
        self
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.meaning, self.scheme_designator, self.value)
    }
}

/// Maximum length of a DICOM UID (PS3.5 section 9.1).
const MAX_UID_LEN: usize = 64;

/// A DICOM unique identifier (`1.2.840...`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Uid(String);

impl Uid {
    pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
        let value = value.into();
        let invalid = |reason| ModelError::InvalidUid {
            value: value.clone(),
            reason,
        };
        if value.is_empty() || value.len() > MAX_UID_LEN {
            return Err(invalid("length must be between 1 and 64 characters"));
        }
        for component in value.split('.') {
            if component.is_empty() {
                return Err(invalid("empty component"));
            }
            if !component.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid("components must be numeric"));
            }
            if component.len() > 1 && component.starts_with('0') {
                return Err(invalid("components must not have leading zeros"));
            }
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Uid {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Uid> for String {
    fn from(uid: Uid) -> Self {
        uid.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a sample sits on its slide: a named region or a coordinate in mm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlideSamplePosition {
    Named(String),
    Coordinate { x: f64, y: f64, z: f64 },
}

impl fmt::Display for SlideSamplePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Coordinate { x, y, z } => write!(f, "({x}, {y}, {z}) mm"),
        }
    }
}
