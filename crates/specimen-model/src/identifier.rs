#![deny(unsafe_code)]

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Identifier of a specimen, optionally qualified by the issuing organisation.
///
/// Equality and ordering use the (value, issuer) pair. On the wire an
/// identifier without issuer is a bare string; with an issuer it becomes a
/// `{"value", "issuer"}` mapping.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpecimenIdentifier {
    value: String,
    issuer: Option<String>,
}

impl SpecimenIdentifier {
    pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ModelError::InvalidIdentifier(value));
        }
        Ok(Self {
            value: trimmed.to_string(),
            issuer: None,
        })
    }

    pub fn with_issuer(
        value: impl Into<String>,
        issuer: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let mut identifier = Self::new(value)?;
        let issuer = issuer.into();
        let trimmed = issuer.trim();
        if !trimmed.is_empty() {
            identifier.issuer = Some(trimmed.to_string());
        }
        Ok(identifier)
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }
}

impl fmt::Display for SpecimenIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.issuer {
            Some(issuer) => write!(f, "'{}' ({issuer})", self.value),
            None => write!(f, "'{}'", self.value),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum IdentifierRepr {
    Plain(String),
    Issued {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        issuer: Option<String>,
    },
}

impl Serialize for SpecimenIdentifier {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let repr = match &self.issuer {
            None => IdentifierRepr::Plain(self.value.clone()),
            Some(issuer) => IdentifierRepr::Issued {
                value: self.value.clone(),
                issuer: Some(issuer.clone()),
            },
        };
        repr.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SpecimenIdentifier {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let identifier = match IdentifierRepr::deserialize(deserializer)? {
            IdentifierRepr::Plain(value) => Self::new(value),
            IdentifierRepr::Issued {
                value,
                issuer: Some(issuer),
            } => Self::with_issuer(value, issuer),
            IdentifierRepr::Issued {
                value,
                issuer: None,
            } => Self::new(value),
        };
        identifier.map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_rejects_blank() {
        assert_eq!(SpecimenIdentifier::new("  S1 ").unwrap().value(), "S1");
        assert!(SpecimenIdentifier::new("   ").is_err());
    }

    #[test]
    fn issuer_takes_part_in_equality() {
        let plain = SpecimenIdentifier::new("S1").unwrap();
        let issued = SpecimenIdentifier::with_issuer("S1", "Lab A").unwrap();
        assert_ne!(plain, issued);
        assert_eq!(issued.issuer(), Some("Lab A"));
    }

    #[test]
    fn wire_form_depends_on_issuer() {
        let plain = SpecimenIdentifier::new("S1").unwrap();
        let issued = SpecimenIdentifier::with_issuer("S1", "Lab A").unwrap();
        assert_eq!(serde_json::to_string(&plain).unwrap(), r#""S1""#);
        assert_eq!(
            serde_json::to_string(&issued).unwrap(),
            r#"{"value":"S1","issuer":"Lab A"}"#
        );
        let back: SpecimenIdentifier =
            serde_json::from_str(r#"{"value":"S1","issuer":"Lab A"}"#).unwrap();
        assert_eq!(back, issued);
        let bare: SpecimenIdentifier = serde_json::from_str(r#"{"value":"S1"}"#).unwrap();
        assert_eq!(bare, plain);
    }

    #[test]
    fn blank_identifier_fails_to_decode() {
        assert!(serde_json::from_str::<SpecimenIdentifier>(r#""  ""#).is_err());
    }
}
