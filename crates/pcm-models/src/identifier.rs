//! Business identifiers and typed references (`"Type/id"`).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// A `{system, value}` business identifier, FHIR's `Identifier` element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    pub system: String,
    pub value: String,
}

impl Identifier {
    pub fn new(system: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            value: value.into(),
        }
    }

    /// Renders as `system|value`, the wire form used in search parameters
    /// and in the token/introspection `patient` claim.
    pub fn as_pipe_form(&self) -> String {
        format!("{}|{}", self.system, self.value)
    }

    /// Parses `system|value` or a bare `value` (system defaults to `default_system`).
    pub fn parse(raw: &str, default_system: &str) -> Result<Self> {
        match raw.split_once('|') {
            Some((system, value)) if !value.is_empty() => Ok(Self::new(system, value)),
            Some(_) => Err(Error::InvalidIdentifier(raw.to_string())),
            None if !raw.is_empty() => Ok(Self::new(default_system, raw)),
            None => Err(Error::InvalidIdentifier(raw.to_string())),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_pipe_form())
    }
}

/// A typed `"ResourceType/id"` reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct Reference {
    pub resource_type: String,
    pub id: String,
}

impl Reference {
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource_type, self.id)
    }
}

impl TryFrom<String> for Reference {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value
            .split_once('/')
            .map(|(t, i)| Reference::new(t, i))
            .ok_or_else(|| Error::InvalidReference(value.clone()))
    }
}

impl From<Reference> for String {
    fn from(r: Reference) -> String {
        r.to_string()
    }
}
