//! Contract interface descriptor (JSON ABI).
//!
//! The descriptor is a JSON array of function, event and constructor entries.
//! Only the parts the client inspects are modelled; unknown keys are ignored.
//! An empty array or any non-array document is a configuration error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Descriptor for the poll contract with owner and instructor roles.
pub const POLL_BOARD_ABI: &str = include_str!("../abi/poll_board.json");

/// Errors loading an interface descriptor.
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// Content is not valid JSON or an entry is malformed
    #[error("interface descriptor is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Top-level value is not an array
    #[error("interface descriptor must be a JSON array")]
    NotAnArray,
    /// Array has no entries
    #[error("interface descriptor is empty")]
    Empty,
}

/// Entry type in the descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Callable function
    Function,
    /// Emitted event
    Event,
    /// Constructor
    Constructor,
    /// Custom error
    Error,
    /// Fallback, receive, or anything newer
    #[serde(other)]
    Other,
}

/// A typed parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    /// Parameter name (may be empty)
    #[serde(default)]
    pub name: String,
    /// ABI type, e.g. `uint256`
    #[serde(rename = "type")]
    pub ty: String,
    /// Whether the parameter is an indexed event topic
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexed: Option<bool>,
}

/// One descriptor entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorEntry {
    /// Entry type
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Function or event name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Inputs
    #[serde(default)]
    pub inputs: Vec<Param>,
    /// Outputs (functions only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<Param>,
    /// `view`, `nonpayable`, ...
    #[serde(
        default,
        rename = "stateMutability",
        skip_serializing_if = "Option::is_none"
    )]
    pub state_mutability: Option<String>,
}

impl DescriptorEntry {
    fn is_named(&self, kind: EntryKind, name: &str) -> bool {
        self.kind == kind && self.name.as_deref() == Some(name)
    }
}

/// Parsed, non-empty interface descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDescriptor {
    entries: Vec<DescriptorEntry>,
}

impl InterfaceDescriptor {
    /// Parse descriptor JSON text.
    pub fn from_json(text: &str) -> Result<Self, DescriptorError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let serde_json::Value::Array(items) = value else {
            return Err(DescriptorError::NotAnArray);
        };
        if items.is_empty() {
            return Err(DescriptorError::Empty);
        }
        let entries = items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<DescriptorEntry>, _>>()?;
        Ok(Self { entries })
    }

    /// The bundled poll contract descriptor.
    pub fn poll_board() -> Result<Self, DescriptorError> {
        Self::from_json(POLL_BOARD_ABI)
    }

    /// Copy without the named functions, as an older contract shape would ship.
    #[must_use]
    pub fn without_functions(&self, names: &[&str]) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|e| {
                    !(e.kind == EntryKind::Function
                        && e.name.as_deref().is_some_and(|n| names.contains(&n)))
                })
                .cloned()
                .collect(),
        }
    }

    /// Whether a function with this name is declared.
    #[must_use]
    pub fn has_function(&self, name: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.is_named(EntryKind::Function, name))
    }

    /// Whether an event with this name is declared.
    #[must_use]
    pub fn has_event(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.is_named(EntryKind::Event, name))
    }

    /// All entries.
    #[must_use]
    pub fn entries(&self) -> &[DescriptorEntry] {
        &self.entries
    }

    /// Serialize back to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String, DescriptorError> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }
}
