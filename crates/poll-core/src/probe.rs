//! Capability probe results.
//!
//! Some deployments predate the owner or instructor reads. A [`Probe`] keeps
//! "the contract answered false" apart from "the contract cannot be asked".

use serde::{Deserialize, Serialize};

/// Outcome of reading an optional contract method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Probe<T> {
    /// The method exists and returned a value
    Supported(T),
    /// The deployed contract does not expose the method
    Unsupported,
}

impl<T> Probe<T> {
    /// Returns `true` if the method is available.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Supported(_))
    }

    /// The value, if supported.
    #[must_use]
    pub fn supported(&self) -> Option<&T> {
        match self {
            Self::Supported(v) => Some(v),
            Self::Unsupported => None,
        }
    }

    /// Map the supported value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Probe<U> {
        match self {
            Self::Supported(v) => Probe::Supported(f(v)),
            Self::Unsupported => Probe::Unsupported,
        }
    }

    /// The value, or `denied` when unsupported.
    pub fn value_or(self, denied: T) -> T {
        match self {
            Self::Supported(v) => v,
            Self::Unsupported => denied,
        }
    }
}
