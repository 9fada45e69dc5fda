//! Deployed contract generations.

use poll_core::descriptor::{DescriptorError, InterfaceDescriptor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which optional methods a simulated deployment exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContractShape {
    /// Owner plus instructor allow-list
    #[default]
    Full,
    /// `owner()` only; the owner is the single privileged account
    OwnerOnly,
    /// No role reads at all; anyone may create and close polls
    Legacy,
}

impl ContractShape {
    /// Whether `owner()` exists.
    #[must_use]
    pub fn supports_owner(self) -> bool {
        !matches!(self, Self::Legacy)
    }

    /// Whether `isInstructor`, `addInstructor`, and `removeInstructor` exist.
    #[must_use]
    pub fn supports_instructors(self) -> bool {
        matches!(self, Self::Full)
    }

    /// Interface descriptor matching this shape.
    pub fn descriptor(self) -> Result<InterfaceDescriptor, DescriptorError> {
        let full = InterfaceDescriptor::poll_board()?;
        Ok(match self {
            Self::Full => full,
            Self::OwnerOnly => {
                full.without_functions(&["isInstructor", "addInstructor", "removeInstructor"])
            }
            Self::Legacy => full.without_functions(&[
                "owner",
                "isInstructor",
                "addInstructor",
                "removeInstructor",
            ]),
        })
    }
}

impl fmt::Display for ContractShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::OwnerOnly => write!(f, "owner-only"),
            Self::Legacy => write!(f, "legacy"),
        }
    }
}

impl FromStr for ContractShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(Self::Full),
            "owner-only" => Ok(Self::OwnerOnly),
            "legacy" => Ok(Self::Legacy),
            other => Err(format!(
                "unknown contract shape '{other}' (use full, owner-only, or legacy)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptors_follow_shape() {
        let owner_only = ContractShape::OwnerOnly.descriptor().unwrap();
        assert!(owner_only.has_function("owner"));
        assert!(!owner_only.has_function("isInstructor"));

        let legacy = ContractShape::Legacy.descriptor().unwrap();
        assert!(!legacy.has_function("owner"));
        assert!(legacy.has_function("createPoll"));
    }

    #[test]
    fn test_parse_roundtrip() {
        for shape in [
            ContractShape::Full,
            ContractShape::OwnerOnly,
            ContractShape::Legacy,
        ] {
            assert_eq!(shape.to_string().parse::<ContractShape>().unwrap(), shape);
        }
        assert!("v2".parse::<ContractShape>().is_err());
    }
}
