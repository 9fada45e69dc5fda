//! Role resolution for the connected account.
//!
//! Both role reads are probes: a deployment that predates `owner()` or
//! `isInstructor(address)` yields [`Probe::Unsupported`] and the capability
//! is simply absent. The connection never fails because of a missing role
//! read.

use poll_core::{Address, ChainError, InterfaceDescriptor, PollContract, Probe};
use serde::{Deserialize, Serialize};

/// Which privileged roles a deployment has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoleModel {
    /// Only the owner may create and close polls.
    OwnerOnly,
    /// The owner plus an owner-managed instructor allow-list.
    #[default]
    OwnerAndInstructors,
}

impl RoleModel {
    /// Whether instructors are part of this model.
    #[must_use]
    pub fn has_instructors(self) -> bool {
        matches!(self, Self::OwnerAndInstructors)
    }
}

/// Capability flags for one session. Recomputed on every connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    /// Configured role model
    pub model: RoleModel,
    /// Result of the owner read
    pub owner: Probe<Address>,
    /// Result of the instructor read for the connected account
    pub instructor: Probe<bool>,
    /// Connected account equals the owner
    pub is_owner: bool,
    /// Connected account is on the instructor list
    pub is_instructor: bool,
}

impl Capabilities {
    /// No privileges (disconnected, or nothing could be read).
    #[must_use]
    pub fn none(model: RoleModel) -> Self {
        Self {
            model,
            owner: Probe::Unsupported,
            instructor: Probe::Unsupported,
            is_owner: false,
            is_instructor: false,
        }
    }

    /// Derive flags from probe results.
    #[must_use]
    pub fn from_probes(
        model: RoleModel,
        account: Address,
        owner: Probe<Address>,
        instructor: Probe<bool>,
    ) -> Self {
        let is_owner = owner.supported().is_some_and(|o| *o == account);
        let is_instructor = model.has_instructors() && instructor.value_or(false);
        Self {
            model,
            owner,
            instructor,
            is_owner,
            is_instructor,
        }
    }

    /// Create-poll form is shown.
    #[must_use]
    pub fn can_create(&self) -> bool {
        self.is_owner || (self.model.has_instructors() && self.is_instructor)
    }

    /// Close control is shown on open polls.
    #[must_use]
    pub fn can_close(&self) -> bool {
        self.can_create()
    }

    /// Instructor management form is shown.
    #[must_use]
    pub fn can_manage_access(&self) -> bool {
        self.is_owner && self.model.has_instructors()
    }
}

/// Reads role information for the connected account.
pub struct RoleResolver<'a> {
    contract: &'a dyn PollContract,
    descriptor: &'a InterfaceDescriptor,
    model: RoleModel,
}

impl<'a> RoleResolver<'a> {
    /// Resolver over a bound contract and its descriptor.
    #[must_use]
    pub fn new(
        contract: &'a dyn PollContract,
        descriptor: &'a InterfaceDescriptor,
        model: RoleModel,
    ) -> Self {
        Self {
            contract,
            descriptor,
            model,
        }
    }

    /// Read the owner, if the contract exposes `owner()`.
    pub async fn owner(&self) -> Probe<Address> {
        if !self.descriptor.has_function("owner") {
            tracing::debug!("RoleResolver::owner() - not in descriptor");
            return Probe::Unsupported;
        }
        unsupported_on_error("owner", self.contract.owner().await)
    }

    /// Read instructor membership, if the model and contract have it.
    pub async fn is_instructor(&self, account: Address) -> Probe<bool> {
        if !self.model.has_instructors() || !self.descriptor.has_function("isInstructor") {
            tracing::debug!("RoleResolver::is_instructor() - not available");
            return Probe::Unsupported;
        }
        unsupported_on_error("isInstructor", self.contract.is_instructor(account).await)
    }

    /// Resolve all capability flags for `account`.
    pub async fn resolve(&self, account: Address) -> Capabilities {
        let owner = self.owner().await;
        let instructor = self.is_instructor(account).await;
        let caps = Capabilities::from_probes(self.model, account, owner, instructor);
        tracing::debug!(
            account = %account,
            is_owner = caps.is_owner,
            is_instructor = caps.is_instructor,
            "RoleResolver::resolve()"
        );
        caps
    }
}

fn unsupported_on_error<T>(method: &str, result: Result<T, ChainError>) -> Probe<T> {
    match result {
        Ok(value) => Probe::Supported(value),
        Err(ChainError::MethodNotFound(_)) => {
            tracing::debug!(method, "role read not supported by this contract");
            Probe::Unsupported
        }
        Err(err) => {
            tracing::warn!(method, error = %err, "role read failed, treating as unsupported");
            Probe::Unsupported
        }
    }
}
