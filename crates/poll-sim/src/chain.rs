//! In-memory chain hosting one poll contract.
//!
//! [`SimChain`] keeps contract storage, the event log, pending transactions,
//! and receipts behind a single lock. Access rules mirror the deployed
//! contract closely enough for client testing:
//!
//! - one vote per account per poll, only while the poll is open
//! - 2..=10 options per poll
//! - the owner (and, for [`ContractShape::Full`], instructors) may create and
//!   close polls; on [`ContractShape::Legacy`] anyone may
//! - only the owner manages instructors
//!
//! Submissions are checked against current state first (a failing check is
//! reported as a revert from `send`, the way gas estimation surfaces it) and
//! executed again when mined, so two racing submissions can still revert at
//! mining time.
//!
//! # Mining
//!
//! [`MiningMode::Instant`] mines every transaction as it is submitted.
//! [`MiningMode::Manual`] leaves transactions pending until [`SimChain::mine`]
//! is called, which lets tests observe the submitted/pending phase.

use crate::shape::ContractShape;
use parking_lot::Mutex;
use poll_core::{
    Address, ChainError, ChainId, ChainResult, ContractEvent, EventLog, LogFilter, PollId,
    PollTuple, Receipt, TxHash, WriteCall, MAX_OPTIONS, MIN_OPTIONS,
};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;
use tokio::sync::Notify;

/// Errors persisting chain state.
#[derive(Debug, Error)]
pub enum SimError {
    /// File I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// State file is not valid JSON
    #[error("state file is invalid: {0}")]
    Json(#[from] serde_json::Error),
}

/// When submitted transactions are mined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MiningMode {
    /// Mine on submission
    #[default]
    Instant,
    /// Mine only when [`SimChain::mine`] is called
    Manual,
}

/// Stored poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollRecord {
    /// Question text
    pub question: String,
    /// Option labels
    pub options: Vec<String>,
    /// Per-option tallies
    pub votes: Vec<u64>,
    /// Accepting votes
    pub open: bool,
    /// Accounts that voted
    pub voters: BTreeSet<Address>,
}

/// A submitted, unmined transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTx {
    /// Transaction hash
    pub hash: TxHash,
    /// Signing account
    pub from: Address,
    /// Requested call
    pub call: WriteCall,
}

/// Result of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TxOutcome {
    /// Executed successfully
    Success {
        /// Including block
        block_number: u64,
    },
    /// Reverted during execution
    Reverted {
        /// Including block
        block_number: u64,
        /// Revert reason
        reason: String,
    },
}

/// Complete persisted chain state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainState {
    /// Chain this contract lives on
    pub chain_id: ChainId,
    /// Contract address
    pub contract: Address,
    /// Deployed shape
    pub shape: ContractShape,
    /// Deploying account
    pub owner: Address,
    /// Instructor allow-list
    #[serde(default)]
    pub instructors: BTreeSet<Address>,
    /// Polls by index
    #[serde(default)]
    pub polls: Vec<PollRecord>,
    /// Emitted events in chain order
    #[serde(default)]
    pub logs: Vec<EventLog>,
    /// Latest block
    pub block_number: u64,
    /// Submission counter used for hashes
    #[serde(default)]
    pub nonce: u64,
    /// Unmined transactions in submission order
    #[serde(default)]
    pub pending: Vec<PendingTx>,
    /// Settled transactions
    #[serde(default)]
    pub receipts: BTreeMap<TxHash, TxOutcome>,
}

impl ChainState {
    fn can_moderate(&self, account: Address) -> bool {
        match self.shape {
            ContractShape::Legacy => true,
            ContractShape::OwnerOnly => account == self.owner,
            ContractShape::Full => account == self.owner || self.instructors.contains(&account),
        }
    }

    fn poll(&self, poll: PollId) -> Result<&PollRecord, String> {
        usize::try_from(poll.0)
            .ok()
            .and_then(|i| self.polls.get(i))
            .ok_or_else(|| "Invalid poll".to_string())
    }

    /// Check a call against current state and return the events it would emit.
    fn check(&self, from: Address, call: &WriteCall) -> Result<Vec<ContractEvent>, String> {
        match call {
            WriteCall::Vote { poll, option } => {
                let record = self.poll(*poll)?;
                if !record.open {
                    return Err("Poll is closed".to_string());
                }
                if *option >= record.options.len() as u64 {
                    return Err("Invalid option".to_string());
                }
                if record.voters.contains(&from) {
                    return Err("Already voted".to_string());
                }
                Ok(vec![ContractEvent::VoteCast {
                    poll: *poll,
                    voter: from,
                    option: *option,
                }])
            }
            WriteCall::CreatePoll { question, options } => {
                if !self.can_moderate(from) {
                    return Err("Not authorized".to_string());
                }
                if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&options.len()) {
                    return Err("Need 2-10 options".to_string());
                }
                Ok(vec![ContractEvent::PollCreated {
                    poll: PollId(self.polls.len() as u64),
                    question: question.clone(),
                    options: options.clone(),
                }])
            }
            WriteCall::ClosePoll { poll } => {
                if !self.can_moderate(from) {
                    return Err("Not authorized".to_string());
                }
                if !self.poll(*poll)?.open {
                    return Err("Poll already closed".to_string());
                }
                Ok(vec![ContractEvent::PollClosed { poll: *poll }])
            }
            WriteCall::AddInstructor { account } => {
                if from != self.owner {
                    return Err("Only owner".to_string());
                }
                if self.instructors.contains(account) {
                    return Err("Already an instructor".to_string());
                }
                Ok(vec![ContractEvent::InstructorAdded { account: *account }])
            }
            WriteCall::RemoveInstructor { account } => {
                if from != self.owner {
                    return Err("Only owner".to_string());
                }
                if !self.instructors.contains(account) {
                    return Err("Not an instructor".to_string());
                }
                Ok(vec![ContractEvent::InstructorRemoved { account: *account }])
            }
        }
    }

    /// Execute a checked call's events against storage.
    fn apply(&mut self, events: &[ContractEvent]) {
        for event in events {
            match event {
                ContractEvent::VoteCast {
                    poll,
                    voter,
                    option,
                } => {
                    if let Some(record) = self.polls.get_mut(poll.0 as usize) {
                        if let Some(tally) = record.votes.get_mut(*option as usize) {
                            *tally += 1;
                        }
                        record.voters.insert(*voter);
                    }
                }
                ContractEvent::PollCreated {
                    question, options, ..
                } => self.polls.push(PollRecord {
                    question: question.clone(),
                    options: options.clone(),
                    votes: vec![0; options.len()],
                    open: true,
                    voters: BTreeSet::new(),
                }),
                ContractEvent::PollClosed { poll } => {
                    if let Some(record) = self.polls.get_mut(poll.0 as usize) {
                        record.open = false;
                    }
                }
                ContractEvent::InstructorAdded { account } => {
                    self.instructors.insert(*account);
                }
                ContractEvent::InstructorRemoved { account } => {
                    self.instructors.remove(account);
                }
            }
        }
    }

    fn mine_pending(&mut self) -> Vec<(TxHash, TxOutcome)> {
        let pending = std::mem::take(&mut self.pending);
        let mut settled = Vec::with_capacity(pending.len());
        for tx in pending {
            self.block_number += 1;
            let block_number = self.block_number;
            let outcome = match self.check(tx.from, &tx.call) {
                Ok(events) => {
                    self.apply(&events);
                    for (i, event) in events.into_iter().enumerate() {
                        self.logs.push(EventLog {
                            block_number,
                            tx_hash: tx.hash,
                            log_index: i as u32,
                            event,
                        });
                    }
                    TxOutcome::Success { block_number }
                }
                Err(reason) => TxOutcome::Reverted {
                    block_number,
                    reason,
                },
            };
            self.receipts.insert(tx.hash, outcome.clone());
            settled.push((tx.hash, outcome));
        }
        settled
    }
}

#[derive(Debug, Default)]
struct Faults {
    read_error: Option<ChainError>,
    poll_read_error: Option<(PollId, ChainError)>,
}

/// Simulated chain with one deployed poll contract.
#[derive(Debug)]
pub struct SimChain {
    state: Mutex<ChainState>,
    mode: Mutex<MiningMode>,
    faults: Mutex<Faults>,
    mined: Notify,
}

impl SimChain {
    /// Deploy a fresh contract owned by `owner`.
    #[must_use]
    pub fn deploy(
        chain_id: ChainId,
        contract: Address,
        owner: Address,
        shape: ContractShape,
    ) -> Self {
        Self::from_state(ChainState {
            chain_id,
            contract,
            shape,
            owner,
            instructors: BTreeSet::new(),
            polls: Vec::new(),
            logs: Vec::new(),
            block_number: 1,
            nonce: 0,
            pending: Vec::new(),
            receipts: BTreeMap::new(),
        })
    }

    /// Resume from saved state.
    #[must_use]
    pub fn from_state(state: ChainState) -> Self {
        Self {
            state: Mutex::new(state),
            mode: Mutex::new(MiningMode::default()),
            faults: Mutex::new(Faults::default()),
            mined: Notify::new(),
        }
    }

    /// Load state from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_state(serde_json::from_str(&text)?))
    }

    /// Write state to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SimError> {
        let text = serde_json::to_string_pretty(&self.snapshot())?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> ChainState {
        self.state.lock().clone()
    }

    /// Chain id.
    #[must_use]
    pub fn chain_id(&self) -> ChainId {
        self.state.lock().chain_id
    }

    /// Contract address.
    #[must_use]
    pub fn contract_address(&self) -> Address {
        self.state.lock().contract
    }

    /// Deployed shape.
    #[must_use]
    pub fn shape(&self) -> ContractShape {
        self.state.lock().shape
    }

    /// Change the mining mode. Switching to instant mines anything pending.
    pub fn set_mining(&self, mode: MiningMode) {
        *self.mode.lock() = mode;
        if mode == MiningMode::Instant {
            self.mine();
        }
    }

    /// Number of unmined transactions.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Mine all pending transactions, one block each, and wake waiters.
    pub fn mine(&self) -> Vec<(TxHash, TxOutcome)> {
        let settled = self.state.lock().mine_pending();
        if !settled.is_empty() {
            tracing::debug!(count = settled.len(), "SimChain::mine() - settled transactions");
            self.mined.notify_waiters();
        }
        settled
    }

    /// Produce empty blocks.
    pub fn advance_blocks(&self, blocks: u64) {
        self.state.lock().block_number += blocks;
    }

    /// Make every read fail with `error` (or clear with `None`).
    pub fn fail_reads_with(&self, error: Option<ChainError>) {
        self.faults.lock().read_error = error;
    }

    /// Make `getPoll(poll)` fail with `error`.
    pub fn fail_poll_read(&self, poll: PollId, error: ChainError) {
        self.faults.lock().poll_read_error = Some((poll, error));
    }

    fn read<T>(&self, f: impl FnOnce(&ChainState) -> ChainResult<T>) -> ChainResult<T> {
        if let Some(error) = self.faults.lock().read_error.clone() {
            return Err(error);
        }
        f(&self.state.lock())
    }

    pub(crate) fn poll_count(&self) -> ChainResult<u64> {
        self.read(|s| Ok(s.polls.len() as u64))
    }

    pub(crate) fn get_poll(&self, poll: PollId) -> ChainResult<PollTuple> {
        if let Some((failing, error)) = &self.faults.lock().poll_read_error {
            if *failing == poll {
                return Err(error.clone());
            }
        }
        self.read(|s| {
            let record = s.poll(poll).map_err(|reason| ChainError::Reverted { reason })?;
            Ok(PollTuple {
                question: record.question.clone(),
                options: record.options.clone(),
                vote_counts: record.votes.clone(),
                is_open: record.open,
            })
        })
    }

    pub(crate) fn has_voted(&self, poll: PollId, voter: Address) -> ChainResult<bool> {
        self.read(|s| {
            let record = s.poll(poll).map_err(|reason| ChainError::Reverted { reason })?;
            Ok(record.voters.contains(&voter))
        })
    }

    pub(crate) fn owner(&self) -> ChainResult<Address> {
        self.read(|s| {
            if s.shape.supports_owner() {
                Ok(s.owner)
            } else {
                Err(ChainError::MethodNotFound("owner".to_string()))
            }
        })
    }

    pub(crate) fn is_instructor(&self, account: Address) -> ChainResult<bool> {
        self.read(|s| {
            if s.shape.supports_instructors() {
                Ok(s.instructors.contains(&account))
            } else {
                Err(ChainError::MethodNotFound("isInstructor".to_string()))
            }
        })
    }

    pub(crate) fn block_number(&self) -> ChainResult<u64> {
        self.read(|s| Ok(s.block_number))
    }

    pub(crate) fn get_logs(&self, filter: &LogFilter) -> ChainResult<Vec<EventLog>> {
        self.read(|s| Ok(s.logs.iter().filter(|l| filter.matches(l)).cloned().collect()))
    }

    /// Estimate a call against current state without submitting it.
    pub(crate) fn preflight(&self, from: Address, call: &WriteCall) -> ChainResult<()> {
        preflight(&self.state.lock(), from, call)
    }

    /// Check and enqueue a transaction; mines immediately in instant mode.
    pub(crate) fn submit(&self, from: Address, call: WriteCall) -> ChainResult<TxHash> {
        let hash = {
            let mut state = self.state.lock();
            preflight(&state, from, &call)?;
            state.nonce += 1;
            let hash = tx_hash(state.contract, from, state.nonce);
            state.pending.push(PendingTx { hash, from, call });
            hash
        };
        tracing::debug!(tx = %hash, from = %from, "SimChain::submit() - accepted");
        if *self.mode.lock() == MiningMode::Instant {
            self.mine();
        }
        Ok(hash)
    }

    /// Wait for `tx` to be mined.
    pub(crate) async fn wait_for_receipt(&self, tx: TxHash) -> ChainResult<Receipt> {
        loop {
            let mut notified = std::pin::pin!(self.mined.notified());
            notified.as_mut().enable();
            {
                let state = self.state.lock();
                match state.receipts.get(&tx) {
                    Some(TxOutcome::Success { block_number }) => {
                        return Ok(Receipt {
                            tx_hash: tx,
                            block_number: *block_number,
                        })
                    }
                    Some(TxOutcome::Reverted { reason, .. }) => {
                        return Err(ChainError::Reverted {
                            reason: reason.clone(),
                        })
                    }
                    None if !state.pending.iter().any(|p| p.hash == tx) => {
                        return Err(ChainError::Rpc {
                            code: -32000,
                            message: format!("unknown transaction {tx}"),
                        })
                    }
                    None => {}
                }
            }
            notified.await;
        }
    }
}

fn preflight(state: &ChainState, from: Address, call: &WriteCall) -> ChainResult<()> {
    let instructor_call = matches!(
        call,
        WriteCall::AddInstructor { .. } | WriteCall::RemoveInstructor { .. }
    );
    if instructor_call && !state.shape.supports_instructors() {
        return Err(ChainError::MethodNotFound(call.method().to_string()));
    }
    state
        .check(from, call)
        .map(|_| ())
        .map_err(|reason| ChainError::Reverted { reason })
}

fn tx_hash(contract: Address, from: Address, nonce: u64) -> TxHash {
    let mut hasher = Keccak256::new();
    hasher.update(contract.as_bytes());
    hasher.update(from.as_bytes());
    hasher.update(nonce.to_be_bytes());
    TxHash::from_bytes(hasher.finalize().into())
}
