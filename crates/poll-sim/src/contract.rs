//! Contract handle bound to one signing account.

use crate::chain::SimChain;
use crate::wallet::Shared;
use async_trait::async_trait;
use poll_core::{
    Address, ChainError, ChainResult, EventLog, InterfaceDescriptor, LogFilter, PollContract,
    PollId, PollTuple, Receipt, TxHash, WriteCall,
};
use std::sync::Arc;

/// [`PollContract`] implementation over a [`SimChain`].
///
/// Reads fail when the wallet is on a network other than the chain's, and
/// when the bound descriptor does not declare the called function.
#[derive(Debug)]
pub struct SimContract {
    chain: Arc<SimChain>,
    shared: Arc<Shared>,
    account: Address,
    address: Address,
    descriptor: Arc<InterfaceDescriptor>,
}

impl SimContract {
    pub(crate) fn new(
        chain: Arc<SimChain>,
        shared: Arc<Shared>,
        account: Address,
        address: Address,
        descriptor: Arc<InterfaceDescriptor>,
    ) -> Self {
        Self {
            chain,
            shared,
            account,
            address,
            descriptor,
        }
    }

    /// Signing account.
    #[must_use]
    pub fn account(&self) -> Address {
        self.account
    }

    async fn reachable(&self, function: &str) -> ChainResult<()> {
        tokio::task::yield_now().await;
        if !self.descriptor.has_function(function) {
            return Err(ChainError::MethodNotFound(function.to_string()));
        }
        let active = self.shared.active_chain();
        if active != self.chain.chain_id() || self.address != self.chain.contract_address() {
            return Err(ChainError::Rpc {
                code: -32000,
                message: format!("no contract at {} on chain {active}", self.address),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PollContract for SimContract {
    fn address(&self) -> Address {
        self.address
    }

    async fn poll_count(&self) -> ChainResult<u64> {
        self.reachable("getPollCount").await?;
        self.chain.poll_count()
    }

    async fn get_poll(&self, poll: PollId) -> ChainResult<PollTuple> {
        self.reachable("getPoll").await?;
        self.chain.get_poll(poll)
    }

    async fn has_voted(&self, poll: PollId, voter: Address) -> ChainResult<bool> {
        self.reachable("hasVoted").await?;
        self.chain.has_voted(poll, voter)
    }

    async fn owner(&self) -> ChainResult<Address> {
        self.reachable("owner").await?;
        self.chain.owner()
    }

    async fn is_instructor(&self, account: Address) -> ChainResult<bool> {
        self.reachable("isInstructor").await?;
        self.chain.is_instructor(account)
    }

    async fn block_number(&self) -> ChainResult<u64> {
        tokio::task::yield_now().await;
        self.chain.block_number()
    }

    async fn get_logs(&self, filter: &LogFilter) -> ChainResult<Vec<EventLog>> {
        tokio::task::yield_now().await;
        if self.address != self.chain.contract_address() {
            return Ok(Vec::new());
        }
        self.chain.get_logs(filter)
    }

    async fn send(&self, call: WriteCall) -> ChainResult<TxHash> {
        self.reachable(call.method()).await?;
        self.chain.preflight(self.account, &call)?;
        self.shared.prompt()?;
        self.chain.submit(self.account, call)
    }

    async fn wait_for_receipt(&self, tx: TxHash) -> ChainResult<Receipt> {
        self.chain.wait_for_receipt(tx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::ContractShape;
    use crate::wallet::SimWallet;
    use poll_core::{ChainId, Wallet};

    const CONTRACT: Address = Address::from_bytes([0xcc; 20]);
    const OWNER: Address = Address::from_bytes([1; 20]);

    async fn bind(shape: ContractShape) -> (Arc<SimChain>, SimWallet, Arc<dyn PollContract>) {
        let chain = Arc::new(SimChain::deploy(ChainId::SEPOLIA, CONTRACT, OWNER, shape));
        let wallet = SimWallet::new(chain.clone(), OWNER).with_authorization();
        let contract = wallet
            .bind_contract(OWNER, CONTRACT, Arc::new(shape.descriptor().unwrap()))
            .await
            .unwrap();
        (chain, wallet, contract)
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let (_chain, _wallet, contract) = bind(ContractShape::Full).await;
        let tx = contract
            .send(WriteCall::CreatePoll {
                question: "Lunch?".to_string(),
                options: vec!["Pizza".to_string(), "Soup".to_string()],
            })
            .await
            .unwrap();
        let receipt = contract.wait_for_receipt(tx).await.unwrap();
        assert_eq!(receipt.tx_hash, tx);

        assert_eq!(contract.poll_count().await.unwrap(), 1);
        let poll = contract.get_poll(PollId(0)).await.unwrap();
        assert_eq!(poll.question, "Lunch?");
        assert!(poll.is_open);
    }

    #[tokio::test]
    async fn test_missing_descriptor_function_is_method_not_found() {
        let (_chain, _wallet, contract) = bind(ContractShape::Legacy).await;
        assert_eq!(
            contract.owner().await,
            Err(ChainError::MethodNotFound("owner".to_string()))
        );
        assert!(matches!(
            contract.is_instructor(OWNER).await,
            Err(ChainError::MethodNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_reads_fail_on_wrong_network() {
        let (_chain, wallet, contract) = bind(ContractShape::Full).await;
        wallet.change_chain(crate::wallet::MAINNET);
        assert!(matches!(
            contract.poll_count().await,
            Err(ChainError::Rpc { code: -32000, .. })
        ));
    }

    #[tokio::test]
    async fn test_rejected_send_submits_nothing() {
        let (chain, wallet, contract) = bind(ContractShape::Full).await;
        wallet.reject_next_prompt();
        let result = contract
            .send(WriteCall::ClosePoll { poll: PollId(0) })
            .await;
        // Reverts first: poll 0 does not exist, so the prompt is never shown
        assert!(matches!(result, Err(ChainError::Reverted { .. })));

        chain
            .submit(
                OWNER,
                WriteCall::CreatePoll {
                    question: "Q".to_string(),
                    options: vec!["a".to_string(), "b".to_string()],
                },
            )
            .unwrap();
        let before = chain.snapshot().nonce;
        let result = contract.send(WriteCall::ClosePoll { poll: PollId(0) }).await;
        assert_eq!(result, Err(ChainError::UserRejected));
        assert_eq!(chain.snapshot().nonce, before);
    }
}
