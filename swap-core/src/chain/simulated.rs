//! Simulated chain client.
//!
//! Stands in for the RPC signer behind the [`ChainClient`] port: mints
//! deterministic tx hashes, observes a configurable mining latency, and
//! lets tests script failures and reverted receipts per call.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use swap_common::chain::{
    ChainClient, ChainError, ChainResult, PermitParams, TreasuryWithdrawal, TxReceipt,
};

/// Scripted outcome for one simulated chain call.
#[derive(Debug, Clone)]
enum Outcome {
    Error(ChainError),
    Reverted,
}

#[derive(Default)]
struct SimState {
    permit_outcomes: VecDeque<Outcome>,
    withdraw_outcomes: VecDeque<Outcome>,
    permits: Vec<PermitParams>,
    withdrawals: Vec<TreasuryWithdrawal>,
}

/// In-process [`ChainClient`] used in tests and dry-run deployments.
pub struct SimulatedChainClient {
    latency: Duration,
    state: Mutex<SimState>,
}

impl SimulatedChainClient {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            state: Mutex::new(SimState::default()),
        }
    }

    /// No mining latency; the default for tests.
    pub fn instant() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Script the next permit call to fail with `error`.
    pub fn fail_next_permit(&self, error: ChainError) {
        self.state.lock().permit_outcomes.push_back(Outcome::Error(error));
    }

    /// Script the next permit call to mine a reverted receipt.
    pub fn revert_next_permit(&self) {
        self.state.lock().permit_outcomes.push_back(Outcome::Reverted);
    }

    /// Script the next treasury withdrawal to fail with `error`.
    pub fn fail_next_withdrawal(&self, error: ChainError) {
        self.state
            .lock()
            .withdraw_outcomes
            .push_back(Outcome::Error(error));
    }

    /// Script the next treasury withdrawal to mine a reverted receipt.
    pub fn revert_next_withdrawal(&self) {
        self.state.lock().withdraw_outcomes.push_back(Outcome::Reverted);
    }

    /// Permit calls observed so far.
    pub fn permits(&self) -> Vec<PermitParams> {
        self.state.lock().permits.clone()
    }

    /// Treasury withdrawals observed so far.
    pub fn withdrawals(&self) -> Vec<TreasuryWithdrawal> {
        self.state.lock().withdrawals.clone()
    }

    fn mint_hash() -> String {
        format!("0x{}", Uuid::new_v4().simple())
    }

    async fn mine(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl ChainClient for SimulatedChainClient {
    async fn execute_trade_with_permit(&self, params: PermitParams) -> ChainResult<TxReceipt> {
        let outcome = {
            let mut state = self.state.lock();
            state.permits.push(params.clone());
            state.permit_outcomes.pop_front()
        };

        self.mine().await;

        match outcome {
            Some(Outcome::Error(err)) => Err(err),
            Some(Outcome::Reverted) => Ok(TxReceipt::reverted(Self::mint_hash())),
            None => {
                let receipt = TxReceipt::success(Self::mint_hash());
                debug!(quote_id = %params.quote_id, tx = %receipt.tx_hash, "simulated permit mined");
                Ok(receipt)
            }
        }
    }

    async fn withdraw_treasury(&self, withdrawal: TreasuryWithdrawal) -> ChainResult<TxReceipt> {
        let outcome = {
            let mut state = self.state.lock();
            state.withdrawals.push(withdrawal.clone());
            state.withdraw_outcomes.pop_front()
        };

        self.mine().await;

        match outcome {
            Some(Outcome::Error(err)) => Err(err),
            Some(Outcome::Reverted) => Ok(TxReceipt::reverted(Self::mint_hash())),
            None => {
                let receipt = TxReceipt::success(Self::mint_hash());
                debug!(
                    recipient = %withdrawal.recipient,
                    token = %withdrawal.token_symbol,
                    tx = %receipt.tx_hash,
                    "simulated withdrawal mined"
                );
                Ok(receipt)
            }
        }
    }
}
