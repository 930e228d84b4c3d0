//! Chain client trait definition.

use async_trait::async_trait;

use super::error::ChainResult;
use super::types::{PermitParams, TreasuryWithdrawal, TxReceipt};

/// Boundary to the chain RPC signer.
///
/// Both calls submit a transaction and await the mined receipt. A caller
/// that has submitted must keep awaiting the receipt even when its own
/// context is cancelled - abandoning the wait would lose the tx hash.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Debit the user via the settlement contract's permit entry point.
    ///
    /// Success iff the mined receipt has `status == 1`.
    async fn execute_trade_with_permit(&self, params: PermitParams) -> ChainResult<TxReceipt>;

    /// Pay out from the treasury wallet on the given network.
    ///
    /// Used for both the destination-side credit and the source-side
    /// refund.
    async fn withdraw_treasury(&self, withdrawal: TreasuryWithdrawal) -> ChainResult<TxReceipt>;
}
