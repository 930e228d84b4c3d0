//! Chain-facing call parameters and receipts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::orders::PermitSignature;

/// Parameters for the permit-based debit: pull `amount` of the token
/// from the user into the treasury via the settlement contract.
///
/// `amount` is the order's source-side volume; conversion to base-unit
/// integers is the client's concern. `quote_id` carries the order id so
/// the contract can reject replays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermitParams {
    pub network: String,
    pub token_address: String,
    pub user_address: String,
    pub amount: Decimal,
    /// Permit deadline, unix seconds
    pub deadline: i64,
    /// Order id carried through to the contract for replay protection
    pub quote_id: String,
    pub signature: PermitSignature,
}

/// A treasury payout on one network: the destination-side credit or the
/// source-side refund.
///
/// Native-token vs ERC-20 dispatch keys on `token_symbol` inside the
/// client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreasuryWithdrawal {
    pub network: String,
    pub recipient: String,
    pub amount: Decimal,
    pub token_symbol: String,
}

/// A mined transaction receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: String,
    /// 1 on success, 0 on revert
    pub status: u64,
}

impl TxReceipt {
    /// Create a successful receipt.
    pub fn success(tx_hash: impl Into<String>) -> Self {
        Self {
            tx_hash: tx_hash.into(),
            status: 1,
        }
    }

    /// Create a reverted receipt.
    pub fn reverted(tx_hash: impl Into<String>) -> Self {
        Self {
            tx_hash: tx_hash.into(),
            status: 0,
        }
    }

    /// Success iff the mined status is exactly 1.
    pub fn is_success(&self) -> bool {
        self.status == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_status() {
        assert!(TxReceipt::success("0xabc").is_success());
        assert!(!TxReceipt::reverted("0xdef").is_success());
        assert!(!TxReceipt {
            tx_hash: "0x1".to_string(),
            status: 2
        }
        .is_success());
    }
}
