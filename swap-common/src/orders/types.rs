//! Core order types: lifecycle status, side, permit signature.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Store-assigned, monotonically increasing order identifier.
pub type OrderId = i64;

/// Order side at the venue boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    /// Buy order - acquire the base asset
    Buy,
    /// Sell order - dispose of the base asset
    Sell,
}

impl OrderSide {
    /// Derive the venue side from the order's direction flag.
    pub fn from_is_buy(is_buy: bool) -> Self {
        if is_buy {
            OrderSide::Buy
        } else {
            OrderSide::Sell
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Order status representing the current state in the swap lifecycle.
///
/// State transitions (workers advance; `*_IN_PROGRESS` guards the side
/// effect they cover):
///
/// ```text
/// PENDING → USER_DEBIT_IN_PROGRESS ─┬→ USER_DEBIT_SUCCESS
///                                   └→ FAILED_USER_DEBIT (terminal)
/// USER_DEBIT_SUCCESS → MARKET_USER_ORDER_IN_PROGRESS ─┬→ MARKET_USER_ORDER_SUCCESS
///                                                     └→ MARKET_USER_ORDER_FAILED
/// MARKET_USER_ORDER_SUCCESS → TREASURY_CREDIT_IN_PROGRESS ─┬→ COMPLETED (terminal)
///                                                          └→ REFUND_USER_ORDER
/// MARKET_USER_ORDER_FAILED → (re-quote) ─┬→ USER_DEBIT_SUCCESS (within slippage)
///                                        └→ REFUND_USER_ORDER  (slippage exceeded)
/// REFUND_USER_ORDER → REFUND_USER_ORDER_IN_PROGRESS ─┬→ REFUND_USER_ORDER_SUCCESS (terminal)
///                                                    └→ REFUND_USER_ORDER (retry)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Submitted, waiting for the first worker pickup
    Pending,
    /// On-chain debit of the user is in flight
    UserDebitInProgress,
    /// Debit mined with status 1
    UserDebitSuccess,
    /// Debit errored or the receipt reported failure (terminal)
    FailedUserDebit,
    /// Venue hedge order is in flight (also covers the re-quote check)
    MarketUserOrderInProgress,
    /// Venue accepted the hedge order
    MarketUserOrderSuccess,
    /// Venue rejected the hedge order; awaiting the slippage decision
    MarketUserOrderFailed,
    /// Treasury-to-user credit is in flight on the destination chain
    TreasuryCreditInProgress,
    /// Swap settled (terminal)
    Completed,
    /// Hedge abandoned; user must be made whole on the source chain
    RefundUserOrder,
    /// Refund transfer is in flight
    RefundUserOrderInProgress,
    /// Funds returned to the user (terminal)
    RefundUserOrderSuccess,
    /// Defined for completeness; a failed refund re-queues instead
    RefundUserOrderFailed,
}

impl OrderStatus {
    /// Returns true if the order can never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Completed
                | OrderStatus::FailedUserDebit
                | OrderStatus::RefundUserOrderSuccess
        )
    }

    /// Returns true while a side effect is (or may be) in flight.
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            OrderStatus::UserDebitInProgress
                | OrderStatus::MarketUserOrderInProgress
                | OrderStatus::TreasuryCreditInProgress
                | OrderStatus::RefundUserOrderInProgress
        )
    }

    /// All `*_IN_PROGRESS` states, for the stale-order sweep.
    pub const IN_PROGRESS: [OrderStatus; 4] = [
        OrderStatus::UserDebitInProgress,
        OrderStatus::MarketUserOrderInProgress,
        OrderStatus::TreasuryCreditInProgress,
        OrderStatus::RefundUserOrderInProgress,
    ];

    /// The retryable state a stale in-progress order is rolled back to.
    ///
    /// `MARKET_USER_ORDER_IN_PROGRESS` rolls back to the failed state so
    /// the slippage check re-runs before any second hedge attempt.
    pub fn stale_rollback_target(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::UserDebitInProgress => Some(OrderStatus::Pending),
            OrderStatus::MarketUserOrderInProgress => Some(OrderStatus::MarketUserOrderFailed),
            OrderStatus::TreasuryCreditInProgress => Some(OrderStatus::MarketUserOrderSuccess),
            OrderStatus::RefundUserOrderInProgress => Some(OrderStatus::RefundUserOrder),
            _ => None,
        }
    }

    /// Check whether a transition from the current status to `target` is
    /// legal. Workers only drive legal edges by construction; this guard
    /// exists for assertions and tests.
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        match self {
            OrderStatus::Pending => matches!(target, OrderStatus::UserDebitInProgress),
            OrderStatus::UserDebitInProgress => matches!(
                target,
                OrderStatus::UserDebitSuccess
                    | OrderStatus::FailedUserDebit
                    | OrderStatus::Pending
            ),
            OrderStatus::UserDebitSuccess => {
                matches!(target, OrderStatus::MarketUserOrderInProgress)
            }
            OrderStatus::MarketUserOrderInProgress => matches!(
                target,
                OrderStatus::MarketUserOrderSuccess
                    | OrderStatus::MarketUserOrderFailed
                    | OrderStatus::UserDebitSuccess
                    | OrderStatus::RefundUserOrder
            ),
            OrderStatus::MarketUserOrderSuccess => {
                matches!(target, OrderStatus::TreasuryCreditInProgress)
            }
            OrderStatus::MarketUserOrderFailed => {
                matches!(target, OrderStatus::MarketUserOrderInProgress)
            }
            OrderStatus::TreasuryCreditInProgress => matches!(
                target,
                OrderStatus::Completed
                    | OrderStatus::RefundUserOrder
                    | OrderStatus::MarketUserOrderSuccess
            ),
            OrderStatus::RefundUserOrder => {
                matches!(target, OrderStatus::RefundUserOrderInProgress)
            }
            OrderStatus::RefundUserOrderInProgress => matches!(
                target,
                OrderStatus::RefundUserOrderSuccess | OrderStatus::RefundUserOrder
            ),
            OrderStatus::RefundUserOrderFailed => false,
            // Terminal states cannot transition
            OrderStatus::Completed
            | OrderStatus::FailedUserDebit
            | OrderStatus::RefundUserOrderSuccess => false,
        }
    }

    /// Stable storage string, matching the serde rendering.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::UserDebitInProgress => "USER_DEBIT_IN_PROGRESS",
            OrderStatus::UserDebitSuccess => "USER_DEBIT_SUCCESS",
            OrderStatus::FailedUserDebit => "FAILED_USER_DEBIT",
            OrderStatus::MarketUserOrderInProgress => "MARKET_USER_ORDER_IN_PROGRESS",
            OrderStatus::MarketUserOrderSuccess => "MARKET_USER_ORDER_SUCCESS",
            OrderStatus::MarketUserOrderFailed => "MARKET_USER_ORDER_FAILED",
            OrderStatus::TreasuryCreditInProgress => "TREASURY_CREDIT_IN_PROGRESS",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::RefundUserOrder => "REFUND_USER_ORDER",
            OrderStatus::RefundUserOrderInProgress => "REFUND_USER_ORDER_IN_PROGRESS",
            OrderStatus::RefundUserOrderSuccess => "REFUND_USER_ORDER_SUCCESS",
            OrderStatus::RefundUserOrderFailed => "REFUND_USER_ORDER_FAILED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "USER_DEBIT_IN_PROGRESS" => Ok(OrderStatus::UserDebitInProgress),
            "USER_DEBIT_SUCCESS" => Ok(OrderStatus::UserDebitSuccess),
            "FAILED_USER_DEBIT" => Ok(OrderStatus::FailedUserDebit),
            "MARKET_USER_ORDER_IN_PROGRESS" => Ok(OrderStatus::MarketUserOrderInProgress),
            "MARKET_USER_ORDER_SUCCESS" => Ok(OrderStatus::MarketUserOrderSuccess),
            "MARKET_USER_ORDER_FAILED" => Ok(OrderStatus::MarketUserOrderFailed),
            "TREASURY_CREDIT_IN_PROGRESS" => Ok(OrderStatus::TreasuryCreditInProgress),
            "COMPLETED" => Ok(OrderStatus::Completed),
            "REFUND_USER_ORDER" => Ok(OrderStatus::RefundUserOrder),
            "REFUND_USER_ORDER_IN_PROGRESS" => Ok(OrderStatus::RefundUserOrderInProgress),
            "REFUND_USER_ORDER_SUCCESS" => Ok(OrderStatus::RefundUserOrderSuccess),
            "REFUND_USER_ORDER_FAILED" => Ok(OrderStatus::RefundUserOrderFailed),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// EIP-2612 style permit signature authorizing the on-chain debit.
///
/// `r` and `s` are hex-encoded 32-byte values as carried on the wire;
/// decoding to chain-native types is the chain client's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitSignature {
    pub v: u8,
    pub r: String,
    pub s: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_side_from_is_buy() {
        assert_eq!(OrderSide::from_is_buy(true), OrderSide::Buy);
        assert_eq!(OrderSide::from_is_buy(false), OrderSide::Sell);
    }

    #[test]
    fn test_status_terminal() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::FailedUserDebit.is_terminal());
        assert!(OrderStatus::RefundUserOrderSuccess.is_terminal());

        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::RefundUserOrder.is_terminal());
        assert!(!OrderStatus::MarketUserOrderFailed.is_terminal());
    }

    #[test]
    fn test_status_transitions_follow_lifecycle() {
        use OrderStatus::*;

        assert!(Pending.can_transition_to(UserDebitInProgress));
        assert!(UserDebitInProgress.can_transition_to(UserDebitSuccess));
        assert!(UserDebitInProgress.can_transition_to(FailedUserDebit));
        assert!(UserDebitSuccess.can_transition_to(MarketUserOrderInProgress));
        assert!(MarketUserOrderInProgress.can_transition_to(MarketUserOrderSuccess));
        assert!(MarketUserOrderInProgress.can_transition_to(MarketUserOrderFailed));
        // Re-quote outcomes
        assert!(MarketUserOrderInProgress.can_transition_to(UserDebitSuccess));
        assert!(MarketUserOrderInProgress.can_transition_to(RefundUserOrder));
        assert!(MarketUserOrderSuccess.can_transition_to(TreasuryCreditInProgress));
        assert!(TreasuryCreditInProgress.can_transition_to(Completed));
        assert!(TreasuryCreditInProgress.can_transition_to(RefundUserOrder));
        assert!(RefundUserOrder.can_transition_to(RefundUserOrderInProgress));
        assert!(RefundUserOrderInProgress.can_transition_to(RefundUserOrderSuccess));
        assert!(RefundUserOrderInProgress.can_transition_to(RefundUserOrder));
    }

    #[test]
    fn test_terminal_states_never_transition() {
        use OrderStatus::*;
        let all = [
            Pending,
            UserDebitInProgress,
            UserDebitSuccess,
            FailedUserDebit,
            MarketUserOrderInProgress,
            MarketUserOrderSuccess,
            MarketUserOrderFailed,
            TreasuryCreditInProgress,
            Completed,
            RefundUserOrder,
            RefundUserOrderInProgress,
            RefundUserOrderSuccess,
            RefundUserOrderFailed,
        ];

        for terminal in [Completed, FailedUserDebit, RefundUserOrderSuccess] {
            for target in all {
                assert!(
                    !terminal.can_transition_to(target),
                    "{terminal} must not transition to {target}"
                );
            }
        }
    }

    #[test]
    fn test_stale_rollback_targets() {
        use OrderStatus::*;

        assert_eq!(UserDebitInProgress.stale_rollback_target(), Some(Pending));
        assert_eq!(
            MarketUserOrderInProgress.stale_rollback_target(),
            Some(MarketUserOrderFailed)
        );
        assert_eq!(
            TreasuryCreditInProgress.stale_rollback_target(),
            Some(MarketUserOrderSuccess)
        );
        assert_eq!(
            RefundUserOrderInProgress.stale_rollback_target(),
            Some(RefundUserOrder)
        );
        assert_eq!(Pending.stale_rollback_target(), None);

        // Every rollback edge must itself be a legal transition
        for status in OrderStatus::IN_PROGRESS {
            let target = status.stale_rollback_target().unwrap();
            assert!(status.can_transition_to(target));
        }
    }

    #[test]
    fn test_status_string_round_trip() {
        use OrderStatus::*;
        for status in [
            Pending,
            UserDebitInProgress,
            UserDebitSuccess,
            FailedUserDebit,
            MarketUserOrderInProgress,
            MarketUserOrderSuccess,
            MarketUserOrderFailed,
            TreasuryCreditInProgress,
            Completed,
            RefundUserOrder,
            RefundUserOrderInProgress,
            RefundUserOrderSuccess,
            RefundUserOrderFailed,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
    }
}
