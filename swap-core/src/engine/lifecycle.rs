//! Per-status worker actions.
//!
//! Every action follows the same shape: fetch the orders sitting in its
//! source status, move them all to the covering `*_IN_PROGRESS` status
//! in one atomic update, then fan out one task per order. The batch
//! update is the mutual exclusion for the side effect - once moved, no
//! other worker sees the order in the source status.
//!
//! Tasks log and swallow their errors; the failure transition *is* the
//! error surface, and the next tick re-attempts from whatever state the
//! order landed in.

use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use swap_common::chain::{ChainClient, PermitParams, TreasuryWithdrawal};
use swap_common::orders::{Order, OrderId, OrderStatus};
use swap_common::stores::OrderStore;

use crate::errors::EngineResult;

use super::service::OrderService;

/// Re-hedge is allowed while the re-quoted price stays within the
/// snapshotted quote plus tolerated slippage; anything above aborts to
/// refund.
pub(crate) fn exceeds_slippage(quoted: Decimal, current: Decimal, slippage: Decimal) -> bool {
    current > quoted * (Decimal::ONE + slippage)
}

impl OrderService {
    /// `PENDING` → debit the user on the source chain.
    pub async fn process_pending_orders(&self) -> EngineResult<Vec<JoinHandle<()>>> {
        let orders = self.orders.get_by_status(OrderStatus::Pending).await?;
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<OrderId> = orders.iter().map(|o| o.id).collect();
        self.orders
            .change_status_by_ids(&ids, OrderStatus::UserDebitInProgress)
            .await?;

        self.spawn_tasks(orders, |svc, order| async move {
            svc.debit_user(order).await;
        })
        .await
    }

    /// `USER_DEBIT_SUCCESS` → place the hedge order on the routed venue.
    pub async fn process_debited_orders(&self) -> EngineResult<Vec<JoinHandle<()>>> {
        let orders = self
            .orders
            .get_by_status(OrderStatus::UserDebitSuccess)
            .await?;
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<OrderId> = orders.iter().map(|o| o.id).collect();
        self.orders
            .change_status_by_ids(&ids, OrderStatus::MarketUserOrderInProgress)
            .await?;

        self.spawn_tasks(orders, |svc, order| async move {
            svc.hedge_on_venue(order).await;
        })
        .await
    }

    /// `MARKET_USER_ORDER_SUCCESS` → credit the user from the
    /// destination treasury.
    pub async fn process_hedged_orders(&self) -> EngineResult<Vec<JoinHandle<()>>> {
        let orders = self
            .orders
            .get_by_status(OrderStatus::MarketUserOrderSuccess)
            .await?;
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<OrderId> = orders.iter().map(|o| o.id).collect();
        self.orders
            .change_status_by_ids(&ids, OrderStatus::TreasuryCreditInProgress)
            .await?;

        self.spawn_tasks(orders, |svc, order| async move {
            svc.credit_destination(order).await;
        })
        .await
    }

    /// `MARKET_USER_ORDER_FAILED` → re-quote and decide between
    /// re-hedging and refunding.
    pub async fn process_hedge_failed_orders(&self) -> EngineResult<Vec<JoinHandle<()>>> {
        let orders = self
            .orders
            .get_by_status(OrderStatus::MarketUserOrderFailed)
            .await?;
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<OrderId> = orders.iter().map(|o| o.id).collect();
        self.orders
            .change_status_by_ids(&ids, OrderStatus::MarketUserOrderInProgress)
            .await?;

        self.spawn_tasks(orders, |svc, order| async move {
            svc.decide_failed_hedge(order).await;
        })
        .await
    }

    /// `REFUND_USER_ORDER` → send the user's source tokens back.
    pub async fn process_refund_orders(&self) -> EngineResult<Vec<JoinHandle<()>>> {
        let orders = self
            .orders
            .get_by_status(OrderStatus::RefundUserOrder)
            .await?;
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<OrderId> = orders.iter().map(|o| o.id).collect();
        self.orders
            .change_status_by_ids(&ids, OrderStatus::RefundUserOrderInProgress)
            .await?;

        self.spawn_tasks(orders, |svc, order| async move {
            svc.refund_user(order).await;
        })
        .await
    }

    /// Roll back orders stranded in an `*_IN_PROGRESS` state longer than
    /// `stale_after`. Returns the number of orders rolled back.
    ///
    /// A crash between the batch status update and task completion
    /// leaves orders stranded; this sweep returns them to a retryable
    /// state. Replay safety of a possibly re-submitted chain call is the
    /// settlement contract's concern.
    pub async fn sweep_stale_orders(&self, stale_after: Duration) -> EngineResult<usize> {
        let cutoff = Utc::now() - chrono::Duration::seconds(stale_after.as_secs() as i64);
        let stale = self.orders.get_stale_in_progress(cutoff).await?;

        let mut swept = 0usize;
        for order in stale {
            let Some(target) = order.status.stale_rollback_target() else {
                continue;
            };
            warn!(
                order_id = order.id,
                from = %order.status,
                to = %target,
                "rolling back stale order"
            );
            self.orders
                .change_status_by_ids(&[order.id], target)
                .await?;
            swept += 1;
        }
        Ok(swept)
    }

    /// Fan out one bounded task per order.
    async fn spawn_tasks<F, Fut>(
        &self,
        orders: Vec<Order>,
        action: F,
    ) -> EngineResult<Vec<JoinHandle<()>>>
    where
        F: Fn(OrderService, Order) -> Fut,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let mut handles = Vec::with_capacity(orders.len());
        for order in orders {
            let Ok(permit) = self.limiter.clone().acquire_owned().await else {
                break; // semaphore closed; shutting down
            };
            let task = action(self.clone(), order);
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                task.await;
            }));
        }
        Ok(handles)
    }

    // --- Per-order actions ---

    async fn debit_user(&self, mut order: Order) {
        info!(order_id = order.id, "executing user debit");

        let params = PermitParams {
            network: order.from_network.clone(),
            token_address: order.token_address.clone(),
            user_address: order.user_address.clone(),
            amount: order.volume,
            deadline: order.deadline,
            quote_id: order.id.to_string(),
            signature: order.signature.clone(),
        };

        let result = match self.chain.execute_trade_with_permit(params).await {
            Ok(receipt) if receipt.is_success() => {
                info!(order_id = order.id, tx = %receipt.tx_hash, "user debit mined");
                order.status = OrderStatus::UserDebitSuccess;
                order.deposit_tx_hash = Some(receipt.tx_hash);
                self.orders.update(&order).await
            }
            Ok(receipt) => {
                warn!(order_id = order.id, tx = %receipt.tx_hash, "user debit reverted");
                order.status = OrderStatus::FailedUserDebit;
                order.deposit_tx_hash = Some(receipt.tx_hash);
                self.orders.update(&order).await
            }
            Err(err) => {
                error!(order_id = order.id, error = %err, "user debit failed");
                self.orders
                    .change_status_by_ids(&[order.id], OrderStatus::FailedUserDebit)
                    .await
            }
        };

        if let Err(err) = result {
            error!(order_id = order.id, error = %err, "debit status update failed");
        }
    }

    async fn hedge_on_venue(&self, mut order: Order) {
        info!(order_id = order.id, "placing venue hedge order");

        let result = match self
            .place_market_order(order.venue_market_id, order.volume, order.is_buy)
            .await
        {
            Ok(venue_order_ref) => {
                info!(order_id = order.id, venue_order_ref, "venue order accepted");
                order.status = OrderStatus::MarketUserOrderSuccess;
                order.venue_order_ref = Some(venue_order_ref);
                self.orders.update(&order).await
            }
            Err(err) => {
                warn!(order_id = order.id, error = %err, "venue order failed");
                self.orders
                    .change_status_by_ids(&[order.id], OrderStatus::MarketUserOrderFailed)
                    .await
            }
        };

        if let Err(err) = result {
            error!(order_id = order.id, error = %err, "hedge status update failed");
        }
    }

    async fn credit_destination(&self, mut order: Order) {
        info!(order_id = order.id, "crediting destination");

        let withdrawal = TreasuryWithdrawal {
            network: order.to_network.clone(),
            recipient: order.credit_recipient().to_string(),
            // price is destination units per source unit
            amount: order.price * order.volume,
            token_symbol: order.destination_token_symbol.clone(),
        };

        let result = match self.chain.withdraw_treasury(withdrawal).await {
            Ok(receipt) if receipt.is_success() => {
                info!(order_id = order.id, tx = %receipt.tx_hash, "treasury credit mined");
                order.status = OrderStatus::Completed;
                order.release_tx_hash = Some(receipt.tx_hash);
                self.orders.update(&order).await
            }
            Ok(receipt) => {
                warn!(order_id = order.id, tx = %receipt.tx_hash, "treasury credit reverted");
                self.orders
                    .change_status_by_ids(&[order.id], OrderStatus::RefundUserOrder)
                    .await
            }
            Err(err) => {
                error!(order_id = order.id, error = %err, "treasury credit failed");
                self.orders
                    .change_status_by_ids(&[order.id], OrderStatus::RefundUserOrder)
                    .await
            }
        };

        if let Err(err) = result {
            error!(order_id = order.id, error = %err, "credit status update failed");
        }
    }

    async fn decide_failed_hedge(&self, order: Order) {
        let quote = match self
            .router
            .route_best_price(order.mega_market_id, order.volume, order.is_buy)
            .await
        {
            Ok(quote) => quote,
            Err(err) => {
                // Stays in progress; the stale sweep re-queues it.
                warn!(order_id = order.id, error = %err, "re-quote failed");
                return;
            }
        };

        let target = if exceeds_slippage(order.price, quote.price, order.slippage_percentage) {
            OrderStatus::RefundUserOrder
        } else {
            OrderStatus::UserDebitSuccess
        };

        info!(
            order_id = order.id,
            quoted = %order.price,
            current = %quote.price,
            slippage = %order.slippage_percentage,
            decision = %target,
            "failed hedge decided"
        );

        if let Err(err) = self.orders.change_status_by_ids(&[order.id], target).await {
            error!(order_id = order.id, error = %err, "slippage decision update failed");
        }
    }

    async fn refund_user(&self, order: Order) {
        info!(order_id = order.id, "refunding user");

        let withdrawal = TreasuryWithdrawal {
            network: order.from_network.clone(),
            recipient: order.user_address.clone(),
            amount: order.volume,
            token_symbol: order.source_token_symbol.clone(),
        };

        let result = match self.chain.withdraw_treasury(withdrawal).await {
            Ok(receipt) if receipt.is_success() => {
                info!(order_id = order.id, tx = %receipt.tx_hash, "refund mined");
                self.orders
                    .change_status_by_ids(&[order.id], OrderStatus::RefundUserOrderSuccess)
                    .await
            }
            Ok(receipt) => {
                warn!(order_id = order.id, tx = %receipt.tx_hash, "refund reverted; re-queueing");
                self.orders
                    .change_status_by_ids(&[order.id], OrderStatus::RefundUserOrder)
                    .await
            }
            Err(err) => {
                error!(order_id = order.id, error = %err, "refund failed; re-queueing");
                self.orders
                    .change_status_by_ids(&[order.id], OrderStatus::RefundUserOrder)
                    .await
            }
        };

        if let Err(err) = result {
            error!(order_id = order.id, error = %err, "refund status update failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_slippage_boundary_is_inclusive() {
        // Re-hedge iff current <= quoted * (1 + slippage)
        let quoted = dec!(100);
        let slippage = dec!(0.01);

        assert!(!exceeds_slippage(quoted, dec!(100.5), slippage));
        assert!(!exceeds_slippage(quoted, dec!(101), slippage)); // boundary
        assert!(exceeds_slippage(quoted, dec!(101.01), slippage));
        assert!(exceeds_slippage(quoted, dec!(102), slippage));
    }

    #[test]
    fn test_slippage_with_zero_tolerance() {
        let quoted = dec!(2000);
        assert!(!exceeds_slippage(quoted, dec!(2000), Decimal::ZERO));
        assert!(exceeds_slippage(quoted, dec!(2000.01), Decimal::ZERO));
    }
}
