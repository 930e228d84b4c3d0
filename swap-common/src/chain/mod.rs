//! Chain client port.
//!
//! [`ChainClient`] is the boundary to one chain RPC signer: the
//! permit-based debit of the user and treasury payouts (credit and
//! refund). Mined-receipt semantics follow the settlement contract:
//! `status == 1` is the only success signal. Replay safety of a
//! re-submitted call is the contract's concern; the engine's
//! `*_IN_PROGRESS` guard keeps at most one call in flight per order.

mod error;
mod traits;
mod types;

pub use error::{ChainError, ChainResult};
pub use traits::ChainClient;
pub use types::{PermitParams, TreasuryWithdrawal, TxReceipt};
