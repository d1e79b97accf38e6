//! Typed views over the loosely-shaped marketplace documents.
//!
//! Documents come from checkout flows and older schema generations, so
//! almost every field is optional. Derived values (recipient, shipper,
//! COD flag, fragile flag) are produced by a single fallback-chain helper
//! each, instead of inline chains repeated at call sites.

pub mod order;
pub mod payout_adjustment;
pub mod return_request;
pub mod seller;
pub mod withdrawal;

pub use order::{Order, OrderItem, OrderSummary, ShippingInfo, StatusHistoryEntry};
pub use payout_adjustment::{AdjustmentStatus, SellerPayoutAdjustment};
pub use return_request::{ReturnRequest, ReturnStatus};
pub use seller::Seller;
pub use withdrawal::{Withdrawal, WithdrawalStatus};
