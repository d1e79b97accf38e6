//! Business logic. Handlers stay thin; everything observable about the
//! shipment, return, ledger, and withdrawal workflows lives here.

pub mod address;
pub mod authorization;
pub mod parcels;
pub mod parties;
pub mod payout_ledger;
pub mod returns;
pub mod shipments;
pub mod withdrawals;
