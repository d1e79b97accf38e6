pub mod health;
pub mod payout_adjustments;
pub mod returns;
pub mod shipments;
pub mod withdrawals;

use std::sync::Arc;

use crate::{
    clients::{CourierApi, PaymentGateway},
    services::{
        payout_ledger::PayoutLedgerService, returns::ReturnService, shipments::ShipmentService,
        withdrawals::WithdrawalService,
    },
    store::DocumentStore,
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub shipments: Arc<ShipmentService>,
    pub returns: Arc<ReturnService>,
    pub payout_ledger: Arc<PayoutLedgerService>,
    pub withdrawals: Arc<WithdrawalService>,
}

impl AppServices {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        courier: Arc<dyn CourierApi>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let payout_ledger = Arc::new(PayoutLedgerService::new(store.clone()));
        let shipments = Arc::new(ShipmentService::new(
            store.clone(),
            courier.clone(),
            payout_ledger.clone(),
        ));
        let returns = Arc::new(ReturnService::new(store.clone(), courier));
        let withdrawals = Arc::new(WithdrawalService::new(store, gateway));
        Self {
            shipments,
            returns,
            payout_ledger,
            withdrawals,
        }
    }
}
