use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One ledger record per shipment that incurred a seller-side shipping
/// deduction. Written once by the shipment orchestrator, flipped to
/// `processed` exactly once by the settlement batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SellerPayoutAdjustment {
    pub order_id: Option<String>,
    pub seller_id: Option<String>,
    /// Always "shipping_charge" for records written by this service.
    pub r#type: Option<String>,
    /// Negative = deduction from the seller's payout.
    pub amount: Option<f64>,
    pub shipping_reference: Option<String>,
    pub tracking_id: Option<String>,
    pub status: Option<String>,
    pub metadata: Option<AdjustmentMetadata>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub processed_at: Option<String>,
    pub processed_by: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct AdjustmentMetadata {
    /// The positive magnitude of the charge, kept so settlement never has
    /// to re-derive it from the signed amount.
    pub original_shipping_charge: Option<f64>,
}

pub const ADJUSTMENT_TYPE_SHIPPING_CHARGE: &str = "shipping_charge";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustmentStatus {
    PendingDeduction,
    Processed,
}

impl AdjustmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingDeduction => "pending_deduction",
            Self::Processed => "processed",
        }
    }
}

impl SellerPayoutAdjustment {
    pub fn is_processed(&self) -> bool {
        self.status.as_deref() == Some(AdjustmentStatus::Processed.as_str())
    }

    /// Settlement delta: the recorded positive magnitude when present,
    /// otherwise the absolute value of the signed amount.
    pub fn settlement_delta(&self) -> f64 {
        self.metadata
            .as_ref()
            .and_then(|m| m.original_shipping_charge)
            .unwrap_or_else(|| self.amount.unwrap_or(0.0).abs())
    }
}
