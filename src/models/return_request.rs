use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// A buyer-initiated return. Created by the storefront; this service moves
/// it from `pending` to exactly one terminal state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ReturnRequest {
    pub order_id: Option<String>,
    pub status: Option<String>,
    /// Product ids to return. Absent means all items.
    pub items_to_return: Option<Vec<String>>,
    pub reason: Option<String>,
    pub rejection_reason: Option<String>,
    pub return_shipping: Option<ReturnShipping>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ReturnShipping {
    pub reference_no: Option<String>,
    pub tracking_id: Option<String>,
    pub total_shipping_amount: Option<f64>,
    pub pickup_schedule: Option<String>,
    pub response: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnStatus {
    Pending,
    Approved,
    Rejected,
    /// Approval was granted but the reverse courier booking failed.
    /// Terminal, distinct from rejected.
    ShippingFailed,
}

impl ReturnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::ShippingFailed => "shipping_failed",
        }
    }
}

impl ReturnRequest {
    pub fn is_pending(&self) -> bool {
        self.status.as_deref() == Some(ReturnStatus::Pending.as_str())
    }
}
