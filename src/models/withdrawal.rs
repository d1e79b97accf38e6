use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// A seller payout request, settled through the payment gateway's wallet
/// transfer API.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Withdrawal {
    pub seller_id: Option<String>,
    pub status: Option<String>,
    /// Pesos. Converted to centavos at the gateway boundary.
    pub amount: Option<f64>,
    pub receiver: Option<Value>,
    pub paymongo_transaction_id: Option<String>,
    pub paymongo_status: Option<String>,
    pub provider_error: Option<Value>,
    pub net_amount: Option<i64>,
    pub processed_at: Option<String>,
    pub completed_at: Option<String>,
    pub failed_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawalStatus {
    Approved,
    Processing,
    Completed,
    Failed,
}

impl WithdrawalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl Withdrawal {
    pub fn is_approved(&self) -> bool {
        self.status.as_deref() == Some(WithdrawalStatus::Approved.as_str())
    }

    /// Gateway amounts are minor-unit integers; round to the nearest
    /// centavo rather than truncating.
    pub fn amount_in_centavos(&self) -> i64 {
        (self.amount.unwrap_or(0.0) * 100.0).round() as i64
    }
}
