//! Withdrawal settlement via the payment gateway.
//!
//! The status moves `approved -> processing` before the gateway is called,
//! so a crash mid-call leaves a visible non-terminal state instead of a
//! silent retry. Reconciliation is one-directional: gateway state wins.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{instrument, warn};
use utoipa::ToSchema;

use crate::{
    auth::AuthUser,
    clients::{GatewayError, PaymentGateway, WalletTransferRequest},
    errors::ServiceError,
    models::{withdrawal::WithdrawalStatus, Withdrawal},
    store::{self, DocumentStore},
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalTransaction {
    pub transaction_id: String,
    pub status: String,
    pub amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_amount: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalProcessed {
    pub withdrawal_id: String,
    pub withdrawal_status: String,
    pub transaction: WithdrawalTransaction,
}

pub struct WithdrawalService {
    store: Arc<dyn DocumentStore>,
    gateway: Arc<dyn PaymentGateway>,
}

impl WithdrawalService {
    pub fn new(store: Arc<dyn DocumentStore>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { store, gateway }
    }

    /// Submits an approved withdrawal to the gateway.
    #[instrument(skip(self, caller))]
    pub async fn process(
        &self,
        caller: &AuthUser,
        withdrawal_id: &str,
    ) -> Result<WithdrawalProcessed, ServiceError> {
        caller.require_admin()?;

        let Some(doc) = self.store.get(store::WITHDRAWALS, withdrawal_id).await? else {
            return Err(ServiceError::NotFound(format!(
                "Withdrawal {withdrawal_id} not found"
            )));
        };
        let withdrawal: Withdrawal = doc.parse()?;
        if !withdrawal.is_approved() {
            return Err(ServiceError::BadRequest(format!(
                "Withdrawal must be approved before processing (status: {})",
                withdrawal.status.as_deref().unwrap_or("unknown")
            )));
        }

        let now = Utc::now().to_rfc3339();
        self.store
            .merge(
                store::WITHDRAWALS,
                withdrawal_id,
                json!({
                    "status": WithdrawalStatus::Processing.as_str(),
                    "processedAt": now,
                    "processedBy": caller.uid,
                }),
            )
            .await?;

        let request = WalletTransferRequest {
            amount: withdrawal.amount_in_centavos(),
            currency: "PHP".into(),
            description: format!("DentPal seller withdrawal {withdrawal_id}"),
            receiver: withdrawal.receiver.clone().unwrap_or_else(|| json!({})),
            reference_number: withdrawal_id.to_string(),
        };

        let transfer = match self.gateway.create_wallet_transfer(&request).await {
            Ok(transfer) => transfer,
            Err(err) => {
                self.record_failure(withdrawal_id, &err).await;
                return Err(match err {
                    GatewayError::Transport(message) => {
                        ServiceError::UpstreamUnavailable(message)
                    }
                    GatewayError::Provider {
                        detail, payload, ..
                    } => ServiceError::UpstreamRejected {
                        message: detail,
                        payload,
                    },
                });
            }
        };

        let mut patch = json!({
            "paymongoTransactionId": transfer.id.clone(),
            "paymongoStatus": transfer.status.clone(),
            "provider": "paymongo",
            "netAmount": transfer.net_amount,
        });
        let mut final_status = WithdrawalStatus::Processing.as_str().to_string();
        if transfer.status == WithdrawalStatus::Completed.as_str() {
            patch["status"] = json!(WithdrawalStatus::Completed.as_str());
            patch["completedAt"] = json!(Utc::now().to_rfc3339());
            final_status = WithdrawalStatus::Completed.as_str().to_string();
        }
        self.store
            .merge(store::WITHDRAWALS, withdrawal_id, patch)
            .await?;

        Ok(WithdrawalProcessed {
            withdrawal_id: withdrawal_id.to_string(),
            withdrawal_status: final_status,
            transaction: WithdrawalTransaction {
                transaction_id: transfer.id,
                status: transfer.status,
                amount: request.amount,
                net_amount: transfer.net_amount,
            },
        })
    }

    /// Re-polls the gateway and pulls terminal state down to the local
    /// record. Local state never overrides the gateway's.
    #[instrument(skip(self, caller))]
    pub async fn check_status(
        &self,
        caller: &AuthUser,
        withdrawal_id: &str,
    ) -> Result<WithdrawalProcessed, ServiceError> {
        caller.require_admin()?;

        let Some(doc) = self.store.get(store::WITHDRAWALS, withdrawal_id).await? else {
            return Err(ServiceError::NotFound(format!(
                "Withdrawal {withdrawal_id} not found"
            )));
        };
        let withdrawal: Withdrawal = doc.parse()?;
        let Some(transaction_id) = withdrawal.paymongo_transaction_id.clone() else {
            return Err(ServiceError::BadRequest(
                "Withdrawal has no gateway transaction to check".into(),
            ));
        };

        let transfer = match self.gateway.get_transfer(&transaction_id).await {
            Ok(transfer) => transfer,
            Err(GatewayError::Transport(message)) => {
                return Err(ServiceError::UpstreamUnavailable(message))
            }
            Err(GatewayError::Provider {
                detail, payload, ..
            }) => {
                return Err(ServiceError::UpstreamRejected {
                    message: detail,
                    payload,
                })
            }
        };

        let mut local_status = withdrawal
            .status
            .clone()
            .unwrap_or_else(|| WithdrawalStatus::Processing.as_str().to_string());
        let moved_to_completed = transfer.status == WithdrawalStatus::Completed.as_str()
            && local_status != WithdrawalStatus::Completed.as_str();
        let moved_to_failed = transfer.status == WithdrawalStatus::Failed.as_str()
            && local_status != WithdrawalStatus::Failed.as_str();

        if moved_to_completed || moved_to_failed {
            let now = Utc::now().to_rfc3339();
            let timestamp_field = if moved_to_completed {
                "completedAt"
            } else {
                "failedAt"
            };
            let mut patch = json!({
                "status": transfer.status.clone(),
                "paymongoStatus": transfer.status.clone(),
            });
            patch[timestamp_field] = json!(now);
            self.store
                .merge(store::WITHDRAWALS, withdrawal_id, patch)
                .await?;
            local_status = transfer.status.clone();
        }

        Ok(WithdrawalProcessed {
            withdrawal_id: withdrawal_id.to_string(),
            withdrawal_status: local_status,
            transaction: WithdrawalTransaction {
                transaction_id,
                status: transfer.status,
                amount: withdrawal.amount_in_centavos(),
                net_amount: transfer.net_amount,
            },
        })
    }

    /// Best-effort failure record. A second failure here is logged, not
    /// escalated, so the original gateway error stays the surfaced one.
    async fn record_failure(&self, withdrawal_id: &str, err: &GatewayError) {
        let provider_error: Value = match err {
            GatewayError::Transport(message) => json!({ "transport": message }),
            GatewayError::Provider { code, detail, .. } => {
                json!({ "code": code, "detail": detail })
            }
        };
        let patch = json!({
            "status": WithdrawalStatus::Failed.as_str(),
            "failedAt": Utc::now().to_rfc3339(),
            "providerError": provider_error,
        });
        if let Err(write_err) = self
            .store
            .merge(store::WITHDRAWALS, withdrawal_id, patch)
            .await
        {
            warn!(
                withdrawal_id,
                error = %write_err,
                "failed to record withdrawal failure"
            );
        }
    }
}
