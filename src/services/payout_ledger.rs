//! Seller payout-adjustment ledger.
//!
//! One adjustment per shipped order that incurred a seller-side shipping
//! charge, plus running aggregate counters on the seller document. The
//! settlement batch flips each record to `processed` at most once.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    models::payout_adjustment::{
        AdjustmentStatus, SellerPayoutAdjustment, ADJUSTMENT_TYPE_SHIPPING_CHARGE,
    },
    store::{self, DocumentStore, Filter},
};

const CAS_ATTEMPTS: usize = 3;

/// Batch settlement outcome: partial-failure contract, one entry per
/// pending record, never fail-fast.
#[derive(Debug, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReport {
    pub processed: Vec<ProcessedAdjustment>,
    pub errors: Vec<SettlementError>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedAdjustment {
    pub adjustment_id: String,
    pub order_id: Option<String>,
    pub seller_id: Option<String>,
    pub amount: f64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettlementError {
    pub adjustment_id: String,
    pub message: String,
}

/// An adjustment returned to the dashboard, with its document id.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentRecord {
    pub id: String,
    #[serde(flatten)]
    pub adjustment: SellerPayoutAdjustment,
}

/// Aggregate block for the list endpoint.
#[derive(Debug, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentSummary {
    pub total_count: usize,
    pub pending_total: f64,
    pub processed_total: f64,
}

pub struct PayoutLedgerService {
    store: Arc<dyn DocumentStore>,
}

impl PayoutLedgerService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Writes one pending adjustment and bumps the seller's aggregate
    /// counters.
    ///
    /// The two writes are deliberately not wrapped in one transaction: a
    /// crash between them leaves the counters under-incremented until the
    /// next settlement reconciliation, which is an accepted drift window.
    #[instrument(skip(self))]
    pub async fn create(
        &self,
        order_id: &str,
        seller_id: &str,
        shipping_charge: f64,
        shipping_reference_no: &str,
        tracking_id: &str,
    ) -> Result<String, ServiceError> {
        let adjustment_id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        self.store
            .insert(
                store::PAYOUT_ADJUSTMENTS,
                &adjustment_id,
                json!({
                    "orderId": order_id,
                    "sellerId": seller_id,
                    "type": ADJUSTMENT_TYPE_SHIPPING_CHARGE,
                    "amount": -shipping_charge,
                    "shippingReference": shipping_reference_no,
                    "trackingId": tracking_id,
                    "status": AdjustmentStatus::PendingDeduction.as_str(),
                    "metadata": { "originalShippingCharge": shipping_charge },
                    "createdAt": now,
                    "updatedAt": now,
                }),
            )
            .await?;

        self.store
            .increment(
                store::SELLERS,
                seller_id,
                &[
                    (
                        "payoutAdjustments.totalShippingCharges".to_string(),
                        shipping_charge,
                    ),
                    (
                        "payoutAdjustments.pendingDeductions".to_string(),
                        shipping_charge,
                    ),
                ],
            )
            .await?;
        self.store
            .merge(
                store::SELLERS,
                seller_id,
                json!({ "payoutAdjustments": { "lastUpdated": now } }),
            )
            .await?;

        info!(
            %adjustment_id,
            order_id, seller_id, shipping_charge, "payout adjustment created"
        );
        Ok(adjustment_id)
    }

    /// Settles every pending shipping-charge adjustment. Each record is an
    /// independent transaction; one failure never blocks the rest. Records
    /// that turn out to be already processed are skipped, not reapplied.
    #[instrument(skip(self))]
    pub async fn settle_pending(&self, processed_by: &str) -> Result<SettlementReport, ServiceError> {
        let pending = self
            .store
            .query(
                store::PAYOUT_ADJUSTMENTS,
                &[
                    Filter::eq("type", ADJUSTMENT_TYPE_SHIPPING_CHARGE),
                    Filter::eq("status", AdjustmentStatus::PendingDeduction.as_str()),
                ],
            )
            .await?;

        let mut report = SettlementReport::default();
        for doc in pending {
            let adjustment_id = doc.id.clone();
            match self.settle_one(&adjustment_id, processed_by).await {
                Ok(Some(processed)) => report.processed.push(processed),
                Ok(None) => {
                    info!(%adjustment_id, "adjustment already processed, skipping");
                }
                Err(err) => {
                    warn!(%adjustment_id, error = %err, "adjustment settlement failed");
                    report.errors.push(SettlementError {
                        adjustment_id,
                        message: err.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }

    /// One settlement transaction: re-read, skip if already processed,
    /// otherwise flip to processed via compare-and-swap. The CAS winner is
    /// the only invocation that touches the seller counters, which is what
    /// keeps the transition effective at most once under concurrent runs.
    async fn settle_one(
        &self,
        adjustment_id: &str,
        processed_by: &str,
    ) -> Result<Option<ProcessedAdjustment>, ServiceError> {
        for _ in 0..CAS_ATTEMPTS {
            let Some((doc, version)) = self
                .store
                .get_versioned(store::PAYOUT_ADJUSTMENTS, adjustment_id)
                .await?
            else {
                return Err(ServiceError::NotFound(format!(
                    "Adjustment {adjustment_id} disappeared during settlement"
                )));
            };

            let adjustment: SellerPayoutAdjustment = doc.parse()?;
            if adjustment.is_processed() {
                return Ok(None);
            }

            let seller_id = adjustment.seller_id.clone().ok_or_else(|| {
                ServiceError::BadRequest(format!(
                    "Adjustment {adjustment_id} has no sellerId"
                ))
            })?;

            let delta = adjustment.settlement_delta();
            let now = Utc::now().to_rfc3339();
            let mut data = doc.data;
            data["status"] = json!(AdjustmentStatus::Processed.as_str());
            data["processedAt"] = json!(now);
            data["processedBy"] = json!(processed_by);
            data["updatedAt"] = json!(now);

            if !self
                .store
                .compare_and_swap(store::PAYOUT_ADJUSTMENTS, adjustment_id, version, data)
                .await?
            {
                // Lost the race, re-read and re-check.
                continue;
            }

            // The flip and the counter moves must land together. If the
            // counters fail after the flip won, revert the flip so the
            // record stays pending and a later batch can retry it.
            if let Err(err) = self.apply_counters(&seller_id, delta, &now).await {
                self.revert_flip(adjustment_id).await;
                return Err(err);
            }

            return Ok(Some(ProcessedAdjustment {
                adjustment_id: adjustment_id.to_string(),
                order_id: adjustment.order_id,
                seller_id: Some(seller_id),
                amount: delta,
            }));
        }

        Err(ServiceError::BadRequest(format!(
            "Adjustment {adjustment_id} kept changing concurrently, gave up"
        )))
    }

    async fn apply_counters(
        &self,
        seller_id: &str,
        delta: f64,
        now: &str,
    ) -> Result<(), ServiceError> {
        self.store
            .increment(
                store::SELLERS,
                seller_id,
                &[
                    ("payoutAdjustments.pendingDeductions".to_string(), -delta),
                    ("payoutAdjustments.processedDeductions".to_string(), delta),
                ],
            )
            .await?;
        self.store
            .merge(
                store::SELLERS,
                seller_id,
                json!({ "payoutAdjustments": { "lastProcessed": now } }),
            )
            .await?;
        Ok(())
    }

    /// Compensating write after a failed counter update: put the record
    /// back to pending so the settlement stays retryable. A failure here
    /// is logged; the original counter error is the one surfaced.
    async fn revert_flip(&self, adjustment_id: &str) {
        let patch = json!({
            "status": AdjustmentStatus::PendingDeduction.as_str(),
            "processedAt": null,
            "processedBy": null,
            "updatedAt": Utc::now().to_rfc3339(),
        });
        if let Err(err) = self
            .store
            .merge(store::PAYOUT_ADJUSTMENTS, adjustment_id, patch)
            .await
        {
            warn!(%adjustment_id, error = %err, "failed to revert adjustment after counter failure");
        }
    }

    /// All adjustments for one seller, newest first, with totals by status.
    pub async fn list_for_seller(
        &self,
        seller_id: &str,
    ) -> Result<(Vec<AdjustmentRecord>, AdjustmentSummary), ServiceError> {
        let docs = self
            .store
            .query(
                store::PAYOUT_ADJUSTMENTS,
                &[Filter::eq("sellerId", seller_id)],
            )
            .await?;

        let mut records = Vec::with_capacity(docs.len());
        let mut summary = AdjustmentSummary::default();
        for doc in docs {
            let adjustment: SellerPayoutAdjustment = doc.parse()?;
            summary.total_count += 1;
            if adjustment.is_processed() {
                summary.processed_total += adjustment.settlement_delta();
            } else {
                summary.pending_total += adjustment.settlement_delta();
            }
            records.push(AdjustmentRecord {
                id: doc.id,
                adjustment,
            });
        }
        records.sort_by(|a, b| b.adjustment.created_at.cmp(&a.adjustment.created_at));
        Ok((records, summary))
    }
}
