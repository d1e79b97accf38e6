//! Reverse-logistics orchestration.
//!
//! A pending return request moves to exactly one terminal state:
//! `rejected` (no courier call), `approved` (reverse booking succeeded),
//! or `shipping_failed` (approval granted but the booking failed — the
//! failure is recorded durably even though the call errors).

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    auth::AuthUser,
    clients::{CourierApi, CourierError},
    errors::ServiceError,
    models::{return_request::ReturnStatus, Order, ReturnRequest, Seller},
    services::{
        authorization, parcels, parties,
        shipments::{appended_history, booking_request, find_order},
    },
    store::{self, DocumentStore, Filter},
};

/// Explicit budget for the reverse booking; the forward path relies on
/// the client default.
const RETURN_BOOKING_TIMEOUT: Duration = Duration::from_secs(30);

pub const RETURN_REFERENCE_PREFIX: &str = "DPAL-RTN-";

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessReturnCommand {
    #[validate(length(min = 1))]
    pub return_request_id: String,
    #[validate(length(min = 1))]
    pub order_id: String,
    /// "approve" or "reject".
    #[validate(length(min = 1))]
    pub action: String,
    pub rejection_reason: Option<String>,
    pub pickup_schedule: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnProcessed {
    pub action: String,
    pub return_request_id: String,
    pub order_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_shipping: Option<ReturnShippingSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnShippingSummary {
    pub reference_no: String,
    pub tracking_id: String,
    pub total_shipping_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_schedule: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequestRecord {
    pub id: String,
    #[serde(flatten)]
    pub request: ReturnRequest,
}

pub struct ReturnService {
    store: Arc<dyn DocumentStore>,
    courier: Arc<dyn CourierApi>,
}

impl ReturnService {
    pub fn new(store: Arc<dyn DocumentStore>, courier: Arc<dyn CourierApi>) -> Self {
        Self { store, courier }
    }

    /// Approves or rejects a pending return request.
    #[instrument(skip(self, caller, command), fields(return_request_id = %command.return_request_id, action = %command.action))]
    pub async fn process_return(
        &self,
        caller: &AuthUser,
        command: ProcessReturnCommand,
    ) -> Result<ReturnProcessed, ServiceError> {
        command.validate()?;

        let Some(rr_doc) = self
            .store
            .get(store::RETURN_REQUESTS, &command.return_request_id)
            .await?
        else {
            return Err(ServiceError::NotFound(format!(
                "Return request {} not found",
                command.return_request_id
            )));
        };
        let return_request: ReturnRequest = rr_doc.parse()?;

        let Some((order_collection, order)) =
            find_order(self.store.as_ref(), &command.order_id).await?
        else {
            return Err(ServiceError::NotFound(format!(
                "Order {} not found",
                command.order_id
            )));
        };

        if return_request.order_id.as_deref() != Some(command.order_id.as_str()) {
            return Err(ServiceError::BadRequest(
                "Return request does not belong to this order".into(),
            ));
        }
        if !return_request.is_pending() {
            return Err(ServiceError::BadRequest(format!(
                "Return request already processed (status: {})",
                return_request.status.as_deref().unwrap_or("unknown")
            )));
        }

        if !authorization::can_process_return(self.store.as_ref(), caller, &order).await? {
            return Err(ServiceError::Forbidden(
                "Only sellers and admins can process return requests".into(),
            ));
        }

        match command.action.as_str() {
            "reject" => self.reject(caller, &command, &order, order_collection).await,
            "approve" => {
                self.approve(caller, &command, &return_request, &order, order_collection)
                    .await
            }
            other => Err(ServiceError::BadRequest(format!(
                "Invalid action '{other}', expected 'approve' or 'reject'"
            ))),
        }
    }

    async fn reject(
        &self,
        caller: &AuthUser,
        command: &ProcessReturnCommand,
        order: &Order,
        order_collection: &'static str,
    ) -> Result<ReturnProcessed, ServiceError> {
        let reason = command
            .rejection_reason
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| {
                ServiceError::BadRequest("rejectionReason is required when rejecting".into())
            })?;

        let now = Utc::now().to_rfc3339();
        self.store
            .merge(
                store::RETURN_REQUESTS,
                &command.return_request_id,
                json!({
                    "status": ReturnStatus::Rejected.as_str(),
                    "rejectionReason": reason,
                    "updatedAt": now,
                    "processedBy": caller.uid,
                }),
            )
            .await?;

        self.store
            .merge(
                order_collection,
                &command.order_id,
                json!({
                    "status": "return_rejected",
                    "statusHistory": appended_history(
                        order,
                        "return_rejected",
                        &format!("Return request rejected: {reason}"),
                    ),
                }),
            )
            .await?;

        Ok(ReturnProcessed {
            action: "reject".into(),
            return_request_id: command.return_request_id.clone(),
            order_id: command.order_id.clone(),
            return_shipping: None,
        })
    }

    async fn approve(
        &self,
        caller: &AuthUser,
        command: &ProcessReturnCommand,
        return_request: &ReturnRequest,
        order: &Order,
        order_collection: &'static str,
    ) -> Result<ReturnProcessed, ServiceError> {
        // Reversed roles: the buyer ships, the primary seller receives.
        let buyer = parties::resolve_recipient(self.store.as_ref(), order, None).await?;
        let seller = parties::resolve_shipper(self.store.as_ref(), order, None).await?;

        let returned_items: Vec<_> = match &return_request.items_to_return {
            Some(product_ids) => order
                .items
                .iter()
                .filter(|item| {
                    item.product_id
                        .as_ref()
                        .map(|id| product_ids.contains(id))
                        .unwrap_or(false)
                })
                .cloned()
                .collect(),
            None => order.items.clone(),
        };

        let short_order_id: String = command.order_id.chars().take(8).collect();
        let reference_no = format!("{RETURN_REFERENCE_PREFIX}{short_order_id}");
        let request = booking_request(
            &reference_no,
            &buyer,
            &seller,
            parcels::calculate(&returned_items),
            format!("RETURN: {}", parcels::describe(&returned_items)),
            format!("Return for order {}", command.order_id),
            String::new(),
            // Returns never collect cash.
            0.0,
            order.has_fragile_items(),
        );

        let booking = match self
            .courier
            .book_shipment(&request, Some(RETURN_BOOKING_TIMEOUT))
            .await
        {
            Ok(booking) => booking,
            Err(err) => {
                // Record the failure durably before surfacing it; the
                // request must not look pending after a failed approval.
                let patch = json!({
                    "status": ReturnStatus::ShippingFailed.as_str(),
                    "shippingError": err.to_string(),
                    "updatedAt": Utc::now().to_rfc3339(),
                    "processedBy": caller.uid,
                });
                if let Err(write_err) = self
                    .store
                    .merge(store::RETURN_REQUESTS, &command.return_request_id, patch)
                    .await
                {
                    warn!(
                        return_request_id = %command.return_request_id,
                        error = %write_err,
                        "failed to record shipping_failed status"
                    );
                }
                return Err(match err {
                    CourierError::Transport(message) => {
                        ServiceError::UpstreamUnavailable(message)
                    }
                    CourierError::Rejected { message, payload } => {
                        ServiceError::UpstreamRejected { message, payload }
                    }
                });
            }
        };

        let now = Utc::now().to_rfc3339();
        self.store
            .merge(
                store::RETURN_REQUESTS,
                &command.return_request_id,
                json!({
                    "status": ReturnStatus::Approved.as_str(),
                    "updatedAt": now,
                    "processedBy": caller.uid,
                    "returnShipping": {
                        "referenceNo": reference_no.clone(),
                        "trackingId": booking.tracking_id.clone(),
                        "totalShippingAmount": booking.total_shipping_amount,
                        "pickupSchedule": command.pickup_schedule.clone(),
                        "response": booking.raw,
                    },
                }),
            )
            .await?;

        self.store
            .merge(
                order_collection,
                &command.order_id,
                json!({
                    "status": "return_approved",
                    "statusHistory": appended_history(
                        order,
                        "return_approved",
                        &format!("Return approved, pickup tracking {}", booking.tracking_id),
                    ),
                    "returnShippingInfo": {
                        "referenceNo": reference_no.clone(),
                        "trackingId": booking.tracking_id.clone(),
                        "totalShippingAmount": booking.total_shipping_amount,
                    },
                }),
            )
            .await?;

        Ok(ReturnProcessed {
            action: "approve".into(),
            return_request_id: command.return_request_id.clone(),
            order_id: command.order_id.clone(),
            return_shipping: Some(ReturnShippingSummary {
                reference_no,
                tracking_id: booking.tracking_id,
                total_shipping_amount: booking.total_shipping_amount,
                pickup_schedule: command.pickup_schedule.clone(),
            }),
        })
    }

    /// Return requests touching a seller's orders. Admins may query any
    /// seller; sellers only their own document.
    #[instrument(skip(self, caller))]
    pub async fn list_seller_return_requests(
        &self,
        caller: &AuthUser,
        seller_id: Option<String>,
        status: Option<String>,
    ) -> Result<Vec<ReturnRequestRecord>, ServiceError> {
        let seller_doc_id = match seller_id {
            Some(requested) => {
                let Some(doc) = self.store.get(store::SELLERS, &requested).await? else {
                    return Err(ServiceError::NotFound(format!(
                        "Seller {requested} not found"
                    )));
                };
                let seller: Seller = doc.parse()?;
                if !authorization::can_view_seller_adjustments(caller, &seller) {
                    return Err(ServiceError::Forbidden(
                        "You do not have access to this seller".into(),
                    ));
                }
                requested
            }
            None => authorization::resolve_own_seller_id(self.store.as_ref(), caller).await?,
        };

        let filters: Vec<Filter> = status
            .map(|s| vec![Filter::eq("status", s)])
            .unwrap_or_default();
        let docs = self.store.query(store::RETURN_REQUESTS, &filters).await?;

        let mut records = Vec::new();
        for doc in docs {
            let request: ReturnRequest = doc.parse()?;
            let Some(order_id) = request.order_id.as_deref() else {
                continue;
            };
            let Some((_, order)) = find_order(self.store.as_ref(), order_id).await? else {
                continue;
            };
            if order.seller_ids.iter().any(|id| id == &seller_doc_id) {
                records.push(ReturnRequestRecord {
                    id: doc.id,
                    request,
                });
            }
        }
        Ok(records)
    }
}
