//! Forward-shipment orchestration.
//!
//! The one-way transition `(no tracking) -> shipping` is guarded by the
//! existing `shippingInfo.jrs.trackingId`: once a booking exists the
//! courier side effect cannot be rolled back, so a second create attempt
//! gets 409 and never reaches the courier.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    auth::AuthUser,
    clients::{ApiShippingRequest, CourierApi, CourierError, ParcelDescriptor},
    errors::ServiceError,
    models::{Order, StatusHistoryEntry},
    services::{
        authorization, parcels,
        parties::{self, Party, PartyOverride},
        payout_ledger::PayoutLedgerService,
    },
    store::{self, DocumentStore},
};

/// Order statuses from which a shipment may be created. Matched after
/// trimming and lowercasing the stored value.
pub const SHIPPABLE_STATUSES: [&str; 5] =
    ["confirmed", "paid", "processing", "ready_to_ship", "to_ship"];

pub const SHIPPING_REFERENCE_PREFIX: &str = "DPAL-";

const FRAGILE_REMARK_PREFIX: &str = "FRAGILE - ";
const FRAGILE_INSTRUCTION: &str = "Handle with care, package contains fragile dental items. ";

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateShipmentCommand {
    #[validate(length(min = 1))]
    pub order_id: String,
    pub recipient_info: Option<PartyOverride>,
    pub shipper_info: Option<PartyOverride>,
    pub remarks: Option<String>,
    pub special_instruction: Option<String>,
    pub cod_amount_to_collect: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentCreated {
    pub shipping_reference_no: String,
    pub tracking_id: String,
    pub total_shipping_amount: f64,
    pub shipping_charges: ShippingCharges,
    pub cash_on_delivery: CashOnDelivery,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShippingCharges {
    pub seller_shipping_charge: f64,
    pub buyer_shipping_charge: f64,
    pub shipping_cost: f64,
    pub payout_adjustment_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CashOnDelivery {
    pub is_cod: bool,
    pub amount_to_collect: f64,
}

/// Read-back view for the dashboard.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentView {
    pub order_id: String,
    pub shipping_reference_no: Option<String>,
    pub tracking_id: Option<String>,
    pub total_shipping_amount: Option<f64>,
    pub requested_at: Option<String>,
}

/// Looks an order up across the candidate collections in order; first
/// existing match wins.
pub(crate) async fn find_order(
    store: &dyn DocumentStore,
    order_id: &str,
) -> Result<Option<(&'static str, Order)>, ServiceError> {
    for collection in store::ORDER_COLLECTIONS {
        if let Some(doc) = store.get(collection, order_id).await? {
            let order: Order = doc.parse()?;
            return Ok(Some((collection, order)));
        }
    }
    Ok(None)
}

/// Appends a status-history entry, returning the full replacement array
/// (merge writes replace arrays wholesale).
pub(crate) fn appended_history(order: &Order, status: &str, note: &str) -> Value {
    let mut history = order.status_history.clone();
    history.push(StatusHistoryEntry {
        status: status.to_string(),
        note: Some(note.to_string()),
        timestamp: Some(Utc::now().to_rfc3339()),
    });
    serde_json::to_value(history).unwrap_or_else(|_| json!([]))
}

/// Builds the courier booking body from two resolved parties. Return
/// shipments call this with the parties swapped; nothing else differs.
pub(crate) fn booking_request(
    reference_no: &str,
    shipper: &Party,
    consignee: &Party,
    items: Vec<ParcelDescriptor>,
    description: String,
    remarks: String,
    special_instruction: String,
    cod_amount_to_collect: f64,
    is_fragile: bool,
) -> ApiShippingRequest {
    let declared_value = items.iter().map(|p| p.declared_value).sum();
    ApiShippingRequest {
        reference_no: reference_no.to_string(),

        shipper_name: shipper.name.clone(),
        shipper_contact_no: shipper.phone.clone(),
        shipper_email: shipper.email.clone(),
        shipper_address1: shipper.address.address_line1.clone(),
        shipper_barangay: shipper.address.district.clone(),
        shipper_city: shipper.address.city.clone(),
        shipper_state: shipper.address.state.clone(),
        shipper_country: shipper.address.country.clone(),
        shipper_zip_code: shipper.address.postal_code.clone(),

        consignee_name: consignee.name.clone(),
        consignee_contact_no: consignee.phone.clone(),
        consignee_email: consignee.email.clone(),
        consignee_address1: consignee.address.address_line1.clone(),
        consignee_barangay: consignee.address.district.clone(),
        consignee_city: consignee.address.city.clone(),
        consignee_state: consignee.address.state.clone(),
        consignee_country: consignee.address.country.clone(),
        consignee_zip_code: consignee.address.postal_code.clone(),

        description,
        remarks,
        special_instruction,
        cod_amount_to_collect,
        declared_value,
        is_fragile,
        items,
    }
}

fn prefix_once(text: String, prefix: &str) -> String {
    if text.starts_with(prefix) {
        text
    } else {
        format!("{prefix}{text}")
    }
}

pub struct ShipmentService {
    store: Arc<dyn DocumentStore>,
    courier: Arc<dyn CourierApi>,
    ledger: Arc<PayoutLedgerService>,
}

impl ShipmentService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        courier: Arc<dyn CourierApi>,
        ledger: Arc<PayoutLedgerService>,
    ) -> Self {
        Self {
            store,
            courier,
            ledger,
        }
    }

    /// Creates a courier shipment for an order and persists the result.
    #[instrument(skip(self, caller, command), fields(order_id = %command.order_id))]
    pub async fn create_shipment(
        &self,
        caller: &AuthUser,
        command: CreateShipmentCommand,
    ) -> Result<ShipmentCreated, ServiceError> {
        command.validate()?;
        if command.order_id.trim().is_empty() {
            return Err(ServiceError::ValidationError("orderId is required".into()));
        }

        let Some((collection, order)) =
            find_order(self.store.as_ref(), &command.order_id).await?
        else {
            return Err(ServiceError::NotFound(format!(
                "Order {} not found",
                command.order_id
            )));
        };

        if !authorization::can_access_order(self.store.as_ref(), caller, &order).await? {
            return Err(ServiceError::Forbidden(
                "You do not have access to this order".into(),
            ));
        }

        if let Some(tracking_id) = order.tracking_id() {
            return Err(ServiceError::AlreadyShipped {
                tracking_id: tracking_id.to_string(),
            });
        }

        let raw_status = order.status.clone().unwrap_or_default();
        let normalized_status = raw_status.trim().to_lowercase();
        if !SHIPPABLE_STATUSES.contains(&normalized_status.as_str()) {
            return Err(ServiceError::InvalidOrderStatus {
                raw: raw_status,
                normalized: normalized_status,
            });
        }

        let recipient = parties::resolve_recipient(
            self.store.as_ref(),
            &order,
            command.recipient_info.as_ref(),
        )
        .await?;
        let shipper =
            parties::resolve_shipper(self.store.as_ref(), &order, command.shipper_info.as_ref())
                .await?;

        let items = parcels::calculate(&order.items);
        let description = parcels::describe(&order.items);

        let is_cod = order.is_cash_on_delivery();
        let cod_amount = command.cod_amount_to_collect.unwrap_or_else(|| {
            if is_cod {
                order
                    .summary
                    .as_ref()
                    .and_then(|s| s.total)
                    .unwrap_or(0.0)
            } else {
                0.0
            }
        });

        let is_fragile = order.has_fragile_items();
        let mut remarks = command.remarks.clone().unwrap_or_default();
        let mut special_instruction = command.special_instruction.clone().unwrap_or_default();
        if is_fragile {
            remarks = prefix_once(remarks, FRAGILE_REMARK_PREFIX);
            special_instruction = prefix_once(special_instruction, FRAGILE_INSTRUCTION);
        }

        let reference_no = format!("{SHIPPING_REFERENCE_PREFIX}{}", command.order_id);
        let request = booking_request(
            &reference_no,
            &shipper,
            &recipient,
            items,
            description,
            remarks,
            special_instruction,
            cod_amount,
            is_fragile,
        );

        // No timeout override on the forward path: the client default
        // applies. Nothing has been persisted yet, so a failure here is a
        // clean 400 with the upstream payload.
        let booking = match self.courier.book_shipment(&request, None).await {
            Ok(booking) => booking,
            Err(CourierError::Transport(message)) => {
                return Err(ServiceError::UpstreamRejected {
                    message: message.clone(),
                    payload: json!({ "error": message }),
                });
            }
            Err(CourierError::Rejected { message, payload }) => {
                return Err(ServiceError::UpstreamRejected { message, payload });
            }
        };

        let summary = order.summary.clone().unwrap_or_default();
        let seller_charge = summary.seller_shipping_charge.unwrap_or(0.0);
        let buyer_charge = summary.buyer_shipping_charge.unwrap_or(0.0);
        let shipping_cost = summary
            .shipping_cost
            .unwrap_or(booking.total_shipping_amount);
        if shipping_cost > 0.0 && (seller_charge + buyer_charge - shipping_cost).abs() > 0.01 {
            // Soft invariant: log and proceed.
            warn!(
                order_id = %command.order_id,
                seller_charge,
                buyer_charge,
                shipping_cost,
                "shipping charge allocation mismatch"
            );
        }

        // The booking already happened; a ledger failure must not unwind it.
        let mut payout_adjustment_id = None;
        if seller_charge > 0.0 {
            if let Some(seller_id) = order.primary_seller_id() {
                match self
                    .ledger
                    .create(
                        &command.order_id,
                        seller_id,
                        seller_charge,
                        &reference_no,
                        &booking.tracking_id,
                    )
                    .await
                {
                    Ok(id) => payout_adjustment_id = Some(id),
                    Err(err) => {
                        warn!(
                            order_id = %command.order_id,
                            error = %err,
                            "payout adjustment creation failed, shipment continues"
                        );
                    }
                }
            }
        }

        let now = Utc::now().to_rfc3339();
        let patch = json!({
            "status": "shipping",
            "fulfillmentStage": null,
            "statusHistory": appended_history(
                &order,
                "shipping",
                &format!("Shipment booked, tracking {}", booking.tracking_id),
            ),
            "shippingInfo": {
                "jrs": {
                    "response": booking.raw,
                    "shippingReferenceNo": reference_no.clone(),
                    "trackingId": booking.tracking_id.clone(),
                    "requestedAt": now,
                    "totalShippingAmount": booking.total_shipping_amount,
                    "cashOnDelivery": {
                        "isCod": is_cod || cod_amount > 0.0,
                        "amountToCollect": cod_amount,
                    },
                    "shippingCharge": {
                        "sellerShippingCharge": seller_charge,
                        "buyerShippingCharge": buyer_charge,
                        "shippingCost": shipping_cost,
                        "payoutAdjustmentId": payout_adjustment_id.clone(),
                    },
                },
            },
        });

        if let Err(err) = self
            .store
            .merge(collection, &command.order_id, patch)
            .await
        {
            // The shipment exists in the real world; surface the stale
            // record explicitly instead of pretending the call failed.
            return Err(ServiceError::PartialFulfillment {
                tracking_id: booking.tracking_id,
                reference_no,
                message: err.to_string(),
            });
        }

        Ok(ShipmentCreated {
            shipping_reference_no: reference_no,
            tracking_id: booking.tracking_id,
            total_shipping_amount: booking.total_shipping_amount,
            shipping_charges: ShippingCharges {
                seller_shipping_charge: seller_charge,
                buyer_shipping_charge: buyer_charge,
                shipping_cost,
                payout_adjustment_id,
            },
            cash_on_delivery: CashOnDelivery {
                is_cod: is_cod || cod_amount > 0.0,
                amount_to_collect: cod_amount,
            },
            message: "Shipment created successfully".into(),
        })
    }

    /// Read-back of an order's booked shipment for the dashboard.
    #[instrument(skip(self, caller))]
    pub async fn get_shipment(
        &self,
        caller: &AuthUser,
        order_id: &str,
    ) -> Result<ShipmentView, ServiceError> {
        let Some((_, order)) = find_order(self.store.as_ref(), order_id).await? else {
            return Err(ServiceError::NotFound(format!("Order {order_id} not found")));
        };
        if !authorization::can_access_order(self.store.as_ref(), caller, &order).await? {
            return Err(ServiceError::Forbidden(
                "You do not have access to this order".into(),
            ));
        }
        let jrs = order
            .shipping_info
            .as_ref()
            .and_then(|s| s.jrs.as_ref())
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order {order_id} has no shipment"))
            })?;
        Ok(ShipmentView {
            order_id: order_id.to_string(),
            shipping_reference_no: jrs.shipping_reference_no.clone(),
            tracking_id: jrs.tracking_id.clone(),
            total_shipping_amount: jrs.total_shipping_amount,
            requested_at: jrs.requested_at.clone(),
        })
    }
}
