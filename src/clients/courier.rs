use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::instrument;

/// One parcel line in a booking request. Produced by the shipment item
/// calculator; serialized in the carrier's PascalCase convention.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ParcelDescriptor {
    pub item_name: String,
    pub quantity: f64,
    /// Centimeters.
    pub length: f64,
    pub width: f64,
    pub height: f64,
    /// Kilograms, already scaled by quantity.
    pub weight: f64,
    /// Pesos, already scaled by quantity.
    pub declared_value: f64,
}

/// The `apiShippingRequest` body the courier expects. Shipper and
/// consignee blocks are symmetric on purpose: a return shipment is the
/// same request with the two parties swapped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ApiShippingRequest {
    pub reference_no: String,

    pub shipper_name: String,
    pub shipper_contact_no: String,
    pub shipper_email: String,
    pub shipper_address1: String,
    pub shipper_barangay: String,
    pub shipper_city: String,
    pub shipper_state: String,
    pub shipper_country: String,
    pub shipper_zip_code: String,

    pub consignee_name: String,
    pub consignee_contact_no: String,
    pub consignee_email: String,
    pub consignee_address1: String,
    pub consignee_barangay: String,
    pub consignee_city: String,
    pub consignee_state: String,
    pub consignee_country: String,
    pub consignee_zip_code: String,

    pub description: String,
    pub remarks: String,
    pub special_instruction: String,
    pub cod_amount_to_collect: f64,
    pub declared_value: f64,
    pub is_fragile: bool,
    pub items: Vec<ParcelDescriptor>,
}

/// Successful booking result.
#[derive(Debug, Clone)]
pub struct CourierBooking {
    pub tracking_id: String,
    pub total_shipping_amount: f64,
    /// Full upstream response, persisted with the order for audit.
    pub raw: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum CourierError {
    /// The courier could not be reached (connect failure, timeout).
    #[error("courier transport failure: {0}")]
    Transport(String),

    /// The courier answered but declined the booking.
    #[error("courier rejected booking: {message}")]
    Rejected { message: String, payload: Value },
}

#[async_trait]
pub trait CourierApi: Send + Sync {
    /// Books a shipment. `timeout` overrides the client default when set;
    /// the reverse-logistics path passes an explicit 30s budget.
    async fn book_shipment(
        &self,
        request: &ApiShippingRequest,
        timeout: Option<Duration>,
    ) -> Result<CourierBooking, CourierError>;
}

/// reqwest-backed JRS client.
pub struct JrsCourierClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl JrsCourierClient {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url,
            api_key,
        }
    }
}

#[async_trait]
impl CourierApi for JrsCourierClient {
    #[instrument(skip(self, request), fields(reference_no = %request.reference_no))]
    async fn book_shipment(
        &self,
        request: &ApiShippingRequest,
        timeout: Option<Duration>,
    ) -> Result<CourierBooking, CourierError> {
        let body = json!({
            "requestType": "MC_TO_MC",
            "apiShippingRequest": request,
        });

        let mut builder = self
            .http
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .json(&body);
        if let Some(budget) = timeout {
            builder = builder.timeout(budget);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| CourierError::Transport(e.to_string()))?;

        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .map_err(|e| CourierError::Transport(format!("invalid courier response: {e}")))?;

        if !status.is_success() {
            return Err(CourierError::Rejected {
                message: format!("courier returned HTTP {status}"),
                payload,
            });
        }

        // `Success` is only present on the error shape of the response.
        if payload.get("Success").and_then(Value::as_bool) == Some(false) {
            let message = payload
                .get("ErrorMessage")
                .and_then(Value::as_str)
                .unwrap_or("courier reported a booking failure")
                .to_string();
            return Err(CourierError::Rejected { message, payload });
        }

        let dto = payload
            .get("ShippingRequestEntityDto")
            .cloned()
            .unwrap_or(Value::Null);
        let tracking_id = dto
            .get("TrackingId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| CourierError::Rejected {
                message: "courier response missing TrackingId".to_string(),
                payload: payload.clone(),
            })?;
        let total_shipping_amount = dto
            .get("TotalShippingAmount")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);

        Ok(CourierBooking {
            tracking_id,
            total_shipping_amount,
            raw: payload,
        })
    }
}
