use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::instrument;

/// Wallet-transfer submission. Amount is already in minor units.
#[derive(Debug, Clone, Serialize)]
pub struct WalletTransferRequest {
    pub amount: i64,
    pub currency: String,
    pub description: String,
    pub receiver: Value,
    pub reference_number: String,
}

/// Gateway-side view of a transfer.
#[derive(Debug, Clone)]
pub struct WalletTransfer {
    pub id: String,
    pub status: String,
    pub net_amount: Option<i64>,
    pub raw: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("gateway transport failure: {0}")]
    Transport(String),

    /// The gateway answered with an error body.
    #[error("gateway error {code}: {detail}")]
    Provider {
        code: String,
        detail: String,
        payload: Value,
    },
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_wallet_transfer(
        &self,
        request: &WalletTransferRequest,
    ) -> Result<WalletTransfer, GatewayError>;

    async fn get_transfer(&self, transfer_id: &str) -> Result<WalletTransfer, GatewayError>;
}

/// PayMongo client. Authenticates with the secret key over HTTP basic
/// auth, the way their API expects (key as username, empty password).
pub struct PaymongoClient {
    http: reqwest::Client,
    api_url: String,
    secret_key: String,
    wallet_id: String,
}

impl PaymongoClient {
    pub fn new(api_url: String, secret_key: String, wallet_id: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url,
            secret_key,
            wallet_id,
        }
    }

    fn parse_transfer(payload: Value) -> Result<WalletTransfer, GatewayError> {
        let data = payload.get("data").cloned().unwrap_or(Value::Null);
        let id = data
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| GatewayError::Provider {
                code: "malformed_response".into(),
                detail: "transfer response missing data.id".into(),
                payload: payload.clone(),
            })?;
        let attributes = data.get("attributes").cloned().unwrap_or(Value::Null);
        let status = attributes
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("pending")
            .to_string();
        let net_amount = attributes.get("net_amount").and_then(Value::as_i64);
        Ok(WalletTransfer {
            id,
            status,
            net_amount,
            raw: payload,
        })
    }

    fn provider_error(status: reqwest::StatusCode, payload: Value) -> GatewayError {
        let first_error = payload
            .get("errors")
            .and_then(|e| e.get(0))
            .cloned()
            .unwrap_or(Value::Null);
        GatewayError::Provider {
            code: first_error
                .get("code")
                .and_then(Value::as_str)
                .unwrap_or(status.as_str())
                .to_string(),
            detail: first_error
                .get("detail")
                .and_then(Value::as_str)
                .unwrap_or("gateway rejected the request")
                .to_string(),
            payload,
        }
    }
}

#[async_trait]
impl PaymentGateway for PaymongoClient {
    #[instrument(skip(self, request), fields(reference = %request.reference_number))]
    async fn create_wallet_transfer(
        &self,
        request: &WalletTransferRequest,
    ) -> Result<WalletTransfer, GatewayError> {
        let url = format!("{}/wallets/{}/transfers", self.api_url, self.wallet_id);
        let body = json!({ "data": { "attributes": request } });

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.secret_key, Some(""))
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(format!("invalid gateway response: {e}")))?;

        if !status.is_success() {
            return Err(Self::provider_error(status, payload));
        }
        Self::parse_transfer(payload)
    }

    #[instrument(skip(self))]
    async fn get_transfer(&self, transfer_id: &str) -> Result<WalletTransfer, GatewayError> {
        let url = format!(
            "{}/wallets/{}/transfers/{}",
            self.api_url, self.wallet_id, transfer_id
        );

        let response = self
            .http
            .get(&url)
            .basic_auth(&self.secret_key, Some(""))
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(format!("invalid gateway response: {e}")))?;

        if !status.is_success() {
            return Err(Self::provider_error(status, payload));
        }
        Self::parse_transfer(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_transfer_response() {
        let payload = json!({
            "data": {
                "id": "xfer_abc",
                "attributes": {"status": "completed", "net_amount": 149_000}
            }
        });
        let transfer = PaymongoClient::parse_transfer(payload).unwrap();
        assert_eq!(transfer.id, "xfer_abc");
        assert_eq!(transfer.status, "completed");
        assert_eq!(transfer.net_amount, Some(149_000));
    }

    #[test]
    fn maps_gateway_error_body() {
        let payload = json!({
            "errors": [{"code": "insufficient_funds", "detail": "Wallet balance too low"}]
        });
        let err = PaymongoClient::provider_error(reqwest::StatusCode::BAD_REQUEST, payload);
        match err {
            GatewayError::Provider { code, detail, .. } => {
                assert_eq!(code, "insufficient_funds");
                assert_eq!(detail, "Wallet balance too low");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
