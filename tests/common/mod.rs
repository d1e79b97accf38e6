#![allow(dead_code)]

//! Shared test harness: an app instance wired to the in-memory store and
//! fake courier/gateway doubles that record every outbound call.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{Method, Request},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;

use dentpal_ops_api::{
    app_router,
    auth::Claims,
    clients::{
        ApiShippingRequest, CourierApi, CourierBooking, CourierError, GatewayError,
        PaymentGateway, WalletTransfer, WalletTransferRequest,
    },
    config::{AppConfig, CourierConfig, GatewayConfig},
    store::{DocumentStore, MemoryStore},
    AppState,
};

pub const TEST_SECRET: &str = "test_secret_key_for_testing_purposes_32c";

/// Courier double. Responses are consumed from a queue; an empty queue
/// yields a default successful booking.
#[derive(Default)]
pub struct FakeCourier {
    requests: Mutex<Vec<(ApiShippingRequest, Option<Duration>)>>,
    responses: Mutex<VecDeque<Result<CourierBooking, CourierError>>>,
}

impl FakeCourier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_booking(&self, tracking_id: &str, total_shipping_amount: f64) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(CourierBooking {
                tracking_id: tracking_id.to_string(),
                total_shipping_amount,
                raw: json!({
                    "ShippingRequestEntityDto": {
                        "TrackingId": tracking_id,
                        "TotalShippingAmount": total_shipping_amount,
                    }
                }),
            }));
    }

    pub fn push_rejection(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(CourierError::Rejected {
                message: message.to_string(),
                payload: json!({ "Success": false, "ErrorMessage": message }),
            }));
    }

    pub fn push_transport_failure(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(CourierError::Transport(message.to_string())));
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> ApiShippingRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .expect("courier was never called")
            .0
            .clone()
    }

    pub fn last_timeout(&self) -> Option<Duration> {
        self.requests
            .lock()
            .unwrap()
            .last()
            .expect("courier was never called")
            .1
    }
}

#[async_trait]
impl CourierApi for FakeCourier {
    async fn book_shipment(
        &self,
        request: &ApiShippingRequest,
        timeout: Option<Duration>,
    ) -> Result<CourierBooking, CourierError> {
        self.requests
            .lock()
            .unwrap()
            .push((request.clone(), timeout));
        match self.responses.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(CourierBooking {
                tracking_id: "JRS-TEST-0001".to_string(),
                total_shipping_amount: 150.0,
                raw: json!({
                    "ShippingRequestEntityDto": {
                        "TrackingId": "JRS-TEST-0001",
                        "TotalShippingAmount": 150.0,
                    }
                }),
            }),
        }
    }
}

/// Gateway double with the same queue discipline as [`FakeCourier`].
#[derive(Default)]
pub struct FakeGateway {
    transfers: Mutex<Vec<WalletTransferRequest>>,
    create_responses: Mutex<VecDeque<Result<WalletTransfer, GatewayError>>>,
    get_responses: Mutex<VecDeque<Result<WalletTransfer, GatewayError>>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_transfer(&self, id: &str, status: &str, net_amount: Option<i64>) {
        self.create_responses
            .lock()
            .unwrap()
            .push_back(Ok(transfer(id, status, net_amount)));
    }

    pub fn push_provider_error(&self, code: &str, detail: &str) {
        self.create_responses
            .lock()
            .unwrap()
            .push_back(Err(GatewayError::Provider {
                code: code.to_string(),
                detail: detail.to_string(),
                payload: json!({ "errors": [{ "code": code, "detail": detail }] }),
            }));
    }

    pub fn push_transport_failure(&self, message: &str) {
        self.create_responses
            .lock()
            .unwrap()
            .push_back(Err(GatewayError::Transport(message.to_string())));
    }

    pub fn push_lookup(&self, id: &str, status: &str, net_amount: Option<i64>) {
        self.get_responses
            .lock()
            .unwrap()
            .push_back(Ok(transfer(id, status, net_amount)));
    }

    pub fn transfer_count(&self) -> usize {
        self.transfers.lock().unwrap().len()
    }

    pub fn last_transfer(&self) -> WalletTransferRequest {
        self.transfers
            .lock()
            .unwrap()
            .last()
            .expect("gateway was never called")
            .clone()
    }
}

fn transfer(id: &str, status: &str, net_amount: Option<i64>) -> WalletTransfer {
    WalletTransfer {
        id: id.to_string(),
        status: status.to_string(),
        net_amount,
        raw: json!({
            "data": {
                "id": id,
                "attributes": { "status": status, "net_amount": net_amount }
            }
        }),
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_wallet_transfer(
        &self,
        request: &WalletTransferRequest,
    ) -> Result<WalletTransfer, GatewayError> {
        self.transfers.lock().unwrap().push(request.clone());
        match self.create_responses.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(transfer("tr_test_0001", "completed", Some(request.amount))),
        }
    }

    async fn get_transfer(&self, transfer_id: &str) -> Result<WalletTransfer, GatewayError> {
        match self.get_responses.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(transfer(transfer_id, "pending", None)),
        }
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: TEST_SECRET.to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
        log_level: "debug".to_string(),
        log_json: false,
        courier: CourierConfig {
            api_url: "http://courier.test".to_string(),
            api_key: "test-key".to_string(),
        },
        gateway: GatewayConfig {
            api_url: "http://gateway.test".to_string(),
            secret_key: "sk_test_key".to_string(),
            wallet_id: "wallet_test".to_string(),
        },
    }
}

/// Full application wired to in-memory infrastructure.
pub struct TestApp {
    router: Router,
    pub store: Arc<MemoryStore>,
    pub courier: Arc<FakeCourier>,
    pub gateway: Arc<FakeGateway>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let courier = Arc::new(FakeCourier::new());
        let gateway = Arc::new(FakeGateway::new());
        let state = AppState::new(
            test_config(),
            store.clone(),
            courier.clone(),
            gateway.clone(),
        );
        Self {
            router: app_router(state),
            store,
            courier,
            gateway,
        }
    }

    pub async fn seed(&self, collection: &str, id: &str, data: Value) {
        self.store
            .insert(collection, id, data)
            .await
            .expect("seed document");
    }

    pub async fn doc(&self, collection: &str, id: &str) -> Value {
        self.store
            .get(collection, id)
            .await
            .expect("read document")
            .expect("document exists")
            .data
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        payload: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request_body = match payload {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&json).expect("serialize request body"))
            }
            None => Body::empty(),
        };
        self.router
            .clone()
            .oneshot(builder.body(request_body).expect("build request"))
            .await
            .expect("infallible router call")
    }
}

pub async fn response_json(response: axum::response::Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response body")
}

pub fn token_for(uid: &str, email: Option<&str>, role: Option<&str>) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: uid.to_string(),
        email: email.map(str::to_string),
        role: role.map(str::to_string),
        claims: None,
        exp: now + 3600,
        iat: Some(now),
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("encode test token")
}

pub fn admin_token() -> String {
    token_for("admin-1", Some("admin@dentpal.ph"), Some("admin"))
}
