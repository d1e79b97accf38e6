//! HTTP-level coverage for the courier and gateway clients against a mock
//! upstream server.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dentpal_ops_api::clients::{
    ApiShippingRequest, CourierApi, CourierError, GatewayError, JrsCourierClient,
    PaymentGateway, PaymongoClient, WalletTransferRequest,
};

fn booking_request() -> ApiShippingRequest {
    ApiShippingRequest {
        reference_no: "DPAL-O1".to_string(),
        shipper_name: "DentPal Supplies".to_string(),
        consignee_name: "Ana Reyes".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn courier_booking_parses_tracking_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("x-api-key", "key-123"))
        .and(body_partial_json(json!({
            "requestType": "MC_TO_MC",
            "apiShippingRequest": {"ReferenceNo": "DPAL-O1"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ShippingRequestEntityDto": {
                "TrackingId": "JRS-55001",
                "TotalShippingAmount": 185.5
            }
        })))
        .mount(&server)
        .await;

    let client = JrsCourierClient::new(server.uri(), "key-123".to_string());
    let booking = client
        .book_shipment(&booking_request(), None)
        .await
        .expect("successful booking");
    assert_eq!(booking.tracking_id, "JRS-55001");
    assert_eq!(booking.total_shipping_amount, 185.5);
}

#[tokio::test]
async fn courier_business_failure_is_a_rejection_with_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Success": false,
            "ErrorMessage": "Area not serviceable"
        })))
        .mount(&server)
        .await;

    let client = JrsCourierClient::new(server.uri(), "key-123".to_string());
    let err = client
        .book_shipment(&booking_request(), None)
        .await
        .expect_err("booking must fail");
    match err {
        CourierError::Rejected { message, payload } => {
            assert_eq!(message, "Area not serviceable");
            assert_eq!(payload["Success"], json!(false));
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn courier_http_error_carries_the_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"detail": "internal"})),
        )
        .mount(&server)
        .await;

    let client = JrsCourierClient::new(server.uri(), "key-123".to_string());
    let err = client
        .book_shipment(&booking_request(), None)
        .await
        .expect_err("booking must fail");
    assert!(matches!(err, CourierError::Rejected { .. }));
}

#[tokio::test]
async fn wallet_transfer_posts_to_the_wallet_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/wallets/wallet_9/transfers"))
        .and(body_partial_json(json!({
            "data": {"attributes": {"amount": 150000, "currency": "PHP"}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": "tr_777",
                "attributes": {"status": "completed", "net_amount": 147000}
            }
        })))
        .mount(&server)
        .await;

    let client = PaymongoClient::new(
        server.uri(),
        "sk_test_abc".to_string(),
        "wallet_9".to_string(),
    );
    let transfer = client
        .create_wallet_transfer(&WalletTransferRequest {
            amount: 150_000,
            currency: "PHP".to_string(),
            description: "withdrawal WD-1".to_string(),
            receiver: json!({"type": "gcash"}),
            reference_number: "WD-1".to_string(),
        })
        .await
        .expect("transfer created");
    assert_eq!(transfer.id, "tr_777");
    assert_eq!(transfer.status, "completed");
    assert_eq!(transfer.net_amount, Some(147_000));
}

#[tokio::test]
async fn gateway_error_body_maps_to_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "errors": [{"code": "insufficient_funds", "detail": "Wallet balance too low"}]
        })))
        .mount(&server)
        .await;

    let client = PaymongoClient::new(
        server.uri(),
        "sk_test_abc".to_string(),
        "wallet_9".to_string(),
    );
    let err = client
        .create_wallet_transfer(&WalletTransferRequest {
            amount: 100,
            currency: "PHP".to_string(),
            description: "x".to_string(),
            receiver: json!({}),
            reference_number: "WD-9".to_string(),
        })
        .await
        .expect_err("must fail");
    match err {
        GatewayError::Provider { code, detail, .. } => {
            assert_eq!(code, "insufficient_funds");
            assert_eq!(detail, "Wallet balance too low");
        }
        other => panic!("expected provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn transfer_lookup_hits_the_transfer_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wallets/wallet_9/transfers/tr_777"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"id": "tr_777", "attributes": {"status": "pending"}}
        })))
        .mount(&server)
        .await;

    let client = PaymongoClient::new(
        server.uri(),
        "sk_test_abc".to_string(),
        "wallet_9".to_string(),
    );
    let transfer = client.get_transfer("tr_777").await.expect("lookup");
    assert_eq!(transfer.status, "pending");
}
