//! Payout adjustment ledger: creation side effects, batch settlement
//! idempotency, per-record failure isolation, and the seller-facing list.

mod common;

use axum::http::Method;
use common::{admin_token, response_json, token_for, TestApp};
use serde_json::json;

fn pending_adjustment(order_id: &str, seller_id: &str, charge: f64, created_at: &str) -> serde_json::Value {
    json!({
        "orderId": order_id,
        "sellerId": seller_id,
        "type": "shipping_charge",
        "amount": -charge,
        "shippingReference": format!("DPAL-{order_id}"),
        "trackingId": format!("JRS-{order_id}"),
        "status": "pending_deduction",
        "metadata": {"originalShippingCharge": charge},
        "createdAt": created_at,
        "updatedAt": created_at
    })
}

#[tokio::test]
async fn settlement_flips_records_and_moves_seller_counters() {
    let app = TestApp::new();
    app.seed(
        "Seller",
        "S1",
        json!({
            "userId": "seller-uid-1",
            "payoutAdjustments": {
                "totalShippingCharges": 130.0,
                "pendingDeductions": 130.0,
                "processedDeductions": 0.0
            }
        }),
    )
    .await;
    app.seed(
        "SellerPayoutAdjustments",
        "ADJ-1",
        pending_adjustment("O-1", "S1", 80.0, "2026-08-01T00:00:00Z"),
    )
    .await;
    app.seed(
        "SellerPayoutAdjustments",
        "ADJ-2",
        pending_adjustment("O-2", "S1", 50.0, "2026-08-02T00:00:00Z"),
    )
    .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/payout-adjustments/process",
            None,
            Some(&admin_token()),
        )
        .await;
    assert_eq!(response.status(), 200);

    let body = response_json(response).await;
    assert_eq!(body["data"]["processed"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["errors"].as_array().unwrap().len(), 0);

    let adj = app.doc("SellerPayoutAdjustments", "ADJ-1").await;
    assert_eq!(adj["status"], "processed");
    assert_eq!(adj["processedBy"], "admin-1");
    assert!(adj["processedAt"].is_string());

    let seller = app.doc("Seller", "S1").await;
    assert_eq!(seller["payoutAdjustments"]["pendingDeductions"], 0.0);
    assert_eq!(seller["payoutAdjustments"]["processedDeductions"], 130.0);
    assert_eq!(seller["payoutAdjustments"]["totalShippingCharges"], 130.0);
}

#[tokio::test]
async fn settlement_is_idempotent_across_runs() {
    let app = TestApp::new();
    app.seed("Seller", "S1", json!({"userId": "seller-uid-1"})).await;
    app.seed(
        "SellerPayoutAdjustments",
        "ADJ-1",
        pending_adjustment("O-1", "S1", 80.0, "2026-08-01T00:00:00Z"),
    )
    .await;

    let first = app
        .request(
            Method::POST,
            "/api/v1/payout-adjustments/process",
            None,
            Some(&admin_token()),
        )
        .await;
    let body = response_json(first).await;
    assert_eq!(body["data"]["processed"].as_array().unwrap().len(), 1);

    // Second run finds nothing pending and changes nothing.
    let second = app
        .request(
            Method::POST,
            "/api/v1/payout-adjustments/process",
            None,
            Some(&admin_token()),
        )
        .await;
    let body = response_json(second).await;
    assert_eq!(body["data"]["processed"].as_array().unwrap().len(), 0);
    assert_eq!(body["data"]["errors"].as_array().unwrap().len(), 0);

    let seller = app.doc("Seller", "S1").await;
    assert_eq!(seller["payoutAdjustments"]["processedDeductions"], 80.0);
    // Decremented exactly once even though the batch ran twice.
    assert_eq!(seller["payoutAdjustments"]["pendingDeductions"], -80.0);
}

#[tokio::test]
async fn one_failing_record_does_not_block_the_batch() {
    let app = TestApp::new();
    app.seed("Seller", "S-GOOD", json!({"userId": "u-good"})).await;
    app.seed("Seller", "S-BAD", json!({"userId": "u-bad"})).await;
    app.seed(
        "SellerPayoutAdjustments",
        "ADJ-GOOD",
        pending_adjustment("O-G", "S-GOOD", 60.0, "2026-08-01T00:00:00Z"),
    )
    .await;
    app.seed(
        "SellerPayoutAdjustments",
        "ADJ-BAD",
        pending_adjustment("O-B", "S-BAD", 40.0, "2026-08-02T00:00:00Z"),
    )
    .await;
    // Counter writes for the bad seller fail after the record flips.
    app.store.poison_writes("Seller", "S-BAD");

    let response = app
        .request(
            Method::POST,
            "/api/v1/payout-adjustments/process",
            None,
            Some(&admin_token()),
        )
        .await;
    assert_eq!(response.status(), 200);

    let body = response_json(response).await;
    let processed = body["data"]["processed"].as_array().unwrap();
    let errors = body["data"]["errors"].as_array().unwrap();
    assert_eq!(processed.len(), 1);
    assert_eq!(processed[0]["adjustmentId"], "ADJ-GOOD");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["adjustmentId"], "ADJ-BAD");

    let good = app.doc("Seller", "S-GOOD").await;
    assert_eq!(good["payoutAdjustments"]["processedDeductions"], 60.0);

    // The failed record reverts to pending instead of sticking half-settled.
    let bad = app.doc("SellerPayoutAdjustments", "ADJ-BAD").await;
    assert_eq!(bad["status"], "pending_deduction");
}

#[tokio::test]
async fn failed_counter_write_leaves_the_record_retryable() {
    let app = TestApp::new();
    app.seed(
        "Seller",
        "S1",
        json!({
            "userId": "seller-uid-1",
            "payoutAdjustments": {"pendingDeductions": 40.0, "processedDeductions": 0.0}
        }),
    )
    .await;
    app.seed(
        "SellerPayoutAdjustments",
        "ADJ-1",
        pending_adjustment("O-1", "S1", 40.0, "2026-08-01T00:00:00Z"),
    )
    .await;
    app.store.poison_writes("Seller", "S1");

    // Every run reports the failure; none of them silently drops the record.
    for _ in 0..2 {
        let response = app
            .request(
                Method::POST,
                "/api/v1/payout-adjustments/process",
                None,
                Some(&admin_token()),
            )
            .await;
        assert_eq!(response.status(), 200);

        let body = response_json(response).await;
        assert_eq!(body["data"]["processed"].as_array().unwrap().len(), 0);
        let errors = body["data"]["errors"].as_array().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0]["adjustmentId"], "ADJ-1");
    }

    let adj = app.doc("SellerPayoutAdjustments", "ADJ-1").await;
    assert_eq!(adj["status"], "pending_deduction");
    assert!(adj.get("processedAt").is_none());
    assert!(adj.get("processedBy").is_none());

    let seller = app.doc("Seller", "S1").await;
    assert_eq!(seller["payoutAdjustments"]["pendingDeductions"], 40.0);
    assert_eq!(seller["payoutAdjustments"]["processedDeductions"], 0.0);
}

#[tokio::test]
async fn settlement_requires_admin() {
    let app = TestApp::new();
    let response = app
        .request(
            Method::POST,
            "/api/v1/payout-adjustments/process",
            None,
            Some(&token_for("seller-uid-1", None, Some("seller"))),
        )
        .await;
    assert_eq!(response.status(), 403);

    let body = response_json(response).await;
    assert_eq!(body["message"], "Unauthorized. Admin access required.");
}

#[tokio::test]
async fn sellers_see_their_own_ledger_with_totals() {
    let app = TestApp::new();
    app.seed("Seller", "S1", json!({"userId": "seller-uid-1"})).await;
    app.seed(
        "SellerPayoutAdjustments",
        "ADJ-OLD",
        pending_adjustment("O-1", "S1", 80.0, "2026-08-01T00:00:00Z"),
    )
    .await;
    let mut processed = pending_adjustment("O-2", "S1", 50.0, "2026-08-05T00:00:00Z");
    processed["status"] = json!("processed");
    app.seed("SellerPayoutAdjustments", "ADJ-NEW", processed).await;
    // Another seller's record stays invisible.
    app.seed(
        "SellerPayoutAdjustments",
        "ADJ-FOREIGN",
        pending_adjustment("O-X", "S2", 99.0, "2026-08-03T00:00:00Z"),
    )
    .await;

    let response = app
        .request(
            Method::GET,
            "/api/v1/payout-adjustments",
            None,
            Some(&token_for("seller-uid-1", None, None)),
        )
        .await;
    assert_eq!(response.status(), 200);

    let body = response_json(response).await;
    let adjustments = body["data"]["adjustments"].as_array().unwrap();
    assert_eq!(adjustments.len(), 2);
    // Newest first.
    assert_eq!(adjustments[0]["id"], "ADJ-NEW");
    assert_eq!(adjustments[1]["id"], "ADJ-OLD");
    assert_eq!(body["data"]["summary"]["totalCount"], 2);
    assert_eq!(body["data"]["summary"]["pendingTotal"], 80.0);
    assert_eq!(body["data"]["summary"]["processedTotal"], 50.0);
}

#[tokio::test]
async fn admin_queries_any_seller_but_strangers_are_refused() {
    let app = TestApp::new();
    app.seed("Seller", "S1", json!({"userId": "seller-uid-1"})).await;
    app.seed(
        "SellerPayoutAdjustments",
        "ADJ-1",
        pending_adjustment("O-1", "S1", 80.0, "2026-08-01T00:00:00Z"),
    )
    .await;

    let response = app
        .request(
            Method::GET,
            "/api/v1/payout-adjustments?sellerId=S1",
            None,
            Some(&admin_token()),
        )
        .await;
    assert_eq!(response.status(), 200);

    let response = app
        .request(
            Method::GET,
            "/api/v1/payout-adjustments?sellerId=S1",
            None,
            Some(&token_for("someone-else", None, None)),
        )
        .await;
    assert_eq!(response.status(), 403);

    // Caller with no seller document at all.
    let response = app
        .request(
            Method::GET,
            "/api/v1/payout-adjustments",
            None,
            Some(&token_for("no-seller-here", None, None)),
        )
        .await;
    assert_eq!(response.status(), 404);
}
