use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "DentPal Operations API",
        version = "0.3.0",
        description = r#"
# DentPal Operations API

Order fulfillment operations for the DentPal dental-supplies marketplace:
courier shipment booking, return-request processing with reverse pickup,
seller payout adjustment settlement, and wallet withdrawal processing.

## Authentication

All endpoints except `/health` require a JWT bearer token:

```
Authorization: Bearer <your-jwt-token>
```

Buyer, seller, and admin roles are enforced per endpoint.
        "#,
        contact(
            name = "DentPal Engineering",
            email = "engineering@dentpal.ph"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Shipments", description = "Courier shipment booking endpoints"),
        (name = "Returns", description = "Return request processing endpoints"),
        (name = "Payout Adjustments", description = "Seller payout adjustment ledger endpoints"),
        (name = "Withdrawals", description = "Seller wallet withdrawal endpoints"),
        (name = "Health", description = "Health check endpoints")
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::shipments::create_shipment,
        crate::handlers::shipments::get_shipment,
        crate::handlers::returns::process_return,
        crate::handlers::returns::list_seller_return_requests,
        crate::handlers::payout_adjustments::list_adjustments,
        crate::handlers::payout_adjustments::settle_pending,
        crate::handlers::withdrawals::process_withdrawal,
        crate::handlers::withdrawals::check_withdrawal_status,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,

            crate::services::shipments::CreateShipmentCommand,
            crate::services::shipments::ShipmentCreated,
            crate::services::shipments::ShipmentView,
            crate::services::shipments::ShippingCharges,
            crate::services::shipments::CashOnDelivery,
            crate::services::parties::PartyOverride,

            crate::services::returns::ProcessReturnCommand,
            crate::services::returns::ReturnProcessed,
            crate::services::returns::ReturnShippingSummary,
            crate::services::returns::ReturnRequestRecord,
            crate::handlers::returns::ReturnRequestList,

            crate::services::payout_ledger::AdjustmentRecord,
            crate::services::payout_ledger::AdjustmentSummary,
            crate::services::payout_ledger::SettlementReport,
            crate::services::payout_ledger::ProcessedAdjustment,
            crate::services::payout_ledger::SettlementError,
            crate::handlers::payout_adjustments::AdjustmentList,

            crate::services::withdrawals::WithdrawalProcessed,
            crate::services::withdrawals::WithdrawalTransaction,

            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
