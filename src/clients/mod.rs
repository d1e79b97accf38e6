//! Clients for the external services this backend orchestrates: the JRS
//! courier booking API and the PayMongo wallet-transfer API. Each sits
//! behind an async trait so orchestrators run against fakes in tests.

pub mod courier;
pub mod paymongo;

pub use courier::{ApiShippingRequest, CourierApi, CourierBooking, CourierError, JrsCourierClient, ParcelDescriptor};
pub use paymongo::{GatewayError, PaymentGateway, PaymongoClient, WalletTransfer, WalletTransferRequest};
