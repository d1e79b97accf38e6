//! Document-store seam.
//!
//! The marketplace keeps its state in a managed document database. Services
//! talk to it through [`DocumentStore`] so orchestration logic can be
//! exercised against the in-memory backend in tests and local runs.

use async_trait::async_trait;
use serde_json::Value;

mod memory;

pub use memory::MemoryStore;

/// Canonical order collection.
pub const ORDERS: &str = "Order";
/// Legacy order collection, still holding pre-migration documents.
pub const ORDERS_LEGACY: &str = "orders";
/// Ordered candidate list for order lookup. First existing match wins.
/// Legacy-compat shim until the old collection is fully migrated.
pub const ORDER_COLLECTIONS: [&str; 2] = [ORDERS, ORDERS_LEGACY];

pub const SELLERS: &str = "Seller";
pub const PAYOUT_ADJUSTMENTS: &str = "SellerPayoutAdjustments";
pub const RETURN_REQUESTS: &str = "ReturnRequest";
pub const WITHDRAWALS: &str = "Withdrawal";
pub const WEB_USERS: &str = "web_users";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),

    #[error("document {collection}/{id} not found")]
    Missing { collection: String, id: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A document fetched from a collection.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    /// Deserializes the document body into a typed model.
    pub fn parse<T: serde::de::DeserializeOwned>(&self) -> Result<T, StoreError> {
        Ok(serde_json::from_value(self.data.clone())?)
    }
}

/// Equality filter on a (possibly dotted) field path.
#[derive(Debug, Clone)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Collection store with the primitives the orchestration layer needs:
/// point reads, equality queries, merge writes, atomic counter increments,
/// and a versioned compare-and-swap used as the transaction primitive.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Point read that also returns the document version for a later
    /// [`DocumentStore::compare_and_swap`].
    async fn get_versioned(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<(Document, u64)>, StoreError>;

    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
    ) -> Result<Vec<Document>, StoreError>;

    async fn insert(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError>;

    /// Deep-merges `patch` into the document. An explicit JSON `null` in the
    /// patch deletes the corresponding field.
    async fn merge(&self, collection: &str, id: &str, patch: Value) -> Result<(), StoreError>;

    /// Atomically adds each delta to a numeric field identified by a dotted
    /// path, treating an absent field as zero. Never read-modify-write at
    /// the caller level; concurrent increments for the same seller must all
    /// land.
    async fn increment(
        &self,
        collection: &str,
        id: &str,
        deltas: &[(String, f64)],
    ) -> Result<(), StoreError>;

    /// Replaces the document body iff its version still equals
    /// `expected_version`. Returns `false` on version mismatch.
    async fn compare_and_swap(
        &self,
        collection: &str,
        id: &str,
        expected_version: u64,
        data: Value,
    ) -> Result<bool, StoreError>;
}

/// Looks a field up by dotted path.
pub fn field_at<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = data;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}
