//! Caller/resource authorization.
//!
//! Order of checks at the boundary is authentication (401), existence
//! (404), then these predicates (403), so error codes stay diagnostic.

use futures::future::join_all;

use crate::{
    auth::AuthUser,
    errors::ServiceError,
    models::{Order, Seller},
    store::{self, DocumentStore},
};

/// True when the caller's UID or email matches any seller document
/// referenced by the order. Candidate documents are fetched in parallel;
/// the check is order-independent.
pub async fn is_involved_seller(
    store: &dyn DocumentStore,
    caller: &AuthUser,
    order: &Order,
) -> Result<bool, ServiceError> {
    if order.seller_ids.iter().any(|id| id == &caller.uid) {
        return Ok(true);
    }

    let lookups = order
        .seller_ids
        .iter()
        .map(|seller_id| store.get(store::SELLERS, seller_id));
    for result in join_all(lookups).await {
        let Some(doc) = result? else { continue };
        let seller: Seller = doc.parse()?;
        if seller.owned_by(&caller.uid, caller.email.as_deref()) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Buyer, admin, or any involved seller may access an order.
pub async fn can_access_order(
    store: &dyn DocumentStore,
    caller: &AuthUser,
    order: &Order,
) -> Result<bool, ServiceError> {
    if caller.is_admin() {
        return Ok(true);
    }
    if order.user_id.as_deref() == Some(caller.uid.as_str()) {
        return Ok(true);
    }
    is_involved_seller(store, caller, order).await
}

/// Returns are a seller/admin decision; the buyer who opened the request
/// does not get to process it.
pub async fn can_process_return(
    store: &dyn DocumentStore,
    caller: &AuthUser,
    order: &Order,
) -> Result<bool, ServiceError> {
    if caller.is_admin() {
        return Ok(true);
    }
    is_involved_seller(store, caller, order).await
}

/// Admin, or the owner of the seller document.
pub fn can_view_seller_adjustments(caller: &AuthUser, seller: &Seller) -> bool {
    caller.is_admin() || seller.owned_by(&caller.uid, caller.email.as_deref())
}

/// Finds the seller document owned by the caller, by UID then email.
pub async fn resolve_own_seller_id(
    store: &dyn DocumentStore,
    caller: &AuthUser,
) -> Result<String, ServiceError> {
    let by_uid = store
        .query(
            crate::store::SELLERS,
            &[crate::store::Filter::eq("userId", caller.uid.clone())],
        )
        .await?;
    if let Some(doc) = by_uid.into_iter().next() {
        return Ok(doc.id);
    }
    if let Some(email) = &caller.email {
        let by_email = store
            .query(
                crate::store::SELLERS,
                &[crate::store::Filter::eq("email", email.clone())],
            )
            .await?;
        if let Some(doc) = by_email.into_iter().next() {
            return Ok(doc.id);
        }
    }
    Err(ServiceError::NotFound(
        "No seller account found for caller".into(),
    ))
}
