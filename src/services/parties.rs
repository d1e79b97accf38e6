//! Shipper/recipient resolution.
//!
//! Each side of a booking is resolved through one fallback chain:
//! explicit payload override, then the relevant document (buyer profile or
//! primary seller record), then the parsed shipping info, then a hardcoded
//! fallback. A return shipment reuses the exact same resolution with the
//! two roles swapped.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    errors::ServiceError,
    models::{Order, Seller, ShippingInfo},
    services::address::{self, NormalizedAddress},
    store::{self, DocumentStore},
};

const FALLBACK_CUSTOMER_NAME: &str = "Customer";
const FALLBACK_CUSTOMER_EMAIL: &str = "customer@dentpal.ph";

const FALLBACK_COMPANY_NAME: &str = "DentPal Supplies";
const FALLBACK_COMPANY_EMAIL: &str = "logistics@dentpal.ph";
const FALLBACK_COMPANY_PHONE: &str = "(02) 8888-0000";
const FALLBACK_COMPANY_ADDRESS: &str = "Unit 1904 Centuria Medical Makati, Kalayaan Ave";
const FALLBACK_COMPANY_CITY: &str = "Makati";

/// Optional per-request override for either party.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PartyOverride {
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address_line1: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
}

/// Fully resolved booking party.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Party {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: NormalizedAddress,
}

fn apply_override(base: &mut Party, over: &PartyOverride) {
    if let Some(name) = &over.name {
        base.name = name.clone();
    }
    if let Some(email) = &over.email {
        base.email = email.clone();
    }
    if let Some(phone) = &over.phone {
        base.phone = phone.clone();
    }
    if over.address_line1.is_some()
        || over.city.is_some()
        || over.state.is_some()
        || over.country.is_some()
        || over.postal_code.is_some()
    {
        let shipping = ShippingInfo {
            address_line1: over.address_line1.clone(),
            city: over.city.clone(),
            state: over.state.clone(),
            country: over.country.clone(),
            postal_code: over.postal_code.clone(),
            ..Default::default()
        };
        base.address = address::normalize(&shipping);
    }
}

/// Resolves the buyer-side party: payload override, buyer profile
/// (`web_users`), parsed shipping info, hardcoded customer fallback.
pub async fn resolve_recipient(
    store: &dyn DocumentStore,
    order: &Order,
    override_info: Option<&PartyOverride>,
) -> Result<Party, ServiceError> {
    let shipping = order.shipping_info.clone().unwrap_or_default();

    let profile: Option<serde_json::Value> = match &order.user_id {
        Some(uid) => store
            .get(store::WEB_USERS, uid)
            .await?
            .map(|doc| doc.data),
        None => None,
    };
    let profile_field = |field: &str| -> Option<String> {
        profile
            .as_ref()
            .and_then(|p| p.get(field))
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
    };

    let shipping_name = shipping.name.clone().or_else(|| {
        match (&shipping.first_name, &shipping.last_name) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            (Some(first), None) => Some(first.clone()),
            _ => None,
        }
    });
    let profile_name = match (profile_field("firstName"), profile_field("lastName")) {
        (Some(first), Some(last)) => Some(format!("{first} {last}")),
        (Some(first), None) => Some(first),
        _ => None,
    };

    let mut party = Party {
        name: profile_name
            .or(shipping_name)
            .unwrap_or_else(|| FALLBACK_CUSTOMER_NAME.to_string()),
        email: profile_field("email")
            .or_else(|| shipping.email.clone())
            .unwrap_or_else(|| FALLBACK_CUSTOMER_EMAIL.to_string()),
        phone: profile_field("phone")
            .or_else(|| shipping.phone.clone())
            .unwrap_or_default(),
        address: address::normalize(&shipping),
    };

    if let Some(over) = override_info {
        apply_override(&mut party, over);
    }
    Ok(party)
}

/// Resolves the seller-side party: payload override, primary seller record
/// (`vendor.company`, `vendor.contacts`), hardcoded company fallback.
pub async fn resolve_shipper(
    store: &dyn DocumentStore,
    order: &Order,
    override_info: Option<&PartyOverride>,
) -> Result<Party, ServiceError> {
    let seller: Option<Seller> = match order.primary_seller_id() {
        Some(seller_id) => store
            .get(store::SELLERS, seller_id)
            .await?
            .map(|doc| doc.parse())
            .transpose()?,
        None => None,
    };

    let company = seller
        .as_ref()
        .and_then(|s| s.vendor.as_ref())
        .and_then(|v| v.company.as_ref());
    let contacts = seller
        .as_ref()
        .and_then(|s| s.vendor.as_ref())
        .and_then(|v| v.contacts.as_ref());

    let shipping = ShippingInfo {
        address_line1: company
            .and_then(|c| c.address.clone())
            .or_else(|| Some(FALLBACK_COMPANY_ADDRESS.to_string())),
        city: company
            .and_then(|c| c.city.clone())
            .or_else(|| Some(FALLBACK_COMPANY_CITY.to_string())),
        state: company.and_then(|c| c.state.clone()),
        postal_code: company.and_then(|c| c.postal_code.clone()),
        ..Default::default()
    };

    let mut party = Party {
        name: company
            .and_then(|c| c.name.clone())
            .unwrap_or_else(|| FALLBACK_COMPANY_NAME.to_string()),
        email: contacts
            .and_then(|c| c.email.clone())
            .or_else(|| seller.as_ref().and_then(|s| s.email.clone()))
            .unwrap_or_else(|| FALLBACK_COMPANY_EMAIL.to_string()),
        phone: contacts
            .and_then(|c| c.phone.clone())
            .unwrap_or_else(|| FALLBACK_COMPANY_PHONE.to_string()),
        address: address::normalize(&shipping),
    };

    if let Some(over) = override_info {
        apply_override(&mut party, over);
    }
    Ok(party)
}
