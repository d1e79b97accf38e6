use serde::{Deserialize, Serialize};

/// A marketplace vendor. This service never creates or deletes sellers;
/// it only bumps the `payoutAdjustments` aggregate counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Seller {
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub vendor: Option<Vendor>,
    pub payout_adjustments: Option<PayoutTotals>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Vendor {
    pub company: Option<Company>,
    pub contacts: Option<Contacts>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Company {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Contacts {
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Running seller-level aggregates, mutated only via atomic increments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PayoutTotals {
    pub total_shipping_charges: Option<f64>,
    pub pending_deductions: Option<f64>,
    pub processed_deductions: Option<f64>,
    pub last_updated: Option<String>,
    pub last_processed: Option<String>,
}

impl Seller {
    /// Ownership match used by the authorization resolver: a caller owns a
    /// seller document when their UID or email matches.
    pub fn owned_by(&self, uid: &str, email: Option<&str>) -> bool {
        if self.user_id.as_deref() == Some(uid) {
            return true;
        }
        match (self.email.as_deref(), email) {
            (Some(seller_email), Some(caller_email)) => {
                seller_email.eq_ignore_ascii_case(caller_email)
            }
            _ => false,
        }
    }
}
