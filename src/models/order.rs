use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A customer purchase. Created by the checkout flow; this service only
/// mutates its shipping status, history, and the nested `jrs` block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Order {
    pub order_id: Option<String>,
    pub status: Option<String>,
    pub user_id: Option<String>,
    /// First entry is the primary shipper when several sellers contributed.
    pub seller_ids: Vec<String>,
    pub items: Vec<OrderItem>,
    pub shipping_info: Option<ShippingInfo>,
    pub summary: Option<OrderSummary>,
    pub payment_info: Option<PaymentInfo>,
    pub paymongo: Option<PaymongoInfo>,
    pub metadata: Option<OrderMetadata>,
    pub status_history: Vec<StatusHistoryEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderItem {
    pub product_id: Option<String>,
    pub name: Option<String>,
    pub quantity: Option<f64>,
    pub price: Option<f64>,
    pub dimensions: Option<ItemDimensions>,
    pub is_fragile: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemDimensions {
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    /// Kilograms, per unit.
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingInfo {
    pub address_line1: Option<String>,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub province: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    /// Present once a forward shipment has been booked.
    pub jrs: Option<JrsShippingRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JrsShippingRecord {
    pub tracking_id: Option<String>,
    pub shipping_reference_no: Option<String>,
    pub total_shipping_amount: Option<f64>,
    pub requested_at: Option<String>,
    pub cash_on_delivery: Option<Value>,
    pub shipping_charge: Option<Value>,
    pub response: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderSummary {
    pub total: Option<f64>,
    pub shipping_cost: Option<f64>,
    pub seller_shipping_charge: Option<f64>,
    pub buyer_shipping_charge: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentInfo {
    pub method: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymongoInfo {
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderMetadata {
    pub payment_method: Option<String>,
    pub has_fragile_items: Option<bool>,
}

/// Append-only audit entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusHistoryEntry {
    pub status: String,
    pub note: Option<String>,
    pub timestamp: Option<String>,
}

impl Order {
    /// Courier tracking id of the booked forward shipment, if any.
    pub fn tracking_id(&self) -> Option<&str> {
        self.shipping_info
            .as_ref()?
            .jrs
            .as_ref()?
            .tracking_id
            .as_deref()
    }

    pub fn primary_seller_id(&self) -> Option<&str> {
        self.seller_ids.first().map(String::as_str)
    }

    /// COD detection over the three payment-method fields different order
    /// generations use.
    pub fn is_cash_on_delivery(&self) -> bool {
        if self
            .payment_info
            .as_ref()
            .and_then(|p| p.method.as_deref())
            .map(|m| m.eq_ignore_ascii_case("cod"))
            .unwrap_or(false)
        {
            return true;
        }
        let is_cod_label = |m: &str| m.eq_ignore_ascii_case("cash_on_delivery");
        self.paymongo
            .as_ref()
            .and_then(|p| p.payment_method.as_deref())
            .map(is_cod_label)
            .unwrap_or(false)
            || self
                .metadata
                .as_ref()
                .and_then(|m| m.payment_method.as_deref())
                .map(is_cod_label)
                .unwrap_or(false)
    }

    /// True when the metadata flag is set or any line item is fragile.
    pub fn has_fragile_items(&self) -> bool {
        self.metadata
            .as_ref()
            .and_then(|m| m.has_fragile_items)
            .unwrap_or(false)
            || self.items.iter().any(|i| i.is_fragile.unwrap_or(false))
    }
}
