//! Maps order line items into carrier-shaped parcel descriptors.

use crate::clients::ParcelDescriptor;
use crate::models::OrderItem;

// Defaults used when an item carries no dimensions or pricing.
const DEFAULT_LENGTH_CM: f64 = 20.0;
const DEFAULT_WIDTH_CM: f64 = 15.0;
const DEFAULT_HEIGHT_CM: f64 = 10.0;
const DEFAULT_WEIGHT_KG: f64 = 0.5;
const DEFAULT_DECLARED_VALUE: f64 = 100.0;
const DEFAULT_ITEM_NAME: &str = "Dental Supply";

const DESCRIPTION_MAX_CHARS: usize = 100;

/// One descriptor per input item, never merged or split. Weight and
/// declared value scale with quantity; dimensions fall back field by field.
pub fn calculate(items: &[OrderItem]) -> Vec<ParcelDescriptor> {
    items
        .iter()
        .map(|item| {
            let quantity = match item.quantity {
                Some(q) if q > 0.0 => q,
                _ => 1.0,
            };
            let dims = item.dimensions.as_ref();
            let unit_weight = dims.and_then(|d| d.weight).unwrap_or(DEFAULT_WEIGHT_KG);
            let unit_value = item.price.unwrap_or(DEFAULT_DECLARED_VALUE);

            ParcelDescriptor {
                item_name: item
                    .name
                    .clone()
                    .unwrap_or_else(|| DEFAULT_ITEM_NAME.to_string()),
                quantity,
                length: dims.and_then(|d| d.length).unwrap_or(DEFAULT_LENGTH_CM),
                width: dims.and_then(|d| d.width).unwrap_or(DEFAULT_WIDTH_CM),
                height: dims.and_then(|d| d.height).unwrap_or(DEFAULT_HEIGHT_CM),
                weight: unit_weight * quantity,
                declared_value: unit_value * quantity,
            }
        })
        .collect()
}

/// Human-readable package description: item names joined with ", ",
/// truncated to 100 characters.
pub fn describe(items: &[OrderItem]) -> String {
    let joined = items
        .iter()
        .map(|item| item.name.as_deref().unwrap_or(DEFAULT_ITEM_NAME))
        .collect::<Vec<_>>()
        .join(", ");
    joined.chars().take(DESCRIPTION_MAX_CHARS).collect()
}
