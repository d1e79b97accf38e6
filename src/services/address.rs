//! Address normalization for courier bookings.
//!
//! Philippine addresses frequently carry the barangay inline in the street
//! line ("12 Brgy. Kamuning St, QC"). The courier wants it as a separate
//! district field, so we extract it and strip it from the line.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::ShippingInfo;

const DEFAULT_STATE: &str = "Metro Manila";
const DEFAULT_COUNTRY: &str = "Philippines";

static BARANGAY: Lazy<Regex> = Lazy::new(|| {
    // "Brgy." / "Brgy" / "Barangay" followed by one token, with an optional
    // leading comma that gets stripped along with the match.
    Regex::new(r"(?i)(?:,\s*)?(?:brgy\.?|barangay)\s+([^,\s]+)").expect("barangay pattern")
});

/// Structured address in the shape the courier request wants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedAddress {
    pub address_line1: String,
    pub district: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
}

/// Pure normalization: never fails, defaults fill every missing field.
pub fn normalize(info: &ShippingInfo) -> NormalizedAddress {
    let raw_line = info.address_line1.clone().unwrap_or_default();
    let (address_line1, district) = extract_district(&raw_line);

    NormalizedAddress {
        address_line1,
        district,
        city: info.city.clone().unwrap_or_else(|| "N/A".to_string()),
        state: info
            .state
            .clone()
            .or_else(|| info.province.clone())
            .unwrap_or_else(|| DEFAULT_STATE.to_string()),
        country: info
            .country
            .clone()
            .unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
        postal_code: info.postal_code.clone().unwrap_or_default(),
    }
}

fn extract_district(line: &str) -> (String, String) {
    let Some(captures) = BARANGAY.captures(line) else {
        return (line.to_string(), "N/A".to_string());
    };
    let district = captures[1].to_string();
    let stripped = BARANGAY.replace(line, "").to_string();
    (tidy(&stripped), district)
}

// Collapse whitespace and fix dangling comma spacing left by the strip.
fn tidy(line: &str) -> String {
    let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .replace(" ,", ",")
        .trim_matches(|c: char| c == ',' || c.is_whitespace())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(line: &str) -> ShippingInfo {
        ShippingInfo {
            address_line1: Some(line.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn extracts_inline_barangay() {
        let normalized = normalize(&info("12 Brgy. Kamuning St, QC"));
        assert_eq!(normalized.district, "Kamuning");
        assert_eq!(normalized.address_line1, "12 St, QC");
    }

    #[test]
    fn extracts_spelled_out_barangay() {
        let normalized = normalize(&info("88 Rizal Ave, Barangay Poblacion, Makati"));
        assert_eq!(normalized.district, "Poblacion");
        assert_eq!(normalized.address_line1, "88 Rizal Ave, Makati");
    }

    #[test]
    fn no_barangay_passes_line_through() {
        let normalized = normalize(&info("Unit 4B Tower One, Ortigas"));
        assert_eq!(normalized.district, "N/A");
        assert_eq!(normalized.address_line1, "Unit 4B Tower One, Ortigas");
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let normalized = normalize(&ShippingInfo::default());
        assert_eq!(normalized.address_line1, "");
        assert_eq!(normalized.district, "N/A");
        assert_eq!(normalized.city, "N/A");
        assert_eq!(normalized.state, "Metro Manila");
        assert_eq!(normalized.country, "Philippines");
    }

    #[test]
    fn explicit_state_and_country_win_over_defaults() {
        let shipping = ShippingInfo {
            address_line1: Some("Door 2, Brgy Buhangin, Davao".to_string()),
            province: Some("Davao del Sur".to_string()),
            country: Some("PH".to_string()),
            ..Default::default()
        };
        let normalized = normalize(&shipping);
        assert_eq!(normalized.district, "Buhangin");
        assert_eq!(normalized.state, "Davao del Sur");
        assert_eq!(normalized.country, "PH");
    }
}
