//! Contact and address resolution for incoming orders.
//!
//! Phone numbers are normalized to a canonical 10-digit local form before
//! any lookup or storage. Addresses follow a field-by-field fallback chain:
//! structured shipping address, then free-form note attributes, then safe
//! defaults; the pincode falls back to a six-zero sentinel rather than
//! failing the order.

use regex::Regex;
use std::sync::OnceLock;

use crate::storefront::ExternalOrder;

/// Sentinel pincode when no pincode could be resolved.
pub const PINCODE_SENTINEL: &str = "000000";

/// Canonical local phone length.
const LOCAL_PHONE_DIGITS: usize = 10;

fn non_digits() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^0-9]").expect("valid regex"))
}

/// Normalize a raw phone number to its canonical 10-digit local form.
///
/// Strips formatting and any country-code prefix; numbers shorter than ten
/// digits are kept as-is. Returns None when no digits remain.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits = non_digits().replace_all(raw, "").to_string();
    if digits.is_empty() {
        return None;
    }

    if digits.len() > LOCAL_PHONE_DIGITS {
        Some(digits[digits.len() - LOCAL_PHONE_DIGITS..].to_string())
    } else {
        Some(digits)
    }
}

/// Resolved shipping address after the fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAddress {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub country: String,
    pub pincode: String,
}

/// Resolve the shipping address for an order.
///
/// Field order: structured shipping address -> note attributes -> empty
/// string. The pincode defaults to [`PINCODE_SENTINEL`].
pub fn resolve_address(order: &ExternalOrder) -> ResolvedAddress {
    let shipping = order.shipping_address.as_ref();

    let line1 = shipping
        .and_then(|a| a.address1.clone())
        .filter(|v| !v.trim().is_empty())
        .or_else(|| order.note_attribute("address").map(str::to_string))
        .or_else(|| order.note_attribute("address1").map(str::to_string))
        .unwrap_or_default();

    let line2 = shipping
        .and_then(|a| a.address2.clone())
        .filter(|v| !v.trim().is_empty())
        .or_else(|| order.note_attribute("address2").map(str::to_string));

    let city = shipping
        .and_then(|a| a.city.clone())
        .filter(|v| !v.trim().is_empty())
        .or_else(|| order.note_attribute("city").map(str::to_string))
        .unwrap_or_default();

    let state = shipping
        .and_then(|a| a.province.clone())
        .filter(|v| !v.trim().is_empty())
        .or_else(|| order.note_attribute("state").map(str::to_string))
        .or_else(|| order.note_attribute("province").map(str::to_string))
        .unwrap_or_default();

    let country = shipping
        .and_then(|a| a.country.clone())
        .filter(|v| !v.trim().is_empty())
        .or_else(|| order.note_attribute("country").map(str::to_string))
        .unwrap_or_default();

    let pincode = shipping
        .and_then(|a| a.zip.clone())
        .filter(|v| !v.trim().is_empty())
        .or_else(|| order.note_attribute("pincode").map(str::to_string))
        .or_else(|| order.note_attribute("zip").map(str::to_string))
        .unwrap_or_else(|| PINCODE_SENTINEL.to_string());

    ResolvedAddress {
        line1,
        line2,
        city,
        state,
        country,
        pincode,
    }
}

/// Customer name resolved from the customer block, falling back to the
/// shipping address names.
pub fn contact_name(order: &ExternalOrder) -> (Option<String>, Option<String>) {
    let customer = order.customer.as_ref();
    let shipping = order.shipping_address.as_ref();

    let first = customer
        .and_then(|c| c.first_name.clone())
        .filter(|v| !v.trim().is_empty())
        .or_else(|| shipping.and_then(|a| a.first_name.clone()));
    let last = customer
        .and_then(|c| c.last_name.clone())
        .filter(|v| !v.trim().is_empty())
        .or_else(|| shipping.and_then(|a| a.last_name.clone()));

    (first, last)
}

/// Customer email: order-level first, then the customer block.
pub fn contact_email(order: &ExternalOrder) -> Option<String> {
    order
        .email
        .clone()
        .filter(|v| !v.trim().is_empty())
        .or_else(|| order.customer.as_ref().and_then(|c| c.email.clone()))
        .filter(|v| !v.trim().is_empty())
}

/// Customer phone, normalized: shipping address first, then the customer
/// block, then the order-level phone.
pub fn contact_phone(order: &ExternalOrder) -> Option<String> {
    let raw = order
        .shipping_address
        .as_ref()
        .and_then(|a| a.phone.clone())
        .filter(|v| !v.trim().is_empty())
        .or_else(|| order.customer.as_ref().and_then(|c| c.phone.clone()))
        .filter(|v| !v.trim().is_empty())
        .or_else(|| order.phone.clone())?;

    normalize_phone(&raw)
}
