//! External order payload types.
//!
//! The storefront payload is platform-defined and never fully trusted:
//! every field is optional with a safe default, and the external id is
//! accepted as either a number or a string. Payloads round-trip through the
//! job queue unchanged.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// One order as returned by the storefront orders endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalOrder {
    /// Platform order id; the dedup key component. Numeric on the wire but
    /// tolerated as a string.
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,

    /// Display name, e.g. "#1001"
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub order_number: Option<i64>,

    #[serde(default)]
    pub financial_status: Option<String>,

    #[serde(default)]
    pub currency: Option<String>,

    /// Decimal amount as string (preserves precision)
    #[serde(default)]
    pub total_price: Option<String>,

    /// Outstanding balance as string
    #[serde(default)]
    pub total_outstanding: Option<String>,

    /// Total weight of the order in grams
    #[serde(default)]
    pub total_weight: Option<i64>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub processed_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub customer: Option<ExternalCustomer>,

    #[serde(default)]
    pub shipping_address: Option<ExternalAddress>,

    #[serde(default)]
    pub billing_address: Option<ExternalAddress>,

    /// Free-form key/value attributes; used as the address fallback when no
    /// structured shipping address was supplied
    #[serde(default)]
    pub note_attributes: Vec<NoteAttribute>,

    #[serde(default)]
    pub line_items: Vec<ExternalLineItem>,
}

impl ExternalOrder {
    /// External id, when present.
    pub fn external_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Total order amount; zero when absent or unparseable.
    pub fn total_price_decimal(&self) -> Decimal {
        parse_decimal(self.total_price.as_deref())
    }

    /// Outstanding balance; zero when absent or unparseable.
    pub fn total_outstanding_decimal(&self) -> Decimal {
        parse_decimal(self.total_outstanding.as_deref())
    }

    /// Sum of line item quantities (minimum 1 per item).
    pub fn total_quantity(&self) -> i64 {
        self.line_items
            .iter()
            .map(|item| item.quantity.max(1))
            .sum()
    }

    /// Look up a note attribute by name, case-insensitively.
    pub fn note_attribute(&self, name: &str) -> Option<&str> {
        self.note_attributes
            .iter()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
            .and_then(|attr| attr.value.as_deref())
            .filter(|value| !value.trim().is_empty())
    }
}

/// Customer block embedded in an order payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalCustomer {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Mailing address block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalAddress {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub address1: Option<String>,
    #[serde(default)]
    pub address2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Free-form name/value attribute attached to an order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteAttribute {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// One line item of an external order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalLineItem {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    /// Unit price as string
    #[serde(default)]
    pub price: Option<String>,
    /// Item weight in grams
    #[serde(default)]
    pub grams: Option<i64>,
}

impl ExternalLineItem {
    /// Unit price; zero when absent or unparseable.
    pub fn price_decimal(&self) -> Decimal {
        parse_decimal(self.price.as_deref())
    }
}

fn default_quantity() -> i64 {
    1
}

fn parse_decimal(value: Option<&str>) -> Decimal {
    value
        .and_then(|v| v.trim().parse::<Decimal>().ok())
        .unwrap_or_default()
}

/// Accept an id that arrives as either a JSON number or a string.
fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
