//! Payment derivation from the storefront's financial status.
//!
//! Anything other than an explicit "paid" collects on delivery: a wrongly
//! flagged COD order gets its cash collected, while a wrongly flagged
//! prepaid order would under-collect.

use rust_decimal::Decimal;

use crate::storefront::ExternalOrder;

/// Payment method of a local order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    Prepaid,
    Cod,
}

impl PaymentMethod {
    /// Stable string stored on the order row.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Prepaid => "PREPAID",
            PaymentMethod::Cod => "COD",
        }
    }
}

/// Derive the payment method from the platform's financial status.
pub fn derive_payment_method(financial_status: Option<&str>) -> PaymentMethod {
    match financial_status {
        Some("paid") => PaymentMethod::Prepaid,
        Some("pending")
        | Some("partially_paid")
        | Some("partially_refunded")
        | Some("refunded") => PaymentMethod::Cod,
        _ => PaymentMethod::Cod,
    }
}

/// Amount to collect on delivery: the full total when payment is pending,
/// the outstanding balance when partially paid, zero otherwise.
pub fn amount_to_collect(order: &ExternalOrder) -> Decimal {
    match order.financial_status.as_deref() {
        Some("pending") => order.total_price_decimal(),
        Some("partially_paid") => order.total_outstanding_decimal(),
        _ => Decimal::ZERO,
    }
}
