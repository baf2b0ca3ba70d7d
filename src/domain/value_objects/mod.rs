//! Value Objects for storefront checkout

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Client-generated order reference. Idempotency key for order creation and
/// the order id handed to the payment gateway.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderReference(String);

impl OrderReference {
    pub fn new(value: impl Into<String>) -> Result<Self, ReferenceError> {
        let value = value.into().trim().to_string();
        if value.is_empty() { return Err(ReferenceError::Empty); }
        // gateway order ids are capped at 50 characters
        if value.len() > 50 { return Err(ReferenceError::TooLong); }
        Ok(Self(value))
    }

    /// `ORD-{slug}-{unix millis}-{6 hex}`; the slug is cut so the whole id fits the gateway limit.
    pub fn generate(store_slug: &str) -> Self {
        let slug = truncate_on_char_boundary(store_slug.trim(), SLUG_BYTES);
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("ORD-{}-{}-{}", slug, Utc::now().timestamp_millis(), &suffix[..6]))
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for OrderReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

// keeps a generated id within the 50 byte gateway cap
const SLUG_BYTES: usize = 20;

fn truncate_on_char_boundary(value: &str, max_bytes: usize) -> &str {
    if value.len() <= max_bytes { return value; }
    let mut end = max_bytes;
    while !value.is_char_boundary(end) { end -= 1; }
    &value[..end]
}

#[derive(Debug, Clone)] pub enum ReferenceError { Empty, TooLong }
impl std::error::Error for ReferenceError {}
impl fmt::Display for ReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Empty => write!(f, "Order reference empty"), Self::TooLong => write!(f, "Order reference too long") }
    }
}

/// Money value object
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money { amount: Decimal, currency: String }

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Self { Self { amount, currency: currency.to_string() } }
    pub fn idr(amount: Decimal) -> Self { Self::new(amount, "IDR") }
    pub fn zero(currency: &str) -> Self { Self::new(Decimal::ZERO, currency) }
    pub fn amount(&self) -> Decimal { self.amount }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn multiply(&self, qty: u32) -> Money { Money::new(self.amount * Decimal::from(qty), &self.currency) }
}

impl Default for Money { fn default() -> Self { Self::zero("IDR") } }

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{} {}", self.currency, self.amount) }
}

/// Line quantity. Never below one; a change that would reach zero yields `None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity(u32);

impl Quantity {
    pub fn one() -> Self { Self(1) }
    pub fn new(value: u32) -> Option<Self> { (value > 0).then_some(Self(value)) }
    pub fn value(&self) -> u32 { self.0 }
    pub fn increment(&self) -> Self { Self(self.0.saturating_add(1)) }
    pub fn apply_delta(&self, delta: i32) -> Option<Self> {
        let next = i64::from(self.0) + i64::from(delta);
        if next <= 0 { return None; }
        Some(Self(u32::try_from(next).unwrap_or(u32::MAX)))
    }
}

impl Default for Quantity { fn default() -> Self { Self::one() } }

/// A WGS84 point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self { Self { latitude, longitude } }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:.6}, {:.6}", self.latitude, self.longitude) }
}
