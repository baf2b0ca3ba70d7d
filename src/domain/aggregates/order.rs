//! Order creation payload and the backend's acknowledgement

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::domain::aggregates::{Cart, CustomerInfo};
use crate::domain::value_objects::OrderReference;

/// Body of an order-creation call. Built once per submission and resent
/// unchanged on retry, so the backend sees the same reference every time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub name: String,
    pub phone: String,
    pub full_address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub notes: String,
    #[serde(rename = "midtrans_order_id")]
    pub client_order_ref: OrderReference,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub items_summary: String,
}

impl OrderRequest {
    pub fn build(reference: &OrderReference, cart: &Cart, customer: &CustomerInfo) -> Self {
        let (latitude, longitude) = customer.coordinates.map_or((0.0, 0.0), |c| (c.latitude, c.longitude));
        Self {
            name: customer.name.trim().to_string(),
            phone: customer.phone.trim().to_string(),
            full_address: customer.address.trim().to_string(),
            latitude,
            longitude,
            notes: customer.notes.clone().unwrap_or_default(),
            client_order_ref: reference.clone(),
            total_amount: cart.total().amount(),
            items_summary: cart.items_summary(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    #[serde(default)]
    pub order_number: String,
    #[serde(rename = "delivery_order_id", default)]
    pub tracking_id: Option<String>,
}

impl OrderReceipt {
    pub fn new(order_number: impl Into<String>, tracking_id: Option<String>) -> Self {
        Self { order_number: order_number.into(), tracking_id }
    }
}
