//! Cart Aggregate

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use crate::domain::aggregates::product::{Product, Variant};
use crate::domain::events::{CartEvent, DomainEvent};
use crate::domain::value_objects::{Money, Quantity};

/// Line identity: one line per (product, variant) pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineId {
    product_id: String,
    variant_id: Option<String>,
}

impl LineId {
    pub fn new(product_id: impl Into<String>, variant_id: Option<String>) -> Self {
        Self { product_id: product_id.into(), variant_id }
    }
    pub fn product_id(&self) -> &str { &self.product_id }
    pub fn variant_id(&self) -> Option<&str> { self.variant_id.as_deref() }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.product_id, self.variant_id.as_deref().unwrap_or("base"))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CartLine {
    id: LineId,
    product_name: String,
    variant_name: Option<String>,
    unit_price: Money,
    quantity: Quantity,
}

impl CartLine {
    pub fn id(&self) -> &LineId { &self.id }
    pub fn product_name(&self) -> &str { &self.product_name }
    pub fn variant_name(&self) -> Option<&str> { self.variant_name.as_deref() }
    /// Frozen when the line was created.
    pub fn unit_price(&self) -> &Money { &self.unit_price }
    pub fn quantity(&self) -> u32 { self.quantity.value() }
    pub fn line_total(&self) -> Money { self.unit_price.multiply(self.quantity.value()) }

    /// `Name (Variant) xN`
    pub fn summary(&self) -> String {
        match &self.variant_name {
            Some(variant) => format!("{} ({}) x{}", self.product_name, variant, self.quantity.value()),
            None => format!("{} x{}", self.product_name, self.quantity.value()),
        }
    }
}

/// Outcome of asking the cart to add a product.
#[derive(Clone, Debug, PartialEq)]
pub enum AddItem {
    Added(LineId),
    /// The product has variants; the customer has to pick one before anything is added.
    ChooseVariant(VariantPrompt),
}

#[derive(Clone, Debug, PartialEq)]
pub struct VariantPrompt {
    pub product_id: String,
    pub product_name: String,
    pub options: Vec<Variant>,
}

#[derive(Clone, Debug)]
pub struct Cart {
    currency: String,
    lines: Vec<CartLine>,
    events: Vec<DomainEvent>,
}

impl Cart {
    pub fn new(currency: &str) -> Self {
        Self { currency: currency.to_string(), lines: vec![], events: vec![] }
    }

    pub fn currency(&self) -> &str { &self.currency }
    pub fn lines(&self) -> &[CartLine] { &self.lines }
    pub fn line(&self, id: &LineId) -> Option<&CartLine> { self.lines.iter().find(|l| &l.id == id) }
    pub fn line_count(&self) -> usize { self.lines.len() }
    pub fn is_empty(&self) -> bool { self.lines.is_empty() }

    /// Sum of quantities.
    pub fn item_count(&self) -> u32 { self.lines.iter().map(CartLine::quantity).sum() }

    /// Always recomputed from the current lines.
    pub fn total(&self) -> Money {
        let amount: Decimal = self.lines.iter().map(|l| l.line_total().amount()).sum();
        Money::new(amount, &self.currency)
    }

    pub fn items_summary(&self) -> String {
        self.lines.iter().map(CartLine::summary).collect::<Vec<_>>().join(", ")
    }

    pub fn add_item(&mut self, product: &Product, variant_id: Option<&str>) -> Result<AddItem, CartError> {
        if !product.is_active { return Err(CartError::ProductUnavailable(product.id.clone())); }
        let variant = match variant_id {
            Some(id) => Some(product.variant(id).ok_or_else(|| CartError::UnknownVariant {
                product_id: product.id.clone(),
                variant_id: id.to_string(),
            })?),
            None if product.requires_variant_selection() => {
                return Ok(AddItem::ChooseVariant(VariantPrompt {
                    product_id: product.id.clone(),
                    product_name: product.name.clone(),
                    options: product.active_variants().cloned().collect(),
                }));
            }
            None => None,
        };

        let id = LineId::new(product.id.clone(), variant.map(|v| v.id.clone()));
        let quantity = if let Some(existing) = self.lines.iter_mut().find(|l| l.id == id) {
            existing.quantity = existing.quantity.increment();
            existing.quantity.value()
        } else {
            self.lines.push(CartLine {
                id: id.clone(),
                product_name: product.name.clone(),
                variant_name: variant.map(|v| v.name.clone()),
                unit_price: Money::new(product.unit_price(variant), &self.currency),
                quantity: Quantity::one(),
            });
            1
        };
        self.raise_event(CartEvent::ItemAdded { line_id: id.to_string(), quantity });
        Ok(AddItem::Added(id))
    }

    /// Returns the new quantity, or `None` when the change removed the line.
    pub fn change_quantity(&mut self, id: &LineId, delta: i32) -> Result<Option<u32>, CartError> {
        let index = self.position(id)?;
        let next = self.lines[index].quantity.apply_delta(delta);
        match next {
            Some(quantity) => {
                self.lines[index].quantity = quantity;
                        self.raise_event(CartEvent::QuantityChanged { line_id: id.to_string(), quantity: quantity.value() });
                Ok(Some(quantity.value()))
            }
            None => {
                self.lines.remove(index);
                        self.raise_event(CartEvent::ItemRemoved { line_id: id.to_string() });
                Ok(None)
            }
        }
    }

    pub fn remove_item(&mut self, id: &LineId) -> Result<(), CartError> {
        let index = self.position(id)?;
        self.lines.remove(index);
        self.raise_event(CartEvent::ItemRemoved { line_id: id.to_string() });
        Ok(())
    }

    pub fn clear(&mut self) {
        if self.lines.is_empty() { return; }
        let lines = self.lines.len();
        self.lines.clear();
        self.raise_event(CartEvent::Cleared { lines });
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }

    fn position(&self, id: &LineId) -> Result<usize, CartError> {
        self.lines.iter().position(|l| &l.id == id).ok_or_else(|| CartError::LineNotFound(id.to_string()))
    }
    fn raise_event(&mut self, e: CartEvent) { self.events.push(DomainEvent::Cart(e)); }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("Cart line {0} not found")]
    LineNotFound(String),
    #[error("Variant {variant_id} is not available for product {product_id}")]
    UnknownVariant { product_id: String, variant_id: String },
    #[error("Product {0} is not available")]
    ProductUnavailable(String),
}
