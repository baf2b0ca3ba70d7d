//! Product as the storefront sees it: a priced catalog entry with optional variants

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub base_price: Decimal,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default = "active")]
    pub is_active: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub id: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float", default)]
    pub additional_price: Decimal,
    #[serde(default = "active")]
    pub is_active: bool,
}

fn active() -> bool { true }

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>, base_price: Decimal) -> Self {
        Self { id: id.into(), name: name.into(), description: None, base_price, variants: vec![], is_active: true }
    }

    pub fn with_variant(mut self, id: impl Into<String>, name: impl Into<String>, additional_price: Decimal) -> Self {
        self.variants.push(Variant { id: id.into(), name: name.into(), additional_price, is_active: true });
        self
    }

    pub fn active_variants(&self) -> impl Iterator<Item = &Variant> { self.variants.iter().filter(|v| v.is_active) }
    pub fn requires_variant_selection(&self) -> bool { self.active_variants().next().is_some() }
    pub fn variant(&self, id: &str) -> Option<&Variant> { self.active_variants().find(|v| v.id == id) }

    /// Base price plus the variant surcharge.
    pub fn unit_price(&self, variant: Option<&Variant>) -> Decimal {
        self.base_price + variant.map_or(Decimal::ZERO, |v| v.additional_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_unit_price_with_variant() {
        let p = Product::new("P1", "Latte", Decimal::new(15000, 0)).with_variant("V1", "Large", Decimal::new(3000, 0));
        assert_eq!(p.unit_price(None), Decimal::new(15000, 0));
        assert_eq!(p.unit_price(p.variant("V1")), Decimal::new(18000, 0));
    }
    #[test]
    fn test_inactive_variants_do_not_prompt() {
        let mut p = Product::new("P1", "Latte", Decimal::new(15000, 0)).with_variant("V1", "Large", Decimal::ZERO);
        assert!(p.requires_variant_selection());
        p.variants[0].is_active = false;
        assert!(!p.requires_variant_selection());
        assert!(p.variant("V1").is_none());
    }
}
