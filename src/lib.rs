//! Storefront Checkout
//!
//! Customer-facing cart and checkout orchestration for multi-tenant storefronts.
//!
//! ## Features
//! - Cart store with variant-aware line identity
//! - Checkout state machine with order reconciliation after payment
//! - Payment gateway sessions driving an embedded payment widget
//! - Delivery location picking over an embeddable map

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use config::{CheckoutConfig, MapSettings};
pub use domain::aggregates::{
    AddItem, Cart, CartError, CartLine, CheckoutFailure, CheckoutSession, CheckoutState,
    CustomerInfo, LineId, OrderReceipt, OrderRequest, PaymentOutcome, Product, Variant,
    VariantPrompt,
};
pub use domain::events::{CartEvent, CheckoutEvent, DomainEvent};
pub use domain::value_objects::{Coordinates, Money, OrderReference, Quantity};
pub use services::orchestrator::{CheckoutDeps, CheckoutOrchestrator};

// =============================================================================
// Core Types
// =============================================================================

/// Envelope every merchant backend endpoint answers with.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GatewayMode {
    #[default]
    Sandbox,
    Production,
}

impl GatewayMode {
    /// Script the payment widget is served from in this mode.
    pub fn widget_script_url(&self) -> &'static str {
        match self {
            Self::Sandbox => "https://app.sandbox.midtrans.com/snap/snap.js",
            Self::Production => "https://app.midtrans.com/snap/snap.js",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sandbox => "sandbox",
            Self::Production => "production",
        }
    }
}

impl From<String> for GatewayMode {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("production") {
            Self::Production
        } else {
            Self::Sandbox
        }
    }
}

impl From<GatewayMode> for String {
    fn from(mode: GatewayMode) -> Self {
        mode.as_str().to_string()
    }
}

impl std::fmt::Display for GatewayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Public payment gateway settings. Never carries the server key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub mode: GatewayMode,
    #[serde(default)]
    pub client_key: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentSessionRequest {
    pub order_id: OrderReference,
    #[serde(with = "rust_decimal::serde::float")]
    pub gross_amount: Decimal,
    pub first_name: String,
    pub email: String,
    pub phone: String,
}

impl PaymentSessionRequest {
    pub fn for_customer(
        reference: &OrderReference,
        amount: &Money,
        customer: &CustomerInfo,
        guest_email_domain: &str,
    ) -> Self {
        Self {
            order_id: reference.clone(),
            gross_amount: amount.amount(),
            first_name: customer.name.trim().to_string(),
            email: customer.contact_email(guest_email_domain),
            phone: customer.phone.trim().to_string(),
        }
    }
}

/// Payment session issued by the gateway; the widget is presented with it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    pub token: String,
    #[serde(default)]
    pub redirect_url: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StoreTenant {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// Public storefront payload: the tenant plus its browsable catalog.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorefrontCatalog {
    pub tenant: StoreTenant,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub products: Vec<Product>,
}

impl StorefrontCatalog {
    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackedDelivery {
    pub id: String,
    pub order_number: String,
    pub status: String,
    #[serde(default)]
    pub courier_name: String,
    #[serde(default)]
    pub estimated_time: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackedOrder {
    pub order: TrackedDelivery,
    #[serde(default)]
    pub chat_room_id: Option<String>,
}

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Cannot {action} while checkout is in {from} state")]
    InvalidTransition {
        from: CheckoutState,
        action: &'static str,
    },

    #[error("Customer details incomplete: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Gateway(#[from] ports::GatewayError),

    #[error(transparent)]
    Widget(#[from] ports::WidgetError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, CheckoutError>;
