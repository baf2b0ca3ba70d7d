//! Aggregates module
pub mod cart;
pub mod checkout;
pub mod customer;
pub mod order;
pub mod product;

pub use cart::{AddItem, Cart, CartError, CartLine, LineId, VariantPrompt};
pub use checkout::{CheckoutFailure, CheckoutSession, CheckoutState, PaymentOutcome};
pub use customer::CustomerInfo;
pub use order::{OrderReceipt, OrderRequest};
pub use product::{Product, Variant};
