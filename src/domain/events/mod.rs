//! Domain events
use crate::domain::aggregates::PaymentOutcome;
use rust_decimal::Decimal;

#[derive(Clone, Debug, PartialEq)]
pub enum DomainEvent {
    Cart(CartEvent),
    Checkout(CheckoutEvent),
}

#[derive(Clone, Debug, PartialEq)]
pub enum CartEvent {
    ItemAdded { line_id: String, quantity: u32 },
    QuantityChanged { line_id: String, quantity: u32 },
    ItemRemoved { line_id: String },
    Cleared { lines: usize },
}

#[derive(Clone, Debug, PartialEq)]
pub enum CheckoutEvent {
    Opened { reference: String },
    OrderPersisted { reference: String, order_number: String, attempt: u32 },
    OrderCreationFailed { reference: String, attempt: u32, reason: String },
    PaymentSessionCreated { reference: String },
    PaymentResolved { reference: String, outcome: PaymentOutcome },
    /// Paid, but no order was ever confirmed for this reference.
    ReconciliationGap { reference: String, amount: Decimal },
    Failed { reference: String, reason: String },
    Reset { reference: String },
}
