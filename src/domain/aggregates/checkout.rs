//! Checkout Session Aggregate
//!
//! One checkout attempt: the order reference that anchors idempotency, the
//! state machine position and whether the backend has durably accepted the order.
//!
//! ```text
//! Cart -> Form -> Processing -> Success | Pending | Error
//!          ^          |                              |
//!          +-- closed +------------- retry ----------+
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use crate::domain::aggregates::{CustomerInfo, OrderReceipt, OrderRequest};
use crate::domain::events::{CheckoutEvent, DomainEvent};
use crate::domain::value_objects::{Money, OrderReference};
use crate::CheckoutError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutState {
    #[default]
    Cart,
    Form,
    Processing,
    Success,
    /// Order accepted; the gateway confirms payment later.
    Pending,
    Error,
}

impl CheckoutState {
    pub fn is_terminal_positive(&self) -> bool { matches!(self, Self::Success | Self::Pending) }
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cart => "cart",
            Self::Form => "form",
            Self::Processing => "processing",
            Self::Success => "success",
            Self::Pending => "pending",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcome {
    Authorized,
    Pending,
    Failed,
    /// Widget closed without a gateway-reported result.
    Abandoned,
}

impl PaymentOutcome {
    pub fn is_positive(&self) -> bool { matches!(self, Self::Authorized | Self::Pending) }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutFailure {
    SessionUnavailable(String),
    WidgetUnavailable(String),
    PaymentFailed,
}

impl fmt::Display for CheckoutFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionUnavailable(e) => write!(f, "payment session unavailable: {e}"),
            Self::WidgetUnavailable(e) => write!(f, "payment widget unavailable: {e}"),
            Self::PaymentFailed => write!(f, "payment failed"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CheckoutSession {
    reference: OrderReference,
    state: CheckoutState,
    order_persisted: bool,
    receipt: Option<OrderReceipt>,
    /// The request the backend accepted; later passes must match it
    persisted_request: Option<OrderRequest>,
    order_attempts: u32,
    amount: Option<Money>,
    outcome: Option<PaymentOutcome>,
    failure: Option<CheckoutFailure>,
    events: Vec<DomainEvent>,
}

impl CheckoutSession {
    /// Starts an attempt in `Form` with a freshly generated reference.
    pub fn open(store_slug: &str) -> Self {
        Self::with_reference(OrderReference::generate(store_slug))
    }

    pub fn with_reference(reference: OrderReference) -> Self {
        let mut session = Self {
            reference, state: CheckoutState::Form, order_persisted: false, receipt: None,
            persisted_request: None, order_attempts: 0, amount: None, outcome: None, failure: None,
            events: vec![],
        };
        session.raise_event(CheckoutEvent::Opened { reference: session.reference.to_string() });
        session
    }

    pub fn reference(&self) -> &OrderReference { &self.reference }
    pub fn state(&self) -> CheckoutState { self.state }
    pub fn order_persisted(&self) -> bool { self.order_persisted }
    pub fn receipt(&self) -> Option<&OrderReceipt> { self.receipt.as_ref() }
    pub fn order_number(&self) -> Option<&str> {
        self.receipt.as_ref().map(|r| r.order_number.as_str()).filter(|n| !n.is_empty())
    }
    pub fn tracking_id(&self) -> Option<&str> { self.receipt.as_ref().and_then(|r| r.tracking_id.as_deref()) }
    pub fn order_attempts(&self) -> u32 { self.order_attempts }
    pub fn amount(&self) -> Option<&Money> { self.amount.as_ref() }
    pub fn outcome(&self) -> Option<PaymentOutcome> { self.outcome }
    pub fn failure(&self) -> Option<&CheckoutFailure> { self.failure.as_ref() }
    pub fn persisted_request(&self) -> Option<&OrderRequest> { self.persisted_request.as_ref() }

    /// Paid (or payment pending) without any confirmed order for the reference.
    pub fn is_reconciliation_gap(&self) -> bool { self.state.is_terminal_positive() && !self.order_persisted }

    /// An order is persisted under this reference with different contents.
    /// Paying for `request` here would leave the backend holding the wrong order.
    pub fn is_superseded_by(&self, request: &OrderRequest) -> bool {
        self.persisted_request.as_ref().is_some_and(|persisted| persisted != request)
    }

    /// `Form -> Processing`, guarded on the required customer fields.
    pub fn begin_processing(&mut self, customer: &CustomerInfo, amount: Money) -> Result<(), CheckoutError> {
        if self.state != CheckoutState::Form {
            return Err(CheckoutError::InvalidTransition { from: self.state, action: "submit" });
        }
        validator::Validate::validate(customer)?;
        self.amount = Some(amount);
        self.outcome = None;
        self.failure = None;
        self.transition(CheckoutState::Processing);
        Ok(())
    }

    pub fn record_order_attempt(&mut self) -> u32 {
        self.order_attempts += 1;
        self.order_attempts
    }

    pub fn record_order(&mut self, request: &OrderRequest, receipt: OrderReceipt) {
        self.order_persisted = true;
        self.persisted_request = Some(request.clone());
        self.raise_event(CheckoutEvent::OrderPersisted {
            reference: self.reference.to_string(),
            order_number: receipt.order_number.clone(),
            attempt: self.order_attempts,
        });
        self.receipt = Some(receipt);
    }

    pub fn record_order_failure(&mut self, reason: impl Into<String>) {
        self.raise_event(CheckoutEvent::OrderCreationFailed {
            reference: self.reference.to_string(),
            attempt: self.order_attempts,
            reason: reason.into(),
        });
    }

    pub fn record_payment_session(&mut self) {
        self.raise_event(CheckoutEvent::PaymentSessionCreated { reference: self.reference.to_string() });
    }

    /// Applies the widget outcome. Only acts while `Processing`; anything arriving
    /// after the attempt is resolved leaves the state untouched.
    pub fn resolve_payment(&mut self, outcome: PaymentOutcome) -> CheckoutState {
        if self.state != CheckoutState::Processing { return self.state; }
        self.outcome = Some(outcome);
        self.raise_event(CheckoutEvent::PaymentResolved { reference: self.reference.to_string(), outcome });
        let next = match outcome {
            PaymentOutcome::Authorized => CheckoutState::Success,
            PaymentOutcome::Pending => CheckoutState::Pending,
            PaymentOutcome::Failed => {
                self.failure = Some(CheckoutFailure::PaymentFailed);
                self.raise_event(CheckoutEvent::Failed {
                    reference: self.reference.to_string(),
                    reason: CheckoutFailure::PaymentFailed.to_string(),
                });
                CheckoutState::Error
            }
            PaymentOutcome::Abandoned => CheckoutState::Form,
        };
        if next.is_terminal_positive() && !self.order_persisted {
            let amount = self.amount.as_ref().map(Money::amount).unwrap_or_default();
            self.raise_event(CheckoutEvent::ReconciliationGap { reference: self.reference.to_string(), amount });
        }
        self.transition(next);
        next
    }

    /// `Processing -> Error` for failures before the widget reports anything.
    pub fn fail(&mut self, failure: CheckoutFailure) -> CheckoutState {
        if self.state != CheckoutState::Processing { return self.state; }
        self.raise_event(CheckoutEvent::Failed { reference: self.reference.to_string(), reason: failure.to_string() });
        self.failure = Some(failure);
        self.transition(CheckoutState::Error);
        self.state
    }

    /// `Error -> Form`, keeping the reference and persistence flag.
    pub fn retry(&mut self) -> Result<(), CheckoutError> {
        if self.state != CheckoutState::Error {
            return Err(CheckoutError::InvalidTransition { from: self.state, action: "retry" });
        }
        self.transition(CheckoutState::Form);
        Ok(())
    }

    /// Ends the attempt; the session is discarded by its owner afterwards.
    pub fn close(&mut self) {
        self.raise_event(CheckoutEvent::Reset { reference: self.reference.to_string() });
        self.transition(CheckoutState::Cart);
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }

    fn transition(&mut self, next: CheckoutState) {
        tracing::debug!(reference = %self.reference, from = %self.state, to = %next, "checkout transition");
        self.state = next;
    }
    fn raise_event(&mut self, e: CheckoutEvent) { self.events.push(DomainEvent::Checkout(e)); }
}
