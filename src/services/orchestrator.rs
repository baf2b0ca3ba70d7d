//! Checkout Orchestrator
//!
//! Owns the cart, the customer's form data and the current checkout session,
//! and sequences a submission: order pre-creation, payment session, widget,
//! then reconciliation of the order against the payment outcome.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};
use crate::config::CheckoutConfig;
use crate::domain::aggregates::{
    AddItem, Cart, CheckoutFailure, CheckoutSession, CheckoutState, CustomerInfo, LineId,
    OrderRequest, Product,
};
use crate::domain::events::DomainEvent;
use crate::ports::{Geolocator, MapRenderer, OrderGateway, PaymentGateway, PaymentWidgetLoader};
use crate::services::location_picker::{LocationPicker, MapEvent};
use crate::services::order_submission::{OrderSubmissionAdapter, SubmissionOutcome, SubmissionPhase};
use crate::services::payment_session::PaymentSessionAdapter;
use crate::{CheckoutError, Result};

/// Collaborators the orchestrator drives.
pub struct CheckoutDeps {
    pub orders: Arc<dyn OrderGateway>,
    pub payments: Arc<dyn PaymentGateway>,
    pub widget_loader: Arc<dyn PaymentWidgetLoader>,
    pub map_renderer: Arc<dyn MapRenderer>,
    pub geolocator: Arc<dyn Geolocator>,
}

pub struct CheckoutOrchestrator {
    store_slug: String,
    guest_email_domain: String,
    cart: Cart,
    customer: CustomerInfo,
    session: Option<CheckoutSession>,
    orders: OrderSubmissionAdapter,
    payments: PaymentSessionAdapter,
    picker: LocationPicker,
    state: watch::Sender<CheckoutState>,
    /// Events of sessions already discarded
    events: Vec<DomainEvent>,
}

impl CheckoutOrchestrator {
    pub fn new(config: &CheckoutConfig, deps: CheckoutDeps) -> Self {
        let (state, _) = watch::channel(CheckoutState::Cart);
        Self {
            store_slug: config.store_slug.clone(),
            guest_email_domain: config.guest_email_domain.clone(),
            cart: Cart::new(&config.currency),
            customer: CustomerInfo::default(),
            session: None,
            orders: OrderSubmissionAdapter::new(deps.orders),
            payments: PaymentSessionAdapter::new(deps.payments, deps.widget_loader),
            picker: LocationPicker::new(deps.map_renderer, deps.geolocator, config.map.clone()),
            state,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> CheckoutState {
        self.session.as_ref().map_or(CheckoutState::Cart, CheckoutSession::state)
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<CheckoutState> { self.state.subscribe() }

    pub fn cart(&self) -> &Cart { &self.cart }
    pub fn customer(&self) -> &CustomerInfo { &self.customer }
    pub fn customer_mut(&mut self) -> &mut CustomerInfo { &mut self.customer }
    pub fn session(&self) -> Option<&CheckoutSession> { self.session.as_ref() }
    pub fn location_picker(&self) -> &LocationPicker { &self.picker }

    /// Whether the form may progress to payment right now.
    pub fn can_submit(&self) -> bool {
        self.state() == CheckoutState::Form && !self.cart.is_empty() && self.customer.is_complete()
    }

    // ========== Cart ==========

    pub fn add_item(&mut self, product: &Product, variant_id: Option<&str>) -> Result<AddItem> {
        self.ensure_cart_editable("add items")?;
        Ok(self.cart.add_item(product, variant_id)?)
    }

    pub fn change_quantity(&mut self, id: &LineId, delta: i32) -> Result<Option<u32>> {
        self.ensure_cart_editable("change quantities")?;
        Ok(self.cart.change_quantity(id, delta)?)
    }

    pub fn remove_item(&mut self, id: &LineId) -> Result<()> {
        self.ensure_cart_editable("remove items")?;
        Ok(self.cart.remove_item(id)?)
    }

    /// The cart is frozen from `open_checkout` until the session is discarded.
    fn ensure_cart_editable(&self, action: &'static str) -> Result<()> {
        match self.state() {
            CheckoutState::Cart => Ok(()),
            from => Err(CheckoutError::InvalidTransition { from, action }),
        }
    }

    // ========== Checkout ==========

    /// Loads the payment widget ahead of the first submission. Failures are
    /// logged; `submit` tries again.
    pub async fn preload_payment_widget(&self) -> bool {
        match self.payments.prepare_widget().await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "payment widget preload failed");
                false
            }
        }
    }

    /// `Cart -> Form`. Starts a session with a fresh order reference and shows the map.
    pub async fn open_checkout(&mut self) -> Result<()> {
        let from = self.state();
        if from != CheckoutState::Cart {
            return Err(CheckoutError::InvalidTransition { from, action: "open checkout" });
        }
        if self.cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let session = CheckoutSession::open(&self.store_slug);
        info!(reference = %session.reference(), total = %self.cart.total(), "checkout opened");
        self.session = Some(session);
        self.picker.mount(&mut self.customer).await;
        self.publish();
        Ok(())
    }

    /// `Form -> Processing` and the full submission sequence. Network and
    /// gateway failures end in a state, not an `Err`; only guard violations
    /// are returned as errors.
    pub async fn submit(&mut self) -> Result<CheckoutState> {
        let from = self.state();
        let Some(session) = self.session.as_mut() else {
            return Err(CheckoutError::InvalidTransition { from, action: "submit" });
        };
        if from == CheckoutState::Form && self.cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        if from == CheckoutState::Form {
            let request = OrderRequest::build(session.reference(), &self.cart, &self.customer);
            if session.is_superseded_by(&request) {
                let fresh = CheckoutSession::open(&self.store_slug);
                warn!(
                    previous = %session.reference(),
                    reference = %fresh.reference(),
                    "order details changed after the order was persisted, starting a new reference"
                );
                session.close();
                self.events.extend(session.take_events());
                *session = fresh;
            }
        }
        let amount = self.cart.total();
        session.begin_processing(&self.customer, amount.clone())?;
        let request = OrderRequest::build(session.reference(), &self.cart, &self.customer);
        let reference = session.reference().clone();
        info!(%reference, %amount, "checkout submitted");
        self.picker.unmount();
        self.state.send_replace(CheckoutState::Processing);

        // best effort; payment goes ahead either way
        self.orders.ensure_persisted(session, &request, SubmissionPhase::PreCreation).await;

        let created = self
            .payments
            .create_session(&reference, &amount, &self.customer, &self.guest_email_domain)
            .await;
        let token = match created {
            Ok(token) => token,
            Err(e) => {
                warn!(%reference, error = %e, "payment session unavailable");
                session.fail(CheckoutFailure::SessionUnavailable(e.to_string()));
                return Ok(self.settle().await);
            }
        };
        session.record_payment_session();

        let presented = self.payments.present_widget(&token).await;
        let pending = match presented {
            Ok(pending) => pending,
            Err(e) => {
                warn!(%reference, error = %e, "payment widget unavailable");
                session.fail(CheckoutFailure::WidgetUnavailable(e.to_string()));
                return Ok(self.settle().await);
            }
        };
        let resolution = pending.outcome().await;
        info!(%reference, outcome = ?resolution.outcome, "payment widget resolved");

        if resolution.outcome.is_positive() {
            let outcome = self.orders.ensure_persisted(session, &request, SubmissionPhase::AfterPayment).await;
            if let SubmissionOutcome::Failed(reason) = outcome {
                warn!(
                    target: "reconciliation",
                    %reference,
                    %amount,
                    outcome = ?resolution.outcome,
                    %reason,
                    "payment accepted without a persisted order"
                );
            }
        }
        session.resolve_payment(resolution.outcome);
        Ok(self.settle().await)
    }

    /// `Error -> Form` with the customer's details and the session's reference kept.
    pub async fn retry(&mut self) -> Result<()> {
        let from = self.state();
        let session = self
            .session
            .as_mut()
            .ok_or(CheckoutError::InvalidTransition { from, action: "retry" })?;
        session.retry()?;
        info!(reference = %session.reference(), "checkout retried");
        self.picker.mount(&mut self.customer).await;
        self.publish();
        Ok(())
    }

    /// Returns to `Cart` and discards the session. After a successful order
    /// the cart is emptied; otherwise it is kept for the next attempt.
    pub fn back_to_shopping(&mut self) -> Result<()> {
        let from = self.state();
        if from == CheckoutState::Processing {
            return Err(CheckoutError::InvalidTransition { from, action: "go back to shopping" });
        }
        if from.is_terminal_positive() {
            self.cart.clear();
        }
        self.picker.unmount();
        if let Some(mut session) = self.session.take() {
            session.close();
            self.events.extend(session.take_events());
            info!(reference = %session.reference(), from = %from, "checkout closed");
        }
        self.publish();
        Ok(())
    }

    /// Forwards a map interaction while the form is showing.
    pub fn handle_map_event(&mut self, event: MapEvent) -> bool {
        if self.state() != CheckoutState::Form {
            return false;
        }
        self.picker.handle_event(event, &mut self.customer)
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        let mut events = std::mem::take(&mut self.events);
        events.extend(self.cart.take_events());
        if let Some(session) = self.session.as_mut() {
            events.extend(session.take_events());
        }
        events
    }

    /// Applies the side effects of the state a submission ended in.
    async fn settle(&mut self) -> CheckoutState {
        let state = self.state();
        match state {
            CheckoutState::Success | CheckoutState::Pending => self.cart.clear(),
            CheckoutState::Form => self.picker.mount(&mut self.customer).await,
            _ => {}
        }
        if let Some(session) = self.session.as_ref() {
            info!(
                reference = %session.reference(),
                %state,
                order_number = session.order_number().unwrap_or("-"),
                "checkout settled"
            );
        }
        self.publish();
        state
    }

    fn publish(&self) {
        let next = self.state();
        self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}
