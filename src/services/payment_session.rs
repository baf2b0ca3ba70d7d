//! Payment Session Adapter
//!
//! Requests a session token from the payment gateway and presents the
//! externally supplied widget with it. The widget's four callbacks are folded
//! into a single-resolution continuation: the first signal wins and every
//! later one is ignored.

use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tracing::{debug, info};
use crate::domain::aggregates::{CustomerInfo, PaymentOutcome};
use crate::domain::value_objects::{Money, OrderReference};
use crate::ports::{GatewayError, PaymentGateway, PaymentWidget, PaymentWidgetLoader, WidgetError};
use crate::services::resource::LoadOnce;
use crate::{PaymentSessionRequest, SessionToken};

/// Outcome reported by the widget, with the gateway's raw result when it sent one.
#[derive(Clone, Debug, PartialEq)]
pub struct PaymentResolution {
    pub outcome: PaymentOutcome,
    pub gateway_result: Option<Value>,
}

impl PaymentResolution {
    fn abandoned() -> Self { Self { outcome: PaymentOutcome::Abandoned, gateway_result: None } }
}

/// Callback handle given to the payment widget. Cheap to clone; all clones
/// share one slot, so only the first signal across them is delivered.
#[derive(Clone, Debug)]
pub struct WidgetHandlers {
    slot: Arc<Mutex<Option<oneshot::Sender<PaymentResolution>>>>,
}

impl WidgetHandlers {
    pub fn channel() -> (Self, PendingPayment) {
        let (tx, rx) = oneshot::channel();
        (Self { slot: Arc::new(Mutex::new(Some(tx))) }, PendingPayment { rx })
    }

    pub fn authorized(&self, result: Value) -> bool { self.resolve(PaymentOutcome::Authorized, Some(result)) }
    pub fn pending(&self, result: Value) -> bool { self.resolve(PaymentOutcome::Pending, Some(result)) }
    pub fn failed(&self, result: Value) -> bool { self.resolve(PaymentOutcome::Failed, Some(result)) }
    /// Widget dismissed. Only counts when no result arrived first.
    pub fn closed(&self) -> bool { self.resolve(PaymentOutcome::Abandoned, None) }

    pub fn is_resolved(&self) -> bool {
        match self.slot.lock() {
            Ok(slot) => slot.is_none(),
            Err(poisoned) => poisoned.into_inner().is_none(),
        }
    }

    /// Returns whether this signal was the one delivered.
    fn resolve(&self, outcome: PaymentOutcome, gateway_result: Option<Value>) -> bool {
        let sender = match self.slot.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        match sender {
            Some(tx) => {
                debug!(?outcome, "payment widget resolved");
                tx.send(PaymentResolution { outcome, gateway_result }).is_ok()
            }
            None => {
                debug!(?outcome, "payment widget signal after resolution ignored");
                false
            }
        }
    }
}

/// Awaitable side of [`WidgetHandlers`].
#[derive(Debug)]
pub struct PendingPayment {
    rx: oneshot::Receiver<PaymentResolution>,
}

impl PendingPayment {
    /// Waits for the widget. If every handler is dropped without a signal the
    /// widget is gone, which is treated the same as closing it.
    pub async fn outcome(self) -> PaymentResolution {
        self.rx.await.unwrap_or_else(|_| PaymentResolution::abandoned())
    }
}

pub struct PaymentSessionAdapter {
    gateway: Arc<dyn PaymentGateway>,
    loader: Arc<dyn PaymentWidgetLoader>,
    widget: LoadOnce<Arc<dyn PaymentWidget>>,
}

impl PaymentSessionAdapter {
    pub fn new(gateway: Arc<dyn PaymentGateway>, loader: Arc<dyn PaymentWidgetLoader>) -> Self {
        Self { gateway, loader, widget: LoadOnce::new("payment-widget") }
    }

    /// Fetches the public gateway config and loads the widget, once per adapter lifetime.
    pub async fn prepare_widget(&self) -> Result<Arc<dyn PaymentWidget>, WidgetError> {
        let widget = self
            .widget
            .get_or_load(|| async {
                let config = self
                    .gateway
                    .fetch_config()
                    .await
                    .map_err(|e| WidgetError::NotConfigured(e.to_string()))?;
                if config.client_key.trim().is_empty() {
                    return Err(WidgetError::NotConfigured("gateway client key missing".into()));
                }
                info!(mode = %config.mode, script = config.mode.widget_script_url(), "loading payment widget");
                self.loader.load(&config).await
            })
            .await?;
        Ok(Arc::clone(widget))
    }

    pub fn widget_ready(&self) -> bool { self.widget.is_loaded() }

    pub async fn create_session(
        &self,
        reference: &OrderReference,
        amount: &Money,
        customer: &CustomerInfo,
        guest_email_domain: &str,
    ) -> Result<SessionToken, GatewayError> {
        let request = PaymentSessionRequest::for_customer(reference, amount, customer, guest_email_domain);
        let token = self.gateway.create_session(&request).await?;
        if token.token.trim().is_empty() {
            return Err(GatewayError::InvalidResponse("empty payment session token".into()));
        }
        info!(%reference, amount = %amount, "payment session created");
        Ok(token)
    }

    pub async fn present_widget(&self, token: &SessionToken) -> Result<PendingPayment, WidgetError> {
        let widget = self.prepare_widget().await?;
        let (handlers, pending) = WidgetHandlers::channel();
        widget.present(token, handlers)?;
        Ok(pending)
    }
}
