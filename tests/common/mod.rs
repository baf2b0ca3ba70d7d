//! Scripted collaborators for driving the orchestrator end to end.
#![allow(dead_code)]

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use storefront_checkout::adapters::{FixedGeolocator, HeadlessMapRenderer};
use storefront_checkout::ports::{
    GatewayError, OrderGateway, PaymentGateway, PaymentWidget, PaymentWidgetLoader, WidgetError,
};
use storefront_checkout::services::payment_session::WidgetHandlers;
use storefront_checkout::{
    CheckoutConfig, CheckoutDeps, CheckoutOrchestrator, Coordinates, CustomerInfo, GatewayConfig,
    GatewayMode, OrderReceipt, OrderRequest, PaymentSessionRequest, Product, SessionToken,
};

/// Order backend answering from a script; an exhausted script fails.
#[derive(Default)]
pub struct ScriptedOrders {
    script: Mutex<VecDeque<Result<OrderReceipt, String>>>,
    requests: Mutex<Vec<OrderRequest>>,
}

impl ScriptedOrders {
    pub fn new(script: Vec<Result<OrderReceipt, String>>) -> Arc<Self> {
        Arc::new(Self { script: Mutex::new(script.into()), ..Default::default() })
    }

    pub fn requests(&self) -> Vec<OrderRequest> { self.requests.lock().unwrap().clone() }
}

#[async_trait]
impl OrderGateway for ScriptedOrders {
    async fn create_order(&self, request: &OrderRequest) -> Result<OrderReceipt, GatewayError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(receipt)) => Ok(receipt),
            Some(Err(message)) => Err(GatewayError::Rejected { status: 500, message }),
            None => Err(GatewayError::Unavailable("script exhausted".into())),
        }
    }
}

pub struct FakePayments {
    client_key: String,
    session_fails: bool,
    sessions: Mutex<Vec<PaymentSessionRequest>>,
}

impl FakePayments {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { client_key: "SB-Mid-client-test".into(), session_fails: false, sessions: Mutex::default() })
    }

    pub fn without_client_key() -> Arc<Self> {
        Arc::new(Self { client_key: String::new(), session_fails: false, sessions: Mutex::default() })
    }

    pub fn failing_sessions() -> Arc<Self> {
        Arc::new(Self { client_key: "SB-Mid-client-test".into(), session_fails: true, sessions: Mutex::default() })
    }

    pub fn sessions(&self) -> Vec<PaymentSessionRequest> { self.sessions.lock().unwrap().clone() }
}

#[async_trait]
impl PaymentGateway for FakePayments {
    async fn fetch_config(&self) -> Result<GatewayConfig, GatewayError> {
        Ok(GatewayConfig { mode: GatewayMode::Sandbox, client_key: self.client_key.clone() })
    }

    async fn create_session(&self, request: &PaymentSessionRequest) -> Result<SessionToken, GatewayError> {
        self.sessions.lock().unwrap().push(request.clone());
        if self.session_fails {
            return Err(GatewayError::Rejected { status: 500, message: "gateway not configured".into() });
        }
        Ok(SessionToken { token: format!("snap-{}", request.order_id), redirect_url: None })
    }
}

#[derive(Clone, Copy, Debug)]
pub enum Signal {
    Authorized,
    Pending,
    Failed,
    Closed,
}

/// Widget that replays one list of signals per presentation.
pub struct ScriptedWidget {
    presentations: Mutex<VecDeque<Vec<Signal>>>,
}

impl PaymentWidget for ScriptedWidget {
    fn present(&self, _token: &SessionToken, handlers: WidgetHandlers) -> Result<(), WidgetError> {
        let signals = self.presentations.lock().unwrap().pop_front().unwrap_or_default();
        for signal in signals {
            let result = json!({ "status_code": "200" });
            match signal {
                Signal::Authorized => handlers.authorized(result),
                Signal::Pending => handlers.pending(result),
                Signal::Failed => handlers.failed(result),
                Signal::Closed => handlers.closed(),
            };
        }
        Ok(())
    }
}

pub struct ScriptedWidgetLoader {
    widget: Arc<ScriptedWidget>,
}

impl ScriptedWidgetLoader {
    pub fn new(presentations: Vec<Vec<Signal>>) -> Arc<Self> {
        Arc::new(Self { widget: Arc::new(ScriptedWidget { presentations: Mutex::new(presentations.into()) }) })
    }
}

#[async_trait]
impl PaymentWidgetLoader for ScriptedWidgetLoader {
    async fn load(&self, _config: &GatewayConfig) -> Result<Arc<dyn PaymentWidget>, WidgetError> {
        Ok(self.widget.clone())
    }
}

pub struct Harness {
    pub checkout: CheckoutOrchestrator,
    pub orders: Arc<ScriptedOrders>,
    pub payments: Arc<FakePayments>,
    pub map: HeadlessMapRenderer,
}

pub fn harness(orders: Arc<ScriptedOrders>, payments: Arc<FakePayments>, widget: Arc<ScriptedWidgetLoader>) -> Harness {
    let map = HeadlessMapRenderer::new();
    let checkout = CheckoutOrchestrator::new(
        &CheckoutConfig::new("http://backend.test/api/v1", "kopi-senja"),
        CheckoutDeps {
            orders: orders.clone(),
            payments: payments.clone(),
            widget_loader: widget,
            map_renderer: Arc::new(map.clone()),
            geolocator: Arc::new(FixedGeolocator::new(Some(Coordinates::new(-8.7095, 115.1689)))),
        },
    );
    Harness { checkout, orders, payments, map }
}

/// Single item priced 50000.
pub fn espresso_box() -> Product {
    Product::new("p-espresso", "Espresso Box", Decimal::new(50000, 0))
}

pub fn customer() -> CustomerInfo {
    CustomerInfo {
        name: "Ayu Lestari".into(),
        phone: "081234567890".into(),
        address: "Jl. Sunset Road 88, Kuta".into(),
        notes: Some("Leave at the gate".into()),
        ..Default::default()
    }
}

pub fn receipt(number: &str) -> OrderReceipt {
    OrderReceipt::new(number, Some(format!("delivery-{number}")))
}
