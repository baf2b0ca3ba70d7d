//! Order Submission Adapter
//!
//! Turns a checkout into order-creation calls against the merchant backend.
//! Every call for a session carries the session's reference, calls never
//! overlap, and a session that already has a durable order is never
//! submitted again.

use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use crate::domain::aggregates::{CheckoutSession, OrderReceipt, OrderRequest};
use crate::ports::OrderGateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPhase {
    /// Best-effort attempt before the payment session exists
    PreCreation,
    /// The single retry after the gateway reported a positive outcome
    AfterPayment,
}

impl fmt::Display for SubmissionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PreCreation => f.write_str("pre-creation"),
            Self::AfterPayment => f.write_str("after-payment"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    AlreadyPersisted,
    Persisted(OrderReceipt),
    Failed(String),
}

pub struct OrderSubmissionAdapter {
    gateway: Arc<dyn OrderGateway>,
    in_flight: Mutex<()>,
}

impl OrderSubmissionAdapter {
    pub fn new(gateway: Arc<dyn OrderGateway>) -> Self {
        Self { gateway, in_flight: Mutex::new(()) }
    }

    /// Makes one creation attempt unless the session is already persisted.
    /// Failures are logged and returned, never propagated.
    pub async fn ensure_persisted(
        &self,
        session: &mut CheckoutSession,
        request: &OrderRequest,
        phase: SubmissionPhase,
    ) -> SubmissionOutcome {
        if session.order_persisted() {
            return SubmissionOutcome::AlreadyPersisted;
        }
        if &request.client_order_ref != session.reference() {
            let reason = format!(
                "request reference {} does not match session {}",
                request.client_order_ref,
                session.reference()
            );
            warn!(%phase, "{reason}");
            return SubmissionOutcome::Failed(reason);
        }

        let _guard = self.in_flight.lock().await;
        let attempt = session.record_order_attempt();
        match self.gateway.create_order(request).await {
            Ok(receipt) => {
                info!(
                    reference = %session.reference(),
                    %phase,
                    attempt,
                    order_number = %receipt.order_number,
                    "order persisted"
                );
                session.record_order(request, receipt.clone());
                SubmissionOutcome::Persisted(receipt)
            }
            Err(e) => {
                warn!(reference = %session.reference(), %phase, attempt, error = %e, "order creation failed");
                session.record_order_failure(e.to_string());
                SubmissionOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use crate::domain::aggregates::{Cart, CustomerInfo, Product};
    use crate::domain::value_objects::Money;
    use crate::ports::GatewayError;

    #[derive(Default)]
    struct Backend {
        results: StdMutex<VecDeque<Result<OrderReceipt, String>>>,
        seen: StdMutex<Vec<String>>,
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    #[async_trait]
    impl OrderGateway for Backend {
        async fn create_order(&self, request: &OrderRequest) -> Result<OrderReceipt, GatewayError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.seen.lock().unwrap().push(request.client_order_ref.to_string());
            self.active.fetch_sub(1, Ordering::SeqCst);
            let next = self.results.lock().unwrap().pop_front().unwrap_or(Err("no script".into()));
            next.map_err(|message| GatewayError::Rejected { status: 500, message })
        }
    }

    fn backend(results: Vec<Result<OrderReceipt, String>>) -> Arc<Backend> {
        Arc::new(Backend { results: StdMutex::new(results.into()), ..Default::default() })
    }

    fn processing_session() -> (CheckoutSession, OrderRequest) {
        let customer = CustomerInfo { name: "Ayu".into(), phone: "0812".into(), address: "Jl. 1".into(), ..Default::default() };
        let mut cart = Cart::new("IDR");
        cart.add_item(&Product::new("P1", "Latte", Decimal::new(50000, 0)), None).unwrap();
        let mut session = CheckoutSession::open("kopi");
        session.begin_processing(&customer, Money::idr(Decimal::new(50000, 0))).unwrap();
        let request = OrderRequest::build(session.reference(), &cart, &customer);
        (session, request)
    }

    #[tokio::test]
    async fn test_retry_reuses_reference() {
        let backend = backend(vec![Err("timeout".into()), Ok(OrderReceipt::new("ORD-2", None))]);
        let adapter = OrderSubmissionAdapter::new(backend.clone());
        let (mut session, request) = processing_session();

        let first = adapter.ensure_persisted(&mut session, &request, SubmissionPhase::PreCreation).await;
        assert!(matches!(first, SubmissionOutcome::Failed(_)));
        assert!(!session.order_persisted());

        let second = adapter.ensure_persisted(&mut session, &request, SubmissionPhase::AfterPayment).await;
        assert_eq!(second, SubmissionOutcome::Persisted(OrderReceipt::new("ORD-2", None)));
        assert_eq!(session.order_number(), Some("ORD-2"));
        assert_eq!(session.order_attempts(), 2);

        let seen = backend.seen.lock().unwrap().clone();
        assert_eq!(seen, vec![session.reference().to_string(); 2]);
    }

    #[tokio::test]
    async fn test_persisted_session_is_not_resubmitted() {
        let backend = backend(vec![Ok(OrderReceipt::new("ORD-1", None))]);
        let adapter = OrderSubmissionAdapter::new(backend.clone());
        let (mut session, request) = processing_session();
        adapter.ensure_persisted(&mut session, &request, SubmissionPhase::PreCreation).await;
        let again = adapter.ensure_persisted(&mut session, &request, SubmissionPhase::AfterPayment).await;
        assert_eq!(again, SubmissionOutcome::AlreadyPersisted);
        assert_eq!(backend.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_mismatched_reference_is_refused() {
        let backend = backend(vec![]);
        let adapter = OrderSubmissionAdapter::new(backend.clone());
        let (mut session, mut request) = processing_session();
        request.client_order_ref = crate::OrderReference::new("ORD-other").unwrap();
        let outcome = adapter.ensure_persisted(&mut session, &request, SubmissionPhase::PreCreation).await;
        assert!(matches!(outcome, SubmissionOutcome::Failed(_)));
        assert!(backend.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_attempts_never_overlap() {
        let backend = backend(vec![Err("a".into()), Err("b".into()), Err("c".into()), Err("d".into())]);
        let adapter = Arc::new(OrderSubmissionAdapter::new(backend.clone()));
        let mut handles = vec![];
        for _ in 0..4 {
            let adapter = Arc::clone(&adapter);
            handles.push(tokio::spawn(async move {
                let (mut session, request) = processing_session();
                adapter.ensure_persisted(&mut session, &request, SubmissionPhase::PreCreation).await
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(backend.max_active.load(Ordering::SeqCst), 1);
        assert_eq!(backend.seen.lock().unwrap().len(), 4);
    }
}
