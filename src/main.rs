//! Storefront Checkout - sandbox driver
//!
//! Runs one checkout against a live merchant backend from the terminal:
//! products are picked on the command line, the form is filled from stdin and
//! a console prompt stands in for the gateway's payment widget.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use storefront_checkout::adapters::{FixedGeolocator, HeadlessMapRenderer, HttpStoreApi};
use storefront_checkout::ports::{PaymentWidget, PaymentWidgetLoader, WidgetError};
use storefront_checkout::services::payment_session::WidgetHandlers;
use storefront_checkout::{
    AddItem, CheckoutConfig, CheckoutDeps, CheckoutOrchestrator, CheckoutState, Coordinates,
    GatewayConfig, SessionToken,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct ConsoleWidgetLoader;

#[async_trait]
impl PaymentWidgetLoader for ConsoleWidgetLoader {
    async fn load(&self, config: &GatewayConfig) -> Result<Arc<dyn PaymentWidget>, WidgetError> {
        tracing::info!(mode = %config.mode, script = config.mode.widget_script_url(), "using console payment widget");
        Ok(Arc::new(ConsoleWidget))
    }
}

struct ConsoleWidget;

impl PaymentWidget for ConsoleWidget {
    fn present(&self, token: &SessionToken, handlers: WidgetHandlers) -> Result<(), WidgetError> {
        println!("\nPayment session {}", token.token);
        if let Some(url) = &token.redirect_url {
            println!("Hosted payment page: {url}");
        }
        println!("Result? [a]uthorized / [p]ending / [f]ailed / anything else closes");
        tokio::task::spawn_blocking(move || {
            let answer = read_line().unwrap_or_default();
            let result = serde_json::json!({ "source": "console", "answer": answer });
            match answer.as_str() {
                "a" => handlers.authorized(result),
                "p" => handlers.pending(result),
                "f" => handlers.failed(result),
                _ => handlers.closed(),
            };
        });
        Ok(())
    }
}

fn read_line() -> io::Result<String> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

async fn prompt(label: &'static str) -> Result<String> {
    let answer = tokio::task::spawn_blocking(move || {
        print!("{label}: ");
        io::stdout().flush()?;
        read_line()
    })
    .await??;
    Ok(answer)
}

async fn confirm(question: &'static str) -> Result<bool> {
    Ok(prompt(question).await?.eq_ignore_ascii_case("y"))
}

fn sandbox_position() -> Option<Coordinates> {
    let latitude = std::env::var("SANDBOX_LAT").ok()?.parse().ok()?;
    let longitude = std::env::var("SANDBOX_LNG").ok()?.parse().ok()?;
    Some(Coordinates::new(latitude, longitude)).filter(Coordinates::is_valid)
}

/// Prompts for whichever required fields are still blank.
async fn fill_customer(checkout: &mut CheckoutOrchestrator) -> Result<()> {
    if checkout.customer().name.trim().is_empty() {
        checkout.customer_mut().name = prompt("Name").await?;
    }
    if checkout.customer().phone.trim().is_empty() {
        checkout.customer_mut().phone = prompt("WhatsApp number").await?;
    }
    if checkout.customer().address.trim().is_empty() {
        checkout.customer_mut().address = prompt("Delivery address").await?;
        let notes = prompt("Notes (optional)").await?;
        checkout.customer_mut().notes = Some(notes).filter(|n| !n.is_empty());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CheckoutConfig::from_env()?;
    let api = Arc::new(HttpStoreApi::new(&config)?);
    let catalog = api.fetch_storefront().await.context("loading storefront")?;
    tracing::info!(store = %catalog.tenant.name, products = catalog.products.len(), "storefront loaded");

    let picks: Vec<String> = std::env::args().skip(1).collect();
    if picks.is_empty() {
        for product in &catalog.products {
            let variants: Vec<&str> = product.active_variants().map(|v| v.id.as_str()).collect();
            println!("{}  {}  {}  [{}]", product.id, product.name, product.base_price, variants.join(" "));
        }
        bail!("usage: storefront-checkout <product[:variant]>...");
    }

    let mut checkout = CheckoutOrchestrator::new(
        &config,
        CheckoutDeps {
            orders: api.clone(),
            payments: api.clone(),
            widget_loader: Arc::new(ConsoleWidgetLoader),
            map_renderer: Arc::new(HeadlessMapRenderer::new()),
            geolocator: Arc::new(FixedGeolocator::new(sandbox_position())),
        },
    );
    checkout.preload_payment_widget().await;

    for pick in &picks {
        let (product_id, variant_id) = match pick.split_once(':') {
            Some((product, variant)) => (product, Some(variant)),
            None => (pick.as_str(), None),
        };
        let product = catalog.product(product_id).with_context(|| format!("unknown product {product_id}"))?;
        if let AddItem::ChooseVariant(choice) = checkout.add_item(product, variant_id)? {
            let options: Vec<String> = choice.options.iter().map(|v| format!("{}:{}", choice.product_id, v.id)).collect();
            bail!("{} needs a variant, pick one of: {}", choice.product_name, options.join(", "));
        }
    }
    println!("Cart: {} = {}", checkout.cart().items_summary(), checkout.cart().total());

    checkout.open_checkout().await?;
    loop {
        fill_customer(&mut checkout).await?;
        if !checkout.can_submit() {
            println!("Name, phone and address are required.");
            continue;
        }
        match checkout.submit().await? {
            CheckoutState::Form => {
                println!("Payment closed without a result.");
                if !confirm("Pay again? [y/N]").await? {
                    break;
                }
            }
            CheckoutState::Error => {
                if let Some(failure) = checkout.session().and_then(|s| s.failure()) {
                    println!("Checkout failed: {failure}");
                }
                if !confirm("Retry? [y/N]").await? {
                    break;
                }
                checkout.retry().await?;
            }
            _ => break,
        }
    }

    let state = checkout.state();
    if let Some(session) = checkout.session() {
        println!("\nReference: {}  State: {}", session.reference(), state);
        match session.order_number() {
            Some(number) => println!("Order number: {number}"),
            None if session.is_reconciliation_gap() => println!("Payment received; order confirmation will follow."),
            None => {}
        }
        if let Some(tracking_id) = session.tracking_id() {
            match api.fetch_order(tracking_id).await {
                Ok(tracked) => println!("Delivery status: {}", tracked.order.status),
                Err(e) => tracing::warn!(error = %e, "order tracking unavailable"),
            }
        }
    }
    checkout.back_to_shopping()?;
    tracing::info!(final_state = %state, events = checkout.take_events().len(), "sandbox checkout finished");
    Ok(())
}
