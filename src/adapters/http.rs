//! HTTP client for the merchant backend's public storefront and payment API

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use crate::domain::aggregates::{OrderReceipt, OrderRequest};
use crate::ports::{GatewayError, OrderGateway, PaymentGateway};
use crate::{
    ApiResponse, CheckoutConfig, GatewayConfig, PaymentSessionRequest, SessionToken,
    StorefrontCatalog, TrackedOrder,
};

#[derive(Debug, Clone)]
pub struct HttpStoreApi {
    client: Client,
    base_url: String,
    store_slug: String,
}

impl HttpStoreApi {
    pub fn new(config: &CheckoutConfig) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            store_slug: config.store_slug.clone(),
        })
    }

    pub fn store_slug(&self) -> &str { &self.store_slug }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = self.client.get(&url).send().await?;
        Self::handle_response(response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, GatewayError> {
        let url = self.url(path);
        debug!(%url, "POST");
        let response = self.client.post(&url).json(body).send().await?;
        Self::handle_response(response).await
    }

    /// Unwraps the `{success, data, error}` envelope.
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GatewayError> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiResponse<serde_json::Value>>(&text)
                .ok()
                .and_then(|envelope| envelope.error)
                .unwrap_or(text);
            return Err(match status {
                StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY | StatusCode::GATEWAY_TIMEOUT => {
                    GatewayError::Unavailable(message)
                }
                _ => GatewayError::Rejected { status: status.as_u16(), message },
            });
        }

        let envelope: ApiResponse<T> =
            serde_json::from_str(&text).map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        if !envelope.success {
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message: envelope.error.unwrap_or_else(|| "request unsuccessful".to_string()),
            });
        }
        envelope
            .data
            .ok_or_else(|| GatewayError::InvalidResponse("Missing response data".to_string()))
    }

    // ========== Storefront API ==========

    /// Tenant, categories and active products for the configured store.
    pub async fn fetch_storefront(&self) -> Result<StorefrontCatalog, GatewayError> {
        self.get(&format!("store/{}", self.store_slug)).await
    }

    /// Delivery status of a placed order, by the tracking id from its receipt.
    pub async fn fetch_order(&self, tracking_id: &str) -> Result<TrackedOrder, GatewayError> {
        self.get(&format!("store/{}/orders/{}", self.store_slug, tracking_id)).await
    }
}

#[async_trait]
impl OrderGateway for HttpStoreApi {
    async fn create_order(&self, request: &OrderRequest) -> Result<OrderReceipt, GatewayError> {
        self.post(&format!("store/{}/checkout", self.store_slug), request).await
    }
}

#[async_trait]
impl PaymentGateway for HttpStoreApi {
    async fn fetch_config(&self) -> Result<GatewayConfig, GatewayError> {
        self.get("payment/config").await
    }

    async fn create_session(&self, request: &PaymentSessionRequest) -> Result<SessionToken, GatewayError> {
        self.post("payment/create", request).await
    }
}
