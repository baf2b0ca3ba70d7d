//! Ports to the collaborators the checkout core drives but does not own:
//! the merchant backend, the payment gateway and its widget, the map
//! renderer and the device's geolocation.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use crate::domain::aggregates::{OrderReceipt, OrderRequest};
use crate::domain::value_objects::Coordinates;
use crate::services::payment_session::WidgetHandlers;
use crate::{GatewayConfig, PaymentSessionRequest, SessionToken};

/// Backend / gateway call failure
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status or `success: false` envelope
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Creates (or, for a reference the backend already knows, re-acknowledges) an order.
    async fn create_order(&self, request: &OrderRequest) -> Result<OrderReceipt, GatewayError>;
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn fetch_config(&self) -> Result<GatewayConfig, GatewayError>;
    async fn create_session(&self, request: &PaymentSessionRequest) -> Result<SessionToken, GatewayError>;
}

#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("Payment widget not configured: {0}")]
    NotConfigured(String),

    #[error("Payment widget failed to load: {0}")]
    LoadFailed(String),

    #[error("Payment widget could not be presented: {0}")]
    PresentFailed(String),
}

/// Loads the gateway's widget resource for a mode and client key.
#[async_trait]
pub trait PaymentWidgetLoader: Send + Sync {
    async fn load(&self, config: &GatewayConfig) -> Result<Arc<dyn PaymentWidget>, WidgetError>;
}

/// Externally supplied payment UI. Reports exactly one outcome through the
/// handlers, or `closed` when the customer dismisses it.
pub trait PaymentWidget: Send + Sync {
    fn present(&self, token: &SessionToken, handlers: WidgetHandlers) -> Result<(), WidgetError>;
}

#[derive(Debug, Error)]
pub enum MapError {
    #[error("Map library failed to load: {0}")]
    LibraryLoad(String),

    #[error("Map could not be created: {0}")]
    Init(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    pub center: Coordinates,
    pub zoom: u8,
    pub max_zoom: u8,
    pub draggable_marker: bool,
    pub tile_url: String,
    pub attribution: String,
}

/// Tile-based map renderer.
#[async_trait]
pub trait MapRenderer: Send + Sync {
    /// Fetches the renderer's stylesheet and script.
    async fn load_library(&self) -> Result<(), MapError>;

    /// Creates a map with a single marker at `options.center`.
    fn create_map(&self, options: &MapOptions) -> Result<Box<dyn MapInstance>, MapError>;
}

pub trait MapInstance: Send {
    fn set_view(&mut self, center: Coordinates, zoom: u8);
    fn move_marker(&mut self, position: Coordinates);
    /// Tears the map down and releases its resources.
    fn remove(self: Box<Self>);
}

#[derive(Debug, Error)]
pub enum GeolocationError {
    #[error("Geolocation not supported")]
    Unsupported,

    #[error("Geolocation permission denied")]
    PermissionDenied,

    #[error("Position unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError>;
}
