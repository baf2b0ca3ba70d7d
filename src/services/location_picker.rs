//! Address / Location Picker
//!
//! Wraps the map renderer so the customer can pin a delivery point. The
//! renderer's library is loaded once; the map itself lives only while the
//! checkout form is showing and is torn down on every exit.

use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use crate::config::MapSettings;
use crate::domain::aggregates::CustomerInfo;
use crate::domain::value_objects::Coordinates;
use crate::ports::{Geolocator, MapInstance, MapOptions, MapRenderer};
use crate::services::resource::LoadOnce;

/// Interaction reported by the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapEvent {
    MarkerDragEnd(Coordinates),
    Click(Coordinates),
}

pub struct LocationPicker {
    renderer: Arc<dyn MapRenderer>,
    geolocator: Arc<dyn Geolocator>,
    settings: MapSettings,
    library: LoadOnce<()>,
    map: Option<Box<dyn MapInstance>>,
}

impl LocationPicker {
    pub fn new(renderer: Arc<dyn MapRenderer>, geolocator: Arc<dyn Geolocator>, settings: MapSettings) -> Self {
        Self { renderer, geolocator, settings, library: LoadOnce::new("map-library"), map: None }
    }

    pub fn is_mounted(&self) -> bool { self.map.is_some() }
    pub fn library_loaded(&self) -> bool { self.library.is_loaded() }

    /// Shows the map. No-op when already mounted. A library or map failure
    /// leaves the picker unmounted; the form stays usable without coordinates.
    pub async fn mount(&mut self, customer: &mut CustomerInfo) {
        if self.map.is_some() { return; }

        let renderer = Arc::clone(&self.renderer);
        if let Err(e) = self.library.get_or_load(|| async move { renderer.load_library().await }).await {
            warn!(error = %e, "map unavailable, continuing without location picker");
            return;
        }

        let pinned = customer.coordinates.filter(Coordinates::is_valid);
        let options = MapOptions {
            center: pinned.unwrap_or(self.settings.default_center),
            zoom: if pinned.is_some() { self.settings.located_zoom } else { self.settings.default_zoom },
            max_zoom: self.settings.max_zoom,
            draggable_marker: true,
            tile_url: self.settings.tile_url.clone(),
            attribution: self.settings.attribution.clone(),
        };
        let mut map = match self.renderer.create_map(&options) {
            Ok(map) => map,
            Err(e) => {
                warn!(error = %e, "map initialisation failed");
                return;
            }
        };

        // an earlier pin wins over the device position
        if pinned.is_none() {
            match timeout(self.settings.geolocation_timeout, self.geolocator.current_position()).await {
                Ok(Ok(position)) if position.is_valid() => {
                    map.set_view(position, self.settings.located_zoom);
                    map.move_marker(position);
                    customer.set_coordinates(position);
                    debug!(%position, "centred on device position");
                }
                Ok(Ok(position)) => debug!(%position, "ignoring out-of-range device position"),
                Ok(Err(e)) => debug!(error = %e, "geolocation unavailable, keeping default centre"),
                Err(_) => debug!("geolocation timed out, keeping default centre"),
            }
        }

        info!(center = %options.center, "location picker mounted");
        self.map = Some(map);
    }

    pub fn unmount(&mut self) {
        if let Some(map) = self.map.take() {
            map.remove();
            debug!("location picker unmounted");
        }
    }

    /// Applies a map interaction to the customer's coordinates. Ignored while
    /// unmounted or for out-of-range points; returns whether it was applied.
    pub fn handle_event(&mut self, event: MapEvent, customer: &mut CustomerInfo) -> bool {
        let Some(map) = self.map.as_mut() else { return false };
        match event {
            MapEvent::MarkerDragEnd(position) if position.is_valid() => customer.set_coordinates(position),
            MapEvent::Click(position) if position.is_valid() => {
                map.move_marker(position);
                customer.set_coordinates(position);
            }
            _ => {
                warn!(?event, "ignoring map event outside valid range");
                return false;
            }
        }
        true
    }
}

impl Drop for LocationPicker {
    fn drop(&mut self) { self.unmount(); }
}
