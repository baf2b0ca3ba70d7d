//! Display-less map and geolocation for hosts without a browser (the sandbox
//! driver, tests). The renderer keeps lifecycle counters so callers can check
//! that maps are torn down.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use crate::domain::value_objects::Coordinates;
use crate::ports::{GeolocationError, Geolocator, MapError, MapInstance, MapOptions, MapRenderer};

#[derive(Debug, Default)]
struct MapState {
    library_loads: AtomicUsize,
    created: AtomicUsize,
    live: AtomicUsize,
    fail_library: AtomicBool,
    marker: Mutex<Option<Coordinates>>,
    zoom: Mutex<Option<u8>>,
}

#[derive(Debug, Clone, Default)]
pub struct HeadlessMapRenderer {
    state: Arc<MapState>,
}

impl HeadlessMapRenderer {
    pub fn new() -> Self { Self::default() }

    /// Renderer whose library never loads.
    pub fn failing() -> Self {
        let renderer = Self::default();
        renderer.state.fail_library.store(true, Ordering::SeqCst);
        renderer
    }

    pub fn library_loads(&self) -> usize { self.state.library_loads.load(Ordering::SeqCst) }
    pub fn maps_created(&self) -> usize { self.state.created.load(Ordering::SeqCst) }
    /// Maps created and not yet removed.
    pub fn live_maps(&self) -> usize { self.state.live.load(Ordering::SeqCst) }
    pub fn marker_position(&self) -> Option<Coordinates> { self.state.marker.lock().ok().and_then(|m| *m) }
    pub fn zoom(&self) -> Option<u8> { self.state.zoom.lock().ok().and_then(|z| *z) }
}

#[async_trait]
impl MapRenderer for HeadlessMapRenderer {
    async fn load_library(&self) -> Result<(), MapError> {
        self.state.library_loads.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_library.load(Ordering::SeqCst) {
            return Err(MapError::LibraryLoad("headless renderer configured to fail".into()));
        }
        Ok(())
    }

    fn create_map(&self, options: &MapOptions) -> Result<Box<dyn MapInstance>, MapError> {
        self.state.created.fetch_add(1, Ordering::SeqCst);
        self.state.live.fetch_add(1, Ordering::SeqCst);
        let mut map = HeadlessMap { state: Arc::clone(&self.state) };
        map.set_view(options.center, options.zoom);
        map.move_marker(options.center);
        Ok(Box::new(map))
    }
}

#[derive(Debug)]
pub struct HeadlessMap {
    state: Arc<MapState>,
}

impl MapInstance for HeadlessMap {
    fn set_view(&mut self, _center: Coordinates, zoom: u8) {
        if let Ok(mut z) = self.state.zoom.lock() { *z = Some(zoom); }
    }

    fn move_marker(&mut self, position: Coordinates) {
        if let Ok(mut m) = self.state.marker.lock() { *m = Some(position); }
    }

    fn remove(self: Box<Self>) {
        self.state.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Geolocator that always reports the same fix, or fails when it has none.
#[derive(Debug, Clone, Default)]
pub struct FixedGeolocator {
    position: Option<Coordinates>,
    delay: Duration,
}

impl FixedGeolocator {
    pub fn new(position: Option<Coordinates>) -> Self { Self { position, delay: Duration::ZERO } }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.position.ok_or(GeolocationError::Unavailable("no fixed position configured".into()))
    }
}
