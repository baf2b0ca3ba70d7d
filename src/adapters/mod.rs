//! Concrete implementations of the checkout ports
pub mod headless;
pub mod http;

pub use headless::{FixedGeolocator, HeadlessMapRenderer};
pub use http::HttpStoreApi;
