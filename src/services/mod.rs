pub mod location_picker;
pub mod order_submission;
pub mod orchestrator;
pub mod payment_session;
pub mod resource;
