//! Customer details captured by the checkout form

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};
use crate::domain::value_objects::Coordinates;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct CustomerInfo {
    #[validate(custom = "not_blank")]
    pub name: String,
    #[validate(custom = "not_blank")]
    pub phone: String,
    /// Free-text delivery address.
    #[validate(custom = "not_blank")]
    pub address: String,
    /// Never checked; only forwarded to the payment gateway.
    pub email: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub notes: Option<String>,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

impl CustomerInfo {
    /// Name, phone and address present; gates progression to payment.
    pub fn is_complete(&self) -> bool { self.validate().is_ok() }

    pub fn set_coordinates(&mut self, position: Coordinates) { self.coordinates = Some(position); }

    /// Email handed to the payment gateway; guests without one get a phone-based handle.
    pub fn contact_email(&self, guest_domain: &str) -> String {
        match self.email.as_deref().map(str::trim) {
            Some(email) if !email.is_empty() => email.to_string(),
            _ => format!("{}@{}", self.phone.trim(), guest_domain),
        }
    }
}
