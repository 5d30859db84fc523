//! Clinic identity shown on invoices.

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::{BillingError, BillingResult, ValidationErrors};

/// Accepted logo MIME types.
pub const LOGO_MIME_TYPES: &[&str] = &["image/png", "image/jpeg"];

/// The issuing clinic. One per session, replaced wholesale on save.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClinicInfo {
    pub name: String,
    /// Multi-line postal address; line breaks are kept for display
    pub address: String,
    /// `data:` URL of the logo image
    #[serde(default)]
    pub logo: Option<String>,
}

impl ClinicInfo {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            logo: None,
        }
    }

    pub fn with_logo(mut self, logo: impl Into<String>) -> Self {
        self.logo = Some(logo.into());
        self
    }

    /// Name and address must both be non-blank.
    pub fn validate(&self) -> BillingResult<()> {
        let mut errors = ValidationErrors::new();
        if self.name.trim().is_empty() {
            errors.push("name", "is required");
        }
        if self.address.trim().is_empty() {
            errors.push("address", "is required");
        }
        errors.into_result()
    }

    pub fn address_lines(&self) -> impl Iterator<Item = &str> {
        self.address.lines()
    }

    /// Encode an uploaded logo as a `data:` URL.
    ///
    /// Only PNG and JPEG are accepted, and the upload must not exceed
    /// `max_bytes`.
    pub fn logo_from_bytes(bytes: &[u8], mime: &str, max_bytes: usize) -> BillingResult<String> {
        if !LOGO_MIME_TYPES.contains(&mime) {
            return Err(BillingError::validation(
                "logo",
                format!("must be a PNG or JPEG image (got {mime})"),
            ));
        }
        if bytes.is_empty() {
            return Err(BillingError::validation("logo", "file is empty"));
        }
        if bytes.len() > max_bytes {
            return Err(BillingError::validation(
                "logo",
                format!("must be smaller than {} bytes", max_bytes),
            ));
        }
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        Ok(format!("data:{mime};base64,{encoded}"))
    }
}
