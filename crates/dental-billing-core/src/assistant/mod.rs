//! Boundary to the external AI assistant.
//!
//! The assistant pre-fills the procedure form from a free-text description
//! and draws illustration images for procedures. Both calls are fallible and
//! go through [`ProcedureAssistant`] so tests and demos can stub them without
//! a network.

mod requests;

pub use requests::*;

use serde::{Deserialize, Serialize};

use crate::error::{BillingError, BillingResult, ValidationErrors};
use crate::models::{check_cost, ProcedureDraft};

/// Structured pre-fill returned by the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcedureSuggestion {
    pub procedure_name: String,
    pub description: String,
    pub suggested_code: String,
    pub estimated_cost: f64,
}

impl ProcedureSuggestion {
    /// Reject suggestions that would not produce a valid procedure draft.
    pub fn validate(&self) -> BillingResult<()> {
        let mut errors = ValidationErrors::new();
        if self.procedure_name.trim().is_empty() {
            errors.push("procedureName", "is empty");
        }
        if self.suggested_code.trim().is_empty() {
            errors.push("suggestedCode", "is empty");
        }
        check_cost(&mut errors, self.estimated_cost);

        errors
            .into_result()
            .map_err(|e| BillingError::Collaborator(format!("malformed suggestion: {e}")))
    }

    pub fn into_draft(self) -> ProcedureDraft {
        ProcedureDraft {
            name: self.procedure_name,
            description: self.description,
            code: self.suggested_code,
            cost: Some(self.estimated_cost),
        }
    }
}

/// The external suggestion / image service.
pub trait ProcedureAssistant {
    /// Suggest name, description, billing code and estimated cost for a
    /// free-text procedure description.
    fn suggest_procedure(&self, prompt: &str) -> BillingResult<ProcedureSuggestion>;

    /// Generate an illustration for a procedure, returned as base64 image data.
    fn generate_procedure_image(&self, procedure_name: &str) -> BillingResult<String>;
}

impl<T: ProcedureAssistant + ?Sized> ProcedureAssistant for &T {
    fn suggest_procedure(&self, prompt: &str) -> BillingResult<ProcedureSuggestion> {
        (**self).suggest_procedure(prompt)
    }

    fn generate_procedure_image(&self, procedure_name: &str) -> BillingResult<String> {
        (**self).generate_procedure_image(procedure_name)
    }
}

/// Normalize any failure coming back from the assistant to `Collaborator`.
pub(crate) fn collaborator_error(err: BillingError) -> BillingError {
    match err {
        BillingError::Collaborator(_) => err,
        other => BillingError::Collaborator(other.to_string()),
    }
}
