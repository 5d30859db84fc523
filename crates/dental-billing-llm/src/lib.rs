//! Language-model side of the procedure assistant.
//!
//! This crate builds the prompts sent to a hosted model, parses its replies
//! into [`dental_billing_core::ProcedureSuggestion`] values, and ships an
//! offline [`MockAssistant`] for demos and tests.

pub mod prompts;
pub mod suggestion;

pub use prompts::*;
pub use suggestion::*;
