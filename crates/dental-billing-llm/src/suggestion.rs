//! Parsing model replies, plus an offline assistant.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use dental_billing_core::{BillingError, BillingResult, ProcedureAssistant, ProcedureSuggestion};
use thiserror::Error;

/// Errors turning a model reply into something the ledger accepts.
#[derive(Error, Debug)]
pub enum SuggestionError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid response format: {0}")]
    InvalidFormat(String),

    #[error("Inference error: {0}")]
    Inference(String),
}

pub type SuggestionResult<T> = Result<T, SuggestionError>;

impl From<SuggestionError> for BillingError {
    fn from(e: SuggestionError) -> Self {
        BillingError::Collaborator(e.to_string())
    }
}

/// Parse a model reply into a checked suggestion.
pub fn parse_suggestion_output(reply: &str) -> SuggestionResult<ProcedureSuggestion> {
    // Models sometimes wrap the object in prose or code fences
    let json_start = reply.find('{').ok_or_else(|| {
        SuggestionError::InvalidFormat("No JSON object found in response".into())
    })?;
    let json_end = reply.rfind('}').ok_or_else(|| {
        SuggestionError::InvalidFormat("No closing brace found in response".into())
    })?;
    if json_end < json_start {
        return Err(SuggestionError::InvalidFormat(
            "Closing brace precedes opening brace".into(),
        ));
    }

    let suggestion: ProcedureSuggestion = serde_json::from_str(&reply[json_start..=json_end])?;
    suggestion
        .validate()
        .map_err(|e| SuggestionError::InvalidFormat(e.to_string()))?;

    Ok(suggestion)
}

/// Clean up an image reply to bare base64.
///
/// Accepts either raw base64 or a `data:<mime>;base64,` URL, ignores
/// embedded whitespace, and checks the payload decodes.
pub fn normalize_image_output(reply: &str) -> SuggestionResult<String> {
    let trimmed = reply.trim();
    let payload = match trimmed.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(";base64,")
            .map(|(_, data)| data)
            .ok_or_else(|| SuggestionError::InvalidFormat("data URL is not base64".into()))?,
        None => trimmed,
    };

    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(SuggestionError::InvalidFormat("empty image payload".into()));
    }
    STANDARD
        .decode(&cleaned)
        .map_err(|e| SuggestionError::InvalidFormat(format!("image is not valid base64: {e}")))?;

    Ok(cleaned)
}

/// Keyword table: (keywords, name, description, code, cost in INR).
const MOCK_TABLE: &[(&[&str], &str, &str, &str, f64)] = &[
    (
        &["root canal", "endodontic"],
        "Root Canal Therapy - Molar",
        "Endodontic therapy on a molar, excluding final restoration.",
        "D3330",
        45000.0,
    ),
    (
        &["crown", "cap"],
        "Porcelain Crown",
        "Crown, porcelain/ceramic.",
        "D2740",
        60000.0,
    ),
    (
        &["wisdom", "impacted"],
        "Wisdom Tooth Extraction",
        "Surgical removal of impacted third molar.",
        "D7240",
        35000.0,
    ),
    (
        &["extract", "pull"],
        "Simple Extraction",
        "Extraction of an erupted tooth or exposed root.",
        "D7140",
        8000.0,
    ),
    (
        &["filling", "cavity", "composite"],
        "Resin-based Composite Filling",
        "One surface, posterior tooth.",
        "D2391",
        20000.0,
    ),
    (
        &["x-ray", "xray", "bitewing", "radiograph"],
        "Bitewing X-rays",
        "Four bitewing radiographic images.",
        "D0274",
        6000.0,
    ),
    (
        &["cleaning", "prophy", "scaling"],
        "Adult Prophylaxis",
        "Removal of plaque, calculus and stains from tooth structures.",
        "D1110",
        9500.0,
    ),
    (
        &["exam", "check-up", "checkup"],
        "Periodic Oral Evaluation",
        "Routine examination of an established patient.",
        "D0120",
        3000.0,
    ),
];

/// Offline assistant for demos and tests.
///
/// Suggestions come from a fixed keyword table; images are small SVG badges
/// with the procedure's initials, base64-encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockAssistant;

impl MockAssistant {
    pub fn new() -> Self {
        Self
    }

    /// Look up a suggestion by keyword.
    pub fn lookup(description: &str) -> Option<ProcedureSuggestion> {
        let lower = description.to_lowercase();
        MOCK_TABLE
            .iter()
            .find(|(keywords, ..)| keywords.iter().any(|k| lower.contains(k)))
            .map(|(_, name, desc, code, cost)| ProcedureSuggestion {
                procedure_name: name.to_string(),
                description: desc.to_string(),
                suggested_code: code.to_string(),
                estimated_cost: *cost,
            })
    }

    /// Deterministic SVG badge for a procedure name.
    pub fn badge_svg(procedure_name: &str) -> String {
        let initials: String = procedure_name
            .split_whitespace()
            .filter_map(|word| word.chars().find(|c| c.is_ascii_alphanumeric()))
            .take(2)
            .map(|c| c.to_ascii_uppercase())
            .collect();
        let hue = procedure_name
            .bytes()
            .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)))
            % 360;

        format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="64" height="64"><rect width="64" height="64" rx="8" fill="hsl({hue},55%,45%)"/><text x="32" y="41" font-family="sans-serif" font-size="24" text-anchor="middle" fill="#fff">{initials}</text></svg>"##
        )
    }
}

impl ProcedureAssistant for MockAssistant {
    fn suggest_procedure(&self, prompt: &str) -> BillingResult<ProcedureSuggestion> {
        tracing::debug!(prompt, "mock suggestion lookup");
        Self::lookup(prompt).ok_or_else(|| {
            BillingError::Collaborator(format!("no suggestion available for {:?}", prompt.trim()))
        })
    }

    fn generate_procedure_image(&self, procedure_name: &str) -> BillingResult<String> {
        if procedure_name.trim().is_empty() {
            return Err(BillingError::Collaborator(
                "cannot draw a procedure without a name".into(),
            ));
        }
        Ok(STANDARD.encode(Self::badge_svg(procedure_name)))
    }
}
