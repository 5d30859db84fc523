//! Prompts for procedure suggestions and illustrations.
//!
//! Suggestion replies are constrained to a four-field JSON object matching
//! `ProcedureSuggestion`'s wire names.

/// System prompt for procedure suggestions.
pub const SYSTEM_PROMPT: &str = r#"You are a dental billing assistant for a clinic that bills in Indian Rupees (INR).

Given a short free-text description of a dental procedure, respond with:
- procedureName: A standard, patient-readable procedure name
- description: One sentence describing what was done
- suggestedCode: The closest CDT billing code (a "D" followed by four digits)
- estimatedCost: Typical fee in INR as a plain number, no currency symbol

Common codes:
- D0120 = periodic oral evaluation
- D0274 = bitewings, four radiographic images
- D1110 = prophylaxis, adult
- D2391 = resin-based composite, one surface, posterior
- D2740 = crown, porcelain/ceramic
- D3330 = endodontic therapy, molar
- D7140 = extraction, erupted tooth
- D7240 = removal of impacted tooth, completely bony

Output a single JSON object and nothing else."#;

/// User prompt for one suggestion request.
pub fn make_suggestion_prompt(description: &str) -> String {
    format!(
        r#"Suggest billing details for this dental procedure:

"{}"

Return a JSON object with exactly these fields:
- procedureName: string
- description: string
- suggestedCode: string
- estimatedCost: number (INR)"#,
        description.trim()
    )
}

/// Prompt for an illustration of a procedure.
pub fn make_image_prompt(procedure_name: &str) -> String {
    format!(
        "A clean, friendly medical illustration of the dental procedure \"{}\". \
         Simple flat style on a white background, no text, no blood, suitable for a patient invoice.",
        procedure_name.trim()
    )
}

/// JSON schema handed to models that support structured output.
pub const SUGGESTION_SCHEMA: &str = r#"{
  "type": "object",
  "properties": {
    "procedureName": { "type": "string" },
    "description": { "type": "string" },
    "suggestedCode": { "type": "string" },
    "estimatedCost": { "type": "number" }
  },
  "required": ["procedureName", "description", "suggestedCode", "estimatedCost"]
}"#;

/// Worked description/reply pairs for chat requests.
pub const FEW_SHOT_EXAMPLES: &[(&str, &str)] = &[
    (
        "filling for a back tooth, one surface",
        r#"{"procedureName":"Resin-based Composite Filling","description":"One surface, posterior tooth.","suggestedCode":"D2391","estimatedCost":20000}"#,
    ),
    (
        "routine cleaning for an adult",
        r#"{"procedureName":"Adult Prophylaxis","description":"Removal of plaque, calculus and stains from tooth structures.","suggestedCode":"D1110","estimatedCost":9500}"#,
    ),
    (
        "pulled a wisdom tooth that was stuck in the bone",
        r#"{"procedureName":"Wisdom Tooth Extraction","description":"Surgical removal of impacted third molar.","suggestedCode":"D7240","estimatedCost":35000}"#,
    ),
];
