//! Procedure models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ids::ProcedureId;
use crate::error::{BillingResult, ValidationErrors};

/// One billable dental service performed on a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Procedure {
    /// Minted at creation, never changes
    pub id: ProcedureId,
    /// Procedure name (e.g. "Bitewing X-rays")
    pub name: String,
    /// Free-text clinical description
    pub description: String,
    /// Billing code, free text (e.g. "D0274")
    pub code: String,
    /// Non-negative amount in the session currency
    pub cost: f64,
    /// Date of service
    pub date: NaiveDate,
    /// Base64 illustration, attached after creation
    #[serde(
        rename = "imageBase64",
        alias = "image",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub image: Option<String>,
}

impl Procedure {
    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }
}

/// Form input for a new procedure.
///
/// `cost` is optional here because an untouched form has no cost yet; a
/// draft is only accepted once it is present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcedureDraft {
    pub name: String,
    pub description: String,
    pub code: String,
    pub cost: Option<f64>,
}

impl ProcedureDraft {
    pub fn new(name: impl Into<String>, code: impl Into<String>, cost: f64) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            code: code.into(),
            cost: Some(cost),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// True for an untouched form.
    pub fn is_blank(&self) -> bool {
        self.name.trim().is_empty()
            && self.description.trim().is_empty()
            && self.code.trim().is_empty()
            && self.cost.is_none()
    }

    /// Check name, billing code and cost, reporting every problem found.
    pub fn validate(&self) -> BillingResult<()> {
        let mut errors = ValidationErrors::new();
        check_required(&mut errors, "name", &self.name);
        check_required(&mut errors, "code", &self.code);
        match self.cost {
            None => errors.push("cost", "is required"),
            Some(cost) => check_cost(&mut errors, cost),
        }
        errors.into_result()
    }

    /// Validate, then mint an id and stamp the given date of service.
    pub(crate) fn into_procedure(self, date: NaiveDate) -> BillingResult<Procedure> {
        self.validate()?;
        Ok(Procedure {
            id: ProcedureId::mint(),
            name: self.name,
            description: self.description,
            code: self.code,
            cost: self.cost.unwrap_or_default(),
            date,
            image: None,
        })
    }
}

/// Partial update for an existing procedure. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcedurePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub code: Option<String>,
    pub cost: Option<f64>,
    pub date: Option<NaiveDate>,
    /// `Some(None)` removes the image
    pub image: Option<Option<String>>,
}

impl ProcedurePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(Some(image.into()));
        self
    }

    pub fn clear_image(mut self) -> Self {
        self.image = Some(None);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Supplied fields must satisfy the same rules as on creation.
    pub fn validate(&self) -> BillingResult<()> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = &self.name {
            check_required(&mut errors, "name", name);
        }
        if let Some(code) = &self.code {
            check_required(&mut errors, "code", code);
        }
        if let Some(cost) = self.cost {
            check_cost(&mut errors, cost);
        }
        errors.into_result()
    }

    /// Overwrite the supplied fields on `procedure`.
    pub fn apply_to(&self, procedure: &mut Procedure) {
        if let Some(name) = &self.name {
            procedure.name.clone_from(name);
        }
        if let Some(description) = &self.description {
            procedure.description.clone_from(description);
        }
        if let Some(code) = &self.code {
            procedure.code.clone_from(code);
        }
        if let Some(cost) = self.cost {
            procedure.cost = cost;
        }
        if let Some(date) = self.date {
            procedure.date = date;
        }
        if let Some(image) = &self.image {
            procedure.image.clone_from(image);
        }
    }
}

fn check_required(errors: &mut ValidationErrors, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.push(field, "is required");
    }
}

pub(crate) fn check_cost(errors: &mut ValidationErrors, cost: f64) {
    if !cost.is_finite() {
        errors.push("cost", "must be a number");
    } else if cost < 0.0 {
        errors.push("cost", "must not be negative");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_procedure() -> Procedure {
        Procedure {
            id: ProcedureId::from("proc1"),
            name: "Annual Check-up & Cleaning".into(),
            description: "Routine examination, scaling, and polishing.".into(),
            code: "D0120".into(),
            cost: 12000.0,
            date: date(2024, 7, 10),
            image: None,
        }
    }

    #[test]
    fn test_draft_validation_names_all_fields() {
        let draft = ProcedureDraft::default();
        let err = draft.validate().unwrap_err();
        let fields = err.validation_errors().unwrap().fields();
        assert_eq!(fields, vec!["name", "code", "cost"]);
    }

    #[test]
    fn test_draft_rejects_negative_and_nan_cost() {
        let err = ProcedureDraft::new("Filling", "D2391", -1.0)
            .validate()
            .unwrap_err();
        assert!(err.validation_errors().unwrap().has_field("cost"));

        let err = ProcedureDraft::new("Filling", "D2391", f64::NAN)
            .validate()
            .unwrap_err();
        assert!(err.validation_errors().unwrap().has_field("cost"));
    }

    #[test]
    fn test_description_is_optional() {
        let draft = ProcedureDraft::new("Filling", "D2391", 0.0);
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_into_procedure_stamps_date() {
        let procedure = ProcedureDraft::new("Cleaning", "D0120", 12000.0)
            .into_procedure(date(2025, 1, 2))
            .unwrap();
        assert_eq!(procedure.date, date(2025, 1, 2));
        assert!(procedure.id.as_str().starts_with("proc_"));
        assert!(procedure.image.is_none());
    }

    #[test]
    fn test_patch_applies_only_supplied_fields() {
        let mut procedure = make_procedure();
        let patch = ProcedurePatch::new().date(date(2024, 8, 1));
        patch.apply_to(&mut procedure);

        assert_eq!(procedure.date, date(2024, 8, 1));
        assert_eq!(procedure.name, "Annual Check-up & Cleaning");
        assert_eq!(procedure.cost, 12000.0);
    }

    #[test]
    fn test_patch_image_set_and_clear() {
        let mut procedure = make_procedure();
        ProcedurePatch::new().image("aGVsbG8=").apply_to(&mut procedure);
        assert_eq!(procedure.image.as_deref(), Some("aGVsbG8="));

        ProcedurePatch::new().clear_image().apply_to(&mut procedure);
        assert!(procedure.image.is_none());
    }

    #[test]
    fn test_patch_validation() {
        assert!(ProcedurePatch::new().name("  ").validate().is_err());
        assert!(ProcedurePatch::new().cost(-5.0).validate().is_err());
        assert!(ProcedurePatch::new().cost(5.0).validate().is_ok());
        assert!(ProcedurePatch::new().is_empty());
    }

    #[test]
    fn test_wire_format() {
        let mut procedure = make_procedure();
        let json = serde_json::to_string(&procedure).unwrap();
        assert!(json.contains("\"date\":\"2024-07-10\""));
        assert!(!json.contains("imageBase64"));

        procedure.image = Some("abc".into());
        let json = serde_json::to_string(&procedure).unwrap();
        assert!(json.contains("\"imageBase64\":\"abc\""));
    }

    #[test]
    fn test_image_alias_accepted() {
        let json = r#"{"id":"x","name":"n","description":"","code":"c","cost":1,"date":"2024-01-01","image":"zz"}"#;
        let procedure: Procedure = serde_json::from_str(json).unwrap();
        assert_eq!(procedure.image.as_deref(), Some("zz"));
    }
}
