//! Patient models.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ids::{PatientId, ProcedureId};
use super::procedure::Procedure;
use crate::error::{BillingError, BillingResult, ValidationErrors};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("valid email pattern"));

/// A billing subject and their procedure history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Minted at creation, never changes
    pub id: PatientId,
    /// Full name
    pub name: String,
    /// Contact address, checked against a basic pattern on creation
    pub email: String,
    /// Date of birth
    pub dob: NaiveDate,
    /// History in insertion order
    pub procedures: Vec<Procedure>,
}

impl Patient {
    pub fn procedure(&self, id: &ProcedureId) -> Option<&Procedure> {
        self.procedures.iter().find(|p| &p.id == id)
    }

    pub(crate) fn procedure_mut(&mut self, id: &ProcedureId) -> Option<&mut Procedure> {
        self.procedures.iter_mut().find(|p| &p.id == id)
    }

    /// Sum of all procedure costs.
    pub fn total_billed(&self) -> f64 {
        self.procedures.iter().map(|p| p.cost).sum()
    }

    pub fn has_procedures(&self) -> bool {
        !self.procedures.is_empty()
    }
}

/// Form input for a new patient.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientDraft {
    pub name: String,
    pub email: String,
    pub dob: Option<NaiveDate>,
}

impl PatientDraft {
    pub fn new(name: impl Into<String>, email: impl Into<String>, dob: NaiveDate) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            dob: Some(dob),
        }
    }

    /// Check name, email and date of birth, reporting every problem found.
    pub fn validate(&self) -> BillingResult<()> {
        let mut errors = ValidationErrors::new();
        if self.name.trim().is_empty() {
            errors.push("name", "is required");
        }
        if self.email.trim().is_empty() {
            errors.push("email", "is required");
        } else if !is_valid_email(&self.email) {
            errors.push("email", "is not a valid address");
        }
        if self.dob.is_none() {
            errors.push("dob", "is required");
        }
        errors.into_result()
    }

    /// Validate, then mint an id and attach an empty history.
    pub(crate) fn into_patient(self) -> BillingResult<Patient> {
        self.validate()?;
        let dob = self
            .dob
            .ok_or_else(|| BillingError::validation("dob", "is required"))?;
        Ok(Patient {
            id: PatientId::mint(),
            name: self.name,
            email: self.email,
            dob,
            procedures: Vec::new(),
        })
    }
}

/// Basic `something@something.something` check.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}
