//! Dental Billing Core Library
//!
//! In-memory billing ledger for a dental clinic: patients, the procedures
//! performed on them, the clinic identity printed on invoices, and a JSON
//! backup format for moving data between machines.
//!
//! # Architecture
//!
//! ```text
//!   UI action ──► BillingSession ──► PatientCollection (pure, returns new value)
//!                   │    │                    │
//!                   │    │            validated swap on success
//!                   │    │
//!                   │    └──► ProcedureAssistant (suggestion / image)
//!                   │              │
//!                   │      ticket + epoch check, stale responses dropped
//!                   │
//!          ┌────────┴─────────┐
//!          ▼                  ▼
//!     JSON backup        HTML invoice
//!   (export/import)    (single patient)
//! ```
//!
//! # Core Principle
//!
//! **A failed operation changes nothing.** Validation runs before any state is
//! replaced, and imports are parsed completely before the old data is dropped.
//!
//! # Modules
//!
//! - [`models`]: Record types (Patient, Procedure, ClinicInfo, AppData) and input drafts
//! - [`ledger`]: Pure patient collection and the session that owns selection and requests
//! - [`assistant`]: AI collaborator trait and request tracking
//! - [`export`]: JSON backup and invoice rendering
//! - [`config`]: Environment-driven settings
//! - [`seed`]: Default clinic and demo patients

pub mod assistant;
pub mod config;
pub mod error;
pub mod export;
pub mod ledger;
pub mod models;
pub mod seed;

// Re-export commonly used types
pub use assistant::{
    Completion, DiscardReason, ProcedureAssistant, ProcedureSuggestion, RequestKey,
};
pub use config::{BillingConfig, DigitGrouping};
pub use error::{BillingError, BillingResult, ValidationErrors};
pub use export::Invoice;
pub use ledger::{BillingSession, PatientCollection};
pub use models::{
    AppData, ClinicInfo, Patient, PatientDraft, PatientId, Procedure, ProcedureDraft,
    ProcedureId, ProcedurePatch,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum DentalBillingError {
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid data format: {0}")]
    FormatError(String),

    #[error("Assistant error: {0}")]
    AssistantError(String),

    #[error("Request already in progress: {0}")]
    Busy(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<BillingError> for DentalBillingError {
    fn from(e: BillingError) -> Self {
        match e {
            BillingError::Validation(errors) => DentalBillingError::ValidationError(errors.to_string()),
            BillingError::NotFound(what) => DentalBillingError::NotFound(what),
            BillingError::Format(msg) => DentalBillingError::FormatError(msg),
            BillingError::Collaborator(msg) => DentalBillingError::AssistantError(msg),
            BillingError::RequestInFlight(what) => DentalBillingError::Busy(what),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for DentalBillingError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        DentalBillingError::Internal(format!("Lock poisoned: {}", e))
    }
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, DentalBillingError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
        DentalBillingError::InvalidInput(format!("{field} must be YYYY-MM-DD, got {value:?}: {e}"))
    })
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Start an empty session with the default clinic.
#[uniffi::export]
pub fn new_session() -> Arc<DentalBillingCore> {
    DentalBillingCore::wrap(BillingSession::with_config(BillingConfig::from_env()))
}

/// Start a session pre-loaded with demo patients.
#[uniffi::export]
pub fn new_sample_session() -> Arc<DentalBillingCore> {
    DentalBillingCore::wrap(BillingSession::sample_with_config(BillingConfig::from_env()))
}

/// Start a session from a JSON backup.
#[uniffi::export]
pub fn open_backup(json: String) -> Result<Arc<DentalBillingCore>, DentalBillingError> {
    let data = export::backup::parse(&json)?;
    let session = BillingSession::from_app_data(data, BillingConfig::from_env())?;
    Ok(DentalBillingCore::wrap(session))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe session wrapper for FFI.
#[derive(uniffi::Object)]
pub struct DentalBillingCore {
    session: Arc<Mutex<BillingSession>>,
}

impl DentalBillingCore {
    fn wrap(session: BillingSession) -> Arc<Self> {
        Arc::new(Self {
            session: Arc::new(Mutex::new(session)),
        })
    }
}

#[uniffi::export]
impl DentalBillingCore {
    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// All patients in insertion order.
    pub fn list_patients(&self) -> Result<Vec<FfiPatient>, DentalBillingError> {
        let session = self.session.lock()?;
        Ok(session.patients().patients().iter().map(FfiPatient::from).collect())
    }

    pub fn get_patient(&self, patient_id: String) -> Result<Option<FfiPatient>, DentalBillingError> {
        let session = self.session.lock()?;
        Ok(session.patient(&PatientId::from(patient_id)).map(FfiPatient::from))
    }

    /// Add a patient and select them. `dob` is `YYYY-MM-DD`.
    pub fn add_patient(
        &self,
        name: String,
        email: String,
        dob: String,
    ) -> Result<FfiPatient, DentalBillingError> {
        let dob = parse_date("dob", &dob)?;
        let mut session = self.session.lock()?;
        let id = session.add_patient(PatientDraft::new(name, email, dob))?;
        let patient = session.patients().require(&id)?;
        Ok(patient.into())
    }

    // =========================================================================
    // Selection
    // =========================================================================

    pub fn selected_patient_id(&self) -> Result<Option<String>, DentalBillingError> {
        let session = self.session.lock()?;
        Ok(session.selected_patient_id().map(|id| id.to_string()))
    }

    pub fn select_patient(&self, patient_id: String) -> Result<(), DentalBillingError> {
        let mut session = self.session.lock()?;
        session.select_patient(&PatientId::from(patient_id))?;
        Ok(())
    }

    // =========================================================================
    // Procedure Operations
    // =========================================================================

    /// Record a procedure performed today. Returns the new procedure id.
    pub fn add_procedure(
        &self,
        patient_id: String,
        name: String,
        description: String,
        code: String,
        cost: f64,
    ) -> Result<String, DentalBillingError> {
        let draft = ProcedureDraft::new(name, code, cost).with_description(description);
        let mut session = self.session.lock()?;
        let id = session.add_procedure(&PatientId::from(patient_id), draft)?;
        Ok(id.into_inner())
    }

    /// Move a procedure to another date (`YYYY-MM-DD`).
    pub fn update_procedure_date(
        &self,
        patient_id: String,
        procedure_id: String,
        date: String,
    ) -> Result<(), DentalBillingError> {
        let date = parse_date("date", &date)?;
        let mut session = self.session.lock()?;
        session.update_procedure(
            &PatientId::from(patient_id),
            &ProcedureId::from(procedure_id),
            &ProcedurePatch::new().date(date),
        )?;
        Ok(())
    }

    /// Sum of all procedure costs for a patient.
    pub fn total_billed(&self, patient_id: String) -> Result<f64, DentalBillingError> {
        let session = self.session.lock()?;
        Ok(session.patients().require(&PatientId::from(patient_id))?.total_billed())
    }

    // =========================================================================
    // Clinic Operations
    // =========================================================================

    pub fn get_clinic_info(&self) -> Result<FfiClinicInfo, DentalBillingError> {
        let session = self.session.lock()?;
        Ok(session.clinic_info().clone().into())
    }

    pub fn set_clinic_info(&self, info: FfiClinicInfo) -> Result<(), DentalBillingError> {
        let mut session = self.session.lock()?;
        session.set_clinic_info(info.into())?;
        Ok(())
    }

    /// Encode raw logo bytes as a data URL suitable for `FfiClinicInfo::logo`.
    pub fn logo_data_url(&self, bytes: Vec<u8>, mime: String) -> Result<String, DentalBillingError> {
        let session = self.session.lock()?;
        Ok(session.logo_data_url(&bytes, &mime)?)
    }

    // =========================================================================
    // Backup / Invoice
    // =========================================================================

    pub fn export_json(&self) -> Result<String, DentalBillingError> {
        let session = self.session.lock()?;
        Ok(session.export_json()?)
    }

    /// Replace all data. On error the session is unchanged.
    pub fn import_json(&self, json: String) -> Result<(), DentalBillingError> {
        let mut session = self.session.lock()?;
        session.import_json(&json)?;
        Ok(())
    }

    pub fn invoice_html(&self, patient_id: String) -> Result<String, DentalBillingError> {
        let session = self.session.lock()?;
        Ok(session.render_invoice_html(&PatientId::from(patient_id))?)
    }

    pub fn invoice_csv(&self, patient_id: String) -> Result<String, DentalBillingError> {
        let session = self.session.lock()?;
        Ok(session.invoice(&PatientId::from(patient_id))?.to_csv())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe procedure. Dates are `YYYY-MM-DD`.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiProcedure {
    pub id: String,
    pub name: String,
    pub description: String,
    pub code: String,
    pub cost: f64,
    pub date: String,
    pub image_base64: Option<String>,
}

impl From<&Procedure> for FfiProcedure {
    fn from(procedure: &Procedure) -> Self {
        Self {
            id: procedure.id.to_string(),
            name: procedure.name.clone(),
            description: procedure.description.clone(),
            code: procedure.code.clone(),
            cost: procedure.cost,
            date: procedure.date.to_string(),
            image_base64: procedure.image.clone(),
        }
    }
}

/// FFI-safe patient with their procedures.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: String,
    pub name: String,
    pub email: String,
    pub dob: String,
    pub procedures: Vec<FfiProcedure>,
    pub total_billed: f64,
}

impl From<&Patient> for FfiPatient {
    fn from(patient: &Patient) -> Self {
        Self {
            id: patient.id.to_string(),
            name: patient.name.clone(),
            email: patient.email.clone(),
            dob: patient.dob.to_string(),
            procedures: patient.procedures.iter().map(FfiProcedure::from).collect(),
            total_billed: patient.total_billed(),
        }
    }
}

/// FFI-safe clinic identity.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiClinicInfo {
    pub name: String,
    pub address: String,
    pub logo: Option<String>,
}

impl From<ClinicInfo> for FfiClinicInfo {
    fn from(info: ClinicInfo) -> Self {
        Self {
            name: info.name,
            address: info.address,
            logo: info.logo,
        }
    }
}

impl From<FfiClinicInfo> for ClinicInfo {
    fn from(info: FfiClinicInfo) -> Self {
        ClinicInfo {
            name: info.name,
            address: info.address,
            logo: info.logo,
        }
    }
}
