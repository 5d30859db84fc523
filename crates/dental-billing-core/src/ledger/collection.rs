//! Immutable patient collection and its pure mutations.
//!
//! Every mutation borrows the current collection and returns a new one. The
//! receiver is never touched, so a caller holding an older collection can keep
//! using it (undo history, diffing, rejected-import rollback).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{BillingError, BillingResult};
use crate::models::{
    Patient, PatientDraft, PatientId, Procedure, ProcedureDraft, ProcedureId, ProcedurePatch,
};

/// Ordered set of patients with unique ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientCollection {
    patients: Vec<Patient>,
}

impl PatientCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap already-validated patients (e.g. a checked import bundle).
    pub fn from_patients(patients: Vec<Patient>) -> Self {
        Self { patients }
    }

    pub fn into_patients(self) -> Vec<Patient> {
        self.patients
    }

    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    pub fn len(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }

    pub fn get(&self, id: &PatientId) -> Option<&Patient> {
        self.patients.iter().find(|p| &p.id == id)
    }

    pub fn contains(&self, id: &PatientId) -> bool {
        self.get(id).is_some()
    }

    pub fn first(&self) -> Option<&Patient> {
        self.patients.first()
    }

    /// Look up a patient or fail with `NotFound`.
    pub fn require(&self, id: &PatientId) -> BillingResult<&Patient> {
        self.get(id)
            .ok_or_else(|| BillingError::NotFound(format!("patient {id}")))
    }

    pub fn procedure(&self, patient_id: &PatientId, procedure_id: &ProcedureId) -> Option<&Procedure> {
        self.get(patient_id)?.procedure(procedure_id)
    }

    /// Append a new patient built from `draft`.
    ///
    /// Returns the new collection together with the minted id, which callers
    /// use as the next selection.
    pub fn add_patient(&self, draft: PatientDraft) -> BillingResult<(Self, PatientId)> {
        let patient = draft.into_patient()?;
        let id = patient.id.clone();

        let mut next = self.clone();
        next.patients.push(patient);
        Ok((next, id))
    }

    /// Append a procedure dated `date` to one patient's history.
    pub fn add_procedure(
        &self,
        patient_id: &PatientId,
        draft: ProcedureDraft,
        date: NaiveDate,
    ) -> BillingResult<(Self, ProcedureId)> {
        let index = self.index_of(patient_id)?;
        let procedure = draft.into_procedure(date)?;
        let id = procedure.id.clone();

        let mut next = self.clone();
        next.patients[index].procedures.push(procedure);
        Ok((next, id))
    }

    /// Apply a partial update to one procedure.
    ///
    /// Succeeds when the patch changes nothing; applying the same patch twice
    /// yields the same record.
    pub fn update_procedure(
        &self,
        patient_id: &PatientId,
        procedure_id: &ProcedureId,
        patch: &ProcedurePatch,
    ) -> BillingResult<Self> {
        let index = self.index_of(patient_id)?;
        if self.patients[index].procedure(procedure_id).is_none() {
            return Err(BillingError::NotFound(format!(
                "procedure {procedure_id} for patient {patient_id}"
            )));
        }
        patch.validate()?;

        let mut next = self.clone();
        if let Some(procedure) = next.patients[index].procedure_mut(procedure_id) {
            patch.apply_to(procedure);
        }
        Ok(next)
    }

    fn index_of(&self, id: &PatientId) -> BillingResult<usize> {
        self.patients
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| BillingError::NotFound(format!("patient {id}")))
    }
}

impl<'a> IntoIterator for &'a PatientCollection {
    type Item = &'a Patient;
    type IntoIter = std::slice::Iter<'a, Patient>;

    fn into_iter(self) -> Self::IntoIter {
        self.patients.iter()
    }
}
