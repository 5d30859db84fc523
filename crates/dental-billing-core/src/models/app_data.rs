//! The backup/restore bundle.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::clinic::ClinicInfo;
use super::patient::Patient;
use crate::error::{BillingError, BillingResult};

/// Complete exportable state: every patient (with procedures) plus clinic info.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppData {
    pub patients: Vec<Patient>,
    pub clinic_info: ClinicInfo,
}

impl AppData {
    pub fn new(patients: Vec<Patient>, clinic_info: ClinicInfo) -> Self {
        Self {
            patients,
            clinic_info,
        }
    }

    /// Check the collection invariants a well-formed bundle must hold.
    ///
    /// Failures are format errors: the bundle came from outside and is
    /// rejected whole.
    pub fn check_invariants(&self) -> BillingResult<()> {
        let mut patient_ids = HashSet::new();
        for patient in &self.patients {
            if !patient_ids.insert(&patient.id) {
                return Err(BillingError::Format(format!(
                    "duplicate patient id {}",
                    patient.id
                )));
            }

            let mut procedure_ids = HashSet::new();
            for procedure in &patient.procedures {
                if !procedure_ids.insert(&procedure.id) {
                    return Err(BillingError::Format(format!(
                        "duplicate procedure id {} for patient {}",
                        procedure.id, patient.id
                    )));
                }
                if !procedure.cost.is_finite() || procedure.cost < 0.0 {
                    return Err(BillingError::Format(format!(
                        "procedure {} has invalid cost {}",
                        procedure.id, procedure.cost
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn procedure_count(&self) -> usize {
        self.patients.iter().map(|p| p.procedures.len()).sum()
    }
}
