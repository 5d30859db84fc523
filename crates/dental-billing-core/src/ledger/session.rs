//! The session state owner.

use std::path::Path;

use chrono::{NaiveDate, Utc};

use super::collection::PatientCollection;
use crate::assistant::{
    collaborator_error, Completion, DiscardReason, ImageTicket, ProcedureAssistant,
    ProcedureSuggestion, RequestKey, RequestTracker, SuggestionTicket,
};
use crate::config::BillingConfig;
use crate::error::{BillingError, BillingResult};
use crate::export::{backup, Invoice};
use crate::models::{
    AppData, ClinicInfo, Patient, PatientDraft, PatientId, ProcedureDraft, ProcedureId,
    ProcedurePatch,
};
use crate::seed;

/// All in-memory state for one billing session.
///
/// The host UI holds one of these and routes every user action through it.
/// Collection changes go through the pure functions on
/// [`PatientCollection`]; the session swaps in the returned value only on
/// success, so a failed call never leaves partial changes behind.
#[derive(Debug)]
pub struct BillingSession {
    config: BillingConfig,
    patients: PatientCollection,
    clinic_info: ClinicInfo,
    selection: Option<PatientId>,
    procedure_draft: ProcedureDraft,
    /// Bumped whenever an import replaces the data
    epoch: u64,
    requests: RequestTracker,
}

impl Default for BillingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl BillingSession {
    /// Empty session with the default clinic and configuration.
    pub fn new() -> Self {
        Self::with_config(BillingConfig::default())
    }

    pub fn with_config(config: BillingConfig) -> Self {
        Self {
            config,
            patients: PatientCollection::new(),
            clinic_info: seed::default_clinic_info(),
            selection: None,
            procedure_draft: ProcedureDraft::default(),
            epoch: 0,
            requests: RequestTracker::new(),
        }
    }

    /// Session pre-loaded with the demo patients, first one selected.
    pub fn with_sample_data() -> Self {
        Self::sample_with_config(BillingConfig::default())
    }

    pub fn sample_with_config(config: BillingConfig) -> Self {
        let mut session = Self::with_config(config);
        session.patients = PatientCollection::from_patients(seed::sample_patients());
        session.selection = session.patients.first().map(|p| p.id.clone());
        session
    }

    /// Session over an existing bundle, first patient selected.
    pub fn from_app_data(data: AppData, config: BillingConfig) -> BillingResult<Self> {
        data.check_invariants()?;
        let mut session = Self::with_config(config);
        session.replace_data(data);
        Ok(session)
    }

    pub fn config(&self) -> &BillingConfig {
        &self.config
    }

    pub fn patients(&self) -> &PatientCollection {
        &self.patients
    }

    pub fn patient(&self, id: &PatientId) -> Option<&Patient> {
        self.patients.get(id)
    }

    pub fn clinic_info(&self) -> &ClinicInfo {
        &self.clinic_info
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// The focused patient's id, if it still names a patient.
    pub fn selected_patient_id(&self) -> Option<&PatientId> {
        self.selection
            .as_ref()
            .filter(|id| self.patients.contains(id))
    }

    pub fn selected_patient(&self) -> Option<&Patient> {
        self.selection.as_ref().and_then(|id| self.patients.get(id))
    }

    /// Focus a patient. Moving to a different patient clears the procedure form.
    pub fn select_patient(&mut self, id: &PatientId) -> BillingResult<()> {
        self.patients.require(id)?;
        if self.selection.as_ref() != Some(id) {
            self.selection = Some(id.clone());
            self.procedure_draft = ProcedureDraft::default();
        }
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
        self.procedure_draft = ProcedureDraft::default();
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add a patient and focus them.
    pub fn add_patient(&mut self, draft: PatientDraft) -> BillingResult<PatientId> {
        let (next, id) = self.patients.add_patient(draft)?;
        self.patients = next;
        self.selection = Some(id.clone());
        self.procedure_draft = ProcedureDraft::default();
        tracing::info!(patient_id = %id, "patient added");
        Ok(id)
    }

    /// Add a procedure dated today (UTC).
    pub fn add_procedure(
        &mut self,
        patient_id: &PatientId,
        draft: ProcedureDraft,
    ) -> BillingResult<ProcedureId> {
        self.add_procedure_on(patient_id, draft, Utc::now().date_naive())
    }

    pub fn add_procedure_on(
        &mut self,
        patient_id: &PatientId,
        draft: ProcedureDraft,
        date: NaiveDate,
    ) -> BillingResult<ProcedureId> {
        let (next, id) = self.patients.add_procedure(patient_id, draft, date)?;
        self.patients = next;
        tracing::info!(patient_id = %patient_id, procedure_id = %id, %date, "procedure added");
        Ok(id)
    }

    pub fn update_procedure(
        &mut self,
        patient_id: &PatientId,
        procedure_id: &ProcedureId,
        patch: &ProcedurePatch,
    ) -> BillingResult<()> {
        self.patients = self
            .patients
            .update_procedure(patient_id, procedure_id, patch)?;
        tracing::debug!(patient_id = %patient_id, procedure_id = %procedure_id, "procedure updated");
        Ok(())
    }

    /// Replace the clinic identity wholesale.
    pub fn set_clinic_info(&mut self, info: ClinicInfo) -> BillingResult<()> {
        info.validate()?;
        self.clinic_info = info;
        tracing::info!("clinic info saved");
        Ok(())
    }

    /// Encode an uploaded logo under this session's size limit.
    pub fn logo_data_url(&self, bytes: &[u8], mime: &str) -> BillingResult<String> {
        ClinicInfo::logo_from_bytes(bytes, mime, self.config.max_logo_bytes)
    }

    // =========================================================================
    // Procedure form
    // =========================================================================

    pub fn procedure_draft(&self) -> &ProcedureDraft {
        &self.procedure_draft
    }

    pub fn set_procedure_draft(&mut self, draft: ProcedureDraft) {
        self.procedure_draft = draft;
    }

    /// Add the form contents to the focused patient and reset the form.
    /// The form is kept on failure so the user can correct it.
    pub fn submit_procedure_draft(&mut self) -> BillingResult<ProcedureId> {
        let patient_id = self
            .selected_patient_id()
            .cloned()
            .ok_or_else(|| BillingError::NotFound("no patient selected".into()))?;
        let id = self.add_procedure(&patient_id, self.procedure_draft.clone())?;
        self.procedure_draft = ProcedureDraft::default();
        Ok(id)
    }

    // =========================================================================
    // Backup / restore
    // =========================================================================

    pub fn app_data(&self) -> AppData {
        AppData::new(self.patients.patients().to_vec(), self.clinic_info.clone())
    }

    pub fn export_json(&self) -> BillingResult<String> {
        backup::to_json(&self.app_data())
    }

    /// Replace all data from a backup document.
    ///
    /// On any error the session is left exactly as it was.
    pub fn import_json(&mut self, json: &str) -> BillingResult<()> {
        match backup::parse(json) {
            Ok(data) => {
                self.replace_data(data);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "import rejected");
                Err(err)
            }
        }
    }

    pub fn export_to_file<P: AsRef<Path>>(&self, path: P) -> BillingResult<()> {
        backup::write_backup(path, &self.app_data())
    }

    pub fn import_from_file<P: AsRef<Path>>(&mut self, path: P) -> BillingResult<()> {
        match backup::read_backup(path) {
            Ok(data) => {
                self.replace_data(data);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "import rejected");
                Err(err)
            }
        }
    }

    fn replace_data(&mut self, data: AppData) {
        let AppData {
            patients,
            clinic_info,
        } = data;
        self.patients = PatientCollection::from_patients(patients);
        self.clinic_info = clinic_info;
        self.selection = self.patients.first().map(|p| p.id.clone());
        self.procedure_draft = ProcedureDraft::default();
        // Outstanding tickets are stale now; their completions are discarded
        self.requests.clear();
        self.epoch += 1;
        tracing::info!(
            patients = self.patients.len(),
            epoch = self.epoch,
            "data imported"
        );
    }

    // =========================================================================
    // Invoices
    // =========================================================================

    pub fn invoice(&self, patient_id: &PatientId) -> BillingResult<Invoice> {
        let patient = self.patients.require(patient_id)?;
        Ok(Invoice::build(patient, &self.clinic_info, Utc::now()))
    }

    pub fn render_invoice_html(&self, patient_id: &PatientId) -> BillingResult<String> {
        Ok(self.invoice(patient_id)?.to_html(&self.config))
    }

    // =========================================================================
    // Assistant requests
    // =========================================================================

    pub fn is_request_open(&self, key: &RequestKey) -> bool {
        self.requests.is_open(key)
    }

    /// Give up on an open request whose ticket will never be completed.
    /// Returns false if nothing was open for `key`.
    pub fn abandon_request(&mut self, key: &RequestKey) -> bool {
        let abandoned = self.requests.abandon(key);
        if abandoned {
            tracing::debug!(request = %key, "assistant request abandoned");
        }
        abandoned
    }

    /// Open a suggestion request for the focused patient's procedure form.
    pub fn begin_suggestion(&mut self, prompt: &str) -> BillingResult<SuggestionTicket> {
        if prompt.trim().is_empty() {
            return Err(BillingError::validation("prompt", "is required"));
        }
        let patient_id = self
            .selected_patient_id()
            .cloned()
            .ok_or_else(|| BillingError::NotFound("no patient selected".into()))?;
        let serial = self.requests.begin(RequestKey::Suggestion)?;

        Ok(SuggestionTicket {
            serial,
            epoch: self.epoch,
            patient_id,
            prompt: prompt.to_string(),
        })
    }

    /// Apply a suggestion to the procedure form.
    ///
    /// The whole form is replaced or nothing is. Responses for a patient the
    /// user has since left, or for data replaced by an import, are dropped.
    pub fn complete_suggestion(
        &mut self,
        ticket: SuggestionTicket,
        result: BillingResult<ProcedureSuggestion>,
    ) -> BillingResult<Completion> {
        let finished = self.requests.finish(&RequestKey::Suggestion, ticket.serial);
        if ticket.epoch != self.epoch {
            return Ok(self.discard(&RequestKey::Suggestion, DiscardReason::DataReplaced));
        }
        if !finished {
            return Ok(self.discard(&RequestKey::Suggestion, DiscardReason::Superseded));
        }
        if self.selection.as_ref() != Some(&ticket.patient_id) {
            return Ok(self.discard(&RequestKey::Suggestion, DiscardReason::SelectionChanged));
        }

        let suggestion = result.map_err(|err| {
            tracing::warn!(error = %err, "procedure suggestion failed");
            collaborator_error(err)
        })?;
        suggestion.validate()?;

        self.procedure_draft = suggestion.into_draft();
        Ok(Completion::Applied)
    }

    /// Begin, call the assistant, and complete in one step.
    pub fn run_suggestion<A>(&mut self, assistant: &A, prompt: &str) -> BillingResult<Completion>
    where
        A: ProcedureAssistant + ?Sized,
    {
        let ticket = self.begin_suggestion(prompt)?;
        let result = assistant.suggest_procedure(&ticket.prompt);
        self.complete_suggestion(ticket, result)
    }

    /// Open an image request for one procedure.
    pub fn begin_image(
        &mut self,
        patient_id: &PatientId,
        procedure_id: &ProcedureId,
    ) -> BillingResult<ImageTicket> {
        let procedure = self
            .patients
            .procedure(patient_id, procedure_id)
            .ok_or_else(|| {
                BillingError::NotFound(format!("procedure {procedure_id} for patient {patient_id}"))
            })?;
        let procedure_name = procedure.name.clone();

        let serial = self.requests.begin(RequestKey::Image {
            patient_id: patient_id.clone(),
            procedure_id: procedure_id.clone(),
        })?;

        Ok(ImageTicket {
            serial,
            epoch: self.epoch,
            patient_id: patient_id.clone(),
            procedure_id: procedure_id.clone(),
            procedure_name,
        })
    }

    /// Attach a generated image to its procedure.
    ///
    /// Image requests name their target explicitly, so they survive
    /// navigation; only an intervening import makes them stale.
    pub fn complete_image(
        &mut self,
        ticket: ImageTicket,
        result: BillingResult<String>,
    ) -> BillingResult<Completion> {
        let key = ticket.key();
        let finished = self.requests.finish(&key, ticket.serial);
        if ticket.epoch != self.epoch {
            return Ok(self.discard(&key, DiscardReason::DataReplaced));
        }
        if !finished {
            return Ok(self.discard(&key, DiscardReason::Superseded));
        }

        let image = result.map_err(|err| {
            tracing::warn!(error = %err, procedure_id = %ticket.procedure_id, "image generation failed");
            collaborator_error(err)
        })?;
        if image.trim().is_empty() {
            return Err(BillingError::Collaborator("assistant returned no image data".into()));
        }

        self.update_procedure(
            &ticket.patient_id,
            &ticket.procedure_id,
            &ProcedurePatch::new().image(image),
        )?;
        Ok(Completion::Applied)
    }

    pub fn run_image<A>(
        &mut self,
        assistant: &A,
        patient_id: &PatientId,
        procedure_id: &ProcedureId,
    ) -> BillingResult<Completion>
    where
        A: ProcedureAssistant + ?Sized,
    {
        let ticket = self.begin_image(patient_id, procedure_id)?;
        let result = assistant.generate_procedure_image(&ticket.procedure_name);
        self.complete_image(ticket, result)
    }

    fn discard(&self, key: &RequestKey, reason: DiscardReason) -> Completion {
        tracing::debug!(request = %key, ?reason, "discarding stale assistant response");
        Completion::Discarded(reason)
    }
}
