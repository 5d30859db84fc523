//! End-to-end session workflows.

use chrono::{NaiveDate, Utc};
use dental_billing_core::assistant::SuggestionTicket;
use dental_billing_core::{
    BillingError, BillingResult, BillingSession, ClinicInfo, Completion, DiscardReason,
    PatientDraft, PatientId, ProcedureAssistant, ProcedureDraft, ProcedureId, ProcedurePatch,
    ProcedureSuggestion, RequestKey,
};
use regex::Regex;

/// Assistant stub with canned answers.
struct CannedAssistant {
    suggestion: ProcedureSuggestion,
    image: String,
}

impl CannedAssistant {
    fn new() -> Self {
        Self {
            suggestion: ProcedureSuggestion {
                procedure_name: "Prophylaxis - Adult".into(),
                description: "Removal of plaque, calculus and stains.".into(),
                suggested_code: "D1110".into(),
                estimated_cost: 9500.0,
            },
            image: "iVBORw0KGgo=".into(),
        }
    }
}

impl ProcedureAssistant for CannedAssistant {
    fn suggest_procedure(&self, _prompt: &str) -> BillingResult<ProcedureSuggestion> {
        Ok(self.suggestion.clone())
    }

    fn generate_procedure_image(&self, _procedure_name: &str) -> BillingResult<String> {
        Ok(self.image.clone())
    }
}

struct FailingAssistant;

impl ProcedureAssistant for FailingAssistant {
    fn suggest_procedure(&self, _prompt: &str) -> BillingResult<ProcedureSuggestion> {
        Err(BillingError::Collaborator("service unavailable".into()))
    }

    fn generate_procedure_image(&self, _procedure_name: &str) -> BillingResult<String> {
        Err(BillingError::Format("unexpected payload".into()))
    }
}

fn eleanor() -> PatientId {
    PatientId::from("p1")
}

#[test]
fn test_add_cleaning_for_eleanor() {
    let mut session = BillingSession::new();
    let id = session
        .add_patient(PatientDraft::new(
            "Eleanor Vance",
            "eleanor.v@example.com",
            NaiveDate::from_ymd_opt(1985, 5, 22).unwrap(),
        ))
        .unwrap();

    let before = Utc::now().date_naive();
    session
        .add_procedure(&id, ProcedureDraft::new("Cleaning", "D0120", 12000.0))
        .unwrap();
    let after = Utc::now().date_naive();

    let patient = session.patient(&id).unwrap();
    assert_eq!(patient.procedures.len(), 1);
    let date = patient.procedures[0].date;
    assert!(date == before || date == after);
    assert_eq!(patient.total_billed(), 12000.0);
}

#[test]
fn test_add_patient_validation_reports_fields() {
    let mut session = BillingSession::new();
    let err = session
        .add_patient(PatientDraft {
            name: "  ".into(),
            email: "no-at-sign".into(),
            dob: None,
        })
        .unwrap_err();

    let fields = err.validation_errors().unwrap().fields();
    assert_eq!(fields, vec!["name", "email", "dob"]);
    assert!(session.patients().is_empty());
}

#[test]
fn test_add_procedure_unknown_patient() {
    let mut session = BillingSession::with_sample_data();
    let err = session
        .add_procedure(
            &PatientId::from("missing"),
            ProcedureDraft::new("Exam", "D0150", 100.0),
        )
        .unwrap_err();
    assert!(matches!(err, BillingError::NotFound(_)));
}

#[test]
fn test_update_procedure_date_only() {
    let mut session = BillingSession::with_sample_data();
    let new_date = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
    session
        .update_procedure(
            &eleanor(),
            &ProcedureId::from("proc2"),
            &ProcedurePatch::new().date(new_date),
        )
        .unwrap();

    let patient = session.patient(&eleanor()).unwrap();
    assert_eq!(patient.procedures[1].date, new_date);
    assert_eq!(patient.procedures[1].cost, 6000.0);
    assert_eq!(patient.procedures[0].date, NaiveDate::from_ymd_opt(2024, 7, 10).unwrap());
}

#[test]
fn test_update_unknown_procedure() {
    let mut session = BillingSession::with_sample_data();
    let err = session
        .update_procedure(
            &eleanor(),
            &ProcedureId::from("proc3"),
            &ProcedurePatch::new().cost(1.0),
        )
        .unwrap_err();
    // proc3 belongs to Marcus, not Eleanor
    assert!(matches!(err, BillingError::NotFound(_)));
}

#[test]
fn test_clinic_info_rejected_leaves_state() {
    let mut session = BillingSession::with_sample_data();
    let saved = ClinicInfo::new("Bright Smiles", "1 Main St\nSpringfield");
    session.set_clinic_info(saved.clone()).unwrap();

    assert!(session
        .set_clinic_info(ClinicInfo::new("", "Elsewhere"))
        .is_err());
    assert_eq!(session.clinic_info(), &saved);
}

#[test]
fn test_invoice_number_shape() {
    let session = BillingSession::with_sample_data();
    let invoice = session.invoice(&eleanor()).unwrap();

    let re = Regex::new(r"^INV-.{1,4}-\d+$").unwrap();
    assert!(re.is_match(&invoice.number), "{}", invoice.number);
    assert_eq!(invoice.total, 18000.0);
}

#[test]
fn test_invoice_html_for_new_patient() {
    let mut session = BillingSession::with_sample_data();
    let id = session
        .add_patient(PatientDraft::new(
            "Nora Quinn",
            "nora@example.com",
            NaiveDate::from_ymd_opt(1990, 3, 4).unwrap(),
        ))
        .unwrap();

    let html = session.render_invoice_html(&id).unwrap();
    assert!(html.contains("Nora Quinn"));
    assert!(html.contains("₹0.00"));
}

#[test]
fn test_export_import_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dental-hub-data.json");

    let mut source = BillingSession::with_sample_data();
    source
        .add_procedure(&PatientId::from("p3"), ProcedureDraft::new("Exam", "D0150", 2500.0))
        .unwrap();
    source.export_to_file(&path).unwrap();

    let mut target = BillingSession::new();
    target.import_from_file(&path).unwrap();
    assert_eq!(target.patients(), source.patients());
    assert_eq!(target.selected_patient_id(), Some(&eleanor()));
}

#[test]
fn test_rejected_import_keeps_everything() {
    let mut session = BillingSession::with_sample_data();
    session.select_patient(&PatientId::from("p2")).unwrap();
    let before = session.export_json().unwrap();

    let bad_documents = [
        r#"{"foo": 1}"#,
        r#"{"patients": [{"id": "x"}], "clinicInfo": {"name": "a", "address": "b", "logo": null}}"#,
    ];
    for bad in bad_documents {
        assert!(matches!(session.import_json(bad), Err(BillingError::Format(_))));
    }

    assert_eq!(session.export_json().unwrap(), before);
    assert_eq!(session.selected_patient_id(), Some(&PatientId::from("p2")));
}

#[test]
fn test_duplicate_ids_rejected_on_import() {
    let mut session = BillingSession::new();
    let json = r#"{
      "patients": [
        {"id": "p1", "name": "A", "email": "a@b.co", "dob": "1990-01-01", "procedures": []},
        {"id": "p1", "name": "B", "email": "b@b.co", "dob": "1990-01-01", "procedures": []}
      ],
      "clinicInfo": {"name": "a", "address": "b", "logo": null}
    }"#;
    assert!(matches!(session.import_json(json), Err(BillingError::Format(_))));
    assert!(session.patients().is_empty());
}

#[test]
fn test_run_suggestion_then_submit() {
    let mut session = BillingSession::with_sample_data();
    let completion = session
        .run_suggestion(&CannedAssistant::new(), "routine cleaning")
        .unwrap();
    assert_eq!(completion, Completion::Applied);
    assert_eq!(session.procedure_draft().code, "D1110");

    let id = session.submit_procedure_draft().unwrap();
    let procedure = session.patients().procedure(&eleanor(), &id).unwrap();
    assert_eq!(procedure.name, "Prophylaxis - Adult");
    assert_eq!(procedure.cost, 9500.0);
}

#[test]
fn test_run_suggestion_failure_releases_slot() {
    let mut session = BillingSession::with_sample_data();
    let err = session
        .run_suggestion(&FailingAssistant, "cleaning")
        .unwrap_err();
    assert!(matches!(err, BillingError::Collaborator(_)));
    assert!(!session.is_request_open(&RequestKey::Suggestion));
    assert!(session.procedure_draft().is_blank());
}

#[test]
fn test_suggestion_without_selection() {
    let mut session = BillingSession::new();
    assert!(matches!(
        session.begin_suggestion("cleaning"),
        Err(BillingError::NotFound(_))
    ));
}

#[test]
fn test_suggestion_stale_after_import() {
    let mut session = BillingSession::with_sample_data();
    let ticket: SuggestionTicket = session.begin_suggestion("cleaning").unwrap();

    let backup = session.export_json().unwrap();
    session.import_json(&backup).unwrap();

    // Same patient is selected again, but the data was replaced underneath
    assert_eq!(session.selected_patient_id(), Some(&ticket.patient_id));
    let completion = session
        .complete_suggestion(ticket, CannedAssistant::new().suggest_procedure("cleaning"))
        .unwrap();
    assert_eq!(completion, Completion::Discarded(DiscardReason::DataReplaced));
    assert!(session.procedure_draft().is_blank());
}

#[test]
fn test_run_image_attaches_base64() {
    let mut session = BillingSession::with_sample_data();
    let proc_id = ProcedureId::from("proc1");
    session
        .run_image(&CannedAssistant::new(), &eleanor(), &proc_id)
        .unwrap();

    let procedure = session.patients().procedure(&eleanor(), &proc_id).unwrap();
    assert_eq!(procedure.image.as_deref(), Some("iVBORw0KGgo="));

    let json = session.export_json().unwrap();
    assert!(json.contains("\"imageBase64\": \"iVBORw0KGgo=\""));
}

#[test]
fn test_image_failures_become_collaborator_errors() {
    let mut session = BillingSession::with_sample_data();
    let err = session
        .run_image(&FailingAssistant, &eleanor(), &ProcedureId::from("proc1"))
        .unwrap_err();
    assert!(matches!(err, BillingError::Collaborator(_)));
}

#[test]
fn test_image_requests_are_per_procedure() {
    let mut session = BillingSession::with_sample_data();
    let first = session.begin_image(&eleanor(), &ProcedureId::from("proc1")).unwrap();
    // A different procedure can be drawn concurrently
    let second = session.begin_image(&eleanor(), &ProcedureId::from("proc2")).unwrap();
    // The same one cannot
    assert!(matches!(
        session.begin_image(&eleanor(), &ProcedureId::from("proc1")),
        Err(BillingError::RequestInFlight(_))
    ));

    assert!(session.complete_image(second, Ok("Yg==".into())).unwrap().is_applied());
    assert!(session.complete_image(first, Ok("YQ==".into())).unwrap().is_applied());
}

#[test]
fn test_dropped_ticket_does_not_block_after_import() {
    let mut session = BillingSession::with_sample_data();
    let _ = session.begin_suggestion("cleaning").unwrap();
    assert!(matches!(
        session.begin_suggestion("cleaning"),
        Err(BillingError::RequestInFlight(_))
    ));

    let backup = session.export_json().unwrap();
    session.import_json(&backup).unwrap();
    assert!(!session.is_request_open(&RequestKey::Suggestion));

    let completion = session
        .run_suggestion(&CannedAssistant::new(), "cleaning")
        .unwrap();
    assert_eq!(completion, Completion::Applied);
}

#[test]
fn test_abandon_unblocks_suggestions() {
    let mut session = BillingSession::with_sample_data();
    let _ = session.begin_suggestion("cleaning").unwrap();

    assert!(session.abandon_request(&RequestKey::Suggestion));
    assert!(session
        .run_suggestion(&CannedAssistant::new(), "cleaning")
        .unwrap()
        .is_applied());
}
