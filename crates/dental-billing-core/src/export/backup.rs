//! JSON backup and restore of the full bundle.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::{BillingError, BillingResult};
use crate::models::AppData;

/// Serialize the bundle as pretty-printed JSON.
pub fn to_json(data: &AppData) -> BillingResult<String> {
    serde_json::to_string_pretty(data)
        .map_err(|e| BillingError::Format(format!("could not serialize backup: {e}")))
}

/// Parse and validate a backup document.
///
/// Structural checks run on the raw JSON first so the error names what is
/// wrong with the document, then the typed records are decoded and the
/// collection invariants checked. Nothing is coerced: any mismatch rejects
/// the whole document.
pub fn parse(json: &str) -> BillingResult<AppData> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| BillingError::Format(format!("not valid JSON: {e}")))?;

    let object = value
        .as_object()
        .ok_or_else(|| BillingError::Format("top level must be an object".into()))?;

    match object.get("patients") {
        Some(Value::Array(_)) => {}
        Some(_) => return Err(BillingError::Format("`patients` must be an array".into())),
        None => return Err(BillingError::Format("missing `patients`".into())),
    }

    match object.get("clinicInfo") {
        Some(Value::Object(_)) => {}
        Some(_) => return Err(BillingError::Format("`clinicInfo` must be an object".into())),
        None => return Err(BillingError::Format("missing `clinicInfo`".into())),
    }

    let data: AppData = serde_json::from_value(value)
        .map_err(|e| BillingError::Format(format!("record does not match the data model: {e}")))?;
    data.check_invariants()?;

    Ok(data)
}

/// Write the bundle to `path`.
pub fn write_backup<P: AsRef<Path>>(path: P, data: &AppData) -> BillingResult<()> {
    let path = path.as_ref();
    let json = to_json(data)?;
    fs::write(path, json).map_err(|e| {
        BillingError::Format(format!("could not write {}: {e}", path.display()))
    })?;
    tracing::info!(
        path = %path.display(),
        patients = data.patients.len(),
        "backup written"
    );
    Ok(())
}

/// Read and validate a bundle from `path`. Unreadable files are format errors.
pub fn read_backup<P: AsRef<Path>>(path: P) -> BillingResult<AppData> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).map_err(|e| {
        BillingError::Format(format!("could not read {}: {e}", path.display()))
    })?;
    parse(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClinicInfo;
    use crate::seed;

    fn sample() -> AppData {
        AppData::new(seed::sample_patients(), seed::default_clinic_info())
    }

    #[test]
    fn test_round_trip() {
        let data = sample();
        let json = to_json(&data).unwrap();
        let back = parse(&json).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_pretty_printed() {
        let json = to_json(&sample()).unwrap();
        assert!(json.starts_with("{\n"));
        assert!(json.contains("\n  \"patients\": ["));
    }

    #[test]
    fn test_accepts_web_app_export() {
        let json = r#"{
          "patients": [
            {
              "id": "p1",
              "name": "Eleanor Vance",
              "email": "eleanor.v@example.com",
              "dob": "1985-05-22",
              "procedures": [
                {"id": "proc1", "name": "Annual Check-up & Cleaning", "description": "Routine examination, scaling, and polishing.", "code": "D0120", "cost": 12000, "date": "2024-07-10", "imageBase64": "aGk="}
              ]
            }
          ],
          "clinicInfo": {"name": "Dental Billing Hub", "address": "123 Smile Street", "logo": null}
        }"#;

        let data = parse(json).unwrap();
        assert_eq!(data.patients.len(), 1);
        assert_eq!(data.patients[0].procedures[0].cost, 12000.0);
        assert_eq!(data.patients[0].procedures[0].image.as_deref(), Some("aGk="));
        assert!(data.clinic_info.logo.is_none());
    }

    #[test]
    fn test_structural_rejections() {
        let cases = [
            ("[]", "object"),
            ("42", "object"),
            (r#"{"foo": 1}"#, "patients"),
            (r#"{"patients": {}, "clinicInfo": {"name":"a","address":"b","logo":null}}"#, "array"),
            (r#"{"patients": []}"#, "clinicInfo"),
            (r#"{"patients": [], "clinicInfo": null}"#, "clinicInfo"),
            ("not json", "JSON"),
        ];

        for (json, needle) in cases {
            match parse(json) {
                Err(BillingError::Format(msg)) => {
                    assert!(msg.contains(needle), "{json}: {msg}")
                }
                other => panic!("{json}: expected format error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_bad_record_rejected() {
        let json = r#"{"patients": [{"id": "p1", "name": "X", "email": "x@y.z", "dob": "not-a-date", "procedures": []}],
                       "clinicInfo": {"name": "a", "address": "b", "logo": null}}"#;
        assert!(matches!(parse(json), Err(BillingError::Format(_))));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dental-hub-data.json");

        let data = AppData::new(vec![], ClinicInfo::new("Clinic", "Line 1\nLine 2"));
        write_backup(&path, &data).unwrap();
        assert_eq!(read_backup(&path).unwrap(), data);
    }

    #[test]
    fn test_missing_file_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_backup(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, BillingError::Format(_)));
    }
}
