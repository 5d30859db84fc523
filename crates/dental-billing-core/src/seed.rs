//! Starter data for a fresh session.

use chrono::NaiveDate;

use crate::models::{ClinicInfo, Patient, PatientId, Procedure, ProcedureId};

pub const DEFAULT_CLINIC_NAME: &str = "Dental Billing Hub";
pub const DEFAULT_CLINIC_ADDRESS: &str = "123 Smile Street\nSuite 100\nToothville, MD 20852";

/// Clinic identity used until the user saves their own.
pub fn default_clinic_info() -> ClinicInfo {
    ClinicInfo::new(DEFAULT_CLINIC_NAME, DEFAULT_CLINIC_ADDRESS)
}

/// Demo patients with a short history each.
pub fn sample_patients() -> Vec<Patient> {
    vec![
        patient(
            "p1",
            "Eleanor Vance",
            "eleanor.v@example.com",
            ymd(1985, 5, 22),
            vec![
                procedure(
                    "proc1",
                    "Annual Check-up & Cleaning",
                    "Routine examination, scaling, and polishing.",
                    "D0120",
                    12000.0,
                    ymd(2024, 7, 10),
                ),
                procedure(
                    "proc2",
                    "Bitewing X-rays",
                    "Four bitewing radiographic images.",
                    "D0274",
                    6000.0,
                    ymd(2024, 7, 10),
                ),
            ],
        ),
        patient(
            "p2",
            "Marcus Holloway",
            "m.holloway@example.com",
            ymd(1992, 11, 9),
            vec![procedure(
                "proc3",
                "Resin-based Composite Filling",
                "One surface, posterior tooth.",
                "D2391",
                20000.0,
                ymd(2024, 6, 15),
            )],
        ),
        patient(
            "p3",
            "Anya Sharma",
            "anya.s@example.com",
            ymd(1978, 2, 14),
            vec![],
        ),
        patient(
            "p4",
            "Liam Gallagher",
            "liam.g@example.com",
            ymd(2001, 9, 3),
            vec![
                procedure(
                    "proc4",
                    "Wisdom Tooth Extraction",
                    "Surgical removal of impacted third molar.",
                    "D7240",
                    35000.0,
                    ymd(2023, 11, 20),
                ),
                procedure(
                    "proc5",
                    "Follow-up Examination",
                    "Post-operative check-up.",
                    "D9999",
                    0.0,
                    ymd(2023, 11, 27),
                ),
            ],
        ),
    ]
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn patient(id: &str, name: &str, email: &str, dob: NaiveDate, procedures: Vec<Procedure>) -> Patient {
    Patient {
        id: PatientId::from(id),
        name: name.to_string(),
        email: email.to_string(),
        dob,
        procedures,
    }
}

fn procedure(
    id: &str,
    name: &str,
    description: &str,
    code: &str,
    cost: f64,
    date: NaiveDate,
) -> Procedure {
    Procedure {
        id: ProcedureId::from(id),
        name: name.to_string(),
        description: description.to_string(),
        code: code.to_string(),
        cost,
        date,
        image: None,
    }
}
