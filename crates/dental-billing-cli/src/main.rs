use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dental_billing_core::export::{backup, format_long_date};
use dental_billing_core::{
    BillingConfig, BillingSession, ClinicInfo, Completion, Patient, PatientDraft, PatientId,
    ProcedureDraft, ProcedureId, ProcedurePatch,
};
use dental_billing_llm::MockAssistant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "dental-billing")]
#[command(about = "Dental clinic billing ledger")]
struct Cli {
    /// Backup file holding the ledger (defaults to the configured export file name)
    #[arg(long, global = true, env = "DENTAL_BILLING_DATA")]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the demo patients to the data file
    Init {
        /// Overwrite an existing data file
        #[arg(long)]
        force: bool,
    },
    /// List all patients
    List,
    /// Show one patient's procedures
    Show {
        patient_id: String,
    },
    /// Add a patient
    AddPatient {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        dob: NaiveDate,
    },
    /// Record a procedure for a patient
    AddProcedure {
        patient_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        code: String,
        #[arg(long)]
        cost: f64,
        #[arg(long, default_value = "")]
        description: String,
        /// Service date (YYYY-MM-DD); today if omitted
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Change the date of a recorded procedure
    SetDate {
        patient_id: String,
        procedure_id: String,
        /// New date (YYYY-MM-DD)
        date: NaiveDate,
    },
    /// Show or update the clinic details printed on invoices
    Clinic {
        #[arg(long)]
        name: Option<String>,
        /// Address; use "\n" in the shell string for line breaks
        #[arg(long)]
        address: Option<String>,
        /// PNG or JPEG file to embed as the logo
        #[arg(long, conflicts_with = "clear_logo")]
        logo: Option<PathBuf>,
        #[arg(long)]
        clear_logo: bool,
    },
    /// Render a patient's invoice
    Invoice {
        patient_id: String,
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// Emit CSV statement lines instead of HTML
        #[arg(long)]
        csv: bool,
    },
    /// Suggest billing details from a description (offline assistant)
    Suggest {
        patient_id: String,
        /// Free-text procedure description
        #[arg(required = true, num_args = 1..)]
        description: Vec<String>,
        /// Add the suggested procedure to the patient
        #[arg(long)]
        add: bool,
    },
    /// Attach a generated illustration to a procedure (offline assistant)
    Image {
        patient_id: String,
        procedure_id: String,
    },
    /// Copy the ledger to another file
    Export {
        out: PathBuf,
    },
    /// Replace the ledger with a backup file
    Import {
        file: PathBuf,
    },
    /// Check a backup file without importing it
    Validate {
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dental_billing=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = BillingConfig::from_env();
    let data_path = cli
        .data
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.export_file_name));

    let Some(command) = cli.command else {
        println!("Use 'dental-billing --help' for commands");
        return Ok(());
    };

    match command {
        Commands::Init { force } => {
            if data_path.exists() && !force {
                bail!(
                    "{} already exists; pass --force to overwrite",
                    data_path.display()
                );
            }
            let session = BillingSession::sample_with_config(config);
            session.export_to_file(&data_path)?;
            println!(
                "Wrote {} sample patients to {}",
                session.patients().len(),
                data_path.display()
            );
        }
        Commands::List => {
            let session = load_session(&data_path, config)?;
            if session.patients().is_empty() {
                println!("No patients found.");
            }
            for patient in session.patients() {
                println!(
                    "{}  {:<24} {:<28} {:>3} procedures  {}",
                    patient.id,
                    patient.name,
                    patient.email,
                    patient.procedures.len(),
                    session.config().format_amount(patient.total_billed())
                );
            }
        }
        Commands::Show { patient_id } => {
            let session = load_session(&data_path, config)?;
            let patient = session.patients().require(&PatientId::from(patient_id))?;
            print_patient(patient, session.config());
        }
        Commands::AddPatient { name, email, dob } => {
            let mut session = load_session(&data_path, config)?;
            let id = session.add_patient(PatientDraft::new(name, email, dob))?;
            save_session(&session, &data_path)?;
            println!("Added patient {}", id);
        }
        Commands::AddProcedure {
            patient_id,
            name,
            code,
            cost,
            description,
            date,
        } => {
            let mut session = load_session(&data_path, config)?;
            let patient_id = PatientId::from(patient_id);
            let draft = ProcedureDraft::new(name, code, cost).with_description(description);
            let id = match date {
                Some(date) => session.add_procedure_on(&patient_id, draft, date)?,
                None => session.add_procedure(&patient_id, draft)?,
            };
            save_session(&session, &data_path)?;
            println!("Added procedure {} for patient {}", id, patient_id);
        }
        Commands::SetDate {
            patient_id,
            procedure_id,
            date,
        } => {
            let mut session = load_session(&data_path, config)?;
            session.update_procedure(
                &PatientId::from(patient_id),
                &ProcedureId::from(procedure_id.as_str()),
                &ProcedurePatch::new().date(date),
            )?;
            save_session(&session, &data_path)?;
            println!("Procedure {} now dated {}", procedure_id, format_long_date(date));
        }
        Commands::Clinic {
            name,
            address,
            logo,
            clear_logo,
        } => {
            let mut session = load_session(&data_path, config)?;
            if name.is_none() && address.is_none() && logo.is_none() && !clear_logo {
                print_clinic(session.clinic_info());
                return Ok(());
            }

            let mut info = session.clinic_info().clone();
            if let Some(name) = name {
                info.name = name;
            }
            if let Some(address) = address {
                info.address = address.replace("\\n", "\n");
            }
            if let Some(path) = logo {
                let bytes = fs::read(&path)
                    .with_context(|| format!("could not read logo {}", path.display()))?;
                info.logo = Some(session.logo_data_url(&bytes, logo_mime(&path)?)?);
            }
            if clear_logo {
                info.logo = None;
            }

            session.set_clinic_info(info)?;
            save_session(&session, &data_path)?;
            print_clinic(session.clinic_info());
        }
        Commands::Invoice {
            patient_id,
            out,
            csv,
        } => {
            let session = load_session(&data_path, config)?;
            let invoice = session.invoice(&PatientId::from(patient_id))?;
            let rendered = if csv {
                invoice.to_csv()
            } else {
                invoice.to_html(session.config())
            };
            match out {
                Some(path) => {
                    fs::write(&path, rendered)
                        .with_context(|| format!("could not write {}", path.display()))?;
                    println!("Invoice {} written to {}", invoice.number, path.display());
                }
                None => print!("{}", rendered),
            }
        }
        Commands::Suggest {
            patient_id,
            description,
            add,
        } => {
            let mut session = load_session(&data_path, config)?;
            session.select_patient(&PatientId::from(patient_id))?;

            let completion = session.run_suggestion(&MockAssistant, &description.join(" "))?;
            if completion != Completion::Applied {
                bail!("suggestion was discarded: {:?}", completion);
            }

            let draft = session.procedure_draft().clone();
            println!("Name:        {}", draft.name);
            println!("Description: {}", draft.description);
            println!("Code:        {}", draft.code);
            println!(
                "Cost:        {}",
                session.config().format_amount(draft.cost.unwrap_or_default())
            );

            if add {
                let id = session.submit_procedure_draft()?;
                save_session(&session, &data_path)?;
                println!("Added procedure {}", id);
            }
        }
        Commands::Image {
            patient_id,
            procedure_id,
        } => {
            let mut session = load_session(&data_path, config)?;
            let completion = session.run_image(
                &MockAssistant,
                &PatientId::from(patient_id),
                &ProcedureId::from(procedure_id.as_str()),
            )?;
            if completion != Completion::Applied {
                bail!("image was discarded: {:?}", completion);
            }
            save_session(&session, &data_path)?;
            println!("Attached image to procedure {}", procedure_id);
        }
        Commands::Export { out } => {
            let session = load_session(&data_path, config)?;
            session.export_to_file(&out)?;
            println!("Exported {} patients to {}", session.patients().len(), out.display());
        }
        Commands::Import { file } => {
            let mut session = load_session(&data_path, config)?;
            session.import_from_file(&file)?;
            save_session(&session, &data_path)?;
            println!(
                "Imported {} patients from {}",
                session.patients().len(),
                file.display()
            );
        }
        Commands::Validate { file } => {
            let data = backup::read_backup(&file)?;
            println!(
                "{} is valid: {} patients, {} procedures",
                file.display(),
                data.patients.len(),
                data.procedure_count()
            );
        }
    }

    Ok(())
}

/// Open the ledger at `path`, or an empty one if the file does not exist yet.
fn load_session(path: &Path, config: BillingConfig) -> Result<BillingSession> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "data file not found, starting empty");
        return Ok(BillingSession::with_config(config));
    }
    let data = backup::read_backup(path)?;
    let session = BillingSession::from_app_data(data, config)
        .with_context(|| format!("could not open {}", path.display()))?;
    Ok(session)
}

fn save_session(session: &BillingSession, path: &Path) -> Result<()> {
    session
        .export_to_file(path)
        .with_context(|| format!("could not save {}", path.display()))
}

fn logo_mime(path: &Path) -> Result<&'static str> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => Ok("image/png"),
        Some("jpg") | Some("jpeg") => Ok("image/jpeg"),
        _ => bail!("logo must be a .png, .jpg or .jpeg file"),
    }
}

fn print_patient(patient: &Patient, config: &BillingConfig) {
    println!("{} ({})", patient.name, patient.id);
    println!("Email: {}", patient.email);
    println!("DOB:   {}", format_long_date(patient.dob));
    if patient.procedures.is_empty() {
        println!("No procedures recorded.");
        return;
    }
    println!();
    for procedure in &patient.procedures {
        println!(
            "{:<20} {:<8} {:<36} {:>14}{}",
            format_long_date(procedure.date),
            procedure.code,
            procedure.name,
            config.format_number(procedure.cost),
            if procedure.has_image() { "  [image]" } else { "" }
        );
    }
    println!();
    println!("Total: {}", config.format_amount(patient.total_billed()));
}

fn print_clinic(info: &ClinicInfo) {
    println!("{}", info.name);
    for line in info.address_lines() {
        println!("  {}", line);
    }
    println!(
        "Logo: {}",
        if info.logo.is_some() { "set" } else { "none" }
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add_procedure() {
        let cli = Cli::try_parse_from([
            "dental-billing",
            "--data",
            "ledger.json",
            "add-procedure",
            "p1",
            "--name",
            "Cleaning",
            "--code",
            "D0120",
            "--cost",
            "12000",
            "--date",
            "2024-07-10",
        ])
        .unwrap();

        assert_eq!(cli.data, Some(PathBuf::from("ledger.json")));
        match cli.command {
            Some(Commands::AddProcedure { cost, date, .. }) => {
                assert_eq!(cost, 12000.0);
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 7, 10));
            }
            _ => panic!("expected add-procedure"),
        }
    }

    #[test]
    fn test_rejects_bad_date() {
        let result = Cli::try_parse_from([
            "dental-billing",
            "add-patient",
            "--name",
            "A",
            "--email",
            "a@b.co",
            "--dob",
            "22/05/1985",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let session = load_session(&dir.path().join("none.json"), BillingConfig::default()).unwrap();
        assert!(session.patients().is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");

        let mut session = BillingSession::with_sample_data();
        session
            .add_procedure(
                &PatientId::from("p3"),
                ProcedureDraft::new("Exam", "D0150", 2500.0),
            )
            .unwrap();
        save_session(&session, &path).unwrap();

        let loaded = load_session(&path, BillingConfig::default()).unwrap();
        assert_eq!(loaded.patients(), session.patients());
    }

    #[test]
    fn test_load_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        fs::write(&path, "{\"patients\": 3}").unwrap();
        assert!(load_session(&path, BillingConfig::default()).is_err());
    }

    #[test]
    fn test_logo_mime() {
        assert_eq!(logo_mime(Path::new("logo.PNG")).unwrap(), "image/png");
        assert_eq!(logo_mime(Path::new("logo.jpeg")).unwrap(), "image/jpeg");
        assert!(logo_mime(Path::new("logo.gif")).is_err());
    }
}
