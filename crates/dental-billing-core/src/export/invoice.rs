//! Printable invoices.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::BillingConfig;
use crate::models::{ClinicInfo, Patient, PatientId};

/// One billed procedure on an invoice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceLine {
    pub date: NaiveDate,
    pub name: String,
    pub code: String,
    pub description: String,
    pub amount: f64,
}

/// Snapshot of a patient's bill at generation time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Invoice {
    /// `INV-<last 4 of patient id>-<unix millis>`
    pub number: String,
    pub issued_at: DateTime<Utc>,
    pub patient_id: PatientId,
    pub bill_to_name: String,
    pub bill_to_email: String,
    pub clinic: ClinicInfo,
    pub lines: Vec<InvoiceLine>,
    /// Sum of line amounts
    pub total: f64,
}

impl Invoice {
    /// Build an invoice for `patient`. Reads only; the patient is not modified.
    pub fn build(patient: &Patient, clinic: &ClinicInfo, issued_at: DateTime<Utc>) -> Self {
        let lines: Vec<InvoiceLine> = patient
            .procedures
            .iter()
            .map(|p| InvoiceLine {
                date: p.date,
                name: p.name.clone(),
                code: p.code.clone(),
                description: p.description.clone(),
                amount: p.cost,
            })
            .collect();
        let total = lines.iter().map(|line| line.amount).sum();

        Self {
            number: invoice_number(&patient.id, issued_at),
            issued_at,
            patient_id: patient.id.clone(),
            bill_to_name: patient.name.clone(),
            bill_to_email: patient.email.clone(),
            clinic: clinic.clone(),
            lines,
            total,
        }
    }

    /// Render a standalone HTML document with inline styles.
    pub fn to_html(&self, config: &BillingConfig) -> String {
        let mut rows = String::new();
        for line in &self.lines {
            rows.push_str(&format!(
                r#"
        <tr>
          <td class="date">{date}</td>
          <td>
            <p class="item">{name} ({code})</p>
            <p class="muted">{description}</p>
          </td>
          <td class="amount">{amount}</td>
        </tr>"#,
                date = format_long_date(line.date),
                name = escape_html(&line.name),
                code = escape_html(&line.code),
                description = escape_html(&line.description),
                amount = escape_html(&config.format_amount(line.amount)),
            ));
        }

        let brand = match &self.clinic.logo {
            Some(logo) => format!(
                r#"<img src="{}" alt="Clinic Logo" style="max-height: 80px; max-width: 200px;">"#,
                escape_html(logo)
            ),
            None => format!(r#"<h1 class="clinic">{}</h1>"#, escape_html(&self.clinic.name)),
        };

        let address = self
            .clinic
            .address_lines()
            .map(escape_html)
            .collect::<Vec<_>>()
            .join("<br>");

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Invoice for {patient_name}</title>
  <style>
    body {{ background: #f3f4f6; font-family: system-ui, sans-serif; color: #1f2937; }}
    .sheet {{ max-width: 56rem; margin: 2rem auto; padding: 2rem; background: #fff; border-radius: 0.5rem; }}
    header {{ display: flex; justify-content: space-between; align-items: flex-start; padding-bottom: 1.5rem; border-bottom: 1px solid #e5e7eb; }}
    .clinic {{ font-size: 1.875rem; margin: 0; }}
    .muted {{ color: #6b7280; margin: 0.25rem 0 0; }}
    .right {{ text-align: right; }}
    table {{ width: 100%; border-collapse: collapse; text-align: left; }}
    th, td {{ padding: 0.5rem 1rem; border-bottom: 1px solid #e5e7eb; vertical-align: top; }}
    thead {{ background: #f9fafb; }}
    .item {{ font-weight: 600; margin: 0; }}
    .amount {{ text-align: right; white-space: nowrap; }}
    .total {{ margin-top: 2rem; text-align: right; }}
    .total-box {{ display: inline-block; padding: 1rem; background: #f3f4f6; border-radius: 0.5rem; }}
    .total-value {{ font-size: 1.875rem; font-weight: 700; color: #0d9488; margin: 0; }}
  </style>
</head>
<body>
  <div class="sheet">
    <header>
      <div>
        {brand}
        <p class="muted">{address}</p>
      </div>
      <div class="right">
        <h2>Invoice</h2>
        <p><strong>Invoice #:</strong> {number}</p>
        <p><strong>Date:</strong> {issued}</p>
      </div>
    </header>
    <section>
      <h2>Bill To:</h2>
      <p>{patient_name}</p>
      <p>{patient_email}</p>
    </section>
    <section>
      <table>
        <thead>
          <tr>
            <th>Date</th>
            <th>Description</th>
            <th class="amount">Amount</th>
          </tr>
        </thead>
        <tbody>{rows}
        </tbody>
      </table>
    </section>
    <section class="total">
      <div class="total-box">
        <p class="muted">Total Amount Due</p>
        <p class="total-value">{total}</p>
      </div>
    </section>
  </div>
</body>
</html>
"#,
            patient_name = escape_html(&self.bill_to_name),
            patient_email = escape_html(&self.bill_to_email),
            brand = brand,
            address = address,
            number = escape_html(&self.number),
            issued = format_long_date(self.issued_at.date_naive()),
            rows = rows,
            total = escape_html(&config.format_amount(self.total)),
        )
    }

    /// Statement lines as CSV, one row per procedure.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();

        // Header
        csv.push_str("invoice_number,patient_id,date,code,name,description,amount\n");

        for line in &self.lines {
            csv.push_str(&format!(
                "{},{},{},{},{},{},{:.2}\n",
                escape_csv(&self.number),
                escape_csv(self.patient_id.as_str()),
                line.date,
                escape_csv(&line.code),
                escape_csv(&line.name),
                escape_csv(&line.description),
                line.amount,
            ));
        }

        csv
    }
}

/// Render the invoice for `patient` as of now.
pub fn render_invoice_html(patient: &Patient, clinic: &ClinicInfo, config: &BillingConfig) -> String {
    Invoice::build(patient, clinic, Utc::now()).to_html(config)
}

/// `INV-<last four characters of the patient id>-<milliseconds since epoch>`.
pub fn invoice_number(patient_id: &PatientId, issued_at: DateTime<Utc>) -> String {
    let chars: Vec<char> = patient_id.as_str().chars().collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("INV-{}-{}", tail, issued_at.timestamp_millis())
}

/// Long US-style date, e.g. "July 10, 2024".
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Escape text for inclusion in HTML content or a quoted attribute.
fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(|c: char| matches!(c, ',' | '"' | '\n' | '\r')) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
