//! One command per operator action. Each returns a serializable summary the
//! CLI prints as text or JSON.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use debitrun_core::IssueSummary;
use debitrun_import::{billed_without_eft, load_billing_csv, load_eft_file};
use debitrun_report::{export_report as write_report, FixedWidthRecordWriter, ReportBuilder};
use serde::Serialize;

use crate::config::RunConfig;
use crate::session::{Session, SessionError};

#[derive(Debug, Clone, Serialize)]
pub struct BillingLoaded {
    pub path: PathBuf,
    pub customers: usize,
    pub rows_read: usize,
    pub rows_without_code: usize,
    pub total_due: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EftLoaded {
    pub path: PathBuf,
    pub records: usize,
    pub columns: usize,
    pub column_counts: BTreeSet<usize>,
    pub blank_lines: usize,
    pub issues: IssueSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataUpdated {
    pub records: usize,
    pub matched: usize,
    pub unmatched: usize,
    /// Billed customers the EFT file has no record for.
    pub billed_without_eft: Vec<String>,
    pub total_due: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportExported {
    pub path: PathBuf,
    pub rows: usize,
    pub increases: usize,
    pub decreases: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct EftCreated {
    pub path: PathBuf,
    pub records: usize,
    pub overflows: IssueSummary,
    pub verification: Vec<String>,
}

pub fn load_billing(session: &mut Session, path: &Path) -> Result<BillingLoaded, SessionError> {
    let import = load_billing_csv(path, &session.profile)?;
    let total = import.table.total().ok_or(SessionError::TotalOverflow { what: "billing" })?;
    let outcome = BillingLoaded {
        path: path.to_path_buf(),
        customers: import.table.len(),
        rows_read: import.rows_read,
        rows_without_code: import.rows_without_code,
        total_due: total.to_string(),
    };
    session.set_billing(import.table);
    Ok(outcome)
}

pub fn load_eft(session: &mut Session, path: &Path) -> Result<EftLoaded, SessionError> {
    let parsed = load_eft_file(path, session.options)?;
    let outcome = EftLoaded {
        path: path.to_path_buf(),
        records: parsed.table.len(),
        columns: parsed.table.width(),
        column_counts: parsed.report.column_counts.clone(),
        blank_lines: parsed.report.blank_lines,
        issues: parsed.report.summary(),
    };
    session.set_eft(parsed);
    Ok(outcome)
}

pub fn update_data(session: &mut Session) -> Result<DataUpdated, SessionError> {
    let table = session.reconcile()?;
    let total = table.total_due().ok_or(SessionError::TotalOverflow { what: "reconciled" })?;
    let mut outcome = DataUpdated {
        records: table.len(),
        matched: table.matched_count(),
        unmatched: table.unmatched_count(),
        billed_without_eft: Vec::new(),
        total_due: total.to_string(),
    };
    if let (Some(billing), Some(eft)) = (session.billing(), session.eft()) {
        outcome.billed_without_eft = billed_without_eft(&eft.table, billing)
            .into_iter()
            .map(|code| code.to_string())
            .collect();
    }
    if !outcome.billed_without_eft.is_empty() {
        tracing::warn!(
            customers = outcome.billed_without_eft.len(),
            "billed customers missing from the EFT file"
        );
    }
    Ok(outcome)
}

pub fn export_report(session: &Session, path: &Path) -> Result<ReportExported, SessionError> {
    let reconciled = session.require_reconciled()?;
    let original = session.require_eft()?;
    let rows = ReportBuilder::build(reconciled, &original.table)?;
    let summary = write_report(&rows, path)?;
    Ok(ReportExported {
        path: path.to_path_buf(),
        rows: summary.rows,
        increases: summary.increases,
        decreases: summary.decreases,
    })
}

pub fn create_eft(session: &Session, path: &Path) -> Result<EftCreated, SessionError> {
    let reconciled = session.require_reconciled()?;
    if reconciled.is_empty() {
        return Err(SessionError::NoData);
    }
    let output = FixedWidthRecordWriter::write(&reconciled.header, reconciled);
    output.save(path)?;
    Ok(EftCreated {
        path: path.to_path_buf(),
        records: output.records,
        overflows: output.summary(),
        verification: output.verification.iter().map(|v| v.to_string()).collect(),
    })
}

/// Everything one `run` produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub billing: BillingLoaded,
    pub eft: EftLoaded,
    pub update: DataUpdated,
    pub report: Option<ReportExported>,
    pub eft_created: Option<EftCreated>,
}

/// Load both inputs, reconcile, then write whichever outputs are configured.
pub fn run(config: &RunConfig) -> Result<RunOutcome, SessionError> {
    let billing_path = config
        .input
        .billing_csv
        .as_deref()
        .ok_or(SessionError::MissingInput { what: "billing CSV" })?;
    let eft_path = config
        .input
        .eft_file
        .as_deref()
        .ok_or(SessionError::MissingInput { what: "EFT file" })?;

    let mut session = Session::new(debitrun_import::ParseOptions {
        diagnostics: config.diagnostics.alignment,
    });
    let billing = load_billing(&mut session, billing_path)?;
    let eft = load_eft(&mut session, eft_path)?;
    let update = update_data(&mut session)?;

    let report = match &config.output.report_file {
        Some(path) => Some(export_report(&session, path)?),
        None => None,
    };
    let eft_created = match &config.output.eft_file {
        Some(path) => Some(create_eft(&session, path)?),
        None => None,
    };

    Ok(RunOutcome { billing, eft, update, report, eft_created })
}

// ── text rendering ──────────────────────────────────────────────────────────

impl fmt::Display for BillingLoaded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Billing loaded: {} customers from {} rows, total {}",
            self.customers, self.rows_read, self.total_due
        )?;
        if self.rows_without_code > 0 {
            write!(f, " ({} rows without a customer code skipped)", self.rows_without_code)?;
        }
        Ok(())
    }
}

impl fmt::Display for EftLoaded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EFT loaded: {} records, {} columns", self.records, self.columns)?;
        if self.column_counts.len() > 1 {
            write!(f, "\n  inconsistent column counts: {:?}", self.column_counts)?;
        }
        write_issues(f, &self.issues)
    }
}

impl fmt::Display for DataUpdated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Data updated: {} records, {} matched, {} zeroed, total {}",
            self.records, self.matched, self.unmatched, self.total_due
        )?;
        if !self.billed_without_eft.is_empty() {
            write!(
                f,
                "\n  {} billed customers have no EFT record",
                self.billed_without_eft.len()
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for ReportExported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Report exported: {} ({} rows, {} up, {} down)",
            self.path.display(),
            self.rows,
            self.increases,
            self.decreases
        )
    }
}

impl fmt::Display for EftCreated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EFT file created: {} ({} records)", self.path.display(), self.records)?;
        write_issues(f, &self.overflows)?;
        for line in &self.verification {
            write!(f, "\n  verification: {line}")?;
        }
        Ok(())
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.billing)?;
        writeln!(f, "{}", self.eft)?;
        write!(f, "{}", self.update)?;
        if let Some(report) = &self.report {
            write!(f, "\n{report}")?;
        }
        if let Some(created) = &self.eft_created {
            write!(f, "\n{created}")?;
        }
        Ok(())
    }
}

fn write_issues(f: &mut fmt::Formatter<'_>, issues: &IssueSummary) -> fmt::Result {
    if issues.is_clean() {
        return Ok(());
    }
    write!(f, "\n  {issues}")?;
    for message in &issues.sample {
        write!(f, "\n    {message}")?;
    }
    if issues.issue_count > issues.sample.len() {
        write!(f, "\n    ... and {} more", issues.issue_count - issues.sample.len())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const HEADER: &str = "HDR0001  X  Y  BRANCH  ACCOUNT              COMPANY               AMOUNT       SABRE RADIO      F";
    const LINE_12: &str = "0000012  A  B  250655  1234567890           ACME                  00000015000  SABRE RADIO      N";
    const LINE_13: &str = "0000013  A  B  250655  1234567890           BETA                  00000002000  SABRE RADIO      N";

    fn inputs(dir: &Path) -> (PathBuf, PathBuf) {
        let csv = dir.join("billrun.csv");
        let eft = dir.join("previous.eft");
        fs::write(&csv, "sep=,\nSabreCode,TotalDue\n12,100.0\n12,50.0\n99,10\n").unwrap();
        fs::write(&eft, format!("{HEADER}\n{LINE_12}\n{LINE_13}\n")).unwrap();
        (csv, eft)
    }

    // ── command order ───────────────────────────────────────────────────────

    #[test]
    fn outputs_need_an_update_first() {
        let dir = tempfile::tempdir().unwrap();
        let (csv, eft) = inputs(dir.path());
        let mut session = Session::default();
        load_billing(&mut session, &csv).unwrap();
        load_eft(&mut session, &eft).unwrap();

        let out = dir.path().join("new.eft");
        assert!(matches!(create_eft(&session, &out), Err(SessionError::NotReconciled)));
        assert!(matches!(
            export_report(&session, &dir.path().join("r.xlsx")),
            Err(SessionError::NotReconciled)
        ));
        assert!(!out.exists());
    }

    #[test]
    fn update_requires_both_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let (_, eft) = inputs(dir.path());
        let mut session = Session::default();
        load_eft(&mut session, &eft).unwrap();
        assert!(matches!(update_data(&mut session), Err(SessionError::BillingNotLoaded)));
    }

    #[test]
    fn header_only_file_cannot_be_written() {
        let dir = tempfile::tempdir().unwrap();
        let (csv, _) = inputs(dir.path());
        let eft = dir.path().join("empty.eft");
        fs::write(&eft, format!("{HEADER}\n")).unwrap();

        let mut session = Session::default();
        load_billing(&mut session, &csv).unwrap();
        load_eft(&mut session, &eft).unwrap();
        update_data(&mut session).unwrap();
        let out = dir.path().join("new.eft");
        assert!(matches!(create_eft(&session, &out), Err(SessionError::NoData)));
        assert!(!out.exists());
    }

    #[test]
    fn failed_load_keeps_previous_tables() {
        let dir = tempfile::tempdir().unwrap();
        let (csv, _) = inputs(dir.path());
        let mut session = Session::default();
        load_billing(&mut session, &csv).unwrap();
        let err = load_billing(&mut session, &dir.path().join("missing.csv")).unwrap_err();
        assert!(err.to_string().contains("missing.csv"));
        assert_eq!(session.billing().map(|b| b.len()), Some(2));
    }

    #[test]
    fn billing_total_overflow_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("huge.csv");
        fs::write(&csv, "SabreCode,TotalDue\n1,60000000000000000\n2,60000000000000000\n").unwrap();
        let mut session = Session::default();
        let err = load_billing(&mut session, &csv).unwrap_err();
        assert!(matches!(err, SessionError::TotalOverflow { what: "billing" }));
        assert!(session.billing().is_none());
    }

    #[test]
    fn reconciled_total_overflow_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("huge.csv");
        let eft = dir.path().join("twice.eft");
        fs::write(&csv, "SabreCode,TotalDue\n12,60000000000000000\n").unwrap();
        fs::write(&eft, format!("{HEADER}\n{LINE_12}\n{LINE_12}\n")).unwrap();
        let mut session = Session::default();
        load_billing(&mut session, &csv).unwrap();
        load_eft(&mut session, &eft).unwrap();
        let err = update_data(&mut session).unwrap_err();
        assert!(matches!(err, SessionError::TotalOverflow { what: "reconciled" }));
    }

    // ── outcomes ────────────────────────────────────────────────────────────

    #[test]
    fn commands_report_counts() {
        let dir = tempfile::tempdir().unwrap();
        let (csv, eft) = inputs(dir.path());
        let mut session = Session::default();

        let billing = load_billing(&mut session, &csv).unwrap();
        assert_eq!(billing.customers, 2);
        assert_eq!(billing.rows_read, 3);

        let loaded = load_eft(&mut session, &eft).unwrap();
        assert_eq!(loaded.records, 2);
        assert_eq!(loaded.columns, 9);
        assert!(loaded.issues.is_clean());

        let update = update_data(&mut session).unwrap();
        assert_eq!(update.matched, 1);
        assert_eq!(update.unmatched, 1);
        assert_eq!(update.billed_without_eft, vec!["0000099".to_string()]);

        let created = create_eft(&session, &dir.path().join("new.eft")).unwrap();
        assert_eq!(created.records, 2);
        assert!(created.verification.is_empty());
        let text = fs::read_to_string(dir.path().join("new.eft")).unwrap();
        assert!(text.contains("00000017250"));
        assert!(text.contains("00000000000"));

        let report = export_report(&session, &dir.path().join("r.xlsx")).unwrap();
        assert_eq!(report.rows, 2);
        assert_eq!(report.increases, 1);
        assert_eq!(report.decreases, 1);
    }

    #[test]
    fn run_writes_configured_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let (csv, eft) = inputs(dir.path());
        let mut config = RunConfig::default();
        config.input.billing_csv = Some(csv);
        config.input.eft_file = Some(eft);
        config.output.eft_file = Some(dir.path().join("new.eft"));

        let outcome = run(&config).unwrap();
        assert!(outcome.report.is_none());
        assert_eq!(outcome.eft_created.map(|c| c.records), Some(2));
        assert!(dir.path().join("new.eft").exists());

        let json = serde_json::to_value(run(&config).unwrap()).unwrap();
        assert_eq!(json["update"]["matched"], 1);
    }

    #[test]
    fn run_needs_both_inputs() {
        let err = run(&RunConfig::default()).unwrap_err();
        assert!(matches!(err, SessionError::MissingInput { what: "billing CSV" }));
    }

    #[test]
    fn text_rendering_lists_issue_sample() {
        let issues = IssueSummary {
            issue_count: 7,
            affected_lines: 3,
            sample: vec!["Line 2: a".to_string(); 5],
        };
        let loaded = EftLoaded {
            path: PathBuf::from("x.eft"),
            records: 3,
            columns: 9,
            column_counts: [8, 9].into_iter().collect(),
            blank_lines: 0,
            issues,
        };
        let text = loaded.to_string();
        assert!(text.contains("inconsistent column counts"));
        assert!(text.contains("3 rows had formatting issues (7 findings)"));
        assert!(text.contains("... and 2 more"));
    }
}
