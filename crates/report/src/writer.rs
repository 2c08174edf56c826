//! Serializes a reconciled table back into the fixed-width EFT layout.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use debitrun_core::layout::{record_line_length, split_fields, FIELD_SEPARATOR};
use debitrun_core::{
    EftField, FormatIssue, HeaderLine, IssueSummary, OverflowWarning, ReconciledTable,
};
use serde::Serialize;

use crate::output::{write_atomic, ExportError};

/// A difference between the serialized text and what was meant to be
/// written, found by re-reading the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VerificationIssue {
    HeaderMismatch { expected: String, found: Option<String> },
    RecordCount { expected: usize, found: usize },
    LineLength { line: usize, expected: usize, found: usize },
    FieldMismatch { line: usize, expected: Vec<String>, found: Vec<String> },
}

impl fmt::Display for VerificationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationIssue::HeaderMismatch { .. } => write!(f, "header line was not preserved"),
            VerificationIssue::RecordCount { expected, found } => {
                write!(f, "expected {expected} record lines, found {found}")
            }
            VerificationIssue::LineLength { line, expected, found } => {
                write!(f, "Line {line}: length {found}, expected {expected}")
            }
            VerificationIssue::FieldMismatch { line, expected, found } => write!(
                f,
                "Line {line}: re-read {} fields, wrote {}",
                found.len(),
                expected.len()
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WriteOutput {
    pub text: String,
    pub records: usize,
    pub overflows: Vec<OverflowWarning>,
    pub verification: Vec<VerificationIssue>,
}

impl WriteOutput {
    pub fn summary(&self) -> IssueSummary {
        let issues: Vec<FormatIssue> =
            self.overflows.iter().cloned().map(FormatIssue::Overflow).collect();
        IssueSummary::from_issues(&issues)
    }

    pub fn is_verified(&self) -> bool {
        self.verification.is_empty()
    }

    pub fn save(&self, path: &Path) -> Result<(), ExportError> {
        write_atomic(path, self.text.as_bytes())?;
        tracing::info!(path = %path.display(), records = self.records, "EFT file saved");
        Ok(())
    }
}

pub struct FixedWidthRecordWriter;

impl FixedWidthRecordWriter {
    /// Header verbatim, then one line per record with the nine fields
    /// left-aligned in their widths and joined by two spaces. Values wider
    /// than their field are written whole and reported.
    pub fn write(header: &HeaderLine, table: &ReconciledTable) -> WriteOutput {
        if table.width() > EftField::ALL.len() {
            tracing::warn!(
                columns = table.width(),
                written = EftField::ALL.len(),
                "columns beyond the ninth are not written"
            );
        }

        let mut text = String::with_capacity((table.len() + 1) * (record_line_length() + 1));
        text.push_str(header.as_str());
        text.push('\n');

        let mut overflows = Vec::new();
        let mut written: Vec<Vec<String>> = Vec::with_capacity(table.len());

        for (idx, record) in table.records.iter().enumerate() {
            let line_no = idx + 2;
            let mut parts = Vec::with_capacity(EftField::ALL.len());
            let mut tokens = Vec::new();

            for field in EftField::ALL {
                let pos = field.position();
                let value: Cow<'_, str> = if pos < table.width() || field == EftField::TotalDue {
                    record.field_text(pos).unwrap_or_default()
                } else {
                    Cow::Borrowed(field.default_value())
                };

                if value.chars().count() > field.width() {
                    let warning = OverflowWarning {
                        line: line_no,
                        position: pos,
                        value: value.to_string(),
                        width: field.width(),
                    };
                    tracing::warn!("{warning}");
                    overflows.push(warning);
                }

                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    tokens.push(trimmed.to_string());
                }
                parts.push(format!("{:<width$}", value, width = field.width()));
            }

            text.push_str(&parts.join(FIELD_SEPARATOR));
            text.push('\n');
            written.push(tokens);
        }

        let overflowed: BTreeSet<usize> = overflows.iter().map(|w| w.line).collect();
        let verification = verify(header, &text, &written, &overflowed);
        for issue in &verification {
            tracing::warn!(%issue, "written EFT text failed verification");
        }

        tracing::info!(
            records = table.len(),
            overflows = overflows.len(),
            verified = verification.is_empty(),
            "EFT text serialized"
        );
        WriteOutput { text, records: table.len(), overflows, verification }
    }
}

/// Re-reads serialized text. Record lines must tokenize back to the values
/// written and, unless a field overflowed, have the nominal line length.
fn verify(
    header: &HeaderLine,
    text: &str,
    written: &[Vec<String>],
    overflowed: &BTreeSet<usize>,
) -> Vec<VerificationIssue> {
    let mut issues = Vec::new();
    let mut lines = text.lines();

    let first = lines.next();
    if first != Some(header.as_str()) {
        issues.push(VerificationIssue::HeaderMismatch {
            expected: header.as_str().to_string(),
            found: first.map(str::to_string),
        });
    }

    let records: Vec<&str> = lines.collect();
    if records.len() != written.len() {
        issues.push(VerificationIssue::RecordCount {
            expected: written.len(),
            found: records.len(),
        });
    }

    let expected_len = record_line_length();
    for (idx, (line, tokens)) in records.iter().zip(written).enumerate() {
        let line_no = idx + 2;
        let found = line.chars().count();
        if found != expected_len && !overflowed.contains(&line_no) {
            issues.push(VerificationIssue::LineLength {
                line: line_no,
                expected: expected_len,
                found,
            });
        }
        let reread = split_fields(line);
        if &reread != tokens {
            issues.push(VerificationIssue::FieldMismatch {
                line: line_no,
                expected: tokens.clone(),
                found: reread,
            });
        }
    }
    issues
}
