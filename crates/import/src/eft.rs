//! Fixed-width EFT file parsing.
//!
//! Line one is the header and is kept verbatim. Every other non-blank line
//! is split on runs of two or more spaces, then all rows are normalized to
//! the widest row's column count. Alignment and width checks against the
//! header run beside the parse and only ever add to the report.

use debitrun_core::diagnostics::IssueSummary;
use debitrun_core::layout::{column_label, non_space_spans, split_fields};
use debitrun_core::{
    AlignmentWarning, EftRecord, EftTable, FormatIssue, HeaderLine, OverflowWarning, FIELD_WIDTHS,
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EftError {
    #[error("Malformed EFT file {origin}: {reason}")]
    MalformedInput { origin: String, reason: String },
}

impl EftError {
    pub fn with_origin(self, origin: &str) -> Self {
        match self {
            EftError::MalformedInput { reason, .. } => EftError::MalformedInput {
                origin: origin.to_string(),
                reason,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ParseOptions {
    /// Compare each line against the header and the layout widths.
    pub diagnostics: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { diagnostics: true }
    }
}

/// Column-count and alignment findings for one loaded file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ColumnWidthReport {
    pub max_columns: usize,
    /// Every distinct token count seen across record lines.
    pub column_counts: BTreeSet<usize>,
    /// Non-space runs of the header line.
    pub header_spans: Vec<(usize, usize)>,
    pub padded_rows: usize,
    pub trimmed_rows: usize,
    pub blank_lines: usize,
    pub issues: Vec<FormatIssue>,
}

impl ColumnWidthReport {
    pub fn is_consistent(&self) -> bool {
        self.column_counts.len() <= 1
    }

    pub fn summary(&self) -> IssueSummary {
        IssueSummary::from_issues(&self.issues)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ParsedEft {
    pub table: EftTable,
    pub report: ColumnWidthReport,
}

pub struct EftParser {
    options: ParseOptions,
}

impl EftParser {
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    pub fn parse(&self, text: &str) -> Result<ParsedEft, EftError> {
        let mut lines = text.lines();
        let header = lines.next().ok_or_else(|| EftError::MalformedInput {
            origin: "EFT input".to_string(),
            reason: "file is empty".to_string(),
        })?;
        tracing::debug!(header, length = header.chars().count(), "EFT header");

        let mut report = ColumnWidthReport {
            header_spans: non_space_spans(header),
            ..Default::default()
        };
        let mut rows: Vec<EftRecord> = Vec::new();

        for (idx, line) in lines.enumerate() {
            let line_no = idx + 2;
            if line.trim().is_empty() {
                tracing::debug!(line = line_no, "blank line skipped");
                report.blank_lines += 1;
                continue;
            }

            if self.options.diagnostics {
                self.check_alignment(line_no, line, &mut report);
            }

            let fields = split_fields(line);
            if self.options.diagnostics {
                check_widths(line_no, &fields, &mut report);
            }
            tracing::debug!(line = line_no, columns = fields.len(), "record tokenized");

            report.column_counts.insert(fields.len());
            if fields.len() > report.max_columns {
                tracing::debug!(
                    from = report.max_columns,
                    to = fields.len(),
                    line = line_no,
                    "max column count raised"
                );
                report.max_columns = fields.len();
            }
            rows.push(EftRecord::new(line_no, fields));
        }

        let width = report.max_columns;
        for row in &mut rows {
            if row.fields.len() < width {
                tracing::debug!(line = row.line, from = row.fields.len(), to = width, "row padded");
                row.fields.resize(width, String::new());
                report.padded_rows += 1;
            } else if row.fields.len() > width {
                // W is the maximum, so only a broken invariant lands here.
                tracing::debug!(line = row.line, from = row.fields.len(), to = width, "row trimmed");
                row.fields.truncate(width);
                report.trimmed_rows += 1;
            }
        }

        if !report.is_consistent() {
            tracing::warn!(counts = ?report.column_counts, "inconsistent column counts");
        }
        let summary = report.summary();
        if summary.is_clean() {
            tracing::info!("no formatting issues detected");
        } else {
            tracing::warn!(
                issues = summary.issue_count,
                lines = summary.affected_lines,
                "formatting issues detected"
            );
        }

        let table = EftTable {
            header: HeaderLine::new(header),
            columns: (0..width).map(column_label).collect(),
            records: rows,
        };
        tracing::info!(records = table.len(), columns = width, "EFT file parsed");
        Ok(ParsedEft { table, report })
    }

    fn check_alignment(&self, line_no: usize, line: &str, report: &mut ColumnWidthReport) {
        for (i, (start, _)) in non_space_spans(line).into_iter().enumerate() {
            let Some(&(header_start, _)) = report.header_spans.get(i) else {
                break;
            };
            if start != header_start {
                let warning = AlignmentWarning { line: line_no, field: i + 1, start, header_start };
                tracing::debug!("{warning}");
                report.issues.push(FormatIssue::Alignment(warning));
            }
        }
    }
}

fn check_widths(line_no: usize, fields: &[String], report: &mut ColumnWidthReport) {
    for (position, (value, &width)) in fields.iter().zip(FIELD_WIDTHS.iter()).enumerate() {
        if value.chars().count() > width {
            let warning = OverflowWarning { line: line_no, position, value: value.clone(), width };
            tracing::debug!("{warning}");
            report.issues.push(FormatIssue::Overflow(warning));
        }
    }
}

pub fn parse_eft(text: &str, options: ParseOptions) -> Result<ParsedEft, EftError> {
    EftParser::new(options).parse(text)
}

pub fn load_eft_file(path: &Path, options: ParseOptions) -> Result<ParsedEft, EftError> {
    let origin = path.display().to_string();
    tracing::info!(path = %origin, "loading EFT file");
    let bytes = std::fs::read(path).map_err(|e| EftError::MalformedInput {
        origin: origin.clone(),
        reason: e.to_string(),
    })?;
    let text = String::from_utf8(bytes).map_err(|_| EftError::MalformedInput {
        origin: origin.clone(),
        reason: "not valid UTF-8".to_string(),
    })?;
    parse_eft(&text, options).map_err(|e| e.with_origin(&origin))
}
