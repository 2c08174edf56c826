//! Advisory findings. Nothing here ever changes a parsed or written record;
//! warnings travel next to the primary result and are summarized for the
//! operator.

use serde::Serialize;
use std::fmt;

use crate::layout::EftField;

/// How many individual messages a summary keeps for display.
pub const SAMPLE_LIMIT: usize = 5;

/// A token started at a different column than the header's matching run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlignmentWarning {
    /// One-based line number in the source file.
    pub line: usize,
    /// One-based field index.
    pub field: usize,
    pub start: usize,
    pub header_start: usize,
}

impl fmt::Display for AlignmentWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Line {}: Field {} starts at position {} but header field starts at {}",
            self.line, self.field, self.start, self.header_start
        )
    }
}

/// A field value is wider than the layout allows. It is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverflowWarning {
    /// One-based line (parser) or row (writer) number.
    pub line: usize,
    /// Zero-based field position.
    pub position: usize,
    pub value: String,
    pub width: usize,
}

impl OverflowWarning {
    pub fn field_name(&self) -> String {
        EftField::ALL
            .get(self.position)
            .map(|f| f.name().to_string())
            .unwrap_or_else(|| format!("Column {}", self.position + 1))
    }
}

impl fmt::Display for OverflowWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Line {}: Field '{}' value '{}' exceeds max width {}",
            self.line,
            self.field_name(),
            self.value,
            self.width
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FormatIssue {
    Alignment(AlignmentWarning),
    Overflow(OverflowWarning),
}

impl FormatIssue {
    pub fn line(&self) -> usize {
        match self {
            FormatIssue::Alignment(w) => w.line,
            FormatIssue::Overflow(w) => w.line,
        }
    }
}

impl fmt::Display for FormatIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatIssue::Alignment(w) => fmt::Display::fmt(w, f),
            FormatIssue::Overflow(w) => fmt::Display::fmt(w, f),
        }
    }
}

/// Aggregate view of a set of issues: totals plus the first few messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IssueSummary {
    pub issue_count: usize,
    /// Distinct lines/rows with at least one issue.
    pub affected_lines: usize,
    pub sample: Vec<String>,
}

impl IssueSummary {
    pub fn from_issues(issues: &[FormatIssue]) -> Self {
        let mut lines: Vec<usize> = issues.iter().map(FormatIssue::line).collect();
        lines.sort_unstable();
        lines.dedup();
        IssueSummary {
            issue_count: issues.len(),
            affected_lines: lines.len(),
            sample: issues.iter().take(SAMPLE_LIMIT).map(|i| i.to_string()).collect(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.issue_count == 0
    }
}

impl fmt::Display for IssueSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            return write!(f, "no formatting issues");
        }
        write!(
            f,
            "{} rows had formatting issues ({} findings)",
            self.affected_lines, self.issue_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overflow(line: usize) -> FormatIssue {
        FormatIssue::Overflow(OverflowWarning {
            line,
            position: 5,
            value: "A COMPANY NAME THAT IS FAR TOO LONG".into(),
            width: 20,
        })
    }

    #[test]
    fn overflow_message_names_field() {
        let msg = overflow(3).to_string();
        assert!(msg.contains("CompanyName"), "{msg}");
        assert!(msg.contains("exceeds max width 20"), "{msg}");
    }

    #[test]
    fn alignment_message() {
        let w = AlignmentWarning { line: 2, field: 3, start: 12, header_start: 10 };
        assert_eq!(
            w.to_string(),
            "Line 2: Field 3 starts at position 12 but header field starts at 10"
        );
    }

    #[test]
    fn summary_counts_lines_once_and_caps_sample() {
        let issues: Vec<FormatIssue> = (0..8).map(|i| overflow(2 + i / 2)).collect();
        let s = IssueSummary::from_issues(&issues);
        assert_eq!(s.issue_count, 8);
        assert_eq!(s.affected_lines, 4);
        assert_eq!(s.sample.len(), SAMPLE_LIMIT);
        assert_eq!(s.to_string(), "4 rows had formatting issues (8 findings)");
    }

    #[test]
    fn empty_summary_is_clean() {
        let s = IssueSummary::from_issues(&[]);
        assert!(s.is_clean());
        assert_eq!(s.to_string(), "no formatting issues");
    }
}
