//! The fixed-width EFT record layout.
//!
//! Nine fields, each left-aligned in a fixed width, joined by exactly two
//! spaces with no trailing separator. Reading is looser than writing: a line
//! is tokenized on runs of two or more spaces, because files in the wild
//! drift from the nominal widths.

use regex::Regex;
use std::sync::OnceLock;

/// Two literal spaces between adjacent fields.
pub const FIELD_SEPARATOR: &str = "  ";

/// Amount written for customers with nothing due.
pub const ZERO_AMOUNT: &str = "00000000000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EftField {
    CustomerCode,
    Field2,
    Field3,
    BranchCode,
    AccountNumber,
    CompanyName,
    TotalDue,
    Radio,
    Flag,
}

impl EftField {
    pub const ALL: [EftField; 9] = [
        EftField::CustomerCode,
        EftField::Field2,
        EftField::Field3,
        EftField::BranchCode,
        EftField::AccountNumber,
        EftField::CompanyName,
        EftField::TotalDue,
        EftField::Radio,
        EftField::Flag,
    ];

    /// Zero-based position of the field within a record.
    pub fn position(self) -> usize {
        self as usize
    }

    pub fn width(self) -> usize {
        FIELD_WIDTHS[self.position()]
    }

    pub fn name(self) -> &'static str {
        match self {
            EftField::CustomerCode => "SabreCode",
            EftField::Field2 => "Col2",
            EftField::Field3 => "Col3",
            EftField::BranchCode => "BranchCode",
            EftField::AccountNumber => "AccNumber",
            EftField::CompanyName => "CompanyName",
            EftField::TotalDue => "TotalDue",
            EftField::Radio => "SabreRadio",
            EftField::Flag => "NValue",
        }
    }

    /// Value written when the loaded table never had this column.
    pub fn default_value(self) -> &'static str {
        match self {
            EftField::Radio => "SABRE RADIO",
            EftField::Flag => "N",
            _ => "",
        }
    }
}

/// Declared widths of the nine fields, in position order.
pub const FIELD_WIDTHS: [usize; 9] = [7, 1, 1, 6, 19, 20, 11, 15, 1];

/// Length of a record line when no field overflows.
pub fn record_line_length() -> usize {
    FIELD_WIDTHS.iter().sum::<usize>() + FIELD_SEPARATOR.len() * (FIELD_WIDTHS.len() - 1)
}

/// Column label for a loaded table. Only the positions the reconciliation
/// and report need get names; the rest are numbered from one.
pub fn column_label(position: usize) -> String {
    let named = match position {
        0 => Some(EftField::CustomerCode),
        3 => Some(EftField::BranchCode),
        4 => Some(EftField::AccountNumber),
        5 => Some(EftField::CompanyName),
        6 => Some(EftField::TotalDue),
        _ => None,
    };
    match named {
        Some(field) => field.name().to_string(),
        None => format!("Column {}", position + 1),
    }
}

fn field_break() -> &'static Regex {
    static BREAK: OnceLock<Regex> = OnceLock::new();
    BREAK.get_or_init(|| Regex::new(" {2,}").expect("invalid regex"))
}

/// Splits a record line on runs of two or more spaces. Tokens are trimmed
/// and empty tokens dropped, so single spaces inside a value (company
/// names, "SABRE RADIO") survive.
pub fn split_fields(line: &str) -> Vec<String> {
    field_break()
        .split(line)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Inclusive `(start, end)` character offsets of each run of non-space
/// characters in `line`.
pub fn non_space_spans(line: &str) -> Vec<(usize, usize)> {
    let mut spans: Vec<(usize, usize)> = Vec::new();
    let mut current: Option<(usize, usize)> = None;
    for (pos, ch) in line.chars().enumerate() {
        if ch == ' ' {
            if let Some(span) = current.take() {
                spans.push(span);
            }
        } else {
            current = match current {
                Some((start, _)) => Some((start, pos)),
                None => Some((pos, pos)),
            };
        }
    }
    if let Some(span) = current {
        spans.push(span);
    }
    spans
}
