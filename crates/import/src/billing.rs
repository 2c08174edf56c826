//! Bill-run CSV loading and per-customer aggregation.

use debitrun_core::{
    round_debit_amount, BillingRecord, BillingTable, Cents, CustomerCode, CustomerCodeError,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Where and how to find the two columns the aggregation needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingImportProfile {
    /// Accepted names for the customer identifier, in order of preference.
    pub code_columns: Vec<String>,
    pub amount_column: String,
    /// Used unless the file starts with a `sep=` directive.
    pub delimiter: u8,
}

impl Default for BillingImportProfile {
    fn default() -> Self {
        Self {
            code_columns: vec!["SabreCode".to_string(), "CustomerCode".to_string()],
            amount_column: "TotalDue".to_string(),
            delimiter: b',',
        }
    }
}

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("Malformed bill run {origin}: {reason}")]
    MalformedInput { origin: String, reason: String },
    #[error("Missing required column in {origin}: {column}")]
    MissingColumn { origin: String, column: String },
    #[error("Line {line}: invalid customer code: {source}")]
    InvalidCustomerCode {
        line: u64,
        #[source]
        source: CustomerCodeError,
    },
    #[error("Line {line}: invalid amount '{value}'")]
    InvalidAmount { line: u64, value: String },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl BillingError {
    /// Attaches the file the bill run came from to structural errors.
    pub fn with_origin(self, origin: &str) -> Self {
        match self {
            BillingError::MalformedInput { reason, .. } => BillingError::MalformedInput {
                origin: origin.to_string(),
                reason,
            },
            BillingError::MissingColumn { column, .. } => BillingError::MissingColumn {
                origin: origin.to_string(),
                column,
            },
            other => other,
        }
    }
}

/// An aggregated bill run plus what was read to produce it.
#[derive(Debug, Clone, Serialize)]
pub struct BillingImport {
    pub table: BillingTable,
    pub rows_read: usize,
    /// Rows without a customer code; they cannot be attributed to anyone.
    pub rows_without_code: usize,
}

pub struct BillingAggregator;

impl BillingAggregator {
    pub fn aggregate<R: Read>(
        reader: &mut csv::Reader<R>,
        profile: &BillingImportProfile,
        line_offset: u64,
    ) -> Result<BillingImport, BillingError> {
        let headers = reader.headers()?.clone();
        let code_col = profile
            .code_columns
            .iter()
            .find_map(|name| headers.iter().position(|h| h == name.as_str()))
            .ok_or_else(|| BillingError::MissingColumn {
                origin: "bill run".to_string(),
                column: profile.code_columns.join(" or "),
            })?;
        let amount_col = headers
            .iter()
            .position(|h| h == profile.amount_column)
            .ok_or_else(|| BillingError::MissingColumn {
                origin: "bill run".to_string(),
                column: profile.amount_column.clone(),
            })?;
        tracing::debug!(
            code_column = &headers[code_col],
            amount_column = &headers[amount_col],
            "bill run columns resolved"
        );

        // running total, row count, last contributing line
        let mut groups: BTreeMap<CustomerCode, (Decimal, usize, u64)> = BTreeMap::new();
        let mut rows_read = 0;
        let mut rows_without_code = 0;

        for result in reader.records() {
            let record = result?;
            if record.iter().all(|f| f.is_empty()) {
                continue;
            }
            rows_read += 1;
            let line = record.position().map(|p| p.line()).unwrap_or_default() + line_offset;

            let raw_code = record.get(code_col).unwrap_or_default();
            if raw_code.is_empty() {
                tracing::debug!(line, "bill run row has no customer code, skipped");
                rows_without_code += 1;
                continue;
            }
            let code = CustomerCode::normalize(raw_code)
                .map_err(|source| BillingError::InvalidCustomerCode { line, source })?;

            let raw_amount = record.get(amount_col).unwrap_or_default();
            let amount = parse_amount(raw_amount).ok_or_else(|| BillingError::InvalidAmount {
                line,
                value: raw_amount.to_string(),
            })?;

            let entry = groups.entry(code).or_insert((Decimal::ZERO, 0, line));
            entry.0 = entry.0.checked_add(amount).ok_or_else(|| BillingError::InvalidAmount {
                line,
                value: raw_amount.to_string(),
            })?;
            entry.1 += 1;
            entry.2 = line;
        }

        let mut records = Vec::with_capacity(groups.len());
        for (customer_code, (total, source_rows, line)) in groups {
            let marked_up =
                Cents::from_billed_total(total).ok_or_else(|| BillingError::InvalidAmount {
                    line,
                    value: total.to_string(),
                })?;
            let total_due = round_debit_amount(marked_up);
            tracing::debug!(
                code = %customer_code,
                billed = %total,
                marked_up = marked_up.value(),
                total_due = total_due.value(),
                "customer aggregated"
            );
            records.push(BillingRecord { customer_code, total_due, source_rows });
        }

        let table = BillingTable::new(records);
        tracing::info!(
            rows = rows_read,
            customers = table.len(),
            skipped = rows_without_code,
            "bill run aggregated"
        );
        Ok(BillingImport { table, rows_read, rows_without_code })
    }
}

/// Parses a bill-run amount in currency units. Blank counts as zero;
/// `$`, thousands separators and accounting parentheses are accepted.
fn parse_amount(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() {
        return Some(Decimal::ZERO);
    }
    let (negative, s) = if s.starts_with('(') && s.ends_with(')') {
        (true, &s[1..s.len() - 1])
    } else {
        (false, s)
    };
    let s = s.replace([',', '$', ' '], "");
    let dec = Decimal::from_str(&s).ok()?;
    Some(if negative { -dec } else { dec })
}

/// Splits off a leading `sep=` directive. Returns the delimiter it names
/// (if any), the remaining text, and how many lines were consumed.
fn strip_separator_directive(text: &str) -> (Option<u8>, &str, u64) {
    let first = text.lines().next().unwrap_or_default();
    match first.trim().strip_prefix("sep=") {
        Some(rest) => {
            let delimiter = rest.bytes().next().filter(u8::is_ascii);
            let body = text.split_once('\n').map(|(_, b)| b).unwrap_or_default();
            (delimiter, body, 1)
        }
        None => (None, text, 0),
    }
}

pub fn import_billing_csv<R: Read>(
    mut data: R,
    profile: &BillingImportProfile,
) -> Result<BillingImport, BillingError> {
    let mut bytes = Vec::new();
    data.read_to_end(&mut bytes)
        .map_err(|e| BillingError::MalformedInput {
            origin: "bill run".to_string(),
            reason: e.to_string(),
        })?;
    let text = String::from_utf8(bytes).map_err(|_| BillingError::MalformedInput {
        origin: "bill run".to_string(),
        reason: "not valid UTF-8".to_string(),
    })?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let (directive, body, line_offset) = strip_separator_directive(text);
    if line_offset > 0 {
        tracing::debug!(delimiter = ?directive.map(char::from), "skipping sep= directive line");
    }
    if body.trim().is_empty() {
        return Err(BillingError::MalformedInput {
            origin: "bill run".to_string(),
            reason: "file has no header row".to_string(),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(directive.unwrap_or(profile.delimiter))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    BillingAggregator::aggregate(&mut reader, profile, line_offset)
}

pub fn load_billing_csv(
    path: &Path,
    profile: &BillingImportProfile,
) -> Result<BillingImport, BillingError> {
    let origin = path.display().to_string();
    tracing::info!(path = %origin, "loading bill run");
    let file = std::fs::File::open(path).map_err(|e| BillingError::MalformedInput {
        origin: origin.clone(),
        reason: e.to_string(),
    })?;
    import_billing_csv(file, profile).map_err(|e| e.with_origin(&origin))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn import(data: &str) -> Result<BillingImport, BillingError> {
        import_billing_csv(data.as_bytes(), &BillingImportProfile::default())
    }

    fn due(import: &BillingImport, code: &str) -> Option<i64> {
        import.table.get(code).map(|r| r.total_due.value())
    }

    // ── parse_amount ──────────────────────────────────────────────────────────

    #[test]
    fn parse_amount_plain_and_decorated() {
        assert_eq!(parse_amount("123.45"), Decimal::from_str("123.45").ok());
        assert_eq!(parse_amount("$1,234.50"), Decimal::from_str("1234.50").ok());
        assert_eq!(parse_amount("(75.25)"), Decimal::from_str("-75.25").ok());
    }

    #[test]
    fn parse_amount_blank_is_zero() {
        assert_eq!(parse_amount(""), Some(Decimal::ZERO));
        assert_eq!(parse_amount("   "), Some(Decimal::ZERO));
    }

    #[test]
    fn parse_amount_invalid() {
        assert_eq!(parse_amount("n/a"), None);
    }

    // ── sep= directive ────────────────────────────────────────────────────────

    #[test]
    fn separator_directive_is_detected() {
        let (d, body, skipped) = strip_separator_directive("sep=;\nA;B\n");
        assert_eq!(d, Some(b';'));
        assert_eq!(body, "A;B\n");
        assert_eq!(skipped, 1);
    }

    #[test]
    fn no_directive_leaves_text_alone() {
        let (d, body, skipped) = strip_separator_directive("A,B\n1,2\n");
        assert_eq!(d, None);
        assert_eq!(body, "A,B\n1,2\n");
        assert_eq!(skipped, 0);
    }

    // ── aggregation ───────────────────────────────────────────────────────────

    #[test]
    fn rows_for_one_customer_are_summed_marked_up_and_padded() {
        let result = import("SabreCode,TotalDue\n12,100.0\n12,50.0\n").unwrap();
        assert_eq!(result.table.len(), 1);
        assert_eq!(due(&result, "0000012"), Some(17250));
        assert_eq!(
            result.table.get("0000012").unwrap().total_due.to_fixed_width(),
            "00000017250"
        );
        assert_eq!(result.table.get("0000012").unwrap().source_rows, 2);
    }

    #[test]
    fn trailing_four_after_markup_is_rounded() {
        // 10.80 * 1.15 * 100 = 1242 -> unchanged; 10.82 * 115 = 1244.3 -> 1244 -> 1245
        let result = import("SabreCode,TotalDue\n1,10.80\n2,10.82\n").unwrap();
        assert_eq!(due(&result, "0000001"), Some(1242));
        assert_eq!(due(&result, "0000002"), Some(1245));
    }

    #[test]
    fn amount_too_large_after_markup_names_its_line() {
        let err =
            import("SabreCode,TotalDue\n2,5\n1,70000000000000000000000000000\n").unwrap_err();
        assert!(matches!(err, BillingError::InvalidAmount { line: 3, .. }), "{err}");
    }

    #[test]
    fn group_sum_overflow_is_an_invalid_amount() {
        let err = import(
            "SabreCode,TotalDue\n1,50000000000000000000000000000\n1,50000000000000000000000000000\n",
        )
        .unwrap_err();
        match err {
            BillingError::InvalidAmount { line, value } => {
                assert_eq!(line, 3);
                assert_eq!(value, "50000000000000000000000000000");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn customers_that_overflow_together_still_load() {
        let result =
            import("SabreCode,TotalDue\n1,60000000000000000\n2,60000000000000000\n").unwrap();
        assert_eq!(result.table.len(), 2);
        assert_eq!(result.table.total(), None);
    }

    #[test]
    fn customer_code_column_alias_is_accepted() {
        let result = import("CustomerCode,Name,TotalDue\n42,Acme,20\n").unwrap();
        assert_eq!(due(&result, "0000042"), Some(2300));
    }

    #[test]
    fn sabre_code_wins_when_both_columns_exist() {
        let result = import("CustomerCode,SabreCode,TotalDue\n99,7,10\n").unwrap();
        assert!(result.table.get("0000007").is_some());
        assert!(result.table.get("0000099").is_none());
    }

    #[test]
    fn padded_and_unpadded_codes_group_together() {
        let result = import("SabreCode,TotalDue\n12,10\n0000012,10\n").unwrap();
        assert_eq!(result.table.len(), 1);
        assert_eq!(due(&result, "0000012"), Some(2300));
    }

    #[test]
    fn sep_directive_line_is_skipped() {
        let result = import("sep=,\nSabreCode,TotalDue\n5,1\n").unwrap();
        assert_eq!(due(&result, "0000005"), Some(115));
    }

    #[test]
    fn byte_order_mark_is_ignored() {
        let result = import("\u{feff}SabreCode,TotalDue\n5,1\n").unwrap();
        assert_eq!(due(&result, "0000005"), Some(115));
    }

    #[test]
    fn extra_columns_are_ignored() {
        let result = import("Branch,SabreCode,Notes,TotalDue\nX,3,hello,2.00\n").unwrap();
        assert_eq!(due(&result, "0000003"), Some(230));
    }

    #[test]
    fn rows_without_code_are_skipped_and_counted() {
        let result = import("SabreCode,TotalDue\n,10\n4,10\n").unwrap();
        assert_eq!(result.rows_read, 2);
        assert_eq!(result.rows_without_code, 1);
        assert_eq!(result.table.len(), 1);
    }

    #[test]
    fn missing_identifier_column_errors() {
        let err = import("Code,TotalDue\n1,2\n").unwrap_err();
        match err {
            BillingError::MissingColumn { column, .. } => {
                assert_eq!(column, "SabreCode or CustomerCode")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_amount_column_errors() {
        let err = import("SabreCode,Amount\n1,2\n").unwrap_err();
        assert!(matches!(err, BillingError::MissingColumn { column, .. } if column == "TotalDue"));
    }

    #[test]
    fn over_width_code_is_a_validation_error() {
        let err = import("SabreCode,TotalDue\n12345678,1\n").unwrap_err();
        assert!(matches!(
            err,
            BillingError::InvalidCustomerCode { line: 2, source: CustomerCodeError::TooLong { .. } }
        ));
    }

    #[test]
    fn non_numeric_amount_errors_with_line() {
        let err = import("SabreCode,TotalDue\n1,2\n1,abc\n").unwrap_err();
        assert!(matches!(err, BillingError::InvalidAmount { line: 3, .. }));
    }

    #[test]
    fn empty_file_is_malformed() {
        assert!(matches!(import(""), Err(BillingError::MalformedInput { .. })));
        assert!(matches!(import("sep=,\n"), Err(BillingError::MalformedInput { .. })));
    }

    #[test]
    fn header_only_file_gives_empty_table() {
        let result = import("SabreCode,TotalDue\n").unwrap();
        assert!(result.table.is_empty());
    }

    #[test]
    fn load_from_path_reports_origin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("billrun.csv");
        std::fs::write(&path, "Code,TotalDue\n1,2\n").unwrap();
        let err = load_billing_csv(&path, &BillingImportProfile::default()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("billrun.csv"), "{msg}");
    }

    #[test]
    fn load_missing_file_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_billing_csv(&dir.path().join("nope.csv"), &BillingImportProfile::default())
            .unwrap_err();
        assert!(matches!(err, BillingError::MalformedInput { .. }));
    }
}
