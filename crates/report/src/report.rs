use std::cmp::Ordering;
use std::collections::HashMap;
use std::str::FromStr;

use debitrun_core::{EftField, EftTable, ReconciledTable};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Missing required column: {column}")]
    MissingColumn { column: String },
}

/// Report column headings, in output order.
pub const REPORT_COLUMNS: [&str; 7] = [
    "SabreCode",
    "BranchCode",
    "AccNumber",
    "CompanyName",
    "TotalDue",
    "PrevMonthTotalDue",
    "Difference",
];

const IDENTIFYING: [EftField; 4] = [
    EftField::CustomerCode,
    EftField::BranchCode,
    EftField::AccountNumber,
    EftField::CompanyName,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Movement {
    Decrease,
    Unchanged,
    Increase,
}

/// One customer's current and prior debit, in currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub customer_code: String,
    pub branch_code: String,
    pub account_number: String,
    pub company_name: String,
    pub current: Decimal,
    /// `None` when the prior file had no readable amount for the code.
    pub prior: Option<Decimal>,
    pub delta: Option<Decimal>,
}

impl ReportRow {
    pub fn movement(&self) -> Option<Movement> {
        self.delta.map(|d| match d.cmp(&Decimal::ZERO) {
            Ordering::Less => Movement::Decrease,
            Ordering::Equal => Movement::Unchanged,
            Ordering::Greater => Movement::Increase,
        })
    }
}

pub struct ReportBuilder;

impl ReportBuilder {
    /// Pairs every reconciled record with the amount its own source line
    /// carried in `original`, so repeated customer codes keep their own
    /// prior amounts.
    pub fn build(
        reconciled: &ReconciledTable,
        original: &EftTable,
    ) -> Result<Vec<ReportRow>, ReportError> {
        let mut positions = [0usize; 4];
        for (slot, field) in positions.iter_mut().zip(IDENTIFYING) {
            *slot = reconciled.column_index(field.name()).ok_or_else(|| {
                ReportError::MissingColumn { column: field.name().to_string() }
            })?;
        }

        let prior_by_line: HashMap<usize, Option<Decimal>> = original
            .records
            .iter()
            .map(|rec| (rec.line, rec.get(EftField::TotalDue).and_then(prior_amount)))
            .collect();

        let rows: Vec<ReportRow> = reconciled
            .records
            .iter()
            .map(|rec| {
                let text = |pos: usize| rec.record.field(pos).unwrap_or_default().to_string();
                let current = rec.total_due.to_decimal();
                let prior = prior_by_line.get(&rec.record.line).copied().flatten();
                ReportRow {
                    customer_code: text(positions[0]),
                    branch_code: text(positions[1]),
                    account_number: text(positions[2]),
                    company_name: text(positions[3]),
                    current,
                    prior,
                    delta: prior.map(|p| current - p),
                }
            })
            .collect();

        let unreadable = rows.iter().filter(|r| r.prior.is_none()).count();
        if unreadable > 0 {
            tracing::warn!(rows = unreadable, "prior amount missing or not numeric");
        }
        tracing::info!(rows = rows.len(), "report rows built");
        Ok(rows)
    }
}

/// Prior amount field in currency units. The field holds minor units;
/// integer or decimal text is accepted, anything else (blank included) has
/// no prior value.
fn prior_amount(text: &str) -> Option<Decimal> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let mut amount = Decimal::from_str(text).ok()?;
    // minor units to currency units, keeping every written digit
    amount.set_scale(amount.scale() + 2).ok()?;
    Some(amount)
}
