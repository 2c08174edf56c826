use serde::Serialize;
use std::borrow::Cow;

use crate::eft::{EftRecord, HeaderLine};
use crate::layout::EftField;
use crate::money::Cents;

/// An EFT record carrying this run's amount in place of the prior one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciledRecord {
    pub record: EftRecord,
    /// Billing amount for the customer, or zero when the bill run had none.
    pub total_due: Cents,
    pub matched: bool,
}

impl ReconciledRecord {
    pub fn customer_code(&self) -> &str {
        self.record.customer_code()
    }

    /// Text of the field at `position`, with the amount column rendered
    /// from `total_due`. `None` when the record has no such column.
    pub fn field_text(&self, position: usize) -> Option<Cow<'_, str>> {
        if position == EftField::TotalDue.position() {
            return Some(Cow::Owned(self.total_due.to_fixed_width()));
        }
        self.record.field(position).map(Cow::Borrowed)
    }
}

/// Result of one reconciliation run. Always one record per EFT record, in
/// the EFT file's order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciledTable {
    pub header: HeaderLine,
    pub columns: Vec<String>,
    pub records: Vec<ReconciledRecord>,
}

impl ReconciledTable {
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn matched_count(&self) -> usize {
        self.records.iter().filter(|r| r.matched).count()
    }

    pub fn unmatched_count(&self) -> usize {
        self.len() - self.matched_count()
    }

    /// Sum of every debit amount, or `None` if it overflows.
    pub fn total_due(&self) -> Option<Cents> {
        Cents::checked_sum(self.records.iter().map(|r| r.total_due))
    }
}
