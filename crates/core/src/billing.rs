use serde::Serialize;

use crate::customer::CustomerCode;
use crate::money::Cents;

/// One customer's debit amount for the run, already marked up and rounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BillingRecord {
    pub customer_code: CustomerCode,
    pub total_due: Cents,
    /// Number of bill-run rows folded into this record.
    pub source_rows: usize,
}

/// Aggregated bill run, one record per customer code, ordered by code.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BillingTable {
    records: Vec<BillingRecord>,
}

impl BillingTable {
    /// Builds a table from records in any order. When a code repeats, the
    /// first record wins and later ones are dropped.
    pub fn new(records: Vec<BillingRecord>) -> Self {
        let mut seen = std::collections::HashSet::new();
        let mut records: Vec<BillingRecord> = records
            .into_iter()
            .filter(|r| seen.insert(r.customer_code.clone()))
            .collect();
        records.sort_by(|a, b| a.customer_code.cmp(&b.customer_code));
        Self { records }
    }

    pub fn records(&self) -> &[BillingRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, code: &str) -> Option<&BillingRecord> {
        self.records
            .binary_search_by(|r| r.customer_code.as_str().cmp(code))
            .ok()
            .map(|idx| &self.records[idx])
    }

    /// Sum of every debit amount, or `None` if it overflows.
    pub fn total(&self) -> Option<Cents> {
        Cents::checked_sum(self.records.iter().map(|r| r.total_due))
    }
}
