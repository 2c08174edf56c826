use std::collections::HashMap;

use debitrun_core::layout::column_label;
use debitrun_core::{
    BillingTable, Cents, CustomerCode, EftField, EftTable, ReconciledRecord, ReconciledTable,
};

/// Left join of the bill run onto the EFT file, keyed by customer code.
///
/// The EFT table is the spine: every record survives, in order, exactly
/// once. Its amount becomes the bill run's amount for the same code, or
/// zero when the bill run has nothing for that customer.
pub struct Reconciler;

impl Reconciler {
    pub fn reconcile(eft: &EftTable, billing: &BillingTable) -> ReconciledTable {
        let mut amounts: HashMap<&str, Cents> = HashMap::with_capacity(billing.len());
        for rec in billing.records() {
            amounts.entry(rec.customer_code.as_str()).or_insert(rec.total_due);
        }

        let records: Vec<ReconciledRecord> = eft
            .records
            .iter()
            .map(|rec| {
                let hit = amounts.get(rec.customer_code()).copied();
                if hit.is_none() {
                    tracing::debug!(
                        line = rec.line,
                        code = rec.customer_code(),
                        "no bill run amount, zeroed"
                    );
                }
                ReconciledRecord {
                    record: rec.clone(),
                    total_due: hit.unwrap_or(Cents::ZERO),
                    matched: hit.is_some(),
                }
            })
            .collect();

        // The amount always lands in the TotalDue position, even when the
        // loaded file was too narrow to have one.
        let width = eft.width().max(EftField::TotalDue.position() + 1);
        let columns = (0..width)
            .map(|pos| eft.columns.get(pos).cloned().unwrap_or_else(|| column_label(pos)))
            .collect();

        let table = ReconciledTable { header: eft.header.clone(), columns, records };
        tracing::info!(
            records = table.len(),
            matched = table.matched_count(),
            unmatched = table.unmatched_count(),
            "reconciliation complete"
        );
        table
    }
}

/// Bill-run customers that have no record in the EFT file. Their amounts
/// cannot be debited by the new file.
pub fn billed_without_eft<'a>(eft: &EftTable, billing: &'a BillingTable) -> Vec<&'a CustomerCode> {
    let known: std::collections::HashSet<&str> =
        eft.records.iter().map(|r| r.customer_code()).collect();
    billing
        .records()
        .iter()
        .map(|r| &r.customer_code)
        .filter(|code| !known.contains(code.as_str()))
        .collect()
}
