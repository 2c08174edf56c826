pub mod billing;
pub mod eft;
pub mod reconcile;

pub use billing::{
    load_billing_csv, BillingAggregator, BillingError, BillingImport, BillingImportProfile,
};
pub use eft::{load_eft_file, ColumnWidthReport, EftError, EftParser, ParseOptions, ParsedEft};
pub use reconcile::{billed_without_eft, Reconciler};

pub mod import {
    use crate::*;
    use debitrun_core::{BillingTable, EftTable, ReconciledTable};

    pub fn import_billing_csv<R: std::io::Read>(
        data: R,
        profile: &BillingImportProfile,
    ) -> Result<BillingImport, BillingError> {
        crate::billing::import_billing_csv(data, profile)
    }

    pub fn parse_eft(text: &str, options: ParseOptions) -> Result<ParsedEft, EftError> {
        EftParser::new(options).parse(text)
    }

    pub fn reconcile(eft: &EftTable, billing: &BillingTable) -> ReconciledTable {
        Reconciler::reconcile(eft, billing)
    }
}
