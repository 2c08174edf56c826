pub mod billing;
pub mod customer;
pub mod diagnostics;
pub mod eft;
pub mod layout;
pub mod money;
pub mod reconciled;
pub mod rounding;

pub use billing::{BillingRecord, BillingTable};
pub use customer::{CustomerCode, CustomerCodeError, CUSTOMER_CODE_WIDTH};
pub use diagnostics::{AlignmentWarning, FormatIssue, IssueSummary, OverflowWarning};
pub use eft::{EftRecord, EftTable, HeaderLine};
pub use layout::{EftField, FIELD_WIDTHS};
pub use money::Cents;
pub use reconciled::{ReconciledRecord, ReconciledTable};
pub use rounding::round_debit_amount;
