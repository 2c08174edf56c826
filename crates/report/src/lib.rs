pub mod output;
pub mod report;
pub mod writer;
pub mod xlsx;

pub use output::{write_atomic, ExportError};
pub use report::{Movement, ReportBuilder, ReportError, ReportRow, REPORT_COLUMNS};
pub use writer::{FixedWidthRecordWriter, VerificationIssue, WriteOutput};
pub use xlsx::{export_report, ExportSummary};
