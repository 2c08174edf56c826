use debitrun_core::{BillingTable, ReconciledTable};
use debitrun_import::{
    BillingError, BillingImportProfile, EftError, ParseOptions, ParsedEft, Reconciler,
};
use debitrun_report::{ExportError, ReportError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Please load a billing file first")]
    BillingNotLoaded,
    #[error("Please load an EFT file first")]
    EftNotLoaded,
    #[error("Please update data first")]
    NotReconciled,
    #[error("No data available to write")]
    NoData,
    #[error("Total of the {what} amounts is too large")]
    TotalOverflow { what: &'static str },
    #[error("No {what} given")]
    MissingInput { what: &'static str },
    #[error(transparent)]
    Billing(#[from] BillingError),
    #[error(transparent)]
    Eft(#[from] EftError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Holds at most one generation of each table. Replacing either input
/// discards the reconciled table, so a result never mixes two loads.
#[derive(Debug, Default)]
pub struct Session {
    pub options: ParseOptions,
    pub profile: BillingImportProfile,
    billing: Option<BillingTable>,
    eft: Option<ParsedEft>,
    reconciled: Option<ReconciledTable>,
}

impl Session {
    pub fn new(options: ParseOptions) -> Self {
        Self { options, ..Default::default() }
    }

    pub fn billing(&self) -> Option<&BillingTable> {
        self.billing.as_ref()
    }

    pub fn eft(&self) -> Option<&ParsedEft> {
        self.eft.as_ref()
    }

    pub fn reconciled(&self) -> Option<&ReconciledTable> {
        self.reconciled.as_ref()
    }

    pub fn set_billing(&mut self, table: BillingTable) {
        self.billing = Some(table);
        self.clear_reconciled();
    }

    pub fn set_eft(&mut self, parsed: ParsedEft) {
        self.eft = Some(parsed);
        self.clear_reconciled();
    }

    fn clear_reconciled(&mut self) {
        if self.reconciled.take().is_some() {
            tracing::debug!("input replaced, reconciled table discarded");
        }
    }

    /// Runs the join over the current tables and keeps the result.
    pub fn reconcile(&mut self) -> Result<&ReconciledTable, SessionError> {
        let billing = self.billing.as_ref().ok_or(SessionError::BillingNotLoaded)?;
        let eft = self.eft.as_ref().ok_or(SessionError::EftNotLoaded)?;
        let table = Reconciler::reconcile(&eft.table, billing);
        Ok(&*self.reconciled.insert(table))
    }

    pub fn require_reconciled(&self) -> Result<&ReconciledTable, SessionError> {
        self.reconciled.as_ref().ok_or(SessionError::NotReconciled)
    }

    pub fn require_eft(&self) -> Result<&ParsedEft, SessionError> {
        self.eft.as_ref().ok_or(SessionError::EftNotLoaded)
    }
}
