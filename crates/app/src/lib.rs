pub mod commands;
pub mod config;
pub mod logging;
pub mod session;

pub use commands::{
    create_eft, export_report, load_billing, load_eft, run, update_data, RunOutcome,
};
pub use config::{ConfigError, RunConfig};
pub use logging::init_logging;
pub use session::{Session, SessionError};
