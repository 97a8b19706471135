pub mod error;
pub mod name_parser;
pub mod prompt;
pub mod rename_engine;
pub mod run_log;
pub mod settings;
pub mod workflow;

pub use error::RenameError;
pub use settings::Settings;
pub use workflow::{RunOptions, RunOutcome, RunSummary, Workflow};
