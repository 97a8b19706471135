use std::path::PathBuf;

use thiserror::Error;

/// Errors that end a rename run early.
///
/// Per-file rename failures are not errors here; they are recorded in
/// [`crate::rename_engine::RenameResult`] and the run carries on.
#[derive(Debug, Error)]
pub enum RenameError {
    #[error("folder '{}' is not usable: {reason}", path.display())]
    InvalidFolder { path: PathBuf, reason: String },

    #[error("no media files found in '{}'", path.display())]
    NoFilesFound { path: PathBuf },

    #[error("no renames could be planned (no episode numbers found)")]
    NoPlanGenerated,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid settings: {0}")]
    Settings(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RenameError {
    /// Runs that end this way are reported as warnings, not failures.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::NoFilesFound { .. } | Self::NoPlanGenerated)
    }

    /// The operator closed standard input.
    pub fn is_input_closed(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
    }
}
