use std::path::PathBuf;
use thiserror::Error;

use crate::entities::ValueError;

/// Failures a repository can report besides the ordinary
/// "duplicate" / "not found" outcomes
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("stored lot {bean_id} cannot be read: {message}")]
    Corrupt { bean_id: String, message: String },

    #[error(transparent)]
    Value(#[from] ValueError),

    #[error("total inventory value is outside the representable decimal range")]
    TotalOverflow,

    #[error("total inventory value needs more than 28 decimal places")]
    TotalInexact,

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
