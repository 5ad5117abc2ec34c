//! Errors from loading annotations and querying the database.

use std::io;

//-----------------------------------------------------------------------------

/// Error type for overlap-base operations.
///
/// Every error is fatal: nothing is retried and no partial results are returned.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The annotation source is unreadable, malformed, or missing required columns.
    #[error("Failed to load annotations: {0}")]
    Load(String),

    /// The database could not be created, initialized, or populated.
    #[error("Failed to set up the database: {0}")]
    Schema(String),

    /// The overlap join or label resolution failed.
    #[error("Query failed: {0}")]
    Query(String),

    /// Writing the output failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn load<E: ToString>(err: E) -> Self {
        Error::Load(err.to_string())
    }

    pub(crate) fn schema<E: ToString>(err: E) -> Self {
        Error::Schema(err.to_string())
    }

    pub(crate) fn query<E: ToString>(err: E) -> Self {
        Error::Query(err.to_string())
    }
}

/// Result type alias for overlap-base operations.
pub type Result<T> = std::result::Result<T, Error>;

//-----------------------------------------------------------------------------
