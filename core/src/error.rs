use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by the catalog.
///
/// Lookups that find nothing are not errors: read paths return `Option` or
/// an empty `Vec` instead.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O, connection or any other storage failure. Fatal to the current
    /// operation; a fresh connection may be retried by the caller.
    #[error("Storage error while {op}: {source}")]
    Storage {
        op: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Invalid foreign key, non-positive quantity or duplicate unique name.
    /// Recoverable by correcting the input.
    #[error("Constraint violated: {0}")]
    Constraint(String),
}

impl Error {
    /// Classify a storage failure by its SQLite error code.
    pub(crate) fn from_sqlite(op: impl Into<String>, err: rusqlite::Error) -> Self {
        let op = op.into();
        if err.sqlite_error_code() == Some(rusqlite::ErrorCode::ConstraintViolation) {
            Error::Constraint(format!("{op}: {err}"))
        } else {
            Error::Storage { op, source: err }
        }
    }

    pub fn is_constraint(&self) -> bool {
        matches!(self, Error::Constraint(_))
    }
}

/// Attach an operation description to a rusqlite result.
pub(crate) trait StorageContext<T> {
    fn storage(self, op: &str) -> Result<T>;
}

impl<T> StorageContext<T> for rusqlite::Result<T> {
    fn storage(self, op: &str) -> Result<T> {
        self.map_err(|e| Error::from_sqlite(op, e))
    }
}
