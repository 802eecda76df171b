// ⚠️ Error Taxonomy
// Every failure path in the core returns one of these, never a default value

use thiserror::Error;

/// Errors surfaced by the interpreter and the ledger engine
#[derive(Debug, Error)]
pub enum LedgerError {
    /// No direction keyword or no amount could be found in the text
    #[error("could not understand the message")]
    Unparsable,

    /// Reporting period outside the calendar (e.g. month 13)
    #[error("invalid reporting period: {0}")]
    InvalidPeriod(String),

    /// Caller passed a negative or non-finite amount
    #[error("invalid amount: {0}")]
    InvalidAmount(f64),

    /// The record store could not be read or written
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl From<rusqlite::Error> for LedgerError {
    fn from(err: rusqlite::Error) -> Self {
        LedgerError::StorageUnavailable(err.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for LedgerError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        LedgerError::StorageUnavailable("store lock poisoned".to_string())
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_error_maps_to_storage_unavailable() {
        let err: LedgerError = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(err, LedgerError::StorageUnavailable(_)));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            LedgerError::InvalidAmount(-5.0).to_string(),
            "invalid amount: -5"
        );
        assert_eq!(
            LedgerError::InvalidPeriod("month 13".to_string()).to_string(),
            "invalid reporting period: month 13"
        );
        assert_eq!(
            LedgerError::Unparsable.to_string(),
            "could not understand the message"
        );
    }
}
