// Error taxonomy for the ledger core
//
// Validation errors describe bad input, UnknownCategory and InvalidRange are
// reported on their own, and the remaining variants wrap infrastructure
// failures. An empty match is never an error: it surfaces as None or [].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    // ========================================================================
    // VALIDATION
    // ========================================================================
    #[error("Cannot enter empty description")]
    EmptyDescription,

    #[error("Amount must be a real number, got '{0}'")]
    InvalidAmount(String),

    #[error("Could not read date '{0}', must follow format YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Selection must be one of: all, positive, negative (got '{0}')")]
    InvalidSelector(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Expected 4 fields (category, description, amount, date), found {0}")]
    MalformedLine(usize),

    // ========================================================================
    // LOOKUP & RANGE
    // ========================================================================
    #[error("Unrecognized category: {0}")]
    UnknownCategory(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    // ========================================================================
    // INFRASTRUCTURE
    // ========================================================================
    #[error("Ledger already exists at '{0}'")]
    LedgerExists(String),

    #[error("No ledger found at '{0}'")]
    LedgerMissing(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl LedgerError {
    /// True for errors caused by the caller's input rather than the ledger.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LedgerError::EmptyDescription
                | LedgerError::InvalidAmount(_)
                | LedgerError::InvalidDate(_)
                | LedgerError::InvalidSelector(_)
                | LedgerError::MissingParameter(_)
                | LedgerError::MalformedLine(_)
                | LedgerError::UnknownCategory(_)
                | LedgerError::InvalidRange(_)
        )
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        assert!(LedgerError::EmptyDescription.is_validation());
        assert!(LedgerError::UnknownCategory("Rent".to_string()).is_validation());
        assert!(LedgerError::InvalidRange("start after end".to_string()).is_validation());
        assert!(!LedgerError::LedgerExists("ledger.db".to_string()).is_validation());
        assert!(!LedgerError::LedgerMissing("ledger.db".to_string()).is_validation());

        let storage: LedgerError = rusqlite::Error::InvalidQuery.into();
        assert!(!storage.is_validation());
    }

    #[test]
    fn test_messages_name_the_offending_value() {
        let err = LedgerError::InvalidDate("2024/01/05".to_string());
        assert!(err.to_string().contains("2024/01/05"));

        let err = LedgerError::MalformedLine(3);
        assert!(err.to_string().contains("found 3"));
    }
}
