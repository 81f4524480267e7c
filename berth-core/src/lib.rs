pub mod booking;
pub mod clock;
pub mod events;
pub mod identity;
pub mod repository;
pub mod search;

use serde::Serialize;
use std::fmt;

/// Machine-distinguishable error kinds surfaced to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    InvalidRequest,
    NotFound,
    Forbidden,
    CapacityExceeded,
    InvalidState,
    InternalConfig,
    Unexpected,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidRequest => "InvalidRequest",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::CapacityExceeded => "CapacityExceeded",
            ErrorKind::InvalidState => "InvalidState",
            ErrorKind::InternalConfig => "InternalConfig",
            ErrorKind::Unexpected => "Unexpected",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("Only {available} seats available in {class} class")]
    CapacityExceeded { class: String, requested: i64, available: i64 },
    #[error("{0}")]
    InvalidState(String),
    #[error("Configuration fault: {0}")]
    InternalConfig(String),
    #[error("Unexpected failure: {0}")]
    Unexpected(String),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            CoreError::NotFound(_) => ErrorKind::NotFound,
            CoreError::Forbidden(_) => ErrorKind::Forbidden,
            CoreError::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            CoreError::InvalidState(_) => ErrorKind::InvalidState,
            CoreError::InternalConfig(_) => ErrorKind::InternalConfig,
            CoreError::Unexpected(_) => ErrorKind::Unexpected,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        CoreError::InvalidRequest(message.into())
    }
}

impl From<repository::LedgerError> for CoreError {
    fn from(err: repository::LedgerError) -> Self {
        use repository::LedgerError;
        match err {
            LedgerError::NotFound(pnr) => CoreError::NotFound(format!("Booking {}", pnr)),
            LedgerError::AlreadyCancelled(_) => CoreError::InvalidState("Booking already cancelled".to_string()),
            LedgerError::DuplicateTrain(number) => {
                CoreError::InvalidRequest(format!("Train {} already exists", number))
            }
            other => CoreError::Unexpected(other.to_string()),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use repository::LedgerError;

    #[test]
    fn test_capacity_message_reports_remaining_seats() {
        let err = CoreError::CapacityExceeded {
            class: "SL".to_string(),
            requested: 3,
            available: 2,
        };
        assert_eq!(err.to_string(), "Only 2 seats available in SL class");
        assert_eq!(err.kind(), ErrorKind::CapacityExceeded);
    }

    #[test]
    fn test_ledger_errors_map_into_taxonomy() {
        let err: CoreError = LedgerError::AlreadyCancelled("1234567890".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        let err: CoreError = LedgerError::Backend("connection reset".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Unexpected);
    }
}
