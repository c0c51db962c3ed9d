//! Failures surfaced by the account store.

use diesel::r2d2::PoolError;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

/// Error returned by [`crate::AccountStore`] operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountError {
    /// A required input was empty.
    #[error("{field} must not be empty")]
    InvalidInput { field: &'static str },

    /// The username or email is already taken.
    #[error("username or email already exists")]
    DuplicateAccount,

    /// Unknown username or wrong password; both cases share this variant.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The database could not be reached.
    #[error("storage unavailable: {message}")]
    StorageUnavailable { message: String },

    /// The database was reached but the statement failed.
    #[error("storage error: {message}")]
    Storage { message: String },

    /// The password hasher rejected its input or parameters.
    #[error("password hashing failed: {message}")]
    Hashing { message: String },
}

impl AccountError {
    pub(crate) fn unavailable(message: impl Into<String>) -> Self {
        Self::StorageUnavailable {
            message: message.into(),
        }
    }

    pub(crate) fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub(crate) fn hashing(message: impl ToString) -> Self {
        Self::Hashing {
            message: message.to_string(),
        }
    }

    /// Stable machine-readable code, used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "invalid_input",
            Self::DuplicateAccount => "duplicate_account",
            Self::InvalidCredentials => "invalid_credentials",
            Self::StorageUnavailable { .. } => "storage_unavailable",
            Self::Storage { .. } => "storage_error",
            Self::Hashing { .. } => "hashing_error",
        }
    }
}

impl From<DieselError> for AccountError {
    fn from(error: DieselError) -> Self {
        match &error {
            DieselError::DatabaseError(kind, info) => {
                debug!(?kind, message = info.message(), "diesel operation failed");
            }
            _ => debug!(%error, "diesel operation failed"),
        }

        match error {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                Self::DuplicateAccount
            }
            DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
                Self::unavailable("database connection closed")
            }
            DieselError::DatabaseError(_, info) => Self::storage(info.message()),
            other => Self::storage(other.to_string()),
        }
    }
}

impl From<PoolError> for AccountError {
    fn from(error: PoolError) -> Self {
        debug!(%error, "connection checkout failed");
        Self::unavailable(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    struct Info(&'static str);

    impl diesel::result::DatabaseErrorInformation for Info {
        fn message(&self) -> &str {
            self.0
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            None
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            None
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn db_error(kind: DatabaseErrorKind, message: &'static str) -> DieselError {
        DieselError::DatabaseError(kind, Box::new(Info(message)))
    }

    #[test]
    fn unique_violation_is_duplicate_account() {
        let err = AccountError::from(db_error(
            DatabaseErrorKind::UniqueViolation,
            "UNIQUE constraint failed: accounts.email",
        ));
        assert_eq!(err, AccountError::DuplicateAccount);
    }

    #[test]
    fn closed_connection_is_unavailable() {
        let err = AccountError::from(db_error(DatabaseErrorKind::ClosedConnection, "gone"));
        assert!(matches!(err, AccountError::StorageUnavailable { .. }));
    }

    #[test]
    fn other_database_failures_keep_their_message() {
        let err = AccountError::from(db_error(DatabaseErrorKind::Unknown, "database is locked"));
        assert_eq!(err, AccountError::storage("database is locked"));
    }

    #[test]
    fn non_database_failures_are_storage_errors() {
        let err = AccountError::from(DieselError::NotFound);
        assert!(matches!(err, AccountError::Storage { .. }));
    }

    #[rstest]
    #[case(AccountError::InvalidInput { field: "email" }, "invalid_input")]
    #[case(AccountError::DuplicateAccount, "duplicate_account")]
    #[case(AccountError::InvalidCredentials, "invalid_credentials")]
    #[case(AccountError::unavailable("down"), "storage_unavailable")]
    fn codes_are_stable(#[case] err: AccountError, #[case] code: &str) {
        assert_eq!(err.code(), code);
    }

    #[test]
    fn invalid_input_names_the_field() {
        let err = AccountError::InvalidInput { field: "username" };
        assert_eq!(err.to_string(), "username must not be empty");
    }
}
