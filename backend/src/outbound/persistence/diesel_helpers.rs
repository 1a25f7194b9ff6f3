//! Shared Diesel error mapping for the Chronos repositories.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

/// How a Diesel failure should surface through a port error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DieselFailure {
    /// The connection dropped.
    Connection(String),
    /// A unique index rejected the write.
    UniqueViolation {
        /// Violated constraint, when PostgreSQL reported it.
        constraint: Option<String>,
        /// Database message.
        message: String,
    },
    /// Any other query failure.
    Query(String),
}

/// Classify a Diesel error and emit debug context.
pub(crate) fn classify_diesel_error(error: DieselError, operation: &str) -> DieselFailure {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), %operation, "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            %operation,
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            DieselFailure::UniqueViolation {
                constraint: info.constraint_name().map(str::to_owned),
                message: info.message().to_owned(),
            }
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            DieselFailure::Connection("database connection error".to_owned())
        }
        DieselError::DatabaseError(_, info) => {
            DieselFailure::Query(format!("{operation}: {}", info.message()))
        }
        DieselError::NotFound => DieselFailure::Query(format!("{operation}: record not found")),
        DieselError::QueryBuilderError(_) => {
            DieselFailure::Query(format!("{operation}: database query error"))
        }
        other => DieselFailure::Query(format!("{operation}: {other}")),
    }
}

/// Convert a row count limit into a SQL `LIMIT` value.
pub(crate) fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn not_found_is_a_query_failure() {
        let failure = classify_diesel_error(DieselError::NotFound, "load submission");
        assert_eq!(
            failure,
            DieselFailure::Query("load submission: record not found".to_owned())
        );
    }

    #[rstest]
    fn unique_violations_keep_the_message() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value violates unique constraint".to_owned()),
        );

        let failure = classify_diesel_error(error, "insert submission");

        assert_eq!(
            failure,
            DieselFailure::UniqueViolation {
                constraint: None,
                message: "duplicate key value violates unique constraint".to_owned(),
            }
        );
    }

    #[rstest]
    fn closed_connections_are_connection_failures() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::ClosedConnection,
            Box::new("server closed the connection".to_owned()),
        );
        assert!(matches!(
            classify_diesel_error(error, "list journals"),
            DieselFailure::Connection(_)
        ));
    }

    #[rstest]
    fn rollback_errors_are_query_failures() {
        let failure = classify_diesel_error(DieselError::RollbackTransaction, "insert");
        assert!(matches!(failure, DieselFailure::Query(_)));
    }

    #[rstest]
    #[case(0, 0)]
    #[case(50, 50)]
    #[case(usize::MAX, i64::MAX)]
    fn limits_saturate(#[case] limit: usize, #[case] expected: i64) {
        assert_eq!(sql_limit(limit), expected);
    }
}
