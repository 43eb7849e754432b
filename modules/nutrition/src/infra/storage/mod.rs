//! SQL adapters for the domain repository ports, on top of [`dbkit`].
//!
//! Every statement uses `?` placeholders with bound parameters; the only text
//! ever assembled is the goal column list, which comes from
//! [`Goals::FIELDS`](crate::contract::model::Goals::FIELDS).

mod entries;
mod foods;
mod goals;
pub mod migrations;
mod users;

pub use entries::SqlIntakeLog;
pub use foods::SqlFoodCatalog;
pub use goals::SqlGoalStore;
pub use users::SqlUserDirectory;

use dbkit::DbError;

use crate::domain::repo::PersistenceError;

impl From<DbError> for PersistenceError {
    fn from(err: DbError) -> Self {
        if err.is_connection() {
            PersistenceError::connection(err.to_string())
        } else {
            PersistenceError::query(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::DomainError;
    use std::time::Duration;

    #[test]
    fn statement_timeout_reads_as_unavailable() {
        let err = PersistenceError::from(DbError::Timeout(Duration::from_millis(100)));
        assert!(matches!(err, PersistenceError::Connection { .. }));
        assert!(matches!(
            DomainError::from_write(err),
            DomainError::ConnectionUnavailable { .. }
        ));
    }

    #[test]
    fn undecodable_row_is_not_a_connection_problem() {
        let err = PersistenceError::from(DbError::Decode {
            column: "calories".into(),
            expected: "a number",
        });
        assert!(matches!(
            DomainError::from_read(err),
            DomainError::Database { .. }
        ));
    }
}
