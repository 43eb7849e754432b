use std::sync::Arc;

use async_trait::async_trait;
use dbkit::{DbHandle, Param};

use crate::contract::model::User;
use crate::domain::repo::{PersistenceError, StoredUser, UserDirectoryRepository};

/// Read-only view of `app_user`.
#[derive(Clone)]
pub struct SqlUserDirectory {
    db: Arc<DbHandle>,
}

impl SqlUserDirectory {
    pub fn new(db: Arc<DbHandle>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserDirectoryRepository for SqlUserDirectory {
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<StoredUser>, PersistenceError> {
        let rows = self
            .db
            .run(
                "SELECT id, username, password_hash FROM app_user WHERE username = ?",
                &[Param::from(username)],
            )
            .await?;

        let Some(row) = rows.first() else {
            return Ok(None);
        };
        Ok(Some(StoredUser {
            user: User {
                id: row.i64("id")?,
                username: row.string("username")?,
            },
            password_hash: row.string("password_hash")?,
        }))
    }

    async fn find_id_by_username(&self, username: &str) -> Result<Option<i64>, PersistenceError> {
        let rows = self
            .db
            .run(
                "SELECT id FROM app_user WHERE username = ?",
                &[Param::from(username)],
            )
            .await?;
        rows.first()
            .map(|row| row.i64("id"))
            .transpose()
            .map_err(Into::into)
    }
}
