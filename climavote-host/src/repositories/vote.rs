use std::sync::Arc;

use climavote_core::Parameter;
use sqlx::{Error, Sqlite, Transaction};

use crate::configs::Storage;
use crate::models::{CommentEntry, Vote};

#[derive(Clone)]
pub struct VoteRepository {
    storage: Arc<Storage>,
}

impl VoteRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }
}

impl VoteRepository {
    pub async fn create(
        &self,
        item: &Vote,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<i32, Error> {
        let id = sqlx::query(
            r#"
            INSERT INTO votes (parameter, value, comment, user_id, time)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&item.parameter)
        .bind(item.value)
        .bind(&item.comment)
        .bind(item.user_id)
        .bind(item.time)
        .execute(&mut **transaction)
        .await?
        .last_insert_rowid();

        Ok(id as i32)
    }

    // `(id, value)` of the user's latest votes on a parameter, newest first
    pub async fn find_recent(
        &self,
        user_id: i32,
        parameter: Parameter,
        limit: i64,
    ) -> Result<Vec<(i64, i32)>, Error> {
        let rows: Vec<(i64, i32)> = sqlx::query_as(
            r#"
            SELECT id, value FROM votes
            WHERE user_id = $1 AND parameter = $2
            ORDER BY id DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(parameter.as_str())
        .bind(limit)
        .fetch_all(self.storage.get_pool())
        .await?;

        Ok(rows)
    }

    pub async fn find_by_user(&self, user_id: i32) -> Result<Vec<Vote>, Error> {
        let votes: Vec<Vote> = sqlx::query_as("SELECT * FROM votes WHERE user_id = $1 ORDER BY id ASC")
            .bind(user_id)
            .fetch_all(self.storage.get_pool())
            .await?;

        Ok(votes)
    }

    // Non-empty comments with their authors, newest first
    pub async fn find_comments(&self, limit: i64) -> Result<Vec<CommentEntry>, Error> {
        let comments: Vec<CommentEntry> = sqlx::query_as(
            r#"
            SELECT v.parameter, v.value, v.comment, u.username, v.time
            FROM votes v
            INNER JOIN users u ON v.user_id = u.id
            WHERE v.comment IS NOT NULL AND TRIM(v.comment) != ''
            ORDER BY v.id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(self.storage.get_pool())
        .await?;

        Ok(comments)
    }
}
