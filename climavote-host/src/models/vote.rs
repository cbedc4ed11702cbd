use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::models::Table;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Vote {
    pub id: i32,
    pub parameter: String,
    pub value: i32,
    pub comment: Option<String>,
    pub user_id: i32,
    pub time: OffsetDateTime,
}

/// A vote comment together with its author.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommentEntry {
    pub parameter: String,
    pub value: i32,
    pub comment: String,
    pub username: String,
    pub time: OffsetDateTime,
}

pub struct VoteTable;

impl Table for VoteTable {
    fn name(&self) -> &'static str {
        "votes"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS votes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                parameter TEXT NOT NULL,
                value INTEGER NOT NULL CHECK (value BETWEEN -3 AND 3),
                comment TEXT,
                user_id INTEGER NOT NULL,
                time DATETIME NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_votes_user_parameter ON votes (user_id, parameter);
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS votes;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["users"]
    }
}
