use std::sync::Arc;

use sqlx::{Error, Sqlite, Transaction};

use crate::configs::Storage;
use crate::models::Feedback;

#[derive(Clone)]
pub struct FeedbackRepository {
    storage: Arc<Storage>,
}

impl FeedbackRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }
}

impl FeedbackRepository {
    pub async fn create(
        &self,
        item: &Feedback,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<i32, Error> {
        let id = sqlx::query(
            r#"
            INSERT INTO feedback (temperature, humidity, light, air_quality, noise, message, user_id, time)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(item.temperature)
        .bind(item.humidity)
        .bind(item.light)
        .bind(item.air_quality)
        .bind(item.noise)
        .bind(&item.message)
        .bind(item.user_id)
        .bind(item.time)
        .execute(&mut **transaction)
        .await?
        .last_insert_rowid();

        Ok(id as i32)
    }

    // Entries written for the user plus system entries, newest first
    pub async fn find_for_user(&self, user_id: i32, limit: i64) -> Result<Vec<Feedback>, Error> {
        let entries: Vec<Feedback> = sqlx::query_as(
            r#"
            SELECT * FROM feedback
            WHERE user_id = $1 OR user_id IS NULL
            ORDER BY id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.storage.get_pool())
        .await?;

        Ok(entries)
    }

    pub async fn find_latest(&self, limit: i64) -> Result<Vec<Feedback>, Error> {
        let entries: Vec<Feedback> = sqlx::query_as("SELECT * FROM feedback ORDER BY id DESC LIMIT $1")
            .bind(limit)
            .fetch_all(self.storage.get_pool())
            .await?;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use climavote_core::acquisition::Readings;

    use crate::tests::{create_test_user, setup_test_db};

    use super::*;

    #[tokio::test]
    async fn test_find_for_user_includes_system_entries() {
        let storage = setup_test_db().await;
        let alice = create_test_user(&storage, "alice").await;
        let bob = create_test_user(&storage, "bob").await;
        let repo = FeedbackRepository::new(storage.clone());
        let readings = Readings::default();

        let mut tx = storage.get_pool().begin().await.unwrap();
        for (message, user_id) in [
            ("vote by alice", Some(alice.id)),
            ("vote by bob", Some(bob.id)),
            ("target reached", None),
        ] {
            repo.create(&Feedback::new(&readings, message.to_string(), user_id), &mut tx)
                .await
                .unwrap();
        }
        tx.commit().await.unwrap();

        let entries = repo.find_for_user(alice.id, 100).await.unwrap();
        let messages: Vec<_> = entries.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["target reached", "vote by alice"]);

        assert_eq!(repo.find_latest(10).await.unwrap().len(), 3);
    }
}
