use std::sync::Arc;

use sqlx::{Error, Sqlite, Transaction};
use time::OffsetDateTime;

use crate::configs::Storage;
use crate::models::SensorSample;

#[derive(Clone)]
pub struct SensorSampleRepository {
    storage: Arc<Storage>,
}

impl SensorSampleRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }
}

impl SensorSampleRepository {
    pub async fn create(
        &self,
        item: &SensorSample,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<i32, Error> {
        let id = sqlx::query(
            r#"
            INSERT INTO sensor_samples (temperature, humidity, light, air_quality, noise, time)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(item.temperature)
        .bind(item.humidity)
        .bind(item.light)
        .bind(item.air_quality)
        .bind(item.noise)
        .bind(item.time)
        .execute(&mut **transaction)
        .await?
        .last_insert_rowid();

        Ok(id as i32)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<SensorSample>, Error> {
        let sample: Option<SensorSample> =
            sqlx::query_as("SELECT * FROM sensor_samples WHERE id = $1")
                .bind(id)
                .fetch_optional(self.storage.get_pool())
                .await?;

        Ok(sample)
    }

    // Samples taken at or after `since`, oldest first
    pub async fn find_since(&self, since: OffsetDateTime) -> Result<Vec<SensorSample>, Error> {
        let samples: Vec<SensorSample> = sqlx::query_as(
            r#"
            SELECT * FROM sensor_samples
            WHERE time >= $1
            ORDER BY time ASC, id ASC
            "#,
        )
        .bind(since)
        .fetch_all(self.storage.get_pool())
        .await?;

        Ok(samples)
    }

    // Most recent samples, newest first
    pub async fn find_latest(&self, limit: i64) -> Result<Vec<SensorSample>, Error> {
        let samples: Vec<SensorSample> = sqlx::query_as(
            r#"
            SELECT * FROM sensor_samples
            ORDER BY id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(self.storage.get_pool())
        .await?;

        Ok(samples)
    }

    pub async fn count(&self) -> Result<i64, Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sensor_samples")
            .fetch_one(self.storage.get_pool())
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use climavote_core::acquisition::Readings;
    use time::Duration;

    use crate::tests::setup_test_db;

    use super::*;

    fn sample_at(light: i32, time: OffsetDateTime) -> SensorSample {
        let readings = Readings { light, ..Readings::default() };
        SensorSample::from_readings(&readings, time)
    }

    #[tokio::test]
    async fn test_create_and_find_sample() {
        let storage = setup_test_db().await;
        let repo = SensorSampleRepository::new(storage.clone());

        let mut tx = storage.get_pool().begin().await.unwrap();
        let id = repo
            .create(&sample_at(650, OffsetDateTime::now_utc()), &mut tx)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let found = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.light, 650);
        assert_eq!(found.temperature, 22.0);
        assert_eq!(found.noise, 45);
    }

    #[tokio::test]
    async fn test_find_since_and_latest() {
        let storage = setup_test_db().await;
        let repo = SensorSampleRepository::new(storage.clone());
        let now = OffsetDateTime::now_utc();

        let mut tx = storage.get_pool().begin().await.unwrap();
        for (light, age) in [(100, 180), (200, 90), (300, 30), (400, 0)] {
            repo.create(&sample_at(light, now - Duration::minutes(age)), &mut tx)
                .await
                .unwrap();
        }
        tx.commit().await.unwrap();

        let recent = repo.find_since(now - Duration::hours(1)).await.unwrap();
        assert_eq!(recent.iter().map(|s| s.light).collect::<Vec<_>>(), vec![300, 400]);

        let latest = repo.find_latest(3).await.unwrap();
        assert_eq!(latest.iter().map(|s| s.light).collect::<Vec<_>>(), vec![400, 300, 200]);

        assert_eq!(repo.count().await.unwrap(), 4);
    }
}
