use climavote_core::acquisition::Readings;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::models::Table;

/// Audit record written whenever a target is applied or reached.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Feedback {
    pub id: i32,
    pub temperature: f64,
    pub humidity: f64,
    pub light: i32,
    pub air_quality: i32,
    pub noise: i32,
    pub message: String,
    pub user_id: Option<i32>,
    pub time: OffsetDateTime,
}

impl Feedback {
    pub fn new(readings: &Readings, message: String, user_id: Option<i32>) -> Self {
        Self {
            id: 0,
            temperature: readings.temperature,
            humidity: readings.humidity,
            light: readings.light,
            air_quality: readings.air_quality,
            noise: readings.noise,
            message,
            user_id,
            time: OffsetDateTime::now_utc(),
        }
    }
}

pub struct FeedbackTable;

impl Table for FeedbackTable {
    fn name(&self) -> &'static str {
        "feedback"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS feedback (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                temperature REAL NOT NULL,
                humidity REAL NOT NULL,
                light INTEGER NOT NULL,
                air_quality INTEGER NOT NULL,
                noise INTEGER NOT NULL,
                message TEXT NOT NULL,
                user_id INTEGER,
                time DATETIME NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE SET NULL
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS feedback;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["users"]
    }
}
