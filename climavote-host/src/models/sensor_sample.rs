use climavote_core::Parameter;
use climavote_core::acquisition::Readings;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::models::Table;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SensorSample {
    pub id: i32,
    pub temperature: f64,
    pub humidity: f64,
    pub light: i32,
    pub air_quality: i32,
    pub noise: i32,
    pub time: OffsetDateTime,
}

impl SensorSample {
    pub fn from_readings(readings: &Readings, time: OffsetDateTime) -> Self {
        Self {
            id: 0,
            temperature: readings.temperature,
            humidity: readings.humidity,
            light: readings.light,
            air_quality: readings.air_quality,
            noise: readings.noise,
            time,
        }
    }

    pub fn value(&self, parameter: Parameter) -> f64 {
        match parameter {
            Parameter::Temperature => self.temperature,
            Parameter::Humidity => self.humidity,
            Parameter::Light => f64::from(self.light),
            Parameter::AirQuality => f64::from(self.air_quality),
            Parameter::Noise => f64::from(self.noise),
        }
    }
}

pub struct SensorSampleTable;

impl Table for SensorSampleTable {
    fn name(&self) -> &'static str {
        "sensor_samples"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS sensor_samples (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                temperature REAL NOT NULL,
                humidity REAL NOT NULL,
                light INTEGER NOT NULL,
                air_quality INTEGER NOT NULL,
                noise INTEGER NOT NULL,
                time DATETIME NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sensor_samples_time ON sensor_samples (time);
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS sensor_samples;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec![]
    }
}
