use std::env;
use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::configs::normalize_path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    pub migration_path: Option<String>,
    pub clean_start: bool,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorMode {
    /// Use the hardware when its sysfs nodes exist, simulate otherwise.
    Auto,
    Real,
    Simulated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Station {
    pub mode: SensorMode,
    pub real_interval_ms: u64,
    pub simulated_interval_ms: u64,
    pub release_delay_ms: u64,
}

impl Station {
    pub fn real_interval(&self) -> Duration {
        Duration::from_millis(self.real_interval_ms)
    }

    pub fn simulated_interval(&self) -> Duration {
        Duration::from_millis(self.simulated_interval_ms)
    }

    pub fn release_delay(&self) -> Duration {
        Duration::from_millis(self.release_delay_ms)
    }
}

impl Default for Station {
    fn default() -> Self {
        Self {
            mode: SensorMode::Auto,
            real_interval_ms: 2000,
            simulated_interval_ms: 5000,
            release_delay_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hardware {
    /// IIO device exposing `in_temp_input` and `in_humidityrelative_input`.
    pub climate_device: String,
    /// IIO device of the ADS1115.
    pub adc_device: String,
    pub light_channel: u8,
    pub air_channel: u8,
    pub gpio_root: String,
    pub read_retries: u32,
    pub retry_pause_ms: u64,
}

impl Hardware {
    pub fn retry_pause(&self) -> Duration {
        Duration::from_millis(self.retry_pause_ms)
    }
}

impl Default for Hardware {
    fn default() -> Self {
        Self {
            climate_device: String::from("/sys/bus/iio/devices/iio:device0"),
            adc_device: String::from("/sys/bus/iio/devices/iio:device1"),
            light_channel: 0,
            air_channel: 1,
            gpio_root: String::from("/sys/class/gpio"),
            read_retries: 3,
            retry_pause_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub logger: Logger,
    pub database: Database,
    #[serde(default)]
    pub station: Station,
    #[serde(default)]
    pub hardware: Hardware,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or("development".into());

        let builder = Config::builder()
            .add_source(File::with_name("configs/default"))
            .add_source(File::with_name(&format!("configs/{run_mode}")).required(false))
            .add_source(Environment::with_prefix("CLIMAVOTE").separator("__"));

        Self::resolve(builder.build()?.try_deserialize()?)
    }

    fn resolve(mut settings: Settings) -> Result<Self, ConfigError> {
        if let Some(migrate) = &settings.database.migration_path {
            if Path::new(migrate).is_dir() {
                let migrate_path = normalize_path(migrate)
                    .map_err(|e| ConfigError::Message(e.to_string()))?
                    .to_string_lossy()
                    .to_string();

                settings.database.migration_path = Some(migrate_path);
            } else {
                tracing::warn!("migration path {} is not a directory, skipping migrations", migrate);
                settings.database.migration_path = None;
            }
        }

        if settings.station.real_interval_ms == 0 || settings.station.simulated_interval_ms == 0 {
            return Err(ConfigError::Message("polling intervals must be positive".into()));
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn from_toml(source: &str) -> Result<Settings, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        Settings::resolve(settings)
    }

    #[test]
    fn test_minimal_settings_fill_defaults() {
        let settings = from_toml(
            r#"
            [logger]
            level = "debug"

            [database]
            clean_start = false
            url = "sqlite::memory:"
            "#,
        )
        .unwrap();

        assert_eq!(settings.station.mode, SensorMode::Auto);
        assert_eq!(settings.station.real_interval(), Duration::from_secs(2));
        assert_eq!(settings.station.simulated_interval(), Duration::from_secs(5));
        assert_eq!(settings.hardware.read_retries, 3);
        assert!(settings.database.migration_path.is_none());
    }

    #[test]
    fn test_missing_migration_directory_is_dropped() {
        let settings = from_toml(
            r#"
            [logger]
            level = "info"

            [database]
            migration_path = "does/not/exist"
            clean_start = true
            url = "sqlite::memory:"

            [station]
            mode = "simulated"
            real_interval_ms = 2000
            simulated_interval_ms = 100
            release_delay_ms = 50
            "#,
        )
        .unwrap();

        assert!(settings.database.migration_path.is_none());
        assert_eq!(settings.station.mode, SensorMode::Simulated);
        assert_eq!(settings.station.release_delay(), Duration::from_millis(50));
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let result = from_toml(
            r#"
            [logger]
            level = "info"

            [database]
            clean_start = true
            url = "sqlite::memory:"

            [station]
            mode = "real"
            real_interval_ms = 0
            simulated_interval_ms = 5000
            release_delay_ms = 2000
            "#,
        );

        assert!(result.is_err());
    }
}
