use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SensorFault;
use crate::parameter::Parameter;

pub const FAILURES_TO_DISABLE: u32 = 10;
pub const SUCCESSES_TO_ENABLE: u32 = 2;

pub const DEFAULT_TEMPERATURE: f64 = 22.0;
pub const DEFAULT_HUMIDITY: f64 = 50.0;
pub const DEFAULT_LIGHT: i32 = 400;
pub const DEFAULT_AIR_QUALITY: i32 = 55;
pub const FIXED_NOISE: i32 = 45;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionMode {
    Real,
    Simulated,
}

/// Where the value currently shown for a source comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// No verdict yet, the source has not reached either threshold.
    Pending,
    Real,
    LastKnownReal,
    Simulated,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Provenance::Pending => "pending",
            Provenance::Real => "real",
            Provenance::LastKnownReal => "last known real",
            Provenance::Simulated => "simulated",
        };
        f.write_str(label)
    }
}

/// Temperature and humidity, read together from the DHT22.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimateReading {
    pub temperature: f64,
    pub humidity: f64,
}

impl ClimateReading {
    fn check(&self) -> Result<(), SensorFault> {
        if !(-10.0..=50.0).contains(&self.temperature) {
            return Err(SensorFault::OutOfRange {
                parameter: Parameter::Temperature,
                value: self.temperature,
            });
        }
        if !(0.0..=100.0).contains(&self.humidity) {
            return Err(SensorFault::OutOfRange {
                parameter: Parameter::Humidity,
                value: self.humidity,
            });
        }
        Ok(())
    }
}

/// Light and air quality, already converted from ADC voltages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbientReading {
    pub light: i32,
    pub air_quality: i32,
}

impl AmbientReading {
    fn check(&self) -> Result<(), SensorFault> {
        if !(0..=2000).contains(&self.light) {
            return Err(SensorFault::OutOfRange {
                parameter: Parameter::Light,
                value: f64::from(self.light),
            });
        }
        if !(0..=500).contains(&self.air_quality) {
            return Err(SensorFault::OutOfRange {
                parameter: Parameter::AirQuality,
                value: f64::from(self.air_quality),
            });
        }
        Ok(())
    }
}

/// Live value of every parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Readings {
    pub temperature: f64,
    pub humidity: f64,
    pub light: i32,
    pub air_quality: i32,
    pub noise: i32,
}

impl Default for Readings {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            humidity: DEFAULT_HUMIDITY,
            light: DEFAULT_LIGHT,
            air_quality: DEFAULT_AIR_QUALITY,
            noise: FIXED_NOISE,
        }
    }
}

impl Readings {
    pub fn get(&self, parameter: Parameter) -> f64 {
        match parameter {
            Parameter::Temperature => self.temperature,
            Parameter::Humidity => self.humidity,
            Parameter::Light => f64::from(self.light),
            Parameter::AirQuality => f64::from(self.air_quality),
            Parameter::Noise => f64::from(self.noise),
        }
    }

    /// Noise is pinned and ignores writes.
    pub fn set(&mut self, parameter: Parameter, value: f64) {
        match parameter {
            Parameter::Temperature => self.temperature = value,
            Parameter::Humidity => self.humidity = value,
            Parameter::Light => self.light = value.round() as i32,
            Parameter::AirQuality => self.air_quality = value.round() as i32,
            Parameter::Noise => {}
        }
    }

    fn apply_climate(&mut self, reading: &ClimateReading) {
        self.temperature = reading.temperature;
        self.humidity = reading.humidity;
    }

    fn apply_ambient(&mut self, reading: &AmbientReading) {
        self.light = reading.light;
        self.air_quality = reading.air_quality;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceHealth {
    pub working: bool,
    pub consecutive_failures: u32,
    pub consecutive_successes: u32,
    pub provenance: Provenance,
}

impl SourceHealth {
    fn new(mode: AcquisitionMode) -> Self {
        match mode {
            AcquisitionMode::Real => Self {
                working: false,
                consecutive_failures: 0,
                consecutive_successes: 0,
                provenance: Provenance::Pending,
            },
            AcquisitionMode::Simulated => Self {
                working: true,
                consecutive_failures: 0,
                consecutive_successes: 0,
                provenance: Provenance::Simulated,
            },
        }
    }

    /// Returns `true` when this success flipped the source back on.
    fn record_success(&mut self) -> bool {
        self.consecutive_failures = 0;
        self.consecutive_successes = self.consecutive_successes.saturating_add(1);

        if !self.working && self.consecutive_successes >= SUCCESSES_TO_ENABLE {
            self.working = true;
            return true;
        }
        false
    }

    /// Returns `true` when this failure switched the source off.
    fn record_failure(&mut self) -> bool {
        self.consecutive_successes = 0;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);

        if self.working && self.consecutive_failures >= FAILURES_TO_DISABLE {
            self.working = false;
            return true;
        }
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorHealth {
    pub mode: AcquisitionMode,
    pub climate: SourceHealth,
    pub ambient: SourceHealth,
}

#[derive(Debug)]
struct SourceState<T> {
    name: &'static str,
    health: SourceHealth,
    last_known: Option<T>,
}

impl<T: Copy> SourceState<T> {
    fn new(name: &'static str, mode: AcquisitionMode) -> Self {
        Self {
            name,
            health: SourceHealth::new(mode),
            last_known: None,
        }
    }

    fn succeed(&mut self, reading: T, mode: AcquisitionMode) {
        self.last_known = Some(reading);

        if self.health.record_success() {
            tracing::info!("{} sensor is back online", self.name);
        }
        if mode == AcquisitionMode::Real && self.health.working {
            self.health.provenance = Provenance::Real;
        }
    }

    /// Returns the value to fall back to, if any.
    fn fail(&mut self, fault: &SensorFault, mode: AcquisitionMode) -> Option<T> {
        tracing::debug!("{} sensor read failed: {}", self.name, fault);

        if self.health.record_failure() {
            tracing::warn!(
                "{} sensor disabled after {} consecutive failures",
                self.name,
                FAILURES_TO_DISABLE
            );
        }

        // Also covers a source that never reached `working` before failing
        if mode == AcquisitionMode::Real
            && self.health.consecutive_failures >= FAILURES_TO_DISABLE
            && self.last_known.is_some()
        {
            self.health.provenance = Provenance::LastKnownReal;
        }

        self.last_known
    }
}

/// Owns the live readings and the per-source failure hysteresis.
///
/// A source goes offline after [`FAILURES_TO_DISABLE`] consecutive failures and
/// comes back after [`SUCCESSES_TO_ENABLE`] consecutive successes. Failed reads
/// fall back to the last good reading and never invent values.
#[derive(Debug)]
pub struct Acquisition {
    mode: AcquisitionMode,
    current: Readings,
    climate: SourceState<ClimateReading>,
    ambient: SourceState<AmbientReading>,
}

impl Acquisition {
    pub fn new(mode: AcquisitionMode) -> Self {
        Self {
            mode,
            current: Readings::default(),
            climate: SourceState::new("climate", mode),
            ambient: SourceState::new("ambient", mode),
        }
    }

    pub fn mode(&self) -> AcquisitionMode {
        self.mode
    }

    pub fn readings(&self) -> &Readings {
        &self.current
    }

    pub fn current_value(&self, parameter: Parameter) -> f64 {
        self.current.get(parameter)
    }

    pub fn last_known_ambient(&self) -> Option<AmbientReading> {
        self.ambient.last_known
    }

    pub fn health(&self) -> SensorHealth {
        SensorHealth {
            mode: self.mode,
            climate: self.climate.health,
            ambient: self.ambient.health,
        }
    }

    /// Returns whether the reading was accepted.
    pub fn ingest_climate(&mut self, result: Result<ClimateReading, SensorFault>) -> bool {
        match result.and_then(|reading| reading.check().map(|_| reading)) {
            Ok(reading) => {
                tracing::debug!(
                    "climate reading: {:.1} °C, {:.1} %",
                    reading.temperature,
                    reading.humidity
                );
                self.climate.succeed(reading, self.mode);
                self.current.apply_climate(&reading);
                true
            }
            Err(fault) => {
                if let Some(fallback) = self.climate.fail(&fault, self.mode) {
                    self.current.apply_climate(&fallback);
                }
                false
            }
        }
    }

    /// Returns whether the reading was accepted.
    pub fn ingest_ambient(&mut self, result: Result<AmbientReading, SensorFault>) -> bool {
        match result.and_then(|reading| reading.check().map(|_| reading)) {
            Ok(reading) => {
                tracing::debug!(
                    "ambient reading: {} lux, {} AQI",
                    reading.light,
                    reading.air_quality
                );
                self.ambient.succeed(reading, self.mode);
                self.current.apply_ambient(&reading);
                true
            }
            Err(fault) => {
                if let Some(fallback) = self.ambient.fail(&fault, self.mode) {
                    self.current.apply_ambient(&fallback);
                }
                false
            }
        }
    }
}
