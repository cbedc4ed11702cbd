use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Environmental quantities tracked by the station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    Temperature,
    Humidity,
    Light,
    AirQuality,
    /// Placeholder channel, never read and never processed.
    Noise,
}

impl Parameter {
    /// Every parameter that takes part in acquisition, voting and monitoring.
    pub const ACTIVE: [Parameter; 4] = [
        Parameter::Temperature,
        Parameter::Humidity,
        Parameter::Light,
        Parameter::AirQuality,
    ];

    pub const ALL: [Parameter; 5] = [
        Parameter::Temperature,
        Parameter::Humidity,
        Parameter::Light,
        Parameter::AirQuality,
        Parameter::Noise,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Parameter::Temperature => "temperature",
            Parameter::Humidity => "humidity",
            Parameter::Light => "light",
            Parameter::AirQuality => "air_quality",
            Parameter::Noise => "noise",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Parameter::Temperature => "°C",
            Parameter::Humidity => "%",
            Parameter::Light => "lux",
            Parameter::AirQuality => "AQI",
            Parameter::Noise => "dB",
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, Parameter::Noise)
    }

    /// Light and air quality are reported as whole numbers.
    pub fn is_integral(&self) -> bool {
        matches!(self, Parameter::Light | Parameter::AirQuality | Parameter::Noise)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Parameter {
    type Err = CoreError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "temperature" => Ok(Parameter::Temperature),
            "humidity" => Ok(Parameter::Humidity),
            "light" => Ok(Parameter::Light),
            "air_quality" => Ok(Parameter::AirQuality),
            "noise" => Ok(Parameter::Noise),
            other => Err(CoreError::UnknownParameter(other.to_string())),
        }
    }
}

/// Direction a target lies in relative to the value at activation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
