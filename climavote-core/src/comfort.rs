use std::fmt;

use serde::{Deserialize, Serialize};

use crate::parameter::Parameter;

/// Closed interval `[low, high]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub low: f64,
    pub high: f64,
}

impl Band {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }

    pub fn covers(&self, other: &Band) -> bool {
        self.low <= other.low && other.high <= self.high
    }

    pub fn midpoint(&self) -> f64 {
        (self.low + self.high) / 2.0
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.low, self.high)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComfortRange {
    pub optimal: Band,
    pub acceptable: Band,
    pub critical: Band,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeStatus {
    Optimal,
    Acceptable,
    Critical,
    Disabled,
}

impl RangeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RangeStatus::Optimal => "optimal",
            RangeStatus::Acceptable => "acceptable",
            RangeStatus::Critical => "critical",
            RangeStatus::Disabled => "disabled",
        }
    }
}

impl fmt::Display for RangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn comfort_range(parameter: Parameter) -> ComfortRange {
    match parameter {
        Parameter::Temperature => ComfortRange {
            optimal: Band::new(21.0, 24.0),
            acceptable: Band::new(19.0, 26.0),
            critical: Band::new(15.0, 35.0),
        },
        Parameter::Humidity => ComfortRange {
            optimal: Band::new(40.0, 60.0),
            acceptable: Band::new(35.0, 70.0),
            critical: Band::new(20.0, 80.0),
        },
        Parameter::Light => ComfortRange {
            optimal: Band::new(500.0, 800.0),
            acceptable: Band::new(300.0, 1000.0),
            critical: Band::new(0.0, 2000.0),
        },
        Parameter::AirQuality => ComfortRange {
            optimal: Band::new(40.0, 80.0),
            acceptable: Band::new(20.0, 120.0),
            critical: Band::new(0.0, 200.0),
        },
        Parameter::Noise => ComfortRange {
            optimal: Band::new(30.0, 50.0),
            acceptable: Band::new(25.0, 60.0),
            critical: Band::new(20.0, 100.0),
        },
    }
}

/// Hard bounds every vote-derived or manual target is clamped into.
///
/// Noise has no envelope because it never receives a target.
pub fn safety_envelope(parameter: Parameter) -> Option<Band> {
    match parameter {
        Parameter::Temperature => Some(Band::new(15.0, 35.0)),
        Parameter::Humidity => Some(Band::new(20.0, 80.0)),
        Parameter::Light => Some(Band::new(100.0, 1500.0)),
        Parameter::AirQuality => Some(Band::new(40.0, 200.0)),
        Parameter::Noise => None,
    }
}

/// Clamps a target into the safety envelope, leaving it untouched when none exists.
pub fn clamp_target(parameter: Parameter, target: f64) -> f64 {
    match safety_envelope(parameter) {
        Some(envelope) => envelope.clamp(target),
        None => target,
    }
}

pub fn classify(parameter: Parameter, value: f64) -> RangeStatus {
    if parameter.is_disabled() {
        return RangeStatus::Disabled;
    }

    let range = comfort_range(parameter);
    if range.optimal.contains(value) {
        RangeStatus::Optimal
    } else if range.acceptable.contains(value) {
        RangeStatus::Acceptable
    } else {
        RangeStatus::Critical
    }
}
