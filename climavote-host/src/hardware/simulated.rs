use std::collections::BTreeMap;

use async_trait::async_trait;
use climavote_core::acquisition::{AmbientReading, ClimateReading, Readings};
use climavote_core::indicator::OutputPin;
use climavote_core::monitoring::settle;
use climavote_core::{Direction, Parameter, PinFault, SensorFault};

use crate::hardware::SensorBus;

/// Holds every parameter at its default until a target moves it.
#[derive(Debug, Default)]
pub struct SimulatedSensorBus {
    readings: Readings,
}

impl SimulatedSensorBus {
    pub fn with_readings(readings: Readings) -> Self {
        Self { readings }
    }
}

#[async_trait]
impl SensorBus for SimulatedSensorBus {
    async fn read_climate(&mut self) -> Result<ClimateReading, SensorFault> {
        Ok(ClimateReading {
            temperature: self.readings.temperature,
            humidity: self.readings.humidity,
        })
    }

    async fn read_ambient(&mut self) -> Result<AmbientReading, SensorFault> {
        Ok(AmbientReading {
            light: self.readings.light,
            air_quality: self.readings.air_quality,
        })
    }

    fn apply_target(&mut self, parameter: Parameter, target: f64, direction: Direction) {
        let value = settle(parameter, target, direction);
        tracing::debug!("simulated {} jumps to {:.2}", parameter, value);
        self.readings.set(parameter, value);
    }
}

#[derive(Debug, Default)]
pub struct SimulatedPins {
    levels: BTreeMap<u8, bool>,
}

impl SimulatedPins {
    pub fn level(&self, pin: u8) -> bool {
        self.levels.get(&pin).copied().unwrap_or(false)
    }
}

impl OutputPin for SimulatedPins {
    fn write(&mut self, pin: u8, on: bool) -> Result<(), PinFault> {
        if self.levels.insert(pin, on) != Some(on) {
            tracing::info!("[simulated] GPIO{}: {}", pin, if on { "ON" } else { "OFF" });
        }
        Ok(())
    }
}
