mod gpio;
mod iio;
mod simulated;

use std::path::Path;

use async_trait::async_trait;
use climavote_core::acquisition::{AcquisitionMode, AmbientReading, ClimateReading};
use climavote_core::conversion::RandomJitter;
use climavote_core::indicator::OutputPin;
use climavote_core::{Direction, Parameter, SensorFault};

use crate::configs::{Hardware, SensorMode};

pub use gpio::SysfsGpio;
pub use iio::IioSensorBus;
pub use simulated::{SimulatedPins, SimulatedSensorBus};

#[async_trait]
pub trait SensorBus: Send {
    async fn read_climate(&mut self) -> Result<ClimateReading, SensorFault>;

    async fn read_ambient(&mut self) -> Result<AmbientReading, SensorFault>;

    /// Called whenever a target is accepted. Only the simulated bus reacts.
    fn apply_target(&mut self, _parameter: Parameter, _target: f64, _direction: Direction) {}
}

/// Both hardware backends of the station.
pub struct Devices {
    pub mode: AcquisitionMode,
    pub sensors: Box<dyn SensorBus>,
    pub pins: Box<dyn OutputPin>,
}

pub fn resolve_mode(mode: SensorMode, hardware: &Hardware) -> AcquisitionMode {
    match mode {
        SensorMode::Real => AcquisitionMode::Real,
        SensorMode::Simulated => AcquisitionMode::Simulated,
        SensorMode::Auto => {
            let present = Path::new(&hardware.climate_device).is_dir()
                && Path::new(&hardware.adc_device).is_dir();

            if present {
                AcquisitionMode::Real
            } else {
                tracing::warn!(
                    "sensor devices {} / {} not found, falling back to simulation",
                    hardware.climate_device,
                    hardware.adc_device
                );
                AcquisitionMode::Simulated
            }
        }
    }
}

pub fn open_devices(mode: SensorMode, hardware: &Hardware) -> Devices {
    match resolve_mode(mode, hardware) {
        AcquisitionMode::Real => Devices {
            mode: AcquisitionMode::Real,
            sensors: Box::new(IioSensorBus::new(hardware, Box::new(RandomJitter))),
            pins: Box::new(SysfsGpio::new(&hardware.gpio_root)),
        },
        AcquisitionMode::Simulated => Devices {
            mode: AcquisitionMode::Simulated,
            sensors: Box::new(SimulatedSensorBus::default()),
            pins: Box::new(SimulatedPins::default()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_mode_falls_back_without_devices() {
        let hardware = Hardware {
            climate_device: String::from("/nonexistent/iio:device0"),
            adc_device: String::from("/nonexistent/iio:device1"),
            ..Hardware::default()
        };

        assert_eq!(resolve_mode(SensorMode::Auto, &hardware), AcquisitionMode::Simulated);
        assert_eq!(resolve_mode(SensorMode::Real, &hardware), AcquisitionMode::Real);
        assert_eq!(resolve_mode(SensorMode::Simulated, &hardware), AcquisitionMode::Simulated);
    }

    #[test]
    fn test_auto_mode_detects_devices() {
        let root = tempfile::tempdir().unwrap();
        let climate = root.path().join("iio:device0");
        let adc = root.path().join("iio:device1");
        std::fs::create_dir(&climate).unwrap();
        std::fs::create_dir(&adc).unwrap();

        let hardware = Hardware {
            climate_device: climate.to_string_lossy().to_string(),
            adc_device: adc.to_string_lossy().to_string(),
            ..Hardware::default()
        };

        assert_eq!(resolve_mode(SensorMode::Auto, &hardware), AcquisitionMode::Real);
    }
}
