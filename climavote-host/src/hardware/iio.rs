use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use climavote_core::SensorFault;
use climavote_core::acquisition::{AmbientReading, ClimateReading};
use climavote_core::conversion::{Jitter, voltage_to_air_quality_index, voltage_to_illuminance};

use crate::configs::Hardware;
use crate::hardware::SensorBus;

const ETIMEDOUT: i32 = 110;
const EIO: i32 = 5;

/// Reads the DHT22 and the ADS1115 through their Linux IIO drivers.
pub struct IioSensorBus {
    climate_device: PathBuf,
    adc_device: PathBuf,
    light_channel: u8,
    air_channel: u8,
    read_retries: u32,
    retry_pause: Duration,
    jitter: Box<dyn Jitter>,
}

impl IioSensorBus {
    pub fn new(hardware: &Hardware, jitter: Box<dyn Jitter>) -> Self {
        Self {
            climate_device: PathBuf::from(&hardware.climate_device),
            adc_device: PathBuf::from(&hardware.adc_device),
            light_channel: hardware.light_channel,
            air_channel: hardware.air_channel,
            read_retries: hardware.read_retries.max(1),
            retry_pause: hardware.retry_pause(),
            jitter,
        }
    }

    async fn read_climate_once(&self) -> Result<ClimateReading, SensorFault> {
        let temperature = read_value(&self.climate_device.join("in_temp_input")).await?;
        let humidity = read_value(&self.climate_device.join("in_humidityrelative_input")).await?;

        Ok(ClimateReading {
            temperature: temperature / 1000.0,
            humidity: humidity / 1000.0,
        })
    }

    /// Channel voltage in volts; the driver reports raw counts and a millivolt scale.
    async fn read_voltage(&self, channel: u8) -> Result<f64, SensorFault> {
        let raw = read_value(&self.adc_device.join(format!("in_voltage{channel}_raw"))).await?;
        let scale = read_value(&self.adc_device.join(format!("in_voltage{channel}_scale"))).await?;

        Ok(raw * scale / 1000.0)
    }
}

#[async_trait]
impl SensorBus for IioSensorBus {
    async fn read_climate(&mut self) -> Result<ClimateReading, SensorFault> {
        let mut attempt = 1;

        loop {
            match self.read_climate_once().await {
                Ok(reading) => return Ok(reading),
                Err(fault) if fault.is_transient() && attempt < self.read_retries => {
                    tracing::debug!("climate read attempt {} failed: {}", attempt, fault);
                    attempt += 1;
                    tokio::time::sleep(self.retry_pause).await;
                }
                Err(fault) => return Err(fault),
            }
        }
    }

    async fn read_ambient(&mut self) -> Result<AmbientReading, SensorFault> {
        let light_volts = self.read_voltage(self.light_channel).await?;
        let air_volts = self.read_voltage(self.air_channel).await?;

        Ok(AmbientReading {
            light: voltage_to_illuminance(light_volts),
            air_quality: voltage_to_air_quality_index(air_volts, self.jitter.as_mut()),
        })
    }
}

async fn read_value(path: &Path) -> Result<f64, SensorFault> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| map_io_error(path, e))?;

    content
        .trim()
        .parse::<f64>()
        .map_err(|e| SensorFault::Io(format!("{}: {}", path.display(), e)))
}

fn map_io_error(path: &Path, error: io::Error) -> SensorFault {
    match (error.kind(), error.raw_os_error()) {
        (io::ErrorKind::NotFound, _) => SensorFault::DeviceNotFound(path.display().to_string()),
        (io::ErrorKind::TimedOut, _) | (_, Some(ETIMEDOUT)) => SensorFault::Timeout,
        (_, Some(EIO)) => SensorFault::Checksum,
        _ => SensorFault::Io(format!("{}: {}", path.display(), error)),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use climavote_core::conversion::NoJitter;
    use tempfile::TempDir;

    use super::*;

    struct FakeSysfs {
        root: TempDir,
    }

    impl FakeSysfs {
        fn new() -> Self {
            let root = tempfile::tempdir().unwrap();
            fs::create_dir(root.path().join("climate")).unwrap();
            fs::create_dir(root.path().join("adc")).unwrap();
            Self { root }
        }

        fn write(&self, device: &str, node: &str, value: &str) {
            fs::write(self.root.path().join(device).join(node), value).unwrap();
        }

        fn bus(&self) -> IioSensorBus {
            let hardware = Hardware {
                climate_device: self.root.path().join("climate").to_string_lossy().to_string(),
                adc_device: self.root.path().join("adc").to_string_lossy().to_string(),
                retry_pause_ms: 1,
                ..Hardware::default()
            };
            IioSensorBus::new(&hardware, Box::new(NoJitter))
        }
    }

    #[tokio::test]
    async fn test_reads_climate_in_milli_units() {
        let sysfs = FakeSysfs::new();
        sysfs.write("climate", "in_temp_input", "23400\n");
        sysfs.write("climate", "in_humidityrelative_input", "48700\n");

        let reading = sysfs.bus().read_climate().await.unwrap();
        assert!((reading.temperature - 23.4).abs() < 1e-9);
        assert!((reading.humidity - 48.7).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_missing_climate_device_is_reported() {
        let sysfs = FakeSysfs::new();

        let result = sysfs.bus().read_climate().await;
        assert!(matches!(result, Err(SensorFault::DeviceNotFound(_))));
    }

    #[tokio::test]
    async fn test_garbage_is_retried_then_reported() {
        let sysfs = FakeSysfs::new();
        sysfs.write("climate", "in_temp_input", "garbage");
        sysfs.write("climate", "in_humidityrelative_input", "50000");

        let result = sysfs.bus().read_climate().await;
        assert!(matches!(result, Err(SensorFault::Io(_))));
    }

    #[tokio::test]
    async fn test_reads_ambient_through_conversion() {
        let sysfs = FakeSysfs::new();
        // 6400 counts at 0.125 mV = 0.8 V on the light channel
        sysfs.write("adc", "in_voltage0_raw", "6400");
        sysfs.write("adc", "in_voltage0_scale", "0.125");
        // 16000 counts at 0.125 mV = 2.0 V on the gas channel
        sysfs.write("adc", "in_voltage1_raw", "16000");
        sysfs.write("adc", "in_voltage1_scale", "0.125");

        let reading = sysfs.bus().read_ambient().await.unwrap();
        assert_eq!(reading.light, 500);
        assert_eq!(reading.air_quality, 252);
    }
}
