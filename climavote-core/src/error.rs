use crate::parameter::Parameter;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Vote {0} is outside the range -3..=3")]
    VoteOutOfRange(i32),
}

/// Failure modes of a single sensor read.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SensorFault {
    #[error("Sensor read timed out")]
    Timeout,

    #[error("Sensor checksum mismatch")]
    Checksum,

    #[error("Sensor device not found: {0}")]
    DeviceNotFound(String),

    #[error("Sensor I/O error: {0}")]
    Io(String),

    #[error("Sensor reading {value} out of range for {parameter}")]
    OutOfRange { parameter: Parameter, value: f64 },
}

impl SensorFault {
    /// Whether another attempt within the same cycle can succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, SensorFault::Timeout | SensorFault::Checksum | SensorFault::Io(_))
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Output pin {pin} failed: {reason}")]
pub struct PinFault {
    pub pin: u8,
    pub reason: String,
}
