pub mod acquisition;
pub mod comfort;
pub mod conversion;
pub mod error;
pub mod indicator;
pub mod monitoring;
pub mod parameter;
pub mod statistics;
pub mod votes;

pub use error::{CoreError, PinFault, SensorFault};
pub use parameter::{Direction, Parameter};
