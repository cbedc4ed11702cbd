use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::PinFault;
use crate::parameter::{Direction, Parameter};

/// Digital output backend, one level write per call.
pub trait OutputPin: Send {
    fn write(&mut self, pin: u8, on: bool) -> Result<(), PinFault>;
}

impl<P: OutputPin + ?Sized> OutputPin for Box<P> {
    fn write(&mut self, pin: u8, on: bool) -> Result<(), PinFault> {
        (**self).write(pin, on)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channels {
    pub decrease: u8,
    pub increase: u8,
}

impl Channels {
    pub fn for_direction(&self, direction: Direction) -> u8 {
        match direction {
            Direction::Up => self.increase,
            Direction::Down => self.decrease,
        }
    }
}

/// BCM pin assignment of the indicator board.
pub fn default_channels() -> BTreeMap<Parameter, Channels> {
    BTreeMap::from([
        (Parameter::Temperature, Channels { decrease: 24, increase: 23 }),
        (Parameter::Humidity, Channels { decrease: 12, increase: 25 }),
        (Parameter::Light, Channels { decrease: 13, increase: 16 }),
        (Parameter::AirQuality, Channels { decrease: 5, increase: 17 }),
    ])
}

/// Keeps at most one lit channel per parameter.
pub struct IndicatorDriver<P> {
    pins: P,
    channels: BTreeMap<Parameter, Channels>,
    lit: BTreeMap<Parameter, Direction>,
}

impl<P: OutputPin> IndicatorDriver<P> {
    pub fn new(pins: P) -> Self {
        Self::with_channels(pins, default_channels())
    }

    pub fn with_channels(pins: P, channels: BTreeMap<Parameter, Channels>) -> Self {
        Self {
            pins,
            channels,
            lit: BTreeMap::new(),
        }
    }

    /// Drives every channel low.
    pub fn init(&mut self) -> Result<(), PinFault> {
        self.turn_off_all()
    }

    pub fn channels(&self, parameter: Parameter) -> Option<Channels> {
        self.channels.get(&parameter).copied()
    }

    pub fn state(&self, parameter: Parameter) -> Option<Direction> {
        self.lit.get(&parameter).copied()
    }

    pub fn states(&self) -> &BTreeMap<Parameter, Direction> {
        &self.lit
    }

    pub fn pins(&self) -> &P {
        &self.pins
    }

    /// Lights the channel for `direction`, turning the opposite one off.
    ///
    /// Returns `Ok(false)` for parameters without channels.
    pub fn indicate(&mut self, parameter: Parameter, direction: Direction) -> Result<bool, PinFault> {
        let Some(channels) = self.channels(parameter) else {
            tracing::warn!("No indicator for {}, ignoring {}", parameter, direction);
            return Ok(false);
        };

        self.lit.remove(&parameter);
        self.pins.write(channels.decrease, false)?;
        self.pins.write(channels.increase, false)?;

        self.pins.write(channels.for_direction(direction), true)?;
        self.lit.insert(parameter, direction);

        tracing::debug!(
            "Indicator {} {} on GPIO{}",
            parameter,
            direction,
            channels.for_direction(direction)
        );

        Ok(true)
    }

    pub fn turn_off(&mut self, parameter: Parameter) -> Result<bool, PinFault> {
        let Some(channels) = self.channels(parameter) else {
            tracing::warn!("No indicator for {}", parameter);
            return Ok(false);
        };

        self.lit.remove(&parameter);
        self.pins.write(channels.decrease, false)?;
        self.pins.write(channels.increase, false)?;

        Ok(true)
    }

    /// Attempts every channel even if some writes fail, reporting the first failure.
    pub fn turn_off_all(&mut self) -> Result<(), PinFault> {
        let mut first_error = None;

        for channels in self.channels.values() {
            for pin in [channels.decrease, channels.increase] {
                if let Err(e) = self.pins.write(pin, false) {
                    first_error.get_or_insert(e);
                }
            }
        }
        self.lit.clear();

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
