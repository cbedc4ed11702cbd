use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::acquisition::Readings;
use crate::parameter::{Direction, Parameter};

/// Smallest change between two cycles that counts as a movement.
pub const TREND_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MonitoringState {
    pub active: bool,
    pub target: Option<f64>,
    pub direction: Option<Direction>,
    pub started_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Activation {
    Started,
    Replaced { previous_target: f64 },
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetReached {
    pub parameter: Parameter,
    pub target: f64,
    pub direction: Direction,
    pub value: f64,
}

/// Exact comparison, no tolerance.
pub fn reached(current: f64, target: f64, direction: Direction) -> bool {
    match direction {
        Direction::Up => current >= target,
        Direction::Down => current <= target,
    }
}

/// Closest value a parameter can hold that satisfies [`reached`] for `target`.
///
/// Integral parameters round away from the start so a fractional target is
/// still reachable.
pub fn settle(parameter: Parameter, target: f64, direction: Direction) -> f64 {
    if !parameter.is_integral() {
        return target;
    }

    match direction {
        Direction::Up => target.ceil(),
        Direction::Down => target.floor(),
    }
}

/// Per-parameter `idle -> active -> idle` tracking of targets.
#[derive(Debug, Default)]
pub struct MonitoringEngine {
    states: BTreeMap<Parameter, MonitoringState>,
}

impl MonitoringEngine {
    pub fn new() -> Self {
        let states = Parameter::ACTIVE
            .iter()
            .map(|parameter| (*parameter, MonitoringState::default()))
            .collect();

        Self { states }
    }

    pub fn state(&self, parameter: Parameter) -> MonitoringState {
        self.states.get(&parameter).copied().unwrap_or_default()
    }

    pub fn is_active(&self, parameter: Parameter) -> bool {
        self.state(parameter).active
    }

    /// Activates a target, overwriting any target already being pursued.
    pub fn start(&mut self, parameter: Parameter, target: f64, direction: Direction) -> Activation {
        let Some(state) = self.states.get_mut(&parameter) else {
            tracing::warn!("Refusing to monitor disabled parameter {}", parameter);
            return Activation::Rejected;
        };

        let previous = if state.active { state.target } else { None };

        *state = MonitoringState {
            active: true,
            target: Some(target),
            direction: Some(direction),
            started_at: Some(OffsetDateTime::now_utc()),
        };

        tracing::info!("Monitoring {} toward {:.2} ({})", parameter, target, direction);

        match previous {
            Some(previous_target) => Activation::Replaced { previous_target },
            None => Activation::Started,
        }
    }

    /// Returns `false` when there was nothing to stop.
    pub fn stop(&mut self, parameter: Parameter) -> bool {
        match self.states.get_mut(&parameter) {
            Some(state) if state.active => {
                state.active = false;
                tracing::info!("Monitoring of {} cancelled", parameter);
                true
            }
            Some(_) => false,
            None => {
                tracing::warn!("Refusing to stop disabled parameter {}", parameter);
                false
            }
        }
    }

    /// Deactivates every parameter whose live value reached its target.
    pub fn evaluate(&mut self, readings: &Readings) -> Vec<TargetReached> {
        let mut completed = Vec::new();

        for (parameter, state) in self.states.iter_mut() {
            if !state.active {
                continue;
            }
            let (Some(target), Some(direction)) = (state.target, state.direction) else {
                continue;
            };

            let value = readings.get(*parameter);
            if reached(value, target, direction) {
                state.active = false;
                completed.push(TargetReached {
                    parameter: *parameter,
                    target,
                    direction,
                    value,
                });
            }
        }

        completed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Horizontal,
}

impl From<Direction> for Trend {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => Trend::Up,
            Direction::Down => Trend::Down,
        }
    }
}

/// Arrow shown next to each value.
#[derive(Debug, Default)]
pub struct TrendTracker {
    previous: BTreeMap<Parameter, f64>,
    trends: BTreeMap<Parameter, Trend>,
}

impl TrendTracker {
    pub fn update(&mut self, readings: &Readings, engine: &MonitoringEngine) {
        for parameter in Parameter::ACTIVE {
            let value = readings.get(parameter);
            let state = engine.state(parameter);

            let trend = match (state.active, state.direction) {
                (true, Some(direction)) => Trend::from(direction),
                _ => match self.previous.get(&parameter) {
                    Some(previous) if value - previous > TREND_THRESHOLD => Trend::Up,
                    Some(previous) if value - previous < -TREND_THRESHOLD => Trend::Down,
                    _ => Trend::Horizontal,
                },
            };

            self.previous.insert(parameter, value);
            self.trends.insert(parameter, trend);
        }
    }

    pub fn trend(&self, parameter: Parameter) -> Trend {
        self.trends.get(&parameter).copied().unwrap_or(Trend::Horizontal)
    }

    pub fn trends(&self) -> &BTreeMap<Parameter, Trend> {
        &self.trends
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn readings_with(parameter: Parameter, value: f64) -> Readings {
        let mut readings = Readings::default();
        readings.set(parameter, value);
        readings
    }

    #[test]
    fn test_reached_is_exact() {
        assert!(reached(22.5, 22.5, Direction::Up));
        assert!(!reached(22.499, 22.5, Direction::Up));
        assert!(reached(22.5, 22.5, Direction::Down));
        assert!(!reached(22.501, 22.5, Direction::Down));
        assert!(reached(30.0, 22.5, Direction::Up));
    }

    #[test]
    fn test_settle_keeps_fractional_targets_reachable() {
        let up = settle(Parameter::Light, 401.4, Direction::Up);
        assert_eq!(up, 402.0);
        assert!(reached(up, 401.4, Direction::Up));

        let down = settle(Parameter::AirQuality, 58.6, Direction::Down);
        assert_eq!(down, 58.0);
        assert!(reached(down, 58.6, Direction::Down));

        assert_eq!(settle(Parameter::Temperature, 20.6, Direction::Up), 20.6);
    }

    #[test]
    fn test_start_then_reach() {
        let mut engine = MonitoringEngine::new();
        assert_eq!(engine.start(Parameter::Temperature, 23.0, Direction::Up), Activation::Started);

        assert!(engine.evaluate(&readings_with(Parameter::Temperature, 22.9)).is_empty());
        assert!(engine.is_active(Parameter::Temperature));

        let done = engine.evaluate(&readings_with(Parameter::Temperature, 23.0));
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].parameter, Parameter::Temperature);
        assert_eq!(done[0].value, 23.0);
        assert!(!engine.is_active(Parameter::Temperature));

        let state = engine.state(Parameter::Temperature);
        assert_eq!(state.target, Some(23.0));
        assert_eq!(state.direction, Some(Direction::Up));
    }

    #[test]
    fn test_new_start_overwrites_target() {
        let mut engine = MonitoringEngine::new();
        engine.start(Parameter::Humidity, 55.0, Direction::Up);

        let activation = engine.start(Parameter::Humidity, 45.0, Direction::Down);
        assert_eq!(activation, Activation::Replaced { previous_target: 55.0 });

        let state = engine.state(Parameter::Humidity);
        assert_eq!(state.target, Some(45.0));
        assert_eq!(state.direction, Some(Direction::Down));
        assert!(engine.evaluate(&readings_with(Parameter::Humidity, 50.0)).is_empty());
    }

    #[test]
    fn test_noise_is_rejected() {
        let mut engine = MonitoringEngine::new();

        assert_eq!(engine.start(Parameter::Noise, 40.0, Direction::Down), Activation::Rejected);
        assert!(!engine.is_active(Parameter::Noise));
        assert!(!engine.stop(Parameter::Noise));
    }

    #[test]
    fn test_stop_cancels_active_target() {
        let mut engine = MonitoringEngine::new();
        engine.start(Parameter::Light, 650.0, Direction::Up);

        assert!(engine.stop(Parameter::Light));
        assert!(!engine.stop(Parameter::Light));
        assert!(engine.evaluate(&readings_with(Parameter::Light, 700.0)).is_empty());
    }

    #[test]
    fn test_trend_follows_changes_and_monitoring() {
        let mut engine = MonitoringEngine::new();
        let mut tracker = TrendTracker::default();

        tracker.update(&readings_with(Parameter::Temperature, 22.0), &engine);
        assert_eq!(tracker.trend(Parameter::Temperature), Trend::Horizontal);

        tracker.update(&readings_with(Parameter::Temperature, 22.5), &engine);
        assert_eq!(tracker.trend(Parameter::Temperature), Trend::Up);

        tracker.update(&readings_with(Parameter::Temperature, 22.45), &engine);
        assert_eq!(tracker.trend(Parameter::Temperature), Trend::Horizontal);

        engine.start(Parameter::Temperature, 21.0, Direction::Down);
        tracker.update(&readings_with(Parameter::Temperature, 23.0), &engine);
        assert_eq!(tracker.trend(Parameter::Temperature), Trend::Down);
    }
}
