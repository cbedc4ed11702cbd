use climavote_core::acquisition::{AcquisitionMode, Readings, SensorHealth};
use climavote_core::comfort::{RangeStatus, classify};
use climavote_core::monitoring::{MonitoringEngine, MonitoringState, Trend, TrendTracker};
use climavote_core::{Direction, Parameter};
use serde::Serialize;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterView {
    pub parameter: Parameter,
    pub value: f64,
    pub unit: &'static str,
    pub status: RangeStatus,
    pub trend: Trend,
    pub monitoring: MonitoringState,
    pub indicator: Option<Direction>,
}

/// Read-only view of the station published after every cycle and command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationSnapshot {
    pub time: OffsetDateTime,
    /// Timestamp of the sample stored by the latest cycle.
    pub sampled_at: Option<OffsetDateTime>,
    pub cycles: u64,
    pub readings: Readings,
    pub health: SensorHealth,
    pub parameters: Vec<ParameterView>,
}

impl StationSnapshot {
    pub(crate) fn capture(
        cycles: u64,
        sampled_at: Option<OffsetDateTime>,
        readings: &Readings,
        health: SensorHealth,
        monitoring: &MonitoringEngine,
        trends: &TrendTracker,
        indicator: impl Fn(Parameter) -> Option<Direction>,
    ) -> Self {
        let parameters = Parameter::ALL
            .iter()
            .map(|parameter| {
                let value = readings.get(*parameter);
                ParameterView {
                    parameter: *parameter,
                    value,
                    unit: parameter.unit(),
                    status: classify(*parameter, value),
                    trend: trends.trend(*parameter),
                    monitoring: monitoring.state(*parameter),
                    indicator: indicator(*parameter),
                }
            })
            .collect();

        Self {
            time: OffsetDateTime::now_utc(),
            sampled_at,
            cycles,
            readings: *readings,
            health,
            parameters,
        }
    }

    pub(crate) fn initial(mode: AcquisitionMode) -> Self {
        let monitoring = MonitoringEngine::new();
        let trends = TrendTracker::default();
        let health = climavote_core::acquisition::Acquisition::new(mode).health();

        Self::capture(0, None, &Readings::default(), health, &monitoring, &trends, |_| None)
    }

    pub fn parameter(&self, parameter: Parameter) -> Option<&ParameterView> {
        self.parameters.iter().find(|view| view.parameter == parameter)
    }

    pub fn value(&self, parameter: Parameter) -> f64 {
        self.readings.get(parameter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_snapshot_covers_every_parameter() {
        let snapshot = StationSnapshot::initial(AcquisitionMode::Simulated);

        assert_eq!(snapshot.cycles, 0);
        assert_eq!(snapshot.sampled_at, None);
        assert_eq!(snapshot.parameters.len(), Parameter::ALL.len());
        assert_eq!(snapshot.value(Parameter::Noise), 45.0);

        let noise = snapshot.parameter(Parameter::Noise).unwrap();
        assert_eq!(noise.status, RangeStatus::Disabled);
        assert!(!noise.monitoring.active);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let snapshot = StationSnapshot::initial(AcquisitionMode::Real);
        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["parameters"][0]["parameter"], "temperature");
        assert_eq!(json["parameters"][3]["parameter"], "air_quality");
        assert_eq!(json["parameters"][0]["unit"], "°C");
        assert_eq!(json["health"]["mode"], "real");
        assert_eq!(json["health"]["climate"]["provenance"], "pending");
    }
}
