use serde::{Deserialize, Serialize};

use crate::comfort::comfort_range;
use crate::parameter::Parameter;

pub const SMOOTHING_WINDOW: usize = 5;
pub const TREND_SLOPE_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesTrend {
    Rising,
    Falling,
    Stable,
    /// Fewer than two samples.
    Insufficient,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandShare {
    pub optimal: usize,
    pub acceptable: usize,
    pub critical: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub parameter: Parameter,
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub variance: f64,
    pub q25: f64,
    pub q75: f64,
    pub iqr: f64,
    pub range: f64,
    pub total_change: f64,
    pub slope: f64,
    pub trend: SeriesTrend,
    pub bands: BandShare,
}

impl Summary {
    pub fn optimal_percent(&self) -> f64 {
        self.percent(self.bands.optimal)
    }

    pub fn acceptable_percent(&self) -> f64 {
        self.percent(self.bands.acceptable)
    }

    pub fn critical_percent(&self) -> f64 {
        self.percent(self.bands.critical)
    }

    fn percent(&self, part: usize) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            part as f64 / self.count as f64 * 100.0
        }
    }
}

/// Linear interpolation between closest ranks, `sorted` must be ascending.
fn percentile(sorted: &[f64], fraction: f64) -> f64 {
    let position = fraction * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;

    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

/// Summarises a chronological series; `None` for noise or an empty series.
pub fn summarize(parameter: Parameter, values: &[f64]) -> Option<Summary> {
    if parameter.is_disabled() || values.is_empty() {
        return None;
    }

    let count = values.len();
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let min = sorted[0];
    let max = sorted[count - 1];
    let mean = values.iter().sum::<f64>() / count as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
    let q25 = percentile(&sorted, 0.25);
    let q75 = percentile(&sorted, 0.75);

    let first = values[0];
    let last = values[count - 1];
    let slope = (last - first) / count as f64;
    let trend = if count < 2 {
        SeriesTrend::Insufficient
    } else if slope > TREND_SLOPE_THRESHOLD {
        SeriesTrend::Rising
    } else if slope < -TREND_SLOPE_THRESHOLD {
        SeriesTrend::Falling
    } else {
        SeriesTrend::Stable
    };

    let range = comfort_range(parameter);
    let optimal = values.iter().filter(|v| range.optimal.contains(**v)).count();
    let acceptable = values.iter().filter(|v| range.acceptable.contains(**v)).count();

    Some(Summary {
        parameter,
        count,
        min,
        max,
        mean,
        median: percentile(&sorted, 0.5),
        std_dev: variance.sqrt(),
        variance,
        q25,
        q75,
        iqr: q75 - q25,
        range: max - min,
        total_change: last - first,
        slope,
        trend,
        bands: BandShare {
            optimal,
            acceptable,
            critical: count - acceptable,
        },
    })
}

/// Centred moving average; the window shrinks at both ends of the series.
pub fn smooth(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || values.len() < window {
        return values.to_vec();
    }

    let half = window / 2;
    (0..values.len())
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = (i + half + 1).min(values.len());
            let slice = &values[start..end];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(left: f64, right: f64) -> bool {
        (left - right).abs() < 1e-9
    }

    #[test]
    fn test_summary_of_temperature_series() {
        let values = [20.0, 21.0, 22.0, 23.0, 24.0, 25.0];
        let summary = summarize(Parameter::Temperature, &values).unwrap();

        assert_eq!(summary.count, 6);
        assert_eq!(summary.min, 20.0);
        assert_eq!(summary.max, 25.0);
        assert!(approx(summary.mean, 22.5));
        assert!(approx(summary.median, 22.5));
        assert!(approx(summary.variance, 17.5 / 6.0));
        assert!(approx(summary.q25, 21.25));
        assert!(approx(summary.q75, 23.75));
        assert!(approx(summary.iqr, 2.5));
        assert!(approx(summary.slope, 5.0 / 6.0));
        assert_eq!(summary.trend, SeriesTrend::Rising);
        assert_eq!(summary.bands.optimal, 4);
        assert_eq!(summary.bands.acceptable, 6);
        assert_eq!(summary.bands.critical, 0);
        assert!(approx(summary.optimal_percent(), 400.0 / 6.0));
    }

    #[test]
    fn test_flat_series_is_stable() {
        let summary = summarize(Parameter::Humidity, &[50.0, 50.2, 49.9, 50.1]).unwrap();
        assert_eq!(summary.trend, SeriesTrend::Stable);
    }

    #[test]
    fn test_single_sample_has_no_trend() {
        let summary = summarize(Parameter::Light, &[650.0]).unwrap();
        assert_eq!(summary.trend, SeriesTrend::Insufficient);
        assert_eq!(summary.q25, 650.0);
        assert_eq!(summary.std_dev, 0.0);
    }

    #[test]
    fn test_noise_and_empty_series_have_no_summary() {
        assert!(summarize(Parameter::Noise, &[45.0]).is_none());
        assert!(summarize(Parameter::Temperature, &[]).is_none());
    }

    #[test]
    fn test_smoothing_shrinks_window_at_edges() {
        let smoothed = smooth(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], SMOOTHING_WINDOW);

        assert!(approx(smoothed[0], 2.0));
        assert!(approx(smoothed[1], 2.5));
        assert!(approx(smoothed[2], 3.0));
        assert!(approx(smoothed[5], 5.0));
    }

    #[test]
    fn test_short_series_is_not_smoothed() {
        assert_eq!(smooth(&[1.0, 5.0], SMOOTHING_WINDOW), vec![1.0, 5.0]);
    }
}
