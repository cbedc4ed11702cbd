use rand::Rng;

pub const MAX_ILLUMINANCE: f64 = 2000.0;
pub const MAX_AIR_QUALITY_INDEX: i32 = 500;
pub const AIR_QUALITY_JITTER: i32 = 12;

/// Source of the small random offset added to every air quality reading.
pub trait Jitter: Send + Sync {
    fn sample(&mut self) -> i32;
}

/// Uniform integer jitter in `[-AIR_QUALITY_JITTER, AIR_QUALITY_JITTER]`.
#[derive(Debug, Default)]
pub struct RandomJitter;

impl Jitter for RandomJitter {
    fn sample(&mut self) -> i32 {
        rand::rng().random_range(-AIR_QUALITY_JITTER..=AIR_QUALITY_JITTER)
    }
}

#[derive(Debug, Default)]
pub struct NoJitter;

impl Jitter for NoJitter {
    fn sample(&mut self) -> i32 {
        0
    }
}

#[derive(Debug)]
pub struct FixedJitter(pub i32);

impl Jitter for FixedJitter {
    fn sample(&mut self) -> i32 {
        self.0
    }
}

/// Piecewise-linear photoresistor curve.
///
/// | volts       | lux         |
/// |-------------|-------------|
/// | 0.00 - 0.05 | 0 - 100     |
/// | 0.05 - 0.30 | 100 - 300   |
/// | 0.30 - 0.80 | 300 - 500   |
/// | 0.80 - 1.80 | 500 - 800   |
/// | 1.80 - 2.50 | 800 - 1000  |
/// | 2.50 - 4.00 | 1000 - 1500 |
///
/// Negative voltages are folded, the result is clamped to `[0, 2000]`.
pub fn voltage_to_illuminance(voltage: f64) -> i32 {
    if !voltage.is_finite() {
        return 0;
    }

    let v = voltage.abs();

    let lux = if v < 0.05 {
        v * 2000.0
    } else if v < 0.3 {
        100.0 + (v - 0.05) / 0.25 * 200.0
    } else if v < 0.8 {
        300.0 + (v - 0.3) / 0.5 * 200.0
    } else if v < 1.8 {
        500.0 + (v - 0.8) / 1.0 * 300.0
    } else if v < 2.5 {
        800.0 + (v - 1.8) / 0.7 * 200.0
    } else {
        1000.0 + (v - 2.5) / 1.5 * 500.0
    };

    lux.clamp(0.0, MAX_ILLUMINANCE).round() as i32
}

/// Gas sensor curve followed by a jitter offset, clamped to `[0, 500]`.
pub fn voltage_to_air_quality_index(voltage: f64, jitter: &mut dyn Jitter) -> i32 {
    let base = if voltage.is_finite() {
        let v = voltage.abs();

        if v < 0.1 {
            (v * 420.0) as i32
        } else if v < 1.0 {
            (42.0 + (v - 0.1) * 140.0) as i32
        } else {
            (168.0 + (v - 1.0) * 84.0).min(f64::from(i32::MAX / 2)) as i32
        }
    } else {
        0
    };

    (base + jitter.sample()).clamp(0, MAX_AIR_QUALITY_INDEX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_illuminance_band_edges() {
        assert_eq!(voltage_to_illuminance(0.0), 0);
        assert_eq!(voltage_to_illuminance(0.05), 100);
        assert_eq!(voltage_to_illuminance(0.3), 300);
        assert_eq!(voltage_to_illuminance(0.8), 500);
        assert_eq!(voltage_to_illuminance(1.8), 800);
        assert_eq!(voltage_to_illuminance(2.5), 1000);
        assert_eq!(voltage_to_illuminance(4.0), 1500);
    }

    #[test]
    fn test_illuminance_is_continuous_across_fourth_band() {
        let below = voltage_to_illuminance(1.7999);
        let above = voltage_to_illuminance(2.4999);
        assert!((799..=800).contains(&below));
        assert!((999..=1000).contains(&above));
        assert_eq!(voltage_to_illuminance(2.15), 900);
    }

    #[test]
    fn test_illuminance_clamps_and_folds_sign() {
        assert_eq!(voltage_to_illuminance(-0.8), 500);
        assert_eq!(voltage_to_illuminance(10.0), 2000);
        assert_eq!(voltage_to_illuminance(f64::NAN), 0);
    }

    #[test]
    fn test_illuminance_is_monotonic() {
        let mut previous = voltage_to_illuminance(0.0);
        for step in 1..=500 {
            let lux = voltage_to_illuminance(step as f64 * 0.01);
            assert!(lux >= previous, "dropped at {} V", step as f64 * 0.01);
            previous = lux;
        }
    }

    #[test]
    fn test_air_quality_without_jitter() {
        let mut jitter = NoJitter;
        assert_eq!(voltage_to_air_quality_index(0.0525, &mut jitter), 22);
        assert_eq!(voltage_to_air_quality_index(0.505, &mut jitter), 98);
        assert_eq!(voltage_to_air_quality_index(2.0, &mut jitter), 252);
        assert_eq!(voltage_to_air_quality_index(-2.0, &mut jitter), 252);
    }

    #[test]
    fn test_air_quality_jitter_is_clamped() {
        assert_eq!(voltage_to_air_quality_index(0.0, &mut FixedJitter(-12)), 0);
        assert_eq!(voltage_to_air_quality_index(10.0, &mut FixedJitter(12)), 500);
        assert_eq!(voltage_to_air_quality_index(0.505, &mut FixedJitter(5)), 103);
    }

    #[test]
    fn test_random_jitter_stays_in_bounds() {
        let mut jitter = RandomJitter;
        for _ in 0..1000 {
            let offset = jitter.sample();
            assert!((-AIR_QUALITY_JITTER..=AIR_QUALITY_JITTER).contains(&offset));
        }
    }
}
