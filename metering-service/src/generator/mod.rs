//! Synthetic metering series.
//!
//! Readings follow a fixed daily and weekly load shape with bounded uniform
//! noise on top. The noise comes from a caller-supplied RNG, so a seeded RNG
//! (or `variance = 0`) reproduces a series exactly.

use std::f64::consts::PI;

use metering_client::domain::NewReading;
use rand::Rng;
use time::{Duration, OffsetDateTime, UtcOffset, Weekday};

/// Parameters for one synthetic series. `interval_minutes` must be positive;
/// the service layer rejects anything else before calling [`generate`].
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesParams {
    pub classification_id: i32,
    pub start: OffsetDateTime,
    /// Inclusive.
    pub end: OffsetDateTime,
    pub interval_minutes: i64,
    pub base_value: f64,
    pub variance: f64,
}

impl SeriesParams {
    /// Number of readings [`generate`] will emit.
    pub fn point_count(&self) -> u64 {
        let Some(step) = self.step() else {
            return 0;
        };
        if self.end < self.start {
            return 0;
        }
        let span = (self.end - self.start).whole_seconds() as u64;
        span / step.whole_seconds() as u64 + 1
    }

    /// Spacing between readings, or `None` when `interval_minutes` is not
    /// positive or too large to express as a [`Duration`].
    pub fn step(&self) -> Option<Duration> {
        if self.interval_minutes <= 0 {
            return None;
        }
        self.interval_minutes.checked_mul(60).map(Duration::seconds)
    }
}

/// Load-shape multiplier for the hour of day (UTC).
pub fn time_of_day_factor(hour: u8) -> f64 {
    match hour {
        8..=17 => 1.0 + 0.5 * ((hour - 8) as f64 * PI / 9.0).sin(),
        18..=22 => 0.7,
        _ => 0.3,
    }
}

pub fn day_of_week_factor(day: Weekday) -> f64 {
    match day {
        Weekday::Saturday | Weekday::Sunday => 0.6,
        _ => 1.0,
    }
}

/// Produce one reading per interval from `start` through `end` inclusive,
/// in increasing timestamp order.
pub fn generate<R: Rng + ?Sized>(params: &SeriesParams, rng: &mut R) -> Vec<NewReading> {
    let mut out = Vec::with_capacity(params.point_count() as usize);
    let Some(step) = params.step() else {
        return out;
    };

    let minutes = params.interval_minutes as f64;
    let mut t = params.start;

    while t <= params.end {
        let utc = t.to_offset(UtcOffset::UTC);
        let shape = time_of_day_factor(utc.hour()) * day_of_week_factor(utc.weekday());
        let noise = (rng.gen::<f64>() * 2.0 - 1.0) * params.variance;

        let energy_value = (params.base_value * shape + noise).max(0.0);
        let power = energy_value * 60.0 / minutes;

        out.push(NewReading {
            ts: t,
            classification_id: params.classification_id,
            energy_value,
            power,
        });

        t = match t.checked_add(step) {
            Some(next) => next,
            None => break,
        };
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use time::macros::datetime;

    fn params(start: OffsetDateTime, end: OffsetDateTime, variance: f64) -> SeriesParams {
        SeriesParams {
            classification_id: 1,
            start,
            end,
            interval_minutes: 15,
            base_value: 10.0,
            variance,
        }
    }

    #[test]
    fn night_hour_series_is_inclusive_and_flat_without_noise() {
        let p = params(
            datetime!(2024-01-01 00:00:00 UTC),
            datetime!(2024-01-01 01:00:00 UTC),
            0.0,
        );
        let readings = generate(&p, &mut StdRng::seed_from_u64(7));

        let stamps: Vec<_> = readings.iter().map(|r| r.ts).collect();
        assert_eq!(
            stamps,
            vec![
                datetime!(2024-01-01 00:00:00 UTC),
                datetime!(2024-01-01 00:15:00 UTC),
                datetime!(2024-01-01 00:30:00 UTC),
                datetime!(2024-01-01 00:45:00 UTC),
                datetime!(2024-01-01 01:00:00 UTC),
            ]
        );
        // 2024-01-01 is a Monday.
        for r in &readings {
            assert!((r.energy_value - 3.0).abs() < 1e-12);
            assert!((r.power - 12.0).abs() < 1e-12);
            assert_eq!(r.classification_id, 1);
        }
        assert_eq!(p.point_count(), 5);
    }

    #[test]
    fn load_shape_peaks_midday_and_drops_on_weekends() {
        assert_eq!(time_of_day_factor(8), 1.0);
        assert!((time_of_day_factor(12) - (1.0 + 0.5 * (4.0 * PI / 9.0).sin())).abs() < 1e-12);
        assert!(time_of_day_factor(12) > time_of_day_factor(9));
        assert_eq!(time_of_day_factor(18), 0.7);
        assert_eq!(time_of_day_factor(22), 0.7);
        assert_eq!(time_of_day_factor(23), 0.3);
        assert_eq!(time_of_day_factor(7), 0.3);

        assert_eq!(day_of_week_factor(Weekday::Saturday), 0.6);
        assert_eq!(day_of_week_factor(Weekday::Sunday), 0.6);
        assert_eq!(day_of_week_factor(Weekday::Wednesday), 1.0);

        let saturday_noon = params(
            datetime!(2024-01-06 12:00:00 UTC),
            datetime!(2024-01-06 12:00:00 UTC),
            0.0,
        );
        let readings = generate(&saturday_noon, &mut StdRng::seed_from_u64(1));
        assert_eq!(readings.len(), 1);
        let expected = 10.0 * time_of_day_factor(12) * 0.6;
        assert!((readings[0].energy_value - expected).abs() < 1e-12);
    }

    #[test]
    fn noise_stays_within_variance() {
        let p = params(
            datetime!(2024-01-01 00:00:00 UTC),
            datetime!(2024-01-01 05:00:00 UTC),
            2.0,
        );
        let readings = generate(&p, &mut StdRng::seed_from_u64(42));
        assert_eq!(readings.len(), 21);
        for r in &readings {
            assert!(r.energy_value >= 1.0 && r.energy_value <= 5.0, "{}", r.energy_value);
        }
    }

    #[test]
    fn energy_is_floored_at_zero_and_power_follows_energy() {
        let mut p = params(
            datetime!(2024-01-01 00:00:00 UTC),
            datetime!(2024-01-02 00:00:00 UTC),
            5.0,
        );
        p.base_value = 0.0;
        p.interval_minutes = 30;

        let readings = generate(&p, &mut StdRng::seed_from_u64(3));
        assert_eq!(readings.len(), 49);
        assert!(readings.iter().any(|r| r.energy_value == 0.0));
        for r in &readings {
            assert!(r.energy_value >= 0.0);
            assert!(r.power >= 0.0);
            assert_eq!(r.power, r.energy_value * 60.0 / 30.0);
        }
    }

    #[test]
    fn same_seed_reproduces_series() {
        let p = params(
            datetime!(2024-03-04 06:00:00 UTC),
            datetime!(2024-03-04 20:00:00 UTC),
            2.0,
        );
        let a = generate(&p, &mut StdRng::seed_from_u64(99));
        let b = generate(&p, &mut StdRng::seed_from_u64(99));
        let c = generate(&p, &mut StdRng::seed_from_u64(100));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn timestamps_strictly_increase() {
        let mut p = params(
            datetime!(2024-01-01 00:00:00 UTC),
            datetime!(2024-01-01 10:07:00 UTC),
            1.0,
        );
        p.interval_minutes = 60;
        let readings = generate(&p, &mut StdRng::seed_from_u64(5));
        assert_eq!(readings.len(), 11);
        assert_eq!(p.point_count(), 11);
        assert!(readings.windows(2).all(|w| w[0].ts < w[1].ts));
    }

    #[test]
    fn reversed_range_yields_nothing() {
        let p = params(
            datetime!(2024-01-02 00:00:00 UTC),
            datetime!(2024-01-01 00:00:00 UTC),
            0.0,
        );
        assert!(generate(&p, &mut StdRng::seed_from_u64(0)).is_empty());
        assert_eq!(p.point_count(), 0);
    }

    #[test]
    fn oversized_interval_has_no_step() {
        let mut p = params(
            datetime!(2024-01-01 00:00:00 UTC),
            datetime!(2024-01-02 00:00:00 UTC),
            0.0,
        );
        p.interval_minutes = 400_000_000_000_000_000;
        assert_eq!(p.step(), None);
        assert_eq!(p.point_count(), 0);
        assert_eq!(generate(&p, &mut StdRng::seed_from_u64(0)).len(), 0);

        p.interval_minutes = i64::MAX / 60;
        assert!(p.step().is_some());
        assert_eq!(p.point_count(), 1);
        let readings = generate(&p, &mut StdRng::seed_from_u64(0));
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].ts, datetime!(2024-01-01 00:00:00 UTC));
    }
}
