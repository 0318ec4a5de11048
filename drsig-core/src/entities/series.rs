//! Time-indexed payloads.

use drsig_sdk::objects::SeriesPoint;
use time::{Duration, PrimitiveDateTime};

use super::record::Timeframe;

/// Ordered `(timestamp, value)` samples taken at a uniform step.
///
/// Points are always sorted by timestamp. Constructors never panic on
/// date overflow: sampling stops at the last representable instant.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    step: Duration,
    points: Vec<(PrimitiveDateTime, f64)>,
}

impl TimeSeries {
    pub fn empty(step: Duration) -> Self {
        Self {
            step,
            points: Vec::new(),
        }
    }

    /// A constant `value` sampled at `start + k * step` for every instant in
    /// `[start, end)`.
    pub fn constant(
        start: PrimitiveDateTime,
        end: PrimitiveDateTime,
        step: Duration,
        value: f64,
    ) -> Self {
        let mut points = Vec::new();
        if step.is_positive() {
            let mut at = Some(start);
            while let Some(ts) = at.filter(|ts| *ts < end) {
                points.push((ts, value));
                at = ts.checked_add(step);
            }
        }
        Self { step, points }
    }

    /// Value `i` of `values` is placed at `start + i * step`.
    ///
    /// No bound is applied here; callers that own a window check the length
    /// against [`TimeSeries::slots`] first.
    pub fn from_values(
        start: PrimitiveDateTime,
        step: Duration,
        values: impl IntoIterator<Item = f64>,
    ) -> Self {
        let mut points = Vec::new();
        let mut at = Some(start);
        for value in values {
            let Some(ts) = at else { break };
            points.push((ts, value));
            at = ts.checked_add(step);
        }
        Self { step, points }
    }

    /// Build from arbitrary points; they are sorted by timestamp, keeping
    /// the input order of equal timestamps.
    pub fn from_points(
        step: Duration,
        points: impl IntoIterator<Item = (PrimitiveDateTime, f64)>,
    ) -> Self {
        let mut points: Vec<_> = points.into_iter().collect();
        points.sort_by_key(|(ts, _)| *ts);
        Self { step, points }
    }

    /// Number of instants `start + k * step` inside `[window.start, window.end)`.
    pub fn slots(window: &Timeframe, step: Duration) -> usize {
        let step = step.whole_nanoseconds();
        if step <= 0 {
            return 0;
        }
        let span = (window.end() - window.start()).whole_nanoseconds().max(0);
        usize::try_from((span + step - 1) / step).unwrap_or(usize::MAX)
    }

    /// Keep only points whose timestamp lies in `[window.start, window.end)`.
    pub fn restrict(self, window: &Timeframe) -> Self {
        let mut points = self.points;
        points.retain(|(ts, _)| *ts >= window.start() && *ts < window.end());
        Self {
            step: self.step,
            points,
        }
    }

    /// Union of two series with the same step.
    pub fn merge(self, other: TimeSeries) -> Self {
        let step = self.step;
        Self::from_points(step, self.points.into_iter().chain(other.points))
    }

    /// Keep only points whose timestamp lies in `[window.start, window.end]`.
    pub fn clip(&self, window: &Timeframe) -> Self {
        Self {
            step: self.step,
            points: self
                .points
                .iter()
                .filter(|(ts, _)| window.contains(*ts))
                .copied()
                .collect(),
        }
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    pub fn points(&self) -> &[(PrimitiveDateTime, f64)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn to_wire(&self) -> Vec<SeriesPoint> {
        self.points
            .iter()
            .map(|(timestamp, value)| SeriesPoint {
                timestamp: *timestamp,
                value: *value,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_constant_is_half_open() {
        let series = TimeSeries::constant(
            datetime!(2024-01-01 01:00),
            datetime!(2024-01-01 03:00),
            Duration::hours(1),
            5.0,
        );
        assert_eq!(
            series.points(),
            &[
                (datetime!(2024-01-01 01:00), 5.0),
                (datetime!(2024-01-01 02:00), 5.0),
            ]
        );
    }

    #[test]
    fn test_constant_with_empty_window_or_bad_step() {
        let at = datetime!(2024-01-01 01:00);
        assert!(TimeSeries::constant(at, at, Duration::hours(1), 1.0).is_empty());
        assert!(
            TimeSeries::constant(at, datetime!(2024-01-02 01:00), Duration::ZERO, 1.0).is_empty()
        );
    }

    #[test]
    fn test_from_values_uses_uniform_step() {
        let series = TimeSeries::from_values(
            datetime!(2024-01-01 00:00),
            Duration::minutes(15),
            [1.0, 2.0, 3.0],
        );
        assert_eq!(series.points()[2], (datetime!(2024-01-01 00:30), 3.0));
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn test_slots_match_constant_sampling() {
        let step = Duration::hours(1);
        let window =
            Timeframe::new(datetime!(2024-01-01 00:00), datetime!(2024-01-01 02:00)).unwrap();
        let constant = TimeSeries::constant(window.start(), window.end(), step, 1.0);
        assert_eq!(TimeSeries::slots(&window, step), constant.len());
        assert_eq!(TimeSeries::slots(&window, step), 2);

        let ragged =
            Timeframe::new(datetime!(2024-01-01 00:00), datetime!(2024-01-01 02:30)).unwrap();
        assert_eq!(TimeSeries::slots(&ragged, step), 3);

        let instant =
            Timeframe::new(datetime!(2024-01-01 00:00), datetime!(2024-01-01 00:00)).unwrap();
        assert_eq!(TimeSeries::slots(&instant, step), 0);
        assert_eq!(TimeSeries::slots(&window, Duration::ZERO), 0);
    }

    #[test]
    fn test_restrict_drops_end_and_outside_points() {
        let series = TimeSeries::from_values(
            datetime!(2023-12-31 23:00),
            Duration::hours(1),
            [0.0, 1.0, 2.0, 3.0],
        );
        let window =
            Timeframe::new(datetime!(2024-01-01 00:00), datetime!(2024-01-01 02:00)).unwrap();
        let restricted = series.restrict(&window);
        assert_eq!(
            restricted.points(),
            &[
                (datetime!(2024-01-01 00:00), 1.0),
                (datetime!(2024-01-01 01:00), 2.0),
            ]
        );
    }

    #[test]
    fn test_merge_sorts_by_time() {
        let later = TimeSeries::from_values(datetime!(2024-01-01 05:00), Duration::hours(1), [2.0]);
        let earlier =
            TimeSeries::from_values(datetime!(2024-01-01 01:00), Duration::hours(1), [1.0]);
        let merged = later.merge(earlier);
        assert_eq!(merged.points()[0].1, 1.0);
        assert_eq!(merged.points()[1].1, 2.0);
    }

    #[test]
    fn test_clip_is_inclusive() {
        let series = TimeSeries::from_values(
            datetime!(2024-01-01 10:00),
            Duration::hours(1),
            (10..=20).map(f64::from),
        );
        let window =
            Timeframe::new(datetime!(2024-01-01 15:00), datetime!(2024-01-01 23:00)).unwrap();
        let clipped = series.clip(&window);
        assert_eq!(clipped.points().first().map(|p| p.1), Some(15.0));
        assert_eq!(clipped.points().last().map(|p| p.1), Some(20.0));
    }
}
