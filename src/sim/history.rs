//! Bounded power history and synthetic backfill.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, TimeZone};
use rand::Rng;

use super::types::{HistoryPoint, PhaseId};

/// Label format used for history timestamps.
pub const TIMESTAMP_FORMAT: &str = "%H:%M:%S";

/// Fixed per-phase offsets (kW) applied to the base power during backfill.
const BACKFILL_OFFSETS_KW: [f64; 3] = [0.0, -0.1, 0.0];

/// Full width of the backfill jitter; samples fall in `[-0.25, +0.25]` kW.
const BACKFILL_JITTER_SPAN_KW: f64 = 0.5;

/// Formats a wall-clock instant as a history label.
pub fn timestamp_label<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Appends a point and evicts from the front until `len <= capacity`.
pub fn push_bounded(history: &mut VecDeque<HistoryPoint>, point: HistoryPoint, capacity: usize) {
    history.push_back(point);
    while history.len() > capacity {
        history.pop_front();
    }
}

/// Produces `points` synthetic samples spaced `spacing` apart, the last at `now`.
///
/// Each phase sample is `base_power_kw` plus a fixed per-phase offset plus
/// uniform jitter, so the trend chart has data before the first tick.
pub fn backfill<Tz, R>(
    base_power_kw: f64,
    now: &DateTime<Tz>,
    points: usize,
    spacing: Duration,
    rng: &mut R,
) -> VecDeque<HistoryPoint>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
    R: Rng + ?Sized,
{
    let mut history = VecDeque::with_capacity(points);
    for i in (0..points).rev() {
        let at = now.clone() - spacing * i as i32;
        let mut sample = [0.0_f64; 3];
        for phase in PhaseId::ALL {
            let jitter = (rng.random::<f64>() - 0.5) * BACKFILL_JITTER_SPAN_KW;
            sample[phase.index()] = base_power_kw + BACKFILL_OFFSETS_KW[phase.index()] + jitter;
        }
        history.push_back(HistoryPoint {
            timestamp: timestamp_label(&at),
            power_r: sample[0],
            power_s: sample[1],
            power_t: sample[2],
        });
    }
    history
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn point(label: &str) -> HistoryPoint {
        HistoryPoint {
            timestamp: label.to_string(),
            power_r: 1.0,
            power_s: 1.0,
            power_t: 1.0,
        }
    }

    #[test]
    fn push_bounded_evicts_oldest_first() {
        let mut history = VecDeque::new();
        for i in 0..25 {
            push_bounded(&mut history, point(&i.to_string()), 20);
            assert!(history.len() <= 20);
        }
        assert_eq!(history.len(), 20);
        assert_eq!(history.front().map(|p| p.timestamp.as_str()), Some("5"));
        assert_eq!(history.back().map(|p| p.timestamp.as_str()), Some("24"));
    }

    #[test]
    fn backfill_spacing_and_order() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 50).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let history = backfill(3.3, &now, 11, Duration::seconds(5), &mut rng);

        assert_eq!(history.len(), 11);
        assert_eq!(history.front().map(|p| p.timestamp.as_str()), Some("12:00:00"));
        assert_eq!(history[1].timestamp, "12:00:05");
        assert_eq!(history.back().map(|p| p.timestamp.as_str()), Some("12:00:50"));
    }

    #[test]
    fn backfill_jitter_stays_near_base() {
        let now = Utc::now();
        let mut rng = StdRng::seed_from_u64(2);
        let history = backfill(3.3, &now, 200, Duration::seconds(5), &mut rng);
        for p in &history {
            assert!((p.power_r - 3.3).abs() <= 0.25);
            assert!((p.power_s - 3.2).abs() <= 0.25 + 1e-9);
            assert!((p.power_t - 3.3).abs() <= 0.25);
        }
    }

    #[test]
    fn backfill_zero_points_is_empty() {
        let mut rng = StdRng::seed_from_u64(0);
        let history = backfill(3.3, &Utc::now(), 0, Duration::seconds(5), &mut rng);
        assert!(history.is_empty());
    }
}
