use std::collections::BTreeMap;

use chrono::{Duration, NaiveDateTime, Timelike};

use crate::data::model::SolarTable;

/// One fixed one-hour window of a time series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourlyBucket {
    /// Start of the window (minutes and seconds zeroed).
    pub start: NaiveDateTime,
    /// Mean of the metric in the window; `None` when the window has no
    /// observations.
    pub mean: Option<f64>,
}

fn floor_to_hour(ts: NaiveDateTime) -> NaiveDateTime {
    ts.date()
        .and_hms_opt(ts.hour(), 0, 0)
        .unwrap_or(ts)
}

#[derive(Default, Clone, Copy)]
struct Accumulator {
    sum: f64,
    n: usize,
}

impl Accumulator {
    fn push(&mut self, v: f64) {
        self.sum += v;
        self.n += 1;
    }

    fn mean(self) -> Option<f64> {
        (self.n > 0).then(|| self.sum / self.n as f64)
    }
}

/// Hourly means of `metric`, one bucket for every hour between the first and
/// last observed timestamp, in chronological order. Empty hours are kept with
/// `mean: None` so charts show gaps.
///
/// `None` when the table lacks a `Timestamp` column or the metric.
pub fn resample_hourly(table: &SolarTable, metric: &str) -> Option<Vec<HourlyBucket>> {
    let timestamps = table.timestamps.as_ref()?;
    let column = table.column(metric)?;

    let mut buckets: BTreeMap<NaiveDateTime, Accumulator> = BTreeMap::new();
    for (ts, value) in timestamps.iter().zip(&column.values) {
        let Some(ts) = ts else { continue };
        let acc = buckets.entry(floor_to_hour(*ts)).or_default();
        if let Some(v) = value {
            acc.push(*v);
        }
    }

    let (Some((&first, _)), Some((&last, _))) = (buckets.first_key_value(), buckets.last_key_value())
    else {
        return Some(Vec::new());
    };

    let mut out = Vec::new();
    let mut hour = first;
    while hour <= last {
        out.push(HourlyBucket {
            start: hour,
            mean: buckets.get(&hour).and_then(|acc| acc.mean()),
        });
        hour += Duration::hours(1);
    }
    Some(out)
}

/// Mean of `metric` by hour of day (0–23) across all dates. Hours without
/// observations are omitted; the result is strictly increasing by hour.
pub fn hourly_pattern(table: &SolarTable, metric: &str) -> Option<Vec<(u32, f64)>> {
    let timestamps = table.timestamps.as_ref()?;
    let column = table.column(metric)?;

    let mut by_hour = [Accumulator::default(); 24];
    for (ts, value) in timestamps.iter().zip(&column.values) {
        if let (Some(ts), Some(v)) = (ts, value) {
            by_hour[ts.hour() as usize].push(*v);
        }
    }

    Some(
        (0u32..)
            .zip(by_hour)
            .filter_map(|(hour, acc)| acc.mean().map(|m| (hour, m)))
            .collect(),
    )
}
