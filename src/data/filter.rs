use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::model::SolarTable;

// ---------------------------------------------------------------------------
// Date range filter
// ---------------------------------------------------------------------------

/// Rows whose timestamp lies in the closed interval `[start, end]`.
///
/// * A table without a `Timestamp` column is returned unchanged.
/// * Rows with a missing timestamp never match.
/// * `start > end` matches nothing.
pub fn filter_by_date_range(
    table: &SolarTable,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> SolarTable {
    let Some(timestamps) = &table.timestamps else {
        return table.clone();
    };

    let rows: Vec<usize> = timestamps
        .iter()
        .enumerate()
        .filter(|(_, ts)| matches!(ts, Some(t) if start <= *t && *t <= end))
        .map(|(i, _)| i)
        .collect();

    table.take(&rows)
}

/// Datetime bounds covering whole calendar days: midnight of `start` through
/// the last instant of `end`.
pub fn day_bounds(start: NaiveDate, end: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let last_instant = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN);
    (start.and_time(NaiveTime::MIN), end.and_time(last_instant))
}

/// First and last calendar day covered by the table's timestamps.
pub fn date_bounds(table: &SolarTable) -> Option<(NaiveDate, NaiveDate)> {
    table.time_span().map(|(lo, hi)| (lo.date(), hi.date()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{GHI, NumericColumn, Site};

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 8, day)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .unwrap()
    }

    fn table() -> SolarTable {
        SolarTable::for_site(
            Site::Benin,
            Some(vec![Some(at(1, 0)), Some(at(1, 12)), None, Some(at(2, 6)), Some(at(3, 0))]),
            vec![NumericColumn::new(
                GHI,
                vec![Some(0.0), Some(800.0), Some(5.0), Some(300.0), Some(0.0)],
            )],
        )
        .unwrap()
    }

    #[test]
    fn bounds_are_inclusive() {
        let filtered = filter_by_date_range(&table(), at(1, 12), at(3, 0));
        assert_eq!(filtered.len(), 3);
        assert_eq!(
            filtered.column(GHI).unwrap().values,
            vec![Some(800.0), Some(300.0), Some(0.0)]
        );
        assert!(filtered
            .timestamps
            .as_ref()
            .unwrap()
            .iter()
            .all(|t| matches!(t, Some(t) if at(1, 12) <= *t && *t <= at(3, 0))));
    }

    #[test]
    fn filtering_is_idempotent() {
        let once = filter_by_date_range(&table(), at(1, 6), at(2, 23));
        let twice = filter_by_date_range(&once, at(1, 6), at(2, 23));
        assert_eq!(once, twice);
    }

    #[test]
    fn inverted_range_is_empty() {
        let filtered = filter_by_date_range(&table(), at(3, 0), at(1, 0));
        assert!(filtered.is_empty());
        assert!(filtered.has_column(GHI));
    }

    #[test]
    fn table_without_timestamps_is_unchanged() {
        let plain = SolarTable::for_site(
            Site::Togo,
            None,
            vec![NumericColumn::new(GHI, vec![Some(1.0), Some(2.0)])],
        )
        .unwrap();
        assert_eq!(filter_by_date_range(&plain, at(1, 0), at(1, 0)), plain);
    }

    #[test]
    fn day_bounds_cover_the_whole_end_day() {
        let (start, end) = day_bounds(at(1, 0).date(), at(2, 0).date());
        let filtered = filter_by_date_range(&table(), start, end);
        assert_eq!(filtered.len(), 3);
        assert_eq!(date_bounds(&table()), Some((at(1, 0).date(), at(3, 0).date())));
    }
}
