//! Helpers for date-indexed rows.

use std::collections::BTreeMap;

use chrono::NaiveDate;

/// A row that belongs to a single day.
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

/// Group rows by `key`, each group sorted by date.
pub fn group_by<T, K, F>(rows: impl IntoIterator<Item = T>, key: F) -> BTreeMap<K, Vec<T>>
where
    T: Dated,
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut groups: BTreeMap<K, Vec<T>> = BTreeMap::new();
    for row in rows {
        groups.entry(key(&row)).or_default().push(row);
    }
    for group in groups.values_mut() {
        group.sort_by_key(Dated::date);
    }
    groups
}

/// Keep rows dated on or after `start`.
pub fn since<T: Dated>(rows: impl IntoIterator<Item = T>, start: NaiveDate) -> Vec<T> {
    rows.into_iter().filter(|row| row.date() >= start).collect()
}

/// Days elapsed since the first date whose value exceeds `threshold`.
///
/// Dates before that day yield negative counts; every entry is `None` when
/// the threshold is never crossed.
pub fn days_since(dates: &[NaiveDate], values: &[Option<f64>], threshold: f64) -> Vec<Option<i64>> {
    let origin = dates
        .iter()
        .zip(values)
        .filter(|(_, v)| v.is_some_and(|v| v > threshold))
        .map(|(d, _)| *d)
        .min();

    dates
        .iter()
        .map(|d| origin.map(|o| (*d - o).num_days()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        date: NaiveDate,
        region: &'static str,
    }

    impl Dated for Row {
        fn date(&self) -> NaiveDate {
            self.date
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, d).unwrap()
    }

    #[test]
    fn test_group_by_sorts_each_group() {
        let rows = vec![
            Row { date: day(3), region: "CA" },
            Row { date: day(1), region: "TX" },
            Row { date: day(1), region: "CA" },
            Row { date: day(2), region: "CA" },
        ];

        let groups = group_by(rows, |r| r.region);
        assert_eq!(groups.len(), 2);
        let ca: Vec<_> = groups["CA"].iter().map(|r| r.date).collect();
        assert_eq!(ca, vec![day(1), day(2), day(3)]);
    }

    #[test]
    fn test_since_is_inclusive() {
        let rows = vec![
            Row { date: day(1), region: "CA" },
            Row { date: day(2), region: "CA" },
            Row { date: day(3), region: "CA" },
        ];
        let kept = since(rows, day(2));
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].date, day(2));
    }

    #[test]
    fn test_days_since_threshold() {
        let dates = vec![day(1), day(2), day(3), day(4)];
        let cases = vec![Some(0.0), Some(3.0), Some(12.0), Some(20.0)];

        assert_eq!(
            days_since(&dates, &cases, 0.0),
            vec![Some(-1), Some(0), Some(1), Some(2)]
        );
        assert_eq!(
            days_since(&dates, &cases, 9.0),
            vec![Some(-2), Some(-1), Some(0), Some(1)]
        );
        assert_eq!(days_since(&dates, &cases, 100.0), vec![None; 4]);
    }
}
