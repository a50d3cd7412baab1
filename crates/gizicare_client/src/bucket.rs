//! Time-series bucketing for the calorie chart.
//!
//! Raw per-day records are grouped by day, month, quarter or year, ordered
//! chronologically and reduced to one value per bucket: daily buckets sum
//! their members, every other granularity averages them.

use crate::ActivityRecord;
use chrono::{Datelike, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Daily,
    Monthly,
    Quarterly,
    Annually,
}

impl Granularity {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "day" => Some(Self::Daily),
            "monthly" | "month" => Some(Self::Monthly),
            "quarterly" | "quarter" => Some(Self::Quarterly),
            "annually" | "annual" | "yearly" | "year" => Some(Self::Annually),
            _ => None,
        }
    }
}

/// Sort key of a bucket. Ordering follows the calendar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BucketKey {
    Day(NaiveDate),
    Month { year: i32, month: u32 },
    Quarter { year: i32, quarter: u32 },
    Year(i32),
}

impl BucketKey {
    pub fn for_date(date: NaiveDate, granularity: Granularity) -> Self {
        match granularity {
            Granularity::Daily => Self::Day(date),
            Granularity::Monthly => Self::Month {
                year: date.year(),
                month: date.month(),
            },
            Granularity::Quarterly => Self::Quarter {
                year: date.year(),
                quarter: date.month0() / 3 + 1,
            },
            Granularity::Annually => Self::Year(date.year()),
        }
    }

    /// Machine key: `2025-01-05`, `2025-01`, `2025-Q1`, `2025`.
    pub fn key(&self) -> String {
        match *self {
            Self::Day(d) => d.format("%Y-%m-%d").to_string(),
            Self::Month { year, month } => format!("{year:04}-{month:02}"),
            Self::Quarter { year, quarter } => format!("{year:04}-Q{quarter}"),
            Self::Year(year) => format!("{year:04}"),
        }
    }

    /// Axis label: `05 Jan`, `Jan 2025`, `2025-Q1`, `2025`.
    pub fn label(&self) -> String {
        match *self {
            Self::Day(d) => d.format("%d %b").to_string(),
            Self::Month { year, month } => NaiveDate::from_ymd_opt(year, month, 1)
                .map(|d| d.format("%b %Y").to_string())
                .unwrap_or_else(|| self.key()),
            Self::Quarter { .. } | Self::Year(_) => self.key(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartPoint {
    pub key: String,
    pub label: String,
    pub value: f64,
}

/// Parallel label/value sequences ready for a line chart.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSeries {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Flat reference line (e.g. TEE) with one value per bucket.
    pub fn baseline(&self, value: f64) -> Vec<f64> {
        vec![value; self.values.len()]
    }
}

impl FromIterator<ChartPoint> for ChartSeries {
    fn from_iter<I: IntoIterator<Item = ChartPoint>>(iter: I) -> Self {
        let mut series = ChartSeries::default();
        for p in iter {
            series.labels.push(p.label);
            series.values.push(p.value);
        }
        series
    }
}

/// Group `(date, value)` pairs into chronologically ordered chart points.
///
/// Non-finite values count as 0.
pub fn bucket_points<I>(points: I, granularity: Granularity) -> Vec<ChartPoint>
where
    I: IntoIterator<Item = (NaiveDate, f64)>,
{
    let mut buckets: BTreeMap<BucketKey, Vec<f64>> = BTreeMap::new();
    for (date, value) in points {
        let value = if value.is_finite() { value } else { 0.0 };
        buckets
            .entry(BucketKey::for_date(date, granularity))
            .or_default()
            .push(value);
    }

    buckets
        .into_iter()
        .map(|(key, members)| {
            let sum: f64 = members.iter().sum();
            let value = match granularity {
                Granularity::Daily => sum,
                _ => sum / members.len() as f64,
            };
            ChartPoint {
                key: key.key(),
                label: key.label(),
                value,
            }
        })
        .collect()
}

pub fn bucket_series<I>(points: I, granularity: Granularity) -> ChartSeries
where
    I: IntoIterator<Item = (NaiveDate, f64)>,
{
    bucket_points(points, granularity).into_iter().collect()
}

/// Calorie intake per bucket from daily activity records.
pub fn calorie_series(records: &[ActivityRecord], granularity: Granularity) -> ChartSeries {
    bucket_series(
        records.iter().map(|r| (r.date, r.total_calories)),
        granularity,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample() -> Vec<(NaiveDate, f64)> {
        vec![
            (d("2025-03-02"), 1800.0),
            (d("2024-12-31"), 2100.0),
            (d("2025-01-15"), 1900.0),
            (d("2025-01-16"), 2300.0),
            (d("2025-03-01"), 1500.0),
            (d("2025-11-20"), 2000.0),
        ]
    }

    #[test]
    fn empty_input_yields_empty_series() {
        for g in [
            Granularity::Daily,
            Granularity::Monthly,
            Granularity::Quarterly,
            Granularity::Annually,
        ] {
            let s = bucket_series(Vec::<(NaiveDate, f64)>::new(), g);
            assert!(s.is_empty());
            assert!(s.labels.is_empty());
        }
    }

    #[test]
    fn daily_buckets_preserve_total() {
        let mut pts = sample();
        pts.push((d("2025-01-15"), 100.0));
        let raw_total: f64 = pts.iter().map(|(_, v)| v).sum();
        let s = bucket_series(pts, Granularity::Daily);
        assert_eq!(s.values.iter().sum::<f64>(), raw_total);
        assert_eq!(s.len(), 6);
        assert_eq!(s.labels[0], "31 Dec");
        assert_eq!(s.labels[1], "15 Jan");
        assert_eq!(s.values[1], 2000.0);
    }

    #[test]
    fn monthly_buckets_average_members() {
        let pts = bucket_points(sample(), Granularity::Monthly);
        let keys: Vec<_> = pts.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, ["2024-12", "2025-01", "2025-03", "2025-11"]);
        assert_eq!(pts[1].value, 2100.0);
        assert_eq!(pts[2].value, 1650.0);
        assert_eq!(pts[1].label, "Jan 2025");
    }

    #[test]
    fn quarterly_orders_numerically() {
        let mut pts = sample();
        pts.push((d("2025-10-01"), 0.0));
        let out = bucket_points(pts, Granularity::Quarterly);
        let keys: Vec<_> = out.iter().map(|p| p.key.clone()).collect();
        assert_eq!(keys, ["2024-Q4", "2025-Q1", "2025-Q4"]);
        // Q1 2025: 1900, 2300, 1500, 1800
        assert_eq!(out[1].value, 1875.0);
        assert_eq!(out[2].value, 1000.0);
    }

    #[test]
    fn annual_keys_sort_chronologically() {
        let early = NaiveDate::from_ymd_opt(999, 6, 1).unwrap();
        let pts = vec![(d("2030-01-01"), 1.0), (early, 3.0), (d("2024-06-01"), 5.0)];
        let out = bucket_points(pts, Granularity::Annually);
        let keys: Vec<_> = out.iter().map(|p| p.key.clone()).collect();
        assert_eq!(keys, ["0999", "2024", "2030"]);
    }

    #[test]
    fn non_finite_values_count_as_zero() {
        let pts = vec![(d("2025-01-01"), f64::NAN), (d("2025-01-02"), 10.0)];
        let s = bucket_series(pts, Granularity::Monthly);
        assert_eq!(s.values, vec![5.0]);
    }

    #[test]
    fn baseline_matches_length() {
        let s = bucket_series(sample(), Granularity::Daily);
        assert_eq!(s.baseline(2325.0).len(), s.len());
    }
}
