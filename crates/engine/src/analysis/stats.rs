//! Stats: descriptive statistics over record gaps.

use crate::segment::Record;

use super::gaps::{extract_all_gaps, GapRecord};

/// Summary of a set of durations in milliseconds. All zero when empty.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
    /// Population standard deviation
    pub std_dev: f64,
    /// Fisher-Pearson skewness
    pub skewness: f64,
    /// Excess kurtosis (0 for a normal distribution)
    pub kurtosis: f64,
}

impl DescriptiveStats {
    pub fn from_durations(durations: &[f64]) -> Self {
        let count = durations.len();
        if count == 0 {
            return Self::default();
        }

        let mut sorted = durations.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = count as f64;
        let mean = durations.iter().sum::<f64>() / n;
        let variance = durations.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();

        let (skewness, kurtosis) = if std_dev > 0.0 {
            let moment = |k: i32| durations.iter().map(|v| ((v - mean) / std_dev).powi(k)).sum::<f64>() / n;
            (moment(3), moment(4) - 3.0)
        } else {
            (0.0, 0.0)
        };

        Self {
            count,
            mean,
            median: percentile(&sorted, 50.0),
            min: sorted[0],
            max: sorted[count - 1],
            p90: percentile(&sorted, 90.0),
            p95: percentile(&sorted, 95.0),
            p99: percentile(&sorted, 99.0),
            std_dev,
            skewness,
            kurtosis,
        }
    }
}

/// Linear-interpolation percentile over an ascending slice, `p` in `[0, 100]`.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted {
        [] => 0.0,
        [only] => *only,
        _ => {
            let idx = (p / 100.0) * (sorted.len() - 1) as f64;
            let lo = idx.floor() as usize;
            let hi = idx.ceil() as usize;
            if lo == hi {
                sorted[lo]
            } else {
                let frac = idx - lo as f64;
                sorted[lo] * (1.0 - frac) + sorted[hi] * frac
            }
        }
    }
}

/// Gaps outside the Tukey fences `[Q1 - k*IQR, Q3 + k*IQR]`, longest first.
/// Fewer than four gaps, or a zero IQR, yields no outliers.
pub fn detect_outliers(gaps: &[GapRecord], multiplier: f64) -> Vec<GapRecord> {
    if gaps.len() < 4 {
        return Vec::new();
    }

    let mut sorted: Vec<f64> = gaps.iter().map(|g| g.duration_ms as f64).collect();
    sorted.sort_by(f64::total_cmp);
    let q1 = percentile(&sorted, 25.0);
    let q3 = percentile(&sorted, 75.0);
    let iqr = q3 - q1;
    if iqr == 0.0 {
        return Vec::new();
    }

    let upper = q3 + multiplier * iqr;
    let lower = q1 - multiplier * iqr;

    let mut outliers: Vec<GapRecord> = gaps
        .iter()
        .filter(|g| {
            let d = g.duration_ms as f64;
            d > upper || d < lower
        })
        .cloned()
        .collect();
    outliers.sort_by(|a, b| b.duration_ms.cmp(&a.duration_ms));
    outliers
}

/// Gap statistics for a segmented log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkStats {
    pub stats: DescriptiveStats,
    /// Shortest gap, first in record order on ties
    pub min_gap: Option<GapRecord>,
    /// Longest gap, first in record order on ties
    pub max_gap: Option<GapRecord>,
    pub outliers: Vec<GapRecord>,
    /// Every positive gap in record order, in milliseconds
    pub durations: Vec<i64>,
}

pub fn chunk_stats(records: &[Record], multiplier: f64) -> ChunkStats {
    let gaps = extract_all_gaps(records);
    let durations: Vec<i64> = gaps.iter().map(|g| g.duration_ms).collect();
    let as_f64: Vec<f64> = durations.iter().map(|&d| d as f64).collect();

    let mut min_gap: Option<&GapRecord> = None;
    let mut max_gap: Option<&GapRecord> = None;
    for gap in &gaps {
        if min_gap.map_or(true, |m| gap.duration_ms < m.duration_ms) {
            min_gap = Some(gap);
        }
        if max_gap.map_or(true, |m| gap.duration_ms > m.duration_ms) {
            max_gap = Some(gap);
        }
    }

    let result = ChunkStats {
        stats: DescriptiveStats::from_durations(&as_f64),
        min_gap: min_gap.cloned(),
        max_gap: max_gap.cloned(),
        outliers: detect_outliers(&gaps, multiplier),
        durations,
    };
    tracing::debug!(
        gaps = result.stats.count,
        outliers = result.outliers.len(),
        "analysis: gap statistics"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn at(offset_ms: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::milliseconds(offset_ms)
    }

    fn gap(entry: usize, duration_ms: i64) -> GapRecord {
        GapRecord {
            entry,
            timestamp: at(0),
            next_timestamp: at(duration_ms),
            duration_ms,
            text: String::new(),
        }
    }

    #[test]
    fn test_empty_stats_are_zero() {
        assert_eq!(DescriptiveStats::from_durations(&[]), DescriptiveStats::default());
    }

    #[test]
    fn test_single_value() {
        let stats = DescriptiveStats::from_durations(&[42.0]);
        assert_eq!(stats.count, 1);
        assert_eq!(stats.median, 42.0);
        assert_eq!(stats.p99, 42.0);
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.skewness, 0.0);
        assert_eq!(stats.kurtosis, 0.0);
    }

    #[test]
    fn test_descriptive_stats() {
        let stats = DescriptiveStats::from_durations(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(stats.count, 4);
        assert!(close(stats.mean, 2.5));
        assert!(close(stats.median, 2.5));
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 4.0);
        // idx = 0.9 * 3 = 2.7 -> 3 + 0.7
        assert!(close(stats.p90, 3.7));
        assert!(close(stats.std_dev, 1.25f64.sqrt()));
        // Symmetric input
        assert!(close(stats.skewness, 0.0));
        // Uniform 1..4: m4 / var^2 = 2.5625 / 1.5625
        assert!(close(stats.kurtosis, 2.5625 / 1.5625 - 3.0));
    }

    #[test]
    fn test_right_skewed_durations() {
        let stats = DescriptiveStats::from_durations(&[10.0, 10.0, 10.0, 10.0, 1000.0]);
        assert!(stats.skewness > 1.0);
        assert!(stats.kurtosis > 0.0);
    }

    #[test]
    fn test_detect_outliers() {
        let gaps: Vec<GapRecord> = [10, 12, 11, 13, 9, 500, 1]
            .iter()
            .enumerate()
            .map(|(i, &d)| gap(i, d))
            .collect();

        // Sorted: 1 9 10 11 12 13 500; Q1 = 9.5, Q3 = 12.5, IQR = 3
        let outliers = detect_outliers(&gaps, 1.5);
        let durations: Vec<i64> = outliers.iter().map(|g| g.duration_ms).collect();
        assert_eq!(durations, vec![500, 1]);

        // Fences at 0.5 and 21.5
        let far = detect_outliers(&gaps, 3.0);
        assert_eq!(far.iter().map(|g| g.entry).collect::<Vec<_>>(), vec![5]);
        assert!(detect_outliers(&gaps, 200.0).is_empty());
    }

    #[test]
    fn test_detect_outliers_needs_spread_and_four_gaps() {
        let few: Vec<GapRecord> = [1, 2, 1000].iter().map(|&d| gap(0, d)).collect();
        assert!(detect_outliers(&few, 1.5).is_empty());

        let flat: Vec<GapRecord> = [5, 5, 5, 5, 5, 99].iter().map(|&d| gap(0, d)).collect();
        assert!(detect_outliers(&flat, 1.5).is_empty());
    }

    #[test]
    fn test_chunk_stats_over_records() {
        let records: Vec<Record> = [0, 100, 200, 300, 5_300, 5_400]
            .iter()
            .map(|&ms| Record {
                timestamp: Some(at(ms)),
                message: format!("t{}", ms),
                text: format!("t{}", ms),
            })
            .collect();

        let result = chunk_stats(&records, 1.5);
        assert_eq!(result.durations, vec![100, 100, 100, 5_000, 100]);
        assert_eq!(result.stats.count, 5);
        assert_eq!(result.min_gap.as_ref().map(|g| g.entry), Some(0));
        assert_eq!(result.max_gap.as_ref().map(|g| g.text.as_str()), Some("t300"));
        // IQR is zero: every quartile sits at 100
        assert!(result.outliers.is_empty());

        let empty = chunk_stats(&[], 1.5);
        assert_eq!(empty.stats.count, 0);
        assert!(empty.min_gap.is_none());
    }
}
