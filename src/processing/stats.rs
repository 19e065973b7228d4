//! Numeric summary statistics.

use std::fmt;

use serde::Serialize;

/// Count, sum, min, max and average of a numeric sequence.
///
/// For an empty sequence the count is 0, the sum is 0.0 and average/min/max are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SummaryStatistics {
    pub count: u64,
    pub sum: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl SummaryStatistics {
    /// Empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one value.
    pub fn accept(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    /// Merge two partial results. Associative, with [`SummaryStatistics::new`] as identity.
    pub fn combine(self, other: Self) -> Self {
        Self {
            count: self.count + other.count,
            sum: self.sum + other.sum,
            min: merge(self.min, other.min, f64::min),
            max: merge(self.max, other.max, f64::max),
        }
    }

    /// Arithmetic mean, `None` when no values were recorded.
    pub fn average(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

fn merge(a: Option<f64>, b: Option<f64>, pick: fn(f64, f64) -> f64) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(pick(a, b)),
        (a, b) => a.or(b),
    }
}

impl Extend<f64> for SummaryStatistics {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for v in iter {
            self.accept(v);
        }
    }
}

impl FromIterator<f64> for SummaryStatistics {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut stats = Self::new();
        stats.extend(iter);
        stats
    }
}

impl fmt::Display for SummaryStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "count={}, sum={}, average={:?}, min={:?}, max={:?}",
            self.count,
            self.sum,
            self.average(),
            self.min,
            self.max
        )
    }
}

/// Summarize `numeric(item)` over `seq`.
pub fn summary_statistics<I, F>(seq: I, numeric: F) -> SummaryStatistics
where
    I: IntoIterator,
    F: FnMut(I::Item) -> f64,
{
    seq.into_iter().map(numeric).collect()
}

/// [`summary_statistics`] with a fallible extractor; the first `Err` is returned unchanged.
pub fn try_summary_statistics<I, E, F>(seq: I, mut numeric: F) -> Result<SummaryStatistics, E>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Result<f64, E>,
{
    let mut stats = SummaryStatistics::new();
    for item in seq {
        stats.accept(numeric(item)?);
    }
    Ok(stats)
}
