//! Error-rate distribution statistics and filter counters for the best edges.

use std::cmp::Ordering;
use std::ops::AddAssign;

use serde::Serialize;

use crate::store::BestEdgeStore;

/// Distribution of best-edge error rates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EdgeStatistics {
    pub count: usize,
    pub mean: f64,
    pub stddev: f64,
    pub median: f64,
    /// Median absolute deviation from the median.
    pub mad: f64,
}

fn median_in_place(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mid = values.len() / 2;
    let odd = values.len() % 2 == 1;
    let cmp = |a: &f64, b: &f64| a.partial_cmp(b).unwrap_or(Ordering::Equal);
    let (lower, upper, _) = values.select_nth_unstable_by(mid, cmp);
    let upper = *upper;
    if odd {
        return upper;
    }
    let below = lower.iter().copied().fold(f64::MIN, f64::max);
    (below + upper) / 2.0
}

impl EdgeStatistics {
    pub fn from_erates(mut values: Vec<f64>) -> Self {
        let count = values.len();
        if count == 0 {
            return Self::default();
        }

        let mean = values.iter().sum::<f64>() / count as f64;
        let stddev = if count > 1 {
            let ss: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
            (ss / (count - 1) as f64).sqrt()
        } else {
            0.0
        };

        let median = median_in_place(&mut values);
        for v in values.iter_mut() {
            *v = (*v - median).abs();
        }
        let mad = median_in_place(&mut values);

        Self {
            count,
            mean,
            stddev,
            median,
            mad,
        }
    }

    /// Statistics over the best edges of every read that is not contained.
    pub fn from_store(store: &BestEdgeStore) -> Self {
        let erates = store
            .edges()
            .filter(|(end, _)| !store.is_contained(end.read_id()))
            .map(|(_, edge)| edge.erate())
            .collect();
        Self::from_erates(erates)
    }

    /// Error-rate ceiling for best edges: `deviation` standard deviations above
    /// the mean, never looser than the configured graph error rate.
    pub fn error_limit(&self, erate_graph: f64, deviation: f64) -> f64 {
        if self.count == 0 {
            return erate_graph;
        }
        (self.mean + deviation * self.stddev).min(erate_graph)
    }
}

/// Counts of reads and edges touched by the structural filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterCounts {
    pub high_error_one_edge: usize,
    pub high_error_two_edges: usize,
    pub suspicious_reads: usize,
    pub suspicious_edges: usize,
    pub lopsided_one_edge: usize,
    pub lopsided_two_edges: usize,
    pub spur_reads: usize,
    pub singleton_reads: usize,
}

impl FilterCounts {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl AddAssign for FilterCounts {
    fn add_assign(&mut self, other: Self) {
        self.high_error_one_edge += other.high_error_one_edge;
        self.high_error_two_edges += other.high_error_two_edges;
        self.suspicious_reads += other.suspicious_reads;
        self.suspicious_edges += other.suspicious_edges;
        self.lopsided_one_edge += other.lopsided_one_edge;
        self.lopsided_two_edges += other.lopsided_two_edges;
        self.spur_reads += other.spur_reads;
        self.singleton_reads += other.singleton_reads;
    }
}

/// Shape of the graph: how many reads have zero, one or two best edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GraphCensus {
    pub reads: usize,
    pub contained: usize,
    pub both_edges: usize,
    pub five_prime_only: usize,
    pub three_prime_only: usize,
    pub no_edges: usize,
}

impl GraphCensus {
    pub fn from_store(store: &BestEdgeStore) -> Self {
        let mut census = Self::default();
        for (_, slot) in store.iter() {
            census.reads += 1;
            if slot.contained {
                census.contained += 1;
                continue;
            }
            match (slot.best5.is_empty(), slot.best3.is_empty()) {
                (false, false) => census.both_edges += 1,
                (false, true) => census.five_prime_only += 1,
                (true, false) => census.three_prime_only += 1,
                (true, true) => census.no_edges += 1,
            }
        }
        census
    }
}

/// Histogram of best-edge error rates in bins of `bin_width`, as
/// (bin start, count) for every bin up to the last occupied one.
pub fn erate_histogram(store: &BestEdgeStore, bin_width: f64) -> Vec<(f64, usize)> {
    if !(bin_width > 0.0) {
        return Vec::new();
    }
    let mut bins: Vec<usize> = Vec::new();
    for (_, edge) in store.edges() {
        let bin = (edge.erate() / bin_width).floor() as usize;
        if bin >= bins.len() {
            bins.resize(bin + 1, 0);
        }
        bins[bin] += 1;
    }
    bins.into_iter()
        .enumerate()
        .map(|(i, count)| (i as f64 * bin_width, count))
        .collect()
}
