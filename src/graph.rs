//! Best overlap graph construction, filtering and traversal.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
#[cfg(not(feature = "parallel"))]
use log::warn;
use serde::{Deserialize, Serialize};

use crate::best_edge::BestEdge;
use crate::filters;
use crate::overlap::Overlap;
use crate::overlap_source::OverlapSource;
use crate::read_end::ReadEnd;
use crate::stats::{erate_histogram, EdgeStatistics, FilterCounts, GraphCensus};
use crate::store::{BestEdgeStore, BestOverlaps, BestScores, ScoreStore};
use crate::GraphError;

/// Tunables for building and filtering the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Overlaps above this error rate never become best edges.
    pub erate_graph: f64,
    /// Standard deviations above the mean best-edge error tolerated by the
    /// high-error filter.
    pub deviation_graph: f64,
    pub filter_suspicious: bool,
    pub filter_high_error: bool,
    pub filter_lopsided: bool,
    pub filter_spur: bool,
    /// An edge shorter than this fraction of its partner's preferred edge is lopsided.
    pub lopsided_ratio: f64,
    /// Overlap spans must share this many bases to count as one covered region.
    pub suspicious_min_overlap: u32,
    /// Only score overlaps touching these reads; switches to sparse storage.
    pub restrict: Option<BTreeSet<u32>>,
    pub use_threads: bool,
    pub max_workers: usize,
    /// Reports are written as `<prefix>.<label>.edges[.stats]` when set.
    pub prefix: Option<PathBuf>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        GraphConfig {
            erate_graph: 0.05,
            deviation_graph: 3.0,
            filter_suspicious: true,
            filter_high_error: true,
            filter_lopsided: true,
            filter_spur: true,
            lopsided_ratio: 0.75,
            suspicious_min_overlap: 40,
            restrict: None,
            use_threads: false,
            max_workers: 1,
            prefix: None,
        }
    }
}

impl GraphConfig {
    pub fn validate(&self) -> Result<(), GraphError> {
        if !(0.0..=1.0).contains(&self.erate_graph) {
            return Err(GraphError::InvalidConfig(format!(
                "erate_graph must lie in 0..=1, got {}",
                self.erate_graph
            )));
        }
        if !self.deviation_graph.is_finite() || self.deviation_graph < 0.0 {
            return Err(GraphError::InvalidConfig(format!(
                "deviation_graph must be a non-negative number, got {}",
                self.deviation_graph
            )));
        }
        if !self.lopsided_ratio.is_finite() || self.lopsided_ratio < 0.0 {
            return Err(GraphError::InvalidConfig(format!(
                "lopsided_ratio must be a non-negative number, got {}",
                self.lopsided_ratio
            )));
        }
        if self.use_threads && self.max_workers == 0 {
            return Err(GraphError::InvalidConfig(
                "max_workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Ordering used when two candidates score the same: lower key wins.
fn tie_key(edge: &BestEdge) -> (u32, bool, i32, i32) {
    (edge.read_id(), edge.read3p(), edge.a_hang(), edge.b_hang())
}

/// Whether a candidate displaces the edge currently held for a read end.
fn wins(score: u64, edge: &BestEdge, held_score: u64, held: &BestEdge) -> bool {
    if held.is_empty() {
        return true;
    }
    match score.cmp(&held_score) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => tie_key(edge) < tie_key(held),
    }
}

fn bad_quality(overlap: &Overlap, num_reads: u32, error_limit: f64) -> bool {
    let in_range = |id: u32| id >= 1 && id <= num_reads;
    !in_range(overlap.a_id) || !in_range(overlap.b_id) || overlap.erate() > error_limit
}

/// Runs per-read work either inline or on a dedicated rayon pool.
struct Workers {
    #[cfg(feature = "parallel")]
    pool: Option<rayon::ThreadPool>,
}

impl Workers {
    fn new(config: &GraphConfig) -> Result<Self, GraphError> {
        #[cfg(not(feature = "parallel"))]
        if config.use_threads {
            warn!(
                "Threaded scoring requested, but the 'parallel' feature is not enabled; falling back to sequential mode"
            );
        }

        #[cfg(feature = "parallel")]
        let pool = if config.use_threads {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.max_workers)
                .build()
                .map_err(|err| GraphError::InvalidConfig(format!("cannot build thread pool: {err}")))?;
            Some(pool)
        } else {
            None
        };

        Ok(Workers {
            #[cfg(feature = "parallel")]
            pool,
        })
    }

    fn map<T, F>(&self, reads: &[u32], f: F) -> Result<Vec<T>, GraphError>
    where
        T: Send,
        F: Fn(u32) -> Result<T, GraphError> + Send + Sync,
    {
        #[cfg(feature = "parallel")]
        if let Some(pool) = &self.pool {
            use rayon::prelude::*;
            return pool.install(|| reads.par_iter().map(|&read_id| f(read_id)).collect());
        }
        reads.iter().map(|&read_id| f(read_id)).collect()
    }
}

/// Read-only view of the inputs shared by both scoring passes.
struct Scorer<'a, S: ?Sized> {
    source: &'a S,
    num_reads: u32,
    erate_limit: f64,
    restrict: Option<&'a BTreeSet<u32>>,
}

impl<'a, S: OverlapSource + ?Sized> Scorer<'a, S> {
    fn qualifies(&self, overlap: &Overlap) -> Result<bool, GraphError> {
        for read_id in [overlap.a_id, overlap.b_id] {
            if read_id == 0 || read_id > self.num_reads {
                return Err(GraphError::ReadOutOfRange {
                    read_id,
                    num_reads: self.num_reads,
                });
            }
        }
        if overlap.a_id == overlap.b_id || overlap.erate() > self.erate_limit {
            return Ok(false);
        }
        if let Some(restrict) = self.restrict {
            if !restrict.contains(&overlap.a_id) && !restrict.contains(&overlap.b_id) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn score(&self, overlap: &Overlap) -> u64 {
        overlap.score(
            self.source.read_length(overlap.a_id),
            self.source.read_length(overlap.b_id),
        )
    }

    /// Best containment placing `read_id` inside another read.
    fn best_container(&self, read_id: u32) -> Result<Option<(BestEdge, u64)>, GraphError> {
        let mut best: Option<(BestEdge, u64)> = None;
        for overlap in self.source.overlaps(read_id) {
            if !self.qualifies(overlap)? || !overlap.is_containment() || !overlap.a_is_contained() {
                continue;
            }
            let edge = BestEdge::from_overlap(overlap)?;
            let score = self.score(overlap);
            let (held, held_score) = best.unwrap_or_default();
            if wins(score, &edge, held_score, &held) {
                best = Some((edge, score));
            }
        }
        Ok(best)
    }

    /// Best dovetails on both ends of `read_id`, skipping contained partners.
    /// Returns the updated slots only when something changed.
    fn best_dovetails(
        &self,
        read_id: u32,
        edges: &BestEdgeStore,
        scores: &ScoreStore,
    ) -> Result<Option<(BestOverlaps, BestScores)>, GraphError> {
        let mut slot = edges.get(read_id);
        let mut best = scores.get(read_id);
        let mut changed = false;

        for overlap in self.source.overlaps(read_id) {
            if !self.qualifies(overlap)? || overlap.is_containment() {
                continue;
            }
            if edges.is_contained(overlap.b_id) {
                continue;
            }
            let three_prime = overlap.a_end_is_3prime();
            let edge = BestEdge::from_overlap(overlap)?;
            let score = self.score(overlap);
            if wins(score, &edge, *best.score_mut(three_prime), slot.edge(three_prime)) {
                *slot.edge_mut(three_prime) = edge;
                *best.score_mut(three_prime) = score;
                changed = true;
            }
        }
        Ok(changed.then_some((slot, best)))
    }
}

/// Serializable digest of a finished graph.
#[derive(Debug, Clone, Serialize)]
pub struct GraphSummary {
    pub config: GraphConfig,
    pub statistics: EdgeStatistics,
    pub error_limit: f64,
    pub census: GraphCensus,
    pub filter_counts: FilterCounts,
    pub suspicious_reads: usize,
    pub spur_reads: usize,
    pub singleton_reads: usize,
}

/// The best overlap graph: at most one best edge per read end, plus the
/// containment and filter flags for every read.
#[derive(Debug, Clone)]
pub struct BestOverlapGraph {
    config: GraphConfig,
    edges: BestEdgeStore,
    statistics: EdgeStatistics,
    error_limit: f64,
    counts: FilterCounts,
    suspicious: BTreeSet<u32>,
    spur: BTreeSet<u32>,
    singleton: BTreeSet<u32>,
}

impl BestOverlapGraph {
    /// Score every overlap in `source`, keep the best per read end, then run
    /// the enabled filters and write reports if a prefix is configured.
    pub fn build<S>(source: &S, config: GraphConfig) -> Result<Self, GraphError>
    where
        S: OverlapSource + ?Sized,
    {
        BestEdge::self_test()?;
        config.validate()?;

        let num_reads = source.num_reads();
        let workers = Workers::new(&config)?;
        let scorer = Scorer {
            source,
            num_reads,
            erate_limit: config.erate_graph,
            restrict: config.restrict.as_ref(),
        };

        let (mut edges, mut scores) = match &config.restrict {
            Some(restrict) => {
                info!("Restricted to {} reads; using sparse storage", restrict.len());
                let mut edges = BestEdgeStore::sparse(num_reads);
                for &read_id in restrict.iter().filter(|&&id| id >= 1 && id <= num_reads) {
                    edges.get_mut(read_id);
                }
                (edges, ScoreStore::sparse())
            }
            None => (BestEdgeStore::dense(num_reads), ScoreStore::dense(num_reads)),
        };
        let reads: Vec<u32> = (1..=num_reads).collect();

        info!("Scoring containments for {} reads...", num_reads);
        let containers = workers.map(&reads, |read_id| scorer.best_container(read_id))?;
        for (&read_id, found) in reads.iter().zip(containers) {
            if let Some((edge, score)) = found {
                let slot = edges.get_mut(read_id);
                slot.container = edge;
                slot.contained = true;
                let best = scores.get_mut(read_id);
                best.container = score;
                best.contained = true;
            }
        }
        let contained = edges.iter().filter(|(_, slot)| slot.contained).count();
        info!("{} reads are contained", contained);

        info!("Scoring dovetail overlaps...");
        let dovetails = {
            let (edges, scores) = (&edges, &scores);
            workers.map(&reads, |read_id| scorer.best_dovetails(read_id, edges, scores))?
        };
        for (&read_id, found) in reads.iter().zip(dovetails) {
            if let Some((slot, best)) = found {
                *edges.get_mut(read_id) = slot;
                *scores.get_mut(read_id) = best;
            }
        }
        drop(scores);

        let statistics = EdgeStatistics::from_store(&edges);
        let error_limit = if config.filter_high_error {
            statistics.error_limit(config.erate_graph, config.deviation_graph)
        } else {
            config.erate_graph
        };
        info!(
            "Best edge error rates: mean {:.4} stddev {:.4} median {:.4} mad {:.4} over {} edges",
            statistics.mean, statistics.stddev, statistics.median, statistics.mad, statistics.count
        );
        info!("Error limit for best edges: {:.4}", error_limit);

        let mut graph = BestOverlapGraph {
            config,
            edges,
            statistics,
            error_limit,
            counts: FilterCounts::default(),
            suspicious: BTreeSet::new(),
            spur: BTreeSet::new(),
            singleton: BTreeSet::new(),
        };

        if let Some(prefix) = graph.config.prefix.clone() {
            graph.write_reports(&prefix, "initial")?;
        }
        graph.apply_filters(source);
        if let Some(prefix) = graph.config.prefix.clone() {
            graph.write_reports(&prefix, "final")?;
        }

        Ok(graph)
    }

    /// Run the enabled filters in order: high error, suspicious, lopsided, spur.
    /// Returns what this run changed; a second run changes nothing.
    pub fn apply_filters<S>(&mut self, source: &S) -> FilterCounts
    where
        S: OverlapSource + ?Sized,
    {
        let mut counts = FilterCounts::default();

        if self.config.filter_high_error {
            let cleared = filters::plan_high_error(&self.edges, self.error_limit).apply(&mut self.edges);
            counts.high_error_one_edge = cleared.reads_one_edge;
            counts.high_error_two_edges = cleared.reads_two_edges;
            info!(
                "High error filter: {} reads lost one edge, {} lost both",
                cleared.reads_one_edge, cleared.reads_two_edges
            );
        }

        if self.config.filter_suspicious {
            let (num_reads, limit) = (self.edges.num_reads(), self.error_limit);
            let plan = filters::plan_suspicious(
                &self.edges,
                source,
                self.config.suspicious_min_overlap,
                &self.suspicious,
                |overlap| bad_quality(overlap, num_reads, limit),
            );
            let cleared = plan.apply(&mut self.edges);
            counts.suspicious_reads = plan.flagged.len();
            counts.suspicious_edges = cleared.edges;
            self.suspicious.extend(plan.flagged);
            info!(
                "Suspicious filter: {} reads flagged, {} edges removed",
                counts.suspicious_reads, counts.suspicious_edges
            );
        }

        if self.config.filter_lopsided {
            let cleared = filters::plan_lopsided(&self.edges, source, self.config.lopsided_ratio)
                .apply(&mut self.edges);
            counts.lopsided_one_edge = cleared.reads_one_edge;
            counts.lopsided_two_edges = cleared.reads_two_edges;
            info!(
                "Lopsided filter: {} reads lost one edge, {} lost both",
                cleared.reads_one_edge, cleared.reads_two_edges
            );
        }

        if self.config.filter_spur {
            let exclude: BTreeSet<u32> = self
                .suspicious
                .iter()
                .chain(&self.spur)
                .chain(&self.singleton)
                .copied()
                .collect();
            let (plan, singletons) = filters::plan_spurs(&self.edges, &exclude);
            plan.apply(&mut self.edges);
            counts.spur_reads = plan.flagged.len();
            counts.singleton_reads = singletons.len();
            self.spur.extend(plan.flagged);
            self.singleton.extend(singletons);
            info!(
                "Spur filter: {} spurs, {} singletons",
                counts.spur_reads, counts.singleton_reads
            );
        }

        debug!("filter counts: {:?}", counts);
        self.counts += counts;
        counts
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn num_reads(&self) -> u32 {
        self.edges.num_reads()
    }

    pub fn edges(&self) -> &BestEdgeStore {
        &self.edges
    }

    /// Best edge leaving one end of a read; empty when there is none.
    pub fn best_edge(&self, read_id: u32, three_prime: bool) -> BestEdge {
        self.edges.edge(ReadEnd::new(read_id, three_prime))
    }

    /// Containment overlap that placed `read_id` inside another read.
    pub fn best_container(&self, read_id: u32) -> BestEdge {
        self.edges.get(read_id).container
    }

    /// Step across the best edge leaving `end` and out the far end of the
    /// partner. The sentinel maps to itself, as does an end without an edge.
    pub fn follow_overlap(&self, end: ReadEnd) -> ReadEnd {
        if end.is_none() {
            return ReadEnd::NONE;
        }
        let edge = self.best_edge(end.read_id(), end.read3p());
        if edge.is_empty() {
            return ReadEnd::NONE;
        }
        ReadEnd::new(edge.read_id(), !edge.read3p())
    }

    /// Repeated [`follow_overlap`](Self::follow_overlap) from `start`, ending at
    /// the sentinel or before any read is visited twice.
    pub fn walk(&self, start: ReadEnd) -> PathWalk<'_> {
        PathWalk {
            graph: self,
            next: start,
            seen: HashSet::new(),
        }
    }

    pub fn is_contained(&self, read_id: u32) -> bool {
        self.edges.is_contained(read_id)
    }

    /// Panics on the sentinel or an id outside the population.
    pub fn set_contained(&mut self, read_id: u32) {
        self.edges.set_contained(read_id);
    }

    pub fn is_suspicious(&self, read_id: u32) -> bool {
        self.suspicious.contains(&read_id)
    }

    pub fn is_spur(&self, read_id: u32) -> bool {
        self.spur.contains(&read_id)
    }

    pub fn is_singleton(&self, read_id: u32) -> bool {
        self.singleton.contains(&read_id)
    }

    pub fn suspicious_reads(&self) -> &BTreeSet<u32> {
        &self.suspicious
    }

    pub fn spur_reads(&self) -> &BTreeSet<u32> {
        &self.spur
    }

    pub fn singleton_reads(&self) -> &BTreeSet<u32> {
        &self.singleton
    }

    /// Whether an overlap would be rejected by the final error limit.
    pub fn is_overlap_bad_quality(&self, overlap: &Overlap) -> bool {
        bad_quality(overlap, self.num_reads(), self.error_limit)
    }

    pub fn statistics(&self) -> &EdgeStatistics {
        &self.statistics
    }

    pub fn error_limit(&self) -> f64 {
        self.error_limit
    }

    /// Counts accumulated over every filter run so far.
    pub fn filter_counts(&self) -> FilterCounts {
        self.counts
    }

    pub fn summary(&self) -> GraphSummary {
        GraphSummary {
            config: self.config.clone(),
            statistics: self.statistics,
            error_limit: self.error_limit,
            census: GraphCensus::from_store(&self.edges),
            filter_counts: self.counts,
            suspicious_reads: self.suspicious.len(),
            spur_reads: self.spur.len(),
            singleton_reads: self.singleton.len(),
        }
    }

    pub fn report_edge_statistics<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        let stats = &self.statistics;
        let census = GraphCensus::from_store(&self.edges);
        let counts = &self.counts;

        writeln!(out, "# best edge error rates (non-contained reads)")?;
        writeln!(out, "edges\t{}", stats.count)?;
        writeln!(out, "mean\t{:.6}", stats.mean)?;
        writeln!(out, "stddev\t{:.6}", stats.stddev)?;
        writeln!(out, "median\t{:.6}", stats.median)?;
        writeln!(out, "mad\t{:.6}", stats.mad)?;
        writeln!(out, "error_limit\t{:.6}", self.error_limit)?;
        writeln!(out)?;
        writeln!(out, "# reads")?;
        writeln!(out, "reads\t{}", census.reads)?;
        writeln!(out, "contained\t{}", census.contained)?;
        writeln!(out, "both_edges\t{}", census.both_edges)?;
        writeln!(out, "five_prime_only\t{}", census.five_prime_only)?;
        writeln!(out, "three_prime_only\t{}", census.three_prime_only)?;
        writeln!(out, "no_edges\t{}", census.no_edges)?;
        writeln!(out)?;
        writeln!(out, "# filters")?;
        writeln!(out, "high_error_one_edge\t{}", counts.high_error_one_edge)?;
        writeln!(out, "high_error_two_edges\t{}", counts.high_error_two_edges)?;
        writeln!(out, "suspicious_reads\t{}", counts.suspicious_reads)?;
        writeln!(out, "suspicious_edges\t{}", counts.suspicious_edges)?;
        writeln!(out, "lopsided_one_edge\t{}", counts.lopsided_one_edge)?;
        writeln!(out, "lopsided_two_edges\t{}", counts.lopsided_two_edges)?;
        writeln!(out, "spur_reads\t{}", counts.spur_reads)?;
        writeln!(out, "singleton_reads\t{}", counts.singleton_reads)?;
        writeln!(out)?;
        writeln!(out, "# error rate histogram (bin start, edges)")?;
        for (bin, count) in erate_histogram(&self.edges, 0.0025) {
            writeln!(out, "{:.4}\t{}", bin, count)?;
        }
        Ok(())
    }

    fn read_status(&self, read_id: u32, slot: &BestOverlaps) -> &'static str {
        if slot.contained {
            "contained"
        } else if self.is_suspicious(read_id) {
            "suspicious"
        } else if self.is_spur(read_id) {
            "spur"
        } else if self.is_singleton(read_id) {
            "singleton"
        } else {
            "-"
        }
    }

    pub fn report_best_edges<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        fn edge_columns(edge: &BestEdge) -> String {
            if edge.is_empty() {
                "-\t-\t-\t-".to_string()
            } else {
                format!(
                    "{}\t{}\t{}\t{:.4}",
                    edge.partner(),
                    edge.a_hang(),
                    edge.b_hang(),
                    edge.erate()
                )
            }
        }

        writeln!(
            out,
            "#read\tstatus\tbest5\tahang\tbhang\terate\tbest3\tahang\tbhang\terate\tcontainer\tahang\tbhang\terate"
        )?;
        for (read_id, slot) in self.edges.iter() {
            writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}",
                read_id,
                self.read_status(read_id, slot),
                edge_columns(&slot.best5),
                edge_columns(&slot.best3),
                edge_columns(&slot.container)
            )?;
        }
        Ok(())
    }

    /// Write `<prefix>.<label>.edges.stats` and `<prefix>.<label>.edges`,
    /// returning both paths.
    pub fn write_reports(&self, prefix: &Path, label: &str) -> Result<(PathBuf, PathBuf), GraphError> {
        let stats_path = report_path(prefix, label, "edges.stats");
        let edges_path = report_path(prefix, label, "edges");
        if let Some(parent) = stats_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut out = BufWriter::new(File::create(&stats_path)?);
        self.report_edge_statistics(&mut out)?;
        out.flush()?;

        let mut out = BufWriter::new(File::create(&edges_path)?);
        self.report_best_edges(&mut out)?;
        out.flush()?;

        info!(
            "Wrote {} and {}",
            stats_path.display(),
            edges_path.display()
        );
        Ok((stats_path, edges_path))
    }
}

fn report_path(prefix: &Path, label: &str, suffix: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_owned();
    name.push(format!(".{label}.{suffix}"));
    PathBuf::from(name)
}

/// Iterator over the read ends reached by following best edges.
#[derive(Debug)]
pub struct PathWalk<'g> {
    graph: &'g BestOverlapGraph,
    next: ReadEnd,
    seen: HashSet<u32>,
}

impl Iterator for PathWalk<'_> {
    type Item = ReadEnd;

    fn next(&mut self) -> Option<ReadEnd> {
        if self.next.is_none() || !self.seen.insert(self.next.read_id()) {
            return None;
        }
        let current = self.next;
        self.next = self.graph.follow_overlap(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlap_source::InMemoryOverlapSource;

    fn unfiltered() -> GraphConfig {
        GraphConfig {
            filter_suspicious: false,
            filter_high_error: false,
            filter_lopsided: false,
            filter_spur: false,
            ..GraphConfig::default()
        }
    }

    fn source(lengths: &[u32], overlaps: Vec<Overlap>) -> InMemoryOverlapSource {
        InMemoryOverlapSource::with_overlaps(lengths, overlaps, true).expect("source")
    }

    #[test]
    fn rejects_invalid_configuration() {
        let bad = [
            GraphConfig {
                erate_graph: 1.5,
                ..GraphConfig::default()
            },
            GraphConfig {
                deviation_graph: f64::NAN,
                ..GraphConfig::default()
            },
            GraphConfig {
                lopsided_ratio: -1.0,
                ..GraphConfig::default()
            },
            GraphConfig {
                use_threads: true,
                max_workers: 0,
                ..GraphConfig::default()
            },
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(GraphError::InvalidConfig(_))));
        }
        assert!(GraphConfig::default().validate().is_ok());
    }

    #[test]
    fn equal_scores_prefer_the_lower_partner_regardless_of_order() {
        let forward = vec![
            Overlap::new(1, 2, 30, 30, false, 10),
            Overlap::new(1, 3, 30, 30, false, 10),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        for overlaps in [forward, reversed] {
            let graph = BestOverlapGraph::build(&source(&[100, 100, 100], overlaps), unfiltered())
                .expect("graph");
            assert_eq!(graph.best_edge(1, true).read_id(), 2);
        }
    }

    #[test]
    fn dovetails_skip_contained_partners() {
        let overlaps = vec![
            Overlap::new(2, 1, -10, 20, false, 0),
            Overlap::new(3, 1, 40, 40, false, 0),
            Overlap::new(3, 2, 50, 30, false, 0),
        ];
        let graph = BestOverlapGraph::build(&source(&[120, 90, 100], overlaps), unfiltered())
            .expect("graph");

        assert!(graph.is_contained(2));
        assert_eq!(graph.best_container(2).read_id(), 1);
        assert!(graph.best_container(1).is_empty());
        for (_, edge) in graph.edges().edges() {
            assert!(!graph.is_contained(edge.read_id()));
        }
        assert_eq!(graph.best_edge(3, true).read_id(), 1);
    }

    #[test]
    fn drops_overlaps_above_the_graph_error_rate() {
        let overlaps = vec![Overlap::new(1, 2, 30, 30, false, 600)];
        let graph =
            BestOverlapGraph::build(&source(&[100, 100], overlaps), unfiltered()).expect("graph");
        assert!(graph.best_edge(1, true).is_empty());
        assert!(graph.is_overlap_bad_quality(&Overlap::new(1, 2, 30, 30, false, 600)));
        assert!(graph.is_overlap_bad_quality(&Overlap::new(1, 9, 30, 30, false, 0)));
        assert!(!graph.is_overlap_bad_quality(&Overlap::new(1, 2, 30, 30, false, 0)));
    }

    #[test]
    fn unknown_partners_are_an_error() {
        struct Broken(Vec<Overlap>);
        impl OverlapSource for Broken {
            fn num_reads(&self) -> u32 {
                1
            }
            fn read_length(&self, _: u32) -> u32 {
                100
            }
            fn overlaps(&self, read_id: u32) -> &[Overlap] {
                if read_id == 1 {
                    self.0.as_slice()
                } else {
                    &[]
                }
            }
        }

        let broken = Broken(vec![Overlap::new(1, 5, 30, 30, false, 0)]);
        assert!(matches!(
            BestOverlapGraph::build(&broken, GraphConfig::default()),
            Err(GraphError::ReadOutOfRange { read_id: 5, .. })
        ));
    }

    #[test]
    fn walks_stop_at_sentinels_and_cycles() {
        let cycle = vec![
            Overlap::new(1, 2, 30, 30, false, 0),
            Overlap::new(2, 3, 30, 30, false, 0),
            Overlap::new(3, 1, 30, 30, false, 0),
        ];
        let graph =
            BestOverlapGraph::build(&source(&[100, 100, 100], cycle), unfiltered()).expect("graph");

        assert_eq!(graph.follow_overlap(ReadEnd::NONE), ReadEnd::NONE);
        assert_eq!(
            graph.follow_overlap(ReadEnd::new(1, true)),
            ReadEnd::new(2, true)
        );
        let path: Vec<u32> = graph
            .walk(ReadEnd::new(1, true))
            .map(|end| end.read_id())
            .collect();
        assert_eq!(path, vec![1, 2, 3]);

        let line = vec![Overlap::new(1, 2, 30, 30, false, 0)];
        let graph =
            BestOverlapGraph::build(&source(&[100, 100], line), unfiltered()).expect("graph");
        assert_eq!(graph.follow_overlap(ReadEnd::new(2, true)), ReadEnd::NONE);
        assert_eq!(graph.walk(ReadEnd::new(1, true)).count(), 2);
    }

    #[test]
    fn writes_both_reports_under_the_prefix() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let prefix = dir.path().join("out").join("asm");
        let config = GraphConfig {
            prefix: Some(prefix.clone()),
            ..GraphConfig::default()
        };
        let overlaps = vec![Overlap::new(1, 2, 30, 30, false, 100)];
        let graph = BestOverlapGraph::build(&source(&[100, 100], overlaps), config).expect("graph");

        for label in ["initial", "final"] {
            let stats = std::fs::read_to_string(report_path(&prefix, label, "edges.stats"))
                .expect("stats report");
            assert!(stats.contains("error_limit"));
            let edges = std::fs::read_to_string(report_path(&prefix, label, "edges"))
                .expect("edge report");
            assert_eq!(edges.lines().count(), 3);
        }

        let mut buf = Vec::new();
        graph.report_best_edges(&mut buf).expect("report");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.lines().nth(1).expect("row").starts_with("1\t-\t-"));
    }
}
