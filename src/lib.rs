//! bog_rs: best overlap graph construction for overlap-layout-consensus assembly.
//!
//! Given precomputed overlaps between reads, the crate keeps at most one best
//! overlapping neighbour per read end, removes structurally misleading edges
//! and exposes a walkable graph whose paths seed contig construction.

pub mod best_edge;
pub mod error;
pub mod evalue;
pub mod filters;
pub mod graph;
pub mod overlap;
pub mod overlap_source;
pub mod read_end;
pub mod stats;
pub mod store;

pub use best_edge::BestEdge;
pub use error::GraphError;
pub use evalue::{decode_evalue, encode_evalue, MAX_EVALUE, MAX_READLEN};
pub use graph::{BestOverlapGraph, GraphConfig, GraphSummary, PathWalk};
pub use overlap::Overlap;
pub use overlap_source::{InMemoryOverlapSource, OverlapSource};
pub use read_end::ReadEnd;
pub use stats::{EdgeStatistics, FilterCounts, GraphCensus};
pub use store::{BestEdgeStore, BestOverlaps};
