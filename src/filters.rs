//! Structural filters over the best edges.
//!
//! Every filter reads a stable snapshot of the store and returns a
//! [`FilterPlan`]; nothing is modified until the plan is applied. Plans only
//! clear edges and flag reads, so running a filter a second time finds nothing
//! new to do.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::best_edge::BestEdge;
use crate::overlap::Overlap;
use crate::overlap_source::OverlapSource;
use crate::read_end::ReadEnd;
use crate::store::BestEdgeStore;

/// Edits computed by one filter: read ends whose best edge is removed and reads
/// newly added to the filter's flag set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPlan {
    pub clear: BTreeSet<ReadEnd>,
    pub flagged: BTreeSet<u32>,
}

/// What applying a plan actually removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cleared {
    pub edges: usize,
    pub reads_one_edge: usize,
    pub reads_two_edges: usize,
}

impl FilterPlan {
    pub fn is_empty(&self) -> bool {
        self.clear.is_empty() && self.flagged.is_empty()
    }

    pub fn apply(&self, store: &mut BestEdgeStore) -> Cleared {
        let mut per_read: BTreeMap<u32, usize> = BTreeMap::new();
        for &end in &self.clear {
            if store.clear_edge(end) {
                *per_read.entry(end.read_id()).or_default() += 1;
            }
        }

        let mut cleared = Cleared::default();
        for lost in per_read.into_values() {
            cleared.edges += lost;
            if lost >= 2 {
                cleared.reads_two_edges += 1;
            } else {
                cleared.reads_one_edge += 1;
            }
        }
        cleared
    }
}

/// Remove every best edge whose error rate exceeds `error_limit`.
pub fn plan_high_error(store: &BestEdgeStore, error_limit: f64) -> FilterPlan {
    let clear = store
        .edges()
        .filter(|(_, edge)| edge.erate() > error_limit)
        .map(|(end, _)| end)
        .collect();
    FilterPlan {
        clear,
        flagged: BTreeSet::new(),
    }
}

/// Number of disjoint islands formed by the read spans covered by `spans`.
/// Two spans join when they share at least `min_overlap` bases.
fn coverage_islands(mut spans: Vec<(i64, i64)>, min_overlap: i64) -> usize {
    if spans.is_empty() {
        return 0;
    }
    spans.sort_unstable();

    let mut islands = 1;
    let mut reach = spans[0].1;
    for &(bgn, end) in &spans[1..] {
        if bgn + min_overlap <= reach {
            reach = reach.max(end);
        } else {
            islands += 1;
            reach = end;
        }
    }
    islands
}

/// Whether the good-quality overlaps of `read_id` leave a junction no overlap
/// crosses. Dovetails and contained reads both count as coverage. Reads placed
/// inside another read by a good overlap are verified.
pub fn is_read_suspicious<S, F>(source: &S, read_id: u32, min_overlap: u32, is_bad: F) -> bool
where
    S: OverlapSource + ?Sized,
    F: Fn(&Overlap) -> bool,
{
    let read_len = source.read_length(read_id) as i64;
    if read_len == 0 {
        return false;
    }

    let mut spans = Vec::new();
    for overlap in source.overlaps(read_id) {
        if overlap.b_id == read_id || is_bad(overlap) {
            continue;
        }
        if overlap.is_containment() && overlap.a_is_contained() {
            return false;
        }
        let bgn = (overlap.a_hang as i64).max(0);
        let end = if overlap.b_hang < 0 {
            read_len + overlap.b_hang as i64
        } else {
            read_len
        };
        spans.push((bgn, end));
    }

    coverage_islands(spans, min_overlap as i64) > 1
}

/// Flag chimeric-looking reads, dropping their edges and every edge into them.
pub fn plan_suspicious<S, F>(
    store: &BestEdgeStore,
    source: &S,
    min_overlap: u32,
    already: &BTreeSet<u32>,
    is_bad: F,
) -> FilterPlan
where
    S: OverlapSource + ?Sized,
    F: Fn(&Overlap) -> bool,
{
    let flagged: BTreeSet<u32> = store
        .iter()
        .map(|(id, _)| id)
        .filter(|id| !already.contains(id))
        .filter(|&id| is_read_suspicious(source, id, min_overlap, &is_bad))
        .collect();

    let mut clear = BTreeSet::new();
    for (end, edge) in store.edges() {
        if flagged.contains(&end.read_id()) || flagged.contains(&edge.read_id()) {
            clear.insert(end);
        }
    }
    debug!(
        "suspicious plan: {} reads, {} edges",
        flagged.len(),
        clear.len()
    );
    FilterPlan { clear, flagged }
}

/// Remove edges much shorter than the edge their partner prefers on the same end.
pub fn plan_lopsided<S>(store: &BestEdgeStore, source: &S, ratio: f64) -> FilterPlan
where
    S: OverlapSource + ?Sized,
{
    let length_of = |from: u32, edge: &BestEdge| {
        edge.to_overlap(from)
            .overlap_length(source.read_length(from), source.read_length(edge.read_id()))
    };

    let mut clear = BTreeSet::new();
    for (end, edge) in store.edges() {
        let back = store.edge(edge.partner());
        if back.is_empty() || back.partner() == end {
            continue;
        }
        let ours = length_of(end.read_id(), &edge) as f64;
        let theirs = length_of(edge.read_id(), &back) as f64;
        if ours < ratio * theirs {
            clear.insert(end);
        }
    }
    FilterPlan {
        clear,
        flagged: BTreeSet::new(),
    }
}

/// Find dead-end reads. The returned plan flags and clears spurs; the second
/// set holds reads left with no edges at all.
///
/// Only the spur's own edge is cleared. Edges other reads hold into a spur are
/// left alone, so a walk may still end on a spur but never leaves one. Clearing
/// them would turn their owners into new spurs or singletons on a later run.
pub fn plan_spurs(store: &BestEdgeStore, exclude: &BTreeSet<u32>) -> (FilterPlan, BTreeSet<u32>) {
    let mut plan = FilterPlan::default();
    let mut singletons = BTreeSet::new();

    for (read_id, slot) in store.iter() {
        if slot.contained || exclude.contains(&read_id) {
            continue;
        }
        match slot.edge_count() {
            0 => {
                singletons.insert(read_id);
            }
            1 => {
                let end3p = !slot.best3.is_empty();
                let end = ReadEnd::new(read_id, end3p);
                let edge = slot.edge(end3p);
                if store.edge(edge.partner()).partner() != end {
                    plan.clear.insert(end);
                    plan.flagged.insert(read_id);
                }
            }
            _ => {}
        }
    }
    (plan, singletons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlap_source::InMemoryOverlapSource;

    fn edge(to: u32, to3p: bool, a_hang: i32, b_hang: i32, evalue: u32) -> BestEdge {
        BestEdge::new(to, to3p, a_hang, b_hang, evalue).expect("edge")
    }

    #[test]
    fn merges_spans_that_share_enough_bases() {
        assert_eq!(coverage_islands(vec![], 40), 0);
        assert_eq!(coverage_islands(vec![(20, 100), (0, 80)], 40), 1);
        assert_eq!(coverage_islands(vec![(0, 50), (30, 100)], 40), 2);
        assert_eq!(coverage_islands(vec![(0, 50), (10, 60), (30, 100)], 20), 1);
    }

    #[test]
    fn flags_reads_with_an_uncrossed_junction() {
        let source = InMemoryOverlapSource::with_overlaps(
            &[100, 100, 100, 100],
            [
                Overlap::new(1, 2, -70, -70, false, 0),
                Overlap::new(1, 3, 70, 70, false, 0),
                Overlap::new(4, 2, -40, 0, false, 0),
            ],
            true,
        )
        .expect("source");

        let never_bad = |_: &Overlap| false;
        assert!(is_read_suspicious(&source, 1, 40, never_bad));
        // read 4 covers 40..100 of read 2 and joins the dovetail from read 1
        assert!(!is_read_suspicious(&source, 2, 40, never_bad));
        // contained in read 2, so verified
        assert!(!is_read_suspicious(&source, 4, 40, never_bad));
        // bad overlaps are ignored
        assert!(!is_read_suspicious(&source, 1, 40, |o: &Overlap| o.b_id == 3));
    }

    #[test]
    fn contained_reads_bridge_a_junction() {
        // dovetails cover 0..50 and 70..120 of read 2; read 4 sits at 10..110
        let dovetails = [
            Overlap::new(2, 1, -50, -70, false, 0),
            Overlap::new(2, 3, 70, 50, false, 0),
        ];
        let bare = InMemoryOverlapSource::with_overlaps(&[100, 120, 100, 100], dovetails, true)
            .expect("source");
        let bridged = InMemoryOverlapSource::with_overlaps(
            &[100, 120, 100, 100],
            dovetails
                .into_iter()
                .chain([Overlap::new(2, 4, 10, -10, false, 0)]),
            true,
        )
        .expect("source");

        let never_bad = |_: &Overlap| false;
        assert!(is_read_suspicious(&bare, 2, 40, never_bad));
        assert!(!is_read_suspicious(&bridged, 2, 40, never_bad));
        // a bad containee is no evidence
        assert!(is_read_suspicious(&bridged, 2, 40, |o: &Overlap| o.b_id == 4));
    }

    #[test]
    fn high_error_plan_counts_reads_once() {
        let mut store = BestEdgeStore::dense(3);
        store.get_mut(1).best5 = edge(2, true, -10, -10, 900);
        store.get_mut(1).best3 = edge(3, false, 10, 10, 900);
        store.get_mut(2).best3 = edge(1, false, 10, 10, 900);
        store.get_mut(3).best5 = edge(1, true, -10, -10, 10);

        let plan = plan_high_error(&store, 0.05);
        assert_eq!(plan.clear.len(), 3);
        let cleared = plan.apply(&mut store);
        assert_eq!(cleared.reads_two_edges, 1);
        assert_eq!(cleared.reads_one_edge, 1);
        assert_eq!(cleared.edges, 3);

        assert_eq!(plan.apply(&mut store), Cleared::default());
        assert!(plan_high_error(&store, 0.05).is_empty());
    }

    #[test]
    fn keeps_reciprocal_edges_and_drops_short_lopsided_ones() {
        let source = InMemoryOverlapSource::new(&[100, 100, 100]);
        let mut store = BestEdgeStore::dense(3);
        // 1 -> 2 short, 2's 5' prefers 3 with a long overlap
        store.get_mut(1).best3 = edge(2, false, 80, 80, 0);
        store.get_mut(2).best5 = edge(3, true, -10, -10, 0);
        store.get_mut(3).best3 = edge(2, false, 10, 10, 0);

        let plan = plan_lopsided(&store, &source, 0.75);
        assert_eq!(plan.clear, BTreeSet::from([ReadEnd::new(1, true)]));

        let lenient = plan_lopsided(&store, &source, 0.1);
        assert!(lenient.is_empty());
    }

    #[test]
    fn spurs_are_unreciprocated_dead_ends() {
        let mut store = BestEdgeStore::dense(5);
        store.get_mut(1).best3 = edge(2, false, 10, 10, 0);
        store.get_mut(2).best5 = edge(3, true, -10, -10, 0);
        store.get_mut(3).best3 = edge(2, false, 10, 10, 0);
        store.set_contained(5);

        let (plan, singletons) = plan_spurs(&store, &BTreeSet::new());
        assert_eq!(plan.flagged, BTreeSet::from([1]));
        assert_eq!(plan.clear, BTreeSet::from([ReadEnd::new(1, true)]));
        assert_eq!(singletons, BTreeSet::from([4]));

        let (again, _) = plan_spurs(&store, &BTreeSet::from([1, 4]));
        assert!(again.is_empty());
    }

    #[test]
    fn edges_into_a_spur_are_kept() {
        let mut store = BestEdgeStore::dense(3);
        store.get_mut(1).best3 = edge(2, false, 10, 10, 0);
        store.get_mut(2).best5 = edge(3, true, -10, -10, 0);
        store.get_mut(3).best3 = edge(2, false, 10, 10, 0);
        store.get_mut(3).best5 = edge(1, false, -10, -10, 0);

        let (plan, singletons) = plan_spurs(&store, &BTreeSet::new());
        assert_eq!(plan.flagged, BTreeSet::from([1]));
        assert_eq!(plan.clear, BTreeSet::from([ReadEnd::new(1, true)]));
        assert!(singletons.is_empty());

        plan.apply(&mut store);
        assert_eq!(store.edge(ReadEnd::new(3, false)).read_id(), 1);
        let (again, _) = plan_spurs(&store, &BTreeSet::from([1]));
        assert!(again.is_empty());
    }
}
