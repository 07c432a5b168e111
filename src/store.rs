//! Per-read storage for best edges and running scores.
//!
//! Both stores come in two layouts chosen once at construction: a dense array
//! indexed by read id covering the whole population, or a sparse ordered map
//! holding only the reads a restricted build touches.

use std::collections::BTreeMap;

use crate::best_edge::BestEdge;
use crate::read_end::ReadEnd;

/// Slots addressed by read id, dense or sparse.
#[derive(Debug, Clone)]
pub enum ReadSlots<T> {
    /// Index `i` holds read `i`; index 0 is the unused sentinel slot.
    Dense(Vec<T>),
    Sparse(BTreeMap<u32, T>),
}

impl<T: Default + Clone> ReadSlots<T> {
    pub fn dense(num_reads: u32) -> Self {
        Self::Dense(vec![T::default(); num_reads as usize + 1])
    }

    pub fn sparse() -> Self {
        Self::Sparse(BTreeMap::new())
    }

    pub fn get(&self, read_id: u32) -> Option<&T> {
        match self {
            Self::Dense(slots) => slots.get(read_id as usize),
            Self::Sparse(slots) => slots.get(&read_id),
        }
    }

    /// Mutable slot, created on first use in the sparse layout.
    pub fn slot_mut(&mut self, read_id: u32) -> &mut T {
        match self {
            Self::Dense(slots) => &mut slots[read_id as usize],
            Self::Sparse(slots) => slots.entry(read_id).or_default(),
        }
    }

    pub fn is_sparse(&self) -> bool {
        matches!(self, Self::Sparse(_))
    }

    /// Number of materialised slots, excluding the dense sentinel.
    pub fn len(&self) -> usize {
        match self {
            Self::Dense(slots) => slots.len().saturating_sub(1),
            Self::Sparse(slots) => slots.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Materialised slots in read id order.
    pub fn iter(&self) -> Box<dyn Iterator<Item = (u32, &T)> + '_> {
        match self {
            Self::Dense(slots) => Box::new(
                slots
                    .iter()
                    .enumerate()
                    .skip(1)
                    .map(|(id, slot)| (id as u32, slot)),
            ),
            Self::Sparse(slots) => Box::new(slots.iter().map(|(&id, slot)| (id, slot))),
        }
    }
}

/// The best edges of one read plus its containment state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BestOverlaps {
    pub best5: BestEdge,
    pub best3: BestEdge,
    /// Best containment overlap placing this read inside another.
    pub container: BestEdge,
    pub contained: bool,
}

impl BestOverlaps {
    pub fn edge(&self, three_prime: bool) -> &BestEdge {
        if three_prime {
            &self.best3
        } else {
            &self.best5
        }
    }

    pub fn edge_mut(&mut self, three_prime: bool) -> &mut BestEdge {
        if three_prime {
            &mut self.best3
        } else {
            &mut self.best5
        }
    }

    /// Number of ends with a surviving edge.
    pub fn edge_count(&self) -> usize {
        (!self.best5.is_empty()) as usize + (!self.best3.is_empty()) as usize
    }
}

/// Running best scores for one read, used only while arbitrating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BestScores {
    pub best5: u64,
    pub best3: u64,
    pub container: u64,
    pub contained: bool,
}

impl BestScores {
    pub fn score_mut(&mut self, three_prime: bool) -> &mut u64 {
        if three_prime {
            &mut self.best3
        } else {
            &mut self.best5
        }
    }
}

/// Best edges for every read in the graph.
#[derive(Debug, Clone)]
pub struct BestEdgeStore {
    num_reads: u32,
    slots: ReadSlots<BestOverlaps>,
}

impl BestEdgeStore {
    pub fn dense(num_reads: u32) -> Self {
        Self {
            num_reads,
            slots: ReadSlots::dense(num_reads),
        }
    }

    pub fn sparse(num_reads: u32) -> Self {
        Self {
            num_reads,
            slots: ReadSlots::sparse(),
        }
    }

    pub fn num_reads(&self) -> u32 {
        self.num_reads
    }

    pub fn is_sparse(&self) -> bool {
        self.slots.is_sparse()
    }

    /// Panics on a read id outside the population; an unknown read is a caller bug.
    fn check(&self, read_id: u32) {
        assert!(
            read_id <= self.num_reads,
            "read id {} outside the read population 1..={}",
            read_id,
            self.num_reads
        );
    }

    pub fn get(&self, read_id: u32) -> BestOverlaps {
        self.check(read_id);
        self.slots.get(read_id).copied().unwrap_or_default()
    }

    /// Panics on the sentinel too; only real reads may be written.
    fn check_writable(&self, read_id: u32) {
        assert!(
            read_id >= 1 && read_id <= self.num_reads,
            "read id {} outside the read population 1..={}",
            read_id,
            self.num_reads
        );
    }

    pub fn get_mut(&mut self, read_id: u32) -> &mut BestOverlaps {
        self.check_writable(read_id);
        self.slots.slot_mut(read_id)
    }

    pub fn edge(&self, end: ReadEnd) -> BestEdge {
        *self.get(end.read_id()).edge(end.read3p())
    }

    pub fn is_contained(&self, read_id: u32) -> bool {
        self.get(read_id).contained
    }

    pub fn set_contained(&mut self, read_id: u32) {
        self.get_mut(read_id).contained = true;
    }

    /// Remove the edge leaving `end`. Returns whether an edge was present.
    pub fn clear_edge(&mut self, end: ReadEnd) -> bool {
        self.check_writable(end.read_id());
        let Some(slot) = self.slots.get(end.read_id()) else {
            return false;
        };
        if slot.edge(end.read3p()).is_empty() {
            return false;
        }
        self.slots.slot_mut(end.read_id()).edge_mut(end.read3p()).clear();
        true
    }

    /// Stored reads in id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &BestOverlaps)> + '_ {
        self.slots.iter()
    }

    /// All surviving edges as (source end, edge).
    pub fn edges(&self) -> impl Iterator<Item = (ReadEnd, BestEdge)> + '_ {
        self.iter().flat_map(|(id, slot)| {
            [(false, slot.best5), (true, slot.best3)]
                .into_iter()
                .filter(|(_, edge)| !edge.is_empty())
                .map(move |(end3p, edge)| (ReadEnd::new(id, end3p), edge))
        })
    }
}

/// Running best scores for every read, discarded once the graph is built.
#[derive(Debug, Clone)]
pub struct ScoreStore {
    slots: ReadSlots<BestScores>,
}

impl ScoreStore {
    pub fn dense(num_reads: u32) -> Self {
        Self {
            slots: ReadSlots::dense(num_reads),
        }
    }

    pub fn sparse() -> Self {
        Self {
            slots: ReadSlots::sparse(),
        }
    }

    pub fn get(&self, read_id: u32) -> BestScores {
        self.slots.get(read_id).copied().unwrap_or_default()
    }

    pub fn get_mut(&mut self, read_id: u32) -> &mut BestScores {
        self.slots.slot_mut(read_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(to: u32) -> BestEdge {
        BestEdge::new(to, false, 10, 10, 0).expect("edge")
    }

    #[test]
    fn dense_and_sparse_agree_on_lookups() {
        for mut store in [BestEdgeStore::dense(5), BestEdgeStore::sparse(5)] {
            assert_eq!(store.get(3), BestOverlaps::default());
            store.get_mut(3).best3 = edge(4);
            store.set_contained(2);

            assert_eq!(store.edge(ReadEnd::new(3, true)).read_id(), 4);
            assert!(store.edge(ReadEnd::new(3, false)).is_empty());
            assert!(store.is_contained(2));
            assert!(!store.is_contained(3));
            assert_eq!(store.edges().count(), 1);
        }
    }

    #[test]
    fn clearing_reports_whether_an_edge_was_removed() {
        let mut store = BestEdgeStore::sparse(4);
        assert!(!store.clear_edge(ReadEnd::new(1, false)));
        store.get_mut(1).best5 = edge(2);
        assert!(store.clear_edge(ReadEnd::new(1, false)));
        assert!(!store.clear_edge(ReadEnd::new(1, false)));
    }

    #[test]
    fn iterates_materialised_reads_in_order() {
        let mut sparse = BestEdgeStore::sparse(10);
        sparse.get_mut(7);
        sparse.get_mut(2);
        let ids: Vec<u32> = sparse.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![2, 7]);

        let dense = BestEdgeStore::dense(3);
        let ids: Vec<u32> = dense.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    #[should_panic(expected = "outside the read population")]
    fn out_of_range_reads_fail_loudly() {
        let store = BestEdgeStore::dense(3);
        store.get(4);
    }

    #[test]
    fn sentinel_reads_as_an_empty_slot() {
        let store = BestEdgeStore::sparse(3);
        assert_eq!(store.get(0), BestOverlaps::default());
        assert!(!store.is_contained(0));
    }

    #[test]
    #[should_panic(expected = "outside the read population")]
    fn writing_the_sentinel_fails_loudly() {
        let mut store = BestEdgeStore::sparse(3);
        store.set_contained(0);
    }

    #[test]
    #[should_panic(expected = "outside the read population")]
    fn clearing_the_sentinel_fails_loudly() {
        let mut store = BestEdgeStore::dense(3);
        store.clear_edge(ReadEnd::NONE);
    }

    #[test]
    #[should_panic(expected = "outside the read population")]
    fn writing_past_the_population_fails_loudly() {
        let mut store = BestEdgeStore::dense(3);
        store.get_mut(4);
    }
}
