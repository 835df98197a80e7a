//! The consistency structure that decides whether a correspondence can join the alignment.
//!
//! Every position of every sequence is a node in an arena.  Nodes that have been aligned together
//! are merged with union-find, and the representative of a set identifies its column.  Each
//! sequence contributes edges from the column of each position to the column of the next
//! position, so the columns form a directed graph that must stay acyclic: merging two columns is
//! only allowed when neither can reach the other.  A dynamic topological order over the columns
//! (Pearce-Kelly) restricts each reachability search to the columns that lie between the two
//! being merged.
use crate::{align::columns::Column, util::index_map::IndexMap};
use bit_set::BitSet;
use itertools::Itertools;

/// Direction in which to follow the sequence edges during a search.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

/// The result of searching from a column towards another.
enum Search {
    /// The other column is reachable.
    Reached,
    /// The other column is not reachable; these are the columns visited inside the order window.
    Visited(Vec<usize>),
}

pub struct PosetConsistencyFilter {
    /// The arena index of the first position of each sequence, plus the total as the last value.
    offsets: Vec<usize>,
    /// Union-find parent of each node.
    parents: Vec<usize>,
    /// Number of nodes in the set, valid for representatives only.
    sizes: Vec<usize>,
    /// Position of each column in the topological order, valid for representatives only.
    orders: Vec<usize>,
    /// Nodes following each column along a sequence.  May hold non-representatives.
    successors: Vec<Vec<usize>>,
    /// Nodes preceding each column along a sequence.  May hold non-representatives.
    predecessors: Vec<Vec<usize>>,
    /// Scratch space for searches, always empty between calls.
    visited: BitSet,
}

impl PosetConsistencyFilter {
    /// Builds a filter over sequences with the given lengths, with every position in its own
    /// column.
    pub fn new(lengths: &[usize]) -> Self {
        let mut offsets = Vec::with_capacity(lengths.len() + 1);
        offsets.push(0);
        for length in lengths {
            offsets.push(offsets[offsets.len() - 1] + length);
        }
        let total = offsets[lengths.len()];

        let mut successors = vec![Vec::new(); total];
        let mut predecessors = vec![Vec::new(); total];
        for (start, end) in offsets.iter().copied().tuple_windows() {
            for node in start..end.saturating_sub(1) {
                successors[node].push(node + 1);
                predecessors[node + 1].push(node);
            }
        }

        Self {
            offsets,
            parents: (0..total).collect(),
            sizes: vec![1; total],
            // Positions are laid out sequence by sequence, so the arena index is already a
            // topological order.
            orders: (0..total).collect(),
            successors,
            predecessors,
            visited: BitSet::with_capacity(total),
        }
    }

    pub fn from_sequences<S: AsRef<[u8]>>(sequences: &[S]) -> Self {
        Self::new(&sequences.iter().map(|s| s.as_ref().len()).collect_vec())
    }

    pub fn sequence_count(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn sequence_length(&self, seq: usize) -> usize {
        self.offsets[seq + 1] - self.offsets[seq]
    }

    /// The total number of positions across all sequences.
    pub fn position_count(&self) -> usize {
        self.parents.len()
    }

    fn node(&self, seq: usize, pos: usize) -> usize {
        assert!(
            seq < self.sequence_count(),
            "Sequence index out of range: {seq} >= {}",
            self.sequence_count()
        );
        assert!(
            pos < self.sequence_length(seq),
            "Position out of range for sequence {seq}: {pos} >= {}",
            self.sequence_length(seq)
        );
        self.offsets[seq] + pos
    }

    /// The representative of the node's set, without path compression.
    fn root(&self, mut node: usize) -> usize {
        while self.parents[node] != node {
            node = self.parents[node];
        }
        node
    }

    /// The representative of the node's set, compressing the path to it.
    fn find(&mut self, node: usize) -> usize {
        let root = self.root(node);
        let mut current = node;
        while self.parents[current] != root {
            let next = self.parents[current];
            self.parents[current] = root;
            current = next;
        }
        root
    }

    /// The column identifier of the given position.  Identifiers are stable until the column is
    /// merged with another.
    pub fn column_of(&self, seq: usize, pos: usize) -> usize {
        self.root(self.node(seq, pos))
    }

    /// True if the two positions are already in the same column.
    pub fn same_column(&self, seq_x: usize, x: usize, seq_y: usize, y: usize) -> bool {
        self.column_of(seq_x, x) == self.column_of(seq_y, y)
    }

    /// Searches from `start` along edges in the given direction, only entering columns whose
    /// order lies strictly inside the window bounded by `limit`.  Reports whether `target` was
    /// reached.
    fn search(&mut self, start: usize, target: usize, limit: usize, direction: Direction) -> Search {
        let mut stack = vec![start];
        let mut visited = vec![start];
        self.visited.insert(start);
        let mut reached = false;
        'search: while let Some(column) = stack.pop() {
            let num_edges = match direction {
                Direction::Forward => self.successors[column].len(),
                Direction::Backward => self.predecessors[column].len(),
            };
            for index in 0..num_edges {
                let neighbor = match direction {
                    Direction::Forward => self.successors[column][index],
                    Direction::Backward => self.predecessors[column][index],
                };
                let neighbor = self.find(neighbor);
                if neighbor == target {
                    reached = true;
                    break 'search;
                }
                let inside = match direction {
                    Direction::Forward => self.orders[neighbor] < limit,
                    Direction::Backward => self.orders[neighbor] > limit,
                };
                if inside && self.visited.insert(neighbor) {
                    stack.push(neighbor);
                    visited.push(neighbor);
                }
            }
        }
        for column in &visited {
            self.visited.remove(*column);
        }
        if reached {
            Search::Reached
        } else {
            Search::Visited(visited)
        }
    }

    /// Checks whether the columns `a` and `b` (both representatives) may be merged.  If so,
    /// returns them ordered as `(lower, upper)` along with the columns reachable forward from the
    /// lower and backward from the upper within the order window between them.
    fn mergeable(&mut self, a: usize, b: usize) -> Option<(usize, usize, Vec<usize>, Vec<usize>)> {
        let (lower, upper) = if self.orders[a] < self.orders[b] {
            (a, b)
        } else {
            (b, a)
        };
        // The upper column cannot reach the lower one, so only a path from lower to upper can
        // contradict the merge.
        let forward = match self.search(lower, upper, self.orders[upper], Direction::Forward) {
            Search::Reached => return None,
            Search::Visited(visited) => visited,
        };
        let backward = match self.search(upper, lower, self.orders[lower], Direction::Backward) {
            Search::Reached => return None,
            Search::Visited(visited) => visited,
        };
        Some((lower, upper, forward, backward))
    }

    /// True if aligning the two positions would keep the alignment consistent.  Does not modify
    /// the alignment.
    pub fn is_consistent(&mut self, seq_x: usize, x: usize, seq_y: usize, y: usize) -> bool {
        assert_ne!(seq_x, seq_y, "Cannot align a sequence to itself: {seq_x}");
        let a = self.node(seq_x, x);
        let b = self.node(seq_y, y);
        let (a, b) = (self.find(a), self.find(b));
        a == b || self.mergeable(a, b).is_some()
    }

    /// Aligns position `x` of sequence `seq_x` with position `y` of sequence `seq_y`, merging
    /// their columns.  Returns false, leaving the alignment unchanged, if the merge would place
    /// two positions of one sequence in the same column or contradict the order of positions
    /// along any sequence.
    pub fn add(&mut self, seq_x: usize, x: usize, seq_y: usize, y: usize) -> bool {
        assert_ne!(seq_x, seq_y, "Cannot align a sequence to itself: {seq_x}");
        let a = self.node(seq_x, x);
        let b = self.node(seq_y, y);
        let (a, b) = (self.find(a), self.find(b));
        if a == b {
            return true;
        }
        let (lower, upper, forward, backward) = match self.mergeable(a, b) {
            Some(mergeable) => mergeable,
            None => return false,
        };

        // Re-use the order slots of all the searched columns: first the columns that reach the
        // upper column (ending with it), then those reachable from the lower (starting with it).
        let forward = forward
            .into_iter()
            .sorted_by_key(|column| self.orders[*column])
            .collect_vec();
        let backward = backward
            .into_iter()
            .sorted_by_key(|column| self.orders[*column])
            .collect_vec();
        let slots = forward
            .iter()
            .chain(backward.iter())
            .map(|column| self.orders[*column])
            .sorted()
            .collect_vec();
        for (column, slot) in backward.iter().chain(forward.iter()).zip(slots) {
            self.orders[*column] = slot;
        }

        // Union by size; the merged column takes the upper column's new slot, which sits
        // directly before the lower column's new slot.
        let order = self.orders[upper];
        let (root, child) = if self.sizes[lower] >= self.sizes[upper] {
            (lower, upper)
        } else {
            (upper, lower)
        };
        self.parents[child] = root;
        self.sizes[root] += self.sizes[child];
        self.orders[root] = order;

        let successors = std::mem::take(&mut self.successors[child]);
        self.successors[root].extend(successors);
        self.successors[root] = self.compact(root, Direction::Forward);
        let predecessors = std::mem::take(&mut self.predecessors[child]);
        self.predecessors[root].extend(predecessors);
        self.predecessors[root] = self.compact(root, Direction::Backward);
        true
    }

    /// The column's edges resolved to representatives, without duplicates.
    fn compact(&mut self, column: usize, direction: Direction) -> Vec<usize> {
        let edges = match direction {
            Direction::Forward => std::mem::take(&mut self.successors[column]),
            Direction::Backward => std::mem::take(&mut self.predecessors[column]),
        };
        edges
            .into_iter()
            .map(|node| self.find(node))
            .sorted()
            .dedup()
            .collect()
    }

    /// The columns of the alignment in topological order.  Every position appears in exactly one
    /// column; unaligned positions are singletons.
    pub fn columns(&self) -> Vec<Column> {
        let mut root_to_column: IndexMap<usize> = IndexMap::new(self.position_count());
        let mut columns: Vec<(usize, Column)> = Vec::new();
        for seq in 0..self.sequence_count() {
            for pos in 0..self.sequence_length(seq) {
                let root = self.column_of(seq, pos);
                let index = root_to_column.get_or_insert_with(root, || {
                    columns.push((self.orders[root], Column::default()));
                    columns.len() - 1
                });
                columns[index].1.push(seq, pos);
            }
        }
        columns
            .into_iter()
            .sorted_by_key(|(order, _)| *order)
            .map(|(_, column)| column)
            .collect()
    }
}

#[cfg(test)]
pub mod tests {
    use super::PosetConsistencyFilter;
    use itertools::Itertools;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use rstest::rstest;

    /// True if, for every sequence, the columns of its positions appear in increasing order.
    fn columns_respect_sequence_order(filter: &PosetConsistencyFilter) -> bool {
        let columns = filter.columns();
        let mut column_index = vec![Vec::new(); filter.sequence_count()];
        for seq in 0..filter.sequence_count() {
            column_index[seq] = vec![usize::MAX; filter.sequence_length(seq)];
        }
        for (index, column) in columns.iter().enumerate() {
            for &(seq, pos) in column.entries() {
                column_index[seq][pos] = index;
            }
        }
        column_index
            .iter()
            .all(|indexes| indexes.iter().tuple_windows().all(|(a, b)| a < b))
    }

    #[test]
    fn test_new() {
        let filter = PosetConsistencyFilter::new(&[5, 6, 2, 0]);
        assert_eq!(filter.sequence_count(), 4);
        assert_eq!(filter.position_count(), 13);
        assert_eq!(filter.columns().len(), 13);
        assert!(!filter.same_column(0, 0, 1, 0));
    }

    #[test]
    fn test_add_and_same_column() {
        let mut filter = PosetConsistencyFilter::new(&[3, 3]);
        assert!(filter.add(0, 1, 1, 1));
        assert!(filter.same_column(0, 1, 1, 1));
        assert_eq!(filter.column_of(0, 1), filter.column_of(1, 1));
        // adding the same pair again is fine
        assert!(filter.add(1, 1, 0, 1));
        assert_eq!(filter.columns().len(), 5);
    }

    #[test]
    fn test_rejects_crossing_pairs() {
        let mut filter = PosetConsistencyFilter::new(&[3, 3]);
        assert!(filter.add(0, 0, 1, 2));
        assert!(!filter.add(0, 1, 1, 1));
        assert!(!filter.add(0, 2, 1, 0));
        assert!(!filter.add(0, 1, 1, 0));
        assert!(columns_respect_sequence_order(&filter));
    }

    #[test]
    fn test_rejects_two_positions_of_one_sequence_in_a_column() {
        let mut filter = PosetConsistencyFilter::new(&[3, 3]);
        assert!(filter.add(0, 1, 1, 1));
        assert!(!filter.add(0, 2, 1, 1));
        assert!(!filter.add(0, 0, 1, 1));
        assert!(!filter.same_column(0, 2, 1, 1));
    }

    #[test]
    fn test_rejects_transitive_contradiction() {
        let mut filter = PosetConsistencyFilter::new(&[2, 2, 2]);
        assert!(filter.add(0, 0, 1, 1));
        assert!(filter.add(1, 0, 2, 1));
        // 2:1 ~ 1:0 < 1:1 ~ 0:0, so 2:1 is before 0:0 and 0:1 comes after 2:1.
        assert!(!filter.add(2, 1, 0, 1));
        // 2:0 < 2:1 ~ 1:0 < 1:1 ~ 0:0
        assert!(!filter.is_consistent(2, 0, 0, 0));
        assert!(!filter.add(2, 0, 0, 0));
        assert!(columns_respect_sequence_order(&filter));
    }

    #[test]
    fn test_rejects_three_way_cycle() {
        let mut filter = PosetConsistencyFilter::new(&[2, 2, 2]);
        assert!(filter.add(0, 1, 1, 0));
        assert!(filter.add(1, 1, 2, 0));
        // 0:0 < 0:1 ~ 1:0 < 1:1 ~ 2:0 < 2:1 so 2:1 cannot join 0:0
        assert!(!filter.add(2, 1, 0, 0));
        assert!(!filter.add(2, 1, 0, 1));
        assert!(filter.add(2, 1, 0, 0) == filter.is_consistent(2, 1, 0, 0));
    }

    #[test]
    fn test_is_consistent_does_not_modify() {
        let mut filter = PosetConsistencyFilter::new(&[3, 3]);
        assert!(filter.is_consistent(0, 0, 1, 2));
        assert!(!filter.same_column(0, 0, 1, 2));
        assert!(filter.add(0, 0, 1, 2));
        assert!(!filter.is_consistent(0, 1, 1, 1));
    }

    #[test]
    fn test_merges_columns_that_must_be_reordered() {
        // The end of sequence 1 is aligned to the start of sequence 0, so all of sequence 1's
        // earlier positions must move ahead of sequence 0 in the column order.
        let mut filter = PosetConsistencyFilter::new(&[3, 3, 3]);
        assert!(filter.add(0, 2, 2, 0));
        assert!(filter.add(1, 2, 0, 0));
        // 1:0 < 1:1 < 1:2~0:0 < 0:1 < 0:2~2:0 < 2:1 < 2:2
        assert!(!filter.add(2, 2, 1, 0));
        assert!(!filter.add(2, 1, 1, 1));
        assert!(columns_respect_sequence_order(&filter));
        let columns = filter.columns();
        assert_eq!(columns.len(), 7);
        assert_eq!(columns[0].entries(), &[(1, 0)]);
        assert_eq!(columns[1].entries(), &[(1, 1)]);
        assert_eq!(columns[2].entries(), &[(0, 0), (1, 2)]);
        assert_eq!(columns[3].entries(), &[(0, 1)]);
        assert_eq!(columns[4].entries(), &[(0, 2), (2, 0)]);
        assert_eq!(columns[6].entries(), &[(2, 2)]);
    }

    #[rstest]
    #[case(0, 0, 0, 1)]
    #[case(0, 3, 1, 0)]
    #[case(0, 0, 2, 0)]
    #[case(3, 0, 0, 0)]
    #[should_panic]
    fn test_invalid_coordinates(
        #[case] seq_x: usize,
        #[case] x: usize,
        #[case] seq_y: usize,
        #[case] y: usize,
    ) {
        let mut filter = PosetConsistencyFilter::new(&[3, 3, 0]);
        filter.add(seq_x, x, seq_y, y);
    }

    /// Random adds never break the order of any sequence, and replaying the accepted pairs into a
    /// fresh filter accepts every one of them and gives the same columns.
    #[test]
    fn test_random_adds_keep_sequence_order() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let num_seqs = rng.gen_range(2..6);
            let lengths = (0..num_seqs).map(|_| rng.gen_range(1..12)).collect_vec();
            let mut filter = PosetConsistencyFilter::new(&lengths);
            let mut accepted = Vec::new();
            for _ in 0..40 {
                let seq_x = rng.gen_range(0..num_seqs);
                let seq_y = (seq_x + rng.gen_range(1..num_seqs)) % num_seqs;
                let x = rng.gen_range(0..lengths[seq_x]);
                let y = rng.gen_range(0..lengths[seq_y]);
                let consistent = filter.is_consistent(seq_x, x, seq_y, y);
                let added = filter.add(seq_x, x, seq_y, y);
                assert_eq!(consistent, added);
                if added {
                    accepted.push((seq_x, x, seq_y, y));
                }
                assert!(columns_respect_sequence_order(&filter));
            }
            // Replaying the accepted pairs into a fresh filter must accept all of them.
            let mut replay = PosetConsistencyFilter::new(&lengths);
            for (seq_x, x, seq_y, y) in accepted {
                assert!(replay.add(seq_x, x, seq_y, y));
            }
            assert_eq!(
                replay.columns().into_iter().sorted().collect_vec(),
                filter.columns().into_iter().sorted().collect_vec()
            );
        }
    }
}
