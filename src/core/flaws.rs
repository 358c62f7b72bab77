//! Work queues of the refinement engine.
//!
//! Entries record the vertices their handle named when they were queued, so a
//! consumer can tell whether later mutations have turned the handle into a
//! different edge or triangle and skip it.

use crate::core::topology::{Osub, Otri};
use crate::core::vertex::VertexKey;
use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

/// An encroached subsegment awaiting a split.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct EncroachedSubseg {
    pub(crate) subseg: Osub,
    pub(crate) org: VertexKey,
    pub(crate) dest: VertexKey,
}

/// A triangle failing a quality test.
#[derive(Clone, Copy, Debug)]
pub(crate) struct BadTriangle {
    pub(crate) triangle: Otri,
    /// Squared length of the shortest edge.
    pub(crate) key: OrderedFloat<f64>,
    pub(crate) org: VertexKey,
    pub(crate) dest: VertexKey,
    pub(crate) apex: VertexKey,
    sequence: u64,
}

impl PartialEq for BadTriangle {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BadTriangle {}

impl PartialOrd for BadTriangle {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BadTriangle {
    /// Greater means "split sooner": shorter shortest edge first, then FIFO.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .key
            .cmp(&self.key)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// The encroached-subsegment FIFO and the bad-triangle priority queue.
#[derive(Clone, Debug, Default)]
pub(crate) struct FlawQueues {
    encroached: VecDeque<EncroachedSubseg>,
    bad_triangles: BinaryHeap<BadTriangle>,
    next_sequence: u64,
}

impl FlawQueues {
    pub(crate) fn push_encroached(&mut self, subseg: Osub, org: VertexKey, dest: VertexKey) {
        self.encroached.push_back(EncroachedSubseg { subseg, org, dest });
    }

    pub(crate) fn pop_encroached(&mut self) -> Option<EncroachedSubseg> {
        self.encroached.pop_front()
    }

    pub(crate) fn encroached_len(&self) -> usize {
        self.encroached.len()
    }

    pub(crate) fn has_encroached(&self) -> bool {
        !self.encroached.is_empty()
    }

    pub(crate) fn push_bad_triangle(
        &mut self,
        triangle: Otri,
        min_edge_squared: f64,
        [org, dest, apex]: [VertexKey; 3],
    ) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.bad_triangles.push(BadTriangle {
            triangle,
            key: OrderedFloat(min_edge_squared),
            org,
            dest,
            apex,
            sequence,
        });
    }

    /// Re-queues an entry at the back of its priority class.
    pub(crate) fn requeue_bad_triangle(&mut self, bad: BadTriangle) {
        self.push_bad_triangle(bad.triangle, bad.key.0, [bad.org, bad.dest, bad.apex]);
    }

    pub(crate) fn pop_bad_triangle(&mut self) -> Option<BadTriangle> {
        self.bad_triangles.pop()
    }

    pub(crate) fn bad_triangle_len(&self) -> usize {
        self.bad_triangles.len()
    }

    pub(crate) fn clear(&mut self) {
        self.encroached.clear();
        self.bad_triangles.clear();
        self.next_sequence = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::topology::TriangleId;

    fn keys() -> [VertexKey; 3] {
        [VertexKey::default(); 3]
    }

    #[test]
    fn shortest_edge_pops_first() {
        let mut queues = FlawQueues::default();
        queues.push_bad_triangle(Otri::new(TriangleId(1), 0), 4.0, keys());
        queues.push_bad_triangle(Otri::new(TriangleId(2), 0), 0.25, keys());
        queues.push_bad_triangle(Otri::new(TriangleId(3), 0), 1.0, keys());
        let order: Vec<_> = std::iter::from_fn(|| queues.pop_bad_triangle())
            .map(|b| b.triangle.tri.index())
            .collect();
        assert_eq!(order, vec![2, 3, 1]);
    }

    #[test]
    fn ties_are_fifo() {
        let mut queues = FlawQueues::default();
        for t in 1..=4 {
            queues.push_bad_triangle(Otri::new(TriangleId(t), 0), 1.0, keys());
        }
        let first = queues.pop_bad_triangle().unwrap();
        assert_eq!(first.triangle.tri.index(), 1);
        queues.requeue_bad_triangle(first);
        assert_eq!(queues.pop_bad_triangle().unwrap().triangle.tri.index(), 2);
        assert_eq!(queues.bad_triangle_len(), 3);
    }

    #[test]
    fn encroached_queue_is_fifo() {
        let mut queues = FlawQueues::default();
        let k = VertexKey::default();
        queues.push_encroached(Osub::NONE, k, k);
        queues.push_encroached(Osub::NONE.ssym(), k, k);
        assert_eq!(queues.encroached_len(), 2);
        assert_eq!(queues.pop_encroached().unwrap().subseg.orient, 0);
        queues.clear();
        assert!(!queues.has_encroached());
    }
}
