//! A static-after-build rectangle index over `(box, handle)` pairs
//! (`spec.md` §4.2). Queries run in expected `O(log n + k)`: the index is
//! a bulk-loaded binary tree over axis-aligned boxes, split by alternating
//! the widest axis of the current node, a packed hierarchy of boxes
//! specialized here to a 2D rectangle tree instead of a fixed grid.

use crate::geometry::bounding_box::Aabb2;

const LEAF_CAPACITY: usize = 8;

enum Node<T> {
    Leaf(Vec<(Aabb2, T)>),
    Branch {
        bbox: Aabb2,
        left: Box<Node<T>>,
        right: Box<Node<T>>,
    },
}

/// A rectangle index: `insert` before the first `build`, then `query` many
/// times. No ordering guarantee on the handles returned by `query`.
pub struct SpatialIndex<T> {
    pending: Vec<(Aabb2, T)>,
    root: Option<Node<T>>,
}

impl<T> Default for SpatialIndex<T> {
    fn default() -> Self {
        SpatialIndex {
            pending: Vec::new(),
            root: None,
        }
    }
}

impl<T: Clone> SpatialIndex<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk-builds an index directly from a fully known item list, the
    /// preferred constructor when the item set is known up front (every
    /// consumer in this crate: sources, footprint edges, plane boundaries).
    pub fn bulk(items: Vec<(Aabb2, T)>) -> Self {
        let mut index = SpatialIndex::new();
        index.pending = items;
        index.build();
        index
    }

    /// Queues an item for the next `build()`. Does not affect a
    /// previously built tree until `build` is called again.
    pub fn insert(&mut self, bbox: Aabb2, handle: T) {
        self.pending.push((bbox, handle));
    }

    /// Rebuilds the tree from all items inserted so far, including items
    /// from a previous build (the index remains query-able in between).
    pub fn build(&mut self) {
        if self.pending.is_empty() && self.root.is_none() {
            return;
        }
        let mut items = std::mem::take(&mut self.pending);
        if let Some(old_root) = self.root.take() {
            collect(old_root, &mut items);
        }
        self.root = build_node(items);
    }

    /// Returns the handles of every item whose stored box intersects
    /// `query_box`. Panics if `build()` was never called.
    pub fn query(&self, query_box: Aabb2) -> Vec<T> {
        let root = self
            .root
            .as_ref()
            .expect("SpatialIndex::query called before build()");
        let mut out = Vec::new();
        query_node(root, &query_box, &mut out);
        out
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none() && self.pending.is_empty()
    }
}

fn collect<T>(node: Node<T>, out: &mut Vec<(Aabb2, T)>) {
    match node {
        Node::Leaf(items) => out.extend(items),
        Node::Branch { left, right, .. } => {
            collect(*left, out);
            collect(*right, out);
        }
    }
}

fn build_node<T>(mut items: Vec<(Aabb2, T)>) -> Option<Node<T>> {
    if items.is_empty() {
        return None;
    }
    if items.len() <= LEAF_CAPACITY {
        return Some(Node::Leaf(items));
    }

    let bbox = items
        .iter()
        .fold(Aabb2::empty(), |acc, (b, _)| acc.union(b));
    let split_on_x = bbox.width() >= bbox.height();
    items.sort_by(|(a, _), (b, _)| {
        let (ca, cb) = if split_on_x {
            (a.center()[0], b.center()[0])
        } else {
            (a.center()[1], b.center()[1])
        };
        ca.partial_cmp(&cb).unwrap()
    });

    let mid = items.len() / 2;
    let right_items = items.split_off(mid);
    let left = build_node(items).expect("non-empty left half");
    let right = build_node(right_items).expect("non-empty right half");
    Some(Node::Branch {
        bbox,
        left: Box::new(left),
        right: Box::new(right),
    })
}

fn query_node<T: Clone>(node: &Node<T>, query_box: &Aabb2, out: &mut Vec<T>) {
    match node {
        Node::Leaf(items) => {
            for (bbox, handle) in items {
                if bbox.intersects(query_box) {
                    out.push(handle.clone());
                }
            }
        }
        Node::Branch { bbox, left, right } => {
            if !bbox.intersects(query_box) {
                return;
            }
            query_node(left, query_box, out);
            query_node(right, query_box, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn box_at(x: f64, y: f64) -> Aabb2 {
        Aabb2::new([x, y], [x + 1.0, y + 1.0])
    }

    #[test]
    fn bulk_query_finds_intersecting_boxes() {
        let items: Vec<_> = (0..100)
            .map(|i| (box_at(i as f64 * 2.0, 0.0), i))
            .collect();
        let index = SpatialIndex::bulk(items);
        let hits = index.query(Aabb2::new([9.5, -1.0], [12.5, 2.0]));
        let mut hits = hits;
        hits.sort();
        assert_eq!(hits, vec![5, 6]);
    }

    #[test]
    fn incremental_insert_then_build() {
        let mut index = SpatialIndex::new();
        for i in 0..20 {
            index.insert(box_at(i as f64, 0.0), i);
        }
        index.build();
        let hits = index.query(Aabb2::new([4.5, 0.0], [5.5, 1.0]));
        assert!(hits.contains(&4) && hits.contains(&5));
    }

    #[test]
    fn rebuild_after_more_inserts_keeps_old_items() {
        let mut index = SpatialIndex::new();
        index.insert(box_at(0.0, 0.0), "a");
        index.build();
        index.insert(box_at(5.0, 0.0), "b");
        index.build();
        let hits = index.query(Aabb2::new([-1.0, -1.0], [7.0, 2.0]));
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn empty_query_returns_nothing() {
        let index: SpatialIndex<i32> = SpatialIndex::bulk(vec![(box_at(0.0, 0.0), 1)]);
        let hits = index.query(Aabb2::new([100.0, 100.0], [101.0, 101.0]));
        assert!(hits.is_empty());
    }
}
