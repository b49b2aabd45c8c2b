use super::rect::Rect;
use rstar::{AABB, RTree};

/// R-tree over rectangles keyed by an opaque id. Used to find committed
/// route spans whose extents overlap a candidate span.
pub struct SpatialIndex {
    tree: RTree<IndexedRect>,
}

#[derive(PartialEq)]
struct IndexedRect {
    rect: Rect,
    id: usize,
}

impl rstar::RTreeObject for IndexedRect {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.rect.min.x, self.rect.min.y],
            [self.rect.max.x, self.rect.max.y],
        )
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    pub fn insert(&mut self, rect: Rect, id: usize) {
        self.tree.insert(IndexedRect { rect, id });
    }

    /// Removal requires the exact rect the entry was inserted with.
    pub fn remove(&mut self, rect: Rect, id: usize) -> bool {
        self.tree.remove(&IndexedRect { rect, id }).is_some()
    }

    pub fn query(&self, rect: Rect) -> Vec<usize> {
        let aabb = AABB::from_corners([rect.min.x, rect.min.y], [rect.max.x, rect.max.y]);
        self.tree
            .locate_in_envelope_intersecting(&aabb)
            .map(|item| item.id)
            .collect()
    }
}
