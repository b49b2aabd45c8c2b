use pcb_common::board::core::RouteSegment;
use pcb_common::board::indices::NetId;
use pcb_common::geom::point::Point;
use pcb_common::geom::polygon::{
    point_segment_distance, segment_intersection_point, segments_collinear_overlap,
    segments_properly_intersect,
};
use pcb_common::geom::rect::Rect;
use pcb_common::geom::rtree::SpatialIndex;

const TOUCH_EPS: f64 = 1e-6;

/// Why a candidate segment cannot join the committed set as-is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Conflict {
    /// Different nets crossing between cells on the same layer. Occupancy
    /// cannot see these: two diagonal spans may cross without sharing a cell.
    Crossing { other: NetId, at: Point<f64> },
    /// Different nets sharing collinear extent on the same layer.
    Overlap { other: NetId },
}

/// Committed segments with a spatial index per span. Retired slots stay
/// `None` so ids remain stable; output order is insertion order.
#[derive(Default)]
pub struct SegmentStore {
    slots: Vec<Option<RouteSegment>>,
    index: SpatialIndex,
}

fn span_rect(a: Point<f64>, b: Point<f64>) -> Rect {
    Rect::bounding(&[a, b]).expand(TOUCH_EPS)
}

impl SegmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, seg: RouteSegment) -> usize {
        let id = self.slots.len();
        for (a, b) in seg.spans() {
            self.index.insert(span_rect(a, b), id);
        }
        self.slots.push(Some(seg));
        id
    }

    /// Fully removes a segment; its id is never reused.
    pub fn retire(&mut self, id: usize) -> Option<RouteSegment> {
        let seg = self.slots.get_mut(id)?.take()?;
        for (a, b) in seg.spans() {
            self.index.remove(span_rect(a, b), id);
        }
        Some(seg)
    }

    pub fn get(&self, id: usize) -> Option<&RouteSegment> {
        self.slots.get(id)?.as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteSegment> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }

    pub fn into_segments(self) -> Vec<RouteSegment> {
        self.slots.into_iter().flatten().collect()
    }

    /// Checks a candidate against every committed segment on its layer.
    /// Returns the first conflict with a foreign net, or `None` when the
    /// candidate may be committed.
    pub fn check(&self, candidate: &RouteSegment) -> Option<Conflict> {
        for (ca, cb) in candidate.spans() {
            let mut hits = self.index.query(span_rect(ca, cb));
            hits.sort_unstable();
            hits.dedup();
            for id in hits {
                let other = match self.get(id) {
                    Some(seg) => seg,
                    None => continue,
                };
                if other.layer != candidate.layer || other.net == candidate.net {
                    continue;
                }
                for (oa, ob) in other.spans() {
                    if segments_collinear_overlap(ca, cb, oa, ob) {
                        return Some(Conflict::Overlap { other: other.net });
                    }
                    if segments_properly_intersect(ca, cb, oa, ob) {
                        let at = segment_intersection_point(ca, cb, oa, ob)
                            .unwrap_or(ca);
                        return Some(Conflict::Crossing {
                            other: other.net,
                            at,
                        });
                    }
                }
            }
        }
        None
    }

    /// Splits the committed segment holding `point` mid-span into two
    /// segments meeting there. The original is retired outright. No-op when
    /// the point already is a polyline vertex or no same-net segment holds it.
    pub fn split_for_junction(&mut self, net: NetId, layer: u8, point: Point<f64>) -> bool {
        let probe = Rect::new(point, point).expand(TOUCH_EPS);
        let mut hits = self.index.query(probe);
        hits.sort_unstable();
        hits.dedup();

        for id in hits {
            let seg = match self.get(id) {
                Some(seg) => seg,
                None => continue,
            };
            if seg.net != net || seg.layer != layer {
                continue;
            }
            if seg.points.iter().any(|p| p.distance(point) < TOUCH_EPS) {
                // Already a vertex; the junction needs no split.
                return false;
            }
            let span_idx = seg
                .points
                .windows(2)
                .position(|w| point_segment_distance(point, w[0], w[1]) < TOUCH_EPS);
            if let Some(i) = span_idx {
                let seg = self.retire(id).expect("segment disappeared during split");
                let mut head = seg.points[..=i].to_vec();
                head.push(point);
                let mut tail = vec![point];
                tail.extend_from_slice(&seg.points[i + 1..]);
                self.insert(RouteSegment {
                    net: seg.net,
                    layer: seg.layer,
                    points: head,
                });
                self.insert(RouteSegment {
                    net: seg.net,
                    layer: seg.layer,
                    points: tail,
                });
                return true;
            }
        }
        false
    }
}
