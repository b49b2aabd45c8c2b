use crate::utils::conversion::GridConverter;
use pcb_common::board::core::{RouteSegment, Via};
use pcb_common::board::indices::NetId;
use pcb_common::geom::coord::GridCoord;

#[derive(Debug, Default)]
pub struct ConsolidatedPath {
    pub segments: Vec<RouteSegment>,
    pub vias: Vec<Via>,
}

/// Collapses a unit-step cell path into minimal polyline segments. A new
/// segment starts at every layer change, with a via at the transition;
/// within a layer, consecutive steps sharing a direction vector merge.
/// Runs of a single cell (pure via landings) produce no segment.
pub fn consolidate(net: NetId, path: &[GridCoord], conv: &GridConverter) -> ConsolidatedPath {
    let mut out = ConsolidatedPath::default();
    if path.len() < 2 {
        return out;
    }

    let mut run: Vec<GridCoord> = vec![path[0]];
    for pair in path.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);
        if curr.layer != prev.layer {
            out.vias.push(Via {
                net,
                position: conv.to_world(prev),
                lower: prev.layer.min(curr.layer),
                upper: prev.layer.max(curr.layer),
            });
            flush_run(net, &run, conv, &mut out.segments);
            run.clear();
        }
        run.push(curr);
    }
    flush_run(net, &run, conv, &mut out.segments);
    out
}

fn flush_run(net: NetId, run: &[GridCoord], conv: &GridConverter, segments: &mut Vec<RouteSegment>) {
    if run.len() < 2 {
        return;
    }
    let mut points = vec![conv.to_world(run[0])];
    let mut direction = step_vector(run[0], run[1]);
    for pair in run.windows(2).skip(1) {
        let next_direction = step_vector(pair[0], pair[1]);
        if next_direction != direction {
            points.push(conv.to_world(pair[0]));
            direction = next_direction;
        }
    }
    points.push(conv.to_world(run[run.len() - 1]));
    segments.push(RouteSegment {
        net,
        layer: run[0].layer,
        points,
    });
}

fn step_vector(a: GridCoord, b: GridCoord) -> (i64, i64) {
    (b.x as i64 - a.x as i64, b.y as i64 - a.y as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcb_common::geom::point::Point;
    use pcb_common::geom::rect::Rect;

    fn conv() -> GridConverter {
        GridConverter::new(Rect::new(Point::new(0.0, 0.0), Point::new(20.0, 20.0)), 1.0)
    }

    fn c(x: u32, y: u32, layer: u8) -> GridCoord {
        GridCoord::new(x, y, layer)
    }

    #[test]
    fn straight_run_collapses_to_two_points() {
        let path: Vec<_> = (0..=5).map(|x| c(x, 0, 0)).collect();
        let out = consolidate(NetId::new(0), &path, &conv());
        assert_eq!(out.vias.len(), 0);
        assert_eq!(out.segments.len(), 1);
        assert_eq!(
            out.segments[0].points,
            vec![Point::new(0.0, 0.0), Point::new(5.0, 0.0)]
        );
    }

    #[test]
    fn bends_become_polyline_vertices() {
        let path = vec![c(0, 0, 0), c(1, 0, 0), c(2, 0, 0), c(2, 1, 0), c(2, 2, 0)];
        let out = consolidate(NetId::new(0), &path, &conv());
        assert_eq!(out.segments.len(), 1);
        assert_eq!(
            out.segments[0].points,
            vec![
                Point::new(0.0, 0.0),
                Point::new(2.0, 0.0),
                Point::new(2.0, 2.0)
            ]
        );
    }

    #[test]
    fn diagonal_steps_merge_like_straight_ones() {
        let path = vec![c(0, 0, 0), c(1, 1, 0), c(2, 2, 0), c(3, 2, 0)];
        let out = consolidate(NetId::new(0), &path, &conv());
        assert_eq!(out.segments.len(), 1);
        assert_eq!(
            out.segments[0].points,
            vec![
                Point::new(0.0, 0.0),
                Point::new(2.0, 2.0),
                Point::new(3.0, 2.0)
            ]
        );
    }

    #[test]
    fn layer_change_splits_and_places_via() {
        let path = vec![
            c(0, 0, 0),
            c(1, 0, 0),
            c(1, 0, 1),
            c(2, 0, 1),
            c(3, 0, 1),
            c(3, 0, 0),
            c(4, 0, 0),
        ];
        let out = consolidate(NetId::new(0), &path, &conv());

        assert_eq!(out.segments.len(), 3);
        assert_eq!(out.segments[0].layer, 0);
        assert_eq!(out.segments[1].layer, 1);
        assert_eq!(out.segments[2].layer, 0);

        assert_eq!(out.vias.len(), 2);
        assert_eq!(out.vias[0].position, Point::new(1.0, 0.0));
        assert_eq!((out.vias[0].lower, out.vias[0].upper), (0, 1));
        assert_eq!(out.vias[1].position, Point::new(3.0, 0.0));
    }

    #[test]
    fn immediate_dive_emits_no_stub_segment() {
        let path = vec![c(0, 0, 0), c(0, 0, 1), c(1, 0, 1), c(2, 0, 1)];
        let out = consolidate(NetId::new(0), &path, &conv());
        assert_eq!(out.vias.len(), 1);
        assert_eq!(out.segments.len(), 1);
        assert_eq!(out.segments[0].layer, 1);
    }

    #[test]
    fn trivial_paths_produce_nothing() {
        let out = consolidate(NetId::new(0), &[c(3, 3, 0)], &conv());
        assert!(out.segments.is_empty());
        assert!(out.vias.is_empty());
    }
}
