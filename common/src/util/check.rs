use crate::board::core::{BoardLayout, NetList, PairResolution, RoutingResult};
use crate::board::indices::NetId;
use crate::geom::point::Point;
use crate::geom::polygon::{point_segment_distance, segments_properly_intersect};
use rayon::prelude::*;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

const CHECK_TOLERANCE: f64 = 1e-6;
const BIN_SIZE: f64 = 10.0;

/// Verifies a routing result against the board: no different-net copper
/// sharing a layer, no colliding vias, every routed net fully connected.
pub fn run(layout: &BoardLayout, nets: &NetList, result: &RoutingResult) -> Result<(), String> {
    log::info!("Starting routing verification...");

    let (shorts_result, opens_result) = rayon::join(
        || check_shorts(nets, result),
        || check_opens(layout, nets, result),
    );
    let vias_result = check_vias(nets, result);

    let mut msgs = Vec::new();
    match shorts_result {
        Err(e) => {
            log::error!("FAIL: {}", e);
            msgs.push(e);
        }
        Ok(_) => log::info!("PASS: no different-net copper overlaps."),
    }
    match vias_result {
        Err(e) => {
            log::error!("FAIL: {}", e);
            msgs.push(e);
        }
        Ok(_) => log::info!("PASS: no via collisions."),
    }
    match opens_result {
        Err(e) => {
            log::error!("FAIL: {}", e);
            msgs.push(e);
        }
        Ok(_) => log::info!("PASS: all routed nets are fully connected."),
    }

    if msgs.is_empty() {
        log::info!("Routing verification passed.");
        Ok(())
    } else {
        Err(msgs.join("; "))
    }
}

#[derive(Clone, Copy, Debug)]
struct Span {
    p1: Point<f64>,
    p2: Point<f64>,
    layer: u8,
    net: NetId,
    seg_idx: usize,
}

impl Span {
    fn touches(&self, other: &Span) -> bool {
        if self.layer != other.layer {
            return false;
        }

        let min_x1 = self.p1.x.min(self.p2.x) - CHECK_TOLERANCE;
        let max_x1 = self.p1.x.max(self.p2.x) + CHECK_TOLERANCE;
        let min_y1 = self.p1.y.min(self.p2.y) - CHECK_TOLERANCE;
        let max_y1 = self.p1.y.max(self.p2.y) + CHECK_TOLERANCE;
        let min_x2 = other.p1.x.min(other.p2.x);
        let max_x2 = other.p1.x.max(other.p2.x);
        let min_y2 = other.p1.y.min(other.p2.y);
        let max_y2 = other.p1.y.max(other.p2.y);
        if max_x1 < min_x2 || min_x1 > max_x2 || max_y1 < min_y2 || min_y1 > max_y2 {
            return false;
        }

        if segments_properly_intersect(self.p1, self.p2, other.p1, other.p2) {
            return true;
        }
        point_segment_distance(other.p1, self.p1, self.p2) < CHECK_TOLERANCE
            || point_segment_distance(other.p2, self.p1, self.p2) < CHECK_TOLERANCE
            || point_segment_distance(self.p1, other.p1, other.p2) < CHECK_TOLERANCE
            || point_segment_distance(self.p2, other.p1, other.p2) < CHECK_TOLERANCE
    }
}

#[derive(Hash, Eq, PartialEq, PartialOrd, Ord, Clone, Copy, Debug)]
struct BinKey {
    layer: u8,
    bx: i32,
    by: i32,
}

fn collect_spans(result: &RoutingResult) -> Vec<Span> {
    let mut spans = Vec::new();
    for (seg_idx, seg) in result.segments.iter().enumerate() {
        for (p1, p2) in seg.spans() {
            spans.push(Span {
                p1,
                p2,
                layer: seg.layer,
                net: seg.net,
                seg_idx,
            });
        }
    }
    spans
}

fn check_shorts(nets: &NetList, result: &RoutingResult) -> Result<(), String> {
    let spans = collect_spans(result);

    let mut bin_entries: Vec<(BinKey, Span)> = spans
        .par_iter()
        .flat_map(|&s| {
            let min_x = s.p1.x.min(s.p2.x);
            let max_x = s.p1.x.max(s.p2.x);
            let min_y = s.p1.y.min(s.p2.y);
            let max_y = s.p1.y.max(s.p2.y);

            let mut entries = Vec::new();
            for bx in (min_x / BIN_SIZE).floor() as i32..=(max_x / BIN_SIZE).floor() as i32 {
                for by in (min_y / BIN_SIZE).floor() as i32..=(max_y / BIN_SIZE).floor() as i32 {
                    entries.push((
                        BinKey {
                            layer: s.layer,
                            bx,
                            by,
                        },
                        s,
                    ));
                }
            }
            entries
        })
        .collect();

    bin_entries.par_sort_unstable_by(|a, b| a.0.cmp(&b.0));

    let mut chunks = Vec::new();
    if !bin_entries.is_empty() {
        let mut start = 0;
        for i in 1..bin_entries.len() {
            if bin_entries[i].0 != bin_entries[i - 1].0 {
                chunks.push((start, i));
                start = i;
            }
        }
        chunks.push((start, bin_entries.len()));
    }

    let error_found = AtomicBool::new(false);
    let error_msg = Arc::new(Mutex::new(String::new()));

    chunks.par_iter().for_each(|&(start, end)| {
        if error_found.load(Ordering::Relaxed) {
            return;
        }
        let slice = &bin_entries[start..end];
        for i in 0..slice.len() {
            for j in (i + 1)..slice.len() {
                let s1 = &slice[i].1;
                let s2 = &slice[j].1;
                // Same-net spans may meet at junctions and vias.
                if s1.net == s2.net {
                    continue;
                }
                if s1.touches(s2) {
                    let msg = format!(
                        "short between net '{}' and net '{}' on layer {} near ({:.3}, {:.3})",
                        nets.name(s1.net),
                        nets.name(s2.net),
                        s1.layer,
                        s1.p1.x,
                        s1.p1.y
                    );
                    if !error_found.swap(true, Ordering::Relaxed) {
                        *error_msg.lock().unwrap() = msg;
                    }
                    return;
                }
            }
        }
    });

    if error_found.load(Ordering::Relaxed) {
        Err(error_msg.lock().unwrap().clone())
    } else {
        Ok(())
    }
}

fn check_vias(nets: &NetList, result: &RoutingResult) -> Result<(), String> {
    let mut seen = HashSet::new();
    for via in &result.vias {
        let key = (
            (via.position.x / CHECK_TOLERANCE).round() as i64,
            (via.position.y / CHECK_TOLERANCE).round() as i64,
            via.lower,
            via.upper,
        );
        if !seen.insert(key) {
            return Err(format!(
                "duplicate via at ({:.3}, {:.3}) layers {}..{}",
                via.position.x, via.position.y, via.lower, via.upper
            ));
        }
    }

    // A drill position belongs to exactly one net.
    for (i, a) in result.vias.iter().enumerate() {
        for b in &result.vias[i + 1..] {
            if a.net != b.net && a.position.distance(b.position) < CHECK_TOLERANCE {
                return Err(format!(
                    "nets '{}' and '{}' share a drill at ({:.3}, {:.3})",
                    nets.name(a.net),
                    nets.name(b.net),
                    a.position.x,
                    a.position.y
                ));
            }
        }
    }

    // A foreign trace running through a drill is a short even when the
    // via's copper layers differ from the trace layer.
    let spans = collect_spans(result);
    for via in &result.vias {
        for span in &spans {
            if span.net == via.net {
                continue;
            }
            if span.layer >= via.lower
                && span.layer <= via.upper
                && point_segment_distance(via.position, span.p1, span.p2) < CHECK_TOLERANCE
            {
                return Err(format!(
                    "net '{}' trace crosses net '{}' via at ({:.3}, {:.3}) on layer {}",
                    nets.name(span.net),
                    nets.name(via.net),
                    via.position.x,
                    via.position.y,
                    span.layer
                ));
            }
        }
    }

    Ok(())
}

fn check_opens(layout: &BoardLayout, nets: &NetList, result: &RoutingResult) -> Result<(), String> {
    // Nets with reported failures are expected to be open.
    let mut skip: HashSet<NetId> = HashSet::new();
    for outcome in &result.outcomes {
        if matches!(outcome.resolution, PairResolution::Unroutable(_)) {
            skip.insert(outcome.net);
        }
    }

    let error_found = AtomicBool::new(false);
    let error_msg = Arc::new(Mutex::new(String::new()));

    nets.nets.par_iter().enumerate().for_each(|(net_idx, net)| {
        if error_found.load(Ordering::Relaxed) {
            return;
        }
        let net_id = NetId::new(net_idx);
        if net.sockets.len() < 2 || skip.contains(&net_id) {
            return;
        }

        let spans: Vec<Span> = result
            .segments
            .iter()
            .enumerate()
            .filter(|(_, seg)| seg.net == net_id)
            .flat_map(|(seg_idx, seg)| {
                seg.spans()
                    .map(move |(p1, p2)| Span {
                        p1,
                        p2,
                        layer: seg.layer,
                        net: net_id,
                        seg_idx,
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        if spans.is_empty() {
            // Every pair collapsed onto one cell; nothing to trace.
            return;
        }

        let n = spans.len();
        let mut adj = vec![Vec::new(); n];
        for i in 0..n {
            for j in (i + 1)..n {
                if spans[i].touches(&spans[j]) {
                    adj[i].push(j);
                    adj[j].push(i);
                }
            }
        }

        // Vias stitch spans together across layers at the drill position.
        for via in result.vias.iter().filter(|v| v.net == net_id) {
            let touching: Vec<usize> = (0..n)
                .filter(|&i| {
                    spans[i].layer >= via.lower
                        && spans[i].layer <= via.upper
                        && point_segment_distance(via.position, spans[i].p1, spans[i].p2)
                            < CHECK_TOLERANCE
                })
                .collect();
            for w in touching.windows(2) {
                adj[w[0]].push(w[1]);
                adj[w[1]].push(w[0]);
            }
        }

        let mut socket_spans = Vec::new();
        for &socket_id in &net.sockets {
            let socket = &layout.sockets[socket_id.index()];
            let found = (0..n).find(|&i| {
                point_segment_distance(socket.position, spans[i].p1, spans[i].p2)
                    < CHECK_TOLERANCE
            });
            match found {
                Some(i) => socket_spans.push(i),
                None => {
                    if !error_found.swap(true, Ordering::Relaxed) {
                        *error_msg.lock().unwrap() = format!(
                            "net '{}': socket '{}' at ({:.3}, {:.3}) touches no copper",
                            net.name, socket.name, socket.position.x, socket.position.y
                        );
                    }
                    return;
                }
            }
        }

        let mut visited = vec![false; n];
        let mut queue = VecDeque::new();
        visited[socket_spans[0]] = true;
        queue.push_back(socket_spans[0]);
        while let Some(u) = queue.pop_front() {
            for &v in &adj[u] {
                if !visited[v] {
                    visited[v] = true;
                    queue.push_back(v);
                }
            }
        }

        if socket_spans.iter().any(|&i| !visited[i]) {
            if !error_found.swap(true, Ordering::Relaxed) {
                *error_msg.lock().unwrap() =
                    format!("net '{}': copper is split, sockets are not all connected", net.name);
            }
        }
    });

    if error_found.load(Ordering::Relaxed) {
        Err(error_msg.lock().unwrap().clone())
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::core::{RouteSegment, Via};
    use crate::geom::rect::Rect;

    fn two_net_fixture() -> (BoardLayout, NetList) {
        let outline = Rect::new(Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        let mut layout = BoardLayout::new(outline, 2);
        let mut nets = NetList::new();
        let a = nets.add_net("A".to_string(), vec![0, 1]);
        let b = nets.add_net("B".to_string(), vec![0, 1]);
        let m = layout.add_module("m".to_string());

        for (net, name, pos) in [
            (a, "A1", Point::new(1.0, 1.0)),
            (a, "A2", Point::new(5.0, 1.0)),
            (b, "B1", Point::new(1.0, 5.0)),
            (b, "B2", Point::new(5.0, 5.0)),
        ] {
            let sid = layout.add_socket(m, name.to_string(), pos, net, vec![0, 1]);
            nets.attach_socket(net, sid);
        }
        (layout, nets)
    }

    fn seg(net: NetId, layer: u8, pts: &[(f64, f64)]) -> RouteSegment {
        RouteSegment {
            net,
            layer,
            points: pts.iter().map(|&(x, y)| Point::new(x, y)).collect(),
        }
    }

    #[test]
    fn clean_result_passes() {
        let (layout, nets) = two_net_fixture();
        let a = nets.net_name_map["A"];
        let b = nets.net_name_map["B"];
        let result = RoutingResult {
            segments: vec![
                seg(a, 0, &[(1.0, 1.0), (5.0, 1.0)]),
                seg(b, 0, &[(1.0, 5.0), (5.0, 5.0)]),
            ],
            vias: Vec::new(),
            outcomes: Vec::new(),
        };
        assert!(run(&layout, &nets, &result).is_ok());
    }

    #[test]
    fn crossing_nets_fail() {
        let (layout, nets) = two_net_fixture();
        let a = nets.net_name_map["A"];
        let b = nets.net_name_map["B"];
        let result = RoutingResult {
            segments: vec![
                seg(a, 0, &[(1.0, 1.0), (5.0, 5.0)]),
                seg(b, 0, &[(1.0, 5.0), (5.0, 1.0)]),
            ],
            vias: Vec::new(),
            outcomes: Vec::new(),
        };
        let err = run(&layout, &nets, &result).unwrap_err();
        assert!(err.contains("short"));
    }

    #[test]
    fn crossing_on_different_layers_passes_shorts() {
        let (_, nets) = two_net_fixture();
        let a = nets.net_name_map["A"];
        let b = nets.net_name_map["B"];
        let result = RoutingResult {
            segments: vec![
                seg(a, 0, &[(1.0, 1.0), (5.0, 5.0)]),
                seg(b, 1, &[(1.0, 5.0), (5.0, 1.0)]),
            ],
            vias: Vec::new(),
            outcomes: Vec::new(),
        };
        assert!(check_shorts(&nets, &result).is_ok());
    }

    #[test]
    fn split_net_fails_opens() {
        let (layout, nets) = two_net_fixture();
        let a = nets.net_name_map["A"];
        let result = RoutingResult {
            segments: vec![
                seg(a, 0, &[(1.0, 1.0), (2.0, 1.0)]),
                seg(a, 0, &[(4.0, 1.0), (5.0, 1.0)]),
            ],
            vias: Vec::new(),
            outcomes: Vec::new(),
        };
        assert!(check_opens(&layout, &nets, &result).is_err());
    }

    #[test]
    fn via_stitches_layers_for_opens() {
        let (layout, nets) = two_net_fixture();
        let a = nets.net_name_map["A"];
        let result = RoutingResult {
            segments: vec![
                seg(a, 0, &[(1.0, 1.0), (3.0, 1.0)]),
                seg(a, 1, &[(3.0, 1.0), (5.0, 1.0)]),
            ],
            vias: vec![
                Via {
                    net: a,
                    position: Point::new(3.0, 1.0),
                    lower: 0,
                    upper: 1,
                },
                Via {
                    net: a,
                    position: Point::new(5.0, 1.0),
                    lower: 0,
                    upper: 1,
                },
            ],
            outcomes: Vec::new(),
        };
        assert!(check_opens(&layout, &nets, &result).is_ok());
    }

    #[test]
    fn duplicate_vias_fail() {
        let (_, nets) = two_net_fixture();
        let a = nets.net_name_map["A"];
        let result = RoutingResult {
            segments: Vec::new(),
            vias: vec![
                Via {
                    net: a,
                    position: Point::new(3.0, 1.0),
                    lower: 0,
                    upper: 1,
                },
                Via {
                    net: a,
                    position: Point::new(3.0, 1.0),
                    lower: 0,
                    upper: 1,
                },
            ],
            outcomes: Vec::new(),
        };
        assert!(check_vias(&nets, &result).is_err());
    }
}
