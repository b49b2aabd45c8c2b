use crate::utils::conversion::GridConverter;
use pcb_common::board::core::{BoardLayout, NetList};
use pcb_common::board::indices::{NetId, SocketId};
use pcb_common::geom::coord::GridCoord;
use priority_queue::PriorityQueue;
use std::cmp::Reverse;
use std::collections::HashMap;

/// Disjoint-set over dense indices, path-halving find and union by rank.
pub struct UnionFind {
    parent: Vec<u32>,
    rank: Vec<u8>,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n as u32).collect(),
            rank: vec![0; n],
        }
    }

    pub fn find(&mut self, mut x: u32) -> u32 {
        while self.parent[x as usize] != x {
            let grand = self.parent[self.parent[x as usize] as usize];
            self.parent[x as usize] = grand;
            x = grand;
        }
        x
    }

    pub fn union(&mut self, a: u32, b: u32) -> bool {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return false;
        }
        if self.rank[ra as usize] > self.rank[rb as usize] {
            self.parent[rb as usize] = ra;
        } else {
            self.parent[ra as usize] = rb;
            if self.rank[ra as usize] == self.rank[rb as usize] {
                self.rank[rb as usize] += 1;
            }
        }
        true
    }

    pub fn connected(&mut self, a: u32, b: u32) -> bool {
        self.find(a) == self.find(b)
    }
}

/// One socket pair to attempt, with its ordering keys precomputed.
#[derive(Clone, Copy, Debug)]
pub struct SocketPair {
    pub net: NetId,
    pub a: SocketId,
    pub b: SocketId,
    pub cost: u64,
    pub tie: u64,
}

/// Octile distance in integer-scaled step costs (straight 1000, diagonal 1414).
pub fn octile_cost(a: GridCoord, b: GridCoord) -> u64 {
    let dx = (a.x as i64 - b.x as i64).unsigned_abs();
    let dy = (a.y as i64 - b.y as i64).unsigned_abs();
    1000 * dx.max(dy) + 414 * dx.min(dy)
}

fn pair_key(p: &SocketPair) -> (u64, u64, u32, u32) {
    (p.cost, p.tie, p.a.0, p.b.0)
}

/// Builds the global routing order: same-net sockets cluster via union-find
/// under the clustering radius; groups are visited nearest-internal-pair
/// first; inside a group, pairs go nearest first with the lower combined
/// coordinate sum breaking ties. Pairs that bridge two groups of one net
/// come last. Skipping pairs already connected is the caller's job.
pub fn order_pairs(
    layout: &BoardLayout,
    nets: &NetList,
    conv: &GridConverter,
    clustering_radius: f64,
) -> Vec<SocketPair> {
    struct Group {
        pairs: Vec<SocketPair>,
    }

    let mut groups: Vec<Group> = Vec::new();
    let mut queue: PriorityQueue<usize, Reverse<(u64, u64, u32, u32)>> = PriorityQueue::new();
    let mut bridges: Vec<SocketPair> = Vec::new();

    for (net_idx, net) in nets.nets.iter().enumerate() {
        if net.sockets.len() < 2 {
            continue;
        }
        let net_id = NetId::new(net_idx);
        let positions: Vec<_> = net
            .sockets
            .iter()
            .map(|s| layout.sockets[s.index()].position)
            .collect();
        let cells: Vec<GridCoord> = positions.iter().map(|&p| conv.to_grid(p, 0)).collect();

        let mut uf = UnionFind::new(net.sockets.len());
        for i in 0..net.sockets.len() {
            for j in (i + 1)..net.sockets.len() {
                if positions[i].distance(positions[j]) <= clustering_radius {
                    uf.union(i as u32, j as u32);
                }
            }
        }

        let mut net_groups: HashMap<u32, Vec<SocketPair>> = HashMap::new();
        for i in 0..net.sockets.len() {
            for j in (i + 1)..net.sockets.len() {
                let (a, b) = if net.sockets[i] <= net.sockets[j] {
                    (net.sockets[i], net.sockets[j])
                } else {
                    (net.sockets[j], net.sockets[i])
                };
                let pair = SocketPair {
                    net: net_id,
                    a,
                    b,
                    cost: octile_cost(cells[i], cells[j]),
                    tie: (cells[i].x + cells[i].y + cells[j].x + cells[j].y) as u64,
                };
                if uf.connected(i as u32, j as u32) {
                    net_groups.entry(uf.find(i as u32)).or_default().push(pair);
                } else {
                    bridges.push(pair);
                }
            }
        }

        for (_, mut pairs) in net_groups {
            pairs.sort_by_key(pair_key);
            let nearest = pair_key(&pairs[0]);
            let group_idx = groups.len();
            groups.push(Group { pairs });
            queue.push(group_idx, Reverse(nearest));
        }
    }

    let mut ordered = Vec::new();
    while let Some((group_idx, _)) = queue.pop() {
        ordered.extend(groups[group_idx].pairs.iter().copied());
    }
    bridges.sort_by_key(pair_key);
    ordered.extend(bridges);
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcb_common::geom::point::Point;
    use pcb_common::geom::rect::Rect;

    #[test]
    fn union_find_groups_transitively() {
        let mut uf = UnionFind::new(5);
        uf.union(0, 1);
        uf.union(1, 2);
        assert!(uf.connected(0, 2));
        assert!(!uf.connected(0, 3));
        assert!(uf.union(3, 4));
        assert!(!uf.union(3, 4));
    }

    #[test]
    fn octile_matches_move_costs() {
        let a = GridCoord::new(0, 0, 0);
        assert_eq!(octile_cost(a, GridCoord::new(5, 0, 0)), 5000);
        assert_eq!(octile_cost(a, GridCoord::new(3, 3, 0)), 3000 + 3 * 414);
        assert_eq!(octile_cost(a, GridCoord::new(4, 2, 0)), 4000 + 2 * 414);
    }

    fn fixture(socket_positions: &[(&str, f64, f64)]) -> (BoardLayout, NetList, GridConverter) {
        let outline = Rect::new(Point::new(0.0, 0.0), Point::new(100.0, 100.0));
        let mut layout = BoardLayout::new(outline, 2);
        let mut nets = NetList::new();
        let module = layout.add_module("m".to_string());
        for (i, &(net_name, x, y)) in socket_positions.iter().enumerate() {
            let net = nets.add_net(net_name.to_string(), vec![0]);
            let sid = layout.add_socket(
                module,
                format!("S{}", i),
                Point::new(x, y),
                net,
                vec![0],
            );
            nets.attach_socket(net, sid);
        }
        let conv = GridConverter::new(outline, 1.0);
        (layout, nets, conv)
    }

    #[test]
    fn nearest_pair_routes_first() {
        let (layout, nets, conv) = fixture(&[
            ("A", 0.0, 0.0),
            ("A", 50.0, 0.0),
            ("B", 0.0, 10.0),
            ("B", 5.0, 10.0),
        ]);
        let pairs = order_pairs(&layout, &nets, &conv, 100.0);
        assert_eq!(pairs.len(), 2);
        // B's sockets are 5 apart, A's 50 apart: B goes first.
        assert_eq!(nets.name(pairs[0].net), "B");
        assert_eq!(nets.name(pairs[1].net), "A");
    }

    #[test]
    fn equal_distances_break_on_coordinate_sum() {
        let (layout, nets, conv) = fixture(&[
            ("A", 20.0, 20.0),
            ("A", 25.0, 20.0),
            ("A", 20.0, 10.0),
            ("A", 25.0, 10.0),
        ]);
        let pairs = order_pairs(&layout, &nets, &conv, 100.0);
        // Both horizontal pairs are 5 apart; the lower-sum pair leads.
        assert_eq!(pairs[0].tie, 20 + 10 + 25 + 10);
    }

    #[test]
    fn distant_clusters_bridge_last() {
        let (layout, nets, conv) = fixture(&[
            ("A", 0.0, 0.0),
            ("A", 2.0, 0.0),
            ("A", 90.0, 0.0),
            ("A", 92.0, 0.0),
        ]);
        let pairs = order_pairs(&layout, &nets, &conv, 10.0);
        assert_eq!(pairs.len(), 6);
        // Two intra-cluster pairs first, four bridges after.
        assert!(pairs[0].cost <= pairs[1].cost);
        assert_eq!(pairs[0].cost, 2000);
        assert_eq!(pairs[1].cost, 2000);
        assert!(pairs[2..].iter().all(|p| p.cost >= 88_000));
    }

    #[test]
    fn ordering_is_deterministic() {
        let sockets = [
            ("A", 1.0, 1.0),
            ("A", 9.0, 4.0),
            ("B", 3.0, 3.0),
            ("B", 6.0, 8.0),
            ("A", 4.0, 7.0),
        ];
        let (layout, nets, conv) = fixture(&sockets);
        let first = order_pairs(&layout, &nets, &conv, 100.0);
        for _ in 0..5 {
            let again = order_pairs(&layout, &nets, &conv, 100.0);
            let keys: Vec<_> = again.iter().map(|p| (p.net, p.a, p.b)).collect();
            let base: Vec<_> = first.iter().map(|p| (p.net, p.a, p.b)).collect();
            assert_eq!(keys, base);
        }
    }
}
