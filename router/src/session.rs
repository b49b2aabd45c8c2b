use crate::algo::astar::{AStar, COST_STRAIGHT, PathQuery, WINDOW_MARGIN};
use crate::cluster::{self, SocketPair, UnionFind};
use crate::consolidate;
use crate::grid::{DenseGrid, RoutingGrid};
use crate::intersect::{Conflict, SegmentStore};
use crate::raster;
use crate::utils::conversion::GridConverter;
use pcb_common::board::core::{
    BoardLayout, NetList, PairOutcome, PairResolution, RoutingResult, UnroutableReason, Via,
};
use pcb_common::board::indices::NetId;
use pcb_common::error::RouteError;
use pcb_common::geom::coord::GridCoord;
use pcb_common::util::config::{DiagonalMovement, RouterConfig};
use std::collections::HashSet;
use std::time::Instant;

enum AttemptResult {
    Routed,
    NoPath,
    Conflict,
}

/// All mutable state of one routing job: the shared grid, the committed
/// segment set, vias, and per-pair outcomes. Nets are routed strictly
/// sequentially; acceptance of a path is atomic.
pub struct RoutingSession<'a> {
    layout: &'a BoardLayout,
    nets: &'a NetList,
    config: &'a RouterConfig,
    conv: GridConverter,
    grid: DenseGrid,
    solver: AStar,
    store: SegmentStore,
    vias: Vec<Via>,
    via_keys: HashSet<(u32, u32, u8, u8)>,
    net_via_xy: Vec<HashSet<(u32, u32)>>,
    net_socket_xy: Vec<HashSet<(u32, u32)>>,
    committed_spans: Vec<HashSet<(GridCoord, GridCoord)>>,
    socket_cells: Vec<GridCoord>,
    connectivity: UnionFind,
    outcomes: Vec<PairOutcome>,
}

impl<'a> RoutingSession<'a> {
    pub fn new(
        layout: &'a BoardLayout,
        nets: &'a NetList,
        config: &'a RouterConfig,
    ) -> Result<Self, RouteError> {
        validate_layers(layout, nets)?;

        let conv = GridConverter::new(layout.outline, config.grid_resolution);
        let mut grid = DenseGrid::new(
            conv.grid_width(),
            conv.grid_height(),
            layout.copper_layers,
        );
        log::info!(
            "Routing grid: {}x{} cells, {} layers (resolution {:.3})",
            conv.grid_width(),
            conv.grid_height(),
            layout.copper_layers,
            config.grid_resolution
        );

        raster::rasterize_keep_outs(&mut grid, &conv, &layout.zones, config.margin)?;

        let mut session = Self {
            layout,
            nets,
            config,
            grid,
            solver: AStar::new(),
            store: SegmentStore::new(),
            vias: Vec::new(),
            via_keys: HashSet::new(),
            net_via_xy: vec![HashSet::new(); nets.nets.len()],
            net_socket_xy: vec![HashSet::new(); nets.nets.len()],
            committed_spans: vec![HashSet::new(); nets.nets.len()],
            socket_cells: Vec::new(),
            connectivity: UnionFind::new(layout.sockets.len()),
            outcomes: Vec::new(),
            conv,
        };
        session.place_sockets()?;
        Ok(session)
    }

    /// Registers socket anchors and clearance halos. The anchor cell stays
    /// walkable for its own net even inside a keep-out; a foreign anchor
    /// inside another net's clearance is a fatal geometry conflict.
    fn place_sockets(&mut self) -> Result<(), RouteError> {
        for socket in &self.layout.sockets {
            let cell = self.conv.to_grid(socket.position, 0);
            self.socket_cells.push(cell);
            self.net_socket_xy[socket.net.index()].insert((cell.x, cell.y));

            for &layer in socket_layers(socket, self.nets) {
                let coord = cell.on_layer(layer);
                if let Some(owner) = self.grid.anchor(coord) {
                    if owner != socket.net {
                        return Err(RouteError::InvalidGeometry(format!(
                            "socket '{}' of net '{}' lands on a pad of net '{}'",
                            socket.name,
                            self.nets.name(socket.net),
                            self.nets.name(owner)
                        )));
                    }
                }
                if let Some(owner) = self.grid.occupant(coord) {
                    if owner != socket.net {
                        return Err(RouteError::InvalidGeometry(format!(
                            "socket '{}' of net '{}' lies inside the clearance of net '{}'",
                            socket.name,
                            self.nets.name(socket.net),
                            self.nets.name(owner)
                        )));
                    }
                }
                self.grid.register_anchor(coord, socket.net);
                self.grid.reserve(coord, socket.net)?;
            }
        }

        let halo = self.conv.cells_for(self.config.socket_clearance) as i64;
        for idx in 0..self.layout.sockets.len() {
            let socket = &self.layout.sockets[idx];
            let cell = self.socket_cells[idx];
            for &layer in socket_layers(socket, self.nets) {
                for dy in (1 - halo)..halo {
                    for dx in (1 - halo)..halo {
                        let x = cell.x as i64 + dx;
                        let y = cell.y as i64 + dy;
                        if x < 0 || y < 0 {
                            continue;
                        }
                        let coord = GridCoord::new(x as u32, y as u32, layer);
                        match self.grid.anchor(coord) {
                            Some(owner) if owner != socket.net => {
                                return Err(RouteError::InvalidGeometry(format!(
                                    "a pad of net '{}' lies inside the clearance of net '{}'",
                                    self.nets.name(owner),
                                    self.nets.name(socket.net)
                                )));
                            }
                            Some(_) => continue,
                            None => {}
                        }
                        match self.grid.occupant(coord) {
                            None => {
                                if !self.grid.is_blocked(coord) {
                                    self.grid.reserve(coord, socket.net)?;
                                }
                            }
                            Some(owner) if owner != socket.net => {
                                // Contested strip between two nets' pads:
                                // neither may route through it.
                                self.grid.set_blocked(coord);
                            }
                            Some(_) => {}
                        }
                    }
                }
            }
        }
        Ok(())
    }

    pub fn run(&mut self) -> Result<RoutingResult, RouteError> {
        let start_time = Instant::now();
        let pairs = cluster::order_pairs(
            self.layout,
            self.nets,
            &self.conv,
            self.config.clustering_radius,
        );
        log::info!("Routing {} socket pairs...", pairs.len());

        for pair in &pairs {
            let resolution = self.route_pair(pair)?;
            if let PairResolution::Unroutable(reason) = resolution {
                log::warn!(
                    "net '{}': sockets {} and {} unroutable ({})",
                    self.nets.name(pair.net),
                    pair.a,
                    pair.b,
                    reason.tag()
                );
            }
            self.outcomes.push(PairOutcome {
                net: pair.net,
                from: pair.a,
                to: pair.b,
                resolution,
            });
        }

        let result = RoutingResult {
            segments: std::mem::take(&mut self.store).into_segments(),
            vias: std::mem::take(&mut self.vias),
            outcomes: std::mem::take(&mut self.outcomes),
        };
        let failed = result.unroutable().count();
        log::info!(
            "Routing done: {} segments, {} vias, {} unroutable pairs, {:.2}s",
            result.segments.len(),
            result.vias.len(),
            failed,
            start_time.elapsed().as_secs_f32()
        );
        Ok(result)
    }

    fn route_pair(&mut self, pair: &SocketPair) -> Result<PairResolution, RouteError> {
        if self.connectivity.connected(pair.a.0, pair.b.0) {
            return Ok(PairResolution::AlreadyConnected);
        }

        let net_def = &self.nets.nets[pair.net.index()];
        let socket_a = &self.layout.sockets[pair.a.index()];
        let socket_b = &self.layout.sockets[pair.b.index()];

        let mask = layer_mask(&net_def.layers)
            & layer_mask(socket_layers(socket_a, self.nets))
            & layer_mask(socket_layers(socket_b, self.nets));
        let preferred = net_def
            .layers
            .iter()
            .copied()
            .find(|&l| mask & (1u64 << l) != 0);
        let preferred = match preferred {
            Some(l) => l,
            None => {
                log::warn!(
                    "net '{}': sockets {} and {} share no eligible layer",
                    self.nets.name(pair.net),
                    pair.a,
                    pair.b
                );
                return Ok(PairResolution::Unroutable(UnroutableReason::NoPath));
            }
        };

        let start = self.socket_cells[pair.a.index()].on_layer(preferred);
        let goal = self.socket_cells[pair.b.index()].on_layer(preferred);
        let via_cost = (self.config.via_penalty * COST_STRAIGHT as f64) as i64;
        let escalatable = mask.count_ones() > 1;

        let planar = PathQuery {
            net: pair.net,
            layer_mask: 1u64 << preferred,
            diagonal: self.config.diagonal_movement,
            via_cost,
        };
        match self.attempt(&planar, start, goal, pair)? {
            AttemptResult::Routed => return Ok(PairResolution::Routed),
            AttemptResult::NoPath if !escalatable => {
                return Ok(PairResolution::Unroutable(UnroutableReason::NoPath));
            }
            AttemptResult::Conflict if !escalatable => {
                return Ok(PairResolution::Unroutable(UnroutableReason::CrossingConflict));
            }
            // 2D failed but more layers are eligible: escalate.
            AttemptResult::NoPath | AttemptResult::Conflict => {}
        }

        // Layer-stack escalation. Lateral moves stay 4-directional here.
        let stacked = PathQuery {
            net: pair.net,
            layer_mask: mask,
            diagonal: DiagonalMovement::Never,
            via_cost,
        };
        match self.attempt(&stacked, start, goal, pair)? {
            AttemptResult::Routed => Ok(PairResolution::Routed),
            AttemptResult::NoPath => Ok(PairResolution::Unroutable(UnroutableReason::NoPath)),
            AttemptResult::Conflict => {
                Ok(PairResolution::Unroutable(UnroutableReason::CrossingConflict))
            }
        }
    }

    fn attempt(
        &mut self,
        query: &PathQuery,
        start: GridCoord,
        goal: GridCoord,
        pair: &SocketPair,
    ) -> Result<AttemptResult, RouteError> {
        let path = self
            .solver
            .find_path(&self.grid, query, start, goal, WINDOW_MARGIN)
            .or_else(|| self.solver.find_path(&self.grid, query, start, goal, u32::MAX));
        let path = match path {
            Some(p) => p,
            None => return Ok(AttemptResult::NoPath),
        };
        self.try_commit(pair, &path)
    }

    /// Atomic path acceptance: consolidate, resolve against committed
    /// copper, then either commit everything or leave the session untouched.
    fn try_commit(
        &mut self,
        pair: &SocketPair,
        path: &[GridCoord],
    ) -> Result<AttemptResult, RouteError> {
        let net = pair.net;

        // Drop spans this net already owns; the rest split into fresh runs.
        let mut sub_paths: Vec<Vec<GridCoord>> = Vec::new();
        let mut current: Vec<GridCoord> = Vec::new();
        for step in path.windows(2) {
            let key = GridCoord::span_key(step[0], step[1]);
            if self.committed_spans[net.index()].contains(&key) {
                if current.len() >= 2 {
                    sub_paths.push(std::mem::take(&mut current));
                }
            } else {
                if current.is_empty() {
                    current.push(step[0]);
                }
                current.push(step[1]);
            }
        }
        if current.len() >= 2 {
            sub_paths.push(current);
        }

        let candidates: Vec<_> = sub_paths
            .iter()
            .map(|p| consolidate::consolidate(net, p, &self.conv))
            .collect();

        for consolidated in &candidates {
            for segment in &consolidated.segments {
                if let Some(conflict) = self.store.check(segment) {
                    match conflict {
                        Conflict::Crossing { other, at } => log::debug!(
                            "net '{}' crosses net '{}' at ({:.2}, {:.2}); escalating",
                            self.nets.name(net),
                            self.nets.name(other),
                            at.x,
                            at.y
                        ),
                        Conflict::Overlap { other } => log::debug!(
                            "net '{}' overlaps net '{}'; escalating",
                            self.nets.name(net),
                            self.nets.name(other)
                        ),
                    }
                    return Ok(AttemptResult::Conflict);
                }
            }
        }

        // Point of no return: reserve cells, commit vias and segments.
        for &cell in path {
            self.grid.reserve(cell, net)?;
        }

        for (sub_path, consolidated) in sub_paths.iter().zip(&candidates) {
            for step in sub_path.windows(2) {
                self.committed_spans[net.index()]
                    .insert(GridCoord::span_key(step[0], step[1]));
            }

            for via in &consolidated.vias {
                let cell = self.conv.to_grid(via.position, via.lower);
                let key = (cell.x, cell.y, via.lower, via.upper);
                if !self.via_keys.insert(key) {
                    continue;
                }
                self.vias.push(*via);
                self.net_via_xy[net.index()].insert((cell.x, cell.y));
                self.grid.set_via(cell);
                self.grid.set_via(cell.on_layer(via.upper));
                self.reserve_via_clearance(cell, via.upper, net)?;
            }

            for segment in &consolidated.segments {
                for endpoint in [segment.start(), segment.end()] {
                    let g = self.conv.to_grid(endpoint, segment.layer);
                    let xy = (g.x, g.y);
                    if self.net_socket_xy[net.index()].contains(&xy)
                        || self.net_via_xy[net.index()].contains(&xy)
                    {
                        continue;
                    }
                    // Terminates mid-way on this net's own copper: split the
                    // committed segment there so no endpoint dangles.
                    self.store.split_for_junction(net, segment.layer, endpoint);
                }
                self.store.insert(segment.clone());
            }
        }

        self.connectivity.union(pair.a.0, pair.b.0);
        Ok(AttemptResult::Routed)
    }

    /// One-cell clearance ring claimed around a fresh via on both of its
    /// layers, so later nets cannot crowd the drill.
    fn reserve_via_clearance(
        &mut self,
        cell: GridCoord,
        upper: u8,
        net: NetId,
    ) -> Result<(), RouteError> {
        for layer in [cell.layer, upper] {
            for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    let x = cell.x as i64 + dx;
                    let y = cell.y as i64 + dy;
                    if x < 0 || y < 0 {
                        continue;
                    }
                    let coord = GridCoord::new(x as u32, y as u32, layer);
                    if coord.x >= self.grid.width() || coord.y >= self.grid.height() {
                        continue;
                    }
                    if self.grid.occupant(coord).is_none() && !self.grid.is_blocked(coord) {
                        self.grid.reserve(coord, net)?;
                    }
                }
            }
        }
        Ok(())
    }
}

fn socket_layers<'n>(
    socket: &'n pcb_common::board::core::SocketData,
    nets: &'n NetList,
) -> &'n [u8] {
    if socket.layers.is_empty() {
        &nets.nets[socket.net.index()].layers
    } else {
        &socket.layers
    }
}

fn layer_mask(layers: &[u8]) -> u64 {
    layers
        .iter()
        .filter(|&&l| l < 64)
        .fold(0u64, |mask, &l| mask | (1u64 << l))
}

fn validate_layers(layout: &BoardLayout, nets: &NetList) -> Result<(), RouteError> {
    if layout.copper_layers == 0 {
        return Err(RouteError::Configuration(
            "board has no copper layers".to_string(),
        ));
    }
    for net in &nets.nets {
        if net.sockets.len() < 2 {
            continue;
        }
        if net.layers.is_empty() {
            return Err(RouteError::Configuration(format!(
                "net '{}' has no eligible layers",
                net.name
            )));
        }
        for &layer in &net.layers {
            if layer >= layout.copper_layers {
                return Err(RouteError::Configuration(format!(
                    "net '{}' references layer {} but the board has {} layers",
                    net.name, layer, layout.copper_layers
                )));
            }
        }
    }
    for socket in &layout.sockets {
        for &layer in &socket.layers {
            if layer >= layout.copper_layers {
                return Err(RouteError::Configuration(format!(
                    "socket '{}' references layer {} but the board has {} layers",
                    socket.name, layer, layout.copper_layers
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcb_common::geom::point::Point;
    use pcb_common::geom::polygon::Polygon;
    use pcb_common::geom::rect::Rect;
    use pcb_common::util::check;

    fn config() -> RouterConfig {
        RouterConfig {
            grid_resolution: 1.0,
            margin: 0.0,
            diagonal_movement: DiagonalMovement::Never,
            clustering_radius: 10.0,
            via_penalty: 10.0,
            socket_clearance: 0.5,
        }
    }

    struct Builder {
        layout: BoardLayout,
        nets: NetList,
    }

    impl Builder {
        fn new(width: f64, height: f64, copper_layers: u8) -> Self {
            let outline = Rect::new(Point::new(0.0, 0.0), Point::new(width, height));
            let mut layout = BoardLayout::new(outline, copper_layers);
            layout.add_module("m".to_string());
            Self {
                layout,
                nets: NetList::new(),
            }
        }

        fn net(&mut self, name: &str, layers: &[u8]) -> NetId {
            self.nets.add_net(name.to_string(), layers.to_vec())
        }

        fn socket(&mut self, net: NetId, x: f64, y: f64) {
            let module = pcb_common::board::indices::ModuleId::new(0);
            let id = self.layout.add_socket(
                module,
                format!("S{}", self.layout.sockets.len()),
                Point::new(x, y),
                net,
                Vec::new(),
            );
            self.nets.attach_socket(net, id);
        }

        fn wall(&mut self, x1: f64, x2: f64, height: f64, layers: Option<Vec<u8>>) {
            let module = pcb_common::board::indices::ModuleId::new(0);
            self.layout.add_zone(
                module,
                Polygon::new(vec![
                    Point::new(x1, 0.0),
                    Point::new(x2, 0.0),
                    Point::new(x2, height),
                    Point::new(x1, height),
                ]),
                0.0,
                layers,
            );
        }

        fn route(&self, config: &RouterConfig) -> Result<RoutingResult, RouteError> {
            crate::route(&self.layout, &self.nets, config)
        }
    }

    #[test]
    fn straight_pair_yields_one_segment() {
        let mut b = Builder::new(6.0, 2.0, 1);
        let a = b.net("A", &[0]);
        b.socket(a, 0.0, 0.0);
        b.socket(a, 5.0, 0.0);

        let result = b.route(&config()).unwrap();
        assert_eq!(result.vias.len(), 0);
        assert_eq!(result.segments.len(), 1);
        assert_eq!(
            result.segments[0].points,
            vec![Point::new(0.0, 0.0), Point::new(5.0, 0.0)]
        );
        assert_eq!(result.outcomes.len(), 1);
        assert_eq!(result.outcomes[0].resolution, PairResolution::Routed);
        assert!(result.is_complete());
    }

    #[test]
    fn wall_forces_escalation_with_two_vias() {
        let mut b = Builder::new(7.0, 2.0, 2);
        let a = b.net("A", &[0, 1]);
        b.socket(a, 0.0, 1.0);
        b.socket(a, 6.0, 1.0);
        // Full-height wall on layer 0 only; layer 1 stays open.
        b.wall(2.0, 3.0, 2.0, Some(vec![0]));

        let result = b.route(&config()).unwrap();
        assert!(result.is_complete());
        assert_eq!(result.vias.len(), 2);
        assert_eq!(result.segments.len(), 3);

        let mut layers: Vec<u8> = result.segments.iter().map(|s| s.layer).collect();
        layers.sort_unstable();
        assert_eq!(layers, vec![0, 0, 1]);
        for via in &result.vias {
            assert_eq!((via.lower, via.upper), (0, 1));
        }
    }

    #[test]
    fn different_layer_crossing_needs_no_via() {
        let mut b = Builder::new(7.0, 5.0, 2);
        let a = b.net("A", &[0]);
        b.socket(a, 1.0, 2.0);
        b.socket(a, 5.0, 2.0);
        let bb = b.net("B", &[1]);
        b.socket(bb, 3.0, 0.0);
        b.socket(bb, 3.0, 4.0);

        let result = b.route(&config()).unwrap();
        assert!(result.is_complete());
        assert_eq!(result.vias.len(), 0);
        assert_eq!(result.segments.len(), 2);

        let seg_a = result.segments.iter().find(|s| s.net == a).unwrap();
        assert_eq!(seg_a.points, vec![Point::new(1.0, 2.0), Point::new(5.0, 2.0)]);
        let seg_b = result.segments.iter().find(|s| s.net == bb).unwrap();
        assert_eq!(seg_b.points, vec![Point::new(3.0, 0.0), Point::new(3.0, 4.0)]);
    }

    #[test]
    fn blocked_crossing_without_alternate_layer_is_unroutable() {
        // Net A routes first (shorter pair) and walls off the full board
        // width on layer 0; B has no second layer to escape to.
        let mut b = Builder::new(5.0, 6.0, 2);
        let a = b.net("A", &[0]);
        b.socket(a, 0.0, 3.0);
        b.socket(a, 5.0, 3.0);
        let bb = b.net("B", &[0]);
        b.socket(bb, 2.0, 0.0);
        b.socket(bb, 2.0, 6.0);

        let result = b.route(&config()).unwrap();
        assert!(!result.is_complete());
        let failed: Vec<_> = result.unroutable().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].net, bb);
    }

    #[test]
    fn blocked_crossing_escalates_when_layer_available() {
        let mut b = Builder::new(5.0, 6.0, 2);
        let a = b.net("A", &[0]);
        b.socket(a, 0.0, 3.0);
        b.socket(a, 5.0, 3.0);
        let bb = b.net("B", &[0, 1]);
        b.socket(bb, 2.0, 0.0);
        b.socket(bb, 2.0, 6.0);

        let result = b.route(&config()).unwrap();
        assert!(result.is_complete());
        assert_eq!(result.vias.len(), 2);
        assert!(result.vias.iter().all(|v| v.net == bb));
    }

    #[test]
    fn diagonal_cross_is_caught_by_the_resolver() {
        let mut cfg = config();
        cfg.diagonal_movement = DiagonalMovement::Always;

        // A's diagonal spans the whole board, so any route for B must cross
        // it geometrically even though no grid cell is shared.
        let mut b = Builder::new(4.0, 4.0, 1);
        let a = b.net("A", &[0]);
        b.socket(a, 0.0, 0.0);
        b.socket(a, 4.0, 4.0);
        let bb = b.net("B", &[0]);
        b.socket(bb, 4.0, 0.0);
        b.socket(bb, 0.0, 4.0);

        let result = b.route(&cfg).unwrap();
        let failed: Vec<_> = result.unroutable().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].net, bb);
        assert_eq!(
            failed[0].resolution,
            PairResolution::Unroutable(UnroutableReason::CrossingConflict)
        );
    }

    #[test]
    fn diagonal_cross_escalates_to_other_layer() {
        let mut cfg = config();
        cfg.diagonal_movement = DiagonalMovement::Always;

        let mut b = Builder::new(4.0, 4.0, 2);
        let a = b.net("A", &[0]);
        b.socket(a, 0.0, 0.0);
        b.socket(a, 4.0, 4.0);
        let bb = b.net("B", &[0, 1]);
        b.socket(bb, 4.0, 0.0);
        b.socket(bb, 0.0, 4.0);

        let result = b.route(&cfg).unwrap();
        assert!(result.is_complete());
        assert!(result.vias.iter().all(|v| v.net == bb));
        assert!(!result.vias.is_empty());
    }

    #[test]
    fn multi_terminal_net_reuses_committed_copper() {
        let mut b = Builder::new(9.0, 5.0, 1);
        let a = b.net("A", &[0]);
        b.socket(a, 0.0, 2.0);
        b.socket(a, 4.0, 2.0);
        b.socket(a, 8.0, 2.0);

        let result = b.route(&config()).unwrap();
        assert!(result.is_complete());
        // Third pair is already connected transitively through the first two.
        assert_eq!(result.outcomes.len(), 3);
        assert_eq!(
            result
                .outcomes
                .iter()
                .filter(|o| o.resolution == PairResolution::AlreadyConnected)
                .count(),
            1
        );
        // No duplicated copper along the shared row.
        let total: f64 = result
            .segments
            .iter()
            .flat_map(|s| s.spans())
            .map(|(p, q)| p.distance(q))
            .sum();
        assert!((total - 8.0).abs() < 1e-9);
    }

    #[test]
    fn routing_is_idempotent() {
        let mut b = Builder::new(7.0, 2.0, 2);
        let a = b.net("A", &[0, 1]);
        b.socket(a, 0.0, 1.0);
        b.socket(a, 6.0, 1.0);
        b.wall(2.0, 3.0, 2.0, Some(vec![0]));

        let first = b.route(&config()).unwrap();
        let second = b.route(&config()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn zero_layer_net_is_a_configuration_error() {
        let mut b = Builder::new(5.0, 5.0, 2);
        let a = b.net("A", &[]);
        b.socket(a, 0.0, 0.0);
        b.socket(a, 4.0, 0.0);

        let err = b.route(&config()).unwrap_err();
        assert!(matches!(err, RouteError::Configuration(_)));
    }

    #[test]
    fn out_of_range_layer_is_a_configuration_error() {
        let mut b = Builder::new(5.0, 5.0, 1);
        let a = b.net("A", &[0, 1]);
        b.socket(a, 0.0, 0.0);
        b.socket(a, 4.0, 0.0);

        let err = b.route(&config()).unwrap_err();
        assert!(matches!(err, RouteError::Configuration(_)));
    }

    #[test]
    fn foreign_pad_inside_clearance_is_invalid_geometry() {
        let mut cfg = config();
        cfg.socket_clearance = 2.0;

        let mut b = Builder::new(8.0, 4.0, 1);
        let a = b.net("A", &[0]);
        b.socket(a, 2.0, 2.0);
        b.socket(a, 7.0, 2.0);
        let bb = b.net("B", &[0]);
        b.socket(bb, 3.0, 2.0);
        b.socket(bb, 7.0, 3.0);

        let err = b.route(&cfg).unwrap_err();
        assert!(matches!(err, RouteError::InvalidGeometry(_)));
    }

    #[test]
    fn socket_anchor_survives_inside_own_blocked_region() {
        // Keep-out covering the socket pad itself: the anchor cell stays
        // walkable for its own net and the route escapes the zone.
        let mut b = Builder::new(8.0, 3.0, 1);
        let a = b.net("A", &[0]);
        b.socket(a, 0.0, 1.0);
        b.socket(a, 7.0, 1.0);
        b.wall(-0.4, 0.4, 3.0, None);

        let result = b.route(&config()).unwrap();
        assert!(result.is_complete());
    }

    #[test]
    fn routed_boards_pass_verification() {
        let mut b = Builder::new(7.0, 5.0, 2);
        let a = b.net("A", &[0]);
        b.socket(a, 1.0, 2.0);
        b.socket(a, 5.0, 2.0);
        let bb = b.net("B", &[1]);
        b.socket(bb, 3.0, 0.0);
        b.socket(bb, 3.0, 4.0);

        let result = b.route(&config()).unwrap();
        check::run(&b.layout, &b.nets, &result).unwrap();
    }
}
