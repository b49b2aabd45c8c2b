use crate::board::indices::*;
use crate::geom::point::Point;
use crate::geom::polygon::Polygon;
use crate::geom::rect::Rect;
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct ModuleData {
    pub name: String,
    pub zones: Vec<ZoneId>,
    pub sockets: Vec<SocketId>,
}

/// Routing-exclusion polygon contributed by one module. Immutable after
/// extraction; only the rasterizer consumes it.
#[derive(Clone, Debug)]
pub struct KeepOutZone {
    pub module: ModuleId,
    pub outline: Polygon,
    pub margin: f64,
    /// Restricts blocking to specific copper layers. `None` blocks all.
    pub layers: Option<Vec<u8>>,
}

impl KeepOutZone {
    pub fn blocks_layer(&self, layer: u8) -> bool {
        match &self.layers {
            Some(layers) => layers.contains(&layer),
            None => true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SocketData {
    pub name: String,
    pub module: ModuleId,
    pub position: Point<f64>,
    pub net: NetId,
    /// Copper layers this pad is reachable on. Defaults to the net's
    /// candidate layers when the board description leaves it out.
    pub layers: Vec<u8>,
}

/// Board-space geometry handed to the router: keep-outs and sockets already
/// transformed out of module-local coordinates by the placement step.
pub struct BoardLayout {
    pub outline: Rect,
    pub copper_layers: u8,
    pub modules: Vec<ModuleData>,
    pub zones: Vec<KeepOutZone>,
    pub sockets: Vec<SocketData>,
    pub module_name_map: HashMap<String, ModuleId>,
}

impl BoardLayout {
    pub fn new(outline: Rect, copper_layers: u8) -> Self {
        Self {
            outline,
            copper_layers,
            modules: Vec::new(),
            zones: Vec::new(),
            sockets: Vec::new(),
            module_name_map: HashMap::new(),
        }
    }

    pub fn add_module(&mut self, name: String) -> ModuleId {
        if let Some(&id) = self.module_name_map.get(&name) {
            return id;
        }
        let id = ModuleId::new(self.modules.len());
        self.module_name_map.insert(name.clone(), id);
        self.modules.push(ModuleData {
            name,
            zones: Vec::new(),
            sockets: Vec::new(),
        });
        id
    }

    pub fn add_zone(
        &mut self,
        module: ModuleId,
        outline: Polygon,
        margin: f64,
        layers: Option<Vec<u8>>,
    ) -> ZoneId {
        let id = ZoneId::new(self.zones.len());
        self.zones.push(KeepOutZone {
            module,
            outline,
            margin,
            layers,
        });
        self.modules[module.index()].zones.push(id);
        id
    }

    pub fn add_socket(
        &mut self,
        module: ModuleId,
        name: String,
        position: Point<f64>,
        net: NetId,
        layers: Vec<u8>,
    ) -> SocketId {
        let id = SocketId::new(self.sockets.len());
        self.sockets.push(SocketData {
            name,
            module,
            position,
            net,
            layers,
        });
        self.modules[module.index()].sockets.push(id);
        id
    }
}

#[derive(Clone, Debug)]
pub struct NetDef {
    pub name: String,
    /// Ordered candidate layers; the first is the preferred routing layer.
    pub layers: Vec<u8>,
    pub sockets: Vec<SocketId>,
}

pub struct NetList {
    pub nets: Vec<NetDef>,
    pub net_name_map: HashMap<String, NetId>,
}

impl Default for NetList {
    fn default() -> Self {
        Self::new()
    }
}

impl NetList {
    pub fn new() -> Self {
        Self {
            nets: Vec::new(),
            net_name_map: HashMap::new(),
        }
    }

    pub fn add_net(&mut self, name: String, layers: Vec<u8>) -> NetId {
        if let Some(&id) = self.net_name_map.get(&name) {
            return id;
        }
        let id = NetId::new(self.nets.len());
        self.net_name_map.insert(name.clone(), id);
        self.nets.push(NetDef {
            name,
            layers,
            sockets: Vec::new(),
        });
        id
    }

    pub fn attach_socket(&mut self, net: NetId, socket: SocketId) {
        self.nets[net.index()].sockets.push(socket);
    }

    pub fn name(&self, net: NetId) -> &str {
        &self.nets[net.index()].name
    }
}

/// One polyline of copper on a single layer. Endpoints terminate at a
/// socket, a via, or a junction vertex on the same net's copper.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteSegment {
    pub net: NetId,
    pub layer: u8,
    pub points: Vec<Point<f64>>,
}

impl RouteSegment {
    pub fn spans(&self) -> impl Iterator<Item = (Point<f64>, Point<f64>)> + '_ {
        self.points.windows(2).map(|w| (w[0], w[1]))
    }

    pub fn start(&self) -> Point<f64> {
        self.points[0]
    }

    pub fn end(&self) -> Point<f64> {
        self.points[self.points.len() - 1]
    }
}

/// Layer transition drilled at a fixed board position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Via {
    pub net: NetId,
    pub position: Point<f64>,
    pub lower: u8,
    pub upper: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnroutableReason {
    /// Search exhausted every eligible layer and dimension.
    NoPath,
    /// A forced same-layer crossing with no alternate layer to escalate to.
    CrossingConflict,
}

impl UnroutableReason {
    pub fn tag(&self) -> &'static str {
        match self {
            UnroutableReason::NoPath => "no_path",
            UnroutableReason::CrossingConflict => "crossing_conflict",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PairResolution {
    Routed,
    /// Already connected transitively through earlier routes.
    AlreadyConnected,
    Unroutable(UnroutableReason),
}

/// Outcome of one socket pair attempt, reported for every pair so callers
/// can retry with relaxed constraints.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PairOutcome {
    pub net: NetId,
    pub from: SocketId,
    pub to: SocketId,
    pub resolution: PairResolution,
}

#[derive(Debug, Default, PartialEq)]
pub struct RoutingResult {
    pub segments: Vec<RouteSegment>,
    pub vias: Vec<Via>,
    pub outcomes: Vec<PairOutcome>,
}

impl RoutingResult {
    pub fn unroutable(&self) -> impl Iterator<Item = &PairOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.resolution, PairResolution::Unroutable(_)))
    }

    pub fn is_complete(&self) -> bool {
        self.unroutable().next().is_none()
    }
}
