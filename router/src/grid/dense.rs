use super::RoutingGrid;
use pcb_common::board::indices::NetId;
use pcb_common::error::RouteError;
use pcb_common::geom::coord::GridCoord;
use std::collections::HashMap;

const NO_NET: u32 = u32::MAX;

// Packed per-cell state (8 bytes).
#[derive(Clone, Copy)]
struct CellState {
    occupant: u32,
    blocked: bool,
    via: bool,
}

impl Default for CellState {
    fn default() -> Self {
        Self {
            occupant: NO_NET,
            blocked: false,
            via: false,
        }
    }
}

pub struct DenseGrid {
    width: u32,
    height: u32,
    layers: u8,
    cells: Vec<CellState>,
    anchors: HashMap<usize, u32>,
}

impl DenseGrid {
    pub fn new(width: u32, height: u32, layers: u8) -> Self {
        let size = (width as usize) * (height as usize) * (layers as usize);
        if size > 500_000_000 {
            log::warn!(
                "Allocating large grid: {} cells. Consider a coarser resolution.",
                size
            );
        }
        Self {
            width,
            height,
            layers,
            cells: vec![CellState::default(); size],
            anchors: HashMap::new(),
        }
    }

    #[inline(always)]
    fn index(&self, coord: GridCoord) -> usize {
        (coord.layer as usize) * (self.width as usize) * (self.height as usize)
            + (coord.y as usize) * (self.width as usize)
            + (coord.x as usize)
    }

    #[inline(always)]
    fn in_bounds(&self, coord: GridCoord) -> bool {
        coord.x < self.width && coord.y < self.height && coord.layer < self.layers
    }

    pub fn blocked_count(&self) -> usize {
        self.cells.iter().filter(|c| c.blocked).count()
    }
}

impl RoutingGrid for DenseGrid {
    fn width(&self) -> u32 {
        self.width
    }
    fn height(&self) -> u32 {
        self.height
    }
    fn layers(&self) -> u8 {
        self.layers
    }

    fn set_blocked(&mut self, coord: GridCoord) {
        if self.in_bounds(coord) {
            let idx = self.index(coord);
            self.cells[idx].blocked = true;
        }
    }

    fn is_blocked(&self, coord: GridCoord) -> bool {
        if !self.in_bounds(coord) {
            return true;
        }
        self.cells[self.index(coord)].blocked
    }

    fn reserve(&mut self, coord: GridCoord, net: NetId) -> Result<(), RouteError> {
        if !self.in_bounds(coord) {
            return Err(RouteError::Occupied(coord));
        }
        let idx = self.index(coord);
        if self.cells[idx].blocked && self.anchors.get(&idx) != Some(&net.0) {
            return Err(RouteError::Occupied(coord));
        }
        let occupant = self.cells[idx].occupant;
        if occupant != NO_NET && occupant != net.0 {
            return Err(RouteError::Occupied(coord));
        }
        self.cells[idx].occupant = net.0;
        Ok(())
    }

    fn release(&mut self, coord: GridCoord) {
        if self.in_bounds(coord) {
            let idx = self.index(coord);
            self.cells[idx].occupant = NO_NET;
            self.cells[idx].via = false;
        }
    }

    fn occupant(&self, coord: GridCoord) -> Option<NetId> {
        if !self.in_bounds(coord) {
            return None;
        }
        let occupant = self.cells[self.index(coord)].occupant;
        if occupant == NO_NET {
            None
        } else {
            Some(NetId(occupant))
        }
    }

    fn set_via(&mut self, coord: GridCoord) {
        if self.in_bounds(coord) {
            let idx = self.index(coord);
            self.cells[idx].via = true;
        }
    }

    fn is_via(&self, coord: GridCoord) -> bool {
        self.in_bounds(coord) && self.cells[self.index(coord)].via
    }

    fn register_anchor(&mut self, coord: GridCoord, net: NetId) {
        if self.in_bounds(coord) {
            let idx = self.index(coord);
            self.anchors.insert(idx, net.0);
        }
    }

    fn anchor(&self, coord: GridCoord) -> Option<NetId> {
        if !self.in_bounds(coord) {
            return None;
        }
        self.anchors.get(&self.index(coord)).map(|&n| NetId(n))
    }

    #[inline]
    fn is_walkable(&self, coord: GridCoord, net: NetId) -> bool {
        if !self.in_bounds(coord) {
            return false;
        }
        let idx = self.index(coord);
        let cell = &self.cells[idx];
        if cell.blocked && self.anchors.get(&idx) != Some(&net.0) {
            return false;
        }
        cell.occupant == NO_NET || cell.occupant == net.0
    }
}
