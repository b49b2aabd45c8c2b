use crate::grid::RoutingGrid;
use pcb_common::board::indices::NetId;
use pcb_common::geom::coord::GridCoord;
use pcb_common::util::config::DiagonalMovement;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

pub const COST_STRAIGHT: i64 = 1000;
pub const COST_DIAGONAL: i64 = 1414;

/// Window margin for the first, bounded attempt. A failed windowed search
/// is retried over the whole grid before a pair is declared unroutable.
pub const WINDOW_MARGIN: u32 = 24;

#[derive(Copy, Clone, Eq, PartialEq)]
struct State {
    f_score: i64,
    g_score: i64,
    index: u32,
}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f_score
            .cmp(&self.f_score)
            .then_with(|| self.g_score.cmp(&other.g_score))
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Per-pair search parameters. `layer_mask` is the set of layers the search
/// may enter; a single-bit mask is a plain 2D search. Elevator moves are
/// only generated for multi-bit masks and cost `via_cost` per transition.
#[derive(Clone, Copy)]
pub struct PathQuery {
    pub net: NetId,
    pub layer_mask: u64,
    pub diagonal: DiagonalMovement,
    pub via_cost: i64,
}

impl PathQuery {
    pub fn multi_layer(&self) -> bool {
        self.layer_mask.count_ones() > 1
    }

    fn allows_layer(&self, layer: u8) -> bool {
        layer < 64 && self.layer_mask & (1u64 << layer) != 0
    }
}

#[derive(Clone, Copy)]
struct RoutingWindow {
    min_x: u32,
    max_x: u32,
    min_y: u32,
    max_y: u32,
    width: u32,
    height: u32,
    layers: u8,
}

impl RoutingWindow {
    fn new(start: GridCoord, end: GridCoord, margin: u32, grid_w: u32, grid_h: u32, layers: u8) -> Self {
        let min_x = start.x.min(end.x).saturating_sub(margin);
        let max_x = start.x.max(end.x).saturating_add(margin).min(grid_w - 1);
        let min_y = start.y.min(end.y).saturating_sub(margin);
        let max_y = start.y.max(end.y).saturating_add(margin).min(grid_h - 1);
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
            layers,
        }
    }

    #[inline(always)]
    fn contains(&self, c: GridCoord) -> bool {
        c.x >= self.min_x && c.x <= self.max_x && c.y >= self.min_y && c.y <= self.max_y
    }

    #[inline(always)]
    fn local_idx(&self, c: GridCoord) -> usize {
        let lx = c.x - self.min_x;
        let ly = c.y - self.min_y;
        ((c.layer as u32) * self.width * self.height + ly * self.width + lx) as usize
    }

    #[inline(always)]
    fn coord(&self, idx: u32) -> GridCoord {
        let plane = self.width * self.height;
        let layer = (idx / plane) as u8;
        let rem = idx % plane;
        GridCoord::new(rem % self.width + self.min_x, rem / self.width + self.min_y, layer)
    }

    fn capacity(&self) -> usize {
        (self.width * self.height * self.layers as u32) as usize
    }
}

/// Reusable A* scratch state. Arrays are reset lazily via a generation tag
/// so repeated searches on one session do not re-zero the whole grid.
pub struct AStar {
    parents: Vec<u32>,
    g_score: Vec<i64>,
    visited_tag: Vec<u32>,
    current_tag: u32,
    capacity: usize,
}

impl Default for AStar {
    fn default() -> Self {
        Self::new()
    }
}

impl AStar {
    pub fn new() -> Self {
        let cap = 100_000;
        Self {
            parents: vec![u32::MAX; cap],
            g_score: vec![i64::MAX; cap],
            visited_tag: vec![0; cap],
            current_tag: 1,
            capacity: cap,
        }
    }

    fn ensure_capacity(&mut self, size: usize) {
        if size > self.capacity {
            self.capacity = size.max(self.capacity * 2);
            self.parents.resize(self.capacity, u32::MAX);
            self.g_score.resize(self.capacity, i64::MAX);
            self.visited_tag.resize(self.capacity, 0);
        }
    }

    fn reset_window(&mut self) {
        self.current_tag += 1;
        if self.current_tag == 0 {
            self.visited_tag.fill(0);
            self.current_tag = 1;
        }
    }

    /// Searches from `start` to `goal` within a window around both. Returns
    /// the cell path including both endpoints, or `None` when the window is
    /// exhausted.
    pub fn find_path<G: RoutingGrid + ?Sized>(
        &mut self,
        grid: &G,
        query: &PathQuery,
        start: GridCoord,
        goal: GridCoord,
        window_margin: u32,
    ) -> Option<Vec<GridCoord>> {
        let window = RoutingWindow::new(
            start,
            goal,
            window_margin,
            grid.width(),
            grid.height(),
            grid.layers(),
        );
        self.ensure_capacity(window.capacity());
        self.reset_window();

        let mut heap = BinaryHeap::new();
        let start_local = window.local_idx(start);
        self.g_score[start_local] = 0;
        self.visited_tag[start_local] = self.current_tag;
        self.parents[start_local] = u32::MAX;
        heap.push(State {
            f_score: heuristic(start, goal, query),
            g_score: 0,
            index: start_local as u32,
        });

        while let Some(State { g_score, index, .. }) = heap.pop() {
            let curr_local = index as usize;
            if g_score > self.g_score[curr_local] {
                continue;
            }
            let position = window.coord(index);
            if position == goal {
                return Some(self.reconstruct(goal, &window));
            }

            let current_g = self.g_score[curr_local];

            let mut step = |neighbor: GridCoord, move_cost: i64, solver: &mut Self| {
                if !window.contains(neighbor) || !grid.is_walkable(neighbor, query.net) {
                    return;
                }
                let neighbor_local = window.local_idx(neighbor);
                let tentative_g = current_g + move_cost;
                if solver.visited_tag[neighbor_local] != solver.current_tag
                    || tentative_g < solver.g_score[neighbor_local]
                {
                    solver.parents[neighbor_local] = curr_local as u32;
                    solver.g_score[neighbor_local] = tentative_g;
                    solver.visited_tag[neighbor_local] = solver.current_tag;
                    heap.push(State {
                        f_score: tentative_g + heuristic(neighbor, goal, query),
                        g_score: tentative_g,
                        index: neighbor_local as u32,
                    });
                }
            };

            // Straight moves, x before y, negative before positive.
            if position.x > 0 {
                step(GridCoord::new(position.x - 1, position.y, position.layer), COST_STRAIGHT, self);
            }
            if position.x < grid.width() - 1 {
                step(GridCoord::new(position.x + 1, position.y, position.layer), COST_STRAIGHT, self);
            }
            if position.y > 0 {
                step(GridCoord::new(position.x, position.y - 1, position.layer), COST_STRAIGHT, self);
            }
            if position.y < grid.height() - 1 {
                step(GridCoord::new(position.x, position.y + 1, position.layer), COST_STRAIGHT, self);
            }

            if query.diagonal != DiagonalMovement::Never {
                for (dx, dy) in [(-1i64, -1i64), (1, -1), (-1, 1), (1, 1)] {
                    let nx = position.x as i64 + dx;
                    let ny = position.y as i64 + dy;
                    if nx < 0 || ny < 0 || nx >= grid.width() as i64 || ny >= grid.height() as i64 {
                        continue;
                    }
                    if !diagonal_allowed(grid, query, position, dx, dy) {
                        continue;
                    }
                    step(
                        GridCoord::new(nx as u32, ny as u32, position.layer),
                        COST_DIAGONAL,
                        self,
                    );
                }
            }

            // Elevator moves between adjacent eligible layers.
            if query.multi_layer() {
                if position.layer > 0 && query.allows_layer(position.layer - 1) {
                    step(position.on_layer(position.layer - 1), query.via_cost, self);
                }
                if position.layer < grid.layers() - 1 && query.allows_layer(position.layer + 1) {
                    step(position.on_layer(position.layer + 1), query.via_cost, self);
                }
            }
        }
        None
    }

    fn reconstruct(&self, end: GridCoord, window: &RoutingWindow) -> Vec<GridCoord> {
        let mut path = Vec::new();
        let mut curr_local = window.local_idx(end);
        loop {
            path.push(window.coord(curr_local as u32));
            let parent = self.parents[curr_local];
            if parent == u32::MAX {
                break;
            }
            curr_local = parent as usize;
        }
        path.reverse();
        path
    }
}

/// Admissible lower bound for the active move set: Manhattan when diagonals
/// are off, octile otherwise, plus the via cost per remaining layer change.
#[inline(always)]
fn heuristic(from: GridCoord, goal: GridCoord, query: &PathQuery) -> i64 {
    let dx = (from.x as i64 - goal.x as i64).abs();
    let dy = (from.y as i64 - goal.y as i64).abs();
    let lateral = if query.diagonal == DiagonalMovement::Never {
        COST_STRAIGHT * (dx + dy)
    } else {
        COST_STRAIGHT * dx.max(dy) + (COST_DIAGONAL - COST_STRAIGHT) * dx.min(dy)
    };
    lateral + (from.layer as i64 - goal.layer as i64).abs() * query.via_cost
}

/// Corner-cutting rule. A diagonal step passes between the two straight
/// neighbors; squeezing between two keep-out cells is never legal, and the
/// strict policy also refuses to squeeze past another net's trace.
fn diagonal_allowed<G: RoutingGrid + ?Sized>(
    grid: &G,
    query: &PathQuery,
    from: GridCoord,
    dx: i64,
    dy: i64,
) -> bool {
    let side_a = GridCoord::new((from.x as i64 + dx) as u32, from.y, from.layer);
    let side_b = GridCoord::new(from.x, (from.y as i64 + dy) as u32, from.layer);

    match query.diagonal {
        DiagonalMovement::Never => false,
        DiagonalMovement::Always => {
            let keep_out = |c: GridCoord| {
                grid.is_blocked(c) && grid.anchor(c) != Some(query.net)
            };
            !(keep_out(side_a) && keep_out(side_b))
        }
        DiagonalMovement::IfAtMostOneObstacle => {
            let obstacles = [side_a, side_b]
                .iter()
                .filter(|&&c| !grid.is_walkable(c, query.net))
                .count();
            obstacles <= 1
        }
    }
}
