use pcb_common::geom::coord::GridCoord;
use pcb_common::geom::point::Point;
use pcb_common::geom::rect::Rect;

/// World <-> grid mapping for one routing job. Every geometric input —
/// socket positions and keep-out outlines alike — snaps through this one
/// converter, so both round identically and cannot drift apart by an axis.
pub struct GridConverter {
    resolution: f64,
    origin: Point<f64>,
    grid_w: u32,
    grid_h: u32,
}

impl GridConverter {
    pub fn new(outline: Rect, resolution: f64) -> Self {
        let grid_w = (outline.width() / resolution).ceil().max(1.0) as u32 + 1;
        let grid_h = (outline.height() / resolution).ceil().max(1.0) as u32 + 1;
        Self {
            resolution,
            origin: outline.min,
            grid_w,
            grid_h,
        }
    }

    pub fn grid_width(&self) -> u32 {
        self.grid_w
    }

    pub fn grid_height(&self) -> u32 {
        self.grid_h
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Snaps a world position to the nearest cell, clamped to the board.
    pub fn to_grid(&self, p: Point<f64>, layer: u8) -> GridCoord {
        let raw_x = (p.x - self.origin.x) / self.resolution;
        let raw_y = (p.y - self.origin.y) / self.resolution;
        let x = raw_x.round().max(0.0).min((self.grid_w - 1) as f64) as u32;
        let y = raw_y.round().max(0.0).min((self.grid_h - 1) as f64) as u32;
        GridCoord::new(x, y, layer)
    }

    pub fn to_world(&self, c: GridCoord) -> Point<f64> {
        Point::new(
            self.origin.x + c.x as f64 * self.resolution,
            self.origin.y + c.y as f64 * self.resolution,
        )
    }

    /// Number of whole cells covering a world distance.
    pub fn cells_for(&self, distance: f64) -> u32 {
        (distance / self.resolution).ceil().max(0.0) as u32
    }
}
