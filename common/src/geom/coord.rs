#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCoord {
    pub x: u32,
    pub y: u32,
    pub layer: u8,
}

impl GridCoord {
    pub fn new(x: u32, y: u32, layer: u8) -> Self {
        Self { x, y, layer }
    }

    /// The same cell address on a different layer.
    pub fn on_layer(&self, layer: u8) -> Self {
        Self::new(self.x, self.y, layer)
    }

    /// Canonical key for an undirected unit span between two cells.
    pub fn span_key(a: GridCoord, b: GridCoord) -> (GridCoord, GridCoord) {
        if a <= b { (a, b) } else { (b, a) }
    }
}
