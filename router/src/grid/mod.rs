pub mod dense;

pub use dense::DenseGrid;

use pcb_common::board::indices::NetId;
use pcb_common::error::RouteError;
use pcb_common::geom::coord::GridCoord;

/// Occupancy map the router searches over. Cells are blocked by keep-out
/// rasterization, owned exclusively by one net once reserved, and may carry
/// a via marker. A socket anchor makes an otherwise blocked cell walkable
/// for the anchoring net only.
pub trait RoutingGrid {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn layers(&self) -> u8;

    fn set_blocked(&mut self, coord: GridCoord);
    fn is_blocked(&self, coord: GridCoord) -> bool;

    fn reserve(&mut self, coord: GridCoord, net: NetId) -> Result<(), RouteError>;
    fn release(&mut self, coord: GridCoord);
    fn occupant(&self, coord: GridCoord) -> Option<NetId>;

    fn set_via(&mut self, coord: GridCoord);
    fn is_via(&self, coord: GridCoord) -> bool;

    fn register_anchor(&mut self, coord: GridCoord, net: NetId);
    fn anchor(&self, coord: GridCoord) -> Option<NetId>;

    /// Whether `net` may occupy this cell: in bounds, not keep-out blocked
    /// (unless anchored to `net`), and not owned by a different net.
    fn is_walkable(&self, coord: GridCoord, net: NetId) -> bool;
}
