use crate::geom::coord::GridCoord;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouteError {
    /// Malformed keep-out geometry or a socket placed inside foreign
    /// clearance. Aborts the routing job before any search runs.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A reservation hit a cell already committed to another net outside an
    /// authorized crossing. Internal consistency fault, never user-facing.
    #[error("cell ({}, {}) on layer {} is already committed to another net", .0.x, .0.y, .0.layer)]
    Occupied(GridCoord),

    /// Rejected configuration, reported before the session starts.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}
