pub mod algo;
pub mod cluster;
pub mod consolidate;
pub mod grid;
pub mod intersect;
pub mod raster;
pub mod session;
pub mod utils;

use pcb_common::board::core::{BoardLayout, NetList, RoutingResult};
use pcb_common::error::RouteError;
use pcb_common::util::config::RouterConfig;

/// Routes every net of the board. Configuration is validated eagerly; the
/// grid and keep-out state are built once and discarded with the session.
pub fn route(
    layout: &BoardLayout,
    nets: &NetList,
    config: &RouterConfig,
) -> Result<RoutingResult, RouteError> {
    config.validate()?;
    let mut session = session::RoutingSession::new(layout, nets, config)?;
    session.run()
}
