use crate::grid::RoutingGrid;
use crate::utils::conversion::GridConverter;
use pcb_common::board::core::KeepOutZone;
use pcb_common::error::RouteError;
use pcb_common::geom::coord::GridCoord;

/// Validates and rasterizes every keep-out zone onto the grid. A cell is
/// blocked when its center lies inside the outline or within the inflated
/// margin of its boundary; boundary-touching cells are blocked. The margin
/// is the per-zone value plus the job-wide inflation from the config.
pub fn rasterize_keep_outs<G: RoutingGrid + ?Sized>(
    grid: &mut G,
    conv: &GridConverter,
    zones: &[KeepOutZone],
    global_margin: f64,
) -> Result<(), RouteError> {
    for (idx, zone) in zones.iter().enumerate() {
        zone.outline.validate().map_err(|e| match e {
            RouteError::InvalidGeometry(msg) => {
                RouteError::InvalidGeometry(format!("zone {}: {}", idx, msg))
            }
            other => other,
        })?;
        block_zone(grid, conv, zone, zone.margin + global_margin);
    }
    Ok(())
}

fn block_zone<G: RoutingGrid + ?Sized>(
    grid: &mut G,
    conv: &GridConverter,
    zone: &KeepOutZone,
    margin: f64,
) {
    let bbox = zone.outline.bounding_box().expand(margin);
    let min = conv.to_grid(bbox.min, 0);
    let max = conv.to_grid(bbox.max, 0);

    let mut blocked = 0usize;
    for y in min.y..=max.y {
        for x in min.x..=max.x {
            let center = conv.to_world(GridCoord::new(x, y, 0));
            let hit = zone.outline.contains(center)
                || zone.outline.distance_to_boundary(center) <= margin;
            if !hit {
                continue;
            }
            for layer in 0..grid.layers() {
                if zone.blocks_layer(layer) {
                    grid.set_blocked(GridCoord::new(x, y, layer));
                    blocked += 1;
                }
            }
        }
    }
    log::debug!(
        "zone of module {} rasterized: {} cells blocked (margin {:.2})",
        zone.module,
        blocked,
        margin
    );
}
