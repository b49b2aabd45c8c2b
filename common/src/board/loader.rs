use crate::board::core::{BoardLayout, NetList};
use crate::geom::point::Point;
use crate::geom::polygon::Polygon;
use crate::geom::rect::Rect;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Deserialize)]
struct BoardFile {
    board: BoardDesc,
    #[serde(default)]
    nets: BTreeMap<String, NetDesc>,
    #[serde(default)]
    modules: Vec<ModuleDesc>,
}

#[derive(Deserialize)]
struct BoardDesc {
    width: f64,
    height: f64,
    #[serde(default = "default_copper_layers")]
    layers: u8,
}

#[derive(Deserialize)]
struct NetDesc {
    layers: Vec<u8>,
}

#[derive(Deserialize)]
struct ModuleDesc {
    name: String,
    #[serde(default)]
    keep_out: Vec<[f64; 2]>,
    #[serde(default)]
    margin: f64,
    #[serde(default)]
    keep_out_layers: Option<Vec<u8>>,
    #[serde(default)]
    sockets: Vec<SocketDesc>,
}

#[derive(Deserialize)]
struct SocketDesc {
    name: String,
    net: String,
    position: [f64; 2],
    #[serde(default)]
    layers: Option<Vec<u8>>,
}

fn default_copper_layers() -> u8 {
    2
}

/// Reads a board description JSON and builds the layout plus net list.
/// Geometry is expected in board coordinates; the placement step upstream
/// has already applied module offsets and rotations.
pub fn load(path: &str) -> Result<(BoardLayout, NetList)> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read board file '{}'", path))?;
    from_str(&text).with_context(|| format!("invalid board description in '{}'", path))
}

pub fn from_str(text: &str) -> Result<(BoardLayout, NetList)> {
    let file: BoardFile = serde_json::from_str(text)?;

    let outline = Rect::new(
        Point::new(0.0, 0.0),
        Point::new(file.board.width, file.board.height),
    );
    let mut layout = BoardLayout::new(outline, file.board.layers);
    let mut nets = NetList::new();

    for (name, desc) in &file.nets {
        nets.add_net(name.clone(), desc.layers.clone());
    }

    for module in &file.modules {
        let module_id = layout.add_module(module.name.clone());

        if !module.keep_out.is_empty() {
            let ring = module
                .keep_out
                .iter()
                .map(|&[x, y]| Point::new(x, y))
                .collect();
            layout.add_zone(
                module_id,
                Polygon::new(ring),
                module.margin,
                module.keep_out_layers.clone(),
            );
        }

        for socket in &module.sockets {
            let net_id = match nets.net_name_map.get(&socket.net) {
                Some(&id) => id,
                None => {
                    log::warn!(
                        "socket '{}/{}' references net '{}' with no layer mapping",
                        module.name,
                        socket.name,
                        socket.net
                    );
                    nets.add_net(socket.net.clone(), Vec::new())
                }
            };
            let layers = socket
                .layers
                .clone()
                .unwrap_or_else(|| nets.nets[net_id.index()].layers.clone());
            let socket_id = layout.add_socket(
                module_id,
                socket.name.clone(),
                Point::new(socket.position[0], socket.position[1]),
                net_id,
                layers,
            );
            nets.attach_socket(net_id, socket_id);
        }
    }

    log::info!(
        "Loaded board: {} modules, {} keep-out zones, {} sockets, {} nets",
        layout.modules.len(),
        layout.zones.len(),
        layout.sockets.len(),
        nets.nets.len()
    );

    Ok((layout, nets))
}
