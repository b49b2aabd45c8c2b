use rand::Rng;
use serde_json::json;
use std::fs::File;
use std::io::Write;

/// Writes a random board description for benchmarks and smoke tests:
/// modules on a coarse grid, each with a rectangular keep-out and sockets
/// spread along its left and right edges, nets assigned round-robin.
pub fn generate_random_board(
    filename: &str,
    num_modules: usize,
    num_nets: usize,
    sockets_per_module: usize,
) -> std::io::Result<()> {
    let mut rng = rand::thread_rng();

    let module_w = 20.0;
    let module_h = 15.0;
    let gutter = 12.0;

    let cols = (num_modules as f64).sqrt().ceil().max(1.0) as usize;
    let rows = num_modules.div_ceil(cols);
    let board_w = gutter + cols as f64 * (module_w + gutter);
    let board_h = gutter + rows as f64 * (module_h + gutter);

    log::info!(
        "Generating board: {} modules, {} nets, {:.0}x{:.0} mm",
        num_modules,
        num_nets,
        board_w,
        board_h
    );

    let mut nets = serde_json::Map::new();
    for n in 0..num_nets.max(1) {
        nets.insert(format!("NET_{}", n), json!({ "layers": [0, 1] }));
    }

    let mut modules = Vec::new();
    let mut net_cursor = 0usize;
    for m in 0..num_modules {
        let col = m % cols;
        let row = m / cols;
        let x0 = gutter + col as f64 * (module_w + gutter);
        let y0 = gutter + row as f64 * (module_h + gutter);

        let mut sockets = Vec::new();
        for s in 0..sockets_per_module {
            // Alternate pads between the left and right module edges, with a
            // little vertical jitter so routes do not all line up.
            let on_left = s % 2 == 0;
            let x = if on_left { x0 } else { x0 + module_w };
            let slots = sockets_per_module.div_ceil(2).max(1);
            let step = module_h / (slots + 1) as f64;
            let jitter: f64 = rng.gen_range(-0.25..0.25);
            let y = y0 + step * ((s / 2 + 1) as f64) + jitter;

            sockets.push(json!({
                "name": format!("S{}", s),
                "net": format!("NET_{}", net_cursor % num_nets.max(1)),
                "position": [x, y]
            }));
            net_cursor += 1;
        }

        modules.push(json!({
            "name": format!("module_{}", m),
            "margin": 0.5,
            "keep_out": [
                [x0, y0],
                [x0 + module_w, y0],
                [x0 + module_w, y0 + module_h],
                [x0, y0 + module_h]
            ],
            "sockets": sockets
        }));
    }

    let board = json!({
        "board": { "width": board_w, "height": board_h, "layers": 2 },
        "nets": nets,
        "modules": modules
    });

    let mut file = File::create(filename)?;
    file.write_all(serde_json::to_string_pretty(&board)?.as_bytes())?;
    Ok(())
}
