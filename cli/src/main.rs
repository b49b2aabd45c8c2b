use clap::{Parser, Subcommand};
use pcb_common::board::core::{BoardLayout, NetList, PairResolution, RoutingResult};
use pcb_common::board::loader;
use pcb_common::util::config::Config;
use pcb_common::util::{check, generator, logger, visualization};
use serde_json::json;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Route the board described by the config's board file.
    Route,
    /// Write a random benchmark board description.
    Generate {
        #[arg(long, default_value_t = 9)]
        modules: usize,
        #[arg(long, default_value_t = 6)]
        nets: usize,
        #[arg(long, default_value_t = 4)]
        sockets: usize,
        #[arg(long, default_value = "inputs/board.json")]
        output: String,
    },
}

fn main() -> anyhow::Result<()> {
    logger::init();
    let args = Args::parse();

    let config = if args.config.exists() {
        log::info!("Loading configuration from {:?}", args.config);
        let config_str = std::fs::read_to_string(&args.config)
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;
        toml::from_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?
    } else {
        log::warn!(
            "Configuration file {:?} not found. Using internal defaults.",
            args.config
        );
        Config::default()
    };

    match args.command.unwrap_or(Commands::Route) {
        Commands::Generate {
            modules,
            nets,
            sockets,
            output,
        } => {
            prepare_output_dir(&output)?;
            generator::generate_random_board(&output, modules, nets, sockets)?;
            log::info!("Generated: {}", output);
        }
        Commands::Route => {
            if !Path::new(&config.input.board_file).exists() {
                return Err(anyhow::anyhow!(
                    "Board file missing: '{}'. Run 'generate' or point --config at one.",
                    config.input.board_file
                ));
            }
            prepare_output_dir(&config.input.output_json)?;
            prepare_output_dir(&config.input.output_image)?;

            if let Err(e) = run_routing(&config) {
                log::error!("{:#}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn prepare_output_dir(path_str: &str) -> anyhow::Result<()> {
    if let Some(parent) = Path::new(path_str).parent() {
        if !parent.exists() && !parent.as_os_str().is_empty() {
            log::info!("Creating output directory: {:?}", parent);
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn run_routing(config: &Config) -> anyhow::Result<()> {
    let (layout, nets) = loader::load(&config.input.board_file)?;

    log::info!("Starting routing...");
    let result = pcb_router::route(&layout, &nets, &config.router).map_err(|e| {
        log::error!("Routing failed: {}", e);
        anyhow::anyhow!(e.to_string())
    })?;

    for outcome in result.unroutable() {
        if let PairResolution::Unroutable(reason) = outcome.resolution {
            log::warn!(
                "Unroutable: net '{}' ({})",
                nets.name(outcome.net),
                reason.tag()
            );
        }
    }

    log::info!("Writing route report to {}", config.input.output_json);
    write_report(&layout, &nets, &result, &config.input.output_json)?;

    log::info!("Rendering {}", config.input.output_image);
    visualization::draw_routed_board(&layout, &result, &config.input.output_image, 1600, 1600);

    check::run(&layout, &nets, &result).map_err(|e| anyhow::anyhow!("Verification failed: {}", e))
}

/// Serializes the routing result with names resolved, in the shape the
/// downstream Gerber composer consumes.
fn write_report(
    layout: &BoardLayout,
    nets: &NetList,
    result: &RoutingResult,
    path: &str,
) -> anyhow::Result<()> {
    let socket_label = |id: pcb_common::board::indices::SocketId| {
        let socket = &layout.sockets[id.index()];
        format!(
            "{}/{}",
            layout.modules[socket.module.index()].name,
            socket.name
        )
    };

    let segments: Vec<_> = result
        .segments
        .iter()
        .map(|seg| {
            json!({
                "net": nets.name(seg.net),
                "layer": seg.layer,
                "points": seg.points.iter().map(|p| [p.x, p.y]).collect::<Vec<_>>(),
            })
        })
        .collect();

    let vias: Vec<_> = result
        .vias
        .iter()
        .map(|via| {
            json!({
                "net": nets.name(via.net),
                "position": [via.position.x, via.position.y],
                "layers": [via.lower, via.upper],
            })
        })
        .collect();

    let outcomes: Vec<_> = result
        .outcomes
        .iter()
        .map(|o| {
            let (status, reason) = match o.resolution {
                PairResolution::Routed => ("routed", None),
                PairResolution::AlreadyConnected => ("already_connected", None),
                PairResolution::Unroutable(r) => ("unroutable", Some(r.tag())),
            };
            json!({
                "net": nets.name(o.net),
                "from": socket_label(o.from),
                "to": socket_label(o.to),
                "status": status,
                "reason": reason,
            })
        })
        .collect();

    let report = json!({
        "segments": segments,
        "vias": vias,
        "outcomes": outcomes,
        "complete": result.is_complete(),
    });

    std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
    Ok(())
}
