//! physlab Scene Runner
//!
//! Runs a catalog scene headless for a number of ticks and prints where its
//! bodies ended up.
//!
//! Usage: `physlab-runner <scene|index> [--ticks N] [--preset file.json] [--json] [--log level]`
//!        `physlab-runner --list`

use physlab::scenes::{self, SceneEntry, CATALOG};
use physlab::world::DEFAULT_DELTA_MS;
use physlab::{ParamPreset, SceneController};
use std::env;
use std::path::PathBuf;
use std::process;
use tracing::{error, info};

struct Args {
    scene: Option<String>,
    ticks: u32,
    preset: Option<PathBuf>,
    json: bool,
    list: bool,
    log: tracing::Level,
}

fn usage() -> ! {
    eprintln!("Usage: physlab-runner <scene|index> [--ticks N] [--preset file.json] [--json] [--log level]");
    eprintln!("       physlab-runner --list");
    process::exit(2);
}

fn parse_args() -> Args {
    let mut args = Args {
        scene: None,
        ticks: 600,
        preset: None,
        json: false,
        list: false,
        log: tracing::Level::WARN,
    };

    let mut iter = env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--list" => args.list = true,
            "--json" => args.json = true,
            "--ticks" => {
                args.ticks = iter.next().and_then(|s| s.parse().ok()).unwrap_or_else(|| usage());
            }
            "--preset" => {
                args.preset = Some(iter.next().map(PathBuf::from).unwrap_or_else(|| usage()));
            }
            "--log" => {
                args.log = iter.next().and_then(|s| s.parse().ok()).unwrap_or_else(|| usage());
            }
            "-h" | "--help" => usage(),
            other if other.starts_with("--") => {
                eprintln!("Unknown option {}", other);
                usage();
            }
            other => args.scene = Some(other.to_string()),
        }
    }
    args
}

/// Scene by catalog index (1-based, as listed) or by name or slug.
fn lookup(query: &str) -> Option<&'static SceneEntry> {
    match query.parse::<usize>() {
        Ok(n) => n.checked_sub(1).and_then(|i| CATALOG.get(i)),
        Err(_) => scenes::find(query),
    }
}

fn main() {
    let args = parse_args();

    tracing_subscriber::fmt()
        .with_max_level(args.log)
        .with_writer(std::io::stderr)
        .init();

    if args.list {
        for (i, entry) in CATALOG.iter().enumerate() {
            println!("{:>2}. {:<24} {}", i + 1, entry.slug(), entry.description);
        }
        return;
    }

    let Some(query) = args.scene.as_deref() else {
        usage();
    };
    let Some(entry) = lookup(query) else {
        eprintln!("No scene matches '{}'. Try --list.", query);
        process::exit(1);
    };

    let mut controller = match SceneController::new((entry.scene)()) {
        Ok(c) => c,
        Err(e) => {
            error!("Invalid parameters for {}: {}", entry.name, e);
            process::exit(1);
        }
    };

    if let Some(path) = &args.preset {
        let applied = ParamPreset::load(path).and_then(|preset| controller.apply_preset(&preset));
        if let Err(e) = applied {
            error!("Failed to apply preset {:?}: {}", path, e);
            process::exit(1);
        }
    } else if let Err(e) = controller.reset() {
        error!("Failed to build {}: {}", entry.name, e);
        process::exit(1);
    }

    info!(scene = entry.name, ticks = args.ticks, "running");
    for _ in 0..args.ticks {
        controller.step(DEFAULT_DELTA_MS);
    }

    if args.json {
        print_json(&controller);
    } else {
        print_text(&controller);
    }
}

fn print_text(controller: &SceneController) {
    println!(
        "{} after {} ticks ({:.2}s)",
        controller.scene().name(),
        controller.clock().ticks(),
        controller.clock().elapsed_secs()
    );
    for (i, &id) in controller.scene_entities().iter().enumerate() {
        let Some(body) = controller.world().body(id) else {
            continue;
        };
        if body.is_static() {
            continue;
        }
        let p = body.position();
        let v = body.velocity();
        println!(
            "  body {:>2}: position ({:8.2}, {:8.2})  velocity ({:7.3}, {:7.3})",
            i, p.x, p.y, v.x, v.y
        );
    }
    for reading in controller.telemetry().readings() {
        println!("  {}", reading);
    }
}

fn print_json(controller: &SceneController) {
    let bodies: Vec<serde_json::Value> = controller
        .scene_entities()
        .iter()
        .enumerate()
        .filter_map(|(i, &id)| controller.world().body(id).map(|b| (i, b)))
        .filter(|(_, b)| !b.is_static())
        .map(|(i, b)| {
            serde_json::json!({
                "index": i,
                "position": [b.position().x, b.position().y],
                "velocity": [b.velocity().x, b.velocity().y],
            })
        })
        .collect();
    let telemetry: serde_json::Map<String, serde_json::Value> = controller
        .telemetry()
        .readings()
        .iter()
        .map(|r| (r.label.clone(), serde_json::json!(r.value)))
        .collect();

    let report = serde_json::json!({
        "scene": controller.scene().name(),
        "ticks": controller.clock().ticks(),
        "elapsed_secs": controller.clock().elapsed_secs(),
        "parameters": controller.preset().values,
        "bodies": bodies,
        "telemetry": telemetry,
    });
    match serde_json::to_string_pretty(&report) {
        Ok(s) => println!("{}", s),
        Err(e) => error!("Failed to encode report: {}", e),
    }
}
