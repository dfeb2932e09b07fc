use clap::Parser;
use crossbeam_channel::bounded;
use driftsim_config::{load_config, Config, SenderType, SerializerType};
use driftsim_core::{SimState, Vec2};
use driftsim_simulation::{Drag, Emit, Integrate, KillByAge, Pipeline, Wind};
use driftsim_transport::{
    BinarySerializer, JsonSerializer, Sender, Serializer, SnapshotRenderer, StdioSender,
};
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::process;

mod driver;
use driver::Driver;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the simulation configuration file (JSON or TOML)
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Stop after this many ticks instead of running until interrupted
    #[arg(short, long)]
    ticks: Option<u64>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let config = match load_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("failed to load config {}: {}", args.config.display(), e);
            process::exit(1);
        }
    };
    info!("using configuration from {}", args.config.display());

    let state = match config.seed {
        Some(seed) => {
            info!("seeding spawn RNG with {}", seed);
            SimState::seeded(seed)
        }
        None => SimState::from_entropy(),
    };

    let pipeline = build_pipeline(&config);
    debug!("pipeline stages: {:?}", pipeline.stage_names());

    let renderer = SnapshotRenderer::new(
        create_serializer(&config),
        create_sender(&config),
        config.canvas.width,
        config.canvas.height,
    );

    let mut driver = Driver::new(state, pipeline, Box::new(renderer), config.tick_duration());

    let (stop_tx, stop_rx) = bounded(1);
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = stop_tx.try_send(());
    }) {
        warn!("could not install Ctrl-C handler: {}", e);
    }
    driver.set_shutdown(stop_rx);

    info!("running simulation at {} ticks/s", config.framerate);
    driver.start(args.ticks);
}

fn build_pipeline(config: &Config) -> Pipeline {
    let sim = &config.simulation;
    let mut pipeline = Pipeline::new()
        .with_stage(Emit {
            origin: Vec2::new(sim.emitter.x, sim.emitter.y),
        })
        .with_stage(Wind {
            velocity: Vec2::new(sim.wind.x, sim.wind.y),
        });

    // Drag stays out of the standard composition unless asked for.
    if sim.drag.enabled {
        info!("drag stage enabled, coeff {}", sim.drag.coeff);
        pipeline = pipeline.with_stage(Drag {
            coeff: sim.drag.coeff,
        });
    }

    pipeline
        .with_stage(KillByAge {
            max_age: sim.max_age,
        })
        .with_stage(Integrate)
}

fn create_serializer(config: &Config) -> Box<dyn Serializer> {
    match config.transport.serializer.serializer_type {
        SerializerType::Json => Box::new(JsonSerializer),
        SerializerType::Binary => Box::new(BinarySerializer),
    }
}

fn create_sender(config: &Config) -> Box<dyn Sender> {
    match config.transport.sender.sender_type {
        SenderType::Stdio => Box::new(StdioSender::new()),
    }
}
