use anyhow::Result;
use log::{debug, info};
use std::path::Path;

// Define modules used by main
mod agent;
mod grid;
mod model;
mod server;

use forage_common::EngineConfig;
use model::ForageModel;
use server::StepServer;

const DEFAULT_CONFIG: &str = "engine.toml";

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();

    info!("Starting Forage Engine...");

    // --- Load Configuration ---
    // An explicit path must exist; the default file is optional.
    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(&path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => EngineConfig::load(DEFAULT_CONFIG)?,
        None => {
            info!("No {} found, using built-in defaults.", DEFAULT_CONFIG);
            EngineConfig::default()
        }
    };
    debug!("Engine configuration: {:#?}", config);

    // --- Initialize Model ---
    let model = ForageModel::new(&config)?;
    info!(
        "Model ready: {}x{} grid, {} agents, {} food items, finished = {}.",
        model.params().width,
        model.params().height,
        model.agents().len(),
        model.snapshot().food.len(),
        model.is_finished()
    );

    // --- Serve ---
    let mut server = StepServer::bind(&config.server.bind, model)?;
    match server.local_addr() {
        Some(addr) => info!("Listening on http://{} (GET /step advances the simulation).", addr),
        None => info!("Listening on {}.", config.server.bind),
    }
    server.serve()
}
