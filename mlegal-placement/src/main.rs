use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use anyhow::{Context, Result};
use mlegal_common::{def::parse_def_file, json, PlacementModel};
use mlegal_placement::{
    config::{command, Config},
    driver::{legalize, RunStatus},
    history::IterationHistory,
    stats::{log_statistics, overlap_statistics},
};
use tracing_subscriber::EnvFilter;

fn parse_args() -> Result<Config> {
    Config::from_args(&command().get_matches())
}

fn load_placement(path: &Path) -> Result<PlacementModel> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => json::load_json(path),
        _ => parse_def_file(path),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = parse_args()?;

    let mut model = load_placement(&config.io.input_file)
        .with_context(|| format!("Loading {:?}", config.io.input_file))?;

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || {
            log::warn!("Interrupted, stopping after the current step");
            stop.store(true, Ordering::SeqCst);
        })
        .context("Installing interrupt handler")?;
    }

    let mut history = IterationHistory::new(&model);
    let status =
        legalize(&config, &mut model, &mut history, &stop).context("Legalization failed")?;
    if let RunStatus::Stopped { steps } = status {
        log::warn!("Run stopped early, writing the placement after {} steps", steps);
    }

    let stats = overlap_statistics(&history, &config.geometry);
    log_statistics(&stats);

    json::save_json(&model, &config.io.output_file).context("Writing final placement")?;

    if let Some(history_file) = &config.io.history_file {
        json::save_json(&history, history_file).context("Writing placement history")?;
    }

    if let Some(stats_file) = &config.io.stats_file {
        json::save_json(&stats, stats_file).context("Writing overlap statistics")?;
    }

    Ok(())
}
