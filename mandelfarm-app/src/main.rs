mod app_dir;
mod console;
mod controller;
mod debounce;
mod events;
mod settings;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use mandelfarm_render::{LocalPool, RenderEngine};

use console::{spawn_input_reader, ConsolePresenter};
use controller::Controller;
use settings::Settings;

/// Render the Mandelbrot set across a pool of workers.
///
/// Reads one command per line from stdin: `new`, `undo`, `resize W H`,
/// `select X Y W H`, `exit`.
#[derive(Debug, Parser)]
#[command(name = "mandelfarm", version)]
struct Cli {
    /// Number of workers (and jobs per render). Overrides the settings file.
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    parallelism: Option<u32>,

    /// Settings file to use instead of `mandelfarm.json` next to the executable.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    info!("Starting MandelFarm");

    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    if let Some(parallelism) = cli.parallelism {
        settings.parallelism = parallelism as usize;
    }

    let pool = match LocalPool::new(settings.parallelism) {
        Ok(pool) => pool.encode_tasks(settings.encode_tasks),
        Err(e) => {
            error!("Failed to start worker pool: {e}");
            return ExitCode::FAILURE;
        }
    };
    let engine = match RenderEngine::new(pool, settings.parallelism, settings.worker_wait()) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Failed to start render engine: {e}");
            return ExitCode::FAILURE;
        }
    };

    let (tx, rx) = crossbeam_channel::unbounded();
    // Blocked on stdin until the next line; the process exit reaps it.
    spawn_input_reader(tx.clone());

    let mut controller = Controller::new(
        engine,
        ConsolePresenter::default(),
        settings.initial_size(),
        settings.debounce(),
        tx,
    );
    controller.run(rx);

    info!(
        views = controller.history().depth(),
        parallelism = controller.engine().parallelism(),
        "Goodbye"
    );
    ExitCode::SUCCESS
}
