use anyhow::{bail, Context, Result};
use clap::Parser;
use std::{
    fs::{self, File},
    future::Future,
    io,
    path::Path,
    process,
    sync::{Arc, Mutex},
};
use tokio::runtime;
use tracing::info;

mod app;
mod cli;
mod config;
mod error;
mod input;
mod project;
mod report;
mod repository;
mod toolchain;
mod ui;
mod utils;
mod worker;

use app::Session;
use cli::Cli;
use config::Config;
use repository::ProjectRepository;
use toolchain::UvCli;
use ui::InteractiveUI;

fn main() {
    let cli = Cli::parse();

    if let Err(err) = block_on(run(cli)).and_then(|result| result) {
        eprintln!("Error: {:#}", err);
        process::exit(1);
    }
}

/// Drive `future` on a fresh runtime. Blocking tasks still running when it
/// completes (a hung `uv venv`, a long size walk) are abandoned, not awaited.
fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("could not start async runtime")?;

    let output = runtime.block_on(future);
    runtime.shutdown_background();
    Ok(output)
}

async fn run(cli: Cli) -> Result<()> {
    let location = match &cli.config {
        Some(path) => path.clone(),
        None => config::default_location()?,
    };

    init_logging(&cli, &location);

    let (config, first_run) = Config::load(&location).context("Error loading configuration")?;
    info!(
        config = %config.location().display(),
        root = %config.parent_directory.display(),
        first_run,
        "starting"
    );

    let repository = ProjectRepository::new(
        config.parent_directory.clone(),
        Arc::new(UvCli::new(config.tool.clone())),
    );

    if cli.list {
        if first_run {
            bail!(
                "no configuration at {}; run tuv interactively once to choose a parent directory",
                location.display()
            );
        }
        return report::print_projects(&repository, cli.json).await;
    }

    let session = Session::new(config, first_run);
    InteractiveUI::new(session, repository).run().await
}

/// Log to a file; the terminal belongs to the UI. Logging is skipped if the
/// file cannot be opened.
fn init_logging(cli: &Cli, config_location: &Path) {
    let file = match open_log_file(&cli.log_path(config_location)) {
        Ok(file) => file,
        Err(_) => return,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
}

/// The log only covers the current run.
fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
}
