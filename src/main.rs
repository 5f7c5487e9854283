//! Kerfnest command line

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use kerfnest::{
    import_dxf, init_logging, Config, LogFormat, NestingReport, NestingSession, PartStore,
};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "kerfnest")]
#[command(about = "Nest DXF parts onto sheet material with kerf clearance")]
#[command(version)]
struct Cli {
    /// Log output format
    #[arg(long, value_enum, default_value = "pretty", global = true)]
    log_format: LogFormatArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Nest copies of a DXF part onto the configured material
    Nest {
        /// Path to the DXF drawing
        file: PathBuf,

        /// Number of copies to nest
        #[arg(short, long, default_value = "1")]
        copies: usize,

        /// Configuration file (JSON or TOML). Defaults to the per-user config.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output file for the placement report (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write a configuration file with default values
    InitConfig {
        /// Destination. Defaults to the per-user config location.
        path: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format.into())?;

    match cli.command {
        Commands::Nest {
            file,
            copies,
            config,
            output,
        } => run_nest(&file, copies, config.as_deref(), output.as_deref()),
        Commands::InitConfig { path } => run_init_config(path),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => {
            let path = Config::default_path()?;
            Config::load_or_default(&path)
                .with_context(|| format!("loading config {}", path.display()))
        }
    }
}

fn run_nest(
    file: &Path,
    copies: usize,
    config: Option<&Path>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let config = load_config(config)?;

    let mut part = import_dxf(file, config.import_parameters())
        .with_context(|| format!("importing {}", file.display()))?;
    part.lead_in_length = config.kerf.lead_in_length;
    part.lead_out_length = config.kerf.lead_out_length;

    let mut store = PartStore::new();
    let first = store.insert(part);
    let mut ids = vec![first];
    for _ in 1..copies {
        ids.push(store.duplicate(first)?);
    }

    let params = config.nesting_parameters();
    let steps_per_tick = params.steps_per_tick;
    let mut session = NestingSession::for_parts(params, &store, &ids)?;
    while session.advance(&mut store, steps_per_tick) {}

    let report = NestingReport::from_session(&session, &store);
    info!(
        "Nesting finished in {} ticks: {}/{} parts placed, state {:?}",
        report.ticks,
        report.placed_count(),
        report.parts.len(),
        report.state
    );

    let json = report.to_json()?;
    match output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("writing report {}", path.display()))?,
        None => println!("{}", json),
    }
    Ok(())
}

fn run_init_config(path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = match path {
        Some(path) => path,
        None => Config::default_path()?,
    };
    Config::default()
        .save_to_file(&path)
        .with_context(|| format!("writing config {}", path.display()))?;
    info!("Wrote default config to {}", path.display());
    Ok(())
}
