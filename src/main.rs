use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use netpulse::duration::{format_duration, parse_duration};
use netpulse::report::{origin_label, summary_line};
use netpulse::Settings;
use netpulse_sdk::{InterfaceCounterReader, SamplingScheduler, StatsPublisher, StatsReader, Timestamp};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "netpulse")]
#[command(about = "Sample network throughput and share it with other processes")]
struct Args {
    /// Path to a TOML settings file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sample interface counters and publish them until interrupted
    Sample {
        /// Sampling period (e.g., "1s", "500ms"); overrides the settings file
        #[arg(short, long)]
        interval: Option<String>,
    },

    /// Print the current statistics
    Read {
        /// Print the raw record as JSON
        #[arg(long)]
        json: bool,

        /// Keep printing at this period (e.g., "1s")
        #[arg(short, long)]
        watch: Option<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();

    let mut settings = Settings::load(args.config.as_deref())?;

    match args.command {
        Command::Sample { interval } => {
            if let Some(raw) = interval {
                settings.interval = parse_duration(&raw)
                    .with_context(|| format!("invalid --interval {:?}", raw))?;
                settings.validate()?;
            }
            run_sampler(&settings)
        }
        Command::Read { json, watch } => {
            let watch = watch
                .map(|raw| parse_duration(&raw).with_context(|| format!("invalid --watch {:?}", raw)))
                .transpose()?;
            run_reader(&settings, json, watch)
        }
    }
}

/// Log to stderr so stdout stays clean for `read --json`.
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

/// Run the scheduler until Ctrl-C
fn run_sampler(settings: &Settings) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        let store = settings.store();
        info!(
            namespace = %settings.group_id,
            dir = %store.dir().display(),
            interval = %format_duration(settings.interval),
            "publishing network statistics"
        );

        let publisher = Arc::new(StatsPublisher::new(store));
        let scheduler = SamplingScheduler::builder(InterfaceCounterReader::system(), publisher)
            .interval(settings.interval)
            .link_poll(settings.link_poll)
            .build();

        scheduler.start();
        tokio::signal::ctrl_c()
            .await
            .context("failed to listen for Ctrl-C")?;
        scheduler.stop();

        Ok(())
    })
}

/// Read once, or repeatedly when `watch` is set
fn run_reader(settings: &Settings, json: bool, watch: Option<Duration>) -> Result<()> {
    let mut reader = StatsReader::new(settings.store(), InterfaceCounterReader::system())
        .stale_after(settings.stale_after);

    loop {
        let (snapshot, origin) = reader.read_with_origin();
        if json {
            println!("{}", serde_json::to_string(&snapshot)?);
        } else {
            println!(
                "{}  ({})",
                summary_line(&snapshot, settings.show_totals),
                origin_label(origin, &snapshot, Timestamp::now())
            );
        }

        match watch {
            Some(period) if !period.is_zero() => std::thread::sleep(period),
            _ => return Ok(()),
        }
    }
}
