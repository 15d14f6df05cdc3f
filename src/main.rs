use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use octolog::config::Config;
use octolog::jobs::{self, DEFAULT_DAYS, Job, MAX_DAYS};
use octolog::logging::init_logging;
use octolog::octopus::Octopus;
use octolog::sink::{LineProtocolSink, PointSink};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "octolog", version = env!("APP_VERSION"), about = "Log Octopus Energy usage, tariffs and costs to InfluxDB")]
struct Cli {
    /// Configuration file (default: octolog.yaml, ~/.config/octolog/config.yaml, /etc/octolog/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print line protocol to stdout instead of writing to InfluxDB
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Daily electricity import, export and gas consumption
    Usage {
        #[arg(long, default_value_t = DEFAULT_DAYS, value_parser = clap::value_parser!(u32).range(1..=MAX_DAYS))]
        days: u32,
    },
    /// Monthly consumption over the last year
    Monthly,
    /// Daily and monthly peak/off-peak split of electricity import
    Peak {
        /// Drop and recreate the database, then load a full year
        #[arg(short, long)]
        reset: bool,
    },
    /// Daily electricity cost and export gain
    Cost {
        #[arg(long, default_value_t = DEFAULT_DAYS, value_parser = clap::value_parser!(u32).range(1..=MAX_DAYS))]
        days: u32,
    },
    /// Print the account description as JSON
    Raw,
}

impl Command {
    fn job(&self) -> Job {
        match *self {
            Command::Usage { days } => Job::Usage { days },
            Command::Monthly => Job::Monthly,
            Command::Peak { reset } => Job::Peak { reset },
            Command::Cost { days } => Job::Cost { days },
            Command::Raw => Job::Raw,
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let mut config = match path {
        Some(p) => Config::from_file(p)
            .with_context(|| format!("Failed to load configuration from {}", p.display()))?,
        None => Config::load().context("Failed to load configuration")?,
    };
    config.apply_env_overrides();
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[cfg(feature = "influx")]
async fn store_sink(config: &Config, reset: bool) -> Result<Box<dyn PointSink>> {
    let sink = octolog::sink::InfluxSink::new(&config.influx);
    if reset {
        sink.reset().await.context("Failed to reset database")?;
    }
    Ok(Box::new(sink))
}

#[cfg(not(feature = "influx"))]
async fn store_sink(_config: &Config, _reset: bool) -> Result<Box<dyn PointSink>> {
    tracing::warn!("Built without InfluxDB support, writing line protocol to stdout");
    Ok(Box::new(LineProtocolSink::stdout()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    init_logging(&config.logging).context("Failed to initialise logging")?;

    let job = cli.command.job();
    let tz = config.tz()?;
    let now = Utc::now();
    let today = now.with_timezone(&tz).date_naive();

    info!("octolog {} running {} job", env!("APP_VERSION"), job.name());

    let octopus = Octopus::connect(&config.octopus, now)
        .await
        .context("Failed to resolve Octopus account")?;
    if let Some(region) = octopus.region_name() {
        info!("Account {} in region {}", octopus.account_number(), region);
    }

    let sink: Box<dyn PointSink> = if cli.dry_run || job == Job::Raw {
        Box::new(LineProtocolSink::stdout())
    } else {
        store_sink(&config, matches!(job, Job::Peak { reset: true })).await?
    };

    match jobs::run(job, &octopus, sink.as_ref(), &config, today).await {
        Ok(report) => {
            info!("Wrote {} points", report.total());
            Ok(())
        }
        Err(e) => {
            error!("{} job failed: {}", job.name(), e);
            Err(anyhow::anyhow!("{} job failed: {}", job.name(), e))
        }
    }
}
