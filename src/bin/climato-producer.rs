//! Runs the climatological producer once a day, publishing events as JSON lines on
//! stdout. Logs go to stderr.

use chrono::{DateTime, Days, Local, NaiveTime, TimeZone};
use clap::Parser;
use climato_producer::{
    api_token_from_env, ClimatologicalProducer, ClimatologyClient, JsonLinesPublisher,
    ProducerConfig, ProducerError,
};
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "climato-producer")]
#[command(about = "Retrieve yesterday's certified hourly climatology for a list of stations")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    config: PathBuf,

    /// Batch file, overriding `batch_file` from the configuration
    #[arg(short, long)]
    batches: Option<PathBuf>,

    /// Run a single cycle now and exit
    #[arg(long)]
    once: bool,
}

/// Next occurrence of `at` strictly after `now`, in local time.
fn next_run(now: DateTime<Local>, at: NaiveTime) -> DateTime<Local> {
    let mut date = now.date_naive();
    loop {
        // Skips days where `at` falls in a DST gap.
        if let Some(candidate) = Local.from_local_datetime(&date.and_time(at)).earliest() {
            if candidate > now {
                return candidate;
            }
        }
        date = date + Days::new(1);
    }
}

#[tokio::main]
async fn main() -> Result<(), ProducerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        // stdout carries the published events
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ProducerConfig::load(&cli.config).await?;
    let settings = config.pipeline_settings()?;

    let client = ClimatologyClient::builder()
        .base_url(config.api_url.clone())
        .api_key(api_token_from_env()?)
        .timeout(config.fetch_timeout()?)
        .build()?;

    let producer = ClimatologicalProducer::builder()
        .api(Arc::new(client))
        .publisher(Arc::new(JsonLinesPublisher::stdout()))
        .batch_file(cli.batches.unwrap_or(config.batch_file))
        .settings(settings)
        .build();

    if cli.once {
        producer.run_cycle().await?;
        return Ok(());
    }

    loop {
        let next = next_run(Local::now(), config.schedule_time);
        info!("Next cycle scheduled at {}", next.format("%Y-%m-%d %H:%M %Z"));
        let wait = (next - Local::now()).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;

        // A failed cycle is retried at the next scheduled time.
        if let Err(e) = producer.run_cycle().await {
            error!("Cycle failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_run_is_today_when_still_ahead() {
        let now = Local.with_ymd_and_hms(2024, 3, 2, 8, 0, 0).unwrap();
        let at = NaiveTime::from_hms_opt(12, 30, 0).unwrap();
        let next = next_run(now, at);
        assert_eq!(next.date_naive(), now.date_naive());
        assert_eq!(next.time(), at);
    }

    #[test]
    fn next_run_rolls_over_to_tomorrow() {
        let now = Local.with_ymd_and_hms(2024, 3, 2, 12, 30, 0).unwrap();
        let at = NaiveTime::from_hms_opt(12, 30, 0).unwrap();
        let next = next_run(now, at);
        assert_eq!(next.date_naive(), now.date_naive() + Days::new(1));
    }
}
