//! Command-line campsite finder: polls recreation.gov until a stay's
//! worth of consecutive nights opens up at one of the requested parks,
//! then opens the reservation pages and plays an alert.
//!
//! ```bash
//! # Poll a named list from master_list.json
//! campsite-finder 2021-03-06 2021-03-08 --list pinnacles
//!
//! # Poll explicit park ids, tent sites only, give up after 100 tries
//! campsite-finder 2021-03-06 2021-03-08 --parks 232447,232450 \
//!     --site-type "STANDARD NONELECTRIC" --max-attempts 100
//! ```

mod master_list;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use campground_scan::{
    BASE_URL_ENV, CampgroundScanner, ConsoleReporter, DateRange, NightsPolicy, PollOutcome,
    Poller, PollerConfig, RecGovClient, ScanRequest, TokioClock, TransportConfig,
    cancellation_channel,
};
use clap::Parser;
use notification_services::{BrowserNotifier, Notifier, SoundNotifier};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Watch recreation.gov campgrounds for an open stay.
#[derive(Parser)]
#[command(name = "campsite-finder")]
#[command(about = "Polls recreation.gov until campsites open up for your dates")]
#[command(version)]
struct Cli {
    /// Check-in date (YYYY-MM-DD)
    start_date: String,

    /// Check-out date (YYYY-MM-DD)
    end_date: String,

    /// Campground ids to scan, comma separated
    #[arg(long, value_delimiter = ',', conflicts_with = "list")]
    parks: Vec<String>,

    /// Named park collection from the master list file
    #[arg(long)]
    list: Option<String>,

    /// Path to the master list JSON file
    #[arg(long, default_value = "master_list.json")]
    master_list: PathBuf,

    /// Only count sites whose declared type matches exactly,
    /// e.g. "STANDARD NONELECTRIC"
    #[arg(long)]
    site_type: Option<String>,

    /// Consecutive nights needed (defaults to the full stay length)
    #[arg(long)]
    nights: Option<u32>,

    /// Reject an out-of-range --nights value instead of widening it to
    /// the stay length
    #[arg(long)]
    strict_nights: bool,

    /// Seconds to wait between poll attempts
    #[arg(long, default_value_t = 6)]
    delay_secs: u64,

    /// Stop after this many scan attempts (default: poll until
    /// availability appears)
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Do not open reservation pages on success
    #[arg(long)]
    no_browser: bool,

    /// Do not play the alert sound on success
    #[arg(long)]
    no_sound: bool,

    /// Sound asset played on success
    #[arg(long, default_value = "assets/success.wav")]
    sound_asset: PathBuf,

    /// Times to repeat the alert sound
    #[arg(long, default_value_t = 3)]
    sound_repeats: u32,

    /// Verbose logging
    #[arg(long, short)]
    verbose: bool,
}

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("campground_scan=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn resolve_parks(cli: &Cli) -> Result<Vec<String>> {
    if !cli.parks.is_empty() {
        return Ok(cli.parks.clone());
    }
    match &cli.list {
        Some(name) => master_list::lookup(&cli.master_list, name),
        None => anyhow::bail!("Provide --parks or --list (see --help)"),
    }
}

fn build_request(cli: &Cli) -> Result<ScanRequest> {
    // Date parsing happens here, before any network activity.
    let range = DateRange::parse(&cli.start_date, &cli.end_date)?;
    let mut request = ScanRequest::new(resolve_parks(cli)?, range);
    request.site_type = cli.site_type.clone();
    request.required_nights = cli.nights;
    request.nights_policy = if cli.strict_nights {
        NightsPolicy::Strict
    } else {
        NightsPolicy::Clamp
    };
    Ok(request)
}

fn notifiers(cli: &Cli, base_url: &str) -> Vec<Arc<dyn Notifier>> {
    let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::new();
    if !cli.no_browser {
        notifiers.push(Arc::new(BrowserNotifier::new(base_url.to_string())));
    }
    if !cli.no_sound {
        notifiers.push(Arc::new(SoundNotifier::new(
            cli.sound_asset.clone(),
            cli.sound_repeats,
        )));
    }
    notifiers
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let request = build_request(&cli)?;

    let mut transport = TransportConfig::default();
    if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
        transport.base_url = base_url;
    }

    info!(
        "🏕 Watching {} park(s) from {} to {}",
        request.parks.len(),
        request.range.start,
        request.range.end
    );

    let client = Arc::new(RecGovClient::new(&transport)?);
    let scanner = CampgroundScanner::new(client, Arc::new(ConsoleReporter));

    let (cancel_tx, cancel_rx) = cancellation_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C, stopping after the current attempt");
            let _ = cancel_tx.send(true);
        }
    });

    let config = PollerConfig {
        delay: Duration::from_secs(cli.delay_secs),
        max_attempts: cli.max_attempts,
    };
    let mut poller = Poller::new(scanner, TokioClock, config, cancel_rx);

    match poller.run(&request).await? {
        PollOutcome::Available(outcome) => {
            for notifier in notifiers(&cli, &transport.base_url) {
                if let Err(e) = notifier.notify(&outcome, &request.range).await {
                    warn!("Notification failed: {}", e);
                }
            }
            Ok(())
        }
        PollOutcome::Cancelled => {
            info!("Stopped before any availability appeared");
            Ok(())
        }
        PollOutcome::AttemptsExhausted => {
            info!("No campsites available after the configured attempts");
            std::process::exit(1);
        }
    }
}
