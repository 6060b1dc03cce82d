//! `aegis-command` binary: drives the command layer from the terminal.
//!
//! ```bash
//! aegis-command sync
//! aegis-command --lat 34.2 --lng -119.2 logistics --sync
//! aegis-command satellite capture.png
//! aegis-command briefing --out briefing.pcm --seconds 90
//! aegis-command config set --voice Kore --max-retries 3
//! ```
//!
//! Every command prints its `CommandResponse` as pretty JSON on stdout; logs
//! go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use aegis_command::commands;
use aegis_command::models::response::CommandResponse;
use aegis_command::models::settings::{AppConfig, SettingsUpdate};
use aegis_command::services::briefing::{BriefingStats, PcmFileSink};
use aegis_command::state::AppState;
use aegis_command::storage::ConfigService;
use aegis_command_core::Coordinates;
use aegis_command_llm::RetryPolicy;

/// Aegis Command disaster-intel console
#[derive(Parser, Debug)]
#[command(name = "aegis-command", version, about = "Disaster monitoring intel console")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the JSON configuration file (default: ~/.aegis-command/config.json)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Caller latitude used to bias the live incident search
    #[arg(long, global = true, allow_negative_numbers = true, requires = "lng")]
    lat: Option<f64>,

    /// Caller longitude used to bias the live incident search
    #[arg(long, global = true, allow_negative_numbers = true, requires = "lat")]
    lng: Option<f64>,

    /// Log filter (trace, debug, info, warn, error or a RUST_LOG directive)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a live incident, social chatter and predictions
    Sync,

    /// Show the current working set
    Dashboard {
        /// Run a sync first
        #[arg(long)]
        sync: bool,
    },

    /// Classify a satellite image
    Satellite {
        /// Image file (PNG, JPEG, GIF or WebP)
        file: PathBuf,
    },

    /// Generate a response plan for a confirmed incident
    Logistics {
        /// Alert to plan for (default: the first live alert)
        #[arg(long)]
        alert_id: Option<String>,

        /// Run a sync first
        #[arg(long)]
        sync: bool,
    },

    /// Generate a prevention blueprint
    Prevention {
        /// Disaster type to prepare for
        #[arg(long)]
        target: Option<String>,

        /// Region the blueprint covers
        #[arg(long)]
        location: Option<String>,
    },

    /// Sync, then run sentiment analysis over the synthesized social feed
    Social,

    /// Stream a spoken briefing of the current alerts to a raw PCM file
    Briefing {
        /// Output file (16-bit little-endian mono PCM, 24 kHz)
        #[arg(long, value_name = "FILE")]
        out: PathBuf,

        /// Stop the briefing after this many seconds
        #[arg(long, default_value_t = 120)]
        seconds: u64,

        /// Run a sync first
        #[arg(long)]
        sync: bool,
    },

    /// Inspect or change the configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand, Debug, Clone)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Change settings and write them back to the configuration file
    Set(ConfigSetArgs),
}

#[derive(Args, Debug, Clone, Default)]
struct ConfigSetArgs {
    /// Model for structured and search-grounded generation
    #[arg(long)]
    model: Option<String>,

    /// Model for live audio briefings
    #[arg(long)]
    live_model: Option<String>,

    /// Prebuilt voice for briefings
    #[arg(long)]
    voice: Option<String>,

    /// Environment variable holding the API key
    #[arg(long)]
    api_key_env: Option<String>,

    /// REST endpoint override
    #[arg(long)]
    base_url: Option<String>,

    /// Retries after a rate-limited call
    #[arg(long)]
    max_retries: Option<u32>,

    /// Delay before the first retry, doubled on each attempt
    #[arg(long)]
    initial_delay_ms: Option<u64>,

    /// Maximum number of alerts kept in the working set
    #[arg(long)]
    alert_capacity: Option<usize>,

    /// Replace predictions with a deduplicated set (true or false)
    #[arg(long)]
    dedupe_predictions: Option<bool>,

    /// Default caller latitude
    #[arg(long, allow_negative_numbers = true, requires = "default_lng")]
    default_lat: Option<f64>,

    /// Default caller longitude
    #[arg(long, allow_negative_numbers = true, requires = "default_lat")]
    default_lng: Option<f64>,
}

impl ConfigSetArgs {
    /// Build a partial update; retry fields left out keep their current value.
    fn into_update(self, current: &AppConfig) -> SettingsUpdate {
        let retry = (self.max_retries.is_some() || self.initial_delay_ms.is_some()).then(|| {
            RetryPolicy {
                max_retries: self.max_retries.unwrap_or(current.retry.max_retries),
                initial_delay_ms: self
                    .initial_delay_ms
                    .unwrap_or(current.retry.initial_delay_ms),
            }
        });
        let default_location = match (self.default_lat, self.default_lng) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
            _ => None,
        };

        SettingsUpdate {
            model: self.model,
            live_model: self.live_model,
            voice: self.voice,
            api_key_env: self.api_key_env,
            base_url: self.base_url,
            retry,
            alert_capacity: self.alert_capacity,
            dedupe_predictions: self.dedupe_predictions,
            default_location,
            proxy: None,
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn report<T: Serialize>(response: &CommandResponse<T>) -> anyhow::Result<ExitCode> {
    print_json(response)?;
    Ok(if response.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Run a sync ahead of another command; abort if it fails.
async fn presync(state: &AppState) -> anyhow::Result<Option<ExitCode>> {
    let response = commands::trigger_sync(state).await;
    if response.success {
        return Ok(None);
    }
    report(&response).map(Some)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // RUST_LOG wins over --log-level when set
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config_service = match &cli.config {
        Some(path) => ConfigService::open(path)?,
        None => ConfigService::new()?,
    };

    if let Command::Config { action } = &cli.command {
        match action {
            None | Some(ConfigAction::Show) => print_json(config_service.get_config())?,
            Some(ConfigAction::Path) => println!("{}", config_service.path().display()),
            Some(ConfigAction::Set(args)) => {
                let update = args.clone().into_update(config_service.get_config());
                let updated = config_service.update_config(update)?;
                tracing::info!(path = %config_service.path().display(), "configuration saved");
                print_json(&updated)?;
            }
        }
        return Ok(ExitCode::SUCCESS);
    }

    let mut state = AppState::from_config(config_service.get_config().clone())?;
    if let (Some(lat), Some(lng)) = (cli.lat, cli.lng) {
        state.set_location(Some(Coordinates::new(lat, lng)))?;
    }

    match cli.command {
        Command::Sync => report(&commands::trigger_sync(&state).await),
        Command::Dashboard { sync } => {
            if sync {
                if let Some(code) = presync(&state).await? {
                    return Ok(code);
                }
            }
            report(&commands::get_dashboard(&state).await)
        }
        Command::Satellite { file } => {
            report(&commands::analyze_satellite_image(&state, &file).await)
        }
        Command::Logistics { alert_id, sync } => {
            if sync {
                if let Some(code) = presync(&state).await? {
                    return Ok(code);
                }
            }
            report(&commands::generate_logistics_plan(&state, alert_id.as_deref()).await)
        }
        Command::Prevention { target, location } => report(
            &commands::generate_prevention_strategy(
                &state,
                target.as_deref(),
                location.as_deref(),
            )
            .await,
        ),
        Command::Social => {
            if let Some(code) = presync(&state).await? {
                return Ok(code);
            }
            report(&commands::analyze_social_feed(&state).await)
        }
        Command::Briefing { out, seconds, sync } => {
            if sync {
                if let Some(code) = presync(&state).await? {
                    return Ok(code);
                }
            }
            let sink = PcmFileSink::create(&out)?;
            let started = commands::start_briefing(&state, Box::new(sink)).await;
            if !started.success {
                return report(&started);
            }
            let stats: CommandResponse<Option<BriefingStats>> = state
                .briefing()
                .finish(Duration::from_secs(seconds))
                .await
                .into();
            report(&stats)
        }
        Command::Config { .. } => Ok(ExitCode::SUCCESS),
    }
}
