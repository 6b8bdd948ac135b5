use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use zonda_core::{
    AlertPolicy, Config, Dispatcher, ProviderId, format,
    provider::{WeatherProvider, default_provider_from_config, provider_from_config},
};

use crate::telegram::{self, TelegramChannel};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "zonda-bot", version, about = "Potrerillos weather and zonda alert bot")]
pub struct Cli {
    /// Verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PolicyArg {
    /// Four tiers: severe zonda, storm watch, caution, normal
    Zonda,
    /// Single strong-gust threshold
    Legacy,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key for a weather provider.
    Configure {
        /// Provider short name, e.g. "openweather" or "weatherapi".
        provider: String,
    },

    /// Fetch current conditions once and print the report.
    Report {
        /// Override the configured alert policy.
        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,

        /// Override the configured provider.
        #[arg(long)]
        provider: Option<String>,
    },

    /// Answer Telegram messages until interrupted.
    Run,
}

fn load_config() -> anyhow::Result<Config> {
    let mut config = Config::load()?;
    config.apply_env(|name| std::env::var(name).ok());
    Ok(config)
}

fn resolve_provider(
    config: &Config,
    explicit: Option<&str>,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    if let Some(name) = explicit {
        return Ok(provider_from_config(ProviderId::try_from(name)?, config));
    }

    match default_provider_from_config(config) {
        Ok(provider) => Ok(provider),
        Err(err) => {
            warn!(error = %err, "Falling back to openweather");
            Ok(provider_from_config(ProviderId::OpenWeather, config))
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => {
                let id = ProviderId::try_from(provider.as_str())?;
                let mut config = Config::load()?;

                let api_key = inquire::Password::new(&format!("API key for {id}:"))
                    .without_confirmation()
                    .prompt()
                    .context("Failed to read API key")?;

                config.upsert_provider_api_key(id, api_key.trim().to_string());
                config.save()?;

                println!("Saved {id} credentials to {}", Config::config_file_path()?.display());
            }
            Command::Report { policy, provider } => {
                let mut config = load_config()?;
                match policy {
                    Some(PolicyArg::Zonda) => config.alerts = AlertPolicy::zonda(),
                    Some(PolicyArg::Legacy) => config.alerts = AlertPolicy::legacy(),
                    None => {}
                }

                let provider = resolve_provider(&config, provider.as_deref())?;
                let dispatcher = Dispatcher::from_config(&config, provider);

                match dispatcher.current_report().await {
                    Ok(report) => {
                        println!("{}", format::render_report(&report, &config.location.name));
                    }
                    Err(err) => {
                        println!("{}", format::SENSORS_UNAVAILABLE);
                        return Err(err).context("Could not fetch current conditions");
                    }
                }
            }
            Command::Run => {
                let config = load_config()?;
                let channel = TelegramChannel::new(config.telegram_token()?);
                let provider = resolve_provider(&config, None)?;
                let dispatcher = Dispatcher::from_config(&config, provider);

                info!(
                    location = %config.location.name,
                    policy = dispatcher.policy().name(),
                    "Starting zonda monitor"
                );

                tokio::select! {
                    res = telegram::run(&channel, &dispatcher) => res?,
                    _ = tokio::signal::ctrl_c() => info!("Shutting down"),
                }
            }
        }

        Ok(())
    }
}
