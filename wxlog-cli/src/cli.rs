use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::{fs, path::PathBuf};
use wxlog_core::{
    Config, Location, WeatherError, WeatherService, WeatherStore, evaluate, fetcher_from_config,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "wxlog", version, about = "Fetch, log and alert on current weather")]
pub struct Cli {
    /// SQLite database file (overrides the configured path).
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key.
    Configure {
        /// Key to store; prompts when omitted.
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Fetch current weather, record it and show recent history with alerts.
    Show {
        /// City ("London"), city with country ("London,GB") or "lat,lon".
        #[arg(allow_hyphen_values = true)]
        location: String,

        /// Maximum number of history rows to show.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show stored readings for a city without fetching.
    History {
        /// Exact city name as stored.
        city: String,

        #[arg(long)]
        limit: Option<usize>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let mut config = Config::load()?;

        match self.command {
            Command::Configure { api_key } => {
                let api_key = match api_key {
                    Some(key) => key,
                    None => inquire::Password::new("OpenWeather API key:")
                        .without_confirmation()
                        .prompt()
                        .context("Failed to read API key")?,
                };
                if api_key.trim().is_empty() {
                    anyhow::bail!("API key must not be empty");
                }

                config.set_api_key(api_key.trim().to_string());
                config.save()?;
                let path = Config::config_file_path()?;
                println!("Saved configuration to {}", path.display());
            }
            Command::Show { location, limit } => {
                let location: Location = location.parse().map_err(user_facing)?;
                let store = open_store(&config, self.db)?;
                let fetcher = fetcher_from_config(&config)?;
                let limit = limit.unwrap_or(config.history_limit);

                let service = WeatherService::new(fetcher, store, config.thresholds, limit);
                let observation = service.observe(&location).await.map_err(user_facing)?;

                print!("{}", render::observation(&observation));
            }
            Command::History { city, limit } => {
                let store = open_store(&config, self.db)?;
                let limit = limit.unwrap_or(config.history_limit);
                let history = store.fetch_recent(&city, limit).map_err(user_facing)?;

                match history.first() {
                    None => println!("No readings stored for '{city}'."),
                    Some(latest) => {
                        let alerts = evaluate(latest, &config.thresholds);
                        print!("{}", render::history(&history));
                        print!("{}", render::alerts(&alerts));
                    }
                }
            }
        }

        Ok(())
    }
}

fn open_store(config: &Config, override_path: Option<PathBuf>) -> Result<WeatherStore> {
    let path = match override_path {
        Some(path) => path,
        None => config.database_path()?,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;
    }

    WeatherStore::open(&path)
        .with_context(|| format!("Failed to open database: {}", path.display()))
}

/// Show the short message to the user, keep the details in the log.
fn user_facing(err: WeatherError) -> anyhow::Error {
    tracing::debug!("{err}");
    anyhow::anyhow!(err.user_message())
}
