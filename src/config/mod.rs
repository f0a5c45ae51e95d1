//! Configuration for the coffer binary.
//!
//! Loads configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::options::EconomyOptions;

/// Where ledger data lives.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process only; everything is lost on exit.
    #[default]
    Memory,
    #[serde(alias = "mongodb")]
    Mongo,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub store_backend: StoreBackend,

    // MongoDB
    pub mongodb_uri: Option<String>,
    pub mongodb_database: String,
    pub mongodb_collection: String,

    /// Guild ids whose cache is filled at boot (comma-separated)
    pub warm_guilds: Vec<String>,

    pub economy: EconomyOptions,
}

impl Config {
    /// Load configuration from the process environment and `.env`.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value
    /// if it is set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let backend = lookup("STORE_BACKEND").unwrap_or_else(|| "memory".to_string());
        let store_backend: StoreBackend =
            serde_json::from_value(Value::String(backend.trim().to_lowercase()))
                .with_context(|| format!("STORE_BACKEND must be 'memory' or 'mongo', got '{backend}'"))?;

        let mongodb_uri = lookup("MONGODB_URI").filter(|uri| !uri.is_empty());

        // Validate the URI is set if the backend needs it
        if store_backend == StoreBackend::Mongo && mongodb_uri.is_none() {
            bail!("MONGODB_URI must be set when STORE_BACKEND is mongo");
        }

        let warm_guilds = lookup("WARM_GUILDS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            store_backend,
            mongodb_uri,
            mongodb_database: lookup("MONGODB_DATABASE").unwrap_or_else(|| "coffer".to_string()),
            mongodb_collection: lookup("MONGODB_COLLECTION").unwrap_or_else(|| "economy".to_string()),
            warm_guilds,
            economy: economy_options(&lookup)?,
        })
    }
}

fn economy_options(lookup: &impl Fn(&str) -> Option<String>) -> Result<EconomyOptions> {
    let mut options = EconomyOptions::default();

    if let Some(amount) = parse(lookup, "DAILY_AMOUNT")? {
        options = options.daily_amount(amount);
    }
    if let Some(amount) = parse(lookup, "WORK_AMOUNT")? {
        options = options.work_amount(amount);
    }
    if let Some(amount) = parse(lookup, "WEEKLY_AMOUNT")? {
        options = options.weekly_amount(amount);
    }
    if let Some(secs) = parse(lookup, "DAILY_COOLDOWN_SECS")? {
        options = options.daily_cooldown(Duration::from_secs(secs));
    }
    if let Some(secs) = parse(lookup, "WORK_COOLDOWN_SECS")? {
        options = options.work_cooldown(Duration::from_secs(secs));
    }
    if let Some(secs) = parse(lookup, "WEEKLY_COOLDOWN_SECS")? {
        options = options.weekly_cooldown(Duration::from_secs(secs));
    }
    if let Some(percent) = parse(lookup, "SELL_PERCENT")? {
        options = options.sell_percent(percent);
    }
    if let Some(enabled) = parse(lookup, "SUBTRACT_ON_BUY")? {
        options = options.subtract_on_buy(enabled);
    }
    if let Some(enabled) = parse(lookup, "SAVE_PURCHASES_HISTORY")? {
        options = options.save_purchases_history(enabled);
    }

    Ok(options)
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| raw.trim().parse::<T>().with_context(|| format!("invalid {key}: '{raw}'")))
        .transpose()
}
