use anyhow::{anyhow, Context};
use chrono::NaiveDate;
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedMode {
    Demo,
    Empty,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub seed: SeedMode,
    /// Anchor for the demo attendance window; `None` means today (UTC).
    pub today: Option<NaiveDate>,
    pub log_filter: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let seed = match lookup("SCHOOLD_SEED")
            .map(|v| v.trim().to_ascii_lowercase())
            .as_deref()
        {
            None | Some("") | Some("demo") => SeedMode::Demo,
            Some("empty") => SeedMode::Empty,
            Some(other) => {
                return Err(anyhow!(
                    "SCHOOLD_SEED must be 'demo' or 'empty', got '{}'",
                    other
                ))
            }
        };

        let today = match lookup("SCHOOLD_TODAY") {
            Some(v) if !v.trim().is_empty() => Some(
                NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d")
                    .with_context(|| format!("SCHOOLD_TODAY must be YYYY-MM-DD, got '{}'", v))?,
            ),
            _ => None,
        };

        let log_filter = lookup("SCHOOLD_LOG")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "info".to_string());

        Ok(Self {
            seed,
            today,
            log_filter,
        })
    }
}
