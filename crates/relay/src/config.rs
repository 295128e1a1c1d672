//! Environment configuration.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use relay_chat::DEFAULT_POLL_INTERVAL;
use session_store::RELAY_HOME_ENV;
use supabase_api::SupabaseConfig;

pub const SUPABASE_URL_ENV: &str = "SUPABASE_URL";
pub const SUPABASE_KEY_ENV: &str = "SUPABASE_KEY";
pub const POLL_INTERVAL_ENV: &str = "RELAY_POLL_INTERVAL_MS";
pub const HTTP_TIMEOUT_ENV: &str = "RELAY_HTTP_TIMEOUT_SEC";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub session_root: Option<PathBuf>,
    pub poll_interval: Duration,
    pub http_timeout: Option<Duration>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            supabase_url: None,
            supabase_key: None,
            session_root: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            http_timeout: None,
        }
    }
}

impl RelayConfig {
    /// Reads the process environment. Call after `.env` has been loaded.
    pub fn from_env() -> Result<Self> {
        let poll_interval = match env_string_opt(POLL_INTERVAL_ENV) {
            Some(raw) => {
                let millis = parse_positive(POLL_INTERVAL_ENV, &raw)?;
                Duration::from_millis(millis)
            }
            None => DEFAULT_POLL_INTERVAL,
        };
        let http_timeout = env_string_opt(HTTP_TIMEOUT_ENV)
            .map(|raw| parse_positive(HTTP_TIMEOUT_ENV, &raw).map(Duration::from_secs))
            .transpose()?;

        Ok(Self {
            supabase_url: env_string_opt(SUPABASE_URL_ENV),
            supabase_key: env_string_opt(SUPABASE_KEY_ENV),
            session_root: env_string_opt(RELAY_HOME_ENV).map(PathBuf::from),
            poll_interval,
            http_timeout,
        })
    }

    /// Transport settings for remote commands.
    pub fn supabase_config(&self) -> Result<SupabaseConfig> {
        let (Some(url), Some(key)) = (&self.supabase_url, &self.supabase_key) else {
            bail!("{SUPABASE_URL_ENV} and {SUPABASE_KEY_ENV} must be set");
        };
        let mut config = SupabaseConfig::new(url.clone(), key.clone());
        if let Some(timeout) = self.http_timeout {
            config = config.with_timeout(timeout);
        }
        Ok(config)
    }
}

fn parse_positive(key: &str, raw: &str) -> Result<u64> {
    let value: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a whole number, got '{raw}'"))?;
    if value == 0 {
        bail!("{key} must be greater than zero");
    }
    Ok(value)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value.trim().to_string())
        }
    })
}
