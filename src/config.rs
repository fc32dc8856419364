use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BIND: &str = "127.0.0.1:3000";
const DEFAULT_DATABASE_DIR: &str = "database";
const DEFAULT_WEBHOOK_TIMEOUT_SECS: u64 = 120;
const DEFAULT_SESSION_HOURS: u64 = 24;

/// Runtime settings, read once from the environment at start-up
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Address the HTTP server listens on (`DASHBOARD_BIND`)
    pub bind: String,
    /// Directory holding `users.json` and `profiles.json` (`DATABASE_DIR`)
    pub database_dir: PathBuf,
    /// Dataset webhook (`N8N_DATASET_URL`)
    pub dataset_url: Option<String>,
    /// Prompt-to-image webhook (`N8N_IMAGE_URL`)
    pub image_url: Option<String>,
    /// Image-to-description webhook (`N8N_DESCRIBE_URL`)
    pub describe_url: Option<String>,
    /// Per-request timeout for webhook calls (`WEBHOOK_TIMEOUT_SECS`)
    pub webhook_timeout: Duration,
    /// Lifetime of a sign-in session (`SESSION_HOURS`)
    pub session_lifetime: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            database_dir: PathBuf::from(DEFAULT_DATABASE_DIR),
            dataset_url: None,
            image_url: None,
            describe_url: None,
            webhook_timeout: Duration::from_secs(DEFAULT_WEBHOOK_TIMEOUT_SECS),
            session_lifetime: Duration::from_secs(DEFAULT_SESSION_HOURS * 60 * 60),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let seconds = |key: &str, default: u64| {
            get(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };
        let defaults = Config::default();

        Self {
            bind: get("DASHBOARD_BIND").unwrap_or(defaults.bind),
            database_dir: get("DATABASE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_dir),
            dataset_url: get("N8N_DATASET_URL"),
            image_url: get("N8N_IMAGE_URL"),
            describe_url: get("N8N_DESCRIBE_URL"),
            webhook_timeout: Duration::from_secs(seconds(
                "WEBHOOK_TIMEOUT_SECS",
                DEFAULT_WEBHOOK_TIMEOUT_SECS,
            )),
            session_lifetime: Duration::from_secs(
                seconds("SESSION_HOURS", DEFAULT_SESSION_HOURS) * 60 * 60,
            ),
        }
    }
}
