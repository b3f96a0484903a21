use std::path::PathBuf;
use std::time::Duration;

use jobwatch_panel::DEFAULT_POLL_INTERVAL;

/// Default state directory, relative to the working directory.
const DEFAULT_STATE_DIR: &str = ".jobwatch";

/// Default application id sent with signed requests.
const DEFAULT_APP_ID: &str = "jobwatch";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Front-end configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Base URL of the migration backend. Only needed by commands that
    /// contact it.
    pub backend_url: Option<String>,
    /// Directory holding the persisted history.
    pub state_dir: PathBuf,
    pub poll_interval: Duration,
    /// Per-request timeout; unbounded when unset.
    pub request_timeout: Option<Duration>,
    pub app_id: String,
    /// Shared signing secret. Requests go out unsigned when unset.
    pub signing_secret: Option<String>,
}

impl PanelConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default        |
    /// |-------------------------|----------------|
    /// | `MIGRATION_BACKEND_URL` | --             |
    /// | `JOBWATCH_STATE_DIR`    | `.jobwatch`    |
    /// | `POLL_INTERVAL_SECS`    | `3`            |
    /// | `REQUEST_TIMEOUT_SECS`  | unset          |
    /// | `APP_ID`                | `jobwatch`     |
    /// | `APP_SIGNING_SECRET`    | unset          |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let poll_interval = match non_empty("POLL_INTERVAL_SECS") {
            Some(v) => Duration::from_secs(parse_positive_secs("POLL_INTERVAL_SECS", &v)?),
            None => DEFAULT_POLL_INTERVAL,
        };

        let request_timeout = non_empty("REQUEST_TIMEOUT_SECS")
            .map(|v| parse_positive_secs("REQUEST_TIMEOUT_SECS", &v).map(Duration::from_secs))
            .transpose()?;

        Ok(Self {
            backend_url: non_empty("MIGRATION_BACKEND_URL"),
            state_dir: non_empty("JOBWATCH_STATE_DIR")
                .unwrap_or_else(|| DEFAULT_STATE_DIR.into())
                .into(),
            poll_interval,
            request_timeout,
            app_id: non_empty("APP_ID").unwrap_or_else(|| DEFAULT_APP_ID.into()),
            signing_secret: non_empty("APP_SIGNING_SECRET"),
        })
    }

    pub fn require_backend_url(&self) -> Result<&str, ConfigError> {
        self.backend_url
            .as_deref()
            .ok_or(ConfigError::Missing("MIGRATION_BACKEND_URL"))
    }
}

fn parse_positive_secs(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::Invalid {
            name,
            expected: "a positive whole number of seconds",
            value: value.to_string(),
        }),
    }
}
