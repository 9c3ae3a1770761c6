//! Daemon and client configuration, read from the lakectl environment.

use std::env;
use std::path::PathBuf;

use url::Url;

/// Fixed loopback address the daemon binds. Singleton-ness of the daemon is
/// enforced by bind contention on this address.
pub const MOUNT_SERVER_ADDR: &str = "127.0.0.1:6363";

const ENV_ENDPOINT: &str = "LAKECTL_SERVER_ENDPOINT_URL";
const ENV_ACCESS_KEY_ID: &str = "LAKECTL_CREDENTIALS_ACCESS_KEY_ID";
const ENV_SECRET_ACCESS_KEY: &str = "LAKECTL_CREDENTIALS_SECRET_ACCESS_KEY";
const ENV_CACHE_DIR: &str = "LAKECTL_MOUNT_CACHE_DIR";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    MissingVar(&'static str),
    #[error("invalid endpoint URL {url:?}: {source}")]
    InvalidEndpoint {
        url: String,
        source: url::ParseError,
    },
}

/// Upstream connection settings for the daemon.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the upstream server, without the `/api/v1` suffix.
    pub endpoint: Url,
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let endpoint = require_var(ENV_ENDPOINT)?;
        let endpoint = Url::parse(&endpoint).map_err(|source| ConfigError::InvalidEndpoint {
            url: endpoint,
            source,
        })?;
        Ok(Self {
            endpoint,
            access_key_id: require_var(ENV_ACCESS_KEY_ID)?,
            secret_access_key: require_var(ENV_SECRET_ACCESS_KEY)?,
        })
    }
}

fn require_var(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::MissingVar(name)),
    }
}

/// Directory for the on-disk file cache: `$LAKECTL_MOUNT_CACHE_DIR`, or
/// `{temp}/lakefs-mount-cache` when unset.
pub fn cache_dir() -> PathBuf {
    match env::var(ENV_CACHE_DIR) {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => env::temp_dir().join("lakefs-mount-cache"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cache_dir_under_temp() {
        // Only meaningful when the override is not set in the test env.
        if env::var(ENV_CACHE_DIR).is_err() {
            assert!(cache_dir().starts_with(env::temp_dir()));
            assert!(cache_dir().ends_with("lakefs-mount-cache"));
        }
    }
}
