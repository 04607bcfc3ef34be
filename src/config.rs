use crate::constants::{ENV_MODE, ENV_TIMEOUT_MS};
use crate::Timeout;
use std::env;
use std::time::Duration;
use tracing::warn;

/// Router settings.
///
/// `timeout` applies to the requests a router owns, so every router of a tree has its own.
/// The other settings are taken from the router that is built.
#[derive(Debug, Clone, Default)]
pub struct RouterConfig {
    pub timeout: Timeout,
    /// A path prefix stripped from request paths before matching, e.g. `/api`.
    pub base_path: String,
    /// Send what callbacks return. See [`Reply`](crate::Reply).
    pub treat_return_as_response: bool,
    /// Include error details in the body of the built-in 500 response.
    pub development: bool,
}

impl RouterConfig {
    /// Reads `WAYPOST_ENV` and `WAYPOST_TIMEOUT_MS`.
    ///
    /// `WAYPOST_ENV=development` enables development mode. A timeout of `0` disables the
    /// timeout. Invalid values are ignored with a warning.
    pub fn from_env() -> RouterConfig {
        let mut config = RouterConfig {
            development: env::var(ENV_MODE).map(|mode| mode == "development").unwrap_or(false),
            ..RouterConfig::default()
        };

        if let Ok(raw) = env::var(ENV_TIMEOUT_MS) {
            match raw.trim().parse::<u64>() {
                Ok(0) => config.timeout = Timeout::Disabled,
                Ok(ms) => config.timeout = Timeout::After(Duration::from_millis(ms)),
                Err(err) => warn!(value = %raw, error = %err, "ignoring invalid {}", ENV_TIMEOUT_MS),
            }
        }

        config
    }

    pub(crate) fn normalize_base_path(path: &str) -> String {
        let trimmed = path.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else if trimmed.starts_with('/') {
            trimmed.to_owned()
        } else {
            format!("/{}", trimmed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_normalize_base_path() {
        assert_eq!(RouterConfig::normalize_base_path("/api/"), "/api");
        assert_eq!(RouterConfig::normalize_base_path("api"), "/api");
        assert_eq!(RouterConfig::normalize_base_path("/"), "");
        assert_eq!(RouterConfig::normalize_base_path(""), "");
    }

    #[test]
    fn should_default_to_production_with_timeout() {
        let config = RouterConfig::default();
        assert!(!config.development);
        assert!(!config.treat_return_as_response);
        assert!(matches!(config.timeout, Timeout::After(d) if d == Duration::from_secs(20)));
    }
}
