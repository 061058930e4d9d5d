//! Env-driven configuration for the service and library.
//!
//! Values are read from the process environment once at startup; `dotenv` is
//! loaded on demand by the binaries. The resulting `Config` is read-only and is
//! handed to `DifyClient::new` explicitly.
use std::env;

pub const DEFAULT_DIFY_API_URL: &str = "https://api.dify.ai/v1";
pub const DEFAULT_USER_TAG: &str = "web-user";
/// Request body cap for the HTTP proxy; two phone photos plus multipart overhead.
pub const DEFAULT_MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct Config {
    pub dify_api_url: String,
    /// Empty means "not configured".
    pub dify_api_key: String,
    pub user_tag: String,
    pub api_host: String,
    pub api_port: String,
    pub max_body_bytes: usize,
}

impl Config {
    pub fn dotenv_load() {
        dotenv::dotenv().ok();
    }

    pub fn new() -> Result<Self, env::VarError> {
        Ok(Config {
            dify_api_url: env::var("DIFY_API_URL")
                .unwrap_or_else(|_| DEFAULT_DIFY_API_URL.to_string()),
            dify_api_key: env::var("DIFY_API_KEY").unwrap_or_default(),
            user_tag: env::var("DIFY_USER").unwrap_or_else(|_| DEFAULT_USER_TAG.to_string()),
            api_host: env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            api_port: env::var("API_PORT").unwrap_or_else(|_| "8190".to_string()),
            max_body_bytes: parse_body_limit(
                env::var("API_MAX_BODY_BYTES").ok().as_deref(),
            ),
        })
    }

    pub fn has_api_key(&self) -> bool {
        !self.dify_api_key.trim().is_empty()
    }

    pub fn print_env_vars(&self) {
        println!("DIFY_API_URL: {}", self.dify_api_url);
        let key_state = if self.has_api_key() { "Set (hidden)" } else { "Not set" };
        println!("DIFY_API_KEY: {}", key_state);
        println!("DIFY_USER: {}", self.user_tag);
        println!("API_HOST: {}", self.api_host);
        println!("API_PORT: {}", self.api_port);
        println!("API_MAX_BODY_BYTES: {}", self.max_body_bytes);
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            dify_api_url: DEFAULT_DIFY_API_URL.to_string(),
            dify_api_key: String::new(),
            user_tag: DEFAULT_USER_TAG.to_string(),
            api_host: "127.0.0.1".to_string(),
            api_port: "8190".to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

fn parse_body_limit(raw: Option<&str>) -> usize {
    match raw.map(str::trim) {
        None | Some("") => DEFAULT_MAX_BODY_BYTES,
        Some(v) => v.parse().unwrap_or_else(|_| {
            tracing::warn!(
                "Invalid API_MAX_BODY_BYTES '{}', falling back to {}",
                v,
                DEFAULT_MAX_BODY_BYTES
            );
            DEFAULT_MAX_BODY_BYTES
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_hosted_dify() {
        let cfg = Config::default();
        assert_eq!(cfg.dify_api_url, "https://api.dify.ai/v1");
        assert_eq!(cfg.user_tag, "web-user");
        assert!(!cfg.has_api_key());
    }

    #[test]
    fn body_limit_parses_or_falls_back() {
        assert_eq!(parse_body_limit(None), DEFAULT_MAX_BODY_BYTES);
        assert_eq!(parse_body_limit(Some("1048576")), 1_048_576);
        assert_eq!(parse_body_limit(Some(" 2048 ")), 2048);
        assert_eq!(parse_body_limit(Some("lots")), DEFAULT_MAX_BODY_BYTES);
        assert!(Config::default().max_body_bytes > 2 * 1024 * 1024);
    }

    #[test]
    fn whitespace_key_is_not_configured() {
        let cfg = Config { dify_api_key: "   ".into(), ..Config::default() };
        assert!(!cfg.has_api_key());
        let cfg = Config { dify_api_key: "app-123".into(), ..Config::default() };
        assert!(cfg.has_api_key());
    }
}
