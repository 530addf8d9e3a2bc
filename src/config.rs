use crate::helper::image_helpers::ImageResolver;
use crate::helper::section_helpers::{default_home_sections, CategorySection};
use crate::models::api_operations::{ApiClient, ApiError};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub web: WebConfig,
    // Populated from the .env file
    pub backend_url: Option<String>,
    pub content_file: Option<String>,
    pub session_secret_key: String,
    pub s3_bucket_name: String,
    pub s3_bucket_url: Option<String>,
    pub default_image: String,
    pub allowed_origins: String,
    pub log_level: String,
    pub use_secure_cookies: bool,
    pub request_timeout_secs: u64,
    pub probe_images: bool,
    pub ticker_interval_secs: u64,
    // Optional [[home_sections]] tables in config/default.toml
    #[serde(default = "default_home_sections")]
    pub home_sections: Vec<CategorySection>,
}

fn fatal(message: String) -> config::ConfigError {
    config::ConfigError::Message(format!("FATAL: {}", message))
}

fn parse_flag(name: &str, raw: Option<String>) -> bool {
    raw.map(|v| v.trim().parse::<bool>().unwrap_or_else(|_| {
        log::warn!("'{}' is not true/false, treating it as false.", name);
        false
    }))
    .unwrap_or(false)
}

fn parse_seconds(name: &str, raw: Option<String>, default: u64) -> Result<u64, config::ConfigError> {
    match raw {
        None => Ok(default),
        Some(v) => match v.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(secs),
            _ => Err(fatal(format!("'{}' must be a positive whole number of seconds, got '{}'.", name, v))),
        },
    }
}

impl Config {
    pub fn from_env(env_path: &Path) -> Result<Self, config::ConfigError> {
        // Load the specified .env file. Propagate an error if it fails.
        dotenvy::from_path(env_path).map_err(|e| {
            fatal(format!("Failed to load .env file from '{}'. Error: {}", env_path.display(), e))
        })?;
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Validates the environment as seen through `lookup` and layers it over
    /// `config/default.toml`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, config::ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let session_secret_key = var("SESSION_SECRET_KEY")
            .ok_or_else(|| {
                fatal("Environment variable 'SESSION_SECRET_KEY' is not set in your .env file.".to_string())
            })?;
        // It must be 128 hex characters (64 bytes).
        if session_secret_key.len() != 128 || !session_secret_key.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(fatal(
                "'SESSION_SECRET_KEY' must be 128 hexadecimal characters long (64 bytes).".to_string(),
            ));
        }

        let backend_url = var("BACKEND_URL");
        let content_file = var("CONTENT_FILE");
        match &backend_url {
            Some(raw) => {
                let parsed = Url::parse(raw)
                    .map_err(|e| fatal(format!("'BACKEND_URL' is not a valid URL ('{}'): {}", raw, e)))?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(fatal(format!("'BACKEND_URL' must be an http(s) URL, got '{}'.", raw)));
                }
            }
            None if content_file.is_none() => {
                return Err(fatal("Either 'BACKEND_URL' or 'CONTENT_FILE' must be set in your .env file.".to_string()));
            }
            None => {}
        }

        let s3_bucket_url = var("S3_BUCKET_URL");
        if let Some(url) = &s3_bucket_url {
            if !url.starts_with("https://") {
                return Err(fatal(format!("'S3_BUCKET_URL' must start with https://, got '{}'.", url)));
            }
        }

        let s3_bucket_name = var("S3_BUCKET_NAME").unwrap_or_else(|| "wcrt-content-images".to_string());
        let default_image = var("DEFAULT_IMAGE").unwrap_or_else(|| "/static/article.jpg".to_string());
        let allowed_origins = var("ALLOWED_ORIGINS").unwrap_or_default();
        let log_level = var("LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let use_secure_cookies = parse_flag("USE_SECURE_COOKIES", var("USE_SECURE_COOKIES"));
        let probe_images = parse_flag("PROBE_IMAGES", var("PROBE_IMAGES"));
        let request_timeout_secs = parse_seconds("REQUEST_TIMEOUT_SECS", var("REQUEST_TIMEOUT_SECS"), 15)?;
        let ticker_interval_secs = parse_seconds("TICKER_INTERVAL_SECS", var("TICKER_INTERVAL_SECS"), 5)?;

        let builder = config::Config::builder()
            .set_default("web.host", "127.0.0.1")?
            .set_default("web.port", 8080)?
            // Base settings (web host/port, homepage sections) from the TOML file.
            .add_source(config::File::new("config/default.toml", config::FileFormat::Toml).required(false))
            .set_override_option("backend_url", backend_url)?
            .set_override_option("content_file", content_file)?
            .set_override("session_secret_key", session_secret_key)?
            .set_override("s3_bucket_name", s3_bucket_name)?
            .set_override_option("s3_bucket_url", s3_bucket_url)?
            .set_override("default_image", default_image)?
            .set_override("allowed_origins", allowed_origins)?
            .set_override("log_level", log_level)?
            .set_override("use_secure_cookies", use_secure_cookies)?
            .set_override("probe_images", probe_images)?
            .set_override("request_timeout_secs", request_timeout_secs as i64)?
            .set_override("ticker_interval_secs", ticker_interval_secs as i64)?
            .build()?;

        builder.try_deserialize()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn ticker_interval(&self) -> Duration {
        Duration::from_secs(self.ticker_interval_secs)
    }

    pub fn image_resolver(&self) -> ImageResolver {
        ImageResolver::new(&self.s3_bucket_name, self.s3_bucket_url.as_deref(), &self.default_image)
    }

    /// The backend client, or `None` when the site only serves a content file.
    pub fn api_client(&self) -> Result<Option<ApiClient>, ApiError> {
        self.backend_url
            .as_deref()
            .map(|url| ApiClient::new(url, self.request_timeout()))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn key() -> String {
        "ab".repeat(64)
    }

    fn load(vars: &[(&str, &str)]) -> Result<Config, config::ConfigError> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_fill_optional_values() {
        let config = load(&[("SESSION_SECRET_KEY", &key()), ("BACKEND_URL", "https://api.example.org")]).unwrap();
        assert_eq!(config.s3_bucket_name, "wcrt-content-images");
        assert_eq!(config.default_image, "/static/article.jpg");
        assert_eq!(config.request_timeout_secs, 15);
        assert_eq!(config.ticker_interval_secs, 5);
        assert!(!config.probe_images);
        assert!(config.s3_bucket_url.is_none());
        assert_eq!(config.home_sections.len(), 8);
        assert!(config.api_client().unwrap().is_some());
    }

    #[test]
    fn short_session_key_is_fatal() {
        let err = load(&[("SESSION_SECRET_KEY", "abc"), ("BACKEND_URL", "https://api.example.org")]).unwrap_err();
        assert!(err.to_string().contains("FATAL"));
    }

    #[test]
    fn needs_a_content_source() {
        assert!(load(&[("SESSION_SECRET_KEY", &key())]).is_err());
        let bundled = load(&[("SESSION_SECRET_KEY", &key()), ("CONTENT_FILE", "content.json")]).unwrap();
        assert!(bundled.api_client().unwrap().is_none());
    }

    #[test]
    fn rejects_bad_urls_and_numbers() {
        assert!(load(&[("SESSION_SECRET_KEY", &key()), ("BACKEND_URL", "ftp://x")]).is_err());
        assert!(load(&[
            ("SESSION_SECRET_KEY", &key()),
            ("BACKEND_URL", "https://api.example.org"),
            ("S3_BUCKET_URL", "http://insecure")
        ])
        .is_err());
        assert!(load(&[
            ("SESSION_SECRET_KEY", &key()),
            ("BACKEND_URL", "https://api.example.org"),
            ("TICKER_INTERVAL_SECS", "0")
        ])
        .is_err());
    }
}
