use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;

use gallery_core::util::is_http_url;
use gallery_core::DeliveryLocation;
use thiserror::Error;
use url::Url;

const DEFAULT_LIST_MAX_RESULTS: u32 = 100;
const DEFAULT_UPLOAD_MAX_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub api_base_url: String,
    pub delivery_base_url: String,
    pub list_max_results: u32,
    pub upload_max_bytes: usize,
    pub upstream_timeout: Option<Duration>,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .field("delivery_base_url", &self.delivery_base_url)
            .field("list_max_results", &self.list_max_results)
            .field("upload_max_bytes", &self.upload_max_bytes)
            .field("upstream_timeout", &self.upstream_timeout)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = value_or_default(&lookup, "GALLERY_API_BIND_ADDR", "127.0.0.1:8080");

        let cloud_name = required_trimmed(&lookup, "CLOUDINARY_CLOUD_NAME")?;
        if cloud_name.contains('/') {
            return Err(ConfigError::Invalid(
                "CLOUDINARY_CLOUD_NAME must not contain `/`".to_string(),
            ));
        }
        let api_key = required_trimmed(&lookup, "CLOUDINARY_API_KEY")?;
        let api_secret = required_trimmed(&lookup, "CLOUDINARY_API_SECRET")?;

        let api_base_url = base_url(
            &lookup,
            "CLOUDINARY_API_BASE_URL",
            "https://api.cloudinary.com",
        )?;
        let delivery_base_url = base_url(
            &lookup,
            "CLOUDINARY_DELIVERY_BASE_URL",
            "https://res.cloudinary.com",
        )?;

        let list_max_results = value_or_default(
            &lookup,
            "GALLERY_LIST_MAX_RESULTS",
            &DEFAULT_LIST_MAX_RESULTS.to_string(),
        )
        .parse::<u32>()
        .map_err(|_| {
            ConfigError::Invalid("GALLERY_LIST_MAX_RESULTS must be an integer in [1, 500]".to_string())
        })?;
        if !(1..=500).contains(&list_max_results) {
            return Err(ConfigError::Invalid(
                "GALLERY_LIST_MAX_RESULTS must be in [1, 500]".to_string(),
            ));
        }

        let upload_max_bytes = value_or_default(
            &lookup,
            "GALLERY_UPLOAD_MAX_BYTES",
            &DEFAULT_UPLOAD_MAX_BYTES.to_string(),
        )
        .parse::<usize>()
        .map_err(|_| {
            ConfigError::Invalid(
                "GALLERY_UPLOAD_MAX_BYTES must be an integer in [1024, 104857600]".to_string(),
            )
        })?;
        if !(1_024..=104_857_600).contains(&upload_max_bytes) {
            return Err(ConfigError::Invalid(
                "GALLERY_UPLOAD_MAX_BYTES must be in [1024, 104857600]".to_string(),
            ));
        }

        let upstream_timeout = optional_trimmed(&lookup, "GALLERY_UPSTREAM_TIMEOUT_SECS")
            .map(|value| {
                let secs = value.parse::<u64>().map_err(|_| {
                    ConfigError::Invalid(
                        "GALLERY_UPSTREAM_TIMEOUT_SECS must be an integer in [1, 300]".to_string(),
                    )
                })?;
                if !(1..=300).contains(&secs) {
                    return Err(ConfigError::Invalid(
                        "GALLERY_UPSTREAM_TIMEOUT_SECS must be in [1, 300]".to_string(),
                    ));
                }
                Ok(Duration::from_secs(secs))
            })
            .transpose()?;

        Ok(Self {
            bind_addr,
            cloud_name,
            api_key,
            api_secret,
            api_base_url,
            delivery_base_url,
            list_max_results,
            upload_max_bytes,
            upstream_timeout,
        })
    }

    pub fn delivery_location(&self) -> DeliveryLocation {
        DeliveryLocation::new(&self.delivery_base_url, &self.cloud_name)
    }
}

fn base_url(
    lookup: impl Fn(&str) -> Option<String>,
    name: &str,
    default: &str,
) -> Result<String, ConfigError> {
    let value = value_or_default(lookup, name, default);
    if !is_http_url(&value) {
        return Err(ConfigError::Invalid(format!(
            "{name} must start with http:// or https://"
        )));
    }
    Url::parse(&value)
        .map_err(|error| ConfigError::Invalid(format!("{name} is not a valid URL: {error}")))?;
    Ok(trim_trailing(&value).to_string())
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn required_trimmed(
    lookup: impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    optional_trimmed(lookup, name).ok_or(ConfigError::MissingVar(name))
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    gallery_core::util::normalize_text_option(lookup(name))
}

fn trim_trailing(value: &str) -> &str {
    value.trim_end_matches('/')
}

#[cfg(test)]
pub(crate) fn test_config() -> AppConfig {
    AppConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        cloud_name: "gallery-cloud".to_string(),
        api_key: "key-123".to_string(),
        api_secret: "secret-456".to_string(),
        api_base_url: "https://api.cloudinary.com".to_string(),
        delivery_base_url: "https://res.cloudinary.com".to_string(),
        list_max_results: DEFAULT_LIST_MAX_RESULTS,
        upload_max_bytes: DEFAULT_UPLOAD_MAX_BYTES,
        upstream_timeout: None,
    }
}
