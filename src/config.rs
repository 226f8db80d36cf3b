use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::core::StreamOptions;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub photos: PhotoSettings,
    #[serde(default)]
    pub maps: MapsSettings,
    #[serde(default)]
    pub stream: StreamSettings,
    #[serde(default)]
    pub cities: CitySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8000 }

#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    pub api_key: Option<String>,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    pub timeout_secs: Option<u64>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            api_key: None,
            model: default_llm_model(),
            temperature: default_temperature(),
            timeout_secs: None,
        }
    }
}

fn default_llm_base_url() -> String { "https://api.openai.com/v1".to_string() }
fn default_llm_model() -> String { "gpt-4-turbo-preview".to_string() }
fn default_temperature() -> f32 { 0.7 }

#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSettings {
    #[serde(default = "default_photos_base_url")]
    pub base_url: String,
    pub access_key: Option<String>,
    #[serde(default = "default_photo_timeout")]
    pub timeout_secs: u64,
}

impl Default for PhotoSettings {
    fn default() -> Self {
        Self {
            base_url: default_photos_base_url(),
            access_key: None,
            timeout_secs: default_photo_timeout(),
        }
    }
}

fn default_photos_base_url() -> String { "https://api.unsplash.com".to_string() }
fn default_photo_timeout() -> u64 { 10 }

#[derive(Debug, Clone, Deserialize)]
pub struct MapsSettings {
    #[serde(default = "default_maps_search_url")]
    pub search_url: String,
}

impl Default for MapsSettings {
    fn default() -> Self {
        Self {
            search_url: default_maps_search_url(),
        }
    }
}

fn default_maps_search_url() -> String { "https://www.google.com/maps/search".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct StreamSettings {
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
    #[serde(default = "default_enrich_concurrency")]
    pub enrich_concurrency: usize,
    pub max_parse_failures: Option<usize>,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            pacing_ms: default_pacing_ms(),
            enrich_concurrency: default_enrich_concurrency(),
            max_parse_failures: None,
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl StreamSettings {
    pub fn options(&self) -> StreamOptions {
        StreamOptions {
            pacing: Duration::from_millis(self.pacing_ms),
            enrich_concurrency: self.enrich_concurrency,
            max_parse_failures: self.max_parse_failures,
            channel_capacity: self.channel_capacity,
        }
    }
}

fn default_pacing_ms() -> u64 { 100 }
fn default_enrich_concurrency() -> usize { 3 }
fn default_channel_capacity() -> usize { 16 }

#[derive(Debug, Clone, Deserialize)]
pub struct CitySettings {
    #[serde(default = "default_cities_path")]
    pub path: String,
}

impl Default for CitySettings {
    fn default() -> Self {
        Self {
            path: default_cities_path(),
        }
    }
}

fn default_cities_path() -> String { "data/cities.json".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with CITYMATCH_)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., CITYMATCH__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("CITYMATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = apply_credential_overrides(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("CITYMATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// Pick up service credentials from their conventional variable names
///
/// `OPENAI_API_KEY` and `UNSPLASH_ACCESS_KEY` win over the config file.
fn apply_credential_overrides(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(api_key) = env::var("OPENAI_API_KEY") {
        builder = builder.set_override("llm.api_key", api_key)?;
    }
    if let Ok(access_key) = env::var("UNSPLASH_ACCESS_KEY") {
        builder = builder.set_override("photos.access_key", access_key)?;
    }

    builder.build()
}
