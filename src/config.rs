use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const API_KEY_VAR: &str = "ELEVENLABS_API_KEY";
pub const VOICE_ID_VAR: &str = "ELEVENLABS_VOICE_ID";

/// Gateway configuration, built once at startup and read-only afterwards
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub translate: TranslateConfig,
    #[serde(skip)]
    pub secrets: Secrets,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default = "default_speech_base_url")]
    pub base_url: String,
    #[serde(default = "default_stt_model_id")]
    pub stt_model_id: String,
    #[serde(default = "default_tts_model_id")]
    pub tts_model_id: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Upper bound for a single chunk forwarded to the client
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    #[serde(default = "default_translate_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Provider credentials. Never logged.
#[derive(Clone, Default)]
pub struct Secrets {
    pub api_key: String,
    pub voice_id: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_static_dir() -> String {
    "static".to_string()
}

fn default_max_upload_bytes() -> usize {
    25 * 1024 * 1024
}

fn default_speech_base_url() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_stt_model_id() -> String {
    "scribe_v1".to_string()
}

fn default_tts_model_id() -> String {
    "eleven_multilingual_v2".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_chunk_size() -> usize {
    16 * 1024
}

fn default_translate_base_url() -> String {
    "https://translate.googleapis.com".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            base_url: default_speech_base_url(),
            stt_model_id: default_stt_model_id(),
            tts_model_id: default_tts_model_id(),
            timeout_secs: default_timeout_secs(),
            chunk_size: default_chunk_size(),
        }
    }
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            base_url: default_translate_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SpeechConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl TranslateConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Secrets {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve both secrets through `lookup`; blank values count as missing
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingSecret(key))
        };

        Ok(Self {
            api_key: require(API_KEY_VAR)?,
            voice_id: require(VOICE_ID_VAR)?,
        })
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("api_key", &"<redacted>")
            .field("voice_id", &self.voice_id)
            .finish()
    }
}

impl Config {
    /// Load configuration from an optional file plus `GATEWAY__*` overrides,
    /// then resolve the provider secrets from the environment.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("GATEWAY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: Config = settings.try_deserialize()?;
        config.secrets = Secrets::from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Default settings around the given secrets
    pub fn with_secrets(secrets: Secrets) -> Self {
        Self {
            server: ServerConfig::default(),
            speech: SpeechConfig::default(),
            translate: TranslateConfig::default(),
            secrets,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.speech.chunk_size == 0 {
            return Err(invalid("speech.chunk_size", self.speech.chunk_size));
        }
        if self.speech.timeout_secs == 0 {
            return Err(invalid("speech.timeout_secs", self.speech.timeout_secs));
        }
        if self.translate.timeout_secs == 0 {
            return Err(invalid("translate.timeout_secs", self.translate.timeout_secs));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn invalid(field: &str, value: impl fmt::Display) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
}
