use serde::Deserialize;
use std::env;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_DROPBOX_API_URL: &str = "https://api.dropboxapi.com";
const DEFAULT_DROPBOX_CONTENT_URL: &str = "https://content.dropboxapi.com";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
const DEFAULT_NOTION_API_URL: &str = "https://api.notion.com";
const DEFAULT_NOTION_VERSION: &str = "2022-06-28";
const DEFAULT_RESULT_PROPERTY: &str = "Search Result";
const DEFAULT_TIMESTAMP_PROPERTY: &str = "Timestamp";
const DEFAULT_SERVER_PORT: u16 = 5000;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable {key}: {reason}")]
    InvalidValue {
        /// Name of the offending variable.
        key: String,
        /// Parser diagnostic.
        reason: String,
    },
}

/// Runtime configuration for the webhook bridge.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Bearer token for the Dropbox API. Empty when unset.
    pub dropbox_access_token: String,
    /// Integration token for the Notion API. Empty when unset.
    pub notion_token: String,
    /// API key for the OpenAI API. Empty when unset.
    pub openai_api_key: String,
    /// Base URL of the Dropbox RPC host (search).
    pub dropbox_api_url: String,
    /// Base URL of the Dropbox content host (download).
    pub dropbox_content_url: String,
    /// Base URL of the chat-completion API, including the version segment.
    pub openai_base_url: String,
    /// Model identifier sent with every completion request.
    pub openai_model: String,
    /// Base URL of the Notion API.
    pub notion_api_url: String,
    /// Value of the `Notion-Version` header.
    pub notion_version: String,
    /// Name of the rich-text page property receiving the answer.
    pub notion_result_property: String,
    /// Name of the date page property receiving the timestamp.
    pub notion_timestamp_property: String,
    /// Port the HTTP server listens on.
    pub server_port: u16,
}

impl Config {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Credentials are optional: a missing token is logged and left empty so that the failure
    /// surfaces from the external call that needs it. URLs are validated eagerly.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let credential = |key: &str| {
            optional(key).unwrap_or_else(|| {
                tracing::warn!(variable = key, "Credential not set; dependent calls will fail");
                String::new()
            })
        };
        let url = |key: &str, default: &str| -> Result<String, ConfigError> {
            let value = optional(key).unwrap_or_else(|| default.to_string());
            normalize_base_url(&value).map_err(|reason| ConfigError::InvalidValue {
                key: key.to_string(),
                reason,
            })
        };
        let text = |key: &str, default: &str| optional(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            dropbox_access_token: credential("DROPBOX_ACCESS_TOKEN"),
            notion_token: credential("NOTION_TOKEN"),
            openai_api_key: credential("OPENAI_API_KEY"),
            dropbox_api_url: url("DROPBOX_API_URL", DEFAULT_DROPBOX_API_URL)?,
            dropbox_content_url: url("DROPBOX_CONTENT_URL", DEFAULT_DROPBOX_CONTENT_URL)?,
            openai_base_url: url("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL)?,
            openai_model: text("OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
            notion_api_url: url("NOTION_API_URL", DEFAULT_NOTION_API_URL)?,
            notion_version: text("NOTION_VERSION", DEFAULT_NOTION_VERSION),
            notion_result_property: text("NOTION_RESULT_PROPERTY", DEFAULT_RESULT_PROPERTY),
            notion_timestamp_property: text(
                "NOTION_TIMESTAMP_PROPERTY",
                DEFAULT_TIMESTAMP_PROPERTY,
            ),
            server_port: optional("SERVER_PORT")
                .map(|value| {
                    value
                        .trim()
                        .parse()
                        .map_err(|err: std::num::ParseIntError| ConfigError::InvalidValue {
                            key: "SERVER_PORT".into(),
                            reason: err.to_string(),
                        })
                })
                .transpose()?
                .unwrap_or(DEFAULT_SERVER_PORT),
        })
    }

    /// Configuration pointing every collaborator at a single base URL. Used by tests and local
    /// tooling that fake the external services with one mock server.
    pub fn with_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        Self {
            dropbox_access_token: "dropbox-token".into(),
            notion_token: "notion-token".into(),
            openai_api_key: "openai-key".into(),
            dropbox_api_url: base.clone(),
            dropbox_content_url: base.clone(),
            openai_base_url: format!("{base}/v1"),
            openai_model: DEFAULT_OPENAI_MODEL.into(),
            notion_api_url: base,
            notion_version: DEFAULT_NOTION_VERSION.into(),
            notion_result_property: DEFAULT_RESULT_PROPERTY.into(),
            notion_timestamp_property: DEFAULT_TIMESTAMP_PROPERTY.into(),
            server_port: DEFAULT_SERVER_PORT,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("dropbox_access_token", &redact(&self.dropbox_access_token))
            .field("notion_token", &redact(&self.notion_token))
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("dropbox_api_url", &self.dropbox_api_url)
            .field("dropbox_content_url", &self.dropbox_content_url)
            .field("openai_base_url", &self.openai_base_url)
            .field("openai_model", &self.openai_model)
            .field("notion_api_url", &self.notion_api_url)
            .field("notion_version", &self.notion_version)
            .field("notion_result_property", &self.notion_result_property)
            .field("notion_timestamp_property", &self.notion_timestamp_property)
            .field("server_port", &self.server_port)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "<unset>" } else { "<redacted>" }
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let parsed = reqwest::Url::parse(url.trim()).map_err(|err| err.to_string())?;
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        dropbox_api_url = %config.dropbox_api_url,
        openai_base_url = %config.openai_base_url,
        openai_model = %config.openai_model,
        notion_api_url = %config.notion_api_url,
        server_port = config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
