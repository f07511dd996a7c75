use crate::components::gpt::PromptLanguage;
use crate::error::{config_error, env_error, AssistantResult};
use chrono_tz::Tz;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Default model used when `OPENAI_MODEL` is not set
pub const DEFAULT_MODEL: &str = "gpt-5-nano";

/// Default user id when the request carries no `user-id` header
pub const DEFAULT_USER_ID: &str = "default-user";

/// Location of the optional overrides file
pub const CONFIG_FILE: &str = "config/assistant.toml";

/// Main configuration structure for the service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address the HTTP server binds to
    pub host: String,
    /// Port the HTTP server listens on
    pub port: u16,
    /// OpenAI API key, `None` puts the parser in offline mode
    pub openai_api_key: Option<String>,
    /// Model name for completions
    pub openai_model: String,
    /// Sampling temperature for completions
    pub openai_temperature: f64,
    /// Alternative API base url (proxies, compatible servers)
    pub openai_base_url: Option<String>,
    /// User id used when none is supplied
    pub default_user_id: String,
    /// Zone used for naive date-times that carry no timeZone
    pub timezone: String,
    /// Prompt language used by the natural language handler
    pub prompt_language: PromptLanguage,
    /// Deployment environment reported by the health endpoint
    pub environment: String,
}

/// Values that may be overridden from `config/assistant.toml`
#[derive(Debug, Default, Deserialize)]
struct FileOverrides {
    host: Option<String>,
    port: Option<u16>,
    openai_model: Option<String>,
    openai_temperature: Option<f64>,
    openai_base_url: Option<String>,
    default_user_id: Option<String>,
    timezone: Option<String>,
    prompt_language: Option<PromptLanguage>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            openai_api_key: None,
            openai_model: DEFAULT_MODEL.to_string(),
            openai_temperature: 1.0,
            openai_base_url: None,
            default_user_id: DEFAULT_USER_ID.to_string(),
            timezone: "UTC".to_string(),
            prompt_language: PromptLanguage::Japanese,
            environment: "development".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> AssistantResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let mut config = Config::default();

        if let Ok(host) = env::var("HOST") {
            config.host = host;
        }

        if let Ok(port) = env::var("PORT") {
            config.port = port
                .parse::<u16>()
                .map_err(|_| env_error("PORT"))?;
        }

        // An empty key is treated the same as a missing one
        config.openai_api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        if let Ok(model) = env::var("OPENAI_MODEL") {
            config.openai_model = model;
        }

        if let Ok(temperature) = env::var("OPENAI_TEMPERATURE") {
            config.openai_temperature = temperature
                .parse::<f64>()
                .map_err(|_| env_error("OPENAI_TEMPERATURE"))?;
        }

        config.openai_base_url = env::var("OPENAI_BASE_URL").ok();

        if let Ok(user_id) = env::var("DEFAULT_USER_ID") {
            config.default_user_id = user_id;
        }

        if let Ok(timezone) = env::var("TIMEZONE") {
            config.timezone = timezone;
        }

        if let Ok(language) = env::var("PROMPT_LANGUAGE") {
            config.prompt_language = language.parse()?;
        }

        if let Ok(environment) = env::var("APP_ENV") {
            config.environment = environment;
        }

        // Merge overrides from file
        if Path::new(CONFIG_FILE).exists() {
            let content = fs::read_to_string(CONFIG_FILE)?;
            config.merge_file(&content)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply the values present in a TOML overrides document
    pub fn merge_file(&mut self, content: &str) -> AssistantResult<()> {
        let overrides: FileOverrides = toml::from_str(content)?;

        if let Some(host) = overrides.host {
            self.host = host;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(model) = overrides.openai_model {
            self.openai_model = model;
        }
        if let Some(temperature) = overrides.openai_temperature {
            self.openai_temperature = temperature;
        }
        if overrides.openai_base_url.is_some() {
            self.openai_base_url = overrides.openai_base_url;
        }
        if let Some(user_id) = overrides.default_user_id {
            self.default_user_id = user_id;
        }
        if let Some(timezone) = overrides.timezone {
            self.timezone = timezone;
        }
        if let Some(language) = overrides.prompt_language {
            self.prompt_language = language;
        }

        Ok(())
    }

    /// Check values that cannot be expressed by the types alone
    pub fn validate(&self) -> AssistantResult<()> {
        self.tz()?;

        if !(0.0..=2.0).contains(&self.openai_temperature) {
            return Err(config_error("OPENAI_TEMPERATURE must be between 0 and 2"));
        }

        if self.default_user_id.trim().is_empty() {
            return Err(config_error("DEFAULT_USER_ID must not be empty"));
        }

        Ok(())
    }

    /// Parsed default time zone
    pub fn tz(&self) -> AssistantResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| config_error(&format!("Unknown timezone: {}", self.timezone)))
    }

    /// Whether a model credential is configured
    pub fn is_online(&self) -> bool {
        self.openai_api_key.is_some()
    }

    /// Socket address string for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
