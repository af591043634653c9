use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub paymongo: PaymongoConfig,
    #[serde(default)]
    pub booking: BookingConfig,
    #[serde(default)]
    pub uploads: UploadsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Public site URL, used to build the checkout redirect URLs.
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub session_duration_hours: i64,
    #[serde(default)]
    pub secure_cookies: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymongoConfig {
    pub secret_key: Option<String>,
    pub webhook_secret: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BookingConfig {
    /// Offset of the salon's wall clock from UTC. Slot times are local.
    pub utc_offset_minutes: i32,
    /// How long an unpaid appointment keeps its slot.
    pub pending_hold_minutes: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadsConfig {
    pub dir: String,
}

fn default_api_base() -> String {
    "https://api.paymongo.com/v1".to_string()
}

fn default_currency() -> String {
    "PHP".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for PaymongoConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            webhook_secret: None,
            api_base: default_api_base(),
            currency: default_currency(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 8 * 60,
            pending_hold_minutes: 30,
        }
    }
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            dir: "uploads".to_string(),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.base_url", "http://localhost:8080")?
            .set_default("database.url", "sqlite://lacquer.db?mode=rwc")?
            .set_default("database.max_connections", 10)?
            .set_default("auth.session_duration_hours", 24 * 7)?
            .set_default("auth.secure_cookies", false)?
            .set_default("booking.utc_offset_minutes", 8 * 60)?
            .set_default("booking.pending_hold_minutes", 30)?
            .set_default("uploads.dir", "uploads")?

            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))

            // Add environment variables (with LACQUER__ prefix, double underscore separates levels)
            .add_source(Environment::with_prefix("LACQUER").separator("__"))

            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                base_url: "http://localhost:8080".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite://lacquer.db?mode=rwc".to_string(),
                max_connections: 10,
            },
            auth: AuthConfig {
                session_duration_hours: 24 * 7,
                secure_cookies: false,
            },
            paymongo: PaymongoConfig::default(),
            booking: BookingConfig::default(),
            uploads: UploadsConfig::default(),
        }
    }
}
