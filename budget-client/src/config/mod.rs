use client_core::error::ClientError;
use config::{Config as Cfg, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub push: PushSettings,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    /// Base URL of the budget service REST API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Timeout applied to every outbound request, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PushSettings {
    /// Endpoint of the push notification channel.
    #[serde(default = "default_push_url")]
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotificationSettings {
    /// Maximum number of notifications held in the live window.
    #[serde(default = "default_window_size")]
    pub window_size: usize,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_push_url() -> String {
    "ws://localhost:3000".to_string()
}

fn default_window_size() -> usize {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PushSettings {
    fn default() -> Self {
        Self {
            url: default_push_url(),
        }
    }
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, ClientError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
