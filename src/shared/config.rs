//! Application configuration. Listen address, storage paths, integration credentials.

use crate::domain::rules::DEFAULT_INSTRUCTOR_SHARE_PERCENT;
use serde::Deserialize;

pub const DEFAULT_PORT: u16 = 8080;

/// Notifications listed per request when the caller gives no limit.
pub const DEFAULT_NOTIFICATION_LIMIT: u32 = 100;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// HTTP listen port. Read from LEARNHUB_PORT.
    #[serde(default)]
    pub port: Option<u16>,

    /// Directory holding learnhub.db. Read from LEARNHUB_DATA_DIR.
    #[serde(default)]
    pub data_dir: Option<String>,

    /// Public URL of the web app; used for gateway return links and notification links.
    /// Read from LEARNHUB_PUBLIC_URL.
    #[serde(default)]
    pub public_url: Option<String>,

    /// Public URL of this API; gateways post webhooks here. Read from LEARNHUB_API_URL.
    #[serde(default)]
    pub api_url: Option<String>,

    /// Allowed CORS origin. Read from LEARNHUB_CORS_ORIGIN. Unset = any origin.
    #[serde(default)]
    pub cors_origin: Option<String>,

    /// Instructor share of each sale in percent (default 80). Read from LEARNHUB_INSTRUCTOR_SHARE.
    #[serde(default)]
    pub instructor_share: Option<i64>,

    /// Email of an admin account created at startup if missing. Read from LEARNHUB_BOOTSTRAP_ADMIN.
    #[serde(default)]
    pub bootstrap_admin: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Paymee
    // ─────────────────────────────────────────────────────────────────────────
    /// Paymee API token. Read from PAYMEE_API_KEY.
    #[serde(default)]
    pub paymee_api_key: Option<String>,

    /// Use sandbox.paymee.tn instead of app.paymee.tn. Read from PAYMEE_SANDBOX.
    #[serde(default)]
    pub paymee_sandbox: Option<bool>,

    // ─────────────────────────────────────────────────────────────────────────
    // Flouci
    // ─────────────────────────────────────────────────────────────────────────
    /// Flouci app token (public). Read from FLOUCI_APP_TOKEN.
    #[serde(default)]
    pub flouci_app_token: Option<String>,

    /// Flouci app secret. Read from FLOUCI_APP_SECRET.
    #[serde(default)]
    pub flouci_app_secret: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Daily.co and mail
    // ─────────────────────────────────────────────────────────────────────────
    /// Daily.co API key. Read from DAILY_API_KEY.
    #[serde(default)]
    pub daily_api_key: Option<String>,

    /// Mail API key (Resend-compatible). Read from MAIL_API_KEY.
    #[serde(default)]
    pub mail_api_key: Option<String>,

    /// Sender address. Read from MAIL_FROM.
    #[serde(default)]
    pub mail_from: Option<String>,

    /// Mail API endpoint. Read from MAIL_API_URL.
    #[serde(default)]
    pub mail_api_url: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("LEARNHUB"));
        if let Ok(path) = std::env::var("LEARNHUB_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c.build()?.try_deserialize()
    }

    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn data_dir_or_default(&self) -> String {
        self.data_dir.clone().unwrap_or_else(|| "./data".to_string())
    }

    /// Public URL without trailing slash. Defaults to http://localhost:3000.
    pub fn public_url_or_default(&self) -> String {
        self.public_url
            .clone()
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string()
    }

    /// API URL without trailing slash. Defaults to http://localhost:<port>.
    pub fn api_url_or_default(&self) -> String {
        self.api_url
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}", self.port_or_default()))
            .trim_end_matches('/')
            .to_string()
    }

    /// Instructor share in percent, clamped to 0..=100.
    pub fn instructor_share_or_default(&self) -> i64 {
        self.instructor_share
            .unwrap_or(DEFAULT_INSTRUCTOR_SHARE_PERCENT)
            .clamp(0, 100)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Integration helpers. Unprefixed env names are accepted so a shared .env works.
    // ─────────────────────────────────────────────────────────────────────────

    pub fn paymee_api_key(&self) -> Option<String> {
        non_empty(
            self.paymee_api_key
                .clone()
                .or_else(|| std::env::var("PAYMEE_API_KEY").ok()),
        )
    }

    pub fn paymee_sandbox(&self) -> bool {
        self.paymee_sandbox
            .or_else(|| {
                std::env::var("PAYMEE_SANDBOX")
                    .ok()
                    .map(|s| matches!(s.as_str(), "1" | "true" | "yes"))
            })
            .unwrap_or(false)
    }

    pub fn flouci_app_token(&self) -> Option<String> {
        non_empty(
            self.flouci_app_token
                .clone()
                .or_else(|| std::env::var("FLOUCI_APP_TOKEN").ok()),
        )
    }

    pub fn flouci_app_secret(&self) -> Option<String> {
        non_empty(
            self.flouci_app_secret
                .clone()
                .or_else(|| std::env::var("FLOUCI_APP_SECRET").ok()),
        )
    }

    pub fn is_flouci_configured(&self) -> bool {
        self.flouci_app_token().is_some() && self.flouci_app_secret().is_some()
    }

    pub fn daily_api_key(&self) -> Option<String> {
        non_empty(
            self.daily_api_key
                .clone()
                .or_else(|| std::env::var("DAILY_API_KEY").ok()),
        )
    }

    pub fn mail_api_key(&self) -> Option<String> {
        non_empty(
            self.mail_api_key
                .clone()
                .or_else(|| std::env::var("MAIL_API_KEY").ok()),
        )
    }

    pub fn mail_from_or_default(&self) -> String {
        self.mail_from
            .clone()
            .or_else(|| std::env::var("MAIL_FROM").ok())
            .unwrap_or_else(|| "LearnHub <no-reply@learnhub.tn>".to_string())
    }

    pub fn mail_api_url_or_default(&self) -> String {
        self.mail_api_url
            .clone()
            .or_else(|| std::env::var("MAIL_API_URL").ok())
            .unwrap_or_else(|| "https://api.resend.com/emails".to_string())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
