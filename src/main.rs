//! Wiring & DI. Entry point: bootstrap adapters, inject into services, serve HTTP.
//! No business logic here.

use dotenv::dotenv;
use learnhub::adapters::http::{self, AppState, Integrations};
use learnhub::adapters::mail::{HttpMailer, LogMailer};
use learnhub::adapters::meetings::{DailyAdapter, LocalMeetingAdapter};
use learnhub::adapters::payments::{FlouciAdapter, PaymeeAdapter, PaymeeLinks};
use learnhub::adapters::persistence::SqliteRepo;
use learnhub::ports::{MailerPort, MeetingProviderPort, PaymentGatewayPort};
use learnhub::shared::config::AppConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    let cfg = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "config load failed, using defaults");
        AppConfig::default()
    });

    let data_path = PathBuf::from(cfg.data_dir_or_default());
    let repo = Arc::new(
        SqliteRepo::connect(&data_path)
            .await
            .map_err(|e| anyhow::anyhow!("SQLite connect failed: {}", e))?,
    );
    info!(path = %repo.path().display(), "database ready");

    let public_url = cfg.public_url_or_default();
    let api_url = cfg.api_url_or_default();

    // --- Payment gateways (absent = 503 on checkout) ---
    let mut gateways: Vec<Arc<dyn PaymentGatewayPort>> = Vec::new();
    if let Some(api_key) = cfg.paymee_api_key() {
        info!(sandbox = cfg.paymee_sandbox(), "Paymee enabled");
        gateways.push(Arc::new(PaymeeAdapter::new(
            api_key,
            cfg.paymee_sandbox(),
            PaymeeLinks {
                return_url: format!("{public_url}/payment/success"),
                cancel_url: format!("{public_url}/payment/cancel"),
                webhook_url: format!("{api_url}/api/webhook/paymee"),
            },
        )));
    } else {
        warn!("PAYMEE_API_KEY not set, Paymee checkout disabled");
    }
    match (cfg.flouci_app_token(), cfg.flouci_app_secret()) {
        (Some(token), Some(secret)) => {
            info!("Flouci enabled");
            gateways.push(Arc::new(FlouciAdapter::new(
                token,
                secret,
                format!("{public_url}/payment/success"),
                format!("{public_url}/payment/cancel"),
            )));
        }
        _ => warn!("FLOUCI_APP_TOKEN/FLOUCI_APP_SECRET not set, Flouci checkout disabled"),
    }

    // --- Meetings ---
    let meetings: Arc<dyn MeetingProviderPort> = match cfg.daily_api_key() {
        Some(key) => {
            info!("Daily.co meetings enabled");
            Arc::new(DailyAdapter::new(key))
        }
        None => {
            warn!("DAILY_API_KEY not set, using local meeting links");
            Arc::new(LocalMeetingAdapter::new(format!("{public_url}/meet")))
        }
    };

    // --- Mail ---
    let mailer: Arc<dyn MailerPort> = match cfg.mail_api_key() {
        Some(key) => {
            info!(url = %cfg.mail_api_url_or_default(), "email delivery enabled");
            Arc::new(HttpMailer::new(
                cfg.mail_api_url_or_default(),
                key,
                cfg.mail_from_or_default(),
            ))
        }
        None => {
            warn!("MAIL_API_KEY not set, emails are only logged");
            Arc::new(LogMailer::new())
        }
    };

    let state = AppState::assemble(
        repo,
        Integrations {
            gateways,
            meetings,
            mailer,
        },
        cfg.instructor_share_or_default(),
    );

    if let Some(email) = cfg.bootstrap_admin.as_deref() {
        match state.auth.bootstrap_admin(email).await {
            Ok(Some(token)) => {
                // Credential stays out of the log pipeline; the operator reads it off the terminal.
                info!(email, "bootstrap admin created; token written to stderr");
                eprintln!("bootstrap admin token for {email} (shown once): {token}");
            }
            Ok(None) => info!(email, "bootstrap admin already exists"),
            Err(e) => warn!(email, error = %e, "bootstrap admin failed"),
        }
    }

    http::serve(state, cfg.port_or_default(), cfg.cors_origin.as_deref())
        .await
        .map_err(|e| anyhow::anyhow!("server error: {}", e))?;
    Ok(())
}
