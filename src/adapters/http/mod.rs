//! HTTP adapter (axum). JSON API under `/api`, bearer-token auth.

pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

use axum::{
    Json, Router,
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, patch, post, put},
};
use routes::{admin, commerce, community, content, courses, learning};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal::{self, ctrl_c};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use state::{AppState, Integrations, SharedState};

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));
    match origin.map(HeaderValue::from_str) {
        Some(Ok(value)) => layer.allow_origin(AllowOrigin::exact(value)),
        Some(Err(e)) => {
            warn!(error = %e, "invalid CORS origin, allowing any");
            layer.allow_origin(Any)
        }
        None => layer.allow_origin(Any),
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub fn router(state: SharedState, cors_origin: Option<&str>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/me", get(admin::me))
        // courses & enrollments
        .route("/api/courses", get(courses::list).post(courses::create))
        .route(
            "/api/courses/{id}",
            get(courses::get)
                .patch(courses::update)
                .delete(courses::delete),
        )
        .route("/api/courses/{id}/modules", post(courses::add_module))
        .route("/api/modules/{id}/lessons", post(courses::add_lesson))
        .route("/api/courses/{id}/enroll", post(courses::enroll))
        .route("/api/courses/{id}/students", get(courses::students))
        .route("/api/enrollments", get(courses::my_enrollments))
        // learning
        .route("/api/update-progress", post(learning::update_progress))
        .route(
            "/api/courses/{id}/assignments",
            get(learning::list_assignments).post(learning::create_assignment),
        )
        .route(
            "/api/assignments/{id}",
            get(learning::get_assignment)
                .patch(learning::update_assignment)
                .delete(learning::delete_assignment),
        )
        .route(
            "/api/assignments/{id}/submissions",
            get(learning::list_submissions).post(learning::submit),
        )
        .route("/api/submissions/{id}/grade", patch(learning::grade))
        // community
        .route(
            "/api/announcements",
            get(community::list_announcements).post(community::publish_announcement),
        )
        .route(
            "/api/announcements/{id}",
            axum::routing::delete(community::delete_announcement),
        )
        .route(
            "/api/meetings",
            get(community::list_meetings).post(community::create_meeting),
        )
        .route(
            "/api/meetings/{id}",
            get(community::get_meeting).delete(community::delete_meeting),
        )
        .route("/api/notifications", get(community::list_notifications))
        .route("/api/notifications/read-all", post(community::mark_all_read))
        .route("/api/notifications/{id}/read", post(community::mark_read))
        // commerce
        .route("/api/books", get(commerce::list_books).post(commerce::create_book))
        .route("/api/books/{id}/access", get(commerce::book_access))
        .route("/api/checkout/{gateway}", post(commerce::checkout))
        .route("/api/webhook/paymee", post(commerce::paymee_webhook))
        .route(
            "/api/webhook/flouci",
            post(commerce::flouci_webhook).get(commerce::flouci_webhook),
        )
        .route("/api/payments", get(commerce::list_payments))
        .route("/api/instructor/earnings", get(commerce::earnings))
        // admin
        .route("/api/admin/users", get(admin::list_users).post(admin::create_user))
        .route("/api/admin/users/{id}/status", patch(admin::set_status))
        .route("/api/admin/users/{id}/role", patch(admin::set_role))
        .route("/api/admin/reports/summary", get(admin::summary))
        // site content
        .route(
            "/api/help-articles",
            get(content::list_help).post(content::upsert_help),
        )
        .route("/api/help-articles/{slug}", get(content::get_help))
        .route("/api/settings", get(content::settings))
        .route("/api/settings/{key}", put(content::put_setting))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origin))
        .with_state(state)
}

/// Bind and serve until Ctrl+C or SIGTERM.
pub async fn serve(state: SharedState, port: u16, cors_origin: Option<&str>) -> std::io::Result<()> {
    let app = router(state, cors_origin);
    let address = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&address).await?;
    info!(address = %address, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("received Ctrl+C, shutting down"),
            Err(e) => {
                warn!(error = %e, "failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
