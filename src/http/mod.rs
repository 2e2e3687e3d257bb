//! HTTP surface: router, shared state and the request handlers.

mod cats;
mod form;
mod pages;
mod photos;
mod request_tracing;
mod sightings;

pub use form::{FormData, UploadedFile};

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::db::{Database, Session, StoreError, StoreResult};
use crate::error::AppError;

/// Most recent sightings on the home page.
pub const HOME_SIGHTINGS: usize = 50;
/// Most recent sightings on a cat's page.
pub const CAT_SIGHTINGS: usize = 50;
/// Sightings shown on the history page.
pub const HISTORY_SIGHTINGS: usize = 100;

#[derive(Clone)]
pub struct AppState {
    db: Database,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Run storage work with a session of its own on the blocking pool.
    ///
    /// The session is opened inside the task and dropped when `work` returns,
    /// whether it succeeded or not.
    pub async fn with_store<T, F>(&self, work: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut Session) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        let result = tokio::task::spawn_blocking(move || {
            let mut session = db.connect()?;
            work(&mut session)
        })
        .await?;
        Ok(result?)
    }

    pub fn backend_name(&self) -> &'static str {
        self.db.backend_name()
    }
}

/// Numeric id from a path segment. Anything else names no entity.
fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

/// Treat a name conflict as "nothing happened".
fn ignore_conflict<T>(result: Result<T, AppError>) -> Result<Option<T>, AppError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(AppError::Store(StoreError::Conflict(name))) => {
            tracing::debug!(cat_name = %name, "Cat name already taken, ignoring");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/", get(pages::home))
        .route("/cats", get(pages::cats_list))
        .route("/cats/:cat_id", get(pages::view_cat))
        .route("/history", get(pages::history))
        .route("/health", get(pages::health))
        .route("/add-cat", post(cats::add_cat))
        .route("/quick-add-cat", post(cats::quick_add_cat))
        .route("/cats/:cat_id/edit", post(cats::edit_cat))
        .route(
            "/cats/:cat_id/remove-profile-photo",
            post(cats::remove_profile_photo),
        )
        .route("/cats/:cat_id/delete", post(cats::delete_cat))
        .route("/log-sighting", post(sightings::log_sighting))
        .route("/remove-sighting/:sighting_id", post(sightings::remove_sighting))
        .route("/cats/:cat_id/photos/add", post(photos::add_photos))
        .route(
            "/cats/:cat_id/photos/:source/:photo_id/delete",
            post(photos::delete_photo),
        )
        .route(
            "/cats/:cat_id/photos/:source/:photo_id/set-profile",
            post(photos::set_profile_photo),
        )
        .layer(from_fn(request_tracing::request_tracing_middleware))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

/// Serve until Ctrl-C or SIGTERM.
pub async fn serve(listener: TcpListener, router: Router) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Listening");
    }
    axum::serve(listener, router)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42"), Some(42));
        assert_eq!(parse_id(" 7 "), Some(7));
        assert_eq!(parse_id("abc"), None);
        assert_eq!(parse_id(""), None);
        assert_eq!(parse_id("1.5"), None);
    }
}
