//! Read-only pages and the health check.

use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use serde_json::json;

use super::{parse_id, AppState, CAT_SIGHTINGS, HISTORY_SIGHTINGS, HOME_SIGHTINGS};
use crate::dates;
use crate::db::CatStore;
use crate::error::AppError;
use crate::views::{self, CatDetailView, HistoryView, HomeView};

pub(super) async fn home(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let view = state
        .with_store(|store| {
            Ok(HomeView {
                cats: store.list_cats()?,
                sightings: store.recent_sightings(HOME_SIGHTINGS)?,
                utc_now: dates::utc_now(),
            })
        })
        .await?;
    Ok(Html(views::home(&view)))
}

pub(super) async fn cats_list(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let cats = state.with_store(|store| store.list_cat_summaries()).await?;
    Ok(Html(views::cats(&cats)))
}

pub(super) async fn view_cat(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    let Some(cat_id) = parse_id(&raw_id) else {
        tracing::debug!(%raw_id, "Malformed cat id, redirecting to list");
        return Ok(Redirect::to("/cats").into_response());
    };
    let view = state
        .with_store(move |store| {
            let Some(cat) = store.get_cat(cat_id)? else {
                return Ok(None);
            };
            let last_seen = store.last_sighting_date(cat_id)?;
            Ok(Some(CatDetailView {
                cat,
                sightings: store.cat_sightings(cat_id, CAT_SIGHTINGS)?,
                sighting_count: store.count_cat_sightings(cat_id)?,
                photos: store.cat_photos(cat_id)?,
                last_seen: dates::normalize_opt(last_seen.as_deref()),
            }))
        })
        .await?;

    match view {
        Some(view) => Ok(Html(views::cat_detail(&view)).into_response()),
        None => {
            tracing::debug!(cat_id, "Unknown cat, redirecting to list");
            Ok(Redirect::to("/cats").into_response())
        }
    }
}

pub(super) async fn history(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let view = state
        .with_store(|store| {
            Ok(HistoryView {
                sightings: store.recent_sightings(HISTORY_SIGHTINGS)?,
                total: store.count_sightings()?,
            })
        })
        .await?;
    Ok(Html(views::history(&view)))
}

pub(super) async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "database": state.backend_name(),
    }))
}
