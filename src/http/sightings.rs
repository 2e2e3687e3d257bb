use axum::extract::{Path, State};
use axum::response::Redirect;
use tracing::{debug, info};

use super::{parse_id, AppState, FormData};
use crate::dates;
use crate::db::{CatStore, NewSighting};
use crate::error::AppError;

pub(super) async fn log_sighting(
    State(state): State<AppState>,
    form: FormData,
) -> Result<Redirect, AppError> {
    let Some(cat_id) = parse_id(form.text("cat_id")) else {
        debug!("Ignoring sighting without a cat");
        return Ok(Redirect::to("/"));
    };

    let sighting = NewSighting {
        cat_id,
        date: dates::utc_now(),
        location: form.text("location").to_string(),
        notes: form.text("notes").to_string(),
        image: form.image("image"),
    };
    let created = state
        .with_store(move |store| {
            if store.get_cat(cat_id)?.is_none() {
                return Ok(None);
            }
            store.insert_sighting(&sighting).map(Some)
        })
        .await?;

    match created {
        Some(sighting_id) => info!(sighting_id, cat_id, "Logged sighting"),
        None => debug!(cat_id, "Ignoring sighting of unknown cat"),
    }
    Ok(Redirect::to("/"))
}

pub(super) async fn remove_sighting(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Redirect, AppError> {
    let Some(sighting_id) = parse_id(&raw_id) else {
        return Ok(Redirect::to("/"));
    };
    if state.with_store(move |store| store.delete_sighting(sighting_id)).await? {
        info!(sighting_id, "Removed sighting");
    }
    Ok(Redirect::to("/"))
}
