//! Cat creation, editing and removal.

use axum::extract::{Path, State};
use axum::response::Redirect;
use tracing::{debug, info};

use super::{ignore_conflict, parse_id, AppState, FormData};
use crate::dates;
use crate::db::{CatStore, NewCat};
use crate::error::AppError;

async fn create_cat(state: &AppState, form: &FormData, with_details: bool) -> Result<(), AppError> {
    let name = form.trimmed("name");
    if name.is_empty() {
        debug!("Ignoring cat without a name");
        return Ok(());
    }

    let cat = NewCat {
        name: name.to_string(),
        description: with_details.then(|| form.trimmed("description").to_string()),
        image: if with_details { form.image("image") } else { None },
        created_at: dates::utc_now(),
    };
    let created = state.with_store(move |store| store.insert_cat(&cat)).await;
    if let Some(cat_id) = ignore_conflict(created)? {
        info!(cat_id, cat_name = name, "Added cat");
    }
    Ok(())
}

pub(super) async fn add_cat(
    State(state): State<AppState>,
    form: FormData,
) -> Result<Redirect, AppError> {
    create_cat(&state, &form, true).await?;
    Ok(Redirect::to("/cats"))
}

pub(super) async fn quick_add_cat(
    State(state): State<AppState>,
    form: FormData,
) -> Result<Redirect, AppError> {
    create_cat(&state, &form, false).await?;
    Ok(Redirect::to("/"))
}

pub(super) async fn edit_cat(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    form: FormData,
) -> Result<Redirect, AppError> {
    let Some(cat_id) = parse_id(&raw_id) else {
        return Ok(Redirect::to("/cats"));
    };
    let back = Redirect::to(&format!("/cats/{cat_id}"));

    let name = form.trimmed("name").to_string();
    if name.is_empty() {
        debug!(cat_id, "Ignoring edit with an empty name");
        return Ok(back);
    }
    let description = form.trimmed("description").to_string();
    let image = form.image("image");

    let updated = state
        .with_store(move |store| store.update_cat(cat_id, &name, &description, image.as_ref()))
        .await;
    if let Some(true) = ignore_conflict(updated)? {
        info!(cat_id, "Updated cat");
    }
    Ok(back)
}

pub(super) async fn remove_profile_photo(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Redirect, AppError> {
    let Some(cat_id) = parse_id(&raw_id) else {
        return Ok(Redirect::to("/cats"));
    };
    if state.with_store(move |store| store.set_cat_image(cat_id, None)).await? {
        info!(cat_id, "Removed profile photo");
    }
    Ok(Redirect::to(&format!("/cats/{cat_id}")))
}

pub(super) async fn delete_cat(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Redirect, AppError> {
    let Some(cat_id) = parse_id(&raw_id) else {
        return Ok(Redirect::to("/cats"));
    };
    if state.with_store(move |store| store.delete_cat(cat_id)).await? {
        info!(cat_id, "Deleted cat");
    }
    Ok(Redirect::to("/cats"))
}
