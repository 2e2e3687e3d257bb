//! Gallery uploads and per-photo actions.
//!
//! Photo routes carry the source in the path (`gallery` or `sighting`); an
//! unrecognised source or a malformed id leaves everything untouched.

use axum::extract::{Path, State};
use axum::response::Redirect;
use tracing::{debug, info};

use super::{parse_id, AppState, FormData};
use crate::dates;
use crate::db::{CatStore, NewGalleryPhoto};
use crate::error::AppError;
use crate::photos::PhotoSource;

pub(super) async fn add_photos(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    form: FormData,
) -> Result<Redirect, AppError> {
    let Some(cat_id) = parse_id(&raw_id) else {
        return Ok(Redirect::to("/cats"));
    };
    let images = form.images("photos");
    let caption = form.trimmed("caption").to_string();
    let created_at = dates::utc_now();
    let photo_date = match form.trimmed("photo_date") {
        "" => Some(created_at.clone()),
        date => dates::combine_date_time(date, form.trimmed("photo_time")),
    };

    let added = state
        .with_store(move |store| {
            if store.get_cat(cat_id)?.is_none() {
                return Ok(None);
            }
            let mut added = 0usize;
            for image in images {
                store.insert_gallery_photo(&NewGalleryPhoto {
                    cat_id,
                    image,
                    caption: caption.clone(),
                    photo_date: photo_date.clone(),
                    created_at: created_at.clone(),
                })?;
                added += 1;
            }
            Ok(Some(added))
        })
        .await?;

    match added {
        Some(count) => {
            info!(cat_id, count, "Added gallery photos");
            Ok(Redirect::to(&format!("/cats/{cat_id}")))
        }
        None => {
            debug!(cat_id, "Ignoring upload for unknown cat");
            Ok(Redirect::to("/cats"))
        }
    }
}

pub(super) async fn delete_photo(
    State(state): State<AppState>,
    Path(segments): Path<(String, String, String)>,
) -> Result<Redirect, AppError> {
    let (cat_id, source, photo_id) = match photo_target(&segments) {
        Ok(target) => target,
        Err(redirect) => return Ok(redirect),
    };

    if state.with_store(move |store| store.delete_photo(cat_id, source, photo_id)).await? {
        info!(cat_id, photo_id, source = source.as_str(), "Deleted photo");
    }
    Ok(Redirect::to(&format!("/cats/{cat_id}")))
}

pub(super) async fn set_profile_photo(
    State(state): State<AppState>,
    Path(segments): Path<(String, String, String)>,
) -> Result<Redirect, AppError> {
    let (cat_id, source, photo_id) = match photo_target(&segments) {
        Ok(target) => target,
        Err(redirect) => return Ok(redirect),
    };

    if state.with_store(move |store| store.set_profile_photo(cat_id, source, photo_id)).await? {
        info!(cat_id, photo_id, source = source.as_str(), "Set profile photo");
    }
    Ok(Redirect::to(&format!("/cats/{cat_id}")))
}

/// Resolve `/cats/:cat_id/photos/:source/:photo_id`. A bad cat id goes back
/// to the list; a bad source or photo id goes back to the cat page.
fn photo_target(segments: &(String, String, String)) -> Result<(i64, PhotoSource, i64), Redirect> {
    let (raw_cat, raw_source, raw_photo) = segments;
    let Some(cat_id) = parse_id(raw_cat) else {
        return Err(Redirect::to("/cats"));
    };
    match (PhotoSource::from_str(raw_source), parse_id(raw_photo)) {
        (Some(source), Some(photo_id)) => Ok((cat_id, source, photo_id)),
        _ => {
            debug!(cat_id, source = %raw_source, photo = %raw_photo, "Unknown photo");
            Err(Redirect::to(&format!("/cats/{cat_id}")))
        }
    }
}
