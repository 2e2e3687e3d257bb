//! Storage interface shared by the SQLite and PostgreSQL backends.
//!
//! A `CatStore` is one open connection. Handlers acquire a store at the start
//! of a request and drop it at the end, so every method takes `&mut self` and
//! nothing is shared between requests.

use super::{Cat, CatSummary, GalleryPhoto, NewCat, NewGalleryPhoto, NewSighting, Sighting,
    SightingWithCat, StoreError};
use crate::images::StoredImage;
use crate::photos::{self, CatPhoto, PhotoSource, TimelinePhoto};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

pub trait CatStore {
    // === Connection Management ===

    /// Create tables and indexes if they do not exist yet
    fn initialize(&mut self) -> StoreResult<()>;

    /// Short backend name reported by the health endpoint
    fn backend_name(&self) -> &'static str;

    // === Cat Operations ===

    /// All cats ordered by name
    fn list_cats(&mut self) -> StoreResult<Vec<Cat>>;

    /// All cats ordered by name, with sighting and photo counts
    fn list_cat_summaries(&mut self) -> StoreResult<Vec<CatSummary>>;

    fn get_cat(&mut self, cat_id: i64) -> StoreResult<Option<Cat>>;

    fn count_cats(&mut self) -> StoreResult<i64>;

    /// Insert a cat; a taken name yields `StoreError::Conflict`
    fn insert_cat(&mut self, cat: &NewCat) -> StoreResult<i64>;

    /// Update name and description, replacing the profile image when given.
    /// Returns false if the cat does not exist.
    fn update_cat(
        &mut self,
        cat_id: i64,
        name: &str,
        description: &str,
        image: Option<&StoredImage>,
    ) -> StoreResult<bool>;

    /// Set or clear the profile image
    fn set_cat_image(&mut self, cat_id: i64, image: Option<&StoredImage>) -> StoreResult<bool>;

    /// Delete a cat together with its gallery photos and sightings
    fn delete_cat(&mut self, cat_id: i64) -> StoreResult<bool>;

    // === Sighting Operations ===

    fn insert_sighting(&mut self, sighting: &NewSighting) -> StoreResult<i64>;

    fn delete_sighting(&mut self, sighting_id: i64) -> StoreResult<bool>;

    /// Most recent sightings across all cats, newest first
    fn recent_sightings(&mut self, limit: usize) -> StoreResult<Vec<SightingWithCat>>;

    /// Most recent sightings of one cat, newest first
    fn cat_sightings(&mut self, cat_id: i64, limit: usize) -> StoreResult<Vec<Sighting>>;

    fn count_sightings(&mut self) -> StoreResult<i64>;

    fn count_cat_sightings(&mut self, cat_id: i64) -> StoreResult<i64>;

    /// Raw date of the cat's most recent sighting
    fn last_sighting_date(&mut self, cat_id: i64) -> StoreResult<Option<String>>;

    // === Photo Operations ===

    fn insert_gallery_photo(&mut self, photo: &NewGalleryPhoto) -> StoreResult<i64>;

    fn gallery_photos(&mut self, cat_id: i64) -> StoreResult<Vec<GalleryPhoto>>;

    /// Sightings of the cat that still carry an image
    fn sighting_photos(&mut self, cat_id: i64) -> StoreResult<Vec<Sighting>>;

    /// Look up a photo, scoped to the cat it belongs to
    fn find_photo(
        &mut self,
        cat_id: i64,
        source: PhotoSource,
        photo_id: i64,
    ) -> StoreResult<Option<CatPhoto>>;

    /// Remove a photo. Gallery rows are deleted; sightings only lose their image.
    fn delete_photo(&mut self, cat_id: i64, source: PhotoSource, photo_id: i64)
        -> StoreResult<bool>;

    // === Derived Operations ===

    /// Gallery and sighting photos merged newest-first
    fn cat_photos(&mut self, cat_id: i64) -> StoreResult<Vec<TimelinePhoto>> {
        let gallery = self.gallery_photos(cat_id)?;
        let sightings = self.sighting_photos(cat_id)?;
        Ok(photos::aggregate(gallery, sightings))
    }

    /// Copy a photo's image onto the cat. No-op when the photo is missing or
    /// has no image.
    fn set_profile_photo(
        &mut self,
        cat_id: i64,
        source: PhotoSource,
        photo_id: i64,
    ) -> StoreResult<bool> {
        let image = match self.find_photo(cat_id, source, photo_id)? {
            Some(photo) => photo.image().cloned(),
            None => None,
        };
        match image {
            Some(image) => self.set_cat_image(cat_id, Some(&image)),
            None => Ok(false),
        }
    }
}
