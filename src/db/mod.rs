mod schema;
pub mod backend;
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "postgres")]
pub mod postgres_schema;

pub use backend::{CatStore, StoreResult};
pub use schema::SCHEMA;

use crate::config::{DatabaseConfig, DatabaseType};
use crate::images::StoredImage;
use crate::photos::{CatPhoto, PhotoSource};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("a cat named {0:?} already exists")]
    Conflict(String),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[cfg(feature = "postgres")]
    #[error("postgres error: {0}")]
    Postgres(#[from] ::postgres::Error),

    #[cfg(feature = "postgres")]
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("postgresql backend requested but built without the `postgres` feature")]
    BackendUnavailable,

    #[error("postgresql backend requested but no url configured")]
    MissingUrl,
}

/// A registered cat
#[derive(Debug, Clone)]
pub struct Cat {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<StoredImage>,
    pub created_at: Option<String>,
}

/// A cat with the counts shown on the cats list
#[derive(Debug, Clone)]
pub struct CatSummary {
    pub cat: Cat,
    pub sighting_count: i64,
    /// Gallery photos plus sightings that carry an image
    pub photo_count: i64,
}

#[derive(Debug, Clone)]
pub struct Sighting {
    pub id: i64,
    pub cat_id: i64,
    pub date: String,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub image: Option<StoredImage>,
}

/// A sighting joined with the cat it belongs to
#[derive(Debug, Clone)]
pub struct SightingWithCat {
    pub sighting: Sighting,
    pub cat_name: String,
    pub cat_image: Option<StoredImage>,
}

#[derive(Debug, Clone)]
pub struct GalleryPhoto {
    pub id: i64,
    pub cat_id: i64,
    pub image: StoredImage,
    pub caption: Option<String>,
    pub photo_date: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewCat {
    pub name: String,
    /// `None` leaves the column NULL (quick add)
    pub description: Option<String>,
    pub image: Option<StoredImage>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewSighting {
    pub cat_id: i64,
    pub date: String,
    pub location: String,
    pub notes: String,
    pub image: Option<StoredImage>,
}

#[derive(Debug, Clone)]
pub struct NewGalleryPhoto {
    pub cat_id: i64,
    pub image: StoredImage,
    pub caption: String,
    pub photo_date: Option<String>,
    pub created_at: String,
}

/// Macro to dispatch a method call to the active session variant.
macro_rules! dispatch {
    ($self:expr, $method:ident($($arg:expr),* $(,)?)) => {
        match $self {
            Session::Sqlite(store) => store.$method($($arg),*),
            #[cfg(feature = "postgres")]
            Session::Postgres(store) => store.$method($($arg),*),
        }
    };
}

#[derive(Clone)]
enum DatabaseInner {
    Sqlite(sqlite::SqliteDb),
    #[cfg(feature = "postgres")]
    Postgres(postgres::PgDb),
}

/// Handle to the configured database. Cheap to clone; opens a [`Session`]
/// per unit of work.
#[derive(Clone)]
pub struct Database {
    inner: DatabaseInner,
}

impl Database {
    /// Open a database based on the provided configuration.
    pub fn open(config: &DatabaseConfig) -> StoreResult<Self> {
        if config.backend == DatabaseType::Postgresql {
            return Self::open_postgres(config);
        }

        let db = sqlite::SqliteDb::open(&config.sqlite_path)?;
        Ok(Self { inner: DatabaseInner::Sqlite(db) })
    }

    #[cfg(feature = "postgres")]
    fn open_postgres(config: &DatabaseConfig) -> StoreResult<Self> {
        let url = config.postgresql_url.as_deref().ok_or(StoreError::MissingUrl)?;
        let pool_size = config.pool_size.unwrap_or(10);
        let pg = postgres::PgDb::open(url, pool_size)?;
        Ok(Self { inner: DatabaseInner::Postgres(pg) })
    }

    #[cfg(not(feature = "postgres"))]
    fn open_postgres(_config: &DatabaseConfig) -> StoreResult<Self> {
        Err(StoreError::BackendUnavailable)
    }

    /// Acquire a session. The underlying connection is released when the
    /// session is dropped.
    pub fn connect(&self) -> StoreResult<Session> {
        match &self.inner {
            DatabaseInner::Sqlite(db) => Ok(Session::Sqlite(db.connect()?)),
            #[cfg(feature = "postgres")]
            DatabaseInner::Postgres(db) => Ok(Session::Postgres(db.connect()?)),
        }
    }

    pub fn initialize(&self) -> StoreResult<()> {
        self.connect()?.initialize()
    }

    pub fn backend_name(&self) -> &'static str {
        match &self.inner {
            DatabaseInner::Sqlite(_) => "sqlite",
            #[cfg(feature = "postgres")]
            DatabaseInner::Postgres(_) => "postgresql",
        }
    }
}

/// One open connection on the active backend.
pub enum Session {
    Sqlite(sqlite::SqliteStore),
    #[cfg(feature = "postgres")]
    Postgres(postgres::PgStore),
}

impl CatStore for Session {
    fn initialize(&mut self) -> StoreResult<()> {
        dispatch!(self, initialize())
    }

    fn backend_name(&self) -> &'static str {
        dispatch!(self, backend_name())
    }

    fn list_cats(&mut self) -> StoreResult<Vec<Cat>> {
        dispatch!(self, list_cats())
    }

    fn list_cat_summaries(&mut self) -> StoreResult<Vec<CatSummary>> {
        dispatch!(self, list_cat_summaries())
    }

    fn get_cat(&mut self, cat_id: i64) -> StoreResult<Option<Cat>> {
        dispatch!(self, get_cat(cat_id))
    }

    fn count_cats(&mut self) -> StoreResult<i64> {
        dispatch!(self, count_cats())
    }

    fn insert_cat(&mut self, cat: &NewCat) -> StoreResult<i64> {
        dispatch!(self, insert_cat(cat))
    }

    fn update_cat(
        &mut self,
        cat_id: i64,
        name: &str,
        description: &str,
        image: Option<&StoredImage>,
    ) -> StoreResult<bool> {
        dispatch!(self, update_cat(cat_id, name, description, image))
    }

    fn set_cat_image(&mut self, cat_id: i64, image: Option<&StoredImage>) -> StoreResult<bool> {
        dispatch!(self, set_cat_image(cat_id, image))
    }

    fn delete_cat(&mut self, cat_id: i64) -> StoreResult<bool> {
        dispatch!(self, delete_cat(cat_id))
    }

    fn insert_sighting(&mut self, sighting: &NewSighting) -> StoreResult<i64> {
        dispatch!(self, insert_sighting(sighting))
    }

    fn delete_sighting(&mut self, sighting_id: i64) -> StoreResult<bool> {
        dispatch!(self, delete_sighting(sighting_id))
    }

    fn recent_sightings(&mut self, limit: usize) -> StoreResult<Vec<SightingWithCat>> {
        dispatch!(self, recent_sightings(limit))
    }

    fn cat_sightings(&mut self, cat_id: i64, limit: usize) -> StoreResult<Vec<Sighting>> {
        dispatch!(self, cat_sightings(cat_id, limit))
    }

    fn count_sightings(&mut self) -> StoreResult<i64> {
        dispatch!(self, count_sightings())
    }

    fn count_cat_sightings(&mut self, cat_id: i64) -> StoreResult<i64> {
        dispatch!(self, count_cat_sightings(cat_id))
    }

    fn last_sighting_date(&mut self, cat_id: i64) -> StoreResult<Option<String>> {
        dispatch!(self, last_sighting_date(cat_id))
    }

    fn insert_gallery_photo(&mut self, photo: &NewGalleryPhoto) -> StoreResult<i64> {
        dispatch!(self, insert_gallery_photo(photo))
    }

    fn gallery_photos(&mut self, cat_id: i64) -> StoreResult<Vec<GalleryPhoto>> {
        dispatch!(self, gallery_photos(cat_id))
    }

    fn sighting_photos(&mut self, cat_id: i64) -> StoreResult<Vec<Sighting>> {
        dispatch!(self, sighting_photos(cat_id))
    }

    fn find_photo(
        &mut self,
        cat_id: i64,
        source: PhotoSource,
        photo_id: i64,
    ) -> StoreResult<Option<CatPhoto>> {
        dispatch!(self, find_photo(cat_id, source, photo_id))
    }

    fn delete_photo(
        &mut self,
        cat_id: i64,
        source: PhotoSource,
        photo_id: i64,
    ) -> StoreResult<bool> {
        dispatch!(self, delete_photo(cat_id, source, photo_id))
    }
}
