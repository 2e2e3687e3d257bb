//! SQLite backend implementation.

use rusqlite::{Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::backend::{CatStore, StoreResult};
use super::schema::SCHEMA;
use super::{
    Cat, CatSummary, GalleryPhoto, NewCat, NewGalleryPhoto, NewSighting, Sighting,
    SightingWithCat, StoreError,
};
use crate::images::StoredImage;
use crate::photos::{CatPhoto, PhotoSource};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Location of the SQLite database file. Each session opens its own connection.
#[derive(Debug, Clone)]
pub struct SqliteDb {
    path: PathBuf,
}

impl SqliteDb {
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self { path: path.to_path_buf() })
    }

    pub fn connect(&self) -> StoreResult<SqliteStore> {
        let conn = Connection::open(&self.path)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(SqliteStore { conn })
    }
}

/// A single SQLite connection, held for the duration of one request.
pub struct SqliteStore {
    conn: Connection,
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn name_conflict(err: rusqlite::Error, name: &str) -> StoreError {
    if is_unique_violation(&err) {
        StoreError::Conflict(name.to_string())
    } else {
        err.into()
    }
}

const CAT_COLUMNS: &str = "id, name, description, image_data, image_type, created_at";
const SIGHTING_COLUMNS: &str = "id, cat_id, date, location, notes, image_data, image_type";
const PHOTO_COLUMNS: &str = "id, cat_id, image_data, image_type, caption, photo_date, created_at";

fn row_to_cat(row: &Row) -> rusqlite::Result<Cat> {
    Ok(Cat {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        image: StoredImage::from_columns(row.get(3)?, row.get(4)?),
        created_at: row.get(5)?,
    })
}

/// Reads a sighting starting at column `offset`.
fn row_to_sighting(row: &Row, offset: usize) -> rusqlite::Result<Sighting> {
    Ok(Sighting {
        id: row.get(offset)?,
        cat_id: row.get(offset + 1)?,
        date: row.get(offset + 2)?,
        location: row.get(offset + 3)?,
        notes: row.get(offset + 4)?,
        image: StoredImage::from_columns(row.get(offset + 5)?, row.get(offset + 6)?),
    })
}

fn row_to_gallery_photo(row: &Row) -> rusqlite::Result<GalleryPhoto> {
    Ok(GalleryPhoto {
        id: row.get(0)?,
        cat_id: row.get(1)?,
        image: StoredImage {
            data: row.get(2)?,
            mime_type: row.get(3)?,
        },
        caption: row.get(4)?,
        photo_date: row.get(5)?,
        created_at: row.get(6)?,
    })
}

impl CatStore for SqliteStore {
    fn initialize(&mut self) -> StoreResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    // ========================================================================
    // Cat operations
    // ========================================================================

    fn list_cats(&mut self) -> StoreResult<Vec<Cat>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {CAT_COLUMNS} FROM cats ORDER BY name"))?;
        let cats = stmt
            .query_map([], row_to_cat)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cats)
    }

    fn list_cat_summaries(&mut self) -> StoreResult<Vec<CatSummary>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT c.id, c.name, c.description, c.image_data, c.image_type, c.created_at,
                   (SELECT COUNT(*) FROM sightings s WHERE s.cat_id = c.id),
                   (SELECT COUNT(*) FROM sightings s
                     WHERE s.cat_id = c.id AND s.image_data IS NOT NULL AND s.image_data <> '')
                   + (SELECT COUNT(*) FROM cat_photos p WHERE p.cat_id = c.id)
            FROM cats c
            ORDER BY c.name
            "#,
        )?;
        let summaries = stmt
            .query_map([], |row| {
                Ok(CatSummary {
                    cat: row_to_cat(row)?,
                    sighting_count: row.get(6)?,
                    photo_count: row.get(7)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(summaries)
    }

    fn get_cat(&mut self, cat_id: i64) -> StoreResult<Option<Cat>> {
        let cat = self
            .conn
            .query_row(
                &format!("SELECT {CAT_COLUMNS} FROM cats WHERE id = ?"),
                [cat_id],
                row_to_cat,
            )
            .optional()?;
        Ok(cat)
    }

    fn count_cats(&mut self) -> StoreResult<i64> {
        let count = self.conn.query_row("SELECT COUNT(*) FROM cats", [], |row| row.get(0))?;
        Ok(count)
    }

    fn insert_cat(&mut self, cat: &NewCat) -> StoreResult<i64> {
        let (image_data, image_type) = match &cat.image {
            Some(image) => (Some(image.data.as_str()), Some(image.mime_type.as_str())),
            None => (None, None),
        };
        self.conn
            .execute(
                r#"
                INSERT INTO cats (name, description, image_data, image_type, created_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
                rusqlite::params![cat.name, cat.description, image_data, image_type, cat.created_at],
            )
            .map_err(|e| name_conflict(e, &cat.name))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_cat(
        &mut self,
        cat_id: i64,
        name: &str,
        description: &str,
        image: Option<&StoredImage>,
    ) -> StoreResult<bool> {
        let updated = match image {
            Some(image) => self.conn.execute(
                r#"
                UPDATE cats SET name = ?, description = ?, image_data = ?, image_type = ?
                WHERE id = ?
                "#,
                rusqlite::params![name, description, image.data, image.mime_type, cat_id],
            ),
            None => self.conn.execute(
                "UPDATE cats SET name = ?, description = ? WHERE id = ?",
                rusqlite::params![name, description, cat_id],
            ),
        }
        .map_err(|e| name_conflict(e, name))?;
        Ok(updated > 0)
    }

    fn set_cat_image(&mut self, cat_id: i64, image: Option<&StoredImage>) -> StoreResult<bool> {
        let updated = self.conn.execute(
            "UPDATE cats SET image_data = ?, image_type = ? WHERE id = ?",
            rusqlite::params![
                image.map(|i| i.data.as_str()),
                image.map(|i| i.mime_type.as_str()),
                cat_id
            ],
        )?;
        Ok(updated > 0)
    }

    fn delete_cat(&mut self, cat_id: i64) -> StoreResult<bool> {
        // Dependent rows first, then the cat, in one transaction
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM cat_photos WHERE cat_id = ?", [cat_id])?;
        tx.execute("DELETE FROM sightings WHERE cat_id = ?", [cat_id])?;
        let deleted = tx.execute("DELETE FROM cats WHERE id = ?", [cat_id])?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    // ========================================================================
    // Sighting operations
    // ========================================================================

    fn insert_sighting(&mut self, sighting: &NewSighting) -> StoreResult<i64> {
        let image = sighting.image.as_ref();
        self.conn.execute(
            r#"
            INSERT INTO sightings (cat_id, date, location, notes, image_data, image_type)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            rusqlite::params![
                sighting.cat_id,
                sighting.date,
                sighting.location,
                sighting.notes,
                image.map(|i| i.data.as_str()),
                image.map(|i| i.mime_type.as_str()),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn delete_sighting(&mut self, sighting_id: i64) -> StoreResult<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM sightings WHERE id = ?", [sighting_id])?;
        Ok(deleted > 0)
    }

    fn recent_sightings(&mut self, limit: usize) -> StoreResult<Vec<SightingWithCat>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT s.id, s.cat_id, s.date, s.location, s.notes, s.image_data, s.image_type,
                   c.name, c.image_data, c.image_type
            FROM sightings s
            JOIN cats c ON s.cat_id = c.id
            ORDER BY s.date DESC, s.id DESC
            LIMIT ?
            "#,
        )?;
        let sightings = stmt
            .query_map([limit as i64], |row| {
                Ok(SightingWithCat {
                    sighting: row_to_sighting(row, 0)?,
                    cat_name: row.get(7)?,
                    cat_image: StoredImage::from_columns(row.get(8)?, row.get(9)?),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sightings)
    }

    fn cat_sightings(&mut self, cat_id: i64, limit: usize) -> StoreResult<Vec<Sighting>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SIGHTING_COLUMNS} FROM sightings WHERE cat_id = ? ORDER BY date DESC, id DESC LIMIT ?"
        ))?;
        let sightings = stmt
            .query_map(rusqlite::params![cat_id, limit as i64], |row| row_to_sighting(row, 0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sightings)
    }

    fn count_sightings(&mut self) -> StoreResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM sightings", [], |row| row.get(0))?;
        Ok(count)
    }

    fn count_cat_sightings(&mut self, cat_id: i64) -> StoreResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM sightings WHERE cat_id = ?",
            [cat_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn last_sighting_date(&mut self, cat_id: i64) -> StoreResult<Option<String>> {
        let date = self
            .conn
            .query_row(
                "SELECT date FROM sightings WHERE cat_id = ? ORDER BY date DESC LIMIT 1",
                [cat_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(date)
    }

    // ========================================================================
    // Photo operations
    // ========================================================================

    fn insert_gallery_photo(&mut self, photo: &NewGalleryPhoto) -> StoreResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO cat_photos (cat_id, image_data, image_type, caption, photo_date, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            rusqlite::params![
                photo.cat_id,
                photo.image.data,
                photo.image.mime_type,
                photo.caption,
                photo.photo_date,
                photo.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn gallery_photos(&mut self, cat_id: i64) -> StoreResult<Vec<GalleryPhoto>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PHOTO_COLUMNS} FROM cat_photos WHERE cat_id = ? ORDER BY id"
        ))?;
        let photos = stmt
            .query_map([cat_id], row_to_gallery_photo)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(photos)
    }

    fn sighting_photos(&mut self, cat_id: i64) -> StoreResult<Vec<Sighting>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SIGHTING_COLUMNS} FROM sightings WHERE cat_id = ? AND image_data IS NOT NULL AND image_data <> '' ORDER BY id"
        ))?;
        let sightings = stmt
            .query_map([cat_id], |row| row_to_sighting(row, 0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sightings)
    }

    fn find_photo(
        &mut self,
        cat_id: i64,
        source: PhotoSource,
        photo_id: i64,
    ) -> StoreResult<Option<CatPhoto>> {
        let photo = match source {
            PhotoSource::Gallery => self
                .conn
                .query_row(
                    &format!("SELECT {PHOTO_COLUMNS} FROM cat_photos WHERE id = ? AND cat_id = ?"),
                    [photo_id, cat_id],
                    row_to_gallery_photo,
                )
                .optional()?
                .map(CatPhoto::Gallery),
            PhotoSource::Sighting => self
                .conn
                .query_row(
                    &format!("SELECT {SIGHTING_COLUMNS} FROM sightings WHERE id = ? AND cat_id = ?"),
                    [photo_id, cat_id],
                    |row| row_to_sighting(row, 0),
                )
                .optional()?
                .map(CatPhoto::Sighting),
        };
        Ok(photo)
    }

    fn delete_photo(
        &mut self,
        cat_id: i64,
        source: PhotoSource,
        photo_id: i64,
    ) -> StoreResult<bool> {
        let changed = match source {
            PhotoSource::Gallery => self.conn.execute(
                "DELETE FROM cat_photos WHERE id = ? AND cat_id = ?",
                [photo_id, cat_id],
            )?,
            PhotoSource::Sighting => self.conn.execute(
                "UPDATE sightings SET image_data = NULL, image_type = NULL WHERE id = ? AND cat_id = ?",
                [photo_id, cat_id],
            )?,
        };
        Ok(changed > 0)
    }
}
