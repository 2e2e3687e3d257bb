//! PostgreSQL backend implementation.

use postgres::error::SqlState;
use postgres::{NoTls, Row};
use r2d2::{Pool, PooledConnection};
use r2d2_postgres::PostgresConnectionManager;

use super::backend::{CatStore, StoreResult};
use super::postgres_schema::POSTGRES_SCHEMA;
use super::{
    Cat, CatSummary, GalleryPhoto, NewCat, NewGalleryPhoto, NewSighting, Sighting,
    SightingWithCat, StoreError,
};
use crate::images::StoredImage;
use crate::photos::{CatPhoto, PhotoSource};

type Manager = PostgresConnectionManager<NoTls>;

#[derive(Clone)]
pub struct PgDb {
    pool: Pool<Manager>,
}

impl PgDb {
    pub fn open(url: &str, pool_size: u32) -> StoreResult<Self> {
        let manager = PostgresConnectionManager::new(url.parse()?, NoTls);
        let pool = Pool::builder().max_size(pool_size).build(manager)?;
        Ok(Self { pool })
    }

    /// Check a connection out of the pool; it returns when the store drops.
    pub fn connect(&self) -> StoreResult<PgStore> {
        Ok(PgStore { client: self.pool.get()? })
    }
}

pub struct PgStore {
    client: PooledConnection<Manager>,
}

fn name_conflict(err: postgres::Error, name: &str) -> StoreError {
    if err.code() == Some(&SqlState::UNIQUE_VIOLATION) {
        StoreError::Conflict(name.to_string())
    } else {
        err.into()
    }
}

const CAT_COLUMNS: &str = "id, name, description, image_data, image_type, created_at";
const SIGHTING_COLUMNS: &str = "id, cat_id, date, location, notes, image_data, image_type";
const PHOTO_COLUMNS: &str = "id, cat_id, image_data, image_type, caption, photo_date, created_at";

fn row_to_cat(row: &Row) -> Cat {
    Cat {
        id: row.get(0),
        name: row.get(1),
        description: row.get(2),
        image: StoredImage::from_columns(row.get(3), row.get(4)),
        created_at: row.get(5),
    }
}

fn row_to_sighting(row: &Row, offset: usize) -> Sighting {
    Sighting {
        id: row.get(offset),
        cat_id: row.get(offset + 1),
        date: row.get(offset + 2),
        location: row.get(offset + 3),
        notes: row.get(offset + 4),
        image: StoredImage::from_columns(row.get(offset + 5), row.get(offset + 6)),
    }
}

fn row_to_gallery_photo(row: &Row) -> GalleryPhoto {
    GalleryPhoto {
        id: row.get(0),
        cat_id: row.get(1),
        image: StoredImage {
            data: row.get(2),
            mime_type: row.get(3),
        },
        caption: row.get(4),
        photo_date: row.get(5),
        created_at: row.get(6),
    }
}

impl CatStore for PgStore {
    fn initialize(&mut self) -> StoreResult<()> {
        self.client.batch_execute(POSTGRES_SCHEMA)?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgresql"
    }

    // ========================================================================
    // Cat operations
    // ========================================================================

    fn list_cats(&mut self) -> StoreResult<Vec<Cat>> {
        let rows = self
            .client
            .query(&format!("SELECT {CAT_COLUMNS} FROM cats ORDER BY name") as &str, &[])?;
        Ok(rows.iter().map(row_to_cat).collect())
    }

    fn list_cat_summaries(&mut self) -> StoreResult<Vec<CatSummary>> {
        let rows = self.client.query(
            r#"
            SELECT c.id, c.name, c.description, c.image_data, c.image_type, c.created_at,
                   (SELECT COUNT(*) FROM sightings s WHERE s.cat_id = c.id),
                   (SELECT COUNT(*) FROM sightings s
                     WHERE s.cat_id = c.id AND s.image_data IS NOT NULL AND s.image_data <> '')
                   + (SELECT COUNT(*) FROM cat_photos p WHERE p.cat_id = c.id)
            FROM cats c
            ORDER BY c.name
            "#,
            &[],
        )?;
        Ok(rows
            .iter()
            .map(|row| CatSummary {
                cat: row_to_cat(row),
                sighting_count: row.get(6),
                photo_count: row.get(7),
            })
            .collect())
    }

    fn get_cat(&mut self, cat_id: i64) -> StoreResult<Option<Cat>> {
        let row = self.client.query_opt(
            &format!("SELECT {CAT_COLUMNS} FROM cats WHERE id = $1") as &str,
            &[&cat_id],
        )?;
        Ok(row.as_ref().map(row_to_cat))
    }

    fn count_cats(&mut self) -> StoreResult<i64> {
        let row = self.client.query_one("SELECT COUNT(*) FROM cats", &[])?;
        Ok(row.get(0))
    }

    fn insert_cat(&mut self, cat: &NewCat) -> StoreResult<i64> {
        let image_data = cat.image.as_ref().map(|i| i.data.as_str());
        let image_type = cat.image.as_ref().map(|i| i.mime_type.as_str());
        let row = self
            .client
            .query_one(
                r#"
                INSERT INTO cats (name, description, image_data, image_type, created_at)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
                "#,
                &[&cat.name, &cat.description, &image_data, &image_type, &cat.created_at],
            )
            .map_err(|e| name_conflict(e, &cat.name))?;
        Ok(row.get(0))
    }

    fn update_cat(
        &mut self,
        cat_id: i64,
        name: &str,
        description: &str,
        image: Option<&StoredImage>,
    ) -> StoreResult<bool> {
        let updated = match image {
            Some(image) => self.client.execute(
                r#"
                UPDATE cats SET name = $1, description = $2, image_data = $3, image_type = $4
                WHERE id = $5
                "#,
                &[&name, &description, &image.data, &image.mime_type, &cat_id],
            ),
            None => self.client.execute(
                "UPDATE cats SET name = $1, description = $2 WHERE id = $3",
                &[&name, &description, &cat_id],
            ),
        }
        .map_err(|e| name_conflict(e, name))?;
        Ok(updated > 0)
    }

    fn set_cat_image(&mut self, cat_id: i64, image: Option<&StoredImage>) -> StoreResult<bool> {
        let image_data = image.map(|i| i.data.as_str());
        let image_type = image.map(|i| i.mime_type.as_str());
        let updated = self.client.execute(
            "UPDATE cats SET image_data = $1, image_type = $2 WHERE id = $3",
            &[&image_data, &image_type, &cat_id],
        )?;
        Ok(updated > 0)
    }

    fn delete_cat(&mut self, cat_id: i64) -> StoreResult<bool> {
        let mut tx = self.client.transaction()?;
        tx.execute("DELETE FROM cat_photos WHERE cat_id = $1", &[&cat_id])?;
        tx.execute("DELETE FROM sightings WHERE cat_id = $1", &[&cat_id])?;
        let deleted = tx.execute("DELETE FROM cats WHERE id = $1", &[&cat_id])?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    // ========================================================================
    // Sighting operations
    // ========================================================================

    fn insert_sighting(&mut self, sighting: &NewSighting) -> StoreResult<i64> {
        let image_data = sighting.image.as_ref().map(|i| i.data.as_str());
        let image_type = sighting.image.as_ref().map(|i| i.mime_type.as_str());
        let row = self.client.query_one(
            r#"
            INSERT INTO sightings (cat_id, date, location, notes, image_data, image_type)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
            &[
                &sighting.cat_id,
                &sighting.date,
                &sighting.location,
                &sighting.notes,
                &image_data,
                &image_type,
            ],
        )?;
        Ok(row.get(0))
    }

    fn delete_sighting(&mut self, sighting_id: i64) -> StoreResult<bool> {
        let deleted = self
            .client
            .execute("DELETE FROM sightings WHERE id = $1", &[&sighting_id])?;
        Ok(deleted > 0)
    }

    fn recent_sightings(&mut self, limit: usize) -> StoreResult<Vec<SightingWithCat>> {
        let limit = limit as i64;
        let rows = self.client.query(
            r#"
            SELECT s.id, s.cat_id, s.date, s.location, s.notes, s.image_data, s.image_type,
                   c.name, c.image_data, c.image_type
            FROM sightings s
            JOIN cats c ON s.cat_id = c.id
            ORDER BY s.date DESC, s.id DESC
            LIMIT $1
            "#,
            &[&limit],
        )?;
        Ok(rows
            .iter()
            .map(|row| SightingWithCat {
                sighting: row_to_sighting(row, 0),
                cat_name: row.get(7),
                cat_image: StoredImage::from_columns(row.get(8), row.get(9)),
            })
            .collect())
    }

    fn cat_sightings(&mut self, cat_id: i64, limit: usize) -> StoreResult<Vec<Sighting>> {
        let limit = limit as i64;
        let rows = self.client.query(
            &format!(
                "SELECT {SIGHTING_COLUMNS} FROM sightings WHERE cat_id = $1 ORDER BY date DESC, id DESC LIMIT $2"
            ) as &str,
            &[&cat_id, &limit],
        )?;
        Ok(rows.iter().map(|row| row_to_sighting(row, 0)).collect())
    }

    fn count_sightings(&mut self) -> StoreResult<i64> {
        let row = self.client.query_one("SELECT COUNT(*) FROM sightings", &[])?;
        Ok(row.get(0))
    }

    fn count_cat_sightings(&mut self, cat_id: i64) -> StoreResult<i64> {
        let row = self.client.query_one(
            "SELECT COUNT(*) FROM sightings WHERE cat_id = $1",
            &[&cat_id],
        )?;
        Ok(row.get(0))
    }

    fn last_sighting_date(&mut self, cat_id: i64) -> StoreResult<Option<String>> {
        let row = self.client.query_opt(
            "SELECT date FROM sightings WHERE cat_id = $1 ORDER BY date DESC LIMIT 1",
            &[&cat_id],
        )?;
        Ok(row.map(|r| r.get(0)))
    }

    // ========================================================================
    // Photo operations
    // ========================================================================

    fn insert_gallery_photo(&mut self, photo: &NewGalleryPhoto) -> StoreResult<i64> {
        let row = self.client.query_one(
            r#"
            INSERT INTO cat_photos (cat_id, image_data, image_type, caption, photo_date, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
            &[
                &photo.cat_id,
                &photo.image.data,
                &photo.image.mime_type,
                &photo.caption,
                &photo.photo_date,
                &photo.created_at,
            ],
        )?;
        Ok(row.get(0))
    }

    fn gallery_photos(&mut self, cat_id: i64) -> StoreResult<Vec<GalleryPhoto>> {
        let rows = self.client.query(
            &format!("SELECT {PHOTO_COLUMNS} FROM cat_photos WHERE cat_id = $1 ORDER BY id") as &str,
            &[&cat_id],
        )?;
        Ok(rows.iter().map(row_to_gallery_photo).collect())
    }

    fn sighting_photos(&mut self, cat_id: i64) -> StoreResult<Vec<Sighting>> {
        let rows = self.client.query(
            &format!(
                "SELECT {SIGHTING_COLUMNS} FROM sightings WHERE cat_id = $1 AND image_data IS NOT NULL AND image_data <> '' ORDER BY id"
            ) as &str,
            &[&cat_id],
        )?;
        Ok(rows.iter().map(|row| row_to_sighting(row, 0)).collect())
    }

    fn find_photo(
        &mut self,
        cat_id: i64,
        source: PhotoSource,
        photo_id: i64,
    ) -> StoreResult<Option<CatPhoto>> {
        let photo = match source {
            PhotoSource::Gallery => self
                .client
                .query_opt(
                    &format!("SELECT {PHOTO_COLUMNS} FROM cat_photos WHERE id = $1 AND cat_id = $2")
                        as &str,
                    &[&photo_id, &cat_id],
                )?
                .map(|row| CatPhoto::Gallery(row_to_gallery_photo(&row))),
            PhotoSource::Sighting => self
                .client
                .query_opt(
                    &format!("SELECT {SIGHTING_COLUMNS} FROM sightings WHERE id = $1 AND cat_id = $2")
                        as &str,
                    &[&photo_id, &cat_id],
                )?
                .map(|row| CatPhoto::Sighting(row_to_sighting(&row, 0))),
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
            PhotoSource::Gallery => self.client.execute(
                "DELETE FROM cat_photos WHERE id = $1 AND cat_id = $2",
                &[&photo_id, &cat_id],
            )?,
            PhotoSource::Sighting => self.client.execute(
                "UPDATE sightings SET image_data = NULL, image_type = NULL WHERE id = $1 AND cat_id = $2",
                &[&photo_id, &cat_id],
            )?,
        };
        Ok(changed > 0)
    }
}
