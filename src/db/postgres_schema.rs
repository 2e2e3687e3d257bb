pub const POSTGRES_SCHEMA: &str = r#"
-- PostgreSQL schema for Cattrack

CREATE TABLE IF NOT EXISTS cats (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    description TEXT,
    image_data TEXT,
    image_type TEXT,
    created_at TEXT DEFAULT to_char(NOW() AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"')
);

CREATE TABLE IF NOT EXISTS sightings (
    id BIGSERIAL PRIMARY KEY,
    cat_id BIGINT NOT NULL REFERENCES cats(id) ON DELETE CASCADE,
    date TEXT NOT NULL,
    location TEXT,
    notes TEXT,
    image_data TEXT,
    image_type TEXT
);

CREATE INDEX IF NOT EXISTS idx_sightings_cat ON sightings(cat_id);
CREATE INDEX IF NOT EXISTS idx_sightings_date ON sightings(date);

CREATE TABLE IF NOT EXISTS cat_photos (
    id BIGSERIAL PRIMARY KEY,
    cat_id BIGINT NOT NULL REFERENCES cats(id) ON DELETE CASCADE,
    image_data TEXT NOT NULL,
    image_type TEXT NOT NULL,
    caption TEXT,
    photo_date TEXT,
    created_at TEXT DEFAULT to_char(NOW() AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"')
);

CREATE INDEX IF NOT EXISTS idx_cat_photos_cat ON cat_photos(cat_id);
"#;
