pub const SCHEMA: &str = r#"
-- Cats: one row per registered cat
CREATE TABLE IF NOT EXISTS cats (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    description TEXT,

    -- Profile image, copied from a photo or uploaded directly (base64)
    image_data TEXT,
    image_type TEXT,

    created_at TEXT DEFAULT CURRENT_TIMESTAMP
);

-- Sightings: point-in-time observations of a cat
CREATE TABLE IF NOT EXISTS sightings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    cat_id INTEGER NOT NULL,
    date TEXT NOT NULL,
    location TEXT,
    notes TEXT,
    image_data TEXT,  -- NULL when no photo, or after the photo was removed
    image_type TEXT,
    FOREIGN KEY (cat_id) REFERENCES cats(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_sightings_cat ON sightings(cat_id);
CREATE INDEX IF NOT EXISTS idx_sightings_date ON sightings(date);

-- Gallery photos uploaded directly to a cat
CREATE TABLE IF NOT EXISTS cat_photos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    cat_id INTEGER NOT NULL,
    image_data TEXT NOT NULL,
    image_type TEXT NOT NULL,
    caption TEXT,
    photo_date TEXT,  -- When the photo was taken, if the uploader said
    created_at TEXT DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (cat_id) REFERENCES cats(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_cat_photos_cat ON cat_photos(cat_id);
"#;
