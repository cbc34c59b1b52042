//! SQLite schema definitions
//!
//! Fresh databases get the complete schema at once; existing databases are
//! brought forward by the versioned migrations.

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// Complete schema SQL
///
/// Dates are unix seconds. Booleans are 0/1 integers.
pub const SCHEMA: &str = r#"
-- =============================================================================
-- Infrastructure: Schema version tracking
-- =============================================================================
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    version INTEGER NOT NULL,
    applied_at INTEGER NOT NULL,
    description TEXT
);

CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at INTEGER NOT NULL,
    checksum TEXT NOT NULL,
    execution_time_ms INTEGER,
    success INTEGER NOT NULL DEFAULT 1
);

-- =============================================================================
-- 1. Products (catalog listing)
-- =============================================================================
CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY,
    seller_id TEXT NOT NULL,
    name TEXT NOT NULL CHECK(length(name) >= 1 AND length(name) <= 200),
    category TEXT NOT NULL,
    price REAL NOT NULL CHECK(price >= 0),
    stock INTEGER NOT NULL DEFAULT 0,
    is_active INTEGER NOT NULL DEFAULT 1 CHECK(is_active IN (0, 1)),
    rating REAL CHECK(rating IS NULL OR (rating >= 0 AND rating <= 5)),
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_products_active_price ON products(is_active, price, id);
CREATE INDEX IF NOT EXISTS idx_products_active_created ON products(is_active, created_at, id);
CREATE INDEX IF NOT EXISTS idx_products_category ON products(category);
CREATE INDEX IF NOT EXISTS idx_products_rating ON products(rating, id);

-- =============================================================================
-- 2. Posts (social feed)
-- =============================================================================
CREATE TABLE IF NOT EXISTS posts (
    id INTEGER PRIMARY KEY,
    author_id TEXT NOT NULL,
    body TEXT NOT NULL CHECK(length(body) <= 10000),
    visibility TEXT NOT NULL DEFAULT 'public' CHECK(visibility IN ('public', 'followers', 'private')),
    like_count INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    edited_at INTEGER
);

CREATE INDEX IF NOT EXISTS idx_posts_visibility_created ON posts(visibility, created_at, id);
CREATE INDEX IF NOT EXISTS idx_posts_author_created ON posts(author_id, created_at, id);
"#;
