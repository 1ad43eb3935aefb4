//! Database migrations
//!
//! Versioned schema migrations tracked in `schema_migrations`; each version is
//! applied inside its own transaction.

use crate::core::error::{CuraError, Result};
use rusqlite::Connection;
use tracing::{info, warn};

/// Migration version tracking table
const MIGRATION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    applied_at DATETIME DEFAULT CURRENT_TIMESTAMP
)
"#;

/// Initial schema migration (version 1)
const MIGRATION_V1: &str = r#"
-- Identities (authentication)
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT UNIQUE NOT NULL,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL CHECK (role IN ('patient', 'researcher')),
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT
);

-- Patient profiles
CREATE TABLE IF NOT EXISTS patient_profiles (
    id TEXT PRIMARY KEY,
    user_id TEXT UNIQUE NOT NULL,
    full_name TEXT,
    conditions TEXT NOT NULL DEFAULT '[]',
    location TEXT,
    age INTEGER,
    gender TEXT,
    additional_info TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

-- Researcher profiles
CREATE TABLE IF NOT EXISTS researcher_profiles (
    id TEXT PRIMARY KEY,
    user_id TEXT UNIQUE NOT NULL,
    full_name TEXT,
    institution TEXT,
    specialties TEXT NOT NULL DEFAULT '[]',
    research_interests TEXT NOT NULL DEFAULT '[]',
    orcid TEXT,
    researchgate_url TEXT,
    bio TEXT,
    location TEXT,
    available_for_meetings INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

-- Clinical trials
CREATE TABLE IF NOT EXISTS clinical_trials (
    id TEXT PRIMARY KEY,
    nct_id TEXT UNIQUE,
    title TEXT NOT NULL,
    description TEXT,
    status TEXT NOT NULL DEFAULT 'recruiting',
    phase TEXT,
    conditions TEXT NOT NULL DEFAULT '[]',
    eligibility TEXT,
    locations TEXT NOT NULL DEFAULT '[]',
    contact_email TEXT,
    contact_phone TEXT,
    start_date TEXT,
    completion_date TEXT,
    enrollment INTEGER,
    url TEXT,
    source TEXT NOT NULL DEFAULT 'platform',
    ai_summary TEXT,
    created_by TEXT,
    created_at TEXT NOT NULL,
    FOREIGN KEY (created_by) REFERENCES users(id) ON DELETE SET NULL
);

-- Publications
CREATE TABLE IF NOT EXISTS publications (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    authors TEXT NOT NULL DEFAULT '[]',
    abstract TEXT,
    journal TEXT,
    publication_date TEXT,
    doi TEXT,
    pmid TEXT UNIQUE,
    url TEXT,
    keywords TEXT NOT NULL DEFAULT '[]',
    conditions TEXT NOT NULL DEFAULT '[]',
    ai_summary TEXT,
    created_by TEXT,
    created_at TEXT NOT NULL,
    FOREIGN KEY (created_by) REFERENCES users(id) ON DELETE SET NULL
);

-- Health experts directory
CREATE TABLE IF NOT EXISTS health_experts (
    id TEXT PRIMARY KEY,
    full_name TEXT NOT NULL,
    specialties TEXT NOT NULL DEFAULT '[]',
    institution TEXT,
    location TEXT,
    email TEXT,
    phone TEXT,
    bio TEXT,
    research_interests TEXT NOT NULL DEFAULT '[]',
    orcid TEXT,
    is_platform_member INTEGER NOT NULL DEFAULT 0,
    publications_count INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

-- Favorites
CREATE TABLE IF NOT EXISTS favorites (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    favorite_type TEXT NOT NULL,
    favorite_id TEXT NOT NULL,
    notes TEXT,
    created_at TEXT NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
    UNIQUE(user_id, favorite_type, favorite_id)
);

-- Forums
CREATE TABLE IF NOT EXISTS forums (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    category TEXT,
    created_by TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    FOREIGN KEY (created_by) REFERENCES users(id)
);

CREATE TABLE IF NOT EXISTS forum_posts (
    id TEXT PRIMARY KEY,
    forum_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    author_type TEXT NOT NULL,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL,
    FOREIGN KEY (forum_id) REFERENCES forums(id) ON DELETE CASCADE,
    FOREIGN KEY (user_id) REFERENCES users(id)
);

CREATE TABLE IF NOT EXISTS forum_replies (
    id TEXT PRIMARY KEY,
    post_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL,
    FOREIGN KEY (post_id) REFERENCES forum_posts(id) ON DELETE CASCADE,
    FOREIGN KEY (user_id) REFERENCES users(id)
);

-- Meeting requests
CREATE TABLE IF NOT EXISTS meeting_requests (
    id TEXT PRIMARY KEY,
    requester_id TEXT NOT NULL,
    expert_id TEXT NOT NULL,
    message TEXT,
    contact_info TEXT NOT NULL DEFAULT '{}',
    status TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL,
    updated_at TEXT,
    FOREIGN KEY (requester_id) REFERENCES users(id) ON DELETE CASCADE
);

-- Indexes for performance
CREATE INDEX IF NOT EXISTS idx_clinical_trials_status ON clinical_trials(status);
CREATE INDEX IF NOT EXISTS idx_clinical_trials_created_at ON clinical_trials(created_at);
CREATE INDEX IF NOT EXISTS idx_publications_created_at ON publications(created_at);
CREATE INDEX IF NOT EXISTS idx_favorites_user_id ON favorites(user_id);
CREATE INDEX IF NOT EXISTS idx_forum_posts_forum_id ON forum_posts(forum_id);
CREATE INDEX IF NOT EXISTS idx_forum_replies_post_id ON forum_replies(post_id);
CREATE INDEX IF NOT EXISTS idx_meeting_requests_requester ON meeting_requests(requester_id);
"#;

/// Ordered list of (version, description, sql)
const MIGRATIONS: &[(i64, &str, &str)] = &[(1, "Initial schema", MIGRATION_V1)];

/// Run all pending database migrations
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    info!("Running database migrations");

    conn.execute_batch(MIGRATION_TABLE)
        .map_err(CuraError::DatabaseError)?;

    let current_version = current_version(conn)?;
    info!("Current database schema version: {}", current_version);

    for (version, description, sql) in MIGRATIONS {
        if current_version < *version {
            info!("Applying migration v{}: {}", version, description);
            apply_migration(conn, *version, sql)?;
        }
    }

    info!("Database migrations completed successfully");
    Ok(())
}

/// Highest applied migration version, 0 for a fresh database
pub fn current_version(conn: &Connection) -> Result<i64> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )
    .map_err(CuraError::DatabaseError)
}

/// Apply a single migration
fn apply_migration(conn: &mut Connection, version: i64, sql: &str) -> Result<()> {
    let tx = conn.transaction().map_err(CuraError::DatabaseError)?;

    tx.execute_batch(sql).map_err(|e| {
        warn!("Migration v{} failed: {}", version, e);
        CuraError::DatabaseError(e)
    })?;

    tx.execute("INSERT INTO schema_migrations (version) VALUES (?)", [version])
        .map_err(CuraError::DatabaseError)?;

    tx.commit().map_err(CuraError::DatabaseError)?;

    info!("Migration v{} applied successfully", version);
    Ok(())
}
