//! Vector store module using SQLite and sqlite-vec.
//!
//! Two record collections: `files` keyed by relative path and `symbols`
//! keyed by rowid with non-unique indexes on path, language, and kind for
//! filter pushdown, plus a `meta` table holding the schema version. KNN is
//! brute-force `vec_distance_l2()` over L2-normalized embeddings.

use rusqlite::{Connection, Result, params};
use sqlite_vec::sqlite3_vec_init;
use std::path::Path;
use std::sync::Once;
use tracing::{info, warn};

pub mod files;
pub mod search;
pub mod symbols;

const SCHEMA_VERSION: i32 = 1;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS files (
    path TEXT PRIMARY KEY,
    hash TEXT NOT NULL,
    language TEXT,
    symbol_count INTEGER NOT NULL DEFAULT 0,
    indexed_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS symbols (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    embedding BLOB NOT NULL,
    file_path TEXT NOT NULL,
    name TEXT NOT NULL,
    kind TEXT NOT NULL,
    language TEXT NOT NULL,
    line INTEGER NOT NULL,
    end_line INTEGER,
    signature TEXT,
    embedding_text TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_symbols_file_path ON symbols(file_path);
CREATE INDEX IF NOT EXISTS idx_symbols_language ON symbols(language);
CREATE INDEX IF NOT EXISTS idx_symbols_kind ON symbols(kind);
"#;

static INIT_VEC: Once = Once::new();

/// Initialize the sqlite-vec extension. Safe to call multiple times.
fn init_sqlite_vec() {
    INIT_VEC.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite3_vec_init as *const (),
        )));
    });
}

/// A SQLite connection initialized with sqlite-vec and the symbol store
/// schema.
pub struct Db {
    pub(crate) conn: Connection,
}

impl Db {
    /// Open a database at the given path, creating parent directories and
    /// initializing the schema as needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        init_sqlite_vec();

        let conn = Connection::open(path)?;
        let vec_version: String = conn.query_row("SELECT vec_version()", [], |row| row.get(0))?;
        info!("Opened symbol store {} (sqlite-vec {})", path.display(), vec_version);

        conn.pragma_update(None, "journal_mode", "WAL")?;

        let mut db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Open an in-memory database (useful for testing).
    pub fn open_in_memory() -> Result<Self> {
        init_sqlite_vec();
        let conn = Connection::open_in_memory()?;
        let mut db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Create the schema. A schema-version mismatch triggers a full
    /// rebuild: all tables are dropped and recreated, never migrated.
    fn init_schema(&mut self) -> Result<()> {
        let has_meta: bool = self
            .conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name='meta'",
                [],
                |row| row.get::<_, i64>(0),
            )
            .map(|c| c > 0)?;

        if has_meta {
            let version: Option<String> = self
                .conn
                .query_row(
                    "SELECT value FROM meta WHERE key = 'schema_version'",
                    [],
                    |row| row.get(0),
                )
                .ok();

            if version
                .as_deref()
                .and_then(|v| v.parse::<i32>().ok())
                == Some(SCHEMA_VERSION)
            {
                return Ok(());
            }

            warn!("Schema version mismatch, rebuilding symbol store");
            self.conn.execute_batch(
                "DROP TABLE IF EXISTS files;
                 DROP TABLE IF EXISTS symbols;
                 DROP TABLE IF EXISTS meta;",
            )?;
        }

        self.conn.execute_batch(SCHEMA_SQL)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES (?, ?)",
            params!["schema_version", SCHEMA_VERSION.to_string()],
        )?;

        Ok(())
    }
}

/// Serialize an f32 vector into the little-endian blob layout the vec
/// functions expect.
pub fn serialize_vector(vector: &[f32]) -> Vec<u8> {
    bytemuck::cast_slice(vector).to_vec()
}
