use super::Db;
use rusqlite::{OptionalExtension, Result, params};
use std::collections::HashMap;

/// Persisted record for one indexed file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    pub path: String,
    pub hash: String,
    pub language: Option<String>,
    pub symbol_count: i64,
    /// Unix milliseconds.
    pub indexed_at: i64,
}

/// Store-wide row counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub file_count: i64,
    pub symbol_count: i64,
}

fn map_file_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FileRecord> {
    Ok(FileRecord {
        path: row.get(0)?,
        hash: row.get(1)?,
        language: row.get(2)?,
        symbol_count: row.get(3)?,
        indexed_at: row.get(4)?,
    })
}

impl Db {
    /// Fetch one file record by path.
    pub fn get_file(&self, path: &str) -> Result<Option<FileRecord>> {
        self.conn
            .query_row(
                "SELECT path, hash, language, symbol_count, indexed_at FROM files WHERE path = ?",
                params![path],
                map_file_row,
            )
            .optional()
    }

    /// All file records whose path lies under `prefix` (exact
    /// directory-boundary match). An empty prefix returns every record.
    pub fn files_under(&self, prefix: &str) -> Result<HashMap<String, FileRecord>> {
        let mut records = HashMap::new();

        if prefix.is_empty() {
            let mut stmt = self
                .conn
                .prepare_cached("SELECT path, hash, language, symbol_count, indexed_at FROM files")?;
            let rows = stmt.query_map([], map_file_row)?;
            for row in rows {
                let record = row?;
                records.insert(record.path.clone(), record);
            }
        } else {
            let prefix = prefix.trim_end_matches('/');
            let mut stmt = self.conn.prepare_cached(
                "SELECT path, hash, language, symbol_count, indexed_at FROM files
                 WHERE path = ?1 OR path LIKE ?1 || '/%'",
            )?;
            let rows = stmt.query_map(params![prefix], map_file_row)?;
            for row in rows {
                let record = row?;
                records.insert(record.path.clone(), record);
            }
        }

        Ok(records)
    }

    /// Row counts across both collections.
    pub fn stats(&self) -> Result<StoreStats> {
        let file_count: i64 = self
            .conn
            .query_row("SELECT count(*) FROM files", [], |row| row.get(0))?;
        let symbol_count: i64 = self
            .conn
            .query_row("SELECT count(*) FROM symbols", [], |row| row.get(0))?;
        Ok(StoreStats {
            file_count,
            symbol_count,
        })
    }
}
