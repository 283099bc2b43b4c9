use super::{Db, serialize_vector};
use chrono::Utc;
use rusqlite::{Result, params};

/// One symbol row ready for insertion, embedding included.
#[derive(Debug, Clone)]
pub struct SymbolInsert {
    pub name: String,
    pub kind: String,
    pub line: i64,
    pub end_line: Option<i64>,
    pub signature: Option<String>,
    pub embedding_text: String,
    pub embedding: Vec<f32>,
}

/// Full replacement for one file: its record plus all of its symbols.
#[derive(Debug, Clone)]
pub struct FileReplacement {
    pub path: String,
    pub hash: String,
    pub language: Option<String>,
    pub symbols: Vec<SymbolInsert>,
}

impl Db {
    /// Apply one indexing batch atomically.
    ///
    /// For every replaced path all existing symbol rows and the file row
    /// are deleted before the new rows go in; `removed` paths lose both
    /// their symbols and their file record. The whole batch is a single
    /// transaction, so an interrupted write can never leave orphaned
    /// symbol rows or a file row whose hash does not match its symbols.
    ///
    /// Returns the number of symbol rows inserted.
    pub fn replace_files(
        &mut self,
        changes: &[FileReplacement],
        removed: &[String],
    ) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let now = Utc::now().timestamp_millis();
        let mut inserted = 0usize;

        {
            let mut delete_symbols =
                tx.prepare_cached("DELETE FROM symbols WHERE file_path = ?")?;
            let mut delete_file = tx.prepare_cached("DELETE FROM files WHERE path = ?")?;
            let mut insert_symbol = tx.prepare_cached(
                "INSERT INTO symbols (embedding, file_path, name, kind, language, line, end_line, signature, embedding_text)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )?;
            let mut upsert_file = tx.prepare_cached(
                "INSERT OR REPLACE INTO files (path, hash, language, symbol_count, indexed_at)
                 VALUES (?, ?, ?, ?, ?)",
            )?;

            for path in removed {
                delete_symbols.execute(params![path])?;
                delete_file.execute(params![path])?;
            }

            for change in changes {
                delete_symbols.execute(params![change.path])?;
                for symbol in &change.symbols {
                    insert_symbol.execute(params![
                        serialize_vector(&symbol.embedding),
                        change.path,
                        symbol.name,
                        symbol.kind,
                        change.language.as_deref().unwrap_or(""),
                        symbol.line,
                        symbol.end_line,
                        symbol.signature,
                        symbol.embedding_text,
                    ])?;
                    inserted += 1;
                }
                upsert_file.execute(params![
                    change.path,
                    change.hash,
                    change.language,
                    change.symbols.len() as i64,
                    now,
                ])?;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }
}
