use super::{Db, serialize_vector};
use rusqlite::Result;
use rusqlite::types::Value;

/// Equality filters pushed down into the KNN query.
///
/// Pushing these into SQL matters: post-filtering a small top-k would
/// silently drop qualifying rows ranked below the cutoff.
#[derive(Debug, Default, Clone, Copy)]
pub struct SearchFilters<'a> {
    pub language: Option<&'a str>,
    pub kind: Option<&'a str>,
    /// Matches `prefix + "/"` at a directory boundary, never a substring.
    pub path_prefix: Option<&'a str>,
}

/// One row from a KNN query.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolHit {
    pub path: String,
    pub name: String,
    pub kind: String,
    pub language: String,
    pub line: i64,
    pub end_line: Option<i64>,
    pub signature: Option<String>,
    /// Cosine-equivalent similarity in [0, 1].
    pub score: f64,
}

impl Db {
    /// Brute-force nearest-neighbor search over the symbol embeddings.
    ///
    /// `vec_distance_l2` on unit vectors relates to cosine similarity as
    /// `score = 1 - d²/2`; rows come back best-first with ties broken by
    /// (path, line, name).
    pub fn knn(
        &self,
        query_embedding: &[f32],
        k: usize,
        filters: &SearchFilters<'_>,
    ) -> Result<Vec<SymbolHit>> {
        let mut sql = String::from(
            "SELECT file_path, name, kind, language, line, end_line, signature,
                    vec_distance_l2(embedding, ?) AS distance
             FROM symbols",
        );

        let mut where_clauses = Vec::new();
        let mut sql_params: Vec<Value> = vec![Value::Blob(serialize_vector(query_embedding))];

        if let Some(prefix) = filters.path_prefix {
            let prefix = prefix.trim_end_matches('/');
            where_clauses.push("file_path LIKE ?");
            sql_params.push(Value::Text(format!("{prefix}/%")));
        }
        if let Some(language) = filters.language {
            where_clauses.push("language = ?");
            sql_params.push(Value::Text(language.to_string()));
        }
        if let Some(kind) = filters.kind {
            where_clauses.push("kind = ?");
            sql_params.push(Value::Text(kind.to_string()));
        }

        if !where_clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_clauses.join(" AND "));
        }

        sql.push_str(" ORDER BY distance ASC, file_path ASC, line ASC, name ASC LIMIT ?");
        sql_params.push(Value::Integer(k as i64));

        let param_refs: Vec<&dyn rusqlite::ToSql> =
            sql_params.iter().map(|p| p as &dyn rusqlite::ToSql).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(param_refs.as_slice(), |row| {
            let distance: f64 = row.get(7)?;
            let score = (1.0 - (distance * distance) / 2.0).clamp(0.0, 1.0);
            Ok(SymbolHit {
                path: row.get(0)?,
                name: row.get(1)?,
                kind: row.get(2)?,
                language: row.get(3)?,
                line: row.get(4)?,
                end_line: row.get(5)?,
                signature: row.get(6)?,
                score,
            })
        })?;

        rows.collect()
    }

    /// Structural lookup: symbols whose name contains any of the given
    /// keywords (case-insensitive), ordered by path and line.
    pub fn find_symbols_by_name(&self, keywords: &[&str], limit: usize) -> Result<Vec<SymbolHit>> {
        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        let mut conditions = Vec::new();
        let mut sql_params: Vec<Value> = Vec::new();
        for keyword in keywords {
            conditions.push("LOWER(name) LIKE ?");
            sql_params.push(Value::Text(format!("%{}%", keyword.to_lowercase())));
        }
        sql_params.push(Value::Integer(limit as i64));

        let sql = format!(
            "SELECT file_path, name, kind, language, line, end_line, signature
             FROM symbols
             WHERE ({})
             ORDER BY file_path ASC, line ASC, name ASC
             LIMIT ?",
            conditions.join(" OR ")
        );

        let param_refs: Vec<&dyn rusqlite::ToSql> =
            sql_params.iter().map(|p| p as &dyn rusqlite::ToSql).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(param_refs.as_slice(), |row| {
            Ok(SymbolHit {
                path: row.get(0)?,
                name: row.get(1)?,
                kind: row.get(2)?,
                language: row.get(3)?,
                line: row.get(4)?,
                end_line: row.get(5)?,
                signature: row.get(6)?,
                score: 1.0,
            })
        })?;

        rows.collect()
    }
}
