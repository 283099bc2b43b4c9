//! Search service: embeds natural-language queries and runs them against
//! the symbol store, merging multi-query results by best score.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex as TokioMutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::db::Db;
use crate::db::search::{SearchFilters, SymbolHit};
use crate::embedder::{Embedder, EmbedderError};
use crate::extractor::SymbolKind;
use crate::indexer::{IndexManager, IndexOutcome};

#[derive(Error, Debug)]
pub enum SearchError {
    /// A failed embedding backend is a visible error, distinct from an
    /// empty result set.
    #[error("query embedding failed for {query:?}: {source}")]
    Embedding {
        query: String,
        #[source]
        source: EmbedderError,
    },

    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),
}

/// One search call: one or more queries merged into a single ranking.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub queries: Vec<String>,
    /// Maximum results returned after merging.
    pub limit: usize,
    /// Minimum similarity to keep, in [0, 1].
    pub threshold: Option<f64>,
    pub language: Option<String>,
    pub kind: Option<SymbolKind>,
    pub path_prefix: Option<String>,
}

impl SearchRequest {
    pub fn new(queries: Vec<String>) -> Self {
        Self {
            queries,
            limit: 10,
            threshold: None,
            language: None,
            kind: None,
            path_prefix: None,
        }
    }
}

/// One ranked search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub path: String,
    pub name: String,
    pub kind: String,
    pub language: String,
    pub line: i64,
    pub end_line: Option<i64>,
    pub signature: Option<String>,
    pub score: f64,
}

/// Serves similarity queries over a shared store.
pub struct Searcher {
    db: Arc<TokioMutex<Db>>,
    embedder: Arc<dyn Embedder>,
}

impl Searcher {
    pub fn new(db: Arc<TokioMutex<Db>>, embedder: Arc<dyn Embedder>) -> Self {
        Self { db, embedder }
    }

    /// Run every query independently, then merge by symbol identity
    /// (path, line, name) keeping the best score per symbol.
    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>, SearchError> {
        if request.queries.is_empty() || request.limit == 0 {
            return Ok(Vec::new());
        }

        let texts: Vec<&str> = request.queries.iter().map(String::as_str).collect();
        let query_embeddings =
            self.embedder
                .embed_batch(&texts, true)
                .map_err(|source| SearchError::Embedding {
                    query: request.queries[0].clone(),
                    source,
                })?;

        // Over-fetch per query so the merged set survives deduplication.
        let per_query_k = if request.queries.len() > 1 {
            (request.limit as f64 * 1.5).ceil() as usize
        } else {
            request.limit
        };

        let kind = request.kind.map(|k| k.as_str());
        let filters = SearchFilters {
            language: request.language.as_deref(),
            kind,
            path_prefix: request.path_prefix.as_deref(),
        };

        let mut best: HashMap<(String, i64, String), SymbolHit> = HashMap::new();
        {
            let db = self.db.lock().await;
            for embedding in &query_embeddings {
                for hit in db.knn(embedding, per_query_k, &filters)? {
                    let key = (hit.path.clone(), hit.line, hit.name.clone());
                    match best.get(&key) {
                        Some(existing) if existing.score >= hit.score => {}
                        _ => {
                            best.insert(key, hit);
                        }
                    }
                }
            }
        }

        let threshold = request.threshold.unwrap_or(0.0);
        let mut merged: Vec<SymbolHit> = best
            .into_values()
            .filter(|hit| hit.score >= threshold)
            .collect();
        merged.sort_by(compare_hits);
        merged.truncate(request.limit);

        debug!(
            queries = request.queries.len(),
            results = merged.len(),
            "search complete"
        );

        Ok(merged
            .into_iter()
            .map(|hit| SearchResult {
                path: hit.path,
                name: hit.name,
                kind: hit.kind,
                language: hit.language,
                line: hit.line,
                end_line: hit.end_line,
                signature: hit.signature,
                score: hit.score,
            })
            .collect())
    }

    /// Bring the store up to date for `scan_dir` first, then search.
    ///
    /// This is the usual entry point for interactive callers: stale or
    /// missing records for the scope are refreshed before the query runs.
    pub async fn search_scope(
        &self,
        manager: &IndexManager,
        scan_dir: &Path,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> anyhow::Result<(IndexOutcome, Vec<SearchResult>)> {
        let outcome = manager.index_scope(scan_dir, cancel).await?;
        let results = self.search(request).await?;
        Ok((outcome, results))
    }
}

/// Descending score; ties broken by (path, line, name) so repeated queries
/// return a stable order.
fn compare_hits(a: &SymbolHit, b: &SymbolHit) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.path.cmp(&b.path))
        .then_with(|| a.line.cmp(&b.line))
        .then_with(|| a.name.cmp(&b.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::symbols::{FileReplacement, SymbolInsert};
    use crate::embedder::mock::MockEmbedder;

    const DIMS: usize = 64;

    fn store_symbol(db: &mut Db, embedder: &MockEmbedder, path: &str, name: &str, line: i64, text: &str) {
        let embedding = embedder.embed(text, false).unwrap();
        db.replace_files(
            &[FileReplacement {
                path: path.to_string(),
                hash: format!("{path}:{name}:{line}"),
                language: Some("rust".to_string()),
                symbols: vec![SymbolInsert {
                    name: name.to_string(),
                    kind: "function".to_string(),
                    line,
                    end_line: None,
                    signature: None,
                    embedding_text: text.to_string(),
                    embedding,
                }],
            }],
            &[],
        )
        .unwrap();
    }

    fn searcher_with(symbols: &[(&str, &str, i64, &str)]) -> Searcher {
        let embedder = MockEmbedder::new(DIMS);
        let mut db = Db::open_in_memory().unwrap();
        for (path, name, line, text) in symbols {
            store_symbol(&mut db, &embedder, path, name, *line, text);
        }
        Searcher::new(
            Arc::new(TokioMutex::new(db)),
            Arc::new(MockEmbedder::new(DIMS)),
        )
    }

    #[tokio::test]
    async fn test_empty_queries_and_empty_store() {
        let searcher = searcher_with(&[]);

        let results = searcher
            .search(&SearchRequest::new(vec![]))
            .await
            .unwrap();
        assert!(results.is_empty());

        let results = searcher
            .search(&SearchRequest::new(vec!["anything".to_string()]))
            .await
            .unwrap();
        assert!(results.is_empty(), "never-built store yields zero results");
    }

    #[tokio::test]
    async fn test_exact_text_ranks_first_with_unit_score() {
        let searcher = searcher_with(&[
            ("src/a.rs", "alpha", 1, "rust | src/a.rs | alpha"),
            ("src/b.rs", "beta", 1, "rust | src/b.rs | beta"),
        ]);

        let results = searcher
            .search(&SearchRequest::new(vec!["rust | src/a.rs | alpha".to_string()]))
            .await
            .unwrap();

        assert_eq!(results[0].name, "alpha");
        assert!(results[0].score > 0.999, "got {}", results[0].score);
    }

    #[tokio::test]
    async fn test_multi_query_merge_keeps_best_score_once() {
        let searcher = searcher_with(&[
            ("src/a.rs", "alpha", 3, "rust | src/a.rs | alpha"),
            ("src/b.rs", "beta", 7, "rust | src/b.rs | beta"),
        ]);

        // "alpha" scores ~1.0 under the first query and lower under the
        // second; the merged result must carry the best score, once.
        let results = searcher
            .search(&SearchRequest::new(vec![
                "rust | src/a.rs | alpha".to_string(),
                "unrelated query text".to_string(),
            ]))
            .await
            .unwrap();

        let alphas: Vec<&SearchResult> =
            results.iter().filter(|r| r.name == "alpha").collect();
        assert_eq!(alphas.len(), 1, "deduplicated to a single entry");
        assert!(alphas[0].score > 0.999);
    }

    #[tokio::test]
    async fn test_threshold_filters_low_scores() {
        let searcher = searcher_with(&[
            ("src/a.rs", "alpha", 1, "rust | src/a.rs | alpha"),
            ("src/b.rs", "beta", 1, "rust | src/b.rs | beta"),
        ]);

        let mut request = SearchRequest::new(vec!["rust | src/a.rs | alpha".to_string()]);
        request.threshold = Some(0.999);
        let results = searcher.search(&request).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "alpha");
    }

    #[tokio::test]
    async fn test_limit_truncates_after_merge() {
        let searcher = searcher_with(&[
            ("a.rs", "one", 1, "rust | a.rs | one"),
            ("b.rs", "two", 1, "rust | b.rs | two"),
            ("c.rs", "three", 1, "rust | c.rs | three"),
        ]);

        let mut request = SearchRequest::new(vec!["rust | a.rs | one".to_string()]);
        request.limit = 2;
        let results = searcher.search(&request).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_kind_filter_pushdown_through_service() {
        let embedder = MockEmbedder::new(DIMS);
        let mut db = Db::open_in_memory().unwrap();
        store_symbol(&mut db, &embedder, "a.rs", "thing", 1, "rust | a.rs | thing");
        db.replace_files(
            &[FileReplacement {
                path: "b.rs".to_string(),
                hash: "b".to_string(),
                language: Some("rust".to_string()),
                symbols: vec![SymbolInsert {
                    name: "Thing".to_string(),
                    kind: "struct".to_string(),
                    line: 1,
                    end_line: None,
                    signature: None,
                    embedding_text: "rust | b.rs | Thing".to_string(),
                    embedding: embedder.embed("rust | b.rs | Thing", false).unwrap(),
                }],
            }],
            &[],
        )
        .unwrap();
        let searcher = Searcher::new(
            Arc::new(TokioMutex::new(db)),
            Arc::new(MockEmbedder::new(DIMS)),
        );

        let mut request = SearchRequest::new(vec!["thing".to_string()]);
        request.kind = Some(SymbolKind::Struct);
        let results = searcher.search(&request).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].kind, "struct");
    }
}
