//! The incremental index manager.
//!
//! Walks a scope, hashes file contents, diffs against the persisted file
//! table, and re-extracts/re-embeds/re-stores only changed or new files.
//! Writes land in per-batch transactions, so an aborted pass leaves the
//! store consistent: earlier batches stand, the batch in flight is never
//! half-committed.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::sync::Mutex as TokioMutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::walker::Walker;
use crate::chunk::{self, Chunk};
use crate::config::Config;
use crate::db::Db;
use crate::db::symbols::{FileReplacement, SymbolInsert};
use crate::embedder::{Embedder, EmbedderError};
use crate::extractor::ExtractOptions;
use crate::extractor::grammars::SpecRegistry;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("scan directory not found: {0}")]
    ScopeNotFound(PathBuf),

    #[error("scan directory {scope} is outside the repository root {root}")]
    OutsideRoot { scope: PathBuf, root: PathBuf },

    #[error("embedding failed near {path}: {source}")]
    Embedding {
        path: String,
        #[source]
        source: EmbedderError,
    },

    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("indexing cancelled")]
    Cancelled,
}

/// Per-phase wall-clock spent in one indexing pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IndexTimings {
    pub scan_ms: u64,
    pub embed_ms: u64,
    pub write_ms: u64,
}

/// Counters from one indexing pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndexOutcome {
    pub files_scanned: usize,
    pub files_indexed: usize,
    pub files_skipped: usize,
    pub files_deleted: usize,
    pub symbols_indexed: usize,
    pub timings: IndexTimings,
}

struct PendingFile {
    rel_path: String,
    hash: String,
    language: &'static str,
    chunks: Vec<Chunk>,
}

/// Drives incremental synchronization of one repository's symbol store.
pub struct IndexManager {
    db: Arc<TokioMutex<Db>>,
    embedder: Arc<dyn Embedder>,
    registry: Arc<SpecRegistry>,
    repo_root: PathBuf,
    embed_batch_size: usize,
    extra_ignores: Vec<String>,
}

impl IndexManager {
    pub fn new(
        db: Arc<TokioMutex<Db>>,
        embedder: Arc<dyn Embedder>,
        repo_root: &Path,
        config: &Config,
    ) -> Self {
        Self {
            db,
            embedder,
            registry: Arc::new(SpecRegistry::new()),
            repo_root: repo_root.to_path_buf(),
            embed_batch_size: config.embed_batch_size.max(1),
            extra_ignores: config.ignore_patterns.clone(),
        }
    }

    /// Replace the grammar registry, e.g. to add host-registered specs.
    pub fn with_registry(mut self, registry: Arc<SpecRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Bring the store up to date for `scan_dir` (a directory under the
    /// repository root).
    pub async fn index_scope(
        &self,
        scan_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<IndexOutcome, IndexError> {
        if !scan_dir.is_dir() {
            return Err(IndexError::ScopeNotFound(scan_dir.to_path_buf()));
        }
        let scope = std::path::absolute(scan_dir)
            .map_err(|_| IndexError::ScopeNotFound(scan_dir.to_path_buf()))?;
        let root = std::path::absolute(&self.repo_root)
            .map_err(|_| IndexError::ScopeNotFound(self.repo_root.clone()))?;
        let prefix = scope
            .strip_prefix(&root)
            .map_err(|_| IndexError::OutsideRoot {
                scope: scope.clone(),
                root: root.clone(),
            })
            .map(unix_path)?;

        let existing = {
            let db = self.db.lock().await;
            db.files_under(&prefix)?
        };

        let scan_started = Instant::now();
        let walker = Walker::new(&scope, &self.extra_ignores);
        let files = walker.files(&self.registry);

        let mut outcome = IndexOutcome::default();
        let mut pending: Vec<PendingFile> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for path in files {
            if cancel.is_cancelled() {
                return Err(IndexError::Cancelled);
            }
            outcome.files_scanned += 1;

            let Some(grammar) = self.registry.grammar_for_path(&path) else {
                continue;
            };
            let rel = match path.strip_prefix(&root) {
                Ok(rel) => unix_path(rel),
                Err(_) => continue,
            };

            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(path = %rel, "failed to read file, skipping: {e}");
                    outcome.files_skipped += 1;
                    continue;
                }
            };
            let hash = blake3::hash(&bytes).to_hex().to_string();

            if existing.get(&rel).is_some_and(|record| record.hash == hash) {
                seen.insert(rel);
                outcome.files_skipped += 1;
                continue;
            }

            let source = String::from_utf8_lossy(&bytes);
            let Some(tree) = self.registry.parse(&source, grammar) else {
                // A transient parse failure must not delete a previously
                // good index entry.
                warn!(path = %rel, grammar, "parse failed, keeping prior index entry");
                seen.insert(rel);
                outcome.files_skipped += 1;
                continue;
            };

            let symbols = self
                .registry
                .extract(&tree, grammar, &source, &ExtractOptions::default());
            let chunks = chunk::build_chunks(&symbols, grammar, &rel);
            debug!(path = %rel, chunks = chunks.len(), "file staged for indexing");

            seen.insert(rel.clone());
            pending.push(PendingFile {
                rel_path: rel,
                hash,
                language: grammar,
                chunks,
            });
        }

        let removed: Vec<String> = {
            let mut removed: Vec<String> = existing
                .keys()
                .filter(|path| !seen.contains(*path))
                .cloned()
                .collect();
            removed.sort();
            removed
        };
        outcome.timings.scan_ms = scan_started.elapsed().as_millis() as u64;

        if cancel.is_cancelled() {
            return Err(IndexError::Cancelled);
        }

        let mut queue = pending.into_iter().peekable();
        while queue.peek().is_some() {
            if cancel.is_cancelled() {
                return Err(IndexError::Cancelled);
            }

            let mut batch: Vec<PendingFile> = Vec::new();
            let mut batch_texts = 0usize;
            while let Some(file) = queue.peek() {
                if !batch.is_empty() && batch_texts + file.chunks.len() > self.embed_batch_size {
                    break;
                }
                batch_texts += file.chunks.len();
                batch.push(queue.next().expect("peeked"));
                if batch_texts >= self.embed_batch_size {
                    break;
                }
            }

            let embed_started = Instant::now();
            let texts: Vec<&str> = batch
                .iter()
                .flat_map(|f| f.chunks.iter().map(|c| c.embedding_text.as_str()))
                .collect();
            let embeddings = if texts.is_empty() {
                Vec::new()
            } else {
                self.embedder
                    .embed_batch(&texts, false)
                    .map_err(|source| IndexError::Embedding {
                        path: batch[0].rel_path.clone(),
                        source,
                    })?
            };
            if embeddings.len() != texts.len() {
                return Err(IndexError::Embedding {
                    path: batch[0].rel_path.clone(),
                    source: EmbedderError::InferenceFailed(format!(
                        "backend returned {} vectors for {} texts",
                        embeddings.len(),
                        texts.len()
                    )),
                });
            }
            outcome.timings.embed_ms += embed_started.elapsed().as_millis() as u64;

            let write_started = Instant::now();
            let mut vectors = embeddings.into_iter();
            let changes: Vec<FileReplacement> = batch
                .into_iter()
                .map(|file| FileReplacement {
                    path: file.rel_path,
                    hash: file.hash,
                    language: Some(file.language.to_string()),
                    symbols: file
                        .chunks
                        .into_iter()
                        .map(|c| SymbolInsert {
                            name: c.name,
                            kind: c.kind.as_str().to_string(),
                            line: c.start_line as i64,
                            end_line: Some(c.end_line as i64),
                            signature: c.signature,
                            embedding_text: c.embedding_text,
                            embedding: vectors.next().unwrap_or_default(),
                        })
                        .collect(),
                })
                .collect();

            let inserted = {
                let mut db = self.db.lock().await;
                db.replace_files(&changes, &[])?
            };
            outcome.files_indexed += changes.len();
            outcome.symbols_indexed += inserted;
            outcome.timings.write_ms += write_started.elapsed().as_millis() as u64;
        }

        if !removed.is_empty() {
            if cancel.is_cancelled() {
                return Err(IndexError::Cancelled);
            }
            let write_started = Instant::now();
            {
                let mut db = self.db.lock().await;
                db.replace_files(&[], &removed)?;
            }
            outcome.files_deleted = removed.len();
            outcome.timings.write_ms += write_started.elapsed().as_millis() as u64;
        }

        info!(
            scanned = outcome.files_scanned,
            indexed = outcome.files_indexed,
            skipped = outcome.files_skipped,
            deleted = outcome.files_deleted,
            symbols = outcome.symbols_indexed,
            "index pass complete"
        );
        Ok(outcome)
    }
}

/// Relative path with forward slashes, the store's join-key form.
fn unix_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
