/// Embedder trait and shared types for text embedding.
///
/// The embedding model itself is an external collaborator: callers plug in
/// any backend that maps text to fixed-length L2-normalized vectors.
pub mod mock;

use thiserror::Error;

/// Errors that can occur during embedding operations.
#[derive(Error, Debug)]
pub enum EmbedderError {
    #[error("inference failed: {0}")]
    InferenceFailed(String),

    #[error("model load failed: {0}")]
    ModelLoadFailed(String),
}

/// Trait for text embedding implementations.
///
/// All implementations must be `Send + Sync` to allow concurrent use
/// behind `Arc`.
///
/// `is_query` distinguishes natural-language queries from indexed document
/// text; some backends prepend a retrieval prefix to queries, and that
/// distinction must survive all the way to the backend call.
pub trait Embedder: Send + Sync {
    /// Embed multiple text strings into vectors, one per input.
    fn embed_batch(&self, texts: &[&str], is_query: bool) -> Result<Vec<Vec<f32>>, EmbedderError>;

    /// Return the dimensionality of the embedding vectors.
    fn dimensions(&self) -> usize;

    /// Embed a single text string into a vector.
    fn embed(&self, text: &str, is_query: bool) -> Result<Vec<f32>, EmbedderError> {
        let mut vectors = self.embed_batch(&[text], is_query)?;
        vectors
            .pop()
            .ok_or_else(|| EmbedderError::InferenceFailed("backend returned no vectors".into()))
    }
}
