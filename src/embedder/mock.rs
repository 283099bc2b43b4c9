/// Mock embedder for testing purposes.
///
/// Generates deterministic embeddings based on text hash.
use std::hash::{DefaultHasher, Hash, Hasher};

use super::{Embedder, EmbedderError};

/// A mock embedder that produces deterministic vectors from text hashes.
///
/// Useful for testing without loading a real embedding model. The
/// `is_query` flag is ignored: identical text yields the identical vector
/// whether embedded as a query or as a document, which is exactly what the
/// exact-match search tests rely on.
pub struct MockEmbedder {
    pub dimensions: usize,
}

impl MockEmbedder {
    /// Create a new `MockEmbedder` with the given dimensionality.
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self { dimensions: 768 }
    }
}

impl Embedder for MockEmbedder {
    fn embed_batch(&self, texts: &[&str], _is_query: bool) -> Result<Vec<Vec<f32>>, EmbedderError> {
        texts.iter().map(|t| hash_embed(t, self.dimensions)).collect()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

fn hash_embed(text: &str, dimensions: usize) -> Result<Vec<f32>, EmbedderError> {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    let hash = hasher.finish();

    // Use the hash bytes to seed deterministic float values; re-hash per
    // stride so the vector is not periodic in 8 components.
    let mut embedding = Vec::with_capacity(dimensions);
    let mut state = hash;
    for i in 0..dimensions {
        if i % 8 == 0 {
            let mut h = DefaultHasher::new();
            state.hash(&mut h);
            state = h.finish();
        }
        let byte = state.to_le_bytes()[i % 8];
        embedding.push(byte as f32 / 255.0);
    }

    // L2 normalize
    let norm_sq: f32 = embedding.iter().map(|v| v * v).sum();
    if norm_sq > 0.0 {
        let inv = 1.0 / norm_sq.sqrt();
        for v in &mut embedding {
            *v *= inv;
        }
    }

    Ok(embedding)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_embed_dimensions() {
        let embedder = MockEmbedder::new(768);
        let result = embedder.embed("hello world", false).unwrap();
        assert_eq!(result.len(), 768);
    }

    #[test]
    fn test_mock_embed_deterministic() {
        let embedder = MockEmbedder::new(768);
        let a = embedder.embed("hello", false).unwrap();
        let b = embedder.embed("hello", false).unwrap();
        assert_eq!(a, b, "same input should produce same output");
    }

    #[test]
    fn test_mock_embed_query_flag_ignored() {
        let embedder = MockEmbedder::new(768);
        let doc = embedder.embed("find users", false).unwrap();
        let query = embedder.embed("find users", true).unwrap();
        assert_eq!(doc, query);
    }

    #[test]
    fn test_mock_embed_different_inputs() {
        let embedder = MockEmbedder::new(768);
        let a = embedder.embed("hello", false).unwrap();
        let b = embedder.embed("world", false).unwrap();
        assert_ne!(a, b, "different inputs should produce different outputs");
    }

    #[test]
    fn test_mock_embed_normalized() {
        let embedder = MockEmbedder::new(768);
        let vec = embedder.embed("test normalization", false).unwrap();
        let norm: f32 = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!(
            (norm - 1.0).abs() < 0.01,
            "vector should be approximately unit length, got {norm}"
        );
    }

    #[test]
    fn test_mock_embed_batch() {
        let embedder = MockEmbedder::new(128);
        let results = embedder.embed_batch(&["a", "b", "c"], false).unwrap();
        assert_eq!(results.len(), 3);
        for vec in &results {
            assert_eq!(vec.len(), 128);
        }
    }

    #[test]
    fn test_mock_default_dimensions() {
        let embedder = MockEmbedder::default();
        assert_eq!(embedder.dimensions(), 768);
    }
}
