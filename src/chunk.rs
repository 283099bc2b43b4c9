//! Chunk builder: flattens a symbol forest into the units that actually
//! get embedded and stored.

use crate::extractor::{Symbol, SymbolKind};

/// One indexable unit, paired with its canonical embedding string.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub name: String,
    pub kind: SymbolKind,
    pub language: String,
    /// Path relative to the repository root, `/`-separated.
    pub path: String,
    pub start_line: usize,
    pub end_line: usize,
    pub signature: Option<String>,
    /// `"<language> | <relative-path> | <signature-or-name>"`
    pub embedding_text: String,
}

/// Flatten a symbol forest into chunks, in declaration order.
///
/// Non-indexable kinds are excluded but their children are still visited.
pub fn build_chunks(symbols: &[Symbol], language: &str, path: &str) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    for symbol in symbols {
        flatten(symbol, language, path, &mut chunks);
    }
    chunks
}

fn flatten(symbol: &Symbol, language: &str, path: &str, out: &mut Vec<Chunk>) {
    if symbol.kind.is_indexable() {
        let representation = symbol.signature.as_deref().unwrap_or(&symbol.name);
        out.push(Chunk {
            name: symbol.name.clone(),
            kind: symbol.kind,
            language: language.to_string(),
            path: path.to_string(),
            start_line: symbol.start_line,
            end_line: symbol.end_line,
            signature: symbol.signature.clone(),
            embedding_text: format!("{language} | {path} | {representation}"),
        });
    }
    for child in &symbol.children {
        flatten(child, language, path, out);
    }
}
