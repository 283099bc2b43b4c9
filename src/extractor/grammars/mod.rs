//! Grammar registry: extension resolution, parser construction, and the
//! built-in [`LanguageSpec`] implementations.

pub mod ecma;
pub mod go;
pub mod json;
pub mod python;
pub mod rust;

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use tree_sitter::{Language, Parser, Tree};

use super::spec::LanguageSpec;
use super::{ExtractOptions, Symbol, run_extraction};

pub use ecma::EcmaSpec;
pub use go::GoSpec;
pub use json::JsonSpec;
pub use python::PythonSpec;
pub use rust::RustSpec;

/// Registry of grammar specifications and their file extensions.
///
/// `new` seeds the built-in grammars; hosts may [`register`](Self::register)
/// additional specs, e.g. for grammars they parse themselves. A later
/// registration for the same grammar id wins.
pub struct SpecRegistry {
    specs: HashMap<&'static str, Arc<dyn LanguageSpec>>,
    extensions: HashMap<String, &'static str>,
}

impl SpecRegistry {
    /// Create a registry with all built-in grammar specs.
    pub fn new() -> Self {
        let mut registry = Self {
            specs: HashMap::new(),
            extensions: HashMap::new(),
        };

        registry.register(Arc::new(RustSpec), &["rs"]);
        registry.register(Arc::new(GoSpec), &["go"]);
        registry.register(Arc::new(PythonSpec), &["py"]);
        registry.register(Arc::new(EcmaSpec::typescript()), &["ts", "tsx"]);
        registry.register(Arc::new(EcmaSpec::javascript()), &["js", "jsx", "mjs", "cjs"]);
        registry.register(Arc::new(JsonSpec), &["json"]);

        registry
    }

    /// Register a spec and the file extensions that resolve to it.
    pub fn register(&mut self, language_spec: Arc<dyn LanguageSpec>, extensions: &[&str]) {
        let grammar = language_spec.grammar_id();
        for ext in extensions {
            self.extensions.insert((*ext).to_string(), grammar);
        }
        self.specs.insert(grammar, language_spec);
    }

    /// Get the spec for a grammar id.
    pub fn spec(&self, grammar: &str) -> Option<&dyn LanguageSpec> {
        self.specs.get(grammar).map(|s| s.as_ref())
    }

    /// Resolve a file path to a grammar id by extension.
    pub fn grammar_for_path(&self, path: &Path) -> Option<&'static str> {
        let ext = path.extension()?.to_str()?;
        self.extensions.get(ext).copied()
    }

    /// Grammar ids with a built-in parser.
    pub fn supported_grammars(&self) -> Vec<&'static str> {
        self.specs.keys().copied().collect()
    }

    /// The Tree-sitter language for a built-in grammar id.
    pub fn language(grammar: &str) -> Option<Language> {
        match grammar {
            "rust" => Some(tree_sitter_rust::LANGUAGE.into()),
            "go" => Some(tree_sitter_go::LANGUAGE.into()),
            "python" => Some(tree_sitter_python::LANGUAGE.into()),
            "typescript" => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            "javascript" => Some(tree_sitter_javascript::LANGUAGE.into()),
            "json" => Some(tree_sitter_json::LANGUAGE.into()),
            _ => None,
        }
    }

    /// Parse source text with a built-in grammar. `None` when the grammar
    /// has no parser here or parsing fails outright.
    pub fn parse(&self, source: &str, grammar: &str) -> Option<Tree> {
        let language = Self::language(grammar)?;
        let mut parser = Parser::new();
        parser.set_language(&language).ok()?;
        parser.parse(source, None)
    }

    /// Extract a symbol forest using this registry's spec for `grammar`.
    /// An unregistered grammar yields an empty forest.
    pub fn extract(
        &self,
        tree: &Tree,
        grammar: &str,
        source: &str,
        options: &ExtractOptions,
    ) -> Vec<Symbol> {
        match self.spec(grammar) {
            Some(language_spec) => run_extraction(language_spec, tree, source, options),
            None => Vec::new(),
        }
    }
}

impl Default for SpecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The shared built-in registry used by [`extract_symbols`](super::extract_symbols).
pub fn builtin() -> &'static SpecRegistry {
    static REGISTRY: OnceLock<SpecRegistry> = OnceLock::new();
    REGISTRY.get_or_init(SpecRegistry::new)
}
