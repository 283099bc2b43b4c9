//! Symbol extraction from Tree-sitter parse trees.
//!
//! A single depth-first traversal engine walks the named nodes of a parse
//! tree and consults the active [`LanguageSpec`] to classify, name, and
//! optionally sign each declaration. Grammar-specific knowledge lives
//! entirely in the specs under [`grammars`]; the engine itself is
//! language-agnostic.

pub mod grammars;
pub mod spec;

use regex::Regex;
use tracing::{debug, warn};
use tree_sitter::{Node, Tree};

use spec::{LanguageSpec, MAX_NAME_LEN, truncate};

/// Closed taxonomy of symbol kinds.
///
/// The code kinds are emitted by the built-in grammar specs; the
/// configuration kinds (`Resource`, `Data`, `Provider`, `Output`, `Locals`)
/// are part of the persisted vocabulary and the filter grammar so that
/// stores written by hosts with custom grammar specs registered stay
/// queryable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Function,
    Method,
    Class,
    Interface,
    Type,
    Enum,
    Struct,
    Trait,
    Impl,
    Module,
    Variable,
    Constant,
    Property,
    Block,
    Resource,
    Data,
    Provider,
    Output,
    Locals,
}

impl SymbolKind {
    /// Convert to the string form used in the store and in filters.
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Class => "class",
            SymbolKind::Interface => "interface",
            SymbolKind::Type => "type",
            SymbolKind::Enum => "enum",
            SymbolKind::Struct => "struct",
            SymbolKind::Trait => "trait",
            SymbolKind::Impl => "impl",
            SymbolKind::Module => "module",
            SymbolKind::Variable => "variable",
            SymbolKind::Constant => "constant",
            SymbolKind::Property => "property",
            SymbolKind::Block => "block",
            SymbolKind::Resource => "resource",
            SymbolKind::Data => "data",
            SymbolKind::Provider => "provider",
            SymbolKind::Output => "output",
            SymbolKind::Locals => "locals",
        }
    }

    /// Parse from the string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "function" => Some(SymbolKind::Function),
            "method" => Some(SymbolKind::Method),
            "class" => Some(SymbolKind::Class),
            "interface" => Some(SymbolKind::Interface),
            "type" => Some(SymbolKind::Type),
            "enum" => Some(SymbolKind::Enum),
            "struct" => Some(SymbolKind::Struct),
            "trait" => Some(SymbolKind::Trait),
            "impl" => Some(SymbolKind::Impl),
            "module" => Some(SymbolKind::Module),
            "variable" => Some(SymbolKind::Variable),
            "constant" => Some(SymbolKind::Constant),
            "property" => Some(SymbolKind::Property),
            "block" => Some(SymbolKind::Block),
            "resource" => Some(SymbolKind::Resource),
            "data" => Some(SymbolKind::Data),
            "provider" => Some(SymbolKind::Provider),
            "output" => Some(SymbolKind::Output),
            "locals" => Some(SymbolKind::Locals),
            _ => None,
        }
    }

    /// Whether symbols of this kind become indexed chunks.
    ///
    /// Leaf properties of structured-data files stay out of the store;
    /// everything else is worth a vector.
    pub fn is_indexable(&self) -> bool {
        !matches!(self, SymbolKind::Property)
    }
}

/// A named structural unit extracted from source, with nested children.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// 1-based, inclusive.
    pub start_line: usize,
    /// 1-based, inclusive.
    pub end_line: usize,
    pub signature: Option<String>,
    /// Contained symbols in declaration order.
    pub children: Vec<Symbol>,
}

/// Options controlling a single extraction pass.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Build signatures for recognized symbols.
    pub signatures: bool,
    /// Keep only symbols of this kind (matching descendants are hoisted
    /// past non-matching ancestors).
    pub kind: Option<SymbolKind>,
    /// Case-insensitive regex over symbol names; non-matching ancestors of
    /// a match are retained as bare containers.
    pub name_pattern: Option<String>,
    /// Do not descend into containers; all results have empty children.
    pub top_level_only: bool,
    /// Maximum container nesting depth to explore.
    pub max_depth: Option<usize>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            signatures: true,
            kind: None,
            name_pattern: None,
            top_level_only: false,
            max_depth: None,
        }
    }
}

/// Extract a symbol forest from a parsed tree using the built-in grammar
/// registry.
///
/// An unsupported grammar yields an empty forest, not an error.
pub fn extract_symbols(
    tree: &Tree,
    grammar: &str,
    source: &str,
    options: &ExtractOptions,
) -> Vec<Symbol> {
    grammars::builtin().extract(tree, grammar, source, options)
}

pub(crate) fn run_extraction(
    language_spec: &dyn LanguageSpec,
    tree: &Tree,
    source: &str,
    options: &ExtractOptions,
) -> Vec<Symbol> {
    let extraction = Extraction {
        spec: language_spec,
        source,
        options,
    };

    let mut forest = Vec::new();
    let mut ancestors = Vec::new();
    extraction.collect_children(tree.root_node(), 0, &mut ancestors, &mut forest);
    debug!(
        grammar = language_spec.grammar_id(),
        symbols = forest.len(),
        "extraction pass complete"
    );

    if let Some(kind) = options.kind {
        forest = filter_by_kind(forest, kind);
    }
    if let Some(pattern) = &options.name_pattern {
        match Regex::new(&format!("(?i){pattern}")) {
            Ok(re) => forest = filter_by_name(forest, &re),
            Err(e) => warn!(pattern = %pattern, "invalid name pattern, filter skipped: {e}"),
        }
    }

    forest
}

struct Extraction<'a> {
    spec: &'a dyn LanguageSpec,
    source: &'a str,
    options: &'a ExtractOptions,
}

impl Extraction<'_> {
    fn collect_children(
        &self,
        node: Node<'_>,
        depth: usize,
        ancestors: &mut Vec<&'static str>,
        out: &mut Vec<Symbol>,
    ) {
        for i in 0..node.named_child_count() {
            if let Some(child) = node.named_child(i as u32) {
                self.visit(child, depth, ancestors, out);
            }
        }
    }

    fn visit(
        &self,
        wrapper: Node<'_>,
        depth: usize,
        ancestors: &mut Vec<&'static str>,
        out: &mut Vec<Symbol>,
    ) {
        // Export/decorator wrappers are transparent: the inner declaration
        // is classified, the wrapper supplies the line range.
        let decl = self.spec.unwrap_declaration(wrapper);

        let Some(base) = self.spec.kind_for_node(decl.kind()) else {
            // Unrecognized node: keep looking for declarations at arbitrary
            // depth (e.g. a function assigned inside an expression statement).
            ancestors.push(decl.kind());
            self.collect_children(decl, depth, ancestors, out);
            ancestors.pop();
            return;
        };

        let kind = self
            .spec
            .resolve_kind(base, &decl, self.source, ancestors);

        match self.spec.name(&decl, self.source) {
            Some(raw) if !raw.trim().is_empty() => {
                let name = truncate(raw.trim(), MAX_NAME_LEN);
                let mut children = Vec::new();
                if self.spec.is_container(decl.kind()) && self.may_descend(depth) {
                    ancestors.push(decl.kind());
                    self.collect_children(decl, depth + 1, ancestors, &mut children);
                    ancestors.pop();
                }
                let signature = if self.options.signatures {
                    self.spec.signature(&decl, self.source, &name)
                } else {
                    None
                };
                out.push(Symbol {
                    name,
                    kind,
                    start_line: wrapper.start_position().row + 1,
                    end_line: wrapper.end_position().row + 1,
                    signature,
                    children,
                });
            }
            _ => {
                // A nameless declaration is never emitted, but a container's
                // subtree can still hold named symbols.
                if self.spec.is_container(decl.kind()) && self.may_descend(depth) {
                    ancestors.push(decl.kind());
                    self.collect_children(decl, depth + 1, ancestors, out);
                    ancestors.pop();
                }
            }
        }
    }

    fn may_descend(&self, depth: usize) -> bool {
        if self.options.top_level_only {
            return false;
        }
        self.options.max_depth.is_none_or(|max| depth + 1 < max)
    }
}

/// Keep symbols of `kind`; matching descendants stay under matching
/// ancestors, and are hoisted to the top level past non-matching ones.
fn filter_by_kind(forest: Vec<Symbol>, kind: SymbolKind) -> Vec<Symbol> {
    let mut out = Vec::new();
    for mut symbol in forest {
        let kept = filter_by_kind(std::mem::take(&mut symbol.children), kind);
        if symbol.kind == kind {
            symbol.children = kept;
            out.push(symbol);
        } else {
            out.extend(kept);
        }
    }
    out
}

/// Keep symbols whose name matches; a non-matching ancestor of a match is
/// retained as a bare container rather than dropped.
fn filter_by_name(forest: Vec<Symbol>, re: &Regex) -> Vec<Symbol> {
    let mut out = Vec::new();
    for mut symbol in forest {
        let kept = filter_by_name(std::mem::take(&mut symbol.children), re);
        if re.is_match(&symbol.name) || !kept.is_empty() {
            symbol.children = kept;
            out.push(symbol);
        }
    }
    out
}
