//! The per-grammar specification trait and shared extraction helpers.

use tree_sitter::Node;

use super::SymbolKind;

/// Names longer than this are truncated before emission.
pub const MAX_NAME_LEN: usize = 80;
/// Signatures longer than this are truncated before emission.
pub const MAX_SIGNATURE_LEN: usize = 120;

/// One stateless specification per supported grammar.
///
/// A spec maps raw node-type strings to candidate symbol kinds and supplies
/// the pluggable policies the traversal engine calls: name extraction,
/// context-dependent kind resolution, signature extraction, the container
/// set, and wrapper unwrapping. Specs are immutable and shared across all
/// files of their grammar.
pub trait LanguageSpec: Send + Sync {
    fn grammar_id(&self) -> &'static str;

    /// Raw node type → candidate symbol kind, or `None` for node types
    /// that do not declare symbols.
    fn kind_for_node(&self, node_type: &str) -> Option<SymbolKind>;

    /// Extract the display name for a recognized node. Returning `None`
    /// drops the symbol (its subtree may still be explored).
    fn name(&self, node: &Node<'_>, source: &str) -> Option<String>;

    /// Reclassify a candidate kind from ancestry or node shape, e.g. a
    /// function nested in a class container becomes a method. `ancestors`
    /// is the chain of raw node types from the root down to (excluding)
    /// `node`.
    fn resolve_kind(
        &self,
        base: SymbolKind,
        _node: &Node<'_>,
        _source: &str,
        _ancestors: &[&'static str],
    ) -> SymbolKind {
        base
    }

    /// Build a signature for a recognized node. The default takes the
    /// declaration's first source line.
    fn signature(&self, node: &Node<'_>, source: &str, _name: &str) -> Option<String> {
        first_line_signature(node, source)
    }

    /// Node types whose subtree may contain nested symbols.
    fn is_container(&self, node_type: &str) -> bool;

    /// Unwrap export/decorator wrappers to the underlying declaration.
    /// The wrapper's line range is still used for the emitted symbol.
    fn unwrap_declaration<'tree>(&self, node: Node<'tree>) -> Node<'tree> {
        node
    }
}

/// Source text slice for a node. Returns `None` on any malformed range so
/// a single bad node never aborts extraction.
pub fn node_text<'s>(node: &Node<'_>, source: &'s str) -> Option<&'s str> {
    source.get(node.start_byte()..node.end_byte())
}

/// Truncate to at most `max` characters on a char boundary.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

/// Collapse all internal whitespace runs to single spaces.
pub fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The nearest enclosing scope: scans the ancestor chain from the inside
/// out and returns the first node type found in `scopes`.
pub fn nearest_scope<'a>(ancestors: &[&'a str], scopes: &[&str]) -> Option<&'a str> {
    ancestors
        .iter()
        .rev()
        .find(|a| scopes.contains(a))
        .copied()
}

/// `name(params)` plus `": ret"` when a return-type node exists.
pub fn call_signature(
    name: &str,
    params: Option<Node<'_>>,
    return_type: Option<Node<'_>>,
    source: &str,
) -> Option<String> {
    let params_text = collapse_ws(node_text(&params?, source)?);
    let mut signature = if params_text.starts_with('(') {
        format!("{name}{params_text}")
    } else {
        format!("{name}({params_text})")
    };
    if let Some(ret) = return_type {
        if let Some(text) = node_text(&ret, source) {
            // TS wraps the return annotation as ": T"; strip the colon so
            // the separator is emitted exactly once.
            let ret_text = collapse_ws(text);
            let ret_text = ret_text.trim_start_matches(':').trim_start();
            if !ret_text.is_empty() {
                signature.push_str(": ");
                signature.push_str(ret_text);
            }
        }
    }
    Some(truncate(&signature, MAX_SIGNATURE_LEN))
}

/// First source line of the declaration, cut at the first `{` or newline.
pub fn first_line_signature(node: &Node<'_>, source: &str) -> Option<String> {
    let text = node_text(node, source)?;
    let end = text.find(['{', '\n']).unwrap_or(text.len());
    let head = text[..end].trim().trim_end_matches(':').trim_end();
    if head.is_empty() {
        None
    } else {
        Some(truncate(&collapse_ws(head), MAX_SIGNATURE_LEN))
    }
}
