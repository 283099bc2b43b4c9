//! JSON grammar specification.
//!
//! Structured-data extraction: object members whose value is itself an
//! object or array become blocks, scalar members become properties. Only
//! blocks are indexable; `max_depth` bounds container nesting for shallow
//! multi-file scans.

use tree_sitter::Node;

use crate::extractor::SymbolKind;
use crate::extractor::spec::{LanguageSpec, node_text};

pub struct JsonSpec;

impl LanguageSpec for JsonSpec {
    fn grammar_id(&self) -> &'static str {
        "json"
    }

    fn kind_for_node(&self, node_type: &str) -> Option<SymbolKind> {
        match node_type {
            "pair" => Some(SymbolKind::Property),
            _ => None,
        }
    }

    fn name(&self, node: &Node<'_>, source: &str) -> Option<String> {
        let key = node.child_by_field_name("key")?;
        let text = node_text(&key, source)?;
        let trimmed = text.trim_matches('"');
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    fn resolve_kind(
        &self,
        base: SymbolKind,
        node: &Node<'_>,
        _source: &str,
        _ancestors: &[&'static str],
    ) -> SymbolKind {
        if let Some(value) = node.child_by_field_name("value") {
            if matches!(value.kind(), "object" | "array") {
                return SymbolKind::Block;
            }
        }
        base
    }

    fn signature(&self, _node: &Node<'_>, _source: &str, _name: &str) -> Option<String> {
        None
    }

    fn is_container(&self, node_type: &str) -> bool {
        node_type == "pair"
    }
}
