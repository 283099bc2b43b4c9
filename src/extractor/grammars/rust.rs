//! Rust grammar specification.
//!
//! Recognizes: function_item, function_signature_item, struct_item,
//! enum_item, union_item, trait_item, impl_item, mod_item, const_item,
//! static_item, type_item.

use tree_sitter::Node;

use crate::extractor::SymbolKind;
use crate::extractor::spec::{
    LanguageSpec, call_signature, first_line_signature, nearest_scope, node_text,
};

pub struct RustSpec;

impl LanguageSpec for RustSpec {
    fn grammar_id(&self) -> &'static str {
        "rust"
    }

    fn kind_for_node(&self, node_type: &str) -> Option<SymbolKind> {
        Some(match node_type {
            "function_item" | "function_signature_item" => SymbolKind::Function,
            "struct_item" | "union_item" => SymbolKind::Struct,
            "enum_item" => SymbolKind::Enum,
            "trait_item" => SymbolKind::Trait,
            "impl_item" => SymbolKind::Impl,
            "mod_item" => SymbolKind::Module,
            "const_item" | "static_item" => SymbolKind::Constant,
            "type_item" => SymbolKind::Type,
            _ => return None,
        })
    }

    fn name(&self, node: &Node<'_>, source: &str) -> Option<String> {
        let name_node = match node.kind() {
            // The impl target type stands in for a name.
            "impl_item" => node.child_by_field_name("type"),
            _ => node.child_by_field_name("name"),
        }?;
        node_text(&name_node, source).map(str::to_string)
    }

    fn resolve_kind(
        &self,
        base: SymbolKind,
        _node: &Node<'_>,
        _source: &str,
        ancestors: &[&'static str],
    ) -> SymbolKind {
        if base == SymbolKind::Function {
            let scope = nearest_scope(
                ancestors,
                &["impl_item", "trait_item", "function_item", "mod_item"],
            );
            if matches!(scope, Some("impl_item") | Some("trait_item")) {
                return SymbolKind::Method;
            }
        }
        base
    }

    fn signature(&self, node: &Node<'_>, source: &str, name: &str) -> Option<String> {
        match node.kind() {
            "function_item" | "function_signature_item" => call_signature(
                name,
                node.child_by_field_name("parameters"),
                node.child_by_field_name("return_type"),
                source,
            )
            .or_else(|| first_line_signature(node, source)),
            _ => first_line_signature(node, source),
        }
    }

    fn is_container(&self, node_type: &str) -> bool {
        matches!(
            node_type,
            "impl_item" | "trait_item" | "mod_item" | "function_item"
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::extractor::grammars::SpecRegistry;
    use crate::extractor::{ExtractOptions, Symbol, SymbolKind};

    fn extract(source: &str) -> Vec<Symbol> {
        let registry = SpecRegistry::new();
        let tree = registry.parse(source, "rust").expect("parse");
        registry.extract(&tree, "rust", source, &ExtractOptions::default())
    }

    #[test]
    fn test_extract_function_with_signature() {
        let source = "pub fn lookup(key: &str, limit: usize) -> Option<String> {\n    None\n}\n";
        let symbols = extract(source);

        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].kind, SymbolKind::Function);
        assert_eq!(symbols[0].name, "lookup");
        assert_eq!(
            symbols[0].signature.as_deref(),
            Some("lookup(key: &str, limit: usize): Option<String>")
        );
        assert_eq!(symbols[0].start_line, 1);
        assert_eq!(symbols[0].end_line, 3);
    }

    #[test]
    fn test_impl_methods_nested_under_impl() {
        let source = r#"
struct User { name: String }

impl User {
    pub fn new(name: String) -> Self {
        Self { name }
    }

    fn greet(&self) {}
}
"#;
        let symbols = extract(source);

        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols[0].kind, SymbolKind::Struct);
        assert_eq!(symbols[1].kind, SymbolKind::Impl);
        assert_eq!(symbols[1].name, "User");
        assert_eq!(symbols[1].children.len(), 2);
        assert!(
            symbols[1]
                .children
                .iter()
                .all(|c| c.kind == SymbolKind::Method)
        );
    }

    #[test]
    fn test_trait_with_default_and_required_methods() {
        let source = r#"
pub trait Greet {
    fn hello(&self) -> String;
    fn bye(&self) -> String {
        String::new()
    }
}
"#;
        let symbols = extract(source);

        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].kind, SymbolKind::Trait);
        assert_eq!(symbols[0].children.len(), 2);
        assert_eq!(symbols[0].children[0].kind, SymbolKind::Method);
        assert_eq!(
            symbols[0].children[0].signature.as_deref(),
            Some("hello(&self): String")
        );
    }

    #[test]
    fn test_module_nesting_and_constants() {
        let source = r#"
mod storage {
    pub const MAX_BATCH: usize = 32;

    pub fn open() {}
}
"#;
        let symbols = extract(source);

        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].kind, SymbolKind::Module);
        assert_eq!(symbols[0].name, "storage");
        let kinds: Vec<SymbolKind> = symbols[0].children.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![SymbolKind::Constant, SymbolKind::Function]);
    }

    #[test]
    fn test_nested_function_stays_function() {
        let source = r#"
fn outer() {
    fn inner() {}
}
"#;
        let symbols = extract(source);

        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].children.len(), 1);
        assert_eq!(symbols[0].children[0].name, "inner");
        assert_eq!(symbols[0].children[0].kind, SymbolKind::Function);
    }

    #[test]
    fn test_top_level_only_skips_children() {
        let source = r#"
impl Widget {
    fn draw(&self) {}
}
"#;
        let registry = SpecRegistry::new();
        let tree = registry.parse(source, "rust").unwrap();
        let options = ExtractOptions {
            top_level_only: true,
            ..ExtractOptions::default()
        };
        let symbols = registry.extract(&tree, "rust", source, &options);

        assert_eq!(symbols.len(), 1);
        assert!(symbols[0].children.is_empty());
    }

    #[test]
    fn test_type_alias_and_enum() {
        let source = "type Pair = (u32, u32);\nenum State { Idle, Busy }\n";
        let symbols = extract(source);

        assert_eq!(symbols[0].kind, SymbolKind::Type);
        assert_eq!(symbols[0].name, "Pair");
        assert_eq!(symbols[1].kind, SymbolKind::Enum);
        assert_eq!(symbols[1].name, "State");
    }
}
