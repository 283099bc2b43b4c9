//! Python grammar specification.
//!
//! Recognizes: function_definition, class_definition; decorated_definition
//! wrappers are unwrapped to the underlying definition.

use tree_sitter::Node;

use crate::extractor::SymbolKind;
use crate::extractor::spec::{
    LanguageSpec, call_signature, first_line_signature, nearest_scope, node_text,
};

pub struct PythonSpec;

impl LanguageSpec for PythonSpec {
    fn grammar_id(&self) -> &'static str {
        "python"
    }

    fn kind_for_node(&self, node_type: &str) -> Option<SymbolKind> {
        Some(match node_type {
            "function_definition" => SymbolKind::Function,
            "class_definition" => SymbolKind::Class,
            _ => return None,
        })
    }

    fn name(&self, node: &Node<'_>, source: &str) -> Option<String> {
        let name_node = node.child_by_field_name("name")?;
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
            let scope = nearest_scope(ancestors, &["class_definition", "function_definition"]);
            if scope == Some("class_definition") {
                return SymbolKind::Method;
            }
        }
        base
    }

    fn signature(&self, node: &Node<'_>, source: &str, name: &str) -> Option<String> {
        match node.kind() {
            "function_definition" => call_signature(
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
        matches!(node_type, "class_definition" | "function_definition")
    }

    fn unwrap_declaration<'tree>(&self, node: Node<'tree>) -> Node<'tree> {
        if node.kind() == "decorated_definition" {
            if let Some(definition) = node.child_by_field_name("definition") {
                return definition;
            }
        }
        node
    }
}

#[cfg(test)]
mod tests {
    use crate::extractor::grammars::SpecRegistry;
    use crate::extractor::{ExtractOptions, Symbol, SymbolKind};

    fn extract(source: &str) -> Vec<Symbol> {
        let registry = SpecRegistry::new();
        let tree = registry.parse(source, "python").expect("parse");
        registry.extract(&tree, "python", source, &ExtractOptions::default())
    }

    #[test]
    fn test_function_signature() {
        let source = "def fetch(url: str, retries: int = 3) -> bytes:\n    return b\"\"\n";
        let symbols = extract(source);

        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].kind, SymbolKind::Function);
        assert_eq!(
            symbols[0].signature.as_deref(),
            Some("fetch(url: str, retries: int = 3): bytes")
        );
    }

    #[test]
    fn test_methods_nested_in_class() {
        let source = r#"
class UserStore:
    def get_user(self, name):
        pass

    def set_user(self, name):
        pass
"#;
        let symbols = extract(source);

        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].kind, SymbolKind::Class);
        assert_eq!(symbols[0].name, "UserStore");
        assert_eq!(symbols[0].children.len(), 2);
        assert!(
            symbols[0]
                .children
                .iter()
                .all(|c| c.kind == SymbolKind::Method)
        );
    }

    #[test]
    fn test_nested_function_inside_method_is_function() {
        let source = r#"
class Runner:
    def run(self):
        def step():
            pass
"#;
        let symbols = extract(source);

        let run = &symbols[0].children[0];
        assert_eq!(run.kind, SymbolKind::Method);
        assert_eq!(run.children.len(), 1);
        assert_eq!(run.children[0].name, "step");
        assert_eq!(run.children[0].kind, SymbolKind::Function);
    }

    #[test]
    fn test_decorated_definition_unwrapped_with_wrapper_range() {
        let source = "@cached\n@retry(3)\ndef load():\n    pass\n";
        let symbols = extract(source);

        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].name, "load");
        assert_eq!(symbols[0].kind, SymbolKind::Function);
        // Range covers the decorators, not just the def.
        assert_eq!(symbols[0].start_line, 1);
    }

    #[test]
    fn test_decorated_class() {
        let source = "@dataclass\nclass Point:\n    x: int\n";
        let symbols = extract(source);

        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].kind, SymbolKind::Class);
        assert_eq!(symbols[0].name, "Point");
    }
}
