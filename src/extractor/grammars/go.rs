//! Go grammar specification.
//!
//! Recognizes: function_declaration, method_declaration, type_spec
//! (discriminated into struct/interface/type), const_spec, var_spec.

use tree_sitter::Node;

use crate::extractor::SymbolKind;
use crate::extractor::spec::{
    LanguageSpec, call_signature, first_line_signature, node_text,
};

pub struct GoSpec;

impl LanguageSpec for GoSpec {
    fn grammar_id(&self) -> &'static str {
        "go"
    }

    fn kind_for_node(&self, node_type: &str) -> Option<SymbolKind> {
        Some(match node_type {
            "function_declaration" => SymbolKind::Function,
            "method_declaration" => SymbolKind::Method,
            "type_spec" | "type_alias" => SymbolKind::Type,
            "const_spec" => SymbolKind::Constant,
            "var_spec" => SymbolKind::Variable,
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
        node: &Node<'_>,
        _source: &str,
        _ancestors: &[&'static str],
    ) -> SymbolKind {
        // type Foo struct{...} / type Foo interface{...} get their own kinds.
        if base == SymbolKind::Type {
            if let Some(underlying) = node.child_by_field_name("type") {
                return match underlying.kind() {
                    "struct_type" => SymbolKind::Struct,
                    "interface_type" => SymbolKind::Interface,
                    _ => SymbolKind::Type,
                };
            }
        }
        base
    }

    fn signature(&self, node: &Node<'_>, source: &str, name: &str) -> Option<String> {
        match node.kind() {
            "function_declaration" | "method_declaration" => call_signature(
                name,
                node.child_by_field_name("parameters"),
                node.child_by_field_name("result"),
                source,
            )
            .or_else(|| first_line_signature(node, source)),
            _ => first_line_signature(node, source),
        }
    }

    fn is_container(&self, node_type: &str) -> bool {
        // Go allows type and constant declarations inside function bodies.
        matches!(node_type, "function_declaration" | "method_declaration")
    }
}

#[cfg(test)]
mod tests {
    use crate::extractor::grammars::SpecRegistry;
    use crate::extractor::{ExtractOptions, Symbol, SymbolKind};

    fn extract(source: &str) -> Vec<Symbol> {
        let registry = SpecRegistry::new();
        let tree = registry.parse(source, "go").expect("parse");
        registry.extract(&tree, "go", source, &ExtractOptions::default())
    }

    #[test]
    fn test_function_signature_with_result() {
        let source = "package main\n\nfunc DoThing(x int) error {\n\treturn nil\n}\n";
        let symbols = extract(source);

        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].kind, SymbolKind::Function);
        assert_eq!(symbols[0].name, "DoThing");
        assert_eq!(symbols[0].signature.as_deref(), Some("DoThing(x int): error"));
        assert_eq!(symbols[0].start_line, 3);
        assert_eq!(symbols[0].end_line, 5);
    }

    #[test]
    fn test_method_declaration() {
        let source = "package main\n\nfunc (s *Store) Get(key string) (string, bool) {\n\treturn \"\", false\n}\n";
        let symbols = extract(source);

        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].kind, SymbolKind::Method);
        assert_eq!(symbols[0].name, "Get");
        assert_eq!(
            symbols[0].signature.as_deref(),
            Some("Get(key string): (string, bool)")
        );
    }

    #[test]
    fn test_struct_and_interface_discrimination() {
        let source = r#"package main

type User struct {
	Name string
}

type Reader interface {
	Read(p []byte) (int, error)
}

type Alias = User
"#;
        let symbols = extract(source);

        assert_eq!(symbols.len(), 3);
        assert_eq!(symbols[0].kind, SymbolKind::Struct);
        assert_eq!(symbols[0].name, "User");
        assert_eq!(symbols[1].kind, SymbolKind::Interface);
        assert_eq!(symbols[1].name, "Reader");
        assert_eq!(symbols[2].kind, SymbolKind::Type);
        assert_eq!(symbols[2].name, "Alias");
    }

    #[test]
    fn test_consts_and_vars() {
        let source = "package main\n\nconst maxRetries = 3\n\nvar defaultTimeout = 30\n";
        let symbols = extract(source);

        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols[0].kind, SymbolKind::Constant);
        assert_eq!(symbols[0].name, "maxRetries");
        assert_eq!(symbols[1].kind, SymbolKind::Variable);
        assert_eq!(symbols[1].name, "defaultTimeout");
    }

    #[test]
    fn test_type_declared_inside_function() {
        let source = "package main\n\nfunc build() {\n\ttype payload struct{ id int }\n}\n";
        let symbols = extract(source);

        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].children.len(), 1);
        assert_eq!(symbols[0].children[0].kind, SymbolKind::Struct);
        assert_eq!(symbols[0].children[0].name, "payload");
    }
}
