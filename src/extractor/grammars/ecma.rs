//! TypeScript/JavaScript grammar specification.
//!
//! One parameterized spec covers both grammars; the TypeScript-only node
//! types simply never occur in JavaScript trees. export_statement wrappers
//! are unwrapped to the underlying declaration, and const/let declarations
//! whose initializer is a function expression or arrow function are
//! classified as functions.

use tree_sitter::Node;

use crate::extractor::SymbolKind;
use crate::extractor::spec::{
    LanguageSpec, call_signature, first_line_signature, node_text,
};

pub struct EcmaSpec {
    grammar: &'static str,
}

impl EcmaSpec {
    pub fn typescript() -> Self {
        Self {
            grammar: "typescript",
        }
    }

    pub fn javascript() -> Self {
        Self {
            grammar: "javascript",
        }
    }

    /// The first `variable_declarator` of a declaration statement.
    fn declarator<'tree>(node: &Node<'tree>) -> Option<Node<'tree>> {
        for i in 0..node.named_child_count() {
            if let Some(child) = node.named_child(i as u32) {
                if child.kind() == "variable_declarator" {
                    return Some(child);
                }
            }
        }
        None
    }

    fn is_function_value(value: &Node<'_>) -> bool {
        matches!(
            value.kind(),
            "arrow_function" | "function_expression" | "function" | "generator_function"
        )
    }
}

impl LanguageSpec for EcmaSpec {
    fn grammar_id(&self) -> &'static str {
        self.grammar
    }

    fn kind_for_node(&self, node_type: &str) -> Option<SymbolKind> {
        Some(match node_type {
            "function_declaration" | "generator_function_declaration" => SymbolKind::Function,
            "class_declaration" | "abstract_class_declaration" => SymbolKind::Class,
            "method_definition" | "method_signature" => SymbolKind::Method,
            "interface_declaration" => SymbolKind::Interface,
            "type_alias_declaration" => SymbolKind::Type,
            "enum_declaration" => SymbolKind::Enum,
            "lexical_declaration" | "variable_declaration" => SymbolKind::Variable,
            "public_field_definition" | "field_definition" | "property_signature" => {
                SymbolKind::Property
            }
            "internal_module" | "module" => SymbolKind::Module,
            _ => return None,
        })
    }

    fn name(&self, node: &Node<'_>, source: &str) -> Option<String> {
        let name_node = match node.kind() {
            "lexical_declaration" | "variable_declaration" => {
                Self::declarator(node)?.child_by_field_name("name")
            }
            // The JS grammar calls the class-field name "property".
            "field_definition" => node
                .child_by_field_name("name")
                .or_else(|| node.child_by_field_name("property")),
            _ => node.child_by_field_name("name"),
        }?;
        node_text(&name_node, source).map(str::to_string)
    }

    fn resolve_kind(
        &self,
        base: SymbolKind,
        node: &Node<'_>,
        source: &str,
        _ancestors: &[&'static str],
    ) -> SymbolKind {
        match base {
            SymbolKind::Variable => {
                if let Some(declarator) = Self::declarator(node) {
                    if let Some(value) = declarator.child_by_field_name("value") {
                        if Self::is_function_value(&value) {
                            return SymbolKind::Function;
                        }
                    }
                }
                let keyword = node
                    .child(0)
                    .and_then(|c| node_text(&c, source));
                if keyword == Some("const") {
                    SymbolKind::Constant
                } else {
                    SymbolKind::Variable
                }
            }
            // Class fields holding arrow functions are methods in practice.
            SymbolKind::Property
                if matches!(node.kind(), "public_field_definition" | "field_definition") =>
            {
                match node.child_by_field_name("value") {
                    Some(value) if Self::is_function_value(&value) => SymbolKind::Method,
                    _ => SymbolKind::Property,
                }
            }
            _ => base,
        }
    }

    fn signature(&self, node: &Node<'_>, source: &str, name: &str) -> Option<String> {
        match node.kind() {
            "function_declaration"
            | "generator_function_declaration"
            | "method_definition"
            | "method_signature" => call_signature(
                name,
                node.child_by_field_name("parameters"),
                node.child_by_field_name("return_type"),
                source,
            )
            .or_else(|| first_line_signature(node, source)),
            "lexical_declaration" | "variable_declaration" => {
                let declarator = Self::declarator(node)?;
                let value = declarator.child_by_field_name("value")?;
                if Self::is_function_value(&value) {
                    call_signature(
                        name,
                        value
                            .child_by_field_name("parameters")
                            .or_else(|| value.child_by_field_name("parameter")),
                        value.child_by_field_name("return_type"),
                        source,
                    )
                } else {
                    first_line_signature(node, source)
                }
            }
            "public_field_definition" | "field_definition" => match node.child_by_field_name("value") {
                Some(value) if Self::is_function_value(&value) => call_signature(
                    name,
                    value
                        .child_by_field_name("parameters")
                        .or_else(|| value.child_by_field_name("parameter")),
                    value.child_by_field_name("return_type"),
                    source,
                ),
                _ => first_line_signature(node, source),
            },
            _ => first_line_signature(node, source),
        }
    }

    fn is_container(&self, node_type: &str) -> bool {
        matches!(
            node_type,
            "class_declaration"
                | "abstract_class_declaration"
                | "interface_declaration"
                | "function_declaration"
                | "generator_function_declaration"
                | "method_definition"
                | "internal_module"
                | "module"
        )
    }

    fn unwrap_declaration<'tree>(&self, node: Node<'tree>) -> Node<'tree> {
        if node.kind() == "export_statement" {
            if let Some(declaration) = node.child_by_field_name("declaration") {
                return declaration;
            }
        }
        node
    }
}
