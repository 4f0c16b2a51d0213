// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-language grammar knowledge the transform engine needs to dispatch
//! `renameSymbol`/`replaceAPI` against four different tree-sitter grammars
//! through one shared code path.

use ccp_core::Language;
use tree_sitter::Node;

/// What the transform engine needs to know about one supported language's
/// grammar: how to parse it, and how its call-expression shape decomposes
/// into an object, a property, and (optionally) an argument holding renamable
/// keys.
pub trait LanguagePack: Send + Sync {
    /// The tree-sitter grammar for this language.
    fn tree_sitter_language(&self) -> tree_sitter::Language;

    /// Grammar node kinds that count as a renamable identifier occurrence.
    /// Most grammars have one (`identifier`); TypeScript's grammar gives
    /// type positions (a type alias name, a type annotation reference) a
    /// distinct `type_identifier` kind even though the source token is the
    /// same name, so a pack whose grammar does that must list both.
    fn identifier_kinds(&self) -> &'static [&'static str] {
        &["identifier"]
    }

    /// Grammar node kind for a function/method call.
    fn call_expression_kind(&self) -> &'static str;

    /// Decompose a call-expression node into `(object name, property node,
    /// first renamable-keys argument node)`, if its callee is a property
    /// access on a bare identifier (`O.P(...)`). Returns `None` for calls
    /// that don't have this shape (e.g. a bare function call).
    fn decompose_call<'tree>(
        &self,
        call_node: Node<'tree>,
        source: &[u8],
    ) -> Option<CallParts<'tree>>;

    /// Given a [`CallParts::renamable_args`] node, return the key/name node
    /// of each argument pair `argsMap` may rename. Defaults to empty, which
    /// is correct for grammars (Java) that never populate `renamable_args`.
    fn key_nodes<'tree>(&self, _renamable_args: Node<'tree>) -> Vec<Node<'tree>> {
        Vec::new()
    }

    /// Whether this pack's grammar is wired up for `renameSymbol`/
    /// `replaceAPI` mutation. The JS/TS packs are; Python and Java are
    /// parse-only stubs in v1 and report `ExternalToolUnavailable` when a
    /// patch tries to apply through them. `parse`/`find_identifier_matches`
    /// still work for those two, so textual invariants (`symbolExists`,
    /// `regex`) are unaffected.
    fn supports_apply(&self) -> bool {
        true
    }
}

/// The pieces of a `O.P(...)` call site `replaceAPI` needs.
pub struct CallParts<'tree> {
    /// Text of the callee's object identifier (`O`).
    pub object_name: String,
    /// The node holding the property name (`P`); rewritten in place for
    /// `details.newProperty`.
    pub property_node: Node<'tree>,
    /// A node enumerating key/value argument pairs whose keys `argsMap` can
    /// rename, if the call's arguments have that shape.
    pub renamable_args: Option<Node<'tree>>,
}

/// JavaScript and TypeScript share an identical call/member-expression
/// shape, so one helper backs both packs.
fn decompose_js_like<'tree>(call_node: Node<'tree>, source: &[u8]) -> Option<CallParts<'tree>> {
    let callee = call_node.child_by_field_name("function")?;
    if callee.kind() != "member_expression" {
        return None;
    }
    let object = callee.child_by_field_name("object")?;
    if object.kind() != "identifier" {
        return None;
    }
    let property_node = callee.child_by_field_name("property")?;
    let object_name = object.utf8_text(source).ok()?.to_string();

    let renamable_args = call_node
        .child_by_field_name("arguments")
        .and_then(|args| {
            (0..args.named_child_count())
                .filter_map(|i| args.named_child(i))
                .find(|n| n.kind() == "object")
        });

    Some(CallParts {
        object_name,
        property_node,
        renamable_args,
    })
}

/// Shared key-node extraction for JS/TS object literals: every named
/// `pair` child's `key` field.
fn key_nodes_js_like<'tree>(object_node: Node<'tree>) -> Vec<Node<'tree>> {
    let mut cursor = object_node.walk();
    object_node
        .named_children(&mut cursor)
        .filter(|n| n.kind() == "pair")
        .filter_map(|n| n.child_by_field_name("key"))
        .collect()
}

/// JavaScript language pack.
pub struct JavaScriptPack;

impl LanguagePack for JavaScriptPack {
    fn tree_sitter_language(&self) -> tree_sitter::Language {
        tree_sitter_javascript::LANGUAGE.into()
    }

    fn call_expression_kind(&self) -> &'static str {
        "call_expression"
    }

    fn decompose_call<'tree>(
        &self,
        call_node: Node<'tree>,
        source: &[u8],
    ) -> Option<CallParts<'tree>> {
        decompose_js_like(call_node, source)
    }

    fn key_nodes<'tree>(&self, renamable_args: Node<'tree>) -> Vec<Node<'tree>> {
        key_nodes_js_like(renamable_args)
    }
}

/// TypeScript language pack (the `.ts` grammar variant, not TSX).
pub struct TypeScriptPack;

impl LanguagePack for TypeScriptPack {
    fn tree_sitter_language(&self) -> tree_sitter::Language {
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
    }

    fn identifier_kinds(&self) -> &'static [&'static str] {
        &["identifier", "type_identifier"]
    }

    fn call_expression_kind(&self) -> &'static str {
        "call_expression"
    }

    fn decompose_call<'tree>(
        &self,
        call_node: Node<'tree>,
        source: &[u8],
    ) -> Option<CallParts<'tree>> {
        decompose_js_like(call_node, source)
    }

    fn key_nodes<'tree>(&self, renamable_args: Node<'tree>) -> Vec<Node<'tree>> {
        key_nodes_js_like(renamable_args)
    }
}

/// Python language pack.
///
/// Parsing and textual-invariant support are fully wired up, but `apply` is a
/// stub per the transform engine's language-pack design note: `decompose_call`
/// and `key_nodes` are implemented (and exercised directly in this module's
/// tests) so the shape is documented, but [`LanguagePack::supports_apply`]
/// returns `false`, so the patch dispatcher never reaches them for a live
/// `renameSymbol`/`replaceAPI` patch.
pub struct PythonPack;

impl LanguagePack for PythonPack {
    fn tree_sitter_language(&self) -> tree_sitter::Language {
        tree_sitter_python::LANGUAGE.into()
    }

    fn call_expression_kind(&self) -> &'static str {
        "call"
    }

    fn decompose_call<'tree>(
        &self,
        call_node: Node<'tree>,
        source: &[u8],
    ) -> Option<CallParts<'tree>> {
        let callee = call_node.child_by_field_name("function")?;
        if callee.kind() != "attribute" {
            return None;
        }
        let object = callee.child_by_field_name("object")?;
        if object.kind() != "identifier" {
            return None;
        }
        let property_node = callee.child_by_field_name("attribute")?;
        let object_name = object.utf8_text(source).ok()?.to_string();
        let renamable_args = call_node.child_by_field_name("arguments");

        Some(CallParts {
            object_name,
            property_node,
            renamable_args,
        })
    }

    fn key_nodes<'tree>(&self, renamable_args: Node<'tree>) -> Vec<Node<'tree>> {
        let mut cursor = renamable_args.walk();
        renamable_args
            .named_children(&mut cursor)
            .filter(|n| n.kind() == "keyword_argument")
            .filter_map(|n| n.child_by_field_name("name"))
            .collect()
    }

    fn supports_apply(&self) -> bool {
        false
    }
}

/// Java language pack.
///
/// Java's `method_invocation` carries its object and method name as direct
/// fields (there is no separate member-expression node); argument lists are
/// positional, so `renamable_args` is always `None` — `argsMap` is a known
/// no-op for Java call sites in v1. Like [`PythonPack`], `apply` is a stub:
/// parsing and textual invariants work, mutation does not.
pub struct JavaPack;

impl LanguagePack for JavaPack {
    fn tree_sitter_language(&self) -> tree_sitter::Language {
        tree_sitter_java::LANGUAGE.into()
    }

    fn call_expression_kind(&self) -> &'static str {
        "method_invocation"
    }

    fn decompose_call<'tree>(
        &self,
        call_node: Node<'tree>,
        source: &[u8],
    ) -> Option<CallParts<'tree>> {
        let object = call_node.child_by_field_name("object")?;
        if object.kind() != "identifier" {
            return None;
        }
        let property_node = call_node.child_by_field_name("name")?;
        let object_name = object.utf8_text(source).ok()?.to_string();

        Some(CallParts {
            object_name,
            property_node,
            renamable_args: None,
        })
    }

    fn supports_apply(&self) -> bool {
        false
    }
}

/// Resolve the [`LanguagePack`] for a [`Language`] variant.
#[must_use]
pub fn pack_for(language: Language) -> Box<dyn LanguagePack> {
    match language {
        Language::Javascript => Box::new(JavaScriptPack),
        Language::Typescript => Box::new(TypeScriptPack),
        Language::Python => Box::new(PythonPack),
        Language::Java => Box::new(JavaPack),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    fn parse(pack: &dyn LanguagePack, source: &str) -> tree_sitter::Tree {
        let mut parser = Parser::new();
        parser.set_language(&pack.tree_sitter_language()).unwrap();
        parser.parse(source, None).unwrap()
    }

    #[test]
    fn js_and_ts_packs_support_apply_python_and_java_do_not() {
        assert!(JavaScriptPack.supports_apply());
        assert!(TypeScriptPack.supports_apply());
        assert!(!PythonPack.supports_apply());
        assert!(!JavaPack.supports_apply());
    }

    #[test]
    fn pack_for_maps_every_language() {
        assert!(pack_for(Language::Javascript).supports_apply());
        assert!(pack_for(Language::Typescript).supports_apply());
        assert!(!pack_for(Language::Python).supports_apply());
        assert!(!pack_for(Language::Java).supports_apply());
    }

    fn find_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
        if node.kind() == kind {
            return Some(node);
        }
        let mut cursor = node.walk();
        node.children(&mut cursor).find_map(|child| find_kind(child, kind))
    }

    #[test]
    fn python_decompose_call_still_parses_despite_being_a_stub() {
        let pack = PythonPack;
        let source = "auth.login(username='a', password='b')";
        let tree = parse(&pack, source);
        let call = find_kind(tree.root_node(), "call").expect("call node");
        let parts = pack.decompose_call(call, source.as_bytes()).unwrap();
        assert_eq!(parts.object_name, "auth");
        assert_eq!(
            parts.property_node.utf8_text(source.as_bytes()).unwrap(),
            "login"
        );
        let keys = pack.key_nodes(parts.renamable_args.unwrap());
        let key_texts: Vec<&str> = keys
            .iter()
            .map(|n| n.utf8_text(source.as_bytes()).unwrap())
            .collect();
        assert_eq!(key_texts, vec!["username", "password"]);
    }

    #[test]
    fn java_decompose_call_parses_despite_being_a_stub() {
        let pack = JavaPack;
        let source = "class X { void f() { auth.login(\"a\"); } }";
        let tree = parse(&pack, source);
        let call = find_kind(tree.root_node(), "method_invocation").expect("call");
        let parts = pack.decompose_call(call, source.as_bytes()).unwrap();
        assert_eq!(parts.object_name, "auth");
        assert!(parts.renamable_args.is_none());
    }

    /// A type alias name (`type UserId = string`) and a type annotation
    /// reference (`const u: UserId`) both parse as `type_identifier` under
    /// the real TypeScript grammar, not `identifier` — `identifier_kinds`
    /// must list both or a rename of a type-only name silently matches
    /// nothing.
    #[test]
    fn typescript_identifier_kinds_cover_type_positions() {
        let pack = TypeScriptPack;
        let source = "type UserId = string;\nconst u: UserId = '1';";
        let tree = parse(&pack, source);

        fn count_kind(node: Node, kind: &str) -> usize {
            let here = usize::from(node.kind() == kind);
            let mut cursor = node.walk();
            here + node
                .children(&mut cursor)
                .map(|child| count_kind(child, kind))
                .sum::<usize>()
        }
        let type_identifier_count = count_kind(tree.root_node(), "type_identifier");

        assert!(
            type_identifier_count >= 2,
            "expected the TypeScript grammar to parse both `UserId` occurrences as \
             type_identifier nodes, found {type_identifier_count}"
        );
        assert!(pack.identifier_kinds().contains(&"identifier"));
        assert!(pack.identifier_kinds().contains(&"type_identifier"));
    }

    #[test]
    fn javascript_identifier_kinds_stay_single_kind() {
        assert_eq!(JavaScriptPack.identifier_kinds(), &["identifier"]);
    }
}
