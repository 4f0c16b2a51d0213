// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tree walking and text-splicing helpers shared by `renameSymbol` and
//! `replaceAPI`. Rewrites operate on byte ranges taken from the parsed tree,
//! not on a re-serialized AST — `spec.md` §4.1 specifies token-level
//! rewrites ("for every identifier token whose text equals X, rewrite to
//! Y"), not structural pretty-printing.

use crate::language::LanguagePack;
use ccp_error::{CcpError, ErrorCode};
use tree_sitter::{Node, Parser, Tree};

/// Parse `source` with `pack`'s grammar.
///
/// # Errors
///
/// Returns [`ErrorCode::ParseError`] if the grammar cannot be loaded or the
/// source fails to parse.
pub fn parse(pack: &dyn LanguagePack, source: &str) -> Result<Tree, CcpError> {
    let mut parser = Parser::new();
    parser
        .set_language(&pack.tree_sitter_language())
        .map_err(|e| CcpError::new(ErrorCode::ParseError, format!("failed to load grammar: {e}")))?;
    parser
        .parse(source, None)
        .ok_or_else(|| CcpError::new(ErrorCode::ParseError, "parser produced no tree"))
}

/// Recursively collect every node in `tree` whose kind is one of `pack`'s
/// identifier kinds and whose text equals `name`.
pub fn find_identifier_matches<'a>(
    tree: &'a Tree,
    source: &str,
    pack: &dyn LanguagePack,
    name: &str,
) -> Vec<Node<'a>> {
    let kinds = pack.identifier_kinds();
    let mut matches = Vec::new();
    walk(tree.root_node(), &mut |node| {
        if kinds.contains(&node.kind()) && node.utf8_text(source.as_bytes()) == Ok(name) {
            matches.push(node);
        }
    });
    matches
}

/// Recursively collect every call-expression node in `tree`.
pub fn find_call_expressions<'a>(tree: &'a Tree, pack: &dyn LanguagePack) -> Vec<Node<'a>> {
    let mut matches = Vec::new();
    walk(tree.root_node(), &mut |node| {
        if node.kind() == pack.call_expression_kind() {
            matches.push(node);
        }
    });
    matches
}

fn walk<'a>(node: Node<'a>, visit: &mut impl FnMut(Node<'a>)) {
    visit(node);
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, visit);
    }
}

/// Apply `replacements` (byte ranges into `source`, paired with their
/// replacement text) end-to-beginning by descending start offset, so
/// earlier offsets are never invalidated by a later splice.
#[must_use]
pub fn splice(source: &str, mut replacements: Vec<(usize, usize, String)>) -> String {
    replacements.sort_by(|a, b| b.0.cmp(&a.0));
    let mut rewritten = source.to_string();
    for (start, end, text) in replacements {
        rewritten.replace_range(start..end, &text);
    }
    rewritten
}
