// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dispatch one [`Patch`](ccp_core::Patch) against one file's already-parsed
//! source, producing a rewritten buffer. `renameSymbol` and `replaceAPI` are
//! the only operations implemented; every other [`AstOp`] fails with
//! [`ErrorCode::UnsupportedOperation`].

use crate::language::LanguagePack;
use crate::rewrite::{self, find_call_expressions, find_identifier_matches};
use ccp_core::{AstOp, Patch, Selector, parse_selector};
use ccp_error::{CcpError, ErrorCode};
use std::collections::BTreeMap;

/// Result of applying one patch to one file's source.
#[derive(Debug, Clone)]
pub struct PatchOutcome {
    /// The rewritten source. Equal to the input when `changed` is `false`.
    pub rewritten: String,
    /// Whether any replacement was made.
    pub changed: bool,
}

/// Apply `patch` to `source`, parsed under `pack`'s grammar.
///
/// # Errors
///
/// - [`ErrorCode::UnsupportedOperation`] if `patch.ast_op` is not
///   `renameSymbol` or `replaceAPI`.
/// - [`ErrorCode::InvalidSelector`] if `patch.selector` is missing, or
///   doesn't parse, or doesn't match the shape the operation requires.
/// - [`ErrorCode::InvalidChangeSpec`] if `patch.details` is missing a
///   required field for the operation.
/// - [`ErrorCode::ParseError`] if `source` fails to parse.
pub fn apply_patch(
    patch: &Patch,
    pack: &dyn LanguagePack,
    source: &str,
) -> Result<PatchOutcome, CcpError> {
    if !pack.supports_apply() && matches!(patch.ast_op, AstOp::RenameSymbol | AstOp::ReplaceApi) {
        return Err(CcpError::new(
            ErrorCode::ExternalToolUnavailable,
            "this language pack does not support applying patches in v1",
        )
        .with_context("path", patch.path.clone()));
    }

    match patch.ast_op {
        AstOp::RenameSymbol => apply_rename_symbol(patch, pack, source),
        AstOp::ReplaceApi => apply_replace_api(patch, pack, source),
        other => Err(CcpError::new(
            ErrorCode::UnsupportedOperation,
            format!("{other:?} is not implemented by the transform engine"),
        )
        .with_context("path", patch.path.clone())),
    }
}

fn selector_for(patch: &Patch) -> Result<Selector, CcpError> {
    let raw = patch.selector.as_deref().ok_or_else(|| {
        CcpError::new(ErrorCode::InvalidSelector, "patch is missing a selector")
            .with_context("path", patch.path.clone())
    })?;
    parse_selector(raw)
}

fn required_str_detail<'a>(patch: &'a Patch, field: &str) -> Result<&'a str, CcpError> {
    patch
        .details
        .get(field)
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| {
            CcpError::new(
                ErrorCode::InvalidChangeSpec,
                format!("patch details is missing required field `{field}`"),
            )
            .with_context("path", patch.path.clone())
        })
}

fn apply_rename_symbol(
    patch: &Patch,
    pack: &dyn LanguagePack,
    source: &str,
) -> Result<PatchOutcome, CcpError> {
    let name = match selector_for(patch)? {
        Selector::Identifier { name } => name,
        Selector::CallExpression { .. } => {
            return Err(CcpError::new(
                ErrorCode::InvalidSelector,
                "renameSymbol requires an Identifier selector",
            )
            .with_context("path", patch.path.clone()));
        }
    };
    let new_name = required_str_detail(patch, "newName")?;

    let tree = rewrite::parse(pack, source)?;
    let matches = find_identifier_matches(&tree, source, pack, &name);
    let changed = !matches.is_empty();
    let replacements = matches
        .into_iter()
        .map(|node| (node.start_byte(), node.end_byte(), new_name.to_string()))
        .collect();

    Ok(PatchOutcome {
        rewritten: rewrite::splice(source, replacements),
        changed,
    })
}

fn apply_replace_api(
    patch: &Patch,
    pack: &dyn LanguagePack,
    source: &str,
) -> Result<PatchOutcome, CcpError> {
    let (object, property) = match selector_for(patch)? {
        Selector::CallExpression { object, property } => (object, property),
        Selector::Identifier { .. } => {
            return Err(CcpError::new(
                ErrorCode::InvalidSelector,
                "replaceAPI requires a CallExpression selector",
            )
            .with_context("path", patch.path.clone()));
        }
    };

    let new_property = patch
        .details
        .get("newProperty")
        .and_then(serde_json::Value::as_str);
    let args_map: Option<BTreeMap<String, String>> = patch
        .details
        .get("argsMap")
        .and_then(|v| serde_json::from_value(v.clone()).ok());

    let tree = rewrite::parse(pack, source)?;
    let calls = find_call_expressions(&tree, pack);

    let mut replacements = Vec::new();
    let mut changed = false;
    let source_bytes = source.as_bytes();

    for call in calls {
        let Some(parts) = pack.decompose_call(call, source_bytes) else {
            continue;
        };
        if parts.object_name != object {
            continue;
        }
        if parts.property_node.utf8_text(source_bytes) != Ok(property.as_str()) {
            continue;
        }

        if let Some(new_property) = new_property {
            replacements.push((
                parts.property_node.start_byte(),
                parts.property_node.end_byte(),
                new_property.to_string(),
            ));
            changed = true;
        }

        if let (Some(args_map), Some(renamable_args)) = (&args_map, parts.renamable_args) {
            for key_node in pack.key_nodes(renamable_args) {
                let Ok(key_text) = key_node.utf8_text(source_bytes) else {
                    continue;
                };
                if let Some(new_key) = args_map.get(key_text) {
                    replacements.push((key_node.start_byte(), key_node.end_byte(), new_key.clone()));
                    changed = true;
                }
            }
        }
    }

    Ok(PatchOutcome {
        rewritten: rewrite::splice(source, replacements),
        changed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::{PythonPack, TypeScriptPack};
    use serde_json::json;

    fn rename_patch(selector: &str, new_name: &str) -> Patch {
        Patch {
            path: "src/types.ts".into(),
            ast_op: AstOp::RenameSymbol,
            selector: Some(selector.to_string()),
            details: json!({ "newName": new_name }),
        }
    }

    #[test]
    fn rename_symbol_rewrites_every_occurrence() {
        let pack = TypeScriptPack;
        let source = "type UserId = string;\nconst u: UserId = '1';";
        let patch = rename_patch("Identifier[name='UserId']", "AccountId");
        let outcome = apply_patch(&patch, &pack, source).unwrap();
        assert!(outcome.changed);
        assert_eq!(
            outcome.rewritten,
            "type AccountId = string;\nconst u: AccountId = '1';"
        );
    }

    #[test]
    fn rename_symbol_is_idempotent() {
        let pack = TypeScriptPack;
        let source = "type UserId = string;";
        let patch = rename_patch("Identifier[name='UserId']", "AccountId");
        let once = apply_patch(&patch, &pack, source).unwrap();
        let twice = apply_patch(&patch, &pack, &once.rewritten).unwrap();
        assert_eq!(once.rewritten, twice.rewritten);
        assert!(!twice.changed);
    }

    #[test]
    fn replace_api_rewrites_property_and_arg_keys() {
        let pack = TypeScriptPack;
        let source = "auth.login({ username: 'a', password: 'b' });";
        let patch = Patch {
            path: "src/auth.ts".into(),
            ast_op: AstOp::ReplaceApi,
            selector: Some(
                "CallExpression[callee.object.name='auth'][callee.property.name='login']".into(),
            ),
            details: json!({
                "newProperty": "signIn",
                "argsMap": { "username": "email" }
            }),
        };
        let outcome = apply_patch(&patch, &pack, source).unwrap();
        assert!(outcome.changed);
        assert_eq!(
            outcome.rewritten,
            "auth.signIn({ email: 'a', password: 'b' });"
        );
    }

    #[test]
    fn replace_api_ignores_non_matching_calls() {
        let pack = TypeScriptPack;
        let source = "other.login({ username: 'a' });";
        let patch = Patch {
            path: "src/auth.ts".into(),
            ast_op: AstOp::ReplaceApi,
            selector: Some(
                "CallExpression[callee.object.name='auth'][callee.property.name='login']".into(),
            ),
            details: json!({ "newProperty": "signIn" }),
        };
        let outcome = apply_patch(&patch, &pack, source).unwrap();
        assert!(!outcome.changed);
        assert_eq!(outcome.rewritten, source);
    }

    #[test]
    fn replace_api_on_python_is_a_stub_in_v1() {
        let pack = PythonPack;
        let source = "auth.login(username='a', password='b')";
        let patch = Patch {
            path: "src/auth.py".into(),
            ast_op: AstOp::ReplaceApi,
            selector: Some(
                "CallExpression[callee.object.name='auth'][callee.property.name='login']".into(),
            ),
            details: json!({
                "newProperty": "sign_in",
                "argsMap": { "username": "email" }
            }),
        };
        let err = apply_patch(&patch, &pack, source).unwrap_err();
        assert_eq!(err.code, ErrorCode::ExternalToolUnavailable);
    }

    #[test]
    fn unsupported_operation_errors() {
        let pack = TypeScriptPack;
        let patch = Patch {
            path: "src/x.ts".into(),
            ast_op: AstOp::MoveModule,
            selector: None,
            details: json!({}),
        };
        let err = apply_patch(&patch, &pack, "const x = 1;").unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsupportedOperation);
    }

    #[test]
    fn rename_symbol_rejects_call_expression_selector() {
        let pack = TypeScriptPack;
        let patch = Patch {
            path: "src/x.ts".into(),
            ast_op: AstOp::RenameSymbol,
            selector: Some(
                "CallExpression[callee.object.name='a'][callee.property.name='b']".into(),
            ),
            details: json!({ "newName": "y" }),
        };
        let err = apply_patch(&patch, &pack, "a.b();").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidSelector);
    }

    #[test]
    fn rename_symbol_requires_new_name_detail() {
        let pack = TypeScriptPack;
        let patch = Patch {
            path: "src/x.ts".into(),
            ast_op: AstOp::RenameSymbol,
            selector: Some("Identifier[name='UserId']".into()),
            details: json!({}),
        };
        let err = apply_patch(&patch, &pack, "type UserId = string;").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidChangeSpec);
    }
}
