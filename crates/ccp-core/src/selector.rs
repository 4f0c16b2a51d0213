// SPDX-License-Identifier: MIT OR Apache-2.0
//! The restricted attribute-predicate selector grammar.
//!
//! Only two shapes are recognized:
//!
//! - `Identifier[name='<NAME>']`
//! - `CallExpression[callee.object.name='<O>'][callee.property.name='<P>']`
//!
//! Anything else is rejected with [`ErrorCode::InvalidSelector`]; this module
//! deliberately does not attempt to support the full CSS-for-AST grammar.

use ccp_error::{CcpError, ErrorCode};

/// A parsed selector, typed by the AST shape it targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// `Identifier[name='<NAME>']`
    Identifier {
        /// The identifier text to match.
        name: String,
    },
    /// `CallExpression[callee.object.name='<O>'][callee.property.name='<P>']`
    CallExpression {
        /// The receiver identifier (`O` in `O.P(...)`).
        object: String,
        /// The property/method name (`P` in `O.P(...)`).
        property: String,
    },
}

/// Parse a selector string against the supported grammar.
///
/// # Errors
///
/// Returns [`ErrorCode::InvalidSelector`] if `raw` does not match one of the
/// two supported shapes.
pub fn parse_selector(raw: &str) -> Result<Selector, CcpError> {
    let trimmed = raw.trim();

    if let Some(name) = parse_single_predicate(trimmed, "Identifier", "name") {
        return Ok(Selector::Identifier { name });
    }

    if let Some((object, property)) = parse_call_expression(trimmed) {
        return Ok(Selector::CallExpression { object, property });
    }

    Err(
        CcpError::new(ErrorCode::InvalidSelector, "selector does not match supported grammar")
            .with_context("selector", raw.to_string()),
    )
}

/// Parse `<tag>[<attr>='<value>']`, returning `<value>`.
fn parse_single_predicate(s: &str, tag: &str, attr: &str) -> Option<String> {
    let rest = s.strip_prefix(tag)?.strip_prefix('[')?;
    let rest = rest.strip_suffix(']')?;
    parse_attr(rest, attr)
}

/// Parse `CallExpression[callee.object.name='O'][callee.property.name='P']`.
fn parse_call_expression(s: &str) -> Option<(String, String)> {
    let rest = s.strip_prefix("CallExpression")?;
    let rest = rest.strip_prefix('[')?;
    let close = rest.find(']')?;
    let first_predicate = &rest[..close];
    let remainder = rest.get(close + 1..)?;
    let remainder = remainder.strip_prefix('[')?.strip_suffix(']')?;

    let object = parse_attr(first_predicate, "callee.object.name")?;
    let property = parse_attr(remainder, "callee.property.name")?;
    Some((object, property))
}

/// Parse `<attr>='<value>'`, returning `<value>` with the quotes stripped.
fn parse_attr(predicate: &str, attr: &str) -> Option<String> {
    let rest = predicate.strip_prefix(attr)?.strip_prefix('=')?;
    let rest = rest.strip_prefix('\'')?;
    let value = rest.strip_suffix('\'')?;
    if value.is_empty() {
        return None;
    }
    Some(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_identifier_selector() {
        let sel = parse_selector("Identifier[name='UserId']").unwrap();
        assert_eq!(
            sel,
            Selector::Identifier {
                name: "UserId".into()
            }
        );
    }

    #[test]
    fn parses_call_expression_selector() {
        let sel =
            parse_selector("CallExpression[callee.object.name='auth'][callee.property.name='login']")
                .unwrap();
        assert_eq!(
            sel,
            Selector::CallExpression {
                object: "auth".into(),
                property: "login".into(),
            }
        );
    }

    #[test]
    fn rejects_unsupported_shapes() {
        let err = parse_selector("MemberExpression[object.name='x']").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidSelector);

        let err = parse_selector("Identifier[id='UserId']").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidSelector);

        let err = parse_selector("").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidSelector);
    }

    #[test]
    fn rejects_empty_attribute_value() {
        let err = parse_selector("Identifier[name='']").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidSelector);
    }

    #[test]
    fn rejects_partial_call_expression() {
        let err = parse_selector("CallExpression[callee.object.name='auth']").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidSelector);
    }
}
