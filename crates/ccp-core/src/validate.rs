// SPDX-License-Identifier: MIT OR Apache-2.0
//! Validation for [`ChangeSpec`](crate::ChangeSpec) values.
//!
//! Errors are accumulated rather than short-circuited so a caller sees every
//! problem with a submission in one round trip.

use crate::change_spec::{AstOp, ChangeSpec};
use crate::selector::{Selector, parse_selector};
use ccp_error::{CcpError, ErrorCode};
use std::collections::HashSet;
use std::fmt;

/// An individual validation failure found in a [`ChangeSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `id` does not match `^CS-[0-9]+$`.
    InvalidIdFormat {
        /// The offending id.
        id: String,
    },
    /// `scope` is empty.
    EmptyScope,
    /// Two invariants share the same `name`.
    DuplicateInvariantName {
        /// The repeated name.
        name: String,
    },
    /// `tests.mutationThreshold` is outside `[0, 1]`.
    MutationThresholdOutOfRange {
        /// The offending value.
        value: f64,
    },
    /// A patch's `selector` does not parse under the supported grammar.
    InvalidSelector {
        /// Index of the offending patch within `patches`.
        index: usize,
        /// The unparseable selector text.
        selector: String,
    },
    /// A patch is missing a selector required by its `astOp`.
    MissingSelector {
        /// Index of the offending patch within `patches`.
        index: usize,
    },
    /// A patch's selector shape doesn't match what its `astOp` expects
    /// (e.g. a `CallExpression` selector on a `renameSymbol` patch).
    SelectorShapeMismatch {
        /// Index of the offending patch within `patches`.
        index: usize,
    },
    /// A `renameSymbol` patch is missing `details.newName`.
    MissingNewName {
        /// Index of the offending patch within `patches`.
        index: usize,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidIdFormat { id } => {
                write!(f, "id \"{id}\" does not match ^CS-[0-9]+$")
            }
            Self::EmptyScope => write!(f, "scope must contain at least one path or glob"),
            Self::DuplicateInvariantName { name } => {
                write!(f, "duplicate invariant name \"{name}\"")
            }
            Self::MutationThresholdOutOfRange { value } => {
                write!(f, "mutationThreshold {value} is outside [0, 1]")
            }
            Self::InvalidSelector { index, selector } => {
                write!(f, "patches[{index}]: selector \"{selector}\" is not valid")
            }
            Self::MissingSelector { index } => {
                write!(f, "patches[{index}]: astOp requires a selector")
            }
            Self::SelectorShapeMismatch { index } => {
                write!(f, "patches[{index}]: selector shape does not match astOp")
            }
            Self::MissingNewName { index } => {
                write!(f, "patches[{index}]: renameSymbol requires details.newName")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a [`ChangeSpec`] for schema-adjacent and structural soundness.
///
/// Returns `Ok(())` when the spec passes every check, or `Err(errors)` with
/// every problem found.
///
/// # Errors
///
/// Returns a `Vec<ValidationError>` listing every problem found in `spec`.
pub fn validate_change_spec(spec: &ChangeSpec) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !is_valid_change_spec_id(&spec.id) {
        errors.push(ValidationError::InvalidIdFormat {
            id: spec.id.clone(),
        });
    }

    if spec.scope.is_empty() {
        errors.push(ValidationError::EmptyScope);
    }

    let mut seen_names = HashSet::new();
    for invariant in &spec.invariants {
        if !seen_names.insert(invariant.name.as_str()) {
            errors.push(ValidationError::DuplicateInvariantName {
                name: invariant.name.clone(),
            });
        }
    }

    if !(0.0..=1.0).contains(&spec.tests.mutation_threshold) {
        errors.push(ValidationError::MutationThresholdOutOfRange {
            value: spec.tests.mutation_threshold,
        });
    }

    for (index, patch) in spec.patches.iter().enumerate() {
        if !matches!(patch.ast_op, AstOp::RenameSymbol | AstOp::ReplaceApi) {
            // Unsupported ops are syntactically valid; the transform engine
            // rejects them at apply time with `UnsupportedOperation`.
            continue;
        }

        let Some(selector_text) = patch.selector.as_deref() else {
            errors.push(ValidationError::MissingSelector { index });
            continue;
        };

        let parsed = match parse_selector(selector_text) {
            Ok(parsed) => parsed,
            Err(_) => {
                errors.push(ValidationError::InvalidSelector {
                    index,
                    selector: selector_text.to_string(),
                });
                continue;
            }
        };

        match (patch.ast_op, &parsed) {
            (AstOp::RenameSymbol, Selector::Identifier { .. }) => {
                if !patch.details.get("newName").and_then(|v| v.as_str()).is_some() {
                    errors.push(ValidationError::MissingNewName { index });
                }
            }
            (AstOp::ReplaceApi, Selector::CallExpression { .. }) => {}
            _ => errors.push(ValidationError::SelectorShapeMismatch { index }),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Join accumulated [`ValidationError`]s into a single [`CcpError`] tagged
/// [`ErrorCode::InvalidChangeSpec`], suitable for returning at the HTTP edge.
#[must_use]
pub fn to_ccp_error(spec_id: &str, errors: &[ValidationError]) -> CcpError {
    let joined = errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    CcpError::new(ErrorCode::InvalidChangeSpec, joined).with_context("changeSpecId", spec_id)
}

fn is_valid_change_spec_id(id: &str) -> bool {
    id.strip_prefix("CS-")
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}
