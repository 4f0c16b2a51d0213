//! Unified error taxonomy with stable error codes for the change control plane.
//!
//! Every error raised by a control-plane component carries an [`ErrorCode`]
//! (a machine-readable, stable string tag), a human-readable message, an
//! optional cause chain, and arbitrary key-value context. Use the builder
//! returned by [`CcpError::new`] to construct errors fluently.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// ErrorCategory
// ---------------------------------------------------------------------------

/// Broad family that an [`ErrorCode`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed or semantically invalid input (a change spec, selector,
    /// operation, or mission definition).
    Validation,
    /// A referenced entity does not exist.
    NotFound,
    /// A policy, redaction rule, or safety gate blocked the operation.
    Security,
    /// A failure encountered while carrying out an operation (parsing,
    /// I/O, an external tool, a deadline).
    Execution,
    /// A budget or capacity limit was reached.
    Resource,
    /// Catch-all for unexpected internal errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Security => "security",
            Self::Execution => "execution",
            Self::Resource => "resource",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// ErrorCode
// ---------------------------------------------------------------------------

/// Machine-readable, stable error code.
///
/// Each variant serialises to a `SCREAMING_SNAKE_CASE` string that is
/// guaranteed not to change across patch releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // -- Validation --
    /// A change specification failed schema or semantic validation.
    InvalidChangeSpec,
    /// A selector does not match the supported attribute-predicate grammar.
    InvalidSelector,
    /// The requested patch operation is not one the transform engine supports.
    UnsupportedOperation,
    /// A mission definition is malformed or internally inconsistent.
    InvalidMission,

    // -- NotFound --
    /// No mission exists with the given identifier.
    MissionNotFound,
    /// No checkpoint exists with the given identifier.
    CheckpointNotFound,
    /// No batch exists with the given identifier.
    BatchNotFound,
    /// No budget exists with the given identifier.
    BudgetNotFound,

    // -- Security --
    /// A policy rule denied the operation.
    PolicyViolation,
    /// Content was blocked outright by a security gate (e.g. an undisclosed
    /// secret that cannot be safely redacted in place).
    SecurityBlock,

    // -- Execution --
    /// Source or selector text failed to parse.
    ParseError,
    /// A filesystem or I/O operation failed.
    IoError,
    /// An external tool (compiler, type checker, test runner) required by a
    /// verification step is unavailable.
    ExternalToolUnavailable,
    /// An operation did not complete within its deadline.
    Timeout,

    // -- Resource --
    /// A budget's spending limit was reached or would be exceeded.
    BudgetExceeded,
    /// No model satisfies the routing constraints for a request.
    NoViableModel,

    // -- Internal --
    /// An invariant carries a `type` the runner does not recognise.
    UnknownInvariantType,
}

impl ErrorCode {
    /// Returns the broad [`ErrorCategory`] this code belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidChangeSpec
            | Self::InvalidSelector
            | Self::UnsupportedOperation
            | Self::InvalidMission => ErrorCategory::Validation,

            Self::MissionNotFound
            | Self::CheckpointNotFound
            | Self::BatchNotFound
            | Self::BudgetNotFound => ErrorCategory::NotFound,

            Self::PolicyViolation | Self::SecurityBlock => ErrorCategory::Security,

            Self::ParseError
            | Self::IoError
            | Self::ExternalToolUnavailable
            | Self::Timeout => ErrorCategory::Execution,

            Self::BudgetExceeded | Self::NoViableModel => ErrorCategory::Resource,

            Self::UnknownInvariantType => ErrorCategory::Internal,
        }
    }

    /// Stable `&'static str` representation of the code (e.g.
    /// `"INVALID_CHANGE_SPEC"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidChangeSpec => "INVALID_CHANGE_SPEC",
            Self::InvalidSelector => "INVALID_SELECTOR",
            Self::UnsupportedOperation => "UNSUPPORTED_OPERATION",
            Self::InvalidMission => "INVALID_MISSION",
            Self::MissionNotFound => "MISSION_NOT_FOUND",
            Self::CheckpointNotFound => "CHECKPOINT_NOT_FOUND",
            Self::BatchNotFound => "BATCH_NOT_FOUND",
            Self::BudgetNotFound => "BUDGET_NOT_FOUND",
            Self::PolicyViolation => "POLICY_VIOLATION",
            Self::SecurityBlock => "SECURITY_BLOCK",
            Self::ParseError => "PARSE_ERROR",
            Self::IoError => "IO_ERROR",
            Self::ExternalToolUnavailable => "EXTERNAL_TOOL_UNAVAILABLE",
            Self::Timeout => "TIMEOUT",
            Self::BudgetExceeded => "BUDGET_EXCEEDED",
            Self::NoViableModel => "NO_VIABLE_MODEL",
            Self::UnknownInvariantType => "UNKNOWN_INVARIANT_TYPE",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CcpError
// ---------------------------------------------------------------------------

/// Unified control-plane error.
///
/// Carries a stable [`ErrorCode`], a human-readable message, an optional
/// source error for cause-chaining, and arbitrary structured context.
///
/// # Builder usage
///
/// ```
/// use ccp_error::{CcpError, ErrorCode};
///
/// let err = CcpError::new(ErrorCode::BudgetExceeded, "mission budget exhausted")
///     .with_context("mission_id", "m-42")
///     .with_context("spent_usd", 12.5);
/// ```
pub struct CcpError {
    /// Machine-readable error code.
    pub code: ErrorCode,
    /// Human-readable description.
    pub message: String,
    /// Optional underlying cause.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    /// Arbitrary structured context for diagnostics.
    pub context: BTreeMap<String, serde_json::Value>,
}

impl CcpError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
            context: BTreeMap::new(),
        }
    }

    /// Attach a key-value pair to the diagnostic context.
    ///
    /// The value is converted via [`serde_json::to_value`]; if serialisation
    /// fails, the entry is silently skipped.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Attach an underlying cause.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Shorthand for `self.code.category()`.
    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    /// Convenience constructor for [`ErrorCode::MissionNotFound`].
    pub fn mission_not_found(mission_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::MissionNotFound,
            format!("mission {mission_id} not found"),
        )
        .with_context("mission_id", mission_id.to_string())
    }

    /// Convenience constructor for [`ErrorCode::CheckpointNotFound`].
    pub fn checkpoint_not_found(checkpoint_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::CheckpointNotFound,
            format!("checkpoint {checkpoint_id} not found"),
        )
        .with_context("checkpoint_id", checkpoint_id.to_string())
    }

    /// Convenience constructor for [`ErrorCode::PolicyViolation`].
    pub fn policy_violation(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::PolicyViolation, reason)
    }

    /// Convenience constructor for [`ErrorCode::BudgetExceeded`].
    pub fn budget_exceeded(budget_id: impl fmt::Display, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BudgetExceeded, message)
            .with_context("budget_id", budget_id.to_string())
    }
}

impl fmt::Debug for CcpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("CcpError");
        d.field("code", &self.code);
        d.field("message", &self.message);
        if let Some(ref src) = self.source {
            d.field("source", &src.to_string());
        }
        if !self.context.is_empty() {
            d.field("context", &self.context);
        }
        d.finish()
    }
}

impl fmt::Display for CcpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)?;
        if !self.context.is_empty() {
            // Deterministic output thanks to BTreeMap.
            if let Ok(ctx) = serde_json::to_string(&self.context) {
                write!(f, " {ctx}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for CcpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

// ---------------------------------------------------------------------------
// Serialization support
// ---------------------------------------------------------------------------

/// Serialisable snapshot of a [`CcpError`] (without the opaque source),
/// suitable for returning over the HTTP surface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CcpErrorDto {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Structured context.
    pub context: BTreeMap<String, serde_json::Value>,
    /// String representation of the source error, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_message: Option<String>,
}

impl From<&CcpError> for CcpErrorDto {
    fn from(err: &CcpError) -> Self {
        Self {
            code: err.code,
            message: err.message.clone(),
            context: err.context.clone(),
            source_message: err.source.as_ref().map(|s| s.to_string()),
        }
    }
}

impl From<CcpErrorDto> for CcpError {
    fn from(dto: CcpErrorDto) -> Self {
        Self {
            code: dto.code,
            message: dto.message,
            source: None,
            context: dto.context,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    /// All error codes for exhaustive iteration in tests.
    const ALL_CODES: &[ErrorCode] = &[
        ErrorCode::InvalidChangeSpec,
        ErrorCode::InvalidSelector,
        ErrorCode::UnsupportedOperation,
        ErrorCode::InvalidMission,
        ErrorCode::MissionNotFound,
        ErrorCode::CheckpointNotFound,
        ErrorCode::BatchNotFound,
        ErrorCode::BudgetNotFound,
        ErrorCode::PolicyViolation,
        ErrorCode::SecurityBlock,
        ErrorCode::ParseError,
        ErrorCode::IoError,
        ErrorCode::ExternalToolUnavailable,
        ErrorCode::Timeout,
        ErrorCode::BudgetExceeded,
        ErrorCode::NoViableModel,
        ErrorCode::UnknownInvariantType,
    ];

    // -- Construction & Display -----------------------------------------

    #[test]
    fn basic_construction() {
        let err = CcpError::new(ErrorCode::UnknownInvariantType, "boom");
        assert_eq!(err.code, ErrorCode::UnknownInvariantType);
        assert_eq!(err.message, "boom");
        assert!(err.source.is_none());
        assert!(err.context.is_empty());
    }

    #[test]
    fn display_without_context() {
        let err = CcpError::new(ErrorCode::MissionNotFound, "no such mission");
        assert_eq!(err.to_string(), "[MISSION_NOT_FOUND] no such mission");
    }

    #[test]
    fn display_with_context() {
        let err = CcpError::new(ErrorCode::BudgetExceeded, "over budget")
            .with_context("spent_usd", 42.5);
        let s = err.to_string();
        assert!(s.starts_with("[BUDGET_EXCEEDED] over budget"));
        assert!(s.contains("spent_usd"));
        assert!(s.contains("42.5"));
    }

    #[test]
    fn debug_impl() {
        let err = CcpError::new(ErrorCode::PolicyViolation, "nope");
        let dbg = format!("{err:?}");
        assert!(dbg.contains("PolicyViolation"));
        assert!(dbg.contains("nope"));
    }

    #[test]
    fn debug_with_source() {
        let src = io::Error::new(io::ErrorKind::NotFound, "file missing");
        let err = CcpError::new(ErrorCode::IoError, "read failed").with_source(src);
        let dbg = format!("{err:?}");
        assert!(dbg.contains("source"));
        assert!(dbg.contains("file missing"));
    }

    // -- Error code categorization --------------------------------------

    #[test]
    fn validation_codes_categorised() {
        assert_eq!(
            ErrorCode::InvalidChangeSpec.category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            ErrorCode::InvalidSelector.category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            ErrorCode::UnsupportedOperation.category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            ErrorCode::InvalidMission.category(),
            ErrorCategory::Validation
        );
    }

    #[test]
    fn not_found_codes_categorised() {
        assert_eq!(
            ErrorCode::MissionNotFound.category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            ErrorCode::CheckpointNotFound.category(),
            ErrorCategory::NotFound
        );
        assert_eq!(ErrorCode::BatchNotFound.category(), ErrorCategory::NotFound);
        assert_eq!(
            ErrorCode::BudgetNotFound.category(),
            ErrorCategory::NotFound
        );
    }

    #[test]
    fn security_codes_categorised() {
        assert_eq!(
            ErrorCode::PolicyViolation.category(),
            ErrorCategory::Security
        );
        assert_eq!(ErrorCode::SecurityBlock.category(), ErrorCategory::Security);
    }

    #[test]
    fn execution_codes_categorised() {
        assert_eq!(ErrorCode::ParseError.category(), ErrorCategory::Execution);
        assert_eq!(ErrorCode::IoError.category(), ErrorCategory::Execution);
        assert_eq!(
            ErrorCode::ExternalToolUnavailable.category(),
            ErrorCategory::Execution
        );
        assert_eq!(ErrorCode::Timeout.category(), ErrorCategory::Execution);
    }

    #[test]
    fn resource_codes_categorised() {
        assert_eq!(
            ErrorCode::BudgetExceeded.category(),
            ErrorCategory::Resource
        );
        assert_eq!(ErrorCode::NoViableModel.category(), ErrorCategory::Resource);
    }

    #[test]
    fn internal_codes_categorised() {
        assert_eq!(
            ErrorCode::UnknownInvariantType.category(),
            ErrorCategory::Internal
        );
    }

    #[test]
    fn every_code_has_a_unique_stable_string() {
        let mut seen = std::collections::HashSet::new();
        for code in ALL_CODES {
            assert!(seen.insert(code.as_str()), "duplicate code string");
            assert_eq!(code.as_str(), code.as_str().to_uppercase());
        }
        assert_eq!(seen.len(), ALL_CODES.len());
    }

    #[test]
    fn dto_roundtrip_drops_source() {
        let src = io::Error::new(io::ErrorKind::Other, "underlying");
        let err = CcpError::new(ErrorCode::ParseError, "bad selector")
            .with_context("offset", 12)
            .with_source(src);
        let dto = CcpErrorDto::from(&err);
        assert_eq!(dto.code, ErrorCode::ParseError);
        assert_eq!(dto.source_message.as_deref(), Some("underlying"));

        let json = serde_json::to_string(&dto).expect("serialize");
        let back: CcpErrorDto = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, dto);

        let restored: CcpError = back.into();
        assert!(restored.source.is_none());
        assert_eq!(restored.context.get("offset"), err.context.get("offset"));
    }

    #[test]
    fn convenience_constructors_set_context() {
        let err = CcpError::mission_not_found("m-1");
        assert_eq!(err.code, ErrorCode::MissionNotFound);
        assert_eq!(
            err.context.get("mission_id").and_then(|v| v.as_str()),
            Some("m-1")
        );

        let err = CcpError::budget_exceeded("b-1", "too expensive");
        assert_eq!(err.code, ErrorCode::BudgetExceeded);
        assert_eq!(
            err.context.get("budget_id").and_then(|v| v.as_str()),
            Some("b-1")
        );
    }
}
