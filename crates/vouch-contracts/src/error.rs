//! Error types for the vouch validation engine.
//!
//! All fallible operations return `VouchResult<T>`. A failed validation
//! carries exactly one [`Violation`]: the engine is fail-fast and never
//! aggregates errors from several fields.

use std::fmt;

use thiserror::Error;

use crate::message::{self, MessageKey};
use crate::value::Value;

/// The violated-constraint taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    /// A required field is absent from its source.
    MissingRequired,
    /// Absent, null, or empty value on a rule that does not allow null.
    NullNotAllowed,
    /// Numeric, boolean, date, or split-element conversion failed.
    TypeMismatch,
    /// A string could not be read as `true`/`false`.
    BooleanConversionError,
    /// One of `gt`, `gte`, `lt`, `lte` failed.
    RangeViolation,
    /// List membership or mapping lookup failed.
    EnumViolation,
    LengthViolation,
    /// Regex, prefix/suffix, containment, or character-class check failed.
    PatternMismatch,
    /// An array was expected for this field.
    ContainerTypeMismatch,
    /// Email, IPv4, IPv6, phone, or URL format check failed.
    FormatViolation,
    /// `many` mode was requested but the input is not an array.
    ExpectedArray,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A single violated constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub kind: ViolationKind,
    /// The template the message was rendered from.
    pub message_key: MessageKey,
    /// Field key. Empty for whole-input violations such as `ExpectedArray`.
    pub key: String,
    /// The offending value as it was seen by the failing check.
    pub value: Value,
    /// Name and rendered value of the violated constraint parameter.
    pub param: Option<(String, String)>,
    /// The message rendered through the catalog active at creation time.
    pub message: String,
}

impl Violation {
    /// Build a violation without a constraint parameter.
    pub fn new(message_key: MessageKey, key: &str, value: &Value) -> Self {
        Self::render(message_key, key, value, None)
    }

    /// Build a violation naming the constraint that failed, e.g. `("gt", "5")`.
    pub fn with_param(
        message_key: MessageKey,
        key: &str,
        value: &Value,
        param: &str,
        param_value: impl fmt::Display,
    ) -> Self {
        Self::render(
            message_key,
            key,
            value,
            Some((param.to_string(), param_value.to_string())),
        )
    }

    fn render(
        message_key: MessageKey,
        key: &str,
        value: &Value,
        param: Option<(String, String)>,
    ) -> Self {
        let rendered_value = value.to_string();
        let mut args: Vec<(&str, &str)> = vec![("key", key), ("value", rendered_value.as_str())];
        if let Some((name, v)) = &param {
            args.push((name.as_str(), v.as_str()));
        }
        let message = message::current().render(message_key, &args);

        Self {
            kind: message_key.kind(),
            message_key,
            key: key.to_string(),
            value: value.clone(),
            param,
            message,
        }
    }
}

/// The unified error type for vouch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VouchError {
    /// The input violated a rule.
    #[error("{}", .0.message)]
    Invalid(Box<Violation>),

    /// A rule or schema definition is malformed.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// Nested schemas went deeper than the verifier allows.
    #[error("schema nesting exceeds the maximum depth of {max_depth}")]
    DepthExceeded { max_depth: usize },
}

impl VouchError {
    /// The taxonomy entry, for `Invalid` errors.
    pub fn kind(&self) -> Option<ViolationKind> {
        self.violation().map(|v| v.kind)
    }

    pub fn violation(&self) -> Option<&Violation> {
        match self {
            VouchError::Invalid(v) => Some(v),
            _ => None,
        }
    }
}

impl From<Violation> for VouchError {
    fn from(v: Violation) -> Self {
        VouchError::Invalid(Box::new(v))
    }
}

/// Convenience alias used throughout the vouch crates.
pub type VouchResult<T> = Result<T, VouchError>;
