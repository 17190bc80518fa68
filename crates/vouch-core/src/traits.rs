//! Core trait definitions for the vouch validation pipeline.
//!
//! Two seams:
//!
//! - `FieldSource` — where raw field values come from (untrusted input)
//! - `Parse`       — how one scalar rule coerces and checks a value
//!
//! The verifier resolves every declared field through `FieldSource`, runs the
//! shared pre-checks, then hands the value to the rule's `Parse` impl.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use vouch_contracts::{Value, VouchResult};

use crate::rule::Common;

/// Keyed lookup with absent-on-miss.
///
/// Implemented here for mappings; implement it for your own types to validate
/// structs through explicit accessors. A missing field is `None`, never an
/// error.
///
/// ```rust,ignore
/// struct Signup { email: String }
///
/// impl FieldSource for Signup {
///     fn field(&self, key: &str) -> Option<Value> {
///         match key {
///             "email" => Some(Value::from(self.email.as_str())),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait FieldSource {
    /// Return the value stored under `key`, or `None` when it is not present.
    fn field(&self, key: &str) -> Option<Value>;
}

/// Maps expose their entries. Every other variant, including `Null`, has no
/// fields, so each key resolves to absent.
impl FieldSource for Value {
    fn field(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }
}

impl FieldSource for BTreeMap<String, Value> {
    fn field(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }
}

impl<S: BuildHasher> FieldSource for HashMap<String, Value, S> {
    fn field(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }
}

/// Query strings, form bodies, and headers arrive as plain strings.
impl FieldSource for BTreeMap<String, String> {
    fn field(&self, key: &str) -> Option<Value> {
        self.get(key).map(|s| Value::Str(s.clone()))
    }
}

impl<S: BuildHasher> FieldSource for HashMap<String, String, S> {
    fn field(&self, key: &str) -> Option<Value> {
        self.get(key).map(|s| Value::Str(s.clone()))
    }
}

impl FieldSource for serde_json::Value {
    fn field(&self, key: &str) -> Option<Value> {
        self.get(key).map(Value::from)
    }
}

impl FieldSource for serde_json::Map<String, serde_json::Value> {
    fn field(&self, key: &str) -> Option<Value> {
        self.get(key).map(Value::from)
    }
}

impl<T: FieldSource + ?Sized> FieldSource for &T {
    fn field(&self, key: &str) -> Option<Value> {
        (**self).field(key)
    }
}

/// A scalar rule: shared configuration plus a type-specific parser.
///
/// Implementations are immutable after construction and must be safe to call
/// from many threads at once.
pub trait Parse {
    /// The shared required/nullable/default/hook configuration.
    fn common(&self) -> &Common;

    /// Coerce and check one value.
    ///
    /// Only called with values that survived the common pre-checks and are
    /// not null-like; null, absent, and empty values bypass the parser.
    fn parse(&self, key: &str, value: Value) -> VouchResult<Value>;
}
