//! Request data as extracted by a web framework, and the per-request context
//! validated results are attached to.

use std::collections::BTreeMap;

use serde::Serialize;

use vouch_contracts::Value;
use vouch_core::FieldSource;

/// The raw inputs of one request.
///
/// The adapter never parses HTTP itself: query strings, form bodies and
/// headers arrive as string maps, the JSON body as an already-decoded value
/// (`None` when the request has no JSON body or it failed to decode).
#[derive(Debug, Clone, Default)]
pub struct RequestData {
    pub query: BTreeMap<String, String>,
    pub form: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub json: Option<serde_json::Value>,
}

impl RequestData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_form(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.insert(key.into(), value.into());
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.json = Some(body);
        self
    }

    /// The JSON body in the engine's value model. A missing or `null` body
    /// is an empty object.
    pub fn json_value(&self) -> Value {
        match &self.json {
            Some(body) if !body.is_null() => Value::from(body),
            _ => Value::Map(Default::default()),
        }
    }
}

/// Header lookup ignoring ASCII case, as HTTP header names are.
#[derive(Debug, Clone, Copy)]
pub struct Headers<'a>(pub &'a BTreeMap<String, String>);

impl FieldSource for Headers<'_> {
    fn field(&self, key: &str) -> Option<Value> {
        self.0
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, v)| Value::Str(v.clone()))
    }
}

/// Validated results for one request, one slot per source.
///
/// A slot stays `None` when no rules were declared for that source.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Params {
    pub query: Option<Value>,
    pub form: Option<Value>,
    pub json: Option<Value>,
    pub headers: Option<Value>,
}
