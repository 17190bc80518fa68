//! Nested object and nested list rules.
//!
//! These records carry no parser. The verifier recognizes them and recurses
//! into `schema`, once for an object or once per element for a list.

use vouch_contracts::Value;

use crate::rule::{Common, Schema};

#[derive(Debug, Clone)]
pub struct NestedRule {
    pub common: Common,
    pub schema: Schema,
    /// Copy the raw value into the output without validating it.
    pub passthrough: bool,
    /// The value is an array of objects rather than a single object.
    pub list_mode: bool,
}

impl NestedRule {
    pub fn object(schema: Schema) -> Self {
        Self {
            common: Common::default(),
            schema,
            passthrough: false,
            list_mode: false,
        }
    }

    pub fn list(schema: Schema) -> Self {
        Self {
            list_mode: true,
            ..Self::object(schema)
        }
    }

    pub fn passthrough(mut self, passthrough: bool) -> Self {
        self.passthrough = passthrough;
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.common.required = required;
        self
    }

    pub fn allow_null(mut self, allow_null: bool) -> Self {
        self.common.allow_null = allow_null;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.common.default = Some(value.into());
        self
    }
}
