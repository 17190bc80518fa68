//! Schema-driven verifier for the vouch engine.
//!
//! `Verifier` is stateless apart from its depth limit. One instance can be
//! shared by every request and thread; rule records are only ever read.
//!
//! For each `(key, rule)` in declared order:
//!
//! 1. resolve the raw value through `FieldSource` (absent is `None`)
//! 2. nested list: a present value must be an array (an explicit null is
//!    not); honor passthrough, run the common pipeline on the whole list when
//!    it is absent, then verify every element
//! 3. nested object: a present non-null value must be an object; honor
//!    passthrough, run the common pipeline, then verify the value once
//!    against the sub-schema
//! 4. anything else: the scalar pipeline from `vouch_core::pipeline`

use tracing::{debug, warn};

use vouch_contracts::{Map, MessageKey, Value, Violation, VouchError, VouchResult};
use vouch_core::pipeline::{common_check, execute, not_a_list, not_a_map};
use vouch_core::rule::{NestedRule, Rule, Schema};
use vouch_core::FieldSource;

/// Nesting depth allowed by `Verifier::new()`.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// The vouch verification orchestrator.
#[derive(Debug, Clone, Copy)]
pub struct Verifier {
    max_depth: usize,
}

impl Verifier {
    /// Create a verifier with the default depth limit.
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Limit how many nested schemas deep a single call may descend.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Validate one source against `schema`, producing a `Value::Map`.
    pub fn verify(&self, source: &dyn FieldSource, schema: &Schema) -> VouchResult<Value> {
        self.verify_at(source, schema, 0).map_err(|e| {
            warn!(
                key = e.violation().map(|v| v.key.as_str()).unwrap_or(""),
                kind = ?e.kind(),
                error = %e,
                "verification failed"
            );
            e
        })
    }

    /// Validate every element of an array against `schema`.
    ///
    /// # Errors
    ///
    /// `ExpectedArray` when `data` is not a list; nothing is validated then.
    pub fn verify_many(&self, data: &Value, schema: &Schema) -> VouchResult<Value> {
        let items = match data {
            Value::List(items) => items,
            other => {
                warn!(got = other.type_name(), "many mode expects an array");
                return Err(Violation::new(MessageKey::Many, "", other).into());
            }
        };

        debug!(count = items.len(), "verifying array input");
        items
            .iter()
            .map(|item| self.verify(item, schema))
            .collect::<VouchResult<Vec<_>>>()
            .map(Value::List)
    }

    /// Single entry point for adapters: `verify_many` when `many` is set,
    /// otherwise `verify`.
    pub fn verify_data(&self, data: &Value, schema: &Schema, many: bool) -> VouchResult<Value> {
        if many {
            self.verify_many(data, schema)
        } else {
            self.verify(data, schema)
        }
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn verify_at(&self, source: &dyn FieldSource, schema: &Schema, depth: usize) -> VouchResult<Value> {
        if depth > self.max_depth {
            return Err(VouchError::DepthExceeded {
                max_depth: self.max_depth,
            });
        }

        let mut out = Map::new();
        for (key, rule) in schema.iter() {
            let value = source.field(key);
            debug!(key = %key, rule = rule.kind_name(), depth, present = value.is_some(), "verifying field");

            let verified = match rule {
                Rule::Bool(r) => execute(r, key, value)?,
                Rule::Int(r) => execute(r, key, value)?,
                Rule::Float(r) => execute(r, key, value)?,
                Rule::Str(r) => execute(r, key, value)?,
                Rule::Date(r) | Rule::DateTime(r) => execute(r, key, value)?,
                Rule::Email(r) | Rule::Ipv4(r) | Rule::Ipv6(r) | Rule::Url(r) => execute(r, key, value)?,
                Rule::Phone(r) => execute(r, key, value)?,
                Rule::Object(nested) => self.object(key, nested, value, depth)?,
                Rule::List(nested) => self.list(key, nested, value, depth)?,
            };
            out.insert(key.to_string(), verified);
        }
        Ok(Value::Map(out))
    }

    fn object(&self, key: &str, nested: &NestedRule, value: Option<Value>, depth: usize) -> VouchResult<Value> {
        if let Some(v) = &value {
            if !v.is_null_like() && v.as_map().is_none() {
                return Err(not_a_map(key, v));
            }
        }
        if nested.passthrough {
            return Ok(value.unwrap_or(Value::Null));
        }

        let value = match common_check(&nested.common, key, value)? {
            v if v.is_null_like() => return Ok(v),
            v @ Value::Map(_) => v,
            other => return Err(not_a_map(key, &other)),
        };

        debug!(key = %key, depth = depth + 1, "descending into nested object");
        self.verify_at(&value, &nested.schema, depth + 1)
    }

    fn list(&self, key: &str, nested: &NestedRule, value: Option<Value>, depth: usize) -> VouchResult<Value> {
        if let Some(v) = &value {
            if v.as_list().is_none() {
                return Err(not_a_list(key, v));
            }
        }
        if nested.passthrough {
            return Ok(value.unwrap_or(Value::Null));
        }

        let items = match common_check(&nested.common, key, value)? {
            Value::List(items) => items,
            v if v.is_null_like() => return Ok(v),
            other => return Err(not_a_list(key, &other)),
        };

        debug!(key = %key, depth = depth + 1, count = items.len(), "descending into nested list");
        items
            .iter()
            .map(|item| self.verify_at(item, &nested.schema, depth + 1))
            .collect::<VouchResult<Vec<_>>>()
            .map(Value::List)
    }
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::thread;

    use chrono::NaiveDate;
    use serde_json::json;

    use vouch_contracts::ViolationKind;
    use vouch_core::rule::{BoolRule, Configure, FloatRule, IntRule, StrRule, TemporalRule};

    use super::*;

    fn data(v: serde_json::Value) -> Value {
        Value::from(v)
    }

    fn kind_of(result: VouchResult<Value>) -> ViolationKind {
        match result {
            Err(e) => e.kind().unwrap_or_else(|| panic!("expected a violation, got {:?}", e)),
            Ok(v) => panic!("expected a violation, got {:?}", v),
        }
    }

    // ── Presence and defaults ─────────────────────────────────────────────────

    /// A required field that is absent fails regardless of other settings.
    #[test]
    fn test_required_field_missing() {
        let schema = Schema::new().field("name", StrRule::new().required(true).default_value("x"));
        let result = Verifier::new().verify(&data(json!({})), &schema);
        assert_eq!(kind_of(result), ViolationKind::MissingRequired);
    }

    /// `{int, allow_null: false, default: 7}` with the field absent yields 7.
    #[test]
    fn test_default_replaces_absent_when_null_not_allowed() {
        let schema = Schema::new().field("n", IntRule::new().allow_null(false).default_value(7));
        let out = Verifier::new().verify(&data(json!({})), &schema).unwrap();
        assert_eq!(out, data(json!({"n": 7})));
    }

    /// Absent optional fields appear in the output as null.
    #[test]
    fn test_absent_optional_field_is_null() {
        let schema = Schema::new().field("flag", BoolRule::new());
        let out = Verifier::new().verify(&data(json!({})), &schema).unwrap();
        assert_eq!(out.get("flag"), Some(&Value::Null));
    }

    /// The first invalid field in declared order is the one reported.
    #[test]
    fn test_declared_order_decides_the_error() {
        let schema = Schema::new()
            .field("b", IntRule::new())
            .field("a", IntRule::new().required(true));
        let result = Verifier::new().verify(&data(json!({"b": "x"})), &schema);
        assert_eq!(kind_of(result), ViolationKind::TypeMismatch);
    }

    // ── Coercion ──────────────────────────────────────────────────────────────

    /// Output values are coerced to the rule's type.
    #[test]
    fn test_output_is_coerced() {
        let schema = Schema::new()
            .field("age", IntRule::new())
            .field("ratio", FloatRule::new().digits(1))
            .field("active", BoolRule::new())
            .field("born", TemporalRule::date());
        let out = Verifier::new()
            .verify(
                &data(json!({"age": "30", "ratio": "0.26", "active": "TRUE", "born": "1990-01-02"})),
                &schema,
            )
            .unwrap();

        assert_eq!(out.get("age"), Some(&Value::Int(30)));
        assert_eq!(out.get("ratio"), Some(&Value::Float(0.3)));
        assert_eq!(out.get("active"), Some(&Value::Bool(true)));
        assert_eq!(
            out.get("born"),
            Some(&Value::Date(NaiveDate::from_ymd_opt(1990, 1, 2).unwrap()))
        );
    }

    /// Validating an already-validated output again yields the same output.
    #[test]
    fn test_revalidation_is_idempotent() {
        let schema = Schema::new()
            .field("code", StrRule::new().upper())
            .field("n", IntRule::new());
        let verifier = Verifier::new();

        let once = verifier.verify(&data(json!({"code": "abC", "n": "5"})), &schema).unwrap();
        let twice = verifier.verify(&once, &schema).unwrap();

        assert_eq!(once.get("code"), Some(&Value::from("ABC")));
        assert_eq!(once, twice);
    }

    // ── Nested schemas ────────────────────────────────────────────────────────

    /// A nested list aborts on the first failing element; no partial output.
    #[test]
    fn test_nested_list_aborts_on_second_element() {
        let item = Schema::new().field("name", StrRule::new().required(true));
        let schema = Schema::new().field("items", NestedRule::list(item));

        let result = Verifier::new().verify(&data(json!({"items": [{"name": "x"}, {}]})), &schema);
        match result {
            Err(e) => {
                let v = e.violation().expect("violation");
                assert_eq!(v.kind, ViolationKind::MissingRequired);
                assert_eq!(v.key, "name");
            }
            Ok(v) => panic!("expected MissingRequired, got {:?}", v),
        }
    }

    /// Each element of a nested list is verified against the sub-schema.
    #[test]
    fn test_nested_list_success() {
        let item = Schema::new().field("qty", IntRule::new().gt(0));
        let schema = Schema::new().field("items", NestedRule::list(item));

        let out = Verifier::new()
            .verify(&data(json!({"items": [{"qty": "1"}, {"qty": 2}]})), &schema)
            .unwrap();
        assert_eq!(out, data(json!({"items": [{"qty": 1}, {"qty": 2}]})));
    }

    /// A present non-array value for a nested list is a container mismatch;
    /// an absent optional one is null.
    #[test]
    fn test_nested_list_container_type() {
        let schema = Schema::new().field("items", NestedRule::list(Schema::new()));
        let verifier = Verifier::new();

        let result = verifier.verify(&data(json!({"items": {"a": 1}})), &schema);
        assert_eq!(kind_of(result), ViolationKind::ContainerTypeMismatch);

        let out = verifier.verify(&data(json!({})), &schema).unwrap();
        assert_eq!(out.get("items"), Some(&Value::Null));
    }

    /// An explicit null or empty string is present, so it is not an array.
    #[test]
    fn test_nested_list_present_null_is_a_container_mismatch() {
        let schema = Schema::new().field("items", NestedRule::list(Schema::new()).default_value(Vec::<Value>::new()));
        let verifier = Verifier::new();

        for input in [json!({"items": null}), json!({"items": ""})] {
            match verifier.verify(&data(input), &schema) {
                Err(e) => {
                    let v = e.violation().expect("violation");
                    assert_eq!(v.kind, ViolationKind::ContainerTypeMismatch);
                    assert_eq!(v.key, "items");
                }
                other => panic!("expected ContainerTypeMismatch, got {:?}", other),
            }
        }

        // An absent list still takes its default.
        let out = verifier.verify(&data(json!({})), &schema).unwrap();
        assert_eq!(out.get("items"), Some(&Value::List(vec![])));
    }

    /// A nested object given an array or scalar is a container mismatch.
    #[test]
    fn test_nested_object_rejects_non_objects() {
        let address = Schema::new().field("city", StrRule::new());
        let schema = Schema::new().field("addr", NestedRule::object(address));
        let verifier = Verifier::new();

        for input in [json!({"addr": [1, 2, 3]}), json!({"addr": 5})] {
            match verifier.verify(&data(input), &schema) {
                Err(e) => {
                    let v = e.violation().expect("violation");
                    assert_eq!(v.kind, ViolationKind::ContainerTypeMismatch);
                    assert_eq!(v.message_key, MessageKey::Dict);
                }
                other => panic!("expected ContainerTypeMismatch, got {:?}", other),
            }
        }

        // Null stays null when allowed.
        let out = verifier.verify(&data(json!({"addr": null})), &schema).unwrap();
        assert_eq!(out.get("addr"), Some(&Value::Null));
    }

    /// A nested list can be required as a whole.
    #[test]
    fn test_nested_list_required() {
        let schema = Schema::new().field("items", NestedRule::list(Schema::new()).required(true));
        let result = Verifier::new().verify(&data(json!({})), &schema);
        assert_eq!(kind_of(result), ViolationKind::MissingRequired);
    }

    /// Nested objects produce nested output mappings.
    #[test]
    fn test_nested_object() {
        let address = Schema::new()
            .field("city", StrRule::new().strip())
            .field("zip", StrRule::new().char_class(vouch_core::rule::CharClass::Digit));
        let schema = Schema::new().field("address", NestedRule::object(address));

        let out = Verifier::new()
            .verify(&data(json!({"address": {"city": " Oslo ", "zip": "0150"}})), &schema)
            .unwrap();
        assert_eq!(out, data(json!({"address": {"city": "Oslo", "zip": "0150"}})));
    }

    /// Passthrough copies the raw value without validating it.
    #[test]
    fn test_passthrough_copies_raw_value() {
        let strict = Schema::new().field("x", IntRule::new().required(true));
        let schema = Schema::new()
            .field("meta", NestedRule::object(strict.clone()).passthrough(true))
            .field("tags", NestedRule::list(strict).passthrough(true));

        let input = json!({"meta": {"anything": [1, 2]}, "tags": ["a", "b"]});
        let out = Verifier::new().verify(&data(input.clone()), &schema).unwrap();
        assert_eq!(out, data(input));
    }

    /// Schemas nested deeper than the limit fail with `DepthExceeded`.
    #[test]
    fn test_depth_exceeded() {
        let inner = Schema::new().field("c", IntRule::new());
        let middle = Schema::new().field("b", NestedRule::object(inner));
        let schema = Schema::new().field("a", NestedRule::object(middle));
        let input = data(json!({"a": {"b": {"c": 1}}}));

        match Verifier::new().with_max_depth(1).verify(&input, &schema) {
            Err(VouchError::DepthExceeded { max_depth }) => assert_eq!(max_depth, 1),
            other => panic!("expected DepthExceeded, got {:?}", other),
        }

        assert!(Verifier::new().with_max_depth(2).verify(&input, &schema).is_ok());
    }

    // ── many mode ─────────────────────────────────────────────────────────────

    /// `many` with a non-array input fails before any field is looked at.
    #[test]
    fn test_many_requires_an_array() {
        let schema = Schema::new().field("n", IntRule::new().required(true));
        let result = Verifier::new().verify_data(&data(json!({"n": 1})), &schema, true);
        assert_eq!(kind_of(result), ViolationKind::ExpectedArray);
    }

    /// `many` verifies each element against the same schema.
    #[test]
    fn test_many_verifies_each_element() {
        let schema = Schema::new().field("n", IntRule::new());
        let out = Verifier::new()
            .verify_many(&data(json!([{"n": "1"}, {"n": 2}])), &schema)
            .unwrap();
        assert_eq!(out, data(json!([{"n": 1}, {"n": 2}])));
    }

    // ── Sources and sharing ───────────────────────────────────────────────────

    /// Any type implementing `FieldSource` can be validated.
    #[test]
    fn test_custom_field_source() {
        struct Signup {
            email: String,
        }

        impl FieldSource for Signup {
            fn field(&self, key: &str) -> Option<Value> {
                match key {
                    "email" => Some(Value::from(self.email.as_str())),
                    _ => None,
                }
            }
        }

        let schema = Schema::new()
            .field("email", vouch_core::rule::FormatRule::email())
            .field("age", IntRule::new().default_value(18));
        let signup = Signup {
            email: "a@example.com".to_string(),
        };

        let out = Verifier::new().verify(&signup, &schema).unwrap();
        assert_eq!(out, data(json!({"email": "a@example.com", "age": 18})));
    }

    /// String maps from query strings are a source too.
    #[test]
    fn test_string_map_source() {
        let mut query = HashMap::new();
        query.insert("page".to_string(), "3".to_string());

        let schema = Schema::new().field("page", IntRule::new().gte(1));
        let out = Verifier::new().verify(&query, &schema).unwrap();
        assert_eq!(out.get("page"), Some(&Value::Int(3)));
    }

    /// A date rule built once gives the same answers from separate threads,
    /// and is left unchanged.
    #[test]
    fn test_date_rule_shared_across_threads() {
        let rule = TemporalRule::date().gte("2020-01-01").unwrap();
        let bound_before = rule.bounds.clone();
        let schema = Schema::new().field("d", rule);
        let verifier = Verifier::new();

        let (early, late) = thread::scope(|s| {
            let early = s.spawn(|| verifier.verify(&data(json!({"d": "2019-12-31"})), &schema));
            let late = s.spawn(|| verifier.verify(&data(json!({"d": "2020-06-01"})), &schema));
            (early.join().unwrap(), late.join().unwrap())
        });

        assert_eq!(kind_of(early), ViolationKind::RangeViolation);
        assert_eq!(
            late.unwrap().get("d"),
            Some(&Value::Date(NaiveDate::from_ymd_opt(2020, 6, 1).unwrap()))
        );

        match schema.get("d") {
            Some(Rule::Date(r)) => assert_eq!(r.bounds, bound_before),
            other => panic!("expected a date rule, got {:?}", other),
        }
    }
}
