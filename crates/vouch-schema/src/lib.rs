//! # vouch-schema
//!
//! Declarative schema files for the vouch validation engine.
//!
//! ## Overview
//!
//! A schema is declared in TOML as an ordered `[[fields]]` array and compiled
//! by [`SchemaLoader`] into a frozen [`vouch_core::Schema`]. Nested `dict` and
//! `list` fields carry their own `[[fields.schema]]` arrays. Post hooks are
//! plain functions, so files refer to them by name and the hosting
//! application registers them in a [`HookRegistry`].
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use vouch_schema::{HookRegistry, SchemaLoader};
//!
//! let mut hooks = HookRegistry::new();
//! hooks.register("trim_zeros", |_, v| Ok(v));
//! let schema = SchemaLoader::with_hooks(hooks).load_file(Path::new("schemas/order.toml"))?;
//! ```

pub mod decl;
pub mod loader;

pub use decl::{FieldDecl, FieldType, SchemaDoc};
pub use loader::{to_value, HookRegistry, SchemaLoader};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use vouch_contracts::{Value, ViolationKind, VouchError};
    use vouch_core::pipeline::execute;
    use vouch_core::rule::Rule;

    use crate::{HookRegistry, SchemaLoader};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn expect_config_error(toml: &str, needle: &str) {
        match SchemaLoader::from_toml_str(toml) {
            Err(VouchError::ConfigError { reason }) => {
                assert!(reason.contains(needle), "expected '{needle}' in reason, got: {reason}");
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    /// Run the scalar pipeline of the named top-level field.
    fn run(rule: &Rule, key: &str, value: Option<Value>) -> Result<Value, VouchError> {
        match rule {
            Rule::Int(r) => execute(r, key, value),
            Rule::Str(r) => execute(r, key, value),
            Rule::Date(r) => execute(r, key, value),
            Rule::Float(r) => execute(r, key, value),
            other => panic!("unexpected rule kind {}", other.kind_name()),
        }
    }

    // ── 1. Structure ──────────────────────────────────────────────────────────

    /// Fields keep the order they are declared in.
    #[test]
    fn test_fields_keep_declaration_order() {
        let schema = SchemaLoader::from_toml_str(
            r#"
            [[fields]]
            name = "zeta"
            type = "int"

            [[fields]]
            name = "alpha"
            type = "email"

            [[fields]]
            name = "mid"
            type = "bool"
        "#,
        )
        .unwrap();

        let names: Vec<(&str, &str)> = schema.iter().map(|(n, r)| (n, r.kind_name())).collect();
        assert_eq!(names, vec![("zeta", "int"), ("alpha", "email"), ("mid", "bool")]);
    }

    /// An empty document is an empty schema.
    #[test]
    fn test_empty_document() {
        assert!(SchemaLoader::from_toml_str("").unwrap().is_empty());
    }

    /// Nested `list` fields compile their own sub-schema.
    #[test]
    fn test_nested_list_schema() {
        let schema = SchemaLoader::from_toml_str(
            r#"
            [[fields]]
            name = "items"
            type = "list"
            required = true

              [[fields.schema]]
              name = "name"
              type = "str"
              required = true
        "#,
        )
        .unwrap();

        match schema.get("items") {
            Some(Rule::List(nested)) => {
                assert!(nested.common.required);
                assert_eq!(nested.schema.get("name").map(Rule::kind_name), Some("str"));
            }
            other => panic!("expected a list rule, got {:?}", other),
        }
    }

    // ── 2. Options ────────────────────────────────────────────────────────────

    /// Integer bounds, defaults and mapping enums come through.
    #[test]
    fn test_int_options() {
        let schema = SchemaLoader::from_toml_str(
            r#"
            [[fields]]
            name = "grade"
            type = "int"
            allow_null = false
            default = 1
            gte = 1

            [fields.enum]
            1 = "A"
            2 = "B"
        "#,
        )
        .unwrap();
        let rule = schema.get("grade").unwrap();

        assert_eq!(run(rule, "grade", None).unwrap(), Value::from("A"));
        assert_eq!(run(rule, "grade", Some(Value::Int(2))).unwrap(), Value::from("B"));
        assert_eq!(
            run(rule, "grade", Some(Value::Int(3))).unwrap_err().kind(),
            Some(ViolationKind::EnumViolation)
        );
    }

    /// String pipeline options compile into the string rule.
    #[test]
    fn test_str_options() {
        let schema = SchemaLoader::from_toml_str(
            r#"
            [[fields]]
            name = "tags"
            type = "str"
            lower = true
            strip = true
            split = ","
            enum = ["red", "green"]
        "#,
        )
        .unwrap();
        let rule = schema.get("tags").unwrap();

        assert_eq!(
            run(rule, "tags", Some(Value::from(" RED,green "))).unwrap(),
            Value::List(vec![Value::from("red"), Value::from("green")])
        );
    }

    /// TOML dates and strings are both accepted as temporal bounds.
    #[test]
    fn test_date_options() {
        let schema = SchemaLoader::from_toml_str(
            r#"
            [[fields]]
            name = "day"
            type = "date"
            gte = 2020-01-01
            lt = "2021-01-01"
            default = "2020-07-01"
        "#,
        )
        .unwrap();
        let rule = schema.get("day").unwrap();

        assert_eq!(
            run(rule, "day", None).unwrap(),
            Value::Date(NaiveDate::from_ymd_opt(2020, 7, 1).unwrap())
        );
        assert_eq!(
            run(rule, "day", Some(Value::from("2019-05-05"))).unwrap_err().kind(),
            Some(ViolationKind::RangeViolation)
        );
    }

    /// Float bounds accept integers.
    #[test]
    fn test_float_options() {
        let schema = SchemaLoader::from_toml_str(
            r#"
            [[fields]]
            name = "price"
            type = "float"
            gt = 0
            digits = 2
        "#,
        )
        .unwrap();
        let rule = schema.get("price").unwrap();
        assert_eq!(run(rule, "price", Some(Value::from("1.234"))).unwrap(), Value::Float(1.23));
    }

    // ── 3. Hooks ──────────────────────────────────────────────────────────────

    /// Hook names resolve through the registry, in declared order.
    #[test]
    fn test_hooks_resolve_by_name() {
        let mut hooks = HookRegistry::new();
        hooks.register("exclaim", |_, v| Ok(Value::Str(format!("{v}!"))));
        hooks.register("twice", |_, v| Ok(Value::Str(format!("{v}{v}"))));

        let schema = SchemaLoader::with_hooks(hooks)
            .load_str(
                r#"
            [[fields]]
            name = "word"
            type = "str"
            hooks = ["exclaim", "twice"]
        "#,
            )
            .unwrap();

        let rule = schema.get("word").unwrap();
        assert_eq!(run(rule, "word", Some(Value::from("hi"))).unwrap(), Value::from("hi!hi!"));
    }

    /// An unregistered hook name is a configuration error.
    #[test]
    fn test_unknown_hook_is_rejected() {
        expect_config_error(
            r#"
            [[fields]]
            name = "word"
            type = "str"
            hooks = ["missing"]
        "#,
            "unknown hook 'missing'",
        );
    }

    // ── 4. Configuration errors ───────────────────────────────────────────────

    /// Malformed TOML is a configuration error.
    #[test]
    fn test_malformed_toml() {
        expect_config_error("[[fields]\nname = ", "failed to parse schema TOML");
    }

    /// Unknown keys are rejected.
    #[test]
    fn test_unknown_key() {
        expect_config_error(
            r#"
            [[fields]]
            name = "a"
            type = "int"
            maximum = 3
        "#,
            "maximum",
        );
    }

    /// Unknown rule types are rejected.
    #[test]
    fn test_unknown_type() {
        expect_config_error(
            r#"
            [[fields]]
            name = "a"
            type = "uuid"
        "#,
            "uuid",
        );
    }

    /// Options that belong to another type are rejected, naming the field.
    #[test]
    fn test_misplaced_option() {
        expect_config_error(
            r#"
            [[fields]]
            name = "age"
            type = "int"
            min_length = 3
        "#,
            "field 'age': option(s) min_length do not apply to type 'int'",
        );
    }

    /// A bad regex is reported at load time, with the nested path.
    #[test]
    fn test_bad_regex_in_nested_field() {
        expect_config_error(
            r#"
            [[fields]]
            name = "user"
            type = "dict"

              [[fields.schema]]
              name = "code"
              type = "str"
              regex = "("
        "#,
            "field 'user': field 'code': invalid regex",
        );
    }

    /// Unparseable temporal bounds are rejected.
    #[test]
    fn test_bad_date_bound() {
        expect_config_error(
            r#"
            [[fields]]
            name = "day"
            type = "date"
            gt = "tomorrow"
        "#,
            "tomorrow",
        );
    }

    /// Missing files are configuration errors, not panics.
    #[test]
    fn test_missing_file() {
        match SchemaLoader::from_file(std::path::Path::new("/nonexistent/schema.toml")) {
            Err(VouchError::ConfigError { reason }) => assert!(reason.contains("failed to read schema file")),
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }
}
