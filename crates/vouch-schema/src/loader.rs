//! TOML schema loader.
//!
//! `SchemaLoader` parses a `SchemaDoc` and compiles it into a frozen
//! `vouch_core::Schema`. Compilation is where every configuration mistake
//! surfaces: unknown hook names, malformed regexes, unreadable temporal
//! bounds, options that do not apply to the declared type. All of them are
//! reported as `VouchError::ConfigError` naming the field.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::debug;

use vouch_contracts::{Map, Value, VouchError, VouchResult};
use vouch_core::rule::{
    BoolRule, CharClass, Configure, FloatRule, FormatRule, Hook, IntRule, NestedRule, PhoneRule, Rule,
    ScalarType, Schema, StrRule, TemporalInput, TemporalRule,
};

use crate::decl::{FieldDecl, FieldType, SchemaDoc};

/// Named post-hooks that schema files can reference with `hooks = [...]`.
///
/// Registering the same name twice replaces the previous hook.
#[derive(Clone, Default)]
pub struct HookRegistry {
    hooks: HashMap<String, Hook>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&str, Value) -> VouchResult<Value> + Send + Sync + 'static,
    {
        self.hooks.insert(name.into(), Arc::new(f));
    }

    pub fn get(&self, name: &str) -> Option<Hook> {
        self.hooks.get(name).cloned()
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.hooks.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("HookRegistry").field("hooks", &names).finish()
    }
}

/// Compiles schema files into `Schema`s.
///
/// ```rust,ignore
/// use vouch_schema::SchemaLoader;
///
/// let schema = SchemaLoader::from_file(Path::new("schemas/signup.toml"))?;
/// ```
#[derive(Debug, Default)]
pub struct SchemaLoader {
    hooks: HookRegistry,
}

impl SchemaLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// A loader that resolves hook names through `hooks`.
    pub fn with_hooks(hooks: HookRegistry) -> Self {
        Self { hooks }
    }

    /// Parse and compile `s` with no hooks registered.
    pub fn from_toml_str(s: &str) -> VouchResult<Schema> {
        Self::new().load_str(s)
    }

    /// Read and compile the file at `path` with no hooks registered.
    pub fn from_file(path: &Path) -> VouchResult<Schema> {
        Self::new().load_file(path)
    }

    /// Parse `s` as a schema document and compile it.
    ///
    /// Returns `VouchError::ConfigError` if the TOML is malformed, does not
    /// match `SchemaDoc`, or describes an invalid rule.
    pub fn load_str(&self, s: &str) -> VouchResult<Schema> {
        let doc: SchemaDoc = toml::from_str(s).map_err(|e| VouchError::ConfigError {
            reason: format!("failed to parse schema TOML: {}", e),
        })?;
        self.compile(&doc)
    }

    /// Read the file at `path` and compile it.
    pub fn load_file(&self, path: &Path) -> VouchResult<Schema> {
        let contents = std::fs::read_to_string(path).map_err(|e| VouchError::ConfigError {
            reason: format!("failed to read schema file '{}': {}", path.display(), e),
        })?;
        let schema = self.load_str(&contents)?;
        debug!(path = %path.display(), fields = schema.len(), "schema loaded");
        Ok(schema)
    }

    pub fn compile(&self, doc: &SchemaDoc) -> VouchResult<Schema> {
        self.compile_fields(&doc.fields)
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn compile_fields(&self, fields: &[FieldDecl]) -> VouchResult<Schema> {
        let mut schema = Schema::new();
        for decl in fields {
            let rule = self.compile_field(decl).map_err(|e| match e {
                VouchError::ConfigError { reason } => config(format!("field '{}': {}", decl.name, reason)),
                other => other,
            })?;
            schema.insert(decl.name.clone(), rule);
        }
        Ok(schema)
    }

    fn compile_field(&self, decl: &FieldDecl) -> VouchResult<Rule> {
        let misplaced = decl.misplaced_options(decl.kind);
        if !misplaced.is_empty() {
            return Err(config(format!(
                "option(s) {} do not apply to type '{}'",
                misplaced.join(", "),
                decl.kind.name()
            )));
        }

        let rule: Rule = match decl.kind {
            FieldType::Bool => {
                let mut rule = BoolRule::new();
                if let Some(convert) = decl.convert {
                    rule = rule.convert(convert);
                }
                self.configure(rule, decl)?.into()
            }
            FieldType::Int => self.configure(int_rule(decl)?, decl)?.into(),
            FieldType::Float => self.configure(float_rule(decl)?, decl)?.into(),
            FieldType::Str => self.configure(str_rule(decl)?, decl)?.into(),
            FieldType::Date => self.configure(temporal_rule(TemporalRule::date(), decl)?, decl)?.into(),
            FieldType::Datetime => {
                self.configure(temporal_rule(TemporalRule::datetime(), decl)?, decl)?.into()
            }
            FieldType::Email => self.configure(FormatRule::email(), decl)?.into(),
            FieldType::Ipv4 => self.configure(FormatRule::ipv4(), decl)?.into(),
            FieldType::Ipv6 => self.configure(FormatRule::ipv6(), decl)?.into(),
            FieldType::Url => self.configure(FormatRule::url(), decl)?.into(),
            FieldType::Phone => {
                let mut rule = PhoneRule::new();
                if let Some(region) = &decl.region {
                    rule = rule.region(region)?;
                }
                self.configure(rule, decl)?.into()
            }
            FieldType::Dict | FieldType::List => {
                let schema = self.compile_fields(&decl.schema)?;
                let mut rule = if decl.kind == FieldType::List {
                    NestedRule::list(schema)
                } else {
                    NestedRule::object(schema)
                };
                rule = rule.passthrough(decl.passthrough);
                if let Some(required) = decl.required {
                    rule = rule.required(required);
                }
                if let Some(allow_null) = decl.allow_null {
                    rule = rule.allow_null(allow_null);
                }
                if let Some(default) = &decl.default {
                    rule = rule.default_value(to_value(default)?);
                }
                rule.into()
            }
        };
        Ok(rule)
    }

    /// Apply the shared options. Temporal defaults are set by `temporal_rule`.
    fn configure<R: Configure>(&self, mut rule: R, decl: &FieldDecl) -> VouchResult<R> {
        if let Some(required) = decl.required {
            rule = rule.required(required);
        }
        if let Some(allow_null) = decl.allow_null {
            rule = rule.allow_null(allow_null);
        }
        if let Some(many) = decl.many {
            rule = rule.many(many);
        }
        if !matches!(decl.kind, FieldType::Date | FieldType::Datetime) {
            if let Some(default) = &decl.default {
                rule.common_mut().default = Some(to_value(default)?);
            }
        }
        for name in &decl.hooks {
            let hook = self
                .hooks
                .get(name)
                .ok_or_else(|| config(format!("unknown hook '{}'", name)))?;
            rule = rule.hook_arc(hook);
        }
        Ok(rule)
    }
}

fn config(reason: String) -> VouchError {
    VouchError::ConfigError { reason }
}

fn int_rule(decl: &FieldDecl) -> VouchResult<IntRule> {
    let mut rule = IntRule::new();
    rule.bounds.gt = decl.gt.as_ref().map(|v| as_int("gt", v)).transpose()?;
    rule.bounds.gte = decl.gte.as_ref().map(|v| as_int("gte", v)).transpose()?;
    rule.bounds.lt = decl.lt.as_ref().map(|v| as_int("lt", v)).transpose()?;
    rule.bounds.lte = decl.lte.as_ref().map(|v| as_int("lte", v)).transpose()?;

    match &decl.enumeration {
        None => {}
        Some(toml::Value::Array(items)) => {
            let members = items.iter().map(|v| as_int("enum", v)).collect::<VouchResult<Vec<_>>>()?;
            rule = rule.enum_members(members);
        }
        Some(toml::Value::Table(table)) => {
            let mut mapping = Vec::with_capacity(table.len());
            for (k, v) in table {
                let key = k
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| config(format!("enum key '{}' is not an integer", k)))?;
                mapping.push((key, to_value(v)?));
            }
            rule = rule.enum_mapping(mapping);
        }
        Some(other) => return Err(config(format!("enum must be an array or table, got {}", other.type_str()))),
    }
    Ok(rule)
}

fn float_rule(decl: &FieldDecl) -> VouchResult<FloatRule> {
    let mut rule = FloatRule::new();
    rule.bounds.gt = decl.gt.as_ref().map(|v| as_float("gt", v)).transpose()?;
    rule.bounds.gte = decl.gte.as_ref().map(|v| as_float("gte", v)).transpose()?;
    rule.bounds.lt = decl.lt.as_ref().map(|v| as_float("lt", v)).transpose()?;
    rule.bounds.lte = decl.lte.as_ref().map(|v| as_float("lte", v)).transpose()?;
    if let Some(digits) = decl.digits {
        rule = rule.digits(digits);
    }
    if let Some(decimal) = decl.decimal {
        rule = rule.decimal(decimal);
    }
    Ok(rule)
}

fn str_rule(decl: &FieldDecl) -> VouchResult<StrRule> {
    let mut rule = StrRule::new();
    rule.min_length = decl.min_length;
    rule.max_length = decl.max_length;

    match (&decl.replace, decl.replace_count) {
        (Some((from, to)), count) => rule = rule.replace_n(from.as_str(), to.as_str(), count),
        (None, Some(_)) => return Err(config("replace_count needs replace".to_string())),
        (None, None) => {}
    }
    rule.capitalize = decl.capitalize;
    rule.title = decl.title;
    rule.swapcase = decl.swapcase;
    rule.lower = decl.lower;
    rule.upper = decl.upper;
    rule.casefold = decl.casefold;

    rule = match (&decl.strip_chars, decl.strip) {
        (Some(chars), _) => rule.strip_chars(chars.as_str()),
        (None, true) => rule.strip(),
        (None, false) => rule,
    };
    rule = match (&decl.lstrip_chars, decl.lstrip) {
        (Some(chars), _) => rule.lstrip_chars(chars.as_str()),
        (None, true) => rule.lstrip(),
        (None, false) => rule,
    };
    rule = match (&decl.rstrip_chars, decl.rstrip) {
        (Some(chars), _) => rule.rstrip_chars(chars.as_str()),
        (None, true) => rule.rstrip(),
        (None, false) => rule,
    };

    rule.starts_with = decl.starts_with.clone();
    rule.ends_with = decl.ends_with.clone();
    rule.contains = decl.contains.clone();
    rule.excludes = decl.excludes.clone();
    for name in &decl.classes {
        let class = CharClass::from_name(name).ok_or_else(|| config(format!("unknown character class '{}'", name)))?;
        rule = rule.char_class(class);
    }

    match (&decl.split, &decl.split_type) {
        (Some(sep), None) => rule = rule.split(sep.as_str())?,
        (Some(sep), Some(target)) => {
            let target =
                ScalarType::from_name(target).ok_or_else(|| config(format!("unknown split_type '{}'", target)))?;
            rule = rule.split_into(sep.as_str(), target)?;
        }
        (None, Some(_)) => return Err(config("split_type needs split".to_string())),
        (None, None) => {}
    }

    if let Some(pattern) = &decl.regex {
        rule = rule.regex(pattern)?;
    }
    match &decl.enumeration {
        None => {}
        Some(toml::Value::Array(items)) => {
            rule = rule.enum_values(items.iter().map(to_value).collect::<VouchResult<Vec<_>>>()?);
        }
        Some(other) => return Err(config(format!("enum must be an array, got {}", other.type_str()))),
    }
    Ok(rule)
}

fn temporal_rule(mut rule: TemporalRule, decl: &FieldDecl) -> VouchResult<TemporalRule> {
    if let Some(fmt) = &decl.fmt {
        rule = rule.fmt(fmt.as_str());
    }
    if let Some(v) = &decl.gt {
        rule = rule.gt(as_temporal(v)?)?;
    }
    if let Some(v) = &decl.gte {
        rule = rule.gte(as_temporal(v)?)?;
    }
    if let Some(v) = &decl.lt {
        rule = rule.lt(as_temporal(v)?)?;
    }
    if let Some(v) = &decl.lte {
        rule = rule.lte(as_temporal(v)?)?;
    }
    if let Some(v) = &decl.default {
        rule = rule.default_value(as_temporal(v)?)?;
    }
    match &decl.enumeration {
        None => {}
        Some(toml::Value::Array(items)) => {
            let entries = items.iter().map(as_temporal).collect::<VouchResult<Vec<_>>>()?;
            rule = rule.enum_values(entries)?;
        }
        Some(other) => return Err(config(format!("enum must be an array, got {}", other.type_str()))),
    }
    Ok(rule)
}

fn as_int(option: &str, v: &toml::Value) -> VouchResult<i64> {
    v.as_integer()
        .ok_or_else(|| config(format!("{} must be an integer, got {}", option, v.type_str())))
}

fn as_float(option: &str, v: &toml::Value) -> VouchResult<f64> {
    match v {
        toml::Value::Float(x) => Ok(*x),
        toml::Value::Integer(i) => Ok(*i as f64),
        other => Err(config(format!("{} must be a number, got {}", option, other.type_str()))),
    }
}

fn as_temporal(v: &toml::Value) -> VouchResult<TemporalInput> {
    TemporalInput::from_value(&to_value(v)?)
}

/// Convert a TOML value into the engine's value model.
pub fn to_value(v: &toml::Value) -> VouchResult<Value> {
    Ok(match v {
        toml::Value::String(s) => Value::Str(s.clone()),
        toml::Value::Integer(i) => Value::Int(*i),
        toml::Value::Float(x) => Value::Float(*x),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Datetime(dt) => {
            let date = dt
                .date
                .as_ref()
                .and_then(|d| NaiveDate::from_ymd_opt(i32::from(d.year), u32::from(d.month), u32::from(d.day)))
                .ok_or_else(|| config(format!("'{}' has no valid calendar date", dt)))?;
            match &dt.time {
                None => Value::Date(date),
                Some(t) => {
                    let time = NaiveTime::from_hms_nano_opt(
                        u32::from(t.hour),
                        u32::from(t.minute),
                        u32::from(t.second),
                        t.nanosecond,
                    )
                    .ok_or_else(|| config(format!("'{}' has no valid time of day", dt)))?;
                    Value::DateTime(date.and_time(time))
                }
            }
        }
        toml::Value::Array(items) => Value::List(items.iter().map(to_value).collect::<VouchResult<Vec<_>>>()?),
        toml::Value::Table(table) => {
            let mut map = Map::new();
            for (k, v) in table {
                map.insert(k.clone(), to_value(v)?);
            }
            Value::Map(map)
        }
    })
}
