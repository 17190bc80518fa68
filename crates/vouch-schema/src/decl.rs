//! Field declaration types for schema files.
//!
//! A `SchemaDoc` is deserialized from TOML and holds an ordered list of
//! `FieldDecl`s. Declaration order is validation order, and therefore decides
//! which violation is reported first.

use serde::{Deserialize, Serialize};

/// The rule kind a field declares, written as `type = "..."` in TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Bool,
    Int,
    Float,
    Str,
    Date,
    Datetime,
    Email,
    Ipv4,
    Ipv6,
    Phone,
    Url,
    Dict,
    List,
}

impl FieldType {
    pub fn name(self) -> &'static str {
        match self {
            FieldType::Bool => "bool",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Str => "str",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
            FieldType::Email => "email",
            FieldType::Ipv4 => "ipv4",
            FieldType::Ipv6 => "ipv6",
            FieldType::Phone => "phone",
            FieldType::Url => "url",
            FieldType::Dict => "dict",
            FieldType::List => "list",
        }
    }

    pub fn is_nested(self) -> bool {
        matches!(self, FieldType::Dict | FieldType::List)
    }

    pub fn has_bounds(self) -> bool {
        matches!(
            self,
            FieldType::Int | FieldType::Float | FieldType::Date | FieldType::Datetime
        )
    }
}

/// One field of a schema file.
///
/// Every option of every rule kind lives on this flat struct; options that
/// do not apply to `kind` are rejected when the schema is compiled.
///
/// Example:
/// ```toml
/// [[fields]]
/// name = "tags"
/// type = "str"
/// split = ","
/// strip = true
/// enum = ["red", "green"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDecl {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: FieldType,

    // ── Shared ──
    pub required: Option<bool>,
    pub allow_null: Option<bool>,
    /// Scalar-array mode.
    pub many: Option<bool>,
    pub default: Option<toml::Value>,
    /// Names of hooks registered with the loader's `HookRegistry`.
    #[serde(default)]
    pub hooks: Vec<String>,

    // ── Ranges and enumerations ──
    pub gt: Option<toml::Value>,
    pub gte: Option<toml::Value>,
    pub lt: Option<toml::Value>,
    pub lte: Option<toml::Value>,
    /// A list of members, or for `int` a table mapping keys to outputs.
    #[serde(rename = "enum")]
    pub enumeration: Option<toml::Value>,

    // ── bool ──
    pub convert: Option<bool>,

    // ── float ──
    pub digits: Option<u32>,
    pub decimal: Option<bool>,

    // ── str ──
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    /// `[from, to]`.
    pub replace: Option<(String, String)>,
    pub replace_count: Option<usize>,
    #[serde(default)]
    pub capitalize: bool,
    #[serde(default)]
    pub title: bool,
    #[serde(default)]
    pub swapcase: bool,
    #[serde(default)]
    pub lower: bool,
    #[serde(default)]
    pub upper: bool,
    #[serde(default)]
    pub casefold: bool,
    #[serde(default)]
    pub strip: bool,
    pub strip_chars: Option<String>,
    #[serde(default)]
    pub lstrip: bool,
    pub lstrip_chars: Option<String>,
    #[serde(default)]
    pub rstrip: bool,
    pub rstrip_chars: Option<String>,
    pub starts_with: Option<String>,
    pub ends_with: Option<String>,
    pub contains: Option<String>,
    pub excludes: Option<String>,
    /// Character classes, e.g. `["alnum", "lower"]`.
    #[serde(default)]
    pub classes: Vec<String>,
    pub split: Option<String>,
    /// Element type after a split: `int`, `float`, `bool` or `str`.
    pub split_type: Option<String>,
    pub regex: Option<String>,

    // ── date / datetime ──
    pub fmt: Option<String>,

    // ── phone ──
    pub region: Option<String>,

    // ── dict / list ──
    #[serde(default)]
    pub passthrough: bool,
    #[serde(default)]
    pub schema: Vec<FieldDecl>,
}

impl FieldDecl {
    /// Names of the string-only options that are set.
    pub(crate) fn string_options(&self) -> Vec<&'static str> {
        let flags = [
            ("min_length", self.min_length.is_some()),
            ("max_length", self.max_length.is_some()),
            ("replace", self.replace.is_some() || self.replace_count.is_some()),
            ("capitalize", self.capitalize),
            ("title", self.title),
            ("swapcase", self.swapcase),
            ("lower", self.lower),
            ("upper", self.upper),
            ("casefold", self.casefold),
            ("strip", self.strip || self.strip_chars.is_some()),
            ("lstrip", self.lstrip || self.lstrip_chars.is_some()),
            ("rstrip", self.rstrip || self.rstrip_chars.is_some()),
            ("starts_with", self.starts_with.is_some()),
            ("ends_with", self.ends_with.is_some()),
            ("contains", self.contains.is_some()),
            ("excludes", self.excludes.is_some()),
            ("classes", !self.classes.is_empty()),
            ("split", self.split.is_some() || self.split_type.is_some()),
            ("regex", self.regex.is_some()),
        ];
        flags.iter().filter(|(_, set)| *set).map(|(name, _)| *name).collect()
    }

    /// Names of every option set that `kind` does not understand.
    pub(crate) fn misplaced_options(&self, kind: FieldType) -> Vec<&'static str> {
        let mut misplaced = Vec::new();
        if kind != FieldType::Str {
            misplaced.extend(self.string_options());
        }
        if !kind.has_bounds() {
            for (name, set) in [
                ("gt", self.gt.is_some()),
                ("gte", self.gte.is_some()),
                ("lt", self.lt.is_some()),
                ("lte", self.lte.is_some()),
            ] {
                if set {
                    misplaced.push(name);
                }
            }
        }
        let enum_kinds = matches!(
            kind,
            FieldType::Int | FieldType::Str | FieldType::Date | FieldType::Datetime
        );
        if !enum_kinds && self.enumeration.is_some() {
            misplaced.push("enum");
        }
        if kind != FieldType::Bool && self.convert.is_some() {
            misplaced.push("convert");
        }
        if kind != FieldType::Float {
            if self.digits.is_some() {
                misplaced.push("digits");
            }
            if self.decimal.is_some() {
                misplaced.push("decimal");
            }
        }
        if !matches!(kind, FieldType::Date | FieldType::Datetime) && self.fmt.is_some() {
            misplaced.push("fmt");
        }
        if kind != FieldType::Phone && self.region.is_some() {
            misplaced.push("region");
        }
        if kind.is_nested() {
            if self.many.is_some() {
                misplaced.push("many");
            }
            if !self.hooks.is_empty() {
                misplaced.push("hooks");
            }
        } else {
            if self.passthrough {
                misplaced.push("passthrough");
            }
            if !self.schema.is_empty() {
                misplaced.push("schema");
            }
        }
        misplaced
    }
}

/// The top-level structure of a schema file.
///
/// Example:
/// ```toml
/// [[fields]]
/// name = "age"
/// type = "int"
/// required = true
/// gte = 0
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDoc {
    /// Ordered field declarations.
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
}
