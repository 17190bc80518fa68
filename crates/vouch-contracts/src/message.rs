//! Message templates for violation reports.
//!
//! Every `Violation` renders its human-readable message through the
//! process-wide [`MessageCatalog`]. The catalog is read-mostly: lookups clone
//! an `Arc` to the current catalog, and [`install`] replaces the whole catalog
//! at once. Individual templates are never edited in place, so a validation
//! running concurrently with a swap sees either the old or the new catalog,
//! never a mix.
//!
//! Templates use `{name}` placeholders. Every template may reference `{key}`
//! and `{value}`; constraint templates also reference the constraint name,
//! e.g. `{gt}`, `{min_length}`, `{enum}`, `{region}`, `{type}`.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use crate::error::{VouchError, VouchResult, ViolationKind};

/// Identifies one message template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    Email,
    Phone,
    Ipv4,
    Ipv6,
    Url,
    Required,
    AllowNull,
    Many,
    Multi,
    /// A nested object rule received a non-object value.
    Dict,
    Enum,
    Gt,
    Gte,
    Lt,
    Lte,
    Type,
    Convert,
    MinLength,
    MaxLength,
    StartsWith,
    EndsWith,
    Contains,
    Excludes,
    IsAlnum,
    IsAlpha,
    IsDecimal,
    IsDigit,
    IsIdentifier,
    IsLower,
    IsUpper,
    IsPrintable,
    IsSpace,
    IsTitle,
    Regex,
}

impl MessageKey {
    pub const ALL: [MessageKey; 34] = [
        MessageKey::Email,
        MessageKey::Phone,
        MessageKey::Ipv4,
        MessageKey::Ipv6,
        MessageKey::Url,
        MessageKey::Required,
        MessageKey::AllowNull,
        MessageKey::Many,
        MessageKey::Multi,
        MessageKey::Dict,
        MessageKey::Enum,
        MessageKey::Gt,
        MessageKey::Gte,
        MessageKey::Lt,
        MessageKey::Lte,
        MessageKey::Type,
        MessageKey::Convert,
        MessageKey::MinLength,
        MessageKey::MaxLength,
        MessageKey::StartsWith,
        MessageKey::EndsWith,
        MessageKey::Contains,
        MessageKey::Excludes,
        MessageKey::IsAlnum,
        MessageKey::IsAlpha,
        MessageKey::IsDecimal,
        MessageKey::IsDigit,
        MessageKey::IsIdentifier,
        MessageKey::IsLower,
        MessageKey::IsUpper,
        MessageKey::IsPrintable,
        MessageKey::IsSpace,
        MessageKey::IsTitle,
        MessageKey::Regex,
    ];

    /// The snake_case name used in catalog files.
    pub fn name(self) -> &'static str {
        match self {
            MessageKey::Email => "email",
            MessageKey::Phone => "phone",
            MessageKey::Ipv4 => "ipv4",
            MessageKey::Ipv6 => "ipv6",
            MessageKey::Url => "url",
            MessageKey::Required => "required",
            MessageKey::AllowNull => "allow_null",
            MessageKey::Many => "many",
            MessageKey::Multi => "multi",
            MessageKey::Dict => "dict",
            MessageKey::Enum => "enum",
            MessageKey::Gt => "gt",
            MessageKey::Gte => "gte",
            MessageKey::Lt => "lt",
            MessageKey::Lte => "lte",
            MessageKey::Type => "type",
            MessageKey::Convert => "convert",
            MessageKey::MinLength => "min_length",
            MessageKey::MaxLength => "max_length",
            MessageKey::StartsWith => "starts_with",
            MessageKey::EndsWith => "ends_with",
            MessageKey::Contains => "contains",
            MessageKey::Excludes => "excludes",
            MessageKey::IsAlnum => "is_alnum",
            MessageKey::IsAlpha => "is_alpha",
            MessageKey::IsDecimal => "is_decimal",
            MessageKey::IsDigit => "is_digit",
            MessageKey::IsIdentifier => "is_identifier",
            MessageKey::IsLower => "is_lower",
            MessageKey::IsUpper => "is_upper",
            MessageKey::IsPrintable => "is_printable",
            MessageKey::IsSpace => "is_space",
            MessageKey::IsTitle => "is_title",
            MessageKey::Regex => "regex",
        }
    }

    pub fn from_name(name: &str) -> Option<MessageKey> {
        MessageKey::ALL.into_iter().find(|k| k.name() == name)
    }

    /// The taxonomy entry a violation rendered with this template belongs to.
    pub fn kind(self) -> ViolationKind {
        match self {
            MessageKey::Email
            | MessageKey::Phone
            | MessageKey::Ipv4
            | MessageKey::Ipv6
            | MessageKey::Url => ViolationKind::FormatViolation,
            MessageKey::Required => ViolationKind::MissingRequired,
            MessageKey::AllowNull => ViolationKind::NullNotAllowed,
            MessageKey::Many => ViolationKind::ExpectedArray,
            MessageKey::Multi | MessageKey::Dict => ViolationKind::ContainerTypeMismatch,
            MessageKey::Enum => ViolationKind::EnumViolation,
            MessageKey::Gt | MessageKey::Gte | MessageKey::Lt | MessageKey::Lte => {
                ViolationKind::RangeViolation
            }
            MessageKey::Type => ViolationKind::TypeMismatch,
            MessageKey::Convert => ViolationKind::BooleanConversionError,
            MessageKey::MinLength | MessageKey::MaxLength => ViolationKind::LengthViolation,
            MessageKey::StartsWith
            | MessageKey::EndsWith
            | MessageKey::Contains
            | MessageKey::Excludes
            | MessageKey::IsAlnum
            | MessageKey::IsAlpha
            | MessageKey::IsDecimal
            | MessageKey::IsDigit
            | MessageKey::IsIdentifier
            | MessageKey::IsLower
            | MessageKey::IsUpper
            | MessageKey::IsPrintable
            | MessageKey::IsSpace
            | MessageKey::IsTitle
            | MessageKey::Regex => ViolationKind::PatternMismatch,
        }
    }
}

const ENGLISH: [(MessageKey, &str); 34] = [
    (MessageKey::Email, "The value `{value}` for `{key}` is not in email format."),
    (MessageKey::Phone, "The value `{value}` for `{key}` is not a phone number for region `{region}`."),
    (MessageKey::Ipv4, "The value `{value}` for `{key}` is not in IPv4 address format."),
    (MessageKey::Ipv6, "The value `{value}` for `{key}` is not in IPv6 address format."),
    (MessageKey::Url, "The value `{value}` for `{key}` is not in URL address format."),
    (MessageKey::Required, "`{key}` is required."),
    (MessageKey::AllowNull, "`{key}` cannot be empty."),
    (MessageKey::Many, "Validation data must be an array."),
    (MessageKey::Multi, "`{key}` must be an array."),
    (MessageKey::Dict, "`{key}` must be an object."),
    (MessageKey::Enum, "The value `{value}` of `{key}` is not in the allowed values: `{enum}`."),
    (MessageKey::Gt, "The value `{value}` of `{key}` must be greater than `{gt}`."),
    (MessageKey::Gte, "The value `{value}` of `{key}` must be greater than or equal to `{gte}`."),
    (MessageKey::Lt, "The value `{value}` of `{key}` must be less than `{lt}`."),
    (MessageKey::Lte, "The value `{value}` of `{key}` must be less than or equal to `{lte}`."),
    (MessageKey::Type, "The value `{value}` of `{key}` cannot be converted to type `{type}`."),
    (MessageKey::Convert, "The value `{value}` of `{key}` cannot be converted to boolean type."),
    (MessageKey::MinLength, "The length of `{value}` for `{key}` must not be less than `{min_length}`."),
    (MessageKey::MaxLength, "The length of `{value}` for `{key}` must not exceed `{max_length}`."),
    (MessageKey::StartsWith, "The value `{value}` for `{key}` must start with the string `{starts_with}`."),
    (MessageKey::EndsWith, "The value `{value}` for `{key}` must end with the string `{ends_with}`."),
    (MessageKey::Contains, "The value `{value}` for `{key}` must include the string `{contains}`."),
    (MessageKey::Excludes, "The value `{value}` for `{key}` must not include the string `{excludes}`."),
    (MessageKey::IsAlnum, "The value `{value}` for `{key}` must consist of letters and numbers."),
    (MessageKey::IsAlpha, "The value `{value}` for `{key}` must consist of letters."),
    (MessageKey::IsDecimal, "The value `{value}` for `{key}` must consist of decimal numbers."),
    (MessageKey::IsDigit, "The value `{value}` for `{key}` must consist of digits."),
    (MessageKey::IsIdentifier, "The value `{value}` for `{key}` must be a valid identifier."),
    (MessageKey::IsLower, "The alphabetical part of `{value}` for `{key}` must be all in lowercase."),
    (MessageKey::IsUpper, "The alphabetical part of `{value}` for `{key}` must be all in uppercase."),
    (MessageKey::IsPrintable, "The value `{value}` for `{key}` must be entirely printable."),
    (MessageKey::IsSpace, "The value `{value}` for `{key}` must consist of whitespace characters."),
    (MessageKey::IsTitle, "The value `{value}` for `{key}` must be in title case."),
    (MessageKey::Regex, "The value `{value}` of `{key}` does not satisfy the regular rule `{regex}`."),
];

const CHINESE: [(MessageKey, &str); 34] = [
    (MessageKey::Email, "`{key}` 的值 `{value}` 不是邮箱格式。"),
    (MessageKey::Phone, "`{key}` 的值 `{value}` 不是 `{region}` 地区的电话号码格式。"),
    (MessageKey::Ipv4, "`{key}` 的值 `{value}` 不是ipv4地址格式。"),
    (MessageKey::Ipv6, "`{key}` 的值 `{value}` 不是ipv6地址格式。"),
    (MessageKey::Url, "`{key}` 的值 `{value}` 不是链接地址格式。"),
    (MessageKey::Required, "`{key}` 是必须的。"),
    (MessageKey::AllowNull, "`{key}` 不能为空。"),
    (MessageKey::Many, "校验数据必须是数组。"),
    (MessageKey::Multi, "`{key}` 必须是数组。"),
    (MessageKey::Dict, "`{key}` 必须是对象。"),
    (MessageKey::Enum, "`{key}` 的值 `{value}` 不在 `{enum}` 中。"),
    (MessageKey::Gt, "`{key}` 的值 `{value}` 必须大于 `{gt}` 。"),
    (MessageKey::Gte, "`{key}` 的值 `{value}` 必须大于等于 `{gte}` 。"),
    (MessageKey::Lt, "`{key}` 的值 `{value}` 必须小于 `{lt}` 。"),
    (MessageKey::Lte, "`{key}` 的值 `{value}` 必须小于等于 `{lte}` 。"),
    (MessageKey::Type, "`{key}` 的值 `{value}` 无法转化为 `{type}` 类型。"),
    (MessageKey::Convert, "`{key}` 的值 `{value}` 不能转化为布尔类型。"),
    (MessageKey::MinLength, "`{key}` 的值 `{value}` 的长度不能小于 `{min_length}`。"),
    (MessageKey::MaxLength, "`{key}` 的值 `{value}` 的长度不能大于 `{max_length}`。"),
    (MessageKey::StartsWith, "`{key}` 的值 `{value}` 必须以 `{starts_with}` 字符串开头。"),
    (MessageKey::EndsWith, "`{key}` 的值 `{value}` 必须以 `{ends_with}` 字符串结尾。"),
    (MessageKey::Contains, "`{key}` 的值 `{value}` 中必须包括 `{contains}` 字符串。"),
    (MessageKey::Excludes, "`{key}` 的值 `{value}` 中不能包括 `{excludes}` 字符串。"),
    (MessageKey::IsAlnum, "`{key}` 的值 `{value}` 必须由字母和数字组成。"),
    (MessageKey::IsAlpha, "`{key}` 的值 `{value}` 必须由字母组成。"),
    (MessageKey::IsDecimal, "`{key}` 的值 `{value}` 必须由十进制数字组成。"),
    (MessageKey::IsDigit, "`{key}` 的值 `{value}` 必须由数字组成。"),
    (MessageKey::IsIdentifier, "`{key}` 的值 `{value}` 必须是合法的标识符。"),
    (MessageKey::IsLower, "`{key}` 的值 `{value}` 字母部分必须全是小写。"),
    (MessageKey::IsUpper, "`{key}` 的值 `{value}` 字母部分必须全是大写。"),
    (MessageKey::IsPrintable, "`{key}` 的值 `{value}` 必须全部可打印。"),
    (MessageKey::IsSpace, "`{key}` 的值 `{value}` 必须由空白字符组成。"),
    (MessageKey::IsTitle, "`{key}` 的值 `{value}` 必须是标题化的。"),
    (MessageKey::Regex, "`{key}` 的值 `{value}` 不满足正则规则 `{regex}`。"),
];

/// A complete set of message templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageCatalog {
    templates: HashMap<MessageKey, String>,
}

impl MessageCatalog {
    /// The default catalog.
    pub fn english() -> Self {
        Self::from_table(&ENGLISH)
    }

    pub fn chinese() -> Self {
        Self::from_table(&CHINESE)
    }

    fn from_table(table: &[(MessageKey, &str)]) -> Self {
        Self {
            templates: table.iter().map(|(k, t)| (*k, (*t).to_string())).collect(),
        }
    }

    /// Parse a TOML table of `name = "template"` entries.
    ///
    /// Entries overlay the English catalog, so a file only needs the
    /// templates it changes. Unknown names are rejected.
    ///
    /// ```toml
    /// required = "{key} must be supplied"
    /// gt = "{key} is too small (needs > {gt})"
    /// ```
    pub fn from_toml_str(s: &str) -> VouchResult<Self> {
        Self::english().overlay_toml_str(s)
    }

    /// Replace the templates named in a TOML table, keeping the rest.
    pub fn overlay_toml_str(mut self, s: &str) -> VouchResult<Self> {
        let entries: BTreeMap<String, String> =
            toml::from_str(s).map_err(|e| VouchError::ConfigError {
                reason: format!("failed to parse message catalog TOML: {e}"),
            })?;

        for (name, template) in entries {
            let key = MessageKey::from_name(&name).ok_or_else(|| VouchError::ConfigError {
                reason: format!("unknown message template '{name}'"),
            })?;
            self.templates.insert(key, template);
        }
        Ok(self)
    }

    pub fn from_file(path: &Path) -> VouchResult<Self> {
        Self::english().overlay_file(path)
    }

    /// Read a TOML table of templates from `path` and overlay it.
    pub fn overlay_file(self, path: &Path) -> VouchResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| VouchError::ConfigError {
            reason: format!("failed to read message catalog '{}': {}", path.display(), e),
        })?;
        self.overlay_toml_str(&contents)
    }

    /// Return a copy of this catalog with one template replaced.
    pub fn with_template(mut self, key: MessageKey, template: impl Into<String>) -> Self {
        self.templates.insert(key, template.into());
        self
    }

    pub fn template(&self, key: MessageKey) -> &str {
        self.templates.get(&key).map(String::as_str).unwrap_or_default()
    }

    /// All templates keyed by their catalog name, in name order.
    pub fn entries(&self) -> BTreeMap<&'static str, &str> {
        self.templates.iter().map(|(k, t)| (k.name(), t.as_str())).collect()
    }

    /// Substitute `{name}` placeholders in the template for `key`.
    ///
    /// Placeholders without a matching argument are left as written.
    pub fn render(&self, key: MessageKey, args: &[(&str, &str)]) -> String {
        let template = self.template(key);
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) => {
                    let name = &after[..close];
                    match args.iter().find(|(n, _)| *n == name) {
                        Some((_, v)) => out.push_str(v),
                        None => {
                            out.push('{');
                            out.push_str(name);
                            out.push('}');
                        }
                    }
                    rest = &after[close + 1..];
                }
                None => {
                    out.push_str(&rest[open..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self::english()
    }
}

// ── Process-wide catalog ──────────────────────────────────────────────────────

static CATALOG: LazyLock<RwLock<Arc<MessageCatalog>>> =
    LazyLock::new(|| RwLock::new(Arc::new(MessageCatalog::english())));

/// The catalog currently used to render violations.
pub fn current() -> Arc<MessageCatalog> {
    let guard = CATALOG.read().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(&guard)
}

/// Replace the process-wide catalog.
pub fn install(catalog: MessageCatalog) {
    let mut guard = CATALOG.write().unwrap_or_else(PoisonError::into_inner);
    *guard = Arc::new(catalog);
}
