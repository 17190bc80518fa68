//! String rule.
//!
//! Every value is stringified, then run through a fixed stage order:
//!
//! 1. length checks (on the stringified input)
//! 2. rewrites: replace, capitalize, title, swapcase, lower, upper, casefold
//! 3. trimming: strip, lstrip, rstrip
//! 4. predicates: prefix, suffix, containment, character classes
//! 5. split, with optional per-element conversion
//! 6. regex, per element after a split
//! 7. enumeration, per element after a split
//!
//! The order is observable: a value that is too short after trimming can still
//! pass the length check.

use std::collections::BTreeSet;

use regex::Regex;
use vouch_contracts::{MessageKey, Value, Violation, VouchError, VouchResult};

use crate::rule::{render_list, Common, Configure};
use crate::traits::Parse;

/// Characters removed by a trim stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharSet {
    Whitespace,
    Chars(String),
}

impl CharSet {
    fn contains(&self, c: char) -> bool {
        match self {
            CharSet::Whitespace => c.is_whitespace(),
            CharSet::Chars(chars) => chars.contains(c),
        }
    }
}

/// Character-class predicates. Checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CharClass {
    Alnum,
    Alpha,
    /// ASCII `0-9` only; digits from other scripts are rejected.
    Decimal,
    Digit,
    Identifier,
    Lower,
    Upper,
    Printable,
    Space,
    Title,
}

const SUPERSCRIPT_DIGITS: &str = "⁰¹²³⁴⁵⁶⁷⁸⁹";

fn is_cased(c: char) -> bool {
    c.is_lowercase() || c.is_uppercase()
}

impl CharClass {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "alnum" => CharClass::Alnum,
            "alpha" => CharClass::Alpha,
            "decimal" => CharClass::Decimal,
            "digit" => CharClass::Digit,
            "identifier" => CharClass::Identifier,
            "lower" => CharClass::Lower,
            "upper" => CharClass::Upper,
            "printable" => CharClass::Printable,
            "space" => CharClass::Space,
            "title" => CharClass::Title,
            _ => return None,
        })
    }

    fn message_key(self) -> MessageKey {
        match self {
            CharClass::Alnum => MessageKey::IsAlnum,
            CharClass::Alpha => MessageKey::IsAlpha,
            CharClass::Decimal => MessageKey::IsDecimal,
            CharClass::Digit => MessageKey::IsDigit,
            CharClass::Identifier => MessageKey::IsIdentifier,
            CharClass::Lower => MessageKey::IsLower,
            CharClass::Upper => MessageKey::IsUpper,
            CharClass::Printable => MessageKey::IsPrintable,
            CharClass::Space => MessageKey::IsSpace,
            CharClass::Title => MessageKey::IsTitle,
        }
    }

    /// Does `s` belong to the class? All classes except `Printable` reject
    /// the empty string.
    pub fn matches(self, s: &str) -> bool {
        let non_empty = !s.is_empty();
        match self {
            CharClass::Alnum => non_empty && s.chars().all(char::is_alphanumeric),
            CharClass::Alpha => non_empty && s.chars().all(char::is_alphabetic),
            CharClass::Decimal => non_empty && s.chars().all(|c| c.is_ascii_digit()),
            CharClass::Digit => {
                non_empty && s.chars().all(|c| c.is_ascii_digit() || SUPERSCRIPT_DIGITS.contains(c))
            }
            CharClass::Identifier => {
                let mut chars = s.chars();
                match chars.next() {
                    Some(first) if first == '_' || first.is_alphabetic() => {
                        chars.all(|c| c == '_' || c.is_alphanumeric())
                    }
                    _ => false,
                }
            }
            CharClass::Lower => s.chars().any(is_cased) && !s.chars().any(char::is_uppercase),
            CharClass::Upper => s.chars().any(is_cased) && !s.chars().any(char::is_lowercase),
            CharClass::Printable => s.chars().all(|c| !c.is_control() && (c == ' ' || !c.is_whitespace())),
            CharClass::Space => non_empty && s.chars().all(char::is_whitespace),
            CharClass::Title => is_title(s),
        }
    }
}

/// Uppercase letters only after uncased characters, lowercase letters only
/// after cased ones, and at least one cased letter.
fn is_title(s: &str) -> bool {
    let mut previous_cased = false;
    let mut any_cased = false;
    for c in s.chars() {
        if c.is_uppercase() {
            if previous_cased {
                return false;
            }
            previous_cased = true;
            any_cased = true;
        } else if c.is_lowercase() {
            if !previous_cased {
                return false;
            }
            previous_cased = true;
            any_cased = true;
        } else {
            previous_cased = false;
        }
    }
    any_cased
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn title(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut previous_cased = false;
    for c in s.chars() {
        if previous_cased {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        previous_cased = is_cased(c);
    }
    out
}

fn swapcase(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_uppercase() {
            out.extend(c.to_lowercase());
        } else if c.is_lowercase() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn casefold(s: &str) -> String {
    s.to_lowercase().replace('ß', "ss").replace('ς', "σ")
}

/// Conversion target for the elements produced by a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Int,
    Float,
    Bool,
    Str,
}

impl ScalarType {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "int" => ScalarType::Int,
            "float" => ScalarType::Float,
            "bool" => ScalarType::Bool,
            "str" => ScalarType::Str,
            _ => return None,
        })
    }

    fn name(self) -> &'static str {
        match self {
            ScalarType::Int => "int",
            ScalarType::Float => "float",
            ScalarType::Bool => "bool",
            ScalarType::Str => "str",
        }
    }

    fn convert(self, key: &str, part: &str) -> VouchResult<Value> {
        let converted = match self {
            ScalarType::Int => part.trim().parse::<i64>().ok().map(Value::Int),
            ScalarType::Float => part.trim().parse::<f64>().ok().map(Value::Float),
            ScalarType::Bool => match part.trim().to_uppercase().as_str() {
                "TRUE" => Some(Value::Bool(true)),
                "FALSE" => Some(Value::Bool(false)),
                _ => None,
            },
            ScalarType::Str => Some(Value::from(part)),
        };
        converted.ok_or_else(|| {
            Violation::with_param(MessageKey::Type, key, &Value::from(part), "type", self.name()).into()
        })
    }
}

/// Substring replacement; `max_count` of `None` replaces every occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replace {
    pub from: String,
    pub to: String,
    pub max_count: Option<usize>,
}

/// A regex anchored at the start of the value.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub source: String,
    compiled: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> VouchResult<Self> {
        let compiled = Regex::new(&format!("^(?:{source})")).map_err(|e| VouchError::ConfigError {
            reason: format!("invalid regex `{source}`: {e}"),
        })?;
        Ok(Self {
            source: source.to_string(),
            compiled,
        })
    }

    pub fn is_match(&self, s: &str) -> bool {
        self.compiled.is_match(s)
    }
}

#[derive(Debug, Clone, Default)]
pub struct StrRule {
    pub common: Common,

    pub min_length: Option<usize>,
    pub max_length: Option<usize>,

    pub replace: Option<Replace>,
    pub capitalize: bool,
    pub title: bool,
    pub swapcase: bool,
    pub lower: bool,
    pub upper: bool,
    pub casefold: bool,

    pub strip: Option<CharSet>,
    pub lstrip: Option<CharSet>,
    pub rstrip: Option<CharSet>,

    pub starts_with: Option<String>,
    pub ends_with: Option<String>,
    pub contains: Option<String>,
    pub excludes: Option<String>,
    pub classes: BTreeSet<CharClass>,

    pub split: Option<(String, Option<ScalarType>)>,
    pub regex: Option<Pattern>,
    pub enumeration: Option<Vec<Value>>,
}

impl StrRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.common.default = Some(value.into());
        self
    }

    pub fn min_length(mut self, n: usize) -> Self {
        self.min_length = Some(n);
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }

    pub fn replace(self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.replace_n(from, to, None)
    }

    pub fn replace_n(mut self, from: impl Into<String>, to: impl Into<String>, max_count: Option<usize>) -> Self {
        self.replace = Some(Replace {
            from: from.into(),
            to: to.into(),
            max_count,
        });
        self
    }

    pub fn capitalize(mut self) -> Self {
        self.capitalize = true;
        self
    }

    pub fn title(mut self) -> Self {
        self.title = true;
        self
    }

    pub fn swapcase(mut self) -> Self {
        self.swapcase = true;
        self
    }

    pub fn lower(mut self) -> Self {
        self.lower = true;
        self
    }

    pub fn upper(mut self) -> Self {
        self.upper = true;
        self
    }

    pub fn casefold(mut self) -> Self {
        self.casefold = true;
        self
    }

    pub fn strip(mut self) -> Self {
        self.strip = Some(CharSet::Whitespace);
        self
    }

    pub fn strip_chars(mut self, chars: impl Into<String>) -> Self {
        self.strip = Some(CharSet::Chars(chars.into()));
        self
    }

    pub fn lstrip(mut self) -> Self {
        self.lstrip = Some(CharSet::Whitespace);
        self
    }

    pub fn lstrip_chars(mut self, chars: impl Into<String>) -> Self {
        self.lstrip = Some(CharSet::Chars(chars.into()));
        self
    }

    pub fn rstrip(mut self) -> Self {
        self.rstrip = Some(CharSet::Whitespace);
        self
    }

    pub fn rstrip_chars(mut self, chars: impl Into<String>) -> Self {
        self.rstrip = Some(CharSet::Chars(chars.into()));
        self
    }

    pub fn starts_with(mut self, prefix: impl Into<String>) -> Self {
        self.starts_with = Some(prefix.into());
        self
    }

    pub fn ends_with(mut self, suffix: impl Into<String>) -> Self {
        self.ends_with = Some(suffix.into());
        self
    }

    pub fn contains(mut self, needle: impl Into<String>) -> Self {
        self.contains = Some(needle.into());
        self
    }

    pub fn excludes(mut self, needle: impl Into<String>) -> Self {
        self.excludes = Some(needle.into());
        self
    }

    pub fn char_class(mut self, class: CharClass) -> Self {
        self.classes.insert(class);
        self
    }

    pub fn split(self, separator: impl Into<String>) -> VouchResult<Self> {
        self.split_with(separator, None)
    }

    pub fn split_into(self, separator: impl Into<String>, target: ScalarType) -> VouchResult<Self> {
        self.split_with(separator, Some(target))
    }

    fn split_with(mut self, separator: impl Into<String>, target: Option<ScalarType>) -> VouchResult<Self> {
        let separator = separator.into();
        if separator.is_empty() {
            return Err(VouchError::ConfigError {
                reason: "split separator must not be empty".to_string(),
            });
        }
        self.split = Some((separator, target));
        Ok(self)
    }

    pub fn regex(mut self, pattern: &str) -> VouchResult<Self> {
        self.regex = Some(Pattern::new(pattern)?);
        Ok(self)
    }

    pub fn enum_values<V: Into<Value>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.enumeration = Some(values.into_iter().map(Into::into).collect());
        self
    }

    fn check_length(&self, key: &str, s: &str) -> VouchResult<()> {
        let length = s.chars().count();
        if let Some(min) = self.min_length {
            if length < min {
                return Err(Violation::with_param(MessageKey::MinLength, key, &Value::from(s), "min_length", min).into());
            }
        }
        if let Some(max) = self.max_length {
            if length > max {
                return Err(Violation::with_param(MessageKey::MaxLength, key, &Value::from(s), "max_length", max).into());
            }
        }
        Ok(())
    }

    fn rewrite(&self, mut s: String) -> String {
        if let Some(r) = &self.replace {
            s = match r.max_count {
                Some(n) => s.replacen(r.from.as_str(), &r.to, n),
                None => s.replace(r.from.as_str(), &r.to),
            };
        }
        if self.capitalize {
            s = capitalize(&s);
        }
        if self.title {
            s = title(&s);
        }
        if self.swapcase {
            s = swapcase(&s);
        }
        if self.lower {
            s = s.to_lowercase();
        }
        if self.upper {
            s = s.to_uppercase();
        }
        if self.casefold {
            s = casefold(&s);
        }
        s
    }

    fn trim(&self, s: String) -> String {
        let mut out = s.as_str();
        if let Some(set) = &self.strip {
            out = out.trim_matches(|c: char| set.contains(c));
        }
        if let Some(set) = &self.lstrip {
            out = out.trim_start_matches(|c: char| set.contains(c));
        }
        if let Some(set) = &self.rstrip {
            out = out.trim_end_matches(|c: char| set.contains(c));
        }
        out.to_string()
    }

    fn check_predicates(&self, key: &str, s: &str) -> VouchResult<()> {
        let fail = |message_key, param: &str, param_value: &str| -> VouchError {
            Violation::with_param(message_key, key, &Value::from(s), param, param_value).into()
        };
        if let Some(prefix) = &self.starts_with {
            if !s.starts_with(prefix.as_str()) {
                return Err(fail(MessageKey::StartsWith, "starts_with", prefix.as_str()));
            }
        }
        if let Some(suffix) = &self.ends_with {
            if !s.ends_with(suffix.as_str()) {
                return Err(fail(MessageKey::EndsWith, "ends_with", suffix.as_str()));
            }
        }
        if let Some(needle) = &self.contains {
            if !s.contains(needle.as_str()) {
                return Err(fail(MessageKey::Contains, "contains", needle.as_str()));
            }
        }
        if let Some(needle) = &self.excludes {
            if s.contains(needle.as_str()) {
                return Err(fail(MessageKey::Excludes, "excludes", needle.as_str()));
            }
        }
        for class in &self.classes {
            if !class.matches(s) {
                return Err(Violation::new(class.message_key(), key, &Value::from(s)).into());
            }
        }
        Ok(())
    }

    fn check_element(&self, key: &str, element: Value) -> VouchResult<Value> {
        if let Some(pattern) = &self.regex {
            let text = element.to_string();
            if !pattern.is_match(&text) {
                return Err(
                    Violation::with_param(MessageKey::Regex, key, &element, "regex", &pattern.source).into(),
                );
            }
        }
        if let Some(allowed) = &self.enumeration {
            if !allowed.contains(&element) {
                return Err(
                    Violation::with_param(MessageKey::Enum, key, &element, "enum", render_list(allowed)).into(),
                );
            }
        }
        Ok(element)
    }
}

impl Configure for StrRule {
    fn common_mut(&mut self) -> &mut Common {
        &mut self.common
    }
}

impl Parse for StrRule {
    fn common(&self) -> &Common {
        &self.common
    }

    fn parse(&self, key: &str, value: Value) -> VouchResult<Value> {
        let s = match value {
            Value::Str(s) => s,
            other => other.to_string(),
        };

        self.check_length(key, &s)?;
        let s = self.trim(self.rewrite(s));
        self.check_predicates(key, &s)?;

        match &self.split {
            Some((separator, target)) => {
                let elements = s
                    .split(separator.as_str())
                    .map(|part| match target {
                        Some(t) => t.convert(key, part),
                        None => Ok(Value::from(part)),
                    })
                    .collect::<VouchResult<Vec<_>>>()?;
                let checked = elements
                    .into_iter()
                    .map(|e| self.check_element(key, e))
                    .collect::<VouchResult<Vec<_>>>()?;
                Ok(Value::List(checked))
            }
            None => self.check_element(key, Value::Str(s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use vouch_contracts::ViolationKind;

    use super::*;

    fn parse(rule: &StrRule, input: impl Into<Value>) -> VouchResult<Value> {
        rule.parse("s", input.into())
    }

    #[test]
    fn stringifies_non_string_input() {
        assert_eq!(parse(&StrRule::new(), 42).unwrap(), Value::from("42"));
        assert_eq!(parse(&StrRule::new(), 1.5).unwrap(), Value::from("1.5"));
        // Booleans render the way JSON spells them.
        assert_eq!(parse(&StrRule::new(), true).unwrap(), Value::from("true"));
    }

    #[test]
    fn length_is_checked_before_trimming() {
        let rule = StrRule::new().strip().upper().min_length(3);

        // Five characters before trimming, two after.
        assert_eq!(parse(&rule, "  ab ").unwrap(), Value::from("AB"));

        let err = parse(&rule, "ab").unwrap_err();
        assert_eq!(err.kind(), Some(ViolationKind::LengthViolation));
        assert_eq!(err.violation().unwrap().param, Some(("min_length".to_string(), "3".to_string())));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let rule = StrRule::new().max_length(2);
        assert!(parse(&rule, "日本").is_ok());
        assert!(parse(&rule, "日本語").is_err());
    }

    #[test]
    fn rewrites_apply_in_fixed_order() {
        let rule = StrRule::new().replace("-", " ").title();
        assert_eq!(parse(&rule, "hello-big world").unwrap(), Value::from("Hello Big World"));

        let rule = StrRule::new().replace_n("a", "b", Some(1));
        assert_eq!(parse(&rule, "aaa").unwrap(), Value::from("baa"));

        assert_eq!(parse(&StrRule::new().capitalize(), "hELLO").unwrap(), Value::from("Hello"));
        assert_eq!(parse(&StrRule::new().swapcase(), "aBc").unwrap(), Value::from("AbC"));
        assert_eq!(parse(&StrRule::new().casefold(), "Straße").unwrap(), Value::from("strasse"));
    }

    #[test]
    fn trims_custom_character_sets() {
        let rule = StrRule::new().strip_chars("x").rstrip_chars("!");
        assert_eq!(parse(&rule, "xxhi!x").unwrap(), Value::from("hi"));
        assert_eq!(parse(&StrRule::new().lstrip(), "  a ").unwrap(), Value::from("a "));
    }

    #[test]
    fn containment_predicates() {
        let rule = StrRule::new().contains("@").excludes(" ");
        assert!(parse(&rule, "a@b").is_ok());

        let err = parse(&rule, "ab").unwrap_err();
        assert_eq!(err.violation().unwrap().message_key, MessageKey::Contains);

        let err = parse(&rule, "a @b").unwrap_err();
        assert_eq!(err.violation().unwrap().message_key, MessageKey::Excludes);
    }

    #[test]
    fn prefix_and_suffix() {
        let rule = StrRule::new().starts_with("ab").ends_with("yz");
        assert!(parse(&rule, "abcxyz").is_ok());
        let err = parse(&rule, "xbcxyz").unwrap_err();
        assert_eq!(err.kind(), Some(ViolationKind::PatternMismatch));
        assert_eq!(err.violation().unwrap().param, Some(("starts_with".to_string(), "ab".to_string())));
    }

    #[test]
    fn character_classes() {
        assert!(CharClass::Alnum.matches("abc123"));
        assert!(!CharClass::Alnum.matches("abc 123"));
        assert!(!CharClass::Alpha.matches(""));
        assert!(CharClass::Digit.matches("12²"));
        assert!(!CharClass::Decimal.matches("12²"));
        assert!(!CharClass::Decimal.matches("١٢"));
        assert!(CharClass::Identifier.matches("_snake_case1"));
        assert!(!CharClass::Identifier.matches("1abc"));
        assert!(CharClass::Lower.matches("abc 1"));
        assert!(!CharClass::Lower.matches("123"));
        assert!(CharClass::Upper.matches("ABC-1"));
        assert!(CharClass::Printable.matches(""));
        assert!(!CharClass::Printable.matches("a\tb"));
        assert!(CharClass::Space.matches(" \t"));
        assert!(CharClass::Title.matches("Hello World"));
        assert!(!CharClass::Title.matches("Hello world"));
        assert!(!CharClass::Title.matches("123"));
    }

    #[test]
    fn first_failing_class_is_reported() {
        let rule = StrRule::new().char_class(CharClass::Upper).char_class(CharClass::Alpha);
        let err = parse(&rule, "ab1").unwrap_err();
        assert_eq!(err.violation().unwrap().message_key, MessageKey::IsAlpha);
    }

    #[test]
    fn split_converts_each_element() {
        let rule = StrRule::new().split_into(",", ScalarType::Int).unwrap();
        assert_eq!(
            parse(&rule, "1, 2,3").unwrap(),
            Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );

        let err = parse(&rule, "1,x").unwrap_err();
        assert_eq!(err.kind(), Some(ViolationKind::TypeMismatch));
        assert_eq!(err.violation().unwrap().value, Value::from("x"));
    }

    #[test]
    fn empty_separator_is_a_config_error() {
        match StrRule::new().split("") {
            Err(VouchError::ConfigError { .. }) => {}
            other => panic!("expected ConfigError, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn regex_matches_from_the_start() {
        let rule = StrRule::new().regex(r"\d+").unwrap();
        assert!(parse(&rule, "123abc").is_ok());

        let err = parse(&rule, "abc123").unwrap_err();
        assert_eq!(err.kind(), Some(ViolationKind::PatternMismatch));
        assert_eq!(err.violation().unwrap().param, Some(("regex".to_string(), r"\d+".to_string())));
    }

    #[test]
    fn invalid_regex_is_a_config_error() {
        assert!(matches!(StrRule::new().regex("("), Err(VouchError::ConfigError { .. })));
    }

    #[test]
    fn regex_and_enum_apply_per_element_after_split() {
        let rule = StrRule::new()
            .split("|")
            .unwrap()
            .regex("[a-z]+$")
            .unwrap()
            .enum_values(["red", "green"]);
        assert_eq!(
            parse(&rule, "red|green").unwrap(),
            Value::List(vec![Value::from("red"), Value::from("green")])
        );

        let err = parse(&rule, "red|Blue").unwrap_err();
        assert_eq!(err.violation().unwrap().value, Value::from("Blue"));
        assert_eq!(err.kind(), Some(ViolationKind::PatternMismatch));

        let err = parse(&rule, "red|blue").unwrap_err();
        assert_eq!(err.kind(), Some(ViolationKind::EnumViolation));
    }

    #[test]
    fn upper_is_idempotent() {
        let rule = StrRule::new().upper();
        let once = parse(&rule, "MiXed").unwrap();
        let twice = parse(&rule, once.clone()).unwrap();
        assert_eq!(once, twice);
    }
}
