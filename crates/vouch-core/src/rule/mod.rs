//! Rule records and the ordered rule mapping.
//!
//! A `Rule` is the frozen configuration for one field. The set of rule kinds
//! is closed; the verifier dispatches on the variant with an exhaustive
//! `match`. Records are built once with consuming builder methods, and every
//! normalization (regex compilation, temporal bounds) happens inside those
//! builders, so a finished record is never mutated by a validation call and
//! can be shared across threads.

pub mod boolean;
pub mod format;
pub mod nested;
pub mod number;
pub mod string;
pub mod temporal;

use std::fmt;
use std::sync::Arc;

use vouch_contracts::{MessageKey, Value, Violation, VouchResult};

pub use boolean::BoolRule;
pub use format::{Format, FormatRule, PhoneRule};
pub use nested::NestedRule;
pub use number::{FloatRule, IntEnum, IntRule};
pub use string::{CharClass, CharSet, ScalarType, StrRule};
pub use temporal::{Precision, TemporalInput, TemporalRule};

/// A post-processing hook, applied after the type-specific parser.
///
/// Receives the field key and the parsed value; returns the value handed to
/// the next hook (or stored in the output).
pub type Hook = Arc<dyn Fn(&str, Value) -> VouchResult<Value> + Send + Sync>;

/// Configuration shared by every rule kind.
#[derive(Clone)]
pub struct Common {
    /// Substituted for absent, null, and empty values. `None` means no default.
    pub default: Option<Value>,
    /// Fail with `MissingRequired` when the field is absent.
    pub required: bool,
    /// Accept absent, null, and empty values.
    pub allow_null: bool,
    /// The value must be an array; every element is validated on its own.
    pub array_of_scalars: bool,
    /// Post hooks, run in order.
    pub hooks: Vec<Hook>,
}

impl Default for Common {
    fn default() -> Self {
        Self {
            default: None,
            required: false,
            allow_null: true,
            array_of_scalars: false,
            hooks: Vec::new(),
        }
    }
}

impl fmt::Debug for Common {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Common")
            .field("default", &self.default)
            .field("required", &self.required)
            .field("allow_null", &self.allow_null)
            .field("array_of_scalars", &self.array_of_scalars)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

/// Builder methods shared by all scalar rule records.
pub trait Configure: Sized {
    fn common_mut(&mut self) -> &mut Common;

    fn required(mut self, required: bool) -> Self {
        self.common_mut().required = required;
        self
    }

    fn allow_null(mut self, allow_null: bool) -> Self {
        self.common_mut().allow_null = allow_null;
        self
    }

    /// Expect an array and validate each element against this rule.
    fn many(mut self, many: bool) -> Self {
        self.common_mut().array_of_scalars = many;
        self
    }

    fn hook<F>(self, f: F) -> Self
    where
        F: Fn(&str, Value) -> VouchResult<Value> + Send + Sync + 'static,
    {
        self.hook_arc(Arc::new(f))
    }

    fn hook_arc(mut self, hook: Hook) -> Self {
        self.common_mut().hooks.push(hook);
        self
    }
}

/// Inclusive and exclusive range bounds, checked in `gt, gte, lt, lte` order.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds<T> {
    pub gt: Option<T>,
    pub gte: Option<T>,
    pub lt: Option<T>,
    pub lte: Option<T>,
}

impl<T> Default for Bounds<T> {
    fn default() -> Self {
        Self {
            gt: None,
            gte: None,
            lt: None,
            lte: None,
        }
    }
}

impl<T: PartialOrd + fmt::Display> Bounds<T> {
    /// Check `n`; `value` is what the violation reports as offending.
    pub fn check(&self, key: &str, value: &Value, n: &T) -> VouchResult<()> {
        if let Some(gt) = &self.gt {
            if n <= gt {
                return Err(Violation::with_param(MessageKey::Gt, key, value, "gt", gt).into());
            }
        }
        if let Some(gte) = &self.gte {
            if n < gte {
                return Err(Violation::with_param(MessageKey::Gte, key, value, "gte", gte).into());
            }
        }
        if let Some(lt) = &self.lt {
            if n >= lt {
                return Err(Violation::with_param(MessageKey::Lt, key, value, "lt", lt).into());
            }
        }
        if let Some(lte) = &self.lte {
            if n > lte {
                return Err(Violation::with_param(MessageKey::Lte, key, value, "lte", lte).into());
            }
        }
        Ok(())
    }
}

/// Render an enumeration for the `{enum}` placeholder.
pub(crate) fn render_list<T: fmt::Display>(items: impl IntoIterator<Item = T>) -> String {
    let parts: Vec<String> = items.into_iter().map(|i| i.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

/// The closed set of rule kinds.
#[derive(Debug, Clone)]
pub enum Rule {
    Bool(BoolRule),
    Int(IntRule),
    Float(FloatRule),
    Str(StrRule),
    Date(TemporalRule),
    DateTime(TemporalRule),
    Email(FormatRule),
    Ipv4(FormatRule),
    Ipv6(FormatRule),
    Phone(PhoneRule),
    Url(FormatRule),
    /// A single nested object validated against a sub-schema.
    Object(NestedRule),
    /// An array of nested objects, each validated against a sub-schema.
    List(NestedRule),
}

impl Rule {
    /// Short name of the rule kind, as used in schema files.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Rule::Bool(_) => "bool",
            Rule::Int(_) => "int",
            Rule::Float(_) => "float",
            Rule::Str(_) => "str",
            Rule::Date(_) => "date",
            Rule::DateTime(_) => "datetime",
            Rule::Email(_) => "email",
            Rule::Ipv4(_) => "ipv4",
            Rule::Ipv6(_) => "ipv6",
            Rule::Phone(_) => "phone",
            Rule::Url(_) => "url",
            Rule::Object(_) => "dict",
            Rule::List(_) => "list",
        }
    }
}

impl From<BoolRule> for Rule {
    fn from(r: BoolRule) -> Self {
        Rule::Bool(r)
    }
}

impl From<IntRule> for Rule {
    fn from(r: IntRule) -> Self {
        Rule::Int(r)
    }
}

impl From<FloatRule> for Rule {
    fn from(r: FloatRule) -> Self {
        Rule::Float(r)
    }
}

impl From<StrRule> for Rule {
    fn from(r: StrRule) -> Self {
        Rule::Str(r)
    }
}

impl From<TemporalRule> for Rule {
    fn from(r: TemporalRule) -> Self {
        match r.precision {
            Precision::Date => Rule::Date(r),
            Precision::DateTime => Rule::DateTime(r),
        }
    }
}

impl From<FormatRule> for Rule {
    fn from(r: FormatRule) -> Self {
        match r.format {
            Format::Email => Rule::Email(r),
            Format::Ipv4 => Rule::Ipv4(r),
            Format::Ipv6 => Rule::Ipv6(r),
            Format::Url => Rule::Url(r),
        }
    }
}

impl From<PhoneRule> for Rule {
    fn from(r: PhoneRule) -> Self {
        Rule::Phone(r)
    }
}

impl From<NestedRule> for Rule {
    fn from(r: NestedRule) -> Self {
        if r.list_mode {
            Rule::List(r)
        } else {
            Rule::Object(r)
        }
    }
}

/// An ordered mapping from field name to rule.
///
/// Fields are validated in declaration order, which decides which violation
/// is reported when several fields are invalid.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<(String, Rule)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `name`. Re-declaring a name replaces its rule in place.
    pub fn field(mut self, name: impl Into<String>, rule: impl Into<Rule>) -> Self {
        self.insert(name, rule);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, rule: impl Into<Rule>) {
        let name = name.into();
        let rule = rule.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = rule,
            None => self.fields.push((name, rule)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, r)| r)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.fields.iter().map(|(n, r)| (n.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
