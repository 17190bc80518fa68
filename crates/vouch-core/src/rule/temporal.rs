//! Date and datetime rules.
//!
//! Both kinds share one engine working on `NaiveDateTime`; a date rule is a
//! datetime rule narrowed to calendar-date precision on output. Bounds, the
//! default, and enumeration entries are normalized when the builder is
//! called, so a finished rule holds only parsed values.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use vouch_contracts::{MessageKey, Value, Violation, VouchError, VouchResult};

use crate::rule::{render_list, Bounds, Common, Configure};
use crate::traits::Parse;

const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FMT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Date,
    DateTime,
}

impl Precision {
    fn type_name(self) -> &'static str {
        match self {
            Precision::Date => "date",
            Precision::DateTime => "datetime",
        }
    }

    fn narrow(self, dt: NaiveDateTime) -> Value {
        match self {
            Precision::Date => Value::Date(dt.date()),
            Precision::DateTime => Value::DateTime(dt),
        }
    }
}

/// A configuration-time temporal value: already typed, or text in
/// `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD` form.
#[derive(Debug, Clone, PartialEq)]
pub enum TemporalInput {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Text(String),
}

impl TemporalInput {
    pub fn from_value(value: &Value) -> VouchResult<Self> {
        match value {
            Value::Date(d) => Ok(TemporalInput::Date(*d)),
            Value::DateTime(dt) => Ok(TemporalInput::DateTime(*dt)),
            Value::Str(s) => Ok(TemporalInput::Text(s.clone())),
            other => Err(VouchError::ConfigError {
                reason: format!("`{other}` is not a date or datetime"),
            }),
        }
    }

    fn normalize(self) -> VouchResult<NaiveDateTime> {
        match self {
            TemporalInput::Date(d) => Ok(d.and_time(NaiveTime::MIN)),
            TemporalInput::DateTime(dt) => Ok(dt),
            TemporalInput::Text(s) => NaiveDateTime::parse_from_str(&s, DATETIME_FMT)
                .or_else(|_| NaiveDate::parse_from_str(&s, DATE_FMT).map(|d| d.and_time(NaiveTime::MIN)))
                .map_err(|e| VouchError::ConfigError {
                    reason: format!("cannot read `{s}` as a date or datetime: {e}"),
                }),
        }
    }
}

impl From<NaiveDate> for TemporalInput {
    fn from(d: NaiveDate) -> Self {
        TemporalInput::Date(d)
    }
}

impl From<NaiveDateTime> for TemporalInput {
    fn from(dt: NaiveDateTime) -> Self {
        TemporalInput::DateTime(dt)
    }
}

impl From<&str> for TemporalInput {
    fn from(s: &str) -> Self {
        TemporalInput::Text(s.to_string())
    }
}

impl From<String> for TemporalInput {
    fn from(s: String) -> Self {
        TemporalInput::Text(s)
    }
}

#[derive(Debug, Clone)]
pub struct TemporalRule {
    pub common: Common,
    pub precision: Precision,
    /// `chrono` format used to parse incoming strings.
    pub fmt: String,
    pub bounds: Bounds<NaiveDateTime>,
    pub enumeration: Option<Vec<NaiveDateTime>>,
}

impl TemporalRule {
    pub fn date() -> Self {
        Self::with_precision(Precision::Date)
    }

    pub fn datetime() -> Self {
        Self::with_precision(Precision::DateTime)
    }

    pub fn with_precision(precision: Precision) -> Self {
        let fmt = match precision {
            Precision::Date => DATE_FMT,
            Precision::DateTime => DATETIME_FMT,
        };
        Self {
            common: Common::default(),
            precision,
            fmt: fmt.to_string(),
            bounds: Bounds::default(),
            enumeration: None,
        }
    }

    pub fn fmt(mut self, fmt: impl Into<String>) -> Self {
        self.fmt = fmt.into();
        self
    }

    /// The default bypasses the parser, so it is stored at the rule's
    /// precision. Set `precision` before the default.
    pub fn default_value(mut self, value: impl Into<TemporalInput>) -> VouchResult<Self> {
        self.common.default = Some(self.precision.narrow(value.into().normalize()?));
        Ok(self)
    }

    pub fn gt(mut self, bound: impl Into<TemporalInput>) -> VouchResult<Self> {
        self.bounds.gt = Some(bound.into().normalize()?);
        Ok(self)
    }

    pub fn gte(mut self, bound: impl Into<TemporalInput>) -> VouchResult<Self> {
        self.bounds.gte = Some(bound.into().normalize()?);
        Ok(self)
    }

    pub fn lt(mut self, bound: impl Into<TemporalInput>) -> VouchResult<Self> {
        self.bounds.lt = Some(bound.into().normalize()?);
        Ok(self)
    }

    pub fn lte(mut self, bound: impl Into<TemporalInput>) -> VouchResult<Self> {
        self.bounds.lte = Some(bound.into().normalize()?);
        Ok(self)
    }

    pub fn enum_values<I>(mut self, values: impl IntoIterator<Item = I>) -> VouchResult<Self>
    where
        I: Into<TemporalInput>,
    {
        let entries = values
            .into_iter()
            .map(|v| v.into().normalize())
            .collect::<VouchResult<Vec<_>>>()?;
        self.enumeration = Some(entries);
        Ok(self)
    }

    fn read(&self, key: &str, value: &Value) -> VouchResult<NaiveDateTime> {
        let parsed = match value {
            Value::DateTime(dt) => Some(*dt),
            Value::Date(d) => Some(d.and_time(NaiveTime::MIN)),
            Value::Str(s) => NaiveDateTime::parse_from_str(s, &self.fmt)
                .or_else(|_| NaiveDate::parse_from_str(s, &self.fmt).map(|d| d.and_time(NaiveTime::MIN)))
                .ok(),
            _ => None,
        };
        parsed.ok_or_else(|| {
            Violation::with_param(MessageKey::Type, key, value, "type", self.precision.type_name()).into()
        })
    }
}

impl Configure for TemporalRule {
    fn common_mut(&mut self) -> &mut Common {
        &mut self.common
    }
}

impl Parse for TemporalRule {
    fn common(&self) -> &Common {
        &self.common
    }

    fn parse(&self, key: &str, value: Value) -> VouchResult<Value> {
        let dt = self.read(key, &value)?;
        let out = self.precision.narrow(dt);

        self.bounds.check(key, &out, &dt)?;

        if let Some(allowed) = &self.enumeration {
            if !allowed.contains(&dt) {
                let rendered = render_list(allowed.iter().map(|a| self.precision.narrow(*a)));
                return Err(Violation::with_param(MessageKey::Enum, key, &out, "enum", rendered).into());
            }
        }

        Ok(out)
    }
}
