//! Integer and float rules.

use std::collections::BTreeMap;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use vouch_contracts::{MessageKey, Value, Violation, VouchResult};

use crate::rule::{render_list, Bounds, Common, Configure};
use crate::traits::Parse;

// ── Integer ──────────────────────────────────────────────────────────────────

/// Integer enumeration: plain membership, or a lookup that replaces the value.
#[derive(Debug, Clone, PartialEq)]
pub enum IntEnum {
    Members(Vec<i64>),
    Mapping(BTreeMap<i64, Value>),
}

impl IntEnum {
    fn render(&self) -> String {
        match self {
            IntEnum::Members(members) => render_list(members),
            IntEnum::Mapping(mapping) => render_list(mapping.keys()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IntRule {
    pub common: Common,
    pub bounds: Bounds<i64>,
    pub enumeration: Option<IntEnum>,
}

impl IntRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.common.default = Some(value.into());
        self
    }

    pub fn gt(mut self, bound: i64) -> Self {
        self.bounds.gt = Some(bound);
        self
    }

    pub fn gte(mut self, bound: i64) -> Self {
        self.bounds.gte = Some(bound);
        self
    }

    pub fn lt(mut self, bound: i64) -> Self {
        self.bounds.lt = Some(bound);
        self
    }

    pub fn lte(mut self, bound: i64) -> Self {
        self.bounds.lte = Some(bound);
        self
    }

    pub fn enum_members(mut self, members: impl IntoIterator<Item = i64>) -> Self {
        self.enumeration = Some(IntEnum::Members(members.into_iter().collect()));
        self
    }

    /// Accepted values are the mapping keys; the output is the mapped value.
    pub fn enum_mapping<V: Into<Value>>(mut self, mapping: impl IntoIterator<Item = (i64, V)>) -> Self {
        let mapping = mapping.into_iter().map(|(k, v)| (k, v.into())).collect();
        self.enumeration = Some(IntEnum::Mapping(mapping));
        self
    }

    fn coerce(key: &str, value: &Value) -> VouchResult<i64> {
        let n = match value {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Float(x) => {
                let t = x.trunc();
                (t.is_finite() && t >= i64::MIN as f64 && t < i64::MAX as f64).then_some(t as i64)
            }
            Value::Decimal(d) => d.trunc().to_i64(),
            Value::Str(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        n.ok_or_else(|| Violation::with_param(MessageKey::Type, key, value, "type", "int").into())
    }
}

impl Configure for IntRule {
    fn common_mut(&mut self) -> &mut Common {
        &mut self.common
    }
}

impl Parse for IntRule {
    fn common(&self) -> &Common {
        &self.common
    }

    fn parse(&self, key: &str, value: Value) -> VouchResult<Value> {
        let n = Self::coerce(key, &value)?;
        let coerced = Value::Int(n);
        self.bounds.check(key, &coerced, &n)?;

        match &self.enumeration {
            None => Ok(coerced),
            Some(IntEnum::Members(members)) if members.contains(&n) => Ok(coerced),
            Some(IntEnum::Mapping(mapping)) if mapping.contains_key(&n) => Ok(mapping[&n].clone()),
            Some(e) => {
                Err(Violation::with_param(MessageKey::Enum, key, &coerced, "enum", e.render()).into())
            }
        }
    }
}

// ── Float ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct FloatRule {
    pub common: Common,
    pub bounds: Bounds<f64>,
    /// Round to this many decimal places after the range checks.
    pub digits: Option<u32>,
    /// Emit a `Value::Decimal` instead of a float.
    pub decimal: bool,
}

impl FloatRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.common.default = Some(value.into());
        self
    }

    pub fn gt(mut self, bound: f64) -> Self {
        self.bounds.gt = Some(bound);
        self
    }

    pub fn gte(mut self, bound: f64) -> Self {
        self.bounds.gte = Some(bound);
        self
    }

    pub fn lt(mut self, bound: f64) -> Self {
        self.bounds.lt = Some(bound);
        self
    }

    pub fn lte(mut self, bound: f64) -> Self {
        self.bounds.lte = Some(bound);
        self
    }

    pub fn digits(mut self, digits: u32) -> Self {
        self.digits = Some(digits);
        self
    }

    pub fn decimal(mut self, decimal: bool) -> Self {
        self.decimal = decimal;
        self
    }

    fn coerce(key: &str, value: &Value) -> VouchResult<f64> {
        let x = match value {
            Value::Float(x) => Some(*x),
            Value::Int(i) => Some(*i as f64),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Decimal(d) => d.to_f64(),
            Value::Str(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        x.ok_or_else(|| Violation::with_param(MessageKey::Type, key, value, "type", "float").into())
    }
}

impl Configure for FloatRule {
    fn common_mut(&mut self) -> &mut Common {
        &mut self.common
    }
}

impl Parse for FloatRule {
    fn common(&self) -> &Common {
        &self.common
    }

    fn parse(&self, key: &str, value: Value) -> VouchResult<Value> {
        let mut x = Self::coerce(key, &value)?;
        self.bounds.check(key, &Value::Float(x), &x)?;

        if let Some(digits) = self.digits {
            x = round_to(x, digits);
        }

        if !self.decimal {
            return Ok(Value::Float(x));
        }
        match Decimal::from_f64(x) {
            Some(d) => Ok(Value::Decimal(match self.digits {
                Some(digits) => d.round_dp(digits),
                None => d,
            })),
            None => Err(Violation::with_param(MessageKey::Type, key, &value, "type", "decimal").into()),
        }
    }
}

/// Round `x` to `digits` decimal places. When the scaled value leaves the
/// finite range the float already carries fewer places than asked for, so it
/// is returned unchanged.
fn round_to(x: f64, digits: u32) -> f64 {
    let Ok(exp) = i32::try_from(digits) else {
        return x;
    };
    let factor = 10f64.powi(exp);
    let scaled = x * factor;
    if !scaled.is_finite() {
        return x;
    }
    scaled.round() / factor
}

#[cfg(test)]
mod tests {
    use vouch_contracts::ViolationKind;

    use super::*;

    #[test]
    fn int_coerces_strings_floats_and_bools() {
        let rule = IntRule::new();
        assert_eq!(rule.parse("n", Value::from(" 42 ")).unwrap(), Value::Int(42));
        assert_eq!(rule.parse("n", Value::Float(3.9)).unwrap(), Value::Int(3));
        assert_eq!(rule.parse("n", Value::Bool(true)).unwrap(), Value::Int(1));
    }

    #[test]
    fn int_rejects_non_numeric_text() {
        for input in [Value::from("4.5"), Value::from("x"), Value::List(vec![])] {
            let err = IntRule::new().parse("n", input).unwrap_err();
            assert_eq!(err.kind(), Some(ViolationKind::TypeMismatch));
        }
    }

    #[test]
    fn int_range_names_the_violated_bound() {
        let rule = IntRule::new().gte(1).lt(10);
        assert!(rule.parse("n", Value::Int(9)).is_ok());

        let err = rule.parse("n", Value::Int(10)).unwrap_err();
        assert_eq!(err.kind(), Some(ViolationKind::RangeViolation));
        assert_eq!(err.violation().unwrap().param, Some(("lt".to_string(), "10".to_string())));
    }

    #[test]
    fn int_enum_mapping_replaces_the_value() {
        let rule = IntRule::new().enum_mapping([(1, "A"), (2, "B")]);
        assert_eq!(rule.parse("grade", Value::Int(1)).unwrap(), Value::from("A"));

        let err = rule.parse("grade", Value::Int(3)).unwrap_err();
        assert_eq!(err.kind(), Some(ViolationKind::EnumViolation));
        assert_eq!(err.violation().unwrap().param, Some(("enum".to_string(), "[1, 2]".to_string())));
    }

    #[test]
    fn int_enum_members_keep_the_value() {
        let rule = IntRule::new().enum_members([1, 3, 5]);
        assert_eq!(rule.parse("odd", Value::from("3")).unwrap(), Value::Int(3));
        assert!(rule.parse("odd", Value::Int(4)).is_err());
    }

    #[test]
    fn float_rounds_after_range_checks() {
        let rule = FloatRule::new().lte(3.14159).digits(2);
        assert_eq!(rule.parse("pi", Value::from("3.14159")).unwrap(), Value::Float(3.14));

        let err = FloatRule::new().gt(0.0).parse("x", Value::Int(0)).unwrap_err();
        assert_eq!(err.kind(), Some(ViolationKind::RangeViolation));
    }

    #[test]
    fn float_ignores_excess_digits() {
        let rule = FloatRule::new().digits(400);
        assert_eq!(rule.parse("x", Value::from("1.5")).unwrap(), Value::Float(1.5));

        let rule = FloatRule::new().digits(300);
        assert_eq!(rule.parse("x", Value::Float(1e10)).unwrap(), Value::Float(1e10));

        let rule = FloatRule::new().digits(u32::MAX).decimal(true);
        assert_eq!(rule.parse("x", Value::from("2.5")).unwrap(), Value::Decimal(Decimal::new(25, 1)));
    }

    #[test]
    fn float_can_emit_decimal() {
        let rule = FloatRule::new().digits(1).decimal(true);
        assert_eq!(rule.parse("amount", Value::from("2.54")).unwrap(), Value::Decimal(Decimal::new(25, 1)));
    }

    #[test]
    fn float_rejects_garbage() {
        let err = FloatRule::new().parse("x", Value::from("abc")).unwrap_err();
        assert_eq!(err.violation().unwrap().param, Some(("type".to_string(), "float".to_string())));
    }
}
