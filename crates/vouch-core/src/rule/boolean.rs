//! Boolean rule.

use vouch_contracts::{MessageKey, Value, Violation, VouchResult};

use crate::rule::{Common, Configure};
use crate::traits::Parse;

/// Accepts booleans, and with `convert` set, the strings `true`/`false` in
/// any letter case.
#[derive(Debug, Clone)]
pub struct BoolRule {
    pub common: Common,
    pub convert: bool,
}

impl BoolRule {
    pub fn new() -> Self {
        Self {
            common: Common::default(),
            convert: true,
        }
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.common.default = Some(value.into());
        self
    }

    pub fn convert(mut self, convert: bool) -> Self {
        self.convert = convert;
        self
    }
}

impl Default for BoolRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Configure for BoolRule {
    fn common_mut(&mut self) -> &mut Common {
        &mut self.common
    }
}

impl Parse for BoolRule {
    fn common(&self) -> &Common {
        &self.common
    }

    fn parse(&self, key: &str, value: Value) -> VouchResult<Value> {
        if self.convert {
            if let Value::Str(s) = &value {
                return match s.to_uppercase().as_str() {
                    "TRUE" => Ok(Value::Bool(true)),
                    "FALSE" => Ok(Value::Bool(false)),
                    _ => Err(Violation::new(MessageKey::Convert, key, &value).into()),
                };
            }
        }
        match value {
            Value::Bool(_) => Ok(value),
            other => {
                Err(Violation::with_param(MessageKey::Type, key, &other, "type", "bool").into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use vouch_contracts::ViolationKind;

    use super::*;

    #[test]
    fn converts_strings_case_insensitively() {
        let rule = BoolRule::new();
        assert_eq!(rule.parse("b", Value::from("TrUe")).unwrap(), Value::Bool(true));
        assert_eq!(rule.parse("b", Value::from("false")).unwrap(), Value::Bool(false));
    }

    #[test]
    fn unknown_string_is_a_conversion_error() {
        let err = BoolRule::new().parse("b", Value::from("yes")).unwrap_err();
        assert_eq!(err.kind(), Some(ViolationKind::BooleanConversionError));
    }

    #[test]
    fn without_convert_strings_are_type_mismatches() {
        let err = BoolRule::new().convert(false).parse("b", Value::from("true")).unwrap_err();
        assert_eq!(err.kind(), Some(ViolationKind::TypeMismatch));
    }

    #[test]
    fn non_boolean_values_are_type_mismatches() {
        let err = BoolRule::new().parse("b", Value::Int(1)).unwrap_err();
        assert_eq!(err.kind(), Some(ViolationKind::TypeMismatch));
        assert_eq!(err.violation().unwrap().param, Some(("type".to_string(), "bool".to_string())));
    }
}
