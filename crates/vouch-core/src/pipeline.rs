//! The common pipeline shared by every rule kind.
//!
//! For one field value:
//!
//!   required → nullability → default → [parse] → hooks
//!
//! The parser is skipped for null values (absent, null, empty string); hooks
//! still run. In scalar-array mode a present value must be an array, even an
//! explicit null; only an absent field goes through the presence checks as a
//! whole. The sequence then runs once per element.

use tracing::debug;

use vouch_contracts::{is_null_value, MessageKey, Value, Violation, VouchError, VouchResult};

use crate::rule::Common;
use crate::traits::Parse;

/// Required check, nullability check, and default substitution.
///
/// `value` is `None` when the field is absent from its source. The result is
/// never absent: an absent field that passes becomes the default or `Null`.
///
/// A usable default (one that is not itself a null value) wins over the
/// nullability check, so `allow_null(false)` with a default never fails on a
/// missing field.
pub fn common_check(common: &Common, key: &str, value: Option<Value>) -> VouchResult<Value> {
    if common.required && value.is_none() {
        return Err(Violation::new(MessageKey::Required, key, &Value::Null).into());
    }

    if !is_null_value(value.as_ref()) {
        return Ok(value.unwrap_or(Value::Null));
    }

    if let Some(default) = common.default.as_ref().filter(|d| !d.is_null_like()) {
        debug!(key = %key, default = %default, "substituting default");
        return Ok(default.clone());
    }

    if !common.allow_null {
        let seen = value.unwrap_or(Value::Null);
        return Err(Violation::new(MessageKey::AllowNull, key, &seen).into());
    }

    Ok(common.default.clone().or(value).unwrap_or(Value::Null))
}

/// Thread `value` through every hook in registration order.
pub fn run_hooks(common: &Common, key: &str, value: Value) -> VouchResult<Value> {
    common.hooks.iter().try_fold(value, |v, hook| hook(key, v))
}

/// Run the full scalar pipeline for one field.
pub fn execute<P: Parse + ?Sized>(rule: &P, key: &str, value: Option<Value>) -> VouchResult<Value> {
    let common = rule.common();
    if !common.array_of_scalars {
        return execute_one(rule, key, value);
    }

    let items = match value {
        Some(Value::List(items)) => items,
        Some(other) => return Err(not_a_list(key, &other)),
        None => match common_check(common, key, None)? {
            Value::List(items) => items,
            v if v.is_null_like() => return run_hooks(common, key, v),
            other => return Err(not_a_list(key, &other)),
        },
    };

    debug!(key = %key, count = items.len(), "validating scalar array");
    items
        .into_iter()
        .map(|item| execute_one(rule, key, Some(item)))
        .collect::<VouchResult<Vec<_>>>()
        .map(Value::List)
}

fn execute_one<P: Parse + ?Sized>(rule: &P, key: &str, value: Option<Value>) -> VouchResult<Value> {
    let common = rule.common();
    let value = common_check(common, key, value)?;
    let value = if value.is_null_like() {
        value
    } else {
        rule.parse(key, value)?
    };
    run_hooks(common, key, value)
}

/// The `ContainerTypeMismatch` error for a field that must be an array.
pub fn not_a_list(key: &str, value: &Value) -> VouchError {
    Violation::new(MessageKey::Multi, key, value).into()
}

/// The `ContainerTypeMismatch` error for a field that must be an object.
pub fn not_a_map(key: &str, value: &Value) -> VouchError {
    Violation::new(MessageKey::Dict, key, value).into()
}
