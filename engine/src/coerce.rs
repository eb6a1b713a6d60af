//! Type coercion: raw bindings → typed bindings per a command's schema.
//!
//! Coercion is report-all rather than fail-fast: every malformed parameter
//! in an invocation is collected before returning, so the user fixes one
//! command line instead of replaying it once per mistake.

use thiserror::Error;
use tracing::debug;

use docgram_core::{ParamSpec, RawBindings, RawValue, TypeSpec, TypedBindings, Value};

/// A parameter whose raw value could not be coerced to its declared type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value \"{raw}\" for `{param}`: expected {expected}")]
pub struct CoerceError {
    /// Parameter name; list failures carry their element index (`file[1]`).
    pub param: String,
    pub raw: String,
    pub expected: String,
}

impl CoerceError {
    fn new(param: &str, raw: &RawValue, expected: String) -> Self {
        let raw = match raw {
            RawValue::Str(s) => s.clone(),
            RawValue::Flag(b) => b.to_string(),
            RawValue::List(items) => items.join(", "),
        };
        Self {
            param: param.to_string(),
            raw,
            expected,
        }
    }
}

/// Coerces raw bindings against a parameter schema.
///
/// Parameters absent from the raw bindings become [`Value::None`]
/// (`Bool` → `false`, `List` → empty). Raw bindings with no schema entry
/// pass through unchanged. Returns every failure found, not just the first.
///
/// # Examples
///
/// ```
/// use docgram::{coerce, match_args, parse_usage};
/// use docgram_core::{ParamSpec, TypeSpec, Value};
///
/// let grammar = parse_usage(
///     "Usage: prog [-n <num>]\n\nOptions:\n  -n, --num-times <num>  [default: 1]\n",
/// )
/// .unwrap();
/// let raw = match_args(&grammar, &[]).unwrap();
/// let typed = coerce(&raw, &[ParamSpec::new("num_times", TypeSpec::Int)]).unwrap();
/// assert_eq!(typed.get("num_times"), Some(&Value::Int(1)));
/// ```
pub fn coerce(
    raw: &RawBindings,
    params: &[ParamSpec],
) -> Result<TypedBindings, Vec<CoerceError>> {
    let mut typed = TypedBindings::default();
    let mut errors = Vec::new();

    for param in params {
        match raw.get(&param.name) {
            None => typed.insert(&param.name, absent_value(&param.ty)),
            Some(value) => match coerce_one(&param.name, &param.ty, value) {
                Ok(coerced) => typed.insert(&param.name, coerced),
                Err(mut found) => errors.append(&mut found),
            },
        }
    }

    // Bindings with no declared descriptor (matched literals, undeclared
    // options) keep their raw shape.
    for (name, value) in raw.iter() {
        if params.iter().any(|p| p.name == *name) {
            continue;
        }
        typed.insert(name, passthrough(value));
    }

    if errors.is_empty() {
        debug!(bound = typed.len(), "coerced bindings");
        Ok(typed)
    } else {
        debug!(failures = errors.len(), "coercion failed");
        Err(errors)
    }
}

/// Value for a parameter the match never bound.
fn absent_value(ty: &TypeSpec) -> Value {
    match ty {
        TypeSpec::Bool => Value::Bool(false),
        TypeSpec::List(_) => Value::List(Vec::new()),
        _ => Value::None,
    }
}

fn passthrough(value: &RawValue) -> Value {
    match value {
        RawValue::Flag(b) => Value::Bool(*b),
        RawValue::Str(s) => Value::Str(s.clone()),
        RawValue::List(items) => {
            Value::List(items.iter().map(|s| Value::Str(s.clone())).collect())
        }
    }
}

fn coerce_one(param: &str, ty: &TypeSpec, value: &RawValue) -> Result<Value, Vec<CoerceError>> {
    let fail = |expected: String| vec![CoerceError::new(param, value, expected)];

    match ty {
        TypeSpec::Str => match value {
            RawValue::Str(s) => Ok(Value::Str(s.clone())),
            _ => Err(fail(ty.describe())),
        },
        TypeSpec::Int => match value {
            RawValue::Str(s) => s
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| fail(ty.describe())),
            _ => Err(fail(ty.describe())),
        },
        TypeSpec::Float => match value {
            RawValue::Str(s) => s
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| fail(ty.describe())),
            _ => Err(fail(ty.describe())),
        },
        TypeSpec::Bool => match value {
            RawValue::Flag(b) => Ok(Value::Bool(*b)),
            _ => Err(fail(ty.describe())),
        },
        TypeSpec::Optional(inner) => coerce_one(param, inner, value),
        TypeSpec::List(inner) => {
            let items: Vec<String> = match value {
                RawValue::List(items) => items.clone(),
                RawValue::Str(s) => vec![s.clone()],
                RawValue::Flag(_) => return Err(fail(ty.describe())),
            };
            let mut coerced = Vec::with_capacity(items.len());
            let mut errors = Vec::new();
            for (idx, item) in items.iter().enumerate() {
                let slot = format!("{param}[{idx}]");
                match coerce_one(&slot, inner, &RawValue::Str(item.clone())) {
                    Ok(v) => coerced.push(v),
                    Err(mut found) => errors.append(&mut found),
                }
            }
            if errors.is_empty() {
                Ok(Value::List(coerced))
            } else {
                Err(errors)
            }
        }
        TypeSpec::Custom { name, convert } => match value {
            RawValue::Str(s) => convert(s).map_err(|msg| fail(format!("{name}: {msg}"))),
            _ => Err(fail(name.clone())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_with(pairs: &[(&str, RawValue)]) -> RawBindings {
        let mut raw = RawBindings::default();
        for (name, value) in pairs {
            raw.insert(name, value.clone());
        }
        raw
    }

    #[test]
    fn scalar_coercions() {
        let raw = raw_with(&[
            ("count", RawValue::Str("3".into())),
            ("rate", RawValue::Str("2.5".into())),
            ("name", RawValue::Str("x".into())),
            ("loud", RawValue::Flag(true)),
        ]);
        let typed = coerce(
            &raw,
            &[
                ParamSpec::new("count", TypeSpec::Int),
                ParamSpec::new("rate", TypeSpec::Float),
                ParamSpec::new("name", TypeSpec::Str),
                ParamSpec::new("loud", TypeSpec::Bool),
            ],
        )
        .unwrap();
        assert_eq!(typed.get("count"), Some(&Value::Int(3)));
        assert_eq!(typed.get("rate"), Some(&Value::Float(2.5)));
        assert_eq!(typed.get("name"), Some(&Value::Str("x".into())));
        assert_eq!(typed.get("loud"), Some(&Value::Bool(true)));
    }

    #[test]
    fn failures_are_aggregated_not_fail_fast() {
        let raw = raw_with(&[
            ("count", RawValue::Str("abc".into())),
            ("rate", RawValue::Str("xyz".into())),
        ]);
        let errors = coerce(
            &raw,
            &[
                ParamSpec::new("count", TypeSpec::Int),
                ParamSpec::new("rate", TypeSpec::Float),
            ],
        )
        .unwrap_err();
        assert_eq!(errors.len(), 2);
        let params: Vec<&str> = errors.iter().map(|e| e.param.as_str()).collect();
        assert_eq!(params, vec!["count", "rate"]);
    }

    #[test]
    fn list_failure_carries_element_index() {
        let raw = raw_with(&[(
            "nums",
            RawValue::List(vec!["1".into(), "two".into(), "3".into()]),
        )]);
        let errors = coerce(&raw, &[ParamSpec::new("nums", TypeSpec::list(TypeSpec::Int))])
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].param, "nums[1]");
        assert_eq!(errors[0].raw, "two");
    }

    #[test]
    fn optional_absent_maps_to_none_without_inner_coercion() {
        let raw = RawBindings::default();
        let typed = coerce(
            &raw,
            &[ParamSpec::new("limit", TypeSpec::optional(TypeSpec::Int))],
        )
        .unwrap();
        assert_eq!(typed.get("limit"), Some(&Value::None));
    }

    #[test]
    fn optional_present_coerces_via_inner() {
        let raw = raw_with(&[("limit", RawValue::Str("7".into()))]);
        let typed = coerce(
            &raw,
            &[ParamSpec::new("limit", TypeSpec::optional(TypeSpec::Int))],
        )
        .unwrap();
        assert_eq!(typed.get("limit"), Some(&Value::Int(7)));
    }

    #[test]
    fn custom_conversion_errors_become_coerce_errors() {
        let raw = raw_with(&[("port", RawValue::Str("99999".into()))]);
        let port_ty = TypeSpec::custom("port", |s| {
            s.parse::<u16>()
                .map(|p| Value::Int(p as i64))
                .map_err(|_| "out of range".to_string())
        });
        let errors = coerce(&raw, &[ParamSpec::new("port", port_ty)]).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].expected.contains("port"));
        assert!(errors[0].expected.contains("out of range"));
    }

    #[test]
    fn undeclared_bindings_pass_through() {
        let raw = raw_with(&[
            ("add", RawValue::Flag(true)),
            ("name", RawValue::Str("x".into())),
        ]);
        let typed = coerce(&raw, &[ParamSpec::new("name", TypeSpec::Str)]).unwrap();
        assert_eq!(typed.get("add"), Some(&Value::Bool(true)));
    }

    #[test]
    fn error_message_names_value_parameter_and_type() {
        let err = CoerceError {
            param: "count".into(),
            raw: "abc".into(),
            expected: "integer".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid value \"abc\" for `count`: expected integer"
        );
    }
}
