//! Raw and typed argument bindings plus the parameter type schema.
//!
//! Matching produces [`RawBindings`] (strings and presence flags exactly as
//! they appeared on the command line, plus catalog defaults); coercion turns
//! them into [`TypedBindings`] according to a command's declared
//! [`ParamSpec`] list. Commands never see raw argv.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A value as bound by the matcher, before type coercion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawValue {
    /// Presence of a boolean option or a matched literal.
    Flag(bool),
    /// A single matched token or option value.
    Str(String),
    /// Accumulated tokens of a repeatable positional, in argv order.
    List(Vec<String>),
}

/// Result of matching argv against a grammar: parameter name to raw value.
///
/// Keys are normalized parameter names (`--num-times` → `num_times`).
/// Unmatched options carry their catalog default or `Flag(false)`; unmatched
/// value-taking options with no default are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBindings {
    values: BTreeMap<String, RawValue>,
}

impl RawBindings {
    pub fn insert(&mut self, name: &str, value: RawValue) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Appends a token to a repeatable binding, promoting an existing single
    /// value to a list if needed.
    pub fn push_repeat(&mut self, name: &str, token: &str) {
        match self.values.get_mut(name) {
            Some(RawValue::List(items)) => items.push(token.to_string()),
            Some(RawValue::Str(first)) => {
                let list = vec![std::mem::take(first), token.to_string()];
                self.values.insert(name.to_string(), RawValue::List(list));
            }
            _ => {
                self.values
                    .insert(name.to_string(), RawValue::List(vec![token.to_string()]));
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RawValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A coerced argument value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<Value>),
    /// An absent optional parameter.
    None,
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

/// Conversion function for a user-defined type descriptor.
pub type CustomConvert = Arc<dyn Fn(&str) -> Result<Value, String> + Send + Sync>;

/// Type descriptor consulted when coercing a raw binding.
///
/// # Examples
///
/// ```
/// use docgram_core::{TypeSpec, Value};
///
/// let ty = TypeSpec::list(TypeSpec::Int);
/// assert_eq!(ty.describe(), "list<integer>");
///
/// let upper = TypeSpec::custom("upper", |raw| Ok(Value::Str(raw.to_uppercase())));
/// assert_eq!(upper.describe(), "upper");
/// ```
#[derive(Clone)]
pub enum TypeSpec {
    /// Identity; the raw string is kept as-is.
    Str,
    Int,
    Float,
    /// Identity on presence flags.
    Bool,
    /// Absent raw value maps to [`Value::None`] without invoking the inner
    /// coercion; a present value coerces via the inner descriptor.
    Optional(Box<TypeSpec>),
    /// Element-wise coercion of a repeatable binding.
    List(Box<TypeSpec>),
    /// User-supplied conversion; any error it returns is reported as a
    /// validation failure for the parameter.
    Custom { name: String, convert: CustomConvert },
}

impl TypeSpec {
    pub fn optional(inner: TypeSpec) -> Self {
        TypeSpec::Optional(Box::new(inner))
    }

    pub fn list(inner: TypeSpec) -> Self {
        TypeSpec::List(Box::new(inner))
    }

    pub fn custom(
        name: &str,
        convert: impl Fn(&str) -> Result<Value, String> + Send + Sync + 'static,
    ) -> Self {
        TypeSpec::Custom {
            name: name.to_string(),
            convert: Arc::new(convert),
        }
    }

    /// Human-readable descriptor name for error messages.
    pub fn describe(&self) -> String {
        match self {
            TypeSpec::Str => "string".into(),
            TypeSpec::Int => "integer".into(),
            TypeSpec::Float => "float".into(),
            TypeSpec::Bool => "flag".into(),
            TypeSpec::Optional(inner) => format!("optional<{}>", inner.describe()),
            TypeSpec::List(inner) => format!("list<{}>", inner.describe()),
            TypeSpec::Custom { name, .. } => name.clone(),
        }
    }
}

impl fmt::Debug for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// One named, typed parameter slot in a command's schema.
///
/// Declared statically at registration time; the dispatcher binds matched
/// values against this schema rather than inspecting the callable.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub ty: TypeSpec,
}

impl ParamSpec {
    pub fn new(name: &str, ty: TypeSpec) -> Self {
        Self {
            name: name.to_string(),
            ty,
        }
    }
}

/// Raw bindings after coercion: parameter name to typed value.
///
/// Only produced when every coercion succeeds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypedBindings {
    values: BTreeMap<String, Value>,
}

impl TypedBindings {
    pub fn insert(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Convenience accessor for string parameters.
    pub fn str_of(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Convenience accessor for integer parameters.
    pub fn int_of(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    /// Convenience accessor for flag parameters; absent means `false`.
    pub fn flag_of(&self, name: &str) -> bool {
        self.get(name).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
