//! Marshalling between native values and their `{type, value}` wire encoding.
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value as JsonValue};

use crate::UnmarshalError;

pub const TYPE_BOOL: &str = "bool";
pub const TYPE_INT: &str = "int";
pub const TYPE_FLOAT: &str = "float";
pub const TYPE_STR: &str = "str";
pub const TYPE_NONE: &str = "NoneType";
pub const TYPE_REMOTE_VAR: &str = "RemoteVar";
/// Only ever sent as the answer to an attribute read, never as an argument.
pub const TYPE_CALLABLE: &str = "callable";

pub type Kwargs = BTreeMap<String, Value>;
pub type WireKwargs = BTreeMap<String, WireValue>;

/// Handle to an object which only exists on the remote side.
///
/// The handle is never resolved locally. Passing it back as an argument lets the remote side
/// look up the object it stands for.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RemoteVar {
    name: String,
}

impl RemoteVar {
    pub fn new<T: Into<String>>(name: T) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for RemoteVar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "RemoteVar({})", self.name)
    }
}

/// A value which can cross the wire.
///
/// Tuples and lists share the `Seq` variant, they cannot be told apart after a round trip.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(Vec<Value>),
    RemoteVar(RemoteVar),
}

impl Value {
    pub fn marshal(&self) -> WireValue {
        match self {
            Value::None => WireValue::typed(TYPE_NONE, JsonValue::Null),
            Value::Bool(x) => WireValue::typed(TYPE_BOOL, JsonValue::Bool(*x)),
            Value::Int(x) => WireValue::typed(TYPE_INT, JsonValue::Number((*x).into())),
            // NaN and infinities have no JSON representation
            Value::Float(x) => WireValue::typed(
                TYPE_FLOAT,
                Number::from_f64(*x).map(JsonValue::Number).unwrap_or(JsonValue::Null),
            ),
            Value::Str(x) => WireValue::typed(TYPE_STR, JsonValue::String(x.clone())),
            Value::Seq(items) => WireValue::Seq(items.iter().map(Value::marshal).collect()),
            Value::RemoteVar(x) => WireValue::typed(TYPE_REMOTE_VAR, JsonValue::String(x.name.clone())),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(x) => Some(*x),
            _ => None,
        }
    }

    /// Integers are widened, matching how the remote side treats numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            Value::Int(x) => Some(*x as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_remote_var(&self) -> Option<&RemoteVar> {
        match self {
            Value::RemoteVar(x) => Some(x),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => TYPE_NONE,
            Value::Bool(_) => TYPE_BOOL,
            Value::Int(_) => TYPE_INT,
            Value::Float(_) => TYPE_FLOAT,
            Value::Str(_) => TYPE_STR,
            Value::Seq(_) => "list",
            Value::RemoteVar(_) => TYPE_REMOTE_VAR,
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::None
    }
}

impl From<bool> for Value {
    fn from(x: bool) -> Self {
        Value::Bool(x)
    }
}

impl From<i32> for Value {
    fn from(x: i32) -> Self {
        Value::Int(x.into())
    }
}

impl From<u32> for Value {
    fn from(x: u32) -> Self {
        Value::Int(x.into())
    }
}

impl From<i64> for Value {
    fn from(x: i64) -> Self {
        Value::Int(x)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(x: &str) -> Self {
        Value::Str(x.to_string())
    }
}

impl From<String> for Value {
    fn from(x: String) -> Self {
        Value::Str(x)
    }
}

impl From<RemoteVar> for Value {
    fn from(x: RemoteVar) -> Self {
        Value::RemoteVar(x)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(x: Vec<T>) -> Self {
        Value::Seq(x.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(x: Option<T>) -> Self {
        match x {
            Some(x) => x.into(),
            None => Value::None,
        }
    }
}

/// The `{type, value}` pair used to keep primitive type identity across JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypedValue {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub value: JsonValue,
}

impl TypedValue {
    pub fn new(type_name: &str, value: JsonValue) -> Self {
        Self {
            type_name: type_name.to_string(),
            value,
        }
    }

    pub fn callable() -> Self {
        Self::new(TYPE_CALLABLE, JsonValue::Null)
    }

    pub fn is_callable(&self) -> bool {
        self.type_name == TYPE_CALLABLE
    }

    pub fn into_value(self) -> Result<Value, UnmarshalError> {
        let ret = match self.type_name.as_str() {
            TYPE_NONE => return Ok(Value::None),
            TYPE_BOOL => self.value.as_bool().map(Value::Bool),
            TYPE_INT => self.value.as_i64().map(Value::Int),
            TYPE_FLOAT => self.value.as_f64().map(Value::Float),
            TYPE_STR => self.value.as_str().map(|x| Value::Str(x.to_string())),
            TYPE_REMOTE_VAR => self.value.as_str().map(|x| Value::RemoteVar(RemoteVar::new(x))),
            _ => return Err(UnmarshalError::UnknownType(self.type_name.clone())),
        };
        ret.ok_or(UnmarshalError::InvalidValue {
            type_name: self.type_name,
            value: self.value,
        })
    }
}

/// A marshalled value: either a tagged primitive or an ordered sequence of marshalled values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireValue {
    Seq(Vec<WireValue>),
    Typed(TypedValue),
}

impl WireValue {
    pub fn typed(type_name: &str, value: JsonValue) -> Self {
        WireValue::Typed(TypedValue::new(type_name, value))
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, WireValue::Typed(x) if x.is_callable())
    }

    pub fn into_value(self) -> Result<Value, UnmarshalError> {
        match self {
            WireValue::Seq(items) => unmarshal_args(items).map(Value::Seq),
            WireValue::Typed(x) => x.into_value(),
        }
    }
}

impl From<&Value> for WireValue {
    fn from(x: &Value) -> Self {
        x.marshal()
    }
}

pub fn marshal_args(args: &[Value]) -> Vec<WireValue> {
    args.iter().map(Value::marshal).collect()
}

pub fn marshal_kwargs(kwargs: &Kwargs) -> WireKwargs {
    kwargs.iter().map(|(k, v)| (k.clone(), v.marshal())).collect()
}

pub fn unmarshal_args(args: Vec<WireValue>) -> Result<Vec<Value>, UnmarshalError> {
    args.into_iter().map(WireValue::into_value).collect()
}

pub fn unmarshal_kwargs(kwargs: WireKwargs) -> Result<Kwargs, UnmarshalError> {
    kwargs
        .into_iter()
        .map(|(k, v)| v.into_value().map(|v| (k, v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accessors() {
        assert_eq!(Value::Bool(false).as_bool(), Some(false));
        assert_eq!(Value::Int(1).as_bool(), None);
        assert_eq!(Value::Int(3).as_i64(), Some(3));
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
        assert_eq!(Value::Float(3.5).as_i64(), None);
        assert_eq!(Value::from("a").as_str(), Some("a"));
        assert_eq!(Value::from(vec![true]).as_seq(), Some(&[Value::Bool(true)][..]));
        assert!(Value::None.is_none());
        assert!(Value::from(Some(2)).as_remote_var().is_none());
    }

    fn round_trip(value: Value) {
        let wire = value.marshal();
        let json = serde_json::to_string(&wire).unwrap();
        let decoded: WireValue = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.into_value().unwrap(), value);
    }

    #[test]
    fn primitives_round_trip() {
        round_trip(Value::None);
        round_trip(Value::Bool(true));
        round_trip(Value::Bool(false));
        round_trip(Value::Int(-42));
        round_trip(Value::Int(i64::MAX));
        round_trip(Value::Float(1.0));
        round_trip(Value::Float(-0.125));
        round_trip(Value::Str("hello\nworld".to_string()));
        round_trip(Value::Str(String::new()));
    }

    #[test]
    fn primitive_tags() {
        assert_eq!(serde_json::to_value(Value::Int(5).marshal()).unwrap(), json!({"type": "int", "value": 5}));
        assert_eq!(
            serde_json::to_value(Value::Float(2.5).marshal()).unwrap(),
            json!({"type": "float", "value": 2.5})
        );
        assert_eq!(
            serde_json::to_value(Value::None.marshal()).unwrap(),
            json!({"type": "NoneType", "value": null})
        );
    }

    #[test]
    fn remote_var_is_sent_as_handle() {
        let var = Value::RemoteVar(RemoteVar::new("h"));
        let json = serde_json::to_value(var.marshal()).unwrap();
        assert_eq!(json, json!({"type": "RemoteVar", "value": "h"}));

        let decoded: WireValue = serde_json::from_value(json).unwrap();
        let decoded = decoded.into_value().unwrap();
        assert_eq!(decoded.as_remote_var().unwrap().name(), "h");
    }

    #[test]
    fn sequences_keep_order_and_length() {
        let seq: Value = vec![Value::Int(3), Value::from("b"), Value::None, Value::Bool(true)].into();
        let wire = seq.marshal();
        match &wire {
            WireValue::Seq(items) => {
                assert_eq!(items.len(), 4);
                assert_eq!(items[0], Value::Int(3).marshal());
                assert_eq!(items[1], Value::from("b").marshal());
                assert_eq!(items[3], Value::Bool(true).marshal());
            }
            _ => panic!("expected a sequence"),
        }
        round_trip(seq);
        round_trip(Value::Seq(vec![]));
        round_trip(vec![vec![1, 2], vec![3]].into());
    }

    #[test]
    fn sequence_is_bare_array() {
        let seq: Value = vec![1, 2].into();
        assert_eq!(
            serde_json::to_value(seq.marshal()).unwrap(),
            json!([{"type": "int", "value": 1}, {"type": "int", "value": 2}])
        );
    }

    #[test]
    fn unknown_type_fails() {
        let wire: WireValue = serde_json::from_value(json!({"type": "NotARealType", "value": 1})).unwrap();
        let err = wire.into_value().unwrap_err();
        assert_eq!(err, UnmarshalError::UnknownType("NotARealType".to_string()));
    }

    #[test]
    fn callable_is_not_a_value() {
        let wire = WireValue::Typed(TypedValue::callable());
        assert!(wire.is_callable());
        assert!(matches!(wire.into_value(), Err(UnmarshalError::UnknownType(_))));
    }

    #[test]
    fn mismatched_value_fails() {
        let wire = WireValue::typed(TYPE_INT, json!("five"));
        assert!(matches!(wire.into_value(), Err(UnmarshalError::InvalidValue { .. })));

        let wire = WireValue::typed(TYPE_INT, json!(1.5));
        assert!(matches!(wire.into_value(), Err(UnmarshalError::InvalidValue { .. })));

        let wire = WireValue::typed(TYPE_REMOTE_VAR, json!(7));
        assert!(matches!(wire.into_value(), Err(UnmarshalError::InvalidValue { .. })));
    }

    #[test]
    fn float_accepts_integral_json() {
        let wire = WireValue::typed(TYPE_FLOAT, json!(3));
        assert_eq!(wire.into_value().unwrap(), Value::Float(3.0));
    }

    #[test]
    fn nested_unknown_type_fails() {
        let wire: WireValue =
            serde_json::from_value(json!([{"type": "int", "value": 1}, {"type": "complex", "value": 1}])).unwrap();
        assert!(wire.into_value().is_err());
    }

    #[test]
    fn kwargs_round_trip() {
        let mut kwargs = Kwargs::new();
        kwargs.insert("gain".to_string(), Value::Float(0.5));
        kwargs.insert("channel".to_string(), Value::Int(2));
        let wire = marshal_kwargs(&kwargs);
        assert_eq!(unmarshal_kwargs(wire).unwrap(), kwargs);
    }
}
