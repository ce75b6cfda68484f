// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Scalar cell values, used wherever a single cell crosses the API boundary.

use crate::Error;

use super::DType;

/// A single cell value.
///
/// Integer columns of every width are read and written through `Int`; the
/// value is range-checked against the column's type on write.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Float3([f64; 3]),
    Bool(bool),
    Str(String),
}

impl Value {
    /// Converts the value so it fits a column of the given type.
    pub(crate) fn cast(&self, dtype: DType) -> Result<Value, Error> {
        let out_of_range = || {
            Error::invalid_argument(format!("Value {self:?} does not fit a {dtype} column."))
        };
        match (self, dtype) {
            (Value::Int(v), DType::Int8) => {
                i8::try_from(*v).map_err(|_| out_of_range())?;
                Ok(Value::Int(*v))
            }
            (Value::Int(v), DType::Int32) => {
                i32::try_from(*v).map_err(|_| out_of_range())?;
                Ok(Value::Int(*v))
            }
            (Value::Int(v), DType::Int64) => Ok(Value::Int(*v)),
            (Value::Int(v), DType::Float64) => Ok(Value::Float(*v as f64)),
            (Value::Float(v), DType::Float64) => Ok(Value::Float(*v)),
            (Value::Float(v), DType::Float64x3) => Ok(Value::Float3([*v; 3])),
            (Value::Float3(v), DType::Float64x3) => Ok(Value::Float3(*v)),
            (Value::Bool(v), DType::Bool) => Ok(Value::Bool(*v)),
            (Value::Str(v), DType::Str) => Ok(Value::Str(v.clone())),
            _ => Err(out_of_range()),
        }
    }

    /// Returns the integer held by the value, if any.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the float held by the value, if any.  Integers are widened.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Returns the widest column type the value fits.
    pub fn dtype(&self) -> DType {
        match self {
            Value::Int(_) => DType::Int64,
            Value::Float(_) => DType::Float64,
            Value::Float3(_) => DType::Float64x3,
            Value::Bool(_) => DType::Bool,
            Value::Str(_) => DType::Str,
        }
    }

    /// Compares two values, treating two NaNs as equal.
    pub(crate) fn eq_nan(&self, other: &Value) -> bool {
        fn same(a: f64, b: f64) -> bool {
            a == b || (a.is_nan() && b.is_nan())
        }
        match (self, other) {
            (Value::Float(a), Value::Float(b)) => same(*a, *b),
            (Value::Float3(a), Value::Float3(b)) => a.iter().zip(b).all(|(a, b)| same(*a, *b)),
            _ => self == other,
        }
    }

    /// Converts the value into its JSON form.  NaN becomes `null`, and
    /// infinities become the strings `"inf"` and `"-inf"`.
    pub fn to_json(&self) -> serde_json::Value {
        let float = |v: f64| match serde_json::Number::from_f64(v) {
            Some(number) => serde_json::Value::Number(number),
            None if v == f64::INFINITY => serde_json::Value::from("inf"),
            None if v == f64::NEG_INFINITY => serde_json::Value::from("-inf"),
            None => serde_json::Value::Null,
        };
        match self {
            Value::Int(v) => serde_json::Value::from(*v),
            Value::Float(v) => float(*v),
            Value::Float3(v) => serde_json::Value::Array(v.iter().map(|x| float(*x)).collect()),
            Value::Bool(v) => serde_json::Value::Bool(*v),
            Value::Str(v) => serde_json::Value::String(v.clone()),
        }
    }

    /// Reads a value of the given column type from its JSON form.
    pub fn from_json(json: &serde_json::Value, dtype: DType) -> Result<Value, Error> {
        let float = |j: &serde_json::Value| match j {
            serde_json::Value::Null => Some(f64::NAN),
            serde_json::Value::String(s) if s == "inf" => Some(f64::INFINITY),
            serde_json::Value::String(s) if s == "-inf" => Some(f64::NEG_INFINITY),
            other => other.as_f64(),
        };
        let value = match dtype {
            DType::Int8 | DType::Int32 | DType::Int64 => json.as_i64().map(Value::Int),
            DType::Float64 => float(json).map(Value::Float),
            DType::Float64x3 => match json.as_array().map(|a| a.as_slice()) {
                Some([a, b, c]) => match (float(a), float(b), float(c)) {
                    (Some(a), Some(b), Some(c)) => Some(Value::Float3([a, b, c])),
                    _ => None,
                },
                _ => None,
            },
            DType::Bool => json.as_bool().map(Value::Bool),
            DType::Str => json.as_str().map(|s| Value::Str(s.to_string())),
        };
        value
            .ok_or_else(|| Error::invalid_argument(format!("Can't read {json} as {dtype}.")))?
            .cast(dtype)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Float3([a, b, c]) => write!(f, "[{a}, {b}, {c}]"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "{v:?}"),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident as $target:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(<$target>::from(v))
                }
            }
        )*
    };
}

impl_from!(
    i8 => Int as i64,
    i32 => Int as i64,
    i64 => Int as i64,
    f64 => Float as f64,
    bool => Bool as bool,
    [f64; 3] => Float3 as [f64; 3],
    String => Str as String,
    &str => Str as String,
);
