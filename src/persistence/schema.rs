use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// The declared type of a [`super::Field`]. Every non-null cell of the
/// field must carry a [`Value`] of this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Int,
    Str,
    Float,
    Bool,
}

impl Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let datatype = match self {
            DataType::Int => "INT",
            DataType::Str => "STR",
            DataType::Float => "FLOAT",
            DataType::Bool => "BOOL",
        };
        write!(f, "{}", datatype)
    }
}

/// Key constraints that can be declared on a field.
///
/// [`FieldKey::Null`] is the "no constraint" tag. It carries no rule and is
/// dropped from the key set as soon as any real constraint is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKey {
    #[serde(rename = "PRIMARY KEY")]
    Primary,
    #[serde(rename = "AUTO_INCREMENT")]
    Increment,
    #[serde(rename = "UNIQUE")]
    Unique,
    #[serde(rename = "NOT NULL")]
    NotNull,
    #[serde(rename = "NULL")]
    Null,
}

impl Display for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let key = match self {
            FieldKey::Primary => "PRIMARY KEY",
            FieldKey::Increment => "AUTO_INCREMENT",
            FieldKey::Unique => "UNIQUE",
            FieldKey::NotNull => "NOT NULL",
            FieldKey::Null => "NULL",
        };
        write!(f, "{}", key)
    }
}

/// A single non-null cell value.
///
/// Serialized untagged, so a column of values persists as a plain JSON
/// array of scalars. Nulls are modelled as `Option<Value>::None` by callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Bool(_) => DataType::Bool,
            Value::Int(_) => DataType::Int,
            Value::Float(_) => DataType::Float,
            Value::Str(_) => DataType::Str,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn is_finite(&self) -> bool {
        //! False only for a NaN or infinite [`Value::Float`].

        match self {
            Value::Float(value) => value.is_finite(),
            _ => true,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Bool(value) => write!(f, "{}", value),
            Value::Int(value) => write!(f, "{}", value),
            Value::Float(value) => write!(f, "{}", value),
            Value::Str(value) => write!(f, "{}", value),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}
