// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Column schemas: ordered, named and typed column descriptions with optional
//! per-column defaults.

use serde::{Deserialize, Serialize};

use crate::{Error, EMPTY_ID};

use super::Value;

/// The type of a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DType {
    Int8,
    Int32,
    Int64,
    Float64,
    /// Three floats per cell, one per phase.
    Float64x3,
    Bool,
    Str,
}

impl DType {
    /// The value that marks a cell as not filled in.
    pub fn empty_value(&self) -> Value {
        match self {
            DType::Int8 => Value::Int(i8::MIN.into()),
            DType::Int32 => Value::Int(i32::MIN.into()),
            DType::Int64 => Value::Int(i64::MIN),
            DType::Float64 => Value::Float(f64::NAN),
            DType::Float64x3 => Value::Float3([f64::NAN; 3]),
            DType::Bool => Value::Bool(false),
            DType::Str => Value::Str(String::new()),
        }
    }

    /// The zero value of the type.
    pub fn zero_value(&self) -> Value {
        match self {
            DType::Int8 | DType::Int32 | DType::Int64 => Value::Int(0),
            DType::Float64 => Value::Float(0.0),
            DType::Float64x3 => Value::Float3([0.0; 3]),
            DType::Bool => Value::Bool(false),
            DType::Str => Value::Str(String::new()),
        }
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DType::Int8 => "int8",
            DType::Int32 => "int32",
            DType::Int64 => "int64",
            DType::Float64 => "float64",
            DType::Float64x3 => "float64x3",
            DType::Bool => "bool",
            DType::Str => "str",
        };
        write!(f, "{name}")
    }
}

/// The description of a single column.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnSpec {
    pub name: String,
    pub dtype: DType,
    pub default: Option<Value>,
}

/// An ordered set of columns.
///
/// Two schemas are equal when they have the same columns, in the same order,
/// with the same types and defaults.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Schema {
    columns: Vec<ColumnSpec>,
}

impl Schema {
    /// Creates an empty schema.  Columns are added with [`Schema::column`] and
    /// [`Schema::defaulted`].
    pub fn new() -> Self {
        Self::default()
    }

    /// A schema with just the `id` column, which defaults to [`EMPTY_ID`].
    pub fn with_id() -> Self {
        Self::new().defaulted("id", DType::Int32, EMPTY_ID)
    }

    /// Appends a column without a default.
    pub fn column(self, name: &str, dtype: DType) -> Self {
        self.push(ColumnSpec {
            name: name.to_string(),
            dtype,
            default: None,
        })
    }

    /// Appends a column with a default value.
    pub fn defaulted(self, name: &str, dtype: DType, default: impl Into<Value>) -> Self {
        self.push(ColumnSpec {
            name: name.to_string(),
            dtype,
            default: Some(default.into()),
        })
    }

    /// Appends every column of `other` that this schema does not have yet.
    pub fn extend(mut self, other: &Schema) -> Self {
        for spec in &other.columns {
            if self.position(&spec.name).is_none() {
                self.columns.push(spec.clone());
            }
        }
        self
    }

    /// Appends a column, replacing an existing column of the same name.
    pub fn push(mut self, spec: ColumnSpec) -> Self {
        match self.position(&spec.name) {
            Some(pos) => self.columns[pos] = spec,
            None => self.columns.push(spec),
        }
        self
    }

    /// Checks that every default fits the type of its column.
    pub fn validate(&self) -> Result<(), Error> {
        for spec in &self.columns {
            if let Some(default) = &spec.default {
                default.cast(spec.dtype).map_err(|e| {
                    Error::schema_mismatch(format!(
                        "Invalid default for column '{}': {}",
                        spec.name,
                        e.description()
                    ))
                })?;
            }
        }
        Ok(())
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Returns the column names, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the position of the named column.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Returns the named column's description.
    pub fn spec(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Returns true if both schemas have the same column names and types,
    /// ignoring defaults.
    pub fn is_compatible(&self, other: &Schema) -> bool {
        self.columns.len() == other.columns.len()
            && self
                .columns
                .iter()
                .zip(&other.columns)
                .all(|(a, b)| a.name == b.name && a.dtype == b.dtype)
    }

    /// Keeps only the columns whose names satisfy the predicate.
    pub fn retain(mut self, mut keep: impl FnMut(&str) -> bool) -> Self {
        self.columns.retain(|c| keep(&c.name));
        self
    }
}
