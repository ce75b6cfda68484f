// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! A schema-typed, columnar record container.
//!
//! A [`ColumnStore`] holds an ordered sequence of records that share a
//! [`Schema`].  Records are stored column by column.  Every entity kind of a
//! [Grid][crate::Grid] is backed by one of these.

mod column;
mod filter;
mod json;
pub mod records;
mod schema;
mod value;

pub use column::ColumnData;
pub use filter::{FilterMode, Predicate};
pub use schema::{ColumnSpec, DType, Schema};
pub use value::Value;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::{Error, Id};

/// New contents for a column: either one value for every targeted row, or one
/// value per targeted row.
#[derive(Clone, Debug, PartialEq)]
pub enum Values {
    Scalar(Value),
    Each(Vec<Value>),
}

impl Values {
    /// One value for every targeted row.
    pub fn scalar(value: impl Into<Value>) -> Self {
        Values::Scalar(value.into())
    }

    /// One value per targeted row.
    pub fn each<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Values::Each(values.into_iter().map(Into::into).collect())
    }

    fn at(&self, i: usize) -> Option<&Value> {
        match self {
            Values::Scalar(v) => Some(v),
            Values::Each(v) => v.get(i),
        }
    }

    fn check_len(&self, column: &str, expected: usize) -> Result<(), Error> {
        match self {
            Values::Each(v) if v.len() != expected => Err(Error::invalid_argument(format!(
                "Got {} values for column '{column}', expected {expected}.",
                v.len()
            ))),
            _ => Ok(()),
        }
    }
}

/// A homogeneous, schema-typed sequence of records.
#[derive(Clone, Debug)]
pub struct ColumnStore {
    schema: Arc<Schema>,
    columns: Vec<ColumnData>,
    len: usize,
}

/// Construction.
impl ColumnStore {
    /// Creates a store with no rows.
    pub fn new(schema: impl Into<Arc<Schema>>) -> Result<Self, Error> {
        let schema = schema.into();
        schema.validate()?;
        let columns = schema.columns().iter().map(|c| ColumnData::new(c.dtype)).collect();
        Ok(Self {
            schema,
            columns,
            len: 0,
        })
    }

    /// Creates a store with `n` rows.  Cells take the column default, or the
    /// empty value of the column type when there is none.
    pub fn empty(schema: impl Into<Arc<Schema>>, n: usize) -> Result<Self, Error> {
        Self::filled(schema.into(), n, |dtype| dtype.empty_value())
    }

    /// Creates a store with `n` rows.  Cells take the column default, or zero
    /// when there is none.
    pub fn zeros(schema: impl Into<Arc<Schema>>, n: usize) -> Result<Self, Error> {
        Self::filled(schema.into(), n, |dtype| dtype.zero_value())
    }

    fn filled(schema: Arc<Schema>, n: usize, fallback: impl Fn(&DType) -> Value) -> Result<Self, Error> {
        schema.validate()?;
        let columns = schema
            .columns()
            .iter()
            .map(|c| {
                let value = c.default.clone().unwrap_or_else(|| fallback(&c.dtype));
                ColumnData::filled(c.dtype, &value, n)
            })
            .collect::<Result<_, _>>()?;
        Ok(Self {
            schema,
            columns,
            len: n,
        })
    }

    /// Creates a store from named columns.
    ///
    /// Missing columns are filled with their defaults.  A missing column
    /// without a default, an unknown column or a column of the wrong type is a
    /// schema mismatch.
    pub fn from_columns(
        schema: impl Into<Arc<Schema>>,
        columns: Vec<(&str, ColumnData)>,
    ) -> Result<Self, Error> {
        let schema = schema.into();
        schema.validate()?;

        let mut given: HashMap<&str, ColumnData> = HashMap::new();
        let mut len = None;
        for (name, data) in columns {
            let Some(spec) = schema.spec(name) else {
                return Err(Error::schema_mismatch(format!("Unknown column '{name}'.")));
            };
            if spec.dtype != data.dtype() {
                return Err(Error::schema_mismatch(format!(
                    "Column '{name}' has type {}, expected {}.",
                    data.dtype(),
                    spec.dtype
                )));
            }
            match len {
                Some(l) if l != data.len() => {
                    return Err(Error::invalid_argument(format!(
                        "Column '{name}' has {} rows, expected {l}.",
                        data.len()
                    )))
                }
                _ => len = Some(data.len()),
            }
            given.insert(name, data);
        }
        let len = len.unwrap_or(0);

        let columns = schema
            .columns()
            .iter()
            .map(|spec| match given.remove(spec.name.as_str()) {
                Some(data) => Ok(data),
                None => match &spec.default {
                    Some(default) => ColumnData::filled(spec.dtype, default, len),
                    None => Err(Error::schema_mismatch(format!(
                        "Missing column '{}' without a default.",
                        spec.name
                    ))),
                },
            })
            .collect::<Result<_, _>>()?;

        Ok(Self {
            schema,
            columns,
            len,
        })
    }

    /// Appends one row given as `(column, value)` pairs.
    ///
    /// Columns that are not given take their default, or the empty value of
    /// their type.
    pub fn push_row(&mut self, cells: &[(&str, Value)]) -> Result<(), Error> {
        for (name, _) in cells {
            if !self.schema.has_column(name) {
                return Err(Error::invalid_argument(format!("Unknown column '{name}'.")));
            }
        }
        let mut row = Vec::with_capacity(self.columns.len());
        for spec in self.schema.columns() {
            let value = match cells.iter().find(|(name, _)| *name == spec.name) {
                Some((_, value)) => value.cast(spec.dtype)?,
                None => spec.default.clone().unwrap_or_else(|| spec.dtype.empty_value()),
            };
            row.push(value);
        }
        for (column, value) in self.columns.iter_mut().zip(&row) {
            column.push(value)?;
        }
        self.len += 1;
        Ok(())
    }

    /// Projects a store with a different, usually wider, schema down to
    /// `schema`.
    ///
    /// Shared columns are copied and must have the same type.  Columns that
    /// only `source` has are dropped.  Columns that only `schema` has take
    /// their default, or the empty value of their type.
    pub fn from_extended(schema: impl Into<Arc<Schema>>, source: &ColumnStore) -> Result<Self, Error> {
        let schema = schema.into();
        schema.validate()?;

        let mut columns = Vec::with_capacity(schema.len());
        for spec in schema.columns() {
            let data = match source.schema.position(&spec.name) {
                Some(pos) => {
                    let data = &source.columns[pos];
                    if data.dtype() != spec.dtype {
                        return Err(Error::schema_mismatch(format!(
                            "Column '{}' has type {}, expected {}.",
                            spec.name,
                            data.dtype(),
                            spec.dtype
                        )));
                    }
                    data.clone()
                }
                None => {
                    let value = spec.default.clone().unwrap_or_else(|| spec.dtype.empty_value());
                    ColumnData::filled(spec.dtype, &value, source.len)?
                }
            };
            columns.push(data);
        }

        let dropped: Vec<&str> = source.schema.names().filter(|n| !schema.has_column(n)).collect();
        if !dropped.is_empty() {
            debug!(?dropped, "dropping columns while projecting store");
        }

        Ok(Self {
            schema,
            columns,
            len: source.len,
        })
    }
}

/// Column and row access.
impl ColumnStore {
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the named column.
    pub fn column(&self, name: &str) -> Result<&ColumnData, Error> {
        self.schema
            .position(name)
            .map(|pos| &self.columns[pos])
            .ok_or_else(|| Error::invalid_argument(format!("Unknown column '{name}'.")))
    }

    /// Returns the named `int32` column.
    pub fn i32s(&self, name: &str) -> Result<&[i32], Error> {
        match self.column(name)? {
            ColumnData::Int32(v) => Ok(v),
            other => Err(Error::schema_mismatch(format!(
                "Column '{name}' has type {}, expected int32.",
                other.dtype()
            ))),
        }
    }

    /// Returns the named `int8` column.
    pub fn i8s(&self, name: &str) -> Result<&[i8], Error> {
        match self.column(name)? {
            ColumnData::Int8(v) => Ok(v),
            other => Err(Error::schema_mismatch(format!(
                "Column '{name}' has type {}, expected int8.",
                other.dtype()
            ))),
        }
    }

    /// Returns the named `float64` column.
    pub fn f64s(&self, name: &str) -> Result<&[f64], Error> {
        match self.column(name)? {
            ColumnData::Float64(v) => Ok(v),
            other => Err(Error::schema_mismatch(format!(
                "Column '{name}' has type {}, expected float64.",
                other.dtype()
            ))),
        }
    }

    /// Returns the `id` column.
    pub fn ids(&self) -> Result<&[Id], Error> {
        if !self.schema.has_column("id") {
            return Err(Error::schema_mismatch("Store has no 'id' column."));
        }
        self.i32s("id")
    }

    /// Returns the cell at `row` in the named column.
    pub fn value(&self, row: usize, name: &str) -> Result<Value, Error> {
        self.column(name)?.get(row).ok_or_else(|| {
            Error::invalid_argument(format!("Row {row} out of bounds for store of length {}.", self.len))
        })
    }

    /// Overwrites every cell of the named column.
    pub fn set_column(&mut self, name: &str, values: Values) -> Result<(), Error> {
        values.check_len(name, self.len)?;
        let pos = self
            .schema
            .position(name)
            .ok_or_else(|| Error::invalid_argument(format!("Unknown column '{name}'.")))?;
        for row in 0..self.len {
            if let Some(value) = values.at(row) {
                self.columns[pos].set(row, value)?;
            }
        }
        Ok(())
    }

    /// Returns, per row, whether the named column holds the empty value.
    pub fn is_empty_value(&self, name: &str) -> Result<Vec<bool>, Error> {
        Ok(self.column(name)?.empty_mask())
    }

    /// Returns the row positions holding the given id.
    pub fn rows_of_id(&self, id: Id) -> Result<Vec<usize>, Error> {
        Ok(self
            .ids()?
            .iter()
            .enumerate()
            .filter_map(|(row, x)| (*x == id).then_some(row))
            .collect())
    }

    /// Returns a new store with the given rows, in the given order.
    pub fn take(&self, rows: &[usize]) -> Self {
        let rows: Vec<usize> = rows.iter().copied().filter(|r| *r < self.len).collect();
        Self {
            schema: self.schema.clone(),
            columns: self.columns.iter().map(|c| c.take(&rows)).collect(),
            len: rows.len(),
        }
    }

    /// Returns a new store with the rows where `mask` is true.
    pub fn take_mask(&self, mask: &[bool]) -> Self {
        let rows: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(row, keep)| keep.then_some(row))
            .collect();
        self.take(&rows)
    }

    /// Removes, in place, the rows where `mask` is true.  Returns the number
    /// of removed rows.
    pub(crate) fn remove_mask(&mut self, mask: &[bool]) -> usize {
        let keep: Vec<bool> = (0..self.len).map(|r| !mask.get(r).copied().unwrap_or(false)).collect();
        for column in &mut self.columns {
            column.retain(&keep);
        }
        let removed = self.len - keep.iter().filter(|k| **k).count();
        self.len -= removed;
        removed
    }
}

/// Combination and bulk updates.
impl ColumnStore {
    /// Appends all rows of `other`, which must have a compatible schema.
    pub fn append(&mut self, other: &ColumnStore) -> Result<(), Error> {
        if !self.schema.is_compatible(&other.schema) {
            return Err(Error::schema_mismatch(format!(
                "Can't concatenate stores with columns [{}] and [{}].",
                self.schema.names().collect::<Vec<_>>().join(", "),
                other.schema.names().collect::<Vec<_>>().join(", ")
            )));
        }
        for (column, data) in self.columns.iter_mut().zip(&other.columns) {
            column.extend_from(data)?;
        }
        self.len += other.len;
        Ok(())
    }

    /// Returns a new store with the rows of `self` followed by the rows of
    /// each of `others`.
    pub fn concatenate(&self, others: &[&ColumnStore]) -> Result<Self, Error> {
        let mut out = self.clone();
        for other in others {
            out.append(other)?;
        }
        Ok(out)
    }

    /// Updates the rows with the given ids, in place.
    ///
    /// `Values::Each` holds one value per entry of `ids`, and each value goes
    /// to the row holding that id.  Unless `allow_missing` is set, every id
    /// must exist.  Nothing is modified when an error is returned.
    pub fn update_by_id(
        &mut self,
        ids: &[Id],
        updates: &[(&str, Values)],
        allow_missing: bool,
    ) -> Result<(), Error> {
        let mut positions = Vec::with_capacity(updates.len());
        for (name, values) in updates {
            let pos = self.schema.position(name).ok_or_else(|| {
                Error::invalid_argument(format!("Can't update unknown column '{name}'."))
            })?;
            values.check_len(name, ids.len())?;
            let dtype = self.columns[pos].dtype();
            for i in 0..ids.len() {
                if let Some(v) = values.at(i) {
                    v.cast(dtype)?;
                }
            }
            positions.push(pos);
        }

        let mut rows_by_id: HashMap<Id, Vec<usize>> = HashMap::new();
        for (row, id) in self.ids()?.iter().enumerate() {
            rows_by_id.entry(*id).or_default().push(row);
        }
        let missing: Vec<Id> = ids.iter().copied().filter(|id| !rows_by_id.contains_key(id)).collect();
        if !missing.is_empty() && !allow_missing {
            return Err(Error::missing_entity(format!(
                "Records with ids {missing:?} do not exist."
            )));
        }

        for (i, id) in ids.iter().enumerate() {
            let Some(rows) = rows_by_id.get(id) else {
                continue;
            };
            for ((_, values), pos) in updates.iter().zip(&positions) {
                if let Some(value) = values.at(i) {
                    for row in rows {
                        self.columns[*pos].set(*row, value)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Like [`ColumnStore::update_by_id`], but returns a copy of the updated
    /// rows instead of modifying `self`.
    pub fn get_updated_by_id(
        &self,
        ids: &[Id],
        updates: &[(&str, Values)],
        allow_missing: bool,
    ) -> Result<Self, Error> {
        let mut updated = self.clone();
        updated.update_by_id(ids, updates, allow_missing)?;
        updated.filter(&[Predicate::any_of("id", ids.iter().copied())], FilterMode::And)
    }

    /// Compares two stores.  With `equal_nan`, NaN cells equal each other.
    ///
    /// Defaults are not compared.
    pub fn equals(&self, other: &ColumnStore, equal_nan: bool) -> bool {
        self.len == other.len
            && self.schema.is_compatible(&other.schema)
            && self
                .columns
                .iter()
                .zip(&other.columns)
                .all(|(a, b)| a.equals(b, equal_nan))
    }
}

/// Equality treats two NaNs as equal.
impl PartialEq for ColumnStore {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other, true)
    }
}

/// Compares two stores column by column.
pub fn array_equal(a: &ColumnStore, b: &ColumnStore, equal_nan: bool) -> bool {
    a.equals(b, equal_nan)
}
