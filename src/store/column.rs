// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Typed column storage.

use crate::Error;

use super::{DType, Value};

/// The cells of one column.
#[derive(Clone, Debug)]
pub enum ColumnData {
    Int8(Vec<i8>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Float64(Vec<f64>),
    Float64x3(Vec<[f64; 3]>),
    Bool(Vec<bool>),
    Str(Vec<String>),
}

/// Applies `$body` to the inner vector of a column, and wraps the result back
/// into a column of the same type.
macro_rules! map_column {
    ($col:expr, $v:ident => $body:expr) => {
        match $col {
            ColumnData::Int8($v) => ColumnData::Int8($body),
            ColumnData::Int32($v) => ColumnData::Int32($body),
            ColumnData::Int64($v) => ColumnData::Int64($body),
            ColumnData::Float64($v) => ColumnData::Float64($body),
            ColumnData::Float64x3($v) => ColumnData::Float64x3($body),
            ColumnData::Bool($v) => ColumnData::Bool($body),
            ColumnData::Str($v) => ColumnData::Str($body),
        }
    };
}

/// Applies `$body` to the inner vector of a column.
macro_rules! with_column {
    ($col:expr, $v:ident => $body:expr) => {
        match $col {
            ColumnData::Int8($v) => $body,
            ColumnData::Int32($v) => $body,
            ColumnData::Int64($v) => $body,
            ColumnData::Float64($v) => $body,
            ColumnData::Float64x3($v) => $body,
            ColumnData::Bool($v) => $body,
            ColumnData::Str($v) => $body,
        }
    };
}

impl ColumnData {
    /// Creates a column with `len` copies of `value`.
    pub(crate) fn filled(dtype: DType, value: &Value, len: usize) -> Result<Self, Error> {
        let mut column = Self::new(dtype);
        for _ in 0..len {
            column.push(value)?;
        }
        Ok(column)
    }

    /// Creates an empty column of the given type.
    pub fn new(dtype: DType) -> Self {
        match dtype {
            DType::Int8 => ColumnData::Int8(vec![]),
            DType::Int32 => ColumnData::Int32(vec![]),
            DType::Int64 => ColumnData::Int64(vec![]),
            DType::Float64 => ColumnData::Float64(vec![]),
            DType::Float64x3 => ColumnData::Float64x3(vec![]),
            DType::Bool => ColumnData::Bool(vec![]),
            DType::Str => ColumnData::Str(vec![]),
        }
    }

    /// Creates a column from values, casting each to `dtype`.
    pub fn from_values(dtype: DType, values: &[Value]) -> Result<Self, Error> {
        let mut column = Self::new(dtype);
        for value in values {
            column.push(value)?;
        }
        Ok(column)
    }

    pub fn dtype(&self) -> DType {
        match self {
            ColumnData::Int8(_) => DType::Int8,
            ColumnData::Int32(_) => DType::Int32,
            ColumnData::Int64(_) => DType::Int64,
            ColumnData::Float64(_) => DType::Float64,
            ColumnData::Float64x3(_) => DType::Float64x3,
            ColumnData::Bool(_) => DType::Bool,
            ColumnData::Str(_) => DType::Str,
        }
    }

    pub fn len(&self) -> usize {
        with_column!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the cell at `row`.
    pub fn get(&self, row: usize) -> Option<Value> {
        match self {
            ColumnData::Int8(v) => v.get(row).map(|x| Value::Int((*x).into())),
            ColumnData::Int32(v) => v.get(row).map(|x| Value::Int((*x).into())),
            ColumnData::Int64(v) => v.get(row).map(|x| Value::Int(*x)),
            ColumnData::Float64(v) => v.get(row).map(|x| Value::Float(*x)),
            ColumnData::Float64x3(v) => v.get(row).map(|x| Value::Float3(*x)),
            ColumnData::Bool(v) => v.get(row).map(|x| Value::Bool(*x)),
            ColumnData::Str(v) => v.get(row).map(|x| Value::Str(x.clone())),
        }
    }

    /// Overwrites the cell at `row`.
    pub(crate) fn set(&mut self, row: usize, value: &Value) -> Result<(), Error> {
        let len = self.len();
        if row >= len {
            return Err(Error::internal(format!(
                "Row {row} out of bounds for column of length {len}."
            )));
        }
        let value = value.cast(self.dtype())?;
        match (self, value) {
            (ColumnData::Int8(v), Value::Int(x)) => v[row] = x as i8,
            (ColumnData::Int32(v), Value::Int(x)) => v[row] = x as i32,
            (ColumnData::Int64(v), Value::Int(x)) => v[row] = x,
            (ColumnData::Float64(v), Value::Float(x)) => v[row] = x,
            (ColumnData::Float64x3(v), Value::Float3(x)) => v[row] = x,
            (ColumnData::Bool(v), Value::Bool(x)) => v[row] = x,
            (ColumnData::Str(v), Value::Str(x)) => v[row] = x,
            (col, value) => {
                return Err(Error::internal(format!(
                    "Cast produced {value:?} for a {} column.",
                    col.dtype()
                )))
            }
        }
        Ok(())
    }

    /// Appends a cell.
    pub(crate) fn push(&mut self, value: &Value) -> Result<(), Error> {
        let value = value.cast(self.dtype())?;
        match (self, value) {
            // `cast` has range-checked the integers.
            (ColumnData::Int8(v), Value::Int(x)) => v.push(x as i8),
            (ColumnData::Int32(v), Value::Int(x)) => v.push(x as i32),
            (ColumnData::Int64(v), Value::Int(x)) => v.push(x),
            (ColumnData::Float64(v), Value::Float(x)) => v.push(x),
            (ColumnData::Float64x3(v), Value::Float3(x)) => v.push(x),
            (ColumnData::Bool(v), Value::Bool(x)) => v.push(x),
            (ColumnData::Str(v), Value::Str(x)) => v.push(x),
            (col, value) => {
                return Err(Error::internal(format!(
                    "Cast produced {value:?} for a {} column.",
                    col.dtype()
                )))
            }
        }
        Ok(())
    }

    /// Returns a new column with the cells at the given rows, in that order.
    pub(crate) fn take(&self, rows: &[usize]) -> Self {
        map_column!(self, v => rows.iter().filter_map(|r| v.get(*r).cloned()).collect())
    }

    /// Appends all cells of `other`, which must have the same type.
    pub(crate) fn extend_from(&mut self, other: &ColumnData) -> Result<(), Error> {
        match (self, other) {
            (ColumnData::Int8(a), ColumnData::Int8(b)) => a.extend_from_slice(b),
            (ColumnData::Int32(a), ColumnData::Int32(b)) => a.extend_from_slice(b),
            (ColumnData::Int64(a), ColumnData::Int64(b)) => a.extend_from_slice(b),
            (ColumnData::Float64(a), ColumnData::Float64(b)) => a.extend_from_slice(b),
            (ColumnData::Float64x3(a), ColumnData::Float64x3(b)) => a.extend_from_slice(b),
            (ColumnData::Bool(a), ColumnData::Bool(b)) => a.extend_from_slice(b),
            (ColumnData::Str(a), ColumnData::Str(b)) => a.extend_from_slice(b),
            (a, b) => {
                return Err(Error::schema_mismatch(format!(
                    "Can't append a {} column to a {} column.",
                    b.dtype(),
                    a.dtype()
                )))
            }
        }
        Ok(())
    }

    /// Keeps only the rows where `keep` is true.
    pub(crate) fn retain(&mut self, keep: &[bool]) {
        with_column!(self, v => {
            let mut flags = keep.iter();
            v.retain(|_| flags.next().copied().unwrap_or(false));
        })
    }

    /// Returns, per row, whether the cell holds the empty value of its type.
    ///
    /// Boolean columns have no empty value.
    pub fn empty_mask(&self) -> Vec<bool> {
        match self {
            ColumnData::Int8(v) => v.iter().map(|x| *x == i8::MIN).collect(),
            ColumnData::Int32(v) => v.iter().map(|x| *x == i32::MIN).collect(),
            ColumnData::Int64(v) => v.iter().map(|x| *x == i64::MIN).collect(),
            ColumnData::Float64(v) => v.iter().map(|x| x.is_nan()).collect(),
            ColumnData::Float64x3(v) => v.iter().map(|x| x.iter().all(|f| f.is_nan())).collect(),
            ColumnData::Bool(v) => vec![false; v.len()],
            ColumnData::Str(v) => v.iter().map(|x| x.is_empty()).collect(),
        }
    }

    /// Compares two columns cell by cell.  With `equal_nan`, NaN equals NaN.
    pub fn equals(&self, other: &ColumnData, equal_nan: bool) -> bool {
        fn same(a: f64, b: f64, equal_nan: bool) -> bool {
            a == b || (equal_nan && a.is_nan() && b.is_nan())
        }
        match (self, other) {
            (ColumnData::Float64(a), ColumnData::Float64(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| same(*x, *y, equal_nan))
            }
            (ColumnData::Float64x3(a), ColumnData::Float64x3(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|(x, y)| x.iter().zip(y).all(|(x, y)| same(*x, *y, equal_nan)))
            }
            (ColumnData::Int8(a), ColumnData::Int8(b)) => a == b,
            (ColumnData::Int32(a), ColumnData::Int32(b)) => a == b,
            (ColumnData::Int64(a), ColumnData::Int64(b)) => a == b,
            (ColumnData::Bool(a), ColumnData::Bool(b)) => a == b,
            (ColumnData::Str(a), ColumnData::Str(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_get() -> Result<(), Error> {
        let mut col = ColumnData::new(DType::Int8);
        col.push(&Value::Int(1))?;
        col.push(&Value::Int(-3))?;
        assert!(col.push(&Value::Int(1000)).is_err());
        assert_eq!(col.len(), 2);
        assert_eq!(col.get(1), Some(Value::Int(-3)));
        assert_eq!(col.get(2), None);

        col.set(0, &Value::Int(0))?;
        assert_eq!(col.get(0), Some(Value::Int(0)));
        assert!(col
            .set(5, &Value::Int(0))
            .is_err_and(|e| e == Error::internal("Row 5 out of bounds for column of length 2.")));
        Ok(())
    }

    #[test]
    fn test_take_retain_extend() -> Result<(), Error> {
        let mut col = ColumnData::from_values(
            DType::Float64,
            &[Value::Float(1.0), Value::Int(2), Value::Float(3.0)],
        )?;
        assert!(col
            .take(&[2, 0])
            .equals(&ColumnData::Float64(vec![3.0, 1.0]), false));

        col.retain(&[true, false, true]);
        assert!(col.equals(&ColumnData::Float64(vec![1.0, 3.0]), false));

        col.extend_from(&ColumnData::Float64(vec![f64::NAN]))?;
        assert!(col.equals(&ColumnData::Float64(vec![1.0, 3.0, f64::NAN]), true));
        assert!(!col.equals(&ColumnData::Float64(vec![1.0, 3.0, f64::NAN]), false));

        assert!(col
            .extend_from(&ColumnData::Int32(vec![1]))
            .is_err_and(|e| e == Error::schema_mismatch("Can't append a int32 column to a float64 column.")));
        Ok(())
    }

    #[test]
    fn test_empty_mask() {
        let col = ColumnData::Int32(vec![i32::MIN, 4, i32::MIN]);
        assert_eq!(col.empty_mask(), [true, false, true]);
        let col = ColumnData::Float64x3(vec![[f64::NAN; 3], [f64::NAN, 1.0, f64::NAN]]);
        assert_eq!(col.empty_mask(), [true, false]);
    }
}
