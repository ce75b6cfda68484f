// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Row views and iterators over the rows of a [`ColumnStore`].

use crate::{Error, Id};

use super::{ColumnStore, Value};

/// A read-only view of one row.
#[derive(Clone, Copy, Debug)]
pub struct Record<'a> {
    pub(crate) store: &'a ColumnStore,
    pub(crate) row: usize,
}

impl<'a> Record<'a> {
    /// Returns the position of the row in its store.
    pub fn row(&self) -> usize {
        self.row
    }

    /// Returns the cell in the named column.
    pub fn get(&self, column: &str) -> Result<Value, Error> {
        self.store.value(self.row, column)
    }

    /// Returns the row's id.
    pub fn id(&self) -> Result<Id, Error> {
        self.store
            .ids()?
            .get(self.row)
            .copied()
            .ok_or_else(|| Error::internal(format!("Row {} out of bounds.", self.row)))
    }

    /// Returns the row as a `{column: value}` JSON object.
    pub fn to_json(&self) -> serde_json::Map<String, serde_json::Value> {
        self.store
            .schema
            .names()
            .zip(&self.store.columns)
            .filter_map(|(name, column)| column.get(self.row).map(|v| (name.to_string(), v.to_json())))
            .collect()
    }
}

/// A mutable view of one row.  Writes go straight to the backing store.
#[derive(Debug)]
pub struct RecordMut<'a> {
    pub(crate) store: &'a mut ColumnStore,
    pub(crate) row: usize,
}

impl<'a> RecordMut<'a> {
    /// Returns the cell in the named column.
    pub fn get(&self, column: &str) -> Result<Value, Error> {
        self.store.value(self.row, column)
    }

    /// Overwrites the cell in the named column.
    pub fn set(&mut self, column: &str, value: impl Into<Value>) -> Result<(), Error> {
        let pos = self
            .store
            .schema
            .position(column)
            .ok_or_else(|| Error::invalid_argument(format!("Unknown column '{column}'.")))?;
        self.store.columns[pos].set(self.row, &value.into())
    }
}

/// An iterator over the rows of a [`ColumnStore`].
pub struct Records<'a> {
    pub(crate) store: &'a ColumnStore,
    pub(crate) iter: std::ops::Range<usize>,
}

impl<'a> Iterator for Records<'a> {
    type Item = Record<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|row| Record {
            store: self.store,
            row,
        })
    }
}

/// Row access.
impl ColumnStore {
    /// Returns a view of the row at the given position.
    pub fn record(&self, row: usize) -> Option<Record<'_>> {
        (row < self.len).then_some(Record { store: self, row })
    }

    /// Returns a mutable view of the row at the given position.
    pub fn record_mut(&mut self, row: usize) -> Option<RecordMut<'_>> {
        (row < self.len).then_some(RecordMut { store: self, row })
    }

    /// Returns an iterator over the rows.
    pub fn iter(&self) -> Records<'_> {
        Records {
            store: self,
            iter: 0..self.len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ColumnData, DType, Schema};

    #[test]
    fn test_records() -> Result<(), Error> {
        let mut store = ColumnStore::from_columns(
            Schema::with_id().column("p", DType::Float64),
            vec![
                ("id", ColumnData::Int32(vec![5, 6])),
                ("p", ColumnData::Float64(vec![1.0, f64::NAN])),
            ],
        )?;

        let ids = store.iter().map(|r| r.id()).collect::<Result<Vec<_>, _>>()?;
        assert_eq!(ids, [5, 6]);

        let json = store.record(1).map(|r| r.to_json());
        assert_eq!(
            json.map(serde_json::Value::Object),
            Some(serde_json::json!({"id": 6, "p": null}))
        );

        if let Some(mut record) = store.record_mut(0) {
            record.set("p", 2.5)?;
            assert!(record
                .set("q", 1.0)
                .is_err_and(|e| e == Error::invalid_argument("Unknown column 'q'.")));
        }
        assert_eq!(store.f64s("p")?[0], 2.5);
        assert!(store.record(2).is_none());
        Ok(())
    }
}
