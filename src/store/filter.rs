// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Predicate-based row selection.

use crate::{Error, Id};

use super::{ColumnStore, Value};

/// How multiple predicates are combined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FilterMode {
    /// A row matches when every predicate matches.
    #[default]
    And,
    /// A row matches when any predicate matches.
    Or,
}

/// A condition on one column: the cell must equal one of the given values.
#[derive(Clone, Debug)]
pub struct Predicate {
    column: String,
    values: Vec<Value>,
}

impl Predicate {
    /// The cell must equal `value`.
    pub fn new(column: &str, value: impl Into<Value>) -> Self {
        Self {
            column: column.to_string(),
            values: vec![value.into()],
        }
    }

    /// The cell must equal one of `values`.  An empty set matches nothing.
    pub fn any_of<V: Into<Value>>(column: &str, values: impl IntoIterator<Item = V>) -> Self {
        Self {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    fn mask(&self, store: &ColumnStore) -> Result<Vec<bool>, Error> {
        let column = store.column(&self.column)?;
        let dtype = column.dtype();
        let values = self
            .values
            .iter()
            .map(|v| v.cast(dtype))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((0..store.len())
            .map(|row| column.get(row).is_some_and(|cell| values.contains(&cell)))
            .collect())
    }
}

/// Filtering.
impl ColumnStore {
    /// Returns, per row, whether the row matches the predicates.
    pub fn filter_mask(&self, predicates: &[Predicate], mode: FilterMode) -> Result<Vec<bool>, Error> {
        let Some((first, rest)) = predicates.split_first() else {
            return Err(Error::invalid_argument("No predicates given to filter on."));
        };
        let mut mask = first.mask(self)?;
        for predicate in rest {
            let other = predicate.mask(self)?;
            for (m, o) in mask.iter_mut().zip(other) {
                *m = match mode {
                    FilterMode::And => *m && o,
                    FilterMode::Or => *m || o,
                };
            }
        }
        Ok(mask)
    }

    /// Returns a new store with the matching rows, in their original order.
    pub fn filter(&self, predicates: &[Predicate], mode: FilterMode) -> Result<Self, Error> {
        Ok(self.take_mask(&self.filter_mask(predicates, mode)?))
    }

    /// Returns a new store with the rows that do *not* match.
    pub fn exclude(&self, predicates: &[Predicate], mode: FilterMode) -> Result<Self, Error> {
        let mask: Vec<bool> = self
            .filter_mask(predicates, mode)?
            .into_iter()
            .map(|m| !m)
            .collect();
        Ok(self.take_mask(&mask))
    }

    /// Returns the rows with the given ids, in their original order.
    pub fn filter_ids(&self, ids: &[Id]) -> Result<Self, Error> {
        self.filter(&[Predicate::any_of("id", ids.iter().copied())], FilterMode::And)
    }

    /// Returns the single row that matches the predicates.
    pub fn get(&self, predicates: &[Predicate], mode: FilterMode) -> Result<Self, Error> {
        let found = self.filter(predicates, mode)?;
        match found.len() {
            1 => Ok(found),
            0 => Err(Error::missing_entity(format!(
                "No record matches {}.",
                describe(predicates)
            ))),
            n => Err(Error::ambiguous_record(format!(
                "{n} records match {}.",
                describe(predicates)
            ))),
        }
    }

    /// Returns the single row with the given id.
    pub fn get_by_id(&self, id: Id) -> Result<Self, Error> {
        self.get(&[Predicate::new("id", id)], FilterMode::And)
    }
}

fn describe(predicates: &[Predicate]) -> String {
    predicates
        .iter()
        .map(|p| match p.values.as_slice() {
            [v] => format!("{}={v}", p.column),
            vs => format!(
                "{} in [{}]",
                p.column,
                vs.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ")
            ),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ColumnData, DType, Schema};

    fn nodes() -> Result<ColumnStore, Error> {
        ColumnStore::from_columns(
            Schema::with_id()
                .column("u_rated", DType::Float64)
                .defaulted("node_type", DType::Int8, 0i8),
            vec![
                ("id", ColumnData::Int32(vec![1, 2, 3, 4, 4])),
                ("u_rated", ColumnData::Float64(vec![10.0, 20.0, 10.0, f64::NAN, 30.0])),
                ("node_type", ColumnData::Int8(vec![1, 0, 0, 0, 1])),
            ],
        )
    }

    #[test]
    fn test_filter() -> Result<(), Error> {
        let store = nodes()?;

        let found = store.filter(&[Predicate::new("u_rated", 10.0)], FilterMode::And)?;
        assert_eq!(found.ids()?, [1, 3]);

        let found = store.filter(&[Predicate::any_of("id", [3, 1])], FilterMode::And)?;
        assert_eq!(found.ids()?, [1, 3]);

        let found = store.filter(
            &[Predicate::new("u_rated", 10), Predicate::new("node_type", 1i8)],
            FilterMode::And,
        )?;
        assert_eq!(found.ids()?, [1]);

        let found = store.filter(
            &[Predicate::new("u_rated", 20.0), Predicate::new("node_type", 1i8)],
            FilterMode::Or,
        )?;
        assert_eq!(found.ids()?, [1, 2, 4]);

        assert!(store.filter_ids(&[])?.is_empty());
        assert_eq!(store.filter(&[Predicate::new("u_rated", f64::NAN)], FilterMode::And)?.len(), 0);

        assert!(store
            .filter(&[], FilterMode::And)
            .is_err_and(|e| e == Error::invalid_argument("No predicates given to filter on.")));
        assert!(store
            .filter(&[Predicate::new("nope", 1)], FilterMode::And)
            .is_err_and(|e| e == Error::invalid_argument("Unknown column 'nope'.")));
        Ok(())
    }

    #[test]
    fn test_exclude() -> Result<(), Error> {
        let store = nodes()?;
        let rest = store.exclude(&[Predicate::any_of("id", [1, 4])], FilterMode::And)?;
        assert_eq!(rest.ids()?, [2, 3]);
        Ok(())
    }

    #[test]
    fn test_get() -> Result<(), Error> {
        let store = nodes()?;
        assert_eq!(store.get_by_id(2)?.f64s("u_rated")?, [20.0]);
        assert!(store
            .get_by_id(7)
            .is_err_and(|e| e == Error::missing_entity("No record matches id=7.")));
        assert!(store
            .get_by_id(4)
            .is_err_and(|e| e == Error::ambiguous_record("2 records match id=4.")));
        assert!(store
            .get(&[Predicate::any_of("id", [1, 2])], FilterMode::And)
            .is_err_and(|e| e == Error::ambiguous_record("2 records match id in [1, 2].")));
        Ok(())
    }
}
