// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Row-level JSON read and write.

use std::sync::Arc;

use tracing::warn;

use crate::Error;

use super::{ColumnStore, Schema, Value};

impl ColumnStore {
    /// Returns the rows as a JSON array of `{column: value}` objects.
    pub fn to_json_rows(&self) -> serde_json::Value {
        serde_json::Value::Array(
            self.iter()
                .map(|r| serde_json::Value::Object(r.to_json()))
                .collect(),
        )
    }

    /// Reads rows written by [`ColumnStore::to_json_rows`].
    ///
    /// Columns without a default must be present in every row.  Keys that are
    /// not columns of `schema` are skipped.
    pub fn from_json_rows(schema: impl Into<Arc<Schema>>, json: &serde_json::Value) -> Result<Self, Error> {
        let schema = schema.into();
        let mut store = Self::new(schema.clone())?;
        let rows = json
            .as_array()
            .ok_or_else(|| Error::invalid_argument("Expected a JSON array of rows."))?;

        for (i, row) in rows.iter().enumerate() {
            let object = row
                .as_object()
                .ok_or_else(|| Error::invalid_argument(format!("Row {i} is not a JSON object.")))?;

            let mut cells: Vec<(&str, Value)> = Vec::with_capacity(schema.len());
            for spec in schema.columns() {
                match object.get(&spec.name) {
                    Some(json) => cells.push((spec.name.as_str(), Value::from_json(json, spec.dtype)?)),
                    None if spec.default.is_some() => {}
                    None => {
                        return Err(Error::schema_mismatch(format!(
                            "Row {i} is missing required column '{}'.",
                            spec.name
                        )))
                    }
                }
            }
            for key in object.keys().filter(|k| !schema.has_column(k)) {
                warn!(column = key.as_str(), row = i, "skipping unknown column");
            }
            store.push_row(&cells)?;
        }
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DType;

    fn schema() -> Schema {
        Schema::with_id()
            .column("u_rated", DType::Float64)
            .defaulted("note", DType::Str, "")
    }

    #[test]
    fn test_round_trip() -> Result<(), Error> {
        let mut store = ColumnStore::new(schema())?;
        store.push_row(&[("id", 1.into()), ("u_rated", 10.5.into()), ("note", "extra".into())])?;
        store.push_row(&[("id", 2.into())])?;

        let json = store.to_json_rows();
        assert_eq!(
            json,
            serde_json::json!([
                {"id": 1, "u_rated": 10.5, "note": "extra"},
                {"id": 2, "u_rated": null, "note": ""},
            ])
        );
        assert_eq!(ColumnStore::from_json_rows(schema(), &json)?, store);
        Ok(())
    }

    #[test]
    fn test_required_columns() -> Result<(), Error> {
        let json = serde_json::json!([{"id": 3, "unknown": 1}]);
        assert!(ColumnStore::from_json_rows(schema(), &json)
            .is_err_and(|e| e == Error::schema_mismatch("Row 0 is missing required column 'u_rated'.")));

        let json = serde_json::json!([{"u_rated": 1, "unknown": 1}]);
        let store = ColumnStore::from_json_rows(schema(), &json)?;
        assert_eq!(store.ids()?, [crate::EMPTY_ID]);
        assert_eq!(store.f64s("u_rated")?, [1.0]);
        Ok(())
    }
}
