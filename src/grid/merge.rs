// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Merging one grid into another.

use std::str::FromStr;

use tracing::debug;

use crate::store::{ColumnStore, Values};
use crate::{EntityKind, Error, GraphEngine, Id, EMPTY_ID};

use super::Grid;

/// How the ids of the merged grid are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MergeMode {
    /// Ids are kept as they are, and must not collide with existing ids.
    KeepIds,
    /// Every id, and every column referring to an id, is shifted by the id
    /// counter of the receiving grid.
    #[default]
    RecalculateIds,
}

impl FromStr for MergeMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keep_ids" => Ok(Self::KeepIds),
            "recalculate_ids" => Ok(Self::RecalculateIds),
            _ => Err(Error::invalid_configuration(format!("Unknown merge mode '{s}'."))),
        }
    }
}

impl std::fmt::Display for MergeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::KeepIds => write!(f, "keep_ids"),
            Self::RecalculateIds => write!(f, "recalculate_ids"),
        }
    }
}

impl<G: GraphEngine> Grid<G> {
    /**
    Appends every entity of `other` to this grid.

    With [`MergeMode::RecalculateIds`], the ids of `other` and the columns that
    refer to them are shifted by this grid's id counter first, so the merged
    entities never collide with existing ones.  Stores of kinds without known
    foreign-key columns can only be merged when
    [`allow_unsupported_merge_kinds`][crate::GridConfig] is set, and then
    only their `id` column is shifted.

    With [`MergeMode::KeepIds`], ids are kept, and any id that exists in both
    grids is an error.

    Every store of `other` must exist in this grid with the same columns.
    Nothing is modified when an error is returned.
    */
    pub fn merge<E: GraphEngine>(&mut self, other: &Grid<E>, mode: MergeMode) -> Result<(), Error> {
        let _span = self.enter();
        for (kind, store) in other.stores() {
            let ours = self.store(kind)?;
            if !ours.schema().is_compatible(store.schema()) {
                return Err(Error::schema_mismatch(format!(
                    "The '{kind}' stores of the two grids have different columns."
                )));
            }
        }

        let incoming: Vec<(EntityKind, ColumnStore)> = match mode {
            MergeMode::RecalculateIds => other
                .stores()
                .map(|(kind, store)| Ok((kind.clone(), self.offset_ids(kind, store, self.id_counter)?)))
                .collect::<Result<_, Error>>()?,
            MergeMode::KeepIds => {
                let ours = self.all_ids()?;
                let mut shared: Vec<Id> = other.all_ids()?.intersection(&ours).copied().collect();
                if !shared.is_empty() {
                    shared.truncate(10);
                    return Err(Error::duplicate_identifier(format!(
                        "Both grids have entities with ids {shared:?}."
                    )));
                }
                other
                    .stores()
                    .map(|(kind, store)| (kind.clone(), store.clone()))
                    .collect()
            }
        };

        // Stores are ordered by kind, so nodes are appended before the
        // branches that refer to them.
        let mut merged = self.clone();
        for (kind, rows) in &incoming {
            merged.append(kind, rows, false)?;
        }
        *self = merged;
        debug!(%mode, id_counter = self.id_counter, "merged grid");
        Ok(())
    }

    /// Returns a copy of `store` with its ids and foreign keys shifted by
    /// `offset`.  Empty cells stay empty.
    fn offset_ids(&self, kind: &EntityKind, store: &ColumnStore, offset: Id) -> Result<ColumnStore, Error> {
        let columns: &[&str] = match kind.foreign_keys() {
            Some(columns) => columns,
            None if self.config.allow_unsupported_merge_kinds => &[],
            None => {
                return Err(Error::unsupported_entity_kind(format!(
                    "Can't recalculate the ids of '{kind}' entities."
                )))
            }
        };

        let mut shifted = store.clone();
        for column in std::iter::once("id").chain(columns.iter().copied()) {
            if !shifted.schema().has_column(column) {
                continue;
            }
            let values = shifted
                .i32s(column)?
                .iter()
                .map(|id| match *id {
                    EMPTY_ID => Ok(EMPTY_ID),
                    id => id.checked_add(offset).ok_or_else(|| {
                        Error::invalid_argument(format!("Id {id} overflows when shifted by {offset}."))
                    }),
                })
                .collect::<Result<Vec<Id>, Error>>()?;
            shifted.set_column(column, Values::each(values))?;
        }
        Ok(shifted)
    }
}
