// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The composite entity store.
//!
//! A [`Grid`] owns one [`ColumnStore`] per entity kind, the id counter and the
//! [`GraphContainer`] that mirrors the node and branch stores.  The impl
//! blocks are spread over the submodules by operation group.

mod creation;
mod extend;
mod json;
mod merge;
mod modify;
mod orientation;
mod search;
pub mod solver;
mod text;

#[cfg(test)]
pub(crate) mod test_utils;

pub use extend::GridSchema;
pub use merge::MergeMode;

use std::collections::BTreeMap;

use tracing::Span;

use crate::store::{ColumnStore, Value};
use crate::{EntityKind, Error, GraphContainer, GraphEngine, GridConfig, Id, PetgraphEngine};

/**
A power grid: typed entity stores, kept consistent with each other and with
a pair of graphs.

Ids are unique across all stores.  Entities are added with
[`append`][Grid::append] and removed with the `delete_*` methods, which also
remove every entity that refers to the deleted one.  Both graphs are updated
in the same call.

Every grid carries its own tracing span; the span's `grid` field is the
configured [`GridConfig::name`].
*/
#[derive(Clone, Debug)]
pub struct Grid<G: GraphEngine = PetgraphEngine> {
    stores: BTreeMap<EntityKind, ColumnStore>,
    scalars: BTreeMap<String, Value>,
    id_counter: Id,
    graphs: GraphContainer<G>,
    config: GridConfig,
    span: Span,
}

/// Accessors.
impl<G: GraphEngine> Grid<G> {
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Returns the largest id handed out so far.
    pub fn id_counter(&self) -> Id {
        self.id_counter
    }

    pub fn graphs(&self) -> &GraphContainer<G> {
        &self.graphs
    }

    /// Returns the stores, ordered by kind.
    pub fn stores(&self) -> impl Iterator<Item = (&EntityKind, &ColumnStore)> {
        self.stores.iter()
    }

    pub fn has_store(&self, kind: &EntityKind) -> bool {
        self.stores.contains_key(kind)
    }

    /// Returns the store of the given kind.
    pub fn store(&self, kind: &EntityKind) -> Result<&ColumnStore, Error> {
        self.stores
            .get(kind)
            .ok_or_else(|| Error::missing_entity(format!("Grid has no '{kind}' store.")))
    }

    pub(crate) fn store_mut(&mut self, kind: &EntityKind) -> Result<&mut ColumnStore, Error> {
        self.stores
            .get_mut(kind)
            .ok_or_else(|| Error::missing_entity(format!("Grid has no '{kind}' store.")))
    }

    /// Returns the kinds of the stores that match `filter`, ordered by kind.
    pub(crate) fn kinds_where(&self, filter: impl Fn(&EntityKind) -> bool) -> Vec<EntityKind> {
        self.stores.keys().filter(|k| filter(k)).cloned().collect()
    }

    /// Returns every field of the grid that is not a store, starting with
    /// the id counter.
    pub fn scalar_fields(&self) -> Vec<(String, Value)> {
        std::iter::once(("id_counter".to_string(), Value::from(self.id_counter)))
            .chain(self.scalars.iter().map(|(k, v)| (k.clone(), v.clone())))
            .collect()
    }

    /// Returns the value of an extra scalar field.
    pub fn scalar(&self, name: &str) -> Result<&Value, Error> {
        self.scalars
            .get(name)
            .ok_or_else(|| Error::missing_entity(format!("Grid has no field '{name}'.")))
    }

    /// Overwrites an extra scalar field.  The value must fit the type of the
    /// field's default.
    pub fn set_scalar(&mut self, name: &str, value: impl Into<Value>) -> Result<(), Error> {
        let current = self
            .scalars
            .get_mut(name)
            .ok_or_else(|| Error::missing_entity(format!("Grid has no field '{name}'.")))?;
        *current = value.into().cast(current.dtype())?;
        Ok(())
    }

    /// Enters the grid's span until the returned guard is dropped.
    pub(crate) fn enter(&self) -> tracing::span::EnteredSpan {
        self.span.clone().entered()
    }
}
