// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

/*!
# Power Grid Store

This is a library for holding the topology of a power grid in typed,
columnar stores, together with a graph index that answers connectivity
questions about it.

## Stores

Every entity kind of a grid (nodes, lines, transformers, loads, sensors ...)
lives in a [`ColumnStore`]: an ordered sequence of records with a
[`Schema`] of named, typed columns.  Stores can be filtered with
[`Predicate`]s, looked up by id, concatenated, updated in bulk by id and
compared with NaN-aware equality.

## Graphs

A [`Grid`] keeps a [`GraphContainer`] in sync with its stores.  The container
holds two [`Graph`]s over the same nodes: the *complete* graph, with every
branch, and the *active* graph, with only the branches that are closed on all
sides.  Graphs answer shortest-path, all-paths, component, downstream and
fundamental-cycle queries in terms of entity ids.

Graph storage is behind the [`GraphEngine`] trait.  The default engine,
[`PetgraphEngine`], is backed by `petgraph`.

## Grid

The [`Grid`] owns one store per [`EntityKind`] and a global id counter.  All
mutations go through it, so ids stay unique across every store, deletes
cascade to the entities that refer to the deleted one, and the graphs always
match the stores.

```
use power_grid_store::{EntityKind, Error, Grid};

fn main() -> Result<(), Error> {
    let grid: Grid = Grid::from_txt(&["S1 2", "2 3", "3 4 open", "S1 4"])?;
    assert_eq!(grid.store(&EntityKind::Node)?.len(), 4);

    let (path, length) = grid.graphs().active_graph().get_shortest_path(1, 3)?;
    assert_eq!((path, length), (vec![1, 2, 3], 2));
    assert!(!grid.graphs().active_graph().has_branch(3, 4));
    Ok(())
}
```
*/

mod config;
pub use config::GridConfig;

mod entities;
pub use entities::{
    Branch3Ends, BranchEnds, Category, EntityKind, HasFromTo, HasStatus, HasThreeTerminals,
    STANDARD_KINDS, SUBSTATION_NODE,
};

mod error;
pub use error::{Error, ErrorKind};

mod graph;
pub use graph::{Graph, GraphContainer, GraphEngine, PetgraphEngine};

mod grid;
pub use grid::{solver, Grid, GridSchema, MergeMode};

pub mod store;
pub use store::{array_equal, ColumnData, ColumnStore, DType, FilterMode, Predicate, Schema, Value, Values};

/// The type of entity ids.
pub type Id = i32;

/// The id value of a record that has not been given an id yet.
pub const EMPTY_ID: Id = i32::MIN;
