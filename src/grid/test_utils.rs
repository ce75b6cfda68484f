// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module is only compiled when running unit tests and contains the grid
//! fixtures shared by all tests of the `grid` module.

use crate::store::{ColumnStore, Values};
use crate::{EntityKind, Error, Grid, SUBSTATION_NODE};

/// Creates `n` rows of a standard kind, with the given columns set and the
/// rest left at their defaults or empty.
pub(crate) fn rows(kind: &EntityKind, n: usize, columns: &[(&str, Values)]) -> Result<ColumnStore, Error> {
    let schema = kind
        .schema()
        .ok_or_else(|| Error::internal(format!("No standard schema for '{kind}'.")))?;
    let mut store = ColumnStore::empty(schema, n)?;
    for (name, values) in columns {
        store.set_column(name, values.clone())?;
    }
    Ok(store)
}

/// Builds a ring of medium voltage nodes with one substation and a 400V node.
///
/// ```text
/// Nodes:    (substation) 101 --- 102 --- 103 -|- 104 --- 105 --- 101
///                                {-}
///                                106
///
/// Branches: (substation) *** 201 *** 202 *** 203 *** 601 *** 204 ***
///                                301
/// ```
///
/// Line 203 is open on both sides, 301 is a transformer and 601 a link.
/// Loads 401..404 sit on nodes 102..105 and source 501 on node 101.
pub(crate) fn build_basic_grid() -> Result<Grid, Error> {
    let mut grid: Grid = Grid::empty()?;

    let substation = rows(
        &EntityKind::Node,
        1,
        &[
            ("id", Values::scalar(101)),
            ("u_rated", Values::scalar(10_500.0)),
            ("node_type", Values::scalar(SUBSTATION_NODE)),
        ],
    )?;
    grid.append(&EntityKind::Node, &substation, false)?;

    let nodes = rows(
        &EntityKind::Node,
        5,
        &[
            ("id", Values::each([102, 103, 104, 105, 106])),
            ("u_rated", Values::each([10_500.0, 10_500.0, 10_500.0, 10_500.0, 400.0])),
        ],
    )?;
    grid.append(&EntityKind::Node, &nodes, false)?;

    let lines = rows(
        &EntityKind::Line,
        4,
        &[
            ("id", Values::each([201, 202, 203, 204])),
            ("from_status", Values::each([1, 1, 0, 1])),
            ("to_status", Values::each([1, 1, 0, 1])),
            ("from_node", Values::each([101, 102, 103, 101])),
            ("to_node", Values::each([102, 103, 104, 105])),
            ("i_n", Values::scalar(200.0)),
            ("r1", Values::scalar(0.1)),
            ("x1", Values::scalar(0.03)),
            ("c1", Values::scalar(0.0)),
            ("tan1", Values::scalar(0.0)),
        ],
    )?;
    grid.append(&EntityKind::Line, &lines, false)?;

    let transformer = rows(
        &EntityKind::Transformer,
        1,
        &[
            ("id", Values::scalar(301)),
            ("from_status", Values::scalar(1)),
            ("to_status", Values::scalar(1)),
            ("from_node", Values::scalar(102)),
            ("to_node", Values::scalar(106)),
        ],
    )?;
    grid.append(&EntityKind::Transformer, &transformer, false)?;

    let link = rows(
        &EntityKind::Link,
        1,
        &[
            ("id", Values::scalar(601)),
            ("from_status", Values::scalar(1)),
            ("to_status", Values::scalar(1)),
            ("from_node", Values::scalar(104)),
            ("to_node", Values::scalar(105)),
        ],
    )?;
    grid.append(&EntityKind::Link, &link, false)?;

    let loads = rows(
        &EntityKind::SymLoad,
        4,
        &[
            ("id", Values::each([401, 402, 403, 404])),
            ("node", Values::each([102, 103, 104, 105])),
            ("type", Values::scalar(1)),
            ("p_specified", Values::scalar(1_000_000.0)),
            ("q_specified", Values::scalar(1_000_000.0)),
            ("status", Values::scalar(1)),
        ],
    )?;
    grid.append(&EntityKind::SymLoad, &loads, false)?;

    let source = rows(
        &EntityKind::Source,
        1,
        &[
            ("id", Values::scalar(501)),
            ("node", Values::scalar(101)),
            ("status", Values::scalar(1)),
            ("u_ref", Values::scalar(0.0)),
        ],
    )?;
    grid.append(&EntityKind::Source, &source, false)?;

    grid.check_ids()?;
    Ok(grid)
}

/// Builds a network fed from one 150kV node through a three-winding
/// transformer, with a 20kV and a 10kV ring behind it.
///
/// ```text
/// (substation) 101            /102 --- 104 -|- 105 --- 106 --- 102
///                 \{  301  }
///                             \103 --- 107 -|- 108 --- 109 --- 103
/// ```
pub(crate) fn build_grid_with_three_winding() -> Result<Grid, Error> {
    let mut grid: Grid = Grid::empty()?;

    let nodes = rows(
        &EntityKind::Node,
        6,
        &[
            ("id", Values::each([104, 105, 106, 107, 108, 109])),
            ("u_rated", Values::scalar(10_500.0)),
        ],
    )?;
    grid.append(&EntityKind::Node, &nodes, false)?;

    let substations = rows(
        &EntityKind::Node,
        3,
        &[
            ("id", Values::each([101, 102, 103])),
            ("u_rated", Values::each([150_000.0, 20_000.0, 10_000.0])),
            ("node_type", Values::scalar(SUBSTATION_NODE)),
        ],
    )?;
    grid.append(&EntityKind::Node, &substations, false)?;

    let lines = rows(
        &EntityKind::Line,
        8,
        &[
            ("id", Values::each([201, 202, 203, 204, 205, 206, 207, 208])),
            ("from_status", Values::scalar(1)),
            ("to_status", Values::each([1, 0, 1, 1, 1, 0, 1, 1])),
            ("from_node", Values::each([102, 104, 106, 102, 103, 107, 109, 103])),
            ("to_node", Values::each([104, 105, 105, 106, 107, 108, 108, 109])),
            ("i_n", Values::scalar(200.0)),
            ("r1", Values::scalar(0.1)),
            ("x1", Values::scalar(0.03)),
            ("c1", Values::scalar(0.0)),
            ("tan1", Values::scalar(0.0)),
        ],
    )?;
    grid.append(&EntityKind::Line, &lines, false)?;

    let three_winding = rows(
        &EntityKind::ThreeWindingTransformer,
        1,
        &[
            ("id", Values::scalar(301)),
            ("node_1", Values::scalar(101)),
            ("node_2", Values::scalar(102)),
            ("node_3", Values::scalar(103)),
            ("status_1", Values::scalar(1)),
            ("status_2", Values::scalar(1)),
            ("status_3", Values::scalar(1)),
            ("u1", Values::scalar(150_000.0)),
            ("u2", Values::scalar(20_000.0)),
            ("u3", Values::scalar(10_000.0)),
        ],
    )?;
    grid.append(&EntityKind::ThreeWindingTransformer, &three_winding, false)?;

    let loads = rows(
        &EntityKind::SymLoad,
        6,
        &[
            ("id", Values::each([401, 402, 403, 404, 405, 406])),
            ("node", Values::each([104, 105, 106, 107, 108, 109])),
            ("type", Values::scalar(1)),
            ("p_specified", Values::scalar(1_000_000.0)),
            ("q_specified", Values::scalar(1_000_000.0)),
            ("status", Values::scalar(1)),
        ],
    )?;
    grid.append(&EntityKind::SymLoad, &loads, false)?;

    let source = rows(
        &EntityKind::Source,
        1,
        &[
            ("id", Values::scalar(501)),
            ("node", Values::scalar(101)),
            ("status", Values::scalar(1)),
            ("u_ref", Values::scalar(0.0)),
        ],
    )?;
    grid.append(&EntityKind::Source, &source, false)?;

    grid.check_ids()?;
    Ok(grid)
}

#[test]
fn test_three_winding_fixture() -> Result<(), Error> {
    let grid = build_grid_with_three_winding()?;
    assert_eq!(grid.graphs().complete_graph().nr_branches(), 11);
    assert_eq!(grid.graphs().active_graph().nr_branches(), 9);
    Ok(())
}
