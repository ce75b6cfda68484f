// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module is only compiled when running unit tests and contains features
//! that are shared by all tests of the `graph` module.
//!
//! - the `TestBranch` type, which implements the `HasFromTo` trait.
//! - the `GraphBuilder`, which builds small graphs declaratively.

use crate::{Error, Graph, HasFromTo, HasStatus, Id};

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct TestBranch(pub(crate) Id, pub(crate) Id, pub(crate) bool);

impl HasStatus for TestBranch {
    fn is_closed(&self) -> bool {
        self.2
    }
}

impl HasFromTo for TestBranch {
    fn from_node(&self) -> Id {
        self.0
    }

    fn to_node(&self) -> Id {
        self.1
    }
}

/// A builder for small test graphs.
pub(crate) struct GraphBuilder {
    nodes: Vec<Id>,
    branches: Vec<TestBranch>,
}

impl GraphBuilder {
    pub(crate) fn new() -> Self {
        GraphBuilder {
            nodes: Vec::new(),
            branches: Vec::new(),
        }
    }

    pub(crate) fn nodes(&mut self, nodes: &[Id]) -> &mut Self {
        self.nodes.extend_from_slice(nodes);
        self
    }

    /// Adds a closed branch.
    pub(crate) fn connect(&mut self, from_node: Id, to_node: Id) -> &mut Self {
        self.branches.push(TestBranch(from_node, to_node, true));
        self
    }

    /// Adds an open branch, which only the complete graph contains.
    pub(crate) fn connect_open(&mut self, from_node: Id, to_node: Id) -> &mut Self {
        self.branches.push(TestBranch(from_node, to_node, false));
        self
    }

    pub(crate) fn build(&self, active_only: bool) -> Result<Graph, Error> {
        Graph::from_arrays(
            self.nodes.iter().copied(),
            self.branches.iter().copied(),
            std::iter::empty::<crate::Branch3Ends>(),
            active_only,
        )
    }
}

/// Builds a complete graph from node ids and closed branches.
pub(crate) fn graph_from_pairs(nodes: &[Id], pairs: &[(Id, Id)]) -> Result<Graph, Error> {
    let mut builder = GraphBuilder::new();
    builder.nodes(nodes);
    for (a, b) in pairs {
        builder.connect(*a, *b);
    }
    builder.build(false)
}

/// Two radial routes out of node 1:
///
/// ```text
/// 1 --- 2 --- 3
/// |
/// 5 --- 4
/// ```
pub(crate) fn graph_with_2_routes() -> Result<Graph, Error> {
    GraphBuilder::new()
        .nodes(&[1, 2, 3, 4, 5])
        .connect(1, 2)
        .connect(2, 3)
        .connect(1, 5)
        .connect(5, 4)
        .build(false)
}

#[test]
fn test_builder_respects_status() -> Result<(), Error> {
    let mut builder = GraphBuilder::new();
    builder.nodes(&[1, 2, 3]).connect(1, 2).connect_open(2, 3);
    assert_eq!(builder.build(false)?.nr_branches(), 2);
    assert_eq!(builder.build(true)?.nr_branches(), 1);
    Ok(())
}
