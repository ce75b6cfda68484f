// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! A compact text notation for small grids, one branch per line.
//!
//! ```text
//! S1 2                  substation 1, node 2, a line with a generated id
//! 2 3 open              open on the to-side
//! 3 4 transformer,95    a transformer with id 95
//! ```

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::entities::branch_ends;
use crate::store::{ColumnStore, Values};
use crate::{EntityKind, Error, GraphEngine, Id, SUBSTATION_NODE};

use super::Grid;

/// One parsed line.
struct TxtBranch {
    from_node: Id,
    to_node: Id,
    id: Option<Id>,
    kind: EntityKind,
    open: bool,
}

/// Parses a node token, returning the id and whether it is a substation.
fn parse_node(token: &str) -> Result<(Id, bool), Error> {
    let (digits, substation) = match token.strip_prefix('S') {
        Some(rest) => (rest, true),
        None => (token, false),
    };
    let id = digits
        .parse::<Id>()
        .map_err(|_| Error::invalid_argument(format!("Invalid node id '{token}'.")))?;
    Ok((id, substation))
}

fn parse_line(
    line: &str,
    nodes: &mut BTreeMap<Id, bool>,
) -> Result<TxtBranch, Error> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if !(2..=3).contains(&tokens.len()) {
        return Err(Error::invalid_argument(format!(
            "Expected two nodes and optional branch details, got '{line}'."
        )));
    }

    let mut ends = [0; 2];
    for (end, token) in ends.iter_mut().zip(&tokens) {
        let (id, substation) = parse_node(token)?;
        if *nodes.entry(id).or_insert(substation) != substation {
            return Err(Error::invalid_argument(format!(
                "Node {id} is written both with and without the substation marker."
            )));
        }
        *end = id;
    }

    let mut branch = TxtBranch {
        from_node: ends[0],
        to_node: ends[1],
        id: None,
        kind: EntityKind::Line,
        open: false,
    };
    for part in tokens.get(2).into_iter().flat_map(|t| t.split(',')) {
        if part == "open" {
            branch.open = true;
        } else if let Ok(id) = part.parse::<Id>() {
            branch.id = Some(id);
        } else {
            let kind = EntityKind::from_name(part);
            if !kind.is_branch() {
                return Err(Error::invalid_argument(format!(
                    "Unknown branch detail '{part}' in '{line}'."
                )));
            }
            branch.kind = kind;
        }
    }
    Ok(branch)
}

/// The text notation.
impl<G: GraphEngine> Grid<G> {
    /**
    Builds a grid from lines in the text notation.

    Each entry may hold several lines; blank lines are skipped.  A line is
    `<from> <to> [details]`, where a node prefixed with `S` is a substation
    node, and details are a comma-separated mix of a branch id, a branch
    kind name (`line` by default) and `open`, which opens the branch on its
    to-side.

    Branches without an id get consecutive ids after the largest node or
    branch id, in line order.  Node ids and branch ids must not overlap.
    */
    pub fn from_txt(lines: &[&str]) -> Result<Self, Error> {
        let mut nodes = BTreeMap::new();
        let branches = lines
            .iter()
            .flat_map(|entry| entry.lines())
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| parse_line(line, &mut nodes))
            .collect::<Result<Vec<_>, Error>>()?;

        let explicit: BTreeSet<Id> = branches.iter().filter_map(|b| b.id).collect();
        if let Some(id) = explicit.iter().find(|id| nodes.contains_key(id)) {
            return Err(Error::duplicate_identifier(format!(
                "Branch id {id} is also a node id."
            )));
        }
        let largest = nodes
            .keys()
            .chain(&explicit)
            .copied()
            .max()
            .unwrap_or_default();
        let mut last_id = largest;

        let mut grid = Self::empty()?;
        let _span = grid.enter();

        let mut node_rows = ColumnStore::empty(grid.store(&EntityKind::Node)?.schema().clone(), nodes.len())?;
        node_rows.set_column("id", Values::each(nodes.keys().copied()))?;
        node_rows.set_column(
            "node_type",
            Values::each(nodes.values().map(|s| if *s { SUBSTATION_NODE } else { 0 })),
        )?;
        grid.append(&EntityKind::Node, &node_rows, false)?;

        let mut per_kind: BTreeMap<EntityKind, Vec<(Id, &TxtBranch)>> = BTreeMap::new();
        for branch in &branches {
            let id = match branch.id {
                Some(id) => id,
                None => {
                    last_id = last_id.checked_add(1).ok_or_else(|| {
                        Error::invalid_argument(format!("Can't generate a branch id after {last_id}."))
                    })?;
                    last_id
                }
            };
            per_kind.entry(branch.kind.clone()).or_default().push((id, branch));
        }
        for (kind, rows) in per_kind {
            let mut store = ColumnStore::empty(grid.store(&kind)?.schema().clone(), rows.len())?;
            store.set_column("id", Values::each(rows.iter().map(|(id, _)| *id)))?;
            store.set_column("from_node", Values::each(rows.iter().map(|(_, b)| b.from_node)))?;
            store.set_column("to_node", Values::each(rows.iter().map(|(_, b)| b.to_node)))?;
            store.set_column("from_status", Values::scalar(1))?;
            store.set_column(
                "to_status",
                Values::each(rows.iter().map(|(_, b)| if b.open { 0 } else { 1 })),
            )?;
            grid.append(&kind, &store, false)?;
        }

        grid.check_ids()?;
        debug!(nodes = nodes.len(), branches = branches.len(), "built grid from text");
        Ok(grid)
    }

    /// Renders one text-notation line per branch.
    fn txt_lines(&self) -> Result<Vec<String>, Error> {
        let substations: BTreeSet<Id> = self.substation_nodes()?.into_iter().collect();
        let node = |id: Id| {
            if substations.contains(&id) {
                format!("S{id}")
            } else {
                id.to_string()
            }
        };

        let mut lines = Vec::new();
        for (kind, store) in self.branch_arrays() {
            for branch in branch_ends(store)? {
                let mut line = format!("{} {} {}", node(branch.from_node), node(branch.to_node), branch.id);
                if kind != EntityKind::Line {
                    line.push_str(&format!(",{kind}"));
                }
                if branch.from_status == 0 || branch.to_status == 0 {
                    line.push_str(",open");
                }
                lines.push(line);
            }
        }
        Ok(lines)
    }
}

impl<G: GraphEngine> std::fmt::Display for Grid<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lines = self.txt_lines().map_err(|_| std::fmt::Error)?;
        write!(f, "{}", lines.join("\n"))
    }
}
