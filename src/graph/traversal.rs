// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module contains methods that help with graph traversal.
//!
//! Breadth-first searches visit neighbors in ascending id order, so results
//! that depend on visiting order are deterministic.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use crate::{Error, Id};

use super::{Graph, GraphEngine};

/// Traversal methods.
impl<G: GraphEngine> Graph<G> {
    /// Breadth-first search from all `starts` at once, never entering a node
    /// in `ignore`.  Returns the visiting order and each visited node's
    /// parent.
    fn bfs(&self, starts: &[usize], ignore: &HashSet<usize>) -> (Vec<usize>, HashMap<usize, usize>) {
        let mut visited: HashSet<usize> = starts.iter().copied().collect();
        let mut queue: VecDeque<usize> = starts.iter().copied().collect();
        let mut order = Vec::new();
        let mut parents = HashMap::new();

        while let Some(node) = queue.pop_front() {
            order.push(node);
            for neighbor in self.sorted_neighbors(node) {
                if ignore.contains(&neighbor) || !visited.insert(neighbor) {
                    continue;
                }
                parents.insert(neighbor, node);
                queue.push_back(neighbor);
            }
        }
        (order, parents)
    }

    fn internal_set(&self, nodes: &[Id]) -> Result<HashSet<usize>, Error> {
        nodes.iter().map(|n| self.external_to_internal(*n)).collect()
    }

    /// Returns the shortest path between two nodes and its length in branches.
    ///
    /// A node's path to itself is `([node], 0)`, whether or not the node
    /// exists.
    pub fn get_shortest_path(&self, start: Id, end: Id) -> Result<(Vec<Id>, usize), Error> {
        if start == end {
            return Ok((vec![start], 0));
        }
        let from = self.external_to_internal(start)?;
        let to = self.external_to_internal(end)?;

        let (_, parents) = self.bfs(&[from], &HashSet::new());
        if !parents.contains_key(&to) {
            return Err(Error::no_path_between_nodes(format!(
                "No path between nodes {start} and {end}."
            )));
        }

        let mut path = vec![to];
        let mut current = to;
        while current != from {
            current = *parents
                .get(&current)
                .ok_or_else(|| Error::internal(format!("Broken search tree at index {current}.")))?;
            path.push(current);
        }
        path.reverse();
        let distance = path.len() - 1;
        Ok((self.internals_to_externals(&path)?, distance))
    }

    /// Returns all simple paths between two nodes, sorted.
    ///
    /// Paths from a node to itself are empty by convention.
    pub fn get_all_paths(&self, start: Id, end: Id) -> Result<Vec<Vec<Id>>, Error> {
        if start == end {
            return Ok(vec![]);
        }
        let from = self.external_to_internal(start)?;
        let to = self.external_to_internal(end)?;

        let mut paths = self
            .engine
            .all_simple_paths(from, to)
            .iter()
            .map(|p| self.internals_to_externals(p))
            .collect::<Result<Vec<_>, _>>()?;
        if paths.is_empty() {
            return Err(Error::no_path_between_nodes(format!(
                "No path between nodes {start} and {end}."
            )));
        }
        paths.sort();
        paths.dedup();
        Ok(paths)
    }

    /// Returns the connected components that remain when `removed_nodes` are
    /// taken out of the graph.
    ///
    /// Each component is sorted, and components are ordered by their
    /// smallest node.  The graph itself is not modified.
    pub fn get_components(&self, removed_nodes: &[Id]) -> Result<Vec<Vec<Id>>, Error> {
        let removed = self.internal_set(removed_nodes)?;
        let mut seen: HashSet<usize> = HashSet::new();
        let mut components = Vec::new();

        for node in self.external_ids() {
            let internal = self.external_to_internal(node)?;
            if removed.contains(&internal) || seen.contains(&internal) {
                continue;
            }
            let (order, _) = self.bfs(&[internal], &removed);
            seen.extend(order.iter().copied());
            let mut component = self.internals_to_externals(&order)?;
            component.sort_unstable();
            components.push(component);
        }
        Ok(components)
    }

    /// Returns the nodes reachable from `node` without passing through any
    /// node in `nodes_to_ignore`, in breadth-first order.
    pub fn get_connected(
        &self,
        node: Id,
        nodes_to_ignore: &[Id],
        inclusive: bool,
    ) -> Result<Vec<Id>, Error> {
        let start = self.external_to_internal(node)?;
        let ignore = self.internal_set(nodes_to_ignore)?;
        let (order, _) = self.bfs(&[start], &ignore);
        let order: Vec<usize> = order
            .into_iter()
            .filter(|n| inclusive || *n != start)
            .collect();
        self.internals_to_externals(&order)
    }

    /// Returns the first of `candidates` met in a breadth-first search from
    /// `node`.
    pub fn find_first_connected(&self, node: Id, candidates: &[Id]) -> Result<Id, Error> {
        if candidates.contains(&node) {
            return Err(Error::invalid_argument(format!(
                "Node {node} is one of the candidates."
            )));
        }
        self.get_connected(node, &[], false)?
            .into_iter()
            .find(|n| candidates.contains(n))
            .ok_or_else(|| {
                Error::missing_entity(format!("None of the candidates is connected to node {node}."))
            })
    }

    /// Returns the nodes fed through `node` when the graph is fed from
    /// `start_nodes`.
    ///
    /// The branch towards the nearest start node is cut, and everything still
    /// reachable from `node` is downstream of it.
    pub fn get_downstream_nodes(
        &self,
        node: Id,
        start_nodes: &[Id],
        inclusive: bool,
    ) -> Result<Vec<Id>, Error> {
        if start_nodes.contains(&node) {
            return Err(Error::invalid_argument(format!("Node {node} is a start node.")));
        }
        let internal = self.external_to_internal(node)?;
        let mut starts: Vec<Id> = start_nodes.to_vec();
        starts.sort_unstable();
        let starts = starts
            .iter()
            .map(|n| self.external_to_internal(*n))
            .collect::<Result<Vec<_>, _>>()?;

        let (_, parents) = self.bfs(&starts, &HashSet::new());
        let upstream = match parents.get(&internal) {
            Some(parent) => vec![self.internal_to_external(*parent)?],
            None => vec![],
        };
        self.get_connected(node, &upstream, inclusive)
    }

    /// Returns one cycle per branch outside a breadth-first spanning forest.
    ///
    /// Each cycle starts and ends at the same node.  Parallel branches give a
    /// single two-node cycle `[a, b, a]` per node pair, however many there
    /// are.
    pub fn find_fundamental_cycles(&self) -> Result<Vec<Vec<Id>>, Error> {
        let mut parent: HashMap<Id, Id> = HashMap::new();
        let mut depth: HashMap<Id, usize> = HashMap::new();
        for node in self.external_ids() {
            if depth.contains_key(&node) {
                continue;
            }
            let root = self.external_to_internal(node)?;
            let (order, parents) = self.bfs(&[root], &HashSet::new());
            depth.insert(node, 0);
            for internal in order.into_iter().skip(1) {
                let child = self.internal_to_external(internal)?;
                let up = parents
                    .get(&internal)
                    .ok_or_else(|| Error::internal(format!("Broken search tree at index {internal}.")))?;
                let up = self.internal_to_external(*up)?;
                let up_depth = depth.get(&up).copied().unwrap_or_default();
                parent.insert(child, up);
                depth.insert(child, up_depth + 1);
            }
        }

        let mut pair_counts: BTreeMap<(Id, Id), usize> = BTreeMap::new();
        for (a, b) in self.all_branches() {
            if a != b {
                *pair_counts.entry((a.min(b), a.max(b))).or_default() += 1;
            }
        }

        let step = |node: Id| {
            parent
                .get(&node)
                .copied()
                .ok_or_else(|| Error::internal(format!("Node {node} has no parent in the forest.")))
        };
        let depth_of = |node: Id| depth.get(&node).copied().unwrap_or_default();

        let mut cycles = Vec::new();
        for ((u, v), count) in pair_counts {
            let in_tree = parent.get(&u) == Some(&v) || parent.get(&v) == Some(&u);
            if count <= usize::from(in_tree) {
                continue;
            }
            if in_tree {
                cycles.push(vec![u, v, u]);
                continue;
            }

            let (mut a, mut b) = (u, v);
            let mut from_u = vec![u];
            let mut from_v = vec![v];
            while depth_of(a) > depth_of(b) {
                a = step(a)?;
                from_u.push(a);
            }
            while depth_of(b) > depth_of(a) {
                b = step(b)?;
                from_v.push(b);
            }
            while a != b {
                a = step(a)?;
                from_u.push(a);
                b = step(b)?;
                from_v.push(b);
            }
            // Both walks end at the common ancestor.
            from_v.pop();
            from_u.extend(from_v.into_iter().rev());
            from_u.push(u);
            cycles.push(from_u);
        }
        Ok(cycles)
    }

    /// Runs `f` on the graph with `nodes` temporarily removed.  The nodes and
    /// all their branches are restored afterwards.
    pub fn tmp_remove_nodes<R>(&mut self, nodes: &[Id], f: impl FnOnce(&mut Self) -> R) -> Result<R, Error> {
        let unique: HashSet<Id> = nodes.iter().copied().collect();
        if unique.len() != nodes.len() {
            return Err(Error::invalid_argument(format!(
                "Duplicate nodes in {nodes:?}."
            )));
        }
        for node in nodes {
            self.external_to_internal(*node)?;
        }

        let mut removed_branches = Vec::new();
        for node in nodes {
            let internal = self.external_to_internal(*node)?;
            for neighbor in self.engine.neighbors(internal) {
                removed_branches.push((*node, self.internal_to_external(neighbor)?));
            }
            self.engine.remove_node(internal);
        }

        let result = f(self);

        for node in nodes {
            self.add_node(*node)?;
        }
        for (a, b) in removed_branches {
            self.add_branch(a, b)?;
        }
        Ok(result)
    }
}
