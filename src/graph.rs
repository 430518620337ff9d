// Compilation unit dependency graph
//
//  Copyright (C) 2014-2022 Ryan Specialty Group, LLC.
//
//  This file is part of swflink.
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Graph of compilation units and their typed dependencies.
//!
//! The [`UnitGraph`] is the linker's primary data structure:
//!   nodes are [`Unit`]s and
//!   edges are [`DepKindSet`]s,
//!     with at most one edge per ordered pair of units.
//! An index maps every exposed [`QName`] back to its defining unit so
//!   that references discovered during analysis can be resolved in
//!   constant time.
//!
//! Edges point from dependent to dependency.
//! [`UnitGraph::swf_order`] therefore emits a depth-first post-order
//!   walk,
//!     which places every definition before its first use in the
//!     output file.

use crate::library::LibraryId;
use crate::sym::QName;
use crate::unit::{DepKind, DepKindSet, Unit};
use fxhash::{FxHashMap, FxHashSet};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{DfsPostOrder, EdgeFiltered, EdgeRef};
use std::error::Error;
use std::fmt;

/// Handle to a [`Unit`] within a [`UnitGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitRef(NodeIndex);

impl From<NodeIndex> for UnitRef {
    fn from(index: NodeIndex) -> Self {
        Self(index)
    }
}

impl From<UnitRef> for NodeIndex {
    fn from(uref: UnitRef) -> Self {
        uref.0
    }
}

/// Dependency graph over all known compilation units.
#[derive(Debug, Default)]
pub struct UnitGraph {
    graph: DiGraph<Unit, DepKindSet>,
    index: FxHashMap<QName, NodeIndex>,
}

impl UnitGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(units: usize, deps: usize) -> Self {
        Self {
            graph: DiGraph::with_capacity(units, deps),
            index: FxHashMap::with_capacity_and_hasher(units, Default::default()),
        }
    }

    /// Add a unit,
    ///   indexing every name it exposes.
    pub fn add_unit(&mut self, unit: Unit) -> UnitRef {
        let names: Vec<QName> = unit.names().to_vec();
        let node = self.graph.add_node(unit);

        for name in names {
            let prev = self.index.insert(name, node);
            debug_assert!(prev.is_none(), "duplicate unit name");
        }

        UnitRef(node)
    }

    /// Retrieve a unit by handle.
    ///
    /// Panics if the handle did not come from this graph.
    #[inline]
    pub fn get(&self, unit: UnitRef) -> &Unit {
        &self.graph[unit.0]
    }

    /// Resolve a name to its defining unit.
    pub fn lookup(&self, name: &str) -> Option<UnitRef> {
        self.index.get(name).copied().map(UnitRef)
    }

    /// Add a dependency of `from` on `to`.
    ///
    /// If an edge already exists between the pair,
    ///   the kinds are merged into it.
    pub fn add_dep(&mut self, from: UnitRef, to: UnitRef, kinds: DepKindSet) {
        match self.graph.find_edge(from.0, to.0) {
            Some(edge) => {
                let weight = &mut self.graph[edge];
                *weight = weight.union(kinds);
            }
            None => {
                self.graph.add_edge(from.0, to.0, kinds);
            }
        }
    }

    /// Kinds of the dependency of `from` on `to`,
    ///   empty if there is none.
    pub fn dep_kinds(&self, from: UnitRef, to: UnitRef) -> DepKindSet {
        self.graph
            .find_edge(from.0, to.0)
            .map(|edge| self.graph[edge])
            .unwrap_or(DepKindSet::EMPTY)
    }

    /// Direct dependencies of a unit,
    ///   in the order the edges were added.
    pub fn direct_deps(&self, unit: UnitRef) -> impl Iterator<Item = UnitRef> + '_ {
        self.graph.neighbors(unit.0).map(UnitRef)
    }

    pub fn units(&self) -> impl Iterator<Item = (UnitRef, &Unit)> {
        self.graph
            .node_indices()
            .map(move |node| (UnitRef(node), &self.graph[node]))
    }

    #[inline]
    pub fn unit_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Dependency-respecting emission order rooted at `roots`.
    ///
    /// Performs a depth-first post-order walk from each root in turn,
    ///   sharing the visited set,
    ///   so every unit appears exactly once and strictly after all of
    ///   its dependencies.
    pub fn swf_order(&self, roots: &[UnitRef]) -> Vec<UnitRef> {
        let mut dfs = DfsPostOrder::empty(&self.graph);
        let mut order = Vec::new();

        for &root in roots {
            dfs.move_to(root.0);

            while let Some(node) = dfs.next(&self.graph) {
                order.push(UnitRef(node));
            }
        }

        order
    }

    /// Verify that inheritance dependencies are acyclic.
    ///
    /// Only edges carrying [`DepKind::Inheritance`] participate;
    ///   cycles through expression or signature references are normal
    ///   and permitted.
    pub fn check_inheritance_cycles(&self) -> Result<(), CycleError> {
        let inherit_only =
            EdgeFiltered::from_fn(&self.graph, |edge| edge.weight().has(DepKind::Inheritance));

        let sccs = tarjan_scc(&inherit_only);

        let cycles: Vec<Vec<QName>> = sccs
            .into_iter()
            .filter(|scc| {
                scc.len() > 1
                    || self
                        .graph
                        .find_edge(scc[0], scc[0])
                        .map(|edge| self.graph[edge].has(DepKind::Inheritance))
                        .unwrap_or(false)
            })
            .map(|scc| {
                scc.into_iter()
                    .map(|node| self.graph[node].name().clone())
                    .collect()
            })
            .collect();

        if cycles.is_empty() {
            Ok(())
        } else {
            Err(CycleError { cycles })
        }
    }

    /// Direct inheritance dependencies between libraries.
    ///
    /// A library depends on another when any of its units inherits
    ///   from a unit the other provides.
    /// Units outside any library are skipped.
    pub fn library_inherit_deps(&self) -> FxHashMap<LibraryId, FxHashSet<LibraryId>> {
        let mut deps: FxHashMap<LibraryId, FxHashSet<LibraryId>> = FxHashMap::default();

        for edge in self.graph.edge_references() {
            if !edge.weight().has(DepKind::Inheritance) {
                continue;
            }

            let from = self.graph[edge.source()].library();
            let to = self.graph[edge.target()].library();

            if let (Some(from), Some(to)) = (from, to) {
                if from != to {
                    deps.entry(from).or_default().insert(to);
                }
            }
        }

        deps
    }
}

/// Inheritance dependencies formed one or more cycles.
#[derive(Debug, PartialEq)]
pub struct CycleError {
    /// Units involved in each cycle.
    pub cycles: Vec<Vec<QName>>,
}

impl fmt::Display for CycleError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fmt,
            "inheritance dependencies contain {} cycle(s)",
            self.cycles.len()
        )
    }
}

impl Error for CycleError {}
