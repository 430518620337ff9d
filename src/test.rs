// Test doubles shared across modules
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

//! Test doubles shared by the unit tests of multiple modules.

use crate::build::{Fragment, UnitBuilder};
use crate::graph::{UnitGraph, UnitRef};
use crate::problem::Problem;
use crate::style::{StyleMatch, StyleRuleEngine};
use crate::sym::QName;
use crate::unit::{BuildState, DepKind, DepKindSet, Unit, UnitType};
use fxhash::{FxHashMap, FxHashSet};
use std::cell::RefCell;

/// Builder double whose "content" is the unit's name.
///
/// Records starts so tests can assert on discovery behavior.
pub struct StubBuilder {
    names: FxHashMap<UnitRef, QName>,
    started: RefCell<FxHashSet<UnitRef>>,
    fail_build: FxHashSet<UnitRef>,
    fail_content: FxHashSet<UnitRef>,
}

impl StubBuilder {
    pub fn for_graph(graph: &UnitGraph) -> Self {
        Self {
            names: graph
                .units()
                .map(|(uref, unit)| (uref, unit.name().clone()))
                .collect(),
            started: Default::default(),
            fail_build: Default::default(),
            fail_content: Default::default(),
        }
    }

    pub fn failing_build(mut self, unit: UnitRef) -> Self {
        self.fail_build.insert(unit);
        self
    }

    pub fn failing_content(mut self, unit: UnitRef) -> Self {
        self.fail_content.insert(unit);
        self
    }

    pub fn was_started(&self, unit: UnitRef) -> bool {
        self.started.borrow().contains(&unit)
    }

    fn name(&self, unit: UnitRef) -> QName {
        self.names[&unit].clone()
    }
}

impl UnitBuilder for StubBuilder {
    fn start(&self, unit: UnitRef) {
        self.started.borrow_mut().insert(unit);
    }

    fn finish(&self, unit: UnitRef, _problems: &mut Vec<Problem>) -> BuildState {
        if self.fail_build.contains(&unit) {
            BuildState::Failed
        } else {
            BuildState::Built
        }
    }

    fn content(&self, unit: UnitRef) -> Result<Fragment, Problem> {
        if self.fail_content.contains(&unit) {
            Err(Problem::UnitContentFailed(self.name(unit)))
        } else {
            Ok(self.name(unit).as_str().as_bytes().to_vec())
        }
    }
}

/// Style engine double with one rule per subject name,
///   each pulling a fixed dependency list and activating at most
///   once.
///
/// Counts matching rounds so tests can observe fixed-point bounds.
pub struct StubStyles {
    rules: Vec<(&'static str, &'static str, Vec<&'static str>)>,
    fired: FxHashSet<&'static str>,
    rounds: usize,
}

impl StubStyles {
    pub fn new(rules: Vec<(&'static str, &'static str, Vec<&'static str>)>) -> Self {
        Self {
            rules,
            fired: Default::default(),
            rounds: 0,
        }
    }

    /// Number of times `match_rules` has been invoked.
    pub fn rounds(&self) -> usize {
        self.rounds
    }
}

impl StyleRuleEngine for StubStyles {
    fn match_rules(&mut self, visible: &[QName], _problems: &mut Vec<Problem>) -> StyleMatch {
        self.rounds += 1;

        let vis: FxHashSet<&str> = visible.iter().map(QName::as_str).collect();
        let mut m = StyleMatch::default();

        for (doc, subject, deps) in &self.rules {
            if vis.contains(subject) && self.fired.insert(doc) {
                m.activated.push(doc.to_string());
                m.deps.extend(deps.iter().map(|d| QName::from(*d)));
            }
        }

        m
    }
}

/// Build a graph from `(name, type)` units and
///   `(from, to, kind)` dependencies.
pub fn graph_of(
    units: &[(&'static str, UnitType)],
    deps: &[(&str, &str, DepKind)],
) -> (UnitGraph, FxHashMap<&'static str, UnitRef>) {
    let mut graph = UnitGraph::new();
    let refs: FxHashMap<&'static str, UnitRef> = units
        .iter()
        .map(|&(name, ty)| (name, graph.add_unit(Unit::new(name, ty))))
        .collect();

    for &(from, to, kind) in deps {
        graph.add_dep(refs[from], refs[to], DepKindSet::of(kind));
    }

    (graph, refs)
}
