// Dependency closure discovery
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

//! Fixed-point discovery of the link closure.
//!
//! The closure alternates two passes until neither grows the unit set:
//!
//!   1. a worklist walk that pulls in every direct dependency of every
//!        unit already in the closure; and
//!   2. a style pass that matches rules against all names now visible
//!        and pulls in the dependencies of newly activated rules.
//!
//! Style-induced dependencies have no natural edge in the graph,
//!   so they are attached as expression edges from the application's
//!   root class unit;
//!   this keeps the later frame walk
//!     ([`swf_order`](crate::graph::UnitGraph::swf_order))
//!   able to reach them from the main frame,
//!     and keeps them out of the earlier factory frames,
//!     whose stricter linkage rules would wrongly embed an externed
//!     pull.
//!
//! Each unit's build is started as soon as the unit is discovered so
//!   that analysis overlaps with discovery.
//! Unresolved references are reported once per unit,
//!   the first time the unit is processed.

use crate::build::{BuildCanceled, CancelToken, UnitBuilder};
use crate::graph::{UnitGraph, UnitRef};
use crate::problem::Problem;
use crate::style::{ActivatedStyleSheets, StyleRuleEngine};
use crate::sym::QName;
use crate::unit::{DepKind, DepKindSet};
use fxhash::FxHashSet;

/// Result of closure discovery.
#[derive(Debug)]
pub struct Closure {
    /// Every unit reachable from the roots,
    ///   including style-induced pulls.
    pub units: FxHashSet<UnitRef>,
    /// Style documents activated along the way,
    ///   in activation order.
    pub activated_styles: ActivatedStyleSheets,
}

/// Discover the full link closure of `roots`.
///
/// `anchor` is the unit style pulls attach to,
///   normally the application's root class unit.
///
/// Grows monotonically and terminates:
///   each outer round either adds at least one unit or is the last,
///   and the unit graph is finite.
pub fn resolve(
    graph: &mut UnitGraph,
    builder: &dyn UnitBuilder,
    styles: &mut dyn StyleRuleEngine,
    roots: &[UnitRef],
    anchor: UnitRef,
    cancel: &CancelToken,
    problems: &mut Vec<Problem>,
) -> Result<Closure, BuildCanceled> {
    let mut units: FxHashSet<UnitRef> = roots.iter().copied().collect();
    let mut activated = ActivatedStyleSheets::new();
    let mut reported: FxHashSet<UnitRef> = FxHashSet::default();

    for &root in roots {
        builder.start(root);
    }

    loop {
        discover_deps(graph, builder, &mut units, &mut reported, cancel, problems)?;

        if !style_pass(graph, builder, styles, anchor, &mut units, &mut activated, problems) {
            break;
        }
    }

    Ok(Closure {
        units,
        activated_styles: activated,
    })
}

/// Pull every direct dependency of every closure member into the
///   closure,
///     transitively.
fn discover_deps(
    graph: &UnitGraph,
    builder: &dyn UnitBuilder,
    units: &mut FxHashSet<UnitRef>,
    reported: &mut FxHashSet<UnitRef>,
    cancel: &CancelToken,
    problems: &mut Vec<Problem>,
) -> Result<(), BuildCanceled> {
    // Name-sorted worklist keeps problem order deterministic
    //   regardless of set iteration order.
    let mut work: Vec<UnitRef> = units.iter().copied().collect();
    work.sort_by(|a, b| graph.get(*a).name().cmp(graph.get(*b).name()));

    let mut visited: FxHashSet<UnitRef> = FxHashSet::default();
    let mut next = 0;

    while next < work.len() {
        if cancel.is_canceled() {
            return Err(BuildCanceled);
        }

        let unit = work[next];
        next += 1;

        if !visited.insert(unit) {
            continue;
        }

        if reported.insert(unit) {
            let from = graph.get(unit).name().clone();

            for to in graph.get(unit).unresolved_refs() {
                problems.push(Problem::UnresolvedReference {
                    from: from.clone(),
                    to: to.clone(),
                });
            }
        }

        for dep in graph.direct_deps(unit) {
            if units.insert(dep) {
                builder.start(dep);
            }
            work.push(dep);
        }
    }

    Ok(())
}

/// Run one round of style matching,
///   returning whether the closure grew.
fn style_pass(
    graph: &mut UnitGraph,
    builder: &dyn UnitBuilder,
    styles: &mut dyn StyleRuleEngine,
    anchor: UnitRef,
    units: &mut FxHashSet<UnitRef>,
    activated: &mut ActivatedStyleSheets,
    problems: &mut Vec<Problem>,
) -> bool {
    let mut visible: Vec<QName> = units
        .iter()
        .flat_map(|&unit| graph.get(unit).names().iter().cloned())
        .collect();
    visible.sort();

    let matched = styles.match_rules(&visible, problems);

    for doc in matched.activated {
        activated.add(doc);
    }

    let mut grew = false;

    for dep_name in matched.deps {
        match graph.lookup(dep_name.as_str()) {
            Some(dep) => {
                if units.insert(dep) {
                    grew = true;
                    builder.start(dep);
                    graph.add_dep(anchor, dep, DepKindSet::of(DepKind::Expression));
                }
            }
            None => problems.push(Problem::StyleReferenceNotFound(dep_name)),
        }
    }

    grew
}
