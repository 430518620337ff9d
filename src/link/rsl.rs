// Runtime shared library selection
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

//! Selection of the runtime shared libraries an application must load.
//!
//! An application's configuration may name far more runtime shared
//!   libraries
//!     (RSLs)
//!   than it actually uses.
//! Unused ones are demoted to placeholders
//!   (kept in the list so that relative load order is preserved for
//!     tooling,
//!       but not loaded at startup)
//!   in three steps:
//!
//!   1. compatibility filtering drops libraries whose minimum
//!        supported version exceeds the configured floor;
//!   2. a library that contributed no unit to the closure and is not
//!        force-loaded is marked unused; and
//!   3. a backward rescue pass re-promotes any unused library that an
//!        earlier-listed used library inherits from,
//!          transitively,
//!        since a superclass must be defined before its subclass
//!        regardless of list position.
//!
//! Relative order within both partitions always matches the
//!   configured order.

use crate::graph::UnitGraph;
use crate::library::{LibraryId, LibraryStore, Version};
use crate::problem::Problem;
use fxhash::{FxHashMap, FxHashSet};

/// Load location of a runtime shared library,
///   with failover URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RslUrl {
    pub primary: String,
    pub fallbacks: Vec<String>,
}

impl RslUrl {
    pub fn new(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            fallbacks: vec![],
        }
    }

    pub fn with_fallback(mut self, url: impl Into<String>) -> Self {
        self.fallbacks.push(url.into());
        self
    }

    /// Signed content is served as `.swz` and verified against the
    ///   signed digest.
    pub fn is_signed(&self) -> bool {
        self.primary.ends_with(".swz")
    }
}

/// One configured runtime shared library.
#[derive(Debug, Clone, PartialEq)]
pub struct RslDescriptor {
    pub library: LibraryId,
    /// Load even if no unit of the library made it into the closure.
    pub force_load: bool,
    pub urls: Vec<RslUrl>,
}

impl RslDescriptor {
    pub fn new(library: LibraryId) -> Self {
        Self {
            library,
            force_load: false,
            urls: vec![],
        }
    }

    pub fn force_load(mut self) -> Self {
        self.force_load = true;
        self
    }

    pub fn with_url(mut self, url: RslUrl) -> Self {
        self.urls.push(url);
        self
    }
}

/// Configured RSLs split into those that must load and those kept
///   only as placeholders.
#[derive(Debug, Default, PartialEq)]
pub struct RslPartition {
    pub required: Vec<RslDescriptor>,
    pub placeholder: Vec<RslDescriptor>,
}

/// Partition configured RSLs into required and placeholder sets.
///
/// `contributing` is the set of libraries that contributed at least
///   one unit to the link closure.
pub fn partition(
    descriptors: &[RslDescriptor],
    graph: &UnitGraph,
    store: &LibraryStore,
    contributing: &FxHashSet<LibraryId>,
    compatibility_version: Option<Version>,
    problems: &mut Vec<Problem>,
) -> RslPartition {
    // Compatibility filter drops silently unless the application
    //   actually depends on the dropped library.
    let candidates: Vec<&RslDescriptor> = descriptors
        .iter()
        .filter(|desc| {
            let lib = store.get(desc.library);

            match (lib.min_supported_version(), compatibility_version) {
                (Some(min), Some(floor)) if min > floor => {
                    if contributing.contains(&desc.library) {
                        problems.push(Problem::IncompatibleRslNeeded {
                            library: lib.path().to_string(),
                            minimum: min,
                            floor,
                        });
                    }
                    false
                }
                _ => true,
            }
        })
        .collect();

    let mut unused: Vec<bool> = candidates
        .iter()
        .map(|desc| !contributing.contains(&desc.library) && !desc.force_load)
        .collect();

    if unused.iter().any(|&u| u) {
        rescue_inherited(&candidates, graph, &mut unused);
    }

    let mut result = RslPartition::default();

    for (desc, unused) in candidates.into_iter().zip(unused) {
        if unused {
            result.placeholder.push(desc.clone());
        } else {
            result.required.push(desc.clone());
            check_digests(desc, store, problems);
        }
    }

    result
}

/// Re-promote unused libraries that a later used library inherits
///   from.
///
/// The scan runs backward so that a library rescued at index `i`
///   still gets its own inheritance dependencies considered when the
///   scan reaches it.
fn rescue_inherited(candidates: &[&RslDescriptor], graph: &UnitGraph, unused: &mut [bool]) {
    let closure = library_inherit_closure(graph);

    let index_of: FxHashMap<LibraryId, usize> = candidates
        .iter()
        .enumerate()
        .map(|(i, desc)| (desc.library, i))
        .collect();

    for i in (0..candidates.len()).rev() {
        if unused[i] {
            continue;
        }

        if let Some(deps) = closure.get(&candidates[i].library) {
            for dep in deps {
                if let Some(&j) = index_of.get(dep) {
                    if j < i {
                        unused[j] = false;
                    }
                }
            }
        }
    }
}

/// Transitive closure of the library-level inheritance relation.
fn library_inherit_closure(graph: &UnitGraph) -> FxHashMap<LibraryId, FxHashSet<LibraryId>> {
    let direct = graph.library_inherit_deps();
    let mut closure: FxHashMap<LibraryId, FxHashSet<LibraryId>> = FxHashMap::default();

    for &lib in direct.keys() {
        let mut reach: FxHashSet<LibraryId> = FxHashSet::default();
        let mut stack: Vec<LibraryId> = direct[&lib].iter().copied().collect();

        while let Some(dep) = stack.pop() {
            if dep != lib && reach.insert(dep) {
                if let Some(next) = direct.get(&dep) {
                    stack.extend(next.iter().copied());
                }
            }
        }

        closure.insert(lib, reach);
    }

    closure
}

/// A required RSL's URLs must each be coverable by a digest of the
///   matching form.
fn check_digests(desc: &RslDescriptor, store: &LibraryStore, problems: &mut Vec<Problem>) {
    let lib = store.get(desc.library);

    for url in &desc.urls {
        let signed = url.is_signed();

        if lib.digest(signed).is_none() {
            problems.push(if signed {
                Problem::MissingSignedDigest(lib.path().to_string())
            } else {
                Problem::MissingUnsignedDigest(lib.path().to_string())
            });
        }
    }
}
