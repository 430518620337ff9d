// Extern linkage classification
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

//! Classification of units as internal or external to the output.
//!
//! A unit links externally when its definition is expected to already
//!   exist in the runtime environment:
//!     named as an extern by configuration,
//!     provided by a library on the external library path,
//!     or provided by a runtime shared library.
//! Externed units are resolved at runtime instead of being compiled
//!   into the output.
//!
//! The extern name table is built once per target,
//!   on first query,
//!   and published through a [`OnceLock`] so concurrent frame
//!   assembly observes a single consistent table.
//!
//! Classification tests a unit's primary name only;
//!   secondary names never drive linkage.

use crate::library::{LibraryId, LibraryStore};
use crate::link::rsl::RslDescriptor;
use crate::sym::QName;
use crate::unit::Unit;
use fxhash::FxHashSet;
use std::sync::OnceLock;

/// Linkage-relevant parts of the target configuration.
#[derive(Debug)]
pub struct LinkageSettings {
    /// Names externed explicitly by configuration.
    pub externs: Vec<QName>,
    /// Names forced into the output even when a library would extern
    ///   them.
    pub force_includes: Vec<QName>,
    /// Libraries on the external library path.
    pub extern_libraries: Vec<LibraryId>,
    /// Configured runtime shared libraries;
    ///   all of their definitions extern,
    ///     whether or not the RSL ultimately loads.
    pub rsls: Vec<RslDescriptor>,
    /// Name of the root class of the class hierarchy
    ///   ("Object" for the standard runtime).
    /// The library providing it is the runtime's own,
    ///   and everything it defines is unconditionally external.
    pub root_object: QName,
}

impl Default for LinkageSettings {
    fn default() -> Self {
        Self {
            externs: vec![],
            force_includes: vec![],
            extern_libraries: vec![],
            rsls: vec![],
            root_object: "Object".into(),
        }
    }
}

/// Per-target linkage oracle.
pub struct LinkageChecker<'a> {
    store: &'a LibraryStore,
    settings: &'a LinkageSettings,
    table: OnceLock<FxHashSet<QName>>,
    native_library: OnceLock<Option<LibraryId>>,
}

impl<'a> LinkageChecker<'a> {
    pub fn new(store: &'a LibraryStore, settings: &'a LinkageSettings) -> Self {
        Self {
            store,
            settings,
            table: OnceLock::new(),
            native_library: OnceLock::new(),
        }
    }

    /// Whether this unit links externally.
    pub fn is_external(&self, unit: &Unit) -> bool {
        self.table().contains(unit.name().as_str())
    }

    /// Whether this unit is external no matter how the output is
    ///   configured,
    ///     because the runtime itself provides it.
    pub fn is_always_external(&self, unit: &Unit) -> bool {
        match unit.library() {
            Some(lib) => self.native_library() == Some(lib),
            None => false,
        }
    }

    fn table(&self) -> &FxHashSet<QName> {
        self.table.get_or_init(|| {
            let mut table: FxHashSet<QName> =
                self.settings.externs.iter().cloned().collect();

            let extern_libs = self.settings.extern_libraries.iter().copied();
            let rsl_libs = self.settings.rsls.iter().map(|desc| desc.library);

            for lib in extern_libs.chain(rsl_libs) {
                for def in self.store.get(lib).defs() {
                    // Embedded assets are always compiled in.
                    if !def.embedded_asset {
                        table.insert(def.name.clone());
                    }
                }
            }

            for name in &self.settings.force_includes {
                table.remove(name.as_str());
            }

            table
        })
    }

    fn native_library(&self) -> Option<LibraryId> {
        *self.native_library.get_or_init(|| {
            let root = self.settings.root_object.as_str();

            self.store
                .iter()
                .find(|(_, lib)| lib.defs().iter().any(|def| def.name.as_str() == root))
                .map(|(id, _)| id)
        })
    }
}
