// Linked libraries
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

//! Libraries visible to the link operation.
//!
//! A [`Library`] is a packaged set of definitions
//!   (an SWC on the library path, external library path,
//!     or referenced as a runtime shared library).
//! The linker cares about three things per library:
//!   the definitions it provides
//!     (for extern tables and linkage classification),
//!   the minimum framework version it supports
//!     (for compatibility filtering of runtime shared libraries),
//!   and its content digests
//!     (for digest verification of runtime-loaded content).

use crate::sym::QName;
use std::fmt;

/// Handle to a [`Library`] within a [`LibraryStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LibraryId(usize);

/// Framework version as `major.minor.revision`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
    pub revision: u16,
}

impl Version {
    pub const fn new(major: u16, minor: u16, revision: u16) -> Self {
        Self {
            major,
            minor,
            revision,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}.{}.{}", self.major, self.minor, self.revision)
    }
}

/// Content digest of a library,
///   in signed or unsigned form.
///
/// Signed digests verify cross-domain runtime shared libraries
///   (`.swz` content);
///   unsigned digests verify everything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub signed: bool,
    pub value: String,
}

/// A single definition provided by a library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryDef {
    pub name: QName,
    /// Embedded assets are always compiled into the application and
    ///   never contribute to extern tables.
    pub embedded_asset: bool,
}

/// A library on one of the library paths.
#[derive(Debug, Clone)]
pub struct Library {
    path: String,
    defs: Vec<LibraryDef>,
    min_supported_version: Option<Version>,
    digests: Vec<Digest>,
}

impl Library {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            defs: vec![],
            min_supported_version: None,
            digests: vec![],
        }
    }

    pub fn with_def(mut self, name: impl Into<QName>) -> Self {
        self.defs.push(LibraryDef {
            name: name.into(),
            embedded_asset: false,
        });
        self
    }

    pub fn with_asset_def(mut self, name: impl Into<QName>) -> Self {
        self.defs.push(LibraryDef {
            name: name.into(),
            embedded_asset: true,
        });
        self
    }

    pub fn with_min_version(mut self, version: Version) -> Self {
        self.min_supported_version = Some(version);
        self
    }

    pub fn with_digest(mut self, signed: bool, value: impl Into<String>) -> Self {
        self.digests.push(Digest {
            signed,
            value: value.into(),
        });
        self
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    pub fn defs(&self) -> &[LibraryDef] {
        &self.defs
    }

    #[inline]
    pub fn min_supported_version(&self) -> Option<Version> {
        self.min_supported_version
    }

    /// Digest of the requested form,
    ///   if the library carries one.
    pub fn digest(&self, signed: bool) -> Option<&Digest> {
        self.digests.iter().find(|d| d.signed == signed)
    }
}

/// Append-only store of all libraries visible to a link.
#[derive(Debug, Default)]
pub struct LibraryStore {
    libs: Vec<Library>,
}

impl LibraryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, library: Library) -> LibraryId {
        let id = LibraryId(self.libs.len());
        self.libs.push(library);
        id
    }

    /// Retrieve a library by handle.
    ///
    /// Panics if the handle did not come from this store.
    #[inline]
    pub fn get(&self, id: LibraryId) -> &Library {
        &self.libs[id.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = (LibraryId, &Library)> {
        self.libs
            .iter()
            .enumerate()
            .map(|(i, lib)| (LibraryId(i), lib))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.libs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.libs.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn version_ordering() {
        assert!(Version::new(4, 5, 0) > Version::new(4, 0, 0));
        assert!(Version::new(4, 0, 1) > Version::new(4, 0, 0));
        assert!(Version::new(3, 9, 9) < Version::new(4, 0, 0));
        assert_eq!("4.5.1", Version::new(4, 5, 1).to_string());
    }

    #[test]
    fn digest_selected_by_form() {
        let lib = Library::new("framework.swc")
            .with_digest(false, "aaaa")
            .with_digest(true, "bbbb");

        assert_eq!("aaaa", lib.digest(false).unwrap().value);
        assert_eq!("bbbb", lib.digest(true).unwrap().value);
    }

    #[test]
    fn missing_digest_form() {
        let lib = Library::new("lib.swc").with_digest(false, "aaaa");

        assert!(lib.digest(true).is_none());
    }

    #[test]
    fn store_roundtrip() {
        let mut store = LibraryStore::new();
        let a = store.add(Library::new("a.swc").with_def("pkg.A"));
        let b = store.add(Library::new("b.swc"));

        assert_ne!(a, b);
        assert_eq!("a.swc", store.get(a).path());
        assert_eq!(2, store.len());
        assert_eq!(
            vec!["a.swc", "b.swc"],
            store.iter().map(|(_, l)| l.path()).collect::<Vec<_>>(),
        );
    }
}
