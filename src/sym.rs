// Qualified definition names
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

//! Qualified names of linked definitions.
//!
//! A [`QName`] is the package-qualified name of a definition as it
//!   appears to the linker
//!     (e.g. `mx.core.UIComponent`).
//! Names are reference-counted so that the various name tables built
//!   during linking
//!     (extern tables, visible-definition lists, style subjects)
//!   can share them without copying string data.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Package-qualified name of a definition.
///
/// Cheap to clone;
///   hashes and compares as its underlying string so that name tables
///   can be probed with a plain [`str`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName(Arc<str>);

impl QName {
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for QName {
    fn from(name: &str) -> Self {
        Self(name.into())
    }
}

impl From<String> for QName {
    fn from(name: String) -> Self {
        Self(name.into())
    }
}

impl Borrow<str> for QName {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for QName {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QName {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, fmt)
    }
}
