// Compilation units and dependency kinds
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

//! Compilation units and the kinds of dependencies between them.
//!
//! A compilation unit is the smallest linkable thing:
//!   a source file,
//!   a definition pulled from a library,
//!   an embedded asset,
//!   or a resource bundle.
//! Each unit exposes one or more [`QName`]s and depends on other units
//!   through typed edges
//!     (see [`DepKind`]).
//!
//! The dependency kind matters to the linker in two places:
//!   inheritance edges alone drive runtime-shared-library rescue
//!     (a superclass must load before its subclass),
//!   and inheritance edges alone are subject to the acyclicity check.

use crate::library::LibraryId;
use crate::sym::QName;

/// Kind of dependency between two compilation units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DepKind {
    /// `extends`/`implements` relationship;
    ///   the dependency must be defined before the dependent at runtime.
    Inheritance = 0,
    /// Reference from a signature
    ///   (member type, parameter type, return type).
    Signature = 1,
    /// Reference from an expression body.
    Expression = 2,
    /// Reference introduced by a namespace resolution.
    Namespace = 3,
}

const_assert!((DepKind::Namespace as u8) < 8);

impl DepKind {
    #[inline]
    const fn mask(self) -> u8 {
        1 << (self as u8)
    }
}

/// Set of [`DepKind`]s on a single graph edge.
///
/// Multiple references between the same pair of units collapse into a
///   single edge carrying the union of their kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DepKindSet(u8);

impl DepKindSet {
    pub const EMPTY: Self = Self(0);

    #[inline]
    pub const fn of(kind: DepKind) -> Self {
        Self(kind.mask())
    }

    #[inline]
    pub const fn with(self, kind: DepKind) -> Self {
        Self(self.0 | kind.mask())
    }

    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    pub const fn has(self, kind: DepKind) -> bool {
        self.0 & kind.mask() != 0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Provenance of a compilation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitType {
    /// Unit compiled from project source.
    Source,
    /// Definition provided by a library on the library path.
    Library,
    /// Asset embedded from a library
    ///   (never externed).
    EmbeddedAsset,
    /// Localized resource bundle.
    ResourceBundle,
}

/// Lifecycle state of a unit's build,
///   as reported by a [`UnitBuilder`](crate::build::UnitBuilder).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    NotStarted,
    Analyzing,
    Built,
    Failed,
}

impl BuildState {
    #[inline]
    pub fn is_built(self) -> bool {
        self == Self::Built
    }
}

/// A single compilation unit.
///
/// Every unit exposes at least one name;
///   the first is its primary name,
///     used for linkage decisions and diagnostics.
#[derive(Debug, Clone)]
pub struct Unit {
    names: Vec<QName>,
    ty: UnitType,
    library: Option<LibraryId>,
    factory_class: Option<QName>,
    unresolved_refs: Vec<QName>,
}

impl Unit {
    pub fn new(name: impl Into<QName>, ty: UnitType) -> Self {
        Self {
            names: vec![name.into()],
            ty,
            library: None,
            factory_class: None,
            unresolved_refs: vec![],
        }
    }

    pub fn with_names(mut self, names: impl IntoIterator<Item = QName>) -> Self {
        self.names.extend(names);
        self
    }

    pub fn from_library(mut self, library: LibraryId) -> Self {
        self.library = Some(library);
        self
    }

    /// Declare the factory class wrapping this unit's main class.
    ///
    /// Only the main unit of an application carries one;
    ///   it induces an extra leading frame.
    pub fn with_factory(mut self, factory: impl Into<QName>) -> Self {
        self.factory_class = Some(factory.into());
        self
    }

    /// Record a reference that failed to resolve during analysis.
    ///
    /// These are surfaced once per unit during closure discovery.
    pub fn with_unresolved_ref(mut self, name: impl Into<QName>) -> Self {
        self.unresolved_refs.push(name.into());
        self
    }

    /// Primary name of this unit.
    #[inline]
    pub fn name(&self) -> &QName {
        &self.names[0]
    }

    #[inline]
    pub fn names(&self) -> &[QName] {
        &self.names
    }

    #[inline]
    pub fn ty(&self) -> UnitType {
        self.ty
    }

    #[inline]
    pub fn library(&self) -> Option<LibraryId> {
        self.library
    }

    #[inline]
    pub fn factory_class(&self) -> Option<&QName> {
        self.factory_class.as_ref()
    }

    #[inline]
    pub fn unresolved_refs(&self) -> &[QName] {
        &self.unresolved_refs
    }
}

#[cfg(test)]
mod test {
    use super::*;

    type Sut = DepKindSet;

    #[test]
    fn empty_set_has_no_kinds() {
        assert!(Sut::EMPTY.is_empty());
        assert!(!Sut::EMPTY.has(DepKind::Inheritance));
    }

    #[test]
    fn set_operations() {
        let set = Sut::of(DepKind::Inheritance).with(DepKind::Expression);

        assert!(set.has(DepKind::Inheritance));
        assert!(set.has(DepKind::Expression));
        assert!(!set.has(DepKind::Signature));
        assert!(!set.is_empty());
    }

    #[test]
    fn union_merges_kinds() {
        let a = Sut::of(DepKind::Signature);
        let b = Sut::of(DepKind::Namespace);
        let merged = a.union(b);

        assert!(merged.has(DepKind::Signature));
        assert!(merged.has(DepKind::Namespace));
        assert!(!merged.has(DepKind::Inheritance));
    }

    #[test]
    fn unit_primary_name_is_first() {
        let unit = Unit::new("mx.core.FlexModuleFactory", UnitType::Library)
            .with_names([QName::from("mx.core.IFlexModuleFactory")]);

        assert_eq!("mx.core.FlexModuleFactory", unit.name().as_str());
        assert_eq!(2, unit.names().len());
    }

    #[test]
    fn unit_builder_fields() {
        let unit = Unit::new("App", UnitType::Source)
            .with_factory("mx.managers.SystemManager")
            .with_unresolved_ref("missing.Thing");

        assert_eq!(
            Some("mx.managers.SystemManager"),
            unit.factory_class().map(QName::as_str),
        );
        assert_eq!(1, unit.unresolved_refs().len());
        assert_eq!(None, unit.library());
    }
}
