// Link problems
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

//! Problems collected during linking.
//!
//! Linking is tolerant:
//!   most failures degrade the output
//!     (a definition simply missing from a frame,
//!       a runtime shared library silently dropped)
//!   rather than aborting the build.
//! Every such degradation is reported as a [`Problem`] so that the
//!   caller can decide whether the result is usable.
//! Only a [`Severity::Fatal`] problem aborts the build outright.

use crate::library::Version;
use crate::sym::QName;
use std::error::Error;
use std::fmt;

/// How badly a [`Problem`] compromises the link output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Build output would have been structurally affected had the
    ///   condition not been compensated for.
    Compatibility,
    /// Output is missing something it was asked to contain.
    Structural,
    /// No usable output can be produced.
    Fatal,
}

/// A condition worth reporting to the caller of the link operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Problem {
    /// The root unit the build was rooted at does not exist in the
    ///   unit graph.
    RootUnitNotFound(QName),
    /// A unit referenced a name that resolved to no unit.
    UnresolvedReference { from: QName, to: QName },
    /// A style rule pulled in a dependency that resolved to no unit.
    StyleReferenceNotFound(QName),
    /// A factory class named by a unit does not exist in the graph.
    MissingFactoryClass(QName),
    /// Factory classes name one another in a cycle;
    ///   the chain is truncated at the repeated class.
    CircularFactoryChain(QName),
    /// An explicit frame was rooted at a name that resolved to no unit.
    FrameRootNotFound(QName),
    /// A unit's build finished in the failed state.
    UnitBuildFailed(QName),
    /// A unit built but its generated content could not be retrieved;
    ///   the containing frame is discarded.
    UnitContentFailed(QName),
    /// Inheritance dependencies form a cycle through the named units.
    InheritanceCycle(Vec<QName>),
    /// A runtime shared library was dropped by compatibility filtering
    ///   even though the application depends on it.
    IncompatibleRslNeeded {
        library: String,
        minimum: Version,
        floor: Version,
    },
    /// A required runtime shared library has a signed URL but no
    ///   signed digest.
    MissingSignedDigest(String),
    /// A required runtime shared library has an unsigned URL but no
    ///   unsigned digest.
    MissingUnsignedDigest(String),
}

impl Problem {
    pub fn severity(&self) -> Severity {
        match self {
            Self::RootUnitNotFound(_) => Severity::Fatal,

            Self::UnresolvedReference { .. }
            | Self::StyleReferenceNotFound(_)
            | Self::MissingFactoryClass(_)
            | Self::CircularFactoryChain(_)
            | Self::FrameRootNotFound(_)
            | Self::UnitBuildFailed(_)
            | Self::UnitContentFailed(_)
            | Self::InheritanceCycle(_)
            | Self::MissingSignedDigest(_)
            | Self::MissingUnsignedDigest(_) => Severity::Structural,

            Self::IncompatibleRslNeeded { .. } => Severity::Compatibility,
        }
    }

    #[inline]
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::RootUnitNotFound(name) => {
                write!(fmt, "root unit `{}` not found", name)
            }
            Self::UnresolvedReference { from, to } => {
                write!(fmt, "unresolved reference `{}` in `{}`", to, from)
            }
            Self::StyleReferenceNotFound(name) => {
                write!(fmt, "style dependency `{}` resolved to no unit", name)
            }
            Self::MissingFactoryClass(name) => {
                write!(fmt, "factory class `{}` not found", name)
            }
            Self::CircularFactoryChain(name) => {
                write!(fmt, "factory class `{}` closes a factory chain cycle", name)
            }
            Self::FrameRootNotFound(name) => {
                write!(fmt, "frame root `{}` not found", name)
            }
            Self::UnitBuildFailed(name) => {
                write!(fmt, "build of unit `{}` failed", name)
            }
            Self::UnitContentFailed(name) => {
                write!(
                    fmt,
                    "content of unit `{}` unavailable; frame discarded",
                    name
                )
            }
            Self::InheritanceCycle(names) => {
                write!(fmt, "inheritance cycle involving [")?;
                let mut first = true;
                for name in names {
                    if !first {
                        write!(fmt, ", ")?;
                    }
                    first = false;
                    write!(fmt, "`{}`", name)?;
                }
                write!(fmt, "]")
            }
            Self::IncompatibleRslNeeded {
                library,
                minimum,
                floor,
            } => {
                write!(
                    fmt,
                    "runtime shared library `{}` requires version {} \
                     but compatibility version is {}",
                    library, minimum, floor
                )
            }
            Self::MissingSignedDigest(library) => {
                write!(fmt, "no signed digest for `{}`", library)
            }
            Self::MissingUnsignedDigest(library) => {
                write!(fmt, "no unsigned digest for `{}`", library)
            }
        }
    }
}

impl Error for Problem {}
