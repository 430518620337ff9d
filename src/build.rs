// Unit build interface and cancelation
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

//! Interface between the linker and the per-unit build pipeline.
//!
//! The linker does not compile anything itself;
//!   it drives a [`UnitBuilder`] supplied by the frontend.
//! [`UnitBuilder::start`] is a hint that a unit's output will be
//!   needed soon,
//!     so its build may proceed concurrently with discovery;
//!   starting an already-started or finished unit is a no-op.
//! [`UnitBuilder::finish`] joins on the unit's build and reports its
//!   final state.
//!
//! Long-running operations poll a [`CancelToken`] between units and
//!   wind down with [`BuildCanceled`] when it trips.

use crate::graph::UnitRef;
use crate::problem::Problem;
use crate::unit::BuildState;
use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Generated binary content of a single built unit.
pub type Fragment = Vec<u8>;

/// Driver of per-unit builds.
///
/// Implementations may run builds in the background;
///   all methods take `&self` and must be callable from the link
///   thread at any point between `start` and `finish`.
pub trait UnitBuilder {
    /// Request that this unit's build begin if it has not already.
    ///
    /// Must be idempotent.
    fn start(&self, unit: UnitRef);

    /// Block until this unit's build completes and report its state,
    ///   appending any problems the build itself collected.
    fn finish(&self, unit: UnitRef, problems: &mut Vec<Problem>) -> BuildState;

    /// Retrieve the generated content of a built unit.
    fn content(&self, unit: UnitRef) -> Result<Fragment, Problem>;
}

/// Shared flag requesting that an in-progress link wind down.
///
/// Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The link was canceled before completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildCanceled;

impl fmt::Display for BuildCanceled {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "build canceled")
    }
}

impl Error for BuildCanceled {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn token_starts_clear() {
        assert!(!CancelToken::new().is_canceled());
    }

    #[test]
    fn clones_share_the_flag() {
        let token = CancelToken::new();
        let clone = token.clone();

        clone.cancel();

        assert!(token.is_canceled());
        assert!(clone.is_canceled());
    }
}
