// Link stage
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

//! The link stage proper.
//!
//! Linking proceeds in phases over the
//!   [`UnitGraph`](crate::graph::UnitGraph):
//!
//!  1. [`closure`] discovers the set of units reachable from the
//!       frame roots,
//!         interleaved with style rule activation;
//!  2. [`rsl`] decides which runtime shared libraries must actually
//!       load at startup;
//!  3. [`linkage`] classifies each unit as internal or external to
//!       the output; and
//!  4. [`frame`] assembles the output frames in dependency order.
//!
//! [`asset`] orders the asset tags of embedded content independently
//!   of the unit-level phases.
//!
//! The orchestration of these phases for an application target lives
//!   in [`target`](crate::target).

pub mod asset;
pub mod closure;
pub mod frame;
pub mod linkage;
pub mod rsl;
