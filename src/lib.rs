// swflink
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

//! Linker core for SWF application targets.
//!
//! This crate takes a graph of analyzed compilation units
//!   ([`graph::UnitGraph`]),
//!   the libraries they came from
//!   ([`library::LibraryStore`]),
//!   and a target configuration
//!   ([`target::TargetSettings`]),
//!   and decides what the output file contains:
//!     which units are compiled in and on which frame,
//!     which are resolved at runtime,
//!     and which runtime shared libraries must load at startup.
//! It drives,
//!   but does not perform,
//!   the per-unit builds
//!     (see [`build::UnitBuilder`]).
//!
//! The phases and their contracts are documented in [`link`].

#[macro_use]
extern crate static_assertions;

pub mod build;
pub mod graph;
pub mod library;
pub mod link;
pub mod problem;
pub mod style;
pub mod sym;
pub mod target;
pub mod unit;

#[cfg(test)]
pub mod test;
