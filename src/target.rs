// Application target orchestration
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

//! Orchestration of a full application link.
//!
//! [`SwfTarget::build`] runs the link phases in order:
//!
//!   1. resolve the main class and plan the frames,
//!        including the factory chain;
//!   2. discover the closure,
//!        interleaved with style activation;
//!   3. join on every unit's build;
//!   4. partition the configured runtime shared libraries; and
//!   5. assemble the frames.
//!
//! Only two conditions abort the build:
//!   a main class that resolves to no unit,
//!   and cancelation.
//! Everything else degrades to a [`Problem`] on the result.

use crate::build::{BuildCanceled, CancelToken, UnitBuilder};
use crate::graph::{UnitGraph, UnitRef};
use crate::library::{LibraryId, LibraryStore, Version};
use crate::link::closure;
use crate::link::frame::{Frame, FrameAssembler, FrameInfo, FramePlan};
use crate::link::linkage::{LinkageChecker, LinkageSettings};
use crate::link::rsl::{self, RslPartition};
use crate::problem::Problem;
use crate::style::{ActivatedStyleSheets, StyleRuleEngine};
use crate::sym::QName;
use crate::unit::BuildState;
use fxhash::FxHashSet;
use std::error::Error;
use std::fmt;

/// Configuration of an application target.
#[derive(Debug)]
pub struct TargetSettings {
    /// Main class of the application.
    pub main: QName,
    /// Extra labeled frames after the main frame,
    ///   each rooted at the named units.
    pub extra_frames: Vec<(String, Vec<QName>)>,
    /// Compatibility floor for runtime shared library filtering.
    pub compatibility_version: Option<Version>,
    pub linkage: LinkageSettings,
}

impl TargetSettings {
    pub fn new(main: impl Into<QName>) -> Self {
        Self {
            main: main.into(),
            extra_frames: vec![],
            compatibility_version: None,
            linkage: LinkageSettings::default(),
        }
    }
}

/// The build could not produce a result.
#[derive(Debug, PartialEq)]
pub enum BuildAbort {
    /// One or more fatal problems.
    Fatal(Vec<Problem>),
    Canceled,
}

impl From<BuildCanceled> for BuildAbort {
    fn from(_: BuildCanceled) -> Self {
        Self::Canceled
    }
}

impl fmt::Display for BuildAbort {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Fatal(problems) => {
                write!(fmt, "build failed with {} fatal problem(s)", problems.len())
            }
            Self::Canceled => write!(fmt, "build canceled"),
        }
    }
}

impl Error for BuildAbort {}

/// Result of a successful link.
#[derive(Debug)]
pub struct LinkedSwf {
    pub frames: Vec<Frame>,
    pub rsls: RslPartition,
    pub activated_styles: ActivatedStyleSheets,
    /// Non-fatal conditions encountered along the way.
    pub problems: Vec<Problem>,
}

/// A linkable application target.
pub struct SwfTarget<'a, S: StyleRuleEngine> {
    graph: &'a mut UnitGraph,
    store: &'a LibraryStore,
    builder: &'a dyn UnitBuilder,
    styles: S,
    settings: TargetSettings,
    cancel: CancelToken,
}

impl<'a, S: StyleRuleEngine> SwfTarget<'a, S> {
    pub fn new(
        graph: &'a mut UnitGraph,
        store: &'a LibraryStore,
        builder: &'a dyn UnitBuilder,
        styles: S,
        settings: TargetSettings,
    ) -> Self {
        Self {
            graph,
            store,
            builder,
            styles,
            settings,
            cancel: CancelToken::new(),
        }
    }

    /// Token that cancels this build when tripped,
    ///   from any thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run the full link.
    pub fn build(mut self) -> Result<LinkedSwf, BuildAbort> {
        let mut problems = Vec::new();

        let main = self
            .graph
            .lookup(self.settings.main.as_str())
            .ok_or_else(|| {
                BuildAbort::Fatal(vec![Problem::RootUnitNotFound(self.settings.main.clone())])
            })?;

        // Inheritance cycles break the ordering guarantees below;
        //   report them and link what we can.
        if let Err(err) = self.graph.check_inheritance_cycles() {
            problems.extend(err.cycles.into_iter().map(Problem::InheritanceCycle));
        }

        let extra = self.plan_extra_frames(&mut problems);
        let plan = FramePlan::for_application(self.graph, main, extra, &mut problems);
        let roots = plan.all_roots();

        let closure = closure::resolve(
            self.graph,
            self.builder,
            &mut self.styles,
            &roots,
            main,
            &self.cancel,
            &mut problems,
        )?;

        self.finish_builds(&closure.units, &mut problems)?;

        let contributing: FxHashSet<LibraryId> = closure
            .units
            .iter()
            .filter_map(|&unit| self.graph.get(unit).library())
            .collect();

        let rsls = rsl::partition(
            &self.settings.linkage.rsls,
            self.graph,
            self.store,
            &contributing,
            self.settings.compatibility_version,
            &mut problems,
        );

        let linkage = LinkageChecker::new(self.store, &self.settings.linkage);
        let assembler = FrameAssembler::new(self.graph, self.builder, &linkage, &self.cancel);

        let mut emitted = FxHashSet::default();
        let frames = assembler.assemble(&plan, &mut emitted, &mut problems)?;

        Ok(LinkedSwf {
            frames,
            rsls,
            activated_styles: closure.activated_styles,
            problems,
        })
    }

    /// Resolve the roots of explicitly configured frames.
    ///
    /// A root that resolves to no unit is dropped with a problem;
    ///   the frame keeps its remaining roots.
    fn plan_extra_frames(&self, problems: &mut Vec<Problem>) -> Vec<FrameInfo> {
        self.settings
            .extra_frames
            .iter()
            .map(|(label, names)| {
                let roots = names
                    .iter()
                    .filter_map(|name| {
                        let found = self.graph.lookup(name.as_str());

                        if found.is_none() {
                            problems.push(Problem::FrameRootNotFound(name.clone()));
                        }

                        found
                    })
                    .collect();

                FrameInfo::new(Some(label.as_str()), FrameInfo::EXTERNS_ALLOWED, roots)
            })
            .collect()
    }

    /// Join on every build in the closure,
    ///   in name order for deterministic problem reporting.
    fn finish_builds(
        &self,
        units: &FxHashSet<UnitRef>,
        problems: &mut Vec<Problem>,
    ) -> Result<(), BuildCanceled> {
        let mut ordered: Vec<UnitRef> = units.iter().copied().collect();
        ordered.sort_by(|a, b| self.graph.get(*a).name().cmp(self.graph.get(*b).name()));

        for unit in ordered {
            if self.cancel.is_canceled() {
                return Err(BuildCanceled);
            }

            if self.builder.finish(unit, problems) == BuildState::Failed {
                problems.push(Problem::UnitBuildFailed(self.graph.get(unit).name().clone()));
            }
        }

        Ok(())
    }
}
