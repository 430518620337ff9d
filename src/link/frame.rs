// Frame planning and assembly
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

//! Planning and assembly of output frames.
//!
//! The output file is a sequence of frames,
//!   each rooted at one or more units.
//! An application's main class may be wrapped in a chain of factory
//!   classes;
//!     each factory gets its own labeled frame ahead of the main
//!     frame,
//!       outermost factory first,
//!     so that the bootstrap machinery is defined before the code it
//!     bootstraps.
//! Factory frames never link externally:
//!   the factory must be self-contained because nothing has loaded
//!   yet when it runs.
//!
//! Assembly walks each frame's roots in dependency order and threads
//!   a single emitted set through all frames,
//!     so a unit reachable from several frames lands only in the
//!     first.

use crate::build::{BuildCanceled, CancelToken, Fragment, UnitBuilder};
use crate::graph::{UnitGraph, UnitRef};
use crate::link::linkage::LinkageChecker;
use crate::problem::Problem;
use fxhash::FxHashSet;

/// Frame labels admit only word characters;
///   anything else becomes an underscore.
fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Planned contents of one output frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameInfo {
    label: Option<String>,
    allow_externals: bool,
    roots: Vec<UnitRef>,
}

impl FrameInfo {
    pub const EXTERNS_ALLOWED: bool = true;
    pub const EXTERNS_DISALLOWED: bool = false;

    pub fn new(label: Option<&str>, allow_externals: bool, roots: Vec<UnitRef>) -> Self {
        Self {
            label: label.map(sanitize_label),
            allow_externals,
            roots,
        }
    }

    #[inline]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    #[inline]
    pub fn allow_externals(&self) -> bool {
        self.allow_externals
    }

    #[inline]
    pub fn roots(&self) -> &[UnitRef] {
        &self.roots
    }
}

/// Ordered plan of every frame in the output.
#[derive(Debug, PartialEq)]
pub struct FramePlan {
    frames: Vec<FrameInfo>,
}

impl FramePlan {
    pub fn new(frames: Vec<FrameInfo>) -> Self {
        Self { frames }
    }

    /// Plan the frames of an application rooted at `main`.
    ///
    /// Walks the factory chain from the main unit,
    ///   planning one externs-disallowed frame per factory
    ///     (outermost first,
    ///       labeled with the factory's name),
    ///   then the externs-allowed main frame,
    ///   then any explicitly configured extra frames.
    pub fn for_application(
        graph: &UnitGraph,
        main: UnitRef,
        extra: Vec<FrameInfo>,
        problems: &mut Vec<Problem>,
    ) -> Self {
        let mut chain: Vec<(String, UnitRef)> = vec![];
        let mut seen: FxHashSet<UnitRef> = [main].into_iter().collect();
        let mut factory = graph.get(main).factory_class().cloned();

        while let Some(name) = factory {
            match graph.lookup(name.as_str()) {
                Some(unit) if seen.insert(unit) => {
                    factory = graph.get(unit).factory_class().cloned();
                    chain.push((name.to_string(), unit));
                }
                Some(_) => {
                    problems.push(Problem::CircularFactoryChain(name));
                    break;
                }
                None => {
                    problems.push(Problem::MissingFactoryClass(name));
                    break;
                }
            }
        }

        let mut frames: Vec<FrameInfo> = chain
            .into_iter()
            .rev()
            .map(|(label, unit)| {
                FrameInfo::new(Some(label.as_str()), FrameInfo::EXTERNS_DISALLOWED, vec![unit])
            })
            .collect();

        frames.push(FrameInfo::new(None, FrameInfo::EXTERNS_ALLOWED, vec![main]));
        frames.extend(extra);

        Self { frames }
    }

    #[inline]
    pub fn frames(&self) -> &[FrameInfo] {
        &self.frames
    }

    /// Roots of every frame,
    ///   in frame order.
    pub fn all_roots(&self) -> Vec<UnitRef> {
        self.frames
            .iter()
            .flat_map(|frame| frame.roots().iter().copied())
            .collect()
    }
}

/// One assembled output frame.
#[derive(Debug, PartialEq)]
pub struct Frame {
    pub label: Option<String>,
    /// Units embedded in this frame,
    ///   in emission order.
    pub units: Vec<UnitRef>,
    /// Generated content of each embedded unit,
    ///   parallel to `units`.
    pub content: Vec<Fragment>,
}

/// Assembles frames from a plan.
pub struct FrameAssembler<'a> {
    graph: &'a UnitGraph,
    builder: &'a dyn UnitBuilder,
    linkage: &'a LinkageChecker<'a>,
    cancel: &'a CancelToken,
}

impl<'a> FrameAssembler<'a> {
    pub fn new(
        graph: &'a UnitGraph,
        builder: &'a dyn UnitBuilder,
        linkage: &'a LinkageChecker<'a>,
        cancel: &'a CancelToken,
    ) -> Self {
        Self {
            graph,
            builder,
            linkage,
            cancel,
        }
    }

    /// Assemble every frame of the plan.
    ///
    /// A frame whose content cannot be fully retrieved is discarded
    ///   (with a [`Problem::UnitContentFailed`])
    ///   without aborting the frames after it.
    pub fn assemble(
        &self,
        plan: &FramePlan,
        emitted: &mut FxHashSet<UnitRef>,
        problems: &mut Vec<Problem>,
    ) -> Result<Vec<Frame>, BuildCanceled> {
        let mut frames = Vec::with_capacity(plan.frames().len());

        for info in plan.frames() {
            if let Some(frame) = self.assemble_frame(info, emitted, problems)? {
                frames.push(frame);
            }
        }

        Ok(frames)
    }

    fn assemble_frame(
        &self,
        info: &FrameInfo,
        emitted: &mut FxHashSet<UnitRef>,
        problems: &mut Vec<Problem>,
    ) -> Result<Option<Frame>, BuildCanceled> {
        let mut frame = Frame {
            label: info.label().map(String::from),
            units: vec![],
            content: vec![],
        };

        for unit in self.graph.swf_order(info.roots()) {
            if self.cancel.is_canceled() {
                return Err(BuildCanceled);
            }

            // Claimed even when externed:
            //   a later frame must not re-test a unit this frame
            //   already considered.
            if !emitted.insert(unit) {
                continue;
            }

            if !self.embeds(info, unit) {
                continue;
            }

            match self.builder.content(unit) {
                Ok(fragment) => {
                    frame.units.push(unit);
                    frame.content.push(fragment);
                }
                Err(problem) => {
                    problems.push(problem);
                    return Ok(None);
                }
            }
        }

        Ok(Some(frame))
    }

    /// Whether this frame embeds the unit rather than leaving it to
    ///   runtime resolution.
    fn embeds(&self, info: &FrameInfo, unit: UnitRef) -> bool {
        let unit = self.graph.get(unit);

        // Runtime-provided definitions are never embedded,
        //   even in frames that disallow externals.
        if self.linkage.is_always_external(unit) {
            return false;
        }

        !info.allow_externals() || !self.linkage.is_external(unit)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::library::{Library, LibraryStore};
    use crate::link::linkage::LinkageSettings;
    use crate::test::StubBuilder;
    use crate::unit::UnitType::*;
    use crate::unit::{DepKind, DepKindSet, Unit};

    #[test]
    fn label_sanitized_to_word_chars() {
        let info = FrameInfo::new(
            Some("mx.managers::SystemManager"),
            FrameInfo::EXTERNS_ALLOWED,
            vec![],
        );

        assert_eq!(Some("mx_managers__SystemManager"), info.label());
    }

    #[test]
    fn factory_chain_plans_leading_frames() {
        let mut graph = UnitGraph::new();
        let outer = graph.add_unit(Unit::new("OuterFactory", Library));
        let inner =
            graph.add_unit(Unit::new("InnerFactory", Library).with_factory("OuterFactory"));
        let main = graph.add_unit(Unit::new("App", Source).with_factory("InnerFactory"));
        let mut problems = vec![];

        let plan = FramePlan::for_application(&graph, main, vec![], &mut problems);

        let frames = plan.frames();
        assert_eq!(3, frames.len());

        // Outermost factory first.
        assert_eq!(Some("OuterFactory"), frames[0].label());
        assert_eq!(&[outer], frames[0].roots());
        assert!(!frames[0].allow_externals());

        assert_eq!(Some("InnerFactory"), frames[1].label());
        assert_eq!(&[inner], frames[1].roots());
        assert!(!frames[1].allow_externals());

        assert_eq!(None, frames[2].label());
        assert_eq!(&[main], frames[2].roots());
        assert!(frames[2].allow_externals());

        assert!(problems.is_empty());
        assert_eq!(vec![outer, inner, main], plan.all_roots());
    }

    #[test]
    fn missing_factory_reported_and_chain_truncated() {
        let mut graph = UnitGraph::new();
        let main = graph.add_unit(Unit::new("App", Source).with_factory("no.Factory"));
        let mut problems = vec![];

        let plan = FramePlan::for_application(&graph, main, vec![], &mut problems);

        assert_eq!(1, plan.frames().len());
        assert_eq!(
            vec![Problem::MissingFactoryClass("no.Factory".into())],
            problems,
        );
    }

    #[test]
    fn cyclic_factory_chain_reported_and_truncated() {
        let mut graph = UnitGraph::new();
        let a = graph.add_unit(Unit::new("FactoryA", Library).with_factory("FactoryB"));
        let b = graph.add_unit(Unit::new("FactoryB", Library).with_factory("FactoryA"));
        let main = graph.add_unit(Unit::new("App", Source).with_factory("FactoryA"));
        let mut problems = vec![];

        let plan = FramePlan::for_application(&graph, main, vec![], &mut problems);

        // Each factory planned once before the cycle is cut.
        assert_eq!(3, plan.frames().len());
        assert_eq!(vec![b, a, main], plan.all_roots());
        assert_eq!(
            vec![Problem::CircularFactoryChain("FactoryA".into())],
            problems,
        );
    }

    fn assemble_app(
        graph: &UnitGraph,
        builder: &StubBuilder,
        main: UnitRef,
        settings: &LinkageSettings,
        store: &LibraryStore,
        problems: &mut Vec<Problem>,
    ) -> Vec<Frame> {
        let plan = FramePlan::for_application(graph, main, vec![], problems);
        let linkage = LinkageChecker::new(store, settings);
        let cancel = CancelToken::new();
        let assembler = FrameAssembler::new(graph, builder, &linkage, &cancel);

        assembler
            .assemble(&plan, &mut FxHashSet::default(), problems)
            .unwrap()
    }

    #[test]
    fn factory_frame_claims_shared_deps() {
        // App inherits Factory;
        //   the factory frame embeds it first,
        //   so the main frame holds only App.
        let mut graph = UnitGraph::new();
        let factory = graph.add_unit(Unit::new("Factory", Library));
        let main = graph.add_unit(Unit::new("App", Source).with_factory("Factory"));
        graph.add_dep(main, factory, DepKindSet::of(DepKind::Inheritance));

        let builder = StubBuilder::for_graph(&graph);
        let store = LibraryStore::new();
        let settings = LinkageSettings::default();
        let mut problems = vec![];

        let frames = assemble_app(&graph, &builder, main, &settings, &store, &mut problems);

        assert_eq!(2, frames.len());
        assert_eq!(vec![factory], frames[0].units);
        assert_eq!(vec![main], frames[1].units);
        assert!(problems.is_empty());
    }

    #[test]
    fn externed_units_omitted_from_main_frame() {
        let mut store = LibraryStore::new();
        let rsl_lib = store.add(Library::new("rsl.swc").with_def("rsl.Class"));

        let mut graph = UnitGraph::new();
        let ext = graph.add_unit(Unit::new("rsl.Class", Library).from_library(rsl_lib));
        let main = graph.add_unit(Unit::new("App", Source));
        graph.add_dep(main, ext, DepKindSet::of(DepKind::Expression));

        let builder = StubBuilder::for_graph(&graph);
        let settings = LinkageSettings {
            rsls: vec![crate::link::rsl::RslDescriptor::new(rsl_lib)],
            ..Default::default()
        };
        let mut problems = vec![];

        let frames = assemble_app(&graph, &builder, main, &settings, &store, &mut problems);

        assert_eq!(1, frames.len());
        assert_eq!(vec![main], frames[0].units);
    }

    #[test]
    fn factory_frame_embeds_externed_but_not_runtime_units() {
        let mut store = LibraryStore::new();
        let player = store.add(Library::new("playerglobal.swc").with_def("Object"));
        let rsl_lib = store.add(Library::new("rsl.swc").with_def("rsl.Class"));

        let mut graph = UnitGraph::new();
        let native = graph.add_unit(Unit::new("Object", Library).from_library(player));
        let ext = graph.add_unit(Unit::new("rsl.Class", Library).from_library(rsl_lib));
        let factory = graph.add_unit(Unit::new("Factory", Library));
        let main = graph.add_unit(Unit::new("App", Source).with_factory("Factory"));
        graph.add_dep(factory, ext, DepKindSet::of(DepKind::Expression));
        graph.add_dep(factory, native, DepKindSet::of(DepKind::Inheritance));

        let builder = StubBuilder::for_graph(&graph);
        let settings = LinkageSettings {
            rsls: vec![crate::link::rsl::RslDescriptor::new(rsl_lib)],
            root_object: "Object".into(),
            ..Default::default()
        };
        let mut problems = vec![];

        let frames = assemble_app(&graph, &builder, main, &settings, &store, &mut problems);

        assert_eq!(2, frames.len());
        // Externs are disallowed in the factory frame,
        //   so the RSL definition is embedded there;
        //   the runtime's own definition still is not.
        assert!(frames[0].units.contains(&ext));
        assert!(!frames[0].units.contains(&native));
        assert!(frames[0].units.contains(&factory));
    }

    #[test]
    fn content_failure_discards_frame_only() {
        let mut graph = UnitGraph::new();
        let factory = graph.add_unit(Unit::new("Factory", Library));
        let main = graph.add_unit(Unit::new("App", Source).with_factory("Factory"));

        let builder = StubBuilder::for_graph(&graph).failing_content(factory);
        let store = LibraryStore::new();
        let settings = LinkageSettings::default();
        let mut problems = vec![];

        let frames = assemble_app(&graph, &builder, main, &settings, &store, &mut problems);

        // Factory frame discarded;
        //   main frame still assembled.
        assert_eq!(1, frames.len());
        assert_eq!(vec![main], frames[0].units);
        assert_eq!(
            vec![Problem::UnitContentFailed("Factory".into())],
            problems,
        );
    }

    #[test]
    fn cancelation_interrupts_assembly() {
        let mut graph = UnitGraph::new();
        let main = graph.add_unit(Unit::new("App", Source));

        let builder = StubBuilder::for_graph(&graph);
        let store = LibraryStore::new();
        let settings = LinkageSettings::default();
        let linkage = LinkageChecker::new(&store, &settings);
        let cancel = CancelToken::new();
        cancel.cancel();

        let assembler = FrameAssembler::new(&graph, &builder, &linkage, &cancel);
        let plan = FramePlan::new(vec![FrameInfo::new(
            None,
            FrameInfo::EXTERNS_ALLOWED,
            vec![main],
        )]);

        let result = assembler.assemble(&plan, &mut FxHashSet::default(), &mut vec![]);
        assert_eq!(Err(BuildCanceled), result.map(|_| ()));
    }
}
