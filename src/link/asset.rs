// Asset tag ordering
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

//! Ordering of asset definition tags.
//!
//! A definition tag
//!   (a shape, bitmap, sprite, font)
//!   may reference other definition tags by character id,
//!   and the file format requires every character to be defined
//!   before its first reference.
//! [`AssetTags::sort`] produces such an order:
//!   a topological sort of the referrer graph,
//!     referenced tags first,
//!   with ties broken by the order in which tags were first
//!   discovered from the roots.
//! The tie-break makes the output a pure function of the graph shape
//!   and root order,
//!     never of hash iteration.
//!
//! Reference cycles cannot occur in well-formed content;
//!   they are reported as a typed error rather than asserted away.

use fxhash::FxHashMap;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::error::Error;
use std::fmt;

/// Handle to a tag within an [`AssetTags`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagRef(usize);

/// Arena of asset definition tags and their references.
#[derive(Debug, Default)]
pub struct AssetTags {
    refs: Vec<Vec<TagRef>>,
}

impl AssetTags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self) -> TagRef {
        let tag = TagRef(self.refs.len());
        self.refs.push(vec![]);
        tag
    }

    pub fn add_with_refs(&mut self, refs: Vec<TagRef>) -> TagRef {
        let tag = self.add();
        self.refs[tag.0] = refs;
        tag
    }

    /// Record that `tag` references `referenced`.
    pub fn add_ref(&mut self, tag: TagRef, referenced: TagRef) {
        self.refs[tag.0].push(referenced);
    }

    #[inline]
    pub fn refs(&self, tag: TagRef) -> &[TagRef] {
        &self.refs[tag.0]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Emission order of every tag reachable from `roots`:
    ///   referenced tags strictly before their referrers,
    ///   ties broken by first-discovery order.
    pub fn sort(&self, roots: &[TagRef]) -> Result<Vec<TagRef>, AssetCycleError> {
        // Depth-first discovery assigns each reachable tag its
        //   tie-break key.
        let mut first_seen: FxHashMap<TagRef, usize> = FxHashMap::default();
        let mut discovered: Vec<TagRef> = vec![];

        for &root in roots {
            self.discover(root, &mut first_seen, &mut discovered);
        }

        // Kahn's algorithm over the reachable subgraph,
        //   ready set keyed by discovery order.
        let mut pending: FxHashMap<TagRef, usize> = discovered
            .iter()
            .map(|&tag| (tag, self.refs(tag).len()))
            .collect();

        let mut referrers: FxHashMap<TagRef, Vec<TagRef>> = FxHashMap::default();
        for &tag in &discovered {
            for &referenced in self.refs(tag) {
                referrers.entry(referenced).or_default().push(tag);
            }
        }

        let mut ready: BinaryHeap<Reverse<(usize, TagRef)>> = pending
            .iter()
            .filter(|(_, &n)| n == 0)
            .map(|(&tag, _)| Reverse((first_seen[&tag], tag)))
            .collect();

        let mut order = Vec::with_capacity(discovered.len());

        while let Some(Reverse((_, tag))) = ready.pop() {
            order.push(tag);

            if let Some(refs) = referrers.get(&tag) {
                for &referrer in refs {
                    if let Some(n) = pending.get_mut(&referrer) {
                        *n -= 1;

                        if *n == 0 {
                            ready.push(Reverse((first_seen[&referrer], referrer)));
                        }
                    }
                }
            }
        }

        if order.len() == discovered.len() {
            Ok(order)
        } else {
            let mut stuck: Vec<TagRef> = discovered
                .into_iter()
                .filter(|tag| pending[tag] > 0)
                .collect();
            stuck.sort_by_key(|tag| first_seen[tag]);

            Err(AssetCycleError { tags: stuck })
        }
    }

    /// Assign first-seen indices in recursive depth-first order,
    ///   without recursing.
    fn discover(
        &self,
        root: TagRef,
        first_seen: &mut FxHashMap<TagRef, usize>,
        discovered: &mut Vec<TagRef>,
    ) {
        if first_seen.contains_key(&root) {
            return;
        }

        first_seen.insert(root, discovered.len());
        discovered.push(root);

        let mut stack: Vec<(TagRef, usize)> = vec![(root, 0)];

        while let Some((tag, next)) = stack.pop() {
            if next >= self.refs(tag).len() {
                continue;
            }

            stack.push((tag, next + 1));
            let child = self.refs(tag)[next];

            if !first_seen.contains_key(&child) {
                first_seen.insert(child, discovered.len());
                discovered.push(child);
                stack.push((child, 0));
            }
        }
    }
}

/// Asset tag references formed a cycle.
#[derive(Debug, PartialEq)]
pub struct AssetCycleError {
    /// Tags left unemittable,
    ///   in discovery order.
    pub tags: Vec<TagRef>,
}

impl fmt::Display for AssetCycleError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fmt,
            "asset tag references form a cycle through {} tag(s)",
            self.tags.len()
        )
    }
}

impl Error for AssetCycleError {}
