// Style rule activation
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

//! Style rule activation during closure discovery.
//!
//! Style rules live outside the unit graph:
//!   a rule activates when its subject type becomes visible in the
//!   link closure,
//!     and an activated rule may pull further units
//!       (skins, effects)
//!     into the closure,
//!       which in turn may activate further rules.
//! The linker therefore interleaves rule matching with dependency
//!   discovery until neither finds anything new
//!     (see [`resolve`](crate::link::closure::resolve)).
//!
//! Matching itself is the frontend's concern;
//!   the linker drives it through [`StyleRuleEngine`].

use crate::problem::Problem;
use crate::sym::QName;
use fxhash::FxHashSet;

/// Result of one round of style rule matching.
#[derive(Debug, Default, PartialEq)]
pub struct StyleMatch {
    /// Names the activated rules depend on;
    ///   to be pulled into the closure if not already present.
    pub deps: Vec<QName>,
    /// Style documents newly activated by this round.
    pub activated: Vec<String>,
}

/// Frontend-supplied style rule matcher.
///
/// Implementations must be monotone:
///   a rule that activated in one round stays activated,
///   and its document must not be reported as newly activated twice.
pub trait StyleRuleEngine {
    /// Match rules against every name currently visible in the
    ///   closure.
    fn match_rules(&mut self, visible: &[QName], problems: &mut Vec<Problem>) -> StyleMatch;
}

/// Engine for targets without a style subsystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStyleEngine;

impl StyleRuleEngine for NullStyleEngine {
    fn match_rules(&mut self, _visible: &[QName], _problems: &mut Vec<Problem>) -> StyleMatch {
        StyleMatch::default()
    }
}

/// Insertion-ordered record of activated style documents.
///
/// Activation only ever accumulates;
///   a document appears once no matter how many rounds re-report it.
#[derive(Debug, Default)]
pub struct ActivatedStyleSheets {
    order: Vec<String>,
    seen: FxHashSet<String>,
}

impl ActivatedStyleSheets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an activation,
    ///   returning whether the document was new.
    pub fn add(&mut self, doc: String) -> bool {
        if self.seen.contains(&doc) {
            return false;
        }

        self.seen.insert(doc.clone());
        self.order.push(doc);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    type Sut = ActivatedStyleSheets;

    #[test]
    fn activation_preserves_first_seen_order() {
        let mut sut = Sut::new();

        assert!(sut.add("defaults.css".into()));
        assert!(sut.add("theme.css".into()));
        assert!(!sut.add("defaults.css".into()));

        assert_eq!(
            vec!["defaults.css", "theme.css"],
            sut.iter().collect::<Vec<_>>(),
        );
        assert_eq!(2, sut.len());
    }

    #[test]
    fn null_engine_matches_nothing() {
        let mut problems = vec![];
        let m = NullStyleEngine.match_rules(&["anything".into()], &mut problems);

        assert_eq!(StyleMatch::default(), m);
        assert!(problems.is_empty());
    }
}
