//! # Pattern Matcher
//!
//! Structural matching of edges against edge-shaped templates.
//!
//! Special atoms:
//! - `*` matches any entity
//! - `@` matches any atom
//! - `&` matches any edge
//! - `...` as the final child makes the pattern open-ended
//!
//! Examples: `(is/pd sky/c @)`, `(says/pd * ...)`.

use crate::entity::{Atom, Entity};
use crate::primitives::{OPEN_ENDED, WILDCARD_ANY, WILDCARD_ATOM, WILDCARD_EDGE};
use crate::types::Result;

// =============================================================================
// WILDCARDS
// =============================================================================

/// Kind of a bare wildcard atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wildcard {
    Any,
    Atom,
    Edge,
}

impl Wildcard {
    /// Classify an entity as a wildcard, if it is one.
    #[must_use]
    pub fn of(entity: &Entity) -> Option<Self> {
        let atom = entity.as_atom()?;
        if atom.kind().is_some() || atom.namespace().is_some() {
            return None;
        }
        match atom.root() {
            WILDCARD_ANY => Some(Self::Any),
            WILDCARD_ATOM => Some(Self::Atom),
            WILDCARD_EDGE => Some(Self::Edge),
            _ => None,
        }
    }

    /// Whether a candidate satisfies this wildcard.
    #[must_use]
    pub fn accepts(self, candidate: &Entity) -> bool {
        match self {
            Self::Any => true,
            Self::Atom => candidate.is_atom(),
            Self::Edge => candidate.is_edge(),
        }
    }
}

/// True for the bare `...` atom.
#[must_use]
pub fn is_open_ended_marker(entity: &Entity) -> bool {
    entity.as_atom().is_some_and(|atom| {
        atom.root() == OPEN_ENDED && atom.kind().is_none() && atom.namespace().is_none()
    })
}

/// Split pattern children into the positional part and the open-ended flag.
fn positional(children: &[Entity]) -> (&[Entity], bool) {
    match children.split_last() {
        Some((last, rest)) if is_open_ended_marker(last) => (rest, true),
        _ => (children, false),
    }
}

// =============================================================================
// PATTERN
// =============================================================================

/// A query template normalized from text, an atom or an edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// `*` on its own: every stored entity.
    AnyEntity,
    /// `@` on its own: every stored atom.
    AnyAtom,
    /// `&` on its own: every stored edge.
    AnyEdge,
    /// A single concrete atom: an existence check.
    Atom(Atom),
    /// An edge-shaped template.
    Edge(Entity),
}

impl Pattern {
    /// Parse and normalize a textual pattern.
    pub fn parse(text: &str) -> Result<Self> {
        Entity::parse(text).map(Self::from)
    }

    /// True if this is an edge template whose non-marker children are all `*`.
    #[must_use]
    pub fn is_full(&self) -> bool {
        matches!(self, Self::Edge(edge) if full_pattern(edge))
    }
}

impl From<Entity> for Pattern {
    fn from(entity: Entity) -> Self {
        match Wildcard::of(&entity) {
            Some(Wildcard::Any) => Self::AnyEntity,
            Some(Wildcard::Atom) => Self::AnyAtom,
            Some(Wildcard::Edge) => Self::AnyEdge,
            None => match entity {
                Entity::Atom(atom) => Self::Atom(atom),
                edge @ Entity::Edge(_) => Self::Edge(edge),
            },
        }
    }
}

// =============================================================================
// MATCHING
// =============================================================================

/// Decide whether `candidate` matches `pattern`, positionally, left to right.
#[must_use]
pub fn matches(candidate: &Entity, pattern: &Entity) -> bool {
    if let Some(wildcard) = Wildcard::of(pattern) {
        return wildcard.accepts(candidate);
    }
    match (candidate, pattern) {
        (Entity::Edge(items), Entity::Edge(template)) => match_children(items, template),
        _ => candidate == pattern,
    }
}

fn match_children(items: &[Entity], template: &[Entity]) -> bool {
    let (fixed, open) = positional(template);
    let arity_ok = if open {
        items.len() >= fixed.len()
    } else {
        items.len() == fixed.len()
    };
    arity_ok
        && fixed
            .iter()
            .zip(items)
            .all(|(pattern, item)| matches(item, pattern))
}

/// True iff `pattern` is an edge whose every non-marker child is `*`.
#[must_use]
pub fn full_pattern(pattern: &Entity) -> bool {
    match pattern {
        Entity::Atom(_) => false,
        Entity::Edge(children) => positional(children)
            .0
            .iter()
            .all(|child| Wildcard::of(child) == Some(Wildcard::Any)),
    }
}

/// True iff `pattern` is an edge ending in `...`.
#[must_use]
pub fn is_open_ended(pattern: &Entity) -> bool {
    positional(pattern.children()).1
}

/// First direct child of `pattern` that contains no wildcard or marker at any
/// depth. Backends use it to prune candidates through the containment index.
#[must_use]
pub fn first_concrete_child(pattern: &Entity) -> Option<&Entity> {
    positional(pattern.children())
        .0
        .iter()
        .find(|child| !child.is_pattern())
}

// =============================================================================
// LAZY RESULTS
// =============================================================================

/// Filter applied while draining a [`Matches`] sequence.
#[derive(Debug, Clone)]
enum MatchFilter {
    Everything,
    Atoms,
    Edges,
    /// Full-pattern fast path: arity only, no structural comparison.
    Arity { len: usize, open: bool },
    Structural(Entity),
}

impl MatchFilter {
    fn accepts(&self, candidate: &Entity) -> bool {
        match self {
            Self::Everything => true,
            Self::Atoms => candidate.is_atom(),
            Self::Edges => candidate.is_edge(),
            Self::Arity { len, open } => {
                candidate.is_edge()
                    && if *open {
                        candidate.arity() >= *len
                    } else {
                        candidate.arity() == *len
                    }
            }
            Self::Structural(pattern) => matches(candidate, pattern),
        }
    }
}

/// Single-pass sequence of query results.
///
/// Candidates are fetched from the backend up front; the filter runs lazily
/// as the sequence is consumed.
#[derive(Debug)]
pub struct Matches {
    candidates: std::vec::IntoIter<Entity>,
    filter: MatchFilter,
}

impl Matches {
    /// No results.
    #[must_use]
    pub fn empty() -> Self {
        Self::all(Vec::new())
    }

    /// Every candidate, unfiltered.
    #[must_use]
    pub fn all(candidates: Vec<Entity>) -> Self {
        Self {
            candidates: candidates.into_iter(),
            filter: MatchFilter::Everything,
        }
    }

    /// Only the atoms among the candidates.
    #[must_use]
    pub fn atoms(candidates: Vec<Entity>) -> Self {
        Self {
            candidates: candidates.into_iter(),
            filter: MatchFilter::Atoms,
        }
    }

    /// Only the edges among the candidates.
    #[must_use]
    pub fn edges(candidates: Vec<Entity>) -> Self {
        Self {
            candidates: candidates.into_iter(),
            filter: MatchFilter::Edges,
        }
    }

    /// Candidates that match an edge pattern.
    ///
    /// Full patterns skip structural comparison and only check arity.
    #[must_use]
    pub fn pattern(candidates: Vec<Entity>, pattern: Entity) -> Self {
        let filter = if full_pattern(&pattern) {
            let (fixed, open) = positional(pattern.children());
            if open && fixed.is_empty() {
                MatchFilter::Edges
            } else {
                MatchFilter::Arity {
                    len: fixed.len(),
                    open,
                }
            }
        } else {
            MatchFilter::Structural(pattern)
        };
        Self {
            candidates: candidates.into_iter(),
            filter,
        }
    }
}

impl Iterator for Matches {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        let filter = &self.filter;
        self.candidates.find(|candidate| filter.accepts(candidate))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.candidates.size_hint().1)
    }
}

// =============================================================================
// TESTS
// =============================================================================
