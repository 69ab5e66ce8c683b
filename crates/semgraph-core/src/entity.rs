//! # Entity Model
//!
//! Atoms and recursive edges, their textual grammar and structural helpers.
//!
//! ```text
//! atom   := token ('/' type)? ('/' namespace)?
//! edge   := '(' entity (WS entity)* ')'
//! entity := atom | edge
//! ```
//!
//! Tokens exclude `(`, `)`, `/` and whitespace. An atom with a namespace but
//! no type is written `root//namespace`.
//!
//! Entities are immutable values. Equality, ordering and hashing are
//! structural, so any entity can key a `BTreeMap` directly.

use crate::primitives::{
    ATOM_SEPARATOR, MAX_ENTITY_TEXT_LENGTH, MAX_PARSE_DEPTH, OPEN_ENDED, WILDCARD_ANY,
    WILDCARD_ATOM, WILDCARD_EDGE,
};
use crate::types::{HypergraphError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// TYPE CODES
// =============================================================================

/// Single-letter type code carried by an atom (first character of its type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeCode {
    Concept,
    Predicate,
    Modifier,
    Builder,
    Trigger,
    Conjunction,
    Relation,
    Specifier,
    /// A letter outside the known alphabet. Preserved, never rejected.
    Other(char),
}

impl TypeCode {
    #[must_use]
    pub fn from_char(c: char) -> Self {
        match c {
            'c' => Self::Concept,
            'p' => Self::Predicate,
            'm' => Self::Modifier,
            'b' => Self::Builder,
            't' => Self::Trigger,
            'j' => Self::Conjunction,
            'r' => Self::Relation,
            's' => Self::Specifier,
            other => Self::Other(other),
        }
    }
}

// =============================================================================
// ATOM
// =============================================================================

/// Indivisible entity: root label plus optional type and namespace.
///
/// The type string keeps everything after the first `/`, so `is/pd` has type
/// `pd` and type code `p`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Atom {
    root: String,
    kind: Option<String>,
    namespace: Option<String>,
}

impl Atom {
    /// Create an untyped atom. The root is taken verbatim; use
    /// [`Atom::parse`] for validated construction from text.
    #[must_use]
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            kind: None,
            namespace: None,
        }
    }

    /// Set the type string (e.g. `"c"`, `"pd"`).
    #[must_use]
    pub fn with_type(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Set the namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Parse a single atom token.
    pub fn parse(token: &str) -> Result<Self> {
        Self::from_token(token, 0)
    }

    fn from_token(token: &str, offset: usize) -> Result<Self> {
        if token.is_empty() {
            return Err(HypergraphError::parse("empty atom token", offset));
        }
        if let Some((i, c)) = token
            .char_indices()
            .find(|(_, c)| c.is_whitespace() || *c == '(' || *c == ')')
        {
            return Err(HypergraphError::parse(
                format!("invalid character {:?} in atom token", c),
                offset + i,
            ));
        }

        let parts: Vec<&str> = token.split(ATOM_SEPARATOR).collect();
        if parts.len() > 3 {
            return Err(HypergraphError::parse(
                format!("atom '{}' has more than three parts", token),
                offset,
            ));
        }

        let root = parts[0];
        if root.is_empty() {
            return Err(HypergraphError::parse("empty atom root", offset));
        }

        let namespace = match parts.get(2) {
            Some(ns) if ns.is_empty() => {
                return Err(HypergraphError::parse(
                    format!("empty namespace in atom '{}'", token),
                    offset,
                ));
            }
            Some(ns) => Some((*ns).to_string()),
            None => None,
        };

        let kind = match parts.get(1) {
            // `root//ns` is the spelling of an untyped, namespaced atom.
            Some(k) if k.is_empty() && namespace.is_some() => None,
            Some(k) if k.is_empty() => {
                return Err(HypergraphError::parse(
                    format!("empty type in atom '{}'", token),
                    offset,
                ));
            }
            Some(k) => Some((*k).to_string()),
            None => None,
        };

        Ok(Self {
            root: root.to_string(),
            kind,
            namespace,
        })
    }

    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Full type string, if any.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Type code: first character of the type string.
    #[must_use]
    pub fn type_code(&self) -> Option<TypeCode> {
        self.kind
            .as_deref()
            .and_then(|k| k.chars().next())
            .map(TypeCode::from_char)
    }

    /// True for the bare pattern tokens `*`, `@`, `&` and `...`.
    #[must_use]
    pub fn is_pattern_token(&self) -> bool {
        self.kind.is_none()
            && self.namespace.is_none()
            && matches!(
                self.root.as_str(),
                WILDCARD_ANY | WILDCARD_ATOM | WILDCARD_EDGE | OPEN_ENDED
            )
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.root)?;
        match (&self.kind, &self.namespace) {
            (Some(kind), Some(ns)) => write!(f, "/{}/{}", kind, ns),
            (Some(kind), None) => write!(f, "/{}", kind),
            (None, Some(ns)) => write!(f, "//{}", ns),
            (None, None) => Ok(()),
        }
    }
}

impl FromStr for Atom {
    type Err = HypergraphError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// =============================================================================
// ENTITY
// =============================================================================

/// An atom or an ordered, non-empty edge of entities.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Entity {
    Atom(Atom),
    Edge(Vec<Entity>),
}

impl Entity {
    /// Build an edge. Fails on an empty child list.
    pub fn edge(children: Vec<Entity>) -> Result<Self> {
        if children.is_empty() {
            return Err(HypergraphError::InvalidEntity(
                "an edge needs at least one child".to_string(),
            ));
        }
        Ok(Self::Edge(children))
    }

    /// Parse the textual form of an entity or pattern.
    pub fn parse(text: &str) -> Result<Self> {
        Parser::new(text).parse_complete()
    }

    #[must_use]
    pub fn is_atom(&self) -> bool {
        matches!(self, Self::Atom(_))
    }

    #[must_use]
    pub fn is_edge(&self) -> bool {
        matches!(self, Self::Edge(_))
    }

    #[must_use]
    pub fn as_atom(&self) -> Option<&Atom> {
        match self {
            Self::Atom(atom) => Some(atom),
            Self::Edge(_) => None,
        }
    }

    /// Children of an edge; empty for atoms.
    #[must_use]
    pub fn children(&self) -> &[Entity] {
        match self {
            Self::Atom(_) => &[],
            Self::Edge(children) => children,
        }
    }

    /// First child of an edge.
    #[must_use]
    pub fn connector(&self) -> Option<&Entity> {
        self.children().first()
    }

    /// Number of children (zero for atoms).
    #[must_use]
    pub fn arity(&self) -> usize {
        self.children().len()
    }

    /// Type code of an atom, or of an edge's connector resolved recursively.
    #[must_use]
    pub fn type_code(&self) -> Option<TypeCode> {
        let mut current = self;
        loop {
            match current {
                Self::Atom(atom) => return atom.type_code(),
                Self::Edge(children) => current = children.first()?,
            }
        }
    }

    /// Every atom reachable at any depth.
    #[must_use]
    pub fn atoms(&self) -> BTreeSet<Atom> {
        let mut out = BTreeSet::new();
        self.collect_atoms(&mut out);
        out
    }

    fn collect_atoms(&self, out: &mut BTreeSet<Atom>) {
        match self {
            Self::Atom(atom) => {
                out.insert(atom.clone());
            }
            Self::Edge(children) => {
                for child in children {
                    child.collect_atoms(out);
                }
            }
        }
    }

    /// Every edge at any depth, including `self` when it is an edge.
    /// Parents come before their sub-edges.
    #[must_use]
    pub fn subedges(&self) -> Vec<&Entity> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(current) = stack.pop() {
            if let Self::Edge(children) = current {
                out.push(current);
                stack.extend(children.iter().rev());
            }
        }
        out
    }

    /// Nesting depth: 0 for atoms, 1 for an edge of atoms.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Atom(_) => 0,
            Self::Edge(children) => children
                .iter()
                .map(Self::depth)
                .max()
                .unwrap_or(0)
                .saturating_add(1),
        }
    }

    /// True if this is a bare wildcard or `...` atom, or an edge containing one.
    #[must_use]
    pub fn is_pattern(&self) -> bool {
        match self {
            Self::Atom(atom) => atom.is_pattern_token(),
            Self::Edge(children) => children.iter().any(Self::is_pattern),
        }
    }
}

impl From<Atom> for Entity {
    fn from(atom: Atom) -> Self {
        Self::Atom(atom)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom(atom) => atom.fmt(f),
            Self::Edge(children) => {
                f.write_str("(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    child.fmt(f)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl FromStr for Entity {
    type Err = HypergraphError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// =============================================================================
// PARSER
// =============================================================================

/// Recursive-descent parser over the textual grammar.
struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn parse_complete(mut self) -> Result<Entity> {
        if self.text.len() > MAX_ENTITY_TEXT_LENGTH {
            return Err(HypergraphError::parse(
                format!(
                    "input length {} exceeds maximum {} bytes",
                    self.text.len(),
                    MAX_ENTITY_TEXT_LENGTH
                ),
                0,
            ));
        }
        self.skip_whitespace();
        let entity = self.entity(0)?;
        self.skip_whitespace();
        match self.peek() {
            None => Ok(entity),
            Some(')') => Err(HypergraphError::parse("unbalanced ')'", self.pos)),
            Some(_) => Err(HypergraphError::parse(
                "unexpected input after entity",
                self.pos,
            )),
        }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn entity(&mut self, depth: usize) -> Result<Entity> {
        match self.peek() {
            None => Err(HypergraphError::parse("unexpected end of input", self.pos)),
            Some('(') => self.edge(depth),
            Some(')') => Err(HypergraphError::parse("unbalanced ')'", self.pos)),
            Some(_) => self.atom().map(Entity::Atom),
        }
    }

    fn edge(&mut self, depth: usize) -> Result<Entity> {
        if depth >= MAX_PARSE_DEPTH {
            return Err(HypergraphError::parse(
                format!("nesting deeper than {} levels", MAX_PARSE_DEPTH),
                self.pos,
            ));
        }
        let open = self.pos;
        self.bump();

        let mut children = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => {
                    return Err(HypergraphError::parse(
                        "unbalanced '(': missing ')'",
                        open,
                    ));
                }
                Some(')') => {
                    self.bump();
                    break;
                }
                Some(_) => children.push(self.entity(depth + 1)?),
            }
        }

        if children.is_empty() {
            return Err(HypergraphError::parse("empty edge '()'", open));
        }
        Ok(Entity::Edge(children))
    }

    fn atom(&mut self) -> Result<Atom> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == '(' || c == ')' {
                break;
            }
            self.bump();
        }
        Atom::from_token(&self.text[start..self.pos], start)
    }
}

// =============================================================================
// TESTS
// =============================================================================
