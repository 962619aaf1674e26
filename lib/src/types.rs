use crate::error::{ShexParseError, ShexParseErrorKind};
use crate::shacl::vocab as shacl;
use oxrdf::{Literal, NamedNode, NamedNodeRef, TermRef};
use std::collections::BTreeMap;
use std::fmt;

/// An occurrence bound `(min, max)` on a triple constraint.
///
/// `max == None` means unbounded. The `Display` impl prints the canonical
/// ShExC abbreviation: `?`, `*`, `+`, nothing for exactly-one, and the
/// `{m,n}` form for everything else.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Cardinality {
    pub min: u32,
    pub max: Option<u32>,
}

impl Cardinality {
    /// Exactly one occurrence, the ShEx default.
    pub const ONE: Cardinality = Cardinality {
        min: 1,
        max: Some(1),
    };
    /// Zero or one (`?`).
    pub const OPTIONAL: Cardinality = Cardinality {
        min: 0,
        max: Some(1),
    };
    /// Zero or more (`*`).
    pub const ANY: Cardinality = Cardinality { min: 0, max: None };
    /// One or more (`+`).
    pub const ONE_OR_MORE: Cardinality = Cardinality { min: 1, max: None };

    pub fn new(min: u32, max: Option<u32>) -> Self {
        Cardinality { min, max }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (1, Some(1)) => Ok(()),
            (0, Some(1)) => write!(f, "?"),
            (0, None) => write!(f, "*"),
            (1, None) => write!(f, "+"),
            (min, Some(max)) if min == max => write!(f, "{{{min}}}"),
            (min, Some(max)) => write!(f, "{{{min},{max}}}"),
            (min, None) => write!(f, "{{{min},*}}"),
        }
    }
}

/// The kind of RDF term a value may be, mirroring the `sh:nodeKind` enum.
///
/// ShExC can only express the first four (`IRI`, `BNODE`, `LITERAL`,
/// `NONLITERAL`); the remaining two are lost when converting to ShEx.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Iri,
    BlankNode,
    Literal,
    BlankNodeOrIri,
    BlankNodeOrLiteral,
    IriOrLiteral,
}

impl NodeKind {
    /// Reads a `NodeKind` from a `sh:nodeKind` object term.
    pub fn from_term(term: TermRef<'_>) -> Option<Self> {
        let TermRef::NamedNode(nn) = term else {
            return None;
        };
        if nn == shacl::IRI {
            Some(NodeKind::Iri)
        } else if nn == shacl::BLANK_NODE {
            Some(NodeKind::BlankNode)
        } else if nn == shacl::LITERAL {
            Some(NodeKind::Literal)
        } else if nn == shacl::BLANK_NODE_OR_IRI {
            Some(NodeKind::BlankNodeOrIri)
        } else if nn == shacl::BLANK_NODE_OR_LITERAL {
            Some(NodeKind::BlankNodeOrLiteral)
        } else if nn == shacl::IRI_OR_LITERAL {
            Some(NodeKind::IriOrLiteral)
        } else {
            None
        }
    }

    /// The `sh:` vocabulary IRI for this kind.
    pub fn as_named_node(&self) -> NamedNodeRef<'static> {
        match self {
            NodeKind::Iri => shacl::IRI,
            NodeKind::BlankNode => shacl::BLANK_NODE,
            NodeKind::Literal => shacl::LITERAL,
            NodeKind::BlankNodeOrIri => shacl::BLANK_NODE_OR_IRI,
            NodeKind::BlankNodeOrLiteral => shacl::BLANK_NODE_OR_LITERAL,
            NodeKind::IriOrLiteral => shacl::IRI_OR_LITERAL,
        }
    }

    /// The ShExC keyword for this kind, if the kind is expressible in ShEx.
    pub fn shexc_keyword(&self) -> Option<&'static str> {
        match self {
            NodeKind::Iri => Some("IRI"),
            NodeKind::BlankNode => Some("BNODE"),
            NodeKind::Literal => Some("LITERAL"),
            NodeKind::BlankNodeOrIri => Some("NONLITERAL"),
            NodeKind::BlankNodeOrLiteral | NodeKind::IriOrLiteral => None,
        }
    }
}

/// A property path. Only single predicates and their inverses are modeled;
/// sequence, alternative and star paths are out of scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Path {
    Direct(NamedNode),
    Inverse(NamedNode),
}

impl Path {
    pub fn predicate(&self) -> &NamedNode {
        match self {
            Path::Direct(p) | Path::Inverse(p) => p,
        }
    }

    pub fn is_inverse(&self) -> bool {
        matches!(self, Path::Inverse(_))
    }
}

/// One member of a value set (`sh:in` / ShExC `[ ... ]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueSetItem {
    Iri(NamedNode),
    Literal(Literal),
    /// An IRI-prefix pattern, ShExC `<prefix>~`.
    Stem(String),
}

impl ValueSetItem {
    pub fn as_iri(&self) -> Option<&NamedNode> {
        match self {
            ValueSetItem::Iri(iri) => Some(iri),
            _ => None,
        }
    }
}

/// A ShEx shape name, kept as written: either an absolute IRI or a
/// reference relative to the schema base.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeLabel(String);

impl ShapeLabel {
    pub fn new(label: impl Into<String>) -> Self {
        ShapeLabel(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the label starts with an RFC 3987 scheme, i.e. is absolute.
    pub fn is_absolute(&self) -> bool {
        iri_has_scheme(&self.0)
    }
}

impl fmt::Display for ShapeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ShapeLabel {
    fn from(label: &str) -> Self {
        ShapeLabel(label.to_owned())
    }
}

/// Returns true when `iri` begins with `scheme:`.
pub(crate) fn iri_has_scheme(iri: &str) -> bool {
    let Some(colon) = iri.find(':') else {
        return false;
    };
    let scheme = &iri[..colon];
    let mut chars = scheme.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// A mapping from prefix names to namespace IRIs.
///
/// Stored sorted so the serializers get lexicographic prefix order for
/// free. `with_defaults` seeds the well-known namespaces every schema in
/// this domain uses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixTable {
    entries: BTreeMap<String, String>,
}

pub(crate) const DEFAULT_PREFIXES: &[(&str, &str)] = &[
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
    ("sh", "http://www.w3.org/ns/shacl#"),
    ("schema", "http://schema.org/"),
];

impl PrefixTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        for (prefix, iri) in DEFAULT_PREFIXES {
            table.insert(*prefix, *iri);
        }
        table
    }

    pub fn insert(&mut self, prefix: impl Into<String>, iri: impl Into<String>) {
        self.entries.insert(prefix.into(), iri.into());
    }

    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.entries.get(prefix).map(String::as_str)
    }

    /// Expands `prefix:local` into a full IRI.
    pub fn expand(&self, prefix: &str, local: &str) -> Option<String> {
        self.get(prefix).map(|base| format!("{base}{local}"))
    }

    /// Expands a prefixed name into a validated `NamedNode`, reporting
    /// `UnknownPrefix` or `InvalidIri` at `position` on failure.
    pub(crate) fn expand_named(
        &self,
        prefix: &str,
        local: &str,
        position: crate::error::Position,
    ) -> Result<NamedNode, ShexParseError> {
        let iri = self.expand(prefix, local).ok_or_else(|| ShexParseError {
            kind: ShexParseErrorKind::UnknownPrefix(prefix.to_owned()),
            position,
        })?;
        NamedNode::new(&iri).map_err(|_| ShexParseError {
            kind: ShexParseErrorKind::InvalidIri(iri),
            position,
        })
    }

    /// Finds the longest declared namespace that `iri` starts with and
    /// returns the `(prefix, local)` split.
    pub fn compress<'a>(&self, iri: &'a str) -> Option<(&str, &'a str)> {
        let mut best: Option<(&str, &'a str)> = None;
        for (prefix, base) in &self.entries {
            if let Some(local) = iri.strip_prefix(base.as_str()) {
                if best.is_none_or(|(_, l)| local.len() < l.len()) {
                    best = Some((prefix, local));
                }
            }
        }
        // A local part with path separators would not re-parse as a PNAME.
        best.filter(|(_, local)| is_pname_local(local))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(p, iri)| (p.as_str(), iri.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Restricted PN_LOCAL check: what our ShExC lexer will read back.
pub(crate) fn is_pname_local(local: &str) -> bool {
    !local.ends_with('.')
        && local
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
