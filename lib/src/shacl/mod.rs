//! The SHACL side of the translator: model, Turtle ingest and emit.

pub mod parser;
pub mod serializer;
pub mod vocab;

use crate::types::{NodeKind, Path, PrefixTable, ValueSetItem};
use oxrdf::{BlankNode, NamedNode};
use std::fmt;

/// The identifier of a node shape: an IRI or a blank-node label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ShapeId {
    Iri(NamedNode),
    Blank(BlankNode),
}

impl ShapeId {
    pub fn as_iri(&self) -> Option<&NamedNode> {
        match self {
            ShapeId::Iri(iri) => Some(iri),
            ShapeId::Blank(_) => None,
        }
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeId::Iri(iri) => write!(f, "{iri}"),
            ShapeId::Blank(b) => write!(f, "{b}"),
        }
    }
}

impl From<NamedNode> for ShapeId {
    fn from(iri: NamedNode) -> Self {
        ShapeId::Iri(iri)
    }
}

impl From<BlankNode> for ShapeId {
    fn from(b: BlankNode) -> Self {
        ShapeId::Blank(b)
    }
}

/// A parsed SHACL schema: a prefix table plus node shapes in
/// source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShaclSchema {
    pub prefixes: PrefixTable,
    pub shapes: Vec<NodeShape>,
}

impl ShaclSchema {
    /// Looks a shape up by its IRI.
    pub fn shape_by_iri(&self, iri: &NamedNode) -> Option<&NodeShape> {
        self.shapes
            .iter()
            .find(|s| s.id.as_iri().is_some_and(|i| i == iri))
    }
}

/// A `sh:NodeShape` with the constraint subset this translator carries.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeShape {
    pub id: ShapeId,
    pub target_classes: Vec<NamedNode>,
    pub target_nodes: Vec<NamedNode>,
    pub closed: bool,
    pub ignored_properties: Vec<NamedNode>,
    pub properties: Vec<PropertyShape>,
}

impl NodeShape {
    pub fn new(id: impl Into<ShapeId>) -> Self {
        NodeShape {
            id: id.into(),
            target_classes: Vec::new(),
            target_nodes: Vec::new(),
            closed: false,
            ignored_properties: Vec::new(),
            properties: Vec::new(),
        }
    }
}

/// A property shape: one path plus the constraint components attached
/// to it.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyShape {
    pub path: Path,
    pub datatype: Option<NamedNode>,
    /// `sh:class` — the values must be instances of this class.
    pub class: Option<NamedNode>,
    pub node_kind: Option<NodeKind>,
    pub min_count: Option<u32>,
    pub max_count: Option<u32>,
    pub has_value: Option<ValueSetItem>,
    /// `sh:in` — the enumerated set of allowed values.
    pub values: Option<Vec<ValueSetItem>>,
    pub pattern: Option<String>,
    /// `sh:or` — a disjunction of nested constraints.
    pub or: Vec<NestedShape>,
}

impl PropertyShape {
    pub fn new(path: Path) -> Self {
        PropertyShape {
            path,
            datatype: None,
            class: None,
            node_kind: None,
            min_count: None,
            max_count: None,
            has_value: None,
            values: None,
            pattern: None,
            or: Vec::new(),
        }
    }

}

/// One operand of a `sh:or` disjunction. Only the class / datatype /
/// node-kind subset is understood; anything richer is reported as lost.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NestedShape {
    pub class: Option<NamedNode>,
    pub datatype: Option<NamedNode>,
    pub node_kind: Option<NodeKind>,
}
