//! The ShEx side of the translator: model, ShExC lexing, parsing and
//! printing.

pub mod lexer;
pub mod parser;
pub mod serializer;

use crate::types::{Cardinality, NodeKind, PrefixTable, ShapeLabel, ValueSetItem};
use oxrdf::NamedNode;

/// A parsed ShEx schema: directives plus named shapes in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShexSchema {
    pub prefixes: PrefixTable,
    pub base: Option<String>,
    pub shapes: Vec<ShexShape>,
}

impl ShexSchema {
    /// Looks a shape up by its label.
    pub fn shape(&self, label: &ShapeLabel) -> Option<&ShexShape> {
        self.shapes.iter().find(|s| &s.id == label)
    }

    /// Resolves a label to an absolute IRI, against the schema base when
    /// the label is relative. Returns `None` when neither works out.
    pub fn resolve_label(&self, label: &ShapeLabel) -> Option<NamedNode> {
        if label.is_absolute() {
            return NamedNode::new(label.as_str()).ok();
        }
        let base = self.base.as_deref()?;
        let resolved = oxiri::Iri::parse(base).ok()?.resolve(label.as_str()).ok()?;
        NamedNode::new(resolved.as_str()).ok()
    }
}

/// One shape expression: `<id> EXTRA ... CLOSED { constraints }`.
#[derive(Debug, Clone, PartialEq)]
pub struct ShexShape {
    pub id: ShapeLabel,
    /// Predicates excluded from the closed-world check (`EXTRA`).
    pub extra: Vec<NamedNode>,
    pub closed: bool,
    /// A flat conjunction of triple constraints; deeper nesting is out
    /// of scope.
    pub expression: Vec<TripleConstraint>,
}

impl ShexShape {
    pub fn new(id: ShapeLabel) -> Self {
        ShexShape {
            id,
            extra: Vec::new(),
            closed: false,
            expression: Vec::new(),
        }
    }
}

/// A constraint on a single predicate within a shape.
#[derive(Debug, Clone, PartialEq)]
pub struct TripleConstraint {
    pub predicate: NamedNode,
    pub inverse: bool,
    pub value: ValueExpr,
    pub cardinality: Cardinality,
}

impl TripleConstraint {
    pub fn new(predicate: NamedNode, value: ValueExpr) -> Self {
        TripleConstraint {
            predicate,
            inverse: false,
            value,
            cardinality: Cardinality::ONE,
        }
    }
}

/// What the values of a triple constraint must look like.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueExpr {
    /// `.` — any node.
    Any,
    /// `IRI`, `BNODE`, `LITERAL` or `NONLITERAL`.
    Kind(NodeKind),
    /// A datatype IRI.
    Datatype(NamedNode),
    /// `[ ... ]` — an enumerated value set, possibly with IRI stems.
    Values(Vec<ValueSetItem>),
    /// `@<label>` — a reference to another shape.
    Ref(ShapeLabel),
    /// `( @<a> OR @<b> ... )` — a disjunction of shape references.
    OneOf(Vec<ShapeLabel>),
}

impl ValueExpr {
    /// The value set, when this expression is one made only of IRIs.
    pub fn as_iri_set(&self) -> Option<Vec<&NamedNode>> {
        let ValueExpr::Values(items) = self else {
            return None;
        };
        items.iter().map(ValueSetItem::as_iri).collect()
    }
}
