//! Emits a [`ShaclSchema`] as an ordered triple bag and, through
//! `oxttl`, as Turtle text.

use crate::error::ShaclError;
use crate::shacl::{NestedShape, NodeShape, PropertyShape, ShaclSchema, ShapeId};
use crate::types::{Path, ValueSetItem};
use crate::shacl::vocab as shacl;
use oxrdf::vocab::{rdf, xsd};
use oxrdf::{BlankNode, Literal, NamedNode, Term, Triple};
use oxttl::TurtleSerializer;

/// Hands out fresh, deterministic blank-node labels for property shapes
/// and list cells.
struct BlankAllocator {
    next: usize,
}

impl BlankAllocator {
    fn new() -> Self {
        BlankAllocator { next: 0 }
    }

    fn fresh(&mut self) -> BlankNode {
        let node = BlankNode::new_unchecked(format!("b{}", self.next));
        self.next += 1;
        node
    }
}

/// Builds the triple bag for a schema. Triple order within a subject is
/// stable: `rdf:type` first, then targets, then each `sh:property` with
/// its body in definition order.
pub fn to_triples(schema: &ShaclSchema) -> Vec<Triple> {
    let mut triples = Vec::new();
    let mut alloc = BlankAllocator::new();
    for shape in &schema.shapes {
        emit_node_shape(shape, &mut triples, &mut alloc);
    }
    triples
}

/// Serializes a schema to Turtle text with its prefix table.
pub fn to_turtle(schema: &ShaclSchema) -> Result<String, ShaclError> {
    let mut serializer = TurtleSerializer::new();
    for (prefix, iri) in schema.prefixes.iter() {
        serializer = serializer.with_prefix(prefix, iri)?;
    }
    let mut writer = serializer.for_writer(Vec::new());
    for triple in to_triples(schema) {
        writer.serialize_triple(&triple)?;
    }
    let bytes = writer.finish()?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn shape_triple(id: &ShapeId, predicate: NamedNode, object: impl Into<Term>) -> Triple {
    match id {
        ShapeId::Iri(n) => Triple::new(n.clone(), predicate, object),
        ShapeId::Blank(b) => Triple::new(b.clone(), predicate, object),
    }
}

fn emit_node_shape(shape: &NodeShape, triples: &mut Vec<Triple>, alloc: &mut BlankAllocator) {
    triples.push(shape_triple(
        &shape.id,
        rdf::TYPE.into_owned(),
        shacl::NODE_SHAPE.into_owned(),
    ));
    for class in &shape.target_classes {
        triples.push(shape_triple(
            &shape.id,
            shacl::TARGET_CLASS.into_owned(),
            class.clone(),
        ));
    }
    for node in &shape.target_nodes {
        triples.push(shape_triple(
            &shape.id,
            shacl::TARGET_NODE.into_owned(),
            node.clone(),
        ));
    }
    if shape.closed {
        triples.push(shape_triple(
            &shape.id,
            shacl::CLOSED.into_owned(),
            Literal::from(true),
        ));
        if !shape.ignored_properties.is_empty() {
            let items: Vec<Term> = shape
                .ignored_properties
                .iter()
                .map(|p| p.clone().into())
                .collect();
            let head = build_list(&items, triples, alloc);
            triples.push(shape_triple(
                &shape.id,
                shacl::IGNORED_PROPERTIES.into_owned(),
                head,
            ));
        }
    }
    for property in &shape.properties {
        let subject = alloc.fresh();
        triples.push(shape_triple(
            &shape.id,
            shacl::PROPERTY.into_owned(),
            subject.clone(),
        ));
        emit_property_shape(property, &subject, triples, alloc);
    }
}

fn emit_property_shape(
    property: &PropertyShape,
    subject: &BlankNode,
    triples: &mut Vec<Triple>,
    alloc: &mut BlankAllocator,
) {
    match &property.path {
        Path::Direct(iri) => {
            triples.push(Triple::new(
                subject.clone(),
                shacl::PATH.into_owned(),
                iri.clone(),
            ));
        }
        Path::Inverse(iri) => {
            let path_node = alloc.fresh();
            triples.push(Triple::new(
                subject.clone(),
                shacl::PATH.into_owned(),
                path_node.clone(),
            ));
            triples.push(Triple::new(
                path_node,
                shacl::INVERSE_PATH.into_owned(),
                iri.clone(),
            ));
        }
    }

    if let Some(datatype) = &property.datatype {
        triples.push(Triple::new(
            subject.clone(),
            shacl::DATATYPE.into_owned(),
            datatype.clone(),
        ));
    }
    if let Some(class) = &property.class {
        triples.push(Triple::new(
            subject.clone(),
            shacl::CLASS.into_owned(),
            class.clone(),
        ));
    }
    if let Some(kind) = &property.node_kind {
        triples.push(Triple::new(
            subject.clone(),
            shacl::NODE_KIND.into_owned(),
            kind.as_named_node().into_owned(),
        ));
    }
    if let Some(min) = property.min_count {
        triples.push(Triple::new(
            subject.clone(),
            shacl::MIN_COUNT.into_owned(),
            integer_literal(min),
        ));
    }
    if let Some(max) = property.max_count {
        triples.push(Triple::new(
            subject.clone(),
            shacl::MAX_COUNT.into_owned(),
            integer_literal(max),
        ));
    }
    if let Some(value) = &property.has_value {
        triples.push(Triple::new(
            subject.clone(),
            shacl::HAS_VALUE.into_owned(),
            value_term(value),
        ));
    }
    if let Some(values) = &property.values {
        let items: Vec<Term> = values.iter().map(value_term).collect();
        let head = build_list(&items, triples, alloc);
        triples.push(Triple::new(subject.clone(), shacl::IN.into_owned(), head));
    }
    if let Some(pattern) = &property.pattern {
        triples.push(Triple::new(
            subject.clone(),
            shacl::PATTERN.into_owned(),
            Literal::new_simple_literal(pattern.as_str()),
        ));
    }
    if !property.or.is_empty() {
        let mut operands = Vec::new();
        for nested in &property.or {
            let operand = alloc.fresh();
            emit_nested_shape(nested, &operand, triples);
            operands.push(Term::from(operand));
        }
        let head = build_list(&operands, triples, alloc);
        triples.push(Triple::new(subject.clone(), shacl::OR.into_owned(), head));
    }
}

fn emit_nested_shape(nested: &NestedShape, subject: &BlankNode, triples: &mut Vec<Triple>) {
    if let Some(class) = &nested.class {
        triples.push(Triple::new(
            subject.clone(),
            shacl::CLASS.into_owned(),
            class.clone(),
        ));
    }
    if let Some(datatype) = &nested.datatype {
        triples.push(Triple::new(
            subject.clone(),
            shacl::DATATYPE.into_owned(),
            datatype.clone(),
        ));
    }
    if let Some(kind) = &nested.node_kind {
        triples.push(Triple::new(
            subject.clone(),
            shacl::NODE_KIND.into_owned(),
            kind.as_named_node().into_owned(),
        ));
    }
}

/// Chains `items` into an `rdf:first`/`rdf:rest` list and returns its
/// head (or `rdf:nil` for an empty list).
fn build_list(items: &[Term], triples: &mut Vec<Triple>, alloc: &mut BlankAllocator) -> Term {
    let cells: Vec<BlankNode> = items.iter().map(|_| alloc.fresh()).collect();
    for (i, item) in items.iter().enumerate() {
        triples.push(Triple::new(
            cells[i].clone(),
            rdf::FIRST.into_owned(),
            item.clone(),
        ));
        let rest: Term = match cells.get(i + 1) {
            Some(next) => next.clone().into(),
            None => rdf::NIL.into_owned().into(),
        };
        triples.push(Triple::new(cells[i].clone(), rdf::REST.into_owned(), rest));
    }
    match cells.first() {
        Some(head) => head.clone().into(),
        None => rdf::NIL.into_owned().into(),
    }
}

fn value_term(item: &ValueSetItem) -> Term {
    match item {
        ValueSetItem::Iri(iri) => iri.clone().into(),
        ValueSetItem::Literal(lit) => lit.clone().into(),
        // Stems are bridged through sh:pattern by the converter and
        // never reach a value enumeration; keep the emitter total anyway.
        ValueSetItem::Stem(prefix) => Literal::new_simple_literal(prefix.as_str()).into(),
    }
}

fn integer_literal(n: u32) -> Literal {
    Literal::new_typed_literal(n.to_string(), xsd::INTEGER)
}
