//! Builds a [`ShaclSchema`] from Turtle text or an RDF triple bag.
//!
//! The Turtle lexing itself is delegated to `oxttl`; this module only
//! pattern-matches on the SHACL vocabulary predicates.

use crate::error::ShaclError;
use crate::shacl::{NestedShape, NodeShape, PropertyShape, ShaclSchema, ShapeId};
use crate::types::{NodeKind, Path, PrefixTable, ValueSetItem};
use log::{debug, warn};
use crate::shacl::vocab as shacl;
use oxrdf::vocab::rdf;
use oxrdf::{Graph, NamedNodeRef, Term, TermRef};
use oxttl::TurtleParser;
use std::collections::HashSet;

/// Parses a Turtle document and assembles the SHACL schema it describes.
pub fn parse_turtle(text: &str) -> Result<ShaclSchema, ShaclError> {
    let mut parser = TurtleParser::new().for_slice(text);
    let mut graph = Graph::new();
    while let Some(result) = parser.next() {
        let triple = result?;
        graph.insert(&triple);
    }
    let mut prefixes = PrefixTable::with_defaults();
    for (prefix, iri) in parser.prefixes() {
        prefixes.insert(prefix, iri);
    }
    from_graph(&graph, prefixes)
}

/// Assembles a SHACL schema from an already-parsed triple bag.
pub fn from_graph(graph: &Graph, prefixes: PrefixTable) -> Result<ShaclSchema, ShaclError> {
    let mut shapes = Vec::new();
    for id in shape_subjects(graph) {
        shapes.push(read_node_shape(graph, id)?);
    }
    debug!("parsed {} node shapes from {} triples", shapes.len(), graph.len());
    Ok(ShaclSchema { prefixes, shapes })
}

/// Every subject typed `sh:NodeShape`, plus every object of `sh:node`,
/// deduplicated in first-seen order.
fn shape_subjects(graph: &Graph) -> Vec<ShapeId> {
    let mut ids = Vec::new();
    let mut seen = HashSet::new();
    for triple in graph.iter() {
        let candidate = if triple.predicate == rdf::TYPE && triple.object == shacl::NODE_SHAPE.into() {
            as_shape_id(Term::from(triple.subject.into_owned()).as_ref())
        } else if triple.predicate == shacl::NODE {
            as_shape_id(triple.object)
        } else {
            None
        };
        if let Some(id) = candidate {
            if seen.insert(id.clone()) {
                ids.push(id);
            }
        }
    }
    ids
}

fn as_shape_id(term: TermRef<'_>) -> Option<ShapeId> {
    match term {
        TermRef::NamedNode(n) => Some(ShapeId::Iri(n.into_owned())),
        TermRef::BlankNode(b) => Some(ShapeId::Blank(b.into_owned())),
        _ => None,
    }
}

fn objects<'a>(graph: &'a Graph, id: &ShapeId, predicate: NamedNodeRef<'_>) -> Vec<TermRef<'a>> {
    match id {
        ShapeId::Iri(n) => graph
            .objects_for_subject_predicate(n.as_ref(), predicate)
            .collect(),
        ShapeId::Blank(b) => graph
            .objects_for_subject_predicate(b.as_ref(), predicate)
            .collect(),
    }
}

fn object<'a>(graph: &'a Graph, id: &ShapeId, predicate: NamedNodeRef<'_>) -> Option<TermRef<'a>> {
    objects(graph, id, predicate).into_iter().next()
}

fn read_node_shape(graph: &Graph, id: ShapeId) -> Result<NodeShape, ShaclError> {
    let mut shape = NodeShape::new(id);

    for term in objects(graph, &shape.id, shacl::TARGET_CLASS) {
        match term {
            TermRef::NamedNode(n) => shape.target_classes.push(n.into_owned()),
            other => warn!("ignoring non-IRI sh:targetClass {other} on {}", shape.id),
        }
    }
    for term in objects(graph, &shape.id, shacl::TARGET_NODE) {
        match term {
            TermRef::NamedNode(n) => shape.target_nodes.push(n.into_owned()),
            other => warn!("ignoring non-IRI sh:targetNode {other} on {}", shape.id),
        }
    }

    if let Some(value) = object(graph, &shape.id, shacl::CLOSED) {
        shape.closed = boolean_value(value).unwrap_or(false);
    }
    if let Some(head) = object(graph, &shape.id, shacl::IGNORED_PROPERTIES) {
        for item in read_list(graph, head.into_owned())? {
            match item {
                Term::NamedNode(n) => shape.ignored_properties.push(n),
                other => {
                    warn!("ignoring non-IRI sh:ignoredProperties entry {other} on {}", shape.id)
                }
            }
        }
    }

    for term in objects(graph, &shape.id, shacl::PROPERTY) {
        let Some(prop_id) = as_shape_id(term) else {
            warn!("ignoring literal sh:property object on {}", shape.id);
            continue;
        };
        shape.properties.push(read_property_shape(graph, &prop_id)?);
    }

    Ok(shape)
}

fn read_property_shape(graph: &Graph, id: &ShapeId) -> Result<PropertyShape, ShaclError> {
    let path_term = object(graph, id, shacl::PATH)
        .ok_or_else(|| ShaclError::MissingPath(id.to_string()))?
        .into_owned();
    let mut prop = PropertyShape::new(read_path(graph, id, path_term)?);

    if let Some(TermRef::NamedNode(n)) = object(graph, id, shacl::DATATYPE) {
        prop.datatype = Some(n.into_owned());
    }
    if let Some(TermRef::NamedNode(n)) = object(graph, id, shacl::CLASS) {
        prop.class = Some(n.into_owned());
    }
    if let Some(term) = object(graph, id, shacl::NODE_KIND) {
        prop.node_kind = Some(
            NodeKind::from_term(term)
                .ok_or_else(|| ShaclError::UnrecognizedNodeKind(term.to_string()))?,
        );
    }
    if let Some(term) = object(graph, id, shacl::MIN_COUNT) {
        prop.min_count = count_value(term, id, "sh:minCount");
    }
    if let Some(term) = object(graph, id, shacl::MAX_COUNT) {
        prop.max_count = count_value(term, id, "sh:maxCount");
    }
    if let Some(term) = object(graph, id, shacl::HAS_VALUE) {
        prop.has_value = value_set_item(term);
    }
    if let Some(head) = object(graph, id, shacl::IN) {
        let items = read_list(graph, head.into_owned())?
            .iter()
            .filter_map(|t| value_set_item(t.as_ref()))
            .collect();
        prop.values = Some(items);
    }
    if let Some(TermRef::Literal(lit)) = object(graph, id, shacl::PATTERN) {
        prop.pattern = Some(lit.value().to_owned());
    }
    if let Some(head) = object(graph, id, shacl::OR) {
        for operand in read_list(graph, head.into_owned())? {
            let Some(operand_id) = as_shape_id(operand.as_ref()) else {
                return Err(ShaclError::MalformedList(operand.to_string()));
            };
            prop.or.push(read_nested_shape(graph, &operand_id)?);
        }
    }

    Ok(prop)
}

fn read_nested_shape(graph: &Graph, id: &ShapeId) -> Result<NestedShape, ShaclError> {
    let mut nested = NestedShape::default();
    if let Some(TermRef::NamedNode(n)) = object(graph, id, shacl::CLASS) {
        nested.class = Some(n.into_owned());
    }
    if let Some(TermRef::NamedNode(n)) = object(graph, id, shacl::DATATYPE) {
        nested.datatype = Some(n.into_owned());
    }
    if let Some(term) = object(graph, id, shacl::NODE_KIND) {
        nested.node_kind = Some(
            NodeKind::from_term(term)
                .ok_or_else(|| ShaclError::UnrecognizedNodeKind(term.to_string()))?,
        );
    }
    Ok(nested)
}

/// Resolves a `sh:path` object: a bare IRI is a direct path, a blank
/// node carrying `sh:inversePath` is an inverse one. Anything else
/// (sequences, alternatives, stars) is out of scope.
fn read_path(graph: &Graph, owner: &ShapeId, term: Term) -> Result<Path, ShaclError> {
    match term {
        Term::NamedNode(iri) => Ok(Path::Direct(iri)),
        Term::BlankNode(b) => {
            let inner = object(graph, &ShapeId::Blank(b), shacl::INVERSE_PATH)
                .ok_or_else(|| ShaclError::UnsupportedPath(owner.to_string()))?;
            match inner {
                TermRef::NamedNode(iri) => Ok(Path::Inverse(iri.into_owned())),
                _ => Err(ShaclError::UnsupportedPath(owner.to_string())),
            }
        }
        _ => Err(ShaclError::UnsupportedPath(owner.to_string())),
    }
}

/// Walks an `rdf:first`/`rdf:rest` chain to `rdf:nil`.
fn read_list(graph: &Graph, head: Term) -> Result<Vec<Term>, ShaclError> {
    let mut items = Vec::new();
    let mut current = head;
    let mut visited = HashSet::new();
    loop {
        if current.as_ref() == rdf::NIL.into() {
            return Ok(items);
        }
        if !visited.insert(current.clone()) {
            // Cyclic rest chain.
            return Err(ShaclError::MalformedList(current.to_string()));
        }
        let Some(cell) = as_shape_id(current.as_ref()) else {
            return Err(ShaclError::MalformedList(current.to_string()));
        };
        let first = object(graph, &cell, rdf::FIRST)
            .ok_or_else(|| ShaclError::MalformedList(current.to_string()))?;
        items.push(first.into_owned());
        let rest = object(graph, &cell, rdf::REST)
            .ok_or_else(|| ShaclError::MalformedList(current.to_string()))?;
        current = rest.into_owned();
    }
}

fn value_set_item(term: TermRef<'_>) -> Option<ValueSetItem> {
    match term {
        TermRef::NamedNode(n) => Some(ValueSetItem::Iri(n.into_owned())),
        TermRef::Literal(l) => Some(ValueSetItem::Literal(l.into_owned())),
        other => {
            warn!("ignoring blank node {other} in value enumeration");
            None
        }
    }
}

fn boolean_value(term: TermRef<'_>) -> Option<bool> {
    match term {
        TermRef::Literal(l) => l.value().parse().ok(),
        _ => None,
    }
}

fn count_value(term: TermRef<'_>, owner: &ShapeId, what: &str) -> Option<u32> {
    let TermRef::Literal(l) = term else {
        warn!("ignoring non-literal {what} on {owner}");
        return None;
    };
    match l.value().parse() {
        Ok(n) => Some(n),
        Err(_) => {
            warn!("ignoring unparsable {what} {:?} on {owner}", l.value());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENDER: &str = r#"
        @prefix sh: <http://www.w3.org/ns/shacl#> .
        @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
        @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
        @prefix : <http://example.org/> .

        :Gender a sh:NodeShape ;
            sh:targetClass :GenderClass ;
            sh:property [
                sh:path rdfs:label ;
                sh:datatype xsd:string ;
                sh:minCount 1 ;
                sh:maxCount 1
            ] .
    "#;

    #[test]
    fn parses_a_minimal_node_shape() {
        let schema = parse_turtle(GENDER).unwrap();
        assert_eq!(schema.shapes.len(), 1);
        let shape = &schema.shapes[0];
        assert_eq!(shape.id.to_string(), "<http://example.org/Gender>");
        assert_eq!(shape.target_classes.len(), 1);
        assert_eq!(
            shape.target_classes[0].as_str(),
            "http://example.org/GenderClass"
        );
        let prop = &shape.properties[0];
        assert_eq!(
            prop.path.predicate().as_str(),
            "http://www.w3.org/2000/01/rdf-schema#label"
        );
        assert_eq!(prop.min_count, Some(1));
        assert_eq!(prop.max_count, Some(1));
        assert!(prop.datatype.as_ref().unwrap().as_str().ends_with("string"));
    }

    #[test]
    fn keeps_the_document_prefixes() {
        let schema = parse_turtle(GENDER).unwrap();
        assert_eq!(schema.prefixes.get(""), Some("http://example.org/"));
        assert_eq!(
            schema.prefixes.get("sh"),
            Some("http://www.w3.org/ns/shacl#")
        );
    }

    #[test]
    fn reads_inverse_paths() {
        let ttl = r#"
            @prefix sh: <http://www.w3.org/ns/shacl#> .
            @prefix : <http://example.org/> .
            :Child a sh:NodeShape ;
                sh:property [ sh:path [ sh:inversePath :hasParent ] ] .
        "#;
        let schema = parse_turtle(ttl).unwrap();
        let prop = &schema.shapes[0].properties[0];
        assert!(prop.path.is_inverse());
        assert_eq!(
            prop.path.predicate().as_str(),
            "http://example.org/hasParent"
        );
    }

    #[test]
    fn reads_value_enumerations_and_or_lists() {
        let ttl = r#"
            @prefix sh: <http://www.w3.org/ns/shacl#> .
            @prefix : <http://example.org/> .
            :Pet a sh:NodeShape ;
                sh:property [
                    sh:path :species ;
                    sh:in ( :Cat :Dog "other" )
                ] ;
                sh:property [
                    sh:path :home ;
                    sh:or ( [ sh:class :City ] [ sh:class :Country ] )
                ] .
        "#;
        let schema = parse_turtle(ttl).unwrap();
        let shape = &schema.shapes[0];
        let species = shape
            .properties
            .iter()
            .find(|p| p.path.predicate().as_str().ends_with("species"))
            .unwrap();
        let values = species.values.as_ref().unwrap();
        assert_eq!(values.len(), 3);
        assert!(matches!(values[2], ValueSetItem::Literal(_)));

        let home = shape
            .properties
            .iter()
            .find(|p| p.path.predicate().as_str().ends_with("home"))
            .unwrap();
        assert_eq!(home.or.len(), 2);
        assert_eq!(
            home.or[0].class.as_ref().unwrap().as_str(),
            "http://example.org/City"
        );
    }

    #[test]
    fn missing_path_is_rejected() {
        let ttl = r#"
            @prefix sh: <http://www.w3.org/ns/shacl#> .
            @prefix : <http://example.org/> .
            :Broken a sh:NodeShape ;
                sh:property [ sh:minCount 1 ] .
        "#;
        assert!(matches!(
            parse_turtle(ttl),
            Err(ShaclError::MissingPath(_))
        ));
    }

    #[test]
    fn closed_and_ignored_properties() {
        let ttl = r#"
            @prefix sh: <http://www.w3.org/ns/shacl#> .
            @prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .
            @prefix : <http://example.org/> .
            :Strict a sh:NodeShape ;
                sh:closed true ;
                sh:ignoredProperties ( rdf:type ) .
        "#;
        let schema = parse_turtle(ttl).unwrap();
        let shape = &schema.shapes[0];
        assert!(shape.closed);
        assert_eq!(shape.ignored_properties.len(), 1);
        assert_eq!(shape.ignored_properties[0].as_ref(), rdf::TYPE);
    }
}
