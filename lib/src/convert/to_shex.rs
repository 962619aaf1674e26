//! SHACL → ShEx conversion.
//!
//! Every node shape becomes a ShEx shape carrying `EXTRA rdf:type`
//! (SHACL never closes the world over types). Class constraints become
//! shape references, minting auxiliary shapes on demand.

use crate::convert::{local_name, namespace_of, pattern_to_stem, NameAllocator};
use crate::error::Warning;
use crate::shacl::{NodeShape, PropertyShape, ShaclSchema, ShapeId};
use crate::shex::{ShexSchema, ShexShape, TripleConstraint, ValueExpr};
use crate::types::{Cardinality, ShapeLabel, ValueSetItem};
use log::{debug, warn};
use oxrdf::vocab::rdf;
use oxrdf::NamedNode;
use std::collections::{BTreeMap, HashMap};

/// Rewrites a SHACL schema as a ShEx schema. Never fails; anything the
/// mapping cannot carry is reported through the returned warnings.
pub fn to_shex(schema: &ShaclSchema) -> (ShexSchema, Vec<Warning>) {
    Converter::new(schema).run()
}

struct Converter<'a> {
    source: &'a ShaclSchema,
    names: NameAllocator,
    /// Allocated label per source shape, parallel to `source.shapes`.
    principal: Vec<ShapeLabel>,
    /// Source shape index by shape IRI, for `sh:class` references to
    /// declared shapes.
    by_iri: HashMap<&'a str, usize>,
    /// Auxiliary shapes already minted, keyed by their canonical
    /// (sorted) class-IRI set.
    aux: BTreeMap<Vec<String>, ShapeLabel>,
    warnings: Vec<Warning>,
}

impl<'a> Converter<'a> {
    fn new(source: &'a ShaclSchema) -> Self {
        Converter {
            source,
            names: NameAllocator::new(),
            principal: Vec::new(),
            by_iri: HashMap::new(),
            aux: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }

    fn run(mut self) -> (ShexSchema, Vec<Warning>) {
        self.allocate_principal_names();

        let base = self
            .source
            .shapes
            .iter()
            .find_map(|s| s.id.as_iri())
            .map(|iri| namespace_of(iri.as_str()).to_owned());

        let mut shapes = Vec::new();
        for (index, shape) in self.source.shapes.iter().enumerate() {
            let mut pending = Vec::new();
            let converted = self.convert_shape(index, shape, &mut pending);
            shapes.push(converted);
            // Auxiliary shapes follow the shape that first needed them.
            shapes.append(&mut pending);
        }
        debug!(
            "converted {} node shapes into {} shex shapes",
            self.source.shapes.len(),
            shapes.len()
        );

        (
            ShexSchema {
                prefixes: self.source.prefixes.clone(),
                base,
                shapes,
            },
            self.warnings,
        )
    }

    /// Names every principal shape before any auxiliary shape exists,
    /// so auxiliaries can never steal a principal's name. IRI ids use
    /// their local name; blank ids derive from the first target class,
    /// then fall back to a counted `_Shape` name.
    fn allocate_principal_names(&mut self) {
        let mut unnamed = 0usize;
        for (index, shape) in self.source.shapes.iter().enumerate() {
            let seed = match &shape.id {
                ShapeId::Iri(iri) => {
                    self.by_iri.insert(iri.as_str(), index);
                    local_name(iri.as_str()).to_owned()
                }
                ShapeId::Blank(_) => shape
                    .target_classes
                    .first()
                    .map(|c| local_name(c.as_str()).to_owned())
                    .unwrap_or_default(),
            };
            let label = if seed.is_empty() {
                unnamed += 1;
                self.names.claim(&format!("_Shape{unnamed}"))
            } else {
                self.names.claim(&seed)
            };
            self.principal.push(ShapeLabel::new(label));
        }
    }

    fn convert_shape(
        &mut self,
        index: usize,
        shape: &NodeShape,
        pending: &mut Vec<ShexShape>,
    ) -> ShexShape {
        let mut out = ShexShape::new(self.principal[index].clone());
        out.extra.push(rdf::TYPE.into_owned());
        out.closed = shape.closed;
        if shape.closed {
            // The ignored properties of a closed shape are exactly the
            // predicates ShEx excludes with EXTRA.
            for property in &shape.ignored_properties {
                if property.as_ref() != rdf::TYPE {
                    out.extra.push(property.clone());
                }
            }
        }

        if !shape.target_classes.is_empty() {
            let cardinality = if shape.target_classes.len() > 1 {
                Cardinality::ONE_OR_MORE
            } else {
                Cardinality::ONE
            };
            let values = shape
                .target_classes
                .iter()
                .map(|c| ValueSetItem::Iri(c.clone()))
                .collect();
            out.expression.push(TripleConstraint {
                predicate: rdf::TYPE.into_owned(),
                inverse: false,
                value: ValueExpr::Values(values),
                cardinality,
            });
        }
        if !shape.target_nodes.is_empty() {
            self.lost(shape, "sh:targetNode");
        }

        for property in &shape.properties {
            let constraint = self.convert_property(shape, property, pending);
            out.expression.push(constraint);
        }
        out
    }

    fn convert_property(
        &mut self,
        owner: &NodeShape,
        property: &PropertyShape,
        pending: &mut Vec<ShexShape>,
    ) -> TripleConstraint {
        let cardinality =
            Cardinality::new(property.min_count.unwrap_or(0), property.max_count);

        // One value expression survives per constraint; pick by
        // priority and report everything else as lost.
        let mut value: Option<ValueExpr> = None;

        if let Some(class) = &property.class {
            value = Some(self.class_reference(class, pending));
        }
        if !property.or.is_empty() {
            if value.is_some() {
                self.lost(owner, "sh:or");
            } else if let Some(classes) = self.or_classes(owner, property) {
                value = Some(ValueExpr::Ref(self.mint_auxiliary(classes, pending)));
            }
        }
        if let Some(items) = &property.values {
            if value.is_none() {
                value = Some(ValueExpr::Values(items.clone()));
            } else {
                self.lost(owner, "sh:in");
            }
        }
        if let Some(item) = &property.has_value {
            if value.is_none() {
                value = Some(ValueExpr::Values(vec![item.clone()]));
            } else {
                self.lost(owner, "sh:hasValue");
            }
        }
        if let Some(datatype) = &property.datatype {
            if value.is_none() {
                value = Some(ValueExpr::Datatype(datatype.clone()));
            } else {
                self.lost(owner, "sh:datatype");
            }
        }
        if let Some(kind) = property.node_kind {
            if value.is_some() {
                self.lost(owner, "sh:nodeKind");
            } else if kind.shexc_keyword().is_some() {
                value = Some(ValueExpr::Kind(kind));
            } else {
                // sh:BlankNodeOrLiteral and sh:IRIOrLiteral have no
                // ShExC spelling.
                self.lost(owner, "sh:nodeKind");
            }
        }
        if let Some(pattern) = &property.pattern {
            match pattern_to_stem(pattern) {
                Some(stem) if value.is_none() => {
                    value = Some(ValueExpr::Values(vec![ValueSetItem::Stem(stem)]));
                }
                Some(_) => self.lost(owner, "sh:pattern"),
                None => {
                    warn!("dropping non-stem pattern {pattern:?} on {}", owner.id);
                    self.warnings.push(Warning::DroppedPattern {
                        shape: owner.id.to_string(),
                        pattern: pattern.clone(),
                    });
                }
            }
        }

        TripleConstraint {
            predicate: property.path.predicate().clone(),
            inverse: property.path.is_inverse(),
            value: value.unwrap_or(ValueExpr::Any),
            cardinality,
        }
    }

    /// `sh:class C`: a reference to the declared shape named `C`, or to
    /// an auxiliary shape that requires its instances to be typed `C`.
    fn class_reference(&mut self, class: &NamedNode, pending: &mut Vec<ShexShape>) -> ValueExpr {
        if let Some(&index) = self.by_iri.get(class.as_str()) {
            return ValueExpr::Ref(self.principal[index].clone());
        }
        ValueExpr::Ref(self.mint_auxiliary(vec![class.clone()], pending))
    }

    /// The class set of a `sh:or` made purely of class wrappers, or
    /// `None` when an operand carries anything else.
    fn or_classes(&mut self, owner: &NodeShape, property: &PropertyShape) -> Option<Vec<NamedNode>> {
        let mut classes = Vec::new();
        for operand in &property.or {
            if operand.datatype.is_some() || operand.node_kind.is_some() {
                self.lost(owner, "sh:or");
                return None;
            }
            match &operand.class {
                Some(class) => classes.push(class.clone()),
                None => {
                    self.lost(owner, "sh:or");
                    return None;
                }
            }
        }
        Some(classes)
    }

    /// Mints (or reuses) the auxiliary shape for a class set. Each
    /// distinct set is emitted exactly once, however often it is
    /// referenced.
    fn mint_auxiliary(&mut self, classes: Vec<NamedNode>, pending: &mut Vec<ShexShape>) -> ShapeLabel {
        let mut key: Vec<String> = classes.iter().map(|c| c.as_str().to_owned()).collect();
        key.sort();
        if let Some(label) = self.aux.get(&key) {
            return label.clone();
        }

        let name = if let [class] = classes.as_slice() {
            self.names.claim(local_name(class.as_str()))
        } else {
            self.names.claim_numbered("aux")
        };
        let label = ShapeLabel::new(name);

        let mut shape = ShexShape::new(label.clone());
        shape.extra.push(rdf::TYPE.into_owned());
        shape.expression.push(TripleConstraint::new(
            rdf::TYPE.into_owned(),
            ValueExpr::Values(classes.into_iter().map(ValueSetItem::Iri).collect()),
        ));
        pending.push(shape);

        self.aux.insert(key, label.clone());
        label
    }

    fn lost(&mut self, shape: &NodeShape, construct: &str) {
        warn!("dropping untranslatable {construct} on {}", shape.id);
        self.warnings.push(Warning::UnsupportedConstruct {
            shape: shape.id.to_string(),
            construct: construct.to_owned(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shacl::parser;
    use crate::shex::serializer;
    use crate::types::NodeKind;

    fn convert(ttl: &str) -> (ShexSchema, Vec<Warning>) {
        to_shex(&parser::parse_turtle(ttl).unwrap())
    }

    #[test]
    fn minimal_shape_becomes_the_expected_shexc() {
        let (schema, warnings) = convert(
            r#"
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
            "#,
        );
        assert!(warnings.is_empty());
        assert_eq!(schema.base.as_deref(), Some("http://example.org/"));
        let printed = serializer::to_shexc(&schema);
        assert!(printed.contains("<Gender> EXTRA rdf:type {\n"));
        assert!(printed.contains("    rdf:type [:GenderClass] ;\n"));
        assert!(printed.contains("    rdfs:label xsd:string\n"));
    }

    #[test]
    fn unknown_class_mints_an_auxiliary_shape() {
        let (schema, _) = convert(
            r#"
            @prefix sh: <http://www.w3.org/ns/shacl#> .
            @prefix : <http://example.org/> .
            :Person a sh:NodeShape ;
                sh:property [ sh:path :birthPlace ; sh:class :Place ] .
            "#,
        );
        assert_eq!(schema.shapes.len(), 2);
        assert_eq!(schema.shapes[0].id, ShapeLabel::new("Person"));
        let aux = &schema.shapes[1];
        assert_eq!(aux.id, ShapeLabel::new("Place"));
        assert_eq!(
            schema.shapes[0].expression[0].value,
            ValueExpr::Ref(ShapeLabel::new("Place"))
        );
        assert_eq!(
            aux.expression[0].value,
            ValueExpr::Values(vec![ValueSetItem::Iri(NamedNode::new_unchecked(
                "http://example.org/Place"
            ))])
        );
    }

    #[test]
    fn declared_classes_are_referenced_without_auxiliaries() {
        let (schema, _) = convert(
            r#"
            @prefix sh: <http://www.w3.org/ns/shacl#> .
            @prefix : <http://example.org/> .
            :Person a sh:NodeShape ;
                sh:property [ sh:path :birthPlace ; sh:class :Place ] .
            :Place a sh:NodeShape ;
                sh:targetClass :PlaceClass .
            "#,
        );
        assert_eq!(schema.shapes.len(), 2);
        let person = schema
            .shapes
            .iter()
            .find(|s| s.id == ShapeLabel::new("Person"))
            .unwrap();
        assert_eq!(
            person.expression[0].value,
            ValueExpr::Ref(ShapeLabel::new("Place"))
        );
    }

    #[test]
    fn class_disjunctions_share_one_auxiliary() {
        let (schema, _) = convert(
            r#"
            @prefix sh: <http://www.w3.org/ns/shacl#> .
            @prefix : <http://example.org/> .
            :Person a sh:NodeShape ;
                sh:property [ sh:path :home ;
                    sh:or ( [ sh:class :City ] [ sh:class :Country ] ) ] ;
                sh:property [ sh:path :work ;
                    sh:or ( [ sh:class :City ] [ sh:class :Country ] ) ] .
            "#,
        );
        // One principal plus exactly one shared auxiliary.
        assert_eq!(schema.shapes.len(), 2);
        let aux = &schema.shapes[1];
        assert_eq!(aux.id, ShapeLabel::new("aux1"));
        let ValueExpr::Values(items) = &aux.expression[0].value else {
            panic!("auxiliary body must be a value set");
        };
        assert_eq!(items.len(), 2);
        for constraint in &schema.shapes[0].expression {
            assert_eq!(constraint.value, ValueExpr::Ref(ShapeLabel::new("aux1")));
        }
    }

    #[test]
    fn cardinality_mapping() {
        let (schema, _) = convert(
            r#"
            @prefix sh: <http://www.w3.org/ns/shacl#> .
            @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
            @prefix : <http://example.org/> .
            :S a sh:NodeShape ;
                sh:property [ sh:path :a ; sh:datatype xsd:string ; sh:minCount 0 ; sh:maxCount 3 ] ;
                sh:property [ sh:path :b ; sh:datatype xsd:string ; sh:minCount 0 ] ;
                sh:property [ sh:path :c ; sh:datatype xsd:string ; sh:minCount 1 ] ;
                sh:property [ sh:path :d ; sh:datatype xsd:string ] .
            "#,
        );
        let by_path = |suffix: &str| {
            schema.shapes[0]
                .expression
                .iter()
                .find(|tc| tc.predicate.as_str().ends_with(suffix))
                .map(|tc| tc.cardinality)
                .unwrap()
        };
        assert_eq!(by_path("/a"), Cardinality::new(0, Some(3)));
        assert_eq!(by_path("/b"), Cardinality::ANY);
        assert_eq!(by_path("/c"), Cardinality::ONE_OR_MORE);
        assert_eq!(by_path("/d"), Cardinality::ANY);
    }

    #[test]
    fn multiple_target_classes_use_one_or_more() {
        let (schema, _) = convert(
            r#"
            @prefix sh: <http://www.w3.org/ns/shacl#> .
            @prefix : <http://example.org/> .
            :S a sh:NodeShape ; sh:targetClass :A , :B .
            "#,
        );
        let tc = &schema.shapes[0].expression[0];
        assert_eq!(tc.cardinality, Cardinality::ONE_OR_MORE);
        let ValueExpr::Values(items) = &tc.value else {
            panic!("expected a value set");
        };
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn stem_patterns_become_value_set_stems() {
        let (schema, warnings) = convert(
            r#"
            @prefix sh: <http://www.w3.org/ns/shacl#> .
            @prefix : <http://example.org/> .
            :S a sh:NodeShape ;
                sh:property [ sh:path :friend ; sh:pattern "^http://example.org/people/" ] ;
                sh:property [ sh:path :code ; sh:pattern "^[A-Z]{3}$" ] .
            "#,
        );
        let friend = schema.shapes[0]
            .expression
            .iter()
            .find(|tc| tc.predicate.as_str().ends_with("friend"))
            .unwrap();
        assert_eq!(
            friend.value,
            ValueExpr::Values(vec![ValueSetItem::Stem(
                "http://example.org/people/".to_owned()
            )])
        );
        assert_eq!(
            warnings,
            vec![Warning::DroppedPattern {
                shape: "<http://example.org/S>".to_owned(),
                pattern: "^[A-Z]{3}$".to_owned(),
            }]
        );
        let code = schema.shapes[0]
            .expression
            .iter()
            .find(|tc| tc.predicate.as_str().ends_with("code"))
            .unwrap();
        assert_eq!(code.value, ValueExpr::Any);
    }

    #[test]
    fn inverse_paths_and_node_kinds() {
        let (schema, _) = convert(
            r#"
            @prefix sh: <http://www.w3.org/ns/shacl#> .
            @prefix : <http://example.org/> .
            :S a sh:NodeShape ;
                sh:property [ sh:path [ sh:inversePath :hasParent ] ; sh:nodeKind sh:IRI ] .
            "#,
        );
        let tc = &schema.shapes[0].expression[0];
        assert!(tc.inverse);
        assert_eq!(tc.value, ValueExpr::Kind(NodeKind::Iri));
    }

    #[test]
    fn inexpressible_node_kind_warns() {
        let (schema, warnings) = convert(
            r#"
            @prefix sh: <http://www.w3.org/ns/shacl#> .
            @prefix : <http://example.org/> .
            :S a sh:NodeShape ;
                sh:property [ sh:path :x ; sh:nodeKind sh:BlankNodeOrLiteral ] .
            "#,
        );
        assert_eq!(schema.shapes[0].expression[0].value, ValueExpr::Any);
        assert!(matches!(
            warnings.as_slice(),
            [Warning::UnsupportedConstruct { construct, .. }] if construct == "sh:nodeKind"
        ));
    }

    #[test]
    fn blank_shapes_are_named_after_their_target_class() {
        let (schema, _) = convert(
            r#"
            @prefix sh: <http://www.w3.org/ns/shacl#> .
            @prefix : <http://example.org/> .
            [] a sh:NodeShape ; sh:targetClass :City .
            "#,
        );
        assert_eq!(schema.shapes[0].id, ShapeLabel::new("City"));
    }

    #[test]
    fn closed_shapes_carry_ignored_properties_into_extra() {
        let (schema, _) = convert(
            r#"
            @prefix sh: <http://www.w3.org/ns/shacl#> .
            @prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .
            @prefix : <http://example.org/> .
            :S a sh:NodeShape ;
                sh:closed true ;
                sh:ignoredProperties ( rdf:type :seeAlso ) .
            "#,
        );
        let shape = &schema.shapes[0];
        assert!(shape.closed);
        assert_eq!(shape.extra.len(), 2);
        assert_eq!(shape.extra[0].as_ref(), rdf::TYPE);
        assert!(shape.extra[1].as_str().ends_with("seeAlso"));
    }
}
