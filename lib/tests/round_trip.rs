//! End-to-end translation scenarios and round-trip properties.

use shapetrans::canonicalization::are_isomorphic;
use shapetrans::shacl::{self, ShaclSchema};
use shapetrans::shex::{self, ShexSchema};
use shapetrans::{convert, Warning};

const GENDER_TTL: &str = r#"
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

fn shacl_of(ttl: &str) -> ShaclSchema {
    shacl::parser::parse_turtle(ttl).unwrap()
}

fn shex_of(ttl: &str) -> (ShexSchema, Vec<Warning>) {
    convert::to_shex(&shacl_of(ttl))
}

#[test]
fn minimal_shape_translates_to_the_documented_shexc() {
    let translation = shapetrans::shacl_to_shex(GENDER_TTL).unwrap();
    assert!(translation.warnings.is_empty());
    let text = translation.text;
    assert!(text.contains("PREFIX : <http://example.org/>"));
    assert!(text.contains("<Gender> EXTRA rdf:type {\n"));
    assert!(text.contains("    rdf:type [:GenderClass] ;\n"));
    assert!(text.contains("    rdfs:label xsd:string\n"));
}

#[test]
fn class_references_resolve_to_defined_shapes() {
    let (schema, _) = shex_of(
        r#"
        @prefix sh: <http://www.w3.org/ns/shacl#> .
        @prefix : <http://example.org/> .
        :Person a sh:NodeShape ;
            sh:property [ sh:path :birthPlace ; sh:class :Place ] .
        "#,
    );
    let aux = schema
        .shapes
        .iter()
        .find(|s| s.id.as_str() == "Place")
        .expect("auxiliary shape must be defined");
    let text = shex::serializer::to_shexc(&schema);
    assert!(text.contains(":birthPlace @<Place>"));
    assert!(text.contains("<Place> EXTRA rdf:type {\n    rdf:type [:Place]\n}"));
    assert_eq!(aux.extra.len(), 1);
}

#[test]
fn disjunctive_classes_share_one_auxiliary_shape() {
    let (schema, _) = shex_of(
        r#"
        @prefix sh: <http://www.w3.org/ns/shacl#> .
        @prefix : <http://example.org/> .
        :Person a sh:NodeShape ;
            sh:property [ sh:path :home ;
                sh:or ( [ sh:class :City ] [ sh:class :Country ] ) ] .
        "#,
    );
    let text = shex::serializer::to_shexc(&schema);
    assert!(text.contains(":home @<aux1>"));
    assert!(text.contains("<aux1> EXTRA rdf:type {\n    rdf:type [:City :Country]\n}"));
}

#[test]
fn iri_stems_translate_in_both_directions() {
    // SHACL pattern -> ShEx stem.
    let (schema, warnings) = shex_of(
        r#"
        @prefix sh: <http://www.w3.org/ns/shacl#> .
        @prefix : <http://example.org/> .
        :S a sh:NodeShape ;
            sh:property [ sh:path :friend ; sh:pattern "^http://example.org/people/" ] .
        "#,
    );
    assert!(warnings.is_empty());
    let text = shex::serializer::to_shexc(&schema);
    assert!(text.contains("[<http://example.org/people/>~]"));

    // And back to the exact same pattern.
    let (back, _) = convert::to_shacl(&schema);
    assert_eq!(
        back.shapes[0].properties[0].pattern.as_deref(),
        Some("^http://example.org/people/")
    );
}

#[test]
fn cardinality_translation_table() {
    let (schema, _) = shex_of(
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
    let text = shex::serializer::to_shexc(&schema);
    assert!(text.contains(":a xsd:string {0,3}"));
    assert!(text.contains(":b xsd:string *"));
    assert!(text.contains(":c xsd:string +"));
    // No counts at all is SHACL's (0,unbounded), printed canonically.
    assert!(text.contains(":d xsd:string *"));
}

#[test]
fn inverse_paths_translate_to_caret_constraints() {
    let (schema, _) = shex_of(
        r#"
        @prefix sh: <http://www.w3.org/ns/shacl#> .
        @prefix : <http://example.org/> .
        :Child a sh:NodeShape ;
            sh:property [ sh:path [ sh:inversePath :hasParent ] ; sh:minCount 1 ; sh:maxCount 1 ] .
        "#,
    );
    let text = shex::serializer::to_shexc(&schema);
    assert!(text.contains("^:hasParent ."));

    let (back, _) = convert::to_shacl(&schema);
    let path = &back.shapes[0].properties[0].path;
    assert!(path.is_inverse());
    assert_eq!(path.predicate().as_str(), "http://example.org/hasParent");
}

#[test]
fn emission_is_deterministic() {
    let (schema, _) = shex_of(GENDER_TTL);
    assert_eq!(
        shex::serializer::to_shexc(&schema),
        shex::serializer::to_shexc(&schema)
    );

    let parsed = shacl_of(GENDER_TTL);
    assert_eq!(
        shacl::serializer::to_turtle(&parsed).unwrap(),
        shacl::serializer::to_turtle(&parsed).unwrap()
    );
}

#[test]
fn converted_schemas_have_unique_shape_ids_and_closed_references() {
    let (schema, _) = shex_of(
        r#"
        @prefix sh: <http://www.w3.org/ns/shacl#> .
        @prefix : <http://example.org/> .
        :Person a sh:NodeShape ;
            sh:property [ sh:path :birthPlace ; sh:class :Place ] ;
            sh:property [ sh:path :deathPlace ; sh:class :Place ] ;
            sh:property [ sh:path :home ;
                sh:or ( [ sh:class :City ] [ sh:class :Country ] ) ] .
        :Place a sh:NodeShape ;
            sh:targetClass :Place .
        "#,
    );

    // Shape uniqueness.
    for (i, a) in schema.shapes.iter().enumerate() {
        for b in &schema.shapes[i + 1..] {
            assert_ne!(a.id, b.id, "duplicate shape id {}", a.id);
        }
    }

    // Auxiliary closure: every reference resolves inside the schema.
    for shape in &schema.shapes {
        for constraint in &shape.expression {
            let targets: Vec<_> = match &constraint.value {
                shex::ValueExpr::Ref(label) => vec![label],
                shex::ValueExpr::OneOf(labels) => labels.iter().collect(),
                _ => continue,
            };
            for target in targets {
                assert!(
                    schema.shape(target).is_some(),
                    "dangling reference @{target} in {}",
                    shape.id
                );
            }
        }
    }
}

#[test]
fn emitted_shexc_reparses_to_the_same_model() {
    let (schema, _) = shex_of(GENDER_TTL);
    let text = shex::serializer::to_shexc(&schema);
    let reparsed = shex::parser::parse(&text).unwrap();
    assert_eq!(schema, reparsed);
}

#[test]
fn target_classes_survive_the_full_circle() {
    let (shex_schema, _) = shex_of(GENDER_TTL);
    let (back, warnings) = convert::to_shacl(&shex_schema);
    assert!(warnings.is_empty());

    let shape = &back.shapes[0];
    assert_eq!(
        shape.id.to_string(),
        "<http://example.org/Gender>",
        "shape ids resolve back through the schema base"
    );
    assert_eq!(shape.target_classes.len(), 1);
    assert_eq!(
        shape.target_classes[0].as_str(),
        "http://example.org/GenderClass"
    );

    let original = shacl_of(GENDER_TTL);
    let (a, b) = (&original.shapes[0], &shape);
    assert_eq!(a.target_classes, b.target_classes);
    assert_eq!(a.properties, b.properties);
}

#[test]
fn full_circle_turtle_is_isomorphic_to_a_normalized_schema() {
    let translation = shapetrans::shacl_to_shex(GENDER_TTL).unwrap();
    let back = shapetrans::shex_to_shacl(&translation.text).unwrap();

    // Re-serializing the original schema normalizes blank labels, so
    // the two documents must describe isomorphic graphs.
    let original = shacl::parser::parse_turtle(GENDER_TTL).unwrap();
    let normalized = shacl::serializer::to_turtle(&original).unwrap();

    let mut expected = oxrdf::Graph::new();
    for triple in shacl::serializer::to_triples(&shacl::parser::parse_turtle(&normalized).unwrap())
    {
        expected.insert(&triple);
    }
    let mut produced = oxrdf::Graph::new();
    for triple in shacl::serializer::to_triples(&shacl::parser::parse_turtle(&back.text).unwrap())
    {
        produced.insert(&triple);
    }
    assert!(are_isomorphic(&expected, &produced));
}

#[test]
fn warnings_surface_through_the_facade() {
    let translation = shapetrans::shacl_to_shex(
        r#"
        @prefix sh: <http://www.w3.org/ns/shacl#> .
        @prefix : <http://example.org/> .
        :S a sh:NodeShape ;
            sh:targetNode :someNode ;
            sh:property [ sh:path :code ; sh:pattern "[A-Z]+" ] .
        "#,
    )
    .unwrap();
    assert_eq!(translation.warnings.len(), 2);
    assert!(translation
        .warnings
        .iter()
        .any(|w| matches!(w, Warning::DroppedPattern { .. })));
    assert!(translation
        .warnings
        .iter()
        .any(|w| matches!(w, Warning::UnsupportedConstruct { construct, .. } if construct == "sh:targetNode")));
}

#[test]
fn shexc_input_reaches_turtle_output() {
    let back = shapetrans::shex_to_shacl(
        "PREFIX ex: <http://example.org/>\n\
         BASE <http://example.org/>\n\
         <Person> EXTRA rdf:type {\n\
             rdf:type [ex:PersonClass] ;\n\
             ex:name xsd:string ;\n\
             ex:friend @<Person> *\n\
         }",
    )
    .unwrap();
    let text = back.text;
    assert!(text.contains("sh:targetClass"));
    assert!(text.contains("PersonClass"));
    assert!(text.contains("sh:minCount"));

    let reparsed = shacl::parser::parse_turtle(&text).unwrap();
    assert_eq!(reparsed.shapes.len(), 1);
    assert_eq!(reparsed.shapes[0].properties.len(), 2);
}
