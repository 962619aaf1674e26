//! ShEx → SHACL conversion.
//!
//! `rdf:type` value-set constraints promote to `sh:targetClass`,
//! auxiliary rdf:type shapes are inlined back into `sh:class` /
//! `sh:or`, and `EXTRA rdf:type` disappears (it is SHACL's default
//! open-world reading).

use crate::convert::{local_name, stem_to_pattern};
use crate::error::Warning;
use crate::shacl::{NestedShape, NodeShape, PropertyShape, ShaclSchema, ShapeId};
use crate::shex::{ShexSchema, ShexShape, TripleConstraint, ValueExpr};
use crate::types::{Path, ShapeLabel, ValueSetItem};
use log::{debug, warn};
use oxrdf::vocab::rdf;
use oxrdf::NamedNode;
use std::collections::{HashMap, HashSet};

/// Rewrites a ShEx schema as a SHACL schema. Never fails; anything the
/// mapping cannot carry is reported through the returned warnings.
pub fn to_shacl(schema: &ShexSchema) -> (ShaclSchema, Vec<Warning>) {
    Converter::new(schema).run()
}

struct Converter<'a> {
    source: &'a ShexSchema,
    /// Class sets of shapes recognized as converter-minted auxiliaries.
    auxiliaries: HashMap<&'a ShapeLabel, Vec<NamedNode>>,
    warnings: Vec<Warning>,
}

impl<'a> Converter<'a> {
    fn new(source: &'a ShexSchema) -> Self {
        Converter {
            source,
            auxiliaries: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    fn run(mut self) -> (ShaclSchema, Vec<Warning>) {
        self.classify_auxiliaries();

        let mut shapes = Vec::new();
        for shape in &self.source.shapes {
            if self.auxiliaries.contains_key(&shape.id) {
                // Inlined at every reference site; the definition
                // itself leaves no trace in SHACL.
                continue;
            }
            shapes.push(self.convert_shape(shape));
        }
        debug!(
            "converted {} shex shapes into {} node shapes ({} auxiliary)",
            self.source.shapes.len(),
            shapes.len(),
            self.auxiliaries.len()
        );

        (
            ShaclSchema {
                prefixes: self.source.prefixes.clone(),
                shapes,
            },
            self.warnings,
        )
    }

    /// A shape is treated as a converter-minted auxiliary when it is
    /// referenced, open, and its whole body is one `rdf:type` value-set
    /// constraint — with a multi-class set, or with a single class whose
    /// local name seeded the shape's own name (modulo the numeric
    /// collision suffix).
    fn classify_auxiliaries(&mut self) {
        let mut referenced: HashSet<&ShapeLabel> = HashSet::new();
        for shape in &self.source.shapes {
            for constraint in &shape.expression {
                match &constraint.value {
                    ValueExpr::Ref(label) => {
                        referenced.insert(label);
                    }
                    ValueExpr::OneOf(labels) => referenced.extend(labels.iter()),
                    _ => {}
                }
            }
        }

        for shape in &self.source.shapes {
            if !referenced.contains(&shape.id) || shape.closed {
                continue;
            }
            let Some(classes) = rdf_type_class_set(shape) else {
                continue;
            };
            let auxiliary = match classes.as_slice() {
                [single] => label_seeded_by(&shape.id, single),
                _ => true,
            };
            if auxiliary {
                self.auxiliaries.insert(&shape.id, classes);
            }
        }
    }

    fn convert_shape(&mut self, shape: &ShexShape) -> NodeShape {
        let mut out = NodeShape::new(ShapeId::Iri(self.shape_iri(&shape.id)));
        out.closed = shape.closed;
        if shape.closed {
            out.ignored_properties = shape.extra.clone();
        } else {
            // EXTRA rdf:type is SHACL's default reading and vanishes;
            // anything else has no open-shape counterpart.
            for predicate in &shape.extra {
                if predicate.as_ref() != rdf::TYPE {
                    self.lost(&shape.id, "EXTRA predicate");
                }
            }
        }

        for constraint in &shape.expression {
            if let Some(classes) = promotable_classes(constraint) {
                out.target_classes.extend(classes);
                continue;
            }
            let property = self.convert_constraint(&shape.id, constraint);
            out.properties.push(property);
        }
        out
    }

    fn convert_constraint(
        &mut self,
        owner: &ShapeLabel,
        constraint: &TripleConstraint,
    ) -> PropertyShape {
        let path = if constraint.inverse {
            Path::Inverse(constraint.predicate.clone())
        } else {
            Path::Direct(constraint.predicate.clone())
        };
        let mut property = PropertyShape::new(path);
        property.min_count = Some(constraint.cardinality.min);
        property.max_count = constraint.cardinality.max;

        match &constraint.value {
            ValueExpr::Any => {}
            ValueExpr::Kind(kind) => property.node_kind = Some(*kind),
            ValueExpr::Datatype(datatype) => property.datatype = Some(datatype.clone()),
            ValueExpr::Values(items) => self.convert_values(owner, items, &mut property),
            ValueExpr::Ref(label) => {
                let classes = self.reference_classes(label);
                apply_class_set(&classes, &mut property);
            }
            ValueExpr::OneOf(labels) => {
                let mut classes = Vec::new();
                for label in labels {
                    classes.extend(self.reference_classes(label));
                }
                apply_class_set(&classes, &mut property);
            }
        }
        property
    }

    /// A single value becomes `sh:hasValue` (or `sh:pattern` for a lone
    /// stem); larger sets become `sh:in`, with stems dropped since an
    /// enumeration cannot hold a prefix pattern.
    fn convert_values(
        &mut self,
        owner: &ShapeLabel,
        items: &[ValueSetItem],
        property: &mut PropertyShape,
    ) {
        if let [item] = items {
            match item {
                ValueSetItem::Stem(prefix) => property.pattern = Some(stem_to_pattern(prefix)),
                other => property.has_value = Some(other.clone()),
            }
            return;
        }

        let mut plain = Vec::new();
        let mut stems = Vec::new();
        for item in items {
            match item {
                ValueSetItem::Stem(prefix) => stems.push(prefix.clone()),
                other => plain.push(other.clone()),
            }
        }
        if plain.is_empty() {
            // Nothing enumerable; keep the first stem as the pattern.
            let mut stems = stems.into_iter();
            if let Some(first) = stems.next() {
                property.pattern = Some(stem_to_pattern(&first));
            }
            for _ in stems {
                self.lost(owner, "IRI stem in value set");
            }
        } else {
            for _ in &stems {
                self.lost(owner, "IRI stem in value set");
            }
            property.values = Some(plain);
        }
    }

    /// The class set a shape reference stands for: the inlined classes
    /// of an auxiliary, or the referenced shape's own IRI.
    fn reference_classes(&self, label: &ShapeLabel) -> Vec<NamedNode> {
        if let Some(classes) = self.auxiliaries.get(label) {
            return classes.clone();
        }
        vec![self.shape_iri(label)]
    }

    /// An absolute IRI for a shape label: resolved against the schema
    /// base when relative, with a deterministic `urn:shape:` fallback
    /// when no base applies.
    fn shape_iri(&self, label: &ShapeLabel) -> NamedNode {
        if let Some(iri) = self.source.resolve_label(label) {
            return iri;
        }
        let safe: String = label
            .as_str()
            .chars()
            .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
            .collect();
        NamedNode::new_unchecked(format!("urn:shape:{safe}"))
    }

    fn lost(&mut self, shape: &ShapeLabel, construct: &str) {
        warn!("dropping untranslatable {construct} on {shape}");
        self.warnings.push(Warning::UnsupportedConstruct {
            shape: shape.to_string(),
            construct: construct.to_owned(),
        });
    }
}

fn apply_class_set(classes: &[NamedNode], property: &mut PropertyShape) {
    match classes {
        [] => {}
        [single] => property.class = Some(single.clone()),
        many => {
            property.or = many
                .iter()
                .map(|class| NestedShape {
                    class: Some(class.clone()),
                    datatype: None,
                    node_kind: None,
                })
                .collect();
        }
    }
}

/// The class IRIs of a shape whose entire body is a single non-inverse
/// `rdf:type` value-set constraint.
fn rdf_type_class_set(shape: &ShexShape) -> Option<Vec<NamedNode>> {
    let [constraint] = shape.expression.as_slice() else {
        return None;
    };
    promotable_classes(constraint)
}

/// The classes of a promotable constraint: non-inverse `rdf:type` over
/// a pure-IRI value set.
fn promotable_classes(constraint: &TripleConstraint) -> Option<Vec<NamedNode>> {
    if constraint.inverse || constraint.predicate.as_ref() != rdf::TYPE {
        return None;
    }
    let iris = constraint.value.as_iri_set()?;
    if iris.is_empty() {
        return None;
    }
    Some(iris.into_iter().cloned().collect())
}

/// Whether `label`'s local name is `class`'s local name, optionally
/// followed by the allocator's numeric collision suffix.
fn label_seeded_by(label: &ShapeLabel, class: &NamedNode) -> bool {
    let lab = local_name(label.as_str());
    let cls = local_name(class.as_str());
    if lab == cls {
        return true;
    }
    match lab.strip_prefix(cls) {
        Some(suffix) => !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shex::parser;

    fn convert(shexc: &str) -> (ShaclSchema, Vec<Warning>) {
        to_shacl(&parser::parse(shexc).unwrap())
    }

    #[test]
    fn rdf_type_constraints_promote_to_target_classes() {
        let (schema, warnings) = convert(
            "PREFIX : <http://example.org/>\n\
             BASE <http://example.org/>\n\
             <Gender> EXTRA rdf:type {\n\
                 rdf:type [:GenderClass] ;\n\
                 rdfs:label xsd:string\n\
             }",
        );
        assert!(warnings.is_empty());
        let shape = &schema.shapes[0];
        assert_eq!(
            shape.id,
            ShapeId::Iri(NamedNode::new_unchecked("http://example.org/Gender"))
        );
        assert_eq!(shape.target_classes.len(), 1);
        assert_eq!(
            shape.target_classes[0].as_str(),
            "http://example.org/GenderClass"
        );
        // The promoted constraint is not also a property shape.
        assert_eq!(shape.properties.len(), 1);
        let label = &shape.properties[0];
        assert_eq!(label.min_count, Some(1));
        assert_eq!(label.max_count, Some(1));
    }

    #[test]
    fn auxiliary_shapes_are_inlined_as_classes() {
        let (schema, _) = convert(
            "PREFIX : <http://example.org/>\n\
             BASE <http://example.org/>\n\
             <Person> EXTRA rdf:type {\n\
                 :birthPlace @<Place>\n\
             }\n\
             <Place> EXTRA rdf:type {\n\
                 rdf:type [:Place]\n\
             }",
        );
        // The auxiliary disappears entirely.
        assert_eq!(schema.shapes.len(), 1);
        let property = &schema.shapes[0].properties[0];
        assert_eq!(
            property.class.as_ref().map(NamedNode::as_str),
            Some("http://example.org/Place")
        );
    }

    #[test]
    fn multi_class_auxiliaries_become_sh_or() {
        let (schema, _) = convert(
            "PREFIX : <http://example.org/>\n\
             <Person> EXTRA rdf:type {\n\
                 :home @<aux1>\n\
             }\n\
             <aux1> EXTRA rdf:type {\n\
                 rdf:type [:City :Country]\n\
             }",
        );
        assert_eq!(schema.shapes.len(), 1);
        let property = &schema.shapes[0].properties[0];
        assert!(property.class.is_none());
        let classes: Vec<&str> = property
            .or
            .iter()
            .filter_map(|n| n.class.as_ref().map(NamedNode::as_str))
            .collect();
        assert_eq!(
            classes,
            vec!["http://example.org/City", "http://example.org/Country"]
        );
    }

    #[test]
    fn user_shape_references_become_sh_class() {
        let (schema, _) = convert(
            "PREFIX : <http://example.org/>\n\
             BASE <http://example.org/>\n\
             <Person> EXTRA rdf:type {\n\
                 :employer @<Company>\n\
             }\n\
             <Company> EXTRA rdf:type {\n\
                 rdf:type [:CompanyClass] ;\n\
                 rdfs:label xsd:string\n\
             }",
        );
        // <Company> has a real body, so it stays a user shape.
        assert_eq!(schema.shapes.len(), 2);
        let person = &schema.shapes[0];
        assert_eq!(
            person.properties[0].class.as_ref().map(NamedNode::as_str),
            Some("http://example.org/Company")
        );
    }

    #[test]
    fn stems_become_anchored_patterns() {
        let (schema, _) = convert(
            "PREFIX : <http://example.org/>\n\
             <S> { :friend [<http://example.org/people/>~] }",
        );
        let property = &schema.shapes[0].properties[0];
        assert_eq!(
            property.pattern.as_deref(),
            Some("^http://example.org/people/")
        );
    }

    #[test]
    fn cardinalities_are_emitted_literally() {
        let (schema, _) = convert(
            "PREFIX : <http://example.org/>\n\
             <S> { :a xsd:string {0,3} ; :b xsd:string * ; :c xsd:string }",
        );
        let find = |suffix: &str| {
            schema.shapes[0]
                .properties
                .iter()
                .find(|p| p.path.predicate().as_str().ends_with(suffix))
                .unwrap()
        };
        assert_eq!(find("/a").min_count, Some(0));
        assert_eq!(find("/a").max_count, Some(3));
        assert_eq!(find("/b").min_count, Some(0));
        assert_eq!(find("/b").max_count, None);
        assert_eq!(find("/c").min_count, Some(1));
        assert_eq!(find("/c").max_count, Some(1));
    }

    #[test]
    fn inverse_constraints_become_inverse_paths() {
        let (schema, _) = convert(
            "PREFIX : <http://example.org/>\n<S> { ^:hasParent . }",
        );
        let property = &schema.shapes[0].properties[0];
        assert!(property.path.is_inverse());
        assert_eq!(
            property.path.predicate().as_str(),
            "http://example.org/hasParent"
        );
    }

    #[test]
    fn closed_shapes_keep_extra_as_ignored_properties() {
        let (schema, _) = convert(
            "PREFIX : <http://example.org/>\n\
             <S> EXTRA rdf:type :note CLOSED { :a . }",
        );
        let shape = &schema.shapes[0];
        assert!(shape.closed);
        assert_eq!(shape.ignored_properties.len(), 2);
    }

    #[test]
    fn open_extra_predicates_warn() {
        let (_, warnings) = convert(
            "PREFIX : <http://example.org/>\n\
             <S> EXTRA rdf:type :note { :a . }",
        );
        assert!(matches!(
            warnings.as_slice(),
            [Warning::UnsupportedConstruct { construct, .. }] if construct == "EXTRA predicate"
        ));
    }

    #[test]
    fn single_values_become_has_value() {
        let (schema, _) = convert(
            "PREFIX : <http://example.org/>\n\
             <S> { :status [:Active] ; :tags [:A :B \"x\"] }",
        );
        let find = |suffix: &str| {
            schema.shapes[0]
                .properties
                .iter()
                .find(|p| p.path.predicate().as_str().ends_with(suffix))
                .unwrap()
        };
        assert!(matches!(
            find("/status").has_value,
            Some(ValueSetItem::Iri(_))
        ));
        assert_eq!(find("/tags").values.as_ref().unwrap().len(), 3);
    }

    #[test]
    fn relative_labels_without_base_get_a_urn() {
        let (schema, _) = convert("<Lonely> { }");
        assert_eq!(
            schema.shapes[0].id,
            ShapeId::Iri(NamedNode::new_unchecked("urn:shape:Lonely"))
        );
    }
}
