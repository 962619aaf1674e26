//! Deterministic ShExC pretty-printer.
//!
//! Prefix directives come first in lexicographic order, then the base,
//! then each shape in model order. One triple constraint per line,
//! four-space indent, `;` after every constraint but the last.

use crate::shex::{ShexSchema, ShexShape, TripleConstraint, ValueExpr};
use crate::types::{PrefixTable, ShapeLabel, ValueSetItem};
use oxrdf::vocab::xsd;
use oxrdf::{Literal, NamedNode};
use std::fmt::Write;

/// Prints the schema in compact syntax.
pub fn to_shexc(schema: &ShexSchema) -> String {
    let mut out = String::new();

    let mut wrote_directive = false;
    for (prefix, iri) in schema.prefixes.iter() {
        let _ = writeln!(out, "PREFIX {prefix}: <{iri}>");
        wrote_directive = true;
    }
    if let Some(base) = &schema.base {
        let _ = writeln!(out, "BASE <{base}>");
        wrote_directive = true;
    }
    if wrote_directive {
        out.push('\n');
    }

    for (i, shape) in schema.shapes.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        write_shape(&mut out, shape, &schema.prefixes);
    }
    out
}

fn write_shape(out: &mut String, shape: &ShexShape, prefixes: &PrefixTable) {
    out.push_str(&label(&shape.id, prefixes));
    if !shape.extra.is_empty() {
        out.push_str(" EXTRA");
        for predicate in &shape.extra {
            out.push(' ');
            out.push_str(&iri(predicate, prefixes));
        }
    }
    if shape.closed {
        out.push_str(" CLOSED");
    }
    out.push_str(" {\n");
    let last = shape.expression.len().saturating_sub(1);
    for (i, constraint) in shape.expression.iter().enumerate() {
        out.push_str("    ");
        write_constraint(out, constraint, prefixes);
        if i < last {
            out.push_str(" ;");
        }
        out.push('\n');
    }
    out.push_str("}\n");
}

fn write_constraint(out: &mut String, constraint: &TripleConstraint, prefixes: &PrefixTable) {
    if constraint.inverse {
        out.push('^');
    }
    out.push_str(&iri(&constraint.predicate, prefixes));
    out.push(' ');
    out.push_str(&value_expr(&constraint.value, prefixes));
    let suffix = constraint.cardinality.to_string();
    if !suffix.is_empty() {
        out.push(' ');
        out.push_str(&suffix);
    }
}

fn value_expr(value: &ValueExpr, prefixes: &PrefixTable) -> String {
    match value {
        ValueExpr::Any => ".".to_owned(),
        ValueExpr::Kind(kind) => match kind.shexc_keyword() {
            Some(keyword) => keyword.to_owned(),
            // The two SHACL-only kinds cannot be spelled in ShExC; the
            // converter warns about them, and a model that still holds
            // one degrades to the unconstrained wildcard.
            None => ".".to_owned(),
        },
        ValueExpr::Datatype(datatype) => iri(datatype, prefixes),
        ValueExpr::Values(items) => {
            let rendered: Vec<String> = items.iter().map(|i| value_set_item(i, prefixes)).collect();
            format!("[{}]", rendered.join(" "))
        }
        ValueExpr::Ref(target) => format!("@{}", label(target, prefixes)),
        ValueExpr::OneOf(targets) => {
            let rendered: Vec<String> = targets
                .iter()
                .map(|t| format!("@{}", label(t, prefixes)))
                .collect();
            format!("( {} )", rendered.join(" OR "))
        }
    }
}

fn value_set_item(item: &ValueSetItem, prefixes: &PrefixTable) -> String {
    match item {
        ValueSetItem::Iri(node) => iri(node, prefixes),
        ValueSetItem::Literal(lit) => literal(lit, prefixes),
        ValueSetItem::Stem(prefix) => match prefixes.compress(prefix) {
            Some((p, local)) => format!("{p}:{local}~"),
            None => format!("<{prefix}>~"),
        },
    }
}

fn literal(lit: &Literal, prefixes: &PrefixTable) -> String {
    let quoted = format!("\"{}\"", escape(lit.value()));
    if let Some(lang) = lit.language() {
        return format!("{quoted}@{lang}");
    }
    if lit.datatype() == xsd::STRING {
        return quoted;
    }
    format!("{quoted}^^{}", iri(&lit.datatype().into_owned(), prefixes))
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Renders an IRI as a prefixed name when a declared namespace covers
/// it, as `<...>` otherwise.
fn iri(node: &NamedNode, prefixes: &PrefixTable) -> String {
    match prefixes.compress(node.as_str()) {
        Some((prefix, local)) => format!("{prefix}:{local}"),
        None => format!("<{}>", node.as_str()),
    }
}

/// Renders a shape label: relative references always keep the `<...>`
/// form, absolute ones compress like any other IRI.
fn label(target: &ShapeLabel, prefixes: &PrefixTable) -> String {
    if target.is_absolute() {
        if let Some((prefix, local)) = prefixes.compress(target.as_str()) {
            return format!("{prefix}:{local}");
        }
    }
    format!("<{}>", target.as_str())
}
