use oxrdf::{Graph, NamedNode, Term};
use petgraph::algo::is_isomorphic_matching;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// Converts an `oxrdf::Graph` to a `petgraph::graph::DiGraph`.
///
/// Each unique subject and object becomes a node, each triple a directed
/// edge weighted by its predicate.
pub fn graph_to_petgraph(graph: &Graph) -> DiGraph<Term, NamedNode> {
    let mut pg_graph = DiGraph::<Term, NamedNode>::new();
    let mut node_map = HashMap::<Term, NodeIndex>::new();

    for triple_ref in graph.iter() {
        let subject_term = Term::from(triple_ref.subject.into_owned());
        let object_term = triple_ref.object.into_owned();
        let predicate = triple_ref.predicate.into_owned();

        let s_node = *node_map
            .entry(subject_term.clone())
            .or_insert_with(|| pg_graph.add_node(subject_term));
        let o_node = *node_map
            .entry(object_term.clone())
            .or_insert_with(|| pg_graph.add_node(object_term));

        pg_graph.add_edge(s_node, o_node, predicate);
    }

    pg_graph
}

/// Checks whether two graphs describe the same structure.
///
/// Named nodes and literals must match exactly; blank nodes match any
/// blank node, so two serializations that only differ in generated
/// blank labels compare equal.
pub fn are_isomorphic(g1: &Graph, g2: &Graph) -> bool {
    let pg1 = graph_to_petgraph(g1);
    let pg2 = graph_to_petgraph(g2);

    is_isomorphic_matching(
        &pg1,
        &pg2,
        |n1, n2| matches!((n1, n2), (Term::BlankNode(_), Term::BlankNode(_))) || n1 == n2,
        |e1, e2| e1 == e2,
    )
}
