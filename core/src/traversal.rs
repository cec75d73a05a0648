use std::num::NonZeroUsize;

use serde::Serialize;
use tracing::{debug, trace};

use crate::error::Result;
use crate::filter::FilterClause;
use crate::graph::{GraphView, Node, Relationship};
use crate::pattern::Pattern;

/// One element of a path under construction: the relationship traversed to
/// reach `node`. The start node has no relationship.
#[derive(Debug, Clone, Copy)]
pub struct PathElement<'a> {
    pub relationship: Option<&'a Relationship>,
    pub node: &'a Node,
}

/// An accepted path, ready for output.
///
/// `path` holds a `"type:id"` label per node; `relationships` skips the
/// start node's empty slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathResult {
    pub path: Vec<String>,
    pub nodes: Vec<Node>,
    pub relationships: Vec<Relationship>,
}

impl PathResult {
    pub fn from_path(path: &[PathElement<'_>]) -> Self {
        Self {
            path: path.iter().map(|e| e.node.label()).collect(),
            nodes: path.iter().map(|e| e.node.clone()).collect(),
            relationships: path
                .iter()
                .filter_map(|e| e.relationship.cloned())
                .collect(),
        }
    }
}

/// Result of a traversal operation.
#[derive(Debug, Default)]
pub struct TraversalResult {
    /// Accepted paths in traversal order.
    pub paths: Vec<PathResult>,
    /// Frames popped off the DFS stack, complete paths included.
    pub branches_visited: usize,
    /// Stopped at the path limit with branches left unexplored.
    pub truncated: bool,
}

/// Walk `pattern` from `start`, keeping the paths `filter` accepts.
///
/// Depth-first over an explicit stack of (path, step index) frames. Children
/// are pushed in reverse so paths come out in relationship insertion order,
/// the same order a recursive walk would produce. Every frame advances the
/// step index, so the walk is bounded by `degree ^ steps` frames and needs no
/// visited set.
///
/// A path may pass through the same node more than once but uses each
/// relationship at most once, so `-[R]-> X <-[R]- Y` never walks an edge out
/// and straight back. This is the only pruning rule: every other returned
/// pair whose node resolves to the step's type is expanded.
///
/// Neighbors that do not resolve to a node, or whose type differs from the
/// step's, end their branch quietly. Only filter errors propagate.
pub fn traverse<'a, G: GraphView + ?Sized>(
    graph: &'a G,
    start: &'a Node,
    pattern: &Pattern,
    filter: &FilterClause,
    limit: Option<NonZeroUsize>,
) -> Result<TraversalResult> {
    let steps = pattern.steps();
    let mut result = TraversalResult::default();

    let root = vec![PathElement {
        relationship: None,
        node: start,
    }];
    let mut stack: Vec<(Vec<PathElement<'a>>, usize)> = vec![(root, 0)];

    while let Some((path, index)) = stack.pop() {
        result.branches_visited += 1;

        if index == steps.len() {
            if filter.evaluate(&path)? {
                result.paths.push(PathResult::from_path(&path));
                if limit.is_some_and(|max| result.paths.len() >= max.get()) {
                    result.truncated = !stack.is_empty();
                    break;
                }
            }
            continue;
        }

        let step = &steps[index];
        let current = path.last().map_or(start, |e| e.node);
        let next: Vec<(&'a Relationship, &'a Node)> = graph
            .neighbors(current, &step.rel_type, step.direction)
            .into_iter()
            .filter(|(rel, _)| !uses_relationship(&path, rel))
            .filter_map(|(rel, node)| {
                node.filter(|n| n.node_type == step.node_type)
                    .map(|n| (rel, n))
            })
            .collect();

        trace!(
            at = %current.label(),
            step = %step,
            depth = index,
            matches = next.len(),
            "expanding"
        );

        for (rel, node) in next.into_iter().rev() {
            let mut extended = Vec::with_capacity(path.len() + 1);
            extended.extend_from_slice(&path);
            extended.push(PathElement {
                relationship: Some(rel),
                node,
            });
            stack.push((extended, index + 1));
        }
    }

    debug!(
        start = %start.label(),
        steps = steps.len(),
        paths = result.paths.len(),
        branches = result.branches_visited,
        truncated = result.truncated,
        "traversal complete"
    );

    Ok(result)
}

fn uses_relationship(path: &[PathElement<'_>], rel: &Relationship) -> bool {
    path.iter()
        .any(|e| e.relationship.is_some_and(|r| std::ptr::eq(r, rel)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;
    use crate::graph::{Graph, NodeId};
    use crate::value::{properties_from_str, Properties, Value};

    fn add(g: &mut Graph, node_type: &str, json: &str) {
        g.create_node(node_type, properties_from_str(json).unwrap())
            .unwrap();
    }

    fn link(g: &mut Graph, rel: &str, from: (&str, NodeId), to: (&str, NodeId)) {
        assert!(g
            .create_relationship(rel, from.0, from.1, to.0, to.1, Properties::new())
            .unwrap());
    }

    fn run(g: &Graph, start: (&str, NodeId), pattern: &str, filter: &str) -> TraversalResult {
        let start = g.node(start.0, start.1).unwrap();
        let pattern = Pattern::parse(pattern).unwrap();
        traverse(g, start, &pattern, &FilterClause::parse(filter), None).unwrap()
    }

    fn labels(result: &TraversalResult) -> Vec<Vec<&str>> {
        result
            .paths
            .iter()
            .map(|p| p.path.iter().map(|s| s.as_str()).collect())
            .collect()
    }

    /// Person(1, 30) and Person(2, 28) both work at Company(101).
    fn make_office() -> Graph {
        let mut g = Graph::new();
        add(&mut g, "Person", r#"{"id": 1, "name": "Alice", "age": 30}"#);
        add(&mut g, "Person", r#"{"id": 2, "name": "Bob", "age": 28}"#);
        add(&mut g, "Company", r#"{"id": 101, "name": "Acme Inc.", "founded": 2010}"#);
        g.create_relationship(
            "WORKS_AT",
            "Person",
            1,
            "Company",
            101,
            properties_from_str(r#"{"since": 2018, "role": "Engineer"}"#).unwrap(),
        )
        .unwrap();
        g.create_relationship(
            "WORKS_AT",
            "Person",
            2,
            "Company",
            101,
            properties_from_str(r#"{"since": 2019, "role": "Designer"}"#).unwrap(),
        )
        .unwrap();
        g
    }

    fn make_chain(n: u64) -> Graph {
        let mut g = Graph::new();
        for i in 0..n {
            add(&mut g, "Node", &format!(r#"{{"id": {}}}"#, i));
        }
        for i in 0..n - 1 {
            link(&mut g, "NEXT", ("Node", i), ("Node", i + 1));
        }
        g
    }

    fn make_star(leaves: u64) -> Graph {
        let mut g = Graph::new();
        add(&mut g, "Hub", r#"{"id": 0}"#);
        for i in 1..=leaves {
            add(&mut g, "Leaf", &format!(r#"{{"id": {}, "rank": {}}}"#, i, i));
            link(&mut g, "HAS", ("Hub", 0), ("Leaf", i));
        }
        g
    }

    fn make_cycle(n: u64) -> Graph {
        let mut g = Graph::new();
        for i in 0..n {
            add(&mut g, "Node", &format!(r#"{{"id": {}}}"#, i));
        }
        for i in 0..n {
            link(&mut g, "NEXT", ("Node", i), ("Node", (i + 1) % n));
        }
        g
    }

    // --- Office scenario ---

    #[test]
    fn test_coworkers_under_35() {
        let g = make_office();
        let result = run(
            &g,
            ("Person", 1),
            "-[WORKS_AT]-> Company <-[WORKS_AT]- Person",
            "Person.age < 35",
        );
        // Alice's own WORKS_AT is already on the path, so only Bob comes back
        assert_eq!(
            labels(&result),
            vec![vec!["Person:1", "Company:101", "Person:2"]]
        );
    }

    #[test]
    fn test_coworkers_under_29_rejects_all() {
        let g = make_office();
        let result = run(
            &g,
            ("Person", 1),
            "-[WORKS_AT]-> Company <-[WORKS_AT]- Person",
            "Person.age < 29",
        );
        // Bob (28) passes but Alice (30) is on the path too
        assert!(result.paths.is_empty());
        assert_eq!(result.branches_visited, 3);
    }

    #[test]
    fn test_path_result_shape() {
        let g = make_office();
        let result = run(&g, ("Person", 2), "-[WORKS_AT]-> Company", "");
        assert_eq!(result.paths.len(), 1);
        let p = &result.paths[0];
        assert_eq!(p.nodes.len(), 2);
        assert_eq!(p.relationships.len(), 1);
        assert_eq!(p.relationships[0].properties["role"], Value::from("Designer"));

        let json = serde_json::to_value(p).unwrap();
        assert_eq!(json["path"], serde_json::json!(["Person:2", "Company:101"]));
        assert_eq!(json["nodes"][1]["name"], "Acme Inc.");
        assert_eq!(json["relationships"][0]["from"], 2);
        assert_eq!(json["relationships"][0]["since"], 2019);
    }

    #[test]
    fn test_zero_hop_pattern() {
        let g = make_office();
        let result = run(&g, ("Person", 1), "", "Person.age > 18");
        assert_eq!(labels(&result), vec![vec!["Person:1"]]);
        assert!(result.paths[0].relationships.is_empty());

        let result = run(&g, ("Person", 1), "", "Person.age > 40");
        assert!(result.paths.is_empty());
    }

    #[test]
    fn test_type_mismatch_ends_branch() {
        let g = make_office();
        // WORKS_AT leads to a Company, not a Person
        let result = run(&g, ("Person", 1), "-[WORKS_AT]-> Person", "");
        assert!(result.paths.is_empty());
    }

    #[test]
    fn test_unknown_rel_type_yields_nothing() {
        let g = make_office();
        let result = run(&g, ("Person", 1), "-[OWNS]-> Company", "");
        assert!(result.paths.is_empty());
        assert_eq!(result.branches_visited, 1);
    }

    #[test]
    fn test_filter_error_propagates() {
        let g = make_office();
        let start = g.node("Person", 1).unwrap();
        let pattern = Pattern::parse("-[WORKS_AT]-> Company").unwrap();
        let err = traverse(
            &g,
            start,
            &pattern,
            &FilterClause::parse(r#"Company.founded > "2000""#),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::TypeMismatch { .. }));
    }

    #[test]
    fn test_filter_on_intermediate_node() {
        let g = make_office();
        let pattern = "-[WORKS_AT]-> Company <-[WORKS_AT]- Person";
        let result = run(&g, ("Person", 1), pattern, r#"Company.name == "Acme Inc.""#);
        assert_eq!(result.paths.len(), 1);
        let result = run(&g, ("Person", 1), pattern, "Company.founded > 2015");
        assert!(result.paths.is_empty());
    }

    // --- Shapes ---

    #[test]
    fn test_chain_exact_depth() {
        let g = make_chain(6);
        let result = run(
            &g,
            ("Node", 0),
            "-[NEXT]-> Node -[NEXT]-> Node -[NEXT]-> Node",
            "",
        );
        assert_eq!(labels(&result), vec![vec!["Node:0", "Node:1", "Node:2", "Node:3"]]);
    }

    #[test]
    fn test_chain_runs_off_the_end() {
        let g = make_chain(3);
        let result = run(
            &g,
            ("Node", 1),
            "-[NEXT]-> Node -[NEXT]-> Node",
            "",
        );
        assert!(result.paths.is_empty());
    }

    #[test]
    fn test_chain_incoming() {
        let g = make_chain(4);
        let result = run(&g, ("Node", 3), "<-[NEXT]- Node <-[NEXT]- Node", "");
        assert_eq!(labels(&result), vec![vec!["Node:3", "Node:2", "Node:1"]]);
    }

    #[test]
    fn test_star_insertion_order() {
        let g = make_star(50);
        let result = run(&g, ("Hub", 0), "-[HAS]-> Leaf", "");
        assert_eq!(result.paths.len(), 50);
        let ids: Vec<u64> = result.paths.iter().map(|p| p.nodes[1].id).collect();
        assert_eq!(ids, (1..=50).collect::<Vec<_>>());
    }

    #[test]
    fn test_star_filtered() {
        let g = make_star(10);
        let result = run(&g, ("Hub", 0), "-[HAS]-> Leaf", "Leaf.rank > 7");
        assert_eq!(result.paths.len(), 3);
    }

    #[test]
    fn test_star_no_walking_back_same_edge() {
        // Hub -> leaf -> back over the same HAS edge is not a path
        let g = make_star(5);
        let result = run(&g, ("Hub", 0), "-[HAS]-> Leaf <-[HAS]- Hub", "");
        assert!(result.paths.is_empty());
    }

    #[test]
    fn test_cycle_revisits_nodes() {
        let g = make_cycle(3);
        let result = run(
            &g,
            ("Node", 0),
            "-[NEXT]-> Node -[NEXT]-> Node -[NEXT]-> Node",
            "",
        );
        assert_eq!(
            labels(&result),
            vec![vec!["Node:0", "Node:1", "Node:2", "Node:0"]]
        );

        // A fourth hop would reuse NEXT(0->1)
        let result = run(
            &g,
            ("Node", 0),
            "-[NEXT]-> Node -[NEXT]-> Node -[NEXT]-> Node -[NEXT]-> Node",
            "",
        );
        assert!(result.paths.is_empty());
    }

    #[test]
    fn test_self_loops() {
        let mut g = Graph::new();
        add(&mut g, "Node", r#"{"id": 7}"#);
        link(&mut g, "SELF", ("Node", 7), ("Node", 7));
        let result = run(&g, ("Node", 7), "-[SELF]-> Node", "");
        assert_eq!(labels(&result), vec![vec!["Node:7", "Node:7"]]);
        let result = run(&g, ("Node", 7), "-[SELF]-> Node -[SELF]-> Node", "");
        assert!(result.paths.is_empty());

        // Two distinct loops can be taken in either order
        link(&mut g, "SELF", ("Node", 7), ("Node", 7));
        let result = run(&g, ("Node", 7), "-[SELF]-> Node -[SELF]-> Node", "");
        assert_eq!(result.paths.len(), 2);
    }

    #[test]
    fn test_parallel_relationships_give_separate_paths() {
        let mut g = make_office();
        g.create_relationship(
            "WORKS_AT",
            "Person",
            1,
            "Company",
            101,
            properties_from_str(r#"{"since": 2024}"#).unwrap(),
        )
        .unwrap();
        let result = run(&g, ("Person", 1), "-[WORKS_AT]-> Company", "");
        assert_eq!(result.paths.len(), 2);
        assert_eq!(result.paths[0].relationships[0].properties["since"], Value::Int(2018));
        assert_eq!(result.paths[1].relationships[0].properties["since"], Value::Int(2024));
    }

    #[test]
    fn test_dangling_relationship_is_dead_end() {
        let mut g = make_office();
        g.add_relationship(Relationship {
            rel_type: "WORKS_AT".into(),
            from: 1,
            to: 404,
            properties: Properties::new(),
        })
        .unwrap();
        let result = run(&g, ("Person", 1), "-[WORKS_AT]-> Company", "");
        assert_eq!(labels(&result), vec![vec!["Person:1", "Company:101"]]);
    }

    #[test]
    fn test_limit_truncates() {
        let g = make_star(10);
        let start = g.node("Hub", 0).unwrap();
        let pattern = Pattern::parse("-[HAS]-> Leaf").unwrap();
        let result = traverse(
            &g,
            start,
            &pattern,
            &FilterClause::empty(),
            NonZeroUsize::new(3),
        )
        .unwrap();
        assert_eq!(result.paths.len(), 3);
        assert!(result.truncated);
        assert_eq!(result.paths[2].nodes[1].id, 3);

        let result = traverse(
            &g,
            start,
            &pattern,
            &FilterClause::empty(),
            NonZeroUsize::new(10),
        )
        .unwrap();
        assert_eq!(result.paths.len(), 10);
        assert!(!result.truncated);
    }

    #[test]
    fn test_branch_budget() {
        // Ternary tree of depth 3: node i has children 3i+1..=3i+3
        let mut g = Graph::new();
        for i in 0..40 {
            add(&mut g, "Node", &format!(r#"{{"id": {}}}"#, i));
        }
        for parent in 0..13 {
            for child in 3 * parent + 1..=3 * parent + 3 {
                link(&mut g, "E", ("Node", parent), ("Node", child));
            }
        }
        let result = run(&g, ("Node", 0), "-[E]-> Node -[E]-> Node -[E]-> Node", "");
        assert_eq!(result.paths.len(), 27);
        // 1 + 3 + 9 + 27 frames
        assert_eq!(result.branches_visited, 40);
    }
}
