//! Persisted graph layout.
//!
//! ```json
//! {
//!   "nodes": { "Person": [ {"type": "Person", "id": 1, "name": "Alice"} ] },
//!   "relationships": [ {"type": "WORKS_AT", "from": 1, "to": 101, "since": 2018} ]
//! }
//! ```
//!
//! Node and relationship properties sit at the top level of each record.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GraphError, Result};
use crate::graph::{Graph, Node, Relationship};

/// Serializable snapshot of a whole store, in store order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub nodes: IndexMap<String, Vec<Node>>,
    pub relationships: Vec<Relationship>,
}

impl GraphDocument {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| GraphError::InvalidDocument(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| GraphError::InvalidDocument(e.to_string()))
    }
}

impl Graph {
    /// Snapshot every node bucket and relationship.
    pub fn to_document(&self) -> GraphDocument {
        let nodes = self
            .node_types()
            .map(|t| (t.to_string(), self.nodes_of_type(t).to_vec()))
            .collect();

        GraphDocument {
            nodes,
            relationships: self.relationships().to_vec(),
        }
    }

    /// Rebuild a store from a snapshot.
    ///
    /// Node ids must be unique across all buckets and each record's `type`
    /// must match its bucket. Relationships are taken as they are: one whose
    /// endpoint is missing loads fine and dead-ends during traversal.
    pub fn from_document(doc: GraphDocument) -> Result<Graph> {
        let node_count = doc.nodes.values().map(Vec::len).sum();
        let mut graph = Graph::with_capacity(node_count, doc.relationships.len());

        for (bucket, nodes) in doc.nodes {
            graph.reserve_bucket(&bucket);
            for node in nodes {
                if node.node_type != bucket {
                    return Err(GraphError::InvalidDocument(format!(
                        "node {} has type '{}' but is listed under '{}'",
                        node.id, node.node_type, bucket
                    )));
                }
                graph.add_node(node)?;
            }
        }

        let mut dangling = 0;
        for rel in doc.relationships {
            if graph.node_by_id(rel.from).is_none() || graph.node_by_id(rel.to).is_none() {
                dangling += 1;
            }
            graph.add_relationship(rel)?;
        }

        debug!(
            nodes = graph.node_count(),
            relationships = graph.relationship_count(),
            dangling,
            "graph document loaded"
        );
        Ok(graph)
    }
}
