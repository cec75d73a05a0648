use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GraphError, Result};
use crate::value::{Properties, Value};

/// Node identifier. Unique across all node types in a store.
pub type NodeId = u64;

/// Interned relationship type index (avoids storing duplicate strings per edge).
pub type RelTypeId = u16;

/// Maximum number of distinct relationship types.
pub const MAX_REL_TYPES: usize = RelTypeId::MAX as usize;

/// Keys a node record reserves for itself.
const NODE_RESERVED: [&str; 1] = ["type"];

/// Keys a relationship record reserves for itself.
const REL_RESERVED: [&str; 3] = ["type", "from", "to"];

/// Direction a step follows a stored relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Follow `from -> to`.
    Outgoing,
    /// Follow `to -> from`.
    Incoming,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Outgoing => "out",
            Direction::Incoming => "in",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "out" | "outgoing" => Ok(Direction::Outgoing),
            "in" | "incoming" => Ok(Direction::Incoming),
            other => Err(GraphError::InvalidPattern(format!(
                "unknown direction '{}' (use 'out' or 'in')",
                other
            ))),
        }
    }
}

/// A typed node. `properties` holds every supplied key, `id` included.
///
/// Serializes as the flat record `{"type": ..., <properties>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Properties", into = "Properties")]
pub struct Node {
    pub node_type: String,
    pub id: NodeId,
    pub properties: Properties,
}

impl Node {
    /// Build a node, taking its id from the `id` property.
    pub fn new(node_type: impl Into<String>, properties: Properties) -> Result<Self> {
        check_reserved(&properties, &NODE_RESERVED)?;
        let id = properties
            .get("id")
            .and_then(Value::as_int)
            .and_then(|id| NodeId::try_from(id).ok())
            .ok_or(GraphError::MissingNodeId)?;

        Ok(Self {
            node_type: node_type.into(),
            id,
            properties,
        })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// `"type:id"` label used in path results.
    pub fn label(&self) -> String {
        format!("{}:{}", self.node_type, self.id)
    }
}

impl TryFrom<Properties> for Node {
    type Error = GraphError;

    fn try_from(mut record: Properties) -> Result<Self> {
        let node_type = match record.shift_remove("type") {
            Some(Value::Str(t)) => t,
            Some(other) => {
                return Err(GraphError::InvalidDocument(format!(
                    "node 'type' must be a string, got {}",
                    other
                )))
            }
            None => {
                return Err(GraphError::InvalidDocument(
                    "node record has no 'type'".to_string(),
                ))
            }
        };
        Node::new(node_type, record)
    }
}

impl From<Node> for Properties {
    fn from(node: Node) -> Self {
        let mut record = Properties::with_capacity(node.properties.len() + 1);
        record.insert("type".to_string(), Value::Str(node.node_type));
        record.extend(node.properties);
        record
    }
}

/// A typed, directed relationship between two node ids.
///
/// Serializes as `{"type": ..., "from": ..., "to": ..., <properties>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Properties", into = "Properties")]
pub struct Relationship {
    pub rel_type: String,
    pub from: NodeId,
    pub to: NodeId,
    pub properties: Properties,
}

impl TryFrom<Properties> for Relationship {
    type Error = GraphError;

    fn try_from(mut record: Properties) -> Result<Self> {
        let rel_type = match record.shift_remove("type") {
            Some(Value::Str(t)) => t,
            _ => {
                return Err(GraphError::InvalidDocument(
                    "relationship record needs a string 'type'".to_string(),
                ))
            }
        };
        let mut endpoint = |key: &str| {
            record
                .shift_remove(key)
                .as_ref()
                .and_then(Value::as_int)
                .and_then(|id| NodeId::try_from(id).ok())
                .ok_or_else(|| {
                    GraphError::InvalidDocument(format!(
                        "{} relationship needs a non-negative integer '{}'",
                        rel_type, key
                    ))
                })
        };
        let from = endpoint("from")?;
        let to = endpoint("to")?;

        Ok(Self {
            rel_type,
            from,
            to,
            properties: record,
        })
    }
}

impl From<Relationship> for Properties {
    fn from(rel: Relationship) -> Self {
        let mut record = Properties::with_capacity(rel.properties.len() + 3);
        record.insert("type".to_string(), Value::Str(rel.rel_type));
        record.insert("from".to_string(), Value::Int(rel.from as i64));
        record.insert("to".to_string(), Value::Int(rel.to as i64));
        record.extend(rel.properties);
        record
    }
}

/// Read-only query interface the traversal engine walks.
pub trait GraphView {
    /// Node of `node_type` with `id`, if any.
    fn node(&self, node_type: &str, id: NodeId) -> Option<&Node>;

    /// Node with `id` regardless of type.
    fn node_by_id(&self, id: NodeId) -> Option<&Node>;

    /// Relationships of `rel_type` touching `node` in `direction`, each paired
    /// with the node on the far side. That node is `None` when the
    /// relationship points at an id the store does not hold.
    fn neighbors(
        &self,
        node: &Node,
        rel_type: &str,
        direction: Direction,
    ) -> Vec<(&Relationship, Option<&Node>)>;
}

/// An adjacency entry: position in the relationship list plus its type.
#[derive(Debug, Clone, Copy)]
struct Edge {
    rel: usize,
    rel_type: RelTypeId,
}

/// Where a node lives: bucket index and position within the bucket.
#[derive(Debug, Clone, Copy)]
struct NodeSlot {
    bucket: usize,
    pos: usize,
}

/// In-memory property graph.
///
/// Nodes live in per-type buckets (first-seen type order, insertion order
/// within a bucket). Relationships live in one list in insertion order;
/// `outgoing[a]` and `incoming[b]` index into it so neighbor lookups return
/// relationships in the order they were created.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    buckets: IndexMap<String, Vec<Node>>,
    node_index: HashMap<NodeId, NodeSlot>,
    relationships: Vec<Relationship>,
    outgoing: HashMap<NodeId, Vec<Edge>>,
    incoming: HashMap<NodeId, Vec<Edge>>,
    rel_types: Vec<String>,
    rel_type_map: HashMap<String, RelTypeId>,
    generation: u64,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-allocate for a known graph size.
    pub fn with_capacity(node_count: usize, relationship_count: usize) -> Self {
        Self {
            node_index: HashMap::with_capacity(node_count),
            relationships: Vec::with_capacity(relationship_count),
            outgoing: HashMap::with_capacity(node_count),
            incoming: HashMap::with_capacity(node_count),
            ..Self::default()
        }
    }

    /// Intern a relationship type string, returning its compact ID.
    ///
    /// Fails once `MAX_REL_TYPES` distinct types are interned; known types
    /// always resolve.
    pub fn intern_rel_type(&mut self, rel_type: &str) -> Result<RelTypeId> {
        if let Some(&id) = self.rel_type_map.get(rel_type) {
            return Ok(id);
        }
        if self.rel_types.len() >= MAX_REL_TYPES {
            return Err(GraphError::TooManyRelTypes {
                rel_type: rel_type.to_string(),
                max: MAX_REL_TYPES,
            });
        }
        let id = self.rel_types.len() as RelTypeId;
        self.rel_types.push(rel_type.to_string());
        self.rel_type_map.insert(rel_type.to_string(), id);
        Ok(id)
    }

    /// Resolve a RelTypeId back to its string name.
    pub fn rel_type_name(&self, id: RelTypeId) -> Option<&str> {
        self.rel_types.get(id as usize).map(|s| s.as_str())
    }

    /// Create a node of `node_type`. Its id is the `id` property.
    pub fn create_node(&mut self, node_type: &str, properties: Properties) -> Result<NodeId> {
        let node = Node::new(node_type, properties)?;
        let id = node.id;
        self.add_node(node)?;
        Ok(id)
    }

    /// Insert a built node. Fails if its id is already taken by any type.
    pub fn add_node(&mut self, node: Node) -> Result<()> {
        if let Some(existing) = self.node_by_id(node.id) {
            return Err(GraphError::DuplicateNodeId {
                id: node.id,
                existing_type: existing.node_type.clone(),
            });
        }

        let entry = self.buckets.entry(node.node_type.clone());
        let bucket = entry.index();
        let nodes = entry.or_default();
        self.node_index.insert(
            node.id,
            NodeSlot {
                bucket,
                pos: nodes.len(),
            },
        );
        nodes.push(node);
        self.generation += 1;
        Ok(())
    }

    /// Create a relationship between two existing nodes.
    ///
    /// Returns `false` without touching the store when either endpoint is
    /// missing.
    pub fn create_relationship(
        &mut self,
        rel_type: &str,
        from_type: &str,
        from_id: NodeId,
        to_type: &str,
        to_id: NodeId,
        properties: Properties,
    ) -> Result<bool> {
        check_reserved(&properties, &REL_RESERVED)?;

        if self.node(from_type, from_id).is_none() || self.node(to_type, to_id).is_none() {
            debug!(
                rel_type,
                from_type,
                from_id,
                to_type,
                to_id,
                "endpoint missing, relationship dropped"
            );
            return Ok(false);
        }

        self.add_relationship(Relationship {
            rel_type: rel_type.to_string(),
            from: from_id,
            to: to_id,
            properties,
        })?;
        Ok(true)
    }

    /// Make sure a (possibly empty) bucket exists for `node_type`.
    pub(crate) fn reserve_bucket(&mut self, node_type: &str) {
        if !self.buckets.contains_key(node_type) {
            self.buckets.insert(node_type.to_string(), Vec::new());
        }
    }

    /// Append a relationship without checking its endpoints.
    pub(crate) fn add_relationship(&mut self, rel: Relationship) -> Result<()> {
        let rel_type = self.intern_rel_type(&rel.rel_type)?;
        let index = self.relationships.len();
        let edge = Edge {
            rel: index,
            rel_type,
        };
        self.outgoing.entry(rel.from).or_default().push(edge);
        self.incoming.entry(rel.to).or_default().push(edge);
        self.relationships.push(rel);
        self.generation += 1;
        Ok(())
    }

    /// Merge `properties` into the first `rel_type` relationship from
    /// `from_id` to `to_id`. Keys not in the update are kept.
    pub fn update_relationship_properties(
        &mut self,
        rel_type: &str,
        from_id: NodeId,
        to_id: NodeId,
        properties: Properties,
    ) -> Result<bool> {
        check_reserved(&properties, &REL_RESERVED)?;

        let Some(rel) = self
            .relationships
            .iter_mut()
            .find(|r| r.rel_type == rel_type && r.from == from_id && r.to == to_id)
        else {
            return Ok(false);
        };

        rel.properties.extend(properties);
        self.generation += 1;
        Ok(true)
    }

    /// Node of `node_type` with `id`.
    pub fn node(&self, node_type: &str, id: NodeId) -> Option<&Node> {
        let slot = self.node_index.get(&id)?;
        let (bucket_type, nodes) = self.buckets.get_index(slot.bucket)?;
        if bucket_type != node_type {
            return None;
        }
        nodes.get(slot.pos)
    }

    /// Node with `id`, whatever its type.
    pub fn node_by_id(&self, id: NodeId) -> Option<&Node> {
        let slot = self.node_index.get(&id)?;
        self.buckets
            .get_index(slot.bucket)
            .and_then(|(_, nodes)| nodes.get(slot.pos))
    }

    /// Neighbor lookup in relationship insertion order.
    pub fn neighbors(
        &self,
        node: &Node,
        rel_type: &str,
        direction: Direction,
    ) -> Vec<(&Relationship, Option<&Node>)> {
        // A type never interned has no relationships at all.
        let Some(&wanted) = self.rel_type_map.get(rel_type) else {
            return Vec::new();
        };

        let adjacency = match direction {
            Direction::Outgoing => &self.outgoing,
            Direction::Incoming => &self.incoming,
        };
        let Some(edges) = adjacency.get(&node.id) else {
            return Vec::new();
        };

        edges
            .iter()
            .filter(|e| e.rel_type == wanted)
            .map(|e| {
                let rel = &self.relationships[e.rel];
                let far = match direction {
                    Direction::Outgoing => rel.to,
                    Direction::Incoming => rel.from,
                };
                (rel, self.node_by_id(far))
            })
            .collect()
    }

    /// All nodes, bucket by bucket.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.buckets.values().flatten()
    }

    /// Nodes of one type in insertion order.
    pub fn nodes_of_type(&self, node_type: &str) -> &[Node] {
        self.buckets
            .get(node_type)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Node types in first-seen order.
    pub fn node_types(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(|k| k.as_str())
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn node_count(&self) -> usize {
        self.node_index.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    pub fn rel_type_count(&self) -> usize {
        self.rel_types.len()
    }

    /// Monotonic mutation counter. Bumped by every successful write.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Approximate memory usage in bytes.
    pub fn memory_usage(&self) -> usize {
        use std::mem::size_of;

        let prop_mem = |props: &Properties| props.len() * (size_of::<String>() + size_of::<Value>() + 16);
        let nodes_mem: usize = self
            .nodes()
            .map(|n| size_of::<Node>() + n.node_type.len() + prop_mem(&n.properties))
            .sum();
        let rels_mem: usize = self
            .relationships
            .iter()
            .map(|r| size_of::<Relationship>() + r.rel_type.len() + prop_mem(&r.properties))
            .sum();
        let out_edges: usize = self.outgoing.values().map(|v| v.len() * size_of::<Edge>()).sum();
        let in_edges: usize = self.incoming.values().map(|v| v.len() * size_of::<Edge>()).sum();
        let index_mem = self.node_index.len() * (size_of::<NodeId>() + size_of::<NodeSlot>() + 16);

        nodes_mem + rels_mem + out_edges + in_edges + index_mem
    }
}

impl GraphView for Graph {
    fn node(&self, node_type: &str, id: NodeId) -> Option<&Node> {
        Graph::node(self, node_type, id)
    }

    fn node_by_id(&self, id: NodeId) -> Option<&Node> {
        Graph::node_by_id(self, id)
    }

    fn neighbors(
        &self,
        node: &Node,
        rel_type: &str,
        direction: Direction,
    ) -> Vec<(&Relationship, Option<&Node>)> {
        Graph::neighbors(self, node, rel_type, direction)
    }
}

fn check_reserved(properties: &Properties, reserved: &[&str]) -> Result<()> {
    match reserved.iter().find(|key| properties.contains_key(**key)) {
        Some(key) => Err(GraphError::ReservedProperty(key.to_string())),
        None => Ok(()),
    }
}
