//! graphwalk-core: In-memory property graph with typed pattern traversal.
//!
//! Nodes are typed and carry scalar properties; relationships are typed,
//! directed and carry properties of their own. A query compiles a chain of
//! hops (`-[WORKS_AT]-> Company <-[WORKS_AT]- Person`) into steps, walks them
//! depth-first from a start node, and keeps the paths a conjunctive filter
//! (`Person.age < 35 AND Company.founded > 2000`) accepts.
//!
//! Single-threaded and synchronous. Callers that share a `Graph` must
//! serialize writes against traversals themselves.

mod document;
mod error;
mod filter;
mod graph;
mod pattern;
mod traversal;
mod value;

pub use document::GraphDocument;
pub use error::{GraphError, Result};
pub use filter::{CompareOp, FilterClause, Predicate, Segment};
pub use graph::{Direction, Graph, GraphView, Node, NodeId, RelTypeId, Relationship, MAX_REL_TYPES};
pub use pattern::{Pattern, Step};
pub use traversal::{traverse, PathElement, PathResult, TraversalResult};
pub use value::{properties_from_json, properties_from_str, Properties, Value};
