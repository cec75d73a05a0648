use std::fmt;

use crate::session::Session;

/// Snapshot of the session's graph, printed by `STATUS`.
#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    pub source: Option<String>,
    pub state: &'static str,
    pub node_types: usize,
    pub node_count: usize,
    pub relationship_count: usize,
    pub rel_type_count: usize,
    pub memory_bytes: usize,
    pub synced_generation: u64,
    pub current_generation: u64,
}

impl Status {
    pub fn of(session: &Session) -> Self {
        let graph = session.graph();
        let current_generation = graph.generation();
        let synced_generation = session.synced_generation();

        // "modified" = changed since the last IMPORT or EXPORT.
        let state = if graph.node_count() == 0 && graph.relationship_count() == 0 {
            "empty"
        } else if current_generation != synced_generation {
            "modified"
        } else {
            "synced"
        };

        Self {
            source: session.source().map(|p| p.display().to_string()),
            state,
            node_types: graph.node_types().count(),
            node_count: graph.node_count(),
            relationship_count: graph.relationship_count(),
            rel_type_count: graph.rel_type_count(),
            memory_bytes: graph.memory_usage(),
            synced_generation,
            current_generation,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "source:             {}", self.source.as_deref().unwrap_or("-"))?;
        writeln!(f, "status:             {}", self.state)?;
        writeln!(f, "node_types:         {}", self.node_types)?;
        writeln!(f, "node_count:         {}", self.node_count)?;
        writeln!(f, "relationship_count: {}", self.relationship_count)?;
        writeln!(f, "rel_type_count:     {}", self.rel_type_count)?;
        writeln!(f, "memory_bytes:       {}", self.memory_bytes)?;
        writeln!(f, "synced_generation:  {}", self.synced_generation)?;
        write!(f, "current_generation: {}", self.current_generation)
    }
}
