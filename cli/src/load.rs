use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use graphwalk_core::{Graph, GraphDocument};
use tracing::info;

/// Write the whole graph to `path` as a pretty-printed JSON document.
pub fn export(graph: &Graph, path: &Path) -> Result<()> {
    let text = graph.to_document().to_json_pretty()?;
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    info!(
        path = %path.display(),
        nodes = graph.node_count(),
        relationships = graph.relationship_count(),
        "graph exported"
    );
    Ok(())
}

/// Read a JSON document from `path` and build a fresh graph from it.
pub fn import(path: &Path) -> Result<Graph> {
    let start = Instant::now();
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let doc = GraphDocument::from_json(&text)
        .with_context(|| format!("{} is not a graph document", path.display()))?;
    let graph = Graph::from_document(doc)
        .with_context(|| format!("failed to load {}", path.display()))?;

    info!(
        path = %path.display(),
        nodes = graph.node_count(),
        relationships = graph.relationship_count(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "graph imported"
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphwalk_core::properties_from_str;

    #[test]
    fn test_export_then_import() {
        let mut g = Graph::new();
        g.create_node("Person", properties_from_str(r#"{"id": 1, "name": "Alice"}"#).unwrap())
            .unwrap();
        g.create_node("City", properties_from_str(r#"{"id": 9, "name": "Oslo"}"#).unwrap())
            .unwrap();
        g.create_relationship("LIVES_IN", "Person", 1, "City", 9, Default::default())
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        export(&g, &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  \"nodes\": {"));

        let restored = import(&path).unwrap();
        assert_eq!(restored.to_document(), g.to_document());
    }

    #[test]
    fn test_import_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = import(&dir.path().join("absent.json")).unwrap_err();
        assert!(format!("{:#}", err).contains("failed to read"));
    }

    #[test]
    fn test_import_invalid_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"nodes": {"Person": [{"type": "Person"}]}, "relationships": []}"#)
            .unwrap();
        let err = import(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("is not a graph document"));
    }

    #[test]
    fn test_export_to_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = export(&Graph::new(), &dir.path().join("no/such/dir.json")).unwrap_err();
        assert!(format!("{:#}", err).contains("failed to write"));
    }
}
