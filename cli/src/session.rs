use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use graphwalk_core::Graph;
use tracing::debug;

use crate::command::{Command, HELP};
use crate::settings::{Settings, SETTINGS};
use crate::status::Status;
use crate::{load, traverse};

/// One graph plus the settings that govern queries against it.
pub struct Session {
    graph: Graph,
    settings: Settings,
    /// File last imported from or exported to.
    source: Option<PathBuf>,
    /// Graph generation at the last import or export.
    synced_generation: u64,
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        Self {
            graph: Graph::new(),
            settings,
            source: None,
            synced_generation: 0,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn synced_generation(&self) -> u64 {
        self.synced_generation
    }

    /// Replace the graph with the document at `path`.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        self.graph = load::import(path)?;
        self.mark_synced(path);
        Ok(())
    }

    pub fn save(&mut self, path: &Path) -> Result<()> {
        load::export(&self.graph, path)?;
        self.mark_synced(path);
        Ok(())
    }

    fn mark_synced(&mut self, path: &Path) {
        self.source = Some(path.to_path_buf());
        self.synced_generation = self.graph.generation();
    }

    /// Parse and run one command line.
    pub fn execute_line(&mut self, line: &str, out: &mut dyn Write) -> Result<()> {
        let command = Command::parse(line)?;
        self.execute(command, out)
    }

    pub fn execute(&mut self, command: Command, out: &mut dyn Write) -> Result<()> {
        match command {
            Command::CreateNode {
                node_type,
                properties,
            } => {
                let id = self.graph.create_node(&node_type, properties)?;
                debug!(node_type = %node_type, id, "node created");
            }
            Command::CreateRelationship {
                rel_type,
                from,
                to,
                properties,
            } => {
                self.graph.create_relationship(
                    &rel_type,
                    &from.node_type,
                    from.id,
                    &to.node_type,
                    to.id,
                    properties,
                )?;
            }
            Command::UpdateRelationship {
                rel_type,
                from,
                to,
                properties,
            } => {
                let found =
                    self.graph
                        .update_relationship_properties(&rel_type, from.id, to.id, properties)?;
                if !found {
                    writeln!(out, "Relationship not found.")?;
                }
            }
            Command::Traverse {
                start,
                pattern,
                filter,
            } => traverse::run(&self.graph, &self.settings, &start, &pattern, &filter, out)?,
            Command::Export(path) => self.save(&path)?,
            Command::Import(path) => self.load(&path)?,
            Command::Set { name, value } => self.settings.set(&name, &value)?,
            Command::Show(Some(name)) => match self.settings.get(&name) {
                Some(value) => writeln!(out, "{}", value)?,
                None => bail!("unrecognized setting '{}'", name),
            },
            Command::Show(None) => {
                for info in SETTINGS {
                    let value = self.settings.get(info.name).unwrap_or_default();
                    writeln!(out, "{:<10} {:<8} {}", info.name, value, info.short_desc)?;
                }
            }
            Command::Status => writeln!(out, "{}", Status::of(self))?,
            Command::Help => {
                writeln!(out, "{}", HELP)?;
                for info in SETTINGS {
                    writeln!(out, "  {}: {} ({})", info.name, info.long_desc, info.accepts())?;
                }
            }
        }
        Ok(())
    }
}
