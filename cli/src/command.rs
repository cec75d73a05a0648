//! Line-oriented command grammar.
//!
//! Keywords are upper case. Node references are written `Type(id=N)`.

use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;

use graphwalk_core::{properties_from_str, FilterClause, GraphError, NodeId, Pattern, Properties};
use regex::{Captures, Regex};
use thiserror::Error;

const NODE_REF: &str = r"(\w+)\(\s*id\s*=\s*(\d+)\s*\)";

static CREATE_NODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^CREATE\s+NODE\s+(\w+)\s*(\{.*\})\s*$").expect("static regex")
});

static CREATE_RELATIONSHIP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^CREATE\s+RELATIONSHIP\s+(\w+)\s+FROM\s+{NODE_REF}\s+TO\s+{NODE_REF}\s*(\{{.*\}})?\s*$"
    ))
    .expect("static regex")
});

static UPDATE_RELATIONSHIP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^UPDATE\s+RELATIONSHIP\s+(\w+)\s+FROM\s+{NODE_REF}\s+TO\s+{NODE_REF}\s*(\{{.*\}})\s*$"
    ))
    .expect("static regex")
});

static TRAVERSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^TRAVERSE\s+{NODE_REF}(.*?)(?:\s+WHERE\s+(.*))?$")).expect("static regex")
});

static FILE_ARG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:EXPORT|IMPORT)\s+(.+?)\s*$").expect("static regex"));

static SET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^SET\s+(\w+)\s*=\s*(.+?)\s*$").expect("static regex"));

static SHOW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^SHOW\s+(\w+)\s*$").expect("static regex"));

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("invalid {keyword} syntax, expected: {usage}")]
    Syntax {
        keyword: &'static str,
        usage: &'static str,
    },

    #[error("unknown command '{0}' (try HELP)")]
    Unknown(String),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// A `Type(id=N)` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRef {
    pub node_type: String,
    pub id: NodeId,
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.node_type, self.id)
    }
}

#[derive(Debug)]
pub enum Command {
    CreateNode {
        node_type: String,
        properties: Properties,
    },
    CreateRelationship {
        rel_type: String,
        from: NodeRef,
        to: NodeRef,
        properties: Properties,
    },
    UpdateRelationship {
        rel_type: String,
        from: NodeRef,
        to: NodeRef,
        properties: Properties,
    },
    Traverse {
        start: NodeRef,
        pattern: Pattern,
        filter: FilterClause,
    },
    Export(PathBuf),
    Import(PathBuf),
    Set {
        name: String,
        value: String,
    },
    /// `None` is `SHOW ALL`.
    Show(Option<String>),
    Status,
    Help,
}

struct Usage {
    keyword: &'static str,
    usage: &'static str,
}

pub const HELP: &str = "\
Commands:
  CREATE NODE Type {json}
  CREATE RELATIONSHIP REL FROM Type(id=N) TO Type(id=N) [{json}]
  UPDATE RELATIONSHIP REL FROM Type(id=N) TO Type(id=N) {json}
  TRAVERSE Type(id=N) -[REL]-> Type <-[REL]- Type [WHERE Type.prop < value AND ...]
  EXPORT path | IMPORT path
  SET name = value | SHOW name | SHOW ALL
  STATUS | HELP";

const USAGES: &[Usage] = &[
    Usage {
        keyword: "CREATE NODE",
        usage: "CREATE NODE Type {json}",
    },
    Usage {
        keyword: "CREATE RELATIONSHIP",
        usage: "CREATE RELATIONSHIP REL FROM Type(id=N) TO Type(id=N) [{json}]",
    },
    Usage {
        keyword: "UPDATE RELATIONSHIP",
        usage: "UPDATE RELATIONSHIP REL FROM Type(id=N) TO Type(id=N) {json}",
    },
    Usage {
        keyword: "TRAVERSE",
        usage: "TRAVERSE Type(id=N) pattern [WHERE clause]",
    },
    Usage {
        keyword: "EXPORT",
        usage: "EXPORT path",
    },
    Usage {
        keyword: "IMPORT",
        usage: "IMPORT path",
    },
    Usage {
        keyword: "SET",
        usage: "SET name = value",
    },
    Usage {
        keyword: "SHOW",
        usage: "SHOW name | SHOW ALL",
    },
];

fn syntax(keyword: &str) -> CommandError {
    match USAGES.iter().find(|u| u.keyword == keyword) {
        Some(u) => CommandError::Syntax {
            keyword: u.keyword,
            usage: u.usage,
        },
        None => CommandError::Syntax {
            keyword: "command",
            usage: "HELP",
        },
    }
}

fn node_ref(caps: &Captures<'_>, at: usize, keyword: &str) -> Result<NodeRef, CommandError> {
    let id = caps[at + 1].parse::<NodeId>().map_err(|_| syntax(keyword))?;
    Ok(NodeRef {
        node_type: caps[at].to_string(),
        id,
    })
}

impl Command {
    /// Parse one command line. Leading and trailing whitespace is ignored.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let mut words = line.split_whitespace();
        let first = words.next().unwrap_or_default();

        match first {
            "CREATE" | "UPDATE" => {
                let keyword = match (first, words.next()) {
                    ("CREATE", Some("NODE")) => "CREATE NODE",
                    ("CREATE", Some("RELATIONSHIP")) => "CREATE RELATIONSHIP",
                    ("UPDATE", Some("RELATIONSHIP")) => "UPDATE RELATIONSHIP",
                    _ => return Err(CommandError::Unknown(line.to_string())),
                };
                Self::parse_mutation(keyword, line)
            }
            "TRAVERSE" => {
                let caps = TRAVERSE.captures(line).ok_or_else(|| syntax("TRAVERSE"))?;
                let start = node_ref(&caps, 1, "TRAVERSE")?;
                let pattern = Pattern::parse(caps[3].trim())?;
                let filter = caps
                    .get(4)
                    .map_or_else(FilterClause::empty, |m| FilterClause::parse(m.as_str()));
                Ok(Command::Traverse {
                    start,
                    pattern,
                    filter,
                })
            }
            "EXPORT" | "IMPORT" => {
                let caps = FILE_ARG.captures(line).ok_or_else(|| syntax(first))?;
                let path = PathBuf::from(caps[1].trim_matches(|c: char| c == '\'' || c == '"'));
                Ok(if first == "EXPORT" {
                    Command::Export(path)
                } else {
                    Command::Import(path)
                })
            }
            "SET" => {
                let caps = SET.captures(line).ok_or_else(|| syntax("SET"))?;
                Ok(Command::Set {
                    name: caps[1].to_string(),
                    value: caps[2].to_string(),
                })
            }
            "SHOW" => {
                let caps = SHOW.captures(line).ok_or_else(|| syntax("SHOW"))?;
                let name = &caps[1];
                Ok(Command::Show(
                    (!name.eq_ignore_ascii_case("ALL")).then(|| name.to_string()),
                ))
            }
            "STATUS" if words.next().is_none() => Ok(Command::Status),
            "HELP" if words.next().is_none() => Ok(Command::Help),
            _ => Err(CommandError::Unknown(line.to_string())),
        }
    }

    fn parse_mutation(keyword: &'static str, line: &str) -> Result<Self, CommandError> {
        if keyword == "CREATE NODE" {
            let caps = CREATE_NODE.captures(line).ok_or_else(|| syntax(keyword))?;
            return Ok(Command::CreateNode {
                node_type: caps[1].to_string(),
                properties: properties_from_str(&caps[2])?,
            });
        }

        let re = if keyword == "CREATE RELATIONSHIP" {
            &CREATE_RELATIONSHIP
        } else {
            &UPDATE_RELATIONSHIP
        };
        let caps = re.captures(line).ok_or_else(|| syntax(keyword))?;
        let rel_type = caps[1].to_string();
        let from = node_ref(&caps, 2, keyword)?;
        let to = node_ref(&caps, 4, keyword)?;
        let properties = match caps.get(6) {
            Some(m) => properties_from_str(m.as_str())?,
            None => Properties::new(),
        };

        Ok(if keyword == "CREATE RELATIONSHIP" {
            Command::CreateRelationship {
                rel_type,
                from,
                to,
                properties,
            }
        } else {
            Command::UpdateRelationship {
                rel_type,
                from,
                to,
                properties,
            }
        })
    }
}
