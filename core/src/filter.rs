use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{GraphError, Result};
use crate::graph::Node;
use crate::traversal::PathElement;
use crate::value::Value;

/// `Type.property OP literal`
static PREDICATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\w+)\.(\w+)\s*([<>=!]+)\s*(.+)$").expect("predicate regex")
});

/// Comparison operator of a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CompareOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
        }
    }

    /// Whether `left.cmp(right) == ord` satisfies `left OP right`.
    pub fn matches(self, ord: Ordering) -> bool {
        match self {
            CompareOp::Lt => ord == Ordering::Less,
            CompareOp::Le => ord != Ordering::Greater,
            CompareOp::Gt => ord == Ordering::Greater,
            CompareOp::Ge => ord != Ordering::Less,
            CompareOp::Eq => ord == Ordering::Equal,
            CompareOp::Ne => ord != Ordering::Equal,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompareOp {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s {
            "<" => Ok(CompareOp::Lt),
            "<=" => Ok(CompareOp::Le),
            ">" => Ok(CompareOp::Gt),
            ">=" => Ok(CompareOp::Ge),
            "==" => Ok(CompareOp::Eq),
            "!=" => Ok(CompareOp::Ne),
            _ => Err(()),
        }
    }
}

/// A type-scoped property comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub node_type: String,
    pub property: String,
    pub op: CompareOp,
    pub literal: Value,
}

impl Predicate {
    /// Parse one `Type.property OP literal` segment. The literal is a JSON
    /// scalar. Returns `None` for anything that does not fit.
    pub fn parse(segment: &str) -> Option<Self> {
        let caps = PREDICATE.captures(segment.trim())?;
        let op = caps[3].parse::<CompareOp>().ok()?;
        let json: serde_json::Value = serde_json::from_str(caps[4].trim()).ok()?;
        let literal = Value::from_json(&caps[2], json).ok()?;

        Some(Self {
            node_type: caps[1].to_string(),
            property: caps[2].to_string(),
            op,
            literal,
        })
    }

    /// Test `node`. Nodes of another type are not constrained.
    ///
    /// A missing property never errors: it only satisfies `!=`.
    pub fn test(&self, node: &Node) -> Result<bool> {
        if node.node_type != self.node_type {
            return Ok(true);
        }
        match node.get(&self.property) {
            Some(actual) => actual.compare(self.op, &self.literal),
            None => Ok(self.op == CompareOp::Ne),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} {} {}",
            self.node_type, self.property, self.op, self.literal
        )
    }
}

/// One `AND`-separated piece of a clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Predicate(Predicate),
    /// Text that did not parse as a predicate. Kept for inspection, never
    /// evaluated.
    Ignored(String),
}

/// A conjunction of predicates: `Person.age < 35 AND Company.name == "Acme"`.
///
/// Parsing is best-effort. Segments that do not match the predicate grammar
/// are set aside as `Segment::Ignored` instead of failing the query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterClause {
    segments: Vec<Segment>,
}

impl FilterClause {
    /// A clause with no predicates; every path passes.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Self {
        let segments = split_conjunction(text)
            .into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| match Predicate::parse(s) {
                Some(p) => Segment::Predicate(p),
                None => {
                    debug!(segment = s, "ignoring malformed filter segment");
                    Segment::Ignored(s.to_string())
                }
            })
            .collect();

        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn predicates(&self) -> impl Iterator<Item = &Predicate> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Predicate(p) => Some(p),
            Segment::Ignored(_) => None,
        })
    }

    pub fn ignored(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Ignored(text) => Some(text.as_str()),
            Segment::Predicate(_) => None,
        })
    }

    /// Evaluate against a whole path: every predicate is checked against
    /// every path node of its type, and one failure rejects the path.
    ///
    /// Incompatible comparisons propagate as `TypeMismatch`.
    pub fn evaluate(&self, path: &[PathElement<'_>]) -> Result<bool> {
        for element in path {
            for predicate in self.predicates() {
                if !predicate.test(element.node)? {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }
}

impl FromStr for FilterClause {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(FilterClause::parse(s))
    }
}

/// Split on the keyword `AND` when it stands alone between whitespace and
/// sits outside a double-quoted string.
fn split_conjunction(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
        } else if b == b'"' {
            in_string = true;
        } else if bytes[i..].starts_with(b"AND")
            && (i == 0 || bytes[i - 1].is_ascii_whitespace())
            && bytes.get(i + 3).map_or(true, |c| c.is_ascii_whitespace())
        {
            parts.push(&text[start..i]);
            i += 3;
            start = i;
            continue;
        }
        i += 1;
    }

    parts.push(&text[start..]);
    parts
}
