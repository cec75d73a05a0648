use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{GraphError, Result};
use crate::graph::Direction;

/// One hop: `-[REL]-> Type` or `<-[REL]- Type`.
static HOP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-\[(\w+)\]->\s*(\w+)|<-\[(\w+)\]-\s*(\w+)").expect("hop regex")
});

/// One directed, typed hop of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub direction: Direction,
    pub rel_type: String,
    /// Type the node reached by this hop must have.
    pub node_type: String,
}

impl Step {
    pub fn new(direction: Direction, rel_type: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            direction,
            rel_type: rel_type.into(),
            node_type: node_type.into(),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Direction::Outgoing => write!(f, "-[{}]-> {}", self.rel_type, self.node_type),
            Direction::Incoming => write!(f, "<-[{}]- {}", self.rel_type, self.node_type),
        }
    }
}

/// A compiled chain of hops, in the order they are written.
///
/// Types are not checked against the store: a hop naming a relationship or
/// node type that does not exist simply matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pattern {
    steps: Vec<Step>,
}

impl Pattern {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Compile `-[WORKS_AT]-> Company <-[WORKS_AT]- Person`.
    ///
    /// Whitespace between hops is free. Anything else that is not a hop is
    /// an `InvalidPattern` error. The empty string is the zero-hop pattern.
    pub fn parse(text: &str) -> Result<Self> {
        let mut steps = Vec::new();
        let mut cursor = 0;

        for caps in HOP.captures_iter(text) {
            let whole = caps.get(0).map_or(0..0, |m| m.range());
            check_gap(text, cursor, whole.start)?;
            cursor = whole.end;

            let step = match (caps.get(1), caps.get(2), caps.get(3), caps.get(4)) {
                (Some(rel), Some(ty), _, _) => Step::new(Direction::Outgoing, rel.as_str(), ty.as_str()),
                (_, _, Some(rel), Some(ty)) => Step::new(Direction::Incoming, rel.as_str(), ty.as_str()),
                _ => return Err(GraphError::InvalidPattern(text.to_string())),
            };
            steps.push(step);
        }
        check_gap(text, cursor, text.len())?;

        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl FromStr for Pattern {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        Pattern::parse(s)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", step)?;
        }
        Ok(())
    }
}

fn check_gap(text: &str, from: usize, to: usize) -> Result<()> {
    let gap = text[from..to].trim();
    if gap.is_empty() {
        Ok(())
    } else {
        Err(GraphError::InvalidPattern(format!(
            "unexpected '{}' at offset {} (expected -[REL]-> Type or <-[REL]- Type)",
            gap, from
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chain() {
        let p = Pattern::parse("-[WORKS_AT]-> Company <-[WORKS_AT]- Person").unwrap();
        assert_eq!(
            p.steps(),
            &[
                Step::new(Direction::Outgoing, "WORKS_AT", "Company"),
                Step::new(Direction::Incoming, "WORKS_AT", "Person"),
            ]
        );
    }

    #[test]
    fn test_parse_whitespace_free() {
        let tight = Pattern::parse("-[KNOWS]->Person<-[MANAGES]-Person").unwrap();
        let loose = Pattern::parse("  -[KNOWS]->   Person\t<-[MANAGES]-  Person  ").unwrap();
        assert_eq!(tight, loose);
        assert_eq!(tight.len(), 2);
    }

    #[test]
    fn test_parse_empty_is_zero_hops() {
        let p = Pattern::parse("   ").unwrap();
        assert!(p.is_empty());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in [
            "-[WORKS_AT]-> Company junk",
            "WORKS_AT Company",
            "-[WORKS_AT]- Company",
            "-[]-> Company",
            "<-[WORKS_AT]-> Company",
            "-[WORKS AT]-> Company",
        ] {
            assert!(
                matches!(Pattern::parse(bad), Err(GraphError::InvalidPattern(_))),
                "expected '{}' to be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_display_round_trip() {
        let text = "-[WORKS_AT]-> Company <-[WORKS_AT]- Person";
        let p: Pattern = text.parse().unwrap();
        assert_eq!(p.to_string(), text);
    }

    #[test]
    fn test_unknown_types_still_compile() {
        let p = Pattern::parse("-[NEVER_SEEN]-> Ghost").unwrap();
        assert_eq!(p.steps()[0].node_type, "Ghost");
    }
}
