use std::fmt;
use std::num::NonZeroUsize;

use anyhow::{bail, Context, Result};
use clap::ValueEnum;

/// How traversal results are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `Results:` header, then each path as indented JSON.
    Pretty,
    /// One JSON path per line.
    Compact,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Pretty => "pretty",
            OutputFormat::Compact => "compact",
        })
    }
}

enum Kind {
    Int { min: usize, max: usize },
    Choice(&'static [&'static str]),
}

/// A session setting: name, help text and accepted values.
pub struct SettingInfo {
    pub name: &'static str,
    pub short_desc: &'static str,
    pub long_desc: &'static str,
    kind: Kind,
}

impl SettingInfo {
    /// Accepted values, for diagnostics.
    pub fn accepts(&self) -> String {
        match self.kind {
            Kind::Int { min, max } => format!("an integer in {}..={}", min, max),
            Kind::Choice(choices) => choices.join(" | "),
        }
    }
}

pub static SETTINGS: &[SettingInfo] = &[
    SettingInfo {
        name: "max_paths",
        short_desc: "Maximum paths a TRAVERSE returns (0 = unlimited)",
        long_desc: "Traversal stops once this many paths passed the filter.",
        kind: Kind::Int { min: 0, max: 1_000_000 },
    },
    SettingInfo {
        name: "max_hops",
        short_desc: "Maximum hops in a TRAVERSE pattern",
        long_desc: "Patterns with more steps are rejected before traversal starts.",
        kind: Kind::Int { min: 1, max: 64 },
    },
    SettingInfo {
        name: "output",
        short_desc: "Result format: pretty or compact",
        long_desc: "pretty prints a Results: header and indented JSON; compact prints one JSON path per line.",
        kind: Kind::Choice(&["pretty", "compact"]),
    },
];

pub fn lookup(name: &str) -> Option<&'static SettingInfo> {
    SETTINGS.iter().find(|s| s.name.eq_ignore_ascii_case(name))
}

/// Per-session configuration. Seeded from flags/environment, changed with
/// `SET`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub max_paths: usize,
    pub max_hops: usize,
    pub output: OutputFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_paths: 0,
            max_hops: 16,
            output: OutputFormat::Pretty,
        }
    }
}

impl Settings {
    /// Check every value against its bounds.
    pub fn validated(self) -> Result<Self> {
        check_int("max_paths", self.max_paths)?;
        check_int("max_hops", self.max_hops)?;
        Ok(self)
    }

    /// Current value of a setting as text, or None for an unknown name.
    pub fn get(&self, name: &str) -> Option<String> {
        let info = lookup(name)?;
        Some(match info.name {
            "max_paths" => self.max_paths.to_string(),
            "max_hops" => self.max_hops.to_string(),
            _ => self.output.to_string(),
        })
    }

    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        let Some(info) = lookup(name) else {
            bail!("unrecognized setting '{}'", name);
        };
        let value = value.trim().trim_matches(|c: char| c == '\'' || c == '"');

        match info.name {
            "max_paths" | "max_hops" => {
                let parsed: usize = value
                    .parse()
                    .with_context(|| format!("{} expects {}", info.name, info.accepts()))?;
                check_int(info.name, parsed)?;
                if info.name == "max_paths" {
                    self.max_paths = parsed;
                } else {
                    self.max_hops = parsed;
                }
            }
            _ => {
                self.output = OutputFormat::from_str(value, true).map_err(|_| {
                    anyhow::anyhow!("{} expects {}, got '{}'", info.name, info.accepts(), value)
                })?;
            }
        }
        Ok(())
    }

    /// `max_paths` as a traversal limit; 0 means none.
    pub fn path_limit(&self) -> Option<NonZeroUsize> {
        NonZeroUsize::new(self.max_paths)
    }
}

fn check_int(name: &str, value: usize) -> Result<()> {
    let Some(info) = lookup(name) else {
        bail!("unrecognized setting '{}'", name);
    };
    if let Kind::Int { min, max } = info.kind {
        if value < min || value > max {
            bail!("{} must be {}, got {}", name, info.accepts(), value);
        }
    }
    Ok(())
}
