use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::warn;

use crate::session::Session;

/// The Person/Company scenario run by `graphwalk demo`.
pub const DEMO: &str = r#"# Two people working at the same company.
CREATE NODE Person {"id": 1, "name": "Alice", "age": 30}
CREATE NODE Person {"id": 2, "name": "Bob", "age": 28}
CREATE NODE Company {"id": 101, "name": "Acme Inc.", "founded": 2010}
CREATE RELATIONSHIP WORKS_AT FROM Person(id=1) TO Company(id=101) {"since": 2018, "role": "Engineer"}
CREATE RELATIONSHIP WORKS_AT FROM Person(id=2) TO Company(id=101) {"since": 2019, "role": "Designer"}
# Alice's coworkers younger than 35.
TRAVERSE Person(id=1) -[WORKS_AT]-> Company <-[WORKS_AT]- Person WHERE Person.age < 35
"#;

/// Run every command in `input`, reporting failures on `diag` and moving on.
/// Blank lines and `#` comments are skipped. Returns the number of failed
/// commands.
pub fn run_lines(
    session: &mut Session,
    input: impl BufRead,
    out: &mut dyn Write,
    diag: &mut dyn Write,
) -> Result<usize> {
    let mut failures = 0;
    for (lineno, line) in input.lines().enumerate() {
        let line = line.context("failed to read command input")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Err(e) = session.execute_line(line, out) {
            failures += 1;
            writeln!(diag, "graphwalk: line {}: {:#}", lineno + 1, e)?;
        }
    }
    Ok(failures)
}

pub fn run_script(session: &mut Session, path: &Path) -> Result<usize> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let failures = run_lines(
        session,
        BufReader::new(file),
        &mut io::stdout().lock(),
        &mut io::stderr().lock(),
    )?;
    if failures > 0 {
        warn!(script = %path.display(), failures, "script finished with errors");
    }
    Ok(failures)
}

/// Interactive loop. `exit`, `quit` or end of input leave it.
pub fn run(session: &mut Session) -> Result<()> {
    println!(
        "graphwalk {} - type HELP for commands, exit to quit",
        env!("CARGO_PKG_VERSION")
    );

    let mut rl = DefaultEditor::new().context("failed to start line editor")?;
    loop {
        match rl.readline("graphwalk> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                let _ = rl.add_history_entry(line);
                if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
                    break;
                }

                let mut stdout = io::stdout().lock();
                if let Err(e) = session.execute_line(line, &mut stdout) {
                    eprintln!("graphwalk: {:#}", e);
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Type exit to quit");
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("failed to read line"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    #[test]
    fn test_demo_script() {
        let mut session = Session::new(Settings::default());
        let mut out = Vec::new();
        let mut diag = Vec::new();
        let failures = run_lines(&mut session, DEMO.as_bytes(), &mut out, &mut diag).unwrap();

        assert_eq!(failures, 0);
        assert!(diag.is_empty());
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Results:\n"));
        assert_eq!(text.matches("\"path\"").count(), 1);
        assert!(text.contains("\"Person:2\""));
    }

    #[test]
    fn test_failures_do_not_stop_the_script() {
        let script = "\
CREATE NODE Person {\"id\": 1}
FROBNICATE
CREATE NODE Person {\"id\": 1}

TRAVERSE Person(id=1) -[KNOWS]-> Person
";
        let mut session = Session::new(Settings::default());
        let mut out = Vec::new();
        let mut diag = Vec::new();
        let failures = run_lines(&mut session, script.as_bytes(), &mut out, &mut diag).unwrap();

        assert_eq!(failures, 2);
        let diag = String::from_utf8(diag).unwrap();
        let lines: Vec<&str> = diag.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("graphwalk: line 2: unknown command"));
        assert!(lines[1].starts_with("graphwalk: line 3: node id 1"));
        assert_eq!(String::from_utf8(out).unwrap(), "Results:\n");
    }

    #[test]
    fn test_run_script_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.gw");
        std::fs::write(&path, DEMO).unwrap();

        let mut session = Session::new(Settings::default());
        assert_eq!(run_script(&mut session, &path).unwrap(), 0);
        assert_eq!(session.graph().relationship_count(), 2);

        assert!(run_script(&mut session, &dir.path().join("missing.gw")).is_err());
    }
}
