use crate::builtin;
use crate::classify::{LineKind, classify};
use crate::env::Environment;
use crate::exec::{self, ExitCode};
use crate::tokenize::{split_segments, split_words};
use anyhow::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const BOLD_GREEN: &str = "\x1b[1;32m";
const BOLD_BLUE: &str = "\x1b[1;34m";
const RESET: &str = "\x1b[0m";

/// The interactive interpreter: owns the [`Environment`] and drives one line
/// of input at a time through classification and execution.
///
/// Example
/// ```no_run
/// use pipesh::Interpreter;
/// let mut shell = Interpreter::new();
/// shell.interpret("echo hello | tr a-z A-Z").unwrap();
/// ```
pub struct Interpreter {
    env: Environment,
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
        }
    }

    /// True once the `exit` builtin has run.
    pub fn should_exit(&self) -> bool {
        self.env.should_exit
    }

    /// Interpret one line: classify it, split it on the governing operator,
    /// and hand it to the matching executor. Returns the status of the last
    /// command the line ran.
    pub fn interpret(&mut self, line: &str) -> Result<ExitCode> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(0);
        }
        let kind = classify(line);
        tracing::debug!(?kind, line, "dispatching line");
        match kind {
            LineKind::Or => exec::run_or(&split_segments(line, "||"), &self.env),
            LineKind::Pipe => exec::run_pipeline(&split_segments(line, "|"), &self.env),
            LineKind::Sequence => exec::run_sequence(&split_segments(line, ";"), &self.env),
            LineKind::And => exec::run_and(&split_segments(line, "&&"), &self.env),
            LineKind::Plain => self.run_plain(line),
        }
    }

    /// Plain mode: builtins run in-process, everything else is launched.
    fn run_plain(&mut self, line: &str) -> Result<ExitCode> {
        let words = split_words(line);
        if words.is_empty() {
            return Ok(0);
        }
        let mut stdout = std::io::stdout();
        if let Some(result) = builtin::dispatch(&words, &mut stdout, &mut self.env) {
            return result;
        }
        exec::run_status(&words, &self.env)
    }

    /// The interactive loop: prompt, read, record history, dispatch, repeat
    /// until `exit` or end of input. Ctrl-C cancels the current line only.
    pub fn repl(&mut self) -> Result<()> {
        let mut rl = DefaultEditor::new().context("initializing line editor")?;
        while !self.env.should_exit {
            match rl.readline(&self.prompt()) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = rl.add_history_entry(line.as_str());
                    }
                    self.dispatch_and_report(&line);
                }
                Err(ReadlineError::Interrupted) => println!("^C"),
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err).context("reading input"),
            }
        }
        Ok(())
    }

    /// Read commands from a file, one per line, through the same dispatch
    /// as the interactive loop.
    pub fn run_script(&mut self, path: &Path) -> Result<()> {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        for line in BufReader::new(file).lines() {
            let line = line.with_context(|| format!("reading {}", path.display()))?;
            self.dispatch_and_report(&line);
            if self.env.should_exit {
                break;
            }
        }
        Ok(())
    }

    /// A failed line is reported and the loop keeps going; nothing a child
    /// does takes the interpreter down.
    fn dispatch_and_report(&mut self, line: &str) {
        match self.interpret(line) {
            Ok(code) => tracing::debug!(code, "line finished"),
            Err(err) => eprintln!("pipesh: {err:#}"),
        }
    }

    fn prompt(&self) -> String {
        let cwd = match std::env::current_dir() {
            Ok(dir) => dir.display().to_string(),
            Err(_) => String::from("?"),
        };
        format!(
            "{BOLD_GREEN}{}@{}{RESET}:{BOLD_BLUE}{}{RESET}=+> ",
            self.env.user, self.env.host, cwd
        )
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
