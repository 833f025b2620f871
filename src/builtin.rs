use crate::env::Environment;
use crate::exec::ExitCode;
use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use std::env as stdenv;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Commands the interpreter executes in-process, without spawning a child.
///
/// Builtins parse their argv with [`argh`] (`FromArgs`) and mutate the
/// [`Environment`] directly; they are the only code that does.
pub(crate) trait Builtin: Sized + FromArgs {
    /// Canonical command name, e.g. "cd".
    fn name() -> &'static str;

    /// Alternative names the command also answers to.
    fn aliases() -> &'static [&'static str] {
        &[]
    }

    fn run(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode>;
}

/// Try the fixed set of builtins against the first word of a command.
///
/// Returns `None` when the word names no builtin and the caller should
/// launch an external process instead.
pub(crate) fn dispatch(
    words: &[String],
    stdout: &mut dyn Write,
    env: &mut Environment,
) -> Option<Result<ExitCode>> {
    if let Some(res) = attempt::<Cd>(words, stdout, env) {
        return Some(res);
    }
    if let Some(res) = attempt::<Pwd>(words, stdout, env) {
        return Some(res);
    }
    if let Some(res) = attempt::<Exit>(words, stdout, env) {
        return Some(res);
    }
    if let Some(res) = attempt::<Clear>(words, stdout, env) {
        return Some(res);
    }
    None
}

fn attempt<T: Builtin>(
    words: &[String],
    stdout: &mut dyn Write,
    env: &mut Environment,
) -> Option<Result<ExitCode>> {
    let name = words.first()?;
    if name != T::name() && !T::aliases().contains(&name.as_str()) {
        return None;
    }
    let args: Vec<&str> = words[1..].iter().map(String::as_str).collect();
    Some(match T::from_args(&[T::name()], &args) {
        Ok(cmd) => cmd.run(stdout, env),
        Err(exit) => usage(exit, stdout),
    })
}

/// Bad argv or `--help`: print what argh produced and keep the shell alive.
fn usage(exit: EarlyExit, stdout: &mut dyn Write) -> Result<ExitCode> {
    writeln!(stdout, "{}", exit.output.trim_end())?;
    Ok(if exit.status.is_err() { 2 } else { 0 })
}

#[derive(FromArgs)]
/// Change the current working directory.
/// With no target, changes to the directory named by HOME.
pub(crate) struct Cd {
    #[argh(positional)]
    /// directory to switch to, absolute or relative to the current one
    target: Option<String>,
}

impl Builtin for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn run(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let target = match self.target {
            Some(t) if !t.is_empty() => PathBuf::from(t),
            _ => env.home().context("cd: HOME not set")?,
        };
        let dest = if target.is_absolute() {
            target
        } else {
            env.current_dir.join(target)
        };
        let dest =
            fs::canonicalize(&dest).with_context(|| format!("cd: {}", dest.display()))?;
        stdenv::set_current_dir(&dest).with_context(|| format!("cd: {}", dest.display()))?;
        env.current_dir = dest;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Print the current working directory.
pub(crate) struct Pwd {}

impl Builtin for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn run(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        writeln!(stdout, "{}", env.current_dir.display())?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Leave the shell.
pub(crate) struct Exit {}

impl Builtin for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn run(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        env.should_exit = true;
        Ok(0)
    }
}

/// Cursor-home plus erase-display, what the original `clear(1)` emits.
const CLEAR_SCREEN: &str = "\x1b[1;1H\x1b[2J";

#[derive(FromArgs)]
/// Clear the terminal screen.
pub(crate) struct Clear {}

impl Builtin for Clear {
    fn name() -> &'static str {
        "clear"
    }

    fn aliases() -> &'static [&'static str] {
        &["cls"]
    }

    fn run(self, stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        write!(stdout, "{CLEAR_SCREEN}")?;
        stdout.flush()?;
        Ok(0)
    }
}
