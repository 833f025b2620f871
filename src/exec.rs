//! Child-process execution strategies.
//!
//! One entry point per execution mode: a plain command, a pipeline, a
//! sequence, and the two short-circuiting chains. Each takes already-split
//! segments, reports per-command failures on stderr, and returns the status
//! of the last command it ran; only a broken invariant (an empty pipeline
//! stage, a failed wait) surfaces as an `Err` for the caller to report.

use crate::env::Environment;
use crate::external;
use crate::tokenize::split_words;
use anyhow::{Context, Result, bail};
use std::process::{Child, ChildStdout, ExitStatus, Stdio};

/// Conventional process exit code; 0 is success, everything else failure.
pub type ExitCode = i32;

/// Status reported when a program cannot be located.
pub const NOT_FOUND: ExitCode = 127;
/// Status reported when a located program cannot be spawned.
pub const SPAWN_FAILED: ExitCode = 126;

/// Run a single external command with inherited stdio and wait for it,
/// discarding the status. Callers that need the status use [`run_status`].
pub fn run_command(words: &[String], env: &Environment) -> Result<()> {
    run_status(words, env).map(|_| ())
}

/// Status-aware launch of a single external command.
///
/// A program that cannot be located scores [`NOT_FOUND`]; one that cannot
/// be spawned scores [`SPAWN_FAILED`]. Both are reported on stderr and
/// leave the interpreter untouched.
pub fn run_status(words: &[String], env: &Environment) -> Result<ExitCode> {
    let Some(name) = words.first() else {
        return Ok(0);
    };
    let Some(mut cmd) = external::command(env, words) else {
        eprintln!("pipesh: command not found: {name}");
        return Ok(NOT_FOUND);
    };
    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            eprintln!("pipesh: {name}: {err}");
            return Ok(SPAWN_FAILED);
        }
    };
    let status = child
        .wait()
        .with_context(|| format!("waiting for {name}"))?;
    let code = status_code(status);
    tracing::debug!(program = %name, code, "command finished");
    Ok(code)
}

/// What a pipeline stage reads from.
///
/// The first stage inherits the interpreter's stdin; interior stages read
/// the previous stage's pipe; a stage whose predecessor never spawned reads
/// immediate end-of-input. Pipe handles move into the spawned child or are
/// dropped here, so the parent keeps no end open.
enum StageInput {
    Inherit,
    Pipe(ChildStdout),
    Closed,
}

impl StageInput {
    fn stdio(self) -> Stdio {
        match self {
            StageInput::Inherit => Stdio::inherit(),
            StageInput::Pipe(out) => Stdio::from(out),
            StageInput::Closed => Stdio::null(),
        }
    }
}

/// Run an ordered chain of commands connected by pipes, all stages
/// concurrent, and wait for every one of them. The last stage writes to the
/// interpreter's stdout; the chain's status is the last stage's status.
pub fn run_pipeline(segments: &[String], env: &Environment) -> Result<ExitCode> {
    pipeline(segments, env, false).map(|(code, _)| code)
}

/// Like [`run_pipeline`], but the last stage's stdout is collected and
/// returned instead of inherited.
pub fn run_pipeline_captured(segments: &[String], env: &Environment) -> Result<(ExitCode, Vec<u8>)> {
    pipeline(segments, env, true)
}

fn pipeline(
    segments: &[String],
    env: &Environment,
    capture_last: bool,
) -> Result<(ExitCode, Vec<u8>)> {
    let stages: Vec<Vec<String>> = segments.iter().map(|s| split_words(s)).collect();
    if stages.iter().any(|words| words.is_empty()) {
        bail!("empty command in pipeline");
    }
    let Some(last) = stages.len().checked_sub(1) else {
        return Ok((0, Vec::new()));
    };

    let mut children: Vec<Option<Child>> = Vec::with_capacity(stages.len());
    let mut statuses: Vec<ExitCode> = vec![0; stages.len()];
    let mut input = StageInput::Inherit;

    for (i, words) in stages.iter().enumerate() {
        // Taking the input up front guarantees the previous stage's read end
        // is closed even when this stage never spawns.
        let stdin = std::mem::replace(&mut input, StageInput::Closed);
        let name = &words[0];

        let Some(mut cmd) = external::command(env, words) else {
            eprintln!("pipesh: command not found: {name}");
            statuses[i] = NOT_FOUND;
            children.push(None);
            continue;
        };
        cmd.stdin(stdin.stdio());
        cmd.stdout(if i != last || capture_last {
            Stdio::piped()
        } else {
            Stdio::inherit()
        });

        match cmd.spawn() {
            Ok(mut child) => {
                if i != last {
                    input = match child.stdout.take() {
                        Some(out) => StageInput::Pipe(out),
                        None => StageInput::Closed,
                    };
                }
                children.push(Some(child));
            }
            Err(err) => {
                eprintln!("pipesh: {name}: {err}");
                statuses[i] = SPAWN_FAILED;
                children.push(None);
            }
        }
    }

    // Drain the captured output before reaping upstream stages; a full pipe
    // buffer would otherwise stall the whole chain.
    let mut captured = Vec::new();
    if capture_last {
        if let Some(child) = children[last].take() {
            let output = child
                .wait_with_output()
                .context("collecting pipeline output")?;
            statuses[last] = status_code(output.status);
            captured = output.stdout;
        }
    }
    for (i, slot) in children.iter_mut().enumerate() {
        if let Some(mut child) = slot.take() {
            let status = child.wait().context("waiting for pipeline stage")?;
            statuses[i] = status_code(status);
        }
    }
    tracing::debug!(stages = stages.len(), ?statuses, "pipeline reaped");
    Ok((statuses[last], captured))
}

/// Run each command of a chain in order, waiting for each, ignoring status.
pub fn run_sequence(segments: &[String], env: &Environment) -> Result<ExitCode> {
    let mut last = 0;
    for words in chain_commands(segments) {
        last = run_status(&words, env)?;
    }
    Ok(last)
}

/// Run a chain in order, stopping after the first command that fails.
/// The first command always runs.
pub fn run_and(segments: &[String], env: &Environment) -> Result<ExitCode> {
    let mut last = 0;
    for words in chain_commands(segments) {
        last = run_status(&words, env)?;
        if last != 0 {
            break;
        }
    }
    Ok(last)
}

/// Run a chain in order, stopping after the first command that succeeds.
pub fn run_or(segments: &[String], env: &Environment) -> Result<ExitCode> {
    let mut last = 0;
    for words in chain_commands(segments) {
        last = run_status(&words, env)?;
        if last == 0 {
            break;
        }
    }
    Ok(last)
}

/// Tokenized commands of a chain. A trailing operator leaves an empty final
/// segment; those are skipped without affecting the chain's status.
fn chain_commands(segments: &[String]) -> impl Iterator<Item = Vec<String>> + '_ {
    segments
        .iter()
        .map(|s| split_words(s))
        .filter(|words| !words.is_empty())
}

fn status_code(status: ExitStatus) -> ExitCode {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenize::split_segments;

    fn env() -> Environment {
        let mut env = Environment::new();
        // Children run from a directory no concurrently-running test deletes.
        env.current_dir = std::env::temp_dir();
        env
    }

    fn words(s: &str) -> Vec<String> {
        split_words(s)
    }

    #[test]
    #[cfg(unix)]
    fn status_of_true_and_false() {
        assert_eq!(run_status(&words("true"), &env()).unwrap(), 0);
        assert_eq!(run_status(&words("false"), &env()).unwrap(), 1);
    }

    #[test]
    #[cfg(unix)]
    fn run_command_swallows_the_status() {
        run_command(&words("true"), &env()).unwrap();
        run_command(&words("false"), &env()).unwrap();
    }

    #[test]
    #[cfg(unix)]
    fn status_passes_through_exit_code() {
        let tmp = tempfile::tempdir().unwrap();
        let script = tmp.path().join("seven.sh");
        std::fs::write(&script, "exit 7\n").unwrap();
        let line = format!("sh {}", script.display());
        assert_eq!(run_status(&words(&line), &env()).unwrap(), 7);
    }

    #[test]
    fn missing_command_scores_not_found() {
        let code = run_status(&words("definitely-not-a-real-tool"), &env()).unwrap();
        assert_eq!(code, NOT_FOUND);
    }

    #[test]
    fn empty_command_is_a_no_op() {
        assert_eq!(run_status(&[], &env()).unwrap(), 0);
    }

    #[test]
    #[cfg(unix)]
    fn signal_death_maps_above_128() {
        let tmp = tempfile::tempdir().unwrap();
        let script = tmp.path().join("die.sh");
        std::fs::write(&script, "kill -9 $$\n").unwrap();
        let line = format!("sh {}", script.display());
        assert_eq!(run_status(&words(&line), &env()).unwrap(), 128 + 9);
    }

    #[test]
    #[cfg(unix)]
    fn pipeline_feeds_stdout_to_stdin() {
        let segments = split_segments("echo hello | tr a-z A-Z", "|");
        let (code, out) = run_pipeline_captured(&segments, &env()).unwrap();
        assert_eq!(code, 0);
        assert_eq!(String::from_utf8(out).unwrap().trim_end(), "HELLO");
    }

    #[test]
    #[cfg(unix)]
    fn three_stage_pipeline_terminates_and_delivers() {
        let segments = split_segments("echo hi | cat | cat", "|");
        let (code, out) = run_pipeline_captured(&segments, &env()).unwrap();
        assert_eq!(code, 0);
        assert_eq!(out, b"hi\n");
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn pipeline_leaves_no_descriptors_behind() {
        fn open_fds() -> usize {
            std::fs::read_dir("/proc/self/fd").unwrap().count()
        }
        let segments = split_segments("echo leak-check | cat | cat | cat", "|");
        let before = open_fds();
        let (code, out) = run_pipeline_captured(&segments, &env()).unwrap();
        assert_eq!(code, 0);
        assert_eq!(out, b"leak-check\n");
        assert_eq!(open_fds(), before);
    }

    #[test]
    #[cfg(unix)]
    fn dead_interior_stage_feeds_eof_downstream() {
        let segments = split_segments("echo hi | definitely-not-a-real-tool | cat", "|");
        let (code, out) = run_pipeline_captured(&segments, &env()).unwrap();
        // cat reads immediate EOF and succeeds; the dead stage was reported,
        // not fatal.
        assert_eq!(code, 0);
        assert!(out.is_empty());
    }

    #[test]
    #[cfg(unix)]
    fn dead_final_stage_scores_not_found() {
        let segments = split_segments("echo hi | definitely-not-a-real-tool", "|");
        let (code, _) = run_pipeline_captured(&segments, &env()).unwrap();
        assert_eq!(code, NOT_FOUND);
    }

    #[test]
    fn empty_pipeline_stage_is_rejected() {
        let segments = split_segments("ls |", "|");
        assert!(run_pipeline(&segments, &env()).is_err());
    }

    #[test]
    #[cfg(unix)]
    fn sequence_runs_every_command_despite_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let marker = tmp.path().join("ran");
        let line = format!("false ; touch {}", marker.display());
        let code = run_sequence(&split_segments(&line, ";"), &env()).unwrap();
        assert!(marker.exists());
        assert_eq!(code, 0);
    }

    #[test]
    #[cfg(unix)]
    fn and_chain_stops_on_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let marker = tmp.path().join("ran");
        let line = format!("false && touch {}", marker.display());
        let code = run_and(&split_segments(&line, "&&"), &env()).unwrap();
        assert!(!marker.exists());
        assert_eq!(code, 1);
    }

    #[test]
    #[cfg(unix)]
    fn and_chain_continues_on_success() {
        let tmp = tempfile::tempdir().unwrap();
        let marker = tmp.path().join("ran");
        let line = format!("true && touch {}", marker.display());
        assert_eq!(run_and(&split_segments(&line, "&&"), &env()).unwrap(), 0);
        assert!(marker.exists());
    }

    #[test]
    #[cfg(unix)]
    fn or_chain_stops_on_success() {
        let tmp = tempfile::tempdir().unwrap();
        let marker = tmp.path().join("ran");
        let line = format!("true || touch {}", marker.display());
        assert_eq!(run_or(&split_segments(&line, "||"), &env()).unwrap(), 0);
        assert!(!marker.exists());
    }

    #[test]
    #[cfg(unix)]
    fn or_chain_continues_on_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let marker = tmp.path().join("ran");
        let line = format!("false || touch {}", marker.display());
        assert_eq!(run_or(&split_segments(&line, "||"), &env()).unwrap(), 0);
        assert!(marker.exists());
    }

    #[test]
    #[cfg(unix)]
    fn trailing_operator_segment_is_skipped() {
        // "true &&" leaves an empty final segment behind the split; the
        // chain must not try to run it.
        let segments = split_segments("true &&", "&&");
        assert_eq!(run_and(&segments, &env()).unwrap(), 0);
    }
}
