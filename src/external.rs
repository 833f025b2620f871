use crate::env::Environment;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Resolve a program name to the executable file the shell would launch.
///
/// - Absolute path: taken as-is if the file exists.
/// - More than one component (`bin/tool`, `./tool`): resolved against the
///   shell's tracked working directory.
/// - Single component: the first match walking the directories of `PATH`.
///
/// Returns `None` when nothing matches, including for an empty name.
pub(crate) fn resolve(env: &Environment, name: &str) -> Option<PathBuf> {
    let path = Path::new(name);
    if path.is_absolute() {
        return existing_file(path.to_path_buf());
    }
    if path.components().nth(1).is_some() {
        return existing_file(env.current_dir.join(path));
    }

    let search = env.get_var("PATH")?;
    std::env::split_paths(&search).find_map(|dir| {
        let found = existing_file(dir.join(path))?;
        tracing::debug!(program = name, resolved = %found.display(), "resolved external command");
        Some(found)
    })
}

fn existing_file(path: PathBuf) -> Option<PathBuf> {
    path.is_file().then_some(path)
}

/// Build the `Command` for one tokenized external invocation, or `None`
/// when the program cannot be located.
///
/// The child runs in the shell's tracked working directory with the shell's
/// variable snapshot; stdio wiring is left to the caller.
pub(crate) fn command(env: &Environment, words: &[String]) -> Option<Command> {
    let (name, args) = words.split_first()?;
    let program = resolve(env, name)?;
    let mut cmd = Command::new(program);
    cmd.args(args)
        .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .current_dir(&env.current_dir);
    Some(cmd)
}
