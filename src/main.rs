use anyhow::Result;
use argh::FromArgs;
use pipesh::Interpreter;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// A small interactive shell with pipelines, sequences and conditional
/// chains. Without arguments, reads commands interactively.
struct Args {
    #[argh(positional)]
    /// script file to read commands from instead of the terminal
    script: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Args = argh::from_env();
    let mut shell = Interpreter::new();
    match args.script {
        Some(path) => shell.run_script(&PathBuf::from(path)),
        None => shell.repl(),
    }
}
