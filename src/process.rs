//! Child process helpers shared by the speech and media clients.

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Outcome of running a child process under a deadline
#[derive(Debug)]
pub enum CommandOutcome {
    /// The process exited (successfully or not)
    Finished(Output),
    /// The deadline passed first; the child is killed on drop
    TimedOut,
}

/// Run `command` to completion, capturing stdout and stderr, or give up after `timeout`
pub async fn run_with_timeout(mut command: Command, timeout: Duration) -> std::io::Result<CommandOutcome> {
    command.kill_on_drop(true);
    let child_future = command.output();

    tokio::select! {
        result = child_future => result.map(CommandOutcome::Finished),
        _ = tokio::time::sleep(timeout) => Ok(CommandOutcome::TimedOut),
    }
}

/// Render a command line for diagnostics
pub fn describe(program: &str, args: &[String]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        if arg.contains(' ') {
            line.push('"');
            line.push_str(arg);
            line.push('"');
        } else {
            line.push_str(arg);
        }
    }
    line
}
