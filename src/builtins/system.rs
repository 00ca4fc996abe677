use crate::engine::{ExecutionResult, ShellState};
use crate::builtins::registry::CommandInfo;

pub const COMMAND_INFO_EXIT: CommandInfo = CommandInfo {
    name: "exit",
    description: "Exit the shell.",
    usage: "exit\n\nTerminate the shell with status 0. Commands after it on the same line do not run.",
    run: exit_runner,
};

/// The read loop sees [`ExecutionResult::Exit`] and ends the process.
pub fn exit_runner(_args: &[String], _state: &mut ShellState) -> (ExecutionResult, i32) {
    (ExecutionResult::Exit, 0)
}
