use crate::engine::{ExecutionResult, ShellState};
use crate::builtins;

/// Runs in the shell process. `args[0]` is the built-in's own name.
pub type BuiltinRunner = fn(&[String], &mut ShellState) -> (ExecutionResult, i32);

pub struct CommandInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub run: BuiltinRunner,
}

pub const BUILTINS: &[CommandInfo] = &[
    builtins::cd::COMMAND_INFO,
    builtins::system::COMMAND_INFO_EXIT,
    builtins::status::COMMAND_INFO,
];

/// Exact, case-sensitive lookup; the first entry with a matching name wins.
pub fn find_command(name: &str) -> Option<&'static CommandInfo> {
    BUILTINS.iter().find(|cmd| cmd.name == name)
}
