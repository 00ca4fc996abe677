use std::io::{self, Write};

use crate::engine::{ExecutionResult, ShellState};
use crate::builtins::registry::CommandInfo;

pub const COMMAND_INFO: CommandInfo = CommandInfo {
    name: "status",
    description: "Print the status recorded for the most recent command.",
    usage: "status\n\nPrint the status recorded for the most recent command. Always succeeds.",
    run: status_runner,
};

pub fn status_runner(_args: &[String], state: &mut ShellState) -> (ExecutionResult, i32) {
    let _ = write_status(&mut io::stdout(), state);
    (ExecutionResult::KeepRunning, 0)
}

pub fn write_status(out: &mut impl Write, state: &ShellState) -> io::Result<()> {
    writeln!(out, "{}", state.last_status)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_prints_last_status() {
        let mut state = ShellState::new();
        state.last_status = 42;
        let mut out = Vec::new();
        write_status(&mut out, &state).unwrap();
        assert_eq!(out, b"42\n");
    }

    #[test]
    fn test_status_always_succeeds() {
        let mut state = ShellState::new();
        state.last_status = 9;
        assert_eq!(status_runner(&["status".to_string()], &mut state), (ExecutionResult::KeepRunning, 0));
    }
}
