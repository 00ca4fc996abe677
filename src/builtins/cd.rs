use std::env;

use crate::engine::{ExecutionResult, ShellState};
use crate::builtins::registry::CommandInfo;

pub const COMMAND_INFO: CommandInfo = CommandInfo {
    name: "cd",
    description: "Change the current directory.",
    usage: "cd <directory>",
    run: cd_runner,
};

pub fn cd_runner(args: &[String], _state: &mut ShellState) -> (ExecutionResult, i32) {
    match run(args) {
        Ok(()) => (ExecutionResult::KeepRunning, 0),
        Err(e) => {
            eprintln!("pipsh: cd: {}", e);
            (ExecutionResult::KeepRunning, 1)
        }
    }
}

/// `args` includes the name: `["cd", dir]`.
pub fn run(args: &[String]) -> Result<(), String> {
    let target = match args {
        [_, dir] => dir,
        _ => return Err(format!("usage: {}", COMMAND_INFO.usage)),
    };

    env::set_current_dir(target).map_err(|e| format!("{}: {}", target, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_cd_requires_exactly_one_operand() {
        let mut state = ShellState::new();
        let before = env::current_dir().unwrap();

        assert_eq!(cd_runner(&args(&["cd"]), &mut state).1, 1);
        assert_eq!(cd_runner(&args(&["cd", "/", "/tmp"]), &mut state).1, 1);
        assert_eq!(run(&args(&["cd"])).unwrap_err(), "usage: cd <directory>");

        assert_eq!(env::current_dir().unwrap(), before);
    }

    #[test]
    fn test_cd_missing_directory_fails() {
        let mut state = ShellState::new();
        let before = env::current_dir().unwrap();

        let (result, code) = cd_runner(&args(&["cd", "/pipsh/does/not/exist"]), &mut state);

        assert_eq!(result, ExecutionResult::KeepRunning);
        assert_ne!(code, 0);
        assert_eq!(env::current_dir().unwrap(), before);
        assert!(run(&args(&["cd", "/pipsh/does/not/exist"])).unwrap_err().starts_with("/pipsh/does/not/exist: "));
    }
}
