// ── Descriptor model ───────────────────────────────────────────────────────

use std::path::PathBuf;

use nix::errno::Errno;

use crate::engine::pipe::{Direction, PipeEnd};

/// Where a command's standard input comes from or its standard output goes.
#[derive(Debug)]
pub enum Endpoint {
    /// Whatever the shell itself has (usually the terminal).
    Inherited,
    /// `< path` (read) or `> path` (write, create + truncate).
    File { path: PathBuf, direction: Direction },
    /// One end of a pipe opened while scanning the line.
    Pipe(PipeEnd),
    /// Could not be set up; resolving it in the child fails with this errno.
    Unavailable(Errno),
}

impl Endpoint {
    /// Direction this endpoint can serve, or `None` if it is unconstrained.
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Endpoint::Inherited | Endpoint::Unavailable(_) => None,
            Endpoint::File { direction, .. } => Some(*direction),
            Endpoint::Pipe(end) => Some(end.direction()),
        }
    }
}

/// Gate on the previous command's status.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Condition {
    /// `&&`: run only if the previous status was 0
    IfSucceeded,
    /// `||`: run only if the previous status was non-zero
    IfFailed,
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct Flags {
    pub background: bool,
    pub condition: Option<Condition>,
}

/// One pipeline stage, handed to the executor exactly once.
#[derive(Debug)]
pub struct Command {
    /// `args[0]` is the program or built-in name.
    pub args: Vec<String>,
    pub input: Endpoint,
    pub output: Endpoint,
    pub flags: Flags,
}

impl Command {
    pub fn new() -> Self {
        Command {
            args: Vec::new(),
            input: Endpoint::Inherited,
            output: Endpoint::Inherited,
            flags: Flags::default(),
        }
    }

    pub fn with_condition(condition: Condition) -> Self {
        let mut cmd = Command::new();
        cmd.flags.condition = Some(condition);
        cmd
    }

    pub fn with_input(input: Endpoint) -> Self {
        let mut cmd = Command::new();
        cmd.set_input(input);
        cmd
    }

    pub fn name(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn set_input(&mut self, input: Endpoint) {
        debug_assert_ne!(input.direction(), Some(Direction::Write));
        self.input = input;
    }

    pub fn set_output(&mut self, output: Endpoint) {
        debug_assert_ne!(output.direction(), Some(Direction::Read));
        self.output = output;
    }

    /// Attach a `<`/`>` target. An empty path means the operator had no word
    /// after it; that surfaces later as a failed open.
    pub fn redirect(&mut self, direction: Direction, path: &str) {
        let endpoint = if path.is_empty() {
            Endpoint::Unavailable(Errno::ENOENT)
        } else {
            Endpoint::File { path: PathBuf::from(path), direction }
        };
        match direction {
            Direction::Read => self.set_input(endpoint),
            Direction::Write => self.set_output(endpoint),
        }
    }
}

impl Default for Command {
    fn default() -> Self {
        Self::new()
    }
}
