mod ast;
mod lexer;

// Re-export the public surface so that `crate::parser::*` works for the
// engine and `main.rs`.
pub use ast::{Command, Condition, Endpoint};

use std::mem;

use tracing::{debug, warn};

use crate::engine::pipe::{Direction, PipeRegistry};
use crate::engine::ExecutionResult;
use lexer::{tokenize, Operator, Token};

/// Where the scanner is between tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Collecting argument words for the current command.
    Words,
    /// A `<` or `>` was seen; the next word is its path.
    RedirectTarget(Direction),
}

enum Step {
    Continue,
    Stop(ExecutionResult),
}

/// Single-pass state machine over the tokens of one line.
struct LineScanner<F> {
    submit: F,
    pipes: PipeRegistry,
    current: Command,
    state: State,
}

impl<F> LineScanner<F>
where
    F: FnMut(Command, &PipeRegistry) -> ExecutionResult,
{
    fn new(pipes: PipeRegistry, submit: F) -> Self {
        LineScanner {
            submit,
            pipes,
            current: Command::new(),
            state: State::Words,
        }
    }

    fn step(&mut self, token: Token<'_>) -> Step {
        if let State::RedirectTarget(direction) = self.state {
            self.state = State::Words;
            match token {
                Token::Word(path) => {
                    self.current.redirect(direction, path);
                    return Step::Continue;
                }
                // Operator right after `<`/`>`: the redirect has no target.
                Token::Op(_) => self.current.redirect(direction, ""),
            }
        }

        match token {
            Token::Word(word) => {
                self.current.args.push(word.to_string());
                Step::Continue
            }
            Token::Op(Operator::Input) => {
                self.state = State::RedirectTarget(Direction::Read);
                Step::Continue
            }
            Token::Op(Operator::Output) => {
                self.state = State::RedirectTarget(Direction::Write);
                Step::Continue
            }
            Token::Op(Operator::Semi) => self.finish_command(Command::new()),
            Token::Op(Operator::Background) => {
                self.current.flags.background = true;
                self.finish_command(Command::new())
            }
            Token::Op(Operator::And) => self.finish_command(Command::with_condition(Condition::IfSucceeded)),
            Token::Op(Operator::Or) => self.finish_command(Command::with_condition(Condition::IfFailed)),
            Token::Op(Operator::Pipe) => {
                let next = match self.pipes.open() {
                    Ok((read, write)) => {
                        if matches!(self.current.output, Endpoint::Unavailable(_)) {
                            // `cmd > |`: the missing target still fails; the
                            // next stage reads end of input.
                            debug!("{} has no writer", write.id());
                            drop(write);
                        } else {
                            debug!("{} feeds the stage after {:?}", write.id(), self.current.name());
                            self.current.set_output(Endpoint::Pipe(write));
                        }
                        Command::with_input(Endpoint::Pipe(read))
                    }
                    Err(e) => {
                        eprintln!("pipsh: {}", e);
                        warn!("pipeline stage left unconnected: {}", e);
                        self.current.set_output(Endpoint::Unavailable(e.errno()));
                        Command::with_input(Endpoint::Unavailable(e.errno()))
                    }
                };
                // Interior stages never block the shell; only the last one is waited on.
                self.current.flags.background = true;
                self.finish_command(next)
            }
            Token::Op(Operator::Newline) => Step::Stop(self.finish_line()),
        }
    }

    /// Hand the current command to the executor and start `next`.
    fn finish_command(&mut self, next: Command) -> Step {
        let cmd = mem::replace(&mut self.current, next);
        if cmd.is_empty() {
            debug!("dropping empty command");
            return Step::Continue;
        }
        match (self.submit)(cmd, &self.pipes) {
            ExecutionResult::KeepRunning => Step::Continue,
            ExecutionResult::Exit => Step::Stop(ExecutionResult::Exit),
        }
    }

    /// End of line: a dangling redirect still gets its (missing) target.
    fn finish_line(&mut self) -> ExecutionResult {
        if let State::RedirectTarget(direction) = self.state {
            self.state = State::Words;
            self.current.redirect(direction, "");
        }
        match self.finish_command(Command::new()) {
            Step::Stop(result) => result,
            Step::Continue => ExecutionResult::KeepRunning,
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────

/// Returns `true` if the first non-blank character of `line` is `#`.
pub fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

/// Scan one line and call `submit` for every completed command, in order.
///
/// `submit` also receives the pipe registry of the line so the executor can
/// tell a forked child which inherited pipe descriptors to close. Scanning
/// stops early at a newline or once `submit` returns
/// [`ExecutionResult::Exit`], which is then returned.
pub fn parse_line<F>(line: &str, submit: F) -> ExecutionResult
where
    F: FnMut(Command, &PipeRegistry) -> ExecutionResult,
{
    parse_line_with(line, PipeRegistry::new(), submit)
}

/// [`parse_line`] with a caller-supplied pipe registry.
pub(crate) fn parse_line_with<F>(line: &str, pipes: PipeRegistry, submit: F) -> ExecutionResult
where
    F: FnMut(Command, &PipeRegistry) -> ExecutionResult,
{
    if is_comment(line) {
        return ExecutionResult::KeepRunning;
    }

    let mut scanner = LineScanner::new(pipes, submit);
    let mut result = None;
    for token in tokenize(line) {
        if let Step::Stop(stop) = scanner.step(token) {
            result = Some(stop);
            break;
        }
    }
    let result = result.unwrap_or_else(|| scanner.finish_line());
    debug!(
        "line done: {} pipe(s) created, {} end(s) left for release",
        scanner.pipes.created(),
        scanner.pipes.open_ends()
    );
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────
