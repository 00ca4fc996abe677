mod execution;
pub mod job_control;
pub mod pipe;
mod redirect;
mod state;

// Re-export the public API so that `main.rs`, the parser and `builtins/`
// can use `engine::ShellState`, `engine::ExecutionResult`, etc.
pub use execution::execute;
pub use job_control::Reaper;
pub use state::{ExecutionResult, ShellState};
