mod builtins;
mod config;
mod engine;
mod error;
mod parser;
mod signals;

use std::borrow::Cow;
use std::env;
use std::fs::File;
use std::io::{self, BufRead, BufReader, IsTerminal};

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{debug, warn};

use config::{Config, Source};
use engine::{ExecutionResult, Reaper, ShellState};
use error::ShellError;

fn get_prompt() -> String {
    let cwd = env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from("."));

    let path_str = match dirs::home_dir().and_then(|home| cwd.strip_prefix(&home).ok().map(|p| p.to_path_buf())) {
        Some(relative) if relative.as_os_str().is_empty() => "~".to_string(),
        Some(relative) => format!("~/{}", relative.display()),
        None => cwd.display().to_string(),
    };

    format!("{} % ", path_str)
}

/// Parse and run one line against the session state.
fn run_line(line: &str, state: &mut ShellState) -> ExecutionResult {
    parser::parse_line(line, |cmd, pipes| engine::execute(cmd, state, pipes))
}

fn run_interactive(state: &mut ShellState) -> error::Result<i32> {
    let mut rl = DefaultEditor::new()?;

    loop {
        state.jobs.reap();
        match rl.readline(&get_prompt()) {
            Ok(line) => {
                if run_line(&line, state) == ExecutionResult::Exit {
                    return Ok(0);
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => {
                println!("exit");
                return Ok(state.last_status);
            }
            Err(err) => return Err(err.into()),
        }
    }
}

fn run_lines(mut reader: impl BufRead, state: &mut ShellState) -> error::Result<i32> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(state.last_status);
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
        }
        let line = String::from_utf8_lossy(&buf);
        if let Cow::Owned(_) = line {
            warn!("input line is not valid UTF-8; invalid bytes replaced");
        }

        state.jobs.reap();
        if run_line(&line, state) == ExecutionResult::Exit {
            return Ok(0);
        }
    }
}

fn run(config: &Config) -> error::Result<i32> {
    let mut state = ShellState::new();
    let _reaper = Reaper::spawn(state.jobs.clone())?;

    let code = match config.source() {
        Source::Command(line) => match run_line(&line, &mut state) {
            ExecutionResult::Exit => 0,
            ExecutionResult::KeepRunning => state.last_status,
        },
        Source::Script(path) => {
            let file = File::open(&path).map_err(|source| ShellError::Script { path, source })?;
            run_lines(BufReader::new(file), &mut state)?
        }
        Source::Stdin if io::stdin().is_terminal() => run_interactive(&mut state)?,
        Source::Stdin => run_lines(io::stdin().lock(), &mut state)?,
    };

    if !state.jobs.is_empty() {
        debug!("leaving {} background job(s) running", state.jobs.len());
    }
    Ok(code)
}

fn main() {
    config::init_logging();
    let config = Config::from_env();
    signals::init();

    let code = match run(&config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("pipsh: {}", e);
            1
        }
    };
    std::process::exit(code);
}
