use std::path::PathBuf;

use argh::FromArgs;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `PIPSH_LOG=debug`.
pub const LOG_ENV: &str = "PIPSH_LOG";
const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(FromArgs, Debug, PartialEq)]
/// A small shell: pipelines, `<`/`>` redirection, `&&`/`||`/`;` chaining and `&`.
pub struct Config {
    #[argh(option, short = 'c')]
    /// run a single command line and exit with its status.
    pub command: Option<String>,

    #[argh(positional)]
    /// read command lines from this file instead of standard input.
    pub script: Option<PathBuf>,
}

/// Where command lines come from.
#[derive(Debug, PartialEq)]
pub enum Source {
    Command(String),
    Script(PathBuf),
    Stdin,
}

impl Config {
    pub fn from_env() -> Self {
        argh::from_env()
    }

    pub fn source(&self) -> Source {
        match (&self.command, &self.script) {
            (Some(line), _) => Source::Command(line.clone()),
            (None, Some(path)) => Source::Script(path.clone()),
            (None, None) => Source::Stdin,
        }
    }
}

/// Install the global `tracing` subscriber. Output goes to stderr so it never
/// mixes with command output on stdout.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Config, argh::EarlyExit> {
        Config::from_args(&["pipsh"], args)
    }

    #[test]
    fn test_no_arguments_reads_stdin() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.source(), Source::Stdin);
    }

    #[test]
    fn test_command_flag() {
        let config = parse(&["-c", "echo hi | cat"]).unwrap();
        assert_eq!(config.source(), Source::Command("echo hi | cat".to_string()));
    }

    #[test]
    fn test_script_path() {
        let config = parse(&["run.psh"]).unwrap();
        assert_eq!(config.source(), Source::Script(PathBuf::from("run.psh")));
    }

    #[test]
    fn test_command_wins_over_script() {
        let config = parse(&["-c", "true", "run.psh"]).unwrap();
        assert_eq!(config.source(), Source::Command("true".to_string()));
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        assert!(parse(&["--bogus"]).is_err());
    }
}
