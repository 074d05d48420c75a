//! Start-up configuration, taken from command-line flags.

use argh::FromArgs;
use std::path::PathBuf;

use crate::logging;

#[derive(FromArgs, Debug)]
/// A minimal interactive shell with background jobs and output redirection.
pub struct Options {
    /// do not print the `user@host> ` prompt (useful when input is piped)
    #[argh(switch, short = 'q')]
    pub no_prompt: bool,

    /// print each parsed command before executing it
    #[argh(switch, short = 'v')]
    pub verbose: bool,

    /// write logs to this file instead of the default location
    #[argh(option)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub emit_prompt: bool,
    pub verbose: bool,
    pub log_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            emit_prompt: true,
            verbose: false,
            log_path: logging::default_log_path(),
        }
    }
}

impl From<Options> for Config {
    fn from(opts: Options) -> Self {
        let defaults = Config::default();
        Config {
            emit_prompt: !opts.no_prompt,
            verbose: opts.verbose,
            log_path: opts.log_file.unwrap_or(defaults.log_path),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let opts: Options = argh::from_env();
        opts.into()
    }
}
