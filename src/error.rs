//! Error types for the shell.
//!
//! Every failure a turn can hit is one variant here. Only input and output
//! failures end the session; everything else is reported and the loop goes on.

extern crate nix;

use nix::unistd::Pid;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShellError {
    /// Reading standard input failed.
    #[error("read: {0}")]
    Input(#[source] io::Error),

    /// Writing to the user's terminal failed.
    #[error("write: {0}")]
    Output(#[source] io::Error),

    /// A built-in was called with the wrong number of arguments.
    #[error("Invalid arguments for `{name}` command.\nUsage: {usage}")]
    Usage {
        name: &'static str,
        usage: &'static str,
    },

    #[error("Command not found.")]
    NotFound(String),

    /// An argument cannot be handed to `execvp`.
    #[error("Invalid argument {0:?}: contains a NUL byte.")]
    InvalidArgument(String),

    #[error("Error forking: {0}")]
    Fork(#[source] nix::Error),

    /// The child is already running but could not be tracked.
    #[error("Too many processes running, process {} is not tracked.", .0.as_raw())]
    TableFull(Pid),

    #[error("Error waiting for process {}: {source}", .pid.as_raw())]
    Wait {
        pid: Pid,
        #[source]
        source: nix::Error,
    },
}

impl ShellError {
    pub fn usage(name: &'static str, usage: &'static str) -> Self {
        Self::Usage { name, usage }
    }

    /// Fatal errors end the session with a failure status.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Input(_) | Self::Output(_))
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::Input(_) => "Input Error",
            Self::Output(_) => "Output Error",
            Self::Usage { .. } => "Usage Error",
            Self::NotFound(_) => "Unknown Command",
            Self::InvalidArgument(_) => "Argument Error",
            Self::Fork(_) => "Fork Error",
            Self::TableFull(_) => "Process Table Full",
            Self::Wait { .. } => "Wait Error",
        }
    }
}
