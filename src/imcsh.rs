extern crate nix;

use nix::sys::utsname;
use std::borrow::Cow;
use std::io::{self, BufRead, Read, Write};
use tracing::{debug, info, warn};

use crate::common::*;
use crate::config::Config;
use crate::error::ShellError;
use crate::launcher::{self, Launch, WaitStatusExt};
use crate::parser::Command;
use crate::sh::{Shell, EXEC_USAGE, GLOBALUSAGE_USAGE, QUIT_USAGE};
use crate::table::ProcessTable;

/// Longest line accepted from input; anything past it is dropped.
pub const BUFFER_SIZE: usize = 1024;

pub fn banner() -> String {
    format!(
        "IMCSH Version {}\nUsage: {} | {} | {}\n",
        env!("CARGO_PKG_VERSION"),
        EXEC_USAGE,
        GLOBALUSAGE_USAGE,
        QUIT_USAGE
    )
}

pub struct Imcsh<R, W> {
    config: Config,
    table: ProcessTable,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Imcsh<R, W> {
    pub fn new(config: Config, input: R, output: W) -> Self {
        Imcsh {
            config,
            table: ProcessTable::new(),
            input,
            output,
        }
    }

    fn flush(&mut self) -> Result<(), ShellError> {
        self.output.flush().map_err(ShellError::Output)
    }

    /// Drops the rest of an overlong line, up to and including its newline.
    fn discard_line(&mut self) -> io::Result<usize> {
        let mut dropped = 0;
        loop {
            let (found, used) = {
                let available = self.input.fill_buf()?;
                if available.is_empty() {
                    return Ok(dropped);
                }
                match available.iter().position(|&b| b == b'\n') {
                    Some(i) => (true, i + 1),
                    None => (false, available.len()),
                }
            };
            self.input.consume(used);
            dropped += used;
            if found {
                return Ok(dropped);
            }
        }
    }

    fn display_command(&mut self, cmd: &Command) -> Result<(), ShellError> {
        let mode = if cmd.background {
            "The task will be executed in the background"
        } else {
            "The task will be executed in main thread"
        };
        let args: Vec<_> = cmd
            .arguments
            .iter()
            .map(|a| String::from_utf8_lossy(a))
            .collect();
        let text = format!(
            "Executing: {}...\n{}\nRedirecting output to: {}\nargs: ({})\n",
            String::from_utf8_lossy(cmd.name),
            mode,
            cmd.output_target
                .map(String::from_utf8_lossy)
                .unwrap_or(Cow::Borrowed("stdout")),
            args.join(", ")
        );
        self.print(&text)
    }
}

impl<R: BufRead, W: Write> Shell for Imcsh<R, W> {
    fn prompt(&mut self) -> CliResult {
        if self.config.emit_prompt {
            let user = std::env::var("USER").unwrap_or_else(|_| "unknown".to_owned());
            let host = utsname::uname();
            let text = format!("{}@{}> ", user, host.nodename());
            self.print(&text)?;
            self.flush()?;
        }
        proceed()
    }

    fn read_line(&mut self) -> Result<Option<Vec<u8>>, ShellError> {
        let mut buf = Vec::with_capacity(BUFFER_SIZE);
        let n = (&mut self.input)
            .take(BUFFER_SIZE as u64)
            .read_until(b'\n', &mut buf)
            .map_err(ShellError::Input)?;
        if n == 0 {
            return Ok(None);
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
        } else if n == BUFFER_SIZE {
            let dropped = self.discard_line().map_err(ShellError::Input)?;
            if dropped > 1 {
                warn!(dropped, max = BUFFER_SIZE, "truncating input line");
            }
        }
        Ok(Some(buf))
    }

    fn print(&mut self, text: &str) -> Result<(), ShellError> {
        self.output
            .write_all(text.as_bytes())
            .map_err(ShellError::Output)
    }

    fn globalusage(&mut self) -> CliResult {
        self.print(&banner())?;
        proceed()
    }

    fn quit(&mut self) -> CliResult {
        if self.table.is_empty() {
            info!("quit with no tracked processes");
            return exit(0);
        }

        self.print("There are still running processes. Would you like to kill them? (y/N): ")?;
        self.flush()?;
        let answer = self.read_line()?.unwrap_or_default();
        if answer != b"y" {
            info!(tracked = self.table.len(), "quit aborted");
            self.print("Aborted.\n")?;
            return proceed();
        }

        for pid in self.table.terminate_all() {
            self.print(&format!("Killing process {}\n", pid.as_raw()))?;
        }
        self.print("All processes terminated.\n")?;
        exit(0)
    }

    fn exec(&mut self, cmd: &Command) -> CliResult {
        if self.config.verbose {
            self.display_command(cmd)?;
        }
        let launch = Launch::prepare(cmd)?;

        // unflushed output would be written twice once the child exits
        self.flush()?;
        let pid = launch.spawn()?;

        if let Err(e) = self.table.register(pid) {
            warn!(pid = pid.as_raw(), "process table full, child left untracked");
            return Err(e);
        }
        self.print(&format!(
            "Process {} added to running processes.\n",
            pid.as_raw()
        ))?;

        if cmd.background {
            debug!(pid = pid.as_raw(), "running in background");
            return proceed();
        }

        self.flush()?;
        let status = launcher::wait_for(pid)?;
        info!(pid = pid.as_raw(), ?status, "foreground process finished");
        self.print(&format!("{}\n", status.describe()))?;
        proceed()
    }
}
