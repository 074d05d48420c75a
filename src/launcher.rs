extern crate libc;
extern crate nix;

use nix::errno::Errno;
use nix::fcntl::{self, OFlag};
use nix::sys::stat::Mode;
use nix::sys::wait::{self, WaitStatus};
use nix::unistd::{self, ForkResult, Pid};
use std::borrow::Cow;
use std::ffi::{CStr, CString};
use std::io::{self, Write};
use std::process;
use tracing::{debug, info};

use crate::error::ShellError;
use crate::parser::Command;
use crate::sh::EXEC_USAGE;

/// Everything the child needs, converted to C strings before the fork.
#[derive(Debug)]
pub struct Launch {
    argv: Vec<CString>,
    output_target: Option<CString>,
}

impl Launch {
    pub fn prepare(cmd: &Command) -> Result<Launch, ShellError> {
        let argv = cmd
            .argv()
            .iter()
            .map(|arg| to_cstring(arg))
            .collect::<Result<Vec<_>, _>>()?;
        if argv.is_empty() {
            return Err(ShellError::usage("exec", EXEC_USAGE));
        }
        let output_target = match cmd.output_target {
            Some(path) => Some(to_cstring(path)?),
            None => None,
        };
        Ok(Launch {
            argv,
            output_target,
        })
    }

    pub fn program(&self) -> Cow<'_, str> {
        match self.argv.first() {
            Some(p) => p.to_string_lossy(),
            None => Cow::Borrowed(""),
        }
    }

    /// Forks. The parent gets the child's pid back; the child never returns.
    pub fn spawn(&self) -> Result<Pid, ShellError> {
        // the shell runs on a single thread, so the child only inherits this one
        match unsafe { unistd::fork() } {
            Ok(ForkResult::Parent { child, .. }) => {
                info!(pid = child.as_raw(), program = %self.program(), "spawned child");
                Ok(child)
            }
            Ok(ForkResult::Child) => self.run_child(),
            Err(e) => Err(ShellError::Fork(e)),
        }
    }

    fn run_child(&self) -> ! {
        if let Some(target) = &self.output_target {
            if let Err(e) = redirect_stdout(target) {
                { write!(io::stderr(), "Error opening file {:?}: {}\n", target, e) }.unwrap_or(());
                process::exit(1);
            }
        }

        let argv: Vec<&CStr> = self.argv.iter().map(|x| x.as_c_str()).collect();
        let e = match unistd::execvp(argv[0], &argv) {
            Ok(never) => match never {},
            Err(e) => e,
        };
        if e.as_errno() == Some(Errno::ENOENT) {
            { write!(io::stderr(), "{}: command not found\n", self.program()) }.unwrap_or(());
        } else {
            { write!(io::stderr(), "Error executing command: {}\n", e) }.unwrap_or(());
        }
        process::exit(1);
    }
}

fn to_cstring(arg: &[u8]) -> Result<CString, ShellError> {
    CString::new(arg)
        .map_err(|_| ShellError::InvalidArgument(String::from_utf8_lossy(arg).into_owned()))
}

fn redirect_stdout(target: &CStr) -> nix::Result<()> {
    let fd = fcntl::open(
        target,
        OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_APPEND,
        Mode::from_bits_truncate(0o644),
    )?;
    unistd::dup2(fd, libc::STDOUT_FILENO)?;
    unistd::close(fd)?;
    Ok(())
}

/// Blocks until `pid` terminates.
pub fn wait_for(pid: Pid) -> Result<WaitStatus, ShellError> {
    loop {
        match wait::waitpid(pid, None) {
            Ok(status) => {
                debug!(pid = pid.as_raw(), ?status, "child changed state");
                match status {
                    WaitStatus::Exited(..) | WaitStatus::Signaled(..) => return Ok(status),
                    _ => continue,
                }
            }
            Err(e) if e.as_errno() == Some(Errno::EINTR) => continue,
            Err(source) => return Err(ShellError::Wait { pid, source }),
        }
    }
}

pub trait WaitStatusExt {
    fn describe(&self) -> String;
}

impl WaitStatusExt for WaitStatus {
    fn describe(&self) -> String {
        match *self {
            WaitStatus::Exited(pid, code) => {
                format!("Process {} exited with status {}.", pid.as_raw(), code)
            }
            WaitStatus::Signaled(pid, sig, _) => {
                format!("Process {} terminated by signal {:?}.", pid.as_raw(), sig)
            }
            WaitStatus::Stopped(pid, sig) => {
                format!("Process {} stopped by signal {:?}.", pid.as_raw(), sig)
            }
            WaitStatus::Continued(pid) => format!("Process {} continued.", pid.as_raw()),
            _ => "Process state unknown.".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;
    use nix::sys::signal::Signal;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_prepare_keeps_argv_order() {
        let cmd = parser::parse(b"exec grep -n foo > hits.txt &");
        let launch = Launch::prepare(&cmd).unwrap();
        let argv: Vec<_> = launch.argv.iter().map(|a| a.to_str().unwrap()).collect();
        assert_eq!(argv, vec!["grep", "-n", "foo"]);
        assert_eq!(launch.program(), "grep");
        assert_eq!(
            launch.output_target.as_deref().map(|t| t.to_str().unwrap()),
            Some("hits.txt")
        );
    }

    #[test]
    fn test_prepare_rejects_nul_bytes() {
        let line = b"exec echo a\0b";
        let cmd = parser::parse(line);
        match Launch::prepare(&cmd) {
            Err(ShellError::InvalidArgument(arg)) => assert_eq!(arg, "a\0b"),
            other => panic!("expected InvalidArgument, got {:?}", other),
        }
    }

    #[test]
    fn test_prepare_keeps_raw_bytes() {
        let cmd = parser::parse(b"exec touch a\xffb > caf\xe9");
        let launch = Launch::prepare(&cmd).unwrap();
        assert_eq!(launch.argv[1].as_bytes(), b"a\xffb");
        assert_eq!(
            launch.output_target.as_deref().map(CStr::to_bytes),
            Some(&b"caf\xe9"[..])
        );
    }

    #[test]
    fn test_describe_exit_and_signal() {
        let pid = Pid::from_raw(77);
        assert_eq!(
            WaitStatus::Exited(pid, 3).describe(),
            "Process 77 exited with status 3."
        );
        assert_eq!(
            WaitStatus::Signaled(pid, Signal::SIGKILL, false).describe(),
            "Process 77 terminated by signal SIGKILL."
        );
    }
}
