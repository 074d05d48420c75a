use crate::common::*;
use crate::error::ShellError;
use crate::parser::Command;

pub const EXEC_USAGE: &str = "exec <command> [args] [> <file>] [&]";
pub const GLOBALUSAGE_USAGE: &str = "globalusage";
pub const QUIT_USAGE: &str = "quit";

/// The operations the dispatcher drives. Argument counts are already checked
/// by the time any of these is called.
pub trait Shell {
    fn prompt(&mut self) -> CliResult;
    /// Next input line as raw bytes without its newline, `None` at end of
    /// input.
    fn read_line(&mut self) -> Result<Option<Vec<u8>>, ShellError>;
    fn print(&mut self, text: &str) -> Result<(), ShellError>;
    fn globalusage(&mut self) -> CliResult;
    fn quit(&mut self) -> CliResult;
    fn exec(&mut self, cmd: &Command) -> CliResult;
}
