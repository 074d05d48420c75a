use crate::error::ShellError;

/// What the read loop should do after a command finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit(i32),
}

pub type CliResult = Result<Flow, ShellError>;

pub fn proceed() -> CliResult {
    Ok(Flow::Continue)
}

pub fn exit(code: i32) -> CliResult {
    Ok(Flow::Exit(code))
}
