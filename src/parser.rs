use tracing::warn;

pub const MODIFIER_BACKGROUND: &[u8] = b"&";
pub const MODIFIER_OUTPUT: &[u8] = b">";
pub const MAX_ARGS: usize = 64;

/// One parsed input line. Tokens are raw bytes borrowed from the line, so the
/// command lives for a single turn of the read loop and arguments reach the
/// program unchanged whatever their encoding.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Command<'a> {
    pub name: &'a [u8],
    pub arguments: Vec<&'a [u8]>,
    pub background: bool,
    pub output_target: Option<&'a [u8]>,
}

impl<'a> Command<'a> {
    /// Argument vector for `execvp`: the program first, then its positional
    /// arguments, with every shell modifier already removed.
    pub fn argv(&self) -> &[&'a [u8]] {
        &self.arguments
    }
}

/// Splits `line` on single spaces. Runs of spaces produce empty tokens, which
/// are kept as zero-length arguments.
pub fn parse(line: &[u8]) -> Command<'_> {
    if line.is_empty() {
        return Command::default();
    }
    let mut tokens = line.split(|&b| b == b' ');
    let name = tokens.next().unwrap_or(&[]);
    let mut arguments: Vec<&[u8]> = tokens.collect();

    // `&` must be stripped first, `>` is then checked on what is left
    let background = arguments.last() == Some(&MODIFIER_BACKGROUND);
    if background {
        arguments.pop();
    }

    let len = arguments.len();
    let output_target = if len > 1 && arguments[len - 2] == MODIFIER_OUTPUT {
        let target = arguments[len - 1];
        arguments.truncate(len - 2);
        Some(target)
    } else {
        None
    };

    if arguments.len() > MAX_ARGS {
        warn!(
            count = arguments.len(),
            max = MAX_ARGS,
            "dropping arguments past the limit"
        );
        arguments.truncate(MAX_ARGS);
    }

    Command {
        name,
        arguments,
        background,
        output_target,
    }
}
