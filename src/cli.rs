use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::common::*;
use crate::error::ShellError;
use crate::parser::{self, Command};
use crate::sh::{Shell, EXEC_USAGE, GLOBALUSAGE_USAGE, QUIT_USAGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arity {
    None,
    AtLeastOne,
}

impl Arity {
    fn accepts(self, count: usize) -> bool {
        match self {
            Arity::None => count == 0,
            Arity::AtLeastOne => count >= 1,
        }
    }
}

type Builtin<'a> = Box<dyn Fn(&mut dyn Shell, &Command) -> CliResult + 'a>;

struct Entry<'a> {
    arity: Arity,
    usage: &'static str,
    run: Builtin<'a>,
}

pub struct Cli<'a> {
    sh: Box<dyn Shell + 'a>,
    builtins: HashMap<&'static str, Entry<'a>>,
}

impl<'a> Cli<'a> {
    pub fn new(sh: Box<dyn Shell + 'a>) -> Cli<'a> {
        let mut cli = Cli {
            sh,
            builtins: HashMap::new(),
        };
        // register builtins
        {
            cli.builtin("quit", Arity::None, QUIT_USAGE, |sh, _| sh.quit());
            cli.builtin("globalusage", Arity::None, GLOBALUSAGE_USAGE, |sh, _| {
                sh.globalusage()
            });
            cli.builtin("exec", Arity::AtLeastOne, EXEC_USAGE, |sh, cmd| sh.exec(cmd));
        }
        cli
    }

    fn builtin<F>(&mut self, name: &'static str, arity: Arity, usage: &'static str, run: F)
    where
        F: Fn(&mut dyn Shell, &Command) -> CliResult + 'a,
    {
        let entry = Entry {
            arity,
            usage,
            run: Box::new(run),
        };
        self.builtins.insert(name, entry);
    }

    /// Runs one parsed command. Arity is checked here so the shell never sees
    /// a built-in with the wrong number of arguments.
    pub fn dispatch(&mut self, cmd: &Command) -> CliResult {
        debug!(?cmd, "dispatching");
        let builtins = &self.builtins;
        let found = std::str::from_utf8(cmd.name)
            .ok()
            .and_then(|name| builtins.get_key_value(name));
        let (name, entry) = match found {
            Some(found) => found,
            None => {
                let name = String::from_utf8_lossy(cmd.name).into_owned();
                return Err(ShellError::NotFound(name));
            }
        };
        if !entry.arity.accepts(cmd.arguments.len()) {
            return Err(ShellError::usage(*name, entry.usage));
        }
        (entry.run)(&mut *self.sh, cmd)
    }

    /// One prompt/read/dispatch cycle. Recoverable errors are printed here;
    /// fatal ones are handed back to the caller.
    pub fn turn(&mut self) -> CliResult {
        self.sh.prompt()?;
        let line = match self.sh.read_line()? {
            Some(line) => line,
            None => {
                info!("end of input");
                return exit(0);
            }
        };
        let cmd = parser::parse(&line);
        let flow = match self.dispatch(&cmd) {
            Ok(flow) => flow,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(category = e.category(), "{}", e);
                self.sh.print(&format!("{}\n", e))?;
                if let ShellError::NotFound(name) = &e {
                    debug!(name = name.as_str(), "unknown command");
                    self.sh.globalusage()?;
                }
                Flow::Continue
            }
        };
        if flow == Flow::Continue {
            self.sh.print("\n")?;
        }
        Ok(flow)
    }

    /// Drives the shell until `quit` or end of input. Returns the exit code.
    pub fn go(&mut self) -> Result<i32, ShellError> {
        info!("session started");
        loop {
            if let Flow::Exit(code) = self.turn()? {
                info!(code, "session finished");
                return Ok(code);
            }
        }
    }
}
