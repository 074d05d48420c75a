mod cli;
mod common;
mod config;
mod error;
mod imcsh;
mod launcher;
mod logging;
mod parser;
mod sh;
mod table;

use std::io::{self, Write};
use std::process;
use tracing::error;

use cli::*;
use config::Config;
use imcsh::Imcsh;

fn main() {
    let config = Config::from_env();
    logging::init_file_logging(&config.log_path);

    let stdout = io::stdout();
    {
        let mut out = stdout.lock();
        let _ = out.write_all(imcsh::banner().as_bytes());
        let _ = out.flush();
    }

    let sh = Imcsh::new(config, io::stdin().lock(), stdout);
    let mut client = Cli::new(Box::new(sh));
    let code = match client.go() {
        Ok(code) => code,
        Err(e) => {
            error!("{}: {}", e.category(), e);
            eprintln!("{}", e);
            1
        }
    };
    process::exit(code);
}
