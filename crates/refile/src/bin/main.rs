//! refile CLI

use clap::Parser;
use refile::{Cli, commands, logging};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.log_format, cli.log_level()) {
        eprintln!("{:#}", e);
        return ExitCode::FAILURE;
    }
    log::debug!("refile v{} | log format: {}", env!("CARGO_PKG_VERSION"), cli.log_format);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match commands::run(&cli, &mut out) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
