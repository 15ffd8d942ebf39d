use hlsdl_core::logging;

mod cli;

use crate::cli::CliCommand;

fn main() {
    // File logging if possible; stderr otherwise.
    if let Err(err) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable: {:#}", err);
    }

    match CliCommand::run_from_args() {
        Ok(status) => std::process::exit(status.exit_code()),
        Err(err) => {
            eprintln!("hlsdl error: {:#}", err);
            std::process::exit(1);
        }
    }
}
