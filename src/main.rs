//! `provision` binary: parse arguments, set up logging, run the provisioner.
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use provision_cli::cli::Cli;
use provision_cli::commands;
use provision_cli::error::ProvisionError;
use provision_cli::logging::{self, Logger};

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // Usage errors exit 1; --help and --version exit 0.
            let code = u8::from(err.use_stderr());
            let _ = err.print();
            return ExitCode::from(code);
        }
    };

    logging::init_subscriber(args.verbose, "provision");
    let log = Arc::new(Logger::new("provision"));

    match commands::provision::run(&args, &log) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log.error(&format!("{e:#}"));
            let code = e
                .downcast_ref::<ProvisionError>()
                .map_or(1, ProvisionError::exit_code);
            ExitCode::from(code)
        }
    }
}
