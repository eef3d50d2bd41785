use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use gcp_find::app;
use gcp_find::cli::Args;
use gcp_find::opencv::OpencvDetector;
use gcp_find::CliError;
use log::error;

#[cfg(feature = "tracing")]
use gcp_find::core::init_tracing;
#[cfg(not(feature = "tracing"))]
use gcp_find::core::init_logging;

fn main() -> ExitCode {
    let args = Args::parse();

    #[cfg(not(feature = "tracing"))]
    if let Err(err) = init_logging(args.verbose) {
        eprintln!("cannot install logger: {err}");
    }
    #[cfg(feature = "tracing")]
    init_tracing(args.verbose, args.log_json);

    if args.list {
        let mut stdout = std::io::stdout().lock();
        return match app::write_dictionary_list(&mut stdout) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("{err}");
                ExitCode::FAILURE
            }
        };
    }

    match app::run(&args, OpencvDetector::new) {
        Ok(_) => ExitCode::SUCCESS,
        Err(CliError::NoImages) => {
            eprintln!("{}", CliError::NoImages);
            let _ = Args::command().print_help();
            ExitCode::FAILURE
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
