//! Binary entrypoint for the `retrofs` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    match retrofs::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
