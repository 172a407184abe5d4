use berth_cli::{BerthCli, CliArgs};
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let result = BerthCli::from_args("berth", &args).and_then(|cli| cli.run(args));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
