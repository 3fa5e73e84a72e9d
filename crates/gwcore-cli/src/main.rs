use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = gwcore_cli::Cli::parse();
    match gwcore_cli::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error}");
            ExitCode::from(error.exit_code())
        }
    }
}
