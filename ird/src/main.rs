use std::process::ExitCode;

mod cli;
mod hidapi_impl;
mod preview;

fn main() -> ExitCode {
    cli::execute()
}
