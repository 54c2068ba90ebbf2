use std::{io, process::ExitCode};

use clap::{Parser, error::ErrorKind};
use irhid::{capability::AcquireError, dispatch::Mode, session};

use crate::{hidapi_impl::HidapiHost, preview::PreviewSink};

/// The registry name of the receiver the program listens to.
const PERIPHERAL_NAME: &str = "AppleIRController";

/// Displays events received from the Apple Infrared Remote.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Use forward/backward button presses for Preview slide transition
    #[arg(short, long)]
    preview: bool,
}

impl Cli {
    fn mode(&self) -> Mode {
        if self.preview { Mode::Drive } else { Mode::Report }
    }
}

pub fn execute() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Help and version requests exit cleanly; anything else is a
            // usage error.
            let kind = err.kind();
            let _ = err.print();
            return match kind {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    env_logger::init();

    let result = HidapiHost::new()
        .map_err(AcquireError::os("initialize the HID subsystem"))
        .and_then(|host| {
            session::run(
                &host,
                PERIPHERAL_NAME,
                cli.mode(),
                io::stdout().lock(),
                PreviewSink::new(),
            )
        });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let status = err.exit_status();
            eprintln!("ird: {:#}", anyhow::Error::new(err));
            ExitCode::from(status)
        }
    }
}
