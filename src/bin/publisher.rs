// File: bin/publisher.rs
//
// Entry point for a publisher registrant: REGISTER, ISREADY, then
// DISSEMINATE until its configured iteration count is reached.

use chordcast::cli::PublisherOpts;
use chordcast::publisher::PublisherApp;
use std::error::Error;
use std::process::ExitCode;
use structopt::StructOpt;
use tracing::error;

fn run() -> Result<(), Box<dyn Error>> {
    let opts = PublisherOpts::from_args();
    chordcast::init_tracing(opts.common.tracing_level());

    let ctx = zmq::Context::new();
    let mut app = PublisherApp::new(&ctx, &opts)?;
    app.run()?;
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "publisher exiting on fatal error");
            ExitCode::FAILURE
        }
    }
}
