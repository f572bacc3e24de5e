// File: bin/subscriber.rs
//
// Entry point for a subscriber registrant: REGISTER, ISREADY,
// LOOKUP_PUB -> SUBSCRIBE -> CONSUME until its configured iteration
// count is reached, recording latency samples to CSV.

use chordcast::cli::SubscriberOpts;
use chordcast::subscriber::SubscriberApp;
use std::error::Error;
use std::process::ExitCode;
use structopt::StructOpt;
use tracing::error;

fn run() -> Result<(), Box<dyn Error>> {
    let opts = SubscriberOpts::from_args();
    chordcast::init_tracing(opts.common.tracing_level());

    let ctx = zmq::Context::new();
    let mut app = SubscriberApp::new(&ctx, &opts)?;
    app.run()?;
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "subscriber exiting on fatal error");
            ExitCode::FAILURE
        }
    }
}
