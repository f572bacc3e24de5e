// File: bin/broker.rs
//
// Entry point for the broker registrant, used only under Broker
// dissemination: REGISTER(BOTH), ISREADY, LOOKUP_ALL_PUBS, then an
// unbounded CONSUME-and-relay loop.

use chordcast::broker::BrokerApp;
use chordcast::cli::BrokerOpts;
use std::error::Error;
use std::process::ExitCode;
use structopt::StructOpt;
use tracing::error;

fn run() -> Result<(), Box<dyn Error>> {
    let opts = BrokerOpts::from_args();
    chordcast::init_tracing(opts.common.tracing_level());

    let ctx = zmq::Context::new();
    let mut app = BrokerApp::new(&ctx, &opts)?;
    app.run()?;
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "broker exiting on fatal error");
            ExitCode::FAILURE
        }
    }
}
