// File: bin/discovery.rs
//
// Entry point for a discovery ring node: loads the ring manifest and
// config, builds this node's finger table, and runs its event loop
// until the process is killed.

use chordcast::cli::DiscoveryOpts;
use chordcast::config::Config;
use chordcast::discovery::DiscoveryNode;
use chordcast::error::ConfigError;
use chordcast::finger::FingerTable;
use chordcast::hash;
use chordcast::ring::Ring;
use chordcast::router::ChordRouter;
use chordcast::shard::DiscoveryShard;
use parking_lot::RwLock;
use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use structopt::StructOpt;
use tracing::error;

fn run() -> Result<(), Box<dyn Error>> {
    let opts = DiscoveryOpts::from_args();
    chordcast::init_tracing(opts.common.tracing_level());
    hash::check_bits(opts.bits)?;

    let ring = Ring::load(&opts.common.json_file)?;
    let owner = ring
        .find(&opts.common.name)
        .ok_or_else(|| ConfigError::UnknownNode(opts.common.name.clone()))?
        .clone();
    let table = FingerTable::build(&owner, &ring, opts.bits);
    let chord = ChordRouter::new(owner, table, opts.bits);

    let config = Config::load(&opts.common.config)?;
    let shard = Arc::new(RwLock::new(DiscoveryShard::new(
        config.dissemination,
        opts.num_pubs,
        opts.num_subs,
    )));

    let ctx = zmq::Context::new();
    let mut node = DiscoveryNode::bind(&ctx, chord, shard, opts.bits)?;
    node.connect_dealers(&ctx)?;
    node.run(Duration::from_millis(200))?;
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "discovery node exiting on fatal error");
            ExitCode::FAILURE
        }
    }
}
