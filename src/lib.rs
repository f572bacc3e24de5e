// File: lib.rs
//
// The purpose of this file is to wire up the discovery-plane routing
// fabric and the client-side role state machines as a library, so each
// of the four binaries under src/bin/ can share one implementation.

pub mod broker;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod eventloop;
pub mod finger;
pub mod hash;
pub mod publisher;
pub mod registrant;
pub mod ring;
pub mod router;
pub mod shard;
pub mod subscriber;
pub mod topics;
pub mod wire;

/// Initializes the process-wide tracing subscriber at the level mapped
/// from the CLI's `--loglevel`. Every binary calls this once at
/// startup before touching any socket.
pub fn init_tracing(level: tracing::Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}
