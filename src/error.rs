// File: error.rs
//
// The purpose of this file is to define the error taxonomy for the
// discovery plane: configuration errors (fatal at startup), protocol
// errors (fatal at receive), and transport errors (propagated, not
// recovered).

use thiserror::Error;

/// Fatal errors discovered while loading the ring manifest, parsing the
/// config file, or resolving this process's own place in the ring.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read manifest {path}: {source}")]
    ManifestIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest {path}: {source}")]
    ManifestJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("two ring nodes share hash {hash}: {a} and {b}")]
    HashCollision { hash: u64, a: String, b: String },

    #[error("no ring node named '{0}' in the manifest")]
    UnknownNode(String),

    #[error("hash width must be a multiple of 8 in (0, 64], got {0}")]
    UnsupportedBits(u32),

    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config {path} is missing section [{section}]")]
    MissingSection { path: String, section: String },

    #[error("config {path} section [{section}] is missing key '{key}'")]
    MissingKey {
        path: String,
        section: String,
        key: String,
    },
}

/// Errors raised while decoding a message received off the wire.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unrecognized message type: {0}")]
    UnrecognizedType(String),

    #[error("message frame sequence was empty")]
    EmptyFrames,
}

/// Infrastructure failures that are propagated rather than recovered.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("zmq error: {0}")]
    Zmq(#[from] zmq::Error),

    #[error("peer disconnected before a complete message arrived")]
    Disconnected,
}
