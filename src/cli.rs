// File: cli.rs
//
// The purpose of this file is the command-line surface shared by the
// four binaries (§6): a common option set every role parses, plus the
// role-specific counts each binary adds on top.

use structopt::StructOpt;

#[derive(Debug, StructOpt)]
pub struct CommonOpts {
    /// This process's own ring/registrant id.
    #[structopt(short = "n", long)]
    pub name: String,

    #[structopt(short = "a", long, default_value = "127.0.0.1")]
    pub addr: String,

    #[structopt(short = "p", long)]
    pub port: u16,

    /// The seed discovery node this process talks to, as "host:port".
    #[structopt(short = "D", long)]
    pub discovery: String,

    #[structopt(short = "c", long, default_value = "config.ini")]
    pub config: String,

    #[structopt(short = "j", long = "json_file", default_value = "dht.json")]
    pub json_file: String,

    /// One of 10 (DEBUG), 20 (INFO), 30 (WARN), 40 (ERROR), 50 (ERROR).
    #[structopt(short = "l", long, default_value = "20")]
    pub loglevel: u8,
}

impl CommonOpts {
    pub fn tracing_level(&self) -> tracing::Level {
        match self.loglevel {
            10 => tracing::Level::DEBUG,
            20 => tracing::Level::INFO,
            30 => tracing::Level::WARN,
            40 | 50 => tracing::Level::ERROR,
            _ => tracing::Level::INFO,
        }
    }

    pub fn discovery_endpoint(&self) -> String {
        format!("tcp://{}", self.discovery)
    }
}

#[derive(Debug, StructOpt)]
#[structopt(name = "discovery")]
pub struct DiscoveryOpts {
    #[structopt(flatten)]
    pub common: CommonOpts,

    #[structopt(short = "P", long = "num_pubs", default_value = "1")]
    pub num_pubs: usize,

    #[structopt(short = "S", long = "num_subs", default_value = "1")]
    pub num_subs: usize,

    /// Hash-space width in bits, M in the spec's notation.
    #[structopt(short = "b", long, default_value = "48")]
    pub bits: u32,
}

#[derive(Debug, StructOpt)]
#[structopt(name = "publisher")]
pub struct PublisherOpts {
    #[structopt(flatten)]
    pub common: CommonOpts,

    #[structopt(short = "T", long = "num_topics", default_value = "1")]
    pub num_topics: usize,

    #[structopt(short = "f", long, default_value = "1")]
    pub frequency: u64,

    #[structopt(short = "i", long, default_value = "10")]
    pub iters: u64,
}

#[derive(Debug, StructOpt)]
#[structopt(name = "subscriber")]
pub struct SubscriberOpts {
    #[structopt(flatten)]
    pub common: CommonOpts,

    #[structopt(short = "T", long = "num_topics", default_value = "1")]
    pub num_topics: usize,

    #[structopt(short = "i", long, default_value = "10")]
    pub iters: u64,
}

#[derive(Debug, StructOpt)]
#[structopt(name = "broker")]
pub struct BrokerOpts {
    #[structopt(flatten)]
    pub common: CommonOpts,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loglevel_10_maps_to_debug() {
        let opts = CommonOpts {
            name: "x".into(),
            addr: "127.0.0.1".into(),
            port: 5555,
            discovery: "127.0.0.1:5555".into(),
            config: "c.ini".into(),
            json_file: "d.json".into(),
            loglevel: 10,
        };
        assert_eq!(opts.tracing_level(), tracing::Level::DEBUG);
    }

    #[test]
    fn unrecognized_loglevel_falls_back_to_info() {
        let opts = CommonOpts {
            name: "x".into(),
            addr: "127.0.0.1".into(),
            port: 5555,
            discovery: "127.0.0.1:5555".into(),
            config: "c.ini".into(),
            json_file: "d.json".into(),
            loglevel: 99,
        };
        assert_eq!(opts.tracing_level(), tracing::Level::INFO);
    }

    #[test]
    fn discovery_endpoint_is_tcp() {
        let opts = CommonOpts {
            name: "x".into(),
            addr: "127.0.0.1".into(),
            port: 5555,
            discovery: "127.0.0.1:5555".into(),
            config: "c.ini".into(),
            json_file: "d.json".into(),
            loglevel: 20,
        };
        assert_eq!(opts.discovery_endpoint(), "tcp://127.0.0.1:5555");
    }
}
