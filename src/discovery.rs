// File: discovery.rs
//
// The purpose of this file is the discovery node's request/response
// state machine (§4.5): apply REGISTER/LOOKUP locally when the routing
// key resolves here, forward otherwise while preserving the return
// path, and answer ISREADY from purely local state, never forwarded.

use crate::error::{ProtocolError, TransportError};
use crate::eventloop::EventLoop;
use crate::hash::hash;
use crate::router::{ChordRouter, Resolution};
use crate::shard::DiscoveryShard;
use crate::wire::{
    DiscoveryReq, DiscoveryResp, IsReadyResp, LookupAllPubsReq, LookupPubByTopicResp, RegisterResp,
    Status,
};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The discovery node's middleware: a bound ROUTER socket, the Chord
/// router deciding ownership/forwarding, and the local shard of
/// registrants. `shard` is wrapped in a lock because the event loop is
/// the only writer but other in-process helpers may read it (§5); a
/// single-threaded event loop still only ever takes the write lock.
pub struct DiscoveryNode {
    router_socket: zmq::Socket,
    chord: ChordRouter,
    shard: Arc<RwLock<DiscoveryShard>>,
    bits: u32,
}

impl DiscoveryNode {
    pub fn bind(
        ctx: &zmq::Context,
        chord: ChordRouter,
        shard: Arc<RwLock<DiscoveryShard>>,
        bits: u32,
    ) -> Result<DiscoveryNode, TransportError> {
        let router_socket = ctx.socket(zmq::ROUTER)?;
        router_socket.set_identity(chord.owner.id.as_bytes())?;
        let bind_addr = format!("tcp://*:{}", chord.owner.port);
        router_socket.bind(&bind_addr)?;
        info!(node = %chord.owner.id, addr = %bind_addr, "discovery node bound");
        Ok(DiscoveryNode {
            router_socket,
            chord,
            shard,
            bits,
        })
    }

    pub fn connect_dealers(&mut self, ctx: &zmq::Context) -> Result<(), TransportError> {
        self.chord
            .connect_dealers(ctx, &self.chord.owner.id.clone())
            .map_err(TransportError::Zmq)
    }

    /// The routing key a request hashes to, or `None` for requests that
    /// are always answered locally (ISREADY, per §4.5).
    fn routing_key(&self, req: &DiscoveryReq) -> Option<crate::hash::Key> {
        match req {
            DiscoveryReq::Register(r) => Some(hash(self.bits, r.role.route_label())),
            DiscoveryReq::LookupPubByTopic(_) | DiscoveryReq::LookupAllPubs(_) => {
                Some(hash(self.bits, "PUBLISHER"))
            }
            DiscoveryReq::IsReady(_) => None,
        }
    }

    /// Applies a request against local shard state, producing the
    /// response payload. Only called once ownership has been
    /// established (or for ISREADY, which is always local).
    fn apply_locally(&self, req: &DiscoveryReq) -> DiscoveryResp {
        let mut shard = self.shard.write();
        match req {
            DiscoveryReq::Register(r) => {
                shard.register(r);
                DiscoveryResp::Register(RegisterResp {
                    status: Status::Success,
                    reason: String::new(),
                })
            }
            DiscoveryReq::IsReady(_) => DiscoveryResp::IsReady(IsReadyResp {
                status: shard.is_ready(),
            }),
            DiscoveryReq::LookupPubByTopic(r) => {
                DiscoveryResp::LookupPubByTopic(LookupPubByTopicResp {
                    pubs: shard.lookup_pub_by_topic(&r.topiclist),
                })
            }
            DiscoveryReq::LookupAllPubs(LookupAllPubsReq) => {
                DiscoveryResp::LookupPubByTopic(LookupPubByTopicResp {
                    pubs: shard.lookup_all_pubs(),
                })
            }
        }
    }

    /// Handles one inbound multi-frame message from the ROUTER socket.
    /// `frames[0]` is the immediate sender's identity (where a response,
    /// or a further forward, should be addressed); `frames[1..]` is the
    /// accumulated return-path chain with the serialized request as the
    /// final frame (§4.5.1).
    fn on_inbound(&self, frames: Vec<Vec<u8>>) -> Result<(), TransportError> {
        if frames.len() < 2 {
            warn!("dropping inbound message with an empty frame chain");
            return Ok(());
        }
        let return_target = frames[0].clone();
        let chain = &frames[1..];
        let payload = chain.last().unwrap();
        let identities = &chain[..chain.len() - 1];

        let req = match DiscoveryReq::decode(payload) {
            Ok(req) => req,
            Err(ProtocolError::Malformed(e)) => {
                warn!(error = %e, "malformed request payload, dropping");
                return Ok(());
            }
            Err(e) => {
                warn!(error = %e, "unrecognized request, dropping");
                return Ok(());
            }
        };

        let resolution = self.routing_key(&req).map(|key| self.chord.find_successor(key));

        match resolution {
            None | Some(Resolution::Local) => {
                let resp = self.apply_locally(&req);
                let mut out = Vec::with_capacity(2 + identities.len());
                out.push(return_target);
                out.extend_from_slice(identities);
                out.push(resp.encode());
                self.router_socket.send_multipart(out, 0)?;
                Ok(())
            }
            Some(Resolution::Forward(node)) => {
                let next = node.id.clone();
                let dealer = match self.chord.dealer_for(&next) {
                    Some(socket) => socket,
                    None => {
                        warn!(successor = %next, "no dealer connected for forward target, dropping");
                        return Ok(());
                    }
                };
                let mut out = Vec::with_capacity(1 + chain.len());
                out.push(return_target);
                out.extend_from_slice(chain);
                dealer.send_multipart(out, 0)?;
                debug!(to = %next, "forwarded request one hop");
                Ok(())
            }
        }
    }

    /// Handles a message arriving on one of the outbound dealer
    /// sockets — always a response being routed back, per §4.5.1.
    fn on_outbound(&self, from: &str, frames: Vec<Vec<u8>>) -> Result<(), TransportError> {
        if frames.is_empty() {
            warn!(from, "dropping empty response frame");
            return Ok(());
        }
        if frames.len() == 1 {
            // we originated this request ourselves; nothing further to route.
            debug!(from, "response reached its originator");
            return Ok(());
        }
        let target = frames[0].clone();
        let rest = &frames[1..];
        let mut out = Vec::with_capacity(1 + rest.len());
        out.push(target);
        out.extend_from_slice(rest);
        self.router_socket.send_multipart(out, 0)?;
        Ok(())
    }

    /// Runs the node's event loop until `stop` fires. A discovery node
    /// never reaches a terminal state on its own; it runs until the
    /// process is killed, so the tick upcall does nothing but log.
    pub fn run(&mut self, timeout: std::time::Duration) -> Result<(), TransportError> {
        let dealers: Vec<(String, &zmq::Socket)> = self
            .chord
            .dealers()
            .map(|(id, socket)| (id.clone(), socket))
            .collect();
        let mut ev = EventLoop::new(&self.router_socket, dealers, timeout);

        ev.run(
            |_loop_| {},
            |_loop_, frames| {
                if let Err(e) = self.on_inbound(frames) {
                    warn!(error = %e, "error handling inbound request");
                }
            },
            |_loop_, from, frames| {
                if let Err(e) = self.on_outbound(from, frames) {
                    warn!(error = %e, "error routing response");
                }
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finger::FingerTable;
    use crate::ring::Ring;
    use crate::shard::Dissemination;
    use crate::wire::{RegisterReq, RegistrantInfo, Role};
    use std::fs;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn ring_of_one(id: &str, hash: u64, port: u16) -> Ring {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        let mut dir = std::env::temp_dir();
        dir.push(format!("chordcast-discovery-test-{}-{}", std::process::id(), n));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("dht.json");
        let body = format!(
            r#"{{"dht": [{{"id": "{}", "hash": {}, "IP": "127.0.0.1", "port": {}, "host": "h"}}]}}"#,
            id, hash, port
        );
        fs::write(&path, body).unwrap();
        Ring::load(path.to_str().unwrap()).unwrap()
    }

    #[test]
    fn seed_scenario_1_ring_of_one_register_and_lookup() {
        let ring = ring_of_one("A", 42, 17100);
        let owner = ring.find("A").unwrap().clone();
        let table = FingerTable::build(&owner, &ring, 8);
        let chord = ChordRouter::new(owner, table, 8);
        let shard = Arc::new(RwLock::new(DiscoveryShard::new(Dissemination::Direct, 1, 0)));

        let ctx = zmq::Context::new();
        let mut node = DiscoveryNode::bind(&ctx, chord, shard.clone(), 8).unwrap();
        node.connect_dealers(&ctx).unwrap();

        let register = DiscoveryReq::Register(RegisterReq {
            role: Role::Publisher,
            info: RegistrantInfo {
                id: "P1".into(),
                addr: "127.0.0.1".into(),
                port: 6000,
            },
            topiclist: vec!["T1".into()],
        });
        assert!(matches!(
            node.routing_key(&register).map(|k| node.chord.find_successor(k)),
            Some(Resolution::Local)
        ));

        let resp = node.apply_locally(&register);
        match resp {
            DiscoveryResp::Register(r) => assert_eq!(r.status, Status::Success),
            _ => panic!("wrong variant"),
        }

        let lookup = DiscoveryReq::LookupPubByTopic(crate::wire::LookupPubByTopicReq {
            topiclist: vec!["T1".into()],
        });
        match node.apply_locally(&lookup) {
            DiscoveryResp::LookupPubByTopic(r) => {
                assert_eq!(r.pubs.len(), 1);
                assert_eq!(r.pubs[0].id, "P1");
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn isready_never_forwards() {
        let ring = ring_of_one("A", 42, 17101);
        let owner = ring.find("A").unwrap().clone();
        let table = FingerTable::build(&owner, &ring, 8);
        let chord = ChordRouter::new(owner, table, 8);
        let shard = Arc::new(RwLock::new(DiscoveryShard::new(Dissemination::Direct, 5, 0)));
        let ctx = zmq::Context::new();
        let node = DiscoveryNode::bind(&ctx, chord, shard, 8).unwrap();

        let isready = DiscoveryReq::IsReady(crate::wire::IsReadyReq);
        assert!(node.routing_key(&isready).is_none());
        match node.apply_locally(&isready) {
            DiscoveryResp::IsReady(r) => assert!(!r.status),
            _ => panic!("wrong variant"),
        }
    }
}
