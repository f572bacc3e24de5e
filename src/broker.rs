// File: broker.rs
//
// The purpose of this file is the broker role, present only under
// Broker dissemination: REGISTER(BOTH), ISREADY, then
// LOOKUP_ALL_PUBS -> CONSUME (unbounded), simultaneously subscribing to
// every publisher and republishing every sample to every subscriber
// (§4.6).

use crate::cli::BrokerOpts;
use crate::error::TransportError;
use crate::eventloop::{Event, EventLoop};
use crate::registrant::{Phase, Registrant};
use crate::wire::{DiscoveryReq, DiscoveryResp, LookupAllPubsReq, RegistrantInfo, Role, Sample};
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoleState {
    LookupAllPubs,
    Consume,
}

pub struct BrokerApp {
    registrant: Registrant,
    sub_socket: zmq::Socket,
    pub_socket: zmq::Socket,
    state: RoleState,
    relayed: u64,
}

impl BrokerApp {
    pub fn new(ctx: &zmq::Context, opts: &BrokerOpts) -> Result<BrokerApp, TransportError> {
        let info = RegistrantInfo {
            id: opts.common.name.clone(),
            addr: opts.common.addr.clone(),
            port: opts.common.port as u32,
        };
        let registrant = Registrant::new(
            ctx,
            &opts.common.discovery_endpoint(),
            Role::Both,
            info,
            Vec::new(),
        )?;

        let sub_socket = ctx.socket(zmq::SUB)?;
        sub_socket.set_subscribe(b"")?;
        let pub_socket = ctx.socket(zmq::PUB)?;
        pub_socket.bind(&format!("tcp://*:{}", opts.common.port))?;

        Ok(BrokerApp {
            registrant,
            sub_socket,
            pub_socket,
            state: RoleState::LookupAllPubs,
            relayed: 0,
        })
    }

    /// Runs forever once CONSUME begins; a broker has no iteration
    /// bound (§4.6: "CONSUME (unbounded)").
    pub fn run(&mut self) -> Result<(), TransportError> {
        self.registrant.send_register()?;
        let poll_timeout = Duration::from_millis(500);

        loop {
            match (self.registrant.phase(), self.state) {
                (Phase::RoleSpecific, RoleState::Consume) => {
                    let sub_socket = &self.sub_socket;
                    let ev = EventLoop::new(sub_socket, Vec::new(), poll_timeout);
                    if let Event::Inbound(frames) = ev.poll_once()? {
                        self.relay(frames)?;
                    }
                }
                _ => {
                    let socket = self.registrant.socket();
                    let ev = EventLoop::new(socket, Vec::new(), poll_timeout);
                    match ev.poll_once()? {
                        Event::Inbound(frames) => self.on_response(frames)?,
                        Event::Tick => self.on_tick()?,
                        Event::Outbound(_, _) => unreachable!("the broker dials no outbound sockets"),
                    }
                }
            }
        }
    }

    fn on_response(&mut self, frames: Vec<Vec<u8>>) -> Result<(), TransportError> {
        let payload = frames.last().ok_or(TransportError::Disconnected)?;
        let resp = DiscoveryResp::decode(payload).map_err(|_| TransportError::Disconnected)?;
        match self.registrant.phase() {
            Phase::Register => {
                self.registrant
                    .on_register_response(resp)
                    .map_err(|_| TransportError::Disconnected)?;
                self.registrant.send_isready()?;
            }
            Phase::IsReady => {
                let became_ready = self
                    .registrant
                    .on_isready_response(resp, Instant::now())
                    .map_err(|_| TransportError::Disconnected)?;
                if became_ready {
                    let req = DiscoveryReq::LookupAllPubs(LookupAllPubsReq);
                    self.registrant.socket().send(req.encode(), 0)?;
                }
            }
            Phase::RoleSpecific if self.state == RoleState::LookupAllPubs => {
                if let DiscoveryResp::LookupPubByTopic(r) = resp {
                    for p in &r.pubs {
                        let endpoint = format!("tcp://{}:{}", p.addr, p.port);
                        if self.sub_socket.connect(&endpoint).is_ok() {
                            info!(publisher = %p.id, endpoint = %endpoint, "broker subscribed");
                        }
                    }
                    self.state = RoleState::Consume;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn on_tick(&mut self) -> Result<(), TransportError> {
        if self.registrant.phase() == Phase::IsReady && self.registrant.ready_to_reprobe(Instant::now()) {
            self.registrant.send_isready()?;
        }
        Ok(())
    }

    /// Republishes a sample received from a publisher to every
    /// subscriber, unchanged, acting as the sole intermediary under
    /// Broker dissemination.
    fn relay(&mut self, frames: Vec<Vec<u8>>) -> Result<(), TransportError> {
        let payload = match frames.last() {
            Some(p) => p,
            None => return Ok(()),
        };
        let sample = match Sample::decode(payload) {
            Ok(s) => s,
            Err(_) => return Ok(()),
        };
        self.pub_socket
            .send_multipart([sample.topic.as_bytes().to_vec(), sample.encode()], 0)?;
        self.relayed += 1;
        Ok(())
    }
}
