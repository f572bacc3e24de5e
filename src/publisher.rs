// File: publisher.rs
//
// The purpose of this file is the publisher role: REGISTER, ISREADY,
// then DISSEMINATE — producing topic samples at a configured frequency
// for a configured iteration count, then COMPLETED (§4.6).

use crate::cli::PublisherOpts;
use crate::error::TransportError;
use crate::eventloop::{Event, EventLoop};
use crate::registrant::{Phase, Registrant};
use crate::topics::choose_topics;
use crate::wire::{DiscoveryResp, RegistrantInfo, Role, Sample};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::info;

pub struct PublisherApp {
    registrant: Registrant,
    pub_socket: zmq::Socket,
    topiclist: Vec<String>,
    frequency: u64,
    iters: u64,
    sent: u64,
}

impl PublisherApp {
    pub fn new(ctx: &zmq::Context, opts: &PublisherOpts) -> Result<PublisherApp, TransportError> {
        let topiclist = choose_topics(opts.num_topics);
        let info = RegistrantInfo {
            id: opts.common.name.clone(),
            addr: opts.common.addr.clone(),
            port: opts.common.port as u32,
        };
        let registrant = Registrant::new(
            ctx,
            &opts.common.discovery_endpoint(),
            Role::Publisher,
            info,
            topiclist.clone(),
        )?;

        let pub_socket = ctx.socket(zmq::PUB)?;
        pub_socket.bind(&format!("tcp://*:{}", opts.common.port))?;

        Ok(PublisherApp {
            registrant,
            pub_socket,
            topiclist,
            frequency: opts.frequency.max(1),
            iters: opts.iters,
            sent: 0,
        })
    }

    /// Drives the lifecycle to completion: REGISTER, ISREADY (with
    /// backoff on NOT_READY), then `iters` samples at `frequency` Hz.
    pub fn run(&mut self) -> Result<(), TransportError> {
        self.registrant.send_register()?;
        let publish_interval = Duration::from_millis(1000 / self.frequency);
        let isready_poll = Duration::from_millis(500);

        loop {
            let timeout = match self.registrant.phase() {
                Phase::RoleSpecific => publish_interval,
                _ => isready_poll,
            };
            let socket = self.registrant.socket();
            let ev = EventLoop::new(socket, Vec::new(), timeout);
            match ev.poll_once()? {
                Event::Inbound(frames) => self.on_response(frames)?,
                Event::Tick => self.on_tick()?,
                Event::Outbound(_, _) => unreachable!("the publisher dials no outbound sockets"),
            }
            if self.registrant.is_completed() {
                return Ok(());
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
                self.registrant
                    .on_isready_response(resp, Instant::now())
                    .map_err(|_| TransportError::Disconnected)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn on_tick(&mut self) -> Result<(), TransportError> {
        match self.registrant.phase() {
            Phase::IsReady => {
                if self.registrant.ready_to_reprobe(Instant::now()) {
                    self.registrant.send_isready()?;
                }
            }
            Phase::RoleSpecific => {
                if self.sent < self.iters {
                    self.publish_sample()?;
                    self.sent += 1;
                } else {
                    self.registrant.complete();
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn publish_sample(&self) -> Result<(), TransportError> {
        let topic = &self.topiclist[self.sent as usize % self.topiclist.len().max(1)];
        let sample = Sample {
            pub_name: self.registrant.info.id.clone(),
            topic: topic.clone(),
            timestamp: now_secs(),
            payload: format!("sample-{}", self.sent),
        };
        self.pub_socket
            .send_multipart([topic.as_bytes().to_vec(), sample.encode()], 0)?;
        info!(topic = %topic, seq = self.sent, "published sample");
        Ok(())
    }
}

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before the epoch")
        .as_secs_f64()
}
