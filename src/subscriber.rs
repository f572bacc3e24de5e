// File: subscriber.rs
//
// The purpose of this file is the subscriber role: REGISTER, ISREADY,
// LOOKUP_PUB -> SUBSCRIBE -> CONSUME (iteration-limited) -> COMPLETED
// (§4.6), recording one latency sample per message consumed.

use crate::cli::SubscriberOpts;
use crate::error::TransportError;
use crate::eventloop::{Event, EventLoop};
use crate::registrant::{Phase, Registrant};
use crate::topics::choose_topics;
use crate::wire::{DiscoveryReq, DiscoveryResp, LookupPubByTopicReq, RegistrantInfo, Role, Sample};
use csv::Writer;
use std::fs::File;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
enum RoleState {
    LookupPub,
    Consume,
}

pub struct SubscriberApp {
    registrant: Registrant,
    sub_socket: zmq::Socket,
    topiclist: Vec<String>,
    state: RoleState,
    iters: u64,
    consumed: u64,
    writer: Writer<File>,
}

impl SubscriberApp {
    pub fn new(ctx: &zmq::Context, opts: &SubscriberOpts) -> Result<SubscriberApp, TransportError> {
        let topiclist = choose_topics(opts.num_topics);
        let info = RegistrantInfo {
            id: opts.common.name.clone(),
            addr: opts.common.addr.clone(),
            port: opts.common.port as u32,
        };
        let registrant = Registrant::new(
            ctx,
            &opts.common.discovery_endpoint(),
            Role::Subscriber,
            info,
            topiclist.clone(),
        )?;

        let sub_socket = ctx.socket(zmq::SUB)?;
        let csv_path = format!("{}-latency.csv", opts.common.name);
        let mut writer =
            Writer::from_path(&csv_path).expect("latency csv path must be writable");
        writer
            .write_record(["Pub", "Sub", "Topic", "Latency"])
            .expect("writing csv header");
        writer.flush().expect("flushing csv header");

        Ok(SubscriberApp {
            registrant,
            sub_socket,
            topiclist,
            state: RoleState::LookupPub,
            iters: opts.iters,
            consumed: 0,
            writer,
        })
    }

    pub fn run(&mut self) -> Result<(), TransportError> {
        self.registrant.send_register()?;
        let isready_poll = Duration::from_millis(500);
        let consume_poll = Duration::from_millis(500);

        loop {
            match self.registrant.phase() {
                Phase::RoleSpecific if self.state == RoleState::Consume => {
                    let sub_socket = &self.sub_socket;
                    let ev = EventLoop::new(sub_socket, Vec::new(), consume_poll);
                    match ev.poll_once()? {
                        Event::Inbound(frames) => self.on_sample(frames)?,
                        Event::Tick => {}
                        Event::Outbound(_, _) => unreachable!("the subscriber dials no outbound sockets"),
                    }
                }
                _ => {
                    let socket = self.registrant.socket();
                    let ev = EventLoop::new(socket, Vec::new(), isready_poll);
                    match ev.poll_once()? {
                        Event::Inbound(frames) => self.on_response(frames)?,
                        Event::Tick => self.on_tick()?,
                        Event::Outbound(_, _) => unreachable!("the subscriber dials no outbound sockets"),
                    }
                }
            }

            if self.registrant.is_completed() {
                self.writer.flush().ok();
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
                let became_ready = self
                    .registrant
                    .on_isready_response(resp, Instant::now())
                    .map_err(|_| TransportError::Disconnected)?;
                if became_ready {
                    self.send_lookup()?;
                }
            }
            Phase::RoleSpecific if self.state == RoleState::LookupPub => {
                if let DiscoveryResp::LookupPubByTopic(r) = resp {
                    self.subscribe_to(&r.pubs);
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

    fn send_lookup(&mut self) -> Result<(), TransportError> {
        let req = DiscoveryReq::LookupPubByTopic(LookupPubByTopicReq {
            topiclist: self.topiclist.clone(),
        });
        self.registrant.socket().send(req.encode(), 0)?;
        Ok(())
    }

    fn subscribe_to(&mut self, pubs: &[crate::wire::RegistrantInfo]) {
        for p in pubs {
            let endpoint = format!("tcp://{}:{}", p.addr, p.port);
            if self.sub_socket.connect(&endpoint).is_ok() {
                for topic in &self.topiclist {
                    let _ = self.sub_socket.set_subscribe(topic.as_bytes());
                }
                info!(publisher = %p.id, endpoint = %endpoint, "subscribed");
            }
        }
    }

    fn on_sample(&mut self, frames: Vec<Vec<u8>>) -> Result<(), TransportError> {
        let payload = match frames.last() {
            Some(p) => p,
            None => return Ok(()),
        };
        let sample = match Sample::decode(payload) {
            Ok(s) => s,
            Err(_) => return Ok(()),
        };
        let latency = now_secs() - sample.timestamp;
        self.writer
            .write_record([
                &sample.pub_name,
                &self.registrant.info.id,
                &sample.topic,
                &latency.to_string(),
            ])
            .expect("writing csv record");

        self.consumed += 1;
        if self.consumed >= self.iters {
            self.registrant.complete();
        }
        Ok(())
    }
}

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before the epoch")
        .as_secs_f64()
}
