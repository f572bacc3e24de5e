// File: shard.rs
//
// The purpose of this file is to hold the per-discovery-node state: the
// registrants this node owns (by Chord key ownership) and the
// readiness/lookup logic that answers requests purely from that local
// view (§3 DiscoveryShard, §4.5 ISREADY / LOOKUP).

use crate::wire::{RegisterReq, RegistrantInfo, Role};
use std::collections::HashMap;

/// A registered publisher, subscriber, or broker. Owned by whichever
/// discovery node's hash-space contains `H(role)`.
#[derive(Debug, Clone)]
pub struct Registrant {
    pub id: String,
    pub role: Role,
    pub addr: String,
    pub port: u32,
    pub topiclist: Vec<String>,
}

impl From<&RegisterReq> for Registrant {
    fn from(req: &RegisterReq) -> Registrant {
        Registrant {
            id: req.info.id.clone(),
            role: req.role,
            addr: req.info.addr.clone(),
            port: req.info.port,
            topiclist: req.topiclist.clone(),
        }
    }
}

impl Registrant {
    pub fn info(&self) -> RegistrantInfo {
        RegistrantInfo {
            id: self.id.clone(),
            addr: self.addr.clone(),
            port: self.port,
        }
    }
}

/// Which dissemination strategy this deployment uses. Affects how
/// LOOKUP_PUB_BY_TOPIC and ISREADY answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dissemination {
    Direct,
    Broker,
}

/// The registrant state owned by one discovery node. Mutated only by
/// that node's own event loop; there is no cross-node synchronization.
pub struct DiscoveryShard {
    pub publishers: HashMap<String, Registrant>,
    pub subscribers: HashMap<String, Registrant>,
    pub broker: Option<Registrant>,
    pub dissemination: Dissemination,
    pub expected_pubs: usize,
    pub expected_subs: usize,
}

impl DiscoveryShard {
    pub fn new(dissemination: Dissemination, expected_pubs: usize, expected_subs: usize) -> DiscoveryShard {
        DiscoveryShard {
            publishers: HashMap::new(),
            subscribers: HashMap::new(),
            broker: None,
            dissemination,
            expected_pubs,
            expected_subs,
        }
    }

    /// Inserts (or overwrites by id, per §4.6/§9) a registrant into the
    /// role-appropriate container.
    pub fn register(&mut self, req: &RegisterReq) {
        let registrant = Registrant::from(req);
        match req.role {
            Role::Publisher => {
                self.publishers.insert(registrant.id.clone(), registrant);
            }
            Role::Subscriber => {
                self.subscribers.insert(registrant.id.clone(), registrant);
            }
            Role::Both => {
                self.broker = Some(registrant);
            }
            Role::Unknown => {}
        }
    }

    /// §4.5 ISREADY: ready iff enough publishers and subscribers have
    /// registered here, and (if this deployment is BROKER-disseminated)
    /// a broker has registered here too.
    pub fn is_ready(&self) -> bool {
        let pubs_met = self.publishers.len() >= self.expected_pubs;
        let subs_met = self.subscribers.len() >= self.expected_subs;
        let broker_met = self.dissemination != Dissemination::Broker || self.broker.is_some();
        pubs_met && subs_met && broker_met
    }

    /// §4.5 LOOKUP_PUB_BY_TOPIC: under Broker dissemination, the broker
    /// is the sole answer regardless of topic overlap. Under Direct
    /// dissemination, every locally-registered publisher whose
    /// topiclist intersects `topiclist`.
    pub fn lookup_pub_by_topic(&self, topiclist: &[String]) -> Vec<RegistrantInfo> {
        if self.dissemination == Dissemination::Broker {
            return self
                .broker
                .as_ref()
                .map(|b| vec![b.info()])
                .unwrap_or_default();
        }

        self.publishers
            .values()
            .filter(|p| p.topiclist.iter().any(|t| topiclist.contains(t)))
            .map(Registrant::info)
            .collect()
    }

    /// §4.5 LOOKUP_ALL_PUBS: every locally-registered publisher.
    pub fn lookup_all_pubs(&self) -> Vec<RegistrantInfo> {
        self.publishers.values().map(Registrant::info).collect()
    }
}
