// File: wire.rs
//
// The purpose of this file is to define the discovery-plane wire
// messages (§6) and their encode/decode into the length-delimited
// frame a ZeroMQ ROUTER/DEALER socket carries as its last part. The
// byte encoding is a tagged JSON object; the shape (fields, cardinality,
// the oneof nesting) is the part of the contract that matters.

use serde::{Deserialize, Serialize};

/// A registrant's contact information, as handed back by LOOKUP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrantInfo {
    pub id: String,
    pub addr: String,
    pub port: u32,
}

/// The role a registrant plays. `Both` names the broker, which
/// simultaneously subscribes to every publisher and publishes to every
/// subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Unknown,
    Publisher,
    Subscriber,
    Both,
}

impl Role {
    /// The string form used as the Chord routing key input, per §4.5:
    /// `K = hash(M, roleLabel)`. All publishers route to one node, all
    /// subscribers to another, the broker ("Both") to a third.
    pub fn route_label(self) -> &'static str {
        match self {
            Role::Unknown => "UNKNOWN",
            Role::Publisher => "PUBLISHER",
            Role::Subscriber => "SUBSCRIBER",
            Role::Both => "BOTH",
        }
    }
}

/// The result of a REGISTER attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Unknown,
    Success,
    Failure,
    CheckAgain,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterReq {
    pub role: Role,
    pub info: RegistrantInfo,
    pub topiclist: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResp {
    pub status: Status,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsReadyReq;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsReadyResp {
    pub status: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupPubByTopicReq {
    pub topiclist: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupPubByTopicResp {
    pub pubs: Vec<RegistrantInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupAllPubsReq;

/// The outer request envelope: a tagged union over the four request
/// kinds the discovery node accepts. Using a Rust enum with
/// `#[serde(tag = "msg_type")]` gives the same demultiplexing the
/// reference system's `oneof msg_type` gives, without a separate
/// "which field is set" check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "msg_type")]
pub enum DiscoveryReq {
    Register(RegisterReq),
    IsReady(IsReadyReq),
    LookupPubByTopic(LookupPubByTopicReq),
    LookupAllPubs(LookupAllPubsReq),
}

/// The outer response envelope, mirroring `DiscoveryReq`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "msg_type")]
pub enum DiscoveryResp {
    Register(RegisterResp),
    IsReady(IsReadyResp),
    LookupPubByTopic(LookupPubByTopicResp),
}

impl DiscoveryReq {
    pub fn encode(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("DiscoveryReq always serializes")
    }

    pub fn decode(bytes: &[u8]) -> Result<DiscoveryReq, crate::error::ProtocolError> {
        serde_json::from_slice(bytes).map_err(crate::error::ProtocolError::Malformed)
    }
}

impl DiscoveryResp {
    pub fn encode(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("DiscoveryResp always serializes")
    }

    pub fn decode(bytes: &[u8]) -> Result<DiscoveryResp, crate::error::ProtocolError> {
        serde_json::from_slice(bytes).map_err(crate::error::ProtocolError::Malformed)
    }
}

/// A unit of topic data flowing over the (out-of-core) data plane, used
/// only so the publisher/subscriber/broker roles have something to
/// exercise the Direct/Broker dissemination paths with end to end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    pub pub_name: String,
    pub topic: String,
    pub timestamp: f64,
    pub payload: String,
}

impl Sample {
    pub fn encode(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("Sample always serializes")
    }

    pub fn decode(bytes: &[u8]) -> Result<Sample, crate::error::ProtocolError> {
        serde_json::from_slice(bytes).map_err(crate::error::ProtocolError::Malformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_req_round_trips() {
        let req = DiscoveryReq::Register(RegisterReq {
            role: Role::Publisher,
            info: RegistrantInfo {
                id: "P1".into(),
                addr: "127.0.0.1".into(),
                port: 5588,
            },
            topiclist: vec!["T1".into(), "T2".into()],
        });
        let bytes = req.encode();
        let decoded = DiscoveryReq::decode(&bytes).unwrap();
        match decoded {
            DiscoveryReq::Register(r) => {
                assert_eq!(r.role, Role::Publisher);
                assert_eq!(r.info.id, "P1");
                assert_eq!(r.topiclist, vec!["T1", "T2"]);
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn malformed_payload_is_a_protocol_error() {
        let err = DiscoveryReq::decode(b"not json").unwrap_err();
        assert!(matches!(err, crate::error::ProtocolError::Malformed(_)));
    }

    #[test]
    fn role_labels_match_the_routing_key_contract() {
        assert_eq!(Role::Publisher.route_label(), "PUBLISHER");
        assert_eq!(Role::Subscriber.route_label(), "SUBSCRIBER");
        assert_eq!(Role::Both.route_label(), "BOTH");
    }
}
