// File: registrant.rs
//
// The purpose of this file is the lifecycle steps shared by every
// registrant role (§4.6): INITIALIZE -> CONFIGURE -> REGISTER ->
// ISREADY, after which a role-specific terminal sequence takes over.
// The role modules (publisher/subscriber/broker) embed a `Registrant`
// and drive it from their own event loops.

use crate::error::{ProtocolError, TransportError};
use crate::wire::{DiscoveryReq, DiscoveryResp, IsReadyReq, RegisterReq, RegistrantInfo, Role, Status};
use std::time::{Duration, Instant};
use tracing::info;

/// §4.6: "a NOT_READY response causes the client to sleep a bounded
/// interval (policy: 10 s) before re-probing".
pub const ISREADY_BACKOFF: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initialize,
    Configure,
    Register,
    IsReady,
    RoleSpecific,
    Completed,
}

/// The common lifecycle state and REQ socket every role drives through
/// REGISTER and ISREADY before branching into its own terminal states.
pub struct Registrant {
    pub phase: Phase,
    pub info: RegistrantInfo,
    pub role: Role,
    pub topiclist: Vec<String>,
    req_socket: zmq::Socket,
    backoff_until: Option<Instant>,
}

impl Registrant {
    pub fn new(
        ctx: &zmq::Context,
        discovery_addr: &str,
        role: Role,
        info: RegistrantInfo,
        topiclist: Vec<String>,
    ) -> Result<Registrant, TransportError> {
        let req_socket = ctx.socket(zmq::REQ)?;
        req_socket.connect(discovery_addr)?;
        Ok(Registrant {
            phase: Phase::Configure,
            info,
            role,
            topiclist,
            req_socket,
            backoff_until: None,
        })
    }

    pub fn socket(&self) -> &zmq::Socket {
        &self.req_socket
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// CONFIGURE -> REGISTER.
    pub fn send_register(&mut self) -> Result<(), TransportError> {
        let req = DiscoveryReq::Register(RegisterReq {
            role: self.role,
            info: self.info.clone(),
            topiclist: self.topiclist.clone(),
        });
        self.req_socket.send(req.encode(), 0)?;
        self.phase = Phase::Register;
        Ok(())
    }

    /// SUCCESS advances to ISREADY; anything else is fatal, per the
    /// failure semantics in §4.6 ("failure to register fails the
    /// client").
    pub fn on_register_response(&mut self, resp: DiscoveryResp) -> Result<(), ProtocolError> {
        match resp {
            DiscoveryResp::Register(r) if r.status == Status::Success => {
                self.phase = Phase::IsReady;
                Ok(())
            }
            DiscoveryResp::Register(r) => Err(ProtocolError::UnrecognizedType(format!(
                "registration failed: {}",
                r.reason
            ))),
            _ => Err(ProtocolError::UnrecognizedType(
                "expected a RegisterResp".into(),
            )),
        }
    }

    pub fn send_isready(&mut self) -> Result<(), TransportError> {
        let req = DiscoveryReq::IsReady(IsReadyReq);
        self.req_socket.send(req.encode(), 0)?;
        Ok(())
    }

    /// `false` arms the backoff and keeps the client in ISREADY;
    /// `true` advances to the role-specific terminal sequence.
    pub fn on_isready_response(
        &mut self,
        resp: DiscoveryResp,
        now: Instant,
    ) -> Result<bool, ProtocolError> {
        match resp {
            DiscoveryResp::IsReady(r) if r.status => {
                self.phase = Phase::RoleSpecific;
                Ok(true)
            }
            DiscoveryResp::IsReady(_) => {
                self.backoff_until = Some(now + ISREADY_BACKOFF);
                Ok(false)
            }
            _ => Err(ProtocolError::UnrecognizedType(
                "expected an IsReadyResp".into(),
            )),
        }
    }

    /// Whether the backoff armed by the last NOT_READY probe has
    /// elapsed (or none was ever armed).
    pub fn ready_to_reprobe(&self, now: Instant) -> bool {
        match self.backoff_until {
            None => true,
            Some(deadline) => now >= deadline,
        }
    }

    pub fn complete(&mut self) {
        self.phase = Phase::Completed;
        info!(id = %self.info.id, "registrant reached COMPLETED");
    }

    pub fn is_completed(&self) -> bool {
        self.phase == Phase::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::RegisterResp;

    fn registrant(ctx: &zmq::Context) -> Registrant {
        Registrant::new(
            ctx,
            "inproc://registrant-test",
            Role::Publisher,
            RegistrantInfo {
                id: "P1".into(),
                addr: "127.0.0.1".into(),
                port: 6000,
            },
            vec!["T1".into()],
        )
        .unwrap()
    }

    #[test]
    fn register_success_advances_to_isready() {
        let ctx = zmq::Context::new();
        let router = ctx.socket(zmq::ROUTER).unwrap();
        router.bind("inproc://registrant-test").unwrap();
        let mut r = registrant(&ctx);

        r.send_register().unwrap();
        assert_eq!(r.phase(), Phase::Register);

        let resp = DiscoveryResp::Register(RegisterResp {
            status: Status::Success,
            reason: String::new(),
        });
        r.on_register_response(resp).unwrap();
        assert_eq!(r.phase(), Phase::IsReady);
    }

    #[test]
    fn register_failure_is_an_error() {
        let ctx = zmq::Context::new();
        let mut r = registrant(&ctx);
        let resp = DiscoveryResp::Register(RegisterResp {
            status: Status::Failure,
            reason: "duplicate".into(),
        });
        assert!(r.on_register_response(resp).is_err());
    }

    #[test]
    fn not_ready_arms_backoff_and_ready_clears_it() {
        let ctx = zmq::Context::new();
        let mut r = registrant(&ctx);
        let t0 = Instant::now();

        let resp = DiscoveryResp::IsReady(crate::wire::IsReadyResp { status: false });
        let advanced = r.on_isready_response(resp, t0).unwrap();
        assert!(!advanced);
        assert!(!r.ready_to_reprobe(t0));
        assert!(r.ready_to_reprobe(t0 + ISREADY_BACKOFF));

        let resp = DiscoveryResp::IsReady(crate::wire::IsReadyResp { status: true });
        let advanced = r
            .on_isready_response(resp, t0 + ISREADY_BACKOFF)
            .unwrap();
        assert!(advanced);
        assert_eq!(r.phase(), Phase::RoleSpecific);
    }

    #[test]
    fn complete_is_terminal() {
        let ctx = zmq::Context::new();
        let mut r = registrant(&ctx);
        assert!(!r.is_completed());
        r.complete();
        assert!(r.is_completed());
    }
}
