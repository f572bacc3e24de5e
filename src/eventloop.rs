// File: eventloop.rs
//
// The purpose of this file is the cooperative poll loop shared by every
// role: one inbound socket (a discovery node's ROUTER, or a client's
// REQ) plus zero or more outbound sockets, demultiplexed each iteration
// via zmq::poll. There is no preemption — whichever upcall `run` invokes
// runs to completion before the next poll (§4.7).

use std::time::Duration;

/// What happened on the most recent poll: the timeout elapsed with
/// nothing ready (`Tick`), the inbound socket had a message, or one of
/// the named outbound sockets did.
pub enum Event {
    Tick,
    Inbound(Vec<Vec<u8>>),
    Outbound(String, Vec<Vec<u8>>),
}

/// Borrows the sockets it polls; it never owns or closes them. Outbound
/// sockets are tagged by name (a ring node id, typically) so a caller
/// can tell which peer a response frame came from.
pub struct EventLoop<'a> {
    inbound: &'a zmq::Socket,
    outbound: Vec<(String, &'a zmq::Socket)>,
    timeout_ms: i64,
    running: bool,
}

impl<'a> EventLoop<'a> {
    pub fn new(
        inbound: &'a zmq::Socket,
        outbound: Vec<(String, &'a zmq::Socket)>,
        timeout: Duration,
    ) -> EventLoop<'a> {
        EventLoop {
            inbound,
            outbound,
            timeout_ms: timeout.as_millis() as i64,
            running: true,
        }
    }

    /// Ends the loop after the current upcall returns. Callbacks call
    /// this on reaching a terminal state (COMPLETED, or a fatal error).
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Polls every registered socket once, blocking up to the
    /// configured timeout. The inbound socket takes priority over
    /// outbound sockets when both are ready in the same poll.
    pub fn poll_once(&self) -> Result<Event, crate::error::TransportError> {
        let mut items = Vec::with_capacity(1 + self.outbound.len());
        items.push(self.inbound.as_poll_item(zmq::POLLIN));
        for (_, socket) in &self.outbound {
            items.push(socket.as_poll_item(zmq::POLLIN));
        }

        zmq::poll(&mut items, self.timeout_ms).map_err(crate::error::TransportError::Zmq)?;

        if items[0].is_readable() {
            let frames = self
                .inbound
                .recv_multipart(0)
                .map_err(crate::error::TransportError::Zmq)?;
            return Ok(Event::Inbound(frames));
        }

        for (i, (id, socket)) in self.outbound.iter().enumerate() {
            if items[i + 1].is_readable() {
                let frames = socket
                    .recv_multipart(0)
                    .map_err(crate::error::TransportError::Zmq)?;
                return Ok(Event::Outbound(id.clone(), frames));
            }
        }

        Ok(Event::Tick)
    }

    /// Runs until a callback calls `stop()`. `tick` fires on a timed-out
    /// poll (the place periodic, non-message-driven work like a
    /// backoff check happens); `on_inbound`/`on_outbound` fire when the
    /// matching socket has a message.
    pub fn run<FT, FI, FO>(
        &mut self,
        mut tick: FT,
        mut on_inbound: FI,
        mut on_outbound: FO,
    ) -> Result<(), crate::error::TransportError>
    where
        FT: FnMut(&mut EventLoop<'a>),
        FI: FnMut(&mut EventLoop<'a>, Vec<Vec<u8>>),
        FO: FnMut(&mut EventLoop<'a>, &str, Vec<Vec<u8>>),
    {
        while self.running {
            match self.poll_once()? {
                Event::Tick => tick(self),
                Event::Inbound(frames) => on_inbound(self, frames),
                Event::Outbound(id, frames) => on_outbound(self, &id, frames),
            }
        }
        Ok(())
    }
}
