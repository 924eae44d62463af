//! In-memory Transport
//!
//! A connected pair of channel endpoints. The client side implements
//! [`Transport`]; the [`MemoryPeer`] plays the server, which makes it
//! possible to drive the whole engine without sockets.

use std::time::Duration;

use bytes::Bytes;
use crossbeam::channel::{self, select, Receiver, Sender};

use crate::context::CancelToken;
use crate::error::{DriverError, Result};
use crate::protocol::{decode_request, encode_response, Request, ResponseEnvelope};
use super::{MessageSink, MessageSource, Transport};

enum Frame {
    Message(Bytes),
    Close,
}

/// Create a connected client transport and server peer
pub fn pair() -> (MemoryTransport, MemoryPeer) {
    let (to_peer, from_client) = channel::unbounded();
    let (to_client, from_peer) = channel::unbounded();
    let hangup = CancelToken::new();

    let transport = MemoryTransport {
        to_peer,
        from_peer,
        hangup: hangup.clone(),
    };
    let peer = MemoryPeer {
        from_client,
        to_client,
        hangup,
    };
    (transport, peer)
}

/// Client side of an in-memory connection
pub struct MemoryTransport {
    to_peer: Sender<Frame>,
    from_peer: Receiver<Frame>,
    hangup: CancelToken,
}

impl Transport for MemoryTransport {
    type Sink = MemorySink;
    type Source = MemorySource;

    fn split(self) -> (MemorySink, MemorySource) {
        let sink = MemorySink {
            to_peer: self.to_peer,
            hangup: self.hangup.clone(),
        };
        let source = MemorySource {
            from_peer: self.from_peer,
            hangup: self.hangup,
        };
        (sink, source)
    }
}

pub struct MemorySink {
    to_peer: Sender<Frame>,
    hangup: CancelToken,
}

impl MessageSink for MemorySink {
    fn send_message(&mut self, message: Bytes) -> Result<()> {
        if self.hangup.is_cancelled() {
            return Err(DriverError::ConnectionClosed);
        }
        self.to_peer
            .send(Frame::Message(message))
            .map_err(|_| DriverError::ConnectionClosed)
    }

    fn close(&mut self) -> Result<()> {
        if self.hangup.is_cancelled() {
            return Err(DriverError::ConnectionClosed);
        }
        self.to_peer
            .send(Frame::Close)
            .map_err(|_| DriverError::ConnectionClosed)
    }

    fn shutdown(&mut self) {
        self.hangup.cancel();
    }
}

pub struct MemorySource {
    from_peer: Receiver<Frame>,
    hangup: CancelToken,
}

impl MessageSource for MemorySource {
    fn next_message(&mut self) -> Result<Bytes> {
        select! {
            recv(self.from_peer) -> frame => match frame {
                Ok(Frame::Message(bytes)) => Ok(bytes),
                Ok(Frame::Close) | Err(_) => Err(DriverError::ConnectionClosed),
            },
            recv(self.hangup.signal()) -> _ => Err(DriverError::ConnectionClosed),
        }
    }
}

/// What the server side received
#[derive(Debug, Clone, PartialEq)]
pub enum PeerFrame {
    Request(Request),
    Close,
}

/// Server side of an in-memory connection
pub struct MemoryPeer {
    from_client: Receiver<Frame>,
    to_client: Sender<Frame>,
    hangup: CancelToken,
}

impl MemoryPeer {
    /// Wait up to `timeout` for the next frame from the client
    pub fn recv(&self, timeout: Duration) -> Result<PeerFrame> {
        select! {
            recv(self.from_client) -> frame => match frame {
                Ok(Frame::Message(bytes)) => Ok(PeerFrame::Request(decode_request(&bytes)?)),
                Ok(Frame::Close) => Ok(PeerFrame::Close),
                Err(_) => Err(DriverError::ConnectionClosed),
            },
            recv(self.hangup.signal()) -> _ => Err(DriverError::ConnectionClosed),
            default(timeout) => Err(DriverError::Timeout),
        }
    }

    /// Wait up to `timeout` for the next request; a close frame is an error
    pub fn recv_request(&self, timeout: Duration) -> Result<Request> {
        match self.recv(timeout)? {
            PeerFrame::Request(request) => Ok(request),
            PeerFrame::Close => Err(DriverError::ConnectionClosed),
        }
    }

    /// Send a reply envelope to the client
    pub fn reply(&self, response: &ResponseEnvelope) -> Result<()> {
        self.send_raw(encode_response(response)?)
    }

    /// Send arbitrary bytes as one message
    pub fn send_raw(&self, message: impl Into<Bytes>) -> Result<()> {
        self.to_client
            .send(Frame::Message(message.into()))
            .map_err(|_| DriverError::ConnectionClosed)
    }

    /// Send a close frame to the client
    pub fn close(&self) -> Result<()> {
        self.to_client
            .send(Frame::Close)
            .map_err(|_| DriverError::ConnectionClosed)
    }

    /// Drop the connection abruptly
    pub fn hang_up(&self) {
        self.hangup.cancel();
    }

    /// Whether either side tore the connection down
    pub fn is_hung_up(&self) -> bool {
        self.hangup.is_cancelled()
    }
}
