//! Transport abstraction
//!
//! A duplex, message-oriented connection split into a write half and a
//! read half, so the pump's writer and reader threads each own one and
//! the connection itself needs no lock.

use bytes::Bytes;

use crate::error::Result;

/// Write half of a connection
pub trait MessageSink: Send + 'static {
    /// Send one discrete message
    fn send_message(&mut self, message: Bytes) -> Result<()>;

    /// Send a protocol-level close frame
    fn close(&mut self) -> Result<()>;

    /// Tear the physical connection down
    ///
    /// Must unblock a [`MessageSource::next_message`] pending on the
    /// other half. Called exactly once, when the writer exits.
    fn shutdown(&mut self);
}

/// Read half of a connection
pub trait MessageSource: Send + 'static {
    /// Block until the next discrete message arrives
    ///
    /// Returns `DriverError::ConnectionClosed` once the peer closed the
    /// connection or the local side shut it down.
    fn next_message(&mut self) -> Result<Bytes>;
}

/// A connection that can be split into its two halves
pub trait Transport {
    type Sink: MessageSink;
    type Source: MessageSource;

    fn split(self) -> (Self::Sink, Self::Source);
}
