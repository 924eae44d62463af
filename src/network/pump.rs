//! Connection Pump
//!
//! Owns the physical connection and runs three threads until it fails or
//! is closed:
//!
//! ```text
//!  submit() ──► outbound ──► [writer] ──► MessageSink
//!                                          │
//!                                     remote side
//!                                          │
//!  Registry ◄── [dispatcher] ◄── inbound ◄── [reader] ◄── MessageSource
//! ```
//!
//! ## Shutdown
//! All three threads watch one [`CancelToken`]. A write failure, a read
//! failure, an unattributable reply, or dropping the [`Pump`] cancels it.
//! The writer is the only thread that tears the connection down, so it
//! happens exactly once. Requests still queued are dropped.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use bytes::Bytes;
use crossbeam::channel::{self, select, Receiver, Sender};

use crate::config::Config;
use crate::context::CancelToken;
use crate::error::{DriverError, Result};
use crate::protocol::{decode_response, CallId, ResponseEnvelope};
use crate::registry::Registry;
use super::{MessageSink, MessageSource, Transport};

/// Work item for the writer thread
enum Outbound {
    /// An already encoded request
    Request { id: CallId, message: Bytes },
    Close(Sender<Result<()>>),
}

/// The reader, writer and dispatcher threads of one connection
pub struct Pump {
    outbound: Sender<Outbound>,
    shutdown: CancelToken,
    handles: Vec<JoinHandle<()>>,
}

impl Pump {
    /// Split `transport` and start the three threads
    pub fn start<T: Transport>(transport: T, registry: Arc<Registry>, config: &Config) -> Result<Self> {
        config.validate()?;

        let (sink, source) = transport.split();
        let (outbound_tx, outbound_rx) = channel::bounded(config.outbound_capacity);
        let (inbound_tx, inbound_rx) = channel::unbounded();
        let shutdown = CancelToken::new();

        let mut handles = Vec::with_capacity(3);

        let token = shutdown.clone();
        handles.push(spawn("writer", move || write_loop(sink, outbound_rx, token))?);

        let token = shutdown.clone();
        handles.push(spawn("reader", move || read_loop(source, inbound_tx, token))?);

        let token = shutdown.clone();
        let sweep = channel::tick(config.sweep_interval);
        handles.push(spawn("dispatcher", move || {
            dispatch_loop(registry, inbound_rx, sweep, token)
        })?);

        Ok(Self {
            outbound: outbound_tx,
            shutdown,
            handles,
        })
    }

    /// Queue an encoded request for the writer
    ///
    /// Fails with `ConnectionClosed` once the pump has shut down, rather
    /// than blocking on a full queue forever.
    pub fn submit(&self, id: CallId, message: Bytes) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Err(DriverError::ConnectionClosed);
        }
        enqueue(&self.outbound, &self.shutdown, Outbound::Request { id, message })
    }

    /// Send a protocol close frame through the writer
    ///
    /// Does not fail or unblock calls that are still in flight.
    pub fn close(&self) -> Result<()> {
        let (ack_tx, ack_rx) = channel::bounded(1);
        enqueue(&self.outbound, &self.shutdown, Outbound::Close(ack_tx))?;
        ack_rx.recv().map_err(|_| DriverError::ConnectionClosed)?
    }

    /// Stop all threads without sending a close frame
    pub fn shutdown(&self) {
        if self.shutdown.cancel() {
            tracing::debug!("Pump shutdown requested");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Token cancelled when the pump stops
    pub fn shutdown_token(&self) -> &CancelToken {
        &self.shutdown
    }
}

impl Drop for Pump {
    fn drop(&mut self) {
        self.shutdown.cancel();

        for handle in self.handles.drain(..) {
            let name = handle.thread().name().unwrap_or("pump").to_string();
            if handle.join().is_err() {
                tracing::warn!("Pump thread {} panicked", name);
            }
        }
    }
}

fn spawn<F>(role: &str, body: F) -> Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    let handle = thread::Builder::new()
        .name(format!("surrealrpc-{}", role))
        .spawn(body)?;
    Ok(handle)
}

fn enqueue(outbound: &Sender<Outbound>, shutdown: &CancelToken, item: Outbound) -> Result<()> {
    select! {
        send(outbound, item) -> sent => sent.map_err(|_| DriverError::ConnectionClosed),
        recv(shutdown.signal()) -> _ => Err(DriverError::ConnectionClosed),
    }
}

// =============================================================================
// Loops
// =============================================================================

fn write_loop<S: MessageSink>(mut sink: S, outbound: Receiver<Outbound>, shutdown: CancelToken) {
    tracing::debug!("Writer started");

    loop {
        let item = select! {
            recv(outbound) -> item => match item {
                Ok(item) => item,
                Err(_) => break,
            },
            recv(shutdown.signal()) -> _ => break,
        };

        match item {
            Outbound::Request { id, message } => {
                tracing::trace!("Sending {} ({} bytes)", id, message.len());

                match sink.send_message(message) {
                    Ok(()) => {}
                    // Rejected before any byte was written; the connection is intact
                    Err(e @ DriverError::FrameTooLarge { .. }) => {
                        tracing::warn!("Dropped {}: {}", id, e);
                    }
                    Err(e) => {
                        tracing::warn!("Write of {} failed: {}", id, e);
                        shutdown.cancel();
                        break;
                    }
                }
            }
            Outbound::Close(ack) => {
                let result = sink.close();
                if let Err(ref e) = result {
                    tracing::debug!("Close frame failed: {}", e);
                }
                // The closer may have given up waiting
                let _ = ack.send(result);
            }
        }
    }

    sink.shutdown();
    tracing::debug!("Writer stopped");
}

fn read_loop<S: MessageSource>(mut source: S, inbound: Sender<ResponseEnvelope>, shutdown: CancelToken) {
    tracing::debug!("Reader started");

    while !shutdown.is_cancelled() {
        let message = match source.next_message() {
            Ok(message) => message,
            Err(e) => {
                if !shutdown.is_cancelled() {
                    match e {
                        DriverError::ConnectionClosed => tracing::debug!("Connection closed by peer"),
                        ref e => tracing::warn!("Read failed: {}", e),
                    }
                }
                break;
            }
        };

        let envelope = match decode_response(&message) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!("Unattributable reply, closing connection: {}", e);
                break;
            }
        };

        tracing::trace!("Received reply for {}", envelope.id);
        if inbound.send(envelope).is_err() {
            break;
        }
    }

    shutdown.cancel();
    tracing::debug!("Reader stopped");
}

fn dispatch_loop(
    registry: Arc<Registry>,
    inbound: Receiver<ResponseEnvelope>,
    sweep: Receiver<Instant>,
    shutdown: CancelToken,
) {
    tracing::debug!("Dispatcher started");

    loop {
        select! {
            recv(inbound) -> envelope => match envelope {
                Ok(envelope) => {
                    registry.dispatch(envelope);
                }
                Err(_) => break,
            },
            recv(sweep) -> now => {
                let now = now.unwrap_or_else(|_| Instant::now());
                let evicted = registry.evict_expired(now);
                if evicted > 0 {
                    tracing::debug!("Evicted {} expired waiter(s)", evicted);
                }
            },
            recv(shutdown.signal()) -> _ => {
                // Replies the reader already accepted still reach their callers
                for envelope in inbound.try_iter() {
                    registry.dispatch(envelope);
                }
                break;
            },
        }
    }

    tracing::debug!("Dispatcher stopped");
}
