//! TCP Transport
//!
//! Framed messages over a TCP stream (see [`crate::protocol`] frame format).

use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use bytes::Bytes;

use crate::config::Config;
use crate::error::{DriverError, Result};
use crate::protocol::{read_frame, write_frame, FrameKind};
use super::{MessageSink, MessageSource, Transport};

/// A framed TCP connection
pub struct TcpTransport {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Largest frame accepted or sent
    max_message_size: usize,

    /// Peer address for logging
    peer_addr: String,
}

impl TcpTransport {
    /// Connect to `config.server_addr`
    pub fn connect(config: &Config) -> Result<Self> {
        let addr = resolve(&config.server_addr)?;

        let stream = if config.connect_timeout_ms > 0 {
            TcpStream::connect_timeout(&addr, Duration::from_millis(config.connect_timeout_ms))?
        } else {
            TcpStream::connect(addr)?
        };

        Self::from_stream(stream, config)
    }

    /// Wrap an already connected stream
    ///
    /// No read timeout is set: the reader waits indefinitely between replies.
    pub fn from_stream(stream: TcpStream, config: &Config) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        if config.nodelay {
            stream.set_nodelay(true)?;
        }
        if config.write_timeout_ms > 0 {
            stream.set_write_timeout(Some(Duration::from_millis(config.write_timeout_ms)))?;
        }

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        tracing::debug!("Connected to {}", peer_addr);

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            max_message_size: config.max_message_size,
            peer_addr,
        })
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

fn resolve(addr: &str) -> Result<SocketAddr> {
    addr.to_socket_addrs()?
        .next()
        .ok_or_else(|| DriverError::Config(format!("Address {} did not resolve", addr)))
}

impl Transport for TcpTransport {
    type Sink = TcpSink;
    type Source = TcpSource;

    fn split(self) -> (TcpSink, TcpSource) {
        let sink = TcpSink {
            writer: self.writer,
            max_message_size: self.max_message_size,
            peer_addr: self.peer_addr.clone(),
        };
        let source = TcpSource {
            reader: self.reader,
            max_message_size: self.max_message_size,
            peer_addr: self.peer_addr,
        };
        (sink, source)
    }
}

/// Write half of a [`TcpTransport`]
pub struct TcpSink {
    writer: BufWriter<TcpStream>,
    max_message_size: usize,
    peer_addr: String,
}

impl MessageSink for TcpSink {
    fn send_message(&mut self, message: Bytes) -> Result<()> {
        if message.len() > self.max_message_size {
            return Err(DriverError::FrameTooLarge {
                size: message.len(),
                max: self.max_message_size,
            });
        }
        write_frame(&mut self.writer, FrameKind::Text, &message)
    }

    fn close(&mut self) -> Result<()> {
        write_frame(&mut self.writer, FrameKind::Close, &[])
    }

    fn shutdown(&mut self) {
        if let Err(e) = self.writer.get_ref().shutdown(Shutdown::Both) {
            // Already torn down by the peer
            tracing::trace!("Shutdown of {} failed: {}", self.peer_addr, e);
        }
    }
}

/// Read half of a [`TcpTransport`]
pub struct TcpSource {
    reader: BufReader<TcpStream>,
    max_message_size: usize,
    peer_addr: String,
}

impl MessageSource for TcpSource {
    fn next_message(&mut self) -> Result<Bytes> {
        match read_frame(&mut self.reader, self.max_message_size) {
            Ok((FrameKind::Text, payload)) => Ok(payload),
            Ok((FrameKind::Close, _)) => {
                tracing::debug!("Server {} sent close frame", self.peer_addr);
                Err(DriverError::ConnectionClosed)
            }
            Err(DriverError::Io(ref e))
                if matches!(
                    e.kind(),
                    ErrorKind::UnexpectedEof
                        | ErrorKind::ConnectionReset
                        | ErrorKind::ConnectionAborted
                ) =>
            {
                tracing::debug!("Connection to {} closed: {}", self.peer_addr, e);
                Err(DriverError::ConnectionClosed)
            }
            Err(e) => Err(e),
        }
    }
}
