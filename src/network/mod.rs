//! Network Module
//!
//! Transports and the connection pump.
//!
//! ## Architecture
//! - Transport split into a write half and a read half
//! - Writer, reader and dispatcher threads per connection
//! - Replies routed to callers through the [`Registry`](crate::registry::Registry)

mod transport;
mod pump;
pub mod tcp;
pub mod memory;

pub use transport::{MessageSink, MessageSource, Transport};
pub use pump::Pump;
pub use tcp::TcpTransport;
pub use memory::{MemoryPeer, MemoryTransport, PeerFrame};
