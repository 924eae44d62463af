//! # surrealrpc
//!
//! A client driver for a document database that speaks JSON RPC over one
//! long-lived, message-oriented connection:
//! - Many concurrent calls multiplexed over a single connection
//! - Replies correlated to callers by call id, not by send order
//! - Per-call cancellation and deadlines
//! - Payload decoding that depends on the command issued
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Client (Call Façade)                      │
//! │               (many caller threads at once)                  │
//! └──────────┬──────────────────────────────────▲───────────────┘
//!            │ register once + submit           │ decode
//!            │                                  │
//! ┌──────────▼──────────┐            ┌──────────┴──────────┐
//! │      Registry       │◄───────────│       Decoder       │
//! │  (id -> waiters)    │  dispatch  │ (records / query)   │
//! └──────────▲──────────┘            └─────────────────────┘
//!            │
//! ┌──────────┴──────────────────────────────────────────────────┐
//! │                  Pump (writer / reader / dispatcher)         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!               ┌───────▼───────┐
//!               │   Transport   │
//!               │ (TCP, memory) │
//!               └───────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use serde::Deserialize;
//! use surrealrpc::{Client, Config, Context, Credentials};
//!
//! #[derive(Deserialize)]
//! struct User {
//!     id: String,
//!     name: String,
//! }
//!
//! # fn main() -> surrealrpc::Result<()> {
//! let client = Client::connect(Config::builder().server_addr("127.0.0.1:8000").build())?;
//! let ctx = Context::background();
//!
//! client.signin(&ctx, &Credentials::new("root", "root"))?;
//! client.use_ns(&ctx, "test", "test")?;
//!
//! let user: Option<User> = client.select(&ctx, "users:42")?.one()?;
//! let users: Option<Vec<User>> = client.select(&ctx, "users")?.list()?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod context;

pub mod protocol;
pub mod registry;
pub mod network;
pub mod decoder;
pub mod types;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{DriverError, Result};
pub use config::Config;
pub use context::{CancelToken, Context};
pub use client::Client;
pub use decoder::{Destination, List, QueryResponse, Records, Single};
pub use types::{Credentials, Patch};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of surrealrpc
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
