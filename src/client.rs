//! Client Module
//!
//! The public command surface. Every command follows the same path:
//!
//! 1. Generate a fresh call id and encode the request
//! 2. Register a one-shot waiter that expires at the call's deadline
//! 3. Submit the request to the pump
//! 4. Block until the reply, the caller's cancel token, or the deadline
//! 5. Surface a remote error, or hand the payload to the decoder
//!
//! A cancelled or timed-out call leaves its waiter registered; a late reply
//! is dropped and the dispatcher evicts the waiter once it has expired.
//! Nothing is retried.

use std::sync::Arc;
use std::time::Instant;

use crossbeam::channel::{self, select, Receiver};
use serde::Serialize;
use serde_json::Value;

use crate::config::Config;
use crate::context::{CancelToken, Context};
use crate::decoder::{decode, Decoded, QueryResponse, Records};
use crate::error::{DriverError, Result};
use crate::network::{Pump, TcpTransport, Transport};
use crate::protocol::{encode_request, CallId, IdGenerator, Method, Payload, Request, ResponseEnvelope};
use crate::registry::Registry;
use crate::types::{Credentials, Patch};

/// A connection to the database
///
/// `Client` is `Sync`; share it across threads behind an `Arc` to issue
/// concurrent calls over the one connection.
pub struct Client {
    /// Client configuration
    config: Config,

    /// Waiters for in-flight calls and subscriptions
    registry: Arc<Registry>,

    /// Reader, writer and dispatcher threads
    pump: Pump,

    /// Call id source
    ids: IdGenerator,
}

impl Client {
    /// Connect over TCP to `config.server_addr`
    pub fn connect(config: Config) -> Result<Self> {
        let transport = TcpTransport::connect(&config)?;
        Self::with_transport(transport, config)
    }

    /// Start a client over an already established transport
    pub fn with_transport<T: Transport>(transport: T, config: Config) -> Result<Self> {
        let registry = Arc::new(Registry::new());
        let pump = Pump::start(transport, Arc::clone(&registry), &config)?;

        Ok(Self {
            config,
            registry,
            pump,
            ids: IdGenerator::new(),
        })
    }

    /// Send a close frame to the server
    ///
    /// Calls still in flight are not failed; they run into their deadline.
    pub fn close(&self) -> Result<()> {
        self.pump.close()
    }

    /// Whether the connection has shut down
    pub fn is_closed(&self) -> bool {
        self.pump.is_closed()
    }

    // =========================================================================
    // Session Commands
    // =========================================================================

    /// Select the namespace and database to use
    pub fn use_ns(&self, ctx: &Context, namespace: &str, database: &str) -> Result<Value> {
        self.raw(ctx, Method::Use, vec![namespace.into(), database.into()])
    }

    /// Information about the authenticated session
    pub fn info(&self, ctx: &Context) -> Result<Value> {
        self.raw(ctx, Method::Info, Vec::new())
    }

    /// Sign up a new scope user; returns the session token
    pub fn signup<V: Serialize>(&self, ctx: &Context, vars: &V) -> Result<Value> {
        self.raw(ctx, Method::Signup, vec![serde_json::to_value(vars)?])
    }

    /// Sign in; returns the session token
    pub fn signin(&self, ctx: &Context, credentials: &Credentials) -> Result<Value> {
        self.raw(ctx, Method::Signin, vec![serde_json::to_value(credentials)?])
    }

    pub fn invalidate(&self, ctx: &Context) -> Result<Value> {
        self.raw(ctx, Method::Invalidate, Vec::new())
    }

    pub fn authenticate(&self, ctx: &Context, token: &str) -> Result<Value> {
        self.raw(ctx, Method::Authenticate, vec![token.into()])
    }

    /// Start a live query on `table`; returns its id
    pub fn live(&self, ctx: &Context, table: &str) -> Result<Value> {
        self.raw(ctx, Method::Live, vec![table.into()])
    }

    /// Stop a live query
    pub fn kill(&self, ctx: &Context, query_id: &str) -> Result<Value> {
        self.raw(ctx, Method::Kill, vec![query_id.into()])
    }

    /// Define a session variable
    pub fn let_var<V: Serialize>(&self, ctx: &Context, key: &str, value: &V) -> Result<Value> {
        self.raw(ctx, Method::Let, vec![key.into(), serde_json::to_value(value)?])
    }

    // =========================================================================
    // Data Commands
    // =========================================================================

    /// Run one or more statements
    pub fn query<V: Serialize>(&self, ctx: &Context, sql: &str, vars: &V) -> Result<QueryResponse> {
        self.call(ctx, Method::Query, vec![sql.into(), serde_json::to_value(vars)?])?
            .into_query()
    }

    /// Select a table (`users`) or a record (`users:42`)
    pub fn select(&self, ctx: &Context, thing: &str) -> Result<Records> {
        self.call(ctx, Method::Select, vec![thing.into()])?
            .into_records()
    }

    pub fn create<D: Serialize>(&self, ctx: &Context, thing: &str, data: &D) -> Result<Records> {
        self.call(ctx, Method::Create, vec![thing.into(), serde_json::to_value(data)?])?
            .into_records()
    }

    /// Replace a table's or record's content
    pub fn update<D: Serialize>(&self, ctx: &Context, thing: &str, data: &D) -> Result<Records> {
        self.call(ctx, Method::Update, vec![thing.into(), serde_json::to_value(data)?])?
            .into_records()
    }

    /// Merge `data` into a table's or record's content
    pub fn change<D: Serialize>(&self, ctx: &Context, thing: &str, data: &D) -> Result<Records> {
        self.call(ctx, Method::Change, vec![thing.into(), serde_json::to_value(data)?])?
            .into_records()
    }

    /// Apply JSON patches to a table or record
    pub fn modify(&self, ctx: &Context, thing: &str, patches: &[Patch]) -> Result<Records> {
        self.call(ctx, Method::Modify, vec![thing.into(), serde_json::to_value(patches)?])?
            .into_records()
    }

    pub fn delete(&self, ctx: &Context, thing: &str) -> Result<()> {
        self.call(ctx, Method::Delete, vec![thing.into()])?;
        Ok(())
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Receive every reply pushed under `id` until [`Client::unsubscribe`]
    pub fn subscribe(&self, id: &str) -> Receiver<ResponseEnvelope> {
        self.registry.register_subscription(CallId::from(id))
    }

    pub fn unsubscribe(&self, id: &str) -> bool {
        self.registry.unsubscribe(&CallId::from(id))
    }

    // =========================================================================
    // Core
    // =========================================================================

    /// Issue `method` and classify its payload
    pub fn call(&self, ctx: &Context, method: Method, params: Vec<Value>) -> Result<Decoded> {
        let thing = params.first().and_then(Value::as_str).map(str::to_owned);
        let payload = self.send(ctx, method, params)?;
        decode(method, thing.as_deref(), payload)
    }

    fn raw(&self, ctx: &Context, method: Method, params: Vec<Value>) -> Result<Value> {
        self.call(ctx, method, params)?.into_raw()
    }

    /// Issue `method` and wait for its correlated payload
    fn send(&self, ctx: &Context, method: Method, params: Vec<Value>) -> Result<Value> {
        if ctx.is_cancelled() {
            return Err(DriverError::Cancelled);
        }

        let deadline = ctx
            .deadline_at()
            .unwrap_or_else(|| Instant::now() + self.config.request_timeout);
        if deadline <= Instant::now() {
            return Err(DriverError::Timeout);
        }

        // Encoding and size failures belong to this call alone
        let request = Request::new(self.ids.next_id(), method, params);
        let message = encode_request(&request)?;
        if message.len() > self.config.max_message_size {
            return Err(DriverError::FrameTooLarge {
                size: message.len(),
                max: self.config.max_message_size,
            });
        }

        let waiter = self.registry.register_once(request.id.clone(), Some(deadline));
        self.pump.submit(request.id, message)?;

        let never = channel::never();
        let cancelled = ctx.token().map(CancelToken::signal).unwrap_or(&never);
        let expired = channel::at(deadline);

        let envelope = select! {
            // Disconnected only when the sweep evicted the waiter
            recv(waiter) -> envelope => envelope.map_err(|_| DriverError::Timeout)?,
            recv(cancelled) -> _ => return Err(DriverError::Cancelled),
            recv(expired) -> _ => return Err(DriverError::Timeout),
        };

        match envelope.payload {
            Payload::Result(value) => Ok(value),
            Payload::Error(err) => Err(DriverError::Remote {
                code: err.code,
                message: err.message,
            }),
            Payload::Malformed(reason) => Err(DriverError::Protocol(reason)),
        }
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
