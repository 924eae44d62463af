//! Shared test helpers
//!
//! A tiny in-memory document store served over a [`MemoryPeer`], enough
//! to drive the client end-to-end without a real server.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde_json::{json, Map, Value};
use surrealrpc::network::memory::{self, MemoryPeer};
use surrealrpc::network::PeerFrame;
use surrealrpc::protocol::{Method, Request, ResponseEnvelope};
use surrealrpc::{Client, Config, DriverError};

/// Config with short timings so failing tests fail fast
pub fn test_config() -> Config {
    Config::builder()
        .request_timeout(Duration::from_secs(5))
        .sweep_interval(Duration::from_millis(20))
        .build()
}

/// Client connected to a raw peer the test scripts by hand
pub fn client_with_peer() -> (Client, MemoryPeer) {
    let (transport, peer) = memory::pair();
    let client = Client::with_transport(transport, test_config()).unwrap();
    (client, peer)
}

/// Client connected to a running [`FakeServer`]
pub fn client_with_server() -> (Client, FakeServer) {
    let (transport, peer) = memory::pair();
    let client = Client::with_transport(transport, test_config()).unwrap();
    (client, FakeServer::spawn(peer))
}

// =============================================================================
// Fake Server
// =============================================================================

type Tables = BTreeMap<String, BTreeMap<String, Value>>;

/// Serves requests from a background thread until stopped
pub struct FakeServer {
    stop: Arc<AtomicBool>,
    close_frames: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl FakeServer {
    pub fn spawn(peer: MemoryPeer) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let close_frames = Arc::new(AtomicBool::new(false));

        let stop_flag = Arc::clone(&stop);
        let close_flag = Arc::clone(&close_frames);
        let handle = thread::spawn(move || {
            let mut tables = Tables::new();
            let mut next_id = 0u64;

            while !stop_flag.load(Ordering::SeqCst) {
                let request = match peer.recv(Duration::from_millis(20)) {
                    Ok(PeerFrame::Request(request)) => request,
                    Ok(PeerFrame::Close) => {
                        close_flag.store(true, Ordering::SeqCst);
                        continue;
                    }
                    Err(DriverError::Timeout) => continue,
                    Err(_) => break,
                };

                let reply = handle_request(&mut tables, &mut next_id, &request);
                if peer.reply(&reply).is_err() {
                    break;
                }
            }
        });

        Self {
            stop,
            close_frames,
            handle: Some(handle),
        }
    }

    /// Whether the client sent a close frame
    pub fn saw_close(&self) -> bool {
        self.close_frames.load(Ordering::SeqCst)
    }
}

impl Drop for FakeServer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn handle_request(tables: &mut Tables, next_id: &mut u64, request: &Request) -> ResponseEnvelope {
    let id = request.id.clone();
    let thing = request.thing().unwrap_or_default().to_string();
    let data = request.params.get(1).cloned().unwrap_or(Value::Null);

    match request.method {
        Method::Use | Method::Let | Method::Invalidate | Method::Kill => {
            ResponseEnvelope::result(id, Value::Null)
        }
        Method::Signin | Method::Signup | Method::Authenticate => {
            ResponseEnvelope::result(id, json!("session-token"))
        }
        Method::Info => ResponseEnvelope::result(id, json!({ "user": "root" })),
        Method::Live => ResponseEnvelope::result(id, json!("live-0001")),
        Method::Create | Method::Update | Method::Change => {
            let (table, record_id) = match thing.split_once(':') {
                Some((table, record_id)) => (table.to_string(), record_id.to_string()),
                None => {
                    *next_id += 1;
                    (thing.clone(), format!("{}", next_id))
                }
            };
            let full_id = format!("{}:{}", table, record_id);

            let mut record = match (request.method, tables.get(&table).and_then(|t| t.get(&full_id))) {
                (Method::Change, Some(Value::Object(existing))) => existing.clone(),
                _ => Map::new(),
            };
            if let Value::Object(fields) = data {
                record.extend(fields);
            }
            record.insert("id".to_string(), json!(full_id));

            let record = Value::Object(record);
            tables
                .entry(table)
                .or_default()
                .insert(full_id, record.clone());
            ResponseEnvelope::result(id, json!([record]))
        }
        Method::Select => ResponseEnvelope::result(id, Value::Array(select(tables, &thing))),
        Method::Modify => ResponseEnvelope::result(id, Value::Array(select(tables, &thing))),
        Method::Delete => {
            match thing.split_once(':') {
                Some((table, _)) => {
                    if let Some(records) = tables.get_mut(table) {
                        records.remove(&thing);
                    }
                }
                None => {
                    tables.remove(&thing);
                }
            }
            ResponseEnvelope::result(id, Value::Null)
        }
        Method::Query => ResponseEnvelope::result(id, run_query(tables, &thing)),
    }
}

fn select(tables: &Tables, thing: &str) -> Vec<Value> {
    match thing.split_once(':') {
        Some((table, _)) => tables
            .get(table)
            .and_then(|records| records.get(thing))
            .cloned()
            .into_iter()
            .collect(),
        None => tables
            .get(thing)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default(),
    }
}

/// Understands `SELECT * FROM <thing>` and `THROW <message>`, separated by `;`
fn run_query(tables: &Tables, sql: &str) -> Value {
    let statements = sql
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|statement| {
            let lower = statement.to_lowercase();
            if let Some(thing) = lower.strip_prefix("select * from ") {
                json!({ "status": "OK", "time": "1ms", "result": select(tables, thing.trim()) })
            } else if let Some(message) = statement.strip_prefix("THROW ") {
                json!({ "status": "ERR", "time": "1ms", "result": message })
            } else {
                json!({ "status": "ERR", "time": "1ms", "result": "Parse error" })
            }
        })
        .collect();

    Value::Array(statements)
}
