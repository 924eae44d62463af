//! Integration tests for the TCP transport
//!
//! A loopback server speaks the framed protocol on a background thread.

use std::io::{BufReader, BufWriter};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde_json::json;
use surrealrpc::protocol::{
    decode_request, encode_response, read_frame, write_frame, FrameKind, Method,
    ResponseEnvelope, MAX_PAYLOAD_SIZE,
};
use surrealrpc::{Client, Config, Context, DriverError};

/// Accept one connection and answer `info` and `select` until the client
/// closes; after `replies` answers, send a close frame instead
fn spawn_server(replies: usize) -> (String, JoinHandle<bool>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        serve(stream, replies)
    });

    (addr, handle)
}

/// Returns whether the client sent a close frame
fn serve(stream: TcpStream, replies: usize) -> bool {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut writer = BufWriter::new(stream);
    let mut answered = 0;

    loop {
        let (kind, payload) = match read_frame(&mut reader, MAX_PAYLOAD_SIZE) {
            Ok(frame) => frame,
            Err(_) => return false,
        };
        if kind == FrameKind::Close {
            return true;
        }

        if answered == replies {
            let _ = write_frame(&mut writer, FrameKind::Close, &[]);
            return false;
        }

        let request = decode_request(&payload).unwrap();
        let reply = match request.method {
            Method::Info => ResponseEnvelope::result(request.id, json!({ "user": "root" })),
            Method::Select => ResponseEnvelope::result(
                request.id,
                json!([{ "id": request.params[0] }]),
            ),
            _ => ResponseEnvelope::error(request.id, -32601, "Method not found"),
        };
        write_frame(&mut writer, FrameKind::Text, &encode_response(&reply).unwrap()).unwrap();
        answered += 1;
    }
}

fn connect(addr: &str) -> Client {
    let config = Config::builder()
        .server_addr(addr)
        .request_timeout(Duration::from_secs(5))
        .sweep_interval(Duration::from_millis(20))
        .build();
    Client::connect(config).unwrap()
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn test_calls_over_tcp() {
    let (addr, server) = spawn_server(usize::MAX);
    let client = connect(&addr);
    let ctx = Context::background();

    assert_eq!(client.info(&ctx).unwrap(), json!({ "user": "root" }));

    let record: Option<serde_json::Value> = client.select(&ctx, "users:1").unwrap().one().unwrap();
    assert_eq!(record, Some(json!({ "id": "users:1" })));

    let result = client.live(&ctx, "users");
    assert!(matches!(result, Err(DriverError::Remote { code: -32601, .. })));

    client.close().unwrap();
    assert!(server.join().unwrap());
}

#[test]
fn test_server_close_frame_closes_client() {
    let (addr, server) = spawn_server(1);
    let client = connect(&addr);
    let ctx = Context::background();

    client.info(&ctx).unwrap();

    // The server answers this one with a close frame
    let result = client.info(&Context::with_timeout(Duration::from_millis(500)));
    assert!(result.is_err());

    let deadline = Instant::now() + Duration::from_secs(2);
    while !client.is_closed() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert!(client.is_closed());
    assert!(!server.join().unwrap());

    let result = client.info(&ctx);
    assert!(matches!(result, Err(DriverError::ConnectionClosed)));
}

#[test]
fn test_oversized_request_keeps_connection() {
    let (addr, server) = spawn_server(usize::MAX);
    let config = Config::builder()
        .server_addr(&addr)
        .max_message_size(256)
        .request_timeout(Duration::from_secs(5))
        .sweep_interval(Duration::from_millis(20))
        .build();
    let client = Client::connect(config).unwrap();
    let ctx = Context::background();

    let started = Instant::now();
    let blob = "x".repeat(1024);
    let result = client.create(&ctx, "users:1", &json!({ "blob": blob }));

    assert!(matches!(
        result,
        Err(DriverError::FrameTooLarge { max: 256, .. })
    ));
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(!client.is_closed());

    assert_eq!(client.info(&ctx).unwrap(), json!({ "user": "root" }));

    client.close().unwrap();
    assert!(server.join().unwrap());
}

#[test]
fn test_connect_refused() {
    // Bind then drop to find a port nobody listens on
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().to_string()
    };

    let config = Config::builder().server_addr(addr).build();
    let result = Client::connect(config);
    assert!(matches!(result, Err(ref e) if e.is_transport()));
}
