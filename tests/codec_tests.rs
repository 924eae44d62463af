//! Tests for the Protocol codec
//!
//! These tests verify:
//! - Request envelopes are plain JSON with no HTML escaping
//! - Replies that cannot be attributed are rejected
//! - Attributable replies with invalid bodies decode to Malformed
//! - Frame encoding, size limits and stream I/O

use std::io::Cursor;

use serde_json::{json, Value};
use surrealrpc::protocol::{
    decode_frame, decode_request, decode_response, encode_frame, encode_request,
    encode_response, read_frame, write_frame, CallId, FrameKind, Method, Payload, RemoteError,
    Request, ResponseEnvelope, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
use surrealrpc::{Config, DriverError};

// =============================================================================
// Request Encoding
// =============================================================================

#[test]
fn test_request_wire_shape() {
    let request = Request::new(
        CallId::from("abc-1"),
        Method::Select,
        vec![json!("users:42")],
    );

    let bytes = encode_request(&request).unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(
        value,
        json!({ "id": "abc-1", "method": "select", "params": ["users:42"] })
    );
}

#[test]
fn test_request_does_not_escape_html() {
    let request = Request::new(
        CallId::from("q"),
        Method::Query,
        vec![json!("SELECT * FROM users WHERE age > 3 && age < 9"), json!({})],
    );

    let bytes = encode_request(&request).unwrap();
    let text = std::str::from_utf8(&bytes).unwrap();

    assert!(text.contains("age > 3 && age < 9"));
    assert!(!text.contains("\\u003c"));
    assert!(!text.contains("\\u0026"));
}

#[test]
fn test_request_survives_decode() {
    let request = Request::new(
        CallId::from("r"),
        Method::Change,
        vec![json!("users:1"), json!({ "name": "ann" })],
    );

    let decoded = decode_request(&encode_request(&request).unwrap()).unwrap();
    assert_eq!(decoded, request);
    assert_eq!(decoded.thing(), Some("users:1"));
}

#[test]
fn test_decode_request_rejects_garbage() {
    let result = decode_request(b"{\"id\":\"x\"}");
    assert!(matches!(result, Err(DriverError::Protocol(_))));
}

// =============================================================================
// Response Decoding
// =============================================================================

#[test]
fn test_decode_result_response() {
    let envelope = decode_response(br#"{"id":"a","result":[{"id":"users:1"}]}"#).unwrap();

    assert_eq!(envelope.id, CallId::from("a"));
    assert_eq!(envelope.payload, Payload::Result(json!([{ "id": "users:1" }])));
    assert!(!envelope.is_error());
}

#[test]
fn test_decode_null_result_is_a_result() {
    let envelope = decode_response(br#"{"id":"a","result":null}"#).unwrap();
    assert_eq!(envelope.payload, Payload::Result(Value::Null));
}

#[test]
fn test_decode_error_response() {
    let envelope =
        decode_response(br#"{"id":"a","error":{"code":-32000,"message":"There was a problem"}}"#)
            .unwrap();

    assert_eq!(
        envelope.payload,
        Payload::Error(RemoteError {
            code: -32000,
            message: "There was a problem".to_string(),
        })
    );
    assert!(envelope.is_error());
}

#[test]
fn test_unattributable_responses_rejected() {
    let cases: [&[u8]; 4] = [
        b"not json",
        b"[1,2,3]",
        br#"{"result":1}"#,
        br#"{"id":7,"result":1}"#,
    ];

    for case in cases {
        let result = decode_response(case);
        assert!(
            matches!(result, Err(DriverError::Protocol(_))),
            "expected protocol error for {:?}",
            String::from_utf8_lossy(case)
        );
    }
}

#[test]
fn test_neither_result_nor_error_is_malformed() {
    let envelope = decode_response(br#"{"id":"a"}"#).unwrap();
    assert_eq!(envelope.id, CallId::from("a"));
    assert!(matches!(envelope.payload, Payload::Malformed(_)));
}

#[test]
fn test_both_result_and_error_is_malformed() {
    let envelope =
        decode_response(br#"{"id":"a","result":1,"error":{"code":1,"message":"x"}}"#).unwrap();
    assert!(matches!(envelope.payload, Payload::Malformed(_)));
}

#[test]
fn test_bad_error_descriptor_is_malformed() {
    let envelope = decode_response(br#"{"id":"a","error":"boom"}"#).unwrap();
    assert!(matches!(envelope.payload, Payload::Malformed(_)));
}

#[test]
fn test_encode_response_matches_decoder() {
    let ok = ResponseEnvelope::result("a", json!({ "x": 1 }));
    let err = ResponseEnvelope::error("b", 400, "bad");

    assert_eq!(decode_response(&encode_response(&ok).unwrap()).unwrap(), ok);
    assert_eq!(decode_response(&encode_response(&err).unwrap()).unwrap(), err);
}

#[test]
fn test_encode_malformed_response_rejected() {
    let envelope = ResponseEnvelope {
        id: CallId::from("a"),
        payload: Payload::Malformed("bad".to_string()),
    };
    assert!(encode_response(&envelope).is_err());
}

// =============================================================================
// Frames
// =============================================================================

#[test]
fn test_frame_layout() {
    let frame = encode_frame(FrameKind::Text, b"{}");

    assert_eq!(frame.len(), HEADER_SIZE + 2);
    assert_eq!(frame[0], 0x01);
    assert_eq!(&frame[1..5], &2u32.to_be_bytes());
    assert_eq!(&frame[5..], b"{}");
}

#[test]
fn test_decode_frame() {
    let frame = encode_frame(FrameKind::Text, b"hello");
    let (kind, payload) = decode_frame(&frame, 1024).unwrap();

    assert_eq!(kind, FrameKind::Text);
    assert_eq!(&payload[..], b"hello");
}

#[test]
fn test_close_frame_is_empty() {
    let frame = encode_frame(FrameKind::Close, &[]);
    let (kind, payload) = decode_frame(&frame, 1024).unwrap();

    assert_eq!(kind, FrameKind::Close);
    assert!(payload.is_empty());
}

#[test]
fn test_decode_frame_too_large() {
    let frame = encode_frame(FrameKind::Text, &[b'x'; 64]);
    let result = decode_frame(&frame, 16);

    assert!(matches!(
        result,
        Err(DriverError::FrameTooLarge { size: 64, max: 16 })
    ));
}

#[test]
fn test_decode_frame_incomplete() {
    assert!(matches!(
        decode_frame(&[0x01, 0x00], 1024),
        Err(DriverError::Protocol(_))
    ));

    let frame = encode_frame(FrameKind::Text, b"hello");
    assert!(matches!(
        decode_frame(&frame[..frame.len() - 1], 1024),
        Err(DriverError::Protocol(_))
    ));
}

#[test]
fn test_decode_frame_unknown_opcode() {
    let mut frame = encode_frame(FrameKind::Text, b"x");
    frame[0] = 0x02;

    assert!(matches!(
        decode_frame(&frame, 1024),
        Err(DriverError::Protocol(_))
    ));
}

#[test]
fn test_frames_over_stream() {
    let mut buffer = Vec::new();
    write_frame(&mut buffer, FrameKind::Text, b"first").unwrap();
    write_frame(&mut buffer, FrameKind::Text, b"second").unwrap();
    write_frame(&mut buffer, FrameKind::Close, &[]).unwrap();

    let mut reader = Cursor::new(buffer);
    let (kind, payload) = read_frame(&mut reader, 1024).unwrap();
    assert_eq!((kind, &payload[..]), (FrameKind::Text, &b"first"[..]));

    let (kind, payload) = read_frame(&mut reader, 1024).unwrap();
    assert_eq!((kind, &payload[..]), (FrameKind::Text, &b"second"[..]));

    let (kind, _) = read_frame(&mut reader, 1024).unwrap();
    assert_eq!(kind, FrameKind::Close);

    // Stream exhausted
    assert!(matches!(
        read_frame(&mut reader, 1024),
        Err(DriverError::Io(_))
    ));
}

#[test]
fn test_read_frame_too_large() {
    let frame = encode_frame(FrameKind::Text, &[0u8; 32]);
    let mut reader = Cursor::new(frame);

    assert!(matches!(
        read_frame(&mut reader, 8),
        Err(DriverError::FrameTooLarge { size: 32, max: 8 })
    ));
}

#[test]
fn test_default_message_limit_matches_frame_limit() {
    assert_eq!(Config::default().max_message_size, MAX_PAYLOAD_SIZE);
}
