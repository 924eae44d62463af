//! Protocol Module
//!
//! Defines the JSON RPC envelopes exchanged with the remote database.
//!
//! ## Request Format
//! ```text
//! { "id": "<call id>", "method": "<method>", "params": [ ... ] }
//! ```
//!
//! ## Response Format
//! ```text
//! { "id": "<call id>", "result": <payload> }
//! { "id": "<call id>", "error": { "code": <int>, "message": "<text>" } }
//! ```
//!
//! ## Multi-statement Payload (`query`)
//! ```text
//! [ { "status": "OK", "result": [ ... ], "time": "1.2ms" }, ... ]
//! ```

mod method;
mod request;
mod response;
mod codec;

pub use method::Method;
pub use request::{CallId, IdGenerator, Request};
pub use response::{Payload, RemoteError, ResponseEnvelope};
pub use codec::{
    decode_frame, decode_request, decode_response, encode_frame, encode_request,
    encode_response, read_frame, write_frame, FrameKind, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
