//! Benchmarks for reply decoding and correlation

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde::Deserialize;
use serde_json::{json, Value};
use surrealrpc::protocol::{decode_response, CallId, ResponseEnvelope};
use surrealrpc::registry::Registry;
use surrealrpc::{QueryResponse, Records};

#[derive(Deserialize)]
#[allow(dead_code)]
struct Row {
    id: String,
    name: String,
    age: u32,
}

fn rows(n: usize) -> Value {
    Value::Array(
        (0..n)
            .map(|i| json!({ "id": format!("users:{}", i), "name": "someone", "age": i }))
            .collect(),
    )
}

fn decoder_benchmarks(c: &mut Criterion) {
    let reply = serde_json::to_vec(&json!({ "id": "bench-1", "result": rows(100) })).unwrap_or_default();
    c.bench_function("decode_response_100_rows", |b| {
        b.iter(|| decode_response(black_box(&reply)))
    });

    let payload = rows(100);
    c.bench_function("records_list_100_rows", |b| {
        b.iter(|| {
            let records = Records::from_payload(Some("users"), black_box(payload.clone()));
            records.and_then(|r| r.list::<Row>())
        })
    });

    let query = json!([
        { "status": "OK", "time": "1ms", "result": rows(10) },
        { "status": "OK", "time": "1ms", "result": rows(10) },
        { "status": "OK", "time": "1ms", "result": rows(10) },
    ]);
    c.bench_function("query_three_statements", |b| {
        b.iter(|| QueryResponse::from_payload(black_box(query.clone())))
    });
}

fn registry_benchmarks(c: &mut Criterion) {
    let registry = Registry::new();
    let mut n = 0u64;

    c.bench_function("register_and_dispatch", |b| {
        b.iter(|| {
            n += 1;
            let id = CallId::new(format!("call-{}", n));
            let rx = registry.register_once(id.clone(), None);
            registry.dispatch(ResponseEnvelope::result(id, Value::Null));
            rx.try_recv().is_ok()
        })
    });
}

criterion_group!(benches, decoder_benchmarks, registry_benchmarks);
criterion_main!(benches);
