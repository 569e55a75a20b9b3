//! Performance benchmarks for the webhook hot path.
//!
//! Covers signature verification across body sizes and full dispatch of a
//! signed batch against an in-memory reply client.

use std::{hint::black_box, sync::Arc};

use bytes::Bytes;
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use tokio::runtime::Runtime;
use wordline_api::{
    dispatch::responses, Dispatcher, HandlerRegistry, InboundRequest, SignatureVerifier,
};
use wordline_testing::{sign, RecordingReplyClient, WebhookBuilder, TEST_CHANNEL_SECRET};

/// Benchmarks HMAC verification for different body sizes.
fn bench_signature_verification(c: &mut Criterion) {
    let verifier = SignatureVerifier::new(TEST_CHANNEL_SECRET).unwrap();

    let mut group = c.benchmark_group("signature");
    for size in [256usize, 4 * 1024, 64 * 1024, 1024 * 1024] {
        let body = Bytes::from(vec![b'x'; size]);
        let signature = sign(TEST_CHANNEL_SECRET, &body);

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("verify", size), &body, |b, body| {
            b.iter_batched(
                || InboundRequest::new(Some(&signature), body.clone()).unwrap(),
                |request| black_box(verifier.verify(request).is_ok()),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

/// Benchmarks verify, parse and dispatch of a signed batch.
fn bench_dispatch(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("dispatch");
    for events in [1usize, 10, 50] {
        let builder = (0..events).fold(WebhookBuilder::new(), |builder, i| {
            builder.text_message("Ubench", &format!("token-{i}"), "study")
        });
        let (body, signature) = builder.signed(TEST_CHANNEL_SECRET);

        group.throughput(Throughput::Elements(events as u64));
        group.bench_with_input(BenchmarkId::new("events", events), &body, |b, body| {
            b.iter_batched(
                || {
                    // Fresh client per iteration so reply tokens are unused.
                    let replies = Arc::new(RecordingReplyClient::new());
                    Dispatcher::new(
                        SignatureVerifier::new(TEST_CHANNEL_SECRET).unwrap(),
                        Arc::new(HandlerRegistry::standard(replies)),
                    )
                },
                |dispatcher| {
                    rt.block_on(async {
                        let report = dispatcher
                            .verify_and_dispatch(body.clone(), Some(&signature))
                            .await
                            .unwrap();
                        black_box(report.replied())
                    })
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

/// Benchmarks keyword matching on hits and misses.
fn bench_keyword_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("keywords");
    for input in ["  STUDY  ", "說明", "what is this bot about?"] {
        group.bench_with_input(BenchmarkId::new("reply_for", input), input, |b, input| {
            b.iter(|| black_box(responses::reply_for(black_box(input))));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_signature_verification, bench_dispatch, bench_keyword_lookup);
criterion_main!(benches);
