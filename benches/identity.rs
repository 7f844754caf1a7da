//! Benchmarks for identity building and batch merging
//!
//! This benchmark measures:
//! - User-Agent validation and formatting
//! - Merging queued query descriptors into one wire query

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use holowiki::identity::{build_identity, UserAgentOptions};
use holowiki::QueryRequest;

fn bench_build_identity(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_identity");

    let plain = UserAgentOptions::new("abot", "1.0.0");
    group.bench_function("no_contact", |b| {
        b.iter(|| build_identity(black_box(&plain)))
    });

    let listed = UserAgentOptions::new("ArchiveBot", "2.3.4-rc.1+build.7")
        .with_contact(vec!["https://example.com/archivebot", "ops@example.com"]);
    group.bench_function("contact_list", |b| {
        b.iter(|| build_identity(black_box(&listed)))
    });

    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");

    for size in [1usize, 10, 50] {
        let requests: Vec<QueryRequest> = (0..size)
            .map(|i| {
                QueryRequest::new()
                    .prop(["info", "categories"])
                    .titles([format!("Page {}", i)])
            })
            .collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &requests, |b, reqs| {
            b.iter(|| QueryRequest::merge(black_box(reqs.iter())).to_pairs())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_build_identity, bench_merge);
criterion_main!(benches);
