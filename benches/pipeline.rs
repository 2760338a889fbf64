use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use placeholder_rs::config::Config;
use placeholder_rs::resolve::{parse_size, resolve, RawRequest};
use placeholder_rs::svg::render_svg;
use std::hint::black_box;

fn request(size: &str, positional: &[&str], text: Option<&str>) -> RawRequest {
    RawRequest {
        size: size.to_string(),
        positional: positional.iter().map(|s| s.to_string()).collect(),
        text: text.map(|s| s.to_string()),
        font: None,
    }
}

fn bench_parse_size(c: &mut Criterion) {
    let config = Config::default();
    let mut group = c.benchmark_group("parse_size");
    for token in ["400", "600x400", "300@2x", "600x400.png", "1920x1080@1.5x"] {
        group.bench_with_input(BenchmarkId::from_parameter(token), token, |b, token| {
            b.iter(|| parse_size(black_box(token), &config));
        });
    }
    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let config = Config::default();
    let mut group = c.benchmark_group("resolve");

    let plain = request("600x400", &[], None);
    group.bench_function("plain", |b| b.iter(|| resolve(black_box(&plain), &config)));

    let ladder = request("600x400", &["ff0000", "00ff00", "webp"], None);
    group.bench_function("full_ladder", |b| b.iter(|| resolve(black_box(&ladder), &config)));

    group.finish();
}

fn bench_render_svg(c: &mut Criterion) {
    let config = Config::default();
    let mut group = c.benchmark_group("render_svg");

    let single = resolve(&request("600x400", &[], None), &config);
    group.bench_function("single_line", |b| b.iter(|| render_svg(black_box(&single))));

    let multiline = resolve(
        &request("600x400", &[], Some("Line one\\nLine two\\nLine three")),
        &config,
    );
    group.bench_function("multi_line", |b| b.iter(|| render_svg(black_box(&multiline))));

    group.finish();
}

criterion_group!(benches, bench_parse_size, bench_resolve, bench_render_svg);
criterion_main!(benches);
