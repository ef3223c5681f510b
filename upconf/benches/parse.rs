use criterion::{black_box, criterion_group, criterion_main, Criterion};
use upconf::{dump_config, parse, Style};

const FULL_CONF: &str = include_str!("nginx.conf");

fn bench_parse_full_example(c: &mut Criterion) {
    c.bench_function("parse full example", |b| {
        b.iter(|| parse(black_box(FULL_CONF)).unwrap())
    });
}

fn bench_dump_full_example(c: &mut Criterion) {
    let config = parse(FULL_CONF).unwrap();
    c.bench_function("dump full example", |b| {
        b.iter(|| dump_config(black_box(&config), &Style::indented()))
    });
}

criterion_group!(benches, bench_parse_full_example, bench_dump_full_example);
criterion_main!(benches);
