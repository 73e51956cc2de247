//! Benchmarks for the hot paths: record creation, identity lookup, and
//! full-store query scans.

use criterion::{criterion_group, criterion_main, Criterion};
use relata::prelude::*;
use std::hint::black_box;

fn seeded_db(records: usize) -> (Database, Model) {
    let db = Database::new();
    let posts = db
        .define(
            ModelDef::builder("Post")
                .attribute("title")
                .attribute("likes")
                .build(),
        )
        .unwrap();
    for i in 0..records {
        posts
            .create(attrs! { "title" => format!("post-{i}"), "likes" => (i % 10) as i64 })
            .unwrap();
    }
    (db, posts)
}

fn bench_create(c: &mut Criterion) {
    c.bench_function("create_1000_records", |b| {
        b.iter(|| {
            let (_db, posts) = seeded_db(1000);
            black_box(posts.count())
        })
    });
}

fn bench_find(c: &mut Criterion) {
    let (_db, posts) = seeded_db(1000);
    let id = posts.last().unwrap().id();
    c.bench_function("find_by_id", |b| {
        b.iter(|| black_box(posts.find(black_box(id))))
    });
}

fn bench_query_scan(c: &mut Criterion) {
    let (_db, posts) = seeded_db(1000);
    let query = posts.filter(Filters::new().eq("likes", 7i64));
    c.bench_function("scan_1000_records", |b| {
        b.iter(|| black_box(query.count()))
    });
}

criterion_group!(benches, bench_create, bench_find, bench_query_scan);
criterion_main!(benches);
