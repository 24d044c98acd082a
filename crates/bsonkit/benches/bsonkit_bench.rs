use bsonkit::{pretty, to_relaxed_json, DocumentBuilder, Element, RawDocument};
use bytes::Bytes;
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

fn sample_document() -> Bytes {
    let mut inner = DocumentBuilder::new();
    inner
        .append(Element::string("street", "123 Main St"))
        .unwrap()
        .append(Element::string("city", "Tokyo"))
        .unwrap();
    let inner = inner.finish();

    let mut doc = DocumentBuilder::new();
    doc.append(Element::string("name", "Miku"))
        .unwrap()
        .append(Element::int64("age", 16))
        .unwrap()
        .append(Element::boolean("active", true))
        .unwrap()
        .append(Element::double("score", 99.5))
        .unwrap()
        .append(Element::document("address", RawDocument::new(&inner).unwrap()))
        .unwrap();
    doc.finish()
}

fn bench_document_build(c: &mut Criterion) {
    c.bench_function("document_build", |b| {
        b.iter(|| {
            let mut doc = DocumentBuilder::new();
            doc.append(Element::string("name", "Miku")).unwrap();
            doc.append(Element::int64("age", 16)).unwrap();
            doc.append(Element::string("version", "v3")).unwrap();
            doc.finish()
        })
    });
}

fn bench_lazy_iterate(c: &mut Criterion) {
    let bytes = sample_document();
    let doc = RawDocument::new(&bytes).unwrap();

    c.bench_function("lazy_iterate", |b| {
        b.iter(|| {
            for element in black_box(doc).iter() {
                black_box(element.unwrap());
            }
        })
    });
}

fn bench_lookup(c: &mut Criterion) {
    let bytes = sample_document();
    let doc = RawDocument::new(&bytes).unwrap();

    c.bench_function("lookup_last_field", |b| {
        b.iter(|| black_box(doc).get("address").unwrap())
    });
}

fn bench_pretty(c: &mut Criterion) {
    let bytes = sample_document();
    let doc = RawDocument::new(&bytes).unwrap();

    c.bench_function("pretty", |b| b.iter(|| pretty(black_box(doc)).unwrap()));
}

fn bench_relaxed_json(c: &mut Criterion) {
    let bytes = sample_document();
    let doc = RawDocument::new(&bytes).unwrap();

    c.bench_function("relaxed_json", |b| {
        b.iter(|| to_relaxed_json(black_box(doc)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_document_build,
    bench_lazy_iterate,
    bench_lookup,
    bench_pretty,
    bench_relaxed_json,
);

criterion_main!(benches);
