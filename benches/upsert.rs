use criterion::{Criterion, criterion_group, criterion_main};
use upsertlite::{BatchOptions, Connection, FieldOrder, Record, TableMeta, batch_upsert_with};

const BENCH_SCHEMA: &str = "CREATE TABLE data (id INTEGER PRIMARY KEY, a INTEGER, b TEXT, c REAL)";

/// Records per batch.
const RECORDS: i64 = 1_000;

fn setup() -> (Connection, TableMeta) {
    let conn = Connection::open_in_memory().unwrap();
    conn.exec(BENCH_SCHEMA).unwrap();
    let meta = upsertlite::load_table_meta(&conn, "data").unwrap();
    (conn, meta)
}

/// Every record has the same fields, so one statement serves the whole batch.
fn uniform() -> Vec<Record> {
    (0..RECORDS)
        .map(|i| {
            Record::new()
                .with("id", i)
                .with("a", i * 2)
                .with("b", format!("row {i}"))
                .with("c", i as f64 / 3.0)
        })
        .collect()
}

/// Records cycle through several field orders.
fn shuffled() -> Vec<Record> {
    (0..RECORDS)
        .map(|i| match i % 3 {
            0 => Record::new().with("id", i).with("a", i).with("b", "x"),
            1 => Record::new().with("b", "y").with("id", i).with("a", i),
            _ => Record::new().with("a", i).with("b", "z").with("id", i),
        })
        .collect()
}

fn run(records: &[Record], options: &BatchOptions, update: bool) {
    let (conn, meta) = setup();
    if update {
        batch_upsert_with(records, &conn, &meta, options).unwrap();
    }
    let summary = batch_upsert_with(records, &conn, &meta, options).unwrap();
    assert_eq!(summary.records, records.len());
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let uniform = uniform();
    let shuffled = shuffled();
    let preserve = BatchOptions::default();
    let canonical = BatchOptions::default().field_order(FieldOrder::Canonical);

    c.bench_function("upsert insert", |b| {
        b.iter(|| run(&uniform, &preserve, false))
    });
    c.bench_function("upsert update", |b| {
        b.iter(|| run(&uniform, &preserve, true))
    });
    c.bench_function("upsert shuffled preserve", |b| {
        b.iter(|| run(&shuffled, &preserve, false))
    });
    c.bench_function("upsert shuffled canonical", |b| {
        b.iter(|| run(&shuffled, &canonical, false))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
