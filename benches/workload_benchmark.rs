use criterion::BatchSize;
use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::{criterion_group, criterion_main};
use imvbenchlib::workload::objects::{
    MatchBudget, SelectEntry, Statement, TableName, WriteEntry,
};
use imvbenchlib::workload::Matcher;
use std::collections::HashSet;

const TABLES: [&str; 8] = [
    "orders", "lineitem", "customer", "part", "supplier", "partsupp", "nation", "region",
];

fn build_workload(write_count: usize, select_count: usize) -> (Vec<SelectEntry>, Vec<WriteEntry>) {
    let writes: Vec<WriteEntry> = (0..write_count)
        .map(|idx| {
            let table = TABLES[idx % TABLES.len()];
            let statement =
                Statement::new(format!("INSERT INTO {} VALUES ({})", table, idx), idx);
            WriteEntry::new(statement, TableName::normalize(table))
        })
        .collect();

    let selects: Vec<SelectEntry> = (0..select_count)
        .map(|idx| {
            let tables: HashSet<TableName> = [
                TableName::normalize(TABLES[idx % TABLES.len()]),
                TableName::normalize(TABLES[(idx + 3) % TABLES.len()]),
            ]
            .iter()
            .cloned()
            .collect();
            let statement = Statement::new(
                format!("SELECT count(*) FROM {}", TABLES[idx % TABLES.len()]),
                idx,
            );
            SelectEntry::new(statement, tables)
        })
        .collect();

    (selects, writes)
}

fn matcher_mass_match(c: &mut Criterion) {
    let write_count: usize = 10_000;

    c.bench_with_input(
        BenchmarkId::new("matcher_mass_match", write_count),
        &write_count,
        |b, &write_count| {
            b.iter_batched(
                || build_workload(write_count, 1_000),
                |(selects, writes)| {
                    Matcher::new(MatchBudget::new(16, 8, 50_000)).match_workload(selects, writes)
                },
                BatchSize::SmallInput,
            );
        },
    );
}

criterion_group!(benches, matcher_mass_match);
criterion_main!(benches);
