use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tabula::prelude::*;
use tabula::{ColumnDef, Parameter, PlaceholderStyle, Sql, TableDef};

/// SELECT col0, col1, ... FROM t WHERE col0 = @col0 AND col1 = @col1 ...
fn build_select_sql(n: usize) -> Sql {
    let columns: Vec<String> = (0..n).map(|i| format!("col{i}")).collect();
    let mut sql = Sql::new(format!("SELECT {} FROM t WHERE ", columns.join(", ")));
    let terms = columns.iter().enumerate().map(|(i, c)| {
        let mut term = Sql::new(format!("{c} = "));
        term.push_sql(Sql::param(Parameter::new(c.clone(), i as i64)));
        term
    });
    sql.push_sql(Sql::join(terms, " AND "));
    sql
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/render");

    for style in [PlaceholderStyle::Numbered, PlaceholderStyle::Named, PlaceholderStyle::Positional] {
        for n in [1, 10, 100] {
            let sql = build_select_sql(n);
            group.bench_with_input(BenchmarkId::new(format!("{style:?}"), n), &sql, |b, sql| {
                b.iter(|| black_box(sql.render(style)));
            });
        }
    }

    group.finish();
}

fn wide_table(columns: usize) -> DataSource {
    let mut table = TableDef::table("Wide").column(ColumnDef::new("Id", "int").primary_key().identity());
    for i in 0..columns {
        table = table.column(ColumnDef::new(format!("Col{i}"), "nvarchar").nullable());
    }
    let snapshot = SchemaSnapshot::new().table(table);
    DataSource::new(Arc::new(SchemaCache::new(
        Arc::new(SqlServerDialect),
        Arc::new(snapshot),
    )))
}

fn record(columns: usize, row: usize) -> Record {
    (0..columns)
        .map(|i| (format!("Col{i}"), format!("r{row}c{i}")))
        .collect()
}

fn bench_object_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/object_update");

    for n in [5, 20, 100] {
        let ds = wide_table(n);
        let row = record(n, 0).with("Id", 1);
        group.bench_with_input(BenchmarkId::from_parameter(n), &row, |b, row| {
            b.iter(|| {
                let cmd = ds.update("Wide", row.clone()).unwrap();
                black_box(cmd.prepare(&DesiredColumns::NoColumns).unwrap());
            });
        });
    }

    group.finish();
}

fn bench_batch_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/batch_insert");
    group.sample_size(20);

    let ds = wide_table(3);
    for rows in [100, 1000, 5000] {
        let batch: Vec<Record> = (0..rows).map(|r| record(3, r)).collect();
        group.bench_with_input(BenchmarkId::from_parameter(rows), &batch, |b, batch| {
            b.iter(|| {
                let cmd = ds.insert_batch("Wide", batch.clone()).unwrap();
                black_box(cmd.statements().unwrap());
            });
        });
    }

    group.finish();
}

fn bench_paged_query(c: &mut Criterion) {
    let ds = wide_table(20);
    let filter = record(5, 0);

    c.bench_function("sql_builder/paged_query", |b| {
        b.iter(|| {
            let stmt = ds
                .from("Wide")
                .unwrap()
                .with_filter(filter.clone())
                .with_sorting([SortExpression::desc("Col1")])
                .with_limits(Limit::rows(50).skip(100))
                .prepare(&DesiredColumns::AllColumns)
                .unwrap();
            black_box(stmt);
        });
    });
}

criterion_group!(
    benches,
    bench_render,
    bench_object_update,
    bench_batch_insert,
    bench_paged_query
);
criterion_main!(benches);
