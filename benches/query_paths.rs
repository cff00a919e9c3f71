//! Query Path Benchmarks
//!
//! Native index scans against the in-memory evaluator on the same queries,
//! plus the cost of header ingestion with eviction.
//!
//! ## Running
//!
//! ```bash
//! cargo bench --bench query_paths
//! ```

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use meshstore::{
    FilterKind, MeshStore, MiniHeader, Order, OrderField, Query, SortDirection, StoreConfig,
};
use meshstore_engine::{execute, execute_in_memory};
use meshstore_storage::Table;
use std::time::Duration;

// =============================================================================
// Test Utilities
// =============================================================================

fn make_order(i: u64) -> Order {
    Order {
        hash: format!("0x{:064x}", i.wrapping_mul(0x9e37_79b9_7f4a_7c15)),
        chain_id: 1337,
        maker_address: format!("0x{:040x}", i % 97),
        fillable_taker_asset_amount: (i % 1000).to_string(),
        salt: i.to_string(),
        last_updated: Utc.timestamp_opt(1_600_000_000 + (i % 3600) as i64, 0).unwrap(),
        is_removed: i % 10 == 0,
        ..Default::default()
    }
}

fn make_header(number: u64) -> MiniHeader {
    MiniHeader {
        hash: format!("0x{:064x}", number),
        parent: format!("0x{:064x}", number.saturating_sub(1)),
        number,
        timestamp: Utc.timestamp_opt(1_600_000_000 + number as i64 * 13, 0).unwrap(),
        logs: serde_json::json!([]),
    }
}

fn populated_table(rows: u64) -> Table<Order> {
    Table::from_rows((0..rows).map(make_order))
}

// =============================================================================
// Native vs In-Memory
// =============================================================================

fn query_path_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_paths");

    let queries: Vec<(&str, Query<OrderField>)> = vec![
        (
            "equal_filter",
            Query::new().filter(OrderField::MakerAddress, FilterKind::Equal, format!("0x{:040x}", 42)),
        ),
        (
            "range_sorted_page",
            Query::new()
                .filter(OrderField::LastUpdated, FilterKind::GreaterOrEqual, Utc.timestamp_opt(1_600_003_000, 0).unwrap())
                .sort(OrderField::LastUpdated, SortDirection::Desc)
                .limit(50),
        ),
        (
            "sorted_page",
            Query::new()
                .sort(OrderField::FillableTakerAssetAmount, SortDirection::Asc)
                .offset(100)
                .limit(20),
        ),
    ];

    for rows in [1_000u64, 10_000] {
        let table = populated_table(rows);
        group.throughput(Throughput::Elements(rows));

        for (name, query) in &queries {
            group.bench_with_input(
                BenchmarkId::new(format!("native/{}", name), rows),
                query,
                |b, query| {
                    b.iter(|| table.read(|state| black_box(execute(state, query).unwrap())));
                },
            );
            group.bench_with_input(
                BenchmarkId::new(format!("in_memory/{}", name), rows),
                query,
                |b, query| {
                    b.iter(|| {
                        table.read(|state| black_box(execute_in_memory(state, query).unwrap()))
                    });
                },
            );
        }
    }

    group.finish();
}

// =============================================================================
// Header Ingestion
// =============================================================================

fn header_ingest_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("mini_header_add");
    group.throughput(Throughput::Elements(1));

    for max in [20usize, 200] {
        group.bench_with_input(BenchmarkId::new("with_eviction", max), &max, |b, &max| {
            let store = MeshStore::open(StoreConfig::new().max_mini_headers(max)).unwrap();
            let mut next = 0u64;
            b.iter(|| {
                next += 1;
                black_box(store.mini_headers.add(vec![make_header(next)]).unwrap());
            });
        });
    }

    group.finish();
}

criterion_group!(
    name = queries;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(5))
        .sample_size(20);
    targets = query_path_benchmarks
);

criterion_group!(ingest, header_ingest_benchmarks);

criterion_main!(queries, ingest);
