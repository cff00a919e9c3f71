//! End-to-end behavior of an opened store: the three collections, snapshot
//! persistence, and concurrent header ingestion.

use chrono::{TimeZone, Utc};
use meshstore::{
    Error, FilterKind, MeshStore, Metadata, MiniHeader, MiniHeaderField, Order, OrderField, Query,
    SortDirection, StoreConfig,
};
use meshstore_durability::SNAPSHOT_FILE_NAME;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn order(hash: &str, maker: &str, fillable: &str) -> Order {
    Order {
        hash: hash.to_string(),
        chain_id: 1337,
        maker_address: maker.to_string(),
        maker_asset_data: "0xf47261b0000000000000000000000000c778417e063141139fce010982780140aa0cd5ab"
            .to_string(),
        maker_asset_amount: "1000000000000000000".to_string(),
        fillable_taker_asset_amount: fillable.to_string(),
        expiration_time_seconds: "1700000000".to_string(),
        last_updated: Utc.timestamp_opt(1_600_000_000, 0).unwrap(),
        ..Default::default()
    }
}

fn header(number: u64) -> MiniHeader {
    MiniHeader {
        hash: format!("0x{:064x}", number),
        parent: format!("0x{:064x}", number.saturating_sub(1)),
        number,
        timestamp: Utc.timestamp_opt(1_600_000_000 + number as i64 * 13, 0).unwrap(),
        logs: serde_json::json!([{ "blockNumber": number, "topics": [] }]),
    }
}

fn metadata() -> Metadata {
    Metadata {
        ethereum_chain_id: 1337,
        max_expiration_time: "115792089237316195423570985008687907853269984665640564039457584007913129639935"
            .to_string(),
        eth_rpc_requests_sent_in_current_utc_day: 0,
        start_of_current_utc_day: Utc.timestamp_opt(1_599_955_200, 0).unwrap(),
    }
}

fn header_numbers(store: &MeshStore) -> Vec<u64> {
    let query = Query::new().sort(MiniHeaderField::Number, SortDirection::Asc);
    store
        .mini_headers
        .find(&query)
        .unwrap()
        .into_iter()
        .map(|h| h.number)
        .collect()
}

#[test]
fn duplicate_order_is_skipped() {
    let store = MeshStore::open(StoreConfig::new()).unwrap();
    store.orders.add(vec![order("0x01", "alice", "10")]).unwrap();

    let result = store
        .orders
        .add(vec![order("0x01", "alice", "10"), order("0x02", "bob", "20")])
        .unwrap();
    assert_eq!(result.added.len(), 1);
    assert_eq!(result.added[0].hash, "0x02");
    assert_eq!(store.orders.count(&Query::new()).unwrap(), 2);
}

#[test]
fn eviction_keeps_the_largest_numbers() {
    let store = MeshStore::open(StoreConfig::new().max_mini_headers(5)).unwrap();
    let mut numbers: Vec<u64> = (1..=30).collect();
    numbers.shuffle(&mut rand::rngs::StdRng::seed_from_u64(7));

    for chunk in numbers.chunks(4) {
        store
            .mini_headers
            .add(chunk.iter().copied().map(header).collect())
            .unwrap();
        assert!(store.mini_headers.count(&Query::new()).unwrap() <= 5);
    }
    assert_eq!(header_numbers(&store), vec![26, 27, 28, 29, 30]);
}

#[test]
fn eviction_respects_explicit_deletes() {
    let store = MeshStore::open(StoreConfig::new().max_mini_headers(3)).unwrap();
    store
        .mini_headers
        .add((1..=3).map(header).collect())
        .unwrap();
    store.mini_headers.delete(&header(3).hash).unwrap();

    store.mini_headers.add(vec![header(4)]).unwrap();
    assert_eq!(header_numbers(&store), vec![1, 2, 4]);
}

#[test]
fn stable_sort_on_ties() {
    let store = MeshStore::open(StoreConfig::new()).unwrap();
    store
        .orders
        .add(vec![
            order("c", "x", "2"),
            order("a", "x", "1"),
            order("b", "x", "1"),
        ])
        .unwrap();

    let query = Query::new().sort(OrderField::FillableTakerAssetAmount, SortDirection::Asc);
    let hashes: Vec<String> = store
        .orders
        .find(&query)
        .unwrap()
        .into_iter()
        .map(|o| o.hash)
        .collect();
    assert_eq!(hashes, vec!["a", "b", "c"]);
}

#[test]
fn amounts_compare_as_strings() {
    let store = MeshStore::open(StoreConfig::new()).unwrap();
    store
        .orders
        .add(vec![order("0x01", "x", "9"), order("0x02", "x", "10")])
        .unwrap();

    let query = Query::new().filter(OrderField::FillableTakerAssetAmount, FilterKind::Greater, "5");
    let found = store.orders.find(&query).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].hash, "0x01");
}

#[test]
fn metadata_is_a_singleton() {
    let store = MeshStore::open(StoreConfig::new()).unwrap();
    store.metadata.save(metadata()).unwrap();
    assert!(matches!(
        store.metadata.save(metadata()),
        Err(Error::AlreadyExists { .. })
    ));

    store
        .metadata
        .update(|mut m| {
            m.eth_rpc_requests_sent_in_current_utc_day = 42;
            m
        })
        .unwrap();
    assert_eq!(
        store.metadata.get().unwrap().eth_rpc_requests_sent_in_current_utc_day,
        42
    );
}

#[test]
fn multi_sort_with_limit_is_rejected() {
    let store = MeshStore::open(StoreConfig::new()).unwrap();
    let query = Query::new()
        .filter(OrderField::MakerAddress, FilterKind::Equal, "alice")
        .sort(OrderField::MakerAddress, SortDirection::Asc)
        .sort(OrderField::Salt, SortDirection::Desc)
        .limit(10);
    assert!(matches!(
        store.orders.find(&query),
        Err(Error::UnsupportedQueryShape { .. })
    ));
}

#[test]
fn snapshot_roundtrip_across_reopen() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let config = StoreConfig::new().data_path(dir.path()).max_mini_headers(4);

    {
        let store = MeshStore::open(config.clone()).unwrap();
        store
            .orders
            .add(vec![order("0x01", "alice", "10"), order("0x02", "bob", "20")])
            .unwrap();
        store
            .mini_headers
            .add((1..=6).map(header).collect())
            .unwrap();
        store.metadata.save(metadata()).unwrap();
        store.close().unwrap();
    }
    assert!(dir.path().join(SNAPSHOT_FILE_NAME).exists());

    let reopened = MeshStore::open(config).unwrap();
    assert_eq!(reopened.orders.count(&Query::new()).unwrap(), 2);
    assert_eq!(reopened.orders.get("0x02").unwrap().maker_address, "bob");
    assert_eq!(header_numbers(&reopened), vec![3, 4, 5, 6]);
    assert_eq!(reopened.metadata.get().unwrap(), metadata());
    assert_eq!(
        reopened.mini_headers.get(&header(6).hash).unwrap().logs,
        header(6).logs
    );
}

#[test]
fn reopen_with_smaller_bound_honors_retention() {
    init_tracing();
    let dir = TempDir::new().unwrap();

    {
        let store =
            MeshStore::open(StoreConfig::new().data_path(dir.path()).max_mini_headers(5)).unwrap();
        store
            .mini_headers
            .add((1..=5).map(header).collect())
            .unwrap();
        store.close().unwrap();
    }

    let reopened =
        MeshStore::open(StoreConfig::new().data_path(dir.path()).max_mini_headers(2)).unwrap();
    assert_eq!(reopened.mini_headers.count(&Query::new()).unwrap(), 2);
    assert_eq!(header_numbers(&reopened), vec![4, 5]);

    // The next add keeps the tighter bound
    reopened.mini_headers.add(vec![header(6)]).unwrap();
    assert_eq!(header_numbers(&reopened), vec![5, 6]);
}

#[test]
fn corrupted_snapshot_fails_to_open() {
    let dir = TempDir::new().unwrap();
    let config = StoreConfig::new().data_path(dir.path());

    let store = MeshStore::open(config.clone()).unwrap();
    store.orders.add(vec![order("0x01", "alice", "10")]).unwrap();
    store.flush().unwrap();
    store.close().unwrap();
    drop(store);

    let path = dir.path().join(SNAPSHOT_FILE_NAME);
    let mut bytes = std::fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x5a;
    std::fs::write(&path, bytes).unwrap();

    assert!(matches!(
        MeshStore::open(config),
        Err(Error::Corruption(_))
    ));
}

#[test]
fn closed_store_rejects_operations() {
    let store = MeshStore::open(StoreConfig::new()).unwrap();
    store.close().unwrap();
    assert!(matches!(
        store.orders.get("0x01"),
        Err(Error::DatabaseClosed)
    ));
    assert!(matches!(
        store.metadata.save(metadata()),
        Err(Error::DatabaseClosed)
    ));
}

#[test]
fn concurrent_header_adds_stay_bounded() {
    init_tracing();
    let store = Arc::new(MeshStore::open(StoreConfig::new().max_mini_headers(10)).unwrap());

    let handles: Vec<_> = (0..4u64)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..50u64 {
                    let number = i * 4 + t;
                    store.mini_headers.add(vec![header(number)]).unwrap();
                    assert!(store.mini_headers.count(&Query::new()).unwrap() <= 10);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(header_numbers(&store), (190..200).collect::<Vec<u64>>());
}

#[test]
fn concurrent_readers_see_whole_batches() {
    let store = Arc::new(MeshStore::open(StoreConfig::new()).unwrap());

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for batch in 0..50 {
                let orders = (0..10)
                    .map(|i| order(&format!("0x{:03}{}", batch, i), "alice", "1"))
                    .collect();
                store.orders.add(orders).unwrap();
            }
        })
    };
    let reader = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for _ in 0..200 {
                let count = store.orders.count(&Query::new()).unwrap();
                assert_eq!(count % 10, 0);
            }
        })
    };
    writer.join().unwrap();
    reader.join().unwrap();
    assert_eq!(store.orders.count(&Query::new()).unwrap(), 500);
}
