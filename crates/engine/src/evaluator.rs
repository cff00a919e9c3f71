//! In-memory query evaluator
//!
//! Reference semantics for every query shape: keep rows matching all filters,
//! stable-sort by the sort keys (most significant first), then apply offset and
//! limit. Input is expected in storage order so ties keep primary-key order.

use meshstore_core::{Query, Record, SortSpec};
use std::cmp::Ordering;

/// Whether `row` satisfies every filter of `query`
pub fn matches<R: Record>(row: &R, query: &Query<R::Field>) -> bool {
    query
        .filters
        .iter()
        .all(|f| f.kind.matches(&row.field(f.field), &f.value))
}

/// Compare two rows under a multi-key sort
pub fn compare<R: Record>(a: &R, b: &R, sort: &[SortSpec<R::Field>]) -> Ordering {
    for spec in sort {
        let ordering = spec
            .direction
            .apply(a.field(spec.field).cmp(&b.field(spec.field)));
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Evaluate `query` over `rows`
pub fn evaluate<'a, R, I>(rows: I, query: &Query<R::Field>) -> Vec<&'a R>
where
    R: Record,
    I: IntoIterator<Item = &'a R>,
{
    let mut selected: Vec<&R> = rows.into_iter().filter(|r| matches(*r, query)).collect();
    if !query.sort.is_empty() {
        // sort_by is stable
        selected.sort_by(|a, b| compare(*a, *b, &query.sort));
    }
    query.slice(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshstore_core::{FilterKind, Order, OrderField, SortDirection};

    fn order(hash: &str, maker: &str, salt: &str, removed: bool) -> Order {
        Order {
            hash: hash.to_string(),
            chain_id: 1337,
            maker_address: maker.to_string(),
            maker_asset_data: format!("0xf47261b0{}", maker),
            salt: salt.to_string(),
            is_removed: removed,
            ..Default::default()
        }
    }

    fn dataset() -> Vec<Order> {
        vec![
            order("0x01", "aaa", "3", false),
            order("0x02", "bbb", "1", true),
            order("0x03", "aaa", "2", false),
            order("0x04", "ccc", "1", false),
            order("0x05", "bbb", "3", false),
        ]
    }

    fn hashes(rows: Vec<&Order>) -> Vec<&str> {
        rows.into_iter().map(|o| o.hash.as_str()).collect()
    }

    #[test]
    fn test_empty_query_returns_all_in_order() {
        let rows = dataset();
        let found = evaluate(&rows, &Query::new());
        assert_eq!(hashes(found), vec!["0x01", "0x02", "0x03", "0x04", "0x05"]);
    }

    #[test]
    fn test_filters_are_a_conjunction() {
        let rows = dataset();
        let query = Query::new()
            .filter(OrderField::MakerAddress, FilterKind::NotEqual, "ccc")
            .filter(OrderField::IsRemoved, FilterKind::Equal, false);
        assert_eq!(hashes(evaluate(&rows, &query)), vec!["0x01", "0x03", "0x05"]);
    }

    #[test]
    fn test_contains_filter() {
        let rows = dataset();
        let query = Query::new().filter(OrderField::MakerAssetData, FilterKind::Contains, "bb");
        assert_eq!(hashes(evaluate(&rows, &query)), vec!["0x02", "0x05"]);
    }

    #[test]
    fn test_multi_key_sort_is_stable() {
        let rows = dataset();
        let query = Query::new()
            .sort(OrderField::Salt, SortDirection::Desc)
            .sort(OrderField::MakerAddress, SortDirection::Asc);
        // salt 3: 0x01(aaa), 0x05(bbb); salt 2: 0x03; salt 1: 0x02(bbb), 0x04(ccc)
        assert_eq!(
            hashes(evaluate(&rows, &query)),
            vec!["0x01", "0x05", "0x03", "0x02", "0x04"]
        );
    }

    #[test]
    fn test_equal_sort_keys_keep_storage_order() {
        let rows = dataset();
        let query = Query::new().sort(OrderField::ChainId, SortDirection::Desc);
        assert_eq!(
            hashes(evaluate(&rows, &query)),
            vec!["0x01", "0x02", "0x03", "0x04", "0x05"]
        );
    }

    #[test]
    fn test_offset_and_limit_after_sort() {
        let rows = dataset();
        let query = Query::new()
            .sort(OrderField::Hash, SortDirection::Desc)
            .offset(1)
            .limit(2);
        assert_eq!(hashes(evaluate(&rows, &query)), vec!["0x04", "0x03"]);
    }

    #[test]
    fn test_zero_limit_means_unlimited() {
        let rows = dataset();
        let query = Query::new().limit(0);
        assert_eq!(evaluate(&rows, &query).len(), 5);
    }
}
