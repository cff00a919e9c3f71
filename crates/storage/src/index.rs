//! Per-field ordered indexes
//!
//! A [`SecondaryIndex`] maps each distinct field value to the set of primary
//! keys holding it. Iteration is ordered by value; keys sharing a value are
//! always yielded in ascending primary-key order, in both scan directions.

use meshstore_core::{FieldValue, FilterKind, SortDirection};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

/// Range of index values selected by a native scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexRange {
    /// Every value
    All,
    /// `value == v`
    Equal(FieldValue),
    /// `value != v`
    NotEqual(FieldValue),
    /// `value < v`
    Below(FieldValue),
    /// `value <= v`
    BelowOrEqual(FieldValue),
    /// `value > v`
    Above(FieldValue),
    /// `value >= v`
    AboveOrEqual(FieldValue),
}

impl IndexRange {
    /// Translate a filter into a range
    ///
    /// Returns `None` for `CONTAINS`: there is no substring index.
    pub fn from_filter(kind: FilterKind, value: FieldValue) -> Option<Self> {
        let range = match kind {
            FilterKind::Equal => IndexRange::Equal(value),
            FilterKind::NotEqual => IndexRange::NotEqual(value),
            FilterKind::Less => IndexRange::Below(value),
            FilterKind::LessOrEqual => IndexRange::BelowOrEqual(value),
            FilterKind::Greater => IndexRange::Above(value),
            FilterKind::GreaterOrEqual => IndexRange::AboveOrEqual(value),
            FilterKind::Contains => return None,
        };
        Some(range)
    }

    /// Whether `value` falls inside this range
    pub fn contains(&self, value: &FieldValue) -> bool {
        match self {
            IndexRange::All => true,
            IndexRange::Equal(v) => value == v,
            IndexRange::NotEqual(v) => value != v,
            IndexRange::Below(v) => value < v,
            IndexRange::BelowOrEqual(v) => value <= v,
            IndexRange::Above(v) => value > v,
            IndexRange::AboveOrEqual(v) => value >= v,
        }
    }

    fn bounds(&self) -> (Bound<&FieldValue>, Bound<&FieldValue>) {
        match self {
            IndexRange::All | IndexRange::NotEqual(_) => (Bound::Unbounded, Bound::Unbounded),
            IndexRange::Equal(v) => (Bound::Included(v), Bound::Included(v)),
            IndexRange::Below(v) => (Bound::Unbounded, Bound::Excluded(v)),
            IndexRange::BelowOrEqual(v) => (Bound::Unbounded, Bound::Included(v)),
            IndexRange::Above(v) => (Bound::Excluded(v), Bound::Unbounded),
            IndexRange::AboveOrEqual(v) => (Bound::Included(v), Bound::Unbounded),
        }
    }
}

type Buckets<'a, K> = Box<dyn DoubleEndedIterator<Item = (&'a FieldValue, &'a BTreeSet<K>)> + 'a>;

/// Ordered index over one field
#[derive(Debug, Clone)]
pub struct SecondaryIndex<K> {
    entries: BTreeMap<FieldValue, BTreeSet<K>>,
}

impl<K: Ord + Clone> SecondaryIndex<K> {
    /// Create an empty index
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Record that `key` holds `value`
    pub fn insert(&mut self, value: FieldValue, key: K) {
        self.entries.entry(value).or_default().insert(key);
    }

    /// Forget that `key` holds `value`
    pub fn remove(&mut self, value: &FieldValue, key: &K) {
        if let Some(keys) = self.entries.get_mut(value) {
            keys.remove(key);
            if keys.is_empty() {
                self.entries.remove(value);
            }
        }
    }

    /// Number of distinct values
    pub fn distinct_values(&self) -> usize {
        self.entries.len()
    }

    /// Total number of (value, key) entries
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeSet::len).sum()
    }

    /// Whether the index holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn buckets(&self, range: &IndexRange) -> Buckets<'_, K> {
        let within = self.entries.range::<FieldValue, _>(range.bounds());
        match range {
            IndexRange::NotEqual(excluded) => {
                let excluded = excluded.clone();
                Box::new(within.filter(move |(v, _)| **v != excluded))
            }
            _ => Box::new(within),
        }
    }

    /// Keys whose value lies in `range`, ordered by value in `direction`
    ///
    /// Keys sharing a value stay in ascending key order for both directions.
    pub fn scan<'a>(&'a self, range: &IndexRange, direction: SortDirection) -> Vec<&'a K> {
        let buckets = self.buckets(range);
        let ordered: Buckets<'a, K> = match direction {
            SortDirection::Asc => buckets,
            SortDirection::Desc => Box::new(buckets.rev()),
        };
        ordered.flat_map(|(_, keys)| keys.iter()).collect()
    }

    /// Keys whose value lies in `range`, in ascending key order
    pub fn matching_keys<'a>(&'a self, range: &IndexRange) -> BTreeSet<&'a K> {
        self.buckets(range)
            .flat_map(|(_, keys)| keys.iter())
            .collect()
    }
}

impl<K: Ord + Clone> Default for SecondaryIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SecondaryIndex<String> {
        let mut index = SecondaryIndex::new();
        for (value, key) in [(2u64, "b"), (1, "c"), (2, "a"), (3, "d"), (2, "e")] {
            index.insert(FieldValue::from(value), key.to_string());
        }
        index
    }

    fn keys(found: Vec<&String>) -> Vec<&str> {
        found.into_iter().map(String::as_str).collect()
    }

    #[test]
    fn test_scan_all_ascending_ties_by_key() {
        let index = sample();
        let found = index.scan(&IndexRange::All, SortDirection::Asc);
        assert_eq!(keys(found), vec!["c", "a", "b", "e", "d"]);
    }

    #[test]
    fn test_scan_all_descending_keeps_tie_order() {
        let index = sample();
        let found = index.scan(&IndexRange::All, SortDirection::Desc);
        assert_eq!(keys(found), vec!["d", "a", "b", "e", "c"]);
    }

    #[test]
    fn test_scan_ranges() {
        let index = sample();
        let two = FieldValue::from(2u64);
        let asc = SortDirection::Asc;

        assert_eq!(
            keys(index.scan(&IndexRange::Equal(two.clone()), asc)),
            vec!["a", "b", "e"]
        );
        assert_eq!(
            keys(index.scan(&IndexRange::NotEqual(two.clone()), asc)),
            vec!["c", "d"]
        );
        assert_eq!(keys(index.scan(&IndexRange::Below(two.clone()), asc)), vec!["c"]);
        assert_eq!(
            keys(index.scan(&IndexRange::BelowOrEqual(two.clone()), asc)),
            vec!["c", "a", "b", "e"]
        );
        assert_eq!(keys(index.scan(&IndexRange::Above(two.clone()), asc)), vec!["d"]);
        assert_eq!(
            keys(index.scan(&IndexRange::AboveOrEqual(two), asc)),
            vec!["a", "b", "e", "d"]
        );
    }

    #[test]
    fn test_scan_missing_value() {
        let index = sample();
        let found = index.scan(&IndexRange::Equal(FieldValue::from(9u64)), SortDirection::Asc);
        assert!(found.is_empty());
    }

    #[test]
    fn test_matching_keys_in_key_order() {
        let index = sample();
        let found: Vec<&str> = index
            .matching_keys(&IndexRange::AboveOrEqual(FieldValue::from(2u64)))
            .into_iter()
            .map(String::as_str)
            .collect();
        assert_eq!(found, vec!["a", "b", "d", "e"]);
    }

    #[test]
    fn test_keys_outlive_the_range() {
        let index = sample();
        let found = {
            let range = IndexRange::NotEqual(FieldValue::from(2u64));
            index.scan(&range, SortDirection::Desc)
        };
        let matched = {
            let range = IndexRange::NotEqual(FieldValue::from(1u64));
            index.matching_keys(&range)
        };
        assert_eq!(keys(found), vec!["d", "c"]);
        assert_eq!(matched.len(), 4);
    }

    #[test]
    fn test_remove_drops_empty_buckets() {
        let mut index = sample();
        assert_eq!(index.distinct_values(), 3);
        index.remove(&FieldValue::from(1u64), &"c".to_string());
        assert_eq!(index.distinct_values(), 2);
        assert_eq!(index.len(), 4);

        // Removing an absent pair is a no-op
        index.remove(&FieldValue::from(1u64), &"c".to_string());
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn test_from_filter() {
        let v = FieldValue::from("x");
        assert_eq!(
            IndexRange::from_filter(FilterKind::LessOrEqual, v.clone()),
            Some(IndexRange::BelowOrEqual(v.clone()))
        );
        assert_eq!(IndexRange::from_filter(FilterKind::Contains, v), None);
    }

    #[test]
    fn test_range_contains_agrees_with_filter_kind() {
        let kinds = [
            FilterKind::Equal,
            FilterKind::NotEqual,
            FilterKind::Less,
            FilterKind::Greater,
            FilterKind::LessOrEqual,
            FilterKind::GreaterOrEqual,
        ];
        let pivot = FieldValue::from(5u64);
        for kind in kinds {
            let range = IndexRange::from_filter(kind, pivot.clone()).unwrap();
            for n in 0..10u64 {
                let value = FieldValue::from(n);
                assert_eq!(range.contains(&value), kind.matches(&value, &pivot));
            }
        }
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn entries() -> impl Strategy<Value = Vec<(u64, u16)>> {
            prop::collection::vec((0u64..8, any::<u16>()), 0..40)
        }

        proptest! {
            #[test]
            fn scan_matches_brute_force(
                entries in entries(),
                pivot in 0u64..8,
                desc in any::<bool>(),
            ) {
                let mut index = SecondaryIndex::new();
                let mut rows = std::collections::BTreeMap::new();
                for (value, key) in entries {
                    if let Some(old) = rows.insert(key, value) {
                        index.remove(&FieldValue::from(old), &key);
                    }
                    index.insert(FieldValue::from(value), key);
                }

                let range = IndexRange::AboveOrEqual(FieldValue::from(pivot));
                let direction = if desc { SortDirection::Desc } else { SortDirection::Asc };
                let found: Vec<u16> = index.scan(&range, direction).into_iter().copied().collect();

                // Keys in ascending order, stable-sorted by value
                let mut expected: Vec<(u64, u16)> = rows
                    .iter()
                    .filter(|(_, v)| **v >= pivot)
                    .map(|(k, v)| (*v, *k))
                    .collect();
                expected.sort_by(|a, b| direction.apply(a.0.cmp(&b.0)));
                let expected: Vec<u16> = expected.into_iter().map(|(_, k)| k).collect();

                prop_assert_eq!(found, expected);
                prop_assert_eq!(index.len(), rows.len());
            }
        }
    }
}
