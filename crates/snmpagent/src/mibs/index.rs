//! Ordered sub-identifier index for GET-NEXT.
//!
//! Sub-identifiers compare lexicographically, the same order an SNMP walk
//! visits rows in. Tables are rebuilt from scratch on every refresh, so the
//! index supports insertion and lookups but no removal.

use std::collections::HashMap;

/// The part of an OID below an updater's prefix.
pub type SubId = Vec<u32>;

/// Value map keyed by sub-identifier plus the sorted list of keys.
#[derive(Debug, Clone, PartialEq)]
pub struct SubIdIndex<V> {
    values: HashMap<SubId, V>,
    sorted: Vec<SubId>,
}

impl<V> SubIdIndex<V> {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
            sorted: Vec::new(),
        }
    }

    /// Inserts a row, replacing the value if the sub-identifier exists.
    pub fn insert(&mut self, sub_id: SubId, value: V) {
        if let Err(pos) = self.sorted.binary_search(&sub_id) {
            self.sorted.insert(pos, sub_id.clone());
        }
        self.values.insert(sub_id, value);
    }

    pub fn lookup(&self, sub_id: &[u32]) -> Option<&V> {
        self.values.get(sub_id)
    }

    /// Smallest stored sub-identifier strictly greater than `sub_id`.
    pub fn successor(&self, sub_id: &[u32]) -> Option<&[u32]> {
        let right = self.sorted.partition_point(|s| s.as_slice() <= sub_id);
        self.sorted.get(right).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Sub-identifiers in walk order.
    pub fn keys(&self) -> impl Iterator<Item = &[u32]> {
        self.sorted.iter().map(Vec::as_slice)
    }

    /// Rows in walk order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u32], &V)> {
        self.sorted
            .iter()
            .filter_map(|s| self.values.get(s).map(|v| (s.as_slice(), v)))
    }
}

impl<V> Default for SubIdIndex<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> FromIterator<(SubId, V)> for SubIdIndex<V> {
    fn from_iter<I: IntoIterator<Item = (SubId, V)>>(iter: I) -> Self {
        let values: HashMap<SubId, V> = iter.into_iter().collect();
        let mut sorted: Vec<SubId> = values.keys().cloned().collect();
        sorted.sort_unstable();
        Self { values, sorted }
    }
}

/// Successor of `sub_id` in a column-major table addressed as
/// `column ++ row`, where every column holds the same rows.
///
/// `columns` and `rows` must be sorted ascending.
pub fn next_cell(columns: &[u32], rows: &[SubId], sub_id: &[u32]) -> Option<SubId> {
    let first_row = rows.first()?;
    let cell = |column: u32, row: &[u32]| {
        let mut cell = Vec::with_capacity(row.len() + 1);
        cell.push(column);
        cell.extend_from_slice(row);
        cell
    };

    for &column in columns {
        match sub_id.split_first() {
            None => return Some(cell(column, first_row)),
            Some((&current, _)) if current < column => return Some(cell(column, first_row)),
            Some((&current, rest)) if current == column => {
                let right = rows.partition_point(|r| r.as_slice() <= rest);
                if let Some(row) = rows.get(right) {
                    return Some(cell(column, row));
                }
            }
            Some(_) => {}
        }
    }
    None
}

/// Runs `inner` on the part of `sub_id` below `prefix` and re-attaches the
/// prefix to the answer. A `sub_id` ordered before the whole prefix walks
/// from the start of `inner`.
pub fn prefixed_next<F>(prefix: &[u32], sub_id: &[u32], inner: F) -> Option<SubId>
where
    F: FnOnce(&[u32]) -> Option<SubId>,
{
    let rest: &[u32] = match sub_id.strip_prefix(prefix) {
        Some(rest) => rest,
        None if sub_id < prefix => &[],
        None => return None,
    };
    inner(rest).map(|tail| {
        let mut next = prefix.to_vec();
        next.extend(tail);
        next
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn arp_like() -> SubIdIndex<&'static str> {
        [
            (vec![5, 10, 0, 0, 2], "b"),
            (vec![1, 10, 0, 0, 1], "a"),
            (vec![5, 10, 0, 0, 10], "c"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_lookup() {
        let index = arp_like();
        assert_eq!(index.lookup(&[5, 10, 0, 0, 2]), Some(&"b"));
        assert_eq!(index.lookup(&[5, 10, 0, 0]), None);
    }

    #[test]
    fn test_successor_walks_in_order() {
        let index = arp_like();
        assert_eq!(index.successor(&[]), Some(&[1, 10, 0, 0, 1][..]));
        assert_eq!(index.successor(&[1, 10, 0, 0, 1]), Some(&[5, 10, 0, 0, 2][..]));
        // Between rows
        assert_eq!(index.successor(&[5, 10, 0, 0, 3]), Some(&[5, 10, 0, 0, 10][..]));
        // A prefix of a row sorts before it
        assert_eq!(index.successor(&[5]), Some(&[5, 10, 0, 0, 2][..]));
        assert_eq!(index.successor(&[5, 10, 0, 0, 10]), None);
        assert_eq!(index.successor(&[6]), None);
    }

    #[test]
    fn test_empty_index_has_no_successor() {
        let index: SubIdIndex<u32> = SubIdIndex::new();
        assert_eq!(index.successor(&[]), None);
        assert_eq!(index.successor(&[1, 2, 3]), None);
    }

    #[test]
    fn test_insert_keeps_sorted_and_replaces() {
        let mut index = SubIdIndex::new();
        index.insert(vec![3], 30);
        index.insert(vec![1], 10);
        index.insert(vec![2], 20);
        index.insert(vec![1], 11);
        assert_eq!(index.len(), 3);
        assert_eq!(
            index.keys().collect::<Vec<_>>(),
            vec![&[1][..], &[2][..], &[3][..]]
        );
        assert_eq!(index.lookup(&[1]), Some(&11));
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        assert_eq!(arp_like(), arp_like());
    }

    #[test]
    fn test_next_cell_column_major() {
        let rows = vec![vec![1], vec![5], vec![9]];
        let columns = [1, 2];
        assert_eq!(next_cell(&columns, &rows, &[]), Some(vec![1, 1]));
        assert_eq!(next_cell(&columns, &rows, &[1, 1]), Some(vec![1, 5]));
        assert_eq!(next_cell(&columns, &rows, &[1, 9]), Some(vec![2, 1]));
        assert_eq!(next_cell(&columns, &rows, &[1, 9, 4]), Some(vec![2, 1]));
        assert_eq!(next_cell(&columns, &rows, &[2, 9]), None);
        assert_eq!(next_cell(&columns, &rows, &[0, 100]), Some(vec![1, 1]));
        assert_eq!(next_cell(&columns, &[], &[]), None);
    }

    #[test]
    fn test_prefixed_next() {
        let rows = vec![vec![1], vec![2]];
        let inner = |rest: &[u32]| next_cell(&[1], &rows, rest);
        assert_eq!(prefixed_next(&[2, 1], &[1, 0], inner), Some(vec![2, 1, 1, 1]));
        assert_eq!(prefixed_next(&[2, 1], &[2, 1, 1, 1], inner), Some(vec![2, 1, 1, 2]));
        assert_eq!(prefixed_next(&[2, 1], &[2, 1, 1, 2], inner), None);
        assert_eq!(prefixed_next(&[2, 1], &[3], inner), None);
    }
}
