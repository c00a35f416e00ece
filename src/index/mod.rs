use crate::relation::{key::Key, types::Row};

mod bptree;
mod linhash;
mod ordmap;

pub use bptree::BpTreeIndex;
pub use linhash::LinHashIndex;
pub use ordmap::OrdIndex;

/// Associative store from composite key to tuple, backing a relation's key
/// index.
///
/// The three implementations are interchangeable: put/get/remove behave
/// identically everywhere and the relational operators never special-case
/// the backend. They differ in asymptotic cost and in whether `iter`
/// yields keys in sorted order (the tree backends) or in bucket order
/// (linear hashing). The backend is chosen once, at configuration time,
/// through the relation's type parameter.
pub trait IndexBackend: Default {
    type Iter<'a>: Iterator<Item = (&'a Key, &'a Row)>
    where
        Self: 'a;

    /// Maps the key to the row, returning the previously mapped row if any.
    fn put(&mut self, key: Key, row: Row) -> Option<Row>;

    fn get(&self, key: &Key) -> Option<&Row>;

    /// Part of the contract; the relational operators never call it.
    fn remove(&mut self, key: &Key) -> Option<Row>;

    fn iter(&self) -> Self::Iter<'_>;

    /// Number of distinct keys currently mapped.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::types::Value;

    fn key(n: i32) -> Key {
        Key::new(vec![Value::Int(n)])
    }

    fn row(n: i32) -> Row {
        vec![Value::Int(n), Value::Text(format!("row{}", n))]
    }

    fn test_put_get(mut idx: impl IndexBackend) {
        assert!(idx.is_empty());
        assert_eq!(idx.get(&key(1)), None);

        assert_eq!(idx.put(key(1), row(1)), None);
        assert_eq!(idx.get(&key(1)), Some(&row(1)));
        assert_eq!(idx.len(), 1);

        // put replaces and hands back the previous mapping
        assert_eq!(idx.put(key(1), row(9)), Some(row(1)));
        assert_eq!(idx.get(&key(1)), Some(&row(9)));
        assert_eq!(idx.len(), 1);
    }

    fn test_remove(mut idx: impl IndexBackend) {
        for n in 0..16 {
            idx.put(key(n), row(n));
        }
        assert_eq!(idx.remove(&key(7)), Some(row(7)));
        assert_eq!(idx.remove(&key(7)), None);
        assert_eq!(idx.get(&key(7)), None);
        assert_eq!(idx.len(), 15);
        assert_eq!(idx.get(&key(8)), Some(&row(8)));
    }

    // Enough keys to force bucket splits in the hash backend and node
    // splits in the trees.
    fn test_grows(mut idx: impl IndexBackend) {
        for n in (0..500).rev() {
            assert_eq!(idx.put(key(n), row(n)), None);
        }
        assert_eq!(idx.len(), 500);
        for n in 0..500 {
            assert_eq!(idx.get(&key(n)), Some(&row(n)));
        }
        assert_eq!(idx.get(&key(500)), None);
    }

    fn test_iter_visits_all(mut idx: impl IndexBackend) {
        for n in 0..100 {
            idx.put(key(n), row(n));
        }
        let mut seen: Vec<i32> = idx
            .iter()
            .map(|(k, _)| match k.values()[0] {
                Value::Int(n) => n,
                _ => unreachable!(),
            })
            .collect();
        seen.sort();
        assert_eq!(seen, (0..100).collect::<Vec<_>>());
    }

    fn test_sorted_iter(mut idx: impl IndexBackend) {
        for n in [5, 1, 4, 2, 3] {
            idx.put(key(n), row(n));
        }
        let keys: Vec<&Key> = idx.iter().map(|(k, _)| k).collect();
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_ordmap() {
        test_put_get(OrdIndex::default());
        test_remove(OrdIndex::default());
        test_grows(OrdIndex::default());
        test_iter_visits_all(OrdIndex::default());
        test_sorted_iter(OrdIndex::default());
    }

    #[test]
    fn test_linhash() {
        test_put_get(LinHashIndex::default());
        test_remove(LinHashIndex::default());
        test_grows(LinHashIndex::default());
        test_iter_visits_all(LinHashIndex::default());
    }

    #[test]
    fn test_bptree() {
        test_put_get(BpTreeIndex::default());
        test_remove(BpTreeIndex::default());
        test_grows(BpTreeIndex::default());
        test_iter_visits_all(BpTreeIndex::default());
        test_sorted_iter(BpTreeIndex::default());
    }
}
