use std::collections::{BTreeMap, btree_map};

use crate::relation::{key::Key, types::Row};

use super::IndexBackend;

/// Ordered index backend over a balanced tree map
#[derive(Debug, Default)]
pub struct OrdIndex {
    map: BTreeMap<Key, Row>,
}

impl IndexBackend for OrdIndex {
    type Iter<'a> = OrdIndexIter<'a>;

    fn put(&mut self, key: Key, row: Row) -> Option<Row> {
        self.map.insert(key, row)
    }

    fn get(&self, key: &Key) -> Option<&Row> {
        self.map.get(key)
    }

    fn remove(&mut self, key: &Key) -> Option<Row> {
        self.map.remove(key)
    }

    fn iter(&self) -> Self::Iter<'_> {
        OrdIndexIter {
            inner: self.map.iter(),
        }
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}

/// Key-sorted iterator over the backing tree map
pub struct OrdIndexIter<'a> {
    inner: btree_map::Iter<'a, Key, Row>,
}

impl<'a> Iterator for OrdIndexIter<'a> {
    type Item = (&'a Key, &'a Row);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}
