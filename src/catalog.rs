use std::collections::{BTreeMap, btree_map::Entry};

use crate::{
    error::{Error, Result},
    index::{BpTreeIndex, IndexBackend},
    relation::{Relation, schema::Schema},
};

/// Top-level owner of named relations.
///
/// Derived relations get their temporary names from the catalog's own
/// counter. The counter is ordinary owned state, not a process-wide
/// global: two catalogs name independently and tests stay deterministic.
pub struct Catalog<B: IndexBackend = BpTreeIndex> {
    relations: BTreeMap<String, Relation<B>>,
    temp_count: usize,
}

impl<B: IndexBackend> Catalog<B> {
    pub fn new() -> Self {
        Self {
            relations: BTreeMap::new(),
            temp_count: 0,
        }
    }

    /// Creates an empty relation registered under its schema name.
    pub fn create(&mut self, schema: Schema) -> Result<&mut Relation<B>> {
        match self.relations.entry(schema.name.clone()) {
            Entry::Occupied(entry) => Err(Error::Internal(format!(
                "relation {} already exists",
                entry.key()
            ))),
            Entry::Vacant(entry) => Ok(entry.insert(Relation::new(schema))),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Relation<B>> {
        self.relations.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Relation<B>> {
        self.relations.get_mut(name)
    }

    /// Registers an operator result under a fresh counter-based name and
    /// returns the name it was filed under.
    pub fn register(&mut self, relation: Relation<B>) -> String {
        let name = format!("{}{}", relation.name(), self.temp_count);
        self.temp_count += 1;
        self.relations.insert(name.clone(), relation);
        name
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.relations.keys().map(String::as_str)
    }
}

impl<B: IndexBackend> Default for Catalog<B> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::types::Domain;

    fn schema(name: &str) -> Schema {
        Schema::new(name, &["id"], &[Domain::Int], &["id"]).unwrap()
    }

    #[test]
    fn test_create_and_get() {
        let mut catalog: Catalog = Catalog::new();
        catalog.create(schema("movie")).unwrap();
        assert!(catalog.get("movie").is_some());
        assert!(catalog.get("cinema").is_none());

        let duplicate = catalog.create(schema("movie"));
        assert!(matches!(duplicate, Err(Error::Internal(_))));
    }

    #[test]
    fn test_register_assigns_counter_names() {
        let mut catalog: Catalog = Catalog::new();
        let first = catalog.register(Relation::new(schema("tmp")));
        let second = catalog.register(Relation::new(schema("tmp")));
        assert_eq!(first, "tmp0");
        assert_eq!(second, "tmp1");
        assert!(catalog.get("tmp0").is_some());

        // a separate catalog counts from zero again
        let mut other: Catalog = Catalog::new();
        assert_eq!(other.register(Relation::new(schema("tmp"))), "tmp0");
    }
}
