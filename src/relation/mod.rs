use std::fmt::Display;

use tracing::{debug, warn};

use crate::{
    error::Result,
    index::{BpTreeIndex, IndexBackend},
};

pub mod key;
pub mod schema;
pub mod types;

use key::Key;
use schema::Schema;
use types::{Domain, Row};

/// A relation: immutable schema, ordered tuple collection and a key index
/// derived from them.
///
/// Operators never mutate their receiver; each one builds a fresh relation
/// that shares no mutable state with its operands. `insert` is the only
/// mutator and only grows a relation under construction. The index backend
/// is a deployment-time choice made through the type parameter; operators
/// behave identically for every backend.
#[derive(Debug)]
pub struct Relation<B: IndexBackend = BpTreeIndex> {
    schema: Schema,
    tuples: Vec<Row>,
    index: B,
}

impl<B: IndexBackend> Relation<B> {
    /// Constructs an empty relation from its metadata.
    pub fn new(schema: Schema) -> Self {
        Self {
            index: B::default(),
            schema,
            tuples: Vec::new(),
        }
    }

    /// Builds a relation from already type-checked tuples, deriving the
    /// index from `(tuples, schema.key)`. The index is never supplied from
    /// outside, so it cannot be observed stale or empty while tuples
    /// exist. When two tuples share a key the first one keeps the index
    /// entry.
    pub(crate) fn from_parts(schema: Schema, tuples: Vec<Row>) -> Self {
        let key_cols = schema.key_cols();
        let mut index = B::default();
        for row in &tuples {
            let key = Key::from_row(row, &key_cols);
            if index.get(&key).is_none() {
                index.put(key, row.clone());
            }
        }
        Self {
            schema,
            tuples,
            index,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn tuples(&self) -> &[Row] {
        &self.tuples
    }

    pub fn index(&self) -> &B {
        &self.index
    }

    /// Column position of the attribute, if present.
    pub fn col(&self, attr: &str) -> Option<usize> {
        self.schema.col(attr)
    }

    /// Number of tuples, reported as the larger of the tuple count and the
    /// index cardinality so that duplicate-key inserts surface instead of
    /// hiding behind the deduplicated index.
    pub fn size(&self) -> usize {
        self.tuples.len().max(self.index.len())
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Inserts a tuple. The tuple is type-checked against the schema
    /// first; a rejected tuple leaves the relation untouched. The first
    /// tuple seen for a key owns the index entry.
    pub fn insert(&mut self, row: Row) -> Result<()> {
        debug!("insert into {} values {:?}", self.schema.name, row);
        self.schema.type_check(&row)?;
        let key = Key::from_row(&row, &self.schema.key_cols());
        if self.index.get(&key).is_none() {
            self.index.put(key, row.clone());
        }
        self.tuples.push(row);
        Ok(())
    }

    /// Projects onto `attrs`, de-duplicating on the projected key.
    ///
    /// The key stays the original one when `attrs` fully contains it,
    /// otherwise the key becomes `attrs` itself. Only the first tuple per
    /// key value survives, in source order. Any unknown attribute name is
    /// an error; nothing is projected from defaulted positions.
    pub fn project(&self, attrs: &[&str]) -> Result<Relation<B>> {
        debug!("{}.project({:?})", self.schema.name, attrs);

        let cols = self.schema.cols(attrs)?;
        let domains: Vec<Domain> = cols.iter().map(|at| self.schema.domains[*at]).collect();
        let key: Vec<String> = if self.schema.key.iter().all(|k| attrs.contains(&k.as_str())) {
            self.schema.key.clone()
        } else {
            attrs.iter().map(|a| a.to_string()).collect()
        };
        let schema = Schema::from_parts(
            format!("{}_project", self.schema.name),
            attrs.iter().map(|a| a.to_string()).collect(),
            domains,
            key,
        )?;

        let key_cols = schema.key_cols();
        let mut seen = B::default();
        let mut rows = Vec::new();
        for tuple in &self.tuples {
            let row: Row = cols.iter().map(|at| tuple[*at].clone()).collect();
            let key = Key::from_row(&row, &key_cols);
            if seen.get(&key).is_none() {
                seen.put(key, row.clone());
                rows.push(row);
            }
        }
        Ok(Relation::from_parts(schema, rows))
    }

    /// Keeps the tuples satisfying the predicate. Schema and key carry
    /// over unchanged; the index is rebuilt over the kept tuples.
    pub fn select<P>(&self, predicate: P) -> Relation<B>
    where
        P: Fn(&Row) -> bool,
    {
        debug!("{}.select(<predicate>)", self.schema.name);
        let rows = self
            .tuples
            .iter()
            .filter(|&t| predicate(t))
            .cloned()
            .collect();
        Relation::from_parts(self.schema.derived("select"), rows)
    }

    /// Point lookup against the relation's own key index. A miss is a
    /// normal outcome, not an error: the result is simply empty.
    pub fn select_key(&self, key: &Key) -> Relation<B> {
        debug!("{}.select({})", self.schema.name, key);
        let schema = self.schema.derived("select");
        match self.index.get(key) {
            Some(row) => Relation::from_parts(schema, vec![row.clone()]),
            None => {
                debug!("no row with key {} in {}", key, self.schema.name);
                Relation::new(schema)
            }
        }
    }

    /// Union keyed on first-seen composite keys.
    ///
    /// Requires compatible schemas (same arity, identical domain
    /// sequence); incompatible operands yield an empty relation typed like
    /// `self`. Every tuple of `self` is kept; a tuple of `other` enters
    /// only while its key is still unseen. The union therefore
    /// de-duplicates by key equality, not full-row equality: two tuples
    /// sharing a key collapse to the first one encountered.
    pub fn union(&self, other: &Relation<B>) -> Relation<B> {
        debug!("{}.union({})", self.schema.name, other.schema.name);
        let schema = self.schema.derived("union");
        if !self.schema.compatible(&other.schema) {
            warn!(
                "union: {} and {} are not compatible",
                self.schema.name, other.schema.name
            );
            return Relation::new(schema);
        }

        let mut seen = B::default();
        let mut rows: Vec<Row> = Vec::with_capacity(self.tuples.len());
        let key_cols = self.schema.key_cols();
        for tuple in &self.tuples {
            let key = Key::from_row(tuple, &key_cols);
            if seen.get(&key).is_none() {
                seen.put(key, tuple.clone());
            }
            rows.push(tuple.clone());
        }

        let other_key_cols = other.schema.key_cols();
        for tuple in &other.tuples {
            let key = Key::from_row(tuple, &other_key_cols);
            if seen.get(&key).is_none() {
                seen.put(key, tuple.clone());
                rows.push(tuple.clone());
            }
        }
        Relation::from_parts(schema, rows)
    }

    /// Difference: the tuples of `self` not present in `other`.
    ///
    /// With identical key attribute lists each tuple of `self` is excluded
    /// by a single probe of `other`'s index. Otherwise membership falls
    /// back to full-tuple equality against every tuple of `other` - the
    /// scan is exhaustive, a tuple survives only when it equals none of
    /// them. Incompatible operands yield an empty relation typed like
    /// `self`.
    pub fn minus(&self, other: &Relation<B>) -> Relation<B> {
        debug!("{}.minus({})", self.schema.name, other.schema.name);
        let schema = self.schema.derived("minus");
        if !self.schema.compatible(&other.schema) {
            warn!(
                "minus: {} and {} are not compatible",
                self.schema.name, other.schema.name
            );
            return Relation::new(schema);
        }

        let rows: Vec<Row> = if self.schema.key == other.schema.key {
            let key_cols = self.schema.key_cols();
            self.tuples
                .iter()
                .filter(|&t| other.index.get(&Key::from_row(t, &key_cols)).is_none())
                .cloned()
                .collect()
        } else {
            self.tuples
                .iter()
                .filter(|&t| !other.tuples.iter().any(|u| u == t))
                .cloned()
                .collect()
        };
        Relation::from_parts(schema, rows)
    }

    /// Nested-loop equi-join in lookup form: each tuple of `self` pairs
    /// with the FIRST tuple of `other` whose `attrs2` values equal its
    /// `attrs1` values, and unmatched tuples drop out. Suited to
    /// foreign-key-to-primary-key navigation, not a general multi-match
    /// equi-join. Attribute lists of unequal length, or names absent from
    /// either schema, are reported and give an empty result.
    pub fn equi_join(&self, attrs1: &[&str], attrs2: &[&str], other: &Relation<B>) -> Relation<B> {
        debug!(
            "{}.equi_join({:?}, {:?}, {})",
            self.schema.name, attrs1, attrs2, other.schema.name
        );
        if attrs1.len() != attrs2.len() {
            warn!("equi_join: attribute lists differ in arity");
            return Relation::new(self.schema.derived("join"));
        }
        let (lcols, rcols) = match (self.schema.cols(attrs1), other.schema.cols(attrs2)) {
            (Ok(l), Ok(r)) => (l, r),
            (Err(err), _) | (_, Err(err)) => {
                warn!("equi_join: {}", err);
                return Relation::new(self.schema.derived("join"));
            }
        };
        let schema = match self.join_schema(other, "join") {
            Ok(schema) => schema,
            Err(err) => {
                warn!("equi_join: {}", err);
                return Relation::new(self.schema.derived("join"));
            }
        };

        let mut rows = Vec::new();
        for tuple in &self.tuples {
            let probe = Key::from_row(tuple, &lcols);
            let partner = other
                .tuples
                .iter()
                .find(|&u| Key::from_row(u, &rcols) == probe);
            if let Some(partner) = partner {
                let mut row = tuple.clone();
                row.extend(partner.iter().cloned());
                rows.push(row);
            }
        }
        Relation::from_parts(schema, rows)
    }

    /// Index join: same lookup semantics as `equi_join`, but the right
    /// side is answered by a single probe of `other`'s key index.
    ///
    /// Valid only when `attrs2` is exactly `other`'s declared key - any
    /// other attribute list would silently lose non-key duplicate matches,
    /// so the precondition is checked and a violation reported as an empty
    /// result.
    pub fn index_join(&self, attrs1: &[&str], attrs2: &[&str], other: &Relation<B>) -> Relation<B> {
        debug!(
            "{}.index_join({:?}, {:?}, {})",
            self.schema.name, attrs1, attrs2, other.schema.name
        );
        if attrs1.len() != attrs2.len() {
            warn!("index_join: attribute lists differ in arity");
            return Relation::new(self.schema.derived("ijoin"));
        }
        if !other
            .schema
            .key
            .iter()
            .map(String::as_str)
            .eq(attrs2.iter().copied())
        {
            warn!(
                "index_join: {:?} is not the key of {}; its index cannot answer this join",
                attrs2, other.schema.name
            );
            return Relation::new(self.schema.derived("ijoin"));
        }
        let lcols = match self.schema.cols(attrs1) {
            Ok(cols) => cols,
            Err(err) => {
                warn!("index_join: {}", err);
                return Relation::new(self.schema.derived("ijoin"));
            }
        };
        let schema = match self.join_schema(other, "ijoin") {
            Ok(schema) => schema,
            Err(err) => {
                warn!("index_join: {}", err);
                return Relation::new(self.schema.derived("ijoin"));
            }
        };

        let mut rows = Vec::new();
        for tuple in &self.tuples {
            if let Some(partner) = other.index.get(&Key::from_row(tuple, &lcols)) {
                let mut row = tuple.clone();
                row.extend(partner.iter().cloned());
                rows.push(row);
            }
        }
        Relation::from_parts(schema, rows)
    }

    /// Natural join on all attributes common to both schemas, taken in
    /// left-schema order. Each tuple of `self` pairs with the first tuple
    /// of `other` agreeing on every common attribute; the common columns
    /// appear once in the result. With no common attribute every pair
    /// agrees vacuously, so each tuple takes the first tuple of `other`.
    pub fn natural_join(&self, other: &Relation<B>) -> Relation<B> {
        debug!(
            "{}.natural_join({})",
            self.schema.name, other.schema.name
        );

        let common: Vec<&str> = self
            .schema
            .attributes
            .iter()
            .filter(|a| other.schema.col(a.as_str()).is_some())
            .map(String::as_str)
            .collect();
        let rest: Vec<usize> = other
            .schema
            .attributes
            .iter()
            .enumerate()
            .filter(|(_, a)| !common.contains(&a.as_str()))
            .map(|(at, _)| at)
            .collect();

        let mut attributes = self.schema.attributes.clone();
        let mut domains = self.schema.domains.clone();
        for &at in &rest {
            attributes.push(other.schema.attributes[at].clone());
            domains.push(other.schema.domains[at]);
        }
        let schema = match Schema::from_parts(
            format!("{}_njoin", self.schema.name),
            attributes,
            domains,
            self.schema.key.clone(),
        ) {
            Ok(schema) => schema,
            Err(err) => {
                warn!("natural_join: {}", err);
                return Relation::new(self.schema.derived("njoin"));
            }
        };

        // common is drawn from both schemas, so resolution cannot miss
        let (lcommon, rcommon) = match (self.schema.cols(&common), other.schema.cols(&common)) {
            (Ok(l), Ok(r)) => (l, r),
            _ => return Relation::new(self.schema.derived("njoin")),
        };

        let mut rows = Vec::new();
        for tuple in &self.tuples {
            let probe = Key::from_row(tuple, &lcommon);
            let partner = other
                .tuples
                .iter()
                .find(|&u| Key::from_row(u, &rcommon) == probe);
            if let Some(partner) = partner {
                let mut row = tuple.clone();
                row.extend(rest.iter().map(|&at| partner[at].clone()));
                rows.push(row);
            }
        }
        Relation::from_parts(schema, rows)
    }

    /// Result schema of an equi-join: left attributes unchanged, right
    /// attribute names colliding with a left name suffixed with "2",
    /// column by column. The key stays the left key.
    fn join_schema(&self, other: &Relation<B>, op: &str) -> Result<Schema> {
        let mut attributes = self.schema.attributes.clone();
        for attr in &other.schema.attributes {
            if self.schema.col(attr).is_some() {
                attributes.push(format!("{}2", attr));
            } else {
                attributes.push(attr.clone());
            }
        }
        let mut domains = self.schema.domains.clone();
        domains.extend(other.schema.domains.iter().copied());
        Schema::from_parts(
            format!("{}_{}", self.schema.name, op),
            attributes,
            domains,
            self.schema.key.clone(),
        )
    }
}

/// Fixed-width tabular dump, a diagnostic convenience outside the operator
/// contract.
impl<B: IndexBackend> Display for Relation<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rule = "---------------".repeat(self.schema.attributes.len());
        writeln!(f, " relation {}", self.schema.name)?;
        writeln!(f, "|-{}-|", rule)?;
        write!(f, "| ")?;
        for attr in &self.schema.attributes {
            write!(f, "{:>15}", attr)?;
        }
        writeln!(f, " |")?;
        writeln!(f, "|-{}-|", rule)?;
        for tuple in &self.tuples {
            write!(f, "| ")?;
            for value in tuple {
                write!(f, "{:>15}", value.to_string())?;
            }
            writeln!(f, " |")?;
        }
        write!(f, "|-{}-|", rule)
    }
}
