use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::relation::{
    schema::Schema,
    types::{Domain, Row, Value},
};

/// Produces `count` random rows matching the schema's domain sequence.
///
/// The generator is the external load side of the engine: rows are meant
/// to be fed through `Relation::insert` one at a time, which re-checks
/// them like any other input.
pub fn rows(schema: &Schema, count: usize, rng: &mut impl Rng) -> Vec<Row> {
    (0..count).map(|_| row(schema, rng)).collect()
}

pub fn row(schema: &Schema, rng: &mut impl Rng) -> Row {
    schema.domains.iter().map(|d| value(*d, rng)).collect()
}

/// Seeded generator for reproducible runs.
pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

fn value(domain: Domain, rng: &mut impl Rng) -> Value {
    match domain {
        Domain::Bigint => Value::Bigint(rng.random()),
        Domain::Int => Value::Int(rng.random()),
        Domain::Smallint => Value::Smallint(rng.random()),
        Domain::Tinyint => Value::Tinyint(rng.random()),
        Domain::Double => Value::Double(rng.random()),
        Domain::Float => Value::Float(rng.random()),
        Domain::Char => Value::Char(rng.random_range('a'..='z')),
        Domain::Text => {
            let len = rng.random_range(4..12);
            Value::Text((0..len).map(|_| rng.random_range('a'..='z')).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::Relation;

    fn schema() -> Schema {
        Schema::new(
            "load",
            &["id", "label", "weight", "grade"],
            &[Domain::Int, Domain::Text, Domain::Double, Domain::Char],
            &["id"],
        )
        .unwrap()
    }

    #[test]
    fn test_rows_insert_cleanly() {
        let schema = schema();
        let mut rng = seeded(42);
        let mut relation: Relation = Relation::new(schema.clone());
        for row in rows(&schema, 100, &mut rng) {
            relation.insert(row).unwrap();
        }
        assert_eq!(relation.tuples().len(), 100);
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let schema = schema();
        let first = rows(&schema, 10, &mut seeded(7));
        let second = rows(&schema, 10, &mut seeded(7));
        assert_eq!(first, second);
    }
}
