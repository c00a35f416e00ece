use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    relation::types::{Domain, Row},
};

/// Relation schema: attribute names, per-attribute domains and the key
/// attribute subset. Immutable once the relation is constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    pub attributes: Vec<String>,
    pub domains: Vec<Domain>,
    pub key: Vec<String>,
}

impl Schema {
    /// Convenience constructor over string slices.
    pub fn new(name: &str, attributes: &[&str], domains: &[Domain], key: &[&str]) -> Result<Self> {
        Self::from_parts(
            name.to_string(),
            attributes.iter().map(|a| a.to_string()).collect(),
            domains.to_vec(),
            key.iter().map(|k| k.to_string()).collect(),
        )
    }

    pub fn from_parts(
        name: String,
        attributes: Vec<String>,
        domains: Vec<Domain>,
        key: Vec<String>,
    ) -> Result<Self> {
        let schema = Self {
            name,
            attributes,
            domains,
            key,
        };
        schema.validate()?;
        Ok(schema)
    }

    /// Validates schema invariants: one domain per attribute, distinct
    /// attribute names, a non-empty key drawn from the attributes.
    fn validate(&self) -> Result<()> {
        if self.attributes.is_empty() {
            return Err(Error::Schema(format!(
                "relation {} has no attributes",
                self.name
            )));
        }
        if self.attributes.len() != self.domains.len() {
            return Err(Error::Schema(format!(
                "relation {} declares {} attributes but {} domains",
                self.name,
                self.attributes.len(),
                self.domains.len()
            )));
        }
        for (i, attr) in self.attributes.iter().enumerate() {
            if self.attributes[..i].contains(attr) {
                return Err(Error::Schema(format!(
                    "duplicate attribute {} in relation {}",
                    attr, self.name
                )));
            }
        }
        if self.key.is_empty() {
            return Err(Error::Schema(format!("no key for relation {}", self.name)));
        }
        for key_attr in &self.key {
            if !self.attributes.contains(key_attr) {
                return Err(Error::Schema(format!(
                    "key attribute {} is not an attribute of relation {}",
                    key_attr, self.name
                )));
            }
        }
        Ok(())
    }

    /// Returns the column position for the given attribute name.
    pub fn col(&self, attr: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a == attr)
    }

    /// Resolves each attribute name to its column position. A name that
    /// resolves nowhere is an error the caller must handle; positions are
    /// never defaulted.
    pub fn cols<S: AsRef<str>>(&self, attrs: &[S]) -> Result<Vec<usize>> {
        attrs
            .iter()
            .map(|attr| {
                let attr = attr.as_ref();
                self.col(attr).ok_or(Error::UnknownAttribute(format!(
                    "{} in relation {}",
                    attr, self.name
                )))
            })
            .collect()
    }

    /// Column positions of the key attributes. Validation pins every key
    /// attribute to an existing column, so the lookup cannot miss.
    pub fn key_cols(&self) -> Vec<usize> {
        self.key
            .iter()
            .map(|k| self.col(k).expect("key attribute resolves to a column"))
            .collect()
    }

    /// Checks a row against the schema: arity first, then the runtime type
    /// tag of every component against its column's domain.
    pub fn type_check(&self, row: &Row) -> Result<()> {
        if row.len() != self.domains.len() {
            return Err(Error::Schema(format!(
                "tuple carries {} values, relation {} expects {}",
                row.len(),
                self.name,
                self.domains.len()
            )));
        }
        for (i, value) in row.iter().enumerate() {
            if value.domain() != self.domains[i] {
                return Err(Error::Schema(format!(
                    "value {} does not fit domain {:?} of attribute {}",
                    value, self.domains[i], self.attributes[i]
                )));
            }
        }
        Ok(())
    }

    /// Two schemas are compatible when they have the same arity and agree
    /// on every domain, position by position.
    pub fn compatible(&self, other: &Schema) -> bool {
        self.domains == other.domains
    }

    /// Clones the schema under a derived name for an operator result.
    pub(crate) fn derived(&self, op: &str) -> Schema {
        let mut schema = self.clone();
        schema.name = format!("{}_{}", self.name, op);
        schema
    }
}
