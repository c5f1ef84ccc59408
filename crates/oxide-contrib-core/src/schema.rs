//! Table metadata and the entity mapping trait.
//!
//! A [`TableDescriptor`] is the static description of a table: its name and
//! how each column is classified. It is normally generated once per type by
//! `#[derive(Entity)]` and handed out through [`Entity::descriptor`], so no
//! runtime reflection or global cache is involved.

use crate::error::{CoreError, Result};
use crate::params::Params;
use crate::row::Row;

/// Classified column metadata for one table.
///
/// `all_columns` lists every mapped column in declaration order, including
/// keys and computed columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableDescriptor {
    name: String,
    key_columns: Vec<String>,
    explicit_key_columns: Vec<String>,
    computed_columns: Vec<String>,
    all_columns: Vec<String>,
}

impl TableDescriptor {
    /// Creates a descriptor with no columns.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a database-generated key column.
    #[must_use]
    pub fn key(mut self, column: impl Into<String>) -> Self {
        let column = column.into();
        self.key_columns.push(column.clone());
        self.all_columns.push(column);
        self
    }

    /// Adds a caller-assigned key column.
    #[must_use]
    pub fn explicit_key(mut self, column: impl Into<String>) -> Self {
        let column = column.into();
        self.explicit_key_columns.push(column.clone());
        self.all_columns.push(column);
        self
    }

    /// Adds a column computed by the database; it is read but never written.
    #[must_use]
    pub fn computed(mut self, column: impl Into<String>) -> Self {
        let column = column.into();
        self.computed_columns.push(column.clone());
        self.all_columns.push(column);
        self
    }

    /// Adds a plain column.
    #[must_use]
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.all_columns.push(column.into());
        self
    }

    /// Returns the table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the database-generated key columns.
    #[must_use]
    pub fn key_columns(&self) -> &[String] {
        &self.key_columns
    }

    /// Returns the caller-assigned key columns.
    #[must_use]
    pub fn explicit_key_columns(&self) -> &[String] {
        &self.explicit_key_columns
    }

    /// Returns the computed columns.
    #[must_use]
    pub fn computed_columns(&self) -> &[String] {
        &self.computed_columns
    }

    /// Returns every mapped column.
    #[must_use]
    pub fn all_columns(&self) -> &[String] {
        &self.all_columns
    }

    /// Returns key columns followed by explicit key columns.
    #[must_use]
    pub fn identity_columns(&self) -> Vec<&str> {
        self.key_columns
            .iter()
            .chain(&self.explicit_key_columns)
            .map(String::as_str)
            .collect()
    }

    /// Returns the identity columns, failing when there are none.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingKey`] when no key is declared.
    pub fn require_identity(&self) -> Result<Vec<&str>> {
        let identity = self.identity_columns();
        if identity.is_empty() {
            return Err(CoreError::MissingKey {
                table: self.name.clone(),
            });
        }
        Ok(identity)
    }

    /// Returns the only identity column.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingKey`] for zero identity columns and
    /// [`CoreError::CompositeKey`] for more than one.
    pub fn single_identity(&self) -> Result<&str> {
        match self.require_identity()?.as_slice() {
            [only] => Ok(*only),
            many => Err(CoreError::CompositeKey {
                table: self.name.clone(),
                count: many.len(),
            }),
        }
    }

    /// Returns the columns written by an INSERT: everything except
    /// database-generated keys and computed columns.
    #[must_use]
    pub fn insert_columns(&self) -> Vec<&str> {
        self.all_columns
            .iter()
            .filter(|c| !contains(&self.key_columns, c) && !contains(&self.computed_columns, c))
            .map(String::as_str)
            .collect()
    }

    /// Returns the columns assigned by a default UPDATE: everything except
    /// identity and computed columns.
    #[must_use]
    pub fn update_columns(&self) -> Vec<&str> {
        self.all_columns
            .iter()
            .filter(|c| {
                !contains(&self.key_columns, c)
                    && !contains(&self.explicit_key_columns, c)
                    && !contains(&self.computed_columns, c)
            })
            .map(String::as_str)
            .collect()
    }

    /// Resolves a caller-supplied column name to its declared spelling.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownColumn`] when the table has no such column.
    pub fn resolve_column(&self, column: &str) -> Result<&str> {
        self.all_columns
            .iter()
            .find(|c| c.eq_ignore_ascii_case(column))
            .map(String::as_str)
            .ok_or_else(|| CoreError::UnknownColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }
}

fn contains(list: &[String], column: &str) -> bool {
    list.iter().any(|c| c.eq_ignore_ascii_case(column))
}

/// A struct mapped to a table.
///
/// Usually implemented with `#[derive(Entity)]`.
pub trait Entity: Sized {
    /// Returns the table metadata, built once per type.
    fn descriptor() -> &'static TableDescriptor;

    /// Returns every mapped field as a named parameter.
    fn to_params(&self) -> Params;

    /// Builds an instance from a result row.
    ///
    /// # Errors
    ///
    /// Fails when a mapped column is missing or has the wrong type.
    fn from_row(row: &Row) -> Result<Self>;
}
