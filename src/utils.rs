//! Utility functions and traits for [`Table`]

use crate::{Budget, Table, TableError};

/// Extension trait for tables that collects their contents
pub trait TableExtensions {
    /// Returns the keys of the table as a Vec
    fn keys(&self) -> Vec<String>;

    /// Returns the values of the table as a Vec
    fn values(&self) -> Vec<i32>;
}

impl<B: Budget> TableExtensions for Table<B> {
    fn keys(&self) -> Vec<String> {
        self.iter().map(|(k, _)| k.to_owned()).collect()
    }

    fn values(&self) -> Vec<i32> {
        self.iter().map(|(_, v)| v).collect()
    }
}

/// Creates a `Table` from an iterator of key-value pairs. Later pairs
/// overwrite earlier ones with the same key.
///
/// # Errors
///
/// Returns the first [`TableError`] raised while creating the table or inserting a pair.
pub fn try_from_iter<K, I>(iter: I) -> Result<Table, TableError>
where
    K: AsRef<str>,
    I: IntoIterator<Item = (K, i32)>,
{
    let mut table = Table::try_new()?;

    for (key, value) in iter {
        table.set(key.as_ref(), value)?;
    }

    Ok(table)
}
