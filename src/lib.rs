//! # djb2 Table
//!
//! A separate-chaining hash table from string keys to `i32` values.
//!
//! Keys are hashed with djb2 and chained per bucket. The bucket count doubles
//! when an insert pushes the load factor above 1.5 and halves when a removal
//! drops it below 0.375, never going below 32 buckets.
//!
//! Resizing is all-or-nothing: the table builds its new bucket array next to
//! the old one and only switches over once every entry has been copied. When
//! memory runs out part way, the copy is discarded and the resize is retried
//! on a later insert or removal. Running out of memory while inserting a new
//! key is reported as [`TableError::AllocFailed`] instead of aborting.
//!
//! ## Basic Usage
//!
//! ```rust
//! use djb2_table::Table;
//!
//! let mut table = Table::new();
//!
//! // Insert values
//! table.set("apple", 1)?;
//! table.set("banana", 2)?;
//!
//! // Retrieve values
//! assert_eq!(table.get("apple"), Some(1));
//!
//! // Update values
//! assert_eq!(table.set("apple", 10)?, Some(1));
//! assert_eq!(table.get("apple"), Some(10));
//!
//! // Remove values
//! table.remove("apple");
//! assert_eq!(table.get("apple"), None);
//! # Ok::<(), djb2_table::TableError>(())
//! ```
//!
//! ## Capping Memory
//!
//! ```rust
//! use djb2_table::{Limited, Table, TableConfig, TableError};
//!
//! let mut table = Table::with_budget(TableConfig::new(), Limited::new(4096))?;
//! let mut stored = 0;
//! while table.set(&format!("key-{stored}"), stored).is_ok() {
//!     stored += 1;
//! }
//!
//! // Everything that made it in is still there
//! assert_eq!(table.len(), stored as usize);
//! assert!(table.iter().all(|(key, value)| key == format!("key-{value}")));
//! # Ok::<(), TableError>(())
//! ```

/// Allocation budgets charged by the table
mod budget;
/// Resize policy
mod config;
/// The djb2 hash function
mod djb2;
/// Error type
mod error;
/// The hash table
mod table;
/// Utility functions and traits for tables
mod utils;

pub use budget::{Budget, Limited, Unlimited};
pub use config::{GROW_LOAD_FACTOR, MIN_BUCKET_COUNT, SHRINK_LOAD_FACTOR, TableConfig};
pub use djb2::{BuildDjb2, Djb2Hasher, djb2};
pub use error::TableError;
pub use table::{Iter, Table, TableStats};
pub use utils::{TableExtensions, try_from_iter};
