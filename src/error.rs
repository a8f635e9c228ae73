//! Error type shared by table construction and insertion

use thiserror::Error;

/// Failures a caller can observe from a [`Table`](crate::Table).
///
/// Resize failures never show up here: a grow or shrink that cannot get its
/// memory is deferred and the table keeps its current bucket count.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableError {
    /// An allocation was refused, either by the table's budget or by the global allocator
    #[error("allocation of {bytes} bytes failed")]
    AllocFailed {
        /// Size of the refused request
        bytes: usize,
    },
    /// The requested bucket count does not fit in `usize`
    #[error("bucket count overflows usize")]
    CapacityOverflow,
    /// The table configuration is inconsistent
    #[error("invalid table configuration: {0}")]
    InvalidConfig(&'static str),
}
