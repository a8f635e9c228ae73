//! Allocation budgets.
//!
//! Every allocation a table makes (its bucket array, each entry and each owned
//! key copy) is first acquired from a [`Budget`]. The default [`Unlimited`]
//! budget never refuses, so only the global allocator can fail. [`Limited`]
//! caps the number of bytes a table may hold, which is also how out-of-memory
//! conditions during a resize are reproduced in tests.

use crate::TableError;

/// Gatekeeper consulted before the table allocates.
pub trait Budget {
    /// Reserves `bytes` or refuses with [`TableError::AllocFailed`]
    ///
    /// # Errors
    ///
    /// Returns [`TableError::AllocFailed`] when the request does not fit.
    fn acquire(&mut self, bytes: usize) -> Result<(), TableError>;

    /// Returns `bytes` previously obtained through [`Budget::acquire`]
    fn release(&mut self, bytes: usize);
}

/// Budget that accepts every request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Unlimited;

impl Budget for Unlimited {
    fn acquire(&mut self, _bytes: usize) -> Result<(), TableError> {
        Ok(())
    }

    fn release(&mut self, _bytes: usize) {}
}

/// Budget that refuses requests once `limit` bytes are in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limited {
    /// Maximum number of bytes that may be held at once
    limit: usize,
    /// Bytes currently held
    used: usize,
}

impl Limited {
    /// Creates a budget allowing at most `limit` bytes
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self { limit, used: 0 }
    }

    /// Bytes currently held
    #[must_use]
    pub fn used(&self) -> usize {
        self.used
    }

    /// Configured maximum
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Bytes still available, zero when the limit was lowered below usage
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.used)
    }

    /// Changes the maximum. Lowering it below the current usage is allowed and
    /// only makes further requests fail.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
    }
}

impl Budget for Limited {
    fn acquire(&mut self, bytes: usize) -> Result<(), TableError> {
        match self.used.checked_add(bytes) {
            Some(total) if total <= self.limit => {
                self.used = total;
                Ok(())
            }
            _ => Err(TableError::AllocFailed { bytes }),
        }
    }

    fn release(&mut self, bytes: usize) {
        self.used = self.used.saturating_sub(bytes);
    }
}
