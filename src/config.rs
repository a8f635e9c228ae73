//! Sizing parameters for a [`Table`](crate::Table)

use crate::TableError;

/// Smallest bucket count a table is created with and shrinks back to
pub const MIN_BUCKET_COUNT: usize = 32;
/// Load factor above which an insert doubles the bucket count
pub const GROW_LOAD_FACTOR: f64 = 1.5;
/// Load factor below which a removal halves the bucket count
pub const SHRINK_LOAD_FACTOR: f64 = 0.375;

/// Resize policy of a table.
///
/// ```
/// use djb2_table::TableConfig;
///
/// let config = TableConfig::new().min_buckets(64).grow_at(2.0);
/// assert!(config.validate().is_ok());
/// assert!(TableConfig::new().min_buckets(48).validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableConfig {
    /// Initial bucket count and the floor for shrinking; a power of two
    min_buckets: usize,
    /// Grow threshold (entries per bucket)
    grow_at: f64,
    /// Shrink threshold (entries per bucket)
    shrink_at: f64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TableConfig {
    /// Default policy: 32 buckets minimum, grow above 1.5, shrink below 0.375
    #[must_use]
    pub const fn new() -> Self {
        Self { min_buckets: MIN_BUCKET_COUNT, grow_at: GROW_LOAD_FACTOR, shrink_at: SHRINK_LOAD_FACTOR }
    }

    /// Sets the minimum bucket count
    #[must_use]
    pub const fn min_buckets(mut self, min_buckets: usize) -> Self {
        self.min_buckets = min_buckets;
        self
    }

    /// Sets the grow threshold
    #[must_use]
    pub const fn grow_at(mut self, load_factor: f64) -> Self {
        self.grow_at = load_factor;
        self
    }

    /// Sets the shrink threshold
    #[must_use]
    pub const fn shrink_at(mut self, load_factor: f64) -> Self {
        self.shrink_at = load_factor;
        self
    }

    /// Minimum bucket count
    #[must_use]
    pub const fn min_bucket_count(&self) -> usize {
        self.min_buckets
    }

    /// Grow threshold
    #[must_use]
    pub const fn grow_load_factor(&self) -> f64 {
        self.grow_at
    }

    /// Shrink threshold
    #[must_use]
    pub const fn shrink_load_factor(&self) -> f64 {
        self.shrink_at
    }

    /// Checks that the policy is usable.
    ///
    /// Doubling halves the load factor and halving doubles it, so the shrink
    /// threshold must stay below half the grow threshold or a single resize
    /// would immediately qualify for the opposite one.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::InvalidConfig`] describing the first violated rule.
    pub fn validate(&self) -> Result<(), TableError> {
        if !self.min_buckets.is_power_of_two() {
            return Err(TableError::InvalidConfig("minimum bucket count must be a power of two"));
        }
        if !self.grow_at.is_finite() || self.grow_at <= 0.0 {
            return Err(TableError::InvalidConfig("grow threshold must be finite and positive"));
        }
        if !self.shrink_at.is_finite() || self.shrink_at < 0.0 {
            return Err(TableError::InvalidConfig(
                "shrink threshold must be finite and non-negative",
            ));
        }
        if self.shrink_at * 2.0 >= self.grow_at {
            return Err(TableError::InvalidConfig(
                "shrink threshold must be below half the grow threshold",
            ));
        }
        Ok(())
    }
}
