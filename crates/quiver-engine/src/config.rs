//! Result reader configuration.

use std::fmt;

/// Errors from [`Config::validate()`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Batch capacity must be greater than zero.
    ZeroBatchCapacity,
    /// Row limit must be greater than zero.
    ZeroMaxRows,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroBatchCapacity => write!(f, "batch_capacity must be greater than zero"),
            Self::ZeroMaxRows => write!(f, "max_rows must be greater than zero"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// How results are read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Rows per chunk. `None` asks the source.
    pub batch_capacity: Option<usize>,

    /// Whether each fetched chunk is checked against the schema (column
    /// count, column types, row count within capacity).
    ///
    /// Enabled by default.
    pub validate_chunks: bool,

    /// Maximum rows a [`MaterializedResult`](crate::MaterializedResult) will
    /// hold (None for unlimited).
    pub max_rows: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            batch_capacity: None,
            validate_chunks: true,
            max_rows: None,
        }
    }
}

impl Config {
    /// Overrides the source's batch capacity.
    #[must_use]
    pub fn with_batch_capacity(mut self, capacity: usize) -> Self {
        self.batch_capacity = Some(capacity);
        self
    }

    /// Turns per-chunk schema checks on or off.
    #[must_use]
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate_chunks = enabled;
        self
    }

    /// Caps materialized results at `limit` rows.
    #[must_use]
    pub fn with_max_rows(mut self, limit: usize) -> Self {
        self.max_rows = Some(limit);
        self
    }

    /// Checks the configuration for nonsensical values.
    ///
    /// # Errors
    ///
    /// A [`ConfigError`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_capacity == Some(0) {
            return Err(ConfigError::ZeroBatchCapacity);
        }
        if self.max_rows == Some(0) {
            return Err(ConfigError::ZeroMaxRows);
        }
        Ok(())
    }
}

impl From<ConfigError> for quiver_common::utils::Error {
    fn from(err: ConfigError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}
