//! Tape image reader configuration.

/// Configuration for opening a tape image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Whether a single framing anomaly is patched in memory instead of
    /// failing the read.
    pub allow_recovery: bool,

    /// Whether `tell` cross-checks its bookkeeping against the position the
    /// underlying stream reports.
    pub verify_position: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            allow_recovery: true,
            verify_position: true,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration that fails on the first anomaly.
    #[must_use]
    pub fn strict() -> Self {
        Self::default().allow_recovery(false)
    }

    /// Sets whether a single anomaly may be patched.
    #[must_use]
    pub const fn allow_recovery(mut self, value: bool) -> Self {
        self.allow_recovery = value;
        self
    }

    /// Sets whether `tell` verifies the underlying position.
    #[must_use]
    pub const fn verify_position(mut self, value: bool) -> Self {
        self.verify_position = value;
        self
    }
}
