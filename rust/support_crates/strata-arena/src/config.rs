/// Default number of free buffers kept by a single size class.
pub const DEFAULT_MAX_RETAINED_PER_CLASS: usize = 64;

/// Configuration of an [`Arena`](crate::Arena).
#[derive(Debug, Clone)]
pub struct ArenaConfig {
    /// Maximum number of free buffers a single `(type, class)` pool retains.
    /// Buffers freed while the pool is full are released to the allocator.
    pub max_retained_per_class: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            max_retained_per_class: DEFAULT_MAX_RETAINED_PER_CLASS,
        }
    }
}

impl ArenaConfig {
    pub fn with_max_retained_per_class(mut self, max_retained: usize) -> Self {
        self.max_retained_per_class = max_retained;
        self
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_retained_per_class == 0 {
            return Err("max_retained_per_class must be greater than 0".to_string());
        }
        if self.max_retained_per_class > 1 << 16 {
            return Err("max_retained_per_class must not exceed 65536".to_string());
        }
        Ok(())
    }
}
