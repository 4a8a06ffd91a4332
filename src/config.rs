//! Allocator configuration

/// Knobs for [`crate::GraphColoringAllocator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocatorConfig {
    /// Rounds allowed before the spill loop is reported as not converging.
    /// Values below 1 are treated as 1.
    pub max_rounds: usize,
    /// Share a stack slot between spilled registers whose ranges don't overlap
    pub reuse_spill_slots: bool,
    /// When a preferred register can't be used, try the class allocation
    /// order before spilling
    pub hint_fallback: bool,
    /// Check the final assignment against the live ranges before returning
    pub verify: bool,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            max_rounds: 32,
            reuse_spill_slots: true,
            hint_fallback: false,
            verify: cfg!(debug_assertions),
        }
    }
}
