// SPDX-License-Identifier: MPL-2.0
//! Diagnostics newtypes.
//!
//! This module provides type-safe wrappers for diagnostics values,
//! ensuring they are always within valid ranges.

// =============================================================================
// Buffer Capacity Bounds
// =============================================================================

/// Per-category log buffer bounds (10 to 100000 entries).
pub mod buffer_capacity_bounds {
    /// Minimum buffer capacity.
    pub const MIN: usize = 10;
    /// Maximum buffer capacity.
    pub const MAX: usize = 100_000;
    /// Default buffer capacity.
    pub const DEFAULT: usize = 1000;
}

// =============================================================================
// BufferCapacity
// =============================================================================

/// Maximum number of entries kept in each in-memory log category.
///
/// This newtype enforces validity at the type level, ensuring the value
/// is always within the valid range (10–100000 entries).
///
/// # Example
///
/// ```ignore
/// let capacity = BufferCapacity::new(1000);
/// assert_eq!(capacity.value(), 1000);
///
/// // Values outside range are clamped
/// let too_high = BufferCapacity::new(500_000);
/// assert_eq!(too_high.value(), 100_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferCapacity(usize);

impl BufferCapacity {
    /// Creates a new buffer capacity, clamping to valid range.
    #[must_use]
    pub fn new(value: usize) -> Self {
        Self(value.clamp(buffer_capacity_bounds::MIN, buffer_capacity_bounds::MAX))
    }

    /// Returns the value as usize.
    #[must_use]
    pub fn value(self) -> usize {
        self.0
    }

    /// Returns true if this is the minimum value.
    #[must_use]
    pub fn is_min(self) -> bool {
        self.0 <= buffer_capacity_bounds::MIN
    }

    /// Returns true if this is the maximum value.
    #[must_use]
    pub fn is_max(self) -> bool {
        self.0 >= buffer_capacity_bounds::MAX
    }
}

impl Default for BufferCapacity {
    fn default() -> Self {
        Self(buffer_capacity_bounds::DEFAULT)
    }
}

// =============================================================================
// Mirror Capacity Bounds
// =============================================================================

/// Persisted error mirror bounds (1 to 1000 entries).
pub mod mirror_capacity_bounds {
    /// Minimum mirror capacity.
    pub const MIN: usize = 1;
    /// Maximum mirror capacity.
    pub const MAX: usize = 1000;
    /// Default mirror capacity.
    pub const DEFAULT: usize = 100;
}

// =============================================================================
// MirrorCapacity
// =============================================================================

/// Maximum number of error entries kept in durable storage.
///
/// Kept much smaller than [`BufferCapacity`] because the whole mirror is
/// rewritten on every recorded error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirrorCapacity(usize);

impl MirrorCapacity {
    /// Creates a new mirror capacity, clamping to valid range.
    #[must_use]
    pub fn new(value: usize) -> Self {
        Self(value.clamp(mirror_capacity_bounds::MIN, mirror_capacity_bounds::MAX))
    }

    /// Returns the value as usize.
    #[must_use]
    pub fn value(self) -> usize {
        self.0
    }
}

impl Default for MirrorCapacity {
    fn default() -> Self {
        Self(mirror_capacity_bounds::DEFAULT)
    }
}

// =============================================================================
// Tests
// =============================================================================
