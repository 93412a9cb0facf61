//! Arena configuration parameters.

use crate::error::ArenaError;
use crate::header::HEADER_SIZE;

/// Configuration for the buddy arena.
///
/// Controls how many elements the arena is sized for. Validated at
/// construction; the arena never grows afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Number of elements the caller expects to store.
    ///
    /// Rounded up to the next power of two. Default: 1024.
    pub requested_elements: u32,

    /// Floor on the element slot count.
    ///
    /// Default: 1024. Must be a non-zero power of two.
    pub min_elements: u32,
}

impl ArenaConfig {
    /// Default requested element count.
    pub const DEFAULT_REQUESTED_ELEMENTS: u32 = 1024;

    /// Default element slot floor.
    pub const DEFAULT_MIN_ELEMENTS: u32 = 1024;

    /// Largest arena the 32-bit block header can describe.
    pub const MAX_CAPACITY_BYTES: usize = 1 << 31;

    /// Create a config sized for `requested_elements`, with the default floor.
    pub fn new(requested_elements: u32) -> Self {
        Self {
            requested_elements,
            min_elements: Self::DEFAULT_MIN_ELEMENTS,
        }
    }

    /// Element slots reserved: `max(min_elements, next_power_of_two(requested))`.
    pub fn element_slots(&self) -> usize {
        (self.requested_elements as usize)
            .checked_next_power_of_two()
            .unwrap_or(usize::MAX)
            .max(self.min_elements as usize)
    }

    /// Arena size in bytes for elements of `element_size` bytes.
    ///
    /// Rounded up to a power of two so the whole arena is itself a valid
    /// buddy block. Returns `None` on overflow.
    pub fn capacity_bytes(&self, element_size: usize) -> Option<usize> {
        self.element_slots()
            .checked_mul(element_size)?
            .checked_next_power_of_two()
    }

    /// Check the config and return the arena size in bytes.
    pub fn validate(&self, element_size: usize) -> Result<usize, ArenaError> {
        if !self.min_elements.is_power_of_two() {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "min_elements must be a non-zero power of two, got {}",
                    self.min_elements
                ),
            });
        }
        if element_size == 0 {
            return Err(ArenaError::InvalidConfig {
                reason: "zero-sized elements cannot be stored".into(),
            });
        }
        let bytes = self
            .capacity_bytes(element_size)
            .filter(|&b| b <= Self::MAX_CAPACITY_BYTES)
            .ok_or_else(|| ArenaError::InvalidConfig {
                reason: format!(
                    "{} elements of {element_size} bytes exceed the {} byte limit",
                    self.element_slots(),
                    Self::MAX_CAPACITY_BYTES
                ),
            })?;
        if bytes < HEADER_SIZE {
            return Err(ArenaError::InvalidConfig {
                reason: format!("{bytes} bytes cannot hold a {HEADER_SIZE} byte block header"),
            });
        }
        Ok(bytes)
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_REQUESTED_ELEMENTS)
    }
}
