//! Per-type component columns.
//!
//! Each declared component type owns one [`Column`]: an append-only `Vec`
//! whose insertion order defines a value's [`SlotIndex`]. Slots are never
//! removed or compacted, so an issued index stays valid for the lifetime of
//! the column. Indices are handles, not addresses: appending may reallocate
//! the backing storage.
//!
//! The world keeps its columns type-erased behind [`AnyColumn`] and downcasts
//! to the concrete `Column<T>` on typed access.

use std::any::{type_name, Any};
use std::fmt;

use crate::component::Component;
use crate::EcsError;

// ---------------------------------------------------------------------------
// SlotIndex
// ---------------------------------------------------------------------------

/// Stable position of a component value within its type's column.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct SlotIndex(pub(crate) u32);

impl SlotIndex {
    /// Construct a slot index from a raw position.
    #[inline]
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    /// The raw position.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlotIndex({})", self.0)
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Column
// ---------------------------------------------------------------------------

/// Append-only, contiguous storage for one component type.
#[derive(Debug, Clone)]
pub struct Column<T> {
    values: Vec<T>,
}

impl<T: Component> Column<T> {
    /// Create an empty column.
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Append `value` and return the slot it landed in.
    pub fn push(&mut self, value: T) -> SlotIndex {
        let slot = SlotIndex(self.values.len() as u32);
        self.values.push(value);
        slot
    }

    /// Shared access to the value in `slot`.
    pub fn get(&self, slot: SlotIndex) -> Result<&T, EcsError> {
        let len = self.values.len();
        self.values
            .get(slot.index())
            .ok_or_else(|| out_of_range::<T>(slot, len))
    }

    /// Exclusive access to the value in `slot`.
    pub fn get_mut(&mut self, slot: SlotIndex) -> Result<&mut T, EcsError> {
        let len = self.values.len();
        self.values
            .get_mut(slot.index())
            .ok_or_else(|| out_of_range::<T>(slot, len))
    }

    /// Number of issued slots.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no slot has been issued yet.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All values in slot order.
    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.values.iter_mut()
    }
}

impl<T: Component> Default for Column<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn out_of_range<T>(slot: SlotIndex, len: usize) -> EcsError {
    EcsError::OutOfRange {
        component: type_name::<T>(),
        slot,
        len,
    }
}

// ---------------------------------------------------------------------------
// AnyColumn
// ---------------------------------------------------------------------------

/// Type-erased view of a [`Column`].
pub trait AnyColumn: Send + Sync + 'static {
    /// Number of issued slots.
    fn len(&self) -> usize;
    /// `type_name` of the stored component.
    fn component_type_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> AnyColumn for Column<T> {
    fn len(&self) -> usize {
        self.values.len()
    }

    fn component_type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl dyn AnyColumn {
    /// Downcast to the concrete column for `T`.
    pub fn typed<T: Component>(&self) -> Result<&Column<T>, EcsError> {
        let stored = self.component_type_name();
        self.as_any()
            .downcast_ref::<Column<T>>()
            .ok_or_else(|| mismatch::<T>(stored))
    }

    /// Mutable downcast to the concrete column for `T`.
    pub fn typed_mut<T: Component>(&mut self) -> Result<&mut Column<T>, EcsError> {
        let stored = self.component_type_name();
        self.as_any_mut()
            .downcast_mut::<Column<T>>()
            .ok_or_else(|| mismatch::<T>(stored))
    }
}

fn mismatch<T>(stored: &'static str) -> EcsError {
    EcsError::ColumnTypeMismatch {
        requested: type_name::<T>(),
        stored,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
