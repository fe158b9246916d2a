//! Indexed and sliced access to the values held by a stack.
//!
//! Scope and entry indices follow the usual sequence conventions: `0` is
//! the oldest, `-1` the newest. Point lookups fail with
//! [`StackError::IndexOutOfRange`]; entry slices clamp their bounds and
//! never fail.

use super::Contexter;
use super::release::{Entry, Scope};
use crate::error::StackError;
use core::any::Any;
use core::ops::{Bound, Range, RangeBounds};

/// Resolves a possibly negative index against `len`.
fn resolve_index(index: isize, len: usize) -> Option<usize> {
    let signed_len = isize::try_from(len).ok()?;
    let absolute = if index < 0 { index + signed_len } else { index };
    usize::try_from(absolute)
        .ok()
        .filter(|&position| position < len)
}

/// Resolves slice bounds against `len`, clamping like a sequence slice.
fn resolve_range(range: &impl RangeBounds<isize>, len: usize) -> Range<usize> {
    let len = isize::try_from(len).unwrap_or(isize::MAX);
    let absolute = |bound: isize| {
        if bound < 0 {
            bound.saturating_add(len)
        } else {
            bound
        }
    };
    let start = match range.start_bound() {
        Bound::Included(&start) => absolute(start),
        Bound::Excluded(&start) => absolute(start).saturating_add(1),
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&end) => absolute(end).saturating_add(1),
        Bound::Excluded(&end) => absolute(end),
        Bound::Unbounded => len,
    };

    // Both bounds are clamped into 0..=len, so the conversions cannot fail.
    let start = usize::try_from(start.clamp(0, len)).unwrap_or_default();
    let end = usize::try_from(end.clamp(0, len)).unwrap_or_default();
    start..end.max(start)
}

impl Contexter {
    fn scope_at(&self, scope: isize) -> Result<&Scope, StackError> {
        resolve_index(scope, self.scopes.len())
            .map(|index| &self.scopes[index])
            .ok_or_else(|| StackError::scope_out_of_range(scope, self.scopes.len()))
    }

    /// Returns the values of the innermost scope in registration order.
    ///
    /// # Errors
    ///
    /// [`StackError::IndexOutOfRange`] if no scope is active.
    pub fn values(&self) -> Result<Vec<&dyn Any>, StackError> {
        self.values_in(-1)
    }

    /// Returns the values of the selected scope in registration order.
    ///
    /// `scope` counts from the outermost scope (`0`) or, when negative, from
    /// the innermost (`-1`).
    ///
    /// # Errors
    ///
    /// [`StackError::IndexOutOfRange`] if the scope does not exist.
    pub fn values_in(&self, scope: isize) -> Result<Vec<&dyn Any>, StackError> {
        Ok(self.scope_at(scope)?.entries().iter().map(Entry::value).collect())
    }

    /// Returns the value at `index` in the innermost scope.
    ///
    /// # Errors
    ///
    /// [`StackError::IndexOutOfRange`] if no scope is active or the index
    /// does not exist.
    pub fn get(&self, index: isize) -> Result<&dyn Any, StackError> {
        self.get_in(index, -1)
    }

    /// Returns the value at `index` in the selected scope.
    ///
    /// # Errors
    ///
    /// [`StackError::IndexOutOfRange`] if the scope or the index does not exist.
    pub fn get_in(&self, index: isize, scope: isize) -> Result<&dyn Any, StackError> {
        let scope = self.scope_at(scope)?;
        resolve_index(index, scope.len())
            .and_then(|position| scope.get(position))
            .map(Entry::value)
            .ok_or_else(|| StackError::entry_out_of_range(index, scope.len()))
    }

    /// Returns the value at `index` in the innermost scope, downcast to `T`.
    ///
    /// # Errors
    ///
    /// - [`StackError::IndexOutOfRange`] if the index does not exist
    /// - [`StackError::ValueType`] if the value is not a `T`
    pub fn value<T: Any>(&self, index: isize) -> Result<&T, StackError> {
        self.value_in(index, -1)
    }

    /// Returns the value at `index` in the selected scope, downcast to `T`.
    ///
    /// # Errors
    ///
    /// - [`StackError::IndexOutOfRange`] if the scope or the index does not exist
    /// - [`StackError::ValueType`] if the value is not a `T`
    pub fn value_in<T: Any>(&self, index: isize, scope: isize) -> Result<&T, StackError> {
        self.get_in(index, scope)?
            .downcast_ref::<T>()
            .ok_or(StackError::ValueType {
                index,
                expected: core::any::type_name::<T>(),
            })
    }

    /// Returns the values of the innermost scope within `range`.
    ///
    /// # Example
    ///
    /// ```
    /// use contexter_stack::resource::ExitCallback;
    /// use contexter_stack::stack::Contexter;
    ///
    /// let mut stack = Contexter::default();
    /// stack.activate().unwrap();
    /// for _ in 0..4 {
    ///     stack.register(ExitCallback::new(|_| Ok(false))).unwrap();
    /// }
    ///
    /// assert_eq!(stack.slice(1..).unwrap().len(), 3);
    /// assert_eq!(stack.slice(-2..).unwrap().len(), 2);
    /// assert_eq!(stack.slice(..10).unwrap().len(), 4);
    /// assert!(stack.slice(3..1).unwrap().is_empty());
    /// ```
    ///
    /// # Errors
    ///
    /// [`StackError::IndexOutOfRange`] if no scope is active.
    pub fn slice(&self, range: impl RangeBounds<isize>) -> Result<Vec<&dyn Any>, StackError> {
        self.slice_in(range, -1)
    }

    /// Returns the values of the selected scope within `range`.
    ///
    /// # Errors
    ///
    /// [`StackError::IndexOutOfRange`] if the scope does not exist.
    pub fn slice_in(
        &self,
        range: impl RangeBounds<isize>,
        scope: isize,
    ) -> Result<Vec<&dyn Any>, StackError> {
        let scope = self.scope_at(scope)?;
        let entries = scope.entries();
        Ok(entries[resolve_range(&range, entries.len())]
            .iter()
            .map(Entry::value)
            .collect())
    }
}
