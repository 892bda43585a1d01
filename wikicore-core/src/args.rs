//! Event arguments passed to handlers by mutable reference.
//!
//! Every handler of an event sees the same [`HookArgs`]: a mutation made by
//! an earlier handler is visible to the next one. Arguments are type-erased
//! and recovered through checked downcasts, so a handler written against the
//! wrong argument shape fails with an [`ArgumentError`] instead of misreading
//! memory.

use crate::error::ArgumentError;
use std::any::{Any, type_name};
use std::fmt;

/// The ordered argument list of one event dispatch.
#[derive(Default)]
pub struct HookArgs<'a> {
    slots: Vec<&'a mut dyn Any>,
}

impl<'a> HookArgs<'a> {
    /// Create an empty argument list.
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Append an argument (builder form).
    pub fn with<T: Any>(mut self, value: &'a mut T) -> Self {
        self.push(value);
        self
    }

    /// Append an argument.
    pub fn push<T: Any>(&mut self, value: &'a mut T) {
        self.slots.push(value);
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Fail unless exactly `expected` arguments were passed.
    pub fn expect_arity(&self, expected: usize) -> Result<(), ArgumentError> {
        if self.slots.len() == expected {
            Ok(())
        } else {
            Err(ArgumentError::Arity {
                expected,
                actual: self.slots.len(),
            })
        }
    }

    /// Borrow the argument at `index` as a `T`.
    pub fn get<T: Any>(&self, index: usize) -> Result<&T, ArgumentError> {
        let slot = self
            .slots
            .get(index)
            .ok_or(ArgumentError::Missing { index })?;
        slot.downcast_ref::<T>().ok_or(ArgumentError::Type {
            index,
            expected: type_name::<T>(),
        })
    }

    /// Mutably borrow the argument at `index` as a `T`.
    pub fn get_mut<T: Any>(&mut self, index: usize) -> Result<&mut T, ArgumentError> {
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(ArgumentError::Missing { index })?;
        slot.downcast_mut::<T>().ok_or(ArgumentError::Type {
            index,
            expected: type_name::<T>(),
        })
    }

    /// Mutably borrow two distinct arguments at once.
    pub fn pair_mut<A: Any, B: Any>(
        &mut self,
        first: usize,
        second: usize,
    ) -> Result<(&mut A, &mut B), ArgumentError> {
        if first == second {
            return Err(ArgumentError::Aliased { index: second });
        }
        let len = self.slots.len();
        for index in [first, second] {
            if index >= len {
                return Err(ArgumentError::Missing { index });
            }
        }

        let (a, b): (&mut dyn Any, &mut dyn Any) = if first < second {
            let (left, right) = self.slots.split_at_mut(second);
            (&mut *left[first], &mut *right[0])
        } else {
            let (left, right) = self.slots.split_at_mut(first);
            (&mut *right[0], &mut *left[second])
        };

        let a = a.downcast_mut::<A>().ok_or(ArgumentError::Type {
            index: first,
            expected: type_name::<A>(),
        })?;
        let b = b.downcast_mut::<B>().ok_or(ArgumentError::Type {
            index: second,
            expected: type_name::<B>(),
        })?;
        Ok((a, b))
    }
}

impl fmt::Debug for HookArgs<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookArgs")
            .field("len", &self.slots.len())
            .finish()
    }
}

/// Build a [`HookArgs`] from mutable references.
///
/// ```rust,ignore
/// let mut title = String::from("Main_Page");
/// let mut unused = false;
/// let args = hook_args![&mut title, &mut unused];
/// ```
#[macro_export]
macro_rules! hook_args {
    () => {
        $crate::HookArgs::new()
    };
    ($($arg:expr),+ $(,)?) => {
        $crate::HookArgs::new()$(.with($arg))+
    };
}
