//! The allocation contract every dynamic buffer in this crate grows through.
//!
//! [`JsonParser`](crate::JsonParser) and [`JsonWriter`](crate::writer::JsonWriter)
//! never call `Vec::push`/`Vec::reserve` directly on their growable buffers
//! (the string buffer and the nesting stack). Instead every growth goes
//! through an [`Allocator`], which gets a chance to refuse the request. The
//! default [`SystemAllocator`] never refuses; a test can supply an allocator
//! that fails at a chosen call to exercise the out-of-memory paths described
//! in spec section 8 ("Allocator-failure safety") without any unsafe code.

use thiserror::Error;

/// Returned when an [`Allocator`] refuses to grow a buffer.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("out of memory")]
pub struct OutOfMemory;

/// The allocation contract: `{ allocate, reallocate, release }` plus a
/// user-data cookie, as described in spec section 4.1. In idiomatic Rust the
/// "release" side is handled by `Drop` on the owning `Vec`, so the trait only
/// needs to model the fallible growth side: "is it OK to grow by this many
/// more elements?"
pub trait Allocator {
    /// Called before a buffer grows by `additional` elements. Returning
    /// `Err` aborts the growth and is surfaced to the client as
    /// [`OutOfMemory`].
    fn reserve(&mut self, additional: usize) -> Result<(), OutOfMemory>;
}

/// The default allocator. Delegates to the system allocator via
/// `Vec::try_reserve` and never refuses on its own account.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAllocator;

impl Allocator for SystemAllocator {
    fn reserve(&mut self, _additional: usize) -> Result<(), OutOfMemory> {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::{Allocator, OutOfMemory};

    /// An allocator that fails on its `fail_at`-th call (1-indexed) and
    /// every call after. Used to test that failure at any allocation point
    /// terminates the parse/write cleanly.
    pub struct FailingAllocator {
        pub fail_at: usize,
        pub calls: usize,
    }

    impl FailingAllocator {
        pub fn new(fail_at: usize) -> Self {
            FailingAllocator { fail_at, calls: 0 }
        }
    }

    impl Allocator for FailingAllocator {
        fn reserve(&mut self, _additional: usize) -> Result<(), OutOfMemory> {
            self.calls += 1;
            if self.calls >= self.fail_at {
                Err(OutOfMemory)
            } else {
                Ok(())
            }
        }
    }
}
