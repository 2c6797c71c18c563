//! Lock-free primitives shared between the real-time and control threads.

use atomic_float::AtomicF32;
use std::sync::atomic::{AtomicBool, Ordering};

/// f32 shared between a parameter's writers and the audio thread.
#[derive(Debug, Default)]
pub struct AtomicFloat(AtomicF32);

impl AtomicFloat {
    pub fn new(value: f32) -> Self {
        Self(AtomicF32::new(value))
    }

    #[inline]
    pub fn get(&self) -> f32 {
        self.0.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set(&self, value: f32) {
        self.0.store(value, Ordering::Release);
    }

    /// Store `value`, returning the previous one.
    #[inline]
    pub fn swap(&self, value: f32) -> f32 {
        self.0.swap(value, Ordering::AcqRel)
    }
}

/// Reentrancy marker, only ever raised through [`ScopedFlag`].
#[derive(Debug, Default)]
pub struct AtomicFlag(AtomicBool);

impl AtomicFlag {
    #[inline]
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Holds an [`AtomicFlag`] raised for its lifetime.
///
/// `try_raise` fails when the flag is already up, which is how a change
/// already being propagated suppresses its own echo.
pub struct ScopedFlag<'a> {
    flag: &'a AtomicFlag,
}

impl<'a> ScopedFlag<'a> {
    pub fn try_raise(flag: &'a AtomicFlag) -> Option<Self> {
        if flag.0.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some(Self { flag })
    }
}

impl Drop for ScopedFlag<'_> {
    fn drop(&mut self) {
        self.flag.0.store(false, Ordering::Release);
    }
}
