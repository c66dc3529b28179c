//! Exponential backoff for contended CAS loops.

use crate::sync;

/// Stack-local exponential backoff.
///
/// Each call to [`wait`](Backoff::wait) busy-waits for the current try
/// count in CPU pause hints and doubles it, up to [`Backoff::MAX_TRIES`]
/// pauses per call. Once the try count exceeds the cap, further calls yield
/// the thread to the scheduler instead of spinning.
///
/// The pause hint has no memory effect; it only relaxes the CPU pipeline
/// while another core makes progress on the contended line.
#[derive(Debug, Clone)]
pub struct Backoff {
    tries: usize,
}

impl Backoff {
    /// Spin cap. Beyond this the backoff degrades to a scheduler yield.
    pub const MAX_TRIES: usize = 16;

    /// Create a backoff in its initial state.
    #[must_use]
    pub const fn new() -> Self {
        Self { tries: 1 }
    }

    /// Wait for the current backoff delay and escalate it.
    #[inline]
    pub fn wait(&mut self) {
        if self.tries <= Self::MAX_TRIES {
            for _ in 0..self.tries {
                core::hint::spin_loop();
            }
            self.tries *= 2;
        } else {
            sync::yield_now();
        }
    }

    /// Restore the initial delay.
    #[inline]
    pub fn reset(&mut self) {
        self.tries = 1;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}
