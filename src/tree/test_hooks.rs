//! Test hooks for deterministic concurrency testing.
//!
//! The announce-wait hook fires on every iteration of the announce wait in
//! the [`Announced`](crate::tree::Announced) arrive. Tests use it to stand
//! in for a concurrent escalator and pin an interleaving that would
//! otherwise depend on timing.
//!
//! Only compiled into test builds.

use std::sync::{Mutex, OnceLock};

/// Hook type: a boxed closure that takes no arguments.
pub(crate) type TestHook = Box<dyn Fn() + Send + Sync>;

static ANNOUNCE_WAIT_HOOK: OnceLock<Mutex<Option<TestHook>>> = OnceLock::new();

/// Install the announce-wait hook.
pub(crate) fn set_announce_wait_hook(hook: TestHook) {
    let cell = ANNOUNCE_WAIT_HOOK.get_or_init(|| Mutex::new(None));
    *cell.lock().unwrap() = Some(hook);
}

/// Remove the announce-wait hook.
pub(crate) fn clear_announce_wait_hook() {
    if let Some(cell) = ANNOUNCE_WAIT_HOOK.get() {
        *cell.lock().unwrap() = None;
    }
}

/// Call site helper: invoke the hook if one is installed.
pub(crate) fn on_announce_wait() {
    if let Some(cell) = ANNOUNCE_WAIT_HOOK.get() {
        if let Some(hook) = cell.lock().unwrap().as_ref() {
            hook();
        }
    }
}
