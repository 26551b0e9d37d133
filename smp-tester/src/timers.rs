//! Timers that are used by the test runner.
use core::future::Future;

/// The timer trait to implement by the host application.
pub trait Timer {
    /// Expire after the specified number of milliseconds.
    fn after_millis(milliseconds: u64) -> impl Future<Output = ()>;
}
