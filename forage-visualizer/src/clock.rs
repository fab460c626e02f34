use std::time::Duration;

/// Suspends the poll loop between requests.
pub trait Clock {
    fn sleep(&mut self, duration: Duration);
}

/// Wall-clock sleeping on the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
