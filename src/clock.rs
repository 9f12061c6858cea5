//! Time source used to stamp sensor samples.

use std::cell::OnceCell;
use std::time::Instant;

/// Monotonic time in seconds since an arbitrary origin.
pub trait Clock {
    fn now_seconds(&self) -> f64;
}

/// Wall-independent clock backed by [`Instant`].
///
/// The origin is taken on the first reading, so constructing one is free
/// even on `wasm32-unknown-unknown`, where reading it is not supported and
/// hosts pass explicit timestamps through `update_with_lid_angle_at`.
#[derive(Debug, Clone, Default)]
pub struct MonotonicClock {
    origin: OnceCell<Instant>,
}

impl MonotonicClock {
    pub fn new() -> Self {
        MonotonicClock {
            origin: OnceCell::new(),
        }
    }
}

impl Clock for MonotonicClock {
    fn now_seconds(&self) -> f64 {
        self.origin.get_or_init(Instant::now).elapsed().as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_never_goes_backwards() {
        let clock = MonotonicClock::new();
        let mut last = clock.now_seconds();
        for _ in 0..1000 {
            let now = clock.now_seconds();
            assert!(now >= last, "Clock went backwards: {now} < {last}");
            last = now;
        }
    }
}
