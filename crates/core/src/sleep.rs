use std::time::Duration;

use rand::Rng;

/// Fraction of a delay that humanization may add or remove.
pub const JITTER_FRACTION: f64 = 0.25;

/// Source of the random offset applied to humanized delays.
///
/// `offset(span)` returns a value in `-span..=span`. Tests substitute a
/// deterministic source.
pub trait Jitter: Send + Sync {
    fn offset(&self, span: u64) -> i64;
}

/// Uniform jitter from the thread-local RNG.
pub struct RandomJitter;

impl Jitter for RandomJitter {
    fn offset(&self, span: u64) -> i64 {
        let span = span as i64;
        rand::thread_rng().gen_range(-span..=span)
    }
}

/// Always returns the same offset, clamped to the allowed span.
pub struct FixedJitter(pub i64);

impl Jitter for FixedJitter {
    fn offset(&self, span: u64) -> i64 {
        let span = span as i64;
        self.0.clamp(-span, span)
    }
}

/// Apply ±25% jitter to `ms` when `humanize` is on; exact otherwise.
pub fn jittered_ms(ms: u64, humanize: bool, jitter: &dyn Jitter) -> u64 {
    if !humanize || ms == 0 {
        return ms;
    }
    let span = (ms as f64 * JITTER_FRACTION) as u64;
    if span == 0 {
        return ms;
    }
    (ms as i64 + jitter.offset(span)).max(0) as u64
}

/// Scale a delay by `factor` (1.0 = real time, 0.0 = instant).
pub fn scaled(ms: u64, factor: f64) -> Duration {
    if factor <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(ms as f64 * factor / 1000.0)
}
