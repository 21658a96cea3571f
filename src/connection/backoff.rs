//! Reconnect delay policies.

use std::time::Duration;

/// Delay applied before reconnect attempt `n` (zero-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffPolicy {
    /// `min(base * 2^attempt, cap)`
    Exponential { base: Duration, cap: Duration },
    /// Same delay before every attempt.
    Fixed(Duration),
}

impl BackoffPolicy {
    pub const DEFAULT_BASE: Duration = Duration::from_millis(1000);
    pub const DEFAULT_CAP: Duration = Duration::from_millis(30_000);
    pub const DEFAULT_FIXED: Duration = Duration::from_millis(3000);

    pub fn exponential(base: Duration, cap: Duration) -> Self {
        Self::Exponential { base, cap }
    }

    pub fn fixed(delay: Duration) -> Self {
        Self::Fixed(delay)
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Self::Fixed(delay) => delay,
            Self::Exponential { base, cap } => {
                let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
                base.checked_mul(factor).unwrap_or(cap).min(cap)
            }
        }
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::exponential(Self::DEFAULT_BASE, Self::DEFAULT_CAP)
    }
}
