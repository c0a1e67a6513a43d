//! Tick-counted lifetimes shared by entities and field sources.

use serde::{Deserialize, Serialize};

/// Remaining and maximum life in ticks.
///
/// `remaining` only ever decreases. It saturates at zero, at which point the
/// owner is expired and gets removed before the next render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifetime {
    remaining: u32,
    max: u32,
}

impl Lifetime {
    /// A fresh lifetime of `max` ticks.
    pub fn new(max: u32) -> Self {
        Self { remaining: max, max }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// Consumes one tick.
    pub fn tick(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    /// Caps the remaining life at `ticks`, never raising it.
    pub fn shorten_to(&mut self, ticks: u32) {
        self.remaining = self.remaining.min(ticks);
    }

    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }

    /// `remaining / max` in [0, 1]; 0 for a zero-length lifetime.
    pub fn fraction(&self) -> f64 {
        if self.max == 0 {
            0.0
        } else {
            self.remaining as f64 / self.max as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_lifetime_is_full() {
        let life = Lifetime::new(5);
        assert_eq!(life.remaining(), 5);
        assert_eq!(life.max(), 5);
        assert!((life.fraction() - 1.0).abs() < f64::EPSILON);
        assert!(!life.is_expired());
    }

    #[test]
    fn tick_counts_down_and_saturates() {
        let mut life = Lifetime::new(2);
        life.tick();
        assert_eq!(life.remaining(), 1);
        life.tick();
        assert!(life.is_expired());
        life.tick();
        assert_eq!(life.remaining(), 0);
    }

    #[test]
    fn zero_lifetime_is_expired_with_zero_fraction() {
        let life = Lifetime::new(0);
        assert!(life.is_expired());
        assert_eq!(life.fraction(), 0.0);
    }

    #[test]
    fn shorten_to_never_extends() {
        let mut life = Lifetime::new(10);
        life.shorten_to(3);
        assert_eq!(life.remaining(), 3);
        life.shorten_to(8);
        assert_eq!(life.remaining(), 3);
    }
}
