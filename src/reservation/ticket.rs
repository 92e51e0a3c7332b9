//! Reservation lifecycle shared by every kind of claim
//!
//! A reservation starts pending, becomes ready when its owner can satisfy
//! it, and ends invalid either through an explicit release or because it
//! sat ready and unused for its whole grant lifetime. Pending reservations
//! never expire on their own.

use serde::{Deserialize, Serialize};

/// Observable state of a reservation, as seen by its holder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimStatus {
    /// Queued, waiting for its owner to grant it
    Pending,
    /// Granted and running its expiry timer
    Ready,
    /// Released, expired, or purged by its owner
    Invalid,
}

/// Lifecycle flags and expiry timer of a single claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    valid: bool,
    ready: bool,
    timer: u32,
}

impl Reservation {
    pub fn new() -> Self {
        Self {
            valid: true,
            ready: false,
            timer: 0,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Granted and not yet released or expired
    pub fn is_ready(&self) -> bool {
        self.valid && self.ready
    }

    pub fn is_pending(&self) -> bool {
        self.valid && !self.ready
    }

    /// Ticks left before a ready reservation is force-released
    pub fn timer(&self) -> u32 {
        self.timer
    }

    pub fn status(&self) -> ClaimStatus {
        if !self.valid {
            ClaimStatus::Invalid
        } else if self.ready {
            ClaimStatus::Ready
        } else {
            ClaimStatus::Pending
        }
    }

    /// Grant the claim and start its expiry timer
    ///
    /// Returns false without effect if the claim is already ready or invalid.
    /// A grant always lasts at least one tick.
    pub fn make_ready(&mut self, lifetime: u32) -> bool {
        if !self.valid || self.ready {
            return false;
        }
        self.ready = true;
        self.timer = lifetime.max(1);
        true
    }

    /// Invalidate the claim
    ///
    /// Returns true only for the call that actually invalidated it.
    pub fn release(&mut self) -> bool {
        let was_valid = self.valid;
        self.valid = false;
        was_valid
    }

    /// Advance one tick; returns true if the claim expired on this tick
    pub fn update(&mut self) -> bool {
        if !self.is_ready() {
            return false;
        }
        self.timer = self.timer.saturating_sub(1);
        if self.timer == 0 {
            self.valid = false;
            return true;
        }
        false
    }
}

impl Default for Reservation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_reservation_is_pending() {
        let r = Reservation::new();
        assert!(r.is_valid());
        assert!(!r.is_ready());
        assert_eq!(r.status(), ClaimStatus::Pending);
    }

    #[test]
    fn test_pending_never_expires() {
        let mut r = Reservation::new();
        for _ in 0..10_000 {
            assert!(!r.update());
        }
        assert_eq!(r.status(), ClaimStatus::Pending);
    }

    #[test]
    fn test_expires_exactly_at_lifetime() {
        let mut r = Reservation::new();
        assert!(r.make_ready(2500));
        for _ in 0..2499 {
            assert!(!r.update());
            assert!(r.is_valid());
        }
        assert!(r.update());
        assert!(!r.is_valid());
        assert_eq!(r.status(), ClaimStatus::Invalid);
        // Further updates do nothing
        assert!(!r.update());
    }

    #[test]
    fn test_zero_lifetime_grant_lasts_one_tick() {
        let mut r = Reservation::new();
        assert!(r.make_ready(0));
        assert_eq!(r.status(), ClaimStatus::Ready);
        assert_eq!(r.timer(), 1);
        assert!(r.update());
        assert_eq!(r.status(), ClaimStatus::Invalid);
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut r = Reservation::new();
        r.make_ready(10);
        assert!(r.release());
        assert!(!r.release());
        assert!(!r.release());
        assert!(!r.is_valid());
    }

    #[test]
    fn test_make_ready_after_release_is_noop() {
        let mut r = Reservation::new();
        r.release();
        assert!(!r.make_ready(10));
        assert_eq!(r.status(), ClaimStatus::Invalid);
    }

    #[test]
    fn test_make_ready_twice_keeps_timer() {
        let mut r = Reservation::new();
        r.make_ready(10);
        r.update();
        assert!(!r.make_ready(10));
        assert_eq!(r.timer(), 9);
    }
}
