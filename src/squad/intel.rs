// Shared intel channel: one `{location, ttl}` slot per squad.
//
// Any member that currently sees the target overwrites the slot; every member
// reads it. It decays on its own clock, independent of any single agent.

use glam::Vec2;

/// Squad-wide belief about where the target was last seen.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SquadIntel {
    spot: Vec2,
    time_to_live: f32,
}

impl SquadIntel {
    /// Last writer wins; writers only ever publish fresh sightings.
    pub fn publish(&mut self, spot: Vec2, ttl: f32) {
        self.spot = spot;
        self.time_to_live = ttl.max(0.0);
    }

    /// Count down by `dt`, never below zero.
    pub fn decay(&mut self, dt: f32) {
        self.time_to_live = (self.time_to_live - dt).max(0.0);
    }

    /// Drop the lead, e.g. once a searcher reached the spot and found nothing.
    pub fn clear(&mut self) {
        self.time_to_live = 0.0;
    }

    #[inline]
    pub fn is_fresh(&self) -> bool {
        self.time_to_live > 0.0
    }

    #[inline]
    pub fn time_to_live(&self) -> f32 {
        self.time_to_live
    }

    /// The shared spot while the lead is still fresh. Squad-global: it need
    /// not match the reader's own tracking.
    pub fn lead(&self) -> Option<Vec2> {
        self.is_fresh().then_some(self.spot)
    }
}

/// Index of a squad within a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SquadId(pub u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decays_monotonically_to_zero() {
        let mut intel = SquadIntel::default();
        intel.publish(Vec2::new(10.0, 20.0), 2.5);
        let mut prev = intel.time_to_live();
        for _ in 0..40 {
            intel.decay(0.1);
            assert!(intel.time_to_live() <= prev);
            assert!(intel.time_to_live() >= 0.0);
            prev = intel.time_to_live();
        }
        assert_eq!(intel.time_to_live(), 0.0);
        assert_eq!(intel.lead(), None);
    }

    #[test]
    fn fresher_sighting_overwrites_mid_decay() {
        let mut intel = SquadIntel::default();
        intel.publish(Vec2::new(1.0, 1.0), 2.5);
        intel.decay(2.0);
        intel.publish(Vec2::new(5.0, 6.0), 2.5);
        assert_eq!(intel.lead(), Some(Vec2::new(5.0, 6.0)));
        assert_eq!(intel.time_to_live(), 2.5);
    }

    #[test]
    fn clear_drops_the_lead() {
        let mut intel = SquadIntel::default();
        intel.publish(Vec2::ONE, 1.0);
        assert!(intel.is_fresh());
        intel.clear();
        assert!(!intel.is_fresh());
    }
}
