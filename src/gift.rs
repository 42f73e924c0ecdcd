//! Firefly jar: scooping phase, catch accumulator and the post-gift cooldown.

use crate::feeding::FeedingInteraction;
use crate::model::{JarPhase, Millis};
use crate::timer::DeferredQueue;
use crate::tuning::Tuning;
use tracing::debug;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct JarSession {
    pub phase: JarPhase,
    pub jar_count: u32,
    pub pressing: bool,
    pub cooling_down: bool,
    pub drag_x: f32,
    pub drag_y: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct CooldownEnd;

#[derive(Debug, Default)]
pub struct GiftInteraction {
    jar: JarSession,
    releases: DeferredQueue<CooldownEnd>,
}

impl GiftInteraction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jar(&self) -> JarSession {
        self.jar
    }

    pub fn phase(&self) -> JarPhase {
        self.jar.phase
    }

    pub fn jar_count(&self) -> u32 {
        self.jar.jar_count
    }

    pub fn is_scooping(&self) -> bool {
        self.jar.phase == JarPhase::Scooping
    }

    pub fn is_pressing(&self) -> bool {
        self.jar.pressing
    }

    pub fn is_cooling_down(&self) -> bool {
        self.jar.cooling_down
    }

    /// Opens or closes the jar. Inert during the gift cooldown and while food is being dragged.
    /// Closing keeps whatever is already in the jar.
    pub fn toggle_jar(&mut self, feeding: &FeedingInteraction, anchor: Option<(f32, f32)>) {
        if self.jar.cooling_down || feeding.is_dragging() {
            return;
        }
        match self.jar.phase {
            JarPhase::Idle => {
                let (x, y) = anchor.unwrap_or((0.0, 0.0));
                self.jar.phase = JarPhase::Scooping;
                self.jar.pressing = false;
                self.jar.drag_x = x;
                self.jar.drag_y = y;
            }
            JarPhase::Scooping => {
                self.jar.phase = JarPhase::Idle;
                self.jar.pressing = false;
            }
        }
    }

    pub fn start_scoop(&mut self, x: f32, y: f32) {
        if !self.is_scooping() {
            return;
        }
        self.jar.pressing = true;
        self.jar.drag_x = x;
        self.jar.drag_y = y;
    }

    pub fn update_drag(&mut self, x: f32, y: f32) {
        if !self.is_scooping() {
            return;
        }
        self.jar.drag_x = x;
        self.jar.drag_y = y;
    }

    pub fn end_scoop(&mut self) {
        self.jar.pressing = false;
    }

    /// Called once per firefly the cursor caught.
    pub fn add_catch(&mut self) {
        if !self.is_scooping() {
            return;
        }
        self.jar.jar_count = self.jar.jar_count.saturating_add(1);
    }

    /// Empties the jar, closes it and starts the cooldown. Returns what was in the jar.
    pub fn deliver_gift(&mut self, now: Millis, tuning: &Tuning) -> u32 {
        let count = self.jar.jar_count;
        self.jar.jar_count = 0;
        self.jar.phase = JarPhase::Idle;
        self.jar.pressing = false;
        self.jar.cooling_down = true;
        self.releases.schedule(now, tuning.jar.cooldown_ms, CooldownEnd);
        debug!(count, "gift delivered");
        count
    }

    pub fn pump(&mut self, now: Millis) {
        if !self.releases.drain_due(now).is_empty() {
            self.jar.cooling_down = false;
        }
    }

    pub fn reset(&mut self) {
        self.jar = JarSession::default();
        self.releases.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FoodType, Viewport};

    fn scooping_with(count: u32) -> GiftInteraction {
        let feeding = FeedingInteraction::new();
        let mut g = GiftInteraction::new();
        g.toggle_jar(&feeding, Some((12.0, 34.0)));
        for _ in 0..count {
            g.add_catch();
        }
        g
    }

    #[test]
    fn toggle_seeds_anchor_and_keeps_contents() {
        let feeding = FeedingInteraction::new();
        let mut g = scooping_with(3);
        assert_eq!(g.jar().drag_x, 12.0);
        assert_eq!(g.jar().drag_y, 34.0);

        g.toggle_jar(&feeding, None);
        assert_eq!(g.phase(), JarPhase::Idle);
        assert_eq!(g.jar_count(), 3);

        g.toggle_jar(&feeding, None);
        assert_eq!(g.phase(), JarPhase::Scooping);
        assert_eq!(g.jar().drag_x, 0.0);
    }

    #[test]
    fn deliver_returns_count_and_closes_jar() {
        let tuning = Tuning::default();
        let feeding = FeedingInteraction::new();
        let mut g = scooping_with(7);
        g.start_scoop(1.0, 1.0);

        assert_eq!(g.deliver_gift(Millis(100), &tuning), 7);
        assert_eq!(g.jar_count(), 0);
        assert_eq!(g.phase(), JarPhase::Idle);
        assert!(!g.is_pressing());

        g.toggle_jar(&feeding, None);
        assert_eq!(g.phase(), JarPhase::Idle);

        g.pump(Millis(1_100));
        assert!(!g.is_cooling_down());
        g.toggle_jar(&feeding, None);
        assert_eq!(g.phase(), JarPhase::Scooping);
    }

    #[test]
    fn food_drag_blocks_the_jar() {
        let mut feeding = FeedingInteraction::new();
        feeding.start_drag(FoodType::BarkChip, 0.0, 0.0);
        let mut g = GiftInteraction::new();
        g.toggle_jar(&feeding, None);
        assert_eq!(g.phase(), JarPhase::Idle);

        feeding.end_drag(Viewport::new(10.0, 10.0));
        g.toggle_jar(&feeding, None);
        assert_eq!(g.phase(), JarPhase::Scooping);
    }

    #[test]
    fn scoop_gesture_only_while_scooping() {
        let mut g = GiftInteraction::new();
        g.start_scoop(5.0, 5.0);
        g.update_drag(6.0, 6.0);
        g.add_catch();
        assert!(!g.is_pressing());
        assert_eq!(g.jar_count(), 0);
        assert_eq!(g.jar().drag_x, 0.0);

        let mut g = scooping_with(0);
        g.start_scoop(5.0, 5.0);
        assert!(g.is_pressing());
        g.update_drag(8.0, 9.0);
        assert_eq!((g.jar().drag_x, g.jar().drag_y), (8.0, 9.0));
        g.end_scoop();
        assert!(!g.is_pressing());
    }

    #[test]
    fn empty_delivery_still_cools_down() {
        let tuning = Tuning::default();
        let mut g = scooping_with(0);
        assert_eq!(g.deliver_gift(Millis(5), &tuning), 0);
        assert!(g.is_cooling_down());
    }

    #[test]
    fn reset_wins_over_a_late_release() {
        let tuning = Tuning::default();
        let feeding = FeedingInteraction::new();
        let mut g = scooping_with(2);
        g.deliver_gift(Millis(10), &tuning);
        g.reset();
        assert!(!g.is_cooling_down());

        // new cooldown after reset is not cut short by the old timer
        g.toggle_jar(&feeding, None);
        g.deliver_gift(Millis(600), &tuning);
        g.pump(Millis(1_010));
        assert!(g.is_cooling_down());
        g.pump(Millis(1_600));
        assert!(!g.is_cooling_down());
    }
}
