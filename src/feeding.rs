//! Food drag-and-drop: drag session, one-shot drop requests and per-food cooldowns.
//!
//! The interaction only knows pointer pixels. `end_drag` turns the final
//! position into viewport fractions; world-space hit resolution happens in
//! the world layer, which calls `record_hit` or `record_miss` afterwards.

use crate::model::{DropRequest, FoodType, Millis, Viewport};
use crate::timer::DeferredQueue;
use crate::tuning::Tuning;
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DragSession {
    pub is_dragging: bool,
    pub food_type: Option<FoodType>,
    pub drag_x: f32,
    pub drag_y: f32,
}

/// Food types currently cooling down. An entry exists only while its window is open.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CooldownSet {
    active: BTreeSet<FoodType>,
}

impl CooldownSet {
    pub fn contains(&self, food: FoodType) -> bool {
        self.active.contains(&food)
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    fn insert(&mut self, food: FoodType) {
        self.active.insert(food);
    }

    // clear-if-set: a release for an entry that is already gone does nothing
    fn release(&mut self, food: FoodType) {
        self.active.remove(&food);
    }

    fn clear(&mut self) {
        self.active.clear();
    }
}

#[derive(Debug, Default)]
pub struct FeedingInteraction {
    drag: DragSession,
    drop_request: Option<DropRequest>,
    cooldowns: CooldownSet,
    releases: DeferredQueue<FoodType>,
}

impl FeedingInteraction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drag(&self) -> DragSession {
        self.drag
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging
    }

    pub fn has_pending_drop(&self) -> bool {
        self.drop_request.is_some()
    }

    pub fn is_cooling_down(&self, food: FoodType) -> bool {
        self.cooldowns.contains(food)
    }

    pub fn cooldowns(&self) -> &CooldownSet {
        &self.cooldowns
    }

    pub fn start_drag(&mut self, food: FoodType, x: f32, y: f32) {
        if self.drag.is_dragging || self.drop_request.is_some() || self.cooldowns.contains(food) {
            return;
        }
        self.drag = DragSession {
            is_dragging: true,
            food_type: Some(food),
            drag_x: x,
            drag_y: y,
        };
    }

    pub fn update_drag(&mut self, x: f32, y: f32) {
        if !self.drag.is_dragging {
            return;
        }
        self.drag.drag_x = x;
        self.drag.drag_y = y;
    }

    pub fn end_drag(&mut self, viewport: Viewport) {
        let Some(food_type) = self.drag.food_type.filter(|_| self.drag.is_dragging) else {
            return;
        };
        let (nx, ny) = viewport.normalize(self.drag.drag_x, self.drag.drag_y);
        self.drag.is_dragging = false;
        self.drop_request = Some(DropRequest { nx, ny, food_type });
    }

    /// Drops the food back in the tray without a drop request.
    pub fn cancel_drag(&mut self) {
        if !self.drag.is_dragging {
            return;
        }
        self.drag = DragSession::default();
    }

    pub fn consume_drop_request(&mut self) -> Option<DropRequest> {
        let req = self.drop_request.take()?;
        self.drag.food_type = None;
        Some(req)
    }

    pub fn record_hit(&mut self, food: FoodType, now: Millis, tuning: &Tuning) {
        let cooldown_ms = tuning.food(food).cooldown_ms;
        self.cooldowns.insert(food);
        self.releases.schedule(now, cooldown_ms, food);
        debug!(?food, cooldown_ms, "food cooldown started");
    }

    /// Misses have no state effect today; kept as a hook for miss feedback.
    pub fn record_miss(&mut self) {}

    /// Applies cooldown releases that have come due.
    pub fn pump(&mut self, now: Millis) {
        for food in self.releases.drain_due(now) {
            self.cooldowns.release(food);
        }
    }

    pub fn reset(&mut self) {
        self.drag = DragSession::default();
        self.drop_request = None;
        self.cooldowns.clear();
        self.releases.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vp() -> Viewport {
        Viewport::new(800.0, 600.0)
    }

    #[test]
    fn drag_then_drop_yields_normalized_request() {
        let mut f = FeedingInteraction::new();
        f.start_drag(FoodType::BarkChip, 10.0, 10.0);
        f.update_drag(400.0, 150.0);
        f.end_drag(vp());
        assert!(!f.is_dragging());
        let req = f.consume_drop_request().unwrap();
        assert_eq!(req.nx, 0.5);
        assert_eq!(req.ny, 0.25);
        assert_eq!(req.food_type, FoodType::BarkChip);
        assert_eq!(f.consume_drop_request(), None);
        assert_eq!(f.drag().food_type, None);
    }

    #[test]
    fn second_drag_is_rejected_while_dragging() {
        let mut f = FeedingInteraction::new();
        f.start_drag(FoodType::BarkChip, 1.0, 2.0);
        let before = f.drag();
        f.start_drag(FoodType::DeadLeaf, 50.0, 60.0);
        assert_eq!(f.drag(), before);
    }

    #[test]
    fn drag_is_rejected_while_a_drop_is_pending() {
        let mut f = FeedingInteraction::new();
        f.start_drag(FoodType::BarkChip, 1.0, 2.0);
        f.end_drag(vp());
        f.start_drag(FoodType::DeadLeaf, 5.0, 5.0);
        assert!(!f.is_dragging());
        assert!(f.has_pending_drop());
    }

    #[test]
    fn end_drag_without_drag_does_nothing() {
        let mut f = FeedingInteraction::new();
        f.update_drag(30.0, 30.0);
        f.end_drag(vp());
        assert_eq!(f.drag(), DragSession::default());
        assert_eq!(f.consume_drop_request(), None);
    }

    #[test]
    fn cancel_leaves_no_request() {
        let mut f = FeedingInteraction::new();
        f.start_drag(FoodType::BarkChip, 1.0, 2.0);
        f.cancel_drag();
        f.end_drag(vp());
        assert_eq!(f.consume_drop_request(), None);
    }

    #[test]
    fn hit_opens_cooldown_until_it_elapses() {
        let tuning = Tuning::default();
        let mut f = FeedingInteraction::new();
        f.record_hit(FoodType::BarkChip, Millis(1_000), &tuning);

        f.start_drag(FoodType::BarkChip, 0.0, 0.0);
        assert!(!f.is_dragging());

        f.pump(Millis(1_799));
        assert!(f.is_cooling_down(FoodType::BarkChip));
        f.pump(Millis(1_800));
        assert!(!f.is_cooling_down(FoodType::BarkChip));

        f.start_drag(FoodType::BarkChip, 0.0, 0.0);
        assert!(f.is_dragging());
    }

    #[test]
    fn cooldowns_are_per_food() {
        let tuning = Tuning::default();
        let mut f = FeedingInteraction::new();
        f.record_hit(FoodType::BarkChip, Millis(1), &tuning);
        f.start_drag(FoodType::DeadLeaf, 0.0, 0.0);
        assert!(f.is_dragging());
    }

    #[test]
    fn reset_cancels_pending_releases() {
        let tuning = Tuning::default();
        let mut f = FeedingInteraction::new();
        f.record_hit(FoodType::RottenLog, Millis(1), &tuning);
        f.reset();
        assert!(f.cooldowns().is_empty());

        // a fresh hit after the reset must not be released by the stale timer
        f.record_hit(FoodType::RottenLog, Millis(2_000), &tuning);
        f.pump(Millis(3_001));
        assert!(f.is_cooling_down(FoodType::RottenLog));
        f.pump(Millis(5_000));
        assert!(!f.is_cooling_down(FoodType::RottenLog));
    }

    #[test]
    fn miss_is_inert() {
        let mut f = FeedingInteraction::new();
        f.start_drag(FoodType::BarkChip, 1.0, 2.0);
        f.end_drag(vp());
        let _ = f.consume_drop_request();
        f.record_miss();
        assert!(f.cooldowns().is_empty());
        assert!(!f.is_dragging());
    }
}
