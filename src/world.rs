//! Frame driver that owns the five containers and wires them together.
//!
//! The host calls `frame` once per rendered frame and forwards pointer and
//! key events through the other methods. Everything the host needs to draw
//! is readable through the accessors; nothing here knows about terminals.

use crate::dialogue::{BuiltinLines, Cue, DialogueTrigger, LinePool, Tone, Utterance};
use crate::feeding::FeedingInteraction;
use crate::gift::GiftInteraction;
use crate::model::{DropRequest, FoodType, Millis, ReactionKind, Viewport};
use crate::pet::PetState;
use crate::poke::{PokeOutcome, PokeTracker};
use crate::reaction::ReactionWatcher;
use crate::session::{SessionKeeper, SessionState};
use crate::storage::BestTimeStore;
use crate::tuning::Tuning;
use rand::Rng;
use tracing::debug;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance(self, other: Vec3) -> f32 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Host-side mapping from viewport fractions into the pet's space.
pub trait WorldProjection {
    /// Point at `depth` along the ray through normalized viewport coords `(nx, ny)`.
    fn to_world(&self, nx: f32, ny: f32, depth: f32) -> Vec3;
    fn mouth_anchor(&self) -> Vec3;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropOutcome {
    Hit(FoodType),
    Miss(FoodType),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    pub utterances: Vec<Utterance>,
    pub drop: Option<DropOutcome>,
    pub reactions: Vec<ReactionKind>,
    /// Set only on the frame the run ended.
    pub game_over: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PokeResult {
    Ignored,
    /// The jar was emptied into the pet.
    Gift(u32),
    Said(Utterance),
}

pub struct World<R: Rng> {
    tuning: Tuning,
    pet: PetState,
    feeding: FeedingInteraction,
    gift: GiftInteraction,
    dialogue: DialogueTrigger,
    session: SessionKeeper,
    pokes: PokeTracker,
    reactions: ReactionWatcher,
    last_mist: Millis,
    poll_acc_ms: f32,
    rng: R,
    lines: Box<dyn LinePool>,
}

impl<R: Rng> World<R> {
    pub fn new(tuning: Tuning, store: Box<dyn BestTimeStore>, rng: R) -> Self {
        Self {
            tuning,
            pet: PetState::new(),
            feeding: FeedingInteraction::new(),
            gift: GiftInteraction::new(),
            dialogue: DialogueTrigger::new(),
            session: SessionKeeper::new(store),
            pokes: PokeTracker::new(),
            reactions: ReactionWatcher::new(),
            last_mist: Millis::NEVER,
            poll_acc_ms: 0.0,
            rng,
            lines: Box::new(BuiltinLines),
        }
    }

    pub fn with_lines(mut self, lines: Box<dyn LinePool>) -> Self {
        self.lines = lines;
        self
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn pet(&self) -> &PetState {
        &self.pet
    }

    pub fn feeding(&self) -> &FeedingInteraction {
        &self.feeding
    }

    pub fn gift(&self) -> &GiftInteraction {
        &self.gift
    }

    pub fn session(&self) -> &SessionState {
        self.session.state()
    }

    pub fn is_running(&self) -> bool {
        self.session.state().is_running()
    }

    pub fn frame(&mut self, dt_secs: f32, now: Millis, projection: &dyn WorldProjection) -> FrameReport {
        let max_dt = self.tuning.timing.max_frame_delta;
        let dt = if dt_secs.is_finite() { dt_secs.clamp(0.0, max_dt) } else { 0.0 };
        let mut report = FrameReport::default();

        self.feeding.pump(now);
        self.gift.pump(now);

        if self.is_running() {
            self.pet.tick(dt, self.session.state(), &self.tuning);
            self.session.tick_survival(f64::from(dt));
            if self.pet.has_collapsed(&self.tuning.neglect) {
                self.session.trigger_game_over();
                report.game_over = true;
            }
        }

        if let Some(req) = self.feeding.consume_drop_request() {
            report.drop = Some(self.resolve_drop(req, now, projection));
        }

        for kind in self.reactions.observe(&self.pet) {
            if kind != ReactionKind::Poked {
                self.pet.react_to_event(kind, now);
            }
            report.reactions.push(kind);
        }

        if self.is_running() {
            self.poll_acc_ms += dt * 1000.0;
            let interval = self.tuning.behavior.check_interval_ms.max(1) as f32;
            if self.poll_acc_ms >= interval {
                self.poll_acc_ms %= interval;
                let line = self.dialogue.poll(
                    now,
                    &self.pet,
                    &self.tuning,
                    &mut self.rng,
                    self.lines.as_ref(),
                );
                if let Some(u) = line {
                    self.pet.receive_message(u.text.clone(), now);
                    report.utterances.push(u);
                }
            }
        }

        report
    }

    // A drop that lands while the run is stopped, or with a food the stage
    // refuses, counts as a miss and starts no cooldown.
    fn resolve_drop(&mut self, req: DropRequest, now: Millis, projection: &dyn WorldProjection) -> DropOutcome {
        let point = projection.to_world(req.nx, req.ny, self.tuning.throw.drag_depth);
        let dist = point.distance(projection.mouth_anchor());
        let hit = self.is_running()
            && dist <= self.tuning.throw.hit_radius
            && self.tuning.allows_food(self.pet.stage(), req.food_type);
        debug!(food = ?req.food_type, dist, hit, "drop resolved");

        if hit {
            self.pet.feed(req.food_type, now, &self.tuning);
            self.feeding.record_hit(req.food_type, now, &self.tuning);
            DropOutcome::Hit(req.food_type)
        } else {
            self.feeding.record_miss();
            DropOutcome::Miss(req.food_type)
        }
    }

    /// Mists the pet unless the sprayer is still cooling down. Returns whether it sprayed.
    pub fn mist(&mut self, now: Millis) -> bool {
        if !self.is_running() || !now.elapsed_since(self.last_mist, self.tuning.mist.cooldown_ms) {
            return false;
        }
        self.last_mist = now;
        self.pet.mist(now, &self.tuning);
        true
    }

    pub fn poke(&mut self, now: Millis) -> PokeResult {
        if !self.is_running() {
            return PokeResult::Ignored;
        }
        if self.gift.is_scooping() && self.gift.jar_count() > 0 {
            let count = self.gift.deliver_gift(now, &self.tuning);
            self.pet.give_fireflies(count, now, &self.tuning);
            return PokeResult::Gift(count);
        }

        let cue = match self.pokes.register(now, &self.tuning.poke) {
            PokeOutcome::Ignored => return PokeResult::Ignored,
            PokeOutcome::Normal => Cue::Poke,
            PokeOutcome::Annoyed => Cue::PokeAnnoyed,
        };
        self.pet.poke(now);
        self.pet.react_to_event(ReactionKind::Poked, now);

        let tone = Tone::from(self.pet.evolution());
        let text = self.lines.pick(cue, tone, &mut self.rng);
        self.pet.receive_message(text.clone(), now);
        PokeResult::Said(Utterance { cue, tone, text })
    }

    /// Set by a conversation UI while a chat is open; boredom lines hold off meanwhile.
    pub fn set_conversing(&mut self, conversing: bool) {
        self.pet.set_conversing(conversing);
    }

    pub fn chat_relief(&mut self) {
        self.pet.chat_relief(&self.tuning);
    }

    pub fn toggle_jar(&mut self, anchor: Option<(f32, f32)>) {
        self.gift.toggle_jar(&self.feeding, anchor);
    }

    pub fn start_drag(&mut self, food: FoodType, x: f32, y: f32) {
        if !self.is_running() || self.gift.is_scooping() {
            return;
        }
        self.feeding.start_drag(food, x, y);
    }

    pub fn press(&mut self, x: f32, y: f32) {
        self.gift.start_scoop(x, y);
    }

    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        self.feeding.update_drag(x, y);
        self.gift.update_drag(x, y);
    }

    pub fn release(&mut self, viewport: Viewport) {
        self.feeding.end_drag(viewport);
        self.gift.end_scoop();
    }

    pub fn cancel_drag(&mut self) {
        self.feeding.cancel_drag();
    }

    /// One firefly caught by the scoop.
    pub fn catch_firefly(&mut self) {
        self.gift.add_catch();
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.session.set_paused(paused);
    }

    pub fn toggle_pause(&mut self) {
        let paused = self.session.is_paused();
        self.session.set_paused(!paused);
    }

    pub fn restart(&mut self) {
        self.session
            .restart(&mut self.pet, &mut self.feeding, &mut self.gift, &mut self.dialogue);
        self.pokes.reset();
        self.reactions.reset();
        self.last_mist = Millis::NEVER;
        self.poll_acc_ms = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AgeStage, GamePhase, JarPhase};
    use crate::storage::MemoryStore;
    use rand::rngs::mock::StepRng;

    /// Viewport spans 10x10 world units; the mouth sits in the middle.
    struct Flat;

    impl WorldProjection for Flat {
        fn to_world(&self, nx: f32, ny: f32, depth: f32) -> Vec3 {
            Vec3::new(nx * 10.0, ny * 10.0, depth)
        }

        fn mouth_anchor(&self) -> Vec3 {
            Vec3::new(5.0, 5.0, 2.5)
        }
    }

    fn world() -> World<StepRng> {
        World::new(Tuning::default(), Box::new(MemoryStore::new()), StepRng::new(0, 0))
    }

    fn vp() -> Viewport {
        Viewport::new(100.0, 100.0)
    }

    fn throw(w: &mut World<StepRng>, food: FoodType, x: f32, y: f32, now: Millis) -> FrameReport {
        w.frame(0.0, now, &Flat);
        w.start_drag(food, 0.0, 0.0);
        w.pointer_moved(x, y);
        w.release(vp());
        w.frame(0.0, now, &Flat)
    }

    #[test]
    fn drop_on_mouth_feeds_and_cools_down() {
        let mut w = world();
        let report = throw(&mut w, FoodType::BarkChip, 50.0, 50.0, Millis(10));
        assert_eq!(report.drop, Some(DropOutcome::Hit(FoodType::BarkChip)));
        assert_eq!(report.reactions, vec![ReactionKind::Fed]);
        assert_eq!(w.pet().feed_count(), 1);
        assert!(w.feeding().is_cooling_down(FoodType::BarkChip));
        assert_eq!(w.pet().last_reaction(), Some((ReactionKind::Fed, Millis(10))));
    }

    #[test]
    fn drop_far_away_misses() {
        let mut w = world();
        let report = throw(&mut w, FoodType::BarkChip, 5.0, 5.0, Millis(10));
        assert_eq!(report.drop, Some(DropOutcome::Miss(FoodType::BarkChip)));
        assert_eq!(w.pet().feed_count(), 0);
        assert!(w.feeding().cooldowns().is_empty());
    }

    #[test]
    fn refused_food_is_a_miss() {
        let mut w = world();
        let report = throw(&mut w, FoodType::DeadLeaf, 50.0, 50.0, Millis(10));
        assert_eq!(report.drop, Some(DropOutcome::Miss(FoodType::DeadLeaf)));
    }

    #[test]
    fn four_hits_grow_the_pet() {
        let mut w = world();
        for i in 0..4u64 {
            let t = Millis(1 + i * 1_000);
            let report = throw(&mut w, FoodType::BarkChip, 50.0, 50.0, t);
            assert!(matches!(report.drop, Some(DropOutcome::Hit(_))));
        }
        assert_eq!(w.pet().stage(), AgeStage::Two);
    }

    #[test]
    fn frame_delta_is_clamped() {
        let mut w = world();
        w.frame(30.0, Millis(1), &Flat);
        assert!((w.pet().hunger() - 0.2).abs() < 1e-4);
        assert!((w.session().survival_time - 0.1).abs() < 1e-6);
    }

    #[test]
    fn paused_world_stands_still() {
        let mut w = world();
        w.set_paused(true);
        w.frame(0.1, Millis(1), &Flat);
        assert_eq!(w.pet().hunger(), 0.0);
        assert!(!w.mist(Millis(2)));
        w.toggle_pause();
        assert!(w.mist(Millis(3)));
    }

    #[test]
    fn mist_has_a_cooldown() {
        let mut w = world();
        assert!(w.mist(Millis(1_000)));
        assert!(!w.mist(Millis(1_200)));
        assert!(w.mist(Millis(1_500)));
        assert_eq!(w.pet().mist_count(), 2);
    }

    #[test]
    fn poke_with_full_jar_delivers_gift() {
        let mut w = world();
        w.toggle_jar(None);
        for _ in 0..3 {
            w.catch_firefly();
        }
        assert_eq!(w.poke(Millis(50)), PokeResult::Gift(3));
        assert_eq!(w.gift().phase(), JarPhase::Idle);
        assert_eq!(w.pet().last_gift_count(), 3);

        let report = w.frame(0.0, Millis(51), &Flat);
        assert_eq!(report.reactions, vec![ReactionKind::Gifted]);
    }

    #[test]
    fn poke_with_empty_jar_is_a_plain_poke() {
        let mut w = world();
        w.toggle_jar(None);
        match w.poke(Millis(50)) {
            PokeResult::Said(u) => assert_eq!(u.cue, Cue::Poke),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(w.pet().last_poke_time(), Millis(50));
        assert!(w.pet().last_message().is_some());
    }

    struct Echo;

    impl LinePool for Echo {
        fn pick(&self, cue: Cue, tone: Tone, _rng: &mut dyn rand::RngCore) -> String {
            format!("{cue:?}/{tone:?}")
        }
    }

    #[test]
    fn custom_lines_are_voiced() {
        let mut w = world().with_lines(Box::new(Echo));
        match w.poke(Millis(50)) {
            PokeResult::Said(u) => assert_eq!(u.text, "Poke/Normal"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(w.pet().last_message(), Some(("Poke/Normal", Millis(50))));
    }

    #[test]
    fn repeated_pokes_get_annoyed() {
        let mut w = world();
        let mut last = PokeResult::Ignored;
        for i in 0..5u64 {
            last = w.poke(Millis(1_000 + i * 900));
        }
        match last {
            PokeResult::Said(u) => assert_eq!(u.cue, Cue::PokeAnnoyed),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(w.poke(Millis(4_700)), PokeResult::Ignored);
    }

    #[test]
    fn hungry_pet_complains_on_the_poll_interval() {
        let mut w = world();
        let mut said = Vec::new();
        // 40s of play at the clamped 0.1s step
        for i in 1..=400u64 {
            let report = w.frame(0.1, Millis(i * 100), &Flat);
            said.extend(report.utterances);
        }
        assert!(said.iter().any(|u| u.cue == Cue::Hunger));
        assert!(w.pet().last_message().is_some());
    }

    #[test]
    fn conversing_pet_keeps_its_boredom_quiet() {
        let mut tuning = Tuning::default();
        tuning.stats.hunger = 0.0;
        tuning.stats.thirst = 0.0;
        let mut w = World::new(tuning, Box::new(MemoryStore::new()), StepRng::new(0, 0));
        let mut t = 0u64;
        for _ in 0..4 {
            t += 1_000;
            throw(&mut w, FoodType::BarkChip, 50.0, 50.0, Millis(t));
        }
        for _ in 0..10 {
            t += 600;
            assert!(w.mist(Millis(t)));
        }
        assert_eq!(w.pet().stage(), AgeStage::Three);

        fn play(w: &mut World<StepRng>, t: &mut u64, cues: &mut Vec<Cue>, steps: u32) {
            for _ in 0..steps {
                *t += 100;
                let report = w.frame(0.1, Millis(*t), &Flat);
                cues.extend(report.utterances.into_iter().map(|u| u.cue));
            }
        }

        let mut cues = Vec::new();
        w.set_conversing(true);
        play(&mut w, &mut t, &mut cues, 300);
        assert!(w.pet().boredom() >= 50.0);
        assert!(cues.is_empty());

        let before = w.pet().boredom();
        w.chat_relief();
        assert!((w.pet().boredom() - (before - 15.0)).abs() < 1e-3);

        w.set_conversing(false);
        play(&mut w, &mut t, &mut cues, 100);
        assert!(cues.iter().any(|c| matches!(c, Cue::Boredom | Cue::Escalation)));
    }

    #[test]
    fn neglect_ends_the_run() {
        let mut w = world();
        let mut ended = 0;
        let mut t = 0u64;
        // 50s to fill hunger, then the collapse grace period
        while w.session().phase == GamePhase::Playing && t < 100_000 {
            t += 100;
            if w.frame(0.1, Millis(t), &Flat).game_over {
                ended += 1;
            }
        }
        assert_eq!(ended, 1);
        assert_eq!(w.session().phase, GamePhase::GameOver);
        assert!(w.session().best_survival_time > 60.0);

        w.frame(0.1, Millis(t + 100), &Flat);
        assert_eq!(w.poke(Millis(t + 200)), PokeResult::Ignored);
    }

    #[test]
    fn restart_clears_everything() {
        let mut w = world();
        throw(&mut w, FoodType::BarkChip, 50.0, 50.0, Millis(10));
        w.frame(0.1, Millis(100), &Flat);
        w.restart();

        assert_eq!(w.pet().feed_count(), 0);
        assert!(w.feeding().cooldowns().is_empty());
        assert_eq!(w.session().survival_time, 0.0);
        assert!(w.session().best_survival_time > 0.0);
        assert!(w.frame(0.0, Millis(200), &Flat).reactions.is_empty());
    }
}
