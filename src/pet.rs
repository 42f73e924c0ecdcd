//! Pet state engine: meters, stage progression, evolution and reaction stamps.
//!
//! Meters rise over time and are relieved by interactions. Interaction
//! handlers stamp `last_*_time` so that animation and dialogue layers can
//! edge-detect events against their own last-seen copies.

use crate::model::{AgeStage, Evolution, FoodType, GamePhase, Meter, Millis, ReactionKind};
use crate::session::SessionState;
use crate::tuning::{NeglectRules, Tuning};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const METER_MAX: f32 = 100.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PetState {
    hunger: f32,
    thirst: f32,
    boredom: f32,
    stage: AgeStage,
    evolution: Evolution,
    feed_count: u32,
    mist_count: u32,
    last_feed_time: Millis,
    last_mist_time: Millis,
    last_poke_time: Millis,
    last_gift_time: Millis,
    last_gift_count: u32,
    is_conversing: bool,
    neglect_secs: f32,
    collapse_secs: f32,
    last_reaction: Option<(ReactionKind, Millis)>,
    last_message: Option<(String, Millis)>,
}

impl Default for PetState {
    fn default() -> Self {
        Self::new()
    }
}

fn clamp_meter(v: f32) -> f32 {
    v.clamp(0.0, METER_MAX)
}

impl PetState {
    pub fn new() -> Self {
        Self {
            hunger: 0.0,
            thirst: 0.0,
            boredom: 0.0,
            stage: AgeStage::One,
            evolution: Evolution::Normal,
            feed_count: 0,
            mist_count: 0,
            last_feed_time: Millis::NEVER,
            last_mist_time: Millis::NEVER,
            last_poke_time: Millis::NEVER,
            last_gift_time: Millis::NEVER,
            last_gift_count: 0,
            is_conversing: false,
            neglect_secs: 0.0,
            collapse_secs: 0.0,
            last_reaction: None,
            last_message: None,
        }
    }

    pub fn hunger(&self) -> f32 {
        self.hunger
    }

    pub fn thirst(&self) -> f32 {
        self.thirst
    }

    pub fn boredom(&self) -> f32 {
        self.boredom
    }

    pub fn meter(&self, meter: Meter) -> f32 {
        match meter {
            Meter::Hunger => self.hunger,
            Meter::Thirst => self.thirst,
            Meter::Boredom => self.boredom,
        }
    }

    pub fn stage(&self) -> AgeStage {
        self.stage
    }

    pub fn evolution(&self) -> Evolution {
        self.evolution
    }

    pub fn feed_count(&self) -> u32 {
        self.feed_count
    }

    pub fn mist_count(&self) -> u32 {
        self.mist_count
    }

    pub fn last_feed_time(&self) -> Millis {
        self.last_feed_time
    }

    pub fn last_mist_time(&self) -> Millis {
        self.last_mist_time
    }

    pub fn last_poke_time(&self) -> Millis {
        self.last_poke_time
    }

    pub fn last_gift_time(&self) -> Millis {
        self.last_gift_time
    }

    pub fn last_gift_count(&self) -> u32 {
        self.last_gift_count
    }

    pub fn is_conversing(&self) -> bool {
        self.is_conversing
    }

    pub fn neglect_secs(&self) -> f32 {
        self.neglect_secs
    }

    pub fn last_reaction(&self) -> Option<(ReactionKind, Millis)> {
        self.last_reaction
    }

    pub fn last_message(&self) -> Option<(&str, Millis)> {
        self.last_message.as_ref().map(|(s, t)| (s.as_str(), *t))
    }

    /// Dark and neglected long enough that dialogue escalates.
    pub fn is_irreversible_near(&self, rules: &NeglectRules) -> bool {
        self.evolution == Evolution::Dark && self.neglect_secs > rules.irreversible_secs
    }

    pub fn has_collapsed(&self, rules: &NeglectRules) -> bool {
        self.collapse_secs >= rules.collapse_grace_secs
    }

    fn worst_active_meter(&self, tuning: &Tuning) -> f32 {
        let active = tuning.active_meters(self.stage);
        Meter::ALL
            .iter()
            .filter(|m| active.contains(**m))
            .map(|m| self.meter(*m))
            .fold(0.0, f32::max)
    }

    pub fn tick(&mut self, dt: f32, session: &SessionState, tuning: &Tuning) {
        if session.paused || session.phase != GamePhase::Playing {
            return;
        }
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        let active = tuning.active_meters(self.stage);
        let scale = tuning.stats.rate_multiplier * dt;
        if active.hunger {
            self.hunger = clamp_meter(self.hunger + tuning.stats.hunger * scale);
        }
        if active.thirst {
            self.thirst = clamp_meter(self.thirst + tuning.stats.thirst * scale);
        }
        if active.boredom {
            self.boredom = clamp_meter(self.boredom + tuning.stats.boredom * scale);
        }

        self.advance_neglect(dt, tuning);
    }

    fn advance_neglect(&mut self, dt: f32, tuning: &Tuning) {
        let rules = &tuning.neglect;
        let worst = self.worst_active_meter(tuning);

        if worst >= rules.dark_threshold {
            self.neglect_secs += dt;
        } else {
            self.neglect_secs -= dt;
        }
        self.neglect_secs = self.neglect_secs.clamp(0.0, rules.neglect_cap_secs.max(0.0));

        let next = self.next_evolution(rules);
        if next != self.evolution {
            info!(from = ?self.evolution, to = ?next, neglect_secs = self.neglect_secs, "evolution changed");
            self.evolution = next;
        }

        if worst >= METER_MAX {
            self.collapse_secs += dt;
        } else {
            self.collapse_secs = 0.0;
        }
    }

    // Enter and exit thresholds differ so the look does not flicker around one value.
    fn next_evolution(&self, rules: &NeglectRules) -> Evolution {
        match self.evolution {
            Evolution::Normal if self.neglect_secs >= rules.dark_enter_secs => Evolution::Dark,
            Evolution::Dark if self.neglect_secs <= rules.dark_exit_secs => Evolution::Normal,
            current => current,
        }
    }

    /// Feeds one item. Foods the current stage does not allow are ignored.
    pub fn feed(&mut self, food: FoodType, now: Millis, tuning: &Tuning) {
        if !tuning.allows_food(self.stage, food) {
            debug!(?food, stage = self.stage.number(), "food not allowed at this stage");
            return;
        }
        self.hunger = clamp_meter(self.hunger - tuning.food(food).hunger_relief);
        if tuning.active_meters(self.stage).boredom {
            self.boredom = clamp_meter(self.boredom - tuning.stats.feed_boredom_relief);
        }
        self.feed_count = self.feed_count.saturating_add(1);
        self.last_feed_time = now;

        if self.stage == AgeStage::One && self.feed_count >= tuning.thresholds.feeds_to_stage2 {
            self.stage = AgeStage::Two;
            info!(feeds = self.feed_count, "pet reached stage 2");
        }
    }

    pub fn mist(&mut self, now: Millis, tuning: &Tuning) {
        self.thirst = clamp_meter(self.thirst - tuning.mist.thirst_relief);
        self.mist_count = self.mist_count.saturating_add(1);
        self.last_mist_time = now;

        if self.stage == AgeStage::Two && self.mist_count >= tuning.thresholds.mists_to_stage3 {
            self.stage = AgeStage::Three;
            info!(mists = self.mist_count, "pet reached stage 3");
        }
    }

    pub fn poke(&mut self, now: Millis) {
        self.last_poke_time = now;
    }

    pub fn give_fireflies(&mut self, count: u32, now: Millis, tuning: &Tuning) {
        let jar = &tuning.jar;
        let relief = (count as f32 * jar.boredom_relief_per_firefly).min(jar.boredom_relief_cap);
        self.boredom = clamp_meter(self.boredom - relief);
        self.last_gift_time = now;
        self.last_gift_count = count;
    }

    /// Boredom relief for a finished chat exchange.
    pub fn chat_relief(&mut self, tuning: &Tuning) {
        self.boredom = clamp_meter(self.boredom - tuning.stats.chat_boredom_relief);
    }

    pub fn set_conversing(&mut self, conversing: bool) {
        self.is_conversing = conversing;
    }

    pub fn react_to_event(&mut self, kind: ReactionKind, now: Millis) {
        self.last_reaction = Some((kind, now));
    }

    pub fn receive_message(&mut self, text: impl Into<String>, now: Millis) {
        self.last_message = Some((text.into(), now));
    }

    pub fn reset(&mut self) {
        *self = PetState::new();
    }
}
