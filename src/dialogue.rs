//! Rate-limited dialogue trigger.
//!
//! Polled on a fixed interval rather than every frame. Each poll voices at
//! most one line, checked in priority order: hunger, thirst, boredom. Every
//! category has its own interval and one global cooldown spaces out any two
//! messages.
//!
//! ```
//! use rand::rngs::mock::StepRng;
//! use shroomling::dialogue::{BuiltinLines, Cue, DialogueTrigger};
//! use shroomling::model::Millis;
//! use shroomling::pet::PetState;
//! use shroomling::session::SessionState;
//! use shroomling::tuning::Tuning;
//!
//! let tuning = Tuning::default();
//! let mut pet = PetState::new();
//! pet.tick(40.0, &SessionState::new(0.0), &tuning);
//!
//! let mut trigger = DialogueTrigger::new();
//! let mut rng = StepRng::new(0, 1);
//! let line = trigger.poll(Millis(1_000), &pet, &tuning, &mut rng, &BuiltinLines);
//! assert_eq!(line.map(|u| u.cue), Some(Cue::Hunger));
//! ```

use crate::model::{Evolution, Meter, Millis};
use crate::pet::PetState;
use crate::tuning::Tuning;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cue {
    Hunger,
    Thirst,
    Boredom,
    /// Boredom line replaced by a warning once dark neglect has dragged on.
    Escalation,
    Poke,
    PokeAnnoyed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tone {
    Normal,
    Dark,
}

impl From<Evolution> for Tone {
    fn from(e: Evolution) -> Self {
        match e {
            Evolution::Normal => Tone::Normal,
            Evolution::Dark => Tone::Dark,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Utterance {
    pub cue: Cue,
    pub tone: Tone,
    pub text: String,
}

/// Source of message text. The content tables live outside the simulation.
pub trait LinePool {
    fn pick(&self, cue: Cue, tone: Tone, rng: &mut dyn RngCore) -> String;
}

/// A handful of lines per cue, enough for the terminal host.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinLines;

impl BuiltinLines {
    fn table(cue: Cue, tone: Tone) -> &'static [&'static str] {
        match (cue, tone) {
            (Cue::Hunger, Tone::Normal) => &[
                "my tummy is rumbling...",
                "is there any bark around here?",
                "so... hungry...",
            ],
            (Cue::Hunger, Tone::Dark) => &["FEED ME.", "the rot hungers.", "you forgot me again."],
            (Cue::Thirst, Tone::Normal) => &["it's so dry today", "a little mist, please?"],
            (Cue::Thirst, Tone::Dark) => &["my cap is cracking.", "water. now."],
            (Cue::Boredom, Tone::Normal) => &[
                "play with me?",
                "i counted every leaf. twice.",
                "are the fireflies out yet?",
            ],
            (Cue::Boredom, Tone::Dark) => &["nothing matters in the dark.", "entertain me."],
            (Cue::Escalation, _) => &[
                "something is growing inside me...",
                "i don't think i can come back from this.",
            ],
            (Cue::Poke, _) => &["hey!", "hehe, that tickles", "boop"],
            (Cue::PokeAnnoyed, _) => &["stop poking me!", "ENOUGH.", "do you mind?"],
        }
    }
}

impl LinePool for BuiltinLines {
    fn pick(&self, cue: Cue, tone: Tone, rng: &mut dyn RngCore) -> String {
        BuiltinLines::table(cue, tone)
            .choose(rng)
            .map(|s| (*s).to_string())
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DialogueTrigger {
    last_hunger: Millis,
    last_thirst: Millis,
    last_boredom_check: Millis,
    last_message: Millis,
}

impl DialogueTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_message(&self) -> Millis {
        self.last_message
    }

    /// Chance of a boredom line: 0 at the initiation level, 1 at initiation + scale.
    pub fn boredom_probability(boredom: f32, tuning: &Tuning) -> f32 {
        let b = &tuning.behavior;
        if b.boredom_probability_scale <= 0.0 {
            return if boredom > b.boredom_initiation { 1.0 } else { 0.0 };
        }
        ((boredom - b.boredom_initiation) / b.boredom_probability_scale).clamp(0.0, 1.0)
    }

    pub fn poll<R: Rng>(
        &mut self,
        now: Millis,
        pet: &PetState,
        tuning: &Tuning,
        rng: &mut R,
        lines: &dyn LinePool,
    ) -> Option<Utterance> {
        let b = &tuning.behavior;
        if !now.elapsed_since(self.last_message, b.message_cooldown_ms) {
            return None;
        }
        let active = tuning.active_meters(pet.stage());
        let tone = Tone::from(pet.evolution());

        if active.contains(Meter::Hunger)
            && pet.hunger() >= b.hunger_threshold
            && now.elapsed_since(self.last_hunger, b.complaint_interval_ms)
        {
            self.last_hunger = now;
            return Some(self.emit(now, Cue::Hunger, tone, rng, lines));
        }

        if active.contains(Meter::Thirst)
            && pet.thirst() >= b.thirst_threshold
            && now.elapsed_since(self.last_thirst, b.complaint_interval_ms)
        {
            self.last_thirst = now;
            return Some(self.emit(now, Cue::Thirst, tone, rng, lines));
        }

        if active.contains(Meter::Boredom)
            && pet.boredom() >= b.boredom_initiation
            && !pet.is_conversing()
            && now.elapsed_since(self.last_boredom_check, b.boredom_check_interval_ms)
        {
            self.last_boredom_check = now;
            let p = Self::boredom_probability(pet.boredom(), tuning);
            if rng.gen::<f32>() < p {
                let cue = if pet.is_irreversible_near(&tuning.neglect) {
                    Cue::Escalation
                } else {
                    Cue::Boredom
                };
                return Some(self.emit(now, cue, tone, rng, lines));
            }
        }

        None
    }

    fn emit<R: Rng>(
        &mut self,
        now: Millis,
        cue: Cue,
        tone: Tone,
        rng: &mut R,
        lines: &dyn LinePool,
    ) -> Utterance {
        self.last_message = now;
        let text = lines.pick(cue, tone, rng);
        debug!(?cue, ?tone, %text, "dialogue");
        Utterance { cue, tone, text }
    }

    pub fn reset(&mut self) {
        *self = DialogueTrigger::new();
    }
}
