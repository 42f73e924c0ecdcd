use crate::model::Millis;
use crate::tuning::PokeRules;
use std::collections::VecDeque;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PokeOutcome {
    /// Inside the poke cooldown; nothing happened.
    Ignored,
    Normal,
    Annoyed,
}

/// Poke rate limiting and annoyance, computed from how often the pet was poked lately.
#[derive(Clone, Debug, Default)]
pub struct PokeTracker {
    last_accepted: Millis,
    recent: VecDeque<Millis>,
}

impl PokeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, now: Millis, rules: &PokeRules) -> PokeOutcome {
        if !now.elapsed_since(self.last_accepted, rules.cooldown_ms) {
            return PokeOutcome::Ignored;
        }
        self.last_accepted = now;

        while let Some(&t) = self.recent.front() {
            if now.since(t) < rules.annoyance_window_ms {
                break;
            }
            self.recent.pop_front();
        }
        self.recent.push_back(now);

        if self.recent.len() >= rules.annoyance_threshold {
            PokeOutcome::Annoyed
        } else {
            PokeOutcome::Normal
        }
    }

    pub fn recent_count(&self) -> usize {
        self.recent.len()
    }

    pub fn reset(&mut self) {
        *self = PokeTracker::new();
    }
}
