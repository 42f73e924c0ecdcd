//! Session phase, pause flag, survival clock and the persisted best time.

use crate::dialogue::DialogueTrigger;
use crate::feeding::FeedingInteraction;
use crate::gift::GiftInteraction;
use crate::model::GamePhase;
use crate::pet::PetState;
use crate::storage::BestTimeStore;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: GamePhase,
    pub paused: bool,
    pub survival_time: f64,
    pub best_survival_time: f64,
}

impl SessionState {
    pub fn new(best_survival_time: f64) -> Self {
        Self {
            phase: GamePhase::Playing,
            paused: false,
            survival_time: 0.0,
            best_survival_time,
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Playing && !self.paused
    }
}

pub struct SessionKeeper {
    state: SessionState,
    store: Box<dyn BestTimeStore>,
}

impl SessionKeeper {
    /// Reads the best time once; an unreadable store counts as "no record".
    pub fn new(store: Box<dyn BestTimeStore>) -> Self {
        let best = match store.load() {
            Ok(v) => v.unwrap_or(0.0),
            Err(e) => {
                warn!(error = %e, "could not read best survival time");
                0.0
            }
        };
        Self {
            state: SessionState::new(best),
            store,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    pub fn survival_time(&self) -> f64 {
        self.state.survival_time
    }

    pub fn best_survival_time(&self) -> f64 {
        self.state.best_survival_time
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.state.paused = paused;
    }

    pub fn tick_survival(&mut self, dt: f64) {
        if !self.state.is_running() || !dt.is_finite() || dt <= 0.0 {
            return;
        }
        self.state.survival_time += dt;
    }

    pub fn trigger_game_over(&mut self) {
        if self.state.phase == GamePhase::GameOver {
            return;
        }
        self.commit_best();
        info!(
            survival_secs = self.state.survival_time,
            best_secs = self.state.best_survival_time,
            "game over"
        );
        self.state.phase = GamePhase::GameOver;
    }

    // Writes only when the run beat the record. Storage failures are logged and dropped.
    fn commit_best(&mut self) {
        if self.state.survival_time <= self.state.best_survival_time {
            return;
        }
        self.state.best_survival_time = self.state.survival_time;
        if let Err(e) = self.store.save(self.state.best_survival_time) {
            warn!(error = %e, "could not persist best survival time");
        }
    }

    /// Resets pet, feeding and gift state (in that order), then dialogue, and starts a new run.
    ///
    /// A run abandoned mid-play still counts toward the best time.
    pub fn restart(
        &mut self,
        pet: &mut PetState,
        feeding: &mut FeedingInteraction,
        gift: &mut GiftInteraction,
        dialogue: &mut DialogueTrigger,
    ) {
        if self.state.phase == GamePhase::Playing {
            self.commit_best();
        }
        pet.reset();
        feeding.reset();
        gift.reset();
        dialogue.reset();
        self.state.phase = GamePhase::Playing;
        self.state.survival_time = 0.0;
        info!(best_secs = self.state.best_survival_time, "new run");
    }
}
