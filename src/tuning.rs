use crate::model::{ActiveMeters, AgeStage, FoodType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StatRates {
    pub hunger: f32,  // per second
    pub thirst: f32,  // per second
    pub boredom: f32, // per second
    pub rate_multiplier: f32,
    pub feed_boredom_relief: f32,
    pub chat_boredom_relief: f32,
}

impl Default for StatRates {
    fn default() -> Self {
        // meters fill in 50s (thirst 65s) from empty
        Self {
            hunger: 100.0 / 50.0,
            thirst: 100.0 / 65.0,
            boredom: 100.0 / 50.0,
            rate_multiplier: 1.0,
            feed_boredom_relief: 5.0,
            chat_boredom_relief: 15.0,
        }
    }
}

/// Neglect bookkeeping: evolution hysteresis and collapse.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NeglectRules {
    pub dark_threshold: f32,
    pub dark_enter_secs: f32,
    pub dark_exit_secs: f32,
    pub irreversible_secs: f32,
    pub neglect_cap_secs: f32,
    pub collapse_grace_secs: f32,
}

impl Default for NeglectRules {
    fn default() -> Self {
        Self {
            dark_threshold: 50.0,
            dark_enter_secs: 5.0,
            dark_exit_secs: 1.0,
            irreversible_secs: 10.0,
            neglect_cap_secs: 30.0,
            collapse_grace_secs: 15.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Behavior {
    pub hunger_threshold: f32,
    pub thirst_threshold: f32,
    pub boredom_threshold: f32,
    pub boredom_initiation: f32,
    pub boredom_probability_scale: f32,
    pub complaint_interval_ms: u64,
    pub boredom_check_interval_ms: u64,
    pub check_interval_ms: u64,
    pub message_cooldown_ms: u64,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            hunger_threshold: 70.0,
            thirst_threshold: 70.0,
            boredom_threshold: 70.0,
            boredom_initiation: 40.0,
            boredom_probability_scale: 400.0,
            complaint_interval_ms: 18_000,
            boredom_check_interval_ms: 5_000,
            check_interval_ms: 500,
            message_cooldown_ms: 5_000,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    pub max_frame_delta: f32,
    pub speech_bubble_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            max_frame_delta: 0.1,
            speech_bubble_ms: 5_000,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrowRules {
    pub hit_radius: f32,
    pub drag_depth: f32,
}

impl Default for ThrowRules {
    fn default() -> Self {
        Self {
            hit_radius: 1.0,
            drag_depth: 2.5,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FoodSpec {
    pub hunger_relief: f32,
    pub cooldown_ms: u64,
}

impl Default for FoodSpec {
    fn default() -> Self {
        Self {
            hunger_relief: 12.0,
            cooldown_ms: 800,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MistRules {
    pub thirst_relief: f32,
    pub cooldown_ms: u64,
}

impl Default for MistRules {
    fn default() -> Self {
        Self {
            thirst_relief: 25.0,
            cooldown_ms: 500,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PokeRules {
    pub cooldown_ms: u64,
    pub annoyance_threshold: usize,
    pub annoyance_window_ms: u64,
}

impl Default for PokeRules {
    fn default() -> Self {
        Self {
            cooldown_ms: 800,
            annoyance_threshold: 5,
            annoyance_window_ms: 5_000,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct JarRules {
    pub boredom_relief_per_firefly: f32,
    pub boredom_relief_cap: f32,
    pub cooldown_ms: u64,
    pub catch_radius_px: f32,
}

impl Default for JarRules {
    fn default() -> Self {
        Self {
            boredom_relief_per_firefly: 4.0,
            boredom_relief_cap: 60.0,
            cooldown_ms: 1_000,
            catch_radius_px: 60.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StageRules {
    pub foods: Vec<FoodType>,
    pub meters: ActiveMeters,
}

impl Default for StageRules {
    fn default() -> Self {
        Self {
            foods: vec![FoodType::BarkChip],
            meters: ActiveMeters::HUNGER_ONLY,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StageThresholds {
    pub feeds_to_stage2: u32,
    pub mists_to_stage3: u32,
}

impl Default for StageThresholds {
    fn default() -> Self {
        Self {
            feeds_to_stage2: 4,
            mists_to_stage3: 10,
        }
    }
}

/// Every constant the simulation reads. Loaded once and never mutated by the core.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub stats: StatRates,
    pub neglect: NeglectRules,
    pub behavior: Behavior,
    pub timing: Timing,
    pub throw: ThrowRules,
    pub foods: BTreeMap<FoodType, FoodSpec>,
    pub mist: MistRules,
    pub poke: PokeRules,
    pub jar: JarRules,
    pub stages: BTreeMap<AgeStage, StageRules>,
    pub thresholds: StageThresholds,
}

impl Default for Tuning {
    fn default() -> Self {
        let mut foods = BTreeMap::new();
        foods.insert(
            FoodType::BarkChip,
            FoodSpec {
                hunger_relief: 12.0,
                cooldown_ms: 800,
            },
        );
        foods.insert(
            FoodType::DeadLeaf,
            FoodSpec {
                hunger_relief: 25.0,
                cooldown_ms: 1_500,
            },
        );
        foods.insert(
            FoodType::RottenLog,
            FoodSpec {
                hunger_relief: 40.0,
                cooldown_ms: 3_000,
            },
        );
        foods.insert(
            FoodType::Compost,
            FoodSpec {
                hunger_relief: 55.0,
                cooldown_ms: 5_000,
            },
        );

        let grown_foods = vec![FoodType::BarkChip, FoodType::DeadLeaf, FoodType::RottenLog];
        let mut stages = BTreeMap::new();
        stages.insert(
            AgeStage::One,
            StageRules {
                foods: vec![FoodType::BarkChip],
                meters: ActiveMeters::HUNGER_ONLY,
            },
        );
        stages.insert(
            AgeStage::Two,
            StageRules {
                foods: grown_foods.clone(),
                meters: ActiveMeters {
                    hunger: true,
                    thirst: true,
                    boredom: false,
                },
            },
        );
        stages.insert(
            AgeStage::Three,
            StageRules {
                foods: grown_foods,
                meters: ActiveMeters {
                    hunger: true,
                    thirst: true,
                    boredom: true,
                },
            },
        );

        Self {
            stats: StatRates::default(),
            neglect: NeglectRules::default(),
            behavior: Behavior::default(),
            timing: Timing::default(),
            throw: ThrowRules::default(),
            foods,
            mist: MistRules::default(),
            poke: PokeRules::default(),
            jar: JarRules::default(),
            stages,
            thresholds: StageThresholds::default(),
        }
    }
}

impl Tuning {
    pub fn active_meters(&self, stage: AgeStage) -> ActiveMeters {
        self.stages
            .get(&stage)
            .map(|s| s.meters)
            .unwrap_or(ActiveMeters::HUNGER_ONLY)
    }

    pub fn allows_food(&self, stage: AgeStage, food: FoodType) -> bool {
        self.stages
            .get(&stage)
            .is_some_and(|s| s.foods.contains(&food))
    }

    pub fn food(&self, food: FoodType) -> FoodSpec {
        self.foods.get(&food).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_one_only_takes_bark_chips() {
        let t = Tuning::default();
        assert!(t.allows_food(AgeStage::One, FoodType::BarkChip));
        assert!(!t.allows_food(AgeStage::One, FoodType::DeadLeaf));
        assert!(t.allows_food(AgeStage::Two, FoodType::RottenLog));
        assert!(!t.allows_food(AgeStage::Three, FoodType::Compost));
    }

    #[test]
    fn meters_unlock_by_stage() {
        let t = Tuning::default();
        assert_eq!(t.active_meters(AgeStage::One), ActiveMeters::HUNGER_ONLY);
        assert!(t.active_meters(AgeStage::Two).thirst);
        assert!(!t.active_meters(AgeStage::Two).boredom);
        assert!(t.active_meters(AgeStage::Three).boredom);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let t: Tuning =
            serde_json::from_str(r#"{"stats": {"hunger": 3.0}, "jar": {"cooldown_ms": 250}}"#)
                .unwrap();
        assert_eq!(t.stats.hunger, 3.0);
        assert_eq!(t.stats.thirst, 100.0 / 65.0);
        assert_eq!(t.jar.cooldown_ms, 250);
        assert_eq!(t.jar.boredom_relief_cap, 60.0);
        assert_eq!(t.food(FoodType::DeadLeaf).hunger_relief, 25.0);
    }

    #[test]
    fn partial_food_and_stage_entries_keep_field_defaults() {
        let t: Tuning = serde_json::from_str(
            r#"{
                "foods": {"barkChip": {"hunger_relief": 20.0}},
                "stages": {"two": {"foods": ["barkChip", "compost"]}}
            }"#,
        )
        .unwrap();
        assert_eq!(t.food(FoodType::BarkChip).hunger_relief, 20.0);
        assert_eq!(t.food(FoodType::BarkChip).cooldown_ms, 800);
        assert!(t.allows_food(AgeStage::Two, FoodType::Compost));
        assert_eq!(t.active_meters(AgeStage::Two), ActiveMeters::HUNGER_ONLY);
    }
}
