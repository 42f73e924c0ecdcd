use serde::{Deserialize, Serialize};

/// Monotonic milliseconds since the session clock started. `Millis(0)` means "never".
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Millis(pub u64);

impl Millis {
    pub const NEVER: Millis = Millis(0);

    pub fn is_never(self) -> bool {
        self.0 == 0
    }

    pub fn since(self, earlier: Millis) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    pub fn after(self, delay_ms: u64) -> Millis {
        Millis(self.0.saturating_add(delay_ms))
    }

    /// True when `last` never happened or at least `interval_ms` has passed since it.
    pub fn elapsed_since(self, last: Millis, interval_ms: u64) -> bool {
        last.is_never() || self.since(last) >= interval_ms
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FoodType {
    BarkChip,
    DeadLeaf,
    RottenLog,
    Compost,
}

impl FoodType {
    pub const ALL: [FoodType; 4] = [
        FoodType::BarkChip,
        FoodType::DeadLeaf,
        FoodType::RottenLog,
        FoodType::Compost,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FoodType::BarkChip => "Bark Chip",
            FoodType::DeadLeaf => "Dead Leaf",
            FoodType::RottenLog => "Rotten Log",
            FoodType::Compost => "Compost",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AgeStage {
    One,
    Two,
    Three,
}

impl AgeStage {
    pub fn number(self) -> u8 {
        match self {
            AgeStage::One => 1,
            AgeStage::Two => 2,
            AgeStage::Three => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Meter {
    Hunger,
    Thirst,
    Boredom,
}

impl Meter {
    pub const ALL: [Meter; 3] = [Meter::Hunger, Meter::Thirst, Meter::Boredom];
}

/// Which meters run at a given stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveMeters {
    pub hunger: bool,
    pub thirst: bool,
    pub boredom: bool,
}

impl ActiveMeters {
    pub const HUNGER_ONLY: ActiveMeters = ActiveMeters {
        hunger: true,
        thirst: false,
        boredom: false,
    };

    pub fn contains(self, meter: Meter) -> bool {
        match meter {
            Meter::Hunger => self.hunger,
            Meter::Thirst => self.thirst,
            Meter::Boredom => self.boredom,
        }
    }
}

/// Coarse visual/behavioral mode driven by sustained neglect.
///
/// Only `Normal` and `Dark` have transition rules. Animation code also branches
/// on a third "demonic" look, but nothing ever enters it; add a variant here and
/// a rule in `PetState::next_evolution` once that rule exists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Evolution {
    #[default]
    Normal,
    Dark,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReactionKind {
    Fed,
    Misted,
    Poked,
    Gifted,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GamePhase {
    #[default]
    Playing,
    GameOver,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JarPhase {
    #[default]
    Idle,
    Scooping,
}

/// A finished food drag waiting for world-space hit resolution.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DropRequest {
    pub nx: f32,
    pub ny: f32,
    pub food_type: FoodType,
}

/// Pixel size of the pointer surface, used to normalize drag coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn normalize(&self, x: f32, y: f32) -> (f32, f32) {
        let w = if self.width > 0.0 { self.width } else { 1.0 };
        let h = if self.height > 0.0 { self.height } else { 1.0 };
        (x / w, y / h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_counts_as_elapsed() {
        assert!(Millis(10).elapsed_since(Millis::NEVER, 5_000));
        assert!(!Millis(10_000).elapsed_since(Millis(6_000), 5_000));
        assert!(Millis(11_000).elapsed_since(Millis(6_000), 5_000));
    }

    #[test]
    fn since_saturates() {
        assert_eq!(Millis(5).since(Millis(10)), 0);
    }

    #[test]
    fn degenerate_viewport_does_not_divide_by_zero() {
        let vp = Viewport::new(0.0, 0.0);
        assert_eq!(vp.normalize(3.0, 4.0), (3.0, 4.0));
        let vp = Viewport::new(200.0, 100.0);
        assert_eq!(vp.normalize(50.0, 25.0), (0.25, 0.25));
    }
}
