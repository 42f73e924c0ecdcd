use crate::model::{Millis, ReactionKind};
use crate::pet::PetState;

/// Edge detector over the pet's interaction stamps. Keeps its own last-seen
/// copies, like an animation layer would, and reports each new stamp once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReactionWatcher {
    fed: Millis,
    misted: Millis,
    poked: Millis,
    gifted: Millis,
}

fn edge(seen: &mut Millis, current: Millis) -> bool {
    if current.is_never() || current == *seen {
        return false;
    }
    *seen = current;
    true
}

impl ReactionWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, pet: &PetState) -> Vec<ReactionKind> {
        let mut out = Vec::new();
        if edge(&mut self.fed, pet.last_feed_time()) {
            out.push(ReactionKind::Fed);
        }
        if edge(&mut self.misted, pet.last_mist_time()) {
            out.push(ReactionKind::Misted);
        }
        if edge(&mut self.poked, pet.last_poke_time()) {
            out.push(ReactionKind::Poked);
        }
        if edge(&mut self.gifted, pet.last_gift_time()) {
            out.push(ReactionKind::Gifted);
        }
        out
    }

    pub fn reset(&mut self) {
        *self = ReactionWatcher::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FoodType;
    use crate::tuning::Tuning;

    #[test]
    fn each_stamp_is_reported_once() {
        let tuning = Tuning::default();
        let mut pet = PetState::new();
        let mut w = ReactionWatcher::new();
        assert!(w.observe(&pet).is_empty());

        pet.feed(FoodType::BarkChip, Millis(10), &tuning);
        pet.poke(Millis(11));
        assert_eq!(
            w.observe(&pet),
            vec![ReactionKind::Fed, ReactionKind::Poked]
        );
        assert!(w.observe(&pet).is_empty());

        pet.mist(Millis(20), &tuning);
        assert_eq!(w.observe(&pet), vec![ReactionKind::Misted]);
    }

    #[test]
    fn pet_reset_is_not_an_event() {
        let tuning = Tuning::default();
        let mut pet = PetState::new();
        let mut w = ReactionWatcher::new();
        pet.give_fireflies(2, Millis(5), &tuning);
        assert_eq!(w.observe(&pet), vec![ReactionKind::Gifted]);
        pet.reset();
        assert!(w.observe(&pet).is_empty());
    }
}
