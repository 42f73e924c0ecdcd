//! Simulation and interaction core for a mushroom pet.
//!
//! Five containers hold all mutable state: [`pet::PetState`],
//! [`feeding::FeedingInteraction`], [`gift::GiftInteraction`],
//! [`dialogue::DialogueTrigger`] and [`session::SessionKeeper`].
//! [`world::World`] owns them and is what a host drives every frame.

pub mod config;
pub mod dialogue;
pub mod feeding;
pub mod gift;
pub mod model;
pub mod pet;
pub mod poke;
pub mod reaction;
pub mod session;
pub mod storage;
pub mod timer;
pub mod tuning;
pub mod world;
