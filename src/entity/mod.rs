pub mod agent;
pub mod behavior;
pub mod species;

pub use agent::{Agent, Variation};
pub use behavior::{BehaviorState, RandomBehaviorKind};
pub use species::{ColorVariant, Species, SpeciesDescriptor};
