//! Species descriptors
//!
//! Each species is a row in a static table rather than its own type. The row
//! carries everything species-specific the simulation needs: allowed colors,
//! the default name pool, which way the artwork faces, and movement
//! capabilities that select idle behaviors and resting height.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::entity::behavior::RandomBehaviorKind;

/// Creature species
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    Cat,
    Dog,
    Fox,
    Bunny,
    Ghost,
    Owl,
}

impl Species {
    pub const ALL: [Species; 6] = [
        Species::Cat,
        Species::Dog,
        Species::Fox,
        Species::Bunny,
        Species::Ghost,
        Species::Owl,
    ];

    /// Descriptor row for this species
    pub fn descriptor(self) -> &'static SpeciesDescriptor {
        &SPECIES_TABLE[self as usize]
    }
}

/// Color variants across all species. Each species allows a subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorVariant {
    Orange,
    Black,
    White,
    Gray,
    Brown,
    Golden,
    Red,
    Cream,
    Lavender,
    Blue,
}

impl ColorVariant {
    /// Base body color used by the silhouette renderer
    pub fn rgb(self) -> [u8; 3] {
        match self {
            ColorVariant::Orange => [0xE8, 0x8A, 0x2E],
            ColorVariant::Black => [0x2B, 0x2B, 0x30],
            ColorVariant::White => [0xF4, 0xF4, 0xF0],
            ColorVariant::Gray => [0x8E, 0x8E, 0x96],
            ColorVariant::Brown => [0x7A, 0x52, 0x30],
            ColorVariant::Golden => [0xDA, 0xA5, 0x20],
            ColorVariant::Red => [0xC0, 0x3A, 0x1E],
            ColorVariant::Cream => [0xF3, 0xE5, 0xC0],
            ColorVariant::Lavender => [0xB8, 0xA4, 0xE3],
            ColorVariant::Blue => [0x6C, 0x9B, 0xD2],
        }
    }
}

/// Static description of one species
#[derive(Debug)]
pub struct SpeciesDescriptor {
    pub species: Species,
    /// Allowed colors; the first entry is the default
    pub colors: &'static [ColorVariant],
    /// Names handed out when none is given at creation
    pub names: &'static [&'static str],
    /// Whether the unflipped artwork faces right
    pub faces_right: bool,
    pub can_float: bool,
    /// Idle fidgets this species performs
    pub idle_behaviors: &'static [RandomBehaviorKind],
}

impl SpeciesDescriptor {
    pub fn default_color(&self) -> ColorVariant {
        self.colors[0]
    }

    pub fn allows(&self, color: ColorVariant) -> bool {
        self.colors.contains(&color)
    }

    pub fn random_color<R: Rng>(&self, rng: &mut R) -> ColorVariant {
        self.colors.choose(rng).copied().unwrap_or(self.colors[0])
    }

    pub fn random_name<R: Rng>(&self, rng: &mut R) -> &'static str {
        self.names.choose(rng).copied().unwrap_or("Pet")
    }

    /// Resting `y` for this species on a floor at `floor_y`
    pub fn resting_y(&self, floor_y: f32, float_height: f32) -> f32 {
        if self.can_float {
            floor_y - float_height
        } else {
            floor_y
        }
    }
}

// Indexed by `Species as usize`; keep in declaration order.
static SPECIES_TABLE: [SpeciesDescriptor; 6] = [
    SpeciesDescriptor {
        species: Species::Cat,
        colors: &[
            ColorVariant::Orange,
            ColorVariant::Black,
            ColorVariant::White,
            ColorVariant::Gray,
            ColorVariant::Cream,
        ],
        names: &["Mochi", "Luna", "Tofu", "Miso", "Pumpkin", "Shadow"],
        faces_right: true,
        can_float: false,
        idle_behaviors: &[
            RandomBehaviorKind::Stretch,
            RandomBehaviorKind::Yawn,
            RandomBehaviorKind::Groom,
        ],
    },
    SpeciesDescriptor {
        species: Species::Dog,
        colors: &[
            ColorVariant::Golden,
            ColorVariant::Brown,
            ColorVariant::Black,
            ColorVariant::White,
        ],
        names: &["Biscuit", "Rex", "Pepper", "Waffles", "Scout"],
        faces_right: true,
        can_float: false,
        idle_behaviors: &[
            RandomBehaviorKind::Stretch,
            RandomBehaviorKind::Yawn,
            RandomBehaviorKind::LookAround,
        ],
    },
    SpeciesDescriptor {
        species: Species::Fox,
        colors: &[ColorVariant::Red, ColorVariant::White, ColorVariant::Gray],
        names: &["Ember", "Rusty", "Sly", "Juniper"],
        faces_right: false,
        can_float: false,
        idle_behaviors: &[RandomBehaviorKind::LookAround, RandomBehaviorKind::Yawn],
    },
    SpeciesDescriptor {
        species: Species::Bunny,
        colors: &[
            ColorVariant::White,
            ColorVariant::Brown,
            ColorVariant::Gray,
            ColorVariant::Cream,
        ],
        names: &["Clover", "Thumper", "Daisy", "Bun"],
        faces_right: false,
        can_float: false,
        idle_behaviors: &[RandomBehaviorKind::Groom, RandomBehaviorKind::LookAround],
    },
    SpeciesDescriptor {
        species: Species::Ghost,
        colors: &[ColorVariant::White, ColorVariant::Lavender, ColorVariant::Blue],
        names: &["Boo", "Casper", "Wisp", "Misty"],
        faces_right: true,
        can_float: true,
        idle_behaviors: &[RandomBehaviorKind::Spin, RandomBehaviorKind::LookAround],
    },
    SpeciesDescriptor {
        species: Species::Owl,
        colors: &[ColorVariant::Brown, ColorVariant::Gray, ColorVariant::White],
        names: &["Hoot", "Sage", "Pip", "Olive"],
        faces_right: true,
        can_float: true,
        idle_behaviors: &[RandomBehaviorKind::LookAround, RandomBehaviorKind::Spin],
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_table_rows_match_species() {
        for species in Species::ALL {
            assert_eq!(species.descriptor().species, species);
        }
    }

    #[test]
    fn test_every_species_has_colors_names_and_behaviors() {
        for species in Species::ALL {
            let desc = species.descriptor();
            assert!(!desc.colors.is_empty(), "{:?} has no colors", species);
            assert!(!desc.names.is_empty(), "{:?} has no names", species);
            assert!(!desc.idle_behaviors.is_empty(), "{:?} has no idle behaviors", species);
            assert!(desc.allows(desc.default_color()));
        }
    }

    #[test]
    fn test_random_color_is_allowed() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for species in Species::ALL {
            let desc = species.descriptor();
            for _ in 0..20 {
                assert!(desc.allows(desc.random_color(&mut rng)));
            }
        }
    }

    #[test]
    fn test_floaters_rest_above_floor() {
        assert_eq!(Species::Ghost.descriptor().resting_y(100.0, 20.0), 80.0);
        assert_eq!(Species::Dog.descriptor().resting_y(100.0, 20.0), 100.0);
    }

    #[test]
    fn test_fox_disallows_lavender() {
        assert!(!Species::Fox.descriptor().allows(ColorVariant::Lavender));
    }
}
