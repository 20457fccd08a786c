//! Artwork rendering boundary.
//!
//! The simulation only asks for frames by key; how a frame gets drawn is up to
//! the `ArtworkRenderer` implementation. Renderers must be pure: the same key
//! always produces the same image, so results can be cached and rendered
//! speculatively on worker threads.

use image::{Rgba, RgbaImage};

use crate::core::error::{CritterError, Result};
use crate::entity::behavior::BehaviorState;
use crate::entity::species::{ColorVariant, Species};

/// Largest frame edge a renderer will produce (pixels).
pub const MAX_RENDER_SIZE: u32 = 1024;

/// Identifies one rendered frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameKey {
    pub species: Species,
    pub color: ColorVariant,
    pub state: BehaviorState,
    pub frame: u32,
    pub size: u32,
}

/// Number of frames in each state's cycle.
pub fn default_frame_count(state: BehaviorState) -> u32 {
    match state {
        BehaviorState::Idle => 4,
        BehaviorState::Walking | BehaviorState::Exiting | BehaviorState::Entering => 6,
        BehaviorState::Running | BehaviorState::Chasing => 6,
        BehaviorState::Sleeping => 2,
        BehaviorState::Happy => 4,
        BehaviorState::Dragging => 2,
    }
}

/// Seconds each frame of a state is shown.
pub fn default_frame_duration(state: BehaviorState) -> f32 {
    match state {
        BehaviorState::Idle => 0.25,
        BehaviorState::Walking | BehaviorState::Exiting | BehaviorState::Entering => 0.12,
        BehaviorState::Running | BehaviorState::Chasing => 0.08,
        BehaviorState::Sleeping => 0.8,
        BehaviorState::Happy => 0.15,
        BehaviorState::Dragging => 0.3,
    }
}

/// Produces frame images for the simulation.
pub trait ArtworkRenderer: Send + Sync {
    fn render_frame(&self, key: &FrameKey) -> Result<RgbaImage>;

    fn frame_count(&self, state: BehaviorState) -> u32 {
        default_frame_count(state)
    }

    fn frame_duration(&self, state: BehaviorState) -> f32 {
        default_frame_duration(state)
    }
}

/// Placeholder renderer drawing a colored blob that bobs per frame.
///
/// Lets the engine run headless and in tests without real species artwork.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilhouetteRenderer;

impl ArtworkRenderer for SilhouetteRenderer {
    fn render_frame(&self, key: &FrameKey) -> Result<RgbaImage> {
        if key.size == 0 || key.size > MAX_RENDER_SIZE {
            return Err(CritterError::Render(format!(
                "size {} outside 1..={}",
                key.size, MAX_RENDER_SIZE
            )));
        }

        let size = key.size as f32;
        let [r, g, b] = key.color.rgb();
        let body = Rgba([r, g, b, 255]);

        // Sleeping agents lie flat, everything else bobs with the frame
        let (rx, ry) = match key.state {
            BehaviorState::Sleeping => (size * 0.45, size * 0.22),
            _ => (size * 0.38, size * 0.34),
        };
        let count = self.frame_count(key.state).max(1) as f32;
        let phase = (key.frame as f32 / count) * std::f32::consts::TAU;
        let bob = phase.sin() * size * 0.04;
        let cx = size / 2.0;
        let cy = size - ry - size * 0.06 + bob;

        let mut img = RgbaImage::new(key.size, key.size);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            let dx = (x as f32 + 0.5 - cx) / rx;
            let dy = (y as f32 + 0.5 - cy) / ry;
            if dx * dx + dy * dy <= 1.0 {
                *pixel = body;
            }
        }
        Ok(img)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(state: BehaviorState, frame: u32, size: u32) -> FrameKey {
        FrameKey {
            species: Species::Dog,
            color: ColorVariant::Golden,
            state,
            frame,
            size,
        }
    }

    #[test]
    fn test_every_state_has_frames() {
        for state in BehaviorState::ALL {
            assert!(default_frame_count(state) > 0);
            assert!(default_frame_duration(state) > 0.0);
        }
    }

    #[test]
    fn test_silhouette_has_requested_size_and_body_pixels() {
        let img = SilhouetteRenderer.render_frame(&key(BehaviorState::Idle, 0, 32)).unwrap();
        assert_eq!(img.dimensions(), (32, 32));
        let [r, g, b] = ColorVariant::Golden.rgb();
        assert_eq!(img.get_pixel(16, 20), &Rgba([r, g, b, 255]));
        assert_eq!(img.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn test_silhouette_is_deterministic() {
        let k = key(BehaviorState::Walking, 3, 48);
        let a = SilhouetteRenderer.render_frame(&k).unwrap();
        let b = SilhouetteRenderer.render_frame(&k).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_size_is_an_error() {
        assert!(SilhouetteRenderer.render_frame(&key(BehaviorState::Idle, 0, 0)).is_err());
        assert!(SilhouetteRenderer
            .render_frame(&key(BehaviorState::Idle, 0, MAX_RENDER_SIZE + 1))
            .is_err());
    }
}
