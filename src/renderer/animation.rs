//! Frame cursor for agent animation.

/// Cursor into the current state's frame cycle.
///
/// All behavior states loop, so the cursor always wraps instead of
/// finishing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameCursor {
    /// Current frame within the cycle.
    pub frame: u32,
    /// Time accumulator for frame advancement.
    pub frame_timer: f32,
}

impl FrameCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by `dt`, returns true if the frame changed.
    ///
    /// A frame count of zero is treated as a single still frame. If the
    /// cursor is out of range for `frame_count` (the state changed under it)
    /// it snaps back to the first frame.
    pub fn advance(&mut self, dt: f32, frame_count: u32, frame_duration: f32) -> bool {
        let frame_count = frame_count.max(1);
        let mut changed = false;

        if self.frame >= frame_count {
            self.frame = 0;
            self.frame_timer = 0.0;
            changed = true;
        }

        if frame_duration <= 0.0 || frame_count == 1 {
            return changed;
        }

        self.frame_timer += dt;
        while self.frame_timer >= frame_duration {
            self.frame_timer -= frame_duration;
            self.frame = (self.frame + 1) % frame_count;
            changed = true;
        }
        changed
    }

    /// Restart the cycle, used on state entry.
    pub fn reset(&mut self) {
        self.frame = 0;
        self.frame_timer = 0.0;
    }
}
