//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for agents
///
/// Assigned once at creation and never reused, including across roster
/// save/load cycles (restored agents get fresh ids).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub Uuid);

impl AgentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let simple = self.0.simple().to_string();
        write!(f, "{}", &simple[..8])
    }
}

/// Simulation tick counter
pub type Tick = u64;

/// Horizontal facing of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    Left,
    #[default]
    Right,
}

impl Direction {
    /// -1.0 for left, +1.0 for right
    pub fn sign(self) -> f32 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Direction of travel for a signed horizontal delta. Zero keeps `fallback`.
    pub fn from_delta(dx: f32, fallback: Direction) -> Self {
        if dx > 0.0 {
            Direction::Right
        } else if dx < 0.0 {
            Direction::Left
        } else {
            fallback
        }
    }
}

/// 2D position
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// User-selectable movement speed tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum SpeedSetting {
    VerySlow = 0,
    Slow = 1,
    #[default]
    Normal = 2,
    Fast = 3,
    VeryFast = 4,
}

impl SpeedSetting {
    pub const ALL: [SpeedSetting; 5] = [
        SpeedSetting::VerySlow,
        SpeedSetting::Slow,
        SpeedSetting::Normal,
        SpeedSetting::Fast,
        SpeedSetting::VeryFast,
    ];

    /// Multiplier applied on top of the base speed for a state
    pub fn multiplier(self) -> f32 {
        match self {
            SpeedSetting::VerySlow => 0.5,
            SpeedSetting::Slow => 0.75,
            SpeedSetting::Normal => 1.0,
            SpeedSetting::Fast => 1.5,
            SpeedSetting::VeryFast => 2.0,
        }
    }
}
