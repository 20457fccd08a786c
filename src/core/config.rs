//! Simulation configuration with documented constants
//!
//! All magic numbers are collected here with explanations of their purpose
//! and how they interact with each other. A config is constructed explicitly
//! and handed to the `Scheduler`; there is no process-wide instance.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::{CritterError, Result};

/// Configuration for the simulation systems
///
/// These values have been tuned for a desktop strip roughly one screen wide.
/// Changing them will affect pacing and feel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // === TICK ===
    /// Fixed tick rate of the scheduler (Hz)
    pub tick_rate_hz: f32,

    /// Seed for the simulation RNG. `None` seeds from entropy.
    pub seed: Option<u64>,

    // === STRIP ===
    /// Width of the strip agents walk along (pixels)
    ///
    /// Must comfortably fit an agent plus its half-width entry margins,
    /// see `validate`.
    pub strip_width: f32,

    /// Fixed floor offset used as every grounded agent's `y`
    pub floor_y: f32,

    /// How far above the floor floating species hover
    pub float_height: f32,

    /// Default render size of a new agent (pixels, square)
    pub agent_size: u32,

    /// Maximum number of agents on the strip at once
    pub max_agents: usize,

    // === MOVEMENT ===
    /// Base walking speed (px/s), also used while exiting and entering
    pub walk_speed: f32,

    /// Base running speed (px/s), about 2.7x walking
    pub run_speed: f32,

    /// Speed at which a chasing agent closes on the ball (px/s)
    pub chase_speed: f32,

    // === BALL ===
    /// Velocity multiplier applied once per physics step
    pub ball_friction: f32,

    /// Fraction of speed kept when bouncing off a strip edge
    pub ball_restitution: f32,

    /// Below this speed (px/s) the ball is considered stopped
    pub ball_stop_threshold: f32,

    /// Ball diameter (pixels)
    pub ball_size: f32,

    /// Distance between agent centre and ball centre that counts as a catch
    pub catch_radius: f32,

    /// Seconds between a throw and picking the chaser
    pub throw_assign_delay: f32,

    /// Throw speed range for autonomous and user throws (px/s)
    pub throw_speed_min: f32,
    pub throw_speed_max: f32,

    /// Per-second chance that an agent throws a ball on its own
    ///
    /// Multiplied by the tick delta, so at 0.01 a throw happens on average
    /// once every 100 seconds of eligible time.
    pub autonomous_throw_rate: f32,

    /// Minimum seconds between any two throws before an autonomous one
    pub autonomous_throw_cooldown: f32,

    // === SOCIAL ===
    /// Seconds between proximity scans
    pub greeting_cooldown: f32,

    /// Per-second chance that an idle agent starts a random behavior
    pub random_behavior_rate: f32,

    // === RENDERING ===
    /// Maximum number of rendered frames kept in the frame cache
    pub cache_capacity: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 30.0,
            seed: None,

            strip_width: 1280.0,
            floor_y: 96.0,
            float_height: 24.0,
            agent_size: 64,
            max_agents: 12,

            // Running at 2.7x walking
            walk_speed: 40.0,
            run_speed: 108.0,
            chase_speed: 150.0,

            ball_friction: 0.98,
            ball_restitution: 0.7,
            ball_stop_threshold: 5.0,
            ball_size: 16.0,
            catch_radius: 24.0,
            throw_assign_delay: 0.4,
            throw_speed_min: 250.0,
            throw_speed_max: 400.0,
            autonomous_throw_rate: 0.01,
            autonomous_throw_cooldown: 45.0,

            greeting_cooldown: 8.0,
            random_behavior_rate: 0.02,

            cache_capacity: 512,
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds per tick at the configured rate
    pub fn tick_delta(&self) -> f32 {
        1.0 / self.tick_rate_hz
    }

    /// Largest agent that still fits the Entering margins on this strip
    pub fn max_agent_size(&self) -> u32 {
        (self.strip_width / 3.0).max(1.0) as u32
    }

    /// Parse a config from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate().map_err(CritterError::Config)?;
        Ok(config)
    }

    /// Load a config file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.tick_rate_hz <= 0.0 {
            return Err(format!("tick_rate_hz ({}) must be positive", self.tick_rate_hz));
        }

        // Entering needs half a body of margin on each side plus the body itself
        let min_width = self.agent_size as f32 * 3.0;
        if self.strip_width < min_width {
            return Err(format!(
                "strip_width ({}) should be >= 3 x agent_size ({})",
                self.strip_width, min_width
            ));
        }

        if self.walk_speed <= 0.0 || self.run_speed <= self.walk_speed {
            return Err(format!(
                "speeds must satisfy 0 < walk_speed ({}) < run_speed ({})",
                self.walk_speed, self.run_speed
            ));
        }

        if !(0.0..1.0).contains(&self.ball_friction) || !(0.0..=1.0).contains(&self.ball_restitution) {
            return Err("ball_friction must be in [0, 1) and ball_restitution in [0, 1]".into());
        }

        let positive = [
            ("chase_speed", self.chase_speed),
            ("catch_radius", self.catch_radius),
            ("ball_stop_threshold", self.ball_stop_threshold),
            ("ball_size", self.ball_size),
            ("greeting_cooldown", self.greeting_cooldown),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{} ({}) must be positive and finite", name, value));
            }
        }

        if self.throw_speed_min > self.throw_speed_max {
            return Err(format!(
                "throw_speed_min ({}) should be <= throw_speed_max ({})",
                self.throw_speed_min, self.throw_speed_max
            ));
        }

        if self.cache_capacity == 0 {
            return Err("cache_capacity must be at least 1".into());
        }

        if self.max_agents == 0 {
            return Err("max_agents must be at least 1".into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_run_speed_is_about_2_7_walk() {
        let config = SimulationConfig::default();
        let ratio = config.run_speed / config.walk_speed;
        assert!((ratio - 2.7).abs() < 0.01);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SimulationConfig::from_toml_str(
            r#"
            strip_width = 800.0
            seed = 7
            "#,
        )
        .unwrap();
        assert_eq!(config.strip_width, 800.0);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.greeting_cooldown, SimulationConfig::default().greeting_cooldown);
    }

    #[test]
    fn test_narrow_strip_rejected() {
        let result = SimulationConfig::from_toml_str("strip_width = 100.0");
        assert!(matches!(result, Err(CritterError::Config(_))));
    }

    #[test]
    fn test_non_positive_chase_and_ball_values_rejected() {
        for field in [
            "chase_speed",
            "catch_radius",
            "ball_stop_threshold",
            "ball_size",
            "greeting_cooldown",
        ] {
            let result = SimulationConfig::from_toml_str(&format!("{} = 0.0", field));
            assert!(matches!(result, Err(CritterError::Config(_))), "{}", field);
        }
        let config = SimulationConfig {
            chase_speed: f32::NAN,
            ..SimulationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_agent_size_is_a_third_of_the_strip() {
        let config = SimulationConfig::default();
        assert_eq!(config.max_agent_size(), 426);
        assert!(config.agent_size <= config.max_agent_size());
    }

    #[test]
    fn test_tick_delta() {
        let config = SimulationConfig::default();
        assert!((config.tick_delta() - 1.0 / 30.0).abs() < 1e-6);
    }
}
