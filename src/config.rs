// Configuration surface for a simulation session.
//
// Every field is a plain number with a gameplay-tuned default. All structs
// deserialize from TOML with `#[serde(default)]`, so a file only needs the
// values it overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Largest grid the tile indexing (`i32` coordinates) can address.
const MAX_GRID_CELLS: u64 = i32::MAX as u64;

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

// ============================================================================
// GRID + CAVE
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub width: u32,
    pub height: u32,
    /// World units per tile side.
    pub tile_size: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 100,
            height: 100,
            tile_size: 32.0,
        }
    }
}

/// Cave generation parameters. Consumed once by the generator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaveConfig {
    pub seed: u64,
    /// Chance (0..=100) that an interior tile starts as Wall.
    pub fill_percent: u32,
    pub smooth_steps: u32,
    /// Number of corridor random walks.
    pub corridor_walks: u32,
    /// Step budget of each walk.
    pub corridor_steps: u32,
}

impl Default for CaveConfig {
    fn default() -> Self {
        Self {
            seed: 43,
            fill_percent: 45,
            smooth_steps: 5,
            corridor_walks: 6,
            corridor_steps: 60,
        }
    }
}

// ============================================================================
// AGENTS
// ============================================================================

/// Per-agent movement, perception and behaviour tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub radius: f32,
    /// World units per second.
    pub speed: f32,
    /// Radians per second.
    pub turn_rate: f32,
    pub max_hp: f32,

    pub fov_deg: f32,
    pub sight_range: f32,
    /// Personal memory refreshed on every sighting (seconds).
    pub lose_sight_time: f32,

    pub repath_interval: f32,
    pub patrol_radius: f32,
    pub patrol_min_radius: f32,
    pub retarget_min: f32,
    pub retarget_max: f32,
    /// Distance at which a waypoint counts as reached.
    pub waypoint_tolerance: f32,

    // Ranged standoff while the target is in sight.
    pub min_range: f32,
    pub preferred_range: f32,
    pub strafe_speed: f32,
    pub max_chase_range: f32,

    pub knockback_friction: f32,
    pub stun_duration: f32,
    /// Movement multiplier while stunned.
    pub stun_speed_factor: f32,
    pub hit_flash_duration: f32,
    /// A searcher this close to the shared intel spot clears it.
    pub intel_reach_radius: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            radius: 12.0,
            speed: 120.0,
            turn_rate: 6.0,
            max_hp: 120.0,
            fov_deg: 70.0,
            sight_range: 520.0,
            lose_sight_time: 2.0,
            repath_interval: 0.25,
            patrol_radius: 220.0,
            patrol_min_radius: 80.0,
            retarget_min: 2.0,
            retarget_max: 4.0,
            waypoint_tolerance: 6.0,
            min_range: 160.0,
            preferred_range: 320.0,
            strafe_speed: 90.0,
            max_chase_range: 900.0,
            knockback_friction: 8.0,
            stun_duration: 0.15,
            stun_speed_factor: 0.25,
            hit_flash_duration: 0.12,
            intel_reach_radius: 24.0,
        }
    }
}

/// Rifle tuning for squad members.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponConfig {
    pub range: f32,
    /// Delay between shots inside a burst.
    pub shot_cooldown: f32,
    /// Delay after the last shot of a burst.
    pub burst_cooldown: f32,
    pub burst_size: u32,
    /// Squadmates closer than this to the line of fire block the shot.
    pub friendly_safety_radius: f32,
    /// How far past the target the line of fire is checked.
    pub shot_extension: f32,
    /// Retry delay after holding fire for a squadmate.
    pub hold_fire_delay: f32,
    pub projectile_speed: f32,
    pub projectile_radius: f32,
    pub projectile_damage: f32,
    pub knockback_impulse: f32,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            range: 560.0,
            shot_cooldown: 0.6,
            burst_cooldown: 1.2,
            burst_size: 3,
            friendly_safety_radius: 20.0,
            shot_extension: 60.0,
            hold_fire_delay: 0.1,
            projectile_speed: 700.0,
            projectile_radius: 4.0,
            projectile_damage: 12.0,
            knockback_impulse: 120.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntelConfig {
    /// Time-to-live published with every sighting.
    pub sighting_ttl: f32,
}

impl Default for IntelConfig {
    fn default() -> Self {
        Self { sighting_ttl: 2.5 }
    }
}

// ============================================================================
// TARGET
// ============================================================================

/// The hunted entity and the shots it fires back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub radius: f32,
    pub max_hp: f32,
    pub shot_speed: f32,
    pub shot_radius: f32,
    pub shot_damage: f32,
    /// Seconds before an unimpeded shot expires.
    pub shot_ttl: f32,
    pub shot_impulse: f32,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            radius: 14.0,
            max_hp: 100.0,
            shot_speed: 900.0,
            shot_radius: 5.0,
            shot_damage: 40.0,
            shot_ttl: 1.5,
            shot_impulse: 220.0,
        }
    }
}

// ============================================================================
// SESSION
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub grid: GridConfig,
    pub cave: CaveConfig,
    pub agent: AgentConfig,
    pub weapon: WeaponConfig,
    pub intel: IntelConfig,
    pub target: TargetConfig,
}

impl SimConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.grid;
        if g.width < 3 || g.height < 3 {
            return Err(invalid("grid", "width and height must be at least 3"));
        }
        if u64::from(g.width) * u64::from(g.height) > MAX_GRID_CELLS {
            return Err(invalid("grid", format!("width * height must not exceed {MAX_GRID_CELLS}")));
        }
        if !(g.tile_size.is_finite() && g.tile_size > 0.0) {
            return Err(invalid("grid.tile_size", "must be a positive finite number"));
        }
        if self.cave.fill_percent > 100 {
            return Err(invalid("cave.fill_percent", "must be within 0..=100"));
        }

        let a = &self.agent;
        let w = &self.weapon;
        let t = &self.target;
        for (field, value) in [
            ("agent.radius", a.radius),
            ("agent.speed", a.speed),
            ("agent.turn_rate", a.turn_rate),
            ("agent.max_hp", a.max_hp),
            ("agent.fov_deg", a.fov_deg),
            ("agent.sight_range", a.sight_range),
            ("agent.lose_sight_time", a.lose_sight_time),
            ("agent.repath_interval", a.repath_interval),
            ("agent.patrol_radius", a.patrol_radius),
            ("agent.patrol_min_radius", a.patrol_min_radius),
            ("agent.retarget_min", a.retarget_min),
            ("agent.retarget_max", a.retarget_max),
            ("agent.waypoint_tolerance", a.waypoint_tolerance),
            ("agent.min_range", a.min_range),
            ("agent.preferred_range", a.preferred_range),
            ("agent.strafe_speed", a.strafe_speed),
            ("agent.max_chase_range", a.max_chase_range),
            ("agent.knockback_friction", a.knockback_friction),
            ("agent.stun_duration", a.stun_duration),
            ("agent.stun_speed_factor", a.stun_speed_factor),
            ("agent.hit_flash_duration", a.hit_flash_duration),
            ("agent.intel_reach_radius", a.intel_reach_radius),
            ("weapon.range", w.range),
            ("weapon.shot_cooldown", w.shot_cooldown),
            ("weapon.burst_cooldown", w.burst_cooldown),
            ("weapon.friendly_safety_radius", w.friendly_safety_radius),
            ("weapon.shot_extension", w.shot_extension),
            ("weapon.hold_fire_delay", w.hold_fire_delay),
            ("weapon.projectile_speed", w.projectile_speed),
            ("weapon.projectile_radius", w.projectile_radius),
            ("weapon.projectile_damage", w.projectile_damage),
            ("weapon.knockback_impulse", w.knockback_impulse),
            ("intel.sighting_ttl", self.intel.sighting_ttl),
            ("target.radius", t.radius),
            ("target.max_hp", t.max_hp),
            ("target.shot_speed", t.shot_speed),
            ("target.shot_radius", t.shot_radius),
            ("target.shot_damage", t.shot_damage),
            ("target.shot_ttl", t.shot_ttl),
            ("target.shot_impulse", t.shot_impulse),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(invalid(field, "must be a non-negative finite number"));
            }
        }

        if !(a.fov_deg > 0.0 && a.fov_deg <= 360.0) {
            return Err(invalid("agent.fov_deg", "must be within (0, 360]"));
        }
        if !(a.retarget_max >= a.retarget_min) {
            return Err(invalid("agent.retarget_max", "must be >= retarget_min"));
        }
        if !(a.patrol_radius >= a.patrol_min_radius) {
            return Err(invalid("agent.patrol_radius", "must be >= patrol_min_radius"));
        }
        if w.burst_size == 0 {
            return Err(invalid("weapon.burst_size", "must be at least 1"));
        }
        Ok(())
    }
}
