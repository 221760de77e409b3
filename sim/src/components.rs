//! ECS components and shared value types for the Warmask simulation.
//!
//! These are plain data: ownership tags, ship types, kinematics, health, and
//! the target a ship is steering toward. Behaviour lives in the systems.

use crate::planet::PlanetId;
use bevy_ecs::prelude::*;
use glam::Vec2;
use serde::{Deserialize, Serialize};

// ============================================================================
// OWNERSHIP
// ============================================================================

/// Owner of a planet or ship. Ships are always owned by a real player;
/// `None` only appears on unowned (neutral) planets.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Player {
    #[default]
    None,
    Player1,
    Player2,
}

impl Player {
    pub fn is_none(&self) -> bool {
        matches!(self, Player::None)
    }

    /// Stable numeric id used in snapshots.
    pub fn id(&self) -> u8 {
        match self {
            Player::None => 0,
            Player::Player1 => 1,
            Player::Player2 => 2,
        }
    }
}

// ============================================================================
// TYPES & MASKS
// ============================================================================

/// Planet/ship type. Selects production bonuses and transfer filtering only;
/// colors and sprites are looked up by the presentation layer through `id()`.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShipType {
    #[default]
    Red,
    Gray,
    Blue,
}

impl ShipType {
    pub fn id(&self) -> i32 {
        match self {
            ShipType::Red => 0,
            ShipType::Gray => 1,
            ShipType::Blue => 2,
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            0 => Some(ShipType::Red),
            1 => Some(ShipType::Gray),
            2 => Some(ShipType::Blue),
            _ => None,
        }
    }
}

/// The currently active mask, pushed in by the presentation layer.
///
/// Production reads this directly each tick, so a change takes effect on the
/// next tick without any listener bookkeeping.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveMask(pub Option<ShipType>);

impl ActiveMask {
    /// Production interval multiplier for a planet of `planet_type`.
    pub fn production_multiplier(&self, planet_type: ShipType, matched: f32, mismatched: f32) -> f32 {
        match self.0 {
            None => 1.0,
            Some(mask) if mask == planet_type => matched,
            Some(_) => mismatched,
        }
    }
}

// ============================================================================
// KINEMATICS
// ============================================================================

/// World-space position.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position(pub Vec2);

/// Velocity in units per second. A ship's magnitude is always its move speed.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity(pub Vec2);

impl Velocity {
    pub fn heading(&self) -> Vec2 {
        self.0.normalize_or_zero()
    }
}

// ============================================================================
// COMBAT
// ============================================================================

/// Hull integrity. Reaching zero flips the one-way `pending_death` flag.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Health {
    pub current: f32,
    pub max: f32,
    pending_death: bool,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self {
            current: max,
            max,
            pending_death: false,
        }
    }

    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            (self.current / self.max).clamp(0.0, 1.0)
        }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0 && !self.pending_death
    }

    pub fn is_pending_death(&self) -> bool {
        self.pending_death
    }

    /// Apply damage. Returns `true` only on the hit that caused death;
    /// damage after that point is ignored.
    pub fn damage(&mut self, amount: f32) -> bool {
        if self.pending_death {
            return false;
        }
        self.current = (self.current - amount).max(0.0);
        if self.current <= 0.0 {
            self.pending_death = true;
            return true;
        }
        false
    }

    /// Mark for removal regardless of remaining health. Idempotent.
    pub fn kill(&mut self) -> bool {
        if self.pending_death {
            return false;
        }
        self.pending_death = true;
        true
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

// ============================================================================
// NAVIGATION
// ============================================================================

/// What a ship steers toward when it is not chasing an enemy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Target {
    Planet(PlanetId),
    Point(Vec2),
}

/// Planet whose fleet roster lists this ship.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetMember(pub PlanetId);
