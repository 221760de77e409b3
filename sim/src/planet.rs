//! Planets: territory nodes with a troop stockpile, production, and siege.
//!
//! ## State machine
//!
//! | Status       | Condition                              | Per tick                       |
//! |--------------|----------------------------------------|--------------------------------|
//! | `Unowned`    | no owner                               | nothing                        |
//! | `Producing`  | owned, no enemy ships in orbit         | production timer runs          |
//! | `Contested`  | owned, own and enemy ships in orbit    | nothing (standoff)             |
//! | `Falling`    | owned, enemy ships only                | stock decays 1 per interval    |
//!
//! A falling planet whose stock reaches zero is captured by the last
//! attacker and its orbit tally resets.
//!
//! Owner and stock are private. Outside this module they change only through
//! [`crate::troops::TroopMovementManager`] and [`Planet::advance`].

use crate::components::{Player, ShipType};
use bevy_ecs::prelude::*;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Stable planet identifier (index into the registry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlanetId(pub u32);

/// Capability: keep a roster of ships.
pub trait FleetOwner {
    fn owner_id(&self) -> PlanetId;
    /// Returns `false` if the ship was already on the roster.
    fn register_ship(&mut self, ship: Entity) -> bool;
    /// Returns `false` if the ship was not on the roster.
    fn unregister_ship(&mut self, ship: Entity) -> bool;
}

/// Ships counted inside a planet's ownership radius this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrbitTally {
    pub own: u32,
    pub enemy: u32,
    /// Opposing player with the most ships in orbit.
    pub attacker: Player,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SiegeStatus {
    Unowned,
    Producing,
    Contested,
    Falling,
}

/// Outcome of one planet tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanetEvent {
    Idle,
    UnitProduced,
    StockDecayed,
    Captured { from: Player, to: Player },
}

#[derive(Debug, Clone)]
pub struct Planet {
    id: PlanetId,
    pub position: Vec2,
    size: f32,
    planet_type: ShipType,
    owner: Player,
    stock: u32,
    production_timer: f32,
    decay_timer: f32,
    tally: OrbitTally,
    last_attacker: Player,
    fleet: Vec<Entity>,
}

impl Planet {
    pub fn new(id: PlanetId, position: Vec2, size: f32, planet_type: ShipType, owner: Player, stock: u32) -> Self {
        Self {
            id,
            position,
            size: size.max(0.01),
            planet_type,
            owner,
            stock,
            production_timer: 0.0,
            decay_timer: 0.0,
            tally: OrbitTally::default(),
            last_attacker: Player::None,
            fleet: Vec::new(),
        }
    }

    pub fn id(&self) -> PlanetId {
        self.id
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn planet_type(&self) -> ShipType {
        self.planet_type
    }

    pub fn owner(&self) -> Player {
        self.owner
    }

    pub fn stock(&self) -> u32 {
        self.stock
    }

    pub fn tally(&self) -> OrbitTally {
        self.tally
    }

    pub fn last_attacker(&self) -> Player {
        self.last_attacker
    }

    pub fn fleet(&self) -> &[Entity] {
        &self.fleet
    }

    pub fn fleet_len(&self) -> usize {
        self.fleet.len()
    }

    pub fn ownership_radius(&self, factor: f32) -> f32 {
        self.size * factor
    }

    pub fn status(&self) -> SiegeStatus {
        if self.owner.is_none() {
            SiegeStatus::Unowned
        } else if self.tally.enemy > 0 && self.tally.own > 0 {
            SiegeStatus::Contested
        } else if self.tally.enemy > 0 {
            SiegeStatus::Falling
        } else {
            SiegeStatus::Producing
        }
    }

    /// Seconds per produced unit, before the mask multiplier.
    pub fn base_production_interval(&self, production_factor: f32, min_interval: f32) -> f32 {
        (production_factor / self.size).max(min_interval)
    }

    /// Store this tick's orbit tally. Unowned planets skip siege checks.
    pub fn record_orbit(&mut self, tally: OrbitTally) {
        if self.owner.is_none() {
            self.tally = OrbitTally::default();
            return;
        }
        if tally.enemy > 0 && !tally.attacker.is_none() {
            self.last_attacker = tally.attacker;
        }
        self.tally = tally;
    }

    /// Advance production or siege by `dt`.
    pub fn advance(&mut self, dt: f32, production_interval: f32, decay_interval: f32, max_stock: u32) -> PlanetEvent {
        match self.status() {
            SiegeStatus::Unowned => {
                self.production_timer = 0.0;
                self.decay_timer = 0.0;
                PlanetEvent::Idle
            }
            SiegeStatus::Contested => {
                self.decay_timer = 0.0;
                PlanetEvent::Idle
            }
            SiegeStatus::Falling => {
                self.production_timer = 0.0;
                self.decay_timer += dt;
                if self.decay_timer < decay_interval {
                    return PlanetEvent::Idle;
                }
                self.decay_timer -= decay_interval;
                self.stock = self.stock.saturating_sub(1);
                if self.stock > 0 {
                    return PlanetEvent::StockDecayed;
                }
                let from = self.owner;
                let to = self.last_attacker;
                if to.is_none() || to == from {
                    return PlanetEvent::StockDecayed;
                }
                self.owner = to;
                self.tally = OrbitTally::default();
                self.decay_timer = 0.0;
                self.production_timer = 0.0;
                PlanetEvent::Captured { from, to }
            }
            SiegeStatus::Producing => {
                self.decay_timer = 0.0;
                self.production_timer += dt;
                if self.production_timer < production_interval {
                    return PlanetEvent::Idle;
                }
                self.production_timer = 0.0;
                if self.stock >= max_stock {
                    return PlanetEvent::Idle;
                }
                self.stock += 1;
                PlanetEvent::UnitProduced
            }
        }
    }

    pub(crate) fn take_stock(&mut self, amount: u32) {
        self.stock = self.stock.saturating_sub(amount);
    }

    pub(crate) fn add_stock(&mut self, amount: u32) {
        self.stock = self.stock.saturating_add(amount);
    }

    /// Assault success: the attacker's survivors become the garrison.
    pub(crate) fn conquer(&mut self, new_owner: Player, garrison: u32) {
        self.owner = new_owner;
        self.stock = garrison;
        self.tally = OrbitTally::default();
        self.production_timer = 0.0;
        self.decay_timer = 0.0;
    }
}

impl FleetOwner for Planet {
    fn owner_id(&self) -> PlanetId {
        self.id
    }

    fn register_ship(&mut self, ship: Entity) -> bool {
        if self.fleet.contains(&ship) {
            return false;
        }
        self.fleet.push(ship);
        true
    }

    fn unregister_ship(&mut self, ship: Entity) -> bool {
        match self.fleet.iter().position(|&h| h == ship) {
            Some(index) => {
                self.fleet.remove(index);
                true
            }
            None => {
                warn!(planet = self.id.0, ?ship, "unregister of ship not in fleet ignored");
                false
            }
        }
    }
}

/// All planets. Planets are created at setup and never removed.
#[derive(Resource, Debug, Default)]
pub struct PlanetRegistry {
    planets: Vec<Planet>,
}

impl PlanetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, position: Vec2, size: f32, planet_type: ShipType, owner: Player, stock: u32) -> PlanetId {
        let id = PlanetId(self.planets.len() as u32);
        self.planets.push(Planet::new(id, position, size, planet_type, owner, stock));
        id
    }

    pub fn get(&self, id: PlanetId) -> Option<&Planet> {
        self.planets.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: PlanetId) -> Option<&mut Planet> {
        self.planets.get_mut(id.0 as usize)
    }

    /// Two distinct planets, mutably.
    pub fn pair_mut(&mut self, a: PlanetId, b: PlanetId) -> Option<(&mut Planet, &mut Planet)> {
        let (ia, ib) = (a.0 as usize, b.0 as usize);
        if ia == ib || ia >= self.planets.len() || ib >= self.planets.len() {
            return None;
        }
        if ia < ib {
            let (left, right) = self.planets.split_at_mut(ib);
            Some((&mut left[ia], &mut right[0]))
        } else {
            let (left, right) = self.planets.split_at_mut(ia);
            Some((&mut right[0], &mut left[ib]))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Planet> {
        self.planets.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Planet> {
        self.planets.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.planets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.planets.is_empty()
    }

    pub fn owned_by(&self, player: Player) -> Vec<PlanetId> {
        self.planets.iter().filter(|p| p.owner == player).map(|p| p.id).collect()
    }

    pub fn not_owned_by(&self, player: Player) -> Vec<PlanetId> {
        self.planets.iter().filter(|p| p.owner != player).map(|p| p.id).collect()
    }
}
