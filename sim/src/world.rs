//! Snapshot types.
//!
//! The `Snapshot` struct provides a serializable view of the simulation state
//! that the presentation layer renders from.

use crate::components::{ActiveMask, FleetMember, Health, Player, Position, ShipType, Velocity};
use crate::planet::{PlanetRegistry, SiegeStatus};
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Snapshot of a single ship's state for serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipSnapshot {
    /// `Entity::to_bits`; stable for the ship's lifetime.
    pub id: u64,
    pub player: u8,
    /// Type id for the color/sprite lookup.
    pub ship_type: i32,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub health: f32,
    pub health_max: f32,
    pub planet: Option<u32>,
}

/// Snapshot of a planet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanetSnapshot {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub planet_type: i32,
    pub owner: u8,
    pub stock: u32,
    pub status: SiegeStatus,
    pub own_in_orbit: u32,
    pub enemy_in_orbit: u32,
    pub fleet: usize,
}

/// Complete simulation state snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Current simulation tick.
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub time: f32,
    pub active_mask: Option<ShipType>,
    pub ships: Vec<ShipSnapshot>,
    pub planets: Vec<PlanetSnapshot>,
}

impl ShipSnapshot {
    fn new(
        entity: Entity,
        (player, ship_type, position, velocity, health, fleet): (
            &Player,
            &ShipType,
            &Position,
            &Velocity,
            &Health,
            Option<&FleetMember>,
        ),
    ) -> Self {
        Self {
            id: entity.to_bits(),
            player: player.id(),
            ship_type: ship_type.id(),
            x: position.0.x,
            y: position.0.y,
            vx: velocity.0.x,
            vy: velocity.0.y,
            health: health.current,
            health_max: health.max,
            planet: fleet.map(|f| f.0 .0),
        }
    }

    /// Read one ship out of `world`. `None` if the entity is stale or not a
    /// ship.
    pub fn capture(world: &World, entity: Entity) -> Option<Self> {
        let ship = (
            world.get::<Player>(entity)?,
            world.get::<ShipType>(entity)?,
            world.get::<Position>(entity)?,
            world.get::<Velocity>(entity)?,
            world.get::<Health>(entity)?,
            world.get::<FleetMember>(entity),
        );
        Some(Self::new(entity, ship))
    }

    pub fn position(&self) -> glam::Vec2 {
        glam::Vec2::new(self.x, self.y)
    }

    pub fn velocity(&self) -> glam::Vec2 {
        glam::Vec2::new(self.vx, self.vy)
    }
}

impl Snapshot {
    /// Create a snapshot from the ECS world.
    pub fn from_world(world: &mut World, tick: u64, time: f32) -> Self {
        let mut query = world.query::<(
            Entity,
            &Player,
            &ShipType,
            &Position,
            &Velocity,
            &Health,
            Option<&FleetMember>,
        )>();
        let ships = query
            .iter(world)
            .map(|(entity, player, ship_type, position, velocity, health, fleet)| {
                ShipSnapshot::new(entity, (player, ship_type, position, velocity, health, fleet))
            })
            .collect();

        let planets = world
            .get_resource::<PlanetRegistry>()
            .map(|planets| {
                planets
                    .iter()
                    .map(|p| PlanetSnapshot {
                        id: p.id().0,
                        x: p.position.x,
                        y: p.position.y,
                        size: p.size(),
                        planet_type: p.planet_type().id(),
                        owner: p.owner().id(),
                        stock: p.stock(),
                        status: p.status(),
                        own_in_orbit: p.tally().own,
                        enemy_in_orbit: p.tally().enemy,
                        fleet: p.fleet_len(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            tick,
            time,
            active_mask: world.get_resource::<ActiveMask>().and_then(|m| m.0),
            ships,
            planets,
        }
    }

    /// Serialize snapshot to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize snapshot to pretty JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Serialize snapshot to JSON bytes.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShipConfig;
    use crate::planet::PlanetId;
    use crate::ship::ShipBundle;
    use glam::Vec2;

    fn sample() -> Snapshot {
        Snapshot {
            tick: 42,
            time: 1.4,
            active_mask: Some(ShipType::Gray),
            ships: vec![ShipSnapshot {
                id: 7,
                player: 1,
                ship_type: 1,
                x: 10.0,
                y: 20.0,
                vx: 5.0,
                vy: 0.0,
                health: 60.0,
                health_max: 100.0,
                planet: Some(0),
            }],
            planets: vec![PlanetSnapshot {
                id: 0,
                x: 0.0,
                y: 0.0,
                size: 1.5,
                planet_type: 1,
                owner: 1,
                stock: 12,
                status: SiegeStatus::Falling,
                own_in_orbit: 0,
                enemy_in_orbit: 4,
                fleet: 1,
            }],
        }
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let snapshot = sample();

        let restored = Snapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(restored.tick, 42);
        assert_eq!(restored.active_mask, Some(ShipType::Gray));
        assert_eq!(restored.ships[0].id, 7);
        assert_eq!(restored.planets[0].status, SiegeStatus::Falling);

        let bytes = snapshot.to_json_bytes().unwrap();
        assert_eq!(Snapshot::from_json_slice(&bytes).unwrap().planets[0].stock, 12);
    }

    #[test]
    fn test_capture_reads_ship_components() {
        let mut world = World::new();
        let ship = ShipBundle::new(Player::Player2, ShipType::Blue, Vec2::new(3.0, 4.0), Vec2::X, &ShipConfig::default(), 0.0);
        let rostered = world.spawn((ship.clone(), FleetMember(PlanetId(2)))).id();
        let loose = world.spawn(ship).id();
        let not_a_ship = world.spawn(Position(Vec2::ZERO)).id();

        let snapshot = ShipSnapshot::capture(&world, rostered).unwrap();
        assert_eq!(snapshot.id, rostered.to_bits());
        assert_eq!(snapshot.player, 2);
        assert_eq!(snapshot.ship_type, ShipType::Blue.id());
        assert_eq!(snapshot.position(), Vec2::new(3.0, 4.0));
        assert_eq!(snapshot.planet, Some(2));
        assert_eq!(ShipSnapshot::capture(&world, loose).unwrap().planet, None);
        assert!(ShipSnapshot::capture(&world, not_a_ship).is_none());

        let full = Snapshot::from_world(&mut world, 0, 0.0);
        assert_eq!(full.ships.len(), 2);
        assert!(full.planets.is_empty());
    }
}
