//! Ship spawning and retirement.
//!
//! A [`Shipyard`] pairs one planet with a ship pool for the duration of a
//! call, so it can act both as the pool ships come from and as the fleet they
//! are registered to. Retirement goes through [`retire_ship`], the single
//! path that removes a ship from its roster and despawns it.

use crate::clock::{SimRng, SimTime};
use crate::components::{FleetMember, Target};
use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::planet::{FleetOwner, Planet, PlanetId, PlanetRegistry};
use crate::pool::AgentPool;
use crate::ship::ShipBundle;
use bevy_ecs::prelude::*;
use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;
use tracing::debug;

/// Uniform random point in a disc of `radius` around the origin.
pub(crate) fn random_in_disc<R: Rng + ?Sized>(rng: &mut R, radius: f32) -> Vec2 {
    let r = radius * rng.gen::<f32>().sqrt();
    Vec2::from_angle(rng.gen_range(0.0..TAU)) * r
}

pub struct Shipyard<'a, P: AgentPool> {
    planet: &'a mut Planet,
    pool: &'a mut P,
}

impl<'a, P: AgentPool> Shipyard<'a, P> {
    pub fn new(planet: &'a mut Planet, pool: &'a mut P) -> Self {
        Self { planet, pool }
    }

    /// Spawn one ship for the planet's owner next to the planet and add it
    /// to the planet's fleet.
    pub fn spawn_ship<R: Rng + ?Sized>(&mut self, rng: &mut R, config: &SimConfig, now: f32) -> SimResult<Entity> {
        let id = self.planet.id();
        let owner = self.planet.owner();
        if owner.is_none() {
            return Err(SimError::Unowned(id));
        }
        if self.planet.fleet_len() >= config.planets.max_fleet_size {
            return Err(SimError::FleetFull(id));
        }

        let size = self.planet.size();
        let position = self.planet.position + config.planets.spawn_offset + random_in_disc(rng, size);
        let heading = Vec2::from_angle(rng.gen_range(0.0..TAU));

        let ship = ShipBundle::new(owner, self.planet.planet_type(), position, heading, &config.ships, now)
            .with_target(Target::Planet(id), size);

        let ship = self.acquire((ship, FleetMember(id))).ok_or(SimError::PoolExhausted)?;
        self.register_ship(ship);
        debug!(planet = id.0, ?ship, "ship spawned");
        Ok(ship)
    }
}

impl<P: AgentPool> AgentPool for Shipyard<'_, P> {
    fn acquire<B: Bundle>(&mut self, ship: B) -> Option<Entity> {
        self.pool.acquire(ship)
    }

    fn release(&mut self, ship: Entity) -> bool {
        self.planet.unregister_ship(ship);
        self.pool.release(ship)
    }
}

impl<P: AgentPool> FleetOwner for Shipyard<'_, P> {
    fn owner_id(&self) -> PlanetId {
        self.planet.id()
    }

    fn register_ship(&mut self, ship: Entity) -> bool {
        self.planet.register_ship(ship)
    }

    fn unregister_ship(&mut self, ship: Entity) -> bool {
        self.planet.unregister_ship(ship)
    }
}

/// Remove a ship from the roster of `fleet` and despawn it.
///
/// Calling this again with the same entity logs a warning and changes
/// nothing.
pub fn retire_ship<P: AgentPool>(
    pool: &mut P,
    planets: &mut PlanetRegistry,
    ship: Entity,
    fleet: Option<PlanetId>,
) -> bool {
    if let Some(planet) = fleet.and_then(|id| planets.get_mut(id)) {
        planet.unregister_ship(ship);
    }
    pool.release(ship)
}

/// Spawn a ship at `planet` straight into `world`, outside the schedule.
///
/// The world must hold the simulation resources (`SimConfig`, `SimTime`,
/// `SimRng`, `PlanetRegistry` and `FleetPool`).
pub fn launch_ship(world: &mut World, planet: PlanetId) -> SimResult<Entity> {
    let config = world.resource::<SimConfig>().clone();
    let now = world.resource::<SimTime>().0;
    world.resource_scope(|world, mut rng: Mut<SimRng>| {
        world.resource_scope(|world, mut planets: Mut<PlanetRegistry>| {
            let planet = planets.get_mut(planet).ok_or(SimError::UnknownPlanet(planet))?;
            Shipyard::new(planet, world).spawn_ship(&mut rng.0, &config, now)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Player, Position, ShipType};
    use crate::pool::FleetPool;
    use crate::ship::Helm;

    fn setup(capacity: usize) -> (World, PlanetId) {
        let mut planets = PlanetRegistry::new();
        let id = planets.add(Vec2::new(10.0, 0.0), 1.5, ShipType::Blue, Player::Player2, 0);
        let mut world = World::new();
        world.insert_resource(planets);
        world.insert_resource(SimConfig::default());
        world.insert_resource(SimTime(0.0));
        world.insert_resource(SimRng::seeded(1));
        world.insert_resource(FleetPool::new(capacity));
        (world, id)
    }

    #[test]
    fn test_spawn_registers_and_targets_planet() {
        let (mut world, id) = setup(64);

        let ship = launch_ship(&mut world, id).unwrap();

        assert_eq!(world.get::<Player>(ship), Some(&Player::Player2));
        assert_eq!(world.get::<ShipType>(ship), Some(&ShipType::Blue));
        assert_eq!(world.get::<FleetMember>(ship), Some(&FleetMember(id)));
        let helm = world.get::<Helm>(ship).unwrap();
        assert_eq!(helm.target, Some(Target::Planet(id)));
        assert_eq!(helm.min_target_distance, 1.5);
        let spawn_center = Vec2::new(11.0, 0.0);
        assert!(world.get::<Position>(ship).unwrap().0.distance(spawn_center) <= 1.5 + 1e-4);
        assert_eq!(world.resource::<PlanetRegistry>().get(id).unwrap().fleet(), &[ship]);
    }

    #[test]
    fn test_spawn_respects_fleet_cap() {
        let (mut world, id) = setup(64);
        world.resource_mut::<SimConfig>().planets.max_fleet_size = 2;

        assert!(launch_ship(&mut world, id).is_ok());
        assert!(launch_ship(&mut world, id).is_ok());
        assert!(matches!(launch_ship(&mut world, id), Err(SimError::FleetFull(_))));
        assert_eq!(world.resource::<FleetPool>().active(), 2);
    }

    #[test]
    fn test_exhausted_pool_leaves_roster_alone() {
        let (mut world, id) = setup(1);
        assert!(launch_ship(&mut world, id).is_ok());
        assert!(matches!(launch_ship(&mut world, id), Err(SimError::PoolExhausted)));
        assert_eq!(world.resource::<PlanetRegistry>().get(id).unwrap().fleet_len(), 1);
    }

    #[test]
    fn test_unowned_planet_cannot_spawn() {
        let (mut world, _) = setup(4);
        let id = world
            .resource_mut::<PlanetRegistry>()
            .add(Vec2::ZERO, 1.0, ShipType::Red, Player::None, 3);

        assert!(matches!(launch_ship(&mut world, id), Err(SimError::Unowned(_))));
        assert_eq!(world.resource::<FleetPool>().active(), 0);
    }

    #[test]
    fn test_retire_is_idempotent() {
        let (mut world, id) = setup(64);
        let ship = launch_ship(&mut world, id).unwrap();

        let retire = |world: &mut World| {
            let fleet = world.get::<FleetMember>(ship).map(|f| f.0);
            world.resource_scope(|world, mut planets: Mut<PlanetRegistry>| {
                retire_ship(world, &mut planets, ship, fleet)
            })
        };

        assert!(retire(&mut world));
        assert_eq!(world.resource::<PlanetRegistry>().get(id).unwrap().fleet_len(), 0);
        let released_after_first = world.resource::<FleetPool>().stats().total_released;

        assert!(!retire(&mut world));
        assert_eq!(world.resource::<PlanetRegistry>().get(id).unwrap().fleet_len(), 0);
        assert_eq!(world.resource::<FleetPool>().stats().total_released, released_after_first);
        assert_eq!(world.resource::<FleetPool>().active(), 0);
    }
}
