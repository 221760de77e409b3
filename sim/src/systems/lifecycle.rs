//! Ship lifecycle - retires ships whose health ran out this tick.

use crate::components::{FleetMember, Health, Player};
use crate::events::{SimEvent, SimEvents};
use crate::planet::PlanetRegistry;
use crate::pool::{CommandPool, FleetPool};
use crate::shipyard::retire_ship;
use bevy_ecs::prelude::*;

/// Unregisters pending-death ships from their planet and despawns them.
/// Runs after weapons so no ship is removed while a shot could still land.
pub fn death_system(
    mut commands: Commands,
    mut pool: ResMut<FleetPool>,
    mut planets: ResMut<PlanetRegistry>,
    mut events: ResMut<SimEvents>,
    ships: Query<(Entity, &Player, &Health, Option<&FleetMember>)>,
) {
    let mut ships_pool = CommandPool::new(&mut commands, &mut pool);
    for (entity, &player, health, fleet) in &ships {
        if !health.is_pending_death() {
            continue;
        }
        if retire_ship(&mut ships_pool, &mut planets, entity, fleet.map(|f| f.0)) {
            events.push(SimEvent::ShipDestroyed { ship: entity, player });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{SimRng, SimTime};
    use crate::components::ShipType;
    use crate::config::SimConfig;
    use crate::planet::FleetOwner;
    use crate::shipyard::launch_ship;
    use glam::Vec2;

    #[test]
    fn test_dead_ship_leaves_roster_and_world() {
        let mut world = World::new();
        let mut planets = PlanetRegistry::new();
        let id = planets.add(Vec2::ZERO, 1.0, ShipType::Red, Player::Player1, 0);
        world.insert_resource(planets);
        world.insert_resource(SimConfig::default());
        world.insert_resource(SimTime(0.0));
        world.insert_resource(SimRng::seeded(9));
        world.insert_resource(FleetPool::new(8));
        world.insert_resource(SimEvents::default());

        let doomed = launch_ship(&mut world, id).unwrap();
        let survivor = launch_ship(&mut world, id).unwrap();
        world.get_mut::<Health>(doomed).unwrap().damage(1000.0);

        let mut schedule = Schedule::default();
        schedule.add_systems(death_system);
        schedule.run(&mut world);
        schedule.run(&mut world);

        assert!(world.get::<Health>(doomed).is_none());
        assert!(world.get::<Health>(survivor).is_some());
        let pool = world.resource::<FleetPool>();
        assert_eq!(pool.active(), 1);
        assert_eq!(pool.stats().total_released, 1);
        assert_eq!(pool.stats().failed_releases, 0);

        let planet = world.resource::<PlanetRegistry>().get(id).unwrap();
        assert_eq!(planet.fleet(), &[survivor]);
        assert_eq!(planet.owner_id(), id);

        let events = world.resource_mut::<SimEvents>().drain();
        assert_eq!(
            events,
            vec![SimEvent::ShipDestroyed {
                ship: doomed,
                player: Player::Player1
            }]
        );
    }
}
