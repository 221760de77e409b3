//! Planet systems - orbit tallies, production, and siege decay.
//!
//! Planet state is shared and mutable, so both systems run sequentially in
//! planet order after all ship deaths of the tick have been applied.

use crate::clock::{DeltaTime, SimRng, SimTime};
use crate::components::{ActiveMask, Health, Player, Position};
use crate::config::SimConfig;
use crate::error::SimError;
use crate::events::{CaptureCause, SimEvent, SimEvents};
use crate::planet::{OrbitTally, Planet, PlanetEvent, PlanetRegistry};
use crate::pool::{CommandPool, FleetPool};
use crate::shipyard::Shipyard;
use bevy_ecs::prelude::*;
use tracing::{debug, info};

/// Count ships inside `planet`'s ownership radius, split by owner.
pub fn orbit_tally<'a>(
    planet: &Planet,
    ships: impl IntoIterator<Item = (&'a Position, &'a Player, &'a Health)>,
    radius_factor: f32,
) -> OrbitTally {
    let radius = planet.ownership_radius(radius_factor);
    let sqr_radius = radius * radius;
    let owner = planet.owner();

    let mut own = 0u32;
    // Player1, Player2
    let mut enemy_by_player = [0u32; 2];
    for (position, &player, health) in ships {
        if !health.is_alive() || position.0.distance_squared(planet.position) > sqr_radius {
            continue;
        }
        if player == owner {
            own += 1;
        } else {
            match player {
                Player::Player1 => enemy_by_player[0] += 1,
                Player::Player2 => enemy_by_player[1] += 1,
                Player::None => {}
            }
        }
    }

    let enemy = enemy_by_player.iter().sum();
    let attacker = if enemy == 0 {
        Player::None
    } else if enemy_by_player[1] > enemy_by_player[0] {
        Player::Player2
    } else {
        Player::Player1
    };
    OrbitTally { own, enemy, attacker }
}

/// Recomputes every planet's orbit tally from current ship positions.
pub fn planet_proximity_system(
    config: Res<SimConfig>,
    ships: Query<(&Position, &Player, &Health)>,
    mut planets: ResMut<PlanetRegistry>,
) {
    let factor = config.planets.ownership_radius_factor;
    for planet in planets.iter_mut() {
        let tally = orbit_tally(planet, &ships, factor);
        planet.record_orbit(tally);
    }
}

/// Advances production and siege decay, spawning a ship per produced unit.
#[allow(clippy::too_many_arguments)]
pub fn planet_update_system(
    config: Res<SimConfig>,
    dt: Res<DeltaTime>,
    time: Res<SimTime>,
    mask: Res<ActiveMask>,
    mut rng: ResMut<SimRng>,
    mut pool: ResMut<FleetPool>,
    mut commands: Commands,
    mut planets: ResMut<PlanetRegistry>,
    mut events: ResMut<SimEvents>,
) {
    let pc = &config.planets;
    let mut ships = CommandPool::new(&mut commands, &mut pool);
    for planet in planets.iter_mut() {
        let interval = planet.base_production_interval(config.production_factor, pc.min_production_interval)
            * mask.production_multiplier(planet.planet_type(), pc.mask_match_multiplier, pc.mask_mismatch_multiplier);

        match planet.advance(dt.0, interval, pc.siege_decay_interval, pc.max_stockpile) {
            PlanetEvent::UnitProduced => {
                let id = planet.id();
                match Shipyard::new(planet, &mut ships).spawn_ship(&mut rng.0, &config, time.0) {
                    Ok(ship) => events.push(SimEvent::ShipSpawned { ship, planet: id }),
                    Err(SimError::FleetFull(_)) => {}
                    Err(err) => debug!(planet = id.0, %err, "no ship for produced unit"),
                }
            }
            PlanetEvent::Captured { from, to } => {
                info!(planet = planet.id().0, ?from, ?to, "planet fell to siege");
                events.push(SimEvent::PlanetCaptured {
                    planet: planet.id(),
                    from,
                    to,
                    cause: CaptureCause::Siege,
                });
            }
            PlanetEvent::StockDecayed | PlanetEvent::Idle => {}
        }
    }
}
