//! Troop movement between planets.
//!
//! [`TroopMovementManager`] is the only code path that changes a planet's
//! owner or stock on request, and the only one that moves ships between
//! fleet rosters. Requests are applied one at a time between ticks.
//!
//! | Destination            | Condition            | Result                                   |
//! |------------------------|----------------------|------------------------------------------|
//! | owned by mover         | -                    | dest stock += n                          |
//! | other owner / unowned  | n > dest stock       | dest owner = mover, stock = n - stock    |
//! | other owner / unowned  | n <= dest stock      | dest stock -= n, owner unchanged         |
//!
//! In every accepted case the source loses `n`, where `n` is the request
//! clamped to the source's stock.

use crate::components::{FleetMember, Health, Player, ShipType, Target};
use crate::error::{SimError, SimResult};
use crate::planet::{FleetOwner, PlanetId, PlanetRegistry};
use crate::ship::Helm;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub from: PlanetId,
    pub to: PlanetId,
    pub troops: i32,
    pub player: Player,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveKind {
    Reinforced,
    /// Failed assault; defenders attrited.
    Repelled,
    Captured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
    /// Troops actually moved after clamping to the source stock.
    pub moved: u32,
    pub kind: MoveKind,
    /// Destination owner before the move.
    pub previous_owner: Player,
    pub ships_transferred: usize,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TroopMovementManager;

impl TroopMovementManager {
    /// Move troops and resolve reinforcement or assault at the destination.
    ///
    /// `type_filter` restricts which ships follow the troops. Ships live in
    /// `ships`; the registry is passed separately so callers can scope it
    /// out of the same world.
    pub fn move_troops(
        &self,
        planets: &mut PlanetRegistry,
        ships: &mut World,
        request: &MoveRequest,
        type_filter: Option<ShipType>,
    ) -> SimResult<MoveOutcome> {
        if let Err(err) = validate(planets, request) {
            warn!(?request, %err, "troop movement rejected");
            return Err(err);
        }
        let MoveRequest { from, to, troops, player } = *request;

        if from == to {
            let planet = planets.get(from).ok_or(SimError::UnknownPlanet(from))?;
            let moved = (troops as u32).min(planet.stock());
            debug!(planet = from.0, moved, "troops moved in place");
            return Ok(MoveOutcome {
                moved,
                kind: MoveKind::Reinforced,
                previous_owner: player,
                ships_transferred: 0,
            });
        }

        let (source, dest) = planets.pair_mut(from, to).ok_or(SimError::UnknownPlanet(to))?;
        let moved = (troops as u32).min(source.stock());
        source.take_stock(moved);

        let previous_owner = dest.owner();
        let kind = if previous_owner == player {
            dest.add_stock(moved);
            MoveKind::Reinforced
        } else if moved > dest.stock() {
            let garrison = moved - dest.stock();
            dest.conquer(player, garrison);
            info!(planet = to.0, from = ?previous_owner, to = ?player, garrison, "planet captured by assault");
            MoveKind::Captured
        } else {
            dest.take_stock(moved);
            MoveKind::Repelled
        };

        let ships_transferred = self.transfer_ships(planets, ships, from, to, moved as usize, player, type_filter)?;
        debug!(from = from.0, to = to.0, moved, ?kind, ships_transferred, "troops moved");

        Ok(MoveOutcome {
            moved,
            kind,
            previous_owner,
            ships_transferred,
        })
    }

    /// Reassign up to `count` ships from `from`'s roster to `to`'s, newest
    /// first, retargeting each to the destination. Only live ships of the
    /// source owner's player whose type passes `type_filter` move.
    #[allow(clippy::too_many_arguments)]
    pub fn transfer_ships(
        &self,
        planets: &mut PlanetRegistry,
        ships: &mut World,
        from: PlanetId,
        to: PlanetId,
        count: usize,
        player: Player,
        type_filter: Option<ShipType>,
    ) -> SimResult<usize> {
        for id in [from, to] {
            if planets.get(id).is_none() {
                return Err(SimError::UnknownPlanet(id));
            }
        }
        if from == to || count == 0 {
            return Ok(0);
        }
        let (source, dest) = planets.pair_mut(from, to).ok_or(SimError::UnknownPlanet(to))?;

        let source_owner = source.owner();
        let eligible = |ship: Entity| {
            let alive = ships.get::<Health>(ship).is_some_and(Health::is_alive);
            let owned = ships.get::<Player>(ship) == Some(&source_owner);
            let typed = type_filter.map_or(true, |t| ships.get::<ShipType>(ship) == Some(&t));
            alive && owned && typed
        };
        let selected: Vec<Entity> = source
            .fleet()
            .iter()
            .rev()
            .copied()
            .filter(|&ship| eligible(ship))
            .take(count)
            .collect();

        let dest_id = dest.id();
        let dest_size = dest.size();
        for &ship in &selected {
            source.unregister_ship(ship);
            if let Some(mut fleet) = ships.get_mut::<FleetMember>(ship) {
                fleet.0 = dest_id;
            }
            if let Some(mut helm) = ships.get_mut::<Helm>(ship) {
                helm.set_target(Target::Planet(dest_id), dest_size);
            }
            dest.register_ship(ship);
        }

        if !selected.is_empty() {
            debug!(from = from.0, to = to.0, ?player, ships = selected.len(), "fleet transferred");
        }
        Ok(selected.len())
    }
}

fn validate(planets: &PlanetRegistry, request: &MoveRequest) -> SimResult<()> {
    let source = planets.get(request.from).ok_or(SimError::UnknownPlanet(request.from))?;
    planets.get(request.to).ok_or(SimError::UnknownPlanet(request.to))?;
    if request.troops <= 0 {
        return Err(SimError::NonPositiveTroops(request.troops));
    }
    if request.player.is_none() || source.owner() != request.player {
        return Err(SimError::NotOwner {
            planet: request.from,
            owner: source.owner(),
            player: request.player,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::pool::FleetPool;
    use crate::shipyard::Shipyard;
    use glam::Vec2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ships() -> World {
        let mut world = World::new();
        world.insert_resource(FleetPool::new(16));
        world
    }

    fn launch(planets: &mut PlanetRegistry, world: &mut World, at: PlanetId, count: usize) -> Vec<Entity> {
        let mut rng = StdRng::seed_from_u64(4);
        let config = SimConfig::default();
        let planet = planets.get_mut(at).unwrap();
        let mut yard = Shipyard::new(planet, world);
        (0..count).map(|_| yard.spawn_ship(&mut rng, &config, 0.0).unwrap()).collect()
    }

    fn registry(specs: &[(Player, u32)]) -> (PlanetRegistry, Vec<PlanetId>) {
        let mut planets = PlanetRegistry::new();
        let ids = specs
            .iter()
            .enumerate()
            .map(|(i, &(owner, stock))| planets.add(Vec2::new(i as f32 * 20.0, 0.0), 1.0, ShipType::Red, owner, stock))
            .collect();
        (planets, ids)
    }

    fn request(from: PlanetId, to: PlanetId, troops: i32, player: Player) -> MoveRequest {
        MoveRequest { from, to, troops, player }
    }

    #[test]
    fn test_reinforcement_conserves_troops() {
        let (mut planets, ids) = registry(&[(Player::Player1, 20), (Player::Player1, 5)]);
        let mut world = ships();
        let outcome = TroopMovementManager
            .move_troops(&mut planets, &mut world, &request(ids[0], ids[1], 8, Player::Player1), None)
            .unwrap();
        assert_eq!(outcome.moved, 8);
        assert_eq!(outcome.kind, MoveKind::Reinforced);
        assert_eq!(planets.get(ids[0]).unwrap().stock(), 12);
        assert_eq!(planets.get(ids[1]).unwrap().stock(), 13);
    }

    #[test]
    fn test_assault_outcomes() {
        let (mut planets, ids) = registry(&[(Player::Player1, 40), (Player::Player2, 15), (Player::None, 5)]);
        let mut world = ships();
        let tmm = TroopMovementManager;

        let repelled = tmm
            .move_troops(&mut planets, &mut world, &request(ids[0], ids[1], 8, Player::Player1), None)
            .unwrap();
        assert_eq!(repelled.kind, MoveKind::Repelled);
        assert_eq!(planets.get(ids[1]).unwrap().owner(), Player::Player2);
        assert_eq!(planets.get(ids[1]).unwrap().stock(), 7);

        let captured = tmm
            .move_troops(&mut planets, &mut world, &request(ids[0], ids[2], 8, Player::Player1), None)
            .unwrap();
        assert_eq!(captured.kind, MoveKind::Captured);
        assert_eq!(captured.previous_owner, Player::None);
        assert_eq!(planets.get(ids[2]).unwrap().owner(), Player::Player1);
        assert_eq!(planets.get(ids[2]).unwrap().stock(), 3);
        assert_eq!(planets.get(ids[0]).unwrap().stock(), 24);
    }

    #[test]
    fn test_equal_force_is_repelled_to_zero() {
        let (mut planets, ids) = registry(&[(Player::Player1, 10), (Player::Player2, 10)]);
        let mut world = ships();
        let outcome = TroopMovementManager
            .move_troops(&mut planets, &mut world, &request(ids[0], ids[1], 10, Player::Player1), None)
            .unwrap();
        assert_eq!(outcome.kind, MoveKind::Repelled);
        assert_eq!(planets.get(ids[1]).unwrap().stock(), 0);
        assert_eq!(planets.get(ids[1]).unwrap().owner(), Player::Player2);
    }

    #[test]
    fn test_invalid_requests_change_nothing() {
        let (mut planets, ids) = registry(&[(Player::Player2, 20), (Player::Player1, 5)]);
        let mut world = ships();
        let tmm = TroopMovementManager;

        let not_owner = tmm.move_troops(&mut planets, &mut world, &request(ids[0], ids[1], 5, Player::Player1), None);
        assert!(matches!(not_owner, Err(SimError::NotOwner { .. })));
        let zero = tmm.move_troops(&mut planets, &mut world, &request(ids[1], ids[0], 0, Player::Player1), None);
        assert!(matches!(zero, Err(SimError::NonPositiveTroops(0))));
        let missing = tmm.move_troops(&mut planets, &mut world, &request(ids[1], PlanetId(99), 3, Player::Player1), None);
        assert!(matches!(missing, Err(SimError::UnknownPlanet(PlanetId(99)))));

        assert_eq!(planets.get(ids[0]).unwrap().stock(), 20);
        assert_eq!(planets.get(ids[0]).unwrap().owner(), Player::Player2);
        assert_eq!(planets.get(ids[1]).unwrap().stock(), 5);
    }

    #[test]
    fn test_over_request_is_clamped() {
        let (mut a, ids) = registry(&[(Player::Player1, 20), (Player::Player2, 5)]);
        let (mut b, _) = registry(&[(Player::Player1, 20), (Player::Player2, 5)]);
        let mut world = ships();
        let tmm = TroopMovementManager;

        let over = tmm.move_troops(&mut a, &mut world, &request(ids[0], ids[1], 1020, Player::Player1), None).unwrap();
        let exact = tmm.move_troops(&mut b, &mut world, &request(ids[0], ids[1], 20, Player::Player1), None).unwrap();
        assert_eq!(over, exact);
        assert_eq!(over.moved, 20);
        for id in &ids {
            assert_eq!(a.get(*id).unwrap().stock(), b.get(*id).unwrap().stock());
            assert_eq!(a.get(*id).unwrap().owner(), b.get(*id).unwrap().owner());
        }
    }

    #[test]
    fn test_transfer_moves_newest_matching_ships() {
        let mut planets = PlanetRegistry::new();
        let from = planets.add(Vec2::ZERO, 1.0, ShipType::Blue, Player::Player1, 0);
        let to = planets.add(Vec2::new(30.0, 0.0), 2.0, ShipType::Red, Player::Player1, 0);
        let mut world = ships();
        let fleet = launch(&mut planets, &mut world, from, 4);
        world.get_mut::<Health>(fleet[3]).unwrap().kill();
        *world.get_mut::<ShipType>(fleet[1]).unwrap() = ShipType::Gray;

        let moved = TroopMovementManager
            .transfer_ships(&mut planets, &mut world, from, to, 5, Player::Player1, Some(ShipType::Blue))
            .unwrap();
        assert_eq!(moved, 2);
        assert_eq!(planets.get(to).unwrap().fleet(), &[fleet[2], fleet[0]]);
        assert_eq!(planets.get(from).unwrap().fleet(), &[fleet[1], fleet[3]]);

        assert_eq!(world.get::<FleetMember>(fleet[2]), Some(&FleetMember(to)));
        assert_eq!(world.get::<FleetMember>(fleet[1]), Some(&FleetMember(from)));
        let helm = world.get::<Helm>(fleet[2]).unwrap();
        assert_eq!(helm.target, Some(Target::Planet(to)));
        assert_eq!(helm.min_target_distance, 2.0);
    }

    #[test]
    fn test_transfer_limited_to_moved_troops() {
        let mut planets = PlanetRegistry::new();
        let from = planets.add(Vec2::ZERO, 1.0, ShipType::Red, Player::Player1, 2);
        let to = planets.add(Vec2::new(30.0, 0.0), 1.0, ShipType::Red, Player::Player2, 10);
        let mut world = ships();
        launch(&mut planets, &mut world, from, 5);

        let outcome = TroopMovementManager
            .move_troops(&mut planets, &mut world, &request(from, to, 9, Player::Player1), None)
            .unwrap();
        assert_eq!(outcome.moved, 2);
        assert_eq!(outcome.ships_transferred, 2);
        assert_eq!(planets.get(from).unwrap().fleet_len(), 3);
        assert_eq!(planets.get(to).unwrap().fleet_len(), 2);
    }
}
