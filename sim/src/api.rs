//! Public API for the simulation.
//!
//! This module provides the main interface for the presentation layer (or any
//! other client) to drive the simulation, query planets and fleets, and issue
//! player or opponent commands.
//!
//! ## Fixed Timestep
//!
//! The simulation uses a fixed timestep internally (default 30 Hz). When
//! `step(dt)` is called, the simulation accumulates time and runs fixed
//! updates as needed. This keeps behavior independent of frame rate.
//!
//! ## Commands
//!
//! Commands run between ticks, never inside the schedule, so a troop movement
//! always sees a planet whose deaths and production for the previous tick
//! are complete.

use crate::clock::{DeltaTime, SimRng, SimTick, SimTime};
use crate::components::{ActiveMask, FleetMember, Player, ShipType};
use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::events::{CaptureCause, SimEvent, SimEvents};
use crate::planet::{Planet, PlanetId, PlanetRegistry, SiegeStatus};
use crate::pool::{FleetPool, PoolStats};
use crate::shipyard::{launch_ship, retire_ship};
use crate::spatial::{spatial_index_system, NeighborLists, SpatialGrid};
use crate::systems::*;
use crate::troops::{MoveKind, MoveOutcome, MoveRequest, TroopMovementManager};
use crate::world::{ShipSnapshot, Snapshot};
use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;
use glam::Vec2;
use tracing::info;

/// The main simulation world container.
///
/// Holds the ECS world and schedule, providing a clean API for:
/// - Setting up planets
/// - Stepping the simulation forward
/// - Extracting state snapshots and events
/// - Issuing troop, spawn, and transfer commands
pub struct SimWorld {
    world: World,
    schedule: Schedule,
    troops: TroopMovementManager,
    tick: u64,
    time: f32,
    /// Accumulated time for fixed timestep.
    time_accumulator: f32,
}

impl SimWorld {
    /// Create a new empty simulation world.
    pub fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    /// Create a new simulation world with custom configuration.
    pub fn with_config(config: SimConfig) -> Self {
        let mut world = World::new();

        world.insert_resource(DeltaTime(config.fixed_timestep));
        world.insert_resource(SimTick(0));
        world.insert_resource(SimTime(0.0));
        world.insert_resource(SimRng::seeded(config.seed));
        world.insert_resource(FleetPool::new(config.max_ships));
        world.insert_resource(PlanetRegistry::new());
        world.insert_resource(SpatialGrid::new(config.spatial_cell_size));
        world.insert_resource(NeighborLists::default());
        world.insert_resource(ActiveMask::default());
        world.insert_resource(SimEvents::default());
        world.insert_resource(config);

        // One strictly ordered pass per tick; planet and troop state is
        // never touched from two systems at once.
        let mut schedule = Schedule::default();
        schedule.set_executor_kind(ExecutorKind::SingleThreaded);
        schedule.add_systems(
            (
                spatial_index_system,
                flocking_system,
                target_acquisition_system,
                movement_system,
                weapon_system,
                death_system,
                planet_proximity_system,
                planet_update_system,
            )
                .chain(),
        );

        Self {
            world,
            schedule,
            troops: TroopMovementManager,
            tick: 0,
            time: 0.0,
            time_accumulator: 0.0,
        }
    }

    /// Create a simulation world from a JSON configuration document.
    pub fn from_config_json(json: &str) -> SimResult<Self> {
        Ok(Self::with_config(SimConfig::from_json_str(json)?))
    }

    /// Register a planet. Planets are fixed for the lifetime of the world.
    pub fn add_planet(&mut self, position: Vec2, size: f32, planet_type: ShipType, owner: Player, stock: u32) -> PlanetId {
        self.world
            .resource_mut::<PlanetRegistry>()
            .add(position, size, planet_type, owner, stock)
    }

    /// Step the simulation forward by `dt` seconds.
    ///
    /// Uses fixed timestep internally - accumulates time and runs fixed updates
    /// as needed.
    pub fn step(&mut self, dt: f32) {
        let fixed_dt = self.config().fixed_timestep;
        if fixed_dt <= 0.0 {
            return;
        }

        self.time_accumulator += dt;
        while self.time_accumulator >= fixed_dt {
            self.fixed_update(fixed_dt);
            self.time_accumulator -= fixed_dt;
        }
    }

    /// Run a single fixed timestep update.
    pub fn fixed_update(&mut self, dt: f32) {
        self.world.resource_mut::<DeltaTime>().0 = dt;
        self.world.resource_mut::<SimTick>().increment();
        self.world.resource_mut::<SimTime>().0 = self.time + dt;

        self.schedule.run(&mut self.world);

        self.tick += 1;
        self.time += dt;
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn config(&self) -> &SimConfig {
        self.world.resource::<SimConfig>()
    }

    pub fn planets(&self) -> impl Iterator<Item = &Planet> {
        self.world.resource::<PlanetRegistry>().iter()
    }

    pub fn planet(&self, id: PlanetId) -> Option<&Planet> {
        self.world.resource::<PlanetRegistry>().get(id)
    }

    pub fn planets_owned_by(&self, player: Player) -> Vec<PlanetId> {
        self.world.resource::<PlanetRegistry>().owned_by(player)
    }

    pub fn planets_not_owned_by(&self, player: Player) -> Vec<PlanetId> {
        self.world.resource::<PlanetRegistry>().not_owned_by(player)
    }

    pub fn planet_status(&self, id: PlanetId) -> Option<SiegeStatus> {
        self.planet(id).map(|p| p.status())
    }

    /// Number of ships on a planet's fleet roster.
    pub fn fleet_count(&self, id: PlanetId) -> Option<usize> {
        self.planet(id).map(|p| p.fleet_len())
    }

    pub fn fleet_roster(&self, id: PlanetId) -> Option<&[Entity]> {
        self.planet(id).map(|p| p.fleet())
    }

    /// Read a ship's current state. Stale entities resolve to `None`.
    pub fn ship(&self, ship: Entity) -> Option<ShipSnapshot> {
        ShipSnapshot::capture(&self.world, ship)
    }

    pub fn ship_count(&self) -> usize {
        self.world.resource::<FleetPool>().active()
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.world.resource::<FleetPool>().stats().clone()
    }

    pub fn active_mask(&self) -> Option<ShipType> {
        self.world.resource::<ActiveMask>().0
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Move troops between planets and resolve the outcome at the
    /// destination. Ships follow the troops; for the human player only ships
    /// matching the active mask do.
    pub fn move_troops(&mut self, from: PlanetId, to: PlanetId, troops: i32, player: Player) -> SimResult<MoveOutcome> {
        let tmm = self.troops;
        let filter = self.transfer_filter(player);
        let request = MoveRequest { from, to, troops, player };
        let outcome = self
            .world
            .resource_scope(|world, mut planets: Mut<PlanetRegistry>| {
                tmm.move_troops(&mut planets, world, &request, filter)
            })?;

        let mut events = self.world.resource_mut::<SimEvents>();
        events.push(SimEvent::TroopsMoved {
            from,
            to,
            troops: outcome.moved,
            player,
        });
        if outcome.kind == MoveKind::Captured {
            events.push(SimEvent::PlanetCaptured {
                planet: to,
                from: outcome.previous_owner,
                to: player,
                cause: CaptureCause::Assault,
            });
        }
        Ok(outcome)
    }

    /// Spawn a ship at a planet immediately. Stock is not consumed.
    pub fn spawn_ship(&mut self, planet: PlanetId) -> SimResult<Entity> {
        let ship = launch_ship(&mut self.world, planet)?;
        self.world
            .resource_mut::<SimEvents>()
            .push(SimEvent::ShipSpawned { ship, planet });
        Ok(ship)
    }

    /// Reassign up to `count` of `player`'s ships from one planet's fleet to
    /// another's without moving troops.
    pub fn transfer_ships(&mut self, from: PlanetId, to: PlanetId, count: usize, player: Player) -> SimResult<usize> {
        let tmm = self.troops;
        let owner = self.planet(from).ok_or(SimError::UnknownPlanet(from))?.owner();
        if player.is_none() || owner != player {
            return Err(SimError::NotOwner {
                planet: from,
                owner,
                player,
            });
        }
        let filter = self.transfer_filter(player);
        self.world
            .resource_scope(|world, mut planets: Mut<PlanetRegistry>| {
                tmm.transfer_ships(&mut planets, world, from, to, count, player, filter)
            })
    }

    /// Destroy a ship now. Returns `false` for a stale entity.
    pub fn recall_ship(&mut self, ship: Entity) -> bool {
        let fleet = self.world.get::<FleetMember>(ship).map(|f| f.0);
        let player = self.world.get::<Player>(ship).copied();
        let released = self
            .world
            .resource_scope(|world, mut planets: Mut<PlanetRegistry>| {
                retire_ship(world, &mut planets, ship, fleet)
            });

        if let (true, Some(player)) = (released, player) {
            self.world
                .resource_mut::<SimEvents>()
                .push(SimEvent::ShipDestroyed { ship, player });
        }
        released
    }

    /// Ship types allowed to follow `player`'s troops.
    fn transfer_filter(&self, player: Player) -> Option<ShipType> {
        if player == self.config().human_player {
            self.active_mask()
        } else {
            None
        }
    }

    /// Change the active mask. Production picks it up on the next tick.
    pub fn set_active_mask(&mut self, mask: Option<ShipType>) {
        let mut active = self.world.resource_mut::<ActiveMask>();
        if active.0 != mask {
            info!(from = ?active.0, to = ?mask, "active mask changed");
            active.0 = mask;
        }
    }

    /// Take all events produced since the last call.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.world.resource_mut::<SimEvents>().drain()
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    /// Get a snapshot of the current simulation state.
    pub fn snapshot(&mut self) -> Snapshot {
        Snapshot::from_world(&mut self.world, self.tick, self.time)
    }

    /// Get the snapshot as a JSON string.
    pub fn snapshot_json(&mut self) -> String {
        self.snapshot().to_json().unwrap_or_else(|_| "{}".to_string())
    }

    /// Get the current tick number.
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Get the elapsed simulation time.
    pub fn current_time(&self) -> f32 {
        self.time
    }

    /// Get direct access to the ECS world (for advanced usage).
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Get mutable access to the ECS world (for advanced usage).
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}
