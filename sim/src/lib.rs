//! Warmask - Simulation Core
//!
//! A deterministic, fixed-timestep fleet simulation: boids steering,
//! ray-cast combat, planet production and siege, and explicit troop
//! movement between planets. Ships are `bevy_ecs` entities; planets, the
//! spatial index and the clock are resources driven by one chained schedule.

pub mod api;
pub mod clock;
pub mod components;
pub mod config;
pub mod error;
pub mod events;
pub mod opponent;
pub mod planet;
pub mod pool;
pub mod ship;
pub mod shipyard;
pub mod spatial;
pub mod systems;
pub mod troops;
pub mod world;

pub use api::SimWorld;
pub use bevy_ecs::entity::Entity;
pub use components::*;
pub use config::SimConfig;
pub use error::{SimError, SimResult};
pub use events::{CaptureCause, SimEvent};
pub use opponent::{BaselineScorer, Opponent, TargetScorer};
pub use planet::{FleetOwner, Planet, PlanetId, PlanetRegistry, SiegeStatus};
pub use pool::{AgentPool, CommandPool, FleetPool, PoolStats};
pub use ship::{Helm, ShipBundle, Weapon};
pub use spatial::{NeighborLists, SpatialGrid};
pub use troops::{MoveKind, MoveOutcome, MoveRequest, TroopMovementManager};
pub use world::{ShipSnapshot, Snapshot};
