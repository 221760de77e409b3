//! Error types for simulation requests.
//!
//! Nothing in the simulation is fatal. Requests that cannot be honoured leave
//! the world untouched and report one of these variants to the caller.

use crate::components::Player;
use crate::planet::PlanetId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("unknown planet {0:?}")]
    UnknownPlanet(PlanetId),
    #[error("troop count must be positive, got {0}")]
    NonPositiveTroops(i32),
    #[error("{player:?} does not own planet {planet:?} (owned by {owner:?})")]
    NotOwner {
        planet: PlanetId,
        owner: Player,
        player: Player,
    },
    #[error("planet {0:?} has no owner to produce ships for")]
    Unowned(PlanetId),
    #[error("fleet of planet {0:?} is at capacity")]
    FleetFull(PlanetId),
    #[error("ship pool exhausted")]
    PoolExhausted,
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type SimResult<T> = Result<T, SimError>;
