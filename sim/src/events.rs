//! Outbound notifications for the presentation layer.
//!
//! Systems and commands push into [`SimEvents`]; the host drains the list
//! once per frame with `SimWorld::drain_events`.

use bevy_ecs::entity::Entity;
use crate::components::Player;
use crate::planet::PlanetId;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureCause {
    /// Troop movement overwhelmed the garrison.
    Assault,
    /// Stock decayed to zero under siege.
    Siege,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    PlanetCaptured {
        planet: PlanetId,
        from: Player,
        to: Player,
        cause: CaptureCause,
    },
    ShipSpawned {
        ship: Entity,
        planet: PlanetId,
    },
    ShipDestroyed {
        ship: Entity,
        player: Player,
    },
    TroopsMoved {
        from: PlanetId,
        to: PlanetId,
        troops: u32,
        player: Player,
    },
}

#[derive(Resource, Debug, Default)]
pub struct SimEvents {
    events: Vec<SimEvent>,
}

impl SimEvents {
    pub fn push(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
