//! Capped ship pool over ECS entities.
//!
//! Ships are plain entities. A despawned ship's index goes to the next spawn
//! with its generation bumped, so an [`Entity`] captured before the reuse no
//! longer resolves. [`FleetPool`] caps how many ships are alive at once and
//! keeps the spawn and release counters.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Capability: spawn ships against the pool cap and despawn them again.
pub trait AgentPool {
    fn acquire<B: Bundle>(&mut self, ship: B) -> Option<Entity>;
    /// Despawn a live ship. A stale entity is a logged no-op.
    fn release(&mut self, ship: Entity) -> bool;
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    pub total_spawned: u64,
    pub total_released: u64,
    pub failed_releases: u64,
    pub exhausted_count: u64,
    pub max_active: usize,
}

#[derive(Resource, Debug)]
pub struct FleetPool {
    capacity: usize,
    active: usize,
    stats: PoolStats,
}

impl FleetPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            active: 0,
            stats: PoolStats::default(),
        }
    }

    /// Claim room for one more ship.
    fn reserve(&mut self) -> bool {
        if self.active >= self.capacity {
            self.stats.exhausted_count += 1;
            return false;
        }
        self.active += 1;
        self.stats.total_spawned += 1;
        self.stats.max_active = self.stats.max_active.max(self.active);
        true
    }

    fn released(&mut self) {
        self.active = self.active.saturating_sub(1);
        self.stats.total_released += 1;
    }

    fn release_failed(&mut self, ship: Entity) {
        self.stats.failed_releases += 1;
        warn!(?ship, "release of stale ship ignored");
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }
}

/// Spawns and despawns immediately. The world must hold a [`FleetPool`].
impl AgentPool for World {
    fn acquire<B: Bundle>(&mut self, ship: B) -> Option<Entity> {
        if !self.resource_mut::<FleetPool>().reserve() {
            return None;
        }
        Some(self.spawn(ship).id())
    }

    fn release(&mut self, ship: Entity) -> bool {
        if self.entities().contains(ship) && self.despawn(ship) {
            self.resource_mut::<FleetPool>().released();
            true
        } else {
            self.resource_mut::<FleetPool>().release_failed(ship);
            false
        }
    }
}

/// Pool access from inside a system. Spawns and despawns are deferred to the
/// next command flush; the counters update right away.
pub struct CommandPool<'p, 'w, 's> {
    commands: &'p mut Commands<'w, 's>,
    pool: &'p mut FleetPool,
}

impl<'p, 'w, 's> CommandPool<'p, 'w, 's> {
    pub fn new(commands: &'p mut Commands<'w, 's>, pool: &'p mut FleetPool) -> Self {
        Self { commands, pool }
    }
}

impl AgentPool for CommandPool<'_, '_, '_> {
    fn acquire<B: Bundle>(&mut self, ship: B) -> Option<Entity> {
        if !self.pool.reserve() {
            return None;
        }
        Some(self.commands.spawn(ship).id())
    }

    fn release(&mut self, ship: Entity) -> bool {
        match self.commands.get_entity(ship) {
            Some(mut entity) => {
                entity.despawn();
                self.pool.released();
                true
            }
            None => {
                self.pool.release_failed(ship);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Player, Position, ShipType};
    use crate::config::ShipConfig;
    use crate::ship::ShipBundle;
    use bevy_ecs::system::RunSystemOnce;
    use glam::Vec2;

    fn ship(x: f32) -> ShipBundle {
        ShipBundle::new(
            Player::Player1,
            ShipType::Red,
            Vec2::new(x, 0.0),
            Vec2::X,
            &ShipConfig::default(),
            0.0,
        )
    }

    fn world(capacity: usize) -> World {
        let mut world = World::new();
        world.insert_resource(FleetPool::new(capacity));
        world
    }

    #[test]
    fn test_respawn_invalidates_old_entity() {
        let mut world = world(4);
        let first = world.acquire(ship(1.0)).unwrap();
        assert!(world.release(first));

        let second = world.acquire(ship(2.0)).unwrap();
        assert_eq!(second.index(), first.index());
        assert_ne!(second, first);

        assert!(world.get::<Position>(first).is_none());
        assert_eq!(world.get::<Position>(second).unwrap().0.x, 2.0);
    }

    #[test]
    fn test_double_release_is_noop() {
        let mut world = world(4);
        let ship = world.acquire(ship(0.0)).unwrap();
        assert!(world.release(ship));
        assert!(!world.release(ship));

        let pool = world.resource::<FleetPool>();
        assert_eq!(pool.stats().total_released, 1);
        assert_eq!(pool.stats().failed_releases, 1);
        assert_eq!(pool.active(), 0);
    }

    #[test]
    fn test_capacity_exhaustion() {
        let mut world = world(2);
        assert!(world.acquire(ship(0.0)).is_some());
        assert!(world.acquire(ship(1.0)).is_some());
        assert!(world.acquire(ship(2.0)).is_none());

        let pool = world.resource::<FleetPool>();
        assert_eq!(pool.stats().exhausted_count, 1);
        assert_eq!(pool.stats().max_active, 2);
    }

    #[test]
    fn test_command_pool_defers_despawn() {
        let mut world = world(4);
        let doomed = world.acquire(ship(0.0)).unwrap();

        let released = world
            .run_system_once(move |mut commands: Commands, mut pool: ResMut<FleetPool>| {
                CommandPool::new(&mut commands, &mut pool).release(doomed)
            })
            .unwrap();

        assert!(released);
        assert!(world.get::<Position>(doomed).is_none());
        assert_eq!(world.resource::<FleetPool>().active(), 0);
    }
}
