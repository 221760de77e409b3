//! Combat - enemy target acquisition and forward weapon fire.
//!
//! ## Target acquisition
//!
//! Throttled per ship by `ai_update_interval`. A cached enemy is kept while it
//! still resolves to a live entity (generation match), is not pending death,
//! and is inside the detection radius. Otherwise the neighbor list is scanned
//! for the opposing ship with the best `dot(forward, dir) - dist / radius`.
//!
//! ## Weapon fire
//!
//! Two phases:
//!
//! 1. **Gather** - every ship casts its forward line against the hull circles
//!    of its neighbors and records the first ship struck. Read-only, runs
//!    across rayon's pool with the `parallel` feature.
//! 2. **Apply** - hits are resolved sequentially in scan order against the
//!    live state, so a ship killed earlier in the tick is no longer a valid
//!    target and cannot be credited twice.

use crate::clock::SimTime;
use crate::components::{Health, Player, Position, Velocity};
use crate::config::{CombatConfig, SimConfig};
use crate::ship::{Helm, Weapon};
use crate::spatial::NeighborLists;
use crate::systems::flocking::AgentView;
use bevy_ecs::prelude::*;
use glam::Vec2;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Whether a cached enemy may still be pursued by a ship at `position`.
/// `target` is `None` when the cached entity no longer resolves.
pub fn enemy_target_valid(target: Option<(&Position, &Health)>, position: Vec2, detection_radius: f32) -> bool {
    match target {
        Some((target_position, health)) => {
            health.is_alive() && target_position.0.distance_squared(position) <= detection_radius * detection_radius
        }
        None => false,
    }
}

/// Best engagement candidate for agent `me` among `neighbors` (dense indices
/// into `agents` and `entities`). The first candidate found wins ties.
pub fn detect_enemy(
    agents: &[AgentView],
    entities: &[Entity],
    neighbors: &[u32],
    me: usize,
    detection_radius: f32,
) -> Option<Entity> {
    let me = agents[me];
    let sqr_detection = detection_radius * detection_radius;
    let forward = me.velocity.normalize_or_zero();
    let mut best: Option<(Entity, f32)> = None;

    for &j in neighbors {
        let other = agents[j as usize];
        if other.player == me.player || !other.alive {
            continue;
        }
        let to_enemy = other.position - me.position;
        let sqr_dist = to_enemy.length_squared();
        if sqr_dist > sqr_detection {
            continue;
        }
        let dist = sqr_dist.sqrt();
        let direction = if dist > 0.0 { to_enemy / dist } else { Vec2::ZERO };
        let score = forward.dot(direction) - dist / detection_radius;
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((entities[j as usize], score));
        }
    }

    best.map(|(e, _)| e)
}

fn agent_views(
    entities: &[Entity],
    view: impl Fn(Entity) -> Option<AgentView>,
) -> Vec<AgentView> {
    entities.iter().map(|&e| view(e).unwrap_or_default()).collect()
}

/// Re-evaluates each ship's enemy at the throttled AI rate.
pub fn target_acquisition_system(
    config: Res<SimConfig>,
    time: Res<SimTime>,
    neighbors: Res<NeighborLists>,
    mut ships: Query<(&Position, &Velocity, &Player, &Health, &mut Weapon)>,
) {
    let now = time.0;
    let detection = config.combat.detection_radius;
    let entities = &neighbors.entities;
    let agents = agent_views(entities, |e| {
        ships.get(e).ok().map(|(p, v, o, h, _)| AgentView::new(p, v, o, h))
    });

    let mut decisions: Vec<(Entity, Option<Entity>)> = Vec::new();
    for (i, &entity) in entities.iter().enumerate() {
        let Ok((position, _, _, health, weapon)) = ships.get(entity) else {
            continue;
        };
        if !health.is_alive() || now < weapon.next_ai_update {
            continue;
        }
        let keep = weapon.enemy.filter(|&e| {
            let target = ships.get(e).ok().map(|(p, _, _, h, _)| (p, h));
            enemy_target_valid(target, position.0, detection)
        });
        let enemy = keep.or_else(|| detect_enemy(&agents, entities, neighbors.neighbors(i), i, detection));
        decisions.push((entity, enemy));
    }

    for (entity, enemy) in decisions {
        if let Ok((.., mut weapon)) = ships.get_mut(entity) {
            weapon.enemy = enemy;
            weapon.next_ai_update = now + config.ships.ai_update_interval;
        }
    }
}

/// Distance along a ray to the first point inside a circle. An origin inside
/// the circle hits at distance zero.
pub fn ray_circle_hit(origin: Vec2, direction: Vec2, length: f32, center: Vec2, radius: f32) -> Option<f32> {
    let m = origin - center;
    let b = m.dot(direction);
    let c = m.length_squared() - radius * radius;
    if c > 0.0 && b > 0.0 {
        return None;
    }
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let t = (-b - discriminant.sqrt()).max(0.0);
    (t <= length).then_some(t)
}

/// Dense index of the first ship struck by `shooter`'s forward weapon line.
/// Ships pending death still block the line.
fn first_hit(
    agents: &[AgentView],
    neighbors: &[u32],
    shooter: &AgentView,
    combat: &CombatConfig,
    hull_radius: f32,
) -> Option<u32> {
    let direction = shooter.velocity.normalize_or_zero();
    if direction == Vec2::ZERO {
        return None;
    }
    let origin = shooter.position + direction * combat.muzzle_offset;
    let length = (combat.weapon_range - combat.muzzle_offset).max(0.0);

    let mut nearest: Option<(u32, f32)> = None;
    for &j in neighbors {
        let other = &agents[j as usize];
        if let Some(t) = ray_circle_hit(origin, direction, length, other.position, hull_radius) {
            if nearest.map_or(true, |(_, best)| t < best) {
                nearest = Some((j, t));
            }
        }
    }
    nearest.map(|(j, _)| j)
}

/// Fires every ready weapon whose line first strikes a live enemy.
pub fn weapon_system(
    config: Res<SimConfig>,
    time: Res<SimTime>,
    neighbors: Res<NeighborLists>,
    mut ships: Query<(&Position, &Velocity, &Player, &mut Health, &mut Weapon, &mut Helm)>,
) {
    let now = time.0;
    let config: &SimConfig = &config;
    let lists: &NeighborLists = &neighbors;
    let entities = &lists.entities;
    let hull_radius = config.ships.hull_radius;
    let agents = agent_views(entities, |e| {
        ships.get(e).ok().map(|(p, v, o, h, ..)| AgentView::new(p, v, o, h))
    });
    let snapshot: &[AgentView] = &agents;

    // GATHER: first ship on each weapon line
    let gather = |i: usize| -> Option<(usize, usize)> {
        let shooter = &snapshot[i];
        if !shooter.alive {
            return None;
        }
        let hit = first_hit(snapshot, lists.neighbors(i), shooter, &config.combat, hull_radius)?;
        Some((i, hit as usize))
    };

    #[cfg(feature = "parallel")]
    let hits: Vec<(usize, usize)> = (0..snapshot.len()).into_par_iter().filter_map(gather).collect();

    #[cfg(not(feature = "parallel"))]
    let hits: Vec<(usize, usize)> = (0..snapshot.len()).filter_map(gather).collect();

    // APPLY: sequential, against live state
    for (i, j) in hits {
        let (shooter, target) = (entities[i], entities[j]);
        let Ok((_, _, &owner, health, weapon, _)) = ships.get(shooter) else {
            continue;
        };
        if !health.is_alive() || !weapon.ready(now, config.combat.fire_cooldown) {
            continue;
        }

        let Ok((_, _, &player, mut health, ..)) = ships.get_mut(target) else {
            continue;
        };
        if player == owner || !health.is_alive() {
            continue;
        }
        let killed = health.damage(config.combat.weapon_damage);

        if let Ok((.., mut weapon, mut helm)) = ships.get_mut(shooter) {
            weapon.last_fire_time = Some(now);
            weapon.last_hit_time = now;
            if killed {
                helm.register_kill(&config.ships);
            }
        }
    }
}
