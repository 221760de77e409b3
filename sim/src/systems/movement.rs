//! Movement system - turns each ship toward its desired direction at a capped
//! rate and integrates position at constant speed.

use crate::clock::{DeltaTime, SimRng, SimTime};
use crate::components::{Health, Position, Target, Velocity};
use crate::config::SimConfig;
use crate::planet::PlanetRegistry;
use crate::ship::{Helm, Weapon};
use crate::shipyard::random_in_disc;
use crate::systems::combat::enemy_target_valid;
use bevy_ecs::prelude::*;
use glam::Vec2;
use rand::Rng;

/// Extra random delay added on top of `jitter_interval`, in seconds.
const JITTER_INTERVAL_SPREAD: f32 = 0.2;

/// Signed angle in radians that rotates `from` onto `to`.
#[inline]
pub fn signed_angle(from: Vec2, to: Vec2) -> f32 {
    from.perp_dot(to).atan2(from.dot(to))
}

/// Rotate `velocity` toward `desired` by at most `max_turn` radians.
pub fn turn_toward(velocity: Vec2, desired: Vec2, max_turn: f32) -> Vec2 {
    let angle = signed_angle(velocity, desired).clamp(-max_turn, max_turn);
    Vec2::from_angle(angle).rotate(velocity)
}

/// World position of a navigation target.
pub fn resolve_target(target: Target, planets: &PlanetRegistry) -> Option<Vec2> {
    match target {
        Target::Planet(id) => planets.get(id).map(|p| p.position),
        Target::Point(p) => Some(p),
    }
}

/// Unit vector toward the pursuit point or base target. Inside the minimum
/// approach distance of the base target the pull becomes a push.
pub fn target_attraction(position: Vec2, min_distance: f32, base: Option<Vec2>, pursuit: Option<Vec2>) -> Vec2 {
    if let Some(point) = pursuit {
        return (point - position).normalize_or_zero();
    }
    let Some(base) = base else {
        return Vec2::ZERO;
    };
    let to_target = base - position;
    let min = min_distance;
    if min > 0.0 && to_target.length_squared() < min * min {
        -to_target.normalize_or_zero()
    } else {
        to_target.normalize_or_zero()
    }
}

struct MovementUpdate {
    entity: Entity,
    velocity: Vec2,
    orbit_jitter: Vec2,
    next_jitter_update: f32,
}

/// System that steers and moves every live ship.
///
/// ## Data Access
/// - Reads: SimConfig, DeltaTime, SimTime, PlanetRegistry, Health, Weapon
/// - Writes: Position, Velocity, Helm (jitter, turn rate), SimRng
pub fn movement_system(
    config: Res<SimConfig>,
    dt: Res<DeltaTime>,
    time: Res<SimTime>,
    planets: Res<PlanetRegistry>,
    mut rng: ResMut<SimRng>,
    mut ships: Query<(Entity, &mut Position, &mut Velocity, &Health, &mut Helm, &Weapon)>,
) {
    let delta = dt.0;
    let now = time.0;
    let tuning = &config.ships;
    let flocking = &config.flocking;
    let detection = config.combat.detection_radius;
    let sqr_max_chase = flocking.max_distance_from_target * flocking.max_distance_from_target;

    let mut updates = Vec::new();
    for (entity, position, velocity, health, helm, weapon) in ships.iter() {
        if !health.is_alive() {
            continue;
        }
        let position = position.0;

        let enemy = weapon.enemy.and_then(|e| {
            let (_, target_position, target_velocity, target_health, ..) = ships.get(e).ok()?;
            enemy_target_valid(Some((target_position, target_health)), position, detection)
                .then_some((target_position.0, target_velocity.0))
        });

        let orbit_break = enemy.is_some() && now - weapon.last_hit_time > tuning.orbit_break_time;
        let mut orbit_jitter = helm.orbit_jitter;
        let mut next_jitter_update = helm.next_jitter_update;
        if orbit_break && now >= next_jitter_update {
            next_jitter_update = now + tuning.jitter_interval + rng.0.gen_range(0.0..JITTER_INTERVAL_SPREAD);
            orbit_jitter = random_in_disc(&mut rng.0, tuning.orbit_break_jitter);
        } else if !orbit_break {
            orbit_jitter = Vec2::ZERO;
        }

        let base = helm.target.and_then(|t| resolve_target(t, &planets));
        let too_far = base.map_or(false, |b| b.distance_squared(position) > sqr_max_chase);
        let pursuit = match enemy {
            Some((target, heading)) if !too_far => {
                Some(target - heading.normalize_or_zero() * flocking.target_behind_distance)
            }
            _ => None,
        };

        let attraction = target_attraction(position, helm.min_target_distance, base, pursuit);
        let desired = helm.steering + attraction * flocking.target_weight + orbit_jitter;

        let mut velocity = velocity.0;
        if desired.length_squared() > 0.001 {
            let multiplier = if orbit_break { tuning.aggressive_turn_multiplier } else { 1.0 };
            let max_turn = (helm.turn_rate * delta * multiplier).to_radians();
            velocity = turn_toward(velocity, desired.normalize(), max_turn);
        }
        velocity = velocity.try_normalize().unwrap_or(Vec2::Y) * tuning.move_speed;

        updates.push(MovementUpdate {
            entity,
            velocity,
            orbit_jitter,
            next_jitter_update,
        });
    }

    for update in updates {
        if let Ok((_, mut position, mut velocity, _, mut helm, _)) = ships.get_mut(update.entity) {
            velocity.0 = update.velocity;
            position.0 += update.velocity * delta;
            helm.orbit_jitter = update.orbit_jitter;
            helm.next_jitter_update = update.next_jitter_update;
            helm.recover_turn_rate(tuning, delta);
        }
    }
}
