//! Computer opponent.
//!
//! The opponent is a client of the public API like any other: it reads
//! planets through [`SimWorld`] and acts only through
//! [`SimWorld::move_troops`]. Target choice is delegated to a
//! [`TargetScorer`] so policies can be swapped without touching the core.

use crate::api::SimWorld;
use crate::components::Player;
use crate::error::SimResult;
use crate::planet::Planet;
use crate::troops::{MoveOutcome, MoveRequest};
use tracing::debug;

/// Troops an opponent always leaves behind on a planet.
pub const GARRISON_RESERVE: u32 = 1;

/// Scores an attack from `source` (with `available` spare troops) on `target`.
/// `None` means the target is not worth attacking.
pub trait TargetScorer {
    fn score(&self, source: &Planet, available: u32, target: &Planet, rival: Player) -> Option<f32>;
}

/// Prefers big, weakly defended, nearby planets, with a bonus for hitting
/// the rival instead of neutral ground. Only targets the attack can take.
#[derive(Debug, Default, Clone, Copy)]
pub struct BaselineScorer;

impl TargetScorer for BaselineScorer {
    fn score(&self, source: &Planet, available: u32, target: &Planet, rival: Player) -> Option<f32> {
        let defenders = target.stock();
        if defenders >= available {
            return None;
        }
        let rival_bonus = if target.owner() == rival { 5.0 } else { 0.0 };
        let distance = source.position.distance(target.position);
        Some((available - defenders) as f32 * 2.0 + target.size() * 10.0 - distance + rival_bonus)
    }
}

pub struct Opponent<S: TargetScorer = BaselineScorer> {
    pub player: Player,
    pub rival: Player,
    pub decision_interval: f32,
    next_decision: f32,
    scorer: S,
}

impl Opponent<BaselineScorer> {
    pub fn new(player: Player, rival: Player, decision_interval: f32) -> Self {
        Self::with_scorer(player, rival, decision_interval, BaselineScorer)
    }
}

impl<S: TargetScorer> Opponent<S> {
    pub fn with_scorer(player: Player, rival: Player, decision_interval: f32, scorer: S) -> Self {
        Self {
            player,
            rival,
            decision_interval,
            next_decision: 0.0,
            scorer,
        }
    }

    /// Pick the planet with the most spare troops and the best-scoring
    /// target for it.
    pub fn plan(&self, sim: &SimWorld) -> Option<MoveRequest> {
        let mut source: Option<(&Planet, u32)> = None;
        for planet in sim.planets().filter(|p| p.owner() == self.player) {
            let available = planet.stock().saturating_sub(GARRISON_RESERVE);
            if available > 0 && source.map_or(true, |(_, best)| available > best) {
                source = Some((planet, available));
            }
        }
        let (source, available) = source?;

        let mut best: Option<(&Planet, f32)> = None;
        for target in sim.planets().filter(|p| p.owner() != self.player) {
            let Some(score) = self.scorer.score(source, available, target, self.rival) else {
                continue;
            };
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((target, score));
            }
        }

        best.map(|(target, _)| MoveRequest {
            from: source.id(),
            to: target.id(),
            troops: available as i32,
            player: self.player,
        })
    }

    /// Act if a decision is due. Returns the result of the move issued, if any.
    pub fn update(&mut self, sim: &mut SimWorld) -> Option<SimResult<MoveOutcome>> {
        let now = sim.current_time();
        if now < self.next_decision {
            return None;
        }
        self.next_decision = now + self.decision_interval;

        let Some(request) = self.plan(sim) else {
            debug!(player = ?self.player, "opponent found no target");
            return None;
        };
        debug!(player = ?self.player, from = request.from.0, to = request.to.0, troops = request.troops, "opponent attacks");
        Some(sim.move_troops(request.from, request.to, request.troops, request.player))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ShipType;
    use glam::Vec2;

    #[test]
    fn test_plan_picks_takeable_rival_planet() {
        let mut sim = SimWorld::new();
        let home = sim.add_planet(Vec2::ZERO, 1.0, ShipType::Red, Player::Player2, 12);
        sim.add_planet(Vec2::new(5.0, 0.0), 1.0, ShipType::Red, Player::Player2, 4);
        let strong = sim.add_planet(Vec2::new(3.0, 0.0), 3.0, ShipType::Red, Player::Player1, 30);
        let weak_rival = sim.add_planet(Vec2::new(10.0, 0.0), 1.0, ShipType::Red, Player::Player1, 4);
        let neutral = sim.add_planet(Vec2::new(10.0, 0.0), 1.0, ShipType::Red, Player::None, 4);

        let opponent = Opponent::new(Player::Player2, Player::Player1, 1.0);
        let request = opponent.plan(&sim).unwrap();
        assert_eq!(request.from, home);
        assert_eq!(request.troops, 11);
        assert_ne!(request.to, strong);
        assert_ne!(request.to, neutral);
        assert_eq!(request.to, weak_rival);
    }

    #[test]
    fn test_update_respects_interval() {
        let mut sim = SimWorld::new();
        sim.add_planet(Vec2::ZERO, 1.0, ShipType::Red, Player::Player2, 12);
        let target = sim.add_planet(Vec2::new(10.0, 0.0), 1.0, ShipType::Gray, Player::None, 2);

        let mut opponent = Opponent::new(Player::Player2, Player::Player1, 5.0);
        let outcome = opponent.update(&mut sim).unwrap().unwrap();
        assert_eq!(outcome.moved, 11);
        assert_eq!(sim.planet(target).unwrap().owner(), Player::Player2);
        assert!(opponent.update(&mut sim).is_none());
    }

    #[test]
    fn test_no_spare_troops_no_plan() {
        let mut sim = SimWorld::new();
        sim.add_planet(Vec2::ZERO, 1.0, ShipType::Red, Player::Player2, 1);
        sim.add_planet(Vec2::new(10.0, 0.0), 1.0, ShipType::Red, Player::None, 0);
        assert!(Opponent::new(Player::Player2, Player::Player1, 1.0).plan(&sim).is_none());
    }
}
