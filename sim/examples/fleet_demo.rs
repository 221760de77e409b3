//! Two-player skirmish between a scripted human and the built-in opponent.
//!
//! Run with: cargo run --example fleet_demo

use glam::Vec2;
use warmask_sim::{Opponent, Player, ShipType, SimEvent, SimWorld};

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== Warmask - Fleet Demo ===\n");

    let mut sim = SimWorld::new();
    let human_home = sim.add_planet(Vec2::new(-20.0, 0.0), 2.0, ShipType::Red, Player::Player1, 20);
    sim.add_planet(Vec2::new(20.0, 0.0), 2.0, ShipType::Blue, Player::Player2, 20);
    let middle = sim.add_planet(Vec2::ZERO, 3.0, ShipType::Gray, Player::None, 15);
    sim.add_planet(Vec2::new(0.0, 18.0), 1.0, ShipType::Red, Player::None, 5);
    sim.add_planet(Vec2::new(0.0, -18.0), 1.0, ShipType::Blue, Player::None, 5);

    let mut opponent = Opponent::new(Player::Player2, Player::Player1, 1.0);

    println!("Initial state:");
    print_planets(&sim);

    // Run 20 seconds at 30 Hz
    for second in 1..=20 {
        for _ in 0..30 {
            let _ = opponent.update(&mut sim);
            sim.step(1.0 / 30.0);
        }

        if second == 5 {
            sim.set_active_mask(Some(ShipType::Red));
            if let Ok(outcome) = sim.move_troops(human_home, middle, 30, Player::Player1) {
                println!("\n--- Human sends {} troops to the middle: {:?} ---", outcome.moved, outcome.kind);
            }
        }

        for event in sim.drain_events() {
            if let SimEvent::PlanetCaptured { planet, from, to, cause } = event {
                println!("  planet {} captured: {:?} -> {:?} ({:?})", planet.0, from, to, cause);
            }
        }

        if second % 5 == 0 {
            println!("\n--- Tick {} (t={:.1}s), {} ships ---", sim.current_tick(), sim.current_time(), sim.ship_count());
            print_planets(&sim);
        }
    }

    println!("\n=== Final State (JSON) ===\n");
    match sim.snapshot().to_json_pretty() {
        Ok(json) => println!("{}", json),
        Err(err) => eprintln!("snapshot failed: {}", err),
    }
}

fn print_planets(sim: &SimWorld) {
    for planet in sim.planets() {
        println!(
            "    Planet {}: owner={:?} stock={} fleet={} [{:?}]",
            planet.id().0,
            planet.owner(),
            planet.stock(),
            planet.fleet_len(),
            planet.status()
        );
    }
}
