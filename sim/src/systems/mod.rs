//! Per-tick systems for the Warmask simulation.
//!
//! ## Tick order
//!
//! All systems are chained and run on a single-threaded executor; the only
//! internal parallelism is the data-parallel map inside the flocking and
//! weapon-gather stages.
//!
//! 1. `spatial_index_system` - rebuild grid and neighbor lists
//! 2. `flocking_system` - boid steering per ship
//! 3. `target_acquisition_system` - throttled enemy selection
//! 4. `movement_system` - capped turn and integration
//! 5. `weapon_system` - forward line fire, damage, kill bonus
//! 6. `death_system` - unregister and despawn dead ships
//! 7. `planet_proximity_system` - orbit tallies
//! 8. `planet_update_system` - production and siege decay
//!
//! Troop movement requests are not systems. They are applied between ticks
//! through `SimWorld`, after the previous tick's deaths have been processed.

pub mod combat;
pub mod flocking;
pub mod lifecycle;
pub mod movement;
pub mod planets;

pub use combat::*;
pub use flocking::*;
pub use lifecycle::*;
pub use movement::*;
pub use planets::*;
