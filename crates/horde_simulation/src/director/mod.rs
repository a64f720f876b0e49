//! Encounter director: спавн волны вокруг anchor, учёт живых, завершение
//!
//! - selection: weighted выбор archetype из spawn pool (с лимитами по типу)
//! - placement: точка спавна в кольце [min, max] вокруг anchor
//! - encounter: EncounterDirector (start / due_spawns / track / end)
//!
//! Director не создаёт агентов сам: он выдаёт SpawnOrder, а Simulation
//! спавнит AgentController и сообщает id обратно через `track`.

pub mod encounter;
pub mod placement;
pub mod selection;


pub use encounter::*;
pub use placement::{find_spawn_point, Anchor, PlacementRules};
pub use selection::pick_entry;
