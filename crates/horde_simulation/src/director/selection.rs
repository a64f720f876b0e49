//! Weighted выбор записи spawn pool

use std::collections::HashMap;

use rand::Rng;

use crate::config::SpawnEntry;

/// Запись ещё может спавниться (weight > 0, лимит по типу не исчерпан)
fn is_eligible(entry: &SpawnEntry, counts: &HashMap<String, u32>) -> bool {
    if entry.weight == 0 {
        return false;
    }
    match entry.max_count {
        Some(cap) => counts.get(&entry.archetype).copied().unwrap_or(0) < cap,
        None => true,
    }
}

/// Выбрать запись пропорционально weight среди eligible.
///
/// `counts` — сколько экземпляров каждого archetype уже выдано в этом encounter.
/// None — все записи исчерпаны.
pub fn pick_entry<'a, R: Rng + ?Sized>(
    pool: &'a [SpawnEntry],
    counts: &HashMap<String, u32>,
    rng: &mut R,
) -> Option<&'a SpawnEntry> {
    let total: u32 = pool
        .iter()
        .filter(|entry| is_eligible(entry, counts))
        .map(|entry| entry.weight)
        .sum();
    if total == 0 {
        return None;
    }

    let mut roll = rng.gen_range(0..total);
    for entry in pool.iter().filter(|entry| is_eligible(entry, counts)) {
        if roll < entry.weight {
            return Some(entry);
        }
        roll -= entry.weight;
    }
    None
}
