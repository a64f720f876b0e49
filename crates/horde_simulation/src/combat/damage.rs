//! Damage events и расчёт финального урона
//!
//! Executor никогда не трогает health цели: урон уходит через
//! `DamageReceiver::take_damage`, результат публикуется как `DamageDealt`.

use bevy::prelude::*;

use crate::components::ActorId;
use crate::config::DamageKind;
use crate::environment::DamageReceiver;

/// Событие: урон нанесён (или отклонён receiver'ом)
///
/// Используется для UI, звуков, эффектов и тестов.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct DamageDealt {
    pub attacker: ActorId,
    pub target: ActorId,
    pub amount: f32,
    pub kind: DamageKind,
    pub ability: String,
    /// false — receiver отказал (цель мертва / не существует)
    pub acknowledged: bool,
}

/// Событие: агент умер
#[derive(Event, Debug, Clone, PartialEq)]
pub struct EntityDied {
    pub entity: ActorId,
    pub killer: Option<ActorId>,
}

/// final damage = base × phase multiplier
///
/// Считается в executor прямо перед вызовом receiver'а.
pub fn calculate_damage(base_damage: f32, damage_multiplier: f32) -> f32 {
    (base_damage * damage_multiplier).max(0.0)
}

/// Один вызов receiver'а → DamageDealt
pub fn deliver_damage<R>(
    receiver: &mut R,
    attacker: ActorId,
    target: ActorId,
    amount: f32,
    kind: DamageKind,
    ability: &str,
) -> DamageDealt
where
    R: DamageReceiver + ?Sized,
{
    let acknowledged = receiver.take_damage(target, amount, kind, attacker);
    crate::logger::log(&format!(
        "⚔️ {} hits {} with '{}' for {:.1} ({:?}){}",
        attacker,
        target,
        ability,
        amount,
        kind,
        if acknowledged { "" } else { " [rejected]" }
    ));

    DamageDealt {
        attacker,
        target,
        amount,
        kind,
        ability: ability.to_string(),
        acknowledged,
    }
}
