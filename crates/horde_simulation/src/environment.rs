//! External capabilities consumed by the simulation core.
//!
//! Симуляция не владеет физикой, навмешем и рендером. Всё это приходит снаружи
//! через trait'ы ниже (game bridge, headless sandbox, тестовые stubs).
//!
//! ```text
//! Navigation        — path-to / reachability / walkable sampling
//! LineOfSight       — occlusion test против blocking surfaces
//! PerceivableSource — кого вообще можно заметить рядом с точкой
//! HitQuery          — overlap sphere + raycast для hit resolution
//! DamageReceiver    — take_damage (здоровье цели мы не трогаем)
//! PresentationSink  — fire-and-forget cues (анимации, звук, VFX)
//! ```

use bevy::prelude::*;

use crate::ai::AgentState;
use crate::components::ActorId;
use crate::config::DamageKind;

pub trait Navigation {
    /// Следующая steering точка на пути `from → to`. None — путь не найден.
    fn request_path(&mut self, from: Vec3, to: Vec3) -> Option<Vec3>;

    fn is_reachable(&self, from: Vec3, to: Vec3) -> bool;

    /// Ближайшая walkable точка рядом с `near`. None — рядом нет навмеша.
    fn sample_walkable(&self, near: Vec3) -> Option<Vec3>;
}

pub trait LineOfSight {
    /// true если blocking surface пересекает отрезок `from → to`.
    fn is_blocked(&self, from: Vec3, to: Vec3) -> bool;
}

/// Snapshot одной perceivable сущности.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perceivable {
    pub id: ActorId,
    pub position: Vec3,
    /// false — невидим для AI (stealth, cutscene)
    pub perceivable: bool,
    /// 0.0 — бесшумно, 1.0 — sprint / стрельба
    pub noise_level: f32,
    pub priority: f32,
}

pub trait PerceivableSource {
    fn perceivables_near(&self, center: Vec3, radius: f32) -> Vec<Perceivable>;
}

/// Результат raycast. `target == None` — попали в геометрию.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub target: Option<ActorId>,
    pub point: Vec3,
    pub distance: f32,
}

pub trait HitQuery {
    fn overlap_sphere(&self, center: Vec3, radius: f32) -> Vec<ActorId>;

    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit>;
}

pub trait DamageReceiver {
    /// Returns true если урон принят (цель существует и жива).
    fn take_damage(&mut self, target: ActorId, amount: f32, kind: DamageKind, source: ActorId) -> bool;
}

/// Health/vitality provider.
pub trait Vitality {
    fn current(&self) -> f32;
    fn max(&self) -> f32;
    fn is_alive(&self) -> bool;
    fn is_invulnerable(&self) -> bool;
    fn set_invulnerable(&mut self, invulnerable: bool);

    fn fraction(&self) -> f32 {
        if self.max() <= 0.0 {
            return 0.0;
        }
        (self.current() / self.max()).clamp(0.0, 1.0)
    }
}

/// Presentation hooks (анимации/звук/VFX). Completion нас не интересует.
#[derive(Debug, Clone, PartialEq)]
pub enum PresentationCue {
    StateEntered { agent: ActorId, state: AgentState },
    AbilityWindup { agent: ActorId, ability: String },
    AbilityExecuted { agent: ActorId, ability: String },
    ProjectileLaunched { agent: ActorId, ability: String, origin: Vec3 },
    Staggered { agent: ActorId },
    PhaseAnnounced { agent: ActorId, phase: usize, name: String },
    Died { agent: ActorId },
}

pub trait PresentationSink {
    fn cue(&mut self, _cue: PresentationCue) {}
}

/// Всё, что нужно симуляции от внешнего мира.
pub trait Environment:
    Navigation + LineOfSight + PerceivableSource + HitQuery + DamageReceiver + PresentationSink + Send + Sync + 'static
{
}

impl<T> Environment for T where
    T: Navigation
        + LineOfSight
        + PerceivableSource
        + HitQuery
        + DamageReceiver
        + PresentationSink
        + Send
        + Sync
        + 'static
{
}
