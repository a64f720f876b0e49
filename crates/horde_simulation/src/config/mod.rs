//! Content и runtime конфигурация
//!
//! Организация:
//! - ability: Ability, DamageKind, AbilityDelivery
//! - archetype: Archetype и его параметры (perception, patrol, flee, boss phases)
//! - encounter: EncounterDef, SpawnEntry, GroupSettings
//! - settings: SimulationSettings, BehaviorTimings
//! - content: ContentLibrary (TOML content pack → validated definitions)
//!
//! Всё здесь immutable после загрузки. Authoring ошибки всплывают как
//! `ConfigError` на загрузке/спавне, никогда не превращаются в молчаливый no-op.

use thiserror::Error;

pub mod ability;
pub mod archetype;
pub mod content;
pub mod encounter;
pub mod settings;


pub use ability::*;
pub use archetype::*;
pub use content::*;
pub use encounter::*;
pub use settings::*;

/// Authoring mistakes в content definitions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("archetype '{archetype}' has no primary ability")]
    MissingPrimaryAbility { archetype: String },

    #[error("ability '{ability}' of archetype '{archetype}' is invalid: {reason}")]
    InvalidAbility {
        archetype: String,
        ability: String,
        reason: String,
    },

    #[error("archetype '{archetype}' is invalid: {reason}")]
    InvalidArchetype { archetype: String, reason: String },

    #[error("boss phase {phase} of archetype '{archetype}' is invalid: {reason}")]
    InvalidBossPhase {
        archetype: String,
        phase: usize,
        reason: String,
    },

    #[error("encounter '{encounter}' has an empty spawn pool")]
    EmptySpawnPool { encounter: String },

    #[error("encounter '{encounter}' references unknown archetype '{archetype}'")]
    UnknownArchetype { encounter: String, archetype: String },

    #[error("encounter '{encounter}' has invalid count range {min}..={max}")]
    InvalidCountRange { encounter: String, min: u32, max: u32 },

    #[error("encounter '{encounter}' has invalid distance band {min}..{max}")]
    InvalidDistanceBand { encounter: String, min: f32, max: f32 },

    #[error("encounter '{encounter}' is invalid: {reason}")]
    InvalidEncounter { encounter: String, reason: String },

    #[error("invalid simulation settings: {0}")]
    InvalidSettings(String),
}

/// Ошибки загрузки content pack
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("failed to parse content pack: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Invalid(#[from] ConfigError),

    #[error("duplicate {kind} id '{id}'")]
    Duplicate { kind: &'static str, id: String },
}
