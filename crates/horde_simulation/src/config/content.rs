//! ContentLibrary — validated archetypes/encounters из TOML content pack
//!
//! ```toml
//! [settings]
//! seed = 7
//!
//! [[archetypes]]
//! id = "ghoul"
//! max_health = 50.0
//!
//! [[archetypes.abilities]]
//! id = "claw"
//! base_damage = 15.0
//!
//! [[encounters]]
//! id = "ambush"
//! min_count = 3
//! max_count = 3
//! spawn_pool = [{ archetype = "ghoul", weight = 1 }]
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

use super::{Archetype, ConfigError, ContentError, EncounterDef, SimulationSettings};

#[derive(Debug, Deserialize)]
struct ContentFile {
    #[serde(default)]
    settings: Option<SimulationSettings>,
    #[serde(default)]
    archetypes: Vec<Archetype>,
    #[serde(default)]
    encounters: Vec<EncounterDef>,
}

/// Read-only реестр content definitions.
///
/// Archetypes хранятся как `Arc` — все экземпляры агентов разделяют один шаблон.
#[derive(Debug, Clone, Default)]
pub struct ContentLibrary {
    archetypes: HashMap<String, Arc<Archetype>>,
    encounters: HashMap<String, EncounterDef>,
    settings: Option<SimulationSettings>,
}

impl ContentLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Парсит и валидирует весь pack. Первая ошибка прерывает загрузку.
    pub fn from_toml_str(source: &str) -> Result<Self, ContentError> {
        let file: ContentFile = toml::from_str(source)?;

        let mut library = Self::new();
        if let Some(settings) = file.settings {
            settings.validate()?;
            library.settings = Some(settings);
        }
        for archetype in file.archetypes {
            library.insert_archetype(archetype)?;
        }
        for encounter in file.encounters {
            library.insert_encounter(encounter)?;
        }
        Ok(library)
    }

    pub fn insert_archetype(&mut self, archetype: Archetype) -> Result<Arc<Archetype>, ContentError> {
        archetype.validate()?;
        if self.archetypes.contains_key(&archetype.id) {
            return Err(ContentError::Duplicate {
                kind: "archetype",
                id: archetype.id,
            });
        }
        let shared = Arc::new(archetype);
        self.archetypes.insert(shared.id.clone(), shared.clone());
        Ok(shared)
    }

    /// Encounter может ссылаться только на уже загруженные archetypes.
    pub fn insert_encounter(&mut self, encounter: EncounterDef) -> Result<(), ContentError> {
        self.check_encounter(&encounter)?;
        if self.encounters.contains_key(&encounter.id) {
            return Err(ContentError::Duplicate {
                kind: "encounter",
                id: encounter.id,
            });
        }
        self.encounters.insert(encounter.id.clone(), encounter);
        Ok(())
    }

    /// Полная проверка encounter: собственные поля + ссылки на archetypes
    pub fn check_encounter(&self, encounter: &EncounterDef) -> Result<(), ConfigError> {
        encounter.validate()?;
        for entry in &encounter.spawn_pool {
            if !self.archetypes.contains_key(&entry.archetype) {
                return Err(ConfigError::UnknownArchetype {
                    encounter: encounter.id.clone(),
                    archetype: entry.archetype.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn archetype(&self, id: &str) -> Option<Arc<Archetype>> {
        self.archetypes.get(id).cloned()
    }

    pub fn encounter(&self, id: &str) -> Option<&EncounterDef> {
        self.encounters.get(id)
    }

    pub fn settings(&self) -> Option<&SimulationSettings> {
        self.settings.as_ref()
    }

    pub fn archetype_ids(&self) -> impl Iterator<Item = &str> {
        self.archetypes.keys().map(String::as_str)
    }
}
