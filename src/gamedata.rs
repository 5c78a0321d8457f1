//! The static game-data corpus: materials, crafting edges, official drop
//! sources and stages.
//!
//! The corpus is loaded once from a single JSON document and shared read-only
//! through an `Arc`. Every map is an [`IndexMap`] so iteration follows the key
//! order of the source document; the vocabulary and the official source lists
//! both rely on that order.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::SenseiError;

/// A craftable or droppable item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Material {
    /// Stable key used by every other table.
    pub material_id: String,
    /// Display name, also the fuzzy-match target.
    pub material_name: String,
    #[serde(default)]
    pub material_rarity: u8,
    #[serde(default)]
    pub material_icon: String,
    #[serde(default)]
    pub material_desc: String,
    #[serde(default)]
    pub usage: String,
    #[serde(default)]
    pub obtain_approach: String,
    /// Display attributes the core does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One input of a workshop formula: `use_number` units of `use_material_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CraftingEdge {
    pub use_material_id: String,
    pub use_number: u32,
    #[serde(default)]
    pub made_type: String,
}

/// Officially listed drop probability of a material on one stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceRate {
    pub source_rate: String,
}

/// A level that costs action points and drops materials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub stage_id: String,
    pub code: String,
    pub name: String,
    pub ap_cost: u32,
    #[serde(default)]
    pub stage_type: String,
}

/// The full corpus as read from disk.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct GameData {
    /// material id → material
    #[serde(default)]
    pub materials: IndexMap<String, Material>,
    /// display name → material id
    #[serde(default)]
    pub materials_map: IndexMap<String, String>,
    /// produced material id → formula inputs
    #[serde(default)]
    pub materials_made: IndexMap<String, Vec<CraftingEdge>>,
    /// material id → stage id → official rate
    #[serde(default)]
    pub materials_source: IndexMap<String, IndexMap<String, SourceRate>>,
    /// stage id → stage
    #[serde(default)]
    pub stages: IndexMap<String, Stage>,
}

impl GameData {
    /// Load the corpus from a JSON file.
    pub fn load(path: &Path) -> Result<Self, SenseiError> {
        let raw = std::fs::read_to_string(path)?;
        let data = Self::from_json(&raw)?;
        tracing::info!(
            path = %path.display(),
            materials = data.materials.len(),
            stages = data.stages.len(),
            "game data loaded"
        );
        Ok(data)
    }

    /// Parse the corpus from a JSON string.
    ///
    /// Missing top-level tables default to empty. `materials_map` entries that
    /// point at an unknown material are dropped so the vocabulary never offers
    /// a name that cannot be looked up.
    pub fn from_json(raw: &str) -> Result<Self, SenseiError> {
        let mut data: Self = serde_json::from_str(raw)?;
        let materials = &data.materials;
        data.materials_map.retain(|name, id| {
            let known = materials.contains_key(id);
            if !known {
                tracing::warn!(%name, %id, "name maps to unknown material, skipping");
            }
            known
        });
        Ok(data)
    }

    pub fn material(&self, material_id: &str) -> Option<&Material> {
        self.materials.get(material_id)
    }

    /// Resolve a display name to its material id.
    pub fn material_id(&self, name: &str) -> Option<&str> {
        self.materials_map.get(name).map(String::as_str)
    }

    /// Formula inputs of `material_id`; empty for raw materials.
    pub fn made_from(&self, material_id: &str) -> &[CraftingEdge] {
        self.materials_made
            .get(material_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn sources(&self, material_id: &str) -> Option<&IndexMap<String, SourceRate>> {
        self.materials_source.get(material_id)
    }

    pub fn stage(&self, stage_id: &str) -> Option<&Stage> {
        self.stages.get(stage_id)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Small hand-written corpus shared by unit tests.

    use super::*;

    pub(crate) fn material(id: &str, name: &str) -> Material {
        Material {
            material_id: id.to_string(),
            material_name: name.to_string(),
            material_rarity: 1,
            material_icon: id.to_string(),
            material_desc: String::new(),
            usage: String::new(),
            obtain_approach: String::new(),
            extra: serde_json::Map::new(),
        }
    }

    pub(crate) fn stage(id: &str, code: &str, name: &str, ap_cost: u32) -> Stage {
        Stage {
            stage_id: id.to_string(),
            code: code.to_string(),
            name: name.to_string(),
            ap_cost,
            stage_type: "MAIN".to_string(),
        }
    }

    pub(crate) fn edge(id: &str, count: u32) -> CraftingEdge {
        CraftingEdge {
            use_material_id: id.to_string(),
            use_number: count,
            made_type: "manufacturing".to_string(),
        }
    }

    pub(crate) fn with_materials(pairs: &[(&str, &str)]) -> GameData {
        let mut data = GameData::default();
        for (id, name) in pairs {
            data.materials.insert(id.to_string(), material(id, name));
            data.materials_map.insert(name.to_string(), id.to_string());
        }
        data
    }
}
