//! Expansion of a material's crafting tree.
//!
//! Workshop formulas form a directed graph that is a forest in well-formed
//! data. The traversal still guards against cycles: an edge that leads back
//! to a material already on the current path is emitted as a leaf and logged,
//! and no path grows past [`MAX_DEPTH`].

use std::collections::HashSet;

use serde::Serialize;

use crate::gamedata::{CraftingEdge, GameData, Material};

/// Deepest crafting chain the resolver will follow.
pub const MAX_DEPTH: usize = 16;

/// One consumed input in a crafting tree.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MaterialNode {
    #[serde(flatten)]
    pub edge: CraftingEdge,
    #[serde(flatten)]
    pub material: Material,
    pub children: Vec<MaterialNode>,
}

/// Crafting inputs of `material_id`, each expanded recursively, in formula
/// order. Raw materials and unknown ids yield an empty list.
pub fn expand(data: &GameData, material_id: &str) -> Vec<MaterialNode> {
    let mut path = HashSet::from([material_id.to_string()]);
    expand_inner(data, material_id, &mut path, 1)
}

fn expand_inner(
    data: &GameData,
    material_id: &str,
    path: &mut HashSet<String>,
    depth: usize,
) -> Vec<MaterialNode> {
    let mut children = Vec::new();

    for edge in data.made_from(material_id) {
        let Some(material) = data.material(&edge.use_material_id) else {
            tracing::warn!(
                material_id,
                consumed = %edge.use_material_id,
                "crafting edge references unknown material, skipping"
            );
            continue;
        };

        let grandchildren = if path.contains(&edge.use_material_id) {
            tracing::warn!(
                material_id,
                consumed = %edge.use_material_id,
                "crafting cycle detected, cutting edge"
            );
            Vec::new()
        } else if depth >= MAX_DEPTH {
            tracing::warn!(material_id, depth, "crafting tree too deep, truncating");
            Vec::new()
        } else {
            path.insert(edge.use_material_id.clone());
            let nested = expand_inner(data, &edge.use_material_id, path, depth + 1);
            path.remove(&edge.use_material_id);
            nested
        };

        children.push(MaterialNode {
            edge: edge.clone(),
            material: material.clone(),
            children: grandchildren,
        });
    }

    children
}
