//! Entity hierarchy resolution
//!
//! Walks an entity's ancestor chain toward the root and records the nearest
//! structural anchors. The walk is iterative and bounded by
//! `MAX_HIERARCHY_DEPTH`, one lookup per level.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::constants::{is_structural, MAX_HIERARCHY_DEPTH};
use crate::error::{not_found, AnchorAuthError, Result};
use crate::model::Entity;

/// Nearest structural anchors of an entity (inclusive of the entity itself).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityHierarchy {
    /// Nearest `level1` entity
    pub level1_id: Option<String>,
    /// Nearest `level1` or `level2` entity
    pub level2_id: Option<String>,
}

/// Source of entity records for the resolver.
pub trait EntityLookup {
    /// Fetch an entity; fails with NotFound when absent.
    fn lookup(&self, id: &str) -> Result<Entity>;
}

impl<L: EntityLookup + ?Sized> EntityLookup for &L {
    fn lookup(&self, id: &str) -> Result<Entity> {
        (**self).lookup(id)
    }
}

impl EntityLookup for HashMap<String, Entity> {
    fn lookup(&self, id: &str) -> Result<Entity> {
        self.get(id).cloned().ok_or_else(|| not_found(format!("entity '{}' does not exist", id)))
    }
}

impl EntityLookup for BTreeMap<String, Entity> {
    fn lookup(&self, id: &str) -> Result<Entity> {
        self.get(id).cloned().ok_or_else(|| not_found(format!("entity '{}' does not exist", id)))
    }
}

/// Resolve the hierarchy of the entity with `id`
pub fn resolve_hierarchy<L: EntityLookup + ?Sized>(lookup: &L, id: &str) -> Result<EntityHierarchy> {
    let entity = lookup.lookup(id)?;
    hierarchy_of(lookup, &entity)
}

/// Resolve the hierarchy of an already fetched entity; only its ancestors are looked up
pub fn hierarchy_of<L: EntityLookup + ?Sized>(lookup: &L, entity: &Entity) -> Result<EntityHierarchy> {
    let mut hierarchy = EntityHierarchy::default();
    let mut current = entity.clone();
    for _ in 0..MAX_HIERARCHY_DEPTH {
        if hierarchy.level1_id.is_none() && current.is_level1() {
            hierarchy.level1_id = Some(current.id.clone());
        }
        if hierarchy.level2_id.is_none() && is_structural(&current.content_model_id) {
            hierarchy.level2_id = Some(current.id.clone());
        }
        // Both anchors found: nothing further up can be nearer.
        let complete = hierarchy.level1_id.is_some() && hierarchy.level2_id.is_some();
        let parent = match current.parent_id.as_deref() {
            Some(p) if !p.is_empty() && !complete => p.to_string(),
            _ => {
                tracing::debug!(entity = %entity.id, ?hierarchy, "resolved hierarchy");
                return Ok(hierarchy);
            }
        };
        current = lookup.lookup(&parent)?;
    }
    Err(AnchorAuthError::Storage(format!(
        "ancestor chain of '{}' exceeds {} levels",
        entity.id, MAX_HIERARCHY_DEPTH
    )))
}
