//! Read operations (no permission checks, direct LMDB access)

use crate::db::{get_json, index_members, list_json, read};
use crate::error::{not_found, Result};
use crate::hierarchy::{resolve_hierarchy, EntityHierarchy, EntityLookup};
use crate::keys::anchor_prefix;
use crate::model::{Entity, User};

/// Get a user record by name
pub fn get_user(name: &str) -> Result<Option<User>> {
    read(|d, tx| get_json(&d.users, tx, name))
}

/// Get an entity record by id
pub fn get_entity(id: &str) -> Result<Option<Entity>> {
    read(|d, tx| get_json(&d.entities, tx, id))
}

/// All users, ordered by name
pub fn list_users() -> Result<Vec<User>> {
    read(|d, tx| list_json(&d.users, tx))
}

/// All entities, ordered by id
pub fn list_entities() -> Result<Vec<Entity>> {
    read(|d, tx| list_json(&d.entities, tx))
}

/// Names of users holding any right keyed by `anchor_id`
pub fn users_with_anchor(anchor_id: &str) -> Result<Vec<String>> {
    read(|d, tx| index_members(&d.anchors, tx, &anchor_prefix(anchor_id)))
}

/// Resolve the hierarchy of a stored entity
pub fn get_hierarchy(id: &str) -> Result<EntityHierarchy> {
    resolve_hierarchy(&StoredEntities, id)
}

/// `EntityLookup` over the committed entity table; each lookup is its own read.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoredEntities;

impl EntityLookup for StoredEntities {
    fn lookup(&self, id: &str) -> Result<Entity> {
        get_entity(id)?.ok_or_else(|| not_found(format!("entity '{}' does not exist", id)))
    }
}

