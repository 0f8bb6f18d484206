//! Users, entities and decision targets

use serde::{Deserialize, Serialize};

use crate::constants::{LEVEL1_CONTENT_MODEL, LEVEL2_CONTENT_MODEL};
use crate::rights::{EntityState, RoleName};
use crate::role::Role;

/// The slice of a repository entity the engine reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub content_model_id: String,
    #[serde(default)]
    pub state: Option<EntityState>,
}

impl Entity {
    pub fn new(id: impl Into<String>, parent_id: Option<&str>, content_model_id: impl Into<String>) -> Self {
        Entity {
            id: id.into(),
            parent_id: parent_id.map(str::to_string),
            content_model_id: content_model_id.into(),
            state: None,
        }
    }

    pub fn with_state(mut self, state: EntityState) -> Self {
        self.state = Some(state);
        self
    }

    #[inline]
    pub fn is_level1(&self) -> bool {
        self.content_model_id == LEVEL1_CONTENT_MODEL
    }

    #[inline]
    pub fn is_level2(&self) -> bool {
        self.content_model_id == LEVEL2_CONTENT_MODEL
    }
}

/// A user account and the roles it holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        User { name: name.into(), roles: Vec::new() }
    }

    pub fn role(&self, name: RoleName) -> Option<&Role> {
        self.roles.iter().find(|r| r.role_name() == name)
    }

    pub fn role_mut(&mut self, name: RoleName) -> Option<&mut Role> {
        self.roles.iter_mut().find(|r| r.role_name() == name)
    }

    pub fn has_role(&self, name: RoleName) -> bool {
        self.role(name).is_some()
    }

    /// Attach a role, replacing any role of the same name in place
    pub fn set_role(&mut self, role: Role) {
        match self.role_mut(role.role_name()) {
            Some(existing) => *existing = role,
            None => self.roles.push(role),
        }
    }

    pub fn remove_role(&mut self, name: RoleName) -> Option<Role> {
        let idx = self.roles.iter().position(|r| r.role_name() == name)?;
        Some(self.roles.remove(idx))
    }

    /// Every anchor id referenced by any of this user's roles
    pub fn anchor_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.roles.iter().flat_map(|r| r.anchor_ids()).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Drop every right keyed by `anchor_id`; roles left without rights are detached.
    /// Returns true if anything changed.
    pub fn purge_anchor(&mut self, anchor_id: &str) -> bool {
        let mut changed = false;
        self.roles.retain_mut(|role| {
            if !role.remove_right(anchor_id) {
                return true;
            }
            changed = true;
            role.rights().is_some_and(|r| !r.is_empty())
        });
        changed
    }
}

/// The externally resolved object an operation acts on.
///
/// Binaries are checked through the entity that owns them, with
/// `ObjectType::Binary` on the requirement.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Entity(&'a Entity),
    User(&'a User),
    None,
}

impl<'a> Target<'a> {
    pub fn entity(&self) -> Option<&'a Entity> {
        match self {
            Target::Entity(e) => Some(e),
            _ => None,
        }
    }

    pub fn user(&self) -> Option<&'a User> {
        match self {
            Target::User(u) => Some(u),
            _ => None,
        }
    }
}
