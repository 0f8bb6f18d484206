//! Role variants and their authorization policies
//!
//! Four role kinds share one contract:
//! - `Admin`: unconditional superuser, carries no rights
//! - `Level1Admin`: READ/WRITE over the structural entities of a LEVEL1 branch
//! - `UserAdmin`: READ/WRITE over user accounts (`""` anchors every user)
//! - `User`: state×kind rights over everything below a LEVEL2 entity
//!
//! `compare` is pure: it reads only the role's rights map and its arguments.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::authorize::PermissionRequirement;
use crate::constants::{is_structural, role_info, ALL_USERS_ANCHOR};
use crate::error::{invalid, AnchorAuthError, Result};
use crate::hierarchy::EntityHierarchy;
use crate::model::Target;
use crate::rights::{EntityState, PermissionAnchorType, RoleName, RoleRight};

/// Rights of one role: anchor id → granted tokens
pub type Rights = BTreeMap<String, BTreeSet<RoleRight>>;

/// A role held by a user, tagged by `roleName` on the wire.
///
/// Deserialization goes through `set_rights`, so a body carrying rights
/// on ADMIN or rights outside the role's allowed set is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "roleName", try_from = "RoleRecord")]
pub enum Role {
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "LEVEL1_ADMIN")]
    Level1Admin {
        #[serde(default)]
        rights: Rights,
    },
    #[serde(rename = "USER_ADMIN")]
    UserAdmin {
        #[serde(default)]
        rights: Rights,
    },
    #[serde(rename = "USER")]
    User {
        #[serde(default)]
        rights: Rights,
    },
}

impl Role {
    /// Create an empty role of the given kind. ANY has no role.
    pub fn new(name: RoleName) -> Result<Role> {
        match name {
            RoleName::Admin => Ok(Role::Admin),
            RoleName::Level1Admin => Ok(Role::Level1Admin { rights: Rights::new() }),
            RoleName::UserAdmin => Ok(Role::UserAdmin { rights: Rights::new() }),
            RoleName::User => Ok(Role::User { rights: Rights::new() }),
            RoleName::Any => Err(invalid("role name ANY is not supported")),
        }
    }

    /// Create a role with a single anchored right set
    pub fn with_right<I>(name: RoleName, anchor_id: &str, rights: I) -> Result<Role>
    where
        I: IntoIterator<Item = RoleRight>,
    {
        let mut role = Role::new(name)?;
        role.set_right(anchor_id, rights)?;
        Ok(role)
    }

    pub fn role_name(&self) -> RoleName {
        match self {
            Role::Admin => RoleName::Admin,
            Role::Level1Admin { .. } => RoleName::Level1Admin,
            Role::UserAdmin { .. } => RoleName::UserAdmin,
            Role::User { .. } => RoleName::User,
        }
    }

    /// Rights this role kind may ever hold
    pub fn allowed_rights(&self) -> &'static [RoleRight] {
        role_info(self.role_name()).map_or(&[][..], |info| info.allowed_rights)
    }

    /// Anchor kinds this role's rights are keyed by (`None` for Admin)
    pub fn anchor_types(&self) -> Option<&'static [PermissionAnchorType]> {
        role_info(self.role_name()).and_then(|info| info.anchor_types)
    }

    #[inline]
    pub fn is_allowed(&self, right: RoleRight) -> bool {
        self.allowed_rights().contains(&right)
    }

    /// The rights map, or `None` for Admin
    pub fn rights(&self) -> Option<&Rights> {
        match self {
            Role::Admin => None,
            Role::Level1Admin { rights } | Role::UserAdmin { rights } | Role::User { rights } => Some(rights),
        }
    }

    fn rights_mut(&mut self) -> Option<&mut Rights> {
        match self {
            Role::Admin => None,
            Role::Level1Admin { rights } | Role::UserAdmin { rights } | Role::User { rights } => Some(rights),
        }
    }

    /// Replace the whole rights map. Empty right sets are dropped.
    pub fn set_rights(&mut self, rights: Rights) -> Result<()> {
        if matches!(self, Role::Admin) {
            return if rights.values().all(BTreeSet::is_empty) { Ok(()) } else { Err(admin_rights_error()) };
        }
        for (anchor, set) in &rights {
            self.check_allowed(anchor, set.iter().copied())?;
        }
        let target = self.rights_mut().ok_or_else(admin_rights_error)?;
        *target = rights.into_iter().filter(|(_, set)| !set.is_empty()).collect();
        Ok(())
    }

    /// Replace the rights for one anchor; an empty set removes the entry.
    /// On error the role is left unchanged.
    pub fn set_right<I>(&mut self, anchor_id: &str, rights: I) -> Result<()>
    where
        I: IntoIterator<Item = RoleRight>,
    {
        let set: BTreeSet<RoleRight> = rights.into_iter().collect();
        if matches!(self, Role::Admin) {
            return Err(admin_rights_error());
        }
        self.check_allowed(anchor_id, set.iter().copied())?;
        if let Some(map) = self.rights_mut() {
            if set.is_empty() {
                map.remove(anchor_id);
            } else {
                map.insert(anchor_id.to_string(), set);
            }
        }
        Ok(())
    }

    fn check_allowed<I: IntoIterator<Item = RoleRight>>(&self, anchor_id: &str, rights: I) -> Result<()> {
        for right in rights {
            if !self.is_allowed(right) {
                return Err(invalid(format!(
                    "not allowed role:{} anchorId:{} right:{}",
                    self.role_name(),
                    anchor_id,
                    right
                )));
            }
        }
        Ok(())
    }

    /// Check the stored rights against the role's allowed set
    pub fn validate(&self) -> Result<()> {
        match self.rights() {
            None => Ok(()),
            Some(rights) => rights
                .iter()
                .try_for_each(|(anchor, set)| self.check_allowed(anchor, set.iter().copied())),
        }
    }

    pub fn has_right(&self, anchor_id: &str) -> bool {
        self.rights().is_some_and(|r| r.contains_key(anchor_id))
    }

    pub fn right(&self, anchor_id: &str) -> Option<&BTreeSet<RoleRight>> {
        self.rights()?.get(anchor_id)
    }

    /// Remove the entry for `anchor_id`; returns true if one existed
    pub fn remove_right(&mut self, anchor_id: &str) -> bool {
        self.rights_mut().is_some_and(|r| r.remove(anchor_id).is_some())
    }

    pub fn anchor_ids(&self) -> Vec<&str> {
        self.rights()
            .map(|r| r.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Whether `compare` reads the entity hierarchy for this role
    pub fn needs_hierarchy(&self) -> bool {
        matches!(self, Role::Level1Admin { .. } | Role::User { .. })
    }

    /// Decide whether this role satisfies `requirement` on `target`.
    pub fn compare(&self, requirement: &PermissionRequirement, target: Target<'_>, hierarchy: &EntityHierarchy) -> bool {
        if requirement.role_name != self.role_name() {
            return false;
        }
        match self {
            Role::Admin => true,
            Role::Level1Admin { rights } => level1_admin_allows(rights, requirement, target, hierarchy),
            Role::UserAdmin { rights } => user_admin_allows(rights, requirement, target),
            Role::User { rights } => user_allows(rights, requirement, target, hierarchy),
        }
    }
}

fn admin_rights_error() -> AnchorAuthError {
    AnchorAuthError::Configuration("not allowed to set rights for role ADMIN".into())
}

/// Wire form of a role before its rights are checked
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoleRecord {
    role_name: RoleName,
    #[serde(default)]
    rights: Option<Rights>,
}

impl TryFrom<RoleRecord> for Role {
    type Error = AnchorAuthError;

    fn try_from(record: RoleRecord) -> Result<Role> {
        let mut role = Role::new(record.role_name)?;
        if let Some(rights) = record.rights {
            role.set_rights(rights)?;
        }
        Ok(role)
    }
}

// ============================================================================
// Policies
// ============================================================================

// Structural entities only: DATA entities and binaries are never covered.
fn level1_admin_allows(
    rights: &Rights,
    requirement: &PermissionRequirement,
    target: Target<'_>,
    hierarchy: &EntityHierarchy,
) -> bool {
    let Some(entity) = target.entity() else { return false };
    let Some(level1_id) = hierarchy.level1_id.as_deref() else { return false };
    if !is_structural(&entity.content_model_id) {
        return false;
    }
    let Some(granted) = rights.get(level1_id) else { return false };
    match requirement.permission_type {
        Some(p) => granted.contains(&p.coarse_right()),
        None => true,
    }
}

fn user_admin_allows(rights: &Rights, requirement: &PermissionRequirement, target: Target<'_>) -> bool {
    let Some(user) = target.user() else { return false };
    let own = rights.get(&user.name);
    let all = rights.get(ALL_USERS_ANCHOR);
    if own.is_none() && all.is_none() {
        return false;
    }
    match requirement.permission_type {
        Some(p) => {
            let wanted = p.coarse_right();
            own.is_some_and(|s| s.contains(&wanted)) || all.is_some_and(|s| s.contains(&wanted))
        }
        None => true,
    }
}

fn user_allows(
    rights: &Rights,
    requirement: &PermissionRequirement,
    target: Target<'_>,
    hierarchy: &EntityHierarchy,
) -> bool {
    let Some(entity) = target.entity() else { return false };
    let Some(object_type) = requirement.object_type else { return false };
    let Some(level2_id) = hierarchy.level2_id.as_deref() else { return false };
    let Some(granted) = rights.get(level2_id) else { return false };

    if entity.is_level2() {
        return match requirement.permission_type {
            Some(p) => granted.contains(&p.level2_right()),
            None => true,
        };
    }

    // Only this role treats a missing state as PENDING.
    let state = entity.state.unwrap_or(EntityState::Pending);
    match (requirement.permission_type, object_type.content_kind()) {
        (Some(p), Some(kind)) => granted.contains(&RoleRight::for_content(p, state, kind)),
        _ => false,
    }
}
