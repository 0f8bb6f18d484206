//! Store-backed credential and entity operations
//!
//! Each operation runs in one write transaction. Validation happens before
//! anything is written, so a rejected request leaves the registry unchanged.
//! Deleting a user or an entity purges every right anchored on it in the same
//! transaction; deleting an entity removes its descendants too.

use std::collections::BTreeSet;

use crate::constants::{ALL_USERS_ANCHOR, MAX_ID_LEN};
use crate::error::{invalid, not_found, Result};
use crate::model::{Entity, User};
use crate::rights::{PermissionAnchorType, RoleName, RoleRight};
use crate::role::Role;
use crate::tx::{transact, Tx};

// ============================================================================
// Validation
// ============================================================================

fn check_id(kind: &str, id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(invalid(format!("{} must not be blank", kind)));
    }
    if id.len() > MAX_ID_LEN {
        return Err(invalid(format!("{} longer than {} bytes", kind, MAX_ID_LEN)));
    }
    Ok(())
}

/// True if `anchor_id` names an object of the given anchor type
fn anchor_matches(tx: &mut Tx, anchor_id: &str, anchor_type: PermissionAnchorType) -> Result<bool> {
    // LMDB has no empty keys; "" only ever names all users
    if anchor_id.is_empty() {
        return Ok(anchor_type == PermissionAnchorType::User);
    }
    Ok(match anchor_type {
        PermissionAnchorType::User => tx.user_exists(anchor_id)?,
        PermissionAnchorType::Level1Entity => tx.get_entity(anchor_id)?.is_some_and(|e| e.is_level1()),
        PermissionAnchorType::Level2Entity => tx.get_entity(anchor_id)?.is_some_and(|e| e.is_level2()),
    })
}

fn check_anchor(tx: &mut Tx, role: &Role, anchor_id: &str) -> Result<()> {
    let Some(types) = role.anchor_types() else {
        return Err(invalid(format!("role {} takes no anchors", role.role_name())));
    };
    for &t in types {
        if anchor_matches(tx, anchor_id, t)? {
            return Ok(());
        }
    }
    Err(invalid(format!(
        "anchor '{}' is not a valid {:?} anchor for role {}",
        anchor_id,
        types,
        role.role_name()
    )))
}

/// Validate a full role list against the registry
pub fn validate_roles(tx: &mut Tx, roles: &[Role]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for role in roles {
        if !seen.insert(role.role_name()) {
            return Err(invalid(format!("duplicate role {}", role.role_name())));
        }
        role.validate()?;
        for anchor in role.anchor_ids() {
            check_anchor(tx, role, anchor)?;
        }
    }
    Ok(())
}

// ============================================================================
// Users
// ============================================================================

/// Rights every new user gets: READ and WRITE on its own account.
pub fn default_role(name: &str) -> Result<Role> {
    Role::with_right(RoleName::UserAdmin, name, [RoleRight::Read, RoleRight::Write])
}

pub(crate) fn create_user_in(tx: &mut Tx, name: &str) -> Result<User> {
    check_id("user name", name)?;
    if tx.user_exists(name)? {
        return Err(invalid(format!("user '{}' already exists", name)));
    }
    let mut user = User::new(name);
    user.set_role(default_role(name)?);
    tx.put_user(&user)?;
    Ok(user)
}

/// Create a user with its default rights
pub fn create_user(name: &str) -> Result<User> {
    let user = transact(|tx| create_user_in(tx, name))
        .inspect_err(|e| tracing::warn!(user = name, error = %e, "create user rejected"))?;
    tracing::info!(user = name, "user created");
    Ok(user)
}

/// Replace a user's whole role list
pub fn set_roles(name: &str, roles: Vec<Role>) -> Result<User> {
    let user = transact(|tx| {
        let mut user = tx.get_user(name)?.ok_or_else(|| not_found(format!("user '{}' does not exist", name)))?;
        validate_roles(tx, &roles)?;
        user.roles = roles;
        tx.put_user(&user)?;
        Ok(user)
    })
    .inspect_err(|e| tracing::warn!(user = name, error = %e, "set roles rejected"))?;
    tracing::info!(user = name, roles = user.roles.len(), "roles replaced");
    Ok(user)
}

/// Replace the rights one role of a user holds on one anchor.
///
/// A missing role is created. An empty `rights` removes the entry, and the
/// role with it once it holds no rights.
pub fn set_right<I>(name: &str, role_name: RoleName, anchor_id: &str, rights: I) -> Result<User>
where
    I: IntoIterator<Item = RoleRight>,
{
    let rights: BTreeSet<RoleRight> = rights.into_iter().collect();
    let user = transact(|tx| {
        if matches!(role_name, RoleName::Admin | RoleName::Any) {
            return Err(invalid(format!("not allowed to set rights for role {}", role_name)));
        }
        let mut user = tx.get_user(name)?.ok_or_else(|| not_found(format!("user '{}' does not exist", name)))?;
        let mut role = match user.role(role_name) {
            Some(r) => r.clone(),
            None => Role::new(role_name)?,
        };
        role.set_right(anchor_id, rights.iter().copied())?;
        if !rights.is_empty() {
            check_anchor(tx, &role, anchor_id)?;
        }
        if role.rights().is_some_and(|r| r.is_empty()) {
            user.remove_role(role_name);
        } else {
            user.set_role(role);
        }
        tx.put_user(&user)?;
        Ok(user)
    })
    .inspect_err(|e| tracing::warn!(user = name, role = %role_name, anchor = anchor_id, error = %e, "set right rejected"))?;
    tracing::info!(
        user = name,
        role = %role_name,
        anchor = anchor_id,
        rights = ?rights,
        "rights updated"
    );
    Ok(user)
}

/// Replace the rights a role holds on the all-users anchor `""`
pub fn set_right_without_anchor<I>(name: &str, role_name: RoleName, rights: I) -> Result<User>
where
    I: IntoIterator<Item = RoleRight>,
{
    set_right(name, role_name, ALL_USERS_ANCHOR, rights)
}

/// Delete a user and purge every right anchored on its name.
/// The last user holding ADMIN cannot be deleted.
pub fn delete_user(name: &str) -> Result<User> {
    let (user, purged) = transact(|tx| {
        let user = tx.get_user(name)?.ok_or_else(|| not_found(format!("user '{}' does not exist", name)))?;
        if user.has_role(RoleName::Admin) {
            let admins = tx.list_users()?.iter().filter(|u| u.has_role(RoleName::Admin)).count();
            if admins <= 1 {
                return Err(invalid("cannot delete the last admin user"));
            }
        }
        tx.delete_user(name)?;
        let purged = tx.purge_anchor(name)?;
        Ok((user, purged))
    })
    .inspect_err(|e| tracing::warn!(user = name, error = %e, "delete user rejected"))?;
    tracing::info!(user = name, purged = ?purged, "user deleted");
    Ok(user)
}

// ============================================================================
// Entities
// ============================================================================

fn check_parent(tx: &mut Tx, entity: &Entity) -> Result<()> {
    let parent = match entity.parent_id.as_deref() {
        Some(p) => Some(tx.get_entity(p)?.ok_or_else(|| not_found(format!("parent '{}' does not exist", p)))?),
        None => None,
    };
    match (entity.is_level1(), entity.is_level2(), parent) {
        (true, _, None) => Ok(()),
        (true, _, Some(_)) => Err(invalid("a level1 entity cannot have a parent")),
        (_, true, Some(p)) if p.is_level1() => Ok(()),
        (_, true, _) => Err(invalid("a level2 entity needs a level1 parent")),
        (_, _, Some(_)) => Ok(()),
        (_, _, None) => Err(invalid(format!("a {} entity needs a parent", entity.content_model_id))),
    }
}

/// Register an entity after checking the tree shape
pub fn create_entity(mut entity: Entity) -> Result<Entity> {
    if entity.parent_id.as_deref().is_some_and(str::is_empty) {
        entity.parent_id = None;
    }
    let id = entity.id.clone();
    let entity = transact(|tx| {
        check_id("entity id", &entity.id)?;
        check_id("content model id", &entity.content_model_id)?;
        if tx.get_entity(&entity.id)?.is_some() {
            return Err(invalid(format!("entity '{}' already exists", entity.id)));
        }
        check_parent(tx, &entity)?;
        tx.put_entity(&entity)?;
        Ok(entity)
    })
    .inspect_err(|e| tracing::warn!(entity = %id, error = %e, "create entity rejected"))?;
    tracing::info!(entity = %entity.id, model = %entity.content_model_id, "entity created");
    Ok(entity)
}

/// Delete an entity together with its subtree and purge every right
/// anchored on any removed id. Returns the removed entities, children
/// before their parents.
pub fn delete_entity(id: &str) -> Result<Vec<Entity>> {
    let (removed, purged) = transact(|tx| {
        if tx.get_entity(id)?.is_none() {
            return Err(not_found(format!("entity '{}' does not exist", id)));
        }
        let mut order = Vec::new();
        let mut seen = BTreeSet::new();
        let mut stack = vec![id.to_string()];
        while let Some(next) = stack.pop() {
            if seen.insert(next.clone()) {
                stack.extend(tx.children_of(&next)?);
                order.push(next);
            }
        }
        let mut removed = Vec::with_capacity(order.len());
        let mut purged = BTreeSet::new();
        for next in order.iter().rev() {
            if let Some(entity) = tx.delete_entity(next)? {
                removed.push(entity);
            }
            purged.extend(tx.purge_anchor(next)?);
        }
        Ok((removed, purged))
    })
    .inspect_err(|e| tracing::warn!(entity = id, error = %e, "delete entity rejected"))?;
    tracing::info!(entity = id, removed = removed.len(), purged = ?purged, "entity deleted");
    Ok(removed)
}

/// Strip every right keyed by `anchor_id` from every stored user.
/// Returns the names of the users that changed.
pub fn on_anchor_deleted(anchor_id: &str) -> Result<Vec<String>> {
    let purged = transact(|tx| tx.purge_anchor(anchor_id))?;
    if !purged.is_empty() {
        tracing::info!(anchor = anchor_id, users = ?purged, "anchor rights purged");
    }
    Ok(purged)
}
