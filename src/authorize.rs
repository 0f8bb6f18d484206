//! Authorization coordinator
//!
//! A request carries a list of alternative requirements; it is allowed when
//! any role of the principal satisfies any of them. The entity hierarchy is
//! resolved at most once per request, and only when a role that reads it
//! meets an entity target.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::hierarchy::{hierarchy_of, EntityHierarchy, EntityLookup};
use crate::model::{Target, User};
use crate::rights::{ObjectType, PermissionType, RoleName};

/// One alternative an operation accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRequirement {
    pub role_name: RoleName,
    #[serde(default)]
    pub permission_type: Option<PermissionType>,
    #[serde(default)]
    pub object_type: Option<ObjectType>,
}

impl PermissionRequirement {
    pub fn new(role_name: RoleName) -> Self {
        PermissionRequirement { role_name, permission_type: None, object_type: None }
    }

    pub fn with_permission(mut self, permission_type: PermissionType) -> Self {
        self.permission_type = Some(permission_type);
        self
    }

    pub fn with_object(mut self, object_type: ObjectType) -> Self {
        self.object_type = Some(object_type);
        self
    }

    /// Shorthand for `new(role).with_permission(p).with_object(o)`
    pub fn of(role_name: RoleName, permission_type: PermissionType, object_type: ObjectType) -> Self {
        PermissionRequirement::new(role_name).with_permission(permission_type).with_object(object_type)
    }
}

/// Who is asking.
#[derive(Debug, Clone, Copy)]
pub enum Principal<'a> {
    Anonymous,
    User(&'a User),
}

impl<'a> From<Option<&'a User>> for Principal<'a> {
    fn from(user: Option<&'a User>) -> Self {
        user.map_or(Principal::Anonymous, Principal::User)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenyReason {
    Unauthenticated,
    Forbidden,
}

/// Outcome of an authorization request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    #[inline]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn status_str(&self) -> &'static str {
        match self {
            Decision::Allow => "ALLOW",
            Decision::Deny(DenyReason::Unauthenticated) => "UNAUTHENTICATED",
            Decision::Deny(DenyReason::Forbidden) => "FORBIDDEN",
        }
    }

    /// HTTP status a surface should answer with
    pub fn http_status(&self) -> u16 {
        match self {
            Decision::Allow => 200,
            Decision::Deny(DenyReason::Unauthenticated) => 401,
            Decision::Deny(DenyReason::Forbidden) => 403,
        }
    }
}

/// Decide whether `principal` may act on `target` under any of `requirements`.
///
/// An empty requirement list marks a public operation and always allows.
/// Errors only come from the hierarchy lookup.
pub fn authorize<L: EntityLookup + ?Sized>(
    lookup: &L,
    principal: Principal<'_>,
    requirements: &[PermissionRequirement],
    target: Target<'_>,
) -> Result<Decision> {
    if requirements.is_empty() {
        return Ok(Decision::Allow);
    }
    let user = match principal {
        Principal::Anonymous => {
            tracing::debug!("anonymous request denied");
            return Ok(Decision::Deny(DenyReason::Unauthenticated));
        }
        Principal::User(user) => user,
    };

    let empty = EntityHierarchy::default();
    let mut hierarchy: Option<EntityHierarchy> = None;

    for requirement in requirements {
        for role in user.roles.iter().filter(|r| r.role_name() == requirement.role_name) {
            let resolved = match target {
                Target::Entity(entity) if role.needs_hierarchy() => {
                    if hierarchy.is_none() {
                        hierarchy = Some(hierarchy_of(lookup, entity)?);
                    }
                    hierarchy.as_ref().unwrap_or(&empty)
                }
                _ => &empty,
            };
            if role.compare(requirement, target, resolved) {
                tracing::debug!(
                    user = %user.name,
                    role = %requirement.role_name,
                    permission = ?requirement.permission_type,
                    object = ?requirement.object_type,
                    "allowed"
                );
                return Ok(Decision::Allow);
            }
        }
    }

    tracing::debug!(user = %user.name, alternatives = requirements.len(), "forbidden");
    Ok(Decision::Deny(DenyReason::Forbidden))
}
