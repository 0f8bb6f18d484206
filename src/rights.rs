//! Fixed right and anchor vocabulary
//!
//! Every enum here is part of the stable wire vocabulary and serializes as its
//! SCREAMING_SNAKE_CASE token name.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{invalid, AnchorAuthError};

// ============================================================================
// Role names
// ============================================================================

/// Names of the supported roles. At most one role per name is held by a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RoleName {
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "LEVEL1_ADMIN")]
    Level1Admin,
    #[serde(rename = "USER_ADMIN")]
    UserAdmin,
    #[serde(rename = "USER")]
    User,
    /// Requirement-only name. No role variant carries it.
    #[serde(rename = "ANY")]
    Any,
}

impl RoleName {
    pub const ALL: [RoleName; 5] = [
        RoleName::Admin,
        RoleName::Level1Admin,
        RoleName::UserAdmin,
        RoleName::User,
        RoleName::Any,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::Admin => "ADMIN",
            RoleName::Level1Admin => "LEVEL1_ADMIN",
            RoleName::UserAdmin => "USER_ADMIN",
            RoleName::User => "USER",
            RoleName::Any => "ANY",
        }
    }
}

// ============================================================================
// Role rights
// ============================================================================

/// A permission token stored in a role's rights map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleRight {
    ReadPendingMetadata,
    ReadSubmittedMetadata,
    ReadPublishedMetadata,
    ReadWithdrawnMetadata,
    WritePendingMetadata,
    WriteSubmittedMetadata,
    WritePublishedMetadata,
    WriteWithdrawnMetadata,
    ReadPendingBinary,
    ReadSubmittedBinary,
    ReadPublishedBinary,
    ReadWithdrawnBinary,
    WritePendingBinary,
    WriteSubmittedBinary,
    WritePublishedBinary,
    WriteWithdrawnBinary,
    #[serde(rename = "READ_LEVEL2")]
    ReadLevel2,
    #[serde(rename = "WRITE_LEVEL2")]
    WriteLevel2,
    Read,
    Write,
}

impl RoleRight {
    pub const ALL: [RoleRight; 20] = [
        RoleRight::ReadPendingMetadata,
        RoleRight::ReadSubmittedMetadata,
        RoleRight::ReadPublishedMetadata,
        RoleRight::ReadWithdrawnMetadata,
        RoleRight::WritePendingMetadata,
        RoleRight::WriteSubmittedMetadata,
        RoleRight::WritePublishedMetadata,
        RoleRight::WriteWithdrawnMetadata,
        RoleRight::ReadPendingBinary,
        RoleRight::ReadSubmittedBinary,
        RoleRight::ReadPublishedBinary,
        RoleRight::ReadWithdrawnBinary,
        RoleRight::WritePendingBinary,
        RoleRight::WriteSubmittedBinary,
        RoleRight::WritePublishedBinary,
        RoleRight::WriteWithdrawnBinary,
        RoleRight::ReadLevel2,
        RoleRight::WriteLevel2,
        RoleRight::Read,
        RoleRight::Write,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleRight::ReadPendingMetadata => "READ_PENDING_METADATA",
            RoleRight::ReadSubmittedMetadata => "READ_SUBMITTED_METADATA",
            RoleRight::ReadPublishedMetadata => "READ_PUBLISHED_METADATA",
            RoleRight::ReadWithdrawnMetadata => "READ_WITHDRAWN_METADATA",
            RoleRight::WritePendingMetadata => "WRITE_PENDING_METADATA",
            RoleRight::WriteSubmittedMetadata => "WRITE_SUBMITTED_METADATA",
            RoleRight::WritePublishedMetadata => "WRITE_PUBLISHED_METADATA",
            RoleRight::WriteWithdrawnMetadata => "WRITE_WITHDRAWN_METADATA",
            RoleRight::ReadPendingBinary => "READ_PENDING_BINARY",
            RoleRight::ReadSubmittedBinary => "READ_SUBMITTED_BINARY",
            RoleRight::ReadPublishedBinary => "READ_PUBLISHED_BINARY",
            RoleRight::ReadWithdrawnBinary => "READ_WITHDRAWN_BINARY",
            RoleRight::WritePendingBinary => "WRITE_PENDING_BINARY",
            RoleRight::WriteSubmittedBinary => "WRITE_SUBMITTED_BINARY",
            RoleRight::WritePublishedBinary => "WRITE_PUBLISHED_BINARY",
            RoleRight::WriteWithdrawnBinary => "WRITE_WITHDRAWN_BINARY",
            RoleRight::ReadLevel2 => "READ_LEVEL2",
            RoleRight::WriteLevel2 => "WRITE_LEVEL2",
            RoleRight::Read => "READ",
            RoleRight::Write => "WRITE",
        }
    }

    /// The state×kind token that grants `permission` on content of `kind` in `state`.
    pub const fn for_content(permission: PermissionType, state: EntityState, kind: ContentKind) -> RoleRight {
        use ContentKind::{Binary, Metadata};
        use EntityState::{Pending, Published, Submitted, Withdrawn};
        use PermissionType::{Read, Write};
        match (permission, state, kind) {
            (Read, Pending, Metadata) => RoleRight::ReadPendingMetadata,
            (Read, Submitted, Metadata) => RoleRight::ReadSubmittedMetadata,
            (Read, Published, Metadata) => RoleRight::ReadPublishedMetadata,
            (Read, Withdrawn, Metadata) => RoleRight::ReadWithdrawnMetadata,
            (Write, Pending, Metadata) => RoleRight::WritePendingMetadata,
            (Write, Submitted, Metadata) => RoleRight::WriteSubmittedMetadata,
            (Write, Published, Metadata) => RoleRight::WritePublishedMetadata,
            (Write, Withdrawn, Metadata) => RoleRight::WriteWithdrawnMetadata,
            (Read, Pending, Binary) => RoleRight::ReadPendingBinary,
            (Read, Submitted, Binary) => RoleRight::ReadSubmittedBinary,
            (Read, Published, Binary) => RoleRight::ReadPublishedBinary,
            (Read, Withdrawn, Binary) => RoleRight::ReadWithdrawnBinary,
            (Write, Pending, Binary) => RoleRight::WritePendingBinary,
            (Write, Submitted, Binary) => RoleRight::WriteSubmittedBinary,
            (Write, Published, Binary) => RoleRight::WritePublishedBinary,
            (Write, Withdrawn, Binary) => RoleRight::WriteWithdrawnBinary,
        }
    }
}

// ============================================================================
// Anchors, permission and object types
// ============================================================================

/// What kind of id a role's rights map is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermissionAnchorType {
    #[serde(rename = "LEVEL1_ENTITY")]
    Level1Entity,
    #[serde(rename = "LEVEL2_ENTITY")]
    Level2Entity,
    #[serde(rename = "USER")]
    User,
}

impl PermissionAnchorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionAnchorType::Level1Entity => "LEVEL1_ENTITY",
            PermissionAnchorType::Level2Entity => "LEVEL2_ENTITY",
            PermissionAnchorType::User => "USER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionType {
    Read,
    Write,
}

impl PermissionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionType::Read => "READ",
            PermissionType::Write => "WRITE",
        }
    }

    /// Coarse token checked by the administrative roles.
    pub const fn coarse_right(&self) -> RoleRight {
        match self {
            PermissionType::Read => RoleRight::Read,
            PermissionType::Write => RoleRight::Write,
        }
    }

    /// Token checked by the user role when the target is its own LEVEL2 anchor.
    pub const fn level2_right(&self) -> RoleRight {
        match self {
            PermissionType::Read => RoleRight::ReadLevel2,
            PermissionType::Write => RoleRight::WriteLevel2,
        }
    }
}

/// Kind of object an operation touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectType {
    Entity,
    Binary,
    Right,
    User,
    InputEntity,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Entity => "ENTITY",
            ObjectType::Binary => "BINARY",
            ObjectType::Right => "RIGHT",
            ObjectType::User => "USER",
            ObjectType::InputEntity => "INPUT_ENTITY",
        }
    }

    /// Matrix column for this object type, if it has one.
    pub const fn content_kind(&self) -> Option<ContentKind> {
        match self {
            ObjectType::Entity => Some(ContentKind::Metadata),
            ObjectType::Binary => Some(ContentKind::Binary),
            _ => None,
        }
    }
}

/// Column of the state×kind matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Metadata,
    Binary,
}

/// Lifecycle state of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityState {
    Pending,
    Submitted,
    Published,
    Withdrawn,
}

impl EntityState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityState::Pending => "PENDING",
            EntityState::Submitted => "SUBMITTED",
            EntityState::Published => "PUBLISHED",
            EntityState::Withdrawn => "WITHDRAWN",
        }
    }
}

// ============================================================================
// Token parsing (path segments in the REST layer)
// ============================================================================

macro_rules! token_impls {
    ($ty:ty, $what:literal, $all:expr) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = AnchorAuthError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let upper = s.trim().to_ascii_uppercase();
                $all
                    .into_iter()
                    .find(|v| v.as_str() == upper)
                    .ok_or_else(|| invalid(format!("unknown {} '{}'", $what, s)))
            }
        }
    };
}

token_impls!(RoleName, "role name", RoleName::ALL);
token_impls!(RoleRight, "role right", RoleRight::ALL);
token_impls!(PermissionAnchorType, "anchor type", [
    PermissionAnchorType::Level1Entity,
    PermissionAnchorType::Level2Entity,
    PermissionAnchorType::User,
]);
token_impls!(PermissionType, "permission type", [PermissionType::Read, PermissionType::Write]);
token_impls!(ObjectType, "object type", [
    ObjectType::Entity,
    ObjectType::Binary,
    ObjectType::Right,
    ObjectType::User,
    ObjectType::InputEntity,
]);
token_impls!(EntityState, "entity state", [
    EntityState::Pending,
    EntityState::Submitted,
    EntityState::Published,
    EntityState::Withdrawn,
]);

/// Convert a set of rights to their token names
pub fn rights_to_names<'a, I: IntoIterator<Item = &'a RoleRight>>(rights: I) -> Vec<&'static str> {
    rights.into_iter().map(|r| r.as_str()).collect()
}

/// Convert token names to rights, rejecting unknown names
pub fn names_to_rights(names: &[&str]) -> Result<Vec<RoleRight>, AnchorAuthError> {
    names.iter().map(|n| n.parse()).collect()
}
