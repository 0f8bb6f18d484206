//! Fixed content models, limits and the per-role metadata table

use crate::rights::{PermissionAnchorType, RoleName, RoleRight};

// Fixed content model ids
pub const LEVEL1_CONTENT_MODEL: &str = "level1";
pub const LEVEL2_CONTENT_MODEL: &str = "level2";
pub const DATA_CONTENT_MODEL: &str = "data";

// Anchor id of a user-admin right that covers every user
pub const ALL_USERS_ANCHOR: &str = "";

// Maximum ancestor chain walked by the hierarchy resolver (prevents infinite loops)
pub const MAX_HIERARCHY_DEPTH: usize = 16;

// Length-prefixed key parts are limited to one length byte
pub const MAX_ID_LEN: usize = 255;

/// True for the two structural content models.
#[inline]
pub fn is_structural(content_model_id: &str) -> bool {
    content_model_id == LEVEL1_CONTENT_MODEL || content_model_id == LEVEL2_CONTENT_MODEL
}

/// Fixed metadata of one role kind.
#[derive(Debug)]
pub struct RoleInfo {
    pub name: RoleName,
    pub allowed_rights: &'static [RoleRight],
    /// `None` for roles that cannot be anchored at all.
    pub anchor_types: Option<&'static [PermissionAnchorType]>,
}

const ADMIN_RIGHTS: &[RoleRight] = &[RoleRight::Write, RoleRight::Read];

const USER_RIGHTS: &[RoleRight] = &[
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
];

// One row per role kind
pub static ROLE_TABLE: [RoleInfo; 4] = [
    RoleInfo { name: RoleName::Admin, allowed_rights: &[], anchor_types: None },
    RoleInfo {
        name: RoleName::Level1Admin,
        allowed_rights: ADMIN_RIGHTS,
        anchor_types: Some(&[PermissionAnchorType::Level1Entity]),
    },
    RoleInfo {
        name: RoleName::UserAdmin,
        allowed_rights: ADMIN_RIGHTS,
        anchor_types: Some(&[PermissionAnchorType::User]),
    },
    RoleInfo {
        name: RoleName::User,
        allowed_rights: USER_RIGHTS,
        anchor_types: Some(&[PermissionAnchorType::Level2Entity]),
    },
];

/// Look up the fixed metadata row for a role name (`None` for ANY)
pub fn role_info(name: RoleName) -> Option<&'static RoleInfo> {
    ROLE_TABLE.iter().find(|s| s.name == name)
}
