//! anchorauth - hierarchical role resolution and authorization decisions
//!
//! Users hold roles; each role carries rights keyed by an anchor (a LEVEL1
//! entity, a LEVEL2 entity or a user). A request names alternative
//! requirements and is allowed when any held role satisfies any of them.
//!
//! The decision engine (`authorize`, `Role::compare`, `resolve_hierarchy`) is
//! pure and works over any `EntityLookup`. The LMDB registry (`init`,
//! `credentials`, `read`) stores users and entities and keeps rights
//! consistent when anchors are deleted.

pub mod authorize;
pub mod bootstrap;
pub mod constants;
pub mod credentials;
pub mod db;
pub mod error;
pub mod hierarchy;
pub mod keys;
pub mod model;
pub mod read;
pub mod rights;
pub mod role;
pub mod tx;

pub use authorize::{authorize, Decision, DenyReason, PermissionRequirement, Principal};
pub use bootstrap::{bootstrap, is_bootstrapped};
pub use constants::{
    is_structural, role_info, RoleInfo, ALL_USERS_ANCHOR, DATA_CONTENT_MODEL, LEVEL1_CONTENT_MODEL,
    LEVEL2_CONTENT_MODEL, MAX_HIERARCHY_DEPTH,
};
pub use db::{clear_all, init, test_lock};
pub use error::{AnchorAuthError, Result};
pub use hierarchy::{hierarchy_of, resolve_hierarchy, EntityHierarchy, EntityLookup};
pub use model::{Entity, Target, User};
pub use read::{get_entity, get_hierarchy, get_user, list_entities, list_users, users_with_anchor, StoredEntities};
pub use rights::{
    names_to_rights, rights_to_names, ContentKind, EntityState, ObjectType, PermissionAnchorType, PermissionType,
    RoleName, RoleRight,
};
pub use role::{Rights, Role};
pub use tx::{transact, Tx};
