//! Role policy tests
//!
//! Exercises `Role::compare` directly with hand-built hierarchies; no
//! storage involved.

use anchorauth::{
    AnchorAuthError, Entity, EntityHierarchy, EntityState, ObjectType, PermissionRequirement, PermissionType,
    Role, RoleName, RoleRight, Target, User, DATA_CONTENT_MODEL, LEVEL1_CONTENT_MODEL, LEVEL2_CONTENT_MODEL,
};

fn hierarchy(level1: Option<&str>, level2: Option<&str>) -> EntityHierarchy {
    EntityHierarchy {
        level1_id: level1.map(str::to_string),
        level2_id: level2.map(str::to_string),
    }
}

fn req(role: RoleName, p: PermissionType) -> PermissionRequirement {
    PermissionRequirement::of(role, p, ObjectType::Entity)
}

fn l1() -> Entity {
    Entity::new("L1", None, LEVEL1_CONTENT_MODEL)
}

fn l2() -> Entity {
    Entity::new("L2", Some("L1"), LEVEL2_CONTENT_MODEL)
}

fn data(state: Option<EntityState>) -> Entity {
    let e = Entity::new("D", Some("L2"), DATA_CONTENT_MODEL);
    match state {
        Some(s) => e.with_state(s),
        None => e,
    }
}

// ============================================================================
// Admin
// ============================================================================

#[test]
fn admin_matches_any_admin_requirement() {
    let role = Role::Admin;
    let user = User::new("bob");
    let entity = data(None);
    let h = EntityHierarchy::default();

    assert!(role.compare(&PermissionRequirement::new(RoleName::Admin), Target::None, &h));
    assert!(role.compare(&req(RoleName::Admin, PermissionType::Write), Target::Entity(&entity), &h));
    assert!(role.compare(
        &PermissionRequirement::of(RoleName::Admin, PermissionType::Read, ObjectType::Binary),
        Target::User(&user),
        &h
    ));
}

#[test]
fn admin_never_matches_other_role_names() {
    let h = EntityHierarchy::default();
    for name in [RoleName::Level1Admin, RoleName::UserAdmin, RoleName::User, RoleName::Any] {
        assert!(!Role::Admin.compare(&PermissionRequirement::new(name), Target::None, &h));
    }
}

#[test]
fn admin_rights_cannot_be_set() {
    let mut role = Role::Admin;
    let err = role.set_right("L1", [RoleRight::Read]).unwrap_err();
    assert!(matches!(err, AnchorAuthError::Configuration(_)));
    assert!(role.allowed_rights().is_empty());
    assert!(role.anchor_types().is_none());
    assert!(role.rights().is_none());
}

// ============================================================================
// Level1Admin
// ============================================================================

#[test]
fn level1_admin_reads_and_writes_structural_entities() {
    let role = Role::with_right(RoleName::Level1Admin, "L1", [RoleRight::Read, RoleRight::Write]).unwrap();
    let h = hierarchy(Some("L1"), Some("L2"));

    assert!(role.compare(&req(RoleName::Level1Admin, PermissionType::Read), Target::Entity(&l1()), &h));
    assert!(role.compare(&req(RoleName::Level1Admin, PermissionType::Write), Target::Entity(&l2()), &h));
}

#[test]
fn level1_admin_only_holds_the_requested_right() {
    let role = Role::with_right(RoleName::Level1Admin, "L1", [RoleRight::Read]).unwrap();
    let h = hierarchy(Some("L1"), Some("L2"));

    assert!(role.compare(&req(RoleName::Level1Admin, PermissionType::Read), Target::Entity(&l2()), &h));
    assert!(!role.compare(&req(RoleName::Level1Admin, PermissionType::Write), Target::Entity(&l2()), &h));
}

#[test]
fn level1_admin_never_covers_data_or_binaries() {
    // Full rights at the right anchor still do not reach content
    let role = Role::with_right(RoleName::Level1Admin, "L1", [RoleRight::Read, RoleRight::Write]).unwrap();
    let h = hierarchy(Some("L1"), Some("L2"));
    let d = data(Some(EntityState::Published));

    assert!(!role.compare(&req(RoleName::Level1Admin, PermissionType::Read), Target::Entity(&d), &h));
    let binary = PermissionRequirement::of(RoleName::Level1Admin, PermissionType::Read, ObjectType::Binary);
    assert!(!role.compare(&binary, Target::Entity(&d), &h));
}

#[test]
fn level1_admin_needs_anchor_and_entity_target() {
    let role = Role::with_right(RoleName::Level1Admin, "L1", [RoleRight::Read]).unwrap();
    let user = User::new("alice");
    let r = req(RoleName::Level1Admin, PermissionType::Read);

    assert!(!role.compare(&r, Target::Entity(&l2()), &hierarchy(None, Some("L2"))));
    assert!(!role.compare(&r, Target::Entity(&l2()), &hierarchy(Some("OTHER"), Some("L2"))));
    assert!(!role.compare(&r, Target::User(&user), &hierarchy(Some("L1"), None)));
    assert!(!role.compare(&r, Target::None, &hierarchy(Some("L1"), None)));
}

#[test]
fn level1_admin_without_permission_type_passes_on_anchor() {
    let role = Role::with_right(RoleName::Level1Admin, "L1", [RoleRight::Read]).unwrap();
    let r = PermissionRequirement::new(RoleName::Level1Admin);
    assert!(role.compare(&r, Target::Entity(&l1()), &hierarchy(Some("L1"), Some("L1"))));
}

// ============================================================================
// UserAdmin
// ============================================================================

#[test]
fn user_admin_by_name_or_all_users() {
    let alice = User::new("alice");
    let bob = User::new("bob");
    let h = EntityHierarchy::default();

    let own = Role::with_right(RoleName::UserAdmin, "alice", [RoleRight::Read]).unwrap();
    assert!(own.compare(&req(RoleName::UserAdmin, PermissionType::Read), Target::User(&alice), &h));
    assert!(!own.compare(&req(RoleName::UserAdmin, PermissionType::Write), Target::User(&alice), &h));
    assert!(!own.compare(&req(RoleName::UserAdmin, PermissionType::Read), Target::User(&bob), &h));

    let all = Role::with_right(RoleName::UserAdmin, "", [RoleRight::Write]).unwrap();
    assert!(all.compare(&req(RoleName::UserAdmin, PermissionType::Write), Target::User(&bob), &h));
    assert!(!all.compare(&req(RoleName::UserAdmin, PermissionType::Read), Target::User(&bob), &h));
}

#[test]
fn user_admin_combines_own_and_all_users_entries() {
    let mut role = Role::with_right(RoleName::UserAdmin, "alice", [RoleRight::Read]).unwrap();
    role.set_right("", [RoleRight::Write]).unwrap();
    let alice = User::new("alice");
    let h = EntityHierarchy::default();

    assert!(role.compare(&req(RoleName::UserAdmin, PermissionType::Read), Target::User(&alice), &h));
    assert!(role.compare(&req(RoleName::UserAdmin, PermissionType::Write), Target::User(&alice), &h));
}

#[test]
fn user_admin_ignores_entity_targets() {
    let role = Role::with_right(RoleName::UserAdmin, "", [RoleRight::Read, RoleRight::Write]).unwrap();
    let h = hierarchy(Some("L1"), Some("L2"));
    assert!(!role.compare(&req(RoleName::UserAdmin, PermissionType::Read), Target::Entity(&l1()), &h));
}

// ============================================================================
// User
// ============================================================================

#[test]
fn user_role_pending_metadata_scenario() {
    let role = Role::with_right(RoleName::User, "L2", [RoleRight::ReadPendingMetadata]).unwrap();
    let h = hierarchy(Some("L1"), Some("L2"));

    let pending = data(Some(EntityState::Pending));
    assert!(role.compare(&req(RoleName::User, PermissionType::Read), Target::Entity(&pending), &h));

    let submitted = data(Some(EntityState::Submitted));
    assert!(!role.compare(&req(RoleName::User, PermissionType::Read), Target::Entity(&submitted), &h));
}

#[test]
fn user_role_defaults_missing_state_to_pending() {
    let role = Role::with_right(RoleName::User, "L2", [RoleRight::WritePendingBinary]).unwrap();
    let h = hierarchy(Some("L1"), Some("L2"));
    let stateless = data(None);

    let write_binary = PermissionRequirement::of(RoleName::User, PermissionType::Write, ObjectType::Binary);
    assert!(role.compare(&write_binary, Target::Entity(&stateless), &h));
    // Metadata column is a different token
    assert!(!role.compare(&req(RoleName::User, PermissionType::Write), Target::Entity(&stateless), &h));
}

#[test]
fn user_role_on_own_anchor_uses_level2_tokens_only() {
    let h = hierarchy(Some("L1"), Some("L2"));
    let matrix_only = Role::with_right(
        RoleName::User,
        "L2",
        [RoleRight::ReadPendingMetadata, RoleRight::ReadPublishedMetadata],
    )
    .unwrap();
    assert!(!matrix_only.compare(&req(RoleName::User, PermissionType::Read), Target::Entity(&l2()), &h));

    let level2 = Role::with_right(RoleName::User, "L2", [RoleRight::ReadLevel2]).unwrap();
    assert!(level2.compare(&req(RoleName::User, PermissionType::Read), Target::Entity(&l2()), &h));
    assert!(!level2.compare(&req(RoleName::User, PermissionType::Write), Target::Entity(&l2()), &h));

    // Level2 tokens never reach content below the anchor
    let pending = data(Some(EntityState::Pending));
    assert!(!level2.compare(&req(RoleName::User, PermissionType::Read), Target::Entity(&pending), &h));
}

#[test]
fn user_role_matrix_selects_one_token() {
    let role = Role::with_right(RoleName::User, "L2", [RoleRight::WriteSubmittedBinary]).unwrap();
    let h = hierarchy(Some("L1"), Some("L2"));
    let submitted = data(Some(EntityState::Submitted));

    let ok = PermissionRequirement::of(RoleName::User, PermissionType::Write, ObjectType::Binary);
    assert!(role.compare(&ok, Target::Entity(&submitted), &h));

    let read = PermissionRequirement::of(RoleName::User, PermissionType::Read, ObjectType::Binary);
    assert!(!role.compare(&read, Target::Entity(&submitted), &h));

    let other = PermissionRequirement::of(RoleName::User, PermissionType::Write, ObjectType::Right);
    assert!(!role.compare(&other, Target::Entity(&submitted), &h));
}

#[test]
fn user_role_needs_object_type_and_anchor() {
    let role = Role::with_right(RoleName::User, "L2", [RoleRight::ReadPendingMetadata]).unwrap();
    let pending = data(Some(EntityState::Pending));

    let no_object = PermissionRequirement::new(RoleName::User).with_permission(PermissionType::Read);
    assert!(!role.compare(&no_object, Target::Entity(&pending), &hierarchy(Some("L1"), Some("L2"))));
    assert!(!role.compare(&req(RoleName::User, PermissionType::Read), Target::Entity(&pending), &hierarchy(Some("L1"), None)));
    assert!(!role.compare(
        &req(RoleName::User, PermissionType::Read),
        Target::Entity(&pending),
        &hierarchy(Some("L1"), Some("OTHER"))
    ));
}

#[test]
fn user_role_without_permission_type() {
    let role = Role::with_right(RoleName::User, "L2", [RoleRight::ReadPendingMetadata]).unwrap();
    let h = hierarchy(Some("L1"), Some("L2"));
    let r = PermissionRequirement::new(RoleName::User).with_object(ObjectType::Entity);

    // Own anchor passes, content below needs a permission type for the matrix
    assert!(role.compare(&r, Target::Entity(&l2()), &h));
    assert!(!role.compare(&r, Target::Entity(&data(None)), &h));
}

// ============================================================================
// Rights mutation
// ============================================================================

#[test]
fn set_right_rejects_disallowed_rights_unchanged() {
    let mut role = Role::with_right(RoleName::Level1Admin, "L1", [RoleRight::Read]).unwrap();
    let before = role.clone();

    let err = role.set_right("L1", [RoleRight::Write, RoleRight::ReadPendingMetadata]).unwrap_err();
    assert!(matches!(err, AnchorAuthError::Validation(_)));
    assert_eq!(role, before);

    let mut user_role = Role::new(RoleName::User).unwrap();
    assert!(user_role.set_right("L2", [RoleRight::Read]).is_err());
    assert!(user_role.rights().unwrap().is_empty());
}

#[test]
fn set_right_replaces_and_is_idempotent() {
    let mut role = Role::with_right(RoleName::User, "L2", [RoleRight::ReadLevel2]).unwrap();
    role.set_right("L2", [RoleRight::WriteLevel2]).unwrap();
    let once = role.clone();
    role.set_right("L2", [RoleRight::WriteLevel2]).unwrap();

    assert_eq!(role, once);
    assert_eq!(role.right("L2").unwrap().len(), 1);
    assert!(role.right("L2").unwrap().contains(&RoleRight::WriteLevel2));
}

#[test]
fn set_right_with_empty_set_removes_entry() {
    let mut role = Role::with_right(RoleName::UserAdmin, "alice", [RoleRight::Read]).unwrap();
    role.set_right("alice", Vec::<RoleRight>::new()).unwrap();
    assert!(!role.has_right("alice"));
    assert!(role.rights().unwrap().is_empty());
}

#[test]
fn any_is_not_a_role() {
    assert!(Role::new(RoleName::Any).is_err());
}

#[test]
fn purge_anchor_detaches_emptied_roles() {
    let mut user = User::new("u2");
    user.set_role(Role::with_right(RoleName::Level1Admin, "A1", [RoleRight::Read, RoleRight::Write]).unwrap());
    let mut keep = Role::with_right(RoleName::User, "L2", [RoleRight::ReadLevel2]).unwrap();
    keep.set_right("A1", [RoleRight::WriteLevel2]).unwrap();
    user.set_role(keep);

    assert!(user.purge_anchor("A1"));
    assert!(!user.has_role(RoleName::Level1Admin));
    let remaining = user.role(RoleName::User).unwrap();
    assert!(remaining.has_right("L2"));
    assert!(!remaining.has_right("A1"));

    assert!(!user.purge_anchor("A1"));
}
