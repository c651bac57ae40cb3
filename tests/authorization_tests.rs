// tests/authorization_tests.rs

use std::sync::Arc;

use energia_backend::{
    common::error::AppError,
    db::{AssignmentGraph, MemoryStore},
    models::rbac::{AssignmentInput, Permission},
    services::AuthorizationService,
};

const GLOBAL_UNIT: i64 = 1;
const SUPER_ADMIN: i64 = 1;
const READER: i64 = 2;
const UNIT_ADMIN: i64 = 3;

async fn seeded() -> (Arc<MemoryStore>, AuthorizationService) {
    let store = Arc::new(MemoryStore::with_catalog().await);
    store.add_unit(GLOBAL_UNIT).await;
    store.add_role(SUPER_ADMIN, &Permission::ALL).await;
    store.add_role(READER, &[Permission::ViewDashboard]).await;
    store
        .add_role(
            UNIT_ADMIN,
            &[Permission::EditUnits, Permission::ViewBudgets, Permission::UploadConsumption],
        )
        .await;

    let authz = AuthorizationService::new(store.clone(), GLOBAL_UNIT);
    (store, authz)
}

#[tokio::test]
async fn super_admin_and_reader_scenario() {
    let (store, authz) = seeded().await;
    store.assign(1, GLOBAL_UNIT, SUPER_ADMIN).await;
    store.assign(2, 7, READER).await;

    assert!(authz.has_global_permission(1, Permission::CreateUnits).await.unwrap());
    assert!(!authz.has_permission_for(2, Permission::AssignBudgets, 7).await.unwrap());
    assert!(authz.has_permission_for(2, Permission::ViewDashboard, 7).await.unwrap());
}

#[tokio::test]
async fn no_assignment_at_a_unit_denies_every_permission() {
    let (store, authz) = seeded().await;
    store.assign(5, 3, UNIT_ADMIN).await;
    store.add_unit(4).await;

    for permission in Permission::ALL {
        assert!(!authz.has_permission_for(5, permission, 4).await.unwrap());
    }
}

#[tokio::test]
async fn assigning_then_revoking_flips_the_answer() {
    let (store, authz) = seeded().await;
    store.add_user(9).await;
    store.add_unit(7).await;

    assert!(!authz.has_permission_for(9, Permission::EditUnits, 7).await.unwrap());

    store
        .replace_assignments(9, &[AssignmentInput { role_id: UNIT_ADMIN, unit_id: 7 }])
        .await
        .unwrap();
    assert!(authz.has_permission_for(9, Permission::EditUnits, 7).await.unwrap());

    store.replace_assignments(9, &[]).await.unwrap();
    assert!(!authz.has_permission_for(9, Permission::EditUnits, 7).await.unwrap());
}

#[tokio::test]
async fn global_permission_ignores_assignments_elsewhere() {
    let (store, authz) = seeded().await;
    // Super Admin numa dependência comum não vale como global
    store.assign(4, 7, SUPER_ADMIN).await;

    assert!(!authz.has_global_permission(4, Permission::CreateUnits).await.unwrap());
    assert!(authz.has_permission_for(4, Permission::CreateUnits, 7).await.unwrap());

    store.assign(4, GLOBAL_UNIT, READER).await;
    assert!(authz.has_global_permission(4, Permission::ViewDashboard).await.unwrap());
    assert!(!authz.has_global_permission(4, Permission::CreateUnits).await.unwrap());
}

#[tokio::test]
async fn viewing_a_unit_only_needs_membership() {
    let (store, authz) = seeded().await;
    store.assign(2, 7, READER).await;
    store.add_unit(8).await;

    // O cargo não tem nenhuma permissão ligada a dependências, mas a visão vale
    assert!(authz.can_view_unit(2, 7).await.unwrap());
    assert!(!authz.has_permission_for(2, Permission::EditUnits, 7).await.unwrap());
    assert!(!authz.can_view_unit(2, 8).await.unwrap());

    assert!(matches!(authz.ensure_view_unit(2, 8).await, Err(AppError::UnitAccessDenied)));
}

#[tokio::test]
async fn anywhere_matches_global_or_any_assigned_unit() {
    let (store, authz) = seeded().await;
    store.assign(6, 7, READER).await;
    assert!(!authz.has_permission_anywhere(6, Permission::UploadConsumption).await.unwrap());

    store.assign(6, 8, UNIT_ADMIN).await;
    assert!(authz.has_permission_anywhere(6, Permission::UploadConsumption).await.unwrap());

    store.assign(10, GLOBAL_UNIT, SUPER_ADMIN).await;
    assert!(authz.has_permission_anywhere(10, Permission::UploadConsumption).await.unwrap());
}

#[tokio::test]
async fn unknown_permission_names_are_denied_not_errors() {
    let (store, authz) = seeded().await;
    store.assign(1, GLOBAL_UNIT, SUPER_ADMIN).await;
    store.add_role_with_keys(20, &["ver-dependencia_typo"]).await;
    store.assign(1, 7, 20).await;

    assert!(!authz.has_named_permission_for(1, "permiso_inexistente", None).await.unwrap());
    assert!(!authz.has_named_permission_for(1, "ver-dependencia_typo", Some(7)).await.unwrap());
    assert!(authz.has_named_permission_for(1, "crear_dependencias", None).await.unwrap());
}

#[tokio::test]
async fn permission_added_to_a_role_is_seen_on_the_next_check() {
    let (store, authz) = seeded().await;
    store.assign(2, 7, READER).await;
    assert!(!authz.has_permission_for(2, Permission::ViewBuildings, 7).await.unwrap());

    store.grant_to_role(READER, Permission::ViewBuildings).await;
    assert!(authz.has_permission_for(2, Permission::ViewBuildings, 7).await.unwrap());
}

#[tokio::test]
async fn ensure_variants_surface_forbidden_with_the_permission() {
    let (store, authz) = seeded().await;
    store.assign(2, 7, READER).await;

    let err = authz.ensure_for(2, Permission::AssignBudgets, 7).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(Permission::AssignBudgets)));

    let err = authz.ensure_global(2, Permission::ViewAllUsers).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(Permission::ViewAllUsers)));

    assert!(authz.ensure_for(2, Permission::ViewDashboard, 7).await.is_ok());
}

#[tokio::test]
async fn units_with_permission_skip_the_global_unit_and_other_roles() {
    let (store, authz) = seeded().await;
    store.assign(3, GLOBAL_UNIT, READER).await;
    store.assign(3, 7, READER).await;
    store.assign(3, 8, UNIT_ADMIN).await;
    store.assign(3, 9, READER).await;

    let mut units = authz.units_with_permission(3, Permission::ViewDashboard).await.unwrap();
    units.sort();
    assert_eq!(units, vec![7, 9]);
}
