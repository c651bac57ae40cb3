// tests/assignment_tests.rs

use std::sync::Arc;

use energia_backend::{
    common::error::AppError,
    db::{AssignmentGraph, MemoryStore},
    models::rbac::{Assignment, AssignmentInput, Permission},
    services::AuthorizationService,
};

fn pair(role_id: i64, unit_id: i64) -> AssignmentInput {
    AssignmentInput { role_id, unit_id }
}

async fn store() -> MemoryStore {
    let store = MemoryStore::with_catalog().await;
    store.add_user(42).await;
    for unit in [1, 5, 7] {
        store.add_unit(unit).await;
    }
    store.add_role(2, &[Permission::ViewDashboard]).await;
    store.add_role(3, &[Permission::EditUnits]).await;
    store
}

#[tokio::test]
async fn replacing_twice_with_the_same_list_is_idempotent() {
    let store = store().await;
    let desired = [pair(2, 5), pair(3, 7)];

    let first = store.replace_assignments(42, &desired).await.unwrap();
    let second = store.replace_assignments(42, &desired).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}

#[tokio::test]
async fn stale_triples_go_and_new_ones_arrive() {
    let store = store().await;
    store.replace_assignments(42, &[pair(2, 5), pair(3, 7)]).await.unwrap();

    let result = store.replace_assignments(42, &[pair(3, 7), pair(2, 1)]).await.unwrap();

    let expected = vec![
        Assignment { user_id: 42, unit_id: 1, role_id: 2 },
        Assignment { user_id: 42, unit_id: 7, role_id: 3 },
    ];
    assert_eq!(result, expected);
}

#[tokio::test]
async fn duplicated_pairs_in_the_request_collapse() {
    let store = store().await;
    let result = store
        .replace_assignments(42, &[pair(2, 5), pair(2, 5), pair(2, 5)])
        .await
        .unwrap();
    assert_eq!(result.len(), 1);
}

#[tokio::test]
async fn invalid_pair_rejects_everything_and_keeps_the_old_state() {
    let store = store().await;
    store.replace_assignments(42, &[pair(2, 5)]).await.unwrap();

    let err = store
        .replace_assignments(42, &[pair(3, 7), pair(99, 5)])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::InvalidAssignment { role_id: 99, unit_id: 5, reason: "role_not_found" }
    ));

    let err = store.replace_assignments(42, &[pair(3, 404)]).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidAssignment { unit_id: 404, .. }));

    let current = store.assignments_for_user(42).await.unwrap();
    assert_eq!(current, vec![Assignment { user_id: 42, unit_id: 5, role_id: 2 }]);
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let store = store().await;
    let err = store.replace_assignments(7, &[pair(2, 5)]).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn other_users_are_untouched() {
    let store = store().await;
    store.assign(43, 5, 3).await;

    store.replace_assignments(42, &[]).await.unwrap();

    assert_eq!(store.assignments_for_user(43).await.unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_checks_see_either_the_old_or_the_new_set() {
    let store = Arc::new(store().await);
    store.replace_assignments(42, &[pair(3, 5)]).await.unwrap();
    let authz = AuthorizationService::new(store.clone(), 1);

    // Troca o cargo na dependência 5 por outro com a mesma permissão
    store.add_role(4, &[Permission::EditUnits]).await;

    let writer = {
        let store = store.clone();
        tokio::spawn(async move {
            for i in 0..50 {
                let role = if i % 2 == 0 { 4 } else { 3 };
                store.replace_assignments(42, &[pair(role, 5)]).await.unwrap();
            }
        })
    };

    for _ in 0..50 {
        assert!(authz.has_permission_for(42, Permission::EditUnits, 5).await.unwrap());
        tokio::task::yield_now().await;
    }
    writer.await.unwrap();
}
