// tests/budget_tests.rs

use std::sync::Arc;

use rust_decimal::Decimal;

use energia_backend::{
    common::error::AppError,
    db::MemoryStore,
    models::{budget::CreateBudgetPayload, rbac::Permission},
    services::{AuthorizationService, BudgetService},
};

const FINANCE: i64 = 5;

async fn service() -> BudgetService {
    let store = Arc::new(MemoryStore::with_catalog().await);
    store
        .add_role(FINANCE, &[Permission::ViewBudgets, Permission::AssignBudgets])
        .await;
    store.assign(10, 5, FINANCE).await;
    store.add_unit(6).await;

    let authz = AuthorizationService::new(store.clone(), 1);
    BudgetService::new(store, authz)
}

fn payload(year: i32, quarter: i32, amount: i64) -> CreateBudgetPayload {
    CreateBudgetPayload { year, quarter, assigned_amount: Decimal::new(amount, 0) }
}

#[tokio::test]
async fn second_budget_for_the_same_quarter_conflicts() {
    let service = service().await;

    let first = service.create(10, 5, &payload(2025, 1, 100_000)).await.unwrap();
    let err = service.create(10, 5, &payload(2025, 1, 999)).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let budgets = service.list(10, 5).await.unwrap();
    assert_eq!(budgets, vec![first]);
    assert_eq!(budgets[0].assigned_amount, Decimal::new(100_000, 0));
}

#[tokio::test]
async fn other_quarters_are_accepted_and_listed_newest_first() {
    let service = service().await;

    service.create(10, 5, &payload(2025, 1, 10)).await.unwrap();
    service.create(10, 5, &payload(2025, 2, 20)).await.unwrap();
    service.create(10, 5, &payload(2024, 4, 30)).await.unwrap();

    let order: Vec<(i32, i32)> = service
        .list(10, 5)
        .await
        .unwrap()
        .iter()
        .map(|b| (b.year, b.quarter))
        .collect();
    assert_eq!(order, vec![(2025, 2), (2025, 1), (2024, 4)]);
}

#[tokio::test]
async fn assigning_without_the_permission_at_the_unit_is_forbidden() {
    let service = service().await;

    let err = service.create(10, 6, &payload(2025, 1, 10)).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(Permission::AssignBudgets)));

    let err = service.list(11, 5).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(Permission::ViewBudgets)));
}
