// tests/postgres_tests.rs
//
// Rodam contra um PostgreSQL real: `#[sqlx::test]` cria um banco novo por teste
// a partir de DATABASE_URL e aplica as migrações (catálogo e unidade global inclusos).

use std::sync::Arc;

use rust_decimal::Decimal;
use sqlx::PgPool;

use energia_backend::{
    common::error::AppError,
    db::{
        AssignmentGraph, BudgetRepository, BudgetStore, BuildingRepository, ConsumptionRepository,
        DashboardRepository, RbacRepository, UnitRepository, UserRepository,
    },
    models::{
        budget::CreateBudgetPayload,
        dashboard::{AnnualQuery, TrendQuery},
        rbac::{Assignment, AssignmentInput},
    },
    services::{
        nucleo_client::{ExternalAgency, GovernmentData},
        AuthorizationService, ConsumptionService, DashboardService, SyncService, UnitService,
    },
};

const GLOBAL_UNIT: i64 = 1;

async fn insert_user(pool: &PgPool, username: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO users (username, first_name, last_name, email, password_hash)
        VALUES ($1, 'Teste', 'Usuario', $1 || '@qroo.gob.mx', 'x')
        RETURNING id
        "#,
    )
    .bind(username)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn insert_unit(pool: &PgPool, name: &str) -> i64 {
    sqlx::query_scalar::<_, i64>("INSERT INTO org_units (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn role_id(pool: &PgPool, name: &str) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT id FROM roles WHERE name = $1")
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn assign(pool: &PgPool, user_id: i64, unit_id: i64, role_id: i64) {
    sqlx::query("INSERT INTO user_unit_roles (user_id, unit_id, role_id) VALUES ($1, $2, $3)")
        .bind(user_id)
        .bind(unit_id)
        .bind(role_id)
        .execute(pool)
        .await
        .unwrap();
}

async fn count(pool: &PgPool, sql: &str, id: i64) -> i64 {
    sqlx::query_scalar::<_, i64>(sql).bind(id).fetch_one(pool).await.unwrap()
}

fn pair(role_id: i64, unit_id: i64) -> AssignmentInput {
    AssignmentInput { role_id, unit_id }
}

// ---
// Substituição do conjunto de atribuições
// ---

#[sqlx::test(migrations = "./migrations")]
async fn replace_set_keeps_unchanged_rows_and_swaps_the_rest(pool: PgPool) {
    let repo = RbacRepository::new(pool.clone());
    let user = insert_user(&pool, "ana").await;
    let unit_a = insert_unit(&pool, "Secretaría de Salud").await;
    let unit_b = insert_unit(&pool, "Secretaría de Educación").await;
    let admin = role_id(&pool, "Admin Dependencia").await;
    let reader = role_id(&pool, "Lector").await;
    assign(&pool, user, unit_a, admin).await;
    assign(&pool, user, unit_a, reader).await;

    let result = repo
        .replace_assignments(user, &[pair(reader, unit_a), pair(admin, unit_b), pair(admin, unit_b)])
        .await
        .unwrap();

    let mut expected = vec![
        Assignment { user_id: user, unit_id: unit_a, role_id: reader },
        Assignment { user_id: user, unit_id: unit_b, role_id: admin },
    ];
    expected.sort();
    assert_eq!(result, expected);
    assert_eq!(repo.assignments_for_user(user).await.unwrap(), expected);
}

#[sqlx::test(migrations = "./migrations")]
async fn empty_replace_set_revokes_everything(pool: PgPool) {
    let repo = RbacRepository::new(pool.clone());
    let user = insert_user(&pool, "luis").await;
    let other = insert_user(&pool, "rosa").await;
    let unit = insert_unit(&pool, "Instituto de Cultura").await;
    let reader = role_id(&pool, "Lector").await;
    assign(&pool, user, unit, reader).await;
    assign(&pool, other, unit, reader).await;

    let result = repo.replace_assignments(user, &[]).await.unwrap();

    assert!(result.is_empty());
    assert!(!repo.has_membership(user, unit).await.unwrap());
    assert!(repo.has_membership(other, unit).await.unwrap());
}

#[sqlx::test(migrations = "./migrations")]
async fn invalid_pair_leaves_the_stored_set_untouched(pool: PgPool) {
    let repo = RbacRepository::new(pool.clone());
    let user = insert_user(&pool, "marta").await;
    let unit = insert_unit(&pool, "Secretaría de Turismo").await;
    let reader = role_id(&pool, "Lector").await;
    assign(&pool, user, unit, reader).await;

    let err = repo
        .replace_assignments(user, &[pair(reader, GLOBAL_UNIT), pair(reader, 9_999)])
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidAssignment { unit_id: 9_999, .. }));
    assert_eq!(
        repo.assignments_for_user(user).await.unwrap(),
        vec![Assignment { user_id: user, unit_id: unit, role_id: reader }]
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn replace_set_for_unknown_user_is_not_found(pool: PgPool) {
    let repo = RbacRepository::new(pool.clone());
    let reader = role_id(&pool, "Lector").await;

    let err = repo.replace_assignments(4_242, &[pair(reader, GLOBAL_UNIT)]).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

// ---
// Orçamentos
// ---

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_budget_conflicts_and_keeps_the_first_row(pool: PgPool) {
    let repo = BudgetRepository::new(pool.clone());
    let unit = insert_unit(&pool, "Secretaría de Finanzas").await;
    let payload = |amount: i64| CreateBudgetPayload {
        year: 2025,
        quarter: 2,
        assigned_amount: Decimal::new(amount, 0),
    };

    let first = repo.create(unit, &payload(150_000)).await.unwrap();
    let err = repo.create(unit, &payload(1)).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    assert_eq!(repo.list_for_unit(unit).await.unwrap(), vec![first]);

    let missing = repo.create(9_999, &payload(10)).await.unwrap_err();
    assert!(matches!(missing, AppError::NotFound(_)));
}

// ---
// Eliminação de dependência
// ---

fn unit_service(pool: &PgPool) -> UnitService {
    let rbac_repo = RbacRepository::new(pool.clone());
    let authz = AuthorizationService::new(Arc::new(rbac_repo.clone()), GLOBAL_UNIT);
    UnitService::new(
        UnitRepository::new(pool.clone()),
        BuildingRepository::new(pool.clone()),
        BudgetRepository::new(pool.clone()),
        ConsumptionRepository::new(pool.clone()),
        rbac_repo,
        authz,
        pool.clone(),
    )
}

async fn insert_building(pool: &PgPool, unit_id: i64, name: &str) -> i64 {
    sqlx::query_scalar::<_, i64>("INSERT INTO buildings (unit_id, name) VALUES ($1, $2) RETURNING id")
        .bind(unit_id)
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn insert_record(pool: &PgPool, building_id: i64, month: i32) {
    sqlx::query(
        r#"
        INSERT INTO consumption_records (building_id, year, month, consumption_kwh, total_cost)
        VALUES ($1, 2025, $2, 1200, 3400)
        "#,
    )
    .bind(building_id)
    .bind(month)
    .execute(pool)
    .await
    .unwrap();
}

#[sqlx::test(migrations = "./migrations")]
async fn deleting_a_unit_removes_everything_it_owns(pool: PgPool) {
    let service = unit_service(&pool);
    let actor = insert_user(&pool, "admin").await;
    let member = insert_user(&pool, "pedro").await;
    let super_admin = role_id(&pool, "Super Admin").await;
    let reader = role_id(&pool, "Lector").await;

    let doomed = insert_unit(&pool, "Comisión de Agua").await;
    let kept = insert_unit(&pool, "Secretaría de Obras").await;
    assign(&pool, actor, doomed, super_admin).await;
    assign(&pool, member, doomed, reader).await;
    assign(&pool, member, kept, reader).await;

    let building = insert_building(&pool, doomed, "Planta Norte").await;
    insert_record(&pool, building, 1).await;
    insert_record(&pool, building, 2).await;
    let kept_building = insert_building(&pool, kept, "Oficinas Centrales").await;
    insert_record(&pool, kept_building, 1).await;
    sqlx::query("INSERT INTO budgets (unit_id, year, quarter, assigned_amount) VALUES ($1, 2025, 1, 500)")
        .bind(doomed)
        .execute(&pool)
        .await
        .unwrap();

    service.delete(actor, doomed).await.unwrap();

    assert_eq!(count(&pool, "SELECT COUNT(*) FROM org_units WHERE id = $1", doomed).await, 0);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM buildings WHERE unit_id = $1", doomed).await, 0);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM budgets WHERE unit_id = $1", doomed).await, 0);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM user_unit_roles WHERE unit_id = $1", doomed).await, 0);
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM consumption_records WHERE building_id = $1", building).await,
        0
    );

    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM consumption_records WHERE building_id = $1", kept_building).await,
        1
    );
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM user_unit_roles WHERE user_id = $1", member).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn global_unit_cannot_be_deleted(pool: PgPool) {
    let service = unit_service(&pool);
    let actor = insert_user(&pool, "root").await;
    assign(&pool, actor, GLOBAL_UNIT, role_id(&pool, "Super Admin").await).await;

    let err = service.delete(actor, GLOBAL_UNIT).await.unwrap_err();

    assert!(matches!(err, AppError::BusinessRule(_)));
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM org_units WHERE id = $1", GLOBAL_UNIT).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn deleting_without_permission_at_the_unit_is_forbidden(pool: PgPool) {
    let service = unit_service(&pool);
    let actor = insert_user(&pool, "lector").await;
    let unit = insert_unit(&pool, "Secretaría de Ecología").await;
    assign(&pool, actor, unit, role_id(&pool, "Lector").await).await;

    let err = service.delete(actor, unit).await.unwrap_err();

    assert!(matches!(err, AppError::Forbidden(_)));
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM org_units WHERE id = $1", unit).await, 1);
}

// ---
// Sincronização
// ---

fn sync_service(pool: &PgPool) -> SyncService {
    SyncService::new(
        UserRepository::new(pool.clone()),
        RbacRepository::new(pool.clone()),
        UnitRepository::new(pool.clone()),
        pool.clone(),
        "Admin Dependencia".to_string(),
        "Administración Publica".to_string(),
        GLOBAL_UNIT,
    )
}

fn agency(name: &str, head: &str, email: &str) -> ExternalAgency {
    ExternalAgency {
        name: name.to_string(),
        head: head.to_string(),
        email: Some(email.to_string()),
        phone: None,
        address: String::new(),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn sync_never_binds_heads_to_the_global_unit(pool: PgPool) {
    let data = GovernmentData {
        sectors: vec![],
        agencies: vec![agency("Gobierno del Estado", "Ana López", "ana@qroo.gob.mx")],
    };

    let report = sync_service(&pool).run(&data).await.unwrap();

    assert_eq!(report.units_created, 1);
    assert_eq!(report.units_matched, 0);
    assert_eq!(report.assignments_added, 1);
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM user_unit_roles WHERE unit_id = $1", GLOBAL_UNIT).await,
        0
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn sync_matches_agency_names_literally(pool: PgPool) {
    let existing = insert_unit(&pool, "Secretaría de Salud").await;
    let data = GovernmentData {
        sectors: vec![],
        agencies: vec![
            agency("de Salud", "Luis Canul", "luis@qroo.gob.mx"),
            agency("%", "Rosa May", "rosa@qroo.gob.mx"),
        ],
    };

    let report = sync_service(&pool).run(&data).await.unwrap();

    assert_eq!(report.units_matched, 1);
    assert_eq!(report.units_created, 1);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM user_unit_roles WHERE unit_id = $1", existing).await, 1);
    assert_eq!(
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM org_units WHERE name = '%'")
            .fetch_one(&pool)
            .await
            .unwrap(),
        1
    );
}

// ---
// Painel
// ---

fn dashboard_service(pool: &PgPool) -> DashboardService {
    let authz = AuthorizationService::new(Arc::new(RbacRepository::new(pool.clone())), GLOBAL_UNIT);
    DashboardService::new(DashboardRepository::new(pool.clone()), authz)
}

#[sqlx::test(migrations = "./migrations")]
async fn dashboard_analyses_stay_inside_the_requested_unit(pool: PgPool) {
    let service = dashboard_service(&pool);
    let reader = insert_user(&pool, "lector").await;
    let health = insert_unit(&pool, "Secretaría de Salud").await;
    let culture = insert_unit(&pool, "Instituto de Cultura").await;
    assign(&pool, reader, health, role_id(&pool, "Lector").await).await;

    let hospital = insert_building(&pool, health, "Hospital General").await;
    insert_record(&pool, hospital, 1).await;
    insert_record(&pool, hospital, 5).await;
    let museum = insert_building(&pool, culture, "Museo Maya").await;
    insert_record(&pool, museum, 1).await;
    sqlx::query("INSERT INTO budgets (unit_id, year, quarter, assigned_amount) VALUES ($1, 2025, 1, 5000)")
        .bind(health)
        .execute(&pool)
        .await
        .unwrap();

    let query = AnnualQuery { unit_id: Some(health), year: Some(2025) };
    let report = service.get_budget_vs_spend(reader, &query).await.unwrap();
    assert_eq!(report.quarters[0].budget, Decimal::new(5000, 0));
    assert_eq!(report.quarters[0].spent, Decimal::new(3400, 0));
    assert_eq!(report.quarters[1].spent, Decimal::new(3400, 0));
    assert_eq!(report.balance, Decimal::new(-1800, 0));

    let trend = service
        .get_trend(reader, &TrendQuery { unit_id: Some(health), window: Some(2) })
        .await
        .unwrap();
    assert_eq!(trend.points.len(), 2);
    assert_eq!(trend.points[1].rolling_kwh, Decimal::new(1200, 0));

    let resources = service.get_resources(reader).await.unwrap();
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0].id, health);
    assert_eq!(resources[0].buildings.len(), 1);

    let other = AnnualQuery { unit_id: Some(culture), year: Some(2025) };
    assert!(matches!(
        service.get_building_ranking(reader, &other).await,
        Err(AppError::Forbidden(_))
    ));
}

// ---
// Carga massiva de consumos
// ---

fn consumption_service(pool: &PgPool) -> ConsumptionService {
    let authz = AuthorizationService::new(Arc::new(RbacRepository::new(pool.clone())), GLOBAL_UNIT);
    ConsumptionService::new(
        ConsumptionRepository::new(pool.clone()),
        BuildingRepository::new(pool.clone()),
        authz,
        pool.clone(),
    )
}

#[sqlx::test(migrations = "./migrations")]
async fn import_reports_the_rows_it_stored(pool: PgPool) {
    let unit = insert_unit(&pool, "Secretaría de Obras").await;
    let building = insert_building(&pool, unit, "Almacén Central").await;
    let uploader = insert_user(&pool, "capturista").await;
    assign(&pool, uploader, unit, role_id(&pool, "Admin Dependencia").await).await;

    let csv = format!(
        "id_edificio,anio,mes,consumo_kwh,costo_total\n\
         {building},2025,1,1200.5,3400\n\
         {building},2025,2,980,2710.25\n"
    );

    let summary = consumption_service(&pool)
        .import(uploader, Some("consumos.csv"), csv.as_bytes())
        .await
        .unwrap();

    assert_eq!(summary.inserted, 2);
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM consumption_records WHERE building_id = $1", building).await,
        2
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn rejected_import_stores_nothing(pool: PgPool) {
    let unit = insert_unit(&pool, "Secretaría de Obras").await;
    let building = insert_building(&pool, unit, "Almacén Central").await;
    let uploader = insert_user(&pool, "capturista").await;
    assign(&pool, uploader, unit, role_id(&pool, "Admin Dependencia").await).await;

    let csv = format!(
        "id_edificio,anio,mes,consumo_kwh,costo_total\n\
         {building},2025,1,1200,3400\n\
         999999,2025,1,1200,3400\n"
    );

    let result = consumption_service(&pool)
        .import(uploader, Some("consumos.csv"), csv.as_bytes())
        .await;

    assert!(matches!(result, Err(AppError::ImportRejected(errors)) if errors.len() == 1));
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM consumption_records WHERE building_id = $1", building).await,
        0
    );
}
