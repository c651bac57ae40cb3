// tests/http_tests.rs
//
// Roteador completo sobre um banco criado por `#[sqlx::test]`.

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use sqlx::PgPool;
use tower::ServiceExt;

use energia_backend::{
    app::build_router,
    config::{AppConfig, AppState},
    services::{auth::issue_token, nucleo_client::NucleoSettings},
};

const SECRET: &str = "segredo-de-teste";

fn router(pool: PgPool) -> Router {
    let config = AppConfig {
        database_url: String::new(),
        jwt_secret: SECRET.to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        db_max_connections: 1,
        global_unit_id: 1,
        jwt_ttl_hours: 1,
        nucleo: NucleoSettings {
            url: String::new(),
            token: String::new(),
            email: String::new(),
            password: String::new(),
            timeout: Duration::from_secs(1),
        },
        sync_default_role: "Admin Dependencia".to_string(),
        sync_default_sector: "Administración Publica".to_string(),
    };
    build_router(AppState::new(config, pool))
}

async fn user_with_role_at_global(pool: &PgPool, username: &str, role: &str) -> i64 {
    let user_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO users (username, first_name, last_name, email, password_hash)
        VALUES ($1, 'Teste', 'Usuario', $1 || '@qroo.gob.mx', 'x')
        RETURNING id
        "#,
    )
    .bind(username)
    .fetch_one(pool)
    .await
    .unwrap();

    sqlx::query(
        "INSERT INTO user_unit_roles (user_id, unit_id, role_id) SELECT $1, 1, id FROM roles WHERE name = $2",
    )
    .bind(user_id)
    .bind(role)
    .execute(pool)
    .await
    .unwrap();

    user_id
}

fn post_unit(user_id: i64, body: &str) -> Request<Body> {
    let token = issue_token(SECRET, user_id, 1).unwrap();
    Request::post("/api/units")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn creating_units_is_refused_before_the_body_is_read(pool: PgPool) {
    let reader = user_with_role_at_global(&pool, "lector", "Lector").await;

    let resp = router(pool).oneshot(post_unit(reader, "{ not json")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn super_admin_creates_units(pool: PgPool) {
    let admin = user_with_role_at_global(&pool, "admin", "Super Admin").await;

    let resp = router(pool.clone())
        .oneshot(post_unit(admin, r#"{"name": "Secretaría de Movilidad"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let stored = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM org_units WHERE name = 'Secretaría de Movilidad'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn requests_without_a_token_are_unauthorized(pool: PgPool) {
    let req = Request::get("/api/units").body(Body::empty()).unwrap();

    let resp = router(pool).oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
