// tests/nucleo_client_tests.rs

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use energia_backend::{
    common::error::AppError,
    services::{nucleo_client::NucleoSettings, NucleoClient},
};

fn settings(url: String) -> NucleoSettings {
    NucleoSettings {
        url,
        token: "token-teste".into(),
        email: "sync@qroo.gob.mx".into(),
        password: "segredo".into(),
        timeout: Duration::from_secs(2),
    }
}

#[tokio::test]
async fn fetch_posts_credentials_and_maps_the_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/datos"))
        .and(header("authorization", "Bearer token-teste"))
        .and(body_json(json!({ "email": "sync@qroo.gob.mx", "password": "segredo" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "datosTablas": {
                "h25_sector": [{ "id": 1, "nombre": "Educación", "descripcion": "" }],
                "comedatos_institucion": [[{
                    "Nombre_Institucion": "Secretaría de Educación",
                    "Nombre_Encargado": "Luis",
                    "ApellidoPaterno": "Canul",
                    "Email": "luis.canul@qroo.gob.mx"
                }]]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = NucleoClient::new(settings(format!("{}/api/datos", server.uri()))).unwrap();
    let data = client.fetch().await.unwrap();

    assert_eq!(data.sectors[0].name, "Educación");
    assert_eq!(data.agencies[0].name, "Secretaría de Educación");
    assert_eq!(data.agencies[0].head, "Luis Canul");
    assert_eq!(data.agencies[0].email.as_deref(), Some("luis.canul@qroo.gob.mx"));
}

#[tokio::test]
async fn server_error_is_an_upstream_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("falha"))
        .mount(&server)
        .await;

    let client = NucleoClient::new(settings(server.uri())).unwrap();
    let err = client.fetch().await.unwrap_err();

    assert!(matches!(err, AppError::UpstreamFailure(_)));
}

#[tokio::test]
async fn non_json_body_is_an_upstream_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>manutenção</html>"))
        .mount(&server)
        .await;

    let client = NucleoClient::new(settings(server.uri())).unwrap();
    assert!(matches!(client.fetch().await, Err(AppError::UpstreamFailure(_))));
}

#[tokio::test]
async fn slow_server_hits_the_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let mut slow = settings(server.uri());
    slow.timeout = Duration::from_millis(200);
    let client = NucleoClient::new(slow).unwrap();

    assert!(matches!(client.fetch().await, Err(AppError::UpstreamFailure(_))));
}
