// tests/router_tests.rs

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use tower::ServiceExt;
use virtual_lab::{
    catalog::Catalog,
    config::{Config, ExportMode, StorageBackend},
    routes,
    state::AppState,
    storage::{MemoryBlobStore, MemoryStateStore},
};

fn app() -> Router {
    let config = Config {
        storage_backend: StorageBackend::Memory,
        database_url: None,
        blob_dir: std::env::temp_dir().join("virtual-lab-router-tests"),
        public_base_url: "http://localhost:5000/files/".to_string(),
        export_mode: ExportMode::Blob,
        catalog_path: None,
        store_timeout: Duration::from_secs(5),
        port: 0,
        rust_log: "error".to_string(),
    };
    let state = AppState::new(
        config,
        Arc::new(MemoryStateStore::new()),
        Arc::new(MemoryBlobStore::new()),
        Catalog::builtin().unwrap(),
    );
    routes::create_router(state)
}

#[tokio::test]
async fn root_reports_liveness() {
    let response = app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(json["message"].is_string());
}

#[tokio::test]
async fn cors_preflight_allows_any_origin() {
    let response = app()
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/quiz")
                .header(header::ORIGIN, "https://labor.example.org")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn empty_export_is_header_only() {
    let response = app()
        .oneshot(Request::builder().uri("/api/export").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(
        std::str::from_utf8(&body).unwrap(),
        "Matrikelnummer,Quiz-Punkte,Optimaler Bitumengehalt,Maximale Raumdichte,Datum\n"
    );
}

#[tokio::test]
async fn unknown_question_is_recorded_without_points() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/quiz")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            r#"{"userId": "777", "raum": "Kantine", "auswahl": "Schnitzel"}"#,
        ))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/beantworteteFragen/777")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["fragen"][0]["frage"], "Unbekannte Frage");
    assert_eq!(json["fragen"][0]["richtigeAntwort"], "Keine Daten");
    assert_eq!(json["fragen"][0]["punkte"], 0);
}
