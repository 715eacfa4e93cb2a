use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use sadayizm_core::MemoryTrollRepository;
use sadayizm_server::config::{EloConfig, ServerConfig};
use sadayizm_server::elo_client::EloClient;
use sadayizm_server::{build_router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

fn memory_app() -> Router {
    let elo = EloClient::new(EloConfig::default()).unwrap();
    build_router(AppState::new(Box::new(MemoryTrollRepository::new()), elo))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, json)
}

async fn create(app: &Router, nick: &str, steam_id: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/trolls",
        Some(json!({ "nick": nick, "steamId": steam_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

#[tokio::test]
async fn get_on_empty_store_returns_empty_list() {
    let app = memory_app();
    let (status, body) = send(&app, Method::GET, "/api/trolls", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn post_creates_record_with_defaults_listed_first() {
    let app = memory_app();
    create(&app, "older", "1").await;

    let created = create(&app, "foo", "123").await;
    assert!(created["id"].is_i64());
    assert_eq!(created["nick"], "foo");
    assert_eq!(created["steam_id"], "123");
    assert_eq!(created["steam_id64"], "No resuelto");
    assert_eq!(created["reason"], "Sin razón especificada");
    assert_eq!(created["faceit_url"], "");

    let (_, listed) = send(&app, Method::GET, "/api/trolls", None).await;
    assert_eq!(listed[0], created);
    assert_eq!(listed.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn post_keeps_optional_fields_when_given() {
    let app = memory_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/trolls",
        Some(json!({
            "nick": "foo",
            "steamId": "STEAM_0:1:1",
            "steamId64": "76561198000000001",
            "reason": "teamkill",
            "faceitUrl": "https://faceit.com/en/players/foo"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["steam_id64"], "76561198000000001");
    assert_eq!(body["reason"], "teamkill");
    assert_eq!(body["faceit_url"], "https://faceit.com/en/players/foo");
}

#[tokio::test]
async fn post_without_required_fields_is_rejected_and_store_unchanged() {
    let app = memory_app();

    for body in [
        json!({ "nick": "", "steamId": "123" }),
        json!({ "nick": "foo", "steamId": "   " }),
        json!({ "nick": "foo" }),
        json!({}),
    ] {
        let (status, response) = send(&app, Method::POST, "/api/trolls", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["error"], "Nick y Steam ID son requeridos");
    }

    let (_, listed) = send(&app, Method::GET, "/api/trolls", None).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn post_accepts_numeric_steam_ids() {
    let app = memory_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/trolls",
        Some(json!({
            "nick": "foo",
            "steamId": 76561198000000000_u64,
            "steamId64": 76561198000000001_u64
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["steam_id"], "76561198000000000");
    assert_eq!(body["steam_id64"], "76561198000000001");
}

async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    content_type: Option<&str>,
    body: &str,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    let response = app
        .clone()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn unreadable_bodies_get_json_400() {
    let app = memory_app();
    let created = create(&app, "foo", "123").await;
    let put_uri = format!("/api/trolls?id={}", created["id"]);
    let valid = r#"{"nick": "foo", "steamId": "1"}"#;

    let cases = [
        (Method::POST, "/api/trolls", None, valid),
        (Method::POST, "/api/trolls", Some("text/plain"), valid),
        (Method::POST, "/api/trolls", Some("application/json"), "{ nick: "),
        (Method::POST, "/api/trolls", Some("application/json"), r#"{"steamId": true}"#),
        (Method::PUT, put_uri.as_str(), Some("application/json"), "\"42\""),
        (Method::PUT, put_uri.as_str(), None, valid),
    ];
    for (method, uri, content_type, body) in cases {
        let (status, response) = send_raw(&app, method.clone(), uri, content_type, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{method} {uri} {body}");
        assert_eq!(response["error"], "Cuerpo JSON inválido");
    }

    let (_, listed) = send(&app, Method::GET, "/api/trolls", None).await;
    assert_eq!(listed, json!([created]));
}

#[tokio::test]
async fn put_updates_record_and_refreshes_last_modified() {
    let app = memory_app();
    let created = create(&app, "foo", "123").await;
    let id = created["id"].as_i64().unwrap();

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/api/trolls?id={id}"),
        Some(json!({ "nick": "bar", "steamId": "123" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], id);
    assert_eq!(updated["nick"], "bar");
    assert_eq!(updated["date_added"], created["date_added"]);
    assert!(updated["last_modified"].as_i64().unwrap() > updated["date_added"].as_i64().unwrap());

    let (_, fetched) = send(&app, Method::GET, &format!("/api/trolls?id={id}"), None).await;
    assert_eq!(fetched, updated);
}

#[tokio::test]
async fn put_reports_bad_input_and_unknown_ids() {
    let app = memory_app();
    let created = create(&app, "foo", "123").await;
    let id = created["id"].as_i64().unwrap();
    let body = json!({ "nick": "bar", "steamId": "123" });

    let (status, _) = send(&app, Method::PUT, "/api/trolls?id=9999", Some(body.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::PUT, "/api/trolls", Some(body.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::PUT, "/api/trolls?id=abc", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/trolls?id={id}"),
        Some(json!({ "nick": "bar" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, fetched) = send(&app, Method::GET, &format!("/api/trolls?id={id}"), None).await;
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn delete_removes_record_once() {
    let app = memory_app();
    let created = create(&app, "foo", "123").await;
    let uri = format!("/api/trolls?id={}", created["id"]);

    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Troll eliminado");

    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Troll no encontrado");

    let (status, _) = send(&app, Method::DELETE, "/api/trolls", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, listed) = send(&app, Method::GET, "/api/trolls", None).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn get_supports_search_and_single_lookup() {
    let app = memory_app();
    create(&app, "ShadowBoi", "1").await;
    let quiet = create(&app, "quiet", "shadow_alt").await;
    create(&app, "other", "2").await;

    let (status, found) = send(&app, Method::GET, "/api/trolls?q=SHADOW", None).await;
    assert_eq!(status, StatusCode::OK);
    let nicks: Vec<_> = found
        .as_array()
        .unwrap()
        .iter()
        .map(|troll| troll["nick"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(nicks, vec!["quiet", "ShadowBoi"]);

    let (status, fetched) = send(
        &app,
        Method::GET,
        &format!("/api/trolls?id={}", quiet["id"]),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, quiet);

    let (status, _) = send(&app, Method::GET, "/api/trolls?id=9999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn options_and_cors_are_permissive() {
    let app = memory_app();

    let (status, _) = send(&app, Method::OPTIONS, "/api/trolls", None).await;
    assert_eq!(status, StatusCode::OK);

    let preflight = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/trolls")
        .header(header::ORIGIN, "https://example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "DELETE")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(preflight).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );

    let simple = Request::builder()
        .uri("/api/trolls")
        .header(header::ORIGIN, "https://example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(simple).await.unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn unsupported_methods_are_rejected() {
    let app = memory_app();
    let request = Request::builder()
        .method(Method::PATCH)
        .uri("/api/trolls")
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(response.headers().contains_key(header::ALLOW));
}

#[tokio::test]
async fn diagnostics_and_health_respond() {
    let app = memory_app();

    let (status, report) = send(&app, Method::GET, "/api/diagnostics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["status"], "SUCCESS");
    assert_eq!(report["backend"], "memory");

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".to_string()));
}

#[tokio::test]
async fn file_backed_stores_survive_state_rebuild() {
    for storage in ["json", "sqlite"] {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().to_string_lossy().into_owned();
        let config = ServerConfig::from_lookup(|key| match key {
            "SADAYIZM_DATA_DIR" => Some(data_dir.clone()),
            "SADAYIZM_STORAGE" => Some(storage.to_string()),
            _ => None,
        });

        let created = {
            let app = build_router(AppState::from_config(&config).unwrap());
            create(&app, "foo", "123").await
        };

        let app = build_router(AppState::from_config(&config).unwrap());
        let (_, listed) = send(&app, Method::GET, "/api/trolls", None).await;
        assert_eq!(listed, json!([created]), "storage {storage}");
    }
}
