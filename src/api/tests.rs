#![allow(clippy::unwrap_used)]

use super::app;
use crate::accounts::{AccountService, DirectoryAccess, tests::memory_service};
use anyhow::Result;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::{Value, json};
use std::{
    io,
    sync::{Arc, Mutex},
};
use tower::ServiceExt;

fn test_app() -> Router {
    app(Arc::new(memory_service()))
}

fn post(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> Result<(StatusCode, Value)> {
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, body))
}

fn alice() -> Value {
    json!({
        "name": "Alice",
        "email": "Alice@Example.com",
        "phone": "5551234567",
        "password": "secret1"
    })
}

#[tokio::test]
async fn register_then_login() -> Result<()> {
    let app = test_app();

    let (status, body) = send(&app, post("/api/register", &alice())).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], json!("Registration successful"));
    assert_eq!(body["user"]["email"], json!("alice@example.com"));
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("credentialHash").is_none());

    let (status, body) = send(
        &app,
        post(
            "/api/login",
            &json!({"email": "ALICE@example.com", "password": "secret1"}),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Login successful"));
    assert_eq!(body["user"]["name"], json!("Alice"));

    let (status, body) = send(
        &app,
        post(
            "/api/login",
            &json!({"email": "alice@example.com", "password": "wrong!!"}),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body,
        json!({"success": false, "message": "Invalid credentials"})
    );
    Ok(())
}

#[tokio::test]
async fn login_returns_the_registered_id() -> Result<()> {
    let app = test_app();
    let user = json!({
        "name": "A",
        "email": "a@x.com",
        "phone": "1234567890",
        "password": "secret1"
    });
    let (status, registered) = send(&app, post("/api/register", &user)).await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, logged_in) = send(
        &app,
        post("/api/login", &json!({"email": "a@x.com", "password": "secret1"})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(logged_in["user"]["id"], registered["user"]["id"]);

    let (status, _) = send(
        &app,
        post("/api/login", &json!({"email": "a@x.com", "password": "wrong"})),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn duplicates_conflict() -> Result<()> {
    let app = test_app();
    send(&app, post("/api/register", &alice())).await?;

    let same_email = json!({
        "name": "Other",
        "email": "alice@example.com",
        "phone": "5550000000",
        "password": "secret2"
    });
    let (status, body) = send(&app, post("/api/register", &same_email)).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], json!("Email already registered"));

    let same_phone = json!({
        "name": "Other",
        "email": "other@example.com",
        "phone": "5551234567",
        "password": "secret2"
    });
    let (status, body) = send(&app, post("/api/register", &same_phone)).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], json!("Phone already registered"));
    Ok(())
}

#[tokio::test]
async fn unknown_email_and_wrong_password_look_the_same() -> Result<()> {
    let app = test_app();
    send(&app, post("/api/register", &alice())).await?;

    let wrong_password = send(
        &app,
        post(
            "/api/login",
            &json!({"email": "alice@example.com", "password": "nope123"}),
        ),
    )
    .await?;
    let unknown_email = send(
        &app,
        post(
            "/api/login",
            &json!({"email": "nobody@example.com", "password": "nope123"}),
        ),
    )
    .await?;
    assert_eq!(wrong_password, unknown_email);
    Ok(())
}

#[tokio::test]
async fn login_requires_both_fields() -> Result<()> {
    let app = test_app();
    let (status, body) = send(&app, post("/api/login", &json!({"email": "a@b.co"}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"success": false, "message": "Email and password required"})
    );
    Ok(())
}

#[tokio::test]
async fn validation_errors_are_listed_per_field() -> Result<()> {
    let app = test_app();
    let (status, body) = send(
        &app,
        post(
            "/api/register",
            &json!({"name": " ", "email": "bad", "phone": "123", "password": "123"}),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));

    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|error| error["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, ["name", "email", "phone", "password"]);
    Ok(())
}

#[tokio::test]
async fn wrongly_typed_fields_get_field_errors() -> Result<()> {
    let app = test_app();
    let (status, body) = send(
        &app,
        post(
            "/api/register",
            &json!({"name": "A", "email": "a@x.com", "phone": 1234567890, "password": "secret1"}),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"success": false, "errors": [{"field": "phone", "message": "Phone must be a string"}]})
    );

    let (status, body) = send(
        &app,
        post(
            "/api/register",
            &json!({"name": "A", "email": "a@x.com", "phone": "1234567890", "password": 123456}),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"success": false, "errors": [{"field": "password", "message": "Password must be a string"}]})
    );

    let (status, body) = send(
        &app,
        post("/api/login", &json!({"email": "a@x.com", "password": 123456})),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("Email and password required"));
    Ok(())
}

/// Shared in-memory sink for a test subscriber.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn rejected_bodies_never_log_passwords() -> Result<()> {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let app = test_app();

    let (status, _) = send(
        &app,
        post(
            "/api/register",
            &json!({"name": "A", "email": "a@x.com", "phone": "1234567890", "password": 98765432}),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        post("/api/login", &json!({"email": "a@x.com", "password": 13579246})),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let truncated = Request::builder()
        .method("POST")
        .uri("/api/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"email":"a@x.com","password":"24681357""#))
        .unwrap();
    let (status, body) = send(&app, truncated).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("Invalid JSON body"));

    let output = logs.contents();
    assert!(output.contains("Rejected login body"));
    for password in ["98765432", "13579246", "24681357"] {
        assert!(!output.contains(password), "{password} found in logs");
    }
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_rejected() -> Result<()> {
    let app = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, request).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"success": false, "message": "Invalid JSON body"})
    );
    Ok(())
}

#[tokio::test]
async fn directory_lists_users_without_credentials() -> Result<()> {
    let app = test_app();
    for (i, name) in ["Ann", "Bob", "Cid"].iter().enumerate() {
        let user = json!({
            "name": name,
            "email": format!("{}@example.com", name.to_lowercase()),
            "phone": format!("555000000{i}"),
            "password": "secret1"
        });
        let (status, _) = send(&app, post("/api/register", &user)).await?;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, get("/api/users")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));

    let users = body["users"].as_array().unwrap();
    let names: Vec<&str> = users
        .iter()
        .map(|user| user["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Ann", "Bob", "Cid"]);
    let text = body.to_string();
    assert!(!text.contains("secret1"));
    assert!(!text.contains("argon2"));

    let (_, body) = send(&app, get("/api/users?limit=1&offset=1")).await?;
    assert_eq!(body["users"][0]["name"], json!("Bob"));
    assert_eq!(body["users"].as_array().unwrap().len(), 1);

    let (status, _) = send(&app, get("/api/users?limit=abc")).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn directory_honours_bearer_token() -> Result<()> {
    let service: AccountService = memory_service().with_directory_access(
        DirectoryAccess::from_token(Some(SecretString::from("s3cr3t".to_string()))),
    );
    let app = app(Arc::new(service));

    let (status, body) = send(&app, get("/api/users")).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"success": false, "message": "Unauthorized"}));

    let wrong = Request::builder()
        .uri("/api/users")
        .header(header::AUTHORIZATION, "Bearer nope")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, wrong).await?.0, StatusCode::UNAUTHORIZED);

    let right = Request::builder()
        .uri("/api/users")
        .header(header::AUTHORIZATION, "Bearer s3cr3t")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, right).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"], json!([]));
    Ok(())
}

#[tokio::test]
async fn concurrent_duplicate_registrations_admit_one() -> Result<()> {
    let app = test_app();
    let mut tasks = Vec::new();
    for i in 0..8 {
        let app = app.clone();
        tasks.push(tokio::spawn(async move {
            let user = json!({
                "name": format!("Racer {i}"),
                "email": "race@example.com",
                "phone": format!("55500000{i:02}"),
                "password": "secret1"
            });
            send(&app, post("/api/register", &user)).await
        }));
    }

    let mut created = 0;
    let mut conflicts = 0;
    for task in tasks {
        match task.await??.0 {
            StatusCode::CREATED => created += 1,
            StatusCode::CONFLICT => conflicts += 1,
            other => panic!("unexpected status {other}"),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(conflicts, 7);

    let (_, body) = send(&app, get("/api/users")).await?;
    assert_eq!(body["users"].as_array().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn root_and_health() -> Result<()> {
    let app = test_app();

    let (status, body) = send(&app, get("/")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));

    let response = app.clone().oneshot(get("/health")).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("X-App"));
    assert!(response.headers().contains_key("x-request-id"));
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let body: Value = serde_json::from_slice(&bytes)?;
    assert_eq!(body["database"], json!("ok"));
    assert_eq!(body["name"], json!(env!("CARGO_PKG_NAME")));

    let options = Request::builder()
        .method("OPTIONS")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, options).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);
    Ok(())
}

#[tokio::test]
async fn request_id_is_propagated() -> Result<()> {
    let app = test_app();
    let request = Request::builder()
        .uri("/")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await?;
    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "req-42"
    );
    Ok(())
}
