//! Common test utilities for the integration tests
//! Provides store setup, sample payloads and a stand-in for the face API
#![allow(dead_code)]

use actix_web::http::{header, StatusCode};
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use qrtix_server::db::models::User;
use qrtix_server::db::replica::{Mirror, RetryPolicy};
use qrtix_server::db::{create_test_pool, DbPool, Stores};
use qrtix_server::face::{FaceApiConfig, FaceClient};
use rusqlite::Connection;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::Mutex;

/// Nothing listens on the discard port, so face checks against it always fail.
pub const UNREACHABLE_FACE_API: &str = "http://127.0.0.1:9/compare";

/// Retry policy with a tiny delay so mirror retries don't slow tests down
pub fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        delay: Duration::from_millis(1),
        ..RetryPolicy::default()
    }
}

/// A connection without the schema: the mirror liveness probe fails against it.
pub fn unprovisioned_pool() -> DbPool {
    Arc::new(Mutex::new(
        Connection::open_in_memory().expect("Failed to open in-memory DB"),
    ))
}

/// Test context holding the primary pool, the mirror pool and the shared stores
pub struct TestStores {
    pub primary: DbPool,
    pub mirror: DbPool,
    pub stores: web::Data<Stores>,
}

impl TestStores {
    /// Primary and a reachable mirror
    pub fn with_mirror() -> Self {
        let primary = create_test_pool();
        let mirror = create_test_pool();
        let stores = web::Data::new(Stores::new(
            primary.clone(),
            Some(Mirror::new(mirror.clone(), fast_policy())),
        ));
        TestStores {
            primary,
            mirror,
            stores,
        }
    }

    /// Primary and a mirror that never answers its liveness probe
    pub fn with_unreachable_mirror() -> Self {
        let primary = create_test_pool();
        let mirror = unprovisioned_pool();
        let stores = web::Data::new(Stores::new(
            primary.clone(),
            Some(Mirror::new(mirror.clone(), fast_policy())),
        ));
        TestStores {
            primary,
            mirror,
            stores,
        }
    }
}

pub fn face_client(compare_url: &str) -> web::Data<FaceClient> {
    let client = FaceClient::new(FaceApiConfig {
        compare_url: compare_url.to_string(),
        api_key: "test_key".to_string(),
        api_secret: "test_secret".to_string(),
        timeout: Duration::from_secs(5),
    })
    .expect("Failed to build face client");
    web::Data::new(client)
}

/// A compare request as received by the face API stand-in
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub content_type: String,
    pub body: String,
}

impl RecordedRequest {
    /// Value of a text part of the multipart body
    pub fn form_field(&self, name: &str) -> Option<String> {
        let marker = format!("name=\"{}\"", name);
        let after_name = &self.body[self.body.find(&marker)? + marker.len()..];
        let value = &after_name[after_name.find("\r\n\r\n")? + 4..];
        let end = value.find("\r\n--")?;
        Some(value[..end].to_string())
    }
}

pub struct FaceApiStandIn {
    pub url: String,
    requests: Arc<StdMutex<Vec<RecordedRequest>>>,
}

impl FaceApiStandIn {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("Request log poisoned").clone()
    }
}

/// Start a local server that answers every compare request with `body` and
/// keeps a copy of each request. Must be called from inside an actix runtime.
pub fn spawn_recording_face_api(status: StatusCode, body: Value) -> FaceApiStandIn {
    let requests = Arc::new(StdMutex::new(Vec::new()));
    let log = requests.clone();

    let server = HttpServer::new(move || {
        let body = body.clone();
        let log = log.clone();
        App::new().route(
            "/compare",
            web::post().to(move |req: HttpRequest, payload: web::Bytes| {
                let body = body.clone();
                let log = log.clone();
                async move {
                    let content_type = req
                        .headers()
                        .get(header::CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    log.lock().expect("Request log poisoned").push(RecordedRequest {
                        content_type,
                        body: String::from_utf8_lossy(&payload).into_owned(),
                    });
                    HttpResponse::build(status).json(body)
                }
            }),
        )
    })
    .workers(1)
    .bind("127.0.0.1:0")
    .expect("Failed to bind face API stand-in");

    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());

    FaceApiStandIn {
        url: format!("http://{}/compare", addr),
        requests,
    }
}

/// Same as `spawn_recording_face_api`, returning only the compare URL.
pub fn spawn_face_api(status: StatusCode, body: Value) -> String {
    spawn_recording_face_api(status, body).url
}

pub fn matching_face_api() -> String {
    spawn_face_api(StatusCode::OK, json!({ "confidence": 93.2, "request_id": "ok" }))
}

pub fn mismatching_face_api() -> String {
    spawn_face_api(StatusCode::OK, json!({ "confidence": 41.7, "request_id": "low" }))
}

pub fn sample_user(cedula: &str, correo: &str) -> User {
    User {
        nombres: "Ana María".to_string(),
        apellidos: "Gómez Peña".to_string(),
        cedula: cedula.to_string(),
        correo: correo.to_string(),
        telefono: "3001234567".to_string(),
        contrasena: "Abcdef1!".to_string(),
        foto: "data:image/jpeg;base64,/9j/4AAQSkZJRg==".to_string(),
        ultima_sesion: None,
    }
}

pub fn sample_user_json(cedula: &str, correo: &str) -> Value {
    serde_json::to_value(sample_user(cedula, correo)).expect("Serialization failed")
}

pub fn sample_sale_json(cedula: &str) -> Value {
    json!({
        "nombre": "Ana María Gómez",
        "cedula": cedula,
        "telefono": "3001234567",
        "direccion": "Calle 10 # 5-20",
        "correo": "ana@example.com",
        "zona": "Norte",
        "cantidad": 2,
        "total": 444092.0
    })
}
