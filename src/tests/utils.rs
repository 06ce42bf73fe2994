use astra::{Body, Request, Response};
use http::Method;
use serde_json::Value;
use std::io::Read;
use tempfile::TempDir;

use crate::app::App;
use crate::auth::accounts::AccountConfig;
use crate::config::{AppConfig, BootstrapAdmin, StorageProfile};
use crate::router::handle;

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "pass1234";

/// App on a fresh SQLite file; the directory lives as long as the value.
pub struct TestApp {
    pub app: App,
    _dir: TempDir,
}

impl TestApp {
    pub fn send(&self, req: Request) -> Response {
        handle(req, &self.app)
    }
}

pub fn test_app() -> TestApp {
    crate::logging::init_test();

    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir failed: {e}"));
    let config = AppConfig {
        storage: StorageProfile::Sqlite(dir.path().join("test.sqlite3")),
        accounts: AccountConfig {
            pbkdf2_iterations: 1_000,
            session_ttl_secs: 3_600,
        },
        max_body_bytes: 256 * 1024,
        cors_origin: "https://desk.example".into(),
        bootstrap_admin: Some(BootstrapAdmin {
            username: ADMIN_USER.into(),
            password: ADMIN_PASSWORD.into(),
        }),
        ..AppConfig::default()
    };

    let app = App::from_config(config).unwrap_or_else(|e| panic!("app init failed: {e}"));
    TestApp { app, _dir: dir }
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Body) -> Request {
    let mut builder = http::Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(body).unwrap()
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request {
    let mut req = request(method, uri, token, Body::from(body.to_string()));
    req.headers_mut()
        .insert("Content-Type", "application/json".parse().unwrap());
    req
}

/// Log in and return the session token.
pub fn login(t: &TestApp, username: &str, password: &str) -> String {
    let resp = t.send(json_request(
        Method::POST,
        "/api/auth/login",
        None,
        serde_json::json!({ "username": username, "password": password }),
    ));
    assert_eq!(resp.status(), 200, "login failed for {username}");
    body_json(resp)["token"].as_str().unwrap().to_string()
}

pub fn admin_token(t: &TestApp) -> String {
    login(t, ADMIN_USER, ADMIN_PASSWORD)
}

pub fn body_bytes(resp: Response) -> Vec<u8> {
    let mut bytes = Vec::new();
    resp.into_body().reader().read_to_end(&mut bytes).unwrap();
    bytes
}

pub fn body_json(resp: Response) -> Value {
    serde_json::from_slice(&body_bytes(resp)).unwrap()
}

pub fn header(resp: &Response, name: &str) -> String {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}
