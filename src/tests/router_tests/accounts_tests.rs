use astra::Body;
use http::Method;
use serde_json::json;

use crate::tests::utils::{
    admin_token, body_json, header, json_request, login, request, test_app, ADMIN_PASSWORD, ADMIN_USER,
};

#[test]
fn login_returns_token_and_cookie() {
    let t = test_app();
    let resp = t.send(json_request(
        Method::POST,
        "/api/auth/login",
        None,
        json!({ "username": ADMIN_USER, "password": ADMIN_PASSWORD }),
    ));

    assert_eq!(resp.status(), 200);
    let cookie = header(&resp, "Set-Cookie");
    let body = body_json(resp);
    assert_eq!(body["success"], true);
    assert_eq!(body["username"], ADMIN_USER);
    let token = body["token"].as_str().unwrap();
    assert!(cookie.starts_with(&format!("session={token};")));
    assert!(cookie.contains("HttpOnly"));

    // the cookie alone authenticates
    let req = http::Request::builder()
        .method(Method::GET)
        .uri("/api/auth/accounts")
        .header("Cookie", format!("session={token}"))
        .body(Body::empty())
        .unwrap();
    assert_eq!(t.send(req).status(), 200);
}

#[test]
fn bad_credentials_are_401() {
    let t = test_app();
    let resp = t.send(json_request(
        Method::POST,
        "/api/auth/login",
        None,
        json!({ "username": ADMIN_USER, "password": "wrong" }),
    ));
    assert_eq!(resp.status(), 401);
    assert_eq!(header(&resp, "Access-Control-Allow-Origin"), "https://desk.example");
    assert_eq!(body_json(resp)["error"], "invalid username or password");

    let resp = t.send(json_request(Method::POST, "/api/auth/login", None, json!({})));
    assert_eq!(resp.status(), 400);
}

#[test]
fn logout_revokes_the_session() {
    let t = test_app();
    let token = admin_token(&t);

    let resp = t.send(request(Method::POST, "/api/auth/logout", Some(&token), Body::empty()));
    assert_eq!(resp.status(), 200);

    let resp = t.send(request(Method::GET, "/api/properties", Some(&token), Body::empty()));
    assert_eq!(resp.status(), 401);
}

#[test]
fn account_management() {
    let t = test_app();
    let token = admin_token(&t);

    let resp = t.send(json_request(
        Method::POST,
        "/api/auth/accounts",
        Some(&token),
        json!({ "username": "staff", "password": "staff123", "name": "직원" }),
    ));
    assert_eq!(resp.status(), 201);
    assert_eq!(body_json(resp)["account"]["name"], "직원");

    let resp = t.send(json_request(
        Method::POST,
        "/api/auth/accounts",
        Some(&token),
        json!({ "username": "staff", "password": "other123" }),
    ));
    assert_eq!(resp.status(), 409);

    let resp = t.send(json_request(
        Method::POST,
        "/api/auth/accounts",
        Some(&token),
        json!({ "username": "short", "password": "abc" }),
    ));
    assert_eq!(resp.status(), 400);

    let resp = t.send(request(Method::GET, "/api/auth/accounts", Some(&token), Body::empty()));
    let accounts = body_json(resp);
    let names: Vec<&str> = accounts
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["username"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"admin") && names.contains(&"staff"));
    assert!(accounts.to_string().find("pbkdf2").is_none());

    let resp = t.send(request(Method::DELETE, "/api/auth/accounts?username=admin", Some(&token), Body::empty()));
    assert_eq!(resp.status(), 403);

    let resp = t.send(request(Method::DELETE, "/api/auth/accounts?username=ghost", Some(&token), Body::empty()));
    assert_eq!(resp.status(), 404);

    let staff_token = login(&t, "staff", "staff123");
    let resp = t.send(request(Method::DELETE, "/api/auth/accounts?username=staff", Some(&token), Body::empty()));
    assert_eq!(resp.status(), 200);

    // deleting an account ends its sessions
    let resp = t.send(request(Method::GET, "/api/properties", Some(&staff_token), Body::empty()));
    assert_eq!(resp.status(), 401);
}

#[test]
fn change_password_flow() {
    let t = test_app();
    let token = admin_token(&t);

    let resp = t.send(json_request(
        Method::POST,
        "/api/auth/change-password",
        Some(&token),
        json!({ "currentPassword": "wrong", "newPassword": "newpass1" }),
    ));
    assert_eq!(resp.status(), 401);

    let resp = t.send(json_request(
        Method::POST,
        "/api/auth/change-password",
        Some(&token),
        json!({ "currentPassword": ADMIN_PASSWORD }),
    ));
    assert_eq!(resp.status(), 400);

    let resp = t.send(json_request(
        Method::POST,
        "/api/auth/change-password",
        Some(&token),
        json!({ "currentPassword": ADMIN_PASSWORD, "newPassword": "newpass1", "name": "관리자" }),
    ));
    assert_eq!(resp.status(), 200);
    let body = body_json(resp);
    assert_eq!(body["success"], true);
    assert_eq!(body["name"], "관리자");

    login(&t, ADMIN_USER, "newpass1");
}
