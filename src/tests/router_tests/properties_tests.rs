use astra::Body;
use http::Method;
use serde_json::json;

use crate::tests::utils::{admin_token, body_json, header, json_request, request, test_app};

fn sample(unit: &str) -> serde_json::Value {
    json!({
        "buildingName": "해링턴타워",
        "subType": "101동",
        "unitLabel": unit,
        "deposit": 1000,
        "monthlyRent": 70,
        "status": "임대중",
        "moveIn": "전입",
        "amenities": ["에어컨"],
        "contact": "010-0000-0000"
    })
}

#[test]
fn requests_without_a_session_are_rejected_with_cors() {
    let t = test_app();
    let resp = t.send(request(Method::GET, "/api/properties", None, Body::empty()));

    assert_eq!(resp.status(), 401);
    assert_eq!(header(&resp, "Access-Control-Allow-Origin"), "https://desk.example");
    assert!(body_json(resp)["error"].is_string());

    let resp = t.send(request(Method::GET, "/api/properties", Some("forged"), Body::empty()));
    assert_eq!(resp.status(), 401);
}

#[test]
fn preflight_needs_no_session() {
    let t = test_app();
    let resp = t.send(request(Method::OPTIONS, "/api/properties/12", None, Body::empty()));

    assert_eq!(resp.status(), 204);
    assert_eq!(header(&resp, "Access-Control-Allow-Methods"), "GET, PUT, DELETE, OPTIONS");
    assert_eq!(header(&resp, "Access-Control-Allow-Headers"), "Content-Type, Authorization");
    assert_eq!(header(&resp, "Access-Control-Allow-Origin"), "https://desk.example");

    let resp = t.send(request(Method::OPTIONS, "/api/stats", None, Body::empty()));
    assert_eq!(header(&resp, "Access-Control-Allow-Methods"), "GET, OPTIONS");
}

#[test]
fn unknown_route_is_404_json() {
    let t = test_app();
    let token = admin_token(&t);
    let resp = t.send(request(Method::GET, "/api/nothing", Some(&token), Body::empty()));
    assert_eq!(resp.status(), 404);
    assert_eq!(header(&resp, "Access-Control-Allow-Origin"), "https://desk.example");
}

#[test]
fn crud_round_trip_with_soft_delete() {
    let t = test_app();
    let token = admin_token(&t);

    let resp = t.send(json_request(Method::POST, "/api/properties", Some(&token), sample("1203")));
    assert_eq!(resp.status(), 201);
    let created = body_json(resp);
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["unitLabel"], "1203");
    assert_eq!(created["status"], "임대중");
    assert!(created["createdAt"].is_string());

    let resp = t.send(request(Method::GET, &format!("/api/properties/{id}"), Some(&token), Body::empty()));
    assert_eq!(resp.status(), 200);
    assert_eq!(body_json(resp)["contact"], "010-0000-0000");

    let mut changed = sample("1203");
    changed["monthlyRent"] = json!(85);
    changed["status"] = json!("공실");
    let resp = t.send(json_request(Method::PUT, &format!("/api/properties/{id}"), Some(&token), changed));
    assert_eq!(resp.status(), 200);
    let updated = body_json(resp);
    assert_eq!(updated["success"], true);
    assert_eq!(updated["property"]["monthlyRent"], 85);
    assert_eq!(updated["property"]["status"], "공실");

    let resp = t.send(request(Method::DELETE, &format!("/api/properties/{id}"), Some(&token), Body::empty()));
    assert_eq!(resp.status(), 200);
    assert_eq!(body_json(resp)["success"], true);

    for method in [Method::GET, Method::DELETE] {
        let resp = t.send(request(method, &format!("/api/properties/{id}"), Some(&token), Body::empty()));
        assert_eq!(resp.status(), 404);
    }
    let resp = t.send(json_request(Method::PUT, &format!("/api/properties/{id}"), Some(&token), sample("1203")));
    assert_eq!(resp.status(), 404);

    let resp = t.send(request(Method::GET, "/api/properties", Some(&token), Body::empty()));
    assert_eq!(body_json(resp).as_array().unwrap().len(), 0);

    let resp = t.send(request(Method::GET, "/api/properties?includeDeleted=true", Some(&token), Body::empty()));
    let all = body_json(resp);
    assert_eq!(all.as_array().unwrap().len(), 1);
    assert_eq!(all[0]["deleted"], true);
}

#[test]
fn create_rejects_bad_drafts() {
    let t = test_app();
    let token = admin_token(&t);

    let resp = t.send(json_request(Method::POST, "/api/properties", Some(&token), json!({ "buildingName": "해링턴타워" })));
    assert_eq!(resp.status(), 400);

    let resp = t.send(json_request(
        Method::POST,
        "/api/properties",
        Some(&token),
        json!({ "buildingName": "타워더모스트", "subType": "101동" }),
    ));
    assert_eq!(resp.status(), 400);
    assert!(body_json(resp)["error"].as_str().unwrap().contains("A타입"));

    let resp = t.send(request(Method::POST, "/api/properties", Some(&token), Body::from(b"{not json".to_vec())));
    assert_eq!(resp.status(), 400);

    t.send(json_request(Method::POST, "/api/properties", Some(&token), sample("501")));
    let resp = t.send(json_request(Method::POST, "/api/properties", Some(&token), sample("501")));
    assert_eq!(resp.status(), 409);
}

#[test]
fn list_filters_and_orders_newest_first() {
    let t = test_app();
    let token = admin_token(&t);

    for (building, sub, unit, status) in [
        ("해링턴타워", "101동", "101", "공실"),
        ("KCC하버뷰", "원룸형(도생)", "202", "임대중"),
        ("해링턴타워", "102동", "303", "임대중"),
    ] {
        let resp = t.send(json_request(
            Method::POST,
            "/api/properties",
            Some(&token),
            json!({ "buildingName": building, "subType": sub, "unitLabel": unit, "status": status }),
        ));
        assert_eq!(resp.status(), 201);
    }

    let resp = t.send(request(Method::GET, "/api/properties", Some(&token), Body::empty()));
    let units: Vec<String> = body_json(resp)
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["unitLabel"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(units, vec!["303", "202", "101"]);

    let uri = "/api/properties?buildingName=%ED%95%B4%EB%A7%81%ED%84%B4%ED%83%80%EC%9B%8C&status=%EC%9E%84%EB%8C%80%EC%A4%91";
    let resp = t.send(request(Method::GET, uri, Some(&token), Body::empty()));
    let found = body_json(resp);
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["unitLabel"], "303");

    let resp = t.send(request(Method::GET, "/api/properties?search=%EB%8F%84%EC%83%9D", Some(&token), Body::empty()));
    assert_eq!(body_json(resp)[0]["unitLabel"], "202");

    let resp = t.send(request(Method::GET, "/api/properties?status=sold", Some(&token), Body::empty()));
    assert_eq!(resp.status(), 400);
}

#[test]
fn stats_cover_live_listings() {
    let t = test_app();
    let token = admin_token(&t);

    for (unit, rent, status) in [("1", 50, "임대중"), ("2", 71, "임대중"), ("3", 90, "공실")] {
        t.send(json_request(
            Method::POST,
            "/api/properties",
            Some(&token),
            json!({ "buildingName": "해링턴타워", "subType": "103동", "unitLabel": unit, "monthlyRent": rent, "status": status }),
        ));
    }

    let resp = t.send(request(Method::GET, "/api/stats", Some(&token), Body::empty()));
    assert_eq!(resp.status(), 200);
    let stats = body_json(resp);
    assert_eq!(stats["total"], 3);
    assert_eq!(stats["totalRevenue"], 121);
    assert_eq!(stats["avgRent"], 70);
    assert_eq!(stats["byStatus"]["임대중"], 2);
    assert_eq!(stats["charts"]["status"].as_array().unwrap().len(), 2);
}
