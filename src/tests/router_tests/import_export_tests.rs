use astra::Body;
use http::Method;
use rust_xlsxwriter::Workbook;
use serde_json::json;

use crate::spreadsheets::read_xlsx_rows;
use crate::spreadsheets::template::LISTING_COLUMNS;
use crate::tests::utils::{admin_token, body_bytes, body_json, header, json_request, request, test_app};

/// Workbook in template layout: headers, instruction row, then `rows`.
fn sheet(rows: &[&[&str]]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let ws = workbook.add_worksheet();
    for (col, h) in LISTING_COLUMNS.iter().enumerate() {
        ws.write_string(0, col as u16, *h).unwrap();
    }
    ws.write_string(1, 0, "※ 안내").unwrap();
    for (r, cells) in rows.iter().enumerate() {
        for (c, v) in cells.iter().enumerate() {
            ws.write_string(r as u32 + 2, c as u16, *v).unwrap();
        }
    }
    workbook.save_to_buffer().unwrap()
}

fn count_listings(t: &crate::tests::utils::TestApp, token: &str) -> usize {
    let resp = t.send(request(Method::GET, "/api/properties", Some(token), Body::empty()));
    body_json(resp).as_array().unwrap().len()
}

#[test]
fn import_submits_each_row_and_reports_failures() {
    let t = test_app();
    let token = admin_token(&t);
    let resp = t.send(json_request(
        Method::POST,
        "/api/properties",
        Some(&token),
        json!({ "buildingName": "KCC하버뷰", "subType": "101동", "unitLabel": "902" }),
    ));
    assert_eq!(resp.status(), 201);

    let bytes = sheet(&[
        &["KCC하버뷰", "101동", "901", "500", "40"],
        &["KCC하버뷰", "101동", "902", "500", "40"],
        &["KCC하버뷰", "101동", "903", "1,500", "60", "", "전입", "임대중", "", "에어컨, 냉장고"],
    ]);
    let resp = t.send(request(Method::POST, "/api/properties/import", Some(&token), Body::from(bytes)));

    assert_eq!(resp.status(), 200);
    let report = body_json(resp);
    assert_eq!(report["successCount"], 2);
    assert_eq!(report["failCount"], 1);
    assert_eq!(report["errors"][0]["position"], 2);
    assert_eq!(report["errors"][0]["rowNumber"], 4);
    assert_eq!(report["createdIds"].as_array().unwrap().len(), 2);

    assert_eq!(count_listings(&t, &token), 3);
}

#[test]
fn invalid_rows_block_the_whole_import() {
    let t = test_app();
    let token = admin_token(&t);

    let bytes = sheet(&[
        &["해링턴타워", "101동", "1"],
        &["타워더모스트", "101동", "2"],
        &["", "", "3"],
        &["해링턴타워", "102동", "4", "abc"],
    ]);
    let resp = t.send(request(Method::POST, "/api/properties/import", Some(&token), Body::from(bytes)));

    assert_eq!(resp.status(), 400);
    assert_eq!(header(&resp, "Access-Control-Allow-Origin"), "https://desk.example");
    let body = body_json(resp);
    let rows: Vec<i64> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["row"].as_i64().unwrap())
        .collect();
    assert_eq!(rows, vec![4, 5, 6]);
    assert!(body["errors"][0]["message"].as_str().unwrap().contains("A타입, B타입, C타입, D타입"));

    assert_eq!(count_listings(&t, &token), 0);
}

#[test]
fn csv_import() {
    let t = test_app();
    let token = admin_token(&t);

    let csv = "건물명,동/타입,호수,보증금,월세\n※ 안내\n해링턴타워,103동,1101,\"2,000\",90\n";
    let mut req = request(
        Method::POST,
        "/api/properties/import",
        Some(&token),
        Body::from(csv.as_bytes().to_vec()),
    );
    req.headers_mut()
        .insert("Content-Type", "text/csv; charset=utf-8".parse().unwrap());
    let resp = t.send(req);

    assert_eq!(resp.status(), 200);
    assert_eq!(body_json(resp)["successCount"], 1);

    let resp = t.send(request(Method::GET, "/api/properties", Some(&token), Body::empty()));
    assert_eq!(body_json(resp)[0]["deposit"], 2000);
}

#[test]
fn empty_and_garbage_uploads_are_bad_requests() {
    let t = test_app();
    let token = admin_token(&t);

    let resp = t.send(request(Method::POST, "/api/properties/import", Some(&token), Body::empty()));
    assert_eq!(resp.status(), 400);

    let resp = t.send(request(
        Method::POST,
        "/api/properties/import",
        Some(&token),
        Body::from(b"not a workbook".to_vec()),
    ));
    assert_eq!(resp.status(), 400);

    let resp = t.send(request(Method::POST, "/api/properties/import", Some(&token), Body::from(sheet(&[]))));
    assert_eq!(resp.status(), 400);
}

#[test]
fn oversized_upload_is_413() {
    let t = test_app();
    let token = admin_token(&t);

    let big = vec![b'x'; 300 * 1024];
    let resp = t.send(request(Method::POST, "/api/properties/import", Some(&token), Body::from(big)));
    assert_eq!(resp.status(), 413);
}

#[test]
fn export_downloads_filtered_listings() {
    let t = test_app();
    let token = admin_token(&t);

    for (sub, unit) in [("101동", "11"), ("102동", "22")] {
        t.send(json_request(
            Method::POST,
            "/api/properties",
            Some(&token),
            json!({ "buildingName": "해링턴타워", "subType": sub, "unitLabel": unit, "deposit": 300 }),
        ));
    }

    let resp = t.send(request(Method::GET, "/api/properties/export?subType=102%EB%8F%99", Some(&token), Body::empty()));
    assert_eq!(resp.status(), 200);
    assert!(header(&resp, "Content-Type").contains("spreadsheetml"));
    assert!(header(&resp, "Content-Disposition").contains("listings_"));
    assert_eq!(header(&resp, "Access-Control-Allow-Origin"), "https://desk.example");

    let rows = read_xlsx_rows(&body_bytes(resp)).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2].cell(1), "102동");
    assert_eq!(rows[2].cell(2), "22");
    assert_eq!(rows[2].cell(3), "300");
}

#[test]
fn template_download() {
    let t = test_app();
    let token = admin_token(&t);

    let resp = t.send(request(Method::GET, "/api/properties/template", Some(&token), Body::empty()));
    assert_eq!(resp.status(), 200);
    assert!(header(&resp, "Content-Disposition").contains("listing_template.xlsx"));

    let rows = read_xlsx_rows(&body_bytes(resp)).unwrap();
    assert_eq!(rows[0].cell(0), LISTING_COLUMNS[0]);
    assert!(rows[1].cell(0).starts_with('※'));
}
