use astra::{Request, Response};
use chrono::Utc;
use http::HeaderValue;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::io::Read;
use std::time::Instant;

use crate::app::App;
use crate::domain::account::Account;
use crate::domain::board::ListingBoard;
use crate::domain::filter::ListingFilter;
use crate::domain::listing::ListingDraft;
use crate::errors::{ResultResp, ServerError};
use crate::import::{submit_all, validate_rows};
use crate::responses::{apply_cors, error_to_response, json_response, preflight, xlsx_response};
use crate::spreadsheets::{
    export_filename, export_listings_xlsx, read_csv_rows, read_xlsx_rows, template_xlsx,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resource {
    Properties,
    Property(i64),
    Import,
    Export,
    Template,
    Stats,
    Login,
    Logout,
    ChangePassword,
    Accounts,
}

impl Resource {
    fn parse(path: &str) -> Result<Self, ServerError> {
        let path = path.trim_end_matches('/');
        let resource = match path {
            "/api/properties" => Resource::Properties,
            "/api/properties/import" => Resource::Import,
            "/api/properties/export" => Resource::Export,
            "/api/properties/template" => Resource::Template,
            "/api/stats" => Resource::Stats,
            "/api/auth/login" => Resource::Login,
            "/api/auth/logout" => Resource::Logout,
            "/api/auth/change-password" => Resource::ChangePassword,
            "/api/auth/accounts" => Resource::Accounts,
            _ => {
                let id = path
                    .strip_prefix("/api/properties/")
                    .filter(|rest| !rest.is_empty() && !rest.contains('/'))
                    .ok_or_else(|| ServerError::NotFound(format!("no route for {path}")))?;
                let id = id
                    .parse::<i64>()
                    .map_err(|_| ServerError::BadRequest(format!("invalid listing id '{id}'")))?;
                Resource::Property(id)
            }
        };
        Ok(resource)
    }

    fn methods(self) -> &'static [&'static str] {
        match self {
            Resource::Properties => &["GET", "POST"],
            Resource::Property(_) => &["GET", "PUT", "DELETE"],
            Resource::Import => &["POST"],
            Resource::Export | Resource::Template | Resource::Stats => &["GET"],
            Resource::Login | Resource::Logout | Resource::ChangePassword => &["POST"],
            Resource::Accounts => &["GET", "POST", "DELETE"],
        }
    }
}

/// Entry point for every request. Errors become JSON bodies and every
/// response, successful or not, carries the CORS origin header.
pub fn handle(req: Request, app: &App) -> Response {
    let started = Instant::now();
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();

    let resp = route(req, app).unwrap_or_else(error_to_response);

    tracing::info!(
        %method,
        %path,
        status = resp.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    apply_cors(resp, &app.config.cors_origin)
}

fn route(mut req: Request, app: &App) -> ResultResp {
    let resource = Resource::parse(req.uri().path())?;
    let method = req.method().as_str().to_string();

    if method == "OPTIONS" {
        return preflight(resource.methods(), &app.config.cors_origin);
    }
    if !resource.methods().contains(&method.as_str()) {
        return Err(ServerError::NotFound(format!(
            "no route for {method} {}",
            req.uri().path()
        )));
    }

    if resource == Resource::Login {
        return login(&mut req, app);
    }

    let token = session_token(&req);
    let caller = app
        .account_service()
        .authenticate(token.as_deref(), now_unix())?;

    match (method.as_str(), resource) {
        ("GET", Resource::Properties) => {
            let filter = ListingFilter::from_query(&parse_query(&req))?;
            json_response(200, &app.listings.list(&filter)?)
        }
        ("POST", Resource::Properties) => {
            let draft: ListingDraft = read_json(&mut req, app)?;
            let listing = app.listings.create(draft, Utc::now())?;
            tracing::info!(id = listing.id, by = %caller.username, "listing created");
            json_response(201, &listing)
        }
        ("GET", Resource::Property(id)) => json_response(200, &app.listings.get(id)?),
        ("PUT", Resource::Property(id)) => {
            let draft: ListingDraft = read_json(&mut req, app)?;
            let listing = app.listings.update(id, draft)?;
            tracing::info!(id, by = %caller.username, "listing updated");
            json_response(200, &json!({ "success": true, "property": listing }))
        }
        ("DELETE", Resource::Property(id)) => {
            app.listings.delete(id)?;
            tracing::info!(id, by = %caller.username, "listing deleted");
            json_response(200, &json!({ "success": true }))
        }

        ("POST", Resource::Import) => import(&mut req, app, &caller),
        ("GET", Resource::Export) => {
            let filter = ListingFilter::from_query(&parse_query(&req))?;
            let board = load_board(app)?;
            let bytes = export_listings_xlsx(&board.filtered(&filter), &app.vocabulary)?;
            xlsx_response(bytes, &export_filename(Utc::now().date_naive()))
        }
        ("GET", Resource::Template) => {
            xlsx_response(template_xlsx(&app.vocabulary)?, "listing_template.xlsx")
        }
        ("GET", Resource::Stats) => json_response(200, &load_board(app)?.stats()),

        ("POST", Resource::Logout) => {
            if let Some(token) = token {
                app.account_service().logout(&token, now_unix())?;
            }
            let resp = json_response(200, &json!({ "success": true }))?;
            Ok(with_cookie(resp, "session=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0"))
        }
        ("POST", Resource::ChangePassword) => {
            let body: ChangePasswordRequest = read_json(&mut req, app)?;
            let updated = app.account_service().change_credentials(
                &caller,
                &body.current_password,
                body.new_password.as_deref(),
                body.name.as_deref(),
            )?;
            json_response(
                200,
                &json!({ "success": true, "name": updated.name, "message": "account updated" }),
            )
        }
        ("GET", Resource::Accounts) => json_response(200, &app.accounts.list_accounts()?),
        ("POST", Resource::Accounts) => {
            let body: AddAccountRequest = read_json(&mut req, app)?;
            let account = app.account_service().add_account(
                &body.username,
                &body.password,
                body.name.as_deref(),
                Utc::now(),
            )?;
            json_response(201, &json!({ "success": true, "account": account }))
        }
        ("DELETE", Resource::Accounts) => {
            let params = parse_query(&req);
            let username = params.get("username").map(String::as_str).unwrap_or("");
            app.account_service().delete_account(&caller, username)?;
            json_response(200, &json!({ "success": true }))
        }

        _ => Err(ServerError::NotFound(format!("no route for {method}"))),
    }
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest {
    #[serde(default)]
    current_password: String,
    new_password: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AddAccountRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    name: Option<String>,
}

fn login(req: &mut Request, app: &App) -> ResultResp {
    let body: LoginRequest = read_json(req, app)?;
    let outcome = app
        .account_service()
        .login(&body.username, &body.password, now_unix())?;
    tracing::info!(username = %outcome.account.username, "login");

    let cookie = format!(
        "session={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        outcome.token, app.config.accounts.session_ttl_secs
    );
    let resp = json_response(
        200,
        &json!({
            "success": true,
            "token": outcome.token,
            "expiresAt": outcome.expires_at,
            "username": outcome.account.username,
            "name": outcome.account.name,
        }),
    )?;
    Ok(with_cookie(resp, &cookie))
}

/// Validate the whole upload first; only a clean sheet is submitted.
fn import(req: &mut Request, app: &App, caller: &Account) -> ResultResp {
    let is_csv = header_str(req, "Content-Type")
        .map(|ct| ct.trim_start().to_ascii_lowercase().starts_with("text/csv"))
        .unwrap_or(false);

    let bytes = read_body(req, app.config.max_body_bytes)?;
    if bytes.is_empty() {
        return Err(ServerError::BadRequest("upload is empty".into()));
    }
    let rows = if is_csv {
        read_csv_rows(&bytes)?
    } else {
        read_xlsx_rows(&bytes)?
    };

    let report = validate_rows(&rows, &app.vocabulary);
    if !report.is_clean() {
        tracing::info!(invalid = report.errors.len(), by = %caller.username, "import rejected");
        return Err(ServerError::InvalidRows(report.errors));
    }
    if report.records.is_empty() {
        return Err(ServerError::BadRequest("no listings found in the upload".into()));
    }

    let submitted = submit_all(&report.records, |draft| {
        app.listings.create(draft.clone(), Utc::now())
    });
    tracing::info!(
        success = submitted.success_count,
        failed = submitted.fail_count,
        by = %caller.username,
        "import submitted"
    );
    json_response(200, &submitted)
}

fn load_board(app: &App) -> Result<ListingBoard, ServerError> {
    let mut board = ListingBoard::default();
    board.refresh(app.listings.as_ref())?;
    Ok(board)
}

fn now_unix() -> i64 {
    Utc::now().timestamp()
}

fn header_str<'a>(req: &'a Request, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

/// `Authorization: Bearer <token>` first, then the `session` cookie.
fn session_token(req: &Request) -> Option<String> {
    if let Some(token) = header_str(req, "Authorization")
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        return Some(token.to_string());
    }

    header_str(req, "Cookie")?
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, v)| *k == "session" && !v.is_empty())
        .map(|(_, v)| v.to_string())
}

fn with_cookie(mut resp: Response, cookie: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(cookie) {
        resp.headers_mut().insert("Set-Cookie", value);
    }
    resp
}

fn parse_query(req: &Request) -> HashMap<String, String> {
    req.uri()
        .query()
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

fn read_body(req: &mut Request, limit: usize) -> Result<Vec<u8>, ServerError> {
    let mut buf = Vec::new();
    req.body_mut()
        .reader()
        .take(limit as u64 + 1)
        .read_to_end(&mut buf)
        .map_err(|e| ServerError::BadRequest(format!("failed to read request body: {e}")))?;

    if buf.len() > limit {
        return Err(ServerError::PayloadTooLarge(limit));
    }
    Ok(buf)
}

fn read_json<T: DeserializeOwned>(req: &mut Request, app: &App) -> Result<T, ServerError> {
    let bytes = read_body(req, app.config.max_body_bytes)?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ServerError::BadRequest("request body required".into()));
    }
    serde_json::from_slice(&bytes)
        .map_err(|e| ServerError::BadRequest(format!("invalid JSON body: {e}")))
}
