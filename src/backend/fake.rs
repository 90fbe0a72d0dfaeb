//! In-memory stand-ins for the hosted service, used by the test suites.

use super::SessionPersistence;
use crate::error::{ClubError, ClubResult, UNIQUE_VIOLATION};
use crate::request::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};
use clubhub_shared::Session;
use serde_json::{Value, json};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use uuid::Uuid;

pub const SERVICE_URL: &str = "https://club.example.supabase.co";
pub const ANON_KEY: &str = "anon-key";
pub const TOKEN_LIFETIME_SECS: i64 = 3600;

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

/// Two hours after [`fixed_now`], past the lifetime of any token issued then.
pub fn later_now() -> DateTime<Utc> {
    fixed_now() + Duration::hours(2)
}

// =========================================================
// MemoryPersistence
// =========================================================

#[derive(Clone, Default)]
pub struct MemoryPersistence {
    slot: Rc<RefCell<Option<Session>>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn holding(session: Session) -> Self {
        let p = Self::new();
        p.save(&session);
        p
    }

    pub fn stored(&self) -> Option<Session> {
        self.slot.borrow().clone()
    }
}

impl SessionPersistence for MemoryPersistence {
    fn load(&self) -> Option<Session> {
        self.slot.borrow().clone()
    }

    fn save(&self, session: &Session) {
        *self.slot.borrow_mut() = Some(session.clone());
    }

    fn clear(&self) {
        self.slot.borrow_mut().take();
    }
}

// =========================================================
// FakeSupabase
// =========================================================

struct FakeUser {
    id: Uuid,
    password: String,
    full_name: Option<String>,
}

#[derive(Default)]
struct FakeState {
    users: RefCell<HashMap<String, FakeUser>>,
    refresh_tokens: RefCell<HashMap<String, String>>,
    tables: RefCell<HashMap<String, Vec<Value>>>,
    requests: RefCell<Vec<HttpRequest>>,
    issued: Cell<u64>,
    require_confirmation: Cell<bool>,
    offline: Cell<bool>,
}

/// Answers auth and data API requests from memory.
///
/// Enforces the `(event_id, member_id)` uniqueness of `attendance` the way the
/// database does, with a 409 carrying code `23505`.
#[derive(Clone, Default)]
pub struct FakeSupabase {
    state: Rc<FakeState>,
}

impl FakeSupabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, email: &str, password: &str, full_name: Option<&str>) -> Self {
        self.state.users.borrow_mut().insert(
            email.to_string(),
            FakeUser {
                id: Uuid::new_v4(),
                password: password.to_string(),
                full_name: full_name.map(str::to_string),
            },
        );
        self
    }

    pub fn user_id(&self, email: &str) -> Option<Uuid> {
        self.state.users.borrow().get(email).map(|u| u.id)
    }

    pub fn require_confirmation(&self, on: bool) {
        self.state.require_confirmation.set(on);
    }

    pub fn set_offline(&self, offline: bool) {
        self.state.offline.set(offline);
    }

    /// Invalidate every refresh token issued so far.
    pub fn revoke_refresh_tokens(&self) {
        self.state.refresh_tokens.borrow_mut().clear();
    }

    pub fn seed(&self, table: &str, row: Value) {
        self.state
            .tables
            .borrow_mut()
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.state
            .tables
            .borrow()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.borrow().len()
    }

    fn next_serial(&self) -> u64 {
        let n = self.state.issued.get() + 1;
        self.state.issued.set(n);
        n
    }

    fn timestamp(&self, serial: u64) -> String {
        (fixed_now() + Duration::seconds(serial as i64))
            .to_rfc3339_opts(SecondsFormat::Secs, false)
    }

    fn issue_tokens(&self, email: &str) -> Value {
        let users = self.state.users.borrow();
        let user = &users[email];
        let n = self.next_serial();
        let refresh = format!("refresh-{n}");
        self.state
            .refresh_tokens
            .borrow_mut()
            .insert(refresh.clone(), email.to_string());
        json!({
            "access_token": format!("access-{n}"),
            "token_type": "bearer",
            "expires_in": TOKEN_LIFETIME_SECS,
            "expires_at": fixed_now().timestamp() + TOKEN_LIFETIME_SECS,
            "refresh_token": refresh,
            "user": {
                "id": user.id,
                "aud": "authenticated",
                "email": email,
                "user_metadata": { "full_name": user.full_name },
            }
        })
    }

    fn handle_auth(&self, path: &str, req: &HttpRequest) -> HttpResponse {
        let body: Value = req
            .body
            .as_deref()
            .and_then(|b| serde_json::from_str(b).ok())
            .unwrap_or(Value::Null);

        match path {
            "/token?grant_type=password" => {
                let email = body["email"].as_str().unwrap_or_default();
                let password = body["password"].as_str().unwrap_or_default();
                let valid = self
                    .state
                    .users
                    .borrow()
                    .get(email)
                    .is_some_and(|u| u.password == password);
                if valid {
                    ok(200, self.issue_tokens(email))
                } else {
                    ok(
                        400,
                        json!({"code": 400, "error_code": "invalid_credentials", "msg": "Invalid login credentials"}),
                    )
                }
            }
            "/token?grant_type=refresh_token" => {
                let token = body["refresh_token"].as_str().unwrap_or_default();
                let email = self.state.refresh_tokens.borrow_mut().remove(token);
                match email {
                    Some(email) => ok(200, self.issue_tokens(&email)),
                    None => ok(
                        400,
                        json!({"error": "invalid_grant", "error_description": "Invalid Refresh Token: Refresh Token Not Found"}),
                    ),
                }
            }
            "/signup" => {
                let email = body["email"].as_str().unwrap_or_default().to_string();
                if self.state.users.borrow().contains_key(&email) {
                    return ok(
                        422,
                        json!({"code": 422, "error_code": "user_already_exists", "msg": "User already registered"}),
                    );
                }
                let id = Uuid::new_v4();
                self.state.users.borrow_mut().insert(
                    email.clone(),
                    FakeUser {
                        id,
                        password: body["password"].as_str().unwrap_or_default().to_string(),
                        full_name: body["data"]["full_name"].as_str().map(str::to_string),
                    },
                );
                if self.state.require_confirmation.get() {
                    ok(200, json!({"id": id, "email": email, "confirmation_sent_at": self.timestamp(0)}))
                } else {
                    ok(200, self.issue_tokens(&email))
                }
            }
            "/logout" => HttpResponse {
                status: 204,
                body: String::new(),
            },
            _ => ok(404, json!({"msg": "not found"})),
        }
    }

    fn handle_rest(&self, table: &str, params: &[(String, String)], req: &HttpRequest) -> HttpResponse {
        match req.method {
            HttpMethod::Get => self.select(table, params),
            HttpMethod::Post => self.insert(table, req),
            HttpMethod::Delete => self.delete(table, params),
        }
    }

    fn select(&self, table: &str, params: &[(String, String)]) -> HttpResponse {
        let mut rows = self.rows(table);

        for (key, value) in params {
            if let Some(expected) = value.strip_prefix("eq.") {
                rows.retain(|row| row[key.as_str()].as_str() == Some(expected));
            }
        }

        if let Some((_, order)) = params.iter().find(|(k, _)| k == "order") {
            sort_rows(&mut rows, order);
        }

        let select = param(params, "select").unwrap_or("*");
        if table == "events" && select.contains("attendance(") {
            let embedded_order = param(params, "attendance.order");
            for row in &mut rows {
                let mut marks: Vec<Value> = self
                    .rows("attendance")
                    .into_iter()
                    .filter(|a| a["event_id"] == row["id"])
                    .collect();
                if let Some(order) = embedded_order {
                    sort_rows(&mut marks, order);
                }
                row["attendance"] = Value::Array(marks);
            }
        }

        if let Some(limit) = param(params, "limit").and_then(|l| l.parse::<usize>().ok()) {
            rows.truncate(limit);
        }

        ok(200, Value::Array(rows))
    }

    fn insert(&self, table: &str, req: &HttpRequest) -> HttpResponse {
        let Some(Value::Array(incoming)) = req
            .body
            .as_deref()
            .and_then(|b| serde_json::from_str::<Value>(b).ok())
        else {
            return ok(400, json!({"code": "PGRST102", "message": "Empty or invalid json"}));
        };

        for mut row in incoming {
            if table == "attendance" {
                let duplicate = self
                    .rows("attendance")
                    .iter()
                    .any(|a| a["event_id"] == row["event_id"] && a["member_id"] == row["member_id"]);
                if duplicate {
                    return ok(
                        409,
                        json!({
                            "code": UNIQUE_VIOLATION,
                            "details": "Key (event_id, member_id) already exists.",
                            "hint": null,
                            "message": "duplicate key value violates unique constraint \"attendance_event_id_member_id_key\""
                        }),
                    );
                }
            }

            let serial = self.next_serial();
            row["id"] = json!(Uuid::new_v4());
            match table {
                "members" => row["created_at"] = json!(self.timestamp(serial)),
                "attendance" => row["marked_at"] = json!(self.timestamp(serial)),
                _ => {}
            }
            self.seed(table, row);
        }

        HttpResponse {
            status: 201,
            body: String::new(),
        }
    }

    fn delete(&self, table: &str, params: &[(String, String)]) -> HttpResponse {
        let Some(id) = param(params, "id").and_then(|v| v.strip_prefix("eq.")) else {
            return ok(400, json!({"code": "21000", "message": "DELETE requires a WHERE clause"}));
        };
        if let Some(rows) = self.state.tables.borrow_mut().get_mut(table) {
            rows.retain(|row| row["id"].as_str() != Some(id));
        }
        HttpResponse {
            status: 204,
            body: String::new(),
        }
    }
}

#[async_trait::async_trait(?Send)]
impl HttpClient for FakeSupabase {
    async fn send(&self, req: HttpRequest) -> ClubResult<HttpResponse> {
        self.state.requests.borrow_mut().push(req.clone());

        if self.state.offline.get() {
            return Err(ClubError::network("connection refused"));
        }
        if req.headers.get("apikey").map(String::as_str) != Some(ANON_KEY) {
            return Ok(ok(401, json!({"message": "No API key found in request"})));
        }

        let Some(rest) = req.url.strip_prefix(SERVICE_URL) else {
            return Ok(ok(404, json!({"message": "unknown host"})));
        };

        if let Some(path) = rest.strip_prefix("/auth/v1") {
            return Ok(self.handle_auth(path, &req));
        }

        if let Some(rest) = rest.strip_prefix("/rest/v1/") {
            let (table, query) = rest.split_once('?').unwrap_or((rest, ""));
            let params: Vec<(String, String)> = query
                .split('&')
                .filter(|p| !p.is_empty())
                .filter_map(|p| p.split_once('='))
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            return Ok(self.handle_rest(table, &params, &req));
        }

        Ok(ok(404, json!({"message": "not found"})))
    }
}

fn ok(status: u16, body: Value) -> HttpResponse {
    HttpResponse {
        status,
        body: body.to_string(),
    }
}

fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Sort by the first `column.direction` term, comparing values as strings.
fn sort_rows(rows: &mut [Value], order: &str) {
    let term = order.split(',').next().unwrap_or_default();
    let (column, direction) = term.rsplit_once('.').unwrap_or((term, "asc"));
    rows.sort_by(|a, b| {
        let a = a[column].as_str().unwrap_or_default();
        let b = b[column].as_str().unwrap_or_default();
        a.cmp(b)
    });
    if direction == "desc" {
        rows.reverse();
    }
}

