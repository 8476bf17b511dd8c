//! PostgREST-style table endpoint
//!
//! Supports the subset mediasync uses: merge-duplicates upsert, `select`,
//! `limit`, `is.null` / `eq.` column filters, a single `or=(...)` group and
//! filtered `PATCH`. Every request is recorded for later inspection.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Map, Value};
use std::sync::{Arc, RwLock};

pub const DEFAULT_TABLE: &str = "youtube_videos";

/// One request as received by the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoreRequest {
    pub method: String,
    pub query: Vec<(String, String)>,
    pub prefer: Option<String>,
    pub body: Option<Value>,
}

impl StoreRequest {
    /// First value of a query parameter
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// In-memory table plus request log
pub struct StoreState {
    table: String,
    rows: RwLock<Vec<Map<String, Value>>>,
    requests: RwLock<Vec<StoreRequest>>,
    reject_or_filter: RwLock<bool>,
    required_key: RwLock<Option<String>>,
    write_failure: RwLock<Option<u16>>,
}

impl Default for StoreState {
    fn default() -> Self {
        Self::new(DEFAULT_TABLE)
    }
}

impl StoreState {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            rows: RwLock::new(Vec::new()),
            requests: RwLock::new(Vec::new()),
            reject_or_filter: RwLock::new(false),
            required_key: RwLock::new(None),
            write_failure: RwLock::new(None),
        }
    }

    /// Seed a row (must be a JSON object)
    pub fn insert_row(&self, row: Value) {
        if let Value::Object(map) = row {
            self.rows.write().unwrap().push(map);
        }
    }

    pub fn rows(&self) -> Vec<Value> {
        self.rows
            .read()
            .unwrap()
            .iter()
            .cloned()
            .map(Value::Object)
            .collect()
    }

    pub fn row(&self, video_id: &str) -> Option<Value> {
        self.rows
            .read()
            .unwrap()
            .iter()
            .find(|row| row.get("video_id").and_then(Value::as_str) == Some(video_id))
            .cloned()
            .map(Value::Object)
    }

    pub fn requests(&self) -> Vec<StoreRequest> {
        self.requests.read().unwrap().clone()
    }

    pub fn requests_with_method(&self, method: &str) -> Vec<StoreRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .collect()
    }

    /// Answer any `or=` filter with 400, as when a column does not exist
    pub fn reject_or_filter(&self) {
        *self.reject_or_filter.write().unwrap() = true;
    }

    /// Require `apikey` and `Authorization: Bearer` to carry `key`
    pub fn require_key(&self, key: &str) {
        *self.required_key.write().unwrap() = Some(key.to_string());
    }

    /// Fail every POST and PATCH with `status`
    pub fn fail_writes(&self, status: u16) {
        *self.write_failure.write().unwrap() = Some(status);
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let Some(key) = self.required_key.read().unwrap().clone() else {
            return true;
        };
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
        header("apikey") == Some(key.as_str())
            && header("authorization") == Some(format!("Bearer {}", key).as_str())
    }
}

#[derive(Debug)]
enum Filter {
    IsNull(String),
    Eq(String, String),
    Any(Vec<Filter>),
}

impl Filter {
    fn parse_condition(column: &str, condition: &str) -> Option<Filter> {
        if condition == "is.null" {
            Some(Filter::IsNull(column.to_string()))
        } else {
            condition
                .strip_prefix("eq.")
                .map(|value| Filter::Eq(column.to_string(), value.to_string()))
        }
    }

    /// `(a.is.null,b.eq.x)`
    fn parse_or(group: &str) -> Option<Filter> {
        let inner = group.strip_prefix('(')?.strip_suffix(')')?;
        let mut filters = Vec::new();
        for part in inner.split(',') {
            let (column, condition) = part.split_once('.')?;
            filters.push(Filter::parse_condition(column, condition)?);
        }
        Some(Filter::Any(filters))
    }

    fn matches(&self, row: &Map<String, Value>) -> bool {
        match self {
            Filter::IsNull(column) => row.get(column).map_or(true, Value::is_null),
            Filter::Eq(column, expected) => match row.get(column) {
                Some(Value::String(s)) => s == expected,
                Some(Value::Null) | None => false,
                Some(other) => other.to_string() == *expected,
            },
            Filter::Any(filters) => filters.iter().any(|f| f.matches(row)),
        }
    }
}

struct ParsedQuery {
    filters: Vec<Filter>,
    select: Option<Vec<String>>,
    limit: Option<usize>,
}

fn parse_query(params: &[(String, String)]) -> Result<ParsedQuery, String> {
    let mut parsed = ParsedQuery {
        filters: Vec::new(),
        select: None,
        limit: None,
    };
    for (key, value) in params {
        match key.as_str() {
            "select" => parsed.select = Some(value.split(',').map(str::to_string).collect()),
            "limit" => {
                parsed.limit = Some(value.parse().map_err(|_| format!("bad limit {}", value))?)
            }
            "or" => parsed
                .filters
                .push(Filter::parse_or(value).ok_or_else(|| format!("bad or {}", value))?),
            column => parsed.filters.push(
                Filter::parse_condition(column, value)
                    .ok_or_else(|| format!("bad filter {}={}", column, value))?,
            ),
        }
    }
    Ok(parsed)
}

fn error(status: StatusCode, code: &str, message: &str) -> Response {
    let body = json!({ "code": code, "details": null, "hint": null, "message": message });
    (status, Json(body)).into_response()
}

fn wants_representation(headers: &HeaderMap) -> bool {
    headers
        .get("prefer")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("return=representation"))
}

async fn handle_table(
    State(state): State<Arc<StoreState>>,
    Path(table): Path<String>,
    method: Method,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    body: Option<Json<Value>>,
) -> Response {
    state.requests.write().unwrap().push(StoreRequest {
        method: method.to_string(),
        query: params.clone(),
        prefer: headers
            .get("prefer")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: body.as_ref().map(|Json(v)| v.clone()),
    });

    if !state.authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "PGRST301", "Invalid API key");
    }
    if table != state.table {
        let message = format!("relation \"public.{}\" does not exist", table);
        return error(StatusCode::NOT_FOUND, "42P01", &message);
    }
    if method != Method::GET {
        if let Some(status) = *state.write_failure.read().unwrap() {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return error(status, "XX000", "write rejected");
        }
    }

    if *state.reject_or_filter.read().unwrap() && params.iter().any(|(k, _)| k == "or") {
        let message = format!("column {}.duration_seconds does not exist", state.table);
        return error(StatusCode::BAD_REQUEST, "42703", &message);
    }

    let query = match parse_query(&params) {
        Ok(query) => query,
        Err(message) => return error(StatusCode::BAD_REQUEST, "PGRST100", &message),
    };
    let payload = body.map(|Json(v)| v);

    match method {
        Method::GET => select_rows(&state, &query),
        Method::POST => upsert_rows(&state, payload, wants_representation(&headers)),
        Method::PATCH => patch_rows(&state, &query, payload, wants_representation(&headers)),
        _ => error(StatusCode::METHOD_NOT_ALLOWED, "PGRST000", "method not allowed"),
    }
}

fn select_rows(state: &StoreState, query: &ParsedQuery) -> Response {
    let rows = state.rows.read().unwrap();
    let selected: Vec<Value> = rows
        .iter()
        .filter(|row| query.filters.iter().all(|f| f.matches(row)))
        .take(query.limit.unwrap_or(usize::MAX))
        .map(|row| match &query.select {
            Some(columns) if !columns.iter().any(|c| c == "*") => Value::Object(
                columns
                    .iter()
                    .map(|c| (c.clone(), row.get(c).cloned().unwrap_or(Value::Null)))
                    .collect(),
            ),
            _ => Value::Object(row.clone()),
        })
        .collect();
    (StatusCode::OK, Json(Value::Array(selected))).into_response()
}

fn upsert_rows(state: &StoreState, payload: Option<Value>, representation: bool) -> Response {
    let incoming = match payload {
        Some(Value::Array(items)) => items,
        Some(item @ Value::Object(_)) => vec![item],
        _ => return error(StatusCode::BAD_REQUEST, "PGRST102", "expected JSON body"),
    };

    let mut rows = state.rows.write().unwrap();
    let mut echoed = Vec::new();
    for item in incoming {
        let Value::Object(fields) = item else {
            return error(StatusCode::BAD_REQUEST, "PGRST102", "expected objects");
        };
        let Some(video_id) = fields.get("video_id").cloned() else {
            return error(StatusCode::BAD_REQUEST, "23502", "null value in column \"video_id\"");
        };
        let row = match rows.iter_mut().find(|row| row.get("video_id") == Some(&video_id)) {
            Some(existing) => {
                existing.extend(fields);
                existing.clone()
            }
            None => {
                rows.push(fields.clone());
                fields
            }
        };
        echoed.push(Value::Object(row));
    }

    if representation {
        (StatusCode::CREATED, Json(Value::Array(echoed))).into_response()
    } else {
        StatusCode::CREATED.into_response()
    }
}

fn patch_rows(
    state: &StoreState,
    query: &ParsedQuery,
    payload: Option<Value>,
    representation: bool,
) -> Response {
    let Some(Value::Object(fields)) = payload else {
        return error(StatusCode::BAD_REQUEST, "PGRST102", "expected JSON object");
    };

    let mut rows = state.rows.write().unwrap();
    let mut updated = Vec::new();
    for row in rows
        .iter_mut()
        .filter(|row| query.filters.iter().all(|f| f.matches(row)))
    {
        row.extend(fields.clone());
        updated.push(Value::Object(row.clone()));
    }

    if representation {
        (StatusCode::OK, Json(Value::Array(updated))).into_response()
    } else {
        StatusCode::NO_CONTENT.into_response()
    }
}

pub fn create_router(state: Arc<StoreState>) -> Router {
    Router::new()
        .route(
            "/rest/v1/:table",
            get(handle_table).post(handle_table).patch(handle_table),
        )
        .with_state(state)
}
