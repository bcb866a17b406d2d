use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use budget_client::config::{ApiSettings, Settings};
use budget_client::push::LocalPushChannel;
use budget_client::{BudgetClient, MemoryStore};

pub const TEST_EMAIL: &str = "jane@example.com";
pub const TEST_PASSWORD: &str = "hunter2!";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub bearer: Option<String>,
}

/// Scriptable in-process stand-in for the budget service.
#[derive(Default)]
pub struct MockState {
    pub valid_access: Mutex<String>,
    pub valid_refresh: Mutex<String>,
    pub refresh_calls: AtomicU32,
    pub fail_refresh: AtomicBool,
    pub reject_all_protected: AtomicBool,
    pub fail_mark_read: AtomicBool,
    pub fail_mark_all: AtomicBool,
    pub fail_list: AtomicBool,
    pub unread_count: Mutex<u64>,
    pub notifications: Mutex<Vec<Value>>,
    pub requests: Mutex<Vec<RecordedRequest>>,
}

pub struct TestApp {
    pub address: String,
    pub state: Arc<MockState>,
}

static TRACING: std::sync::Once = std::sync::Once::new();

impl TestApp {
    pub async fn spawn() -> Self {
        // Opt-in test logging: TEST_LOG=1 cargo test -- --nocapture
        TRACING.call_once(|| {
            if std::env::var("TEST_LOG").is_ok() {
                client_core::observability::init_tracing("budget-client-tests", "debug");
            }
        });

        let state = Arc::new(MockState::default());

        let router = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/refresh", post(refresh))
            .route("/auth/signout", post(signout))
            .route("/user/notifications", get(list_notifications))
            .route("/user/notifications/read-all", patch(mark_all_read))
            .route("/user/notifications/:id/read", patch(mark_read))
            .route("/user/notifications/:id", delete(delete_notification))
            .route("/user/budget/get-all", get(list_budgets))
            .route("/user/budget/current-budget", get(current_budget))
            .route("/user/budget/current-month-analytics", get(month_analytics))
            .route(
                "/user/budget/get-by-month-and-year",
                get(budget_by_month_and_year),
            )
            .route("/user/budget/:id", get(budget_by_id))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                record_request,
            ))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let address = format!(
            "http://{}",
            listener.local_addr().expect("Failed to read local addr")
        );

        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });

        TestApp { address, state }
    }

    /// Client wired against this backend, with an in-memory store and
    /// a local push channel.
    pub fn client(&self) -> (BudgetClient, Arc<LocalPushChannel>) {
        let push = Arc::new(LocalPushChannel::new(16));
        let client = BudgetClient::new(
            &self.settings(),
            Arc::new(MemoryStore::new()),
            push.clone(),
        )
        .expect("Failed to build client");
        (client, push)
    }

    pub fn settings(&self) -> Settings {
        Settings {
            api: ApiSettings {
                base_url: self.address.clone(),
                timeout_secs: 5,
            },
            push: Default::default(),
            notifications: Default::default(),
            log_level: "info".to_string(),
        }
    }

    pub fn set_valid_tokens(&self, access: &str, refresh: &str) {
        *self.state.valid_access.lock().unwrap() = access.to_string();
        *self.state.valid_refresh.lock().unwrap() = refresh.to_string();
    }

    pub fn seed_notifications(&self, notifications: Vec<Value>, unread: u64) {
        *self.state.notifications.lock().unwrap() = notifications;
        *self.state.unread_count.lock().unwrap() = unread;
    }

    pub fn refresh_calls(&self) -> u32 {
        self.state.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn recorded(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.state
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|recorded| recorded.method == method && recorded.path == path)
            .cloned()
            .collect()
    }
}

async fn record_request(
    State(state): State<Arc<MockState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let recorded = RecordedRequest {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        query: request.uri().query().map(|query| query.to_string()),
        bearer: request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|value| value.to_string()),
    };
    state.requests.lock().unwrap().push(recorded);
    next.run(request).await
}

fn bearer_of(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|value| value.to_string())
}

fn authorized(state: &MockState, headers: &HeaderMap) -> bool {
    if state.reject_all_protected.load(Ordering::SeqCst) {
        return false;
    }
    match bearer_of(headers) {
        Some(token) => token == *state.valid_access.lock().unwrap(),
        None => false,
    }
}

fn envelope(data: Value) -> Json<Value> {
    Json(json!({
        "status": 200,
        "message": "OK",
        "data": data,
        "success": true
    }))
}

fn error_response(status: StatusCode, message: &str, code: Option<&str>) -> Response {
    let mut body = json!({
        "status": status.as_u16(),
        "message": message,
        "success": false
    });
    if let Some(code) = code {
        body["errorCode"] = json!(code);
    }
    (status, Json(body)).into_response()
}

fn unauthorized() -> Response {
    error_response(
        StatusCode::UNAUTHORIZED,
        "Invalid or expired token",
        Some("UNAUTHORIZED"),
    )
}

async fn login(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    if body["email"] == TEST_EMAIL && body["password"] == TEST_PASSWORD {
        *state.valid_access.lock().unwrap() = "A1".to_string();
        *state.valid_refresh.lock().unwrap() = "R1".to_string();
        envelope(json!({
            "user": sample_user_json(),
            "meta": {"accessToken": "A1", "refreshToken": "R1", "expiresIn": 900}
        }))
        .into_response()
    } else {
        error_response(
            StatusCode::UNAUTHORIZED,
            "Invalid email or password",
            Some("INVALID_CREDENTIALS"),
        )
    }
}

async fn refresh(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    let calls = state.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;

    if state.fail_refresh.load(Ordering::SeqCst) {
        return error_response(
            StatusCode::UNAUTHORIZED,
            "Invalid refresh token",
            Some("INVALID_REFRESH_TOKEN"),
        );
    }

    let expected = state.valid_refresh.lock().unwrap().clone();
    if body["refreshToken"] != expected.as_str() {
        return error_response(
            StatusCode::UNAUTHORIZED,
            "Invalid refresh token",
            Some("INVALID_REFRESH_TOKEN"),
        );
    }

    let access = format!("A{}", calls + 1);
    let refresh = format!("R{}", calls + 1);
    *state.valid_access.lock().unwrap() = access.clone();
    *state.valid_refresh.lock().unwrap() = refresh.clone();

    // The refresh endpoint answers with the bare pair, not the envelope.
    Json(json!({"accessToken": access, "refreshToken": refresh})).into_response()
}

async fn signout(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    envelope(Value::Null).into_response()
}

async fn list_notifications(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    if state.fail_list.load(Ordering::SeqCst) {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Something went wrong",
            None,
        );
    }

    let notifications = state.notifications.lock().unwrap().clone();
    let unread = *state.unread_count.lock().unwrap();
    envelope(json!({
        "notifications": notifications,
        "hasMore": false,
        "total": notifications.len(),
        "unreadCount": unread
    }))
    .into_response()
}

async fn mark_read(
    State(state): State<Arc<MockState>>,
    Path(_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    if state.fail_mark_read.load(Ordering::SeqCst) {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Something went wrong",
            None,
        );
    }
    envelope(Value::Null).into_response()
}

async fn mark_all_read(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    if state.fail_mark_all.load(Ordering::SeqCst) {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Something went wrong",
            None,
        );
    }
    envelope(Value::Null).into_response()
}

async fn delete_notification(
    State(state): State<Arc<MockState>>,
    Path(_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    envelope(Value::Null).into_response()
}

async fn list_budgets(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    envelope(json!({
        "budgets": [sample_budget_json()],
        "total": 1,
        "hasMore": false
    }))
    .into_response()
}

async fn current_budget(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    envelope(sample_budget_json()).into_response()
}

async fn budget_by_id(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    if id == "missing" {
        return error_response(StatusCode::NOT_FOUND, "Budget not found", Some("NOT_FOUND"));
    }
    envelope(sample_budget_json()).into_response()
}

async fn budget_by_month_and_year(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    envelope(sample_budget_json()).into_response()
}

async fn month_analytics(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    envelope(sample_analytics_json()).into_response()
}

pub fn sample_user_json() -> Value {
    json!({
        "_id": "64f1c0a2e4b0a1b2c3d4e5f6",
        "fullName": "Jane Doe",
        "email": TEST_EMAIL,
        "preferences": {
            "theme": "dark",
            "notifications": true,
            "currency": "USD",
            "currencySym": "$",
            "dateFormat": "MM/DD/YYYY",
            "timeFormat": "24h"
        },
        "roles": ["user"],
        "createdAt": "2025-01-12T09:30:00.000Z",
        "updatedAt": "2025-06-02T17:05:00.000Z"
    })
}

pub fn sample_notification_json(id: &str, read: bool) -> Value {
    json!({
        "_id": id,
        "user": "64f1c0a2e4b0a1b2c3d4e5f6",
        "title": format!("Notification {}", id),
        "message": "You have spent 80% of your budget",
        "read": read,
        "data": {"budgetId": "665000aa", "percentage": 80.0},
        "type": "budget_threshold",
        "expiresAt": "2025-09-01T00:00:00.000Z",
        "createdAt": "2025-08-01T12:00:00.000Z",
        "updatedAt": "2025-08-01T12:00:00.000Z"
    })
}

pub fn sample_budget_json() -> Value {
    json!({
        "_id": "665000aa11bb22cc33dd44ee",
        "user": "64f1c0a2e4b0a1b2c3d4e5f6",
        "currency": "USD",
        "currencySym": "$",
        "year": 2025,
        "month": 8,
        "amountSpent": 1240.50,
        "amountBudgeted": 2000.0,
        "budgetVariance": 759.50,
        "categories": [{
            "_id": "665000aa11bb22cc33dd44ef",
            "key": "groceries",
            "name": "Groceries",
            "amountBudgeted": 600.0,
            "amountSpent": 412.35,
            "expensesStats": {
                "totalAmount": 412.35,
                "count": 14,
                "averageAmount": 29.45,
                "minAmount": 4.20,
                "maxAmount": 86.10
            },
            "createdAt": "2025-08-01T00:00:00.000Z",
            "updatedAt": "2025-08-05T00:00:00.000Z"
        }],
        "budgetSources": [{
            "_id": "665000aa11bb22cc33dd44f0",
            "name": "Salary",
            "amount": 2000.0,
            "description": "Monthly salary",
            "recurring": true,
            "frequency": "monthly",
            "createdAt": "2025-08-01T00:00:00.000Z",
            "updatedAt": "2025-08-01T00:00:00.000Z"
        }],
        "lastExpenseDate": "2025-08-05T18:00:00.000Z",
        "createdAt": "2025-08-01T00:00:00.000Z",
        "updatedAt": "2025-08-05T18:00:00.000Z"
    })
}

pub fn sample_analytics_json() -> Value {
    json!({
        "year": 2025,
        "monthName": "August",
        "weeklyStats": {
            "averageWeeklySpending": 310.12,
            "peakSpendingWeek": {
                "totalSpent": 480.0,
                "count": 9,
                "week": 1,
                "dateRange": {"start": "2025-08-01", "end": "2025-08-07"}
            },
            "weeks": [{
                "totalSpent": 480.0,
                "count": 9,
                "week": 1,
                "dateRange": {"start": "2025-08-01", "end": "2025-08-07"}
            }]
        },
        "monthlyTrend": -4.2,
        "topCategory": {
            "_id": "665000aa11bb22cc33dd44ef",
            "categoryName": "Groceries",
            "totalSpent": 412.35,
            "count": 14
        },
        "dailyStats": {
            "dailyAverageTransaction": 41.35,
            "totalDayCount": 5,
            "uniqueExpenseDates": [{
                "date": "2025-08-05",
                "amount": 86.10,
                "count": 3,
                "description": "Weekly shop"
            }]
        },
        "totalExpensesCount": 30,
        "totalExpensesSum": 1240.50,
        "avgExpenseAmount": 41.35,
        "largestTransaction": 86.10
    })
}
