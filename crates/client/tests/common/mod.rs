//! In-process stand-in for the booking backend.
//!
//! Serves the REST API from memory on a random local port and records what
//! the client sent, so tests can assert on query strings, headers and
//! request bodies.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use roombook_client::{AuthScheme, ClientConfig, HttpApi};
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const TOKEN: &str = "tok-ada";
pub const REISSUED_TOKEN: &str = "tok-ada-2";

#[derive(Clone, Default)]
pub struct Backend {
    pub bookings: Arc<Mutex<Vec<Value>>>,
    pub queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    pub auth_headers: Arc<Mutex<Vec<String>>>,
    /// JSON bodies received, keyed by route.
    pub bodies: Arc<Mutex<Vec<(&'static str, Value)>>>,
    pub password_changes_locked: Arc<AtomicBool>,
}

impl Backend {
    pub fn with_booking(self, id: u64, start: &str, end: &str) -> Self {
        self.bookings.lock().unwrap().push(json!({
            "id": id, "room_id": 1, "user_id": 2,
            "start_time": start, "end_time": end,
        }));
        self
    }

    pub fn with_password_changes_locked(self) -> Self {
        self.password_changes_locked.store(true, Ordering::SeqCst);
        self
    }

    /// Bodies received on `route`, oldest first.
    pub fn bodies_for(&self, route: &str) -> Vec<Value> {
        self.bodies
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, _)| *r == route)
            .map(|(_, body)| body.clone())
            .collect()
    }

    fn record(&self, route: &'static str, body: &Value) {
        self.bodies.lock().unwrap().push((route, body.clone()));
    }

    fn settings(&self) -> Value {
        json!({
            "settings": {
                "id": 1,
                "allow_user_change_password": !self.password_changes_locked.load(Ordering::SeqCst),
            }
        })
    }
}

/// Starts the fake backend and returns a client pointed at it.
pub async fn spawn(backend: Backend, scheme: AuthScheme) -> HttpApi {
    let app = Router::new()
        .route("/api/login", post(login))
        .route("/api/register", post(register))
        .route("/api/user/info", get(user_info))
        .route("/api/user/profile", put(update_profile))
        .route("/api/user/password", put(change_password))
        .route("/api/settings", get(public_settings))
        .route("/api/rooms", get(rooms).post(add_room))
        .route("/api/rooms/:id", put(edit_room).delete(delete_room))
        .route("/api/bookings", get(list_bookings).post(create_booking))
        .route("/api/bookings/:id", axum::routing::delete(cancel_booking))
        .route("/api/mybookings", get(my_bookings))
        .route("/api/admin/bookings", get(admin_bookings))
        .route("/api/admin/users", get(admin_users))
        .route("/api/admin/user/password", put(admin_change_password))
        .route("/api/admin/settings", get(admin_settings).put(update_settings))
        .with_state(backend);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = ClientConfig {
        base_url: format!("http://{}", addr),
        auth_scheme: scheme,
        ..ClientConfig::default()
    };
    HttpApi::new(config).unwrap()
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn unauthorized() -> Response {
    error(StatusCode::UNAUTHORIZED, "token invalid or expired")
}

fn authorized(backend: &Backend, headers: &HeaderMap) -> bool {
    let value = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    backend.auth_headers.lock().unwrap().push(value.clone());
    value == TOKEN || value == format!("Bearer {}", TOKEN)
}

fn ada(nickname: &str) -> Value {
    json!({ "user_id": 2, "username": "ada", "role": "user", "nickname": nickname })
}

fn aurora() -> Value {
    json!({ "id": 1, "name": "Aurora", "capacity": 8 })
}

fn parse_time(value: &Value) -> Option<DateTime<Utc>> {
    value.as_str()?.parse().ok()
}

// Authentication

async fn login(Json(body): Json<Value>) -> Response {
    if body["username"] == "ada" && body["password"] == "secret" {
        Json(json!({ "token": TOKEN })).into_response()
    } else {
        error(StatusCode::UNAUTHORIZED, "invalid username or password")
    }
}

async fn register(State(backend): State<Backend>, Json(body): Json<Value>) -> Response {
    backend.record("register", &body);
    if body["username"] == "ada" {
        return error(StatusCode::CONFLICT, "username already taken");
    }
    Json(json!({
        "message": "registered",
        "token": "tok-grace",
        "user": { "id": 7, "username": body["username"], "role": "user", "nickname": "" },
    }))
    .into_response()
}

async fn user_info(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    if !authorized(&backend, &headers) {
        return unauthorized();
    }
    Json(ada("Ada")).into_response()
}

async fn update_profile(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&backend, &headers) {
        return unauthorized();
    }
    backend.record("profile", &body);
    let nickname = body["nickname"].as_str().unwrap_or_default();
    Json(json!({ "message": "updated", "user": ada(nickname), "token": REISSUED_TOKEN }))
        .into_response()
}

async fn change_password(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&backend, &headers) {
        return unauthorized();
    }
    backend.record("password", &body);
    if backend.password_changes_locked.load(Ordering::SeqCst) {
        return error(StatusCode::FORBIDDEN, "password changes disabled");
    }
    if body["old_password"] != "secret" {
        return error(StatusCode::BAD_REQUEST, "old password is wrong");
    }
    Json(json!({ "message": "password changed" })).into_response()
}

async fn public_settings(State(backend): State<Backend>) -> Response {
    Json(backend.settings()).into_response()
}

// Rooms

async fn rooms(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    if !authorized(&backend, &headers) {
        return unauthorized();
    }
    Json(json!({ "rooms": [aurora()] })).into_response()
}

async fn add_room(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&backend, &headers) {
        return unauthorized();
    }
    backend.record("add_room", &body);
    Json(json!({
        "message": "added",
        "room": { "id": 2, "name": body["name"], "capacity": body["capacity"] },
    }))
    .into_response()
}

async fn edit_room(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&backend, &headers) {
        return unauthorized();
    }
    backend.record("edit_room", &body);
    if id != 1 {
        return error(StatusCode::NOT_FOUND, "room not found");
    }
    let mut room = aurora();
    for field in ["name", "capacity"] {
        if let Some(value) = body.get(field) {
            room[field] = value.clone();
        }
    }
    Json(json!({ "message": "updated", "room": room })).into_response()
}

async fn delete_room(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response {
    if !authorized(&backend, &headers) {
        return unauthorized();
    }
    if id != 1 {
        return error(StatusCode::NOT_FOUND, "room not found");
    }
    Json(json!({ "message": "deleted" })).into_response()
}

// Bookings

async fn list_bookings(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&backend, &headers) {
        return unauthorized();
    }
    backend.queries.lock().unwrap().push(query);
    let bookings = backend.bookings.lock().unwrap().clone();
    Json(json!({ "bookings": bookings })).into_response()
}

async fn create_booking(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&backend, &headers) {
        return unauthorized();
    }
    let (Some(start), Some(end)) = (parse_time(&body["start_time"]), parse_time(&body["end_time"]))
    else {
        return error(StatusCode::BAD_REQUEST, "invalid parameters");
    };

    let mut bookings = backend.bookings.lock().unwrap();
    let clash = bookings.iter().any(|b| {
        let (Some(b_start), Some(b_end)) = (parse_time(&b["start_time"]), parse_time(&b["end_time"]))
        else {
            return false;
        };
        b_end > start && b_start < end
    });
    if clash {
        return error(StatusCode::CONFLICT, "time slot already booked");
    }

    let booking = json!({
        "id": bookings.len() as u64 + 100,
        "room_id": body["room_id"],
        "user_id": 2,
        "start_time": body["start_time"],
        "end_time": body["end_time"],
    });
    bookings.push(booking.clone());
    Json(json!({ "message": "booked", "booking": booking })).into_response()
}

async fn cancel_booking(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response {
    if !authorized(&backend, &headers) {
        return unauthorized();
    }
    let mut bookings = backend.bookings.lock().unwrap();
    let Some(index) = bookings.iter().position(|b| b["id"] == id) else {
        return error(StatusCode::NOT_FOUND, "booking not found");
    };
    if bookings[index]["user_id"] != 2 {
        return error(StatusCode::FORBIDDEN, "not allowed to cancel this booking");
    }
    bookings.remove(index);
    Json(json!({ "message": "cancelled" })).into_response()
}

async fn my_bookings(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    if !authorized(&backend, &headers) {
        return unauthorized();
    }
    let mine: Vec<Value> = backend
        .bookings
        .lock()
        .unwrap()
        .iter()
        .filter(|b| b["user_id"] == 2)
        .cloned()
        .collect();
    Json(json!({ "bookings": mine })).into_response()
}

// Administration

async fn admin_bookings(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    if !authorized(&backend, &headers) {
        return unauthorized();
    }
    let details: Vec<Value> = backend
        .bookings
        .lock()
        .unwrap()
        .iter()
        .map(|b| {
            let mut detail = b.clone();
            detail["username"] = json!("ada");
            detail["room_name"] = json!("Aurora");
            detail
        })
        .collect();
    Json(json!({ "bookings": details })).into_response()
}

async fn admin_users() -> Response {
    (StatusCode::BAD_GATEWAY, "upstream unavailable").into_response()
}

async fn admin_change_password(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&backend, &headers) {
        return unauthorized();
    }
    backend.record("admin_password", &body);
    Json(json!({ "message": "password reset" })).into_response()
}

async fn admin_settings(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    if !authorized(&backend, &headers) {
        return unauthorized();
    }
    Json(backend.settings()).into_response()
}

async fn update_settings(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&backend, &headers) {
        return unauthorized();
    }
    backend.record("settings", &body);
    let allow = body["allow_user_change_password"].as_bool().unwrap_or(true);
    backend.password_changes_locked.store(!allow, Ordering::SeqCst);
    Json(backend.settings()).into_response()
}
