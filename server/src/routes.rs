//! HTTP route handlers for the todos server.
//!
//! This module provides the browser-facing endpoints:
//!
//! | Method | Path | Effect |
//! |--------|------|--------|
//! | GET | `/` | Redirect to `/lists` |
//! | GET | `/lists` | Overview of all lists |
//! | GET | `/lists/new` | New list form |
//! | POST | `/lists` | Create a list |
//! | GET | `/lists/{id}` | Show a list |
//! | GET | `/lists/{id}/edit` | Rename form |
//! | POST | `/edit/{id}` | Rename a list |
//! | POST | `/lists/delete/{id}` | Delete a list |
//! | POST | `/lists/{id}/todos` | Add a todo |
//! | POST | `/lists/{id}/todo/complete/{todo_id}` | Set a todo's completion |
//! | POST | `/lists/{id}/todo/delete/{todo_id}` | Delete a todo |
//! | POST | `/lists/{id}/complete_all` | Complete every todo |
//! | GET | `/health` | Health check |
//!
//! # Architecture
//!
//! Every handler follows the same cycle: load the [`Session`] named by the
//! request cookie, apply one [`actions`] function to its data, turn the
//! resulting [`Reply`] into a response, then save the session and attach the
//! cookie. Rendering a page consumes the pending flash messages before the
//! session is saved, so each message is shown exactly once.
//!
//! # Example
//!
//! ```rust,no_run
//! use todos_server::config::Config;
//! use todos_server::routes::{create_router, AppState};
//! use todos_server::session::store_from_config;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::from_env().expect("failed to load config");
//!     let store = store_from_config(&config).expect("invalid session config");
//!     let app = create_router(AppState::new(config, store));
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:4567").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::{trace, warn};

use crate::actions::{self, parse_id, Page, Reply, LISTS_PATH};
use crate::config::Config;
use crate::error::{Result, ServerError};
use crate::session::{
    cookie_value, session_cookie_header, Session, SessionError, SessionStore, SESSION_COOKIE,
};
use crate::types::SessionData;
use crate::views;

// ============================================================================
// Constants
// ============================================================================

/// Header set by script-driven requests.
const HEADER_REQUESTED_WITH: &str = "x-requested-with";

/// Maximum size of a submitted form (64 KB).
const MAX_BODY_SIZE: usize = 64 * 1024;

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<Config>,

    /// Where sessions are loaded from and saved to.
    pub sessions: Arc<dyn SessionStore>,

    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Creates application state around a session store.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use todos_server::config::Config;
    /// use todos_server::routes::AppState;
    /// use todos_server::session::MemoryStore;
    ///
    /// let state = AppState::new(Config::default(), Arc::new(MemoryStore::default()));
    /// assert_eq!(state.sessions.name(), "memory");
    /// ```
    #[must_use]
    pub fn new(config: Config, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            config: Arc::new(config),
            sessions,
            start_time: Instant::now(),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &"<Config>")
            .field("sessions", &self.sessions)
            .field("start_time", &self.start_time)
            .finish()
    }
}

// ============================================================================
// Router
// ============================================================================

/// Creates the application router with all routes configured.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_root))
        .route("/lists", get(get_lists).post(post_lists))
        .route("/lists/new", get(get_new_list))
        .route("/lists/{id}", get(get_list))
        .route("/lists/{id}/edit", get(get_edit_list))
        .route("/edit/{id}", post(post_rename_list))
        .route("/lists/delete/{id}", post(post_delete_list))
        .route("/lists/{id}/todos", post(post_todos))
        .route(
            "/lists/{id}/todo/complete/{todo_id}",
            post(post_complete_todo),
        )
        .route("/lists/{id}/todo/delete/{todo_id}", post(post_delete_todo))
        .route("/lists/{id}/complete_all", post(post_complete_all))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .route("/health", get(get_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Forms
// ============================================================================

/// Body of `POST /lists`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NewListForm {
    list_name: String,
}

/// Body of `POST /edit/{id}`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RenameListForm {
    list_rename: String,
}

/// Body of `POST /lists/{id}/todos`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NewTodoForm {
    todo: String,
}

/// Body of `POST /lists/{id}/todo/complete/{todo_id}`.
///
/// Only the literal `true` marks the todo completed.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CompleteTodoForm {
    completed: String,
}

impl CompleteTodoForm {
    fn is_completed(&self) -> bool {
        self.completed == "true"
    }
}

// ============================================================================
// Session cycle
// ============================================================================

/// Loads the session named by the request cookie.
fn load_session(state: &AppState, headers: &HeaderMap) -> Session {
    let session = state
        .sessions
        .load(cookie_value(headers, SESSION_COOKIE));
    trace!(
        store = state.sessions.name(),
        resumed = session.key().is_some(),
        "Session loaded"
    );
    session
}

/// Returns true for script-driven requests.
fn is_xhr(headers: &HeaderMap) -> bool {
    headers
        .get(HEADER_REQUESTED_WITH)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.eq_ignore_ascii_case("XMLHttpRequest"))
}

/// Turns a reply into a response without touching the store.
///
/// Rendering consumes the pending flash messages.
fn build_response(session: &mut Session, reply: &Reply) -> Response {
    match reply {
        Reply::Redirect(path) => Redirect::to(path).into_response(),
        Reply::Render(page) => {
            let flash = session.data.take_flash();
            Html(views::render_page(*page, &session.data, &flash)).into_response()
        }
        Reply::NoContent => StatusCode::NO_CONTENT.into_response(),
        Reply::Text(body) => body.clone().into_response(),
    }
}

/// Turns a reply into a response, saves the session and sets its cookie.
///
/// A visitor with no session whose data is still empty gets no session at
/// all, so cookieless page views never occupy the store. When the changed
/// session no longer fits the store, the change is discarded and the page
/// is rendered from the session the request arrived with, plus an error.
fn finish(
    state: &AppState,
    headers: &HeaderMap,
    mut session: Session,
    reply: Reply,
) -> Result<Response> {
    let response = build_response(&mut session, &reply);

    if is_unused(&session) {
        trace!("Skipping save of empty session");
        return Ok(response);
    }

    let reply = match state.sessions.save(session) {
        Ok(cookie) => return attach_cookie(response, &cookie),
        Err(SessionError::CookieTooLarge { size, limit }) => {
            warn!(size, limit, "Session too large to store, discarding change");
            reply
        }
        Err(err) => return Err(err.into()),
    };

    // Rendering right away consumes the error flash, so the saved session is
    // never larger than the one the request arrived with.
    let mut session = load_session(state, headers);
    session.data.take_flash();
    session.data.flash_error(actions::SESSION_FULL);
    let page = match &reply {
        Reply::Render(page) => *page,
        Reply::Redirect(path) => page_for_path(path),
        Reply::NoContent | Reply::Text(_) => Page::Lists,
    };
    let response = build_response(&mut session, &Reply::Render(page));
    if is_unused(&session) {
        return Ok(response);
    }
    let cookie = state.sessions.save(session)?;
    attach_cookie(response, &cookie)
}

/// True for a fresh session that holds nothing worth storing.
fn is_unused(session: &Session) -> bool {
    session.key().is_none() && session.data == SessionData::default()
}

/// The page a redirect target shows.
fn page_for_path(path: &str) -> Page {
    path.strip_prefix(LISTS_PATH)
        .and_then(|rest| rest.strip_prefix('/'))
        .and_then(parse_id)
        .map_or(Page::Lists, Page::List)
}

/// Adds the `Set-Cookie` header for the saved session.
fn attach_cookie(mut response: Response, cookie: &str) -> Result<Response> {
    let header = HeaderValue::from_str(&session_cookie_header(cookie))
        .map_err(|err| ServerError::internal(format!("invalid session cookie: {err}")))?;
    response.headers_mut().append(SET_COOKIE, header);
    Ok(response)
}

/// Runs an action against a list id taken from the path.
///
/// Ids that are not integers cannot name a list.
fn with_list(
    state: &AppState,
    headers: &HeaderMap,
    raw_list_id: &str,
    action: impl FnOnce(&mut Session, u64) -> Reply,
) -> Result<Response> {
    let mut session = load_session(state, headers);
    let reply = match parse_id(raw_list_id) {
        Some(list_id) => action(&mut session, list_id),
        None => actions::list_not_found(&mut session.data),
    };
    finish(state, headers, session, reply)
}

/// Runs an action against a list id and a todo id taken from the path.
fn with_todo(
    state: &AppState,
    headers: &HeaderMap,
    (raw_list_id, raw_todo_id): (String, String),
    action: impl FnOnce(&mut Session, u64, u64) -> Reply,
) -> Result<Response> {
    with_list(state, headers, &raw_list_id, |session, list_id| {
        match parse_id(&raw_todo_id) {
            Some(todo_id) => action(session, list_id, todo_id),
            None if session.data.list(list_id).is_none() => {
                actions::list_not_found(&mut session.data)
            }
            None => actions::todo_not_found(&mut session.data, list_id),
        }
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// GET / - Redirect to the overview.
async fn get_root() -> Redirect {
    Redirect::to(LISTS_PATH)
}

/// GET /lists - Overview of all lists, incomplete lists first.
async fn get_lists(State(state): State<AppState>, headers: HeaderMap) -> Result<Response> {
    let session = load_session(&state, &headers);
    finish(&state, &headers, session, Reply::Render(Page::Lists))
}

/// GET /lists/new - Form for a new list.
async fn get_new_list(State(state): State<AppState>, headers: HeaderMap) -> Result<Response> {
    let session = load_session(&state, &headers);
    finish(&state, &headers, session, Reply::Render(Page::NewList))
}

/// POST /lists - Create a list.
async fn post_lists(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<NewListForm>,
) -> Result<Response> {
    let mut session = load_session(&state, &headers);
    let reply = actions::create_list(&mut session.data, &form.list_name);
    finish(&state, &headers, session, reply)
}

/// GET /lists/{id} - Show a list.
async fn get_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response> {
    with_list(&state, &headers, &id, |session, list_id| {
        actions::show_list(&mut session.data, list_id)
    })
}

/// GET /lists/{id}/edit - Rename form.
async fn get_edit_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response> {
    with_list(&state, &headers, &id, |session, list_id| {
        actions::edit_list(&mut session.data, list_id)
    })
}

/// POST /edit/{id} - Rename a list.
async fn post_rename_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Form(form): Form<RenameListForm>,
) -> Result<Response> {
    with_list(&state, &headers, &id, |session, list_id| {
        actions::rename_list(&mut session.data, list_id, &form.list_rename)
    })
}

/// POST /lists/delete/{id} - Delete a list.
///
/// Script-driven requests receive `/lists` as a plain-text body instead of a
/// redirect.
async fn post_delete_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response> {
    let xhr = is_xhr(&headers);
    with_list(&state, &headers, &id, |session, list_id| {
        actions::delete_list(&mut session.data, list_id, xhr)
    })
}

/// POST /lists/{id}/todos - Add a todo.
async fn post_todos(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Form(form): Form<NewTodoForm>,
) -> Result<Response> {
    with_list(&state, &headers, &id, |session, list_id| {
        actions::add_todo(&mut session.data, list_id, &form.todo)
    })
}

/// POST /lists/{id}/todo/complete/{todo_id} - Set a todo's completion.
async fn post_complete_todo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(ids): Path<(String, String)>,
    Form(form): Form<CompleteTodoForm>,
) -> Result<Response> {
    with_todo(&state, &headers, ids, |session, list_id, todo_id| {
        actions::set_todo_completed(&mut session.data, list_id, todo_id, form.is_completed())
    })
}

/// POST /lists/{id}/todo/delete/{todo_id} - Delete a todo.
///
/// Script-driven requests receive an empty `204`.
async fn post_delete_todo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(ids): Path<(String, String)>,
) -> Result<Response> {
    let xhr = is_xhr(&headers);
    with_todo(&state, &headers, ids, |session, list_id, todo_id| {
        actions::delete_todo(&mut session.data, list_id, todo_id, xhr)
    })
}

/// POST /lists/{id}/complete_all - Complete every todo in a list.
async fn post_complete_all(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response> {
    with_list(&state, &headers, &id, |session, list_id| {
        actions::complete_all(&mut session.data, list_id)
    })
}

/// Response body for the health check endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Server status.
    pub status: String,

    /// Name of the session backend.
    pub session_store: String,

    /// Sessions held server-side, absent for the cookie backend.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sessions: Option<usize>,

    /// Server uptime in seconds.
    pub uptime_seconds: u64,
}

/// GET /health - Health check endpoint.
///
/// # Response
///
/// ```json
/// {
///   "status": "ok",
///   "session_store": "memory",
///   "sessions": 12,
///   "uptime_seconds": 3600
/// }
/// ```
async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        session_store: state.sessions.name().to_string(),
        sessions: state.sessions.session_count(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

// ============================================================================
// Tests
// ============================================================================
