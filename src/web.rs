// Copyright 2023 Remi Bernotavicius

//! JSON API over the recipe, ingredient and profile operations. Requests are authenticated
//! upstream; the proxy passes the identity along in the `X-User-Id` header.

use crate::accounts;
use crate::database::{
    self,
    models::{Recipe, User, UserId},
};
use crate::error::{Error, Result};
use crate::recipe;
use axum::extract::{FromRequestParts, State};
use axum::http::{request::Parts, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

mod profiles;
mod recipes;
#[cfg(test)]
mod tests;

pub const USER_HEADER: &str = "x-user-id";

/// One connection shared by every request; each request's database work runs on the blocking
/// pool while holding it.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<database::Connection>>,
}

impl AppState {
    pub fn new(conn: database::Connection) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
        }
    }

    pub async fn run<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut database::Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = match db.lock() {
                Ok(conn) => conn,
                // A panicking request must not lock everyone else out.
                Err(poisoned) => {
                    log::warn!("recovering database connection after a panicked request");
                    db.clear_poison();
                    let mut conn = poisoned.into_inner();
                    database::abandon_open_transactions(&mut conn)?;
                    conn
                }
            };
            f(&mut conn)
        })
        .await
        .map_err(|e| Error::Internal(e.to_string()))?
    }
}

/// Whoever is making the request. Unknown or deactivated ids count as anonymous.
#[derive(Debug, Clone)]
pub struct Requester(Option<User>);

impl Requester {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }

    pub fn require(self) -> Result<User> {
        self.0.ok_or(Error::Unauthenticated)
    }
}

impl FromRequestParts<AppState> for Requester {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let Some(value) = parts.headers.get(USER_HEADER) else {
            return Ok(Self(None));
        };
        let Some(user_id) = value.to_str().ok().and_then(|v| v.trim().parse().ok()) else {
            log::warn!("ignoring malformed {USER_HEADER} header {value:?}");
            return Ok(Self(None));
        };
        let user = state
            .run(move |conn| accounts::find_active(conn, UserId::new(user_id)))
            .await?;
        Ok(Self(user))
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Integrity(_) => StatusCode::CONFLICT,
            Error::Unauthenticated => StatusCode::UNAUTHORIZED,
            Error::PermissionDenied(_) => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = match &self {
            // Deliberately the same body whatever was not found.
            Error::NotFound(what) => {
                log::debug!("{what} not found");
                json!({"error": "not found"})
            }
            Error::Validation(fields) => json!({"error": "validation failed", "fields": fields}),
            err if status.is_server_error() => {
                log::error!("{err}");
                json!({"error": "internal error"})
            }
            err => json!({"error": err.to_string()}),
        };
        (status, Json(body)).into_response()
    }
}

async fn home(State(state): State<AppState>, requester: Requester) -> Result<Json<Vec<Recipe>>> {
    let latest = state
        .run(move |conn| recipe::latest(conn, requester.user(), recipe::LATEST_COUNT))
        .await?;
    Ok(Json(latest))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .merge(recipes::router())
        .merge(profiles::router())
        .with_state(state)
}

pub async fn serve(conn: database::Connection, address: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(address).await?;
    log::info!("serving on http://{}", listener.local_addr()?);
    axum::serve(listener, router(AppState::new(conn))).await?;
    Ok(())
}
