// Copyright 2023 Remi Bernotavicius

use super::{AppState, Requester};
use crate::database::models::IngredientId;
use crate::error::Result;
use crate::forms::ProfileForm;
use crate::ingredient;
use crate::profile::{self, IngredientPreference, ProfileSummary};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(summary))
        .route("/profile/edit", get(edit_form).post(edit))
        .route(
            "/profile/{preference}/{ingredient_id}",
            post(add_preference).delete(remove_preference),
        )
}

async fn summary(
    State(state): State<AppState>,
    requester: Requester,
) -> Result<Json<ProfileSummary>> {
    let user = requester.require()?;
    let summary = state.run(move |conn| profile::summary(conn, &user)).await?;
    Ok(Json(summary))
}

async fn edit_form(State(state): State<AppState>, requester: Requester) -> Result<Json<ProfileForm>> {
    let user = requester.require()?;
    let form = state.run(move |conn| profile::edit_form(conn, &user)).await?;
    Ok(Json(form))
}

async fn edit(
    State(state): State<AppState>,
    requester: Requester,
    Json(form): Json<ProfileForm>,
) -> Result<Json<ProfileSummary>> {
    let user = requester.require()?;
    let summary = state
        .run(move |conn| {
            profile::edit(conn, &user, form)?;
            // The identity row changed too.
            let user = crate::accounts::find(conn, user.id)?;
            profile::summary(conn, &user)
        })
        .await?;
    Ok(Json(summary))
}

async fn add_preference(
    State(state): State<AppState>,
    requester: Requester,
    Path((preference, ingredient_id)): Path<(IngredientPreference, IngredientId)>,
) -> Result<StatusCode> {
    let user = requester.require()?;
    state
        .run(move |conn| {
            let ingredient = ingredient::find(conn, ingredient_id)?;
            let profile = profile::for_user(conn, user.id)?;
            profile::add_ingredient_preference(conn, &profile, preference, ingredient.id)
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_preference(
    State(state): State<AppState>,
    requester: Requester,
    Path((preference, ingredient_id)): Path<(IngredientPreference, IngredientId)>,
) -> Result<StatusCode> {
    let user = requester.require()?;
    state
        .run(move |conn| {
            let profile = profile::for_user(conn, user.id)?;
            profile::remove_ingredient_preference(conn, &profile, preference, ingredient_id)
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
