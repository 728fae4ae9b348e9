// Copyright 2023 Remi Bernotavicius

use super::{AppState, Requester};
use crate::accounts::{self, Permission};
use crate::database::models::{Recipe, RecipeId};
use crate::error::Result;
use crate::forms::RecipeForm;
use crate::ingredient::{self, Completion, CompletionId, Completions};
use crate::profile;
use crate::recipe::{self, ancestry, RecipeDetail, RecipeDraft};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recipe/add", get(add_form).post(add))
        .route("/recipe/mine", get(mine))
        .route("/recipe/favorites", get(favorites))
        .route(
            "/recipe/ingredient-autocomplete",
            get(autocomplete).post(create_ingredient),
        )
        .route("/recipe/{id}", get(detail))
        .route("/recipe/{id}/edit", get(edit_form).post(edit))
        .route("/recipe/{id}/vary", get(vary_form).post(vary))
        .route("/recipe/{id}/favorite", post(favorite).delete(unfavorite))
}

async fn detail(
    State(state): State<AppState>,
    requester: Requester,
    Path(id): Path<RecipeId>,
) -> Result<Json<RecipeDetail>> {
    let detail = state
        .run(move |conn| recipe::detail(conn, requester.user(), id))
        .await?;
    Ok(Json(detail))
}

async fn add_form(State(state): State<AppState>, requester: Requester) -> Result<Json<RecipeDraft>> {
    let user = requester.require()?;
    state
        .run(move |conn| accounts::require_permission(conn, &user, Permission::AddRecipe))
        .await?;
    Ok(Json(recipe::new_draft()))
}

async fn add(
    State(state): State<AppState>,
    requester: Requester,
    Json(form): Json<RecipeForm>,
) -> Result<(StatusCode, Json<Recipe>)> {
    let user = requester.require()?;
    let recipe = state
        .run(move |conn| {
            accounts::require_permission(conn, &user, Permission::AddRecipe)?;
            recipe::create(conn, &user, form.validate()?)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

async fn edit_form(
    State(state): State<AppState>,
    requester: Requester,
    Path(id): Path<RecipeId>,
) -> Result<Json<RecipeDraft>> {
    let user = requester.require()?;
    let draft = state
        .run(move |conn| {
            accounts::require_permission(conn, &user, Permission::ChangeRecipe)?;
            recipe::edit_draft(conn, &user, id)
        })
        .await?;
    Ok(Json(draft))
}

async fn edit(
    State(state): State<AppState>,
    requester: Requester,
    Path(id): Path<RecipeId>,
    Json(form): Json<RecipeForm>,
) -> Result<Json<Recipe>> {
    let user = requester.require()?;
    let recipe = state
        .run(move |conn| {
            accounts::require_permission(conn, &user, Permission::ChangeRecipe)?;
            recipe::update(conn, &user, id, form.validate()?)
        })
        .await?;
    Ok(Json(recipe))
}

async fn vary_form(
    State(state): State<AppState>,
    requester: Requester,
    Path(id): Path<RecipeId>,
) -> Result<Json<RecipeDraft>> {
    let user = requester.require()?;
    let draft = state
        .run(move |conn| {
            accounts::require_permission(conn, &user, Permission::AddRecipe)?;
            ancestry::variation_draft(conn, Some(&user), id)
        })
        .await?;
    Ok(Json(draft))
}

async fn vary(
    State(state): State<AppState>,
    requester: Requester,
    Path(id): Path<RecipeId>,
    Json(form): Json<RecipeForm>,
) -> Result<(StatusCode, Json<Recipe>)> {
    let user = requester.require()?;
    let variation = state
        .run(move |conn| {
            accounts::require_permission(conn, &user, Permission::AddRecipe)?;
            ancestry::create_variation(conn, &user, id, form.validate()?)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(variation)))
}

async fn mine(State(state): State<AppState>, requester: Requester) -> Result<Json<Vec<Recipe>>> {
    let user = requester.require()?;
    let recipes = state
        .run(move |conn| recipe::authored_by(conn, user.id))
        .await?;
    Ok(Json(recipes))
}

async fn favorites(
    State(state): State<AppState>,
    requester: Requester,
) -> Result<Json<Vec<Recipe>>> {
    let user = requester.require()?;
    let recipes = state
        .run(move |conn| {
            let profile = profile::for_user(conn, user.id)?;
            profile::favorites(conn, profile.id, Some(user.id))
        })
        .await?;
    Ok(Json(recipes))
}

async fn favorite(
    State(state): State<AppState>,
    requester: Requester,
    Path(id): Path<RecipeId>,
) -> Result<StatusCode> {
    let user = requester.require()?;
    state
        .run(move |conn| {
            let recipe = recipe::find_visible(conn, Some(&user), id)?;
            let profile = profile::for_user(conn, user.id)?;
            profile::add_favorite(conn, &profile, recipe.id)
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Unfavoriting works even once the recipe has gone private.
async fn unfavorite(
    State(state): State<AppState>,
    requester: Requester,
    Path(id): Path<RecipeId>,
) -> Result<StatusCode> {
    let user = requester.require()?;
    state
        .run(move |conn| {
            let profile = profile::for_user(conn, user.id)?;
            profile::remove_favorite(conn, &profile, id)
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize, Debug, Default)]
struct AutocompleteQuery {
    #[serde(default)]
    q: String,
    #[serde(default)]
    page: Option<usize>,
}

/// Anonymous requesters get no suggestions at all. The "Create" entry is only offered to those
/// allowed to follow through on it.
async fn autocomplete(
    State(state): State<AppState>,
    requester: Requester,
    Query(query): Query<AutocompleteQuery>,
) -> Result<Json<Completions>> {
    let Some(user) = requester.require().ok() else {
        return Ok(Json(Completions::empty()));
    };
    let completions = state
        .run(move |conn| {
            let can_create = accounts::has_permission(conn, user.id, Permission::AddIngredient)?;
            ingredient::autocomplete(conn, &query.q, query.page.unwrap_or(1), can_create)
        })
        .await?;
    Ok(Json(completions))
}

#[derive(Deserialize, Debug)]
struct CreateIngredient {
    text: String,
}

async fn create_ingredient(
    State(state): State<AppState>,
    requester: Requester,
    Json(body): Json<CreateIngredient>,
) -> Result<(StatusCode, Json<Completion>)> {
    let user = requester.require()?;
    let ingredient = state
        .run(move |conn| {
            accounts::require_permission(conn, &user, Permission::AddIngredient)?;
            ingredient::create(conn, &body.text)
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(Completion {
            text: ingredient.name,
            id: CompletionId::Ingredient(ingredient.id),
            create_id: false,
        }),
    ))
}
