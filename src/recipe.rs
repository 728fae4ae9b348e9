// Copyright 2023 Remi Bernotavicius

use crate::database::{
    self,
    models::{NewRecipe, Privacy, Recipe, RecipeChangeset, RecipeHandle, RecipeId, User, UserId},
};
use crate::error::Result;
use crate::forms::{IngredientLineForm, RecipeFields, RecipeForm, ValidRecipe};
use diesel::prelude::{Connection as _, OptionalExtension as _};
use diesel::BoolExpressionMethods as _;
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;
use serde::Serialize;

pub mod ancestry;
pub mod ingredients;
pub mod privacy;

pub use ingredients::IngredientUsage;

/// How many recipes the home page shows.
pub const LATEST_COUNT: i64 = 10;

/// What a renderer needs to show the add, edit or vary form.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RecipeDraft {
    pub page_title: &'static str,
    pub recipe_form: RecipeForm,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RecipeDetail {
    pub recipe: Recipe,
    pub ingredients: Vec<IngredientUsage>,
    pub parent: Option<RecipeHandle>,
    pub ancestors: Vec<RecipeHandle>,
    pub variations: Vec<RecipeHandle>,
}

pub fn find(conn: &mut database::Connection, recipe_id: RecipeId) -> Result<Recipe> {
    use database::schema::recipes;

    recipes::table
        .find(recipe_id)
        .select(Recipe::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| privacy::not_found(recipe_id))
}

/// Missing and private-to-someone-else recipes both come back as not found.
pub fn find_visible(
    conn: &mut database::Connection,
    requester: Option<&User>,
    recipe_id: RecipeId,
) -> Result<Recipe> {
    let recipe = find(conn, recipe_id)?;
    privacy::require_visible(requester.map(|u| u.id), recipe)
}

/// Only the author may change a recipe; to anyone else it looks like there is nothing to edit.
pub fn find_owned(
    conn: &mut database::Connection,
    editor: &User,
    recipe_id: RecipeId,
) -> Result<Recipe> {
    let recipe = find(conn, recipe_id)?;
    if recipe.author_id == editor.id {
        Ok(recipe)
    } else {
        Err(privacy::not_found(recipe_id))
    }
}

pub(crate) fn insert(
    conn: &mut database::Connection,
    author: UserId,
    parent: Option<RecipeId>,
    fields: &RecipeFields,
) -> Result<Recipe> {
    use database::schema::recipes;

    let recipe = diesel::insert_into(recipes::table)
        .values(NewRecipe {
            title: &fields.title,
            description: fields.description.as_deref(),
            prep_time: fields.prep_time,
            cook_time: fields.cook_time,
            author_id: author,
            privacy: fields.privacy,
            directions: &fields.directions,
            parent_id: parent,
            created_at: chrono::Utc::now().naive_utc(),
        })
        .returning(Recipe::as_returning())
        .get_result(conn)?;
    Ok(recipe)
}

pub fn create(conn: &mut database::Connection, author: &User, form: ValidRecipe) -> Result<Recipe> {
    conn.transaction(|conn| {
        let recipe = insert(conn, author.id, None, &form.fields)?;
        ingredients::save_lines(conn, recipe.id, &form.lines)?;

        log::info!("{} created recipe {} ({:?})", author.username, recipe.id, recipe.title);
        Ok(recipe)
    })
}

pub fn update(
    conn: &mut database::Connection,
    editor: &User,
    recipe_id: RecipeId,
    form: ValidRecipe,
) -> Result<Recipe> {
    use database::schema::recipes;

    conn.transaction(|conn| {
        find_owned(conn, editor, recipe_id)?;
        let fields = &form.fields;
        let recipe = diesel::update(recipes::table.find(recipe_id))
            .set(RecipeChangeset {
                title: &fields.title,
                description: fields.description.as_deref(),
                prep_time: fields.prep_time,
                cook_time: fields.cook_time,
                privacy: fields.privacy,
                directions: &fields.directions,
            })
            .returning(Recipe::as_returning())
            .get_result(conn)?;
        ingredients::save_lines(conn, recipe.id, &form.lines)?;

        log::info!("{} edited recipe {}", editor.username, recipe.id);
        Ok(recipe)
    })
}

pub fn new_draft() -> RecipeDraft {
    RecipeDraft {
        page_title: "Add Recipe",
        recipe_form: RecipeForm {
            ingredients: vec![IngredientLineForm::default()],
            ..RecipeForm::default()
        },
    }
}

pub fn edit_draft(
    conn: &mut database::Connection,
    editor: &User,
    recipe_id: RecipeId,
) -> Result<RecipeDraft> {
    let recipe = find_owned(conn, editor, recipe_id)?;
    let usages = ingredients::for_recipe(conn, recipe.id)?;
    Ok(RecipeDraft {
        page_title: "Edit Recipe",
        recipe_form: RecipeForm::from_recipe(&recipe, ingredients::to_form_lines(&usages, true)),
    })
}

/// The recipe with its ingredient list and the relatives the requester is allowed to see.
pub fn detail(
    conn: &mut database::Connection,
    requester: Option<&User>,
    recipe_id: RecipeId,
) -> Result<RecipeDetail> {
    use database::schema::recipes;

    let recipe = find_visible(conn, requester, recipe_id)?;
    let viewer = requester.map(|u| u.id);

    let ingredients = ingredients::for_recipe(conn, recipe.id)?;
    let parent = match recipe.parent_id {
        Some(parent_id) => Some(find(conn, parent_id)?)
            .filter(|p| privacy::can_view(viewer, p))
            .map(|p| RecipeHandle::from(&p)),
        None => None,
    };
    let ancestors = ancestry::ancestors(conn, recipe.id)?
        .iter()
        .filter(|r| privacy::can_view(viewer, r))
        .map(RecipeHandle::from)
        .collect();
    let variations = recipes::table
        .filter(recipes::parent_id.eq(recipe.id))
        .order(recipes::id.asc())
        .select(Recipe::as_select())
        .load::<Recipe>(conn)?
        .iter()
        .filter(|r| privacy::can_view(viewer, r))
        .map(RecipeHandle::from)
        .collect();

    Ok(RecipeDetail {
        recipe,
        ingredients,
        parent,
        ancestors,
        variations,
    })
}

/// The newest recipes the requester can see.
pub fn latest(
    conn: &mut database::Connection,
    requester: Option<&User>,
    limit: i64,
) -> Result<Vec<Recipe>> {
    use database::schema::recipes;

    let mut query = recipes::table
        .order((recipes::created_at.desc(), recipes::id.desc()))
        .limit(limit)
        .select(Recipe::as_select())
        .into_boxed();
    query = match requester {
        Some(user) => query.filter(
            recipes::privacy
                .eq(Privacy::Public)
                .or(recipes::author_id.eq(user.id)),
        ),
        None => query.filter(recipes::privacy.eq(Privacy::Public)),
    };
    Ok(query.load(conn)?)
}

/// Everything `author` wrote, private recipes included, newest first.
pub fn authored_by(conn: &mut database::Connection, author: UserId) -> Result<Vec<Recipe>> {
    use database::schema::recipes;

    Ok(recipes::table
        .filter(recipes::author_id.eq(author))
        .order((recipes::created_at.desc(), recipes::id.desc()))
        .select(Recipe::as_select())
        .load(conn)?)
}
