// Copyright 2023 Remi Bernotavicius

use crate::database::{
    self,
    models::{Ingredient, IngredientId},
};
use crate::error::{Error, FieldErrors, Result};
use diesel::prelude::OptionalExtension as _;
use diesel::EscapeExpressionMethods as _;
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;
use diesel::TextExpressionMethods as _;
use serde::Serialize;

pub const PAGE_SIZE: usize = 10;

/// Names aren't unique; creating "salt" twice gives two ingredients.
pub fn create(conn: &mut database::Connection, new_name: &str) -> Result<Ingredient> {
    use database::schema::ingredients::dsl::*;

    let new_name = new_name.trim();
    if new_name.is_empty() {
        let mut errors = FieldErrors::new();
        errors.add("name", "This field is required.");
        return Err(Error::Validation(errors));
    }

    let ingredient = diesel::insert_into(ingredients)
        .values(name.eq(new_name))
        .returning(Ingredient::as_returning())
        .get_result(conn)?;
    log::debug!("created ingredient {} ({})", ingredient.name, ingredient.id);
    Ok(ingredient)
}

pub fn find(conn: &mut database::Connection, ingredient_id: IngredientId) -> Result<Ingredient> {
    use database::schema::ingredients::dsl::*;

    ingredients
        .find(ingredient_id)
        .select(Ingredient::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| Error::NotFound(format!("ingredient {ingredient_id}")))
}

pub fn exists(conn: &mut database::Connection, ingredient_id: IngredientId) -> Result<bool> {
    use database::schema::ingredients::dsl::*;

    Ok(diesel::select(diesel::dsl::exists(ingredients.find(ingredient_id))).get_result(conn)?)
}

fn escape_like(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum CompletionId {
    Ingredient(IngredientId),
    Create(String),
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub id: CompletionId,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub create_id: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub more: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Completions {
    pub pagination: Pagination,
    pub results: Vec<Completion>,
}

impl Completions {
    pub fn empty() -> Self {
        Self {
            pagination: Pagination { more: false },
            results: vec![],
        }
    }
}

/// Ingredients whose name starts with `query`, ignoring ASCII case, in creation order. When
/// `can_create` is set, the first page also offers to create `query` if no ingredient anywhere in
/// the catalog already has exactly that name.
pub fn autocomplete(
    conn: &mut database::Connection,
    query: &str,
    page: usize,
    can_create: bool,
) -> Result<Completions> {
    use database::schema::ingredients::dsl::*;

    let query = query.trim();
    let page = page.max(1);
    let Some(skip) = (page - 1)
        .checked_mul(PAGE_SIZE)
        .and_then(|o| i64::try_from(o).ok())
    else {
        log::debug!("autocomplete page {page} is out of range");
        return Ok(Completions::empty());
    };
    let pattern = format!("{}%", escape_like(query));

    let mut found: Vec<Ingredient> = ingredients
        .filter(name.like(&pattern).escape('\\'))
        .order(id.asc())
        .offset(skip)
        .limit(PAGE_SIZE as i64 + 1)
        .select(Ingredient::as_select())
        .load(conn)?;
    let more = found.len() > PAGE_SIZE;
    found.truncate(PAGE_SIZE);

    let mut results: Vec<_> = found
        .into_iter()
        .map(|i| Completion {
            text: i.name,
            id: CompletionId::Ingredient(i.id),
            create_id: false,
        })
        .collect();

    if can_create && page == 1 && !query.is_empty() {
        let exact: bool = diesel::select(diesel::dsl::exists(
            ingredients.filter(name.like(escape_like(query)).escape('\\')),
        ))
        .get_result(conn)?;
        if !exact {
            results.push(Completion {
                text: format!("Create \"{query}\""),
                id: CompletionId::Create(query.to_owned()),
                create_id: true,
            });
        }
    }

    Ok(Completions {
        pagination: Pagination { more },
        results,
    })
}
