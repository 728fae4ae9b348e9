// Copyright 2023 Remi Bernotavicius

use crate::database::{
    self,
    models::{Ingredient, RecipeId, RecipeIngredient, RecipeIngredientId},
};
use crate::error::{Error, Result};
use crate::forms::{IngredientLine, IngredientLineForm};
use crate::ingredient;
use diesel::prelude::OptionalExtension as _;
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;
use serde::Serialize;

/// One line of a recipe's ingredient list.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct IngredientUsage {
    pub id: RecipeIngredientId,
    pub ingredient: Ingredient,
    pub quantity: String,
}

pub fn for_recipe(
    conn: &mut database::Connection,
    recipe: RecipeId,
) -> Result<Vec<IngredientUsage>> {
    use database::schema::{ingredients, recipe_ingredients};

    let rows: Vec<(RecipeIngredient, Ingredient)> = recipe_ingredients::table
        .inner_join(ingredients::table)
        .filter(recipe_ingredients::recipe_id.eq(recipe))
        .order(recipe_ingredients::id.asc())
        .select((RecipeIngredient::as_select(), Ingredient::as_select()))
        .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|(usage, ingredient)| IngredientUsage {
            id: usage.id,
            ingredient,
            quantity: usage.quantity,
        })
        .collect())
}

/// Form rows for an existing ingredient list. Edits keep the association ids so the rows are
/// updated in place; variations drop them so new rows get created.
pub fn to_form_lines(usages: &[IngredientUsage], keep_ids: bool) -> Vec<IngredientLineForm> {
    usages
        .iter()
        .map(|u| IngredientLineForm {
            id: keep_ids.then_some(u.id),
            ingredient: Some(u.ingredient.id),
            quantity: u.quantity.clone(),
        })
        .collect()
}

/// Lines carrying an association id update that association, the rest become new associations.
/// Must run inside the transaction that writes the recipe.
pub fn save_lines(
    conn: &mut database::Connection,
    recipe: RecipeId,
    lines: &[IngredientLine],
) -> Result<Vec<RecipeIngredient>> {
    use database::schema::recipe_ingredients::dsl::*;

    let mut saved = vec![];
    for line in lines {
        if !ingredient::exists(conn, line.ingredient_id)? {
            return Err(Error::Integrity(format!(
                "ingredient {} does not exist",
                line.ingredient_id
            )));
        }

        let row = match line.id {
            Some(usage_id) => diesel::update(
                recipe_ingredients
                    .find(usage_id)
                    .filter(recipe_id.eq(recipe)),
            )
            .set((
                ingredient_id.eq(line.ingredient_id),
                quantity.eq(&line.quantity),
            ))
            .returning(RecipeIngredient::as_returning())
            .get_result(conn)
            .optional()?
            .ok_or_else(|| {
                Error::Integrity(format!(
                    "ingredient line {usage_id} does not belong to recipe {recipe}"
                ))
            })?,
            None => diesel::insert_into(recipe_ingredients)
                .values((
                    recipe_id.eq(recipe),
                    ingredient_id.eq(line.ingredient_id),
                    quantity.eq(&line.quantity),
                ))
                .returning(RecipeIngredient::as_returning())
                .get_result(conn)?,
        };
        saved.push(row);
    }
    Ok(saved)
}
