// Copyright 2023 Remi Bernotavicius

//! Variations and their lineage. A variation records every recipe on its parent chain when it is
//! created; later changes further up the chain don't touch already-recorded sets.

use super::{ingredients, privacy, RecipeDraft};
use crate::database::{
    self,
    models::{Recipe, RecipeId, User},
};
use crate::error::Result;
use crate::forms::{RecipeForm, ValidRecipe};
use diesel::prelude::{Connection as _, OptionalExtension as _};
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;
use std::collections::{HashMap, HashSet};

/// Follows parent links from `start` (which is included) until a recipe without a parent. Nothing
/// in the data stops two recipes from naming each other as parent, so a recipe seen twice ends
/// the walk.
pub fn walk_lineage<F>(start: RecipeId, mut parent_of: F) -> Result<Vec<RecipeId>>
where
    F: FnMut(RecipeId) -> Result<Option<RecipeId>>,
{
    let mut lineage = vec![start];
    let mut visited = HashSet::from([start]);
    let mut current = start;
    while let Some(parent) = parent_of(current)? {
        if !visited.insert(parent) {
            log::warn!("recipe lineage of {start} loops back to {parent}, stopping there");
            break;
        }
        lineage.push(parent);
        current = parent;
    }
    Ok(lineage)
}

pub fn parent_of(conn: &mut database::Connection, recipe: RecipeId) -> Result<Option<RecipeId>> {
    use database::schema::recipes;

    recipes::table
        .find(recipe)
        .select(recipes::parent_id)
        .first(conn)
        .optional()?
        .ok_or_else(|| privacy::not_found(recipe))
}

/// Stores the lineage starting at `parent` as the ancestor set of `variation`, nearest first.
pub fn record_ancestors(
    conn: &mut database::Connection,
    variation: RecipeId,
    parent: RecipeId,
) -> Result<Vec<RecipeId>> {
    use database::schema::recipe_ancestors::dsl::*;

    let lineage = walk_lineage(parent, |r| parent_of(conn, r))?;
    for (ancestor, d) in lineage.iter().copied().zip(1i32..) {
        diesel::insert_or_ignore_into(recipe_ancestors)
            .values((
                recipe_id.eq(variation),
                ancestor_id.eq(ancestor),
                depth.eq(d),
            ))
            .execute(conn)?;
    }
    Ok(lineage)
}

pub fn ancestor_ids(conn: &mut database::Connection, recipe: RecipeId) -> Result<Vec<RecipeId>> {
    use database::schema::recipe_ancestors::dsl::*;

    Ok(recipe_ancestors
        .filter(recipe_id.eq(recipe))
        .order(depth.asc())
        .select(ancestor_id)
        .load(conn)?)
}

/// The recorded ancestors of `recipe`, nearest first.
pub fn ancestors(conn: &mut database::Connection, recipe: RecipeId) -> Result<Vec<Recipe>> {
    use database::schema::recipes::dsl::*;

    let ids = ancestor_ids(conn, recipe)?;
    let position: HashMap<RecipeId, usize> = ids.iter().enumerate().map(|(i, r)| (*r, i)).collect();
    let mut found: Vec<Recipe> = recipes
        .filter(id.eq_any(ids.clone()))
        .select(Recipe::as_select())
        .load(conn)?;
    found.sort_by_key(|r| position[&r.id]);
    Ok(found)
}

/// A form pre-filled from `parent`, ready to be tweaked into a variation.
pub fn variation_draft(
    conn: &mut database::Connection,
    requester: Option<&User>,
    parent: RecipeId,
) -> Result<RecipeDraft> {
    let parent = super::find_visible(conn, requester, parent)?;
    let usages = ingredients::for_recipe(conn, parent.id)?;
    Ok(RecipeDraft {
        page_title: "Vary Recipe",
        recipe_form: RecipeForm::from_recipe(&parent, ingredients::to_form_lines(&usages, false)),
    })
}

/// Creates `form` as a variation of `parent`. The recipe, its ingredient lines and its ancestor
/// set are written together or not at all.
pub fn create_variation(
    conn: &mut database::Connection,
    author: &User,
    parent: RecipeId,
    form: ValidRecipe,
) -> Result<Recipe> {
    conn.transaction(|conn| {
        let parent = super::find_visible(conn, Some(author), parent)?;
        let variation = super::insert(conn, author.id, Some(parent.id), &form.fields)?;

        // The lines came from the parent's form; they describe new rows for the variation.
        let lines: Vec<_> = form
            .lines
            .into_iter()
            .map(|mut line| {
                line.id = None;
                line
            })
            .collect();
        ingredients::save_lines(conn, variation.id, &lines)?;
        let lineage = record_ancestors(conn, variation.id, parent.id)?;

        log::info!(
            "{} created variation {} of {} ({} ancestors)",
            author.username,
            variation.id,
            parent.id,
            lineage.len()
        );
        Ok(variation)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{IngredientId, Privacy};
    use crate::error::Error;
    use crate::testing;
    use maplit::hashset;

    fn vary(
        conn: &mut database::Connection,
        author: &User,
        parent: &Recipe,
        title: &str,
    ) -> Recipe {
        let form = testing::recipe_form(title, Privacy::Public, &[]).validate().unwrap();
        create_variation(conn, author, parent.id, form).unwrap()
    }

    fn count_recipes(conn: &mut database::Connection) -> i64 {
        use database::schema::recipes::dsl::*;
        recipes.count().get_result(conn).unwrap()
    }

    #[test]
    fn walk_stops_at_root() {
        let parents = HashMap::from([
            (RecipeId::new(3), RecipeId::new(2)),
            (RecipeId::new(2), RecipeId::new(1)),
        ]);
        let lineage = walk_lineage(RecipeId::new(3), |r| Ok(parents.get(&r).copied())).unwrap();
        assert_eq!(lineage, [3, 2, 1].map(RecipeId::new));
    }

    #[test]
    fn walk_stops_on_cycle() {
        let mut calls = 0;
        let lineage = walk_lineage(RecipeId::new(1), |r| {
            calls += 1;
            Ok(Some(if r == RecipeId::new(1) {
                RecipeId::new(2)
            } else {
                RecipeId::new(1)
            }))
        })
        .unwrap();
        assert_eq!(lineage, [1, 2].map(RecipeId::new));
        assert_eq!(calls, 2);
    }

    #[test]
    fn root_has_no_ancestors() {
        let mut conn = database::establish_in_memory();
        let michael = testing::chef(&mut conn, "michael");
        let bread = testing::recipe(&mut conn, &michael, "No Work Bread", Privacy::Public);

        assert_eq!(bread.parent_id, None);
        assert!(ancestors(&mut conn, bread.id).unwrap().is_empty());
    }

    #[test]
    fn fuzzy_ants_on_a_log() {
        let mut conn = database::establish_in_memory();
        let michael = testing::chef(&mut conn, "michael");
        let ants = testing::recipe(&mut conn, &michael, "Ants on a log", Privacy::Public);

        let fuzzy = vary(&mut conn, &michael, &ants, "Fuzzy Ants on a log");

        assert_eq!(fuzzy.parent_id, Some(ants.id));
        let found = ancestors(&mut conn, fuzzy.id).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Ants on a log");
    }

    #[test]
    fn variation_inherits_parent_lineage() {
        let mut conn = database::establish_in_memory();
        let michael = testing::chef(&mut conn, "michael");
        let pam = testing::chef(&mut conn, "pam");
        let a = testing::recipe(&mut conn, &michael, "Ants on a log", Privacy::Public);
        let b = vary(&mut conn, &pam, &a, "Fuzzy Ants on a log");
        let c = vary(&mut conn, &michael, &b, "Fuzzier Ants on a log");

        let parent_set: HashSet<_> = ancestor_ids(&mut conn, b.id).unwrap().into_iter().collect();
        let child_set: HashSet<_> = ancestor_ids(&mut conn, c.id).unwrap().into_iter().collect();
        assert!(child_set.contains(&b.id));
        assert!(child_set.is_superset(&parent_set));
        assert_eq!(child_set, hashset! {a.id, b.id});

        // nearest first
        assert_eq!(ancestor_ids(&mut conn, c.id).unwrap(), [b.id, a.id]);
    }

    #[test]
    fn lineage_is_not_recomputed() {
        use database::schema::recipes::dsl::*;

        let mut conn = database::establish_in_memory();
        let michael = testing::chef(&mut conn, "michael");
        let a = testing::recipe(&mut conn, &michael, "Ants on a log", Privacy::Public);
        let b = testing::recipe(&mut conn, &michael, "Celery", Privacy::Public);
        let c = vary(&mut conn, &michael, &b, "Celery sticks");

        diesel::update(recipes.find(b.id))
            .set(parent_id.eq(a.id))
            .execute(&mut conn)
            .unwrap();

        assert_eq!(ancestor_ids(&mut conn, c.id).unwrap(), [b.id]);
    }

    #[test]
    fn cyclic_parents_terminate() {
        use database::schema::recipes::dsl::*;

        let mut conn = database::establish_in_memory();
        let michael = testing::chef(&mut conn, "michael");
        let a = testing::recipe(&mut conn, &michael, "Ants on a log", Privacy::Public);
        let b = vary(&mut conn, &michael, &a, "Fuzzy Ants on a log");
        diesel::update(recipes.find(a.id))
            .set(parent_id.eq(b.id))
            .execute(&mut conn)
            .unwrap();

        let c = vary(&mut conn, &michael, &b, "Fuzzier Ants on a log");
        assert_eq!(ancestor_ids(&mut conn, c.id).unwrap(), [b.id, a.id]);
    }

    #[test]
    fn failed_line_rolls_back_variation() {
        let mut conn = database::establish_in_memory();
        let michael = testing::chef(&mut conn, "michael");
        let [flour, ..] = testing::pantry(&mut conn);
        let ants = testing::recipe(&mut conn, &michael, "Ants on a log", Privacy::Public);
        let before = count_recipes(&mut conn);

        let form = testing::recipe_form(
            "Fuzzy Ants on a log",
            Privacy::Public,
            &[(flour.id, "1 cup"), (IngredientId::new(99), "2 cups")],
        )
        .validate()
        .unwrap();
        let err = create_variation(&mut conn, &michael, ants.id, form).unwrap_err();

        assert!(matches!(err, Error::Integrity(_)));
        assert_eq!(count_recipes(&mut conn), before);
        let rows: i64 = {
            use database::schema::recipe_ingredients::dsl::*;
            recipe_ingredients.count().get_result(&mut conn).unwrap()
        };
        assert_eq!(rows, 0);
    }

    #[test]
    fn cannot_vary_hidden_recipe() {
        let mut conn = database::establish_in_memory();
        let michael = testing::chef(&mut conn, "michael");
        let pam = testing::chef(&mut conn, "pam");
        let secret = testing::recipe(&mut conn, &michael, "Secret Sauce", Privacy::Private);

        let form = testing::recipe_form("Not So Secret", Privacy::Public, &[])
            .validate()
            .unwrap();
        let err = create_variation(&mut conn, &pam, secret.id, form).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(matches!(
            variation_draft(&mut conn, Some(&pam), secret.id),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn draft_copies_parent_without_line_ids() {
        let mut conn = database::establish_in_memory();
        let michael = testing::chef(&mut conn, "michael");
        let [_, _, salt, _] = testing::pantry(&mut conn);
        let form = testing::recipe_form("No Work Bread", Privacy::Public, &[(salt.id, "1 tsp")])
            .validate()
            .unwrap();
        let bread = crate::recipe::create(&mut conn, &michael, form).unwrap();

        let draft = variation_draft(&mut conn, None, bread.id).unwrap();
        assert_eq!(draft.page_title, "Vary Recipe");
        assert_eq!(draft.recipe_form.title, "No Work Bread");
        assert_eq!(draft.recipe_form.ingredients.len(), 1);
        assert_eq!(draft.recipe_form.ingredients[0].id, None);
        assert_eq!(draft.recipe_form.ingredients[0].ingredient, Some(salt.id));
    }
}
