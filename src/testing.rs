// Copyright 2023 Remi Bernotavicius

//! Fixtures shared by the unit tests.

use crate::accounts;
use crate::database::{
    self,
    models::{Ingredient, IngredientId, Privacy, Recipe, User},
};
use crate::forms::{IngredientLineForm, RecipeForm, RegistrationForm};
use crate::{ingredient, recipe};

/// A registered and activated user.
pub fn chef(conn: &mut database::Connection, username: &str) -> User {
    let user = accounts::register(
        conn,
        RegistrationForm {
            username: username.into(),
            ..RegistrationForm::default()
        },
    )
    .unwrap();
    accounts::activate(conn, user.id).unwrap()
}

/// flour, water, salt and yeast, with ids 1 through 4.
pub fn pantry(conn: &mut database::Connection) -> [Ingredient; 4] {
    ["flour", "water", "salt", "yeast"].map(|name| ingredient::create(conn, name).unwrap())
}

pub fn recipe_form(title: &str, privacy: Privacy, ingredients: &[(IngredientId, &str)]) -> RecipeForm {
    RecipeForm {
        title: title.into(),
        privacy,
        directions: "Chop it all and mix it up!".into(),
        ingredients: ingredients
            .iter()
            .map(|&(ingredient, quantity)| IngredientLineForm {
                id: None,
                ingredient: Some(ingredient),
                quantity: quantity.into(),
            })
            .collect(),
        ..RecipeForm::default()
    }
}

pub fn recipe(
    conn: &mut database::Connection,
    author: &User,
    title: &str,
    privacy: Privacy,
) -> Recipe {
    let form = recipe_form(title, privacy, &[]).validate().unwrap();
    recipe::create(conn, author, form).unwrap()
}
