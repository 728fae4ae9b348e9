// Copyright 2023 Remi Bernotavicius

use derive_more::Display;
use diesel::associations::{Associations, Identifiable};
use diesel::deserialize::Queryable;
use diesel::expression::Selectable;
use diesel::prelude::{AsChangeset, Insertable};
use diesel_derive_enum::DbEnum;
use diesel_derive_newtype::DieselNewType;
use serde::{Deserialize, Serialize};
use strum::EnumIter;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(
            DieselNewType,
            Debug,
            Display,
            Hash,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Copy,
            Clone,
            Serialize,
            Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            pub const fn new(id: i32) -> Self {
                Self(id)
            }
        }
    };
}

id_type!(UserId);
id_type!(ProfileId);
id_type!(IngredientId);
id_type!(RecipeId);
id_type!(RecipeIngredientId);

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Serialize)]
#[diesel(table_name = crate::database::schema::users)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_active: bool,
    pub date_joined: chrono::NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::database::schema::users)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub is_active: bool,
    pub date_joined: chrono::NaiveDateTime,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq, Serialize)]
#[diesel(table_name = crate::database::schema::ingredients)]
pub struct Ingredient {
    pub id: IngredientId,
    pub name: String,
}

#[derive(
    Debug, Display, EnumIter, Hash, Default, Copy, Clone, PartialEq, Eq, DbEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Privacy {
    #[default]
    #[display("public")]
    Public,
    #[display("private")]
    Private,
}

#[derive(Associations, Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Serialize)]
#[diesel(belongs_to(User, foreign_key = author_id))]
#[diesel(table_name = crate::database::schema::recipes)]
pub struct Recipe {
    pub id: RecipeId,
    pub title: String,
    pub description: Option<String>,
    pub prep_time: Option<f32>,
    pub cook_time: Option<f32>,
    pub author_id: UserId,
    pub privacy: Privacy,
    pub directions: String,
    pub parent_id: Option<RecipeId>,
    pub created_at: chrono::NaiveDateTime,
}

/// Just enough of a recipe to link to it.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq, Serialize)]
#[diesel(table_name = crate::database::schema::recipes)]
pub struct RecipeHandle {
    pub id: RecipeId,
    pub title: String,
}

impl From<&Recipe> for RecipeHandle {
    fn from(recipe: &Recipe) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title.clone(),
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::database::schema::recipes)]
pub struct NewRecipe<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub prep_time: Option<f32>,
    pub cook_time: Option<f32>,
    pub author_id: UserId,
    pub privacy: Privacy,
    pub directions: &'a str,
    pub parent_id: Option<RecipeId>,
    pub created_at: chrono::NaiveDateTime,
}

/// The fields an author may change after creation. `created_at`, `author_id` and `parent_id` are
/// fixed for the life of the recipe.
#[derive(AsChangeset)]
#[diesel(table_name = crate::database::schema::recipes)]
#[diesel(treat_none_as_null = true)]
pub struct RecipeChangeset<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub prep_time: Option<f32>,
    pub cook_time: Option<f32>,
    pub privacy: Privacy,
    pub directions: &'a str,
}

#[derive(Associations, Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Serialize)]
#[diesel(belongs_to(Recipe))]
#[diesel(belongs_to(Ingredient))]
#[diesel(table_name = crate::database::schema::recipe_ingredients)]
pub struct RecipeIngredient {
    pub id: RecipeIngredientId,
    pub recipe_id: RecipeId,
    pub ingredient_id: IngredientId,
    pub quantity: String,
}

#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone, PartialEq, Serialize)]
#[diesel(belongs_to(User))]
#[diesel(table_name = crate::database::schema::profiles)]
pub struct Profile {
    pub id: ProfileId,
    pub user_id: UserId,
    pub about_me: Option<String>,
}
