// Copyright 2023 Remi Bernotavicius

//! Chef profiles: the about-me text plus three independent sets (favorite recipes, liked
//! ingredients, disliked ingredients). An ingredient may be both liked and disliked.

use crate::database::{
    self,
    models::{Ingredient, IngredientId, Profile, ProfileId, Recipe, RecipeId, User, UserId},
};
use crate::error::{Error, Result};
use crate::forms::ProfileForm;
use crate::recipe::privacy;
use diesel::prelude::{Connection as _, OptionalExtension as _};
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;
use serde::ser::{SerializeStruct as _, Serializer};
use serde::{Deserialize, Serialize};

/// A profile seen together with the identity that owns it.
#[derive(Debug, Clone, Copy)]
pub struct ChefProfile<'a> {
    pub profile: &'a Profile,
    pub user: &'a User,
}

impl<'a> ChefProfile<'a> {
    pub fn new(profile: &'a Profile, user: &'a User) -> Self {
        debug_assert_eq!(profile.user_id, user.id);
        Self { profile, user }
    }

    pub fn is_active(&self) -> bool {
        self.user.is_active
    }
}

#[derive(Debug, Hash, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngredientPreference {
    Liked,
    Disliked,
}

/// Everything the profile page shows.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSummary {
    pub user: User,
    pub profile: Profile,
    pub favorites: Vec<Recipe>,
    pub liked_ingredients: Vec<Ingredient>,
    pub disliked_ingredients: Vec<Ingredient>,
}

impl ProfileSummary {
    pub fn chef(&self) -> ChefProfile<'_> {
        ChefProfile::new(&self.profile, &self.user)
    }
}

/// `is_active` is written out alongside the stored fields, taken from the owning user.
impl Serialize for ProfileSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ProfileSummary", 6)?;
        state.serialize_field("user", &self.user)?;
        state.serialize_field("profile", &self.profile)?;
        state.serialize_field("is_active", &self.chef().is_active())?;
        state.serialize_field("favorites", &self.favorites)?;
        state.serialize_field("liked_ingredients", &self.liked_ingredients)?;
        state.serialize_field("disliked_ingredients", &self.disliked_ingredients)?;
        state.end()
    }
}

/// Every identity gets exactly one of these, created alongside it.
pub fn create_for(conn: &mut database::Connection, user: UserId) -> Result<Profile> {
    use database::schema::profiles::dsl::*;

    Ok(diesel::insert_into(profiles)
        .values(user_id.eq(user))
        .returning(Profile::as_returning())
        .get_result(conn)?)
}

pub fn for_user(conn: &mut database::Connection, user: UserId) -> Result<Profile> {
    use database::schema::profiles::dsl::*;

    profiles
        .filter(user_id.eq(user))
        .select(Profile::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| Error::NotFound(format!("profile for user {user}")))
}

/// Profiles whose identity is still active.
pub fn active(conn: &mut database::Connection) -> Result<Vec<(Profile, User)>> {
    use database::schema::{profiles, users};

    Ok(profiles::table
        .inner_join(users::table)
        .filter(users::is_active.eq(true))
        .order(profiles::id.asc())
        .select((Profile::as_select(), User::as_select()))
        .load(conn)?)
}

pub fn edit(conn: &mut database::Connection, user: &User, form: ProfileForm) -> Result<Profile> {
    use database::schema::{profiles, users};

    let form = form.validate()?;
    conn.transaction(|conn| {
        diesel::update(users::table.find(user.id))
            .set((
                users::first_name.eq(&form.first_name),
                users::last_name.eq(&form.last_name),
                users::email.eq(&form.email),
            ))
            .execute(conn)?;
        let profile = diesel::update(profiles::table.filter(profiles::user_id.eq(user.id)))
            .set(profiles::about_me.eq(form.about_me.as_deref()))
            .returning(Profile::as_returning())
            .get_result(conn)
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("profile for user {}", user.id)))?;

        log::info!("{} updated their profile", user.username);
        Ok(profile)
    })
}

/// The edit form pre-filled with what the chef currently has.
pub fn edit_form(conn: &mut database::Connection, user: &User) -> Result<ProfileForm> {
    let profile = for_user(conn, user.id)?;
    Ok(ProfileForm {
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        email: user.email.clone(),
        about_me: profile.about_me,
    })
}

pub fn summary(conn: &mut database::Connection, user: &User) -> Result<ProfileSummary> {
    let profile = for_user(conn, user.id)?;
    Ok(ProfileSummary {
        user: user.clone(),
        favorites: favorites(conn, profile.id, Some(user.id))?,
        liked_ingredients: ingredient_preferences(conn, profile.id, IngredientPreference::Liked)?,
        disliked_ingredients: ingredient_preferences(
            conn,
            profile.id,
            IngredientPreference::Disliked,
        )?,
        profile,
    })
}

/// Adding a favorite that is already there changes nothing.
pub fn add_favorite(conn: &mut database::Connection, profile: &Profile, recipe: RecipeId) -> Result<()> {
    use database::schema::profile_favorites::dsl::*;

    diesel::insert_or_ignore_into(profile_favorites)
        .values((profile_id.eq(profile.id), recipe_id.eq(recipe)))
        .execute(conn)?;
    Ok(())
}

pub fn remove_favorite(
    conn: &mut database::Connection,
    profile: &Profile,
    recipe: RecipeId,
) -> Result<()> {
    use database::schema::profile_favorites::dsl::*;

    diesel::delete(
        profile_favorites
            .filter(profile_id.eq(profile.id))
            .filter(recipe_id.eq(recipe)),
    )
    .execute(conn)?;
    Ok(())
}

/// Favorites that `viewer` may still see; a favorite its author has since made private drops
/// out of the list without being removed from the set.
pub fn favorites(
    conn: &mut database::Connection,
    profile: ProfileId,
    viewer: Option<UserId>,
) -> Result<Vec<Recipe>> {
    use database::schema::{profile_favorites, recipes};

    let found: Vec<Recipe> = recipes::table
        .inner_join(profile_favorites::table)
        .filter(profile_favorites::profile_id.eq(profile))
        .order(recipes::id.asc())
        .select(Recipe::as_select())
        .load(conn)?;
    Ok(found
        .into_iter()
        .filter(|r| privacy::can_view(viewer, r))
        .collect())
}

pub fn add_ingredient_preference(
    conn: &mut database::Connection,
    profile: &Profile,
    preference: IngredientPreference,
    ingredient: IngredientId,
) -> Result<()> {
    use database::schema::{profile_disliked_ingredients as disliked, profile_liked_ingredients as liked};

    match preference {
        IngredientPreference::Liked => diesel::insert_or_ignore_into(liked::table)
            .values((liked::profile_id.eq(profile.id), liked::ingredient_id.eq(ingredient)))
            .execute(conn)?,
        IngredientPreference::Disliked => diesel::insert_or_ignore_into(disliked::table)
            .values((
                disliked::profile_id.eq(profile.id),
                disliked::ingredient_id.eq(ingredient),
            ))
            .execute(conn)?,
    };
    Ok(())
}

pub fn remove_ingredient_preference(
    conn: &mut database::Connection,
    profile: &Profile,
    preference: IngredientPreference,
    ingredient: IngredientId,
) -> Result<()> {
    use database::schema::{profile_disliked_ingredients as disliked, profile_liked_ingredients as liked};

    match preference {
        IngredientPreference::Liked => diesel::delete(
            liked::table
                .filter(liked::profile_id.eq(profile.id))
                .filter(liked::ingredient_id.eq(ingredient)),
        )
        .execute(conn)?,
        IngredientPreference::Disliked => diesel::delete(
            disliked::table
                .filter(disliked::profile_id.eq(profile.id))
                .filter(disliked::ingredient_id.eq(ingredient)),
        )
        .execute(conn)?,
    };
    Ok(())
}

pub fn ingredient_preferences(
    conn: &mut database::Connection,
    profile: ProfileId,
    preference: IngredientPreference,
) -> Result<Vec<Ingredient>> {
    use database::schema::{
        ingredients, profile_disliked_ingredients as disliked, profile_liked_ingredients as liked,
    };

    Ok(match preference {
        IngredientPreference::Liked => ingredients::table
            .inner_join(liked::table)
            .filter(liked::profile_id.eq(profile))
            .order(ingredients::id.asc())
            .select(Ingredient::as_select())
            .load(conn)?,
        IngredientPreference::Disliked => ingredients::table
            .inner_join(disliked::table)
            .filter(disliked::profile_id.eq(profile))
            .order(ingredients::id.asc())
            .select(Ingredient::as_select())
            .load(conn)?,
    })
}
